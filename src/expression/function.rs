//! Scalar function registry.
//!
//! A registry is an immutable name → function map. The builtin registry is
//! built once on first use and shared read-only by every plan tree.

use crate::access::{DataType, Value};
use crate::expression::eval::ExpressionEvaluator;
use crate::expression::{Expression, ExpressionError, ExpressionResult};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Function body. Receives the unevaluated arguments and decides itself
/// which of them to evaluate, and in what order.
pub type FunctionBody = fn(&ExpressionEvaluator<'_>, &[Expression]) -> ExpressionResult<Value>;

#[derive(Clone)]
pub struct Function {
    pub name: String,
    /// Required argument count, ignored when `var_args` is set
    pub num_args: usize,
    pub var_args: bool,
    pub return_type: DataType,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        num_args: usize,
        return_type: DataType,
        body: FunctionBody,
    ) -> Self {
        Self {
            name: name.into(),
            num_args,
            var_args: false,
            return_type,
            body,
        }
    }

    pub fn variadic(name: impl Into<String>, return_type: DataType, body: FunctionBody) -> Self {
        Self {
            name: name.into(),
            num_args: 0,
            var_args: true,
            return_type,
            body,
        }
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("num_args", &self.num_args)
            .field("var_args", &self.var_args)
            .field("return_type", &self.return_type)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

static BUILTIN: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function, replacing any previous one with the same name
    pub fn register(mut self, function: Function) -> Self {
        self.functions.insert(function.name.clone(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The shared builtin registry
    pub fn builtin() -> Arc<FunctionRegistry> {
        BUILTIN
            .get_or_init(|| {
                Arc::new(
                    FunctionRegistry::new()
                        .register(Function::new("lower", 1, DataType::String, lower))
                        .register(Function::new("upper", 1, DataType::String, upper))
                        .register(Function::new("strlen", 1, DataType::Number, strlen))
                        .register(Function::new("json", 1, DataType::String, json))
                        .register(Function::variadic("concat", DataType::String, concat)),
                )
            })
            .clone()
    }
}

fn bytes_arg(
    eval: &ExpressionEvaluator<'_>,
    function: &str,
    arg: &Expression,
) -> ExpressionResult<bytes::Bytes> {
    match eval.evaluate(arg)? {
        Value::Bytes(b) => Ok(b),
        other => Err(ExpressionError::InvalidOperandTypes {
            operator: function.to_string(),
            left: other.type_name(),
            right: "none",
        }),
    }
}

fn lower(eval: &ExpressionEvaluator<'_>, args: &[Expression]) -> ExpressionResult<Value> {
    let arg = bytes_arg(eval, "lower", &args[0])?;
    Ok(Value::string(String::from_utf8_lossy(&arg).to_lowercase()))
}

fn upper(eval: &ExpressionEvaluator<'_>, args: &[Expression]) -> ExpressionResult<Value> {
    let arg = bytes_arg(eval, "upper", &args[0])?;
    Ok(Value::string(String::from_utf8_lossy(&arg).to_uppercase()))
}

fn strlen(eval: &ExpressionEvaluator<'_>, args: &[Expression]) -> ExpressionResult<Value> {
    let arg = bytes_arg(eval, "strlen", &args[0])?;
    Ok(Value::Int(arg.len() as i64))
}

/// Parse a JSON document. Empty input yields the empty-bytes sentinel so
/// that field access on a missing document stays lenient.
fn json(eval: &ExpressionEvaluator<'_>, args: &[Expression]) -> ExpressionResult<Value> {
    let arg = bytes_arg(eval, "json", &args[0])?;
    if arg.is_empty() {
        return Ok(Value::empty());
    }
    let doc: serde_json::Value =
        serde_json::from_slice(&arg).map_err(|e| ExpressionError::EvaluationError {
            message: format!("json: {}", e),
        })?;
    Ok(Value::from(doc))
}

fn concat(eval: &ExpressionEvaluator<'_>, args: &[Expression]) -> ExpressionResult<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&eval.evaluate(arg)?.to_string());
    }
    Ok(Value::string(out))
}
