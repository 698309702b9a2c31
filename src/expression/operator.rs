//! Operator definitions for expressions.

use crate::access::DataType;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Equality
    Eq,
    Ne,

    // Byte matching
    PrefixMatch,
    RegexMatch,

    // Logical
    And,
    Or,

    // Arithmetic (Add doubles as string concatenation)
    Add,
    Sub,
    Mul,
    Div,

    // Relational
    Gt,
    Ge,
    Lt,
    Le,

    // List operand
    In,
    Between,
}

impl BinaryOperator {
    /// Get the declared output type given the left operand's declared type
    pub fn output_type(&self, left: DataType) -> DataType {
        match self {
            BinaryOperator::Add if left == DataType::String => DataType::String,
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div => DataType::Number,
            _ => DataType::Boolean,
        }
    }

    /// Whether the right operand must be a list literal
    pub fn takes_list(&self) -> bool {
        matches!(self, BinaryOperator::In | BinaryOperator::Between)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::PrefixMatch => "^=",
            BinaryOperator::RegexMatch => "~=",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::In => "in",
            BinaryOperator::Between => "between",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_types() {
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::String),
            DataType::String
        );
        assert_eq!(
            BinaryOperator::Add.output_type(DataType::Number),
            DataType::Number
        );
        assert_eq!(
            BinaryOperator::Sub.output_type(DataType::String),
            DataType::Number
        );
        for op in [
            BinaryOperator::Eq,
            BinaryOperator::PrefixMatch,
            BinaryOperator::And,
            BinaryOperator::Le,
            BinaryOperator::In,
            BinaryOperator::Between,
        ] {
            assert_eq!(op.output_type(DataType::String), DataType::Boolean);
        }
    }

    #[test]
    fn test_operator_strings() {
        assert_eq!(BinaryOperator::PrefixMatch.as_str(), "^=");
        assert_eq!(BinaryOperator::RegexMatch.as_str(), "~=");
        assert_eq!(BinaryOperator::Between.as_str(), "between");
        assert!(BinaryOperator::In.takes_list());
        assert!(!BinaryOperator::Eq.takes_list());
    }
}
