//! kvq - run filtered, ordered and paginated scans over a key-value dump

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser as ClapParser;
use kvquery::executor::{
    EmptyResultPlan, FilterExec, FinalLimitPlan, FinalOrderPlan, FinalPlan, FullScanPlan,
    LimitPlan, MultiGetPlan, OrderField, OrderPlan, Plan, PrefixScanPlan, ProjectionPlan,
    RangeScanPlan, SortOrder,
};
use kvquery::expression::Expression;
use kvquery::storage::{MemoryStore, Txn};
use log::info;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

/// kvq - query a JSON-lines key-value dump
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Data file with one {"key": ..., "value": ...} object per line
    #[arg(short = 'D', long)]
    data: PathBuf,

    /// Only scan keys starting with this prefix
    #[arg(short, long, conflicts_with_all = ["start", "end", "keys"])]
    prefix: Option<String>,

    /// Inclusive lower key bound
    #[arg(long)]
    start: Option<String>,

    /// Inclusive upper key bound
    #[arg(long)]
    end: Option<String>,

    /// Fetch exactly these keys (comma separated)
    #[arg(short, long, value_delimiter = ',', conflicts_with_all = ["start", "end"])]
    keys: Vec<String>,

    /// Build a plan that returns nothing
    #[arg(long)]
    empty: bool,

    /// Keep rows whose value matches this regular expression
    #[arg(short = 'm', long = "match")]
    pattern: Option<String>,

    /// Project these JSON fields of the value as extra columns (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Order by `key`, `value` or a JSON field of the value. With --fields,
    /// field columns compare as text, so "100" sorts before "9"
    #[arg(short, long)]
    order_by: Option<String>,

    /// Descending order
    #[arg(long)]
    desc: bool,

    /// Rows to skip
    #[arg(long, default_value = "0")]
    offset: usize,

    /// Maximum number of rows to print
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print the plan before the results
    #[arg(short, long)]
    explain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let store = MemoryStore::new();
    let file = File::open(&args.data)
        .with_context(|| format!("Failed to open data file {}", args.data.display()))?;
    let loaded = store
        .load_json_lines(BufReader::new(file))
        .with_context(|| format!("Failed to load {}", args.data.display()))?;
    info!("Loaded {} records from {}", loaded, args.data.display());

    let txn = store.begin();
    let mut plan = build_plan(&args, &txn)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if args.explain {
        for line in plan.explain() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
    }

    plan.init()?;
    if !args.fields.is_empty() {
        writeln!(out, "{}", plan.field_names().join("\t"))?;
    }

    let mut count = 0;
    while let Some(tuple) = plan.next()? {
        let line = tuple
            .iter()
            .map(|c| String::from_utf8_lossy(c))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(out, "{}", line)?;
        count += 1;
    }
    info!("{} rows", count);

    Ok(())
}

fn build_plan<'a>(args: &Args, txn: &'a dyn Txn) -> Result<Box<dyn FinalPlan + 'a>> {
    let order = if args.desc {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    };
    let paginate = args.limit.is_some() || args.offset > 0;
    let limit = args.limit.unwrap_or(usize::MAX);

    let leaf = build_leaf(args, txn)?;

    if args.fields.is_empty() {
        let mut plan = leaf;
        if let Some(name) = &args.order_by {
            let field = OrderField::named(name.as_str(), order_expr(name), order);
            plan = Box::new(OrderPlan::new(plan, vec![field]));
        }
        if paginate {
            plan = Box::new(LimitPlan::with_offset(plan, limit, args.offset));
        }
        return Ok(Box::new(ProjectionPlan::key_value(plan)));
    }

    let mut columns = vec![("key".to_string(), Expression::key())];
    columns.extend(args.fields.iter().map(|f| (f.clone(), json_field(f))));

    let mut plan: Box<dyn FinalPlan + 'a> = Box::new(ProjectionPlan::new(leaf, columns));
    if let Some(name) = &args.order_by {
        let field = OrderField::named(name.as_str(), order_expr(name), order);
        plan = Box::new(FinalOrderPlan::new(plan, vec![field]));
    }
    if paginate {
        plan = Box::new(FinalLimitPlan::with_offset(plan, limit, args.offset));
    }
    Ok(plan)
}

fn build_leaf<'a>(args: &Args, txn: &'a dyn Txn) -> Result<Box<dyn Plan + 'a>> {
    if args.empty {
        return Ok(Box::new(EmptyResultPlan::new()));
    }

    let filter = match &args.pattern {
        Some(pattern) => {
            regex::bytes::Regex::new(pattern)
                .with_context(|| format!("Invalid --match pattern '{}'", pattern))?;
            FilterExec::new(Expression::regex_match(
                Expression::value(),
                Expression::string(pattern.as_str()),
            ))
        }
        None => FilterExec::always(),
    };

    if !args.keys.is_empty() {
        let keys = args
            .keys
            .iter()
            .map(|k| Bytes::copy_from_slice(k.as_bytes()))
            .collect();
        return Ok(Box::new(MultiGetPlan::new(txn, keys, filter)));
    }
    if let Some(prefix) = &args.prefix {
        return Ok(Box::new(PrefixScanPlan::new(
            txn,
            Bytes::copy_from_slice(prefix.as_bytes()),
            filter,
        )));
    }
    if args.start.is_some() || args.end.is_some() {
        let bound = |b: &Option<String>| b.as_ref().map(|s| Bytes::copy_from_slice(s.as_bytes()));
        return Ok(Box::new(RangeScanPlan::new(
            txn,
            bound(&args.start),
            bound(&args.end),
            filter,
        )));
    }
    Ok(Box::new(FullScanPlan::new(txn, filter)))
}

fn order_expr(name: &str) -> Expression {
    match name {
        "key" => Expression::key(),
        "value" => Expression::value(),
        field => json_field(field),
    }
}

fn json_field(field: &str) -> Expression {
    Expression::get(Expression::call("json", vec![Expression::value()]), field)
}
