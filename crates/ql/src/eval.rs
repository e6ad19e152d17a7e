use crate::ast::{CompareOp, Field, QlNode};
use crate::model::LogRow;

/// Evaluates a parsed query against a row. `None` (the empty-query AST)
/// matches every row.
pub fn evaluate(ast: Option<&QlNode>, row: &LogRow) -> bool {
    match ast {
        None => true,
        Some(node) => eval_node(node, row),
    }
}

fn eval_node(node: &QlNode, row: &LogRow) -> bool {
    match node {
        QlNode::And(l, r) => eval_node(l, row) && eval_node(r, row),
        QlNode::Or(l, r) => eval_node(l, row) || eval_node(r, row),
        QlNode::Not(inner) => !eval_node(inner, row),
        QlNode::Compare { field, op, value } => eval_compare(*field, *op, value, row),
        QlNode::FullText(needle) => eval_full_text(needle, row),
    }
}

/// CONTAINS (substring, case-insensitive) across service, host, message, and
/// the level's string form — the match target for a bare `IDENT`/`STRING`.
fn eval_full_text(needle: &str, row: &LogRow) -> bool {
    let needle = needle.to_ascii_lowercase();
    row.service.to_ascii_lowercase().contains(&needle)
        || row.host.to_ascii_lowercase().contains(&needle)
        || row.message.to_ascii_lowercase().contains(&needle)
        || row.level.as_str().to_ascii_lowercase().contains(&needle)
}

fn field_value(field: Field, row: &LogRow) -> String {
    match field {
        Field::Timestamp => row.timestamp.to_string(),
        Field::Level => row.level.as_str().to_string(),
        Field::Service => row.service.clone(),
        Field::Host => row.host.clone(),
        Field::Message => row.message.clone(),
        Field::TraceId => row.trace_id.clone().unwrap_or_default(),
    }
}

fn eval_compare(field: Field, op: CompareOp, value: &str, row: &LogRow) -> bool {
    let actual = field_value(field, row);
    match op {
        CompareOp::Eq => actual.eq_ignore_ascii_case(value),
        CompareOp::NotEq => !actual.eq_ignore_ascii_case(value),
    }
}
