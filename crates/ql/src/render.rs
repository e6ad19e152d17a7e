use crate::ast::QlNode;

/// Renders an AST back to query syntax. Used by the round-trip property: for
/// any query `q`, `parse(render(parse(q).unwrap())) == parse(q)`.
///
/// Parenthesizes defensively rather than minimally — an `Or` nested under
/// `And`, or any nesting under `Not`, always gets parens, so the output never
/// depends on remembering precedence rules at the call site.
pub fn render(node: &QlNode) -> String {
    match node {
        QlNode::And(l, r) => format!("{} AND {}", render_child(l), render_child(r)),
        QlNode::Or(l, r) => format!("{} OR {}", render_child(l), render_child(r)),
        QlNode::Not(inner) => format!("NOT {}", render_child(inner)),
        QlNode::Compare { field, op, value } => {
            format!("{}{}{}", field.canonical_name(), op.as_str(), quote(value))
        }
        QlNode::FullText(value) => quote(value),
    }
}

fn render_child(node: &QlNode) -> String {
    match node {
        QlNode::Compare { .. } | QlNode::FullText(_) => render(node),
        _ => format!("({})", render(node)),
    }
}

/// A value round-trips unquoted only if it is itself a valid bare `IDENT`
/// token and not a keyword the lexer would otherwise swallow — anything
/// else (`:`, `!`, parens, whitespace, quotes, `AND`/`OR`/`NOT`) must be
/// quoted or it would silently reparse as something else.
fn is_bare_ident(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '-') {
        return false;
    }
    !matches!(value.to_ascii_uppercase().as_str(), "AND" | "OR" | "NOT")
}

fn quote(value: &str) -> String {
    if is_bare_ident(value) {
        value.to_string()
    } else {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    }
}
