//! Shared data model and the query filter language (QL).
//!
//! This is the workspace's leaf crate: it has no path dependencies on its
//! siblings, so `memtable`, `wal`, `segment`, and `engine` can all depend on
//! it without forming a cycle (`memtable` needs the AST to filter rows in
//! place; `wal` and `segment` need `LogRow` to frame their records).

mod ast;
mod error;
mod eval;
mod lexer;
mod model;
mod parser;
mod render;

pub use ast::{CompareOp, Field, QlNode};
pub use error::QlError;
pub use eval::evaluate;
pub use model::{Filter, Level, LogRow};
pub use parser::parse;
pub use render::render;

#[cfg(test)]
mod tests {
    use super::*;

    fn row(service: &str, host: &str, level: Level, message: &str) -> LogRow {
        LogRow {
            timestamp: 1_000,
            level,
            service: service.to_string(),
            host: host.to_string(),
            message: message.to_string(),
            trace_id: None,
        }
    }

    #[test]
    fn empty_query_matches_all() {
        let ast = parse("").unwrap();
        assert!(ast.is_none());
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Info, "hello")));
    }

    #[test]
    fn whitespace_only_query_matches_all() {
        let ast = parse("   \t ").unwrap();
        assert!(ast.is_none());
    }

    #[test]
    fn simple_equality_is_case_insensitive() {
        let ast = parse("service:API").unwrap();
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Info, "hello")));
        assert!(!evaluate(ast.as_ref(), &row("worker", "h1", Level::Info, "hello")));
    }

    #[test]
    fn field_aliases_resolve() {
        let ast = parse("svc:api").unwrap();
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Info, "hi")));

        let ast2 = parse("ip:10.0.0.1").unwrap();
        assert!(evaluate(ast2.as_ref(), &row("api", "10.0.0.1", Level::Info, "hi")));

        let ast3 = parse("hostname:10.0.0.1").unwrap();
        assert!(evaluate(ast3.as_ref(), &row("api", "10.0.0.1", Level::Info, "hi")));
    }

    #[test]
    fn bare_ident_is_full_text_across_fields() {
        let ast = parse("fail").unwrap();
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Error, "it did fail here")));
        assert!(evaluate(ast.as_ref(), &row("fail-worker", "h1", Level::Info, "ok")));
        assert!(!evaluate(ast.as_ref(), &row("api", "h1", Level::Info, "ok")));
    }

    #[test]
    fn not_equal_operator() {
        let ast = parse("level!=ERROR").unwrap();
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Info, "ok")));
        assert!(!evaluate(ast.as_ref(), &row("api", "h1", Level::Error, "boom")));
    }

    #[test]
    fn bare_string_is_substring_and_case_insensitive() {
        let ast = parse(r#""Timeout""#).unwrap();
        assert!(evaluate(ast.as_ref(), &row("api", "h1", Level::Warn, "request timeout after 5s")));
        assert!(!evaluate(ast.as_ref(), &row("api", "h1", Level::Warn, "all good")));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // service:a OR service:b AND level:ERROR
        // parses as: service:a OR (service:b AND level:ERROR)
        let ast = parse("service:a OR service:b AND level:ERROR").unwrap();
        assert!(evaluate(ast.as_ref(), &row("a", "h1", Level::Info, "m")));
        assert!(!evaluate(ast.as_ref(), &row("b", "h1", Level::Info, "m")));
        assert!(evaluate(ast.as_ref(), &row("b", "h1", Level::Error, "m")));
    }

    #[test]
    fn parens_override_precedence() {
        let ast = parse("(service:a OR service:b) AND level:ERROR").unwrap();
        assert!(!evaluate(ast.as_ref(), &row("a", "h1", Level::Info, "m")));
        assert!(evaluate(ast.as_ref(), &row("a", "h1", Level::Error, "m")));
        assert!(evaluate(ast.as_ref(), &row("b", "h1", Level::Error, "m")));
        assert!(!evaluate(ast.as_ref(), &row("c", "h1", Level::Error, "m")));
    }

    #[test]
    fn not_is_right_associative_and_binds_to_unary() {
        let ast = parse("NOT NOT level:ERROR").unwrap();
        assert!(evaluate(ast.as_ref(), &row("a", "h1", Level::Error, "m")));
        assert!(!evaluate(ast.as_ref(), &row("a", "h1", Level::Info, "m")));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = parse("bogus:1").unwrap_err();
        assert!(matches!(err, QlError::UnknownField(_)));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let err = parse("level:ERROR )").unwrap_err();
        assert!(matches!(err, QlError::UnexpectedToken(_, _)));
    }

    #[test]
    fn round_trip_through_render_preserves_semantics() {
        let queries = [
            "service:a OR service:b AND level:ERROR",
            "(service:a OR service:b) AND level:ERROR",
            r#""disk full" AND NOT host:h1"#,
            "level!=DEBUG",
        ];
        for q in queries {
            let ast = parse(q).unwrap().unwrap();
            let rendered = render(&ast);
            let reparsed = parse(&rendered).unwrap().unwrap();
            assert_eq!(ast, reparsed, "round trip mismatch for {q:?} -> {rendered:?}");
        }
    }
}
