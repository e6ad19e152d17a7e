/// A field reference in a comparison, resolved from its surface name (and any
/// alias) at parse time so evaluation never re-parses strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Level,
    Service,
    Host,
    Message,
    TraceId,
}

impl Field {
    /// Resolves a field name, accepting the aliases listed in spec.md §4.4
    /// (`svc` for `service`, `ip`/`hostname` for `host`, `msg` for
    /// `message`, `lvl` for `level`, `ts` for `timestamp`). Case-insensitive.
    pub fn resolve(name: &str) -> Option<Field> {
        match name.to_ascii_lowercase().as_str() {
            "timestamp" | "ts" | "time" => Some(Field::Timestamp),
            "level" | "lvl" => Some(Field::Level),
            "service" | "svc" => Some(Field::Service),
            "host" | "ip" | "hostname" => Some(Field::Host),
            "message" | "msg" => Some(Field::Message),
            "trace_id" | "traceid" | "trace" => Some(Field::TraceId),
            _ => None,
        }
    }

    /// The canonical name emitted by [`crate::render`].
    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Level => "level",
            Field::Service => "service",
            Field::Host => "host",
            Field::Message => "message",
            Field::TraceId => "trace_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => ":",
            CompareOp::NotEq => "!=",
        }
    }
}

/// The parsed query-language abstract syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QlNode {
    And(Box<QlNode>, Box<QlNode>),
    Or(Box<QlNode>, Box<QlNode>),
    Not(Box<QlNode>),
    Compare {
        field: Field,
        op: CompareOp,
        value: String,
    },
    /// A bare `STRING` or bare `IDENT` primary: CONTAINS, matched across
    /// service, host, message, and the level's string form.
    FullText(String),
}
