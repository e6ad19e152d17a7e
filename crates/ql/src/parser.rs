use crate::ast::{CompareOp, Field, QlNode};
use crate::error::QlError;
use crate::lexer::{lex, Token};

/// Parses a query string into an AST. An empty (or whitespace-only) query
/// parses to `None`, meaning "match everything" — the empty-query convention
/// used throughout the engine's filter plumbing.
pub fn parse(src: &str) -> Result<Option<QlNode>, QlError> {
    if src.trim().is_empty() {
        return Ok(None);
    }
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };
    let node = p.parse_or()?;
    if p.pos != p.tokens.len() {
        let rest: Vec<String> = p.tokens[p.pos..].iter().map(|t| t.to_string()).collect();
        return Err(QlError::TrailingInput(rest.join(" ")));
    }
    Ok(Some(node))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    // orExpr := andExpr (OR andExpr)*
    fn parse_or(&mut self) -> Result<QlNode, QlError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = QlNode::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // andExpr := unary (AND unary)*
    fn parse_and(&mut self) -> Result<QlNode, QlError> {
        let mut left = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_unary()?;
            left = QlNode::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // unary := NOT unary | primary
    fn parse_unary(&mut self) -> Result<QlNode, QlError> {
        if matches!(self.peek(), Some(Token::Not)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(QlNode::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    // primary := '(' orExpr ')' | STRING | IDENT (':' | '!=') value | IDENT
    fn parse_primary(&mut self) -> Result<QlNode, QlError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(other) => Err(QlError::UnexpectedToken(other.to_string(), "')'")),
                    None => Err(QlError::UnexpectedEof("')'")),
                }
            }
            Some(Token::String(_)) => {
                let s = match self.advance() {
                    Some(Token::String(s)) => s,
                    _ => unreachable!(),
                };
                Ok(QlNode::FullText(s))
            }
            Some(Token::Ident(_)) => self.parse_ident_primary(),
            Some(other) => Err(QlError::UnexpectedToken(other.to_string(), "field, value, or '('")),
            None => Err(QlError::UnexpectedEof("field, value, or '('")),
        }
    }

    // IDENT (':' | '!=') value, or a bare IDENT full-text match.
    fn parse_ident_primary(&mut self) -> Result<QlNode, QlError> {
        let name = match self.advance() {
            Some(Token::Ident(name)) => name,
            _ => unreachable!("caller only invokes this on a peeked Ident"),
        };

        let op = match self.peek() {
            Some(Token::Colon) => CompareOp::Eq,
            Some(Token::NotEq) => CompareOp::NotEq,
            _ => return Ok(QlNode::FullText(name)),
        };
        self.advance();

        let field = Field::resolve(&name).ok_or(QlError::UnknownField(name))?;

        let value = match self.advance() {
            Some(Token::Ident(s)) => s,
            Some(Token::String(s)) => s,
            Some(other) => return Err(QlError::UnexpectedToken(other.to_string(), "value")),
            None => return Err(QlError::UnexpectedEof("value")),
        };

        Ok(QlNode::Compare { field, op, value })
    }
}
