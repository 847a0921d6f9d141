//! Condition language: parser and evaluator.
//!
//! ```text
//! Expr := "and(" Expr "," Expr ")" | "or(" Expr "," Expr ")" | "not(" Expr ")"
//!       | "true" | "false" | Prop ("=" | "<" | ">") Value
//! ```
//!
//! Parsing produces an [`Expr`] tree which is then evaluated against a [`Context`].
//! A property missing from the context makes its atom false.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::context::Context;
use crate::domain::error::{DomainError, DomainResult};

const MAX_NESTING: usize = 256;

/// How `<` and `>` compare a property value against a literal.
///
/// `=` is always plain string equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonPolicy {
    /// Integer comparison when both operands parse as `i64`, lexicographic otherwise.
    #[default]
    Numeric,
    /// Always lexicographic (byte order).
    Lexical,
}

impl ComparisonPolicy {
    pub fn compare(self, actual: &str, literal: &str) -> Ordering {
        if self == ComparisonPolicy::Numeric {
            if let (Ok(a), Ok(b)) = (actual.trim().parse::<i64>(), literal.trim().parse::<i64>()) {
                return a.cmp(&b);
            }
        }
        actual.cmp(literal)
    }
}

impl fmt::Display for ComparisonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonPolicy::Numeric => write!(f, "numeric"),
            ComparisonPolicy::Lexical => write!(f, "lexical"),
        }
    }
}

/// Parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Eq(String, String),
    Lt(String, String),
    Gt(String, String),
    True,
    False,
}

impl Expr {
    /// Parse a condition string.
    #[instrument(level = "trace")]
    pub fn parse(src: &str) -> DomainResult<Self> {
        let mut parser = Parser { src, pos: 0 };
        let expr = parser.parse_expr(0)?;
        parser.skip_ws();
        if parser.pos != src.len() {
            return Err(parser.error(parser.pos, "unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Evaluate against `ctx`. Pure: no side effects, never fails.
    pub fn evaluate(&self, ctx: &Context, policy: ComparisonPolicy) -> bool {
        match self {
            Expr::And(l, r) => l.evaluate(ctx, policy) && r.evaluate(ctx, policy),
            Expr::Or(l, r) => l.evaluate(ctx, policy) || r.evaluate(ctx, policy),
            Expr::Not(e) => !e.evaluate(ctx, policy),
            Expr::Eq(prop, val) => ctx.get(prop).is_some_and(|actual| actual == val),
            Expr::Lt(prop, val) => ctx
                .get(prop)
                .is_some_and(|actual| policy.compare(actual, val) == Ordering::Less),
            Expr::Gt(prop, val) => ctx
                .get(prop)
                .is_some_and(|actual| policy.compare(actual, val) == Ordering::Greater),
            Expr::True => true,
            Expr::False => false,
        }
    }

    /// Property names referenced anywhere in the expression.
    pub fn properties(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_properties(&mut names);
        names
    }

    fn collect_properties<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_properties(names);
                r.collect_properties(names);
            }
            Expr::Not(e) => e.collect_properties(names),
            Expr::Eq(prop, _) | Expr::Lt(prop, _) | Expr::Gt(prop, _) => {
                names.insert(prop.as_str());
            }
            Expr::True | Expr::False => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::And(l, r) => write!(f, "and({},{})", l, r),
            Expr::Or(l, r) => write!(f, "or({},{})", l, r),
            Expr::Not(e) => write!(f, "not({})", e),
            Expr::Eq(p, v) => write!(f, "{}={}", p, v),
            Expr::Lt(p, v) => write!(f, "{}<{}", p, v),
            Expr::Gt(p, v) => write!(f, "{}>{}", p, v),
            Expr::True => write!(f, "true"),
            Expr::False => write!(f, "false"),
        }
    }
}

/// Parse and evaluate `expr` with the default comparison policy.
pub fn evaluate(expr: &str, ctx: &Context) -> DomainResult<bool> {
    evaluate_with(expr, ctx, ComparisonPolicy::default())
}

/// Parse and evaluate `expr` with an explicit comparison policy.
pub fn evaluate_with(expr: &str, ctx: &Context, policy: ComparisonPolicy) -> DomainResult<bool> {
    Ok(Expr::parse(expr)?.evaluate(ctx, policy))
}

/// Recursive-descent parser over byte offsets of `src`.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> DomainError {
        DomainError::MalformedExpression {
            expression: self.src.to_string(),
            position,
            reason: reason.into(),
        }
    }

    fn keyword(&mut self, kw: &str) -> bool {
        if self.rest().starts_with(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> DomainResult<()> {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else if self.pos == self.src.len() {
            Err(self.error(self.pos, format!("expected `{}`, found end of input", c)))
        } else {
            Err(self.error(self.pos, format!("expected `{}`", c)))
        }
    }

    fn parse_expr(&mut self, depth: usize) -> DomainResult<Expr> {
        if depth > MAX_NESTING {
            return Err(self.error(self.pos, "nesting too deep"));
        }
        self.skip_ws();
        if self.keyword("and(") {
            let (l, r) = self.parse_pair(depth)?;
            return Ok(Expr::And(Box::new(l), Box::new(r)));
        }
        if self.keyword("or(") {
            let (l, r) = self.parse_pair(depth)?;
            return Ok(Expr::Or(Box::new(l), Box::new(r)));
        }
        if self.keyword("not(") {
            let inner = self.parse_expr(depth + 1)?;
            self.expect(')')?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    // Separator is the first comma at depth 0 inside the argument list.
    fn parse_pair(&mut self, depth: usize) -> DomainResult<(Expr, Expr)> {
        let left = self.parse_expr(depth + 1)?;
        self.expect(',')?;
        let right = self.parse_expr(depth + 1)?;
        self.expect(')')?;
        Ok((left, right))
    }

    fn parse_atom(&mut self) -> DomainResult<Expr> {
        let start = self.pos;
        let end = self
            .rest()
            .find(|c| matches!(c, ',' | '(' | ')'))
            .map(|i| start + i)
            .unwrap_or(self.src.len());
        let text = self.src[start..end].trim();

        if self.src[end..].starts_with('(') {
            return Err(self.error(start, format!("unknown operator `{}`", text)));
        }
        if text.is_empty() {
            return Err(self.error(start, "expected expression"));
        }
        self.pos = end;

        if text.eq_ignore_ascii_case("true") {
            return Ok(Expr::True);
        }
        if text.eq_ignore_ascii_case("false") {
            return Ok(Expr::False);
        }

        for op in ['=', '<', '>'] {
            if let Some((prop, value)) = text.split_once(op) {
                let prop = prop.trim();
                if prop.is_empty() {
                    return Err(self.error(start, format!("missing property name before `{}`", op)));
                }
                let (prop, value) = (prop.to_string(), value.trim().to_string());
                return Ok(match op {
                    '=' => Expr::Eq(prop, value),
                    '<' => Expr::Lt(prop, value),
                    _ => Expr::Gt(prop, value),
                });
            }
        }
        Err(self.error(start, format!("expected `=`, `<` or `>` in `{}`", text)))
    }
}
