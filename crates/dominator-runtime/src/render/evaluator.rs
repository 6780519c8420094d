//! Expression evaluation
//!
//! Template expressions are opaque text. An [`Evaluator`] gives them meaning for
//! the in-process renderer; the JavaScript backend splices them verbatim instead.

use super::scope::Scope;
use crate::error::{Result, RuntimeError};
use dominator_core::Value;

/// Resolves expression text against a scope
pub trait Evaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<Value>;
}

/// Literals, `!` negation, and dotted paths such as `user.name`, `rows.0` or
/// `items[1].title`. A trailing `length` reads array or string length.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl Evaluator for PathEvaluator {
    fn evaluate(&self, expression: &str, scope: &Scope) -> Result<Value> {
        let expr = expression.trim();

        if let Some(negated) = expr.strip_prefix('!') {
            return Ok(Value::Bool(!self.evaluate(negated, scope)?.is_truthy()));
        }
        if let Some(value) = literal(expr) {
            return Ok(value);
        }

        let segments = path_segments(expr).ok_or_else(|| RuntimeError::Evaluation {
            expression: expr.to_string(),
            message: "expected a literal or a property path".to_string(),
        })?;
        let (head, rest) = segments
            .split_first()
            .ok_or_else(|| RuntimeError::UnknownIdentifier(expr.to_string()))?;

        let root = scope
            .get(head)
            .ok_or_else(|| RuntimeError::UnknownIdentifier(head.clone()))?;
        Ok(root.lookup(rest.iter().map(String::as_str))?)
    }
}

fn literal(expr: &str) -> Option<Value> {
    match expr {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" | "undefined" => return Some(Value::Null),
        _ => {}
    }

    for quote in ['"', '\''] {
        if let Some(inner) = expr
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            if expr.len() >= 2 && !inner.contains(quote) && !inner.contains('\\') {
                return Some(Value::String(inner.to_string()));
            }
        }
    }

    if expr.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        return expr
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Number);
    }
    None
}

/// `a.b[0].c` → `["a", "b", "0", "c"]`
fn path_segments(expr: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut chars = expr.chars().peekable();

    loop {
        let mut segment = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                segment.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if segment.is_empty() {
            return None;
        }
        segments.push(segment);

        while chars.peek() == Some(&'[') {
            chars.next();
            let mut index = String::new();
            for c in chars.by_ref() {
                if c == ']' {
                    break;
                }
                index.push(c);
            }
            let index = index.trim();
            if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            segments.push(index.to_string());
        }

        match chars.next() {
            None => break,
            Some('.') => continue,
            Some(_) => return None,
        }
    }

    if segments[0].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some(segments)
}
