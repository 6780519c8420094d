//! Constant folding optimizer
//!
//! Resolves embedded expressions that are plain literals at compile time, so no
//! reactive binding is generated for them.

use dominator_core::ast::AttributeValue;
use dominator_core::ir::{Block, Instruction, Program};
use dominator_core::Value;

/// Constant folding optimizer
pub struct ConstantFolder;

impl ConstantFolder {
    /// Create a new constant folder
    pub fn new() -> Self {
        Self
    }

    /// Fold literal `expr` instructions into `text` and literal dynamic attributes
    /// into literal ones
    pub fn fold(&self, program: &Program) -> Program {
        let mut folded = program.clone();
        let count = self.fold_block(&mut folded.block);
        if count > 0 {
            tracing::debug!(folded = count, "constant folding");
        }
        folded
    }

    fn fold_block(&self, block: &mut Block) -> usize {
        let mut count = 0;

        for inst in &mut block.instructions {
            match inst {
                Instruction::Expr { target, expression } => {
                    let target = *target;
                    if let Some(value) = self.literal_value(expression) {
                        *inst = Instruction::Text {
                            target,
                            value: value.to_display_string(),
                        };
                        count += 1;
                    }
                }
                Instruction::Attr {
                    value: value @ AttributeValue::Dynamic(_),
                    ..
                } => {
                    let literal = value
                        .as_expression()
                        .and_then(|expr| self.literal_value(expr));
                    if let Some(literal) = literal {
                        *value = AttributeValue::Literal(literal.to_display_string());
                        count += 1;
                    }
                }
                _ => {
                    for nested in inst.nested_blocks_mut() {
                        count += self.fold_block(nested);
                    }
                }
            }
        }

        count
    }

    /// Value of an expression that is a string, number, boolean or null literal
    pub fn literal_value(&self, expression: &str) -> Option<Value> {
        let expr = expression.trim();

        match expr {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            "null" => return Some(Value::Null),
            _ => {}
        }

        if let Some(quote @ ('"' | '\'')) = expr.chars().next() {
            let inner = expr.strip_prefix(quote)?.strip_suffix(quote)?;
            if expr.len() >= 2 && !inner.contains(quote) && !inner.contains('\\') {
                return Some(Value::String(inner.to_string()));
            }
            return None;
        }

        let numeric = expr
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
        let starts_like_number = expr
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');
        if numeric && starts_like_number {
            return expr
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Number);
        }

        None
    }
}

impl Default for ConstantFolder {
    fn default() -> Self {
        Self::new()
    }
}
