//! JavaScript code generation
//!
//! Lowers a program into an ES module exporting one procedure
//! `(state, events) => rootNode`. Dynamic bindings are wrapped in `effect` from the
//! runtime module; `each`/`if` bodies are built per row or branch inside a region
//! bounded by comment markers and inserted before a comment anchor.

use super::free_vars::{free_identifiers, is_binding_name};
use super::writer::CodeWriter;
use crate::error::LoweringError;
use dominator_core::ast::AttributeValue;
use dominator_core::ir::{Block, Instruction, Program, ValueId};
use std::collections::{HashMap, HashSet};

/// Code generator options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsCodegenOptions {
    /// Module the reactive primitives are imported from
    pub runtime_module: String,
}

impl Default for JsCodegenOptions {
    fn default() -> Self {
        Self {
            runtime_module: "@dominator/core".to_string(),
        }
    }
}

/// JavaScript code generator
#[derive(Debug, Clone, Default)]
pub struct JsCodegen {
    options: JsCodegenOptions,
}

impl JsCodegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: JsCodegenOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JsCodegenOptions {
        &self.options
    }

    /// Generate the module source for `program`
    pub fn generate(&self, program: &Program) -> Result<String, LoweringError> {
        let root = program.root().ok_or(LoweringError::EmptyTemplate)?;
        check_names(program)?;
        check_event_handlers(&program.block)?;

        let mut statics = HashMap::new();
        let mut fragments = Vec::new();
        let mut control_flow = false;
        program.block.walk(&mut |inst, _| match inst {
            Instruction::Static { target, node } => {
                let name = format!("__static{}", fragments.len());
                statics.insert(*target, name.clone());
                fragments.push((name, node.to_html()));
            }
            Instruction::Each { .. } | Instruction::If { .. } => control_flow = true,
            _ => {}
        });

        let mut w = CodeWriter::new();
        w.line(format!(
            "import {{ effect }} from {};",
            single_quoted(&self.options.runtime_module)
        ));
        w.blank();

        if !fragments.is_empty() {
            w.scope("const __template = (html) => {", "};", |w| {
                w.line("const t = document.createElement('template');");
                w.line("t.innerHTML = html;");
                w.line("return t.content.firstChild;");
            });
            for (name, html) in &fragments {
                w.line(format!("const {} = __template({});", name, js_string(html)));
            }
            w.blank();
        }
        if control_flow {
            emit_region_helpers(&mut w);
        }

        let ctx = Context { statics };
        w.scope(
            format!("export const {} = (state, events) => {{", program.metadata.name),
            "};",
            |w| {
                let names = state_names(&program.block);
                if !names.is_empty() {
                    w.line(format!("const {{ {} }} = state;", names.join(", ")));
                }
                ctx.emit_block(w, &program.block, None);
                w.line(format!("return {};", root));
            },
        );

        let code = w.finish();
        tracing::debug!(
            function = %program.metadata.name,
            bytes = code.len(),
            fragments = fragments.len(),
            "generated JavaScript"
        );
        Ok(code)
    }
}

/// Rows and branches live between two comment markers. Removing a region removes
/// everything between its markers, including rows that nested blocks inserted later.
/// Effects created inside a region stop applying once it, or any enclosing region,
/// is unmounted.
fn emit_region_helpers(w: &mut CodeWriter) {
    w.scope("const __region = (parent) => ({", "});", |w| {
        w.line("parent,");
        w.line("live: true,");
        w.line("start: document.createComment(''),");
        w.line("end: document.createComment(''),");
    });
    w.scope("const __live = (region) => {", "};", |w| {
        w.line("for (let r = region; r; r = r.parent) if (!r.live) return false;");
        w.line("return true;");
    });
    w.scope("const __nodes = (region) => {", "};", |w| {
        w.line("const nodes = [];");
        w.line("for (let n = region.start; n; n = n === region.end ? null : n.nextSibling) nodes.push(n);");
        w.line("return nodes;");
    });
    w.scope("const __mount = (region, node, anchor) => {", "};", |w| {
        w.line("anchor.parentNode.insertBefore(region.start, anchor);");
        w.line("anchor.parentNode.insertBefore(node, anchor);");
        w.line("anchor.parentNode.insertBefore(region.end, anchor);");
    });
    w.scope("const __move = (region, anchor) => {", "};", |w| {
        w.line("for (const n of __nodes(region)) anchor.parentNode.insertBefore(n, anchor);");
    });
    w.scope("const __unmount = (region) => {", "};", |w| {
        w.line("region.live = false;");
        w.line("for (const n of __nodes(region)) n.parentNode.removeChild(n);");
    });
    w.blank();
}

/// Early return for effects owned by a region
fn guard(region: Option<&str>) -> String {
    region.map_or_else(String::new, |r| format!("if (!__live({})) return; ", r))
}

struct Context {
    statics: HashMap<ValueId, String>,
}

impl Context {
    /// `region` names the enclosing row or branch region; `None` at the top level
    fn emit_block(&self, w: &mut CodeWriter, block: &Block, region: Option<&str>) {
        for inst in &block.instructions {
            self.emit_instruction(w, inst, region);
        }
    }

    fn emit_instruction(&self, w: &mut CodeWriter, inst: &Instruction, region: Option<&str>) {
        match inst {
            Instruction::Create {
                target,
                tag,
                component: true,
            } => w.line(format!("const {} = {}(state, events);", target, tag)),
            Instruction::Create { target, tag, .. } => w.line(format!(
                "const {} = document.createElement({});",
                target,
                single_quoted(tag)
            )),
            Instruction::Text { target, value } => w.line(format!(
                "const {} = document.createTextNode({});",
                target,
                js_string(value)
            )),
            Instruction::Expr { target, expression } => {
                w.line(format!("const {} = document.createTextNode('');", target));
                w.line(format!(
                    "effect(() => {{ {}{}.textContent = String({}); }});",
                    guard(region),
                    target,
                    expression
                ));
            }
            Instruction::Static { target, .. } => {
                let name = self.statics.get(target).map_or("null", String::as_str);
                w.line(format!("const {} = {}.cloneNode(true);", target, name));
            }
            Instruction::Attr {
                target,
                name,
                value,
            } => emit_attr(w, *target, name, value, region),
            Instruction::Event {
                target,
                event,
                handler,
            } => w.line(format!(
                "{}.addEventListener({}, {});",
                target,
                single_quoted(event),
                event_listener(handler)
            )),
            Instruction::Append { target, child } => {
                w.line(format!("{}.appendChild({});", target, child))
            }
            Instruction::Each {
                target,
                iterable,
                binding,
                key,
                body,
            } => self.emit_each(w, *target, iterable, binding, key.as_deref(), body, region),
            Instruction::If {
                target,
                condition,
                then_block,
                else_block,
            } => self.emit_if(w, *target, condition, then_block, else_block.as_ref(), region),
        }
    }

    /// `const` fragment with a comment anchor rows or branches are inserted before
    fn emit_anchor(&self, w: &mut CodeWriter, target: ValueId, label: &str) {
        w.line(format!("const {} = document.createDocumentFragment();", target));
        w.line(format!(
            "const {}_anchor = document.createComment('{}');",
            target, label
        ));
        w.line(format!("{}.appendChild({}_anchor);", target, target));
    }

    /// Create region `name` under `parent`, build `block` inside it and mount it
    /// before `anchor`
    fn emit_region(
        &self,
        w: &mut CodeWriter,
        name: &str,
        parent: Option<&str>,
        block: &Block,
        anchor: &str,
    ) {
        w.line(format!(
            "const {} = __region({});",
            name,
            parent.unwrap_or("null")
        ));
        w.scope(format!("const {}_node = (() => {{", name), "})();", |w| {
            self.emit_block(w, block, Some(name));
            match block.root {
                Some(root) => w.line(format!("return {};", root)),
                None => w.line("return document.createTextNode('');"),
            }
        });
        w.line(format!("__mount({}, {}_node, {});", name, name, anchor));
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_each(
        &self,
        w: &mut CodeWriter,
        target: ValueId,
        iterable: &str,
        binding: &str,
        key: Option<&str>,
        body: &Block,
        region: Option<&str>,
    ) {
        self.emit_anchor(w, target, "each");
        let rows = format!("{}_rows", target);
        let row = format!("{}_row", target);
        let anchor = format!("{}_anchor", target);
        let items = format!("for (const {} of ({}) || []) {{", binding, iterable);

        w.line(format!("let {} = [];", rows));
        w.scope("effect(() => {", "});", |w| {
            if region.is_some() {
                w.line(guard(region).trim_end());
            }
            match key {
                None => {
                    w.line(format!("for (const {} of {}) __unmount({});", row, rows, row));
                    w.line(format!("{} = [];", rows));
                    w.scope(&items, "}", |w| {
                        self.emit_region(w, &row, region, body, &anchor);
                        w.line(format!("{}.push({});", rows, row));
                    });
                }
                Some(key) => self.emit_keyed_rows(w, target, key, &items, body, region),
            }
        });
    }

    /// Rows are `{ key, region }` entries. Earlier rows are queued per key and reused
    /// in order, so repeated keys neither merge rows nor leave any behind.
    fn emit_keyed_rows(
        &self,
        w: &mut CodeWriter,
        target: ValueId,
        key: &str,
        items: &str,
        body: &Block,
        region: Option<&str>,
    ) {
        let rows = format!("{}_rows", target);
        let row = format!("{}_row", target);
        let anchor = format!("{}_anchor", target);
        let old = format!("{}_old", target);
        let next = format!("{}_next", target);
        let entry = format!("{}_entry", target);
        let queue = format!("{}_queue", target);
        let key_var = format!("{}_key", target);

        w.line(format!("const {} = new Map();", old));
        w.scope(format!("for (const {} of {}) {{", entry, rows), "}", |w| {
            w.line(format!("const {} = {}.get({}.key);", queue, old, entry));
            w.line(format!(
                "if ({}) {}.push({}); else {}.set({}.key, [{}]);",
                queue, queue, entry, old, entry, entry
            ));
        });
        w.line(format!("const {} = [];", next));
        w.scope(items, "}", |w| {
            w.line(format!("const {} = ({});", key_var, key));
            w.line(format!(
                "let {} = ({}.get({}) || []).shift();",
                entry, old, key_var
            ));
            w.scope(format!("if ({} === undefined) {{", entry), "}", |w| {
                self.emit_region(w, &row, region, body, &anchor);
                w.line(format!("{} = {{ key: {}, region: {} }};", entry, key_var, row));
            });
            w.line(format!("else __move({}.region, {});", entry, anchor));
            w.line(format!("{}.push({});", next, entry));
        });
        w.line(format!(
            "for (const {} of {}.values()) for (const {} of {}) __unmount({}.region);",
            queue, old, entry, queue, entry
        ));
        w.line(format!("{} = {};", rows, next));
    }

    fn emit_if(
        &self,
        w: &mut CodeWriter,
        target: ValueId,
        condition: &str,
        then_block: &Block,
        else_block: Option<&Block>,
        region: Option<&str>,
    ) {
        self.emit_anchor(w, target, "if");
        let current = format!("{}_current", target);
        let branch = format!("{}_branch", target);
        let next = format!("{}_next", target);
        let anchor = format!("{}_anchor", target);
        let name = format!("{}_region", target);

        w.line(format!("let {} = null;", current));
        w.line(format!("let {};", branch));
        w.scope("effect(() => {", "});", |w| {
            if region.is_some() {
                w.line(guard(region).trim_end());
            }
            w.line(format!("const {} = !!({});", next, condition));
            w.line(format!("if ({} === {}) return;", next, branch));
            w.line(format!("{} = {};", branch, next));
            w.line(format!("if ({}) __unmount({});", current, current));
            w.line(format!("{} = null;", current));
            w.scope(format!("if ({}) {{", next), "}", |w| {
                self.emit_region(w, &name, region, then_block, &anchor);
                w.line(format!("{} = {};", current, name));
            });
            if let Some(else_block) = else_block {
                w.scope("else {", "}", |w| {
                    self.emit_region(w, &name, region, else_block, &anchor);
                    w.line(format!("{} = {};", current, name));
                });
            }
        });
    }
}

fn emit_attr(
    w: &mut CodeWriter,
    target: ValueId,
    name: &str,
    value: &AttributeValue,
    region: Option<&str>,
) {
    let style = name.strip_prefix("style:");
    let setter = |v: &str| match style {
        Some(property) => format!(
            "{}.style.setProperty({}, {});",
            target,
            single_quoted(property),
            v
        ),
        None => format!("{}.setAttribute({}, {});", target, single_quoted(name), v),
    };

    match value {
        AttributeValue::Literal(literal) => w.line(setter(&js_string(literal))),
        AttributeValue::Flag => w.line(setter("''")),
        AttributeValue::Dynamic(expr) => {
            w.line(format!(
                "effect(() => {{ {}{} }});",
                guard(region),
                setter(&format!("({})", expr))
            ))
        }
    }
}

fn event_listener(handler: &AttributeValue) -> String {
    match handler {
        AttributeValue::Dynamic(expr) if is_arrow_function(expr) => expr.trim().to_string(),
        AttributeValue::Dynamic(expr) => format!("(e) => ({})(e)", expr),
        AttributeValue::Literal(name) if is_identifier(name) => {
            format!("(e) => events.{}(e)", name)
        }
        AttributeValue::Literal(name) => format!("(e) => events[{}](e)", js_string(name)),
        // rejected before emission
        AttributeValue::Flag => "() => {}".to_string(),
    }
}

/// The exported procedure and every component tag become JavaScript bindings
fn check_names(program: &Program) -> Result<(), LoweringError> {
    if !is_binding_name(&program.metadata.name) || program.metadata.name == "effect" {
        return Err(LoweringError::InvalidIdentifier {
            name: program.metadata.name.clone(),
            usage: "the exported procedure",
        });
    }

    let mut invalid = None;
    program.block.walk(&mut |inst, _| {
        if let Instruction::Create {
            tag,
            component: true,
            ..
        } = inst
        {
            if !is_binding_name(tag) {
                invalid.get_or_insert_with(|| tag.clone());
            }
        }
    });
    match invalid {
        Some(name) => Err(LoweringError::InvalidIdentifier {
            name,
            usage: "a component",
        }),
        None => Ok(()),
    }
}

fn check_event_handlers(block: &Block) -> Result<(), LoweringError> {
    let mut invalid = None;
    block.walk(&mut |inst, _| {
        if let Instruction::Event {
            event,
            handler: AttributeValue::Flag,
            ..
        } = inst
        {
            invalid.get_or_insert_with(|| format!("on{}", event));
        }
    });
    match invalid {
        Some(attribute) => Err(LoweringError::InvalidEventHandler { attribute }),
        None => Ok(()),
    }
}

/// Names destructured from `state`: free identifiers of every expression plus
/// component tags, minus `each` bindings
fn state_names(block: &Block) -> Vec<String> {
    let mut names = Vec::new();
    let mut bindings = HashSet::new();

    block.walk(&mut |inst, _| {
        let expressions: Vec<&str> = match inst {
            Instruction::Create {
                tag,
                component: true,
                ..
            } => {
                names.push(tag.clone());
                Vec::new()
            }
            Instruction::Expr { expression, .. } => vec![expression.as_str()],
            Instruction::Attr { value, .. } => value.as_expression().into_iter().collect(),
            Instruction::Event { handler, .. } => handler.as_expression().into_iter().collect(),
            Instruction::Each {
                iterable,
                binding,
                key,
                ..
            } => {
                bindings.insert(binding.clone());
                std::iter::once(iterable.as_str())
                    .chain(key.as_deref())
                    .collect()
            }
            Instruction::If { condition, .. } => vec![condition.as_str()],
            _ => Vec::new(),
        };
        for expr in expressions {
            names.extend(free_identifiers(expr));
        }
    });

    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !bindings.contains(name) && seen.insert(name.clone()))
        .collect()
}

/// `x => ...`, `(a, b) => ...`, `async (e) => ...`
fn is_arrow_function(expr: &str) -> bool {
    let expr = expr.trim();
    let expr = expr.strip_prefix("async ").map_or(expr, str::trim_start);

    let rest = if expr.starts_with('(') {
        let mut depth = 0usize;
        let mut close = None;
        for (i, c) in expr.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        match close {
            Some(i) => &expr[i + 1..],
            None => return false,
        }
    } else {
        let end = expr
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(expr.len());
        if end == 0 {
            return false;
        }
        &expr[end..]
    };

    rest.trim_start().starts_with("=>")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Double-quoted JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_arrow_function() {
        assert!(is_arrow_function("(e) => save(e)"));
        assert!(is_arrow_function("e => save(e)"));
        assert!(is_arrow_function("  () => count.set(0)"));
        assert!(is_arrow_function("async (e) => await save(e)"));
        assert!(!is_arrow_function("save"));
        assert!(!is_arrow_function("(save)"));
        assert!(!is_arrow_function("handlers[name]"));
    }

    #[test]
    fn test_event_listener_forms() {
        assert_eq!(
            event_listener(&AttributeValue::Dynamic("(e) => go(e)".to_string())),
            "(e) => go(e)"
        );
        assert_eq!(
            event_listener(&AttributeValue::Dynamic("handlers.save".to_string())),
            "(e) => (handlers.save)(e)"
        );
        assert_eq!(
            event_listener(&AttributeValue::Literal("increment".to_string())),
            "(e) => events.increment(e)"
        );
        assert_eq!(
            event_listener(&AttributeValue::Literal("do-it".to_string())),
            "(e) => events[\"do-it\"](e)"
        );
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(js_string("a \"b\"\n"), "\"a \\\"b\\\"\\n\"");
        assert_eq!(single_quoted("it's"), "'it\\'s'");
        assert!(is_identifier("save_1"));
        assert!(!is_identifier("1save"));
    }
}
