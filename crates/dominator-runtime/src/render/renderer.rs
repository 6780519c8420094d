//! Instruction-stream renderer
//!
//! Executes a compiled [`Program`] against a [`Document`] with the same lowering
//! rules as the JavaScript backend: dynamic text and attributes become effects,
//! `each` and `if` insert rows or branches before a comment anchor.
//!
//! Errors raised while an instruction runs for the first time abort the render.
//! Errors from later re-runs are logged and leave the node unchanged.

use super::evaluator::{Evaluator, PathEvaluator};
use super::scope::{Binding, Scope};
use crate::dom::Document;
use crate::error::{Result, RuntimeError};
use crate::reactive::{current_owner, effect, untrack, Owner, Signal};
use dominator_core::ast::AttributeValue;
use dominator_core::ir::{Block, Instruction, Program, StaticNode, ValueId};
use dominator_core::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// Renders programs into a document
pub struct Renderer<D: Document, E: Evaluator = PathEvaluator> {
    document: Rc<D>,
    evaluator: Rc<E>,
    components: HashMap<String, Program>,
}

impl<D: Document + 'static> Renderer<D> {
    pub fn new(document: Rc<D>) -> Self {
        Self::with_evaluator(document, PathEvaluator)
    }
}

impl<D: Document + 'static, E: Evaluator + 'static> Renderer<D, E> {
    pub fn with_evaluator(document: Rc<D>, evaluator: E) -> Self {
        Self {
            document,
            evaluator: Rc::new(evaluator),
            components: HashMap::new(),
        }
    }

    /// Register the program rendered for `<Name/>`
    pub fn with_component(mut self, name: impl Into<String>, program: Program) -> Self {
        self.components.insert(name.into(), program);
        self
    }

    pub fn document(&self) -> &Rc<D> {
        &self.document
    }

    /// Build `program` and keep its bindings live until the result is disposed
    pub fn render(&self, program: &Program, scope: &Scope) -> Result<Rendered<D::Node>> {
        let context = Rc::new(RenderContext {
            document: self.document.clone(),
            evaluator: self.evaluator.clone(),
            components: Rc::new(self.components.clone()),
        });
        let owner = current_owner().map(|parent| parent.child()).unwrap_or_default();

        let result = owner.run_in(|| untrack(|| context.render_block(&program.block, scope, &owner)));
        match result {
            Ok(Built { root, .. }) => {
                tracing::debug!(
                    function = %program.metadata.name,
                    effects = owner.effect_count(),
                    "rendered program"
                );
                Ok(Rendered { root, owner })
            }
            Err(err) => {
                owner.dispose();
                Err(err)
            }
        }
    }
}

/// Root node of a render plus the owner of its bindings
#[derive(Debug)]
pub struct Rendered<N> {
    root: N,
    owner: Owner,
}

impl<N> Rendered<N> {
    pub fn root(&self) -> &N {
        &self.root
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Stop every binding; the nodes stay where they are
    pub fn dispose(&self) {
        self.owner.dispose();
    }
}

struct RenderContext<D, E> {
    document: Rc<D>,
    evaluator: Rc<E>,
    components: Rc<HashMap<String, Program>>,
}

/// Current top-level nodes of a block. Changes when a nested `each` or `if` updates.
type Region<N> = Rc<dyn Fn() -> Vec<N>>;

/// Root node of a rendered block plus its live region
struct Built<N> {
    root: N,
    region: Region<N>,
}

/// Values produced so far in one block
struct Frame<N> {
    nodes: HashMap<ValueId, N>,
    regions: HashMap<ValueId, Region<N>>,
}

impl<N: Clone + 'static> Frame<N> {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            regions: HashMap::new(),
        }
    }

    fn node(&self, id: ValueId) -> Result<N> {
        self.nodes.get(&id).cloned().ok_or(RuntimeError::MissingValue(id))
    }

    fn define(&mut self, id: ValueId, node: N) {
        self.nodes.insert(id, node);
    }

    fn define_region(&mut self, id: ValueId, built: Built<N>) {
        self.nodes.insert(id, built.root);
        self.regions.insert(id, built.region);
    }

    fn finish(mut self, root: ValueId) -> Result<Built<N>> {
        let node = self.node(root)?;
        let region = match self.regions.remove(&root) {
            Some(region) => region,
            None => single(node.clone()),
        };
        Ok(Built { root: node, region })
    }
}

fn single<N: Clone + 'static>(node: N) -> Region<N> {
    Rc::new(move || vec![node.clone()])
}

/// A mounted row or branch with the owner of its bindings
struct Mounted<N> {
    region: Region<N>,
    owner: Owner,
}

impl<N> Mounted<N> {
    fn nodes(&self) -> Vec<N> {
        (self.region)()
    }
}

struct Row<N> {
    key: Option<String>,
    item: Signal<Value>,
    mounted: Mounted<N>,
}

struct Branch<N> {
    truthy: bool,
    mounted: Option<Mounted<N>>,
}

/// Everything an `each` binding needs on every re-run
struct RowTemplate {
    target: ValueId,
    iterable: String,
    binding: String,
    key: Option<String>,
    body: Block,
    scope: Scope,
    owner: Owner,
}

impl<D: Document + 'static, E: Evaluator + 'static> RenderContext<D, E> {
    fn render_block(self: &Rc<Self>, block: &Block, scope: &Scope, owner: &Owner) -> Result<Built<D::Node>> {
        let mut frame = Frame::new();
        for inst in &block.instructions {
            self.execute(inst, scope, owner, &mut frame)?;
        }
        match block.root {
            Some(root) => frame.finish(root),
            None => {
                let placeholder = self.document.create_text("");
                Ok(Built {
                    root: placeholder.clone(),
                    region: single(placeholder),
                })
            }
        }
    }

    fn execute(
        self: &Rc<Self>,
        inst: &Instruction,
        scope: &Scope,
        owner: &Owner,
        frame: &mut Frame<D::Node>,
    ) -> Result<()> {
        let doc = &self.document;
        match inst {
            Instruction::Create {
                target,
                tag,
                component: false,
            } => frame.define(*target, doc.create_element(tag)),
            Instruction::Create { target, tag, .. } => {
                let program = self
                    .components
                    .get(tag)
                    .ok_or_else(|| RuntimeError::UnknownComponent(tag.clone()))?;
                let built = self.render_block(&program.block, scope, owner)?;
                frame.define_region(*target, built);
            }
            Instruction::Text { target, value } => frame.define(*target, doc.create_text(value)),
            Instruction::Static { target, node } => frame.define(*target, self.build_static(node)),
            Instruction::Expr { target, expression } => {
                let node = doc.create_text("");
                let (ctx, text, expression, scope) =
                    (self.clone(), node.clone(), expression.clone(), scope.clone());
                self.bind(move || {
                    let value = ctx.evaluator.evaluate(&expression, &scope)?;
                    ctx.document.set_text(&text, &value.to_display_string());
                    Ok(())
                })?;
                frame.define(*target, node);
            }
            Instruction::Attr {
                target,
                name,
                value,
            } => {
                let node = frame.node(*target)?;
                match value {
                    AttributeValue::Literal(literal) => self.write_attribute(&node, name, literal),
                    AttributeValue::Flag => self.write_attribute(&node, name, ""),
                    AttributeValue::Dynamic(expression) => {
                        let (ctx, name, expression, scope) =
                            (self.clone(), name.clone(), expression.clone(), scope.clone());
                        self.bind(move || {
                            let value = ctx.evaluator.evaluate(&expression, &scope)?;
                            ctx.write_attribute(&node, &name, &value.to_display_string());
                            Ok(())
                        })?;
                    }
                }
            }
            Instruction::Event {
                target,
                event,
                handler,
            } => {
                let node = frame.node(*target)?;
                let name = match handler {
                    AttributeValue::Literal(name) | AttributeValue::Dynamic(name) => name.trim(),
                    AttributeValue::Flag => {
                        return Err(RuntimeError::InvalidEventHandler(event.clone()))
                    }
                };
                let listener = scope
                    .handler(name)
                    .ok_or_else(|| RuntimeError::UnknownHandler(name.to_string()))?;
                doc.add_event_listener(&node, event, listener);
            }
            Instruction::Append { target, child } => {
                let parent = frame.node(*target)?;
                let child = frame.node(*child)?;
                doc.append_child(&parent, &child);
            }
            Instruction::Each {
                target,
                iterable,
                binding,
                key,
                body,
            } => {
                let template = RowTemplate {
                    target: *target,
                    iterable: iterable.clone(),
                    binding: binding.clone(),
                    key: key.clone(),
                    body: body.clone(),
                    scope: scope.clone(),
                    owner: owner.clone(),
                };
                let built = self.render_each(template)?;
                frame.define_region(*target, built);
            }
            Instruction::If {
                target,
                condition,
                then_block,
                else_block,
            } => {
                let built = self.render_if(
                    *target,
                    condition.clone(),
                    then_block.clone(),
                    else_block.clone(),
                    scope.clone(),
                    owner.clone(),
                )?;
                frame.define_region(*target, built);
            }
        }
        Ok(())
    }

    /// Run `apply` as an effect. A failure on the first run is returned,
    /// later failures are logged.
    fn bind(&self, mut apply: impl FnMut() -> Result<()> + 'static) -> Result<()> {
        let first_error = Rc::new(RefCell::new(None));
        let slot = first_error.clone();
        let mut first_run = true;

        effect(move || {
            if let Err(err) = apply() {
                if first_run {
                    *slot.borrow_mut() = Some(err);
                } else {
                    tracing::warn!(error = %err, "binding update failed; node left unchanged");
                }
            }
            first_run = false;
        });

        let err = first_error.borrow_mut().take();
        match err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn write_attribute(&self, node: &D::Node, name: &str, value: &str) {
        match name.strip_prefix("style:") {
            Some(property) => self.document.set_style(node, property, value),
            None => self.document.set_attribute(node, name, value),
        }
    }

    fn build_static(&self, node: &StaticNode) -> D::Node {
        let doc = &self.document;
        match node {
            StaticNode::Text(text) => doc.create_text(text),
            StaticNode::Element {
                tag,
                attributes,
                children,
            } => {
                let element = doc.create_element(tag);
                for (name, value) in attributes {
                    doc.set_attribute(&element, name, value.as_deref().unwrap_or(""));
                }
                for child in children {
                    let child = self.build_static(child);
                    doc.append_child(&element, &child);
                }
                element
            }
        }
    }

    /// Fragment holding an anchor; returns the fragment and the anchor
    fn anchored(&self, label: &str) -> (D::Node, D::Node) {
        let fragment = self.document.create_fragment();
        let anchor = self.document.create_anchor(label);
        self.document.append_child(&fragment, &anchor);
        (fragment, anchor)
    }

    fn mount(self: &Rc<Self>, block: &Block, scope: &Scope, parent: &Owner) -> Result<Mounted<D::Node>> {
        let owner = parent.child();
        match owner.run_in(|| self.render_block(block, scope, &owner)) {
            Ok(built) => Ok(Mounted {
                region: built.region,
                owner,
            }),
            Err(err) => {
                owner.dispose();
                Err(err)
            }
        }
    }

    fn insert(&self, mounted: &Mounted<D::Node>, parent: &D::Node, anchor: &D::Node) {
        for node in mounted.nodes() {
            self.document.insert_before(parent, &node, anchor);
        }
    }

    fn unmount(&self, mounted: Mounted<D::Node>) {
        let nodes = mounted.nodes();
        mounted.owner.dispose();
        for node in &nodes {
            self.document.remove(node);
        }
    }

    fn render_each(self: &Rc<Self>, template: RowTemplate) -> Result<Built<D::Node>> {
        let (fragment, anchor) = self.anchored("each");
        let rows: Rc<RefCell<Vec<Row<D::Node>>>> = Rc::new(RefCell::new(Vec::new()));

        let region: Region<D::Node> = {
            let (rows, anchor) = (rows.clone(), anchor.clone());
            Rc::new(move || {
                let mut nodes: Vec<D::Node> = rows
                    .borrow()
                    .iter()
                    .flat_map(|row| row.mounted.nodes())
                    .collect();
                nodes.push(anchor.clone());
                nodes
            })
        };

        let ctx = self.clone();
        self.bind(move || {
            let items = ctx
                .evaluator
                .evaluate(&template.iterable, &template.scope)?
                .iter_items()?;
            let parent = ctx
                .document
                .parent(&anchor)
                .ok_or(RuntimeError::DetachedAnchor(template.target))?;

            let previous = std::mem::take(&mut *rows.borrow_mut());
            untrack(|| match template.key {
                None => ctx.rebuild_rows(&template, previous, items, &rows, &parent, &anchor),
                Some(_) => ctx.reconcile_rows(&template, previous, items, &rows, &parent, &anchor),
            })
        })?;
        Ok(Built {
            root: fragment,
            region,
        })
    }

    fn build_row(self: &Rc<Self>, template: &RowTemplate, item: Value, key: Option<String>) -> Result<Row<D::Node>> {
        let item = Signal::new(item);
        let scope = template.scope.child(template.binding.clone(), item.clone());
        let mounted = self.mount(&template.body, &scope, &template.owner)?;
        Ok(Row { key, item, mounted })
    }

    /// Unkeyed: tear every row down and build one per item
    fn rebuild_rows(
        self: &Rc<Self>,
        template: &RowTemplate,
        previous: Vec<Row<D::Node>>,
        items: Vec<Value>,
        rows: &RefCell<Vec<Row<D::Node>>>,
        parent: &D::Node,
        anchor: &D::Node,
    ) -> Result<()> {
        for row in previous {
            self.unmount(row.mounted);
        }
        for item in items {
            let row = self.build_row(template, item, None)?;
            self.insert(&row.mounted, parent, anchor);
            rows.borrow_mut().push(row);
        }
        Ok(())
    }

    /// Keyed: reuse rows whose key survives, build new keys, drop missing ones.
    /// Rows sharing a key are reused in order, so repeated keys never orphan a row.
    fn reconcile_rows(
        self: &Rc<Self>,
        template: &RowTemplate,
        previous: Vec<Row<D::Node>>,
        items: Vec<Value>,
        rows: &RefCell<Vec<Row<D::Node>>>,
        parent: &D::Node,
        anchor: &D::Node,
    ) -> Result<()> {
        let mut retained: HashMap<String, VecDeque<Row<D::Node>>> = HashMap::new();
        for row in previous {
            let key = row.key.clone().unwrap_or_default();
            retained.entry(key).or_default().push_back(row);
        }

        let result = self.place_keyed_rows(template, items, &mut retained, rows, parent, anchor);
        for row in retained.into_values().flatten() {
            self.unmount(row.mounted);
        }
        result
    }

    fn place_keyed_rows(
        self: &Rc<Self>,
        template: &RowTemplate,
        items: Vec<Value>,
        retained: &mut HashMap<String, VecDeque<Row<D::Node>>>,
        rows: &RefCell<Vec<Row<D::Node>>>,
        parent: &D::Node,
        anchor: &D::Node,
    ) -> Result<()> {
        let key_expression = template.key.as_deref().unwrap_or_default();
        let mut seen = HashSet::new();

        for item in items {
            let key_scope = template.scope.child(template.binding.clone(), Binding::Value(item.clone()));
            let key = key_string(&self.evaluator.evaluate(key_expression, &key_scope)?);
            if !seen.insert(key.clone()) {
                tracing::warn!(target = %template.target, key = %key, "duplicate key in keyed each");
            }

            let row = match retained.get_mut(&key).and_then(VecDeque::pop_front) {
                Some(row) => {
                    row.item.set(item);
                    row
                }
                None => self.build_row(template, item, Some(key))?,
            };
            self.insert(&row.mounted, parent, anchor);
            rows.borrow_mut().push(row);
        }
        Ok(())
    }

    fn render_if(
        self: &Rc<Self>,
        target: ValueId,
        condition: String,
        then_block: Block,
        else_block: Option<Block>,
        scope: Scope,
        owner: Owner,
    ) -> Result<Built<D::Node>> {
        let (fragment, anchor) = self.anchored("if");
        let current: Rc<RefCell<Option<Branch<D::Node>>>> = Rc::new(RefCell::new(None));

        let region: Region<D::Node> = {
            let (current, anchor) = (current.clone(), anchor.clone());
            Rc::new(move || {
                let mut nodes = current
                    .borrow()
                    .as_ref()
                    .and_then(|branch| branch.mounted.as_ref())
                    .map(Mounted::nodes)
                    .unwrap_or_default();
                nodes.push(anchor.clone());
                nodes
            })
        };

        let ctx = self.clone();
        self.bind(move || {
            let truthy = ctx.evaluator.evaluate(&condition, &scope)?.is_truthy();
            if current
                .borrow()
                .as_ref()
                .is_some_and(|branch| branch.truthy == truthy)
            {
                return Ok(());
            }
            let parent = ctx
                .document
                .parent(&anchor)
                .ok_or(RuntimeError::DetachedAnchor(target))?;

            let previous = current.borrow_mut().take();
            if let Some(mounted) = previous.and_then(|branch| branch.mounted) {
                ctx.unmount(mounted);
            }

            let block = if truthy { Some(&then_block) } else { else_block.as_ref() };
            let mounted = match block {
                Some(block) => Some(untrack(|| ctx.mount(block, &scope, &owner))?),
                None => None,
            };
            if let Some(mounted) = &mounted {
                ctx.insert(mounted, &parent, &anchor);
            }
            *current.borrow_mut() = Some(Branch { truthy, mounted });
            Ok(())
        })?;
        Ok(Built {
            root: fragment,
            region,
        })
    }
}

/// Row identity; the type name keeps `1` and `"1"` apart
fn key_string(key: &Value) -> String {
    format!("{}:{}", key.type_name(), key.to_display_string())
}
