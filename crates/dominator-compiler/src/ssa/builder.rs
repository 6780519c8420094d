//! SSA builder
//!
//! Lowers the AST depth-first, pre-order, assigning every produced value the next
//! sequential [`ValueId`]. Control flow is not flattened: `each`/`if` carry their body
//! as a nested [`Block`] whose ids continue the same counter.

use crate::error::{LoweringError, Result};
use crate::semantic::{StaticAnalyzer, StaticHints};
use dominator_core::ast::{AttributeValue, Element, Node};
use dominator_core::ir::{Block, Instruction, Program, ProgramMetadata, ValueId};

/// Owns the id counter and in-progress instruction lists for one compile
#[derive(Debug)]
pub struct SsaBuilder {
    next_id: u32,
    function_name: String,
    analyzer: Option<StaticAnalyzer>,
    hints: StaticHints,
}

impl SsaBuilder {
    /// Builder starting at `v0`
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Builder whose first id is `v{seed}`
    pub fn with_seed(seed: u32) -> Self {
        Self {
            next_id: seed,
            function_name: "render".to_string(),
            analyzer: Some(StaticAnalyzer::new()),
            hints: StaticHints::new(),
        }
    }

    /// Name recorded in the program metadata
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    /// Enable or disable static-subtree hints
    pub fn with_static_analysis(mut self, enabled: bool) -> Self {
        self.analyzer = enabled.then(StaticAnalyzer::new);
        self
    }

    /// Lower a parsed template into a program with an explicitly recorded root
    pub fn build(mut self, ast: &Node) -> Result<Program> {
        let mut instructions = Vec::new();
        let roots = self.lower_node(ast, &mut instructions)?;

        let root = match roots.as_slice() {
            [] => return Err(LoweringError::EmptyTemplate.into()),
            [root] => *root,
            _ => return Err(LoweringError::MultipleRoots { roots }.into()),
        };

        let block = Block {
            instructions,
            root: Some(root),
        };
        tracing::debug!(
            instructions = block.total_len(),
            root = %root,
            static_hints = self.hints.len(),
            "lowered template to SSA"
        );

        Ok(
            Program::new(block, ProgramMetadata::for_template(self.function_name))
                .with_static_hints(self.hints),
        )
    }

    fn fresh_id(&mut self) -> ValueId {
        let id = ValueId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Lower one node into `out`, returning the ids it leaves unclaimed
    fn lower_node(&mut self, node: &Node, out: &mut Vec<Instruction>) -> Result<Vec<ValueId>> {
        match node {
            Node::Program(program) => self.lower_all(&program.children, out),
            Node::Else(else_block) => self.lower_all(&else_block.children, out),
            Node::Element(element) | Node::Component(element) => {
                let id = self.fresh_id();
                if let Some(analyzer) = self.analyzer.as_mut() {
                    if analyzer.is_static(node) {
                        self.hints.insert(id);
                    }
                }
                self.lower_element(id, element, matches!(node, Node::Component(_)), out)?;
                Ok(vec![id])
            }
            Node::Text(text) => {
                let id = self.fresh_id();
                out.push(Instruction::Text {
                    target: id,
                    value: text.value.clone(),
                });
                Ok(vec![id])
            }
            Node::Expression(expr) => {
                let id = self.fresh_id();
                out.push(Instruction::Expr {
                    target: id,
                    expression: expr.expression.clone(),
                });
                Ok(vec![id])
            }
            Node::Each(each) => {
                let id = self.fresh_id();
                let body = self.nested_block(&each.children)?;
                out.push(Instruction::Each {
                    target: id,
                    iterable: each.expression.clone(),
                    binding: each.context.clone(),
                    key: each.key.clone(),
                    body,
                });
                Ok(vec![id])
            }
            Node::If(if_block) => {
                let id = self.fresh_id();
                let then_block = self.nested_block(&if_block.children)?;
                let else_block = if_block
                    .else_branch
                    .as_ref()
                    .map(|branch| self.nested_block(&branch.children))
                    .transpose()?;
                out.push(Instruction::If {
                    target: id,
                    condition: if_block.expression.clone(),
                    then_block,
                    else_block,
                });
                Ok(vec![id])
            }
        }
    }

    fn lower_all(&mut self, nodes: &[Node], out: &mut Vec<Instruction>) -> Result<Vec<ValueId>> {
        let mut ids = Vec::new();
        for node in nodes {
            ids.extend(self.lower_node(node, out)?);
        }
        Ok(ids)
    }

    fn lower_element(
        &mut self,
        id: ValueId,
        element: &Element,
        component: bool,
        out: &mut Vec<Instruction>,
    ) -> Result<()> {
        out.push(Instruction::Create {
            target: id,
            tag: element.tag.clone(),
            component,
        });

        for attr in &element.attributes {
            match attr.event_name() {
                Some(_) if attr.value == AttributeValue::Flag => {
                    return Err(LoweringError::InvalidEventHandler {
                        attribute: attr.name.clone(),
                    }
                    .into());
                }
                Some(event) => out.push(Instruction::Event {
                    target: id,
                    event,
                    handler: attr.value.clone(),
                }),
                None => out.push(Instruction::Attr {
                    target: id,
                    name: attr.name.clone(),
                    value: attr.value.clone(),
                }),
            }
        }

        for child in &element.children {
            for child_id in self.lower_node(child, out)? {
                out.push(Instruction::Append {
                    target: id,
                    child: child_id,
                });
            }
        }
        Ok(())
    }

    /// Body of an `each`/`if`: may be empty, never has more than one root
    fn nested_block(&mut self, nodes: &[Node]) -> Result<Block> {
        let mut instructions = Vec::new();
        let roots = self.lower_all(nodes, &mut instructions)?;

        let root = match roots.as_slice() {
            [] => None,
            [root] => Some(*root),
            _ => return Err(LoweringError::MultipleRoots { roots }.into()),
        };
        Ok(Block { instructions, root })
    }
}

impl Default for SsaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
