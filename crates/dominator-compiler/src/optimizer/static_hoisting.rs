//! Static subtree hoisting
//!
//! Collapses every maximal static element subtree into a single
//! [`Instruction::Static`] holding a precomputed fragment. Candidates come from the
//! analyzer's hints and are re-checked against the instructions, since earlier passes
//! may have rewritten them.

use dominator_core::ast::AttributeValue;
use dominator_core::ir::{Block, Instruction, Program, StaticNode, ValueId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Static subtree hoister
pub struct StaticHoister;

impl StaticHoister {
    /// Create a new hoister
    pub fn new() -> Self {
        Self
    }

    /// Replace hinted static subtrees with precomputed fragments
    pub fn hoist(&self, program: &Program) -> Program {
        let mut hoisted = program.clone();
        let count = self.hoist_block(&mut hoisted.block, &program.static_hints);
        if count > 0 {
            tracing::debug!(fragments = count, "static hoisting");
        }
        hoisted
    }

    fn hoist_block(&self, block: &mut Block, hints: &BTreeSet<ValueId>) -> usize {
        let mut count = 0;
        for inst in &mut block.instructions {
            for nested in inst.nested_blocks_mut() {
                count += self.hoist_block(nested, hints);
            }
        }

        let tree = BlockTree::new(&block.instructions);
        let mut fragments: HashMap<ValueId, StaticNode> = HashMap::new();
        let mut covered: HashSet<ValueId> = HashSet::new();

        // Pre-order: a parent is always considered before its descendants
        for id in block.defined_ids() {
            if covered.contains(&id) || !hints.contains(&id) {
                continue;
            }
            if let Some(node) = tree.static_node(id) {
                tree.collect_subtree(id, &mut covered);
                fragments.insert(id, node);
            }
        }

        if fragments.is_empty() {
            return count;
        }
        count += fragments.len();

        let instructions = std::mem::take(&mut block.instructions);
        block.instructions = instructions
            .into_iter()
            .filter_map(|inst| {
                let target = inst.target();
                match fragments.remove(&target) {
                    Some(node) if inst.defines_value() => {
                        Some(Instruction::Static { target, node })
                    }
                    Some(node) => {
                        // decoration seen before the definition; keep the fragment
                        fragments.insert(target, node);
                        None
                    }
                    None if covered.contains(&target) => None,
                    None => Some(inst),
                }
            })
            .collect();
        count
    }
}

impl Default for StaticHoister {
    fn default() -> Self {
        Self::new()
    }
}

/// Tree view over one instruction list
struct BlockTree<'a> {
    definitions: HashMap<ValueId, &'a Instruction>,
    decorations: HashMap<ValueId, Vec<&'a Instruction>>,
    children: HashMap<ValueId, Vec<ValueId>>,
}

impl<'a> BlockTree<'a> {
    fn new(instructions: &'a [Instruction]) -> Self {
        let mut tree = Self {
            definitions: HashMap::new(),
            decorations: HashMap::new(),
            children: HashMap::new(),
        };

        for inst in instructions {
            match inst {
                Instruction::Append { target, child } => {
                    tree.children.entry(*target).or_default().push(*child);
                }
                Instruction::Attr { target, .. } | Instruction::Event { target, .. } => {
                    tree.decorations.entry(*target).or_default().push(inst);
                }
                _ => {
                    tree.definitions.insert(inst.target(), inst);
                }
            }
        }
        tree
    }

    /// Fragment for `id`, if its whole subtree is hoistable
    fn static_node(&self, id: ValueId) -> Option<StaticNode> {
        match self.definitions.get(&id)? {
            Instruction::Text { value, .. } => Some(StaticNode::Text(value.clone())),
            Instruction::Create {
                tag,
                component: false,
                ..
            } => {
                let mut attributes = Vec::new();
                for decoration in self.decorations.get(&id).into_iter().flatten() {
                    match decoration {
                        Instruction::Attr { name, value, .. } if !name.starts_with("style:") => {
                            match value {
                                AttributeValue::Literal(v) => {
                                    attributes.push((name.clone(), Some(v.clone())))
                                }
                                AttributeValue::Flag => attributes.push((name.clone(), None)),
                                AttributeValue::Dynamic(_) => return None,
                            }
                        }
                        _ => return None,
                    }
                }

                let children = self
                    .children
                    .get(&id)
                    .into_iter()
                    .flatten()
                    .map(|child| self.static_node(*child))
                    .collect::<Option<Vec<_>>>()?;

                Some(StaticNode::Element {
                    tag: tag.clone(),
                    attributes,
                    children,
                })
            }
            _ => None,
        }
    }

    fn collect_subtree(&self, id: ValueId, out: &mut HashSet<ValueId>) {
        out.insert(id);
        for child in self.children.get(&id).into_iter().flatten() {
            self.collect_subtree(*child, out);
        }
    }
}
