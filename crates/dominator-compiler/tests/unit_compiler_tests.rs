//! Unit tests for the template compiler
//!
//! Covers SSA lowering, root and id invariants across nested blocks, the optimizer
//! passes as seen through the full pipeline, and generated JavaScript.

use dominator_compiler::*;
use dominator_core::ir::{Block, Instruction, Program, ValueId};
use dominator_parser::{ParseError, ParseMode};
use pretty_assertions::assert_eq;

fn ops(block: &Block) -> Vec<String> {
    block.iter().map(ToString::to_string).collect()
}

fn ir(source: &str) -> Program {
    Compiler::new().compile_to_ir(source).expect("compile")
}

fn all_blocks(block: &Block) -> Vec<&Block> {
    let mut blocks = vec![block];
    for inst in &block.instructions {
        for nested in inst.nested_blocks() {
            blocks.extend(all_blocks(nested));
        }
    }
    blocks
}

// =============================================================================
// SSA lowering
// =============================================================================

#[test]
fn test_scenario_element_with_expression() {
    let program = ir(r#"<div class="x">{name}</div>"#);

    assert_eq!(
        ops(&program.block),
        vec![
            "create v0 div",
            "attr v0 class=Literal(\"x\")",
            "expr v1 {name}",
            "append v0 <- v1",
        ]
    );
    assert_eq!(program.root(), Some(ValueId(0)));
}

#[test]
fn test_scenario_each_block() {
    let program = ir("{#each items as item}<li>{item}</li>{/each}");

    assert_eq!(ops(&program.block), vec!["each v0 items as item [3 instructions]"]);
    let Instruction::Each { body, key, .. } = &program.block.instructions[0] else {
        panic!("expected each");
    };
    assert_eq!(
        ops(body),
        vec!["create v1 li", "expr v2 {item}", "append v1 <- v2"]
    );
    assert_eq!(body.root, Some(ValueId(1)));
    assert_eq!(*key, None);
}

#[test]
fn test_root_uniqueness_and_id_monotonicity() {
    let program = ir(concat!(
        "<ul>",
        "{#each rows as row}<li>{row.name}</li>{/each}",
        "{#if empty}<p>none</p>{:else}<span>{count}</span>{/if}",
        "</ul>"
    ));

    for block in all_blocks(&program.block) {
        let unclaimed = block.unclaimed_ids();
        assert_eq!(unclaimed.len(), 1, "block {:?}", ops(block));
        assert_eq!(block.root, Some(unclaimed[0]));
    }

    let mut ids = Vec::new();
    program.block.walk(&mut |inst, _| {
        if inst.defines_value() {
            ids.push(inst.target());
        }
    });
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids: {:?}", ids);
}

#[test]
fn test_else_if_chain_lowers_to_nested_if() {
    let program = ir("{#if a}<b>1</b>{:else if c}<i>2</i>{:else}<u>3</u>{/if}");

    assert_eq!(ops(&program.block), vec!["if v0 a [1 / 1 instructions]"]);
    let Instruction::If {
        then_block,
        else_block: Some(else_block),
        ..
    } = &program.block.instructions[0]
    else {
        panic!("expected if with else");
    };
    assert!(matches!(then_block.instructions[0], Instruction::Static { .. }));
    assert!(matches!(
        &else_block.instructions[0],
        Instruction::If { condition, else_block: Some(_), .. } if condition == "c"
    ));
}

#[test]
fn test_keyed_each_records_key() {
    let program = ir("<ul>{#each todos as todo (todo.id)}<li>{todo.title}</li>{/each}</ul>");

    assert!(matches!(
        &program.block.instructions[1],
        Instruction::Each { key: Some(key), binding, .. } if key == "todo.id" && binding == "todo"
    ));
}

#[test]
fn test_id_seed() {
    let compiler = Compiler::with_options(CompilerOptions::default().with_id_seed(100));
    let program = compiler.compile_to_ir("<p>{x}</p>").unwrap();
    assert_eq!(program.root(), Some(ValueId(100)));
    assert_eq!(ops(&program.block)[1], "expr v101 {x}");
}

#[test]
fn test_ir_json_roundtrip() {
    let program = ir("{#if ok}<b>{who}</b>{/if}");
    let json = serde_json::to_string(&program).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);
}

// =============================================================================
// Optimizer through the pipeline
// =============================================================================

#[test]
fn test_constant_expression_becomes_text() {
    let program = ir(r#"<p>{"hi"}</p>"#);
    assert_eq!(
        ops(&program.block),
        vec!["create v0 p", "text v1 \"hi\"", "append v0 <- v1"]
    );
}

#[test]
fn test_static_subtree_is_hoisted() {
    let program = ir(r#"<p class="a"><b>x</b></p>"#);

    assert_eq!(program.block.instructions.len(), 1);
    let Instruction::Static { target, node } = &program.block.instructions[0] else {
        panic!("expected static, got {}", program.block.instructions[0]);
    };
    assert_eq!(*target, ValueId(0));
    assert_eq!(node.to_html(), r#"<p class="a"><b>x</b></p>"#);
}

#[test]
fn test_optimizations_can_be_disabled() {
    let compiler = Compiler::with_options(CompilerOptions::default().with_optimizations(false));
    let program = compiler.compile_to_ir(r#"<p class="a"><b>x</b></p>"#).unwrap();

    assert_eq!(program.block.instructions.len(), 6);
    assert!(program.static_hints.is_empty());
    assert!(!program
        .block
        .iter()
        .any(|inst| matches!(inst, Instruction::Static { .. })));
}

// =============================================================================
// Code generation
// =============================================================================

#[test]
fn test_generated_module_for_element() {
    let code = compile(r#"<div class="x">{name}</div>"#, None).unwrap();

    let expected = [
        "import { effect } from '@dominator/core';",
        "",
        "export const render = (state, events) => {",
        "  const { name } = state;",
        "  const v0 = document.createElement('div');",
        "  v0.setAttribute('class', \"x\");",
        "  const v1 = document.createTextNode('');",
        "  effect(() => { v1.textContent = String(name); });",
        "  v0.appendChild(v1);",
        "  return v0;",
        "};",
        "",
    ]
    .join("\n");
    assert_eq!(code, expected);
}

/// Trimmed, non-empty lines of generated code
fn lines(code: &str) -> Vec<&str> {
    code.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
}

fn has_sequence(code: &str, expected: &[&str]) -> bool {
    lines(code).windows(expected.len()).any(|window| window == expected)
}

#[test]
fn test_generated_each_rebuilds_rows() {
    let code = compile("{#each items as item}<li>{item}</li>{/each}", Some("list")).unwrap();

    assert!(code.contains("export const list = (state, events) => {"));
    assert!(code.contains("const { items } = state;"));
    assert!(code.contains("const v0_anchor = document.createComment('each');"));
    assert!(has_sequence(
        &code,
        &[
            "for (const v0_row of v0_rows) __unmount(v0_row);",
            "v0_rows = [];",
            "for (const item of (items) || []) {",
            "const v0_row = __region(null);",
            "const v0_row_node = (() => {",
            "const v1 = document.createElement('li');",
            "const v2 = document.createTextNode('');",
            "effect(() => { if (!__live(v0_row)) return; v2.textContent = String(item); });",
            "v1.appendChild(v2);",
            "return v1;",
            "})();",
            "__mount(v0_row, v0_row_node, v0_anchor);",
            "v0_rows.push(v0_row);",
        ]
    ));
}

#[test]
fn test_generated_keyed_each_reuses_rows() {
    let code = compile(
        "<ul>{#each todos as todo (todo.id)}<li>{todo.title}</li>{/each}</ul>",
        None,
    )
    .unwrap();

    assert!(code.contains("const { todos } = state;"));
    assert!(code.contains("let v1_rows = [];"));
    assert!(has_sequence(
        &code,
        &[
            "const v1_key = (todo.id);",
            "let v1_entry = (v1_old.get(v1_key) || []).shift();",
            "if (v1_entry === undefined) {",
            "const v1_row = __region(null);",
        ]
    ));
    assert!(has_sequence(
        &code,
        &[
            "v1_entry = { key: v1_key, region: v1_row };",
            "}",
            "else __move(v1_entry.region, v1_anchor);",
            "v1_next.push(v1_entry);",
            "}",
            "for (const v1_queue of v1_old.values()) for (const v1_entry of v1_queue) __unmount(v1_entry.region);",
            "v1_rows = v1_next;",
        ]
    ));
}

#[test]
fn test_generated_if_swaps_on_truthiness() {
    let code = compile("<div>{#if open}<b>{label}</b>{:else}{/if}</div>", None).unwrap();

    assert!(code.contains("const { open, label } = state;"));
    assert!(has_sequence(
        &code,
        &[
            "const v1_next = !!(open);",
            "if (v1_next === v1_branch) return;",
            "v1_branch = v1_next;",
            "if (v1_current) __unmount(v1_current);",
            "v1_current = null;",
            "if (v1_next) {",
            "const v1_region = __region(null);",
        ]
    ));
    // empty else branch renders a placeholder
    assert!(code.contains("return document.createTextNode('');"));
}

#[test]
fn test_generated_else_if_removes_nested_regions() {
    let code = compile("{#if a}<b>{x}</b>{:else if c}<i>{y}</i>{/if}", None).unwrap();

    // branches are removed node by node between their markers, never as a fragment
    assert!(!code.contains(".remove()"));
    assert!(has_sequence(
        &code,
        &[
            "const __unmount = (region) => {",
            "region.live = false;",
            "for (const n of __nodes(region)) n.parentNode.removeChild(n);",
        ]
    ));

    // the inner if lives in the outer else region and stops with it
    assert!(has_sequence(
        &code,
        &[
            "else {",
            "const v0_region = __region(null);",
            "const v0_region_node = (() => {",
            "const v3 = document.createDocumentFragment();",
            "const v3_anchor = document.createComment('if');",
            "v3.appendChild(v3_anchor);",
            "let v3_current = null;",
            "let v3_branch;",
            "effect(() => {",
            "if (!__live(v0_region)) return;",
            "const v3_next = !!(c);",
        ]
    ));
    assert!(code.contains("const v3_region = __region(v0_region);"));
    assert!(code.contains(
        "effect(() => { if (!__live(v3_region)) return; v5.textContent = String(y); });"
    ));
    assert!(has_sequence(
        &code,
        &["return v3;", "})();", "__mount(v0_region, v0_region_node, v0_anchor);"]
    ));
}

#[test]
fn test_generated_events() {
    let code = compile(
        r#"<button onClick={(e) => save(e)} onInput="typed">go</button>"#,
        None,
    )
    .unwrap();

    assert!(code.contains("const { save } = state;"));
    assert!(code.contains("v0.addEventListener('click', (e) => save(e));"));
    assert!(code.contains("v0.addEventListener('input', (e) => events.typed(e));"));
}

#[test]
fn test_generated_dynamic_and_style_attributes() {
    let code = compile(r#"<p title={tip} style:color={tone}>x</p>"#, None).unwrap();

    assert!(code.contains("effect(() => { v0.setAttribute('title', (tip)); });"));
    assert!(code.contains("effect(() => { v0.style.setProperty('color', (tone)); });"));
}

#[test]
fn test_generated_component_call() {
    let code = compile("<div><Counter/></div>", None).unwrap();
    assert!(code.contains("const { Counter } = state;"));
    assert!(code.contains("const v1 = Counter(state, events);"));
}

#[test]
fn test_generated_static_fragment_is_cloned() {
    let code = compile(r#"<p class="a"><b>x</b></p>"#, None).unwrap();

    assert!(code.contains("const __template = (html) => {"));
    assert!(code.contains(r#"const __static0 = __template("<p class=\"a\"><b>x</b></p>");"#));
    assert!(code.contains("const v0 = __static0.cloneNode(true);"));
    assert!(!code.contains("= state;"));
}

#[test]
fn test_custom_runtime_module() {
    let compiler =
        Compiler::with_options(CompilerOptions::default().with_runtime_module("./reactive.js"));
    let compiled = compiler.compile("<p>{x}</p>").unwrap();
    assert!(compiled.code.starts_with("import { effect } from './reactive.js';\n"));
    assert_eq!(compiled.program.root(), Some(ValueId(0)));
}

#[test]
fn test_compile_is_deterministic() {
    let source = concat!(
        "<section class=\"card\">",
        "<h1>Todos</h1>",
        "{#each todos as todo (todo.id)}<p onClick={() => toggle(todo)}>{todo.title}</p>{/each}",
        "{#if todos.length}<span>{todos.length}</span>{:else}<em>none</em>{/if}",
        "</section>"
    );
    assert_eq!(
        compile(source, Some("view")).unwrap(),
        compile(source, Some("view")).unwrap()
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_empty_template_is_rejected() {
    assert_eq!(
        compile("", None).unwrap_err(),
        CompileError::Lowering(LoweringError::EmptyTemplate)
    );
    assert_eq!(
        compile("  \n  ", None).unwrap_err(),
        CompileError::Lowering(LoweringError::EmptyTemplate)
    );
}

#[test]
fn test_multiple_roots_are_rejected() {
    assert_eq!(
        compile("<a></a><b></b>", None).unwrap_err(),
        CompileError::Lowering(LoweringError::MultipleRoots {
            roots: vec![ValueId(0), ValueId(1)]
        })
    );

    assert_eq!(
        compile("{#if a}<b></b><i></i>{/if}", None).unwrap_err(),
        CompileError::Lowering(LoweringError::MultipleRoots {
            roots: vec![ValueId(1), ValueId(2)]
        })
    );
}

#[test]
fn test_mismatched_close_tag_depends_on_mode() {
    let err = compile("<div></span>", None).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Parse(ParseError::MismatchedCloseTag { ref expected, ref found, .. })
            if expected == "div" && found == "span"
    ));

    let lax = Compiler::with_options(CompilerOptions::default().with_parse_mode(ParseMode::Lax));
    let program = lax.compile_to_ir("<div></span>").unwrap();
    assert_eq!(ops(&program.block), vec!["static v0 <div></div>"]);
}

#[test]
fn test_flag_event_handler_is_rejected() {
    assert_eq!(
        compile("<button onClick>go</button>", None).unwrap_err(),
        CompileError::Lowering(LoweringError::InvalidEventHandler {
            attribute: "onClick".to_string()
        })
    );
}

#[test]
fn test_names_must_be_javascript_identifiers() {
    assert_eq!(
        compile("<p>{x}</p>", Some("foo-bar")).unwrap_err(),
        CompileError::Lowering(LoweringError::InvalidIdentifier {
            name: "foo-bar".to_string(),
            usage: "the exported procedure",
        })
    );
    assert!(compile("<p>{x}</p>", Some("class")).is_err());

    assert_eq!(
        compile("<div><My-Card/></div>", None).unwrap_err(),
        CompileError::Lowering(LoweringError::InvalidIdentifier {
            name: "My-Card".to_string(),
            usage: "a component",
        })
    );
    // still valid IR; only the JavaScript binding is impossible
    assert!(Compiler::new().compile_to_ir("<div><My-Card/></div>").is_ok());
}
