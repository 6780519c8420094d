//! Unit tests for the template parser
//!
//! Tests element/component dispatch, control-flow blocks, strict and lax close-tag
//! handling, and error reporting.

use dominator_core::ast::{AttributeValue, EachBlock, IfBlock, Node};
use dominator_parser::*;
use pretty_assertions::assert_eq;

fn program_children(node: Node) -> Vec<Node> {
    match node {
        Node::Program(program) => program.children,
        other => panic!("expected program, got {}", other.kind_name()),
    }
}

fn parse_one(source: &str) -> Node {
    let mut children = program_children(parse(source).expect("parse"));
    assert_eq!(children.len(), 1, "expected one top-level node");
    children.remove(0)
}

/// Structural form without locations, for comparing independent parses
fn shape(node: &Node) -> String {
    match node {
        Node::Program(p) => format!("P[{}]", shapes(&p.children)),
        Node::Element(e) | Node::Component(e) => format!(
            "{}<{} {}>[{}]",
            node.kind_name(),
            e.tag,
            e.attributes.len(),
            shapes(&e.children)
        ),
        Node::Text(t) => format!("T({})", t.value),
        Node::Expression(e) => format!("E({})", e.expression),
        Node::Each(e) => format!(
            "Each({} as {} {:?})[{}]",
            e.expression,
            e.context,
            e.key,
            shapes(&e.children)
        ),
        Node::If(i) => format!(
            "If({})[{}]{}",
            i.expression,
            shapes(&i.children),
            i.else_branch
                .as_ref()
                .map(|e| format!("Else[{}]", shapes(&e.children)))
                .unwrap_or_default()
        ),
        Node::Else(e) => format!("Else[{}]", shapes(&e.children)),
    }
}

fn shapes(nodes: &[Node]) -> String {
    nodes.iter().map(shape).collect::<Vec<_>>().join(",")
}

// =============================================================================
// Elements
// =============================================================================

#[test]
fn test_parse_simple_element() {
    let node = parse_one(r#"<div class="x">{name}</div>"#);

    let Node::Element(div) = node else {
        panic!("expected element");
    };
    assert_eq!(div.tag, "div");
    assert_eq!(
        div.attributes.get("class"),
        Some(&AttributeValue::Literal("x".to_string()))
    );
    assert_eq!(div.children.len(), 1);
    assert!(matches!(
        &div.children[0],
        Node::Expression(e) if e.expression == "name"
    ));
    assert!(!div.self_closing);
}

#[test]
fn test_component_dispatch_by_case() {
    let node = parse_one(r#"<Counter start={1}><span>x</span></Counter>"#);
    let Node::Component(counter) = node else {
        panic!("expected component");
    };
    assert_eq!(counter.tag, "Counter");
    assert!(matches!(counter.children[0], Node::Element(_)));
}

#[test]
fn test_self_closing_element() {
    let node = parse_one(r#"<div><img src="a.png" /><br/></div>"#);
    let children = node.children();
    assert_eq!(children.len(), 2);
    assert!(matches!(&children[0], Node::Element(e) if e.self_closing && e.tag == "img"));
    assert!(matches!(&children[1], Node::Element(e) if e.self_closing && e.tag == "br"));
}

#[test]
fn test_multiple_top_level_nodes() {
    let children = program_children(parse("<h1>a</h1><p>b</p>").unwrap());
    assert_eq!(children.len(), 2);
}

// =============================================================================
// Blocks
// =============================================================================

#[test]
fn test_parse_each() {
    let node = parse_one("{#each items as item}<li>{item}</li>{/each}");

    let Node::Each(EachBlock {
        expression,
        context,
        key,
        children,
        ..
    }) = node
    else {
        panic!("expected each");
    };
    assert_eq!(expression, "items");
    assert_eq!(context, "item");
    assert_eq!(key, None);
    assert_eq!(shapes(&children), "Element<li 0>[E(item)]");
}

#[test]
fn test_parse_keyed_each() {
    let node = parse_one("{#each todos.filter(t => !t.done) as todo (todo.id)}<li>{todo.title}</li>{/each}");
    let Node::Each(each) = node else {
        panic!("expected each");
    };
    assert_eq!(each.expression, "todos.filter(t => !t.done)");
    assert_eq!(each.context, "todo");
    assert_eq!(each.key.as_deref(), Some("todo.id"));
}

#[test]
fn test_parse_if_else() {
    let node = parse_one("{#if user.loggedIn}<p>Hi</p>{:else}<button>Login</button>{/if}");
    assert_eq!(
        shape(&node),
        "If(user.loggedIn)[Element<p 0>[T(Hi)]]Else[Element<button 0>[T(Login)]]"
    );
}

#[test]
fn test_parse_if_without_else() {
    let Node::If(IfBlock { else_branch, .. }) = parse_one("{#if ok}yes{/if}") else {
        panic!("expected if");
    };
    assert!(else_branch.is_none());
}

#[test]
fn test_parse_else_if_chain() {
    let node = parse_one("{#if a}A{:else if b}B{:else if c}C{:else}D{/if}");
    assert_eq!(
        shape(&node),
        "If(a)[T(A)]Else[If(b)[T(B)]Else[If(c)[T(C)]Else[T(D)]]]"
    );
}

#[test]
fn test_nested_blocks() {
    let node = parse_one(
        "<ul>{#each groups as g}{#if g.visible}<li>{g.name}</li>{/if}{/each}</ul>",
    );
    assert_eq!(
        shape(&node),
        "Element<ul 0>[Each(groups as g None)[If(g.visible)[Element<li 0>[E(g.name)]]]]"
    );
}

#[test]
fn test_parse_idempotence() {
    let source = "<div>{#each xs as x (x)}<span class={x.c}>{x.v}</span>{/each}{#if y}<b/>{:else}none{/if}</div>";
    let first = parse(source).unwrap();
    let second = parse(source).unwrap();
    assert_eq!(first, second);
    assert_eq!(shape(&first), shape(&second));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_unsupported_block() {
    let err = parse("{#await promise}x{/await}").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnsupportedBlock { ref header, .. } if header == "await promise"
    ));
}

#[test]
fn test_malformed_each() {
    let err = parse("{#each items}x{/each}").unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { .. }));
    assert!(err.to_string().contains("'as <name>'"));

    let err = parse("{#each items as}x{/each}").unwrap_err();
    assert!(err.to_string().contains("binding name"));
}

#[test]
fn test_malformed_if() {
    let err = parse("{#if}x{/if}").unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { .. }));

    let err = parse("{#if a}x{:otherwise}y{/if}").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));

    let err = parse("{#if a}x{:else when b}y{/if}").unwrap_err();
    assert!(matches!(err, ParseError::MalformedBlock { .. }));
}

#[test]
fn test_unclosed_block() {
    let err = parse("{#each items as item}<li/>").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnclosedBlock { ref kind, .. } if kind == "each"
    ));
}

#[test]
fn test_mismatched_block_close() {
    let err = parse("{#if a}x{/each}").unwrap_err();
    assert_eq!(
        err,
        ParseError::MismatchedBlockClose {
            expected: "if".to_string(),
            found: "each".to_string(),
            loc: dominator_core::SourceLocation::new(1, 9, 8),
        }
    );
}

#[test]
fn test_stray_block_continue() {
    let err = parse("{#each xs as x}a{:else}b{/each}").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

#[test]
fn test_lex_error_propagates() {
    let err = parse("<div class=\"x>").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
}

// =============================================================================
// Strict vs lax close tags
// =============================================================================

#[test]
fn test_strict_rejects_mismatched_close() {
    let err = parse("<div></span>").unwrap_err();
    match err {
        ParseError::MismatchedCloseTag {
            expected, found, ..
        } => {
            assert_eq!(expected, "div");
            assert_eq!(found, "span");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_lax_accepts_mismatched_close() {
    let parser = TemplateParser::with_options(ParserOptions::lax());
    let node = parser.parse("<div></span>").unwrap();
    assert_eq!(shape(&node), "P[Element<div 0>[]]");
}

#[test]
fn test_strict_rejects_unclosed_element() {
    let err = parse("<div><p>text</p>").unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnclosedElement { ref tag, .. } if tag == "div"
    ));
}

#[test]
fn test_lax_tolerates_unclosed_element() {
    let parser = TemplateParser::with_options(ParserOptions::new().with_mode(ParseMode::Lax));
    let node = parser.parse("<div><p>text</p>").unwrap();
    assert_eq!(shape(&node), "P[Element<div 0>[Element<p 0>[T(text)]]]");
}

#[test]
fn test_stray_close_tag() {
    let err = parse("<p>a</p></div>").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedCloseTag { .. }));

    let node = TemplateParser::with_options(ParserOptions::lax())
        .parse("<p>a</p></div><i>b</i>")
        .unwrap();
    assert_eq!(shape(&node), "P[Element<p 0>[T(a)],Element<i 0>[T(b)]]");
}

#[test]
fn test_lax_skips_stray_close_inside_block() {
    let node = TemplateParser::with_options(ParserOptions::lax())
        .parse("{#if ok}a</b>c{/if}")
        .unwrap();
    assert_eq!(shape(&node), "P[If(ok)[T(a),T(c)]]");

    let err = parse("{#if ok}a</b>c{/if}").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedCloseTag { .. }));
}

#[test]
fn test_error_location() {
    let err = parse("<ul>\n  <li></ol>\n</ul>").unwrap_err();
    assert_eq!(err.location().line, 2);
    assert_eq!(err.location().column, 7);
}

#[test]
fn test_ast_serializes_to_json() {
    let node = parse(r#"<p title={tip}>{#each rows as row (row.id)}{row.name}{/each}</p>"#).unwrap();

    let json = serde_json::to_string(&node).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(back, node);
    assert!(json.contains("\"Dynamic\":\"tip\""));
}
