//! Free identifier collection for embedded expressions
//!
//! Expressions stay opaque text; this is a lexical scan, good enough to decide which
//! names the generated procedure pulls out of `state`. Property names after `.`,
//! object-literal keys, arrow parameters, keywords and well-known globals are skipped.

use std::collections::HashSet;

const RESERVED: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
    "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
    "super", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var", "void",
    "while", "with", "yield",
];

const GLOBALS: &[&str] = &[
    "Array", "Boolean", "Date", "Infinity", "JSON", "Map", "Math", "NaN", "Number", "Object",
    "Promise", "RegExp", "Set", "String", "Symbol", "console", "document", "isNaN",
    "parseFloat", "parseInt", "window", "state", "events",
];

/// Usable as a `const` name: an identifier that is not a reserved word
pub fn is_binding_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start)
        && chars.all(is_ident_char)
        && !RESERVED.contains(&name)
}

/// Free identifiers of one expression, in first-occurrence order
pub fn free_identifiers(expr: &str) -> Vec<String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut found: Vec<(String, usize, usize)> = Vec::new();
    let mut bound: HashSet<String> = HashSet::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if matches!(c, '"' | '\'' | '`') {
            i = skip_string(&chars, i);
        } else if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
        } else if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            found.push((name, start, i));
        } else {
            i += 1;
        }
    }

    // Arrow parameters: `x => ...` and `(a, b) => ...`
    for (name, _, end) in &found {
        if next_non_space(&chars, *end).is_some_and(|j| starts_with_at(&chars, j, "=>")) {
            bound.insert(name.clone());
        }
    }
    for params in arrow_param_lists(&chars) {
        for (name, start, end) in &found {
            if *start > params.0 && *end <= params.1 {
                bound.insert(name.clone());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut free = Vec::new();
    for (name, start, end) in found {
        if RESERVED.contains(&name.as_str())
            || GLOBALS.contains(&name.as_str())
            || bound.contains(&name)
            || is_member_access(&chars, start)
            || is_object_key(&chars, start, end)
        {
            continue;
        }
        if seen.insert(name.clone()) {
            free.push(name);
        }
    }
    free
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Index just past the string literal starting at `start`
fn skip_string(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

fn prev_non_space(chars: &[char], before: usize) -> Option<usize> {
    (0..before).rev().find(|&j| !chars[j].is_whitespace())
}

fn next_non_space(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len()).find(|&j| !chars[j].is_whitespace())
}

fn starts_with_at(chars: &[char], at: usize, pattern: &str) -> bool {
    pattern
        .chars()
        .enumerate()
        .all(|(k, p)| chars.get(at + k) == Some(&p))
}

/// `a.b` (but not spread `...b`)
fn is_member_access(chars: &[char], start: usize) -> bool {
    match prev_non_space(chars, start) {
        Some(j) if chars[j] == '.' => !(j >= 2 && chars[j - 1] == '.' && chars[j - 2] == '.'),
        _ => false,
    }
}

/// `{ key: value }` or `, key: value`
fn is_object_key(chars: &[char], start: usize, end: usize) -> bool {
    let followed_by_colon = next_non_space(chars, end).is_some_and(|j| chars[j] == ':');
    let after_brace_or_comma =
        prev_non_space(chars, start).is_some_and(|j| matches!(chars[j], '{' | ','));
    followed_by_colon && after_brace_or_comma
}

/// `(open, close)` index pairs of parenthesized lists followed by `=>`
fn arrow_param_lists(chars: &[char]) -> Vec<(usize, usize)> {
    let mut lists = Vec::new();
    let mut stack = Vec::new();
    for (i, c) in chars.iter().enumerate() {
        match c {
            '(' => stack.push(i),
            ')' => {
                if let Some(open) = stack.pop() {
                    if next_non_space(chars, i + 1).is_some_and(|j| starts_with_at(chars, j, "=>")) {
                        lists.push((open, i));
                    }
                }
            }
            _ => {}
        }
    }
    lists
}
