//! Identifier derivation for generated Python code

use convert_case::{Boundary, Case, Casing};
use std::collections::BTreeSet;

/// Python keywords; identifiers matching one get a trailing underscore
pub const PYTHON_RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const WORD_BOUNDARIES: [Boundary; 6] = [
    Boundary::Underscore,
    Boundary::Hyphen,
    Boundary::Space,
    Boundary::LowerUpper,
    Boundary::Acronym,
    Boundary::DigitUpper,
];

/// Convert a Solidity identifier to snake_case.
///
/// Acronym runs form a single word (`getETHBalance` -> `get_eth_balance`),
/// snake_case input is returned unchanged and leading underscores are kept.
pub fn to_snake_case(name: &str) -> String {
    let body = name.trim_start_matches('_');
    let prefix = &name[..name.len() - body.len()];

    if is_snake_case(body) {
        return name.to_string();
    }

    let converted = body.with_boundaries(&WORD_BOUNDARIES).to_case(Case::Snake);
    format!("{}{}", prefix, converted)
}

fn is_snake_case(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Append `_` to Python keywords
pub fn escape_reserved(ident: &str) -> String {
    if PYTHON_RESERVED.contains(&ident) {
        format!("{}_", ident)
    } else {
        ident.to_string()
    }
}

/// snake_case, Python-safe identifier for a Solidity name
pub fn canonical_identifier(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let mut ident = escape_reserved(&to_snake_case(&cleaned));
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Reserve `base` in `taken`, suffixing `_1`, `_2`, ... on collision
pub fn unique_name(base: &str, taken: &mut BTreeSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}", base, counter);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Directory/package name for a server display name
pub fn sanitize_package_name(name: &str) -> String {
    let snake = name
        .with_boundaries(&WORD_BOUNDARIES)
        .to_case(Case::Snake);

    let mut package = String::with_capacity(snake.len());
    for c in snake.chars() {
        let c = if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' };
        if c == '_' && package.ends_with('_') {
            continue;
        }
        package.push(c);
    }

    let package = package.trim_matches('_');
    if package.is_empty() {
        "contract".to_string()
    } else if package.starts_with(|c: char| c.is_ascii_digit()) {
        format!("contract_{}", package)
    } else {
        package.to_string()
    }
}
