//! Parameter name inference from callable source text
//!
//! This is heuristic text matching, not a parser. Only the leading signature
//! of the text is examined, so closures or nested functions inside a body
//! never contribute parameters. Anything unrecognised yields no parameters.

use std::sync::OnceLock;

use regex::Regex;

use crate::container::key::Key;

/// Signature shape recognised in a callable's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureForm {
    /// `function name(a, b) {`
    Function,
    /// `class Name { ... constructor(a, b) { ... } }`
    ClassConstructor,
    /// `name(a, b) {` as produced by a detached class method
    Method,
    /// `(a, b) => ...`
    Arrow,
    /// `a => ...`
    BareArrow,
    /// `|a, b| ...` or `move |a: T| ...`
    Closure,
    /// `fn name(a: T, b: U)`
    RustFn,
}

/// Leading signature found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub form: SignatureForm,
    pub parameters: Vec<String>,
}

struct Patterns {
    function: Regex,
    class: Regex,
    constructor: Regex,
    method: Regex,
    arrow: Regex,
    bare_arrow: Regex,
    closure: Regex,
    rust_fn: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                function: Regex::new(r"^function[^(]*\(([\s\w$,]*?)\)").ok()?,
                class: Regex::new(r"^class\s").ok()?,
                constructor: Regex::new(r"[\s}{;]constructor\s*\(([\s\w$,]*?)\)").ok()?,
                method: Regex::new(r"^[\w$]*\s*\(([\s\w$,]*?)\)\s*\{").ok()?,
                arrow: Regex::new(r"^\(([\s\w$,]*?)\)\s*=>").ok()?,
                bare_arrow: Regex::new(r"^([^=\s(]*)\s*=>").ok()?,
                closure: Regex::new(r"^(?:move\s*)?\|([^|]*)\|").ok()?,
                rust_fn: Regex::new(
                    r"^(?:pub(?:\([^)]*\))?\s+)?(?:(?:async|const|unsafe)\s+)*fn\s+\w+\s*(?:<[^(]*>)?\s*\(",
                )
                .ok()?,
            })
        })
        .as_ref()
}

/// Infer the ordered parameter names declared by a callable's source text
///
/// ```
/// use dizzy_core::container::inference::infer_parameter_names;
///
/// assert_eq!(infer_parameter_names("(one, two) => one + two"), vec!["one", "two"]);
/// assert_eq!(infer_parameter_names("_ => 42"), Vec::<String>::new());
/// assert_eq!(infer_parameter_names("not a callable"), Vec::<String>::new());
/// ```
pub fn infer_parameter_names(source: &str) -> Vec<String> {
    parse_signature(source)
        .map(|signature| signature.parameters)
        .unwrap_or_default()
}

/// Inferred parameter names converted into registry keys
pub fn infer_keys(source: &str) -> Vec<Key> {
    Key::list(infer_parameter_names(source))
}

/// Find the leading signature of `source`, if it has a recognisable one
pub fn parse_signature(source: &str) -> Option<Signature> {
    let patterns = patterns()?;
    let text = source.trim();

    if let Some(list) = capture(&patterns.function, text) {
        return Some(script_signature(SignatureForm::Function, list));
    }

    if patterns.class.is_match(text) {
        return capture(&patterns.constructor, text)
            .map(|list| script_signature(SignatureForm::ClassConstructor, list));
    }

    if let Some(list) = capture(&patterns.method, text) {
        return Some(script_signature(SignatureForm::Method, list));
    }

    if let Some(list) = capture(&patterns.arrow, text) {
        return Some(script_signature(SignatureForm::Arrow, list));
    }

    if let Some(list) = capture(&patterns.bare_arrow, text) {
        // `_` marks a parameter as intentionally unused
        let list = if list == "_" { "" } else { list };
        return Some(script_signature(SignatureForm::BareArrow, list));
    }

    if let Some(list) = capture(&patterns.closure, text) {
        let mut parameters = typed_parameters(list)?;
        if parameters.len() == 1 && parameters[0] == "_" {
            parameters.clear();
        }
        return Some(Signature {
            form: SignatureForm::Closure,
            parameters,
        });
    }

    let header = patterns.rust_fn.find(text)?;
    let list = parenthesized(&text[header.end()..])?;
    Some(Signature {
        form: SignatureForm::RustFn,
        parameters: typed_parameters(list)?,
    })
}

/// Text up to the `)` closing an already opened parenthesis
fn parenthesized(rest: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (index, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(&rest[..index]),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn capture<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|list| list.as_str())
}

fn script_signature(form: SignatureForm, list: &str) -> Signature {
    let parameters = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Signature { form, parameters }
}

/// Split `a: T, mut b: Map<K, V>` into binding names
///
/// Patterns such as `(a, b): (u8, u8)` cannot name a key, so any of them
/// makes the whole list uninferable.
fn typed_parameters(list: &str) -> Option<Vec<String>> {
    let mut names = Vec::new();

    for parameter in split_top_level(list) {
        let binding = parameter.split(':').next().unwrap_or_default().trim();
        let binding = binding.strip_prefix("mut ").unwrap_or(binding).trim();
        let receiver = binding
            .trim_start_matches('&')
            .trim_start_matches(|ch: char| ch == '\'' || ch.is_alphanumeric())
            .trim_start()
            .trim_start_matches("mut ")
            .trim();

        if binding.is_empty() || receiver == "self" || binding.trim_start_matches('&') == "self" {
            continue;
        }
        if !is_identifier(binding) {
            return None;
        }
        names.push(binding.to_string());
    }

    Some(names)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first == '_' || first.is_alphabetic())
        && chars.all(|ch| ch == '_' || ch.is_alphanumeric())
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    let mut previous = None;

    for (index, ch) in list.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            // `->` in `fn(u8) -> u8` closes nothing
            '>' if previous == Some('-') => {}
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
        previous = Some(ch);
    }
    parts.push(&list[start..]);

    parts
}
