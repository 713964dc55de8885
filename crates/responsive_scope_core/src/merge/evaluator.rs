//! Declaration text evaluation boundary.
//!
//! # Responsibility
//! - Define the one seam through which declaration text becomes a value.
//! - Provide a data-only evaluator that never executes code.
//!
//! # Invariants
//! - `JsonDeclarationEvaluator` accepts JSON with bare identifier keys,
//!   single-quoted strings and trailing commas, plus zero-argument factory
//!   wrappers around such a body. Anything else is an evaluation error,
//!   never a partial value.
//! - Factory bodies are parsed eagerly; invoking the callable cannot fail.

use crate::merge::declared::{
    classify, DeclaredFactory, DeclaredShape, DeclaredStateError, DeclaredValue,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ARROW_EXPRESSION_BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\(\s*\)\s*=>\s*\((.*)\)$").expect("valid arrow expression regex")
});
static ARROW_BLOCK_BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\(\s*\)\s*=>\s*\{\s*return\s+(.*?);?\s*\}$")
        .expect("valid arrow block regex")
});
static FUNCTION_BODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?:function\s*)?(?:[A-Za-z_$][\w$]*)?\s*\(\s*\)\s*\{\s*return\s+(.*?);?\s*\}$",
    )
    .expect("valid function body regex")
});

/// Output of evaluating declaration text.
pub enum Evaluated {
    Callable(DeclaredFactory),
    Value(DeclaredValue),
}

/// Turns declaration text into a value or a zero-argument callable.
pub trait DeclarationEvaluator {
    fn evaluate(&self, source: &str) -> Result<Evaluated, DeclaredStateError>;
}

/// Data-only evaluator for JSON-like declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeclarationEvaluator;

impl JsonDeclarationEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn factory_body(source: &str) -> Option<&str> {
        for re in [&*ARROW_EXPRESSION_BODY_RE, &*ARROW_BLOCK_BODY_RE] {
            if let Some(body) = re.captures(source).and_then(|caps| caps.get(1)) {
                return Some(body.as_str());
            }
        }
        FUNCTION_BODY_RE
            .captures(source)
            .and_then(|caps| caps.get(1))
            .map(|body| body.as_str())
    }
}

impl DeclarationEvaluator for JsonDeclarationEvaluator {
    fn evaluate(&self, source: &str) -> Result<Evaluated, DeclaredStateError> {
        let trimmed = source.trim();
        let shape = classify(trimmed);

        if shape == DeclaredShape::Factory {
            if let Some(body) = Self::factory_body(trimmed) {
                let value = parse_relaxed_json(body, shape)?;
                let factory: DeclaredFactory = Box::new(move || Ok(value));
                return Ok(Evaluated::Callable(factory));
            }
            // A parenthesised non-callable evaluates to its inner value.
            if let Some(inner) = trimmed
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
            {
                return self.evaluate(inner);
            }
        }

        parse_relaxed_json(trimmed, shape).map(Evaluated::Value)
    }
}

/// Parses JSON with relaxed object syntax.
///
/// Accepts bare identifier keys, single-quoted strings and trailing commas.
pub fn parse_relaxed_json(
    text: &str,
    shape: DeclaredShape,
) -> Result<DeclaredValue, DeclaredStateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DeclaredStateError::Syntax {
            shape,
            message: "declaration is empty".to_string(),
        });
    }
    let strict = to_strict_json(trimmed)
        .map_err(|message| DeclaredStateError::Syntax { shape, message })?;
    serde_json::from_str::<Value>(&strict)
        .map(DeclaredValue::from)
        .map_err(|err| {
            if err.is_syntax() || err.is_eof() {
                DeclaredStateError::Syntax {
                    shape,
                    message: err.to_string(),
                }
            } else {
                DeclaredStateError::Evaluation(err.to_string())
            }
        })
}

/// Rewrites relaxed syntax into strict JSON. String contents are copied
/// as data and never rewritten.
fn to_strict_json(text: &str) -> Result<String, String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut index = 0;
    while index < chars.len() {
        match chars[index] {
            '"' | '\'' => index = copy_string(&chars, index, &mut out)?,
            ',' => {
                if !matches!(next_significant(&chars, index + 1), Some('}' | ']')) {
                    out.push(',');
                }
                index += 1;
            }
            current if is_identifier_start(current) => {
                let start = index;
                while index < chars.len() && is_identifier_part(chars[index]) {
                    index += 1;
                }
                let word: String = chars[start..index].iter().collect();
                let in_key_position = matches!(out.trim_end().chars().last(), Some('{' | ','));
                if in_key_position && next_significant(&chars, index) == Some(':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else {
                    out.push_str(&word);
                }
            }
            other => {
                out.push(other);
                index += 1;
            }
        }
    }
    Ok(out)
}

/// Copies the string literal opening at `start` as a double-quoted JSON
/// string and returns the index after its closing quote.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> Result<usize, String> {
    let quote = chars[start];
    out.push('"');
    let mut index = start + 1;
    while let Some(&current) = chars.get(index) {
        match current {
            '\\' => {
                let escaped = chars
                    .get(index + 1)
                    .ok_or_else(|| format!("dangling escape at offset {index}"))?;
                if *escaped == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(*escaped);
                }
                index += 2;
            }
            current if current == quote => {
                out.push('"');
                return Ok(index + 1);
            }
            '"' => {
                out.push_str("\\\"");
                index += 1;
            }
            other => {
                out.push(other);
                index += 1;
            }
        }
    }
    Err(format!("unterminated string starting at offset {start}"))
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|current| !current.is_whitespace())
}

fn is_identifier_start(current: char) -> bool {
    current.is_ascii_alphabetic() || current == '_' || current == '$'
}

fn is_identifier_part(current: char) -> bool {
    current.is_ascii_alphanumeric() || current == '_' || current == '$'
}
