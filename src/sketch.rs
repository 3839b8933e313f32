//! Static checks for Python sketches run through the shim.
//!
//! A sketch must define `setup()` and `draw()` at top level. Calls to names the
//! shim does not forward are reported so they surface before the page loads.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::SketchError;
use crate::lexer::{lex, LineIndex};
use crate::shim::emit::{callable_names, CONSTANTS};
use crate::shim::GLOBALS;
use crate::token::{Spanned, Token};

/// Functions every sketch must define.
pub const REQUIRED: &[&str] = &["setup", "draw"];

/// Event handlers the engine calls when present.
pub const HANDLERS: &[&str] = &[
    "mousePressed",
    "mouseReleased",
    "mouseMoved",
    "mouseDragged",
    "keyPressed",
    "keyReleased",
    "keyTyped",
    "windowResized",
];

const PY_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bool", "dict", "enumerate", "filter", "float", "int", "isinstance",
    "len", "list", "map", "max", "min", "object", "print", "range", "reversed", "round", "set",
    "sorted", "str", "sum", "super", "tuple", "type", "zip",
];

const PY_KEYWORDS: &[&str] = &[
    "and", "assert", "del", "elif", "else", "except", "for", "global", "if", "in", "is",
    "lambda", "nonlocal", "not", "or", "raise", "return", "while", "with", "yield",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name: String,
    pub line: usize,
    /// Defined at column one, outside any class or function body.
    pub top_level: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub name: String,
    pub line: usize,
}

/// What the checker learned about a sketch.
#[derive(Debug, Default, Serialize)]
pub struct Sketch {
    pub functions: Vec<Definition>,
    pub classes: Vec<Definition>,
    pub imports: Vec<String>,
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.line {
            Some(line) => write!(f, "{label}: line {line}: {}", self.message),
            None => write!(f, "{label}: {}", self.message),
        }
    }
}

/// Lex and scan a sketch.
pub fn analyze(source: &str) -> Result<Sketch, SketchError> {
    let tokens = lex(source)?;
    Ok(scan(source, &tokens))
}

fn ident(tok: Option<&Spanned>) -> Option<&str> {
    match tok.map(|t| &t.token) {
        Some(Token::Ident(name)) => Some(name),
        _ => None,
    }
}

fn scan(source: &str, tokens: &[Spanned]) -> Sketch {
    let mut sketch = Sketch::default();
    let lines = LineIndex::new(source);

    for (i, tok) in tokens.iter().enumerate() {
        let (line, col) = lines.line_col(tok.span.start);
        match &tok.token {
            Token::Def | Token::Class => {
                if let Some(name) = ident(tokens.get(i + 1)) {
                    let def = Definition {
                        name: name.to_string(),
                        line,
                        top_level: col == 1,
                    };
                    if tok.token == Token::Def {
                        sketch.functions.push(def);
                    } else {
                        sketch.classes.push(def);
                    }
                }
            }
            Token::Import | Token::As => {
                // `import a, b` and `... as c` bind names; `from m import x` too.
                let mut j = i + 1;
                while let Some(name) = ident(tokens.get(j)) {
                    sketch.imports.push(name.to_string());
                    if tokens.get(j + 1).map(|t| &t.token) != Some(&Token::Comma) {
                        break;
                    }
                    j += 2;
                }
            }
            Token::Ident(name) => {
                let called = tokens.get(i + 1).map(|t| &t.token) == Some(&Token::LParen);
                let prev = i.checked_sub(1).and_then(|p| tokens.get(p)).map(|t| &t.token);
                let bound = matches!(prev, Some(Token::Dot | Token::Def | Token::Class));
                if called && !bound && !PY_KEYWORDS.contains(&name.as_str()) {
                    sketch.calls.push(Call {
                        name: name.clone(),
                        line,
                    });
                }
            }
            _ => {}
        }
    }

    sketch
}

impl Sketch {
    fn defines(&self, name: &str) -> bool {
        self.functions.iter().any(|d| d.name == name)
            || self.classes.iter().any(|d| d.name == name)
            || self.imports.iter().any(|n| n == name)
    }

    fn top_level<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Definition> + 'a {
        self.functions
            .iter()
            .filter(move |d| d.top_level && d.name == name)
    }

    /// Optional handlers the sketch defines at top level.
    pub fn handlers(&self) -> Vec<&'static str> {
        HANDLERS
            .iter()
            .copied()
            .filter(|h| self.top_level(h).next().is_some())
            .collect()
    }

    /// Check the sketch against the shim. With `strict`, unknown calls are errors.
    pub fn check(&self, strict: bool) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        for &name in REQUIRED {
            let defs: Vec<_> = self.top_level(name).collect();
            match defs.as_slice() {
                [] => diags.push(Diagnostic {
                    severity: Severity::Error,
                    line: None,
                    message: format!("sketch must define {name}() at top level"),
                }),
                [_] => {}
                [.., last] => diags.push(Diagnostic {
                    severity: Severity::Warning,
                    line: Some(last.line),
                    message: format!("{name}() is defined {} times; the last one wins", defs.len()),
                }),
            }
        }

        let known: BTreeSet<&str> = callable_names()
            .into_iter()
            .chain(CONSTANTS.iter().copied())
            .chain(GLOBALS.iter().copied())
            .chain(PY_BUILTINS.iter().copied())
            .collect();

        let mut reported = BTreeSet::new();
        for call in &self.calls {
            let name = call.name.as_str();
            if known.contains(name) || self.defines(name) || !reported.insert(name) {
                continue;
            }
            diags.push(Diagnostic {
                severity: if strict {
                    Severity::Error
                } else {
                    Severity::Warning
                },
                line: Some(call.line),
                message: format!("{name}() is not forwarded by the shim"),
            });
        }

        diags
    }
}

pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(|d| d.severity == Severity::Error)
}
