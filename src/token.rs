use std::ops::Range;

use logos::Logos;

/// Tokens produced by lexing a sketch.
///
/// Only what the sketch checker needs is distinguished: definitions, names,
/// call parentheses and attribute dots. Strings and numbers are opaque, and
/// every other operator collapses into `Op`.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+|\\[ \t]*\r?\n|#[^\n]*")]
pub enum Token {
    // ── Keywords that introduce names ──────────────────────────────────
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("import")]
    Import,
    #[token("from")]
    From,
    #[token("as")]
    As,

    // ── Literals ───────────────────────────────────────────────────────
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?[jJ]?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[jJ]?")]
    #[regex(r"0[xXoObB][0-9a-fA-F_]+")]
    Number,

    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?"""([^"]|"[^"]|""[^"])*""""#)]
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?'''([^']|'[^']|''[^'])*'''"#)]
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?"([^"\\\n]|\\.)*""#)]
    #[regex(r#"([rRbBuUfF]|[rR][bBfF]|[bBfF][rR])?'([^'\\\n]|\\.)*'"#)]
    Str,

    // ── Names ──────────────────────────────────────────────────────────
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 1, callback = |lex| lex.slice().to_string())]
    Ident(String),

    // ── Punctuation ────────────────────────────────────────────────────
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[regex(r"[-+*/%<>=!&|^~@:;\[\]{}]")]
    Op,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}
