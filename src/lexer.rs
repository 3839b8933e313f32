use logos::Logos;

use crate::error::{SketchError, SketchErrorKind};
use crate::token::{Spanned, Token};

/// Tokenize a sketch into a vector of spanned tokens.
pub fn lex(source: &str) -> Result<Vec<Spanned>, SketchError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => {
                tokens.push(Spanned { token, span });
            }
            Err(()) => {
                let fragment = &source[span.clone()];
                let kind = if opens_string(fragment) {
                    SketchErrorKind::UnterminatedString
                } else {
                    SketchErrorKind::UnrecognizedToken(fragment.to_string())
                };
                return Err(SketchError {
                    kind,
                    span: Some(span),
                });
            }
        }
    }

    Ok(tokens)
}

fn opens_string(fragment: &str) -> bool {
    fragment
        .trim_start_matches(|c: char| "rRbBuUfF".contains(c))
        .starts_with(['"', '\''])
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    LineIndex::new(source).line_col(offset)
}

/// Byte offsets of line starts, for repeated offset to line/column lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            starts,
            len: source.len(),
        }
    }

    /// 1-based line and column of a byte offset. Offsets past the end clamp to it.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = self.starts.partition_point(|&start| start <= offset);
        (line, offset - self.starts[line - 1] + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_small_sketch() {
        let source = r#"
def setup():
    createCanvas(400, 400)  # canvas

def draw():
    background("white")
    c.draw()
"#;

        let tokens = lex(source).expect("lexing should succeed");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.token).collect();

        // def setup ( ) :
        assert_eq!(kinds[0], &Token::Def);
        assert!(matches!(kinds[1], Token::Ident(s) if s == "setup"));
        assert_eq!(kinds[2], &Token::LParen);
        assert_eq!(kinds[3], &Token::RParen);
        assert_eq!(kinds[4], &Token::Op);

        // createCanvas ( 400 , 400 )
        assert!(matches!(kinds[5], Token::Ident(s) if s == "createCanvas"));
        assert_eq!(kinds[6], &Token::LParen);
        assert_eq!(kinds[7], &Token::Number);
        assert_eq!(kinds[8], &Token::Comma);
        assert_eq!(kinds[9], &Token::Number);
        assert_eq!(kinds[10], &Token::RParen);

        // def draw ( ) :
        assert_eq!(kinds[11], &Token::Def);

        // background ( "white" )
        assert!(matches!(kinds[16], Token::Ident(s) if s == "background"));
        assert_eq!(kinds[18], &Token::Str);

        // c . draw ( )
        assert!(matches!(kinds[20], Token::Ident(s) if s == "c"));
        assert_eq!(kinds[21], &Token::Dot);
        assert!(matches!(kinds[22], Token::Ident(s) if s == "draw"));
        assert_eq!(kinds.len(), 25);
    }

    #[test]
    fn lex_string_forms() {
        let source = "a = f\"x{y}\" + r'\\d' + \"\"\"doc\nstring\"\"\" + 'it\\'s'";
        let tokens = lex(source).expect("lexing should succeed");
        let strings = tokens.iter().filter(|t| t.token == Token::Str).count();
        assert_eq!(strings, 4);
    }

    #[test]
    fn lex_keywords_are_not_prefixes() {
        let tokens = lex("define classy fromage").unwrap();
        assert!(tokens.iter().all(|t| matches!(t.token, Token::Ident(_))));
    }

    #[test]
    fn lex_numbers() {
        let tokens = lex("1 2.5 .5 1e3 0xff 1_000").unwrap();
        assert_eq!(tokens.len(), 6);
        assert!(tokens.iter().all(|t| t.token == Token::Number));
    }

    #[test]
    fn lex_error_unrecognized() {
        let err = lex("x = 1 $ 2").unwrap_err();
        assert!(matches!(err.kind, SketchErrorKind::UnrecognizedToken(ref s) if s == "$"));
        assert_eq!(err.span, Some(6..7));
    }

    #[test]
    fn lex_error_unterminated_string() {
        let err = lex("print(\"oops)\nx = 1").unwrap_err();
        assert!(matches!(err.kind, SketchErrorKind::UnterminatedString));
        assert_eq!(err.span.map(|s| s.start), Some(6));
    }

    #[test]
    fn line_col_counts_from_one() {
        let src = "ab\ncd\nef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 4), (2, 2));
        assert_eq!(line_col(src, 6), (3, 1));
    }

    #[test]
    fn line_index_agrees_across_a_long_source() {
        let src = "x = 1\n".repeat(2000) + "tail";
        let index = LineIndex::new(&src);
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(5), (1, 6));
        assert_eq!(index.line_col(6), (2, 1));
        assert_eq!(index.line_col(src.len() - 1), (2001, 4));
        assert_eq!(index.line_col(src.len() + 10), (2001, 5));
        assert_eq!(LineIndex::new("").line_col(0), (1, 1));
    }
}
