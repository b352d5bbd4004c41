// Lexer for Go source files.
//
// Tokenizes the Go subset accepted by the front end. Uses the `logos` crate
// for DFA-based lexing, followed by a pass that applies Go's automatic
// semicolon insertion rule to newlines.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters produce `LexError`; lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Go token types.
///
/// Identifiers and numeric literals carry no value; use the span to
/// retrieve the text from the source. String literals carry their decoded
/// value.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+|//[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // ── Operators and punctuation ──
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Assign,
    #[token(":=")]
    Define,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("<-")]
    Arrow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,

    // ── Literals ──
    /// Floating-point literal. Must win over `Int` on `1.5`, `1e3`, `.5`.
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Float,

    /// Integer literal (decimal or hexadecimal).
    #[regex(r"[0-9]+")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Int,

    /// Interpreted (`"..."`) or raw (`` `...` ``) string literal, decoded.
    #[regex(r#""([^"\\\n]|\\.)*""#, parse_string)]
    #[regex(r"`[^`]*`", parse_raw_string)]
    Str(String),

    /// Rune literal such as `'a'` or `'\n'`.
    #[regex(r"'([^'\\\n]|\\.)'")]
    Char,

    // ── Identifier ──
    //
    // Placed after keywords: logos prioritises fixed `#[token]` matches
    // over regex for the same length, so `func` matches Func, not Ident.
    /// Identifier: a Unicode letter or `_`, then letters, digits or `_`.
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Ident,

    // ── Structure (consumed by the semicolon pass) ──
    #[regex(r"\n")]
    Newline,

    /// `/* ... */`; true when the comment spans a line break.
    #[token("/*", block_comment)]
    BlockComment(bool),
}

impl Token {
    /// Whether a newline directly after this token terminates a statement
    /// (Go's automatic semicolon insertion rule).
    fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::Ident
                | Token::Int
                | Token::Float
                | Token::Str(_)
                | Token::Char
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::Return
                | Token::Inc
                | Token::Dec
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Break => "break",
            Token::Case => "case",
            Token::Chan => "chan",
            Token::Const => "const",
            Token::Continue => "continue",
            Token::Default => "default",
            Token::Defer => "defer",
            Token::Else => "else",
            Token::Fallthrough => "fallthrough",
            Token::For => "for",
            Token::Func => "func",
            Token::Go => "go",
            Token::Goto => "goto",
            Token::If => "if",
            Token::Import => "import",
            Token::Interface => "interface",
            Token::Map => "map",
            Token::Package => "package",
            Token::Range => "range",
            Token::Return => "return",
            Token::Select => "select",
            Token::Struct => "struct",
            Token::Switch => "switch",
            Token::Type => "type",
            Token::Var => "var",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Amp => "&",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Bang => "!",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Assign => "=",
            Token::Define => ":=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::Inc => "++",
            Token::Dec => "--",
            Token::Arrow => "<-",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semi => ";",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::Colon => ":",
            Token::Float => "<float>",
            Token::Int => "<int>",
            Token::Str(s) => return write!(f, "{s:?}"),
            Token::Char => "<rune>",
            Token::Ident => "<ident>",
            Token::Newline => "<newline>",
            Token::BlockComment(_) => "<comment>",
        };
        f.write_str(text)
    }
}

// ── Callbacks ──

fn parse_string(lex: &mut logos::Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1]; // strip quotes
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next()? {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                '0' => result.push('\0'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                '\\' => result.push('\\'),
                _ => return None,
            }
        } else {
            result.push(c);
        }
    }
    Some(result)
}

fn parse_raw_string(lex: &mut logos::Lexer<'_, Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].replace('\r', "")
}

/// Consume a block comment after its opening `/*`. An unterminated comment
/// swallows the rest of the input and is reported as an error.
fn block_comment(lex: &mut logos::Lexer<'_, Token>) -> Option<bool> {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Some(rest[..end].contains('\n'))
        }
        None => {
            lex.bump(rest.len());
            None
        }
    }
}

// ── Public API ──

/// Lex a Go source string into tokens.
///
/// Newlines never reach the output: a newline after a token that can end a
/// statement becomes `Token::Semi`, any other newline is dropped. End of
/// input counts as a newline.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut pending_semi = false;

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(Token::Newline) => {
                if pending_semi {
                    tokens.push((Token::Semi, span));
                    pending_semi = false;
                }
            }
            Ok(Token::BlockComment(multiline)) => {
                if pending_semi && multiline {
                    tokens.push((Token::Semi, span));
                    pending_semi = false;
                }
            }
            Ok(token) => {
                pending_semi = token.ends_statement();
                tokens.push((token, span));
            }
            Err(()) => {
                let text = &source[span.start..span.end];
                let message = if text.starts_with("/*") {
                    "comment not terminated".to_string()
                } else {
                    format!("unexpected character: {text:?}")
                };
                errors.push(LexError { span, message });
            }
        }
    }

    if pending_semi {
        let end = source.len();
        tokens.push((Token::Semi, Span { start: end, end }));
    }

    LexResult { tokens, errors }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: lex and assert no errors, return token list.
    fn lex_ok(source: &str) -> Vec<Token> {
        let result = lex(source);
        assert!(
            result.errors.is_empty(),
            "unexpected lex errors: {:?}",
            result.errors
        );
        result.tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords() {
        let tokens = lex_ok("package import func var type return if else for go defer");
        assert_eq!(
            tokens,
            vec![
                Token::Package,
                Token::Import,
                Token::Func,
                Token::Var,
                Token::Type,
                Token::Return,
                Token::If,
                Token::Else,
                Token::For,
                Token::Go,
                Token::Defer,
            ]
        );
    }

    #[test]
    fn keyword_vs_ident() {
        // `function` is an identifier, not keyword `func` + `tion`
        let tokens = lex_ok("func function");
        assert_eq!(tokens, vec![Token::Func, Token::Ident, Token::Semi]);
    }

    #[test]
    fn operators_longest_match() {
        let tokens = lex_ok("a := b <- c <= d ... e");
        assert_eq!(
            tokens,
            vec![
                Token::Ident,
                Token::Define,
                Token::Ident,
                Token::Arrow,
                Token::Ident,
                Token::LtEq,
                Token::Ident,
                Token::Ellipsis,
                Token::Ident,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn numbers() {
        let tokens = lex_ok("42 3.5 1e3 0x1F");
        assert_eq!(
            tokens,
            vec![Token::Int, Token::Float, Token::Float, Token::Int, Token::Semi]
        );
    }

    #[test]
    fn strings_decoded() {
        let tokens = lex_ok(r#""a\tb" `raw\n`"#);
        assert_eq!(
            tokens,
            vec![
                Token::Str("a\tb".into()),
                Token::Str(r"raw\n".into()),
                Token::Semi
            ]
        );
    }

    #[test]
    fn semicolon_inserted_after_ident_newline() {
        let tokens = lex_ok("x\ny");
        assert_eq!(
            tokens,
            vec![Token::Ident, Token::Semi, Token::Ident, Token::Semi]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace() {
        let tokens = lex_ok("func f() {\n}\n");
        assert_eq!(
            tokens,
            vec![
                Token::Func,
                Token::Ident,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn comments_skipped() {
        let tokens = lex_ok("x // trailing\n/* inline */ y");
        assert_eq!(
            tokens,
            vec![Token::Ident, Token::Semi, Token::Ident, Token::Semi]
        );
    }

    #[test]
    fn multiline_block_comment_acts_as_newline() {
        let tokens = lex_ok("x /* a\nb */ y");
        assert_eq!(
            tokens,
            vec![Token::Ident, Token::Semi, Token::Ident, Token::Semi]
        );
    }

    #[test]
    fn license_header_comment_before_package() {
        let tokens = lex_ok("/*\n * Copyright 2024 The Authors.\n * Licensed under MIT.\n */\n\npackage main\n");
        assert_eq!(tokens, vec![Token::Package, Token::Ident, Token::Semi]);
    }

    #[test]
    fn single_line_block_comment_does_not_end_statement() {
        // `x = /* note */ y` stays one statement.
        let tokens = lex_ok("x = /* note */ y\n");
        assert_eq!(
            tokens,
            vec![Token::Ident, Token::Assign, Token::Ident, Token::Semi]
        );
    }

    #[test]
    fn comment_markers_inside_block_comment() {
        let tokens = lex_ok("a /* // not a line comment * / */ b");
        assert_eq!(tokens, vec![Token::Ident, Token::Ident, Token::Semi]);
    }

    #[test]
    fn unterminated_block_comment() {
        let result = lex("x /* never closed\ny");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "comment not terminated");
        assert_eq!(result.errors[0].span, Span { start: 2, end: 19 });
        let tokens: Vec<Token> = result.tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::Ident, Token::Semi]);
    }

    #[test]
    fn unicode_identifiers() {
        let src = "café := größe2 + π";
        let result = lex(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let idents: Vec<&str> = result
            .tokens
            .iter()
            .filter(|(t, _)| *t == Token::Ident)
            .map(|(_, s)| &src[s.start..s.end])
            .collect();
        assert_eq!(idents, vec!["café", "größe2", "π"]);
        // Spans are byte offsets: `é` is two bytes.
        assert_eq!(result.tokens[0].1, Span { start: 0, end: 5 });
    }

    #[test]
    fn digits_do_not_start_identifiers() {
        let tokens = lex_ok("9lives");
        assert_eq!(tokens, vec![Token::Int, Token::Ident, Token::Semi]);
    }

    #[test]
    fn spans_correct() {
        let result = lex("var ctx");
        assert!(result.errors.is_empty());
        assert_eq!(result.tokens[0].1, Span { start: 0, end: 3 });
        assert_eq!(result.tokens[1].1, Span { start: 4, end: 7 });
        // Inserted semicolon at end of input.
        assert_eq!(result.tokens[2], (Token::Semi, Span { start: 7, end: 7 }));
    }

    #[test]
    fn error_recovery() {
        let result = lex("a # b");
        let tokens: Vec<Token> = result.tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::Ident, Token::Ident, Token::Semi]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].span, Span { start: 2, end: 3 });
    }
}
