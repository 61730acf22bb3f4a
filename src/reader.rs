// ABOUTME: Tokenizer and form reader turning source text into heap objects

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace1},
    combinator::{opt, recognize, value},
    multi::many0,
    IResult, Parser,
};

use crate::heap::Heap;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Quote,
    Backtick,
    Comma,
    Number(i64),
    Str(String),
    Symbol(String),
    /// A lexing failure, carried in the token stream so the reader can
    /// turn it into an Error object instead of aborting.
    Error(String),
}

/// Symbols are runs of printable ASCII, minus the reader's punctuation.
fn is_symbol_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '(' | ')' | '\'' | '`' | ',' | '"')
}

/// Skip whitespace and `; ...` comments
fn ws_and_comments(input: &str) -> IResult<&str, ()> {
    many0(alt((
        value((), multispace1),
        value((), (char(';'), take_while(|c| c != '\n'))),
    )))
    .map(|_| ())
    .parse(input)
}

/// Parse a number: optional leading '-', then digits
fn lex_number(input: &str) -> IResult<&str, Token> {
    recognize((opt(char('-')), digit1))
        .map(|digits: &str| match digits.parse::<i64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Error("syntax error: number literal out of range".to_string()),
        })
        .parse(input)
}

fn lex_symbol(input: &str) -> IResult<&str, Token> {
    take_while1(is_symbol_char)
        .map(|s: &str| Token::Symbol(s.to_string()))
        .parse(input)
}

/// Parse a string literal. A newline or end of input before the closing
/// quote, and any escape other than \n \t \\ \", yield an Error token.
fn lex_string(input: &str) -> IResult<&str, Token> {
    let (rest, _) = char('"')(input)?;
    let mut text = String::new();
    let mut chars = rest.char_indices();
    loop {
        match chars.next() {
            None => {
                return Ok((
                    "",
                    Token::Error("syntax error: unterminated string literal".to_string()),
                ));
            }
            Some((i, '"')) => return Ok((&rest[i + 1..], Token::Str(text))),
            Some((i, '\n')) => {
                return Ok((
                    &rest[i..],
                    Token::Error("syntax error: unterminated string literal".to_string()),
                ));
            }
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, '\\')) => text.push('\\'),
                Some((_, '"')) => text.push('"'),
                Some((j, other)) => {
                    return Ok((
                        &rest[j + other.len_utf8()..],
                        Token::Error(format!("syntax error: invalid escape '\\{}'", other)),
                    ));
                }
                None => {
                    return Ok((
                        "",
                        Token::Error("syntax error: unterminated string literal".to_string()),
                    ));
                }
            },
            Some((_, c)) => text.push(c),
        }
    }
}

/// Fallback for bytes no lexer accepts (non-printable, non-ASCII).
fn lex_unexpected(input: &str) -> IResult<&str, Token> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) => Ok((
            chars.as_str(),
            Token::Error(format!("syntax error: unexpected character {:?}", c)),
        )),
        None => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Eof,
        ))),
    }
}

fn lex_token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Quote, char('\'')),
        value(Token::Backtick, char('`')),
        value(Token::Comma, char(',')),
        lex_number,
        lex_string,
        lex_symbol,
        lex_unexpected,
    ))
    .parse(input)
}

/// Streams forms out of a source string, one at a time. Every failure is
/// delivered as an Error object; the reader itself never fails.
pub struct Reader<'a> {
    input: &'a str,
}

impl<'a> Reader<'a> {
    pub fn new(source: &'a str) -> Self {
        Reader { input: source }
    }

    fn next_token(&mut self) -> Option<Token> {
        let (rest, _) = ws_and_comments(self.input).unwrap_or((self.input, ()));
        self.input = rest;
        if self.input.is_empty() {
            return None;
        }
        match lex_token(self.input) {
            Ok((rest, tok)) => {
                self.input = rest;
                Some(tok)
            }
            Err(_) => {
                self.input = "";
                Some(Token::Error("syntax error: unreadable input".to_string()))
            }
        }
    }

    /// Reads the next top-level form; `None` at end of input.
    pub fn next_form(&mut self, heap: &mut Heap) -> Option<Value> {
        let tok = self.next_token()?;
        Some(self.form_from(heap, tok))
    }

    fn form_from(&mut self, heap: &mut Heap, tok: Token) -> Value {
        match tok {
            Token::LParen => self.read_list(heap),
            Token::RParen => heap.error_new("syntax error: unexpected ')'"),
            Token::Quote => self.read_prefixed(heap, "quote"),
            Token::Backtick => self.read_prefixed(heap, "quasiquote"),
            Token::Comma => self.read_prefixed(heap, "unquote"),
            Token::Number(n) => heap.number_new(n),
            Token::Str(s) => heap.str_new(&s),
            Token::Symbol(s) => heap.symbol_new(&s),
            Token::Error(msg) => heap.error_new(msg),
        }
    }

    /// Rewrites `'x`, `` `x `` and `,x` to (quote x) etc.
    fn read_prefixed(&mut self, heap: &mut Heap, name: &str) -> Value {
        let Some(tok) = self.next_token() else {
            return heap.error_new(format!("syntax error: expected expression after {}", name));
        };
        let inner = self.form_from(heap, tok);
        if heap.is_error(inner) {
            return inner;
        }
        let head = heap.symbol_new(name);
        let tail = heap.cons_new(inner, None);
        heap.cons_new(head, tail)
    }

    /// list := '(' expr* ')'. An empty pair of parens reads as nil.
    fn read_list(&mut self, heap: &mut Heap) -> Value {
        let mut items = Vec::new();
        loop {
            let Some(tok) = self.next_token() else {
                return heap.error_new("syntax error: missing expected ')'");
            };
            if tok == Token::RParen {
                break;
            }
            let form = self.form_from(heap, tok);
            if heap.is_error(form) {
                return form;
            }
            items.push(form);
        }
        heap.list_from(&items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn read_one(heap: &mut Heap, src: &str) -> Value {
        Reader::new(src).next_form(heap).expect("expected a form")
    }

    #[test]
    fn test_read_numbers() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "42");
        assert!(matches!(heap.get(v.unwrap()), Object::Number(42)));

        let neg = read_one(&mut heap, "-42");
        assert!(matches!(heap.get(neg.unwrap()), Object::Number(-42)));
    }

    #[test]
    fn test_minus_alone_is_a_symbol() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "-");
        assert_eq!(heap.symbol_text(v), Some("-"));
    }

    #[test]
    fn test_read_symbols_and_keywords() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "foo-bar?");
        assert_eq!(heap.symbol_text(v), Some("foo-bar?"));

        let kw = read_one(&mut heap, ":key");
        assert_eq!(heap.symbol_text(kw), Some(":key"));
    }

    #[test]
    fn test_read_string_with_escapes() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, r#""a\nb\t\"c\"""#);
        match heap.get(v.unwrap()) {
            Object::Str(s) => assert_eq!(s, "a\nb\t\"c\""),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string_is_an_error_value() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "\"abc");
        assert!(heap.is_error(v));
        assert!(heap
            .error_message(v)
            .unwrap()
            .contains("unterminated string"));
    }

    #[test]
    fn test_invalid_escape_is_an_error_value() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, r#""a\qb""#);
        assert!(heap.is_error(v));
        assert!(heap.error_message(v).unwrap().contains("invalid escape"));
    }

    #[test]
    fn test_empty_list_reads_as_nil() {
        let mut heap = Heap::new();
        assert_eq!(read_one(&mut heap, "()"), None);
        assert_eq!(read_one(&mut heap, "(   )"), None);
    }

    #[test]
    fn test_read_nested_list() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "(1 (2 3) 4)");
        assert_eq!(heap.render(v), "(1 (2 3) 4)");
    }

    #[test]
    fn test_missing_close_paren() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "(+ 1 2");
        assert!(heap.is_error(v));
        assert!(heap
            .error_message(v)
            .unwrap()
            .contains("missing expected ')'"));
    }

    #[test]
    fn test_stray_close_paren() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, ")");
        assert!(heap.is_error(v));
    }

    #[test]
    fn test_quote_rewrites() {
        let mut heap = Heap::new();
        let v1 = read_one(&mut heap, "'x");
        assert_eq!(heap.render(v1), "(quote x)");
        let v2 = read_one(&mut heap, "`x");
        assert_eq!(heap.render(v2), "(quasiquote x)");
        let v3 = read_one(&mut heap, ",x");
        assert_eq!(heap.render(v3), "(unquote x)");
        let v4 = read_one(&mut heap, "'(1 2)");
        assert_eq!(heap.render(v4), "(quote (1 2))");
    }

    #[test]
    fn test_comments_are_skipped() {
        let mut heap = Heap::new();
        let v = read_one(&mut heap, "; leading comment\n42 ; trailing");
        assert!(matches!(heap.get(v.unwrap()), Object::Number(42)));

        let list = read_one(&mut heap, "(1 ; inside\n 2)");
        assert_eq!(heap.render(list), "(1 2)");
    }

    #[test]
    fn test_streams_multiple_forms() {
        let mut heap = Heap::new();
        let mut reader = Reader::new("1 2 3");
        let mut seen = Vec::new();
        while let Some(form) = reader.next_form(&mut heap) {
            seen.push(heap.render(form));
        }
        assert_eq!(seen, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_eof_yields_none() {
        let mut heap = Heap::new();
        let mut reader = Reader::new("  ; only a comment\n");
        assert!(reader.next_form(&mut heap).is_none());
    }

    #[test]
    fn test_number_then_symbol_split() {
        let mut heap = Heap::new();
        let mut reader = Reader::new("12ab");
        let n = reader.next_form(&mut heap).unwrap();
        assert!(matches!(heap.get(n.unwrap()), Object::Number(12)));
        let s = reader.next_form(&mut heap).unwrap();
        assert_eq!(heap.symbol_text(s), Some("ab"));
    }
}
