//! Type declaration tokenizer

use std::fmt;
use std::iter::FusedIterator;

/// Characters that split a declaration into tokens
const BREAKS: [char; 3] = ['(', ')', ','];

/// A single lexical unit of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `(` - opens a parameter list
    Open,
    /// `)` - closes a parameter list
    Close,
    /// `,` - separates parameters
    Comma,
    /// Trimmed text between markers (type name, argument, `name Type` pair)
    Text(&'a str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("("),
            Self::Close => f.write_str(")"),
            Self::Comma => f.write_str(","),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Lazy token stream over a declaration
///
/// Clone before iterating to scan the same input twice.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

/// Split a type declaration into tokens
///
/// Scans left to right for the next `(`, `)` or `,`. A marker at the current
/// position becomes its own token; text before a marker (or the remainder
/// when no marker is left) is emitted trimmed. Whitespace-only text is
/// skipped. There is no escaping: a marker inside a quoted argument still
/// splits the text.
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer { input, pos: 0 }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];

            match rest.find(&BREAKS[..]) {
                Some(0) => {
                    self.pos += 1;
                    let token = match rest.as_bytes()[0] {
                        b'(' => Token::Open,
                        b')' => Token::Close,
                        _ => Token::Comma,
                    };
                    return Some(token);
                }
                Some(offset) => {
                    self.pos += offset;
                    let text = rest[..offset].trim();
                    if !text.is_empty() {
                        return Some(Token::Text(text));
                    }
                }
                None => {
                    self.pos = self.input.len();
                    let text = rest.trim();
                    if !text.is_empty() {
                        return Some(Token::Text(text));
                    }
                }
            }
        }

        None
    }
}

impl FusedIterator for Tokenizer<'_> {}
