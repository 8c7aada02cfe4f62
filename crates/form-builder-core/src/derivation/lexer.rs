//! Formula tokenizer
//!
//! Splits a formula into numbers, identifiers, the four arithmetic
//! operators and parentheses. Anything else is rejected with its position.

use crate::error::DerivationError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

/// A token with its character offset in the formula
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Tokenize a formula
pub fn tokenize(formula: &str) -> Result<Vec<Token>, DerivationError> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                // "1.2.3" and a lone "." are not numbers
                let value = text
                    .parse::<f64>()
                    .map_err(|_| DerivationError::MalformedNumber(text.clone()))?;
                if i < chars.len() && is_ident_start(chars[i]) {
                    return Err(DerivationError::UnexpectedCharacter {
                        ch: chars[i],
                        position: i,
                    });
                }
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: start,
                });
                continue;
            }
            c if is_ident_start(c) => {
                while i < chars.len() && is_ident_continue(chars[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(chars[start..i].iter().collect()),
                    position: start,
                });
                continue;
            }
            other => {
                return Err(DerivationError::UnexpectedCharacter {
                    ch: other,
                    position: i,
                })
            }
        };

        tokens.push(Token { kind, position: start });
        i += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(formula: &str) -> Vec<TokenKind> {
        tokenize(formula).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenizes_arithmetic() {
        assert_eq!(
            kinds("price * (qty + 2.5)"),
            vec![
                TokenKind::Ident("price".into()),
                TokenKind::Star,
                TokenKind::LParen,
                TokenKind::Ident("qty".into()),
                TokenKind::Plus,
                TokenKind::Number(2.5),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_identifiers_are_whole_tokens() {
        assert_eq!(
            kinds("tax+a"),
            vec![TokenKind::Ident("tax".into()), TokenKind::Plus, TokenKind::Ident("a".into())]
        );
        assert_eq!(kinds("field_1700000000"), vec![TokenKind::Ident("field_1700000000".into())]);
    }

    #[test]
    fn test_rejects_foreign_characters() {
        assert_eq!(
            tokenize("a > b"),
            Err(DerivationError::UnexpectedCharacter { ch: '>', position: 2 })
        );
        assert!(tokenize("'a' + 'b'").is_err());
        assert!(tokenize("a % 2").is_err());
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert_eq!(tokenize("1.2.3"), Err(DerivationError::MalformedNumber("1.2.3".into())));
        assert!(tokenize(".").is_err());
        assert!(tokenize("2x").is_err());
    }

    #[test]
    fn test_leading_dot_number() {
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
    }
}
