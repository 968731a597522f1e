//! Formula tokenizer
//!
//! Splits a formula string into identifiers, numeric literals, operators
//! and parentheses. Every token carries its byte span in the source so
//! parse errors can point at the offending text.

use crate::formula::FormulaSyntaxError;

/// Token kinds of the formula grammar
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Measurement acronym: `[A-Za-z_][A-Za-z0-9_]*`
    Ident(String),
    /// Numeric literal
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl TokenKind {
    /// Human-readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Number(value) => format!("number {}", value),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }
}

/// A token with its byte span in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
    /// Byte length
    pub len: usize,
}

/// Tokenize a formula string.
///
/// Whitespace separates tokens and is otherwise ignored. Any character
/// outside the grammar is a syntax error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FormulaSyntaxError> {
    let mut tokens = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let kind = match c {
            '+' => {
                pos += 1;
                TokenKind::Plus
            }
            '-' => {
                pos += 1;
                TokenKind::Minus
            }
            '*' => {
                pos += 1;
                TokenKind::Star
            }
            '/' => {
                pos += 1;
                TokenKind::Slash
            }
            '(' => {
                pos += 1;
                TokenKind::LParen
            }
            ')' => {
                pos += 1;
                TokenKind::RParen
            }
            c if c.is_ascii_digit() => {
                while pos < bytes.len() && (bytes[pos] as char).is_ascii_digit() {
                    pos += 1;
                }
                if pos < bytes.len() && bytes[pos] == b'.' {
                    pos += 1;
                    if pos >= bytes.len() || !(bytes[pos] as char).is_ascii_digit() {
                        return Err(FormulaSyntaxError::new(
                            "expected digits after decimal point",
                            source,
                            start,
                            pos - start,
                            Some("write the fraction explicitly, e.g. '2.0'".to_string()),
                        ));
                    }
                    while pos < bytes.len() && (bytes[pos] as char).is_ascii_digit() {
                        pos += 1;
                    }
                }
                let text = &source[start..pos];
                let value = text.parse::<f64>().map_err(|_| {
                    FormulaSyntaxError::new(
                        format!("invalid number '{}'", text),
                        source,
                        start,
                        pos - start,
                        None,
                    )
                })?;
                TokenKind::Number(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while pos < bytes.len() {
                    let c = bytes[pos] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(source[start..pos].to_string())
            }
            other => {
                return Err(FormulaSyntaxError::new(
                    format!("unexpected character '{}'", other),
                    source,
                    start,
                    other.len_utf8(),
                    Some(
                        "formulas may contain acronyms, numbers, + - * / and parentheses"
                            .to_string(),
                    ),
                ));
            }
        };

        tokens.push(Token {
            kind,
            offset: start,
            len: pos - start,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_simple_division() {
        assert_eq!(
            kinds("HH / PF"),
            vec![
                TokenKind::Ident("HH".to_string()),
                TokenKind::Slash,
                TokenKind::Ident("PF".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            kinds("100 * 2.5"),
            vec![
                TokenKind::Number(100.0),
                TokenKind::Star,
                TokenKind::Number(2.5),
            ]
        );
    }

    #[test]
    fn test_tokenize_parens_and_operators() {
        assert_eq!(
            kinds("(A + B) - C"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("A".to_string()),
                TokenKind::Plus,
                TokenKind::Ident("B".to_string()),
                TokenKind::RParen,
                TokenKind::Minus,
                TokenKind::Ident("C".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_underscore_identifiers() {
        assert_eq!(
            kinds("_a1 + total_hours"),
            vec![
                TokenKind::Ident("_a1".to_string()),
                TokenKind::Plus,
                TokenKind::Ident("total_hours".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_unknown_character() {
        let err = tokenize("HH % PF").unwrap_err();
        assert!(err.message.contains("unexpected character '%'"));
    }

    #[test]
    fn test_tokenize_rejects_bare_decimal_point() {
        let err = tokenize("1. + 2").unwrap_err();
        assert!(err.message.contains("decimal point"));
    }

    #[test]
    fn test_token_spans() {
        let tokens = tokenize("AB + 12").unwrap();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[0].len, 2);
        assert_eq!(tokens[1].offset, 3);
        assert_eq!(tokens[2].offset, 5);
        assert_eq!(tokens[2].len, 2);
    }

    #[test]
    fn test_empty_source_yields_no_tokens() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   ").unwrap().is_empty());
    }
}
