use crate::ExprError;

/// Lexical token produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Contains,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    AndAnd,
    OrOr,
    Bang,

    Dot,
    LParen,
    RParen,
}

/// Split an expression source string into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ExprError::UnexpectedChar('=', i));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Bang);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::LtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::GtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ExprError::UnexpectedChar('&', i));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(ExprError::UnexpectedChar('|', i));
                }
            }
            '"' | '\'' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    match chars[i] {
                        '\\' if i + 1 < chars.len() => {
                            let escaped = chars[i + 1];
                            value.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                            i += 2;
                        }
                        ch if ch == quote => {
                            closed = true;
                            i += 1;
                            break;
                        }
                        ch => {
                            value.push(ch);
                            i += 1;
                        }
                    }
                }
                if !closed {
                    return Err(ExprError::UnterminatedString);
                }
                tokens.push(Token::Str(value));
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    // A digit followed by ".ident" is a path separator, not a
                    // decimal point; numbers only consume "." before a digit.
                    if chars[i] == '.' && !chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                        break;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    "contains" => Token::Contains,
                    _ => Token::Ident(word),
                });
            }
            other => return Err(ExprError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokens() {
        let tokens = tokenize("a + 2 * (b - 1)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::Plus,
                Token::Number(2.0),
                Token::Star,
                Token::LParen,
                Token::Ident("b".into()),
                Token::Minus,
                Token::Number(1.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = tokenize("x >= 1 && y != 2 || !z").unwrap();
        assert!(tokens.contains(&Token::GtEq));
        assert!(tokens.contains(&Token::AndAnd));
        assert!(tokens.contains(&Token::NotEq));
        assert!(tokens.contains(&Token::OrOr));
        assert!(tokens.contains(&Token::Bang));
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            tokenize(r#""hello world""#).unwrap(),
            vec![Token::Str("hello world".into())]
        );
        // Single quotes and escapes
        assert_eq!(
            tokenize(r#"'it\'s'"#).unwrap(),
            vec![Token::Str("it's".into())]
        );
        assert_eq!(
            tokenize(r#""line\nbreak""#).unwrap(),
            vec![Token::Str("line\nbreak".into())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(tokenize(r#""oops"#), Err(ExprError::UnterminatedString));
    }

    #[test]
    fn test_keywords() {
        let tokens = tokenize("status contains true null false").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("status".into()),
                Token::Contains,
                Token::True,
                Token::Null,
                Token::False,
            ]
        );
    }

    #[test]
    fn test_number_vs_path_dot() {
        // "1.5" is a decimal; "item.price" is a path
        assert_eq!(tokenize("1.5").unwrap(), vec![Token::Number(1.5)]);
        assert_eq!(
            tokenize("item.price").unwrap(),
            vec![
                Token::Ident("item".into()),
                Token::Dot,
                Token::Ident("price".into()),
            ]
        );
    }

    #[test]
    fn test_rejects_unknown_chars() {
        assert!(matches!(
            tokenize("a @ b"),
            Err(ExprError::UnexpectedChar('@', _))
        ));
        // Single '=' and '&' are not operators
        assert!(tokenize("a = b").is_err());
        assert!(tokenize("a & b").is_err());
    }
}
