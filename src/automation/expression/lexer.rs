//! Tokenizer for the condition language.

use super::ExpressionError;

/// Lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum TokenKind {
    Ident(String),
    Number(f64),
    Text(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
}

impl TokenKind {
    pub(super) fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("identifier '{name}'"),
            Self::Number(value) => format!("number {value}"),
            Self::Text(value) => format!("string '{value}'"),
            Self::True => "'true'".to_owned(),
            Self::False => "'false'".to_owned(),
            Self::Null => "'null'".to_owned(),
            Self::LParen => "'('".to_owned(),
            Self::RParen => "')'".to_owned(),
            Self::LBracket => "'['".to_owned(),
            Self::RBracket => "']'".to_owned(),
            Self::Comma => "','".to_owned(),
            Self::Dot => "'.'".to_owned(),
            Self::Eq => "'=='".to_owned(),
            Self::Ne => "'!='".to_owned(),
            Self::Lt => "'<'".to_owned(),
            Self::Le => "'<='".to_owned(),
            Self::Gt => "'>'".to_owned(),
            Self::Ge => "'>='".to_owned(),
            Self::And => "'&&'".to_owned(),
            Self::Or => "'||'".to_owned(),
            Self::Not => "'!'".to_owned(),
        }
    }
}

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((offset, character)) = chars.next() {
        let kind = match character {
            c if c.is_whitespace() => continue,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '=' => {
                expect_next(&mut chars, '=', offset, "'=='")?;
                TokenKind::Eq
            }
            '!' => {
                if chars.next_if(|(_, c)| *c == '=').is_some() {
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if chars.next_if(|(_, c)| *c == '=').is_some() {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if chars.next_if(|(_, c)| *c == '=').is_some() {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                expect_next(&mut chars, '&', offset, "'&&'")?;
                TokenKind::And
            }
            '|' => {
                expect_next(&mut chars, '|', offset, "'||'")?;
                TokenKind::Or
            }
            '"' | '\'' => TokenKind::Text(read_string(&mut chars, character, offset)?),
            c if c.is_ascii_digit() || c == '-' => {
                TokenKind::Number(read_number(&mut chars, c, offset)?)
            }
            c if c.is_ascii_alphabetic() || c == '_' => keyword_or_ident(read_ident(&mut chars, c)),
            other => {
                return Err(ExpressionError::parse(
                    offset,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn expect_next(
    chars: &mut Chars<'_>,
    expected: char,
    offset: usize,
    operator: &str,
) -> Result<(), ExpressionError> {
    chars
        .next_if(|(_, c)| *c == expected)
        .map(|_| ())
        .ok_or_else(|| ExpressionError::parse(offset, format!("expected {operator}")))
}

fn read_string(chars: &mut Chars<'_>, quote: char, offset: usize) -> Result<String, ExpressionError> {
    let mut value = String::new();
    let mut escaped = false;
    for (_, character) in chars.by_ref() {
        if escaped {
            value.push(character);
            escaped = false;
            continue;
        }
        match character {
            '\\' => escaped = true,
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(ExpressionError::parse(offset, "unterminated string literal"))
}

fn read_number(chars: &mut Chars<'_>, first: char, offset: usize) -> Result<f64, ExpressionError> {
    let mut literal = String::from(first);
    let mut seen_dot = false;
    while let Some((_, character)) =
        chars.next_if(|(_, c)| c.is_ascii_digit() || (*c == '.' && !seen_dot))
    {
        if character == '.' {
            seen_dot = true;
        }
        literal.push(character);
    }
    if literal == "-" || literal.ends_with('.') {
        return Err(ExpressionError::parse(
            offset,
            format!("malformed number '{literal}'"),
        ));
    }
    literal
        .parse::<f64>()
        .map_err(|err| ExpressionError::parse(offset, format!("malformed number: {err}")))
}

fn read_ident(chars: &mut Chars<'_>, first: char) -> String {
    let mut ident = String::from(first);
    while let Some((_, character)) = chars.next_if(|(_, c)| c.is_ascii_alphanumeric() || *c == '_')
    {
        ident.push(character);
    }
    ident
}

fn keyword_or_ident(ident: String) -> TokenKind {
    match ident.as_str() {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        _ => TokenKind::Ident(ident),
    }
}
