//! Recursive descent parser turning lexer output into a value token tree

use crate::lexer::{tokenize_value, Token, TokenType};
use crate::types::{format_number, CssValue};

/// A classified unit of a parsed CSS value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueToken {
    Ident(String),
    String(String),
    Url(String),
    Number(f64),
    /// Stored pre-divided by 100
    Percentage(f64),
    Dimension { value: f64, unit: String },
    Function { name: String, contents: Vec<ValueToken> },
    Symbol(String),
}

impl ValueToken {
    /// Authored spelling of the token, as shown in issues.
    /// Function arguments are not part of the term.
    pub fn term(&self) -> String {
        match self {
            ValueToken::Ident(s) | ValueToken::String(s) | ValueToken::Url(s) => s.clone(),
            ValueToken::Symbol(s) => s.clone(),
            ValueToken::Number(n) => format_number(*n),
            ValueToken::Percentage(n) => format!("{}%", format_number(n * 100.0)),
            ValueToken::Dimension { value, unit } => format!("{}{}", format_number(*value), unit),
            ValueToken::Function { name, .. } => name.clone(),
        }
    }
}

/// Parse a declaration value. `None` and empty text yield an empty list.
pub fn parse_value(value: Option<&CssValue>) -> Vec<ValueToken> {
    match value {
        None => Vec::new(),
        Some(CssValue::Text(text)) if text.trim().is_empty() => Vec::new(),
        Some(value) => Parser::new(tokenize_value(value)).parse(),
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse the whole stream. An unmatched `)` ends parsing early.
    pub fn parse(&mut self) -> Vec<ValueToken> {
        self.parse_level()
    }

    /// Parse one nesting level, stopping after a `)` or at the end of input.
    fn parse_level(&mut self) -> Vec<ValueToken> {
        let mut result = Vec::new();

        while let Some(token) = self.advance() {
            if token.token_type.is_close_paren() {
                break;
            }
            let value_token = match token.token_type {
                TokenType::Ident(s) => ValueToken::Ident(s),
                TokenType::String(s) => ValueToken::String(s),
                TokenType::Url(s) => ValueToken::Url(s),
                TokenType::Number(n) => ValueToken::Number(n),
                TokenType::Percentage(n) => ValueToken::Percentage(n),
                TokenType::Dimension { value, unit } => ValueToken::Dimension { value, unit },
                TokenType::Function(name) => {
                    let contents = self.parse_level();
                    ValueToken::Function { name, contents }
                }
                TokenType::Symbol(s) => ValueToken::Symbol(s),
                TokenType::Hash(_) | TokenType::AtKeyword(_) => continue,
            };
            result.push(value_token);
        }

        result
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned()?;
        self.current += 1;
        Some(token)
    }
}
