//! Lexical analysis for CSS declaration values
//!
//! The lexer never fails: malformed input degrades to whatever tokens could
//! be read before and after the bad spot.

use crate::types::CssValue;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    Ident(String),
    String(String),
    Url(String),
    Number(f64),
    /// Stored pre-divided by 100: `10%` is `0.1`
    Percentage(f64),
    Dimension { value: f64, unit: String },
    /// Function name; its arguments follow as separate tokens up to `)`
    Function(String),
    Hash(String),
    AtKeyword(String),
    Symbol(String),
}

impl TokenType {
    pub fn is_close_paren(&self) -> bool {
        matches!(self, TokenType::Symbol(s) if s == ")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Character offset of the token in the input
    pub offset: usize,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Ident(s) => write!(f, "ident({})", s),
            TokenType::String(s) => write!(f, "string(\"{}\")", s),
            TokenType::Url(s) => write!(f, "url({})", s),
            TokenType::Number(n) => write!(f, "number({})", n),
            TokenType::Percentage(n) => write!(f, "percentage({})", n),
            TokenType::Dimension { value, unit } => write!(f, "dimension({}{})", value, unit),
            TokenType::Function(s) => write!(f, "function({})", s),
            TokenType::Hash(s) => write!(f, "hash({})", s),
            TokenType::AtKeyword(s) => write!(f, "at-keyword({})", s),
            TokenType::Symbol(s) => write!(f, "symbol({})", s),
        }
    }
}

/// Tokenize a raw declaration value. Numbers short-circuit to a single token.
pub fn tokenize_value(value: &CssValue) -> Vec<Token> {
    match value {
        CssValue::Number(n) => vec![Token {
            token_type: TokenType::Number(*n),
            offset: 0,
        }],
        CssValue::Text(text) => Lexer::new(text).tokenize(),
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace_and_comments();

        let start = self.position;
        let ch = self.peek()?;

        let token_type = if self.starts_number() {
            self.read_numeric()
        } else if self.starts_ident() {
            self.read_ident_like()
        } else {
            self.advance();
            match ch {
                '"' | '\'' => TokenType::String(self.read_string(ch)),
                '#' if self.peek().map_or(false, is_name_char) => {
                    TokenType::Hash(self.read_name())
                }
                '@' if self.starts_ident() => TokenType::AtKeyword(self.read_name()),
                _ => TokenType::Symbol(ch.to_string()),
            }
        };

        Some(Token {
            token_type,
            offset: start,
        })
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.position += 2;
                    while !self.is_at_end() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.position += 2;
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn starts_number(&self) -> bool {
        let digit = |c: Option<char>| c.map_or(false, |c| c.is_ascii_digit());
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => digit(self.peek_at(1)),
            Some('+') | Some('-') => {
                digit(self.peek_at(1)) || (self.peek_at(1) == Some('.') && digit(self.peek_at(2)))
            }
            _ => false,
        }
    }

    fn starts_ident(&self) -> bool {
        match self.peek() {
            Some('-') => match self.peek_at(1) {
                Some(c) => is_name_start(c) || c == '-',
                None => false,
            },
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn read_numeric(&mut self) -> TokenType {
        let mut text = String::new();

        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.advance();
        }
        self.read_digits(&mut text);

        if self.peek() == Some('.') && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if let Some(e @ ('e' | 'E')) = self.peek() {
            let exponent_digits = match self.peek_at(1) {
                Some('+') | Some('-') => self.peek_at(2).map_or(false, |c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                text.push(e);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.advance();
                }
                self.read_digits(&mut text);
            }
        }

        let value: f64 = match text.parse() {
            Ok(value) => value,
            Err(_) => return TokenType::Symbol(text),
        };

        if self.peek() == Some('%') {
            self.advance();
            TokenType::Percentage(value / 100.0)
        } else if self.starts_ident() {
            TokenType::Dimension {
                value,
                unit: self.read_name(),
            }
        } else {
            TokenType::Number(value)
        }
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.advance();
        }
    }

    fn read_ident_like(&mut self) -> TokenType {
        let name = self.read_name();
        if self.peek() != Some('(') {
            return TokenType::Ident(name);
        }
        self.advance();

        if name.eq_ignore_ascii_case("url") {
            TokenType::Url(self.read_url())
        } else {
            TokenType::Function(name)
        }
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.advance();
                if let Some(escaped) = self.advance() {
                    name.push(escaped);
                }
            } else if is_name_char(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// Read a string body after its opening quote. Unterminated strings end at EOF.
    fn read_string(&mut self, quote: char) -> String {
        let mut value = String::new();
        while let Some(c) = self.advance() {
            if c == quote {
                break;
            }
            if c == '\\' {
                if let Some(escaped) = self.advance() {
                    value.push(escaped);
                }
                continue;
            }
            value.push(c);
        }
        value
    }

    /// Read a `url(` body, quoted or not, consuming the closing parenthesis.
    fn read_url(&mut self) -> String {
        while self.peek().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }

        let url = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let url = self.read_string(quote);
                while self.peek().map_or(false, |c| c != ')') {
                    self.advance();
                }
                url
            }
            _ => {
                let mut url = String::new();
                while let Some(c) = self.peek() {
                    if c == ')' {
                        break;
                    }
                    url.push(c);
                    self.advance();
                }
                url.trim_end().to_string()
            }
        };

        if self.peek() == Some(')') {
            self.advance();
        }
        url
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '\\' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(input: &str) -> Vec<TokenType> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.token_type)
            .collect()
    }

    #[test]
    fn test_idents_and_symbols() {
        assert_eq!(
            types("solid , / -moz-box"),
            vec![
                TokenType::Ident("solid".to_string()),
                TokenType::Symbol(",".to_string()),
                TokenType::Symbol("/".to_string()),
                TokenType::Ident("-moz-box".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            types("42 -3.5 +1 .5 1e3"),
            vec![
                TokenType::Number(42.0),
                TokenType::Number(-3.5),
                TokenType::Number(1.0),
                TokenType::Number(0.5),
                TokenType::Number(1000.0),
            ]
        );
    }

    #[test]
    fn test_percentage_is_divided() {
        assert_eq!(types("10%"), vec![TokenType::Percentage(0.1)]);
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(
            types("1em 10sample-unit 2Q"),
            vec![
                TokenType::Dimension { value: 1.0, unit: "em".to_string() },
                TokenType::Dimension { value: 10.0, unit: "sample-unit".to_string() },
                TokenType::Dimension { value: 2.0, unit: "Q".to_string() },
            ]
        );
    }

    #[test]
    fn test_function_tokens() {
        assert_eq!(
            types("calc(1px + 1%)"),
            vec![
                TokenType::Function("calc".to_string()),
                TokenType::Dimension { value: 1.0, unit: "px".to_string() },
                TokenType::Symbol("+".to_string()),
                TokenType::Percentage(0.01),
                TokenType::Symbol(")".to_string()),
            ]
        );
    }

    #[test]
    fn test_url_forms() {
        assert_eq!(types("url(sample.png)"), vec![TokenType::Url("sample.png".to_string())]);
        assert_eq!(types("url( \"a b.png\" )"), vec![TokenType::Url("a b.png".to_string())]);
        assert_eq!(types("URL(x"), vec![TokenType::Url("x".to_string())]);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            types(r#""sample-string" 'single' "esc\"aped""#),
            vec![
                TokenType::String("sample-string".to_string()),
                TokenType::String("single".to_string()),
                TokenType::String("esc\"aped".to_string()),
            ]
        );
        assert_eq!(types("\"unterminated"), vec![TokenType::String("unterminated".to_string())]);
    }

    #[test]
    fn test_hash_at_keyword_and_comments() {
        assert_eq!(
            types("#f5f5f5 /* note */ @media"),
            vec![
                TokenType::Hash("f5f5f5".to_string()),
                TokenType::AtKeyword("media".to_string()),
            ]
        );
    }

    #[test]
    fn test_close_paren_detection() {
        let tokens = types("f(a)");
        assert!(tokens[2].is_close_paren());
        assert!(!tokens[1].is_close_paren());
        assert!(!TokenType::Symbol("(".to_string()).is_close_paren());
    }

    #[test]
    fn test_numeric_value_short_circuits() {
        let tokens = tokenize_value(&CssValue::Number(100.0));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::Number(100.0));
    }

    #[test]
    fn test_offsets() {
        let tokens = Lexer::new("a  bb").tokenize();
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 3);
    }
}
