//! Minimal safe arithmetic expression evaluator.
//!
//! Recursive descent over `+ - * /`, parentheses, numeric literals and
//! named operands (`[A-Za-z_][A-Za-z0-9_]*`). Any other token is rejected;
//! nothing is ever delegated to a host-language evaluator.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character {0:?} in formula")]
    UnexpectedChar(char),

    #[error("malformed number {0:?}")]
    MalformedNumber(String),

    #[error("unknown operand {0:?}")]
    UnknownOperand(String),

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(value) => format!("{value}"),
            Self::Ident(name) => format!("{name:?}"),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&ch) = chars.peek() {
        match ch {
            ch if ch.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ch if ch.is_ascii_digit() || ch == '.' => {
                let mut literal = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse()
                    .map_err(|_| ExprError::MalformedNumber(literal))?;
                tokens.push(Token::Number(value));
            }
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

/// The set of named operands a formula references.
pub fn identifiers(expr: &str) -> Result<BTreeSet<String>, ExprError> {
    Ok(tokenize(expr)?
        .into_iter()
        .filter_map(|token| match token {
            Token::Ident(name) => Some(name),
            _ => None,
        })
        .collect())
}

/// Evaluates `expr` with every named operand taken from `operands`.
pub fn evaluate(expr: &str, operands: &BTreeMap<String, f64>) -> Result<f64, ExprError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        operands,
    };
    let value = parser.expression()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    operands: &'a BTreeMap<String, f64>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.factor()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.next();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Ident(name)) => self
                .operands
                .get(&name)
                .copied()
                .ok_or(ExprError::UnknownOperand(name)),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Plus) => self.factor(),
            Some(Token::LParen) => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            Some(token) => Err(ExprError::UnexpectedToken(token.describe())),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}
