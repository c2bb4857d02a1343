//! Chart element formulas.
//!
//! Formulas are parsed once, when a chart configuration is compiled, into a
//! small expression tree. Surface syntax:
//!
//! ```text
//! stats.female                      field reference ("stats." is optional)
//! stats.female + stats.male         sum
//! stats.merched / stats.totalFans   ratio
//! PERCENT(stats.female, totalFans)  percentage, kept as a fraction
//! (a + b) / c                       grouping
//! ```
//!
//! Evaluation is three-valued: a value, "not applicable" when any referenced
//! field is absent, or division by zero which reads as 0.

use std::fmt;

use crate::error::{Error, Result};
use crate::limits::MAX_FORMULA_LEN;
use crate::stats::{is_known_field, StatRecord};

/// Parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Field(String),
    Sum(Vec<Formula>),
    Ratio(Box<Formula>, Box<Formula>),
    /// Part over whole, as a fraction.
    Percentage(Box<Formula>, Box<Formula>),
}

/// Outcome of evaluating a formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    Value(f64),
    NotApplicable,
    DivisionByZero,
}

impl Evaluated {
    /// Numeric reading: division by zero is 0, absence is `None`.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::DivisionByZero => Some(0.0),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

/// `num / den` with the zero-denominator rule applied.
pub fn divide(num: f64, den: f64) -> Evaluated {
    if den == 0.0 {
        Evaluated::DivisionByZero
    } else {
        Evaluated::Value(num / den)
    }
}

/// `divide` read as a plain number.
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    divide(num, den).value().unwrap_or(0.0)
}

impl Formula {
    /// Parse formula source.
    pub fn parse(source: &str) -> Result<Self> {
        if source.chars().count() > MAX_FORMULA_LEN {
            return Err(Error::invalid_formula(format!(
                "formula exceeds {} characters",
                MAX_FORMULA_LEN
            )));
        }
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(Error::invalid_formula("formula is empty"));
        }

        let mut parser = Parser { tokens, pos: 0 };
        let formula = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(Error::invalid_formula(format!(
                "unexpected {} in '{}'",
                token, source
            )));
        }
        Ok(formula)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Evaluate against a record.
    pub fn evaluate(&self, stats: &StatRecord) -> Evaluated {
        match self {
            Self::Field(name) => match stats.get(name) {
                Some(v) => Evaluated::Value(v),
                None => Evaluated::NotApplicable,
            },
            Self::Sum(terms) => {
                let mut total = 0.0;
                for term in terms {
                    match term.evaluate(stats).value() {
                        Some(v) => total += v,
                        None => return Evaluated::NotApplicable,
                    }
                }
                Evaluated::Value(total)
            }
            Self::Ratio(num, den) | Self::Percentage(num, den) => {
                match (num.evaluate(stats).value(), den.evaluate(stats).value()) {
                    (Some(n), Some(d)) => divide(n, d),
                    _ => Evaluated::NotApplicable,
                }
            }
        }
    }

    /// Whether the result is a fraction meant to be shown as a percentage.
    pub fn is_percentage(&self) -> bool {
        matches!(self, Self::Percentage(..))
    }

    /// Referenced field names, in order of first appearance.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Field(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Sum(terms) => terms.iter().for_each(|t| t.collect_fields(out)),
            Self::Ratio(a, b) | Self::Percentage(a, b) => {
                a.collect_fields(out);
                b.collect_fields(out);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "stats.{}", name),
            Self::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", term)?;
                }
                Ok(())
            }
            Self::Ratio(num, den) => {
                write_operand(f, num)?;
                write!(f, " / ")?;
                write_operand(f, den)
            }
            Self::Percentage(part, whole) => write!(f, "PERCENT({}, {})", part, whole),
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Formula) -> fmt::Result {
    match operand {
        Formula::Sum(_) | Formula::Ratio(..) => write!(f, "({})", operand),
        _ => write!(f, "{}", operand),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Plus,
    Slash,
    Comma,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "'{}'", name),
            Self::Plus => write!(f, "'+'"),
            Self::Slash => write!(f, "'/'"),
            Self::Comma => write!(f, "','"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(idx, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_alphabetic() => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(Error::invalid_formula(format!(
                    "unexpected character '{}' at position {}",
                    other, idx
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(Error::invalid_formula(format!(
                "expected {}, found {}",
                expected, token
            ))),
            None => Err(Error::invalid_formula(format!(
                "expected {}, found end of formula",
                expected
            ))),
        }
    }

    fn expr(&mut self) -> Result<Formula> {
        let mut terms = vec![self.ratio()?];
        while self.peek() == Some(&Token::Plus) {
            self.next();
            terms.push(self.ratio()?);
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(Formula::Sum(terms))
        }
    }

    fn ratio(&mut self) -> Result<Formula> {
        let num = self.operand()?;
        if self.peek() != Some(&Token::Slash) {
            return Ok(num);
        }
        self.next();
        let den = self.operand()?;
        if self.peek() == Some(&Token::Slash) {
            return Err(Error::invalid_formula(
                "chained division is ambiguous, use parentheses",
            ));
        }
        Ok(Formula::Ratio(Box::new(num), Box::new(den)))
    }

    fn operand(&mut self) -> Result<Formula> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) if name.eq_ignore_ascii_case("percent") => {
                self.expect(Token::LParen)?;
                let part = self.expr()?;
                self.expect(Token::Comma)?;
                let whole = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(Formula::Percentage(Box::new(part), Box::new(whole)))
            }
            Some(Token::Ident(name)) => field_reference(&name),
            Some(token) => Err(Error::invalid_formula(format!("unexpected {}", token))),
            None => Err(Error::invalid_formula("formula ends unexpectedly")),
        }
    }
}

fn field_reference(ident: &str) -> Result<Formula> {
    let name = ident.strip_prefix("stats.").unwrap_or(ident);
    if name.contains('.') {
        return Err(Error::invalid_formula(format!(
            "'{}' is not a stats field reference",
            ident
        )));
    }
    if !is_known_field(name) {
        return Err(Error::invalid_formula(format!("unknown stats field '{}'", name)));
    }
    Ok(Formula::Field(name.to_string()))
}
