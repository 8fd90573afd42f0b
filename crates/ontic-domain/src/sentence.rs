//! Sentence module - validated CycL formulas
//!
//! Sentences are kept as a token list plus their canonical text. The core only
//! needs enough structure to validate query text, substitute indexicals and
//! classify formulas for the AUTO direction policy; it does not interpret
//! the logic.

use crate::error::ConstructionError;
use crate::indexical::IndexicalMap;
use crate::term::normalize_constant_name;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Token {
    Open,
    Close,
    Atom(String),
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, ConstructionError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '"' => {
                let mut end = None;
                let mut escaped = false;
                for (i, c) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        end = Some(i);
                        break;
                    }
                }
                let end = end.ok_or_else(|| ConstructionError::InvalidSentence {
                    text: text.to_string(),
                    reason: "unterminated string literal".to_string(),
                })?;
                tokens.push(Token::Atom(text[start..=end].to_string()));
            }
            _ => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_whitespace() || next == '(' || next == ')' || next == '"' {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Atom(text[start..end].to_string()));
            }
        }
    }

    Ok(tokens)
}

pub(crate) fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous: Option<&Token> = None;
    for token in tokens {
        let needs_space = matches!(
            (previous, token),
            (Some(Token::Atom(_)) | Some(Token::Close), Token::Open | Token::Atom(_))
        );
        if needs_space {
            out.push(' ');
        }
        match token {
            Token::Open => out.push('('),
            Token::Close => out.push(')'),
            Token::Atom(atom) => out.push_str(atom),
        }
        previous = Some(token);
    }
    out
}

/// Classification of a formula, used to resolve AUTO assertion direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaClass {
    /// A ground formula asserted as a fact
    Fact,

    /// An implication (rule)
    Rule,

    /// Anything that is neither classified as fact nor rule
    Generic,
}

/// A syntactically valid CycL sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sentence {
    text: String,
    tokens: Vec<Token>,
}

impl Sentence {
    /// Parse and validate sentence text
    ///
    /// The text must hold exactly one expression with balanced parentheses.
    /// Whitespace is normalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::Sentence;
    ///
    /// let s = Sentence::parse("( #$isa  ?X #$Dog )").unwrap();
    /// assert_eq!(s.as_str(), "(#$isa ?X #$Dog)");
    /// assert!(Sentence::parse("(#$isa ?X").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ConstructionError> {
        if text.trim().is_empty() {
            return Err(ConstructionError::EmptyText);
        }

        let tokens = tokenize(text)?;
        Self::from_tokens(text, tokens)
    }

    fn from_tokens(source: &str, tokens: Vec<Token>) -> Result<Self, ConstructionError> {
        let mut depth: usize = 0;
        let mut top_level = 0;
        let mut previous: Option<&Token> = None;

        for token in &tokens {
            match token {
                Token::Open => {
                    if depth == 0 {
                        top_level += 1;
                    }
                    depth += 1;
                }
                Token::Close => {
                    if depth == 0 {
                        return Err(ConstructionError::Unbalanced(source.to_string()));
                    }
                    if matches!(previous, Some(Token::Open)) {
                        return Err(ConstructionError::InvalidSentence {
                            text: source.to_string(),
                            reason: "empty expression".to_string(),
                        });
                    }
                    depth -= 1;
                }
                Token::Atom(_) => {
                    if depth == 0 {
                        top_level += 1;
                    }
                }
            }
            previous = Some(token);
        }

        if depth != 0 {
            return Err(ConstructionError::Unbalanced(source.to_string()));
        }
        if top_level != 1 {
            return Err(ConstructionError::InvalidSentence {
                text: source.to_string(),
                reason: format!("expected one expression, found {}", top_level),
            });
        }

        Ok(Self {
            text: render(&tokens),
            tokens,
        })
    }

    /// Canonical CycL text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub(crate) fn atoms(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Atom(a) => Some(a.as_str()),
            _ => None,
        })
    }

    /// Outermost operator, if this sentence is a compound expression
    pub fn operator(&self) -> Option<&str> {
        match (self.tokens.first(), self.tokens.get(1)) {
            (Some(Token::Open), Some(Token::Atom(op))) => Some(op.as_str()),
            _ => None,
        }
    }

    /// Free variables (atoms starting with `?`), sorted
    pub fn variables(&self) -> BTreeSet<&str> {
        self.atoms().filter(|a| a.starts_with('?')).collect()
    }

    /// Whether this sentence mentions no variables
    pub fn is_ground(&self) -> bool {
        self.atoms().all(|a| !a.starts_with('?'))
    }

    /// Whether this sentence is a single flat expression
    pub fn is_atomic(&self) -> bool {
        self.tokens.iter().filter(|t| **t == Token::Open).count() <= 1
    }

    /// Whether this sentence is a ground atomic formula (GAF)
    pub fn is_ground_atomic(&self) -> bool {
        self.is_ground() && self.is_atomic()
    }

    /// Whether a constant with the given name occurs in this sentence
    pub fn mentions(&self, name: &str) -> bool {
        let name = normalize_constant_name(name);
        self.atoms().any(|a| normalize_constant_name(a) == name)
    }

    /// Classify this formula for the AUTO direction policy
    ///
    /// An outermost `implies` makes a rule, a ground formula makes a fact,
    /// everything else is generic.
    pub fn classify(&self) -> FormulaClass {
        match self.operator().map(normalize_constant_name) {
            Some("implies") => FormulaClass::Rule,
            _ if self.is_ground() => FormulaClass::Fact,
            _ => FormulaClass::Generic,
        }
    }

    /// Replace every indexical occurring in this sentence with its value
    ///
    /// Substitution is simultaneous, so the result does not depend on map
    /// order. Unused indexicals are ignored.
    pub fn substitute(&self, indexicals: &IndexicalMap) -> Result<Sentence, ConstructionError> {
        if indexicals.is_empty() {
            return Ok(self.clone());
        }

        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match token {
                Token::Atom(atom) => match indexicals.get(atom) {
                    Some(value) => tokens.extend(value.tokens.iter().cloned()),
                    None => tokens.push(token.clone()),
                },
                other => tokens.push(other.clone()),
            }
        }

        Self::from_tokens(&self.text, tokens)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for Sentence {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
