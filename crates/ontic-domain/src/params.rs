//! Inference parameters attached to a query
//!
//! Parameters are written as keyword/value pairs, e.g.
//! `:max-transformation-depth 1 :max-time 5`.

use crate::error::ConstructionError;
use crate::sentence::{render, tokenize, Token};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter controlling the maximum inference time, in seconds
pub const MAX_TIME: &str = "max-time";

/// Parameter controlling the maximum number of answers
pub const MAX_NUMBER: &str = "max-number";

/// Value of a single inference parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// `t` or `nil`
    Bool(bool),

    /// Integer value
    Int(i64),

    /// Floating-point value
    Float(f64),

    /// Keyword such as `:hl` (stored without the colon)
    Keyword(String),

    /// Quoted string (stored without quotes)
    Text(String),

    /// Any other symbol or compound expression, kept verbatim
    Expression(String),
}

impl ParamValue {
    fn from_atom(atom: &str) -> Self {
        if atom.eq_ignore_ascii_case("t") {
            ParamValue::Bool(true)
        } else if atom.eq_ignore_ascii_case("nil") {
            ParamValue::Bool(false)
        } else if let Ok(i) = atom.parse::<i64>() {
            ParamValue::Int(i)
        } else if let Some(f) = parse_float(atom) {
            ParamValue::Float(f)
        } else if let Some(keyword) = atom.strip_prefix(':') {
            ParamValue::Keyword(keyword.to_string())
        } else if atom.len() >= 2 && atom.starts_with('"') && atom.ends_with('"') {
            ParamValue::Text(atom[1..atom.len() - 1].to_string())
        } else {
            ParamValue::Expression(atom.to_string())
        }
    }
}

/// Decimal float literal; symbols such as `nan` or `infinity` are not floats
fn parse_float(atom: &str) -> Option<f64> {
    let numeric = atom.bytes().any(|b| b.is_ascii_digit())
        && atom
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if !numeric {
        return None;
    }
    atom.parse::<f64>().ok().filter(|f| f.is_finite())
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(true) => f.write_str("t"),
            ParamValue::Bool(false) => f.write_str("nil"),
            ParamValue::Int(i) => write!(f, "{}", i),
            // Debug keeps the decimal point, so the value reparses as a float
            ParamValue::Float(x) => write!(f, "{:?}", x),
            ParamValue::Keyword(k) => write!(f, ":{}", k),
            ParamValue::Text(t) => write!(f, "\"{}\"", t),
            ParamValue::Expression(e) => f.write_str(e),
        }
    }
}

/// Keyword-indexed inference parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceParameters {
    values: BTreeMap<String, ParamValue>,
}

impl InferenceParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a parameter string
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::{InferenceParameters, ParamValue};
    ///
    /// let params = InferenceParameters::parse(":max-transformation-depth 1 :max-time 5").unwrap();
    /// assert_eq!(params.get("max-time"), Some(&ParamValue::Int(5)));
    /// assert_eq!(params.max_time(), Some(5));
    /// ```
    pub fn parse(input: &str) -> Result<Self, ConstructionError> {
        let invalid = |reason: String| ConstructionError::InvalidParameters {
            input: input.to_string(),
            reason,
        };

        let tokens = tokenize(input).map_err(|e| invalid(e.to_string()))?;
        let mut params = Self::new();
        let mut iter = tokens.into_iter();

        while let Some(token) = iter.next() {
            let keyword = match token {
                Token::Atom(atom) if atom.len() > 1 && atom.starts_with(':') => {
                    atom[1..].to_string()
                }
                Token::Atom(atom) => {
                    return Err(invalid(format!("expected keyword, found `{}`", atom)));
                }
                _ => return Err(invalid("expected keyword, found parenthesis".to_string())),
            };

            let value = match iter.next() {
                Some(Token::Atom(atom)) => ParamValue::from_atom(&atom),
                Some(Token::Open) => {
                    let mut depth = 1;
                    let mut parts = vec![Token::Open];
                    for token in iter.by_ref() {
                        match token {
                            Token::Open => depth += 1,
                            Token::Close => depth -= 1,
                            Token::Atom(_) => {}
                        }
                        parts.push(token);
                        if depth == 0 {
                            break;
                        }
                    }
                    if depth != 0 {
                        return Err(invalid(format!("unbalanced value for :{}", keyword)));
                    }
                    ParamValue::Expression(render(&parts))
                }
                Some(Token::Close) => {
                    return Err(invalid(format!("unbalanced value for :{}", keyword)));
                }
                None => return Err(invalid(format!("missing value for :{}", keyword))),
            };

            if params.values.contains_key(&keyword) {
                return Err(invalid(format!("duplicate parameter :{}", keyword)));
            }
            params.values.insert(keyword, value);
        }

        Ok(params)
    }

    /// Set a parameter, replacing any previous value
    pub fn set(&mut self, key: &str, value: ParamValue) -> &mut Self {
        self.values
            .insert(key.trim_start_matches(':').to_string(), value);
        self
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key.trim_start_matches(':'))
    }

    /// Maximum inference time in seconds, if set to a non-negative integer
    pub fn max_time(&self) -> Option<u64> {
        match self.get(MAX_TIME) {
            Some(ParamValue::Int(i)) if *i >= 0 => Some(*i as u64),
            _ => None,
        }
    }

    /// These parameters laid over `defaults`; own values win
    pub fn merged_over(&self, defaults: &InferenceParameters) -> InferenceParameters {
        let mut values = defaults.values.clone();
        values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        InferenceParameters { values }
    }

    /// Iterate keyword/value pairs in keyword order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for InferenceParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.values {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, ":{} {}", k, v)?;
            first = false;
        }
        Ok(())
    }
}
