//! Context module - microtheories in which sentences hold

use crate::error::ConstructionError;
use crate::term::{normalize_constant_name, CONSTANT_PREFIX};
use std::fmt;

/// Context in which queries are asked when none is given
pub const INFERENCE_PSC: &str = "InferencePSC";

/// A KB context (microtheory)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context {
    name: String,
}

impl Context {
    /// Create a context reference from its constant name
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::Context;
    ///
    /// let ctx = Context::new("#$BaseKB").unwrap();
    /// assert_eq!(ctx.name(), "BaseKB");
    /// assert!(Context::new("Base KB").is_err());
    /// ```
    pub fn new(name: &str) -> Result<Self, ConstructionError> {
        let name = normalize_constant_name(name.trim());
        let valid = !name.is_empty()
            && !name
                .chars()
                .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"' || c == '?');
        if !valid {
            return Err(ConstructionError::InvalidContext(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// The default query context
    pub fn inference_psc() -> Self {
        Self {
            name: INFERENCE_PSC.to_string(),
        }
    }

    /// Constant name without prefix
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::inference_psc()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CONSTANT_PREFIX, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inference_psc() {
        assert_eq!(Context::default().name(), INFERENCE_PSC);
        assert_eq!(Context::default().to_string(), "#$InferencePSC");
    }

    #[test]
    fn test_invalid_names() {
        assert!(Context::new("").is_err());
        assert!(Context::new("#$").is_err());
        assert!(Context::new("(MtSpace A B)").is_err());
        assert!(Context::new("?MT").is_err());
    }
}
