//! Indexical substitution maps for stored query specifications

use crate::error::ConstructionError;
use crate::sentence::Sentence;
use crate::term::{normalize_constant_name, KbTerm};
use std::collections::BTreeMap;

/// A validated map from indexical terms to the values substituted for them.
///
/// Keys are constant names (the `#$` prefix is optional and ignored). Values
/// are CycL expressions. Construction rejects maps whose result would depend
/// on substitution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexicalMap {
    entries: BTreeMap<String, Sentence>,
}

impl IndexicalMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(indexical, value)` pairs
    ///
    /// # Errors
    ///
    /// * `MalformedIndexical` for an empty or non-constant key, or a value that
    ///   is not a single CycL expression
    /// * `AmbiguousIndexical` when one indexical is bound to two different
    ///   values, or when a value mentions another indexical of the same map
    ///
    /// # Examples
    ///
    /// ```
    /// use ontic_domain::IndexicalMap;
    ///
    /// let map = IndexicalMap::from_pairs([("#$TheUser", "#$Alice")]).unwrap();
    /// assert_eq!(map.len(), 1);
    ///
    /// let clash = IndexicalMap::from_pairs([("TheUser", "#$Alice"), ("#$TheUser", "#$Bob")]);
    /// assert!(clash.is_err());
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries: BTreeMap<String, Sentence> = BTreeMap::new();

        for (key, value) in pairs {
            let raw_key = key.as_ref().trim();
            let name = normalize_constant_name(raw_key);
            if name.is_empty()
                || name.starts_with('?')
                || name
                    .chars()
                    .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"')
            {
                return Err(ConstructionError::MalformedIndexical {
                    key: raw_key.to_string(),
                    reason: "indexical must be a constant name".to_string(),
                });
            }

            let value = Sentence::parse(value.as_ref()).map_err(|e| {
                ConstructionError::MalformedIndexical {
                    key: raw_key.to_string(),
                    reason: format!("invalid value: {}", e),
                }
            })?;

            match entries.get(name) {
                Some(existing) if *existing != value => {
                    return Err(ConstructionError::AmbiguousIndexical {
                        key: name.to_string(),
                        reason: format!("bound to both {} and {}", existing, value),
                    });
                }
                Some(_) => {}
                None => {
                    entries.insert(name.to_string(), value);
                }
            }
        }

        for (key, value) in &entries {
            let chained = value
                .atoms()
                .map(normalize_constant_name)
                .find(|atom| *atom != key.as_str() && entries.contains_key(*atom));
            if let Some(other) = chained {
                return Err(ConstructionError::AmbiguousIndexical {
                    key: key.clone(),
                    reason: format!("value {} mentions indexical {}", value, other),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Build a map keyed by KB terms
    pub fn from_terms<I, V>(pairs: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = (KbTerm, V)>,
        V: AsRef<str>,
    {
        let pairs: Vec<(String, V)> = pairs
            .into_iter()
            .map(|(term, value)| (term.name().to_string(), value))
            .collect();
        Self::from_pairs(pairs)
    }

    /// Value bound to an indexical, if any
    pub fn get(&self, key: &str) -> Option<&Sentence> {
        self.entries.get(normalize_constant_name(key))
    }

    /// Indexical names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of indexicals
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_through_sentence() {
        let map = IndexicalMap::from_pairs([("TheUser", "#$Alice"), ("TheDay", "(#$DayFn 3)")])
            .unwrap();
        let s = Sentence::parse("(#$likes #$TheUser ?X #$TheDay)").unwrap();
        let out = s.substitute(&map).unwrap();
        assert_eq!(out.as_str(), "(#$likes #$Alice ?X (#$DayFn 3))");
    }

    #[test]
    fn test_same_value_twice_is_fine() {
        let map = IndexicalMap::from_pairs([("TheUser", "#$Alice"), ("#$TheUser", "#$Alice")])
            .unwrap();
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_malformed_keys() {
        for key in ["", "#$", "?X", "Two Words", "(Fn)"] {
            let result = IndexicalMap::from_pairs([(key, "#$Alice")]);
            assert!(
                matches!(result, Err(ConstructionError::MalformedIndexical { .. })),
                "key {:?} should be malformed",
                key
            );
        }
    }

    #[test]
    fn test_malformed_value() {
        let result = IndexicalMap::from_pairs([("TheUser", "(#$Alice")]);
        assert!(matches!(
            result,
            Err(ConstructionError::MalformedIndexical { .. })
        ));
    }

    #[test]
    fn test_chained_values_are_ambiguous() {
        let result = IndexicalMap::from_pairs([("A", "#$B"), ("B", "#$C")]);
        assert!(matches!(
            result,
            Err(ConstructionError::AmbiguousIndexical { .. })
        ));
    }

    #[test]
    fn test_self_reference_is_allowed() {
        let map = IndexicalMap::from_pairs([("A", "(#$WrapFn #$A)")]).unwrap();
        let s = Sentence::parse("(#$p #$A)").unwrap();
        assert_eq!(s.substitute(&map).unwrap().as_str(), "(#$p (#$WrapFn #$A))");
    }

    #[test]
    fn test_from_terms() {
        let map =
            IndexicalMap::from_terms([(KbTerm::individual("#$TheUser"), "#$Alice")]).unwrap();
        assert!(map.get("#$TheUser").is_some());
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["TheUser"]);
    }
}
