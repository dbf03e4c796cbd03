//! # Positional and keyword data passed to handlers.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use eventspace::Arguments;
//!
//! let args = Arguments::new()
//!     .arg("hello")
//!     .kwarg("role", "admin");
//!
//! assert_eq!(args.get(0), Some(&json!("hello")));
//! assert_eq!(args.kwarg_value("role"), Some(&json!("admin")));
//! ```

use serde_json::{Map, Value};

/// Keyword arguments keyed by name.
pub type Kwargs = Map<String, Value>;

/// Data a producer hands to every handler of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Positional values, in order.
    pub positional: Vec<Value>,
    /// Keyword values.
    pub keywords: Kwargs,
}

impl Arguments {
    /// Empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional value.
    #[inline]
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword value, replacing any previous value for `key`.
    #[inline]
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(key.into(), value.into());
        self
    }

    /// Positional value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword value for `key`.
    pub fn kwarg_value(&self, key: &str) -> Option<&Value> {
        self.keywords.get(key)
    }

    /// Returns a copy whose keywords are `defaults` overridden by `self.keywords`.
    pub(crate) fn merged_over(&self, defaults: &Kwargs) -> Arguments {
        if defaults.is_empty() {
            return self.clone();
        }
        let mut keywords = defaults.clone();
        for (k, v) in &self.keywords {
            keywords.insert(k.clone(), v.clone());
        }
        Arguments {
            positional: self.positional.clone(),
            keywords,
        }
    }
}
