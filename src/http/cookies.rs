//! Ordered cookie bundles
//!
//! The panel expects a fixed set of cookies in a fixed order, so requests carry an
//! explicit bundle; whatever else the session's jar holds is appended after it.

/// Ordered set of cookie name/value pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieBundle {
    pairs: Vec<(String, String)>,
}

impl CookieBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a cookie, keeping the original position on replace
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    /// Builder-style `set`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the bundle as a `Cookie` header value (`a=1; b=2`)
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
