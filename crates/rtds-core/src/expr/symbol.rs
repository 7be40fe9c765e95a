//! Named indeterminates.

use std::fmt;

/// A named symbol appearing in an expression.
///
/// Symbols order by name, which fixes the variable priority used by the
/// monomial order and by the GCD recursion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    /// Get the symbol's name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// First character of the name, if any.
    pub fn leading_char(&self) -> Option<char> {
        self.0.chars().next()
    }

    /// Whether this symbol denotes a time-varying quantity.
    ///
    /// Voltage and current literals start with `V` or `I`; solver-internal
    /// unknowns start with `_` and are never time-varying literals.
    pub fn is_time_varying(&self) -> bool {
        matches!(self.leading_char(), Some('V') | Some('I'))
    }

    /// The "previous sample" form of this symbol: `X_{n-1}`.
    pub fn previous_sample(&self) -> Symbol {
        Symbol(format!("{}_{{n-1}}", self.0))
    }

    /// The "current sample" form of this symbol: `X_{n}`.
    pub fn current_sample(&self) -> Symbol {
        Symbol(format!("{}_{{n}}", self.0))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_forms() {
        let v = Symbol::new("VC1");
        assert_eq!(v.previous_sample().name(), "VC1_{n-1}");
        assert_eq!(v.current_sample().name(), "VC1_{n}");
    }

    #[test]
    fn test_time_varying() {
        assert!(Symbol::new("IL1").is_time_varying());
        assert!(Symbol::new("Vin").is_time_varying());
        assert!(!Symbol::new("R1").is_time_varying());
        assert!(!Symbol::new("_IR1").is_time_varying());
        assert!(!Symbol::new("Ts").is_time_varying());
    }
}
