//! Declared value constraints and their applicability rules

use std::fmt;

use regex::Regex;

use crate::types::TypeExpr;
use crate::value::Value;

/// A full-match regular expression
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` so it must match the whole string
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as declared
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Constraints evaluated against a coerced value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    /// Lower bound: numeric value, or minimum length for sized values
    pub min: Option<Value>,
    /// Upper bound: numeric value, or maximum length for sized values
    pub max: Option<Value>,
    /// Exact length
    pub length: Option<usize>,
    pub pattern: Option<Pattern>,
    pub eq: Option<Value>,
    pub ne: Option<Value>,
    pub ge: Option<Value>,
    pub le: Option<Value>,
    pub gt: Option<Value>,
    pub lt: Option<Value>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// Checks that every declared constraint applies to `ty`.
    ///
    /// Returns the reason for the first inapplicable constraint.
    pub fn check_applicable(&self, ty: &TypeExpr) -> Result<(), String> {
        let inner = ty.strip_optional();
        let untyped = matches!(inner, TypeExpr::Any);

        if self.pattern.is_some() && !(untyped || ty.is_string_like()) {
            return Err(format!("pattern constraint requires a string field, not {}", ty.describe()));
        }

        if self.length.is_some() && !ty.is_sized() {
            return Err(format!("length constraint requires a sized field, not {}", ty.describe()));
        }

        for (name, bound) in [("min", &self.min), ("max", &self.max)] {
            let Some(bound) = bound else { continue };
            if ty.is_numeric() {
                if !bound.is_numeric() {
                    return Err(format!("{} must be numeric for {}", name, ty.describe()));
                }
            } else if ty.is_sized() && !untyped {
                if !matches!(bound, Value::Int(n) if *n >= 0) {
                    return Err(format!("{} must be a non-negative length for {}", name, ty.describe()));
                }
            } else if !ty.is_orderable() {
                return Err(format!(
                    "{} constraint requires a numeric, orderable or sized field, not {}",
                    name,
                    ty.describe()
                ));
            }
        }

        let ordering = [
            ("ge", &self.ge),
            ("le", &self.le),
            ("gt", &self.gt),
            ("lt", &self.lt),
        ];
        for (name, bound) in ordering {
            let Some(bound) = bound else { continue };
            if !ty.is_orderable() {
                return Err(format!("{} constraint requires an orderable field, not {}", name, ty.describe()));
            }
            if ty.is_numeric() && !bound.is_numeric() {
                return Err(format!("{} must be numeric for {}", name, ty.describe()));
            }
            if bound.is_null() {
                return Err(format!("{} cannot be None", name));
            }
        }

        Ok(())
    }
}
