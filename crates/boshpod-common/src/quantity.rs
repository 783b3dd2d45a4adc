//! Kubernetes resource quantities
//!
//! Accepts the standard quantity syntax: a signed decimal number followed by a
//! binary SI suffix (`Ki`..`Ei`), a decimal SI suffix (`n`, `u`, `m`, `k`,
//! `M`..`E`) or a decimal exponent (`e3`, `E-2`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A validated resource quantity such as `512Mi` or `250m`.
///
/// The original spelling is kept for serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    raw: String,
    value: f64,
}

/// Reason a quantity string was rejected
#[derive(Clone, Debug, PartialEq)]
pub struct QuantityError(String);

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for QuantityError {}

const BINARY_SUFFIXES: [(&str, i32); 6] = [
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

const DECIMAL_SUFFIXES: [(&str, i32); 9] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

impl Quantity {
    /// Parse a quantity string.
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(QuantityError("quantity is empty".to_string()));
        }

        let number_end = number_prefix_len(s);
        let (number, suffix) = s.split_at(number_end);
        let mantissa = parse_number(number)
            .ok_or_else(|| QuantityError(format!("quantity '{}' has no valid number", input)))?;

        let multiplier = suffix_multiplier(suffix).ok_or_else(|| {
            QuantityError(format!(
                "quantity '{}' has unknown suffix '{}'",
                input, suffix
            ))
        })?;

        Ok(Self {
            raw: s.to_string(),
            value: mantissa * multiplier,
        })
    }

    /// Numeric value in base units (bytes, cores)
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the quantity is strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }

    /// The quantity as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

// Length of the leading `[+-]?digits[.digits]` part.
fn number_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    end
}

fn parse_number(s: &str) -> Option<f64> {
    let digits = s.trim_start_matches(['+', '-']);
    if digits.is_empty() || digits == "." || digits.matches('.').count() > 1 {
        return None;
    }
    s.parse::<f64>().ok()
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    if suffix.is_empty() {
        return Some(1.0);
    }
    if let Some((_, exp)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(2f64.powi(*exp));
    }
    if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
        return Some(10f64.powi(*exp));
    }
    let exponent = suffix
        .strip_prefix('e')
        .or_else(|| suffix.strip_prefix('E'))?;
    let digits = exponent.trim_start_matches(['+', '-']);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    exponent.parse::<i32>().ok().map(|e| 10f64.powi(e))
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Quantity {
    type Error = QuantityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> Self {
        q.raw
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
