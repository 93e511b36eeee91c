use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Why a raw postal code string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostalCodeError {
    #[error("postal code is empty")]
    Empty,
    #[error("postal code must be 7 digits (e.g. 1234567), got '{0}'")]
    InvalidFormat(String),
}

/// A validated 7-digit Japanese postal code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse user input, accepting `1000005`, `100-0005` or surrounding
    /// whitespace. Whitespace and hyphens are stripped before validation.
    pub fn parse(raw: &str) -> Result<Self, PostalCodeError> {
        let digits: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if digits.is_empty() {
            return Err(PostalCodeError::Empty);
        }
        if !is_valid_postal_code(&digits) {
            return Err(PostalCodeError::InvalidFormat(raw.trim().to_string()));
        }
        Ok(Self(digits))
    }

    /// The bare 7 digits, e.g. `1000005`
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The grouped `NNN-NNNN` form
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..3], &self.0[3..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl std::str::FromStr for PostalCode {
    type Err = PostalCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// True when `s` is exactly 7 ASCII digits
pub fn is_valid_postal_code(s: &str) -> bool {
    Regex::new(r"^[0-9]{7}$")
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

/// Keep only digits from free-form input, truncated to 7
pub fn sanitize_input(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(7).collect()
}
