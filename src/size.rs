//! Block-size representation.
//!
//! A block size is either fixed at compile time or left dynamic, in which
//! case the eliminator reads it from the problem at runtime.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

/// Token the emitted C++ uses for a runtime-sized dimension.
pub const DYNAMIC_TOKEN: &str = "Eigen::Dynamic";

/// Filename suffix for a runtime-sized dimension.
pub const DYNAMIC_SUFFIX: &str = "d";

/// Errors produced when a block size cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("invalid block size: {0:?}")]
    Invalid(String),
    #[error("block size must be positive, got {0}")]
    NonPositive(i64),
}

/// A compile-time block size, or the dynamic sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeSpec {
    Fixed(NonZeroU32),
    Dynamic,
}

impl SizeSpec {
    /// Create a fixed size. Fails for zero.
    pub fn fixed(n: u32) -> Result<Self, SizeError> {
        NonZeroU32::new(n)
            .map(SizeSpec::Fixed)
            .ok_or(SizeError::NonPositive(0))
    }

    /// Create a size from an integer as a user would write it.
    pub fn from_int(n: i64) -> Result<Self, SizeError> {
        if n <= 0 {
            return Err(SizeError::NonPositive(n));
        }
        u32::try_from(n)
            .ok()
            .and_then(NonZeroU32::new)
            .map(SizeSpec::Fixed)
            .ok_or_else(|| SizeError::Invalid(n.to_string()))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, SizeSpec::Dynamic)
    }

    /// The fixed value, if any.
    pub fn value(&self) -> Option<u32> {
        match self {
            SizeSpec::Fixed(n) => Some(n.get()),
            SizeSpec::Dynamic => None,
        }
    }

    /// Whether an observed runtime size satisfies this spec.
    ///
    /// Dynamic accepts anything; a fixed size accepts only itself.
    #[inline]
    pub fn accepts(&self, observed: i32) -> bool {
        match self {
            SizeSpec::Dynamic => true,
            SizeSpec::Fixed(n) => i64::from(n.get()) == i64::from(observed),
        }
    }

    /// Text substituted into source templates.
    pub fn template_token(&self) -> String {
        match self {
            SizeSpec::Fixed(n) => n.to_string(),
            SizeSpec::Dynamic => DYNAMIC_TOKEN.to_string(),
        }
    }

    /// Text used when deriving unit filenames.
    pub fn filename_token(&self) -> String {
        match self {
            SizeSpec::Fixed(n) => n.to_string(),
            SizeSpec::Dynamic => DYNAMIC_SUFFIX.to_string(),
        }
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSpec::Fixed(n) => write!(f, "{}", n),
            SizeSpec::Dynamic => write!(f, "{}", DYNAMIC_SUFFIX),
        }
    }
}

impl FromStr for SizeSpec {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "d" | "dynamic" | DYNAMIC_TOKEN => Ok(SizeSpec::Dynamic),
            _ => {
                let n = s
                    .parse::<i64>()
                    .map_err(|_| SizeError::Invalid(s.to_string()))?;
                SizeSpec::from_int(n)
            }
        }
    }
}

impl<'de> Deserialize<'de> for SizeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Text(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Int(n) => SizeSpec::from_int(n),
            Raw::Text(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
