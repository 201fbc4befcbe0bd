use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BindingError;
use crate::registry::DataValue;

/// Tolerance for equality comparisons on host values.
const EQUALITY_EPSILON: f32 = 0.001;

/// Transform applied to a host value before it drives a PWM output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Modifier {
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "sub")]
    Sub,
    #[default]
    #[serde(rename = "mul")]
    Mul,
}

impl Modifier {
    pub const ALL: [Modifier; 3] = [Modifier::Mul, Modifier::Add, Modifier::Sub];

    pub fn apply(self, value: f32, operand: f32) -> f32 {
        match self {
            Self::Add => value + operand,
            Self::Sub => value - operand,
            Self::Mul => value * operand,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| BindingError::UnknownModifier(s.to_string()))
    }
}

/// Test deciding whether a shift-register pin is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "!=")]
    NotEqual,
    #[default]
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Non-zero bitwise AND of the integer value and the threshold.
    #[serde(rename = "&")]
    BitTest,
}

impl Comparison {
    pub const ALL: [Comparison; 7] = [
        Comparison::NotEqual,
        Comparison::Equal,
        Comparison::Less,
        Comparison::LessOrEqual,
        Comparison::Greater,
        Comparison::GreaterOrEqual,
        Comparison::BitTest,
    ];

    /// Compare `value` against `threshold`. `None` when the value is NaN.
    ///
    /// Equality uses a fixed tolerance of 0.001. The bit test truncates both
    /// sides to integers.
    pub fn evaluate(self, value: DataValue, threshold: f32) -> Option<bool> {
        let v = value.as_f32();
        if v.is_nan() {
            return None;
        }
        Some(match self {
            Self::NotEqual => (v - threshold).abs() > EQUALITY_EPSILON,
            Self::Equal => (v - threshold).abs() < EQUALITY_EPSILON,
            Self::Less => v < threshold,
            Self::LessOrEqual => v <= threshold,
            Self::Greater => v > threshold,
            Self::GreaterOrEqual => v >= threshold,
            Self::BitTest => (value.as_i64() & threshold as i64) != 0,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotEqual => "!=",
            Self::Equal => "==",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::BitTest => "&",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| BindingError::UnknownComparison(s.to_string()))
    }
}
