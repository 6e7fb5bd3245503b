use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sequence::ItemId;

/// Scroll orientation of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn is_horizontal(self) -> bool {
        self == Axis::Horizontal
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::Vertical => "vertical",
            Axis::Horizontal => "horizontal",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A configured numeric bound.
///
/// A value that was supplied but could not be read as a number is kept as
/// `Invalid` instead of being replaced by the default. Every comparison
/// against an invalid threshold is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Threshold {
    Value(u32),
    Invalid(String),
}

impl Threshold {
    /// Read a raw setting: absent means `default`, present but unparseable means `Invalid`.
    pub fn from_raw(raw: Option<&str>, default: u32) -> Self {
        match raw {
            None => Threshold::Value(default),
            Some(s) => Self::parse(s),
        }
    }

    /// Parse a supplied setting. Anything that is not a `u32` is kept as `Invalid`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<u32>() {
            Ok(v) => Threshold::Value(v),
            Err(_) => Threshold::Invalid(raw.to_string()),
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Threshold::Value(v) => Some(*v),
            Threshold::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.value().is_some()
    }

    /// `x <= self`
    pub fn admits(&self, x: u32) -> bool {
        self.value().is_some_and(|v| x <= v)
    }

    /// `x >= self`
    pub fn is_reached_by(&self, x: u32) -> bool {
        self.value().is_some_and(|v| x >= v)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Value(v) => write!(f, "{}", v),
            Threshold::Invalid(raw) => write!(f, "invalid({:?})", raw),
        }
    }
}

// Config files may hold numbers, quoted numbers or junk. None of them fail the load.
impl<'de> Deserialize<'de> for Threshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ThresholdVisitor;

        impl<'de> Visitor<'de> for ThresholdVisitor {
            type Value = Threshold;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a threshold number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Threshold, E> {
                Ok(u32::try_from(v)
                    .map(Threshold::Value)
                    .unwrap_or_else(|_| Threshold::Invalid(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Threshold, E> {
                Ok(u32::try_from(v)
                    .map(Threshold::Value)
                    .unwrap_or_else(|_| Threshold::Invalid(v.to_string())))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Threshold, E> {
                Ok(Threshold::Invalid(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Threshold, E> {
                Ok(Threshold::Invalid(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Threshold, E> {
                Ok(Threshold::parse(v))
            }
        }

        deserializer.deserialize_any(ThresholdVisitor)
    }
}

/// Inclusive range of newest-item values that switch the list to horizontal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPolicy {
    pub lower: Threshold,
    pub upper: Threshold,
}

impl Default for AxisPolicy {
    fn default() -> Self {
        Self {
            lower: Threshold::Value(21),
            upper: Threshold::Value(30),
        }
    }
}

impl AxisPolicy {
    pub fn new(lower: Threshold, upper: Threshold) -> Self {
        Self { lower, upper }
    }

    pub fn is_horizontal(&self, newest: ItemId) -> bool {
        self.lower.is_reached_by(newest) && self.upper.admits(newest)
    }

    pub fn axis_for(&self, newest: ItemId) -> Axis {
        if self.is_horizontal(newest) {
            Axis::Horizontal
        } else {
            Axis::Vertical
        }
    }

    /// Item just before the horizontal range (`lower - 1`).
    pub fn lower_checkpoint(&self) -> Option<ItemId> {
        self.lower.value().and_then(|v| v.checked_sub(1))
    }

    /// Item just after the horizontal range (`upper + 1`).
    pub fn upper_checkpoint(&self) -> Option<ItemId> {
        self.upper.value().and_then(|v| v.checked_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Bounds {
        lower: Threshold,
    }

    fn lower_from_toml(value: &str) -> Threshold {
        toml::from_str::<Bounds>(&format!("lower = {}", value))
            .unwrap()
            .lower
    }

    #[test]
    fn test_threshold_from_toml() {
        assert_eq!(lower_from_toml("21"), Threshold::Value(21));
        assert_eq!(lower_from_toml("\"21\""), Threshold::Value(21));
        assert_eq!(lower_from_toml("\" 7 \""), Threshold::Value(7));
        assert_eq!(lower_from_toml("-5"), Threshold::Invalid("-5".to_string()));
        assert_eq!(lower_from_toml("2.5"), Threshold::Invalid("2.5".to_string()));
        assert_eq!(lower_from_toml("true"), Threshold::Invalid("true".to_string()));
        assert_eq!(
            lower_from_toml("\"twenty\""),
            Threshold::Invalid("twenty".to_string())
        );
        assert_eq!(
            lower_from_toml("5000000000"),
            Threshold::Invalid("5000000000".to_string())
        );
    }

    #[test]
    fn test_default_range() {
        let policy = AxisPolicy::default();
        assert_eq!(policy.axis_for(1), Axis::Vertical);
        assert_eq!(policy.axis_for(20), Axis::Vertical);
        for n in 21..=30 {
            assert_eq!(policy.axis_for(n), Axis::Horizontal, "item {}", n);
        }
        assert_eq!(policy.axis_for(31), Axis::Vertical);
        assert_eq!(policy.lower_checkpoint(), Some(20));
        assert_eq!(policy.upper_checkpoint(), Some(31));
    }

    #[test]
    fn test_threshold_from_raw() {
        assert_eq!(Threshold::from_raw(None, 50), Threshold::Value(50));
        assert_eq!(Threshold::from_raw(Some(" 12 "), 50), Threshold::Value(12));
        assert_eq!(
            Threshold::from_raw(Some("twelve"), 50),
            Threshold::Invalid("twelve".to_string())
        );
    }

    #[test]
    fn test_invalid_threshold_disables_horizontal() {
        let policy = AxisPolicy::new(Threshold::Invalid("x".into()), Threshold::Value(30));
        for n in 1..=50 {
            assert!(!policy.is_horizontal(n));
        }
        assert_eq!(policy.lower_checkpoint(), None);
        assert_eq!(policy.upper_checkpoint(), Some(31));
    }

    #[test]
    fn test_invalid_threshold_comparisons_are_false() {
        let t = Threshold::Invalid("NaN".into());
        assert!(!t.admits(0));
        assert!(!t.is_reached_by(u32::MAX));
        assert!(!t.is_valid());
    }

    #[test]
    fn test_zero_lower_has_no_checkpoint() {
        let policy = AxisPolicy::new(Threshold::Value(0), Threshold::Value(u32::MAX));
        assert_eq!(policy.lower_checkpoint(), None);
        assert_eq!(policy.upper_checkpoint(), None);
        assert!(policy.is_horizontal(1));
    }
}
