//! Numbers in rule documents.
//!
//! Authoring tools often write whole numbers as floats (`1500.0`). Rules keep
//! each number exactly as written and read it in the shape they need, so a
//! document serializes back unchanged and `1` never turns into `1.0`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// A JSON number from a rule document, kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleNumber(Number);

impl RuleNumber {
    /// `None` for NaN and infinities, which JSON cannot hold.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self)
    }

    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or(0.0)
    }

    /// Nearest whole number. `None` when it does not fit in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        if let Some(value) = self.0.as_i64() {
            return Some(value);
        }
        if let Some(value) = self.0.as_u64() {
            return i64::try_from(value).ok();
        }

        let rounded = self.0.as_f64()?.round();
        // i64::MAX as f64 rounds up to 2^63, which is out of range.
        (rounded >= i64::MIN as f64 && rounded < i64::MAX as f64).then_some(rounded as i64)
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

impl From<i32> for RuleNumber {
    fn from(value: i32) -> Self {
        Self(Number::from(value))
    }
}

impl From<i64> for RuleNumber {
    fn from(value: i64) -> Self {
        Self(Number::from(value))
    }
}

impl std::fmt::Display for RuleNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn whole_number<T: TryFrom<i64>, E: serde::de::Error>(number: RuleNumber) -> Result<T, E> {
    number
        .as_i64()
        .and_then(|value| T::try_from(value).ok())
        .ok_or_else(|| E::custom(format!("{number} is out of range")))
}

/// Deserialize any JSON number into an integer field.
pub(crate) fn de_whole<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    whole_number(RuleNumber::deserialize(deserializer)?)
}

/// [`de_whole`] for optional fields; pair it with `#[serde(default)]`.
pub(crate) fn de_whole_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    Option::<RuleNumber>::deserialize(deserializer)?
        .map(whole_number::<T, D::Error>)
        .transpose()
}

/// `field` read as a whole number, or `default` when absent or out of range.
pub(crate) fn whole_or(field: &Option<RuleNumber>, default: i64) -> i64 {
    field.as_ref().and_then(RuleNumber::as_i64).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "de_whole")]
        ms: i64,
        #[serde(default, deserialize_with = "de_whole_opt")]
        delta: Option<i32>,
    }

    #[test]
    fn test_number_kept_as_written() {
        for raw in [json!(1), json!(1.0), json!(-3), json!(0.25)] {
            let number: RuleNumber = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(serde_json::to_value(&number).unwrap(), raw);
        }
    }

    #[test]
    fn test_as_i64_rounds_floats() {
        let read = |raw| serde_json::from_value::<RuleNumber>(raw).unwrap().as_i64();
        assert_eq!(read(json!(1500)), Some(1500));
        assert_eq!(read(json!(1500.0)), Some(1500));
        assert_eq!(read(json!(2.6)), Some(3));
        assert_eq!(read(json!(-2.4)), Some(-2));
        assert_eq!(read(json!(u64::MAX)), None);
        assert_eq!(read(json!(1e300)), None);
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert!(RuleNumber::float(f64::NAN).is_none());
        assert_eq!(RuleNumber::float(0.5).unwrap().as_f64(), 0.5);
        assert_eq!(RuleNumber::from(7).as_f64(), 7.0);
    }

    #[test]
    fn test_whole_field_accepts_float() {
        let sample: Sample = serde_json::from_value(json!({"ms": 1500.0, "delta": 1.0})).unwrap();
        assert_eq!(sample.ms, 1500);
        assert_eq!(sample.delta, Some(1));

        let sample: Sample = serde_json::from_value(json!({"ms": 10})).unwrap();
        assert_eq!(sample.delta, None);
    }

    #[test]
    fn test_whole_field_rejects_out_of_range() {
        assert!(serde_json::from_value::<Sample>(json!({"ms": 1, "delta": 1e12})).is_err());
        assert!(serde_json::from_value::<Sample>(json!({"ms": "soon"})).is_err());
    }
}
