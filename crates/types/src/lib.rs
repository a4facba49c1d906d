/// Errors that can occur when creating validated clinical value types.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The CTAS level was outside the clinical 1-5 range
    #[error("CTAS level must be between 1 and 5, got {0}")]
    CtasOutOfRange(u8),
    /// The priority score was negative or not a finite number
    #[error("Priority score must be a finite, non-negative number, got {0}")]
    InvalidPriorityScore(f64),
}

/// A Canadian Triage and Acuity Scale level.
///
/// Valid levels run from 1 (most acute, resuscitation) to 5 (least acute,
/// non-urgent). Construction is the only way to obtain a value, so any
/// `CtasLevel` held by the rest of the system is known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CtasLevel(u8);

impl CtasLevel {
    /// Creates a `CtasLevel` from a raw level number.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::CtasOutOfRange`] unless `level` is in `1..=5`.
    pub fn new(level: u8) -> Result<Self, ValueError> {
        if (1..=5).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValueError::CtasOutOfRange(level))
        }
    }

    /// Returns the raw level number (1-5).
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for CtasLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CTAS-{}", self.0)
    }
}

impl serde::Serialize for CtasLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for CtasLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        CtasLevel::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A derived numeric ranking used to order waiting patients.
///
/// Scores are finite and non-negative; higher means more urgent. The exact
/// derivation lives with the assessing clinician's tooling, not here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PriorityScore(f64);

impl PriorityScore {
    /// Creates a `PriorityScore` from a raw number.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidPriorityScore`] if `score` is negative,
    /// NaN, or infinite.
    pub fn new(score: f64) -> Result<Self, ValueError> {
        if score.is_finite() && score >= 0.0 {
            Ok(Self(score))
        } else {
            Err(ValueError::InvalidPriorityScore(score))
        }
    }

    /// Returns the raw score.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for PriorityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for PriorityScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PriorityScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        PriorityScore::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during
/// construction; an empty result is rejected. Used for message bodies and
/// anything else where a blank value would be meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctas_level_accepts_clinical_range() {
        for level in 1..=5 {
            let ctas = CtasLevel::new(level).expect("level should be valid");
            assert_eq!(ctas.as_u8(), level);
        }
    }

    #[test]
    fn ctas_level_rejects_out_of_range() {
        assert!(matches!(CtasLevel::new(0), Err(ValueError::CtasOutOfRange(0))));
        assert!(matches!(CtasLevel::new(6), Err(ValueError::CtasOutOfRange(6))));
    }

    #[test]
    fn ctas_level_orders_most_acute_first() {
        let resus = CtasLevel::new(1).unwrap();
        let non_urgent = CtasLevel::new(5).unwrap();
        assert!(resus < non_urgent);
    }

    #[test]
    fn ctas_level_serde_round_trip() {
        let ctas = CtasLevel::new(3).unwrap();
        let json = serde_json::to_string(&ctas).unwrap();
        assert_eq!(json, "3");
        let back: CtasLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctas);
    }

    #[test]
    fn ctas_level_deserialize_rejects_invalid() {
        let result: Result<CtasLevel, _> = serde_json::from_str("9");
        assert!(result.is_err());
    }

    #[test]
    fn priority_score_accepts_zero_and_positive() {
        assert!(PriorityScore::new(0.0).is_ok());
        assert!(PriorityScore::new(87.5).is_ok());
    }

    #[test]
    fn priority_score_rejects_negative_and_non_finite() {
        assert!(PriorityScore::new(-1.0).is_err());
        assert!(PriorityScore::new(f64::NAN).is_err());
        assert!(PriorityScore::new(f64::INFINITY).is_err());
    }

    #[test]
    fn non_empty_text_trims_whitespace() {
        let text = NonEmptyText::new("  hello  ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn non_empty_text_rejects_blank() {
        assert!(matches!(NonEmptyText::new("   "), Err(ValueError::Empty)));
        assert!(matches!(NonEmptyText::new(""), Err(ValueError::Empty)));
    }
}
