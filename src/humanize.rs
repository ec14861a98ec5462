//! Human-readable duration parsing for configuration values ("250ms", "30s", "2m")

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Duration wrapper that deserializes from "30s"-style strings or plain milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Largest unit that divides the value evenly
    pub fn to_human_readable(&self) -> String {
        let millis = self.0.as_millis();
        const UNITS: &[(&str, u128)] = &[("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

        if millis == 0 {
            return "0ms".to_string();
        }

        for &(unit, divisor) in UNITS {
            if millis % divisor == 0 {
                return format!("{}{}", millis / divisor, unit);
            }
        }

        format!("{}ms", millis)
    }
}

impl From<HumanDuration> for Duration {
    fn from(value: HumanDuration) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HumanDurationVisitor;

        impl<'de> serde::de::Visitor<'de> for HumanDurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"250ms\", \"30s\") or milliseconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration::from_millis(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration::from_millis)
                    .map_err(|_| E::custom(format!("negative duration: {}", v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_human_readable())
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Bare numbers are milliseconds
        if let Ok(millis) = s.parse::<u64>() {
            return Ok(HumanDuration::from_millis(millis));
        }

        let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(0) | None => return Err(ParseError::InvalidFormat(s.to_string())),
            Some(pos) => (&s[..pos], s[pos..].trim()),
        };

        let num: u64 = num_str.parse()?;

        let secs_per_unit = match unit {
            "ms" => return Ok(HumanDuration::from_millis(num)),
            "s" | "sec" | "secs" => 1,
            "m" | "min" | "mins" => 60,
            "h" | "hr" | "hrs" => 3600,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        let secs = num
            .checked_mul(secs_per_unit)
            .ok_or_else(|| ParseError::InvalidFormat(s.to_string()))?;

        Ok(HumanDuration::from_secs(secs))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("250ms".parse::<HumanDuration>().unwrap(), HumanDuration::from_millis(250));
        assert_eq!("30s".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(30));
        assert_eq!("2m".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(120));
        assert_eq!("1H".parse::<HumanDuration>().unwrap(), HumanDuration::from_secs(3600));
    }

    #[test]
    fn test_parse_overflowing_hours_is_an_error() {
        assert!(matches!(
            "999999999999999999h".parse::<HumanDuration>(),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "18446744073709551615m".parse::<HumanDuration>(),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_bare_number_is_millis() {
        assert_eq!("1500".parse::<HumanDuration>().unwrap(), HumanDuration::from_millis(1500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "10 fortnights".parse::<HumanDuration>(),
            Err(ParseError::InvalidUnit(_))
        ));
        assert!(matches!(
            "s".parse::<HumanDuration>(),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(HumanDuration::from_secs(30).to_human_readable(), "30s");
        assert_eq!(HumanDuration::from_secs(7200).to_human_readable(), "2h");
        assert_eq!(HumanDuration::from_millis(1500).to_human_readable(), "1500ms");
        assert_eq!(HumanDuration::from_millis(0).to_human_readable(), "0ms");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct TestStruct {
            a: HumanDuration,
            b: HumanDuration,
        }
        let parsed: TestStruct = serde_json::from_str(r#"{"a": "10s", "b": 50}"#).unwrap();
        assert_eq!(parsed.a.as_duration(), Duration::from_secs(10));
        assert_eq!(parsed.b.as_duration(), Duration::from_millis(50));
    }
}
