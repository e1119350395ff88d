//! Human-readable duration parsing for configuration values

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

/// Duration wrapper accepting `"500ms"`, `"10s"`, `"3m"`, `"1h"`, `"1d"` or
/// a bare number of seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u128)] = &[
            ("d", 86_400_000),
            ("h", 3_600_000),
            ("m", 60_000),
            ("s", 1_000),
        ];

        let millis = self.0.as_millis();
        for &(unit, divisor) in UNITS {
            if millis >= divisor && millis % divisor == 0 {
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

impl Serialize for HumanDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_human_readable())
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
                formatter.write_str("a duration as string (e.g., \"10s\", \"5m\") or integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration::from_secs(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration::from_secs)
                    .map_err(|_| E::custom(format!("duration must not be negative: {}", v)))
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

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Bare numbers are seconds
        if let Ok(num) = s.parse::<u64>() {
            return Ok(HumanDuration::from_secs(num));
        }

        let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(0) | None => return Err(ParseError::InvalidFormat(s.to_string())),
            Some(pos) => (&s[..pos], &s[pos..]),
        };

        let num: u64 = num_str.parse()?;

        let multiplier: u64 = match unit.trim() {
            "ms" => return Ok(HumanDuration(Duration::from_millis(num))),
            "s" | "sec" | "secs" => 1,
            "m" | "min" | "mins" => 60,
            "h" | "hr" | "hours" => 3600,
            "d" | "day" | "days" => 86_400,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        let secs = num
            .checked_mul(multiplier)
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
    fn test_parse_bare_seconds() {
        assert_eq!("10".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("500ms".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_millis(500));
        assert_eq!("3s".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(3));
        assert_eq!("5m".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(300));
        assert_eq!("2h".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(7200));
        assert_eq!("1D".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("s".parse::<HumanDuration>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("10w".parse::<HumanDuration>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(matches!(
            "300000000000000d".parse::<HumanDuration>(),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "18446744073709551615m".parse::<HumanDuration>(),
            Err(ParseError::InvalidFormat(_))
        ));
        assert_eq!(
            "18446744073709551615s".parse::<HumanDuration>().unwrap().as_duration(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(HumanDuration::from_secs(60).to_human_readable(), "1m");
        assert_eq!(HumanDuration::from_secs(90).to_human_readable(), "90s");
        assert_eq!(HumanDuration(Duration::from_millis(1500)).to_human_readable(), "1500ms");
        assert_eq!(HumanDuration::from_secs(7200).to_human_readable(), "2h");
    }

    #[test]
    fn test_deserialize_string() {
        let json = r#"{"interval": "3s"}"#;
        #[derive(Deserialize)]
        struct TestStruct {
            interval: HumanDuration,
        }
        let parsed: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.interval.as_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_deserialize_number() {
        let json = r#"{"interval": 30}"#;
        #[derive(Deserialize)]
        struct TestStruct {
            interval: HumanDuration,
        }
        let parsed: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.interval.as_duration(), Duration::from_secs(30));
    }
}
