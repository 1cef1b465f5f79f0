//! UTC timestamps recorded on messages, facts and questions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn survives_a_yaml_snapshot() {
        let ts = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap());
        let yaml = serde_yaml::to_string(&ts).unwrap();
        assert!(yaml.contains("2024-03-02T08:00:00"));
        let parsed: Timestamp = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, ts);
        assert_eq!(parsed.as_datetime(), ts.as_datetime());
    }

    #[test]
    fn orders_chronologically() {
        let earlier = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(Timestamp::now() > earlier);
    }
}
