//! Serde adapters for the compact Things Cloud field encodings.
//!
//! Timestamps travel as seconds since the epoch: creation/modification times
//! as floats, calendar days as the integer second of UTC midnight. Flags such
//! as the evening bit travel as `0`/`1`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity_id::EntityId;

fn datetime_from_secs<E: serde::de::Error>(secs: f64) -> Result<DateTime<Utc>, E> {
    if !secs.is_finite() {
        return Err(E::custom(format!("timestamp is not finite: {}", secs)));
    }
    let whole = secs.floor();
    // Microsecond resolution keeps float noise out of equality checks.
    let micros = ((secs - whole) * 1_000_000.0).round() as u32;
    let (whole, micros) = if micros >= 1_000_000 {
        (whole + 1.0, 0)
    } else {
        (whole, micros)
    };
    DateTime::from_timestamp(whole as i64, micros * 1_000)
        .ok_or_else(|| E::custom(format!("timestamp out of range: {}", secs)))
}

/// `Option<DateTime<Utc>>` as float seconds (`cd`, `md`).
pub mod timestamp_float {
    use super::*;

    pub fn to_secs(dt: DateTime<Utc>) -> f64 {
        dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_micros()) / 1e6
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&to_secs(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(datetime_from_secs::<D::Error>)
            .transpose()
    }
}

/// `Option<DateTime<Utc>>` as whole seconds (`sp`, `lai`).
pub mod timestamp_secs {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.timestamp()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| datetime_from_secs::<D::Error>(secs.floor()))
            .transpose()
    }
}

/// `Option<NaiveDate>` as the integer second of UTC midnight (`sr`, `dd`, ...).
pub mod day {
    use super::*;

    pub fn to_secs(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_some(&to_secs(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| datetime_from_secs::<D::Error>(secs.floor()).map(|dt| dt.date_naive()))
            .transpose()
    }
}

/// `bool` as `0`/`1` (`sb`). Plain JSON booleans are accepted on input.
pub mod bool_bit {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Bit {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Bit::deserialize(deserializer)? {
            Bit::Bool(b) => b,
            Bit::Int(i) => i != 0,
        })
    }
}

/// Single optional parent reference (`pn`). Written as a list, read from a
/// string, a list, or null.
pub mod parent_ref {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Parent {
        One(EntityId),
        Many(Vec<EntityId>),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<EntityId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&EntityId> = value.iter().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<EntityId>, D::Error> {
        Ok(match Option::<Parent>::deserialize(deserializer)? {
            None => None,
            Some(Parent::One(id)) => Some(id),
            Some(Parent::Many(ids)) => ids.into_iter().next(),
        })
    }
}

/// `String` that may arrive as `null` (`sn`). Always written as a string.
pub mod string_or_null {
    use super::*;

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "timestamp_float")]
        cd: Option<DateTime<Utc>>,
        #[serde(with = "timestamp_secs")]
        sp: Option<DateTime<Utc>>,
        #[serde(with = "day")]
        sr: Option<NaiveDate>,
        #[serde(with = "bool_bit")]
        sb: bool,
        #[serde(with = "parent_ref")]
        pn: Option<EntityId>,
    }

    #[test]
    fn test_encodes_compact_shapes() {
        let sample = Sample {
            cd: Some(Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap()),
            sp: Some(Utc.with_ymd_and_hms(2024, 12, 9, 12, 0, 0).unwrap()),
            sr: NaiveDate::from_ymd_opt(2024, 12, 9),
            sb: true,
            pn: Some(EntityId::parse("parent").unwrap()),
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(
            value,
            json!({
                "cd": 1733745600.0,
                "sp": 1733745600,
                "sr": 1733702400,
                "sb": 1,
                "pn": ["parent"],
            })
        );
    }

    #[test]
    fn test_decodes_lenient_inputs() {
        let sample: Sample = serde_json::from_value(json!({
            "cd": 1733745600.25,
            "sp": 1733745600,
            "sr": null,
            "sb": false,
            "pn": "parent",
        }))
        .unwrap();
        assert_eq!(sample.cd.unwrap().timestamp_subsec_millis(), 250);
        assert_eq!(sample.sr, None);
        assert!(!sample.sb);
        assert_eq!(sample.pn.unwrap().as_str(), "parent");
    }

    #[test]
    fn test_empty_parent_list_is_none() {
        let sample: Sample = serde_json::from_value(json!({
            "cd": null, "sp": null, "sr": null, "sb": 0, "pn": [],
        }))
        .unwrap();
        assert_eq!(sample.pn, None);
    }

    #[test]
    fn test_float_timestamp_is_stable_across_roundtrips() {
        let first: Sample = serde_json::from_value(json!({
            "cd": 1733745600.123456789, "sp": null, "sr": null, "sb": 0, "pn": null,
        }))
        .unwrap();
        let again: Sample =
            serde_json::from_value(serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }
}
