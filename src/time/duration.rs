pub mod seconds {
    use chrono::TimeDelta;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sec: i64 = Deserialize::deserialize(deserializer)?;
        TimeDelta::try_seconds(sec)
            .ok_or_else(|| D::Error::custom(format!("{} seconds is out of range", sec)))
    }

    pub fn serialize<S>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(delta.num_seconds())
    }
}
