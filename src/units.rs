// ============================================================================
// Tick Amounts - TickClear Settlement Core
// ============================================================================
//
// All settlement values are u128 counts of indivisible "tick" units. A single
// market can carry num_ticks of 10^18 or more, which puts routine amounts
// past what a JSON number (u64 at best) can hold, so every amount crosses the
// JSON boundary as a decimal string.
//
// Usage: #[serde(with = "crate::units::string")] on u128 fields, plus the
// vec / opt_vec variants for payout distributions.
//
// ============================================================================

/// Serde codec for a single u128 amount as a decimal string
pub mod string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde codec for a vector of u128 amounts as decimal strings
pub mod vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[u128], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u128>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|s| s.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde codec for an optional vector of u128 amounts
pub mod opt_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &Option<Vec<u128>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match values {
            Some(v) => serializer.collect_seq(v.iter().map(|x| x.to_string())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u128>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
        match raw {
            Some(strings) => strings
                .iter()
                .map(|s| s.parse().map_err(serde::de::Error::custom))
                .collect::<Result<Vec<u128>, _>>()
                .map(Some),
            None => Ok(None),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
