use serde::{Deserialize, Serialize};

/// Construction-time settings for a [`Store`](super::Store).
///
/// Deserializable so a host application can keep them alongside its own
/// configuration; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Label attached to every log event the store emits.
    pub name: String,
}

impl StoreOptions {
    /// Options with the given store name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let options: StoreOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, StoreOptions::default());

        let options: StoreOptions = serde_json::from_str(r#"{ "name": "session" }"#).unwrap();
        assert_eq!(options, StoreOptions::named("session"));
    }
}
