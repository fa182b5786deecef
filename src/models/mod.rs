pub mod action;
pub mod license;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub use action::LicenseAction;
pub use license::{LicenseRecord, RecordId, filter_records, normalize_email};

/// Status value the registry uses to mark a successful write.
pub const STATUS_OK: &str = "ok";

/// Acknowledgement returned by write operations.
///
/// Every field is optional and read leniently; row counts may arrive negative
/// (driver "unknown") or as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "deserialize_opt_flag")]
    pub ativo: Option<bool>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub updated: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub deleted: Option<i64>,
}

impl Ack {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some(STATUS_OK)
    }

    /// Builds an acknowledgement from any JSON payload.
    ///
    /// Non-object payloads yield an empty acknowledgement; `status` survives
    /// whenever the payload carries one.
    #[must_use]
    pub fn from_payload(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_else(|_| Self {
            status: value
                .get("status")
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        })
    }
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn deserialize_opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| license::coerce_flag(&value)))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
