use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-row operation on a license record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LicenseAction {
    /// Upsert with the entitlement flag set.
    Activate,
    Deactivate,
    /// Requires operator confirmation before anything is sent.
    Delete,
}

impl LicenseAction {
    pub const ALL: [Self; 3] = [Self::Activate, Self::Deactivate, Self::Delete];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
        }
    }

    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Delete)
    }
}

impl fmt::Display for LicenseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LicenseAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown action: {s}"))
    }
}
