use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Pool length a swim was recorded in. Stored as `0` (25 m) / `1` (50 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i16", into = "i16")]
pub enum PoolType {
    ShortCourse,
    LongCourse,
}

impl PoolType {
    pub fn as_i16(self) -> i16 {
        match self {
            PoolType::ShortCourse => 0,
            PoolType::LongCourse => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PoolType::ShortCourse => "25m",
            PoolType::LongCourse => "50m",
        }
    }

    /// Parses the label used in spreadsheets (`25m` / `50m`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "25m" | "25" => Some(PoolType::ShortCourse),
            "50m" | "50" => Some(PoolType::LongCourse),
            _ => None,
        }
    }
}

impl From<PoolType> for i16 {
    fn from(value: PoolType) -> Self {
        value.as_i16()
    }
}

impl TryFrom<i16> for PoolType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PoolType::ShortCourse),
            1 => Ok(PoolType::LongCourse),
            other => Err(format!("invalid pool type: {other}")),
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
