use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PoolType;

/// Insert payload for the `records` table (personal best times).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewRecord {
    #[validate(range(min = 1, max = 22, message = "Unknown style"))]
    pub style_id: i32,

    /// Seconds.
    #[validate(range(exclusive_min = 0.0, message = "Time must be positive"))]
    pub time: f64,

    pub is_relaying: bool,

    pub pool_type: PoolType,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}
