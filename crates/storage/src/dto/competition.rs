use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PoolType;

/// Insert payload for the `competitions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewCompetition {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,

    pub date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Place must be between 1 and 255 characters"
    ))]
    pub place: String,

    pub pool_type: PoolType,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

impl NewCompetition {
    /// Status every bulk-created competition starts with.
    pub const INITIAL_ENTRY_STATUS: &'static str = "before";

    /// Additional validation that requires multiple fields
    pub fn validate_dates(&self) -> Result<(), &'static str> {
        if let Some(end) = self.end_date
            && end < self.date
        {
            return Err("End date must be on or after start date");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition(end_date: Option<NaiveDate>) -> NewCompetition {
        NewCompetition {
            title: "Spring Meet".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            end_date,
            place: "City Pool".to_string(),
            pool_type: PoolType::ShortCourse,
            note: None,
        }
    }

    #[test]
    fn test_single_day_competition() {
        assert!(competition(None).validate_dates().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let comp = competition(NaiveDate::from_ymd_opt(2025, 4, 14));
        assert!(comp.validate_dates().is_err());
    }

    #[test]
    fn test_empty_place_rejected() {
        let mut comp = competition(None);
        comp.place = String::new();
        let errors = comp.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("place"));
    }
}
