use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who the imported rows belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ownership {
    pub user_id: Uuid,
    pub team_id: Option<Uuid>,
}

impl Ownership {
    pub fn personal(user_id: Uuid) -> Self {
        Self {
            user_id,
            team_id: None,
        }
    }

    pub fn team(user_id: Uuid, team_id: Uuid) -> Self {
        Self {
            user_id,
            team_id: Some(team_id),
        }
    }

    /// Team competitions are owned by the team alone; `user_id` stays null.
    pub fn competition_user_id(&self) -> Option<Uuid> {
        match self.team_id {
            Some(_) => None,
            None => Some(self.user_id),
        }
    }
}
