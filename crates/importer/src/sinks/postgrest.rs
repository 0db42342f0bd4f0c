use serde::Serialize;
use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ImporterError, Result};
use crate::traits::RecordSink;

/// Writes through the Supabase REST endpoint (`{url}/rest/v1/{table}`).
pub struct PostgrestSink {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct PracticeInsert<'a> {
    user_id: Uuid,
    team_id: Option<Uuid>,
    #[serde(flatten)]
    row: &'a NewPractice,
}

#[derive(Serialize)]
struct CompetitionInsert<'a> {
    user_id: Option<Uuid>,
    team_id: Option<Uuid>,
    entry_status: &'static str,
    #[serde(flatten)]
    row: &'a NewCompetition,
}

#[derive(Serialize)]
struct RecordInsert<'a> {
    user_id: Uuid,
    #[serde(flatten)]
    row: &'a NewRecord,
}

impl PostgrestSink {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("swim-import/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn post<T: Serialize + Sync>(&self, table: &'static str, rows: &[T]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("select", "id")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImporterError::Backend {
                table,
                status: status.as_u16(),
                body,
            });
        }

        let created: Vec<serde_json::Value> = response.json().await?;
        debug!("PostgREST created {} {} rows", created.len(), table);
        Ok(created.len())
    }
}

#[async_trait::async_trait]
impl RecordSink for PostgrestSink {
    async fn insert_practices(&self, owner: &Ownership, rows: &[NewPractice]) -> Result<usize> {
        let payload: Vec<_> = rows
            .iter()
            .map(|row| PracticeInsert {
                user_id: owner.user_id,
                team_id: owner.team_id,
                row,
            })
            .collect();
        self.post("practices", &payload).await
    }

    async fn insert_competitions(
        &self,
        owner: &Ownership,
        rows: &[NewCompetition],
    ) -> Result<usize> {
        let payload: Vec<_> = rows
            .iter()
            .map(|row| CompetitionInsert {
                user_id: owner.competition_user_id(),
                team_id: owner.team_id,
                entry_status: NewCompetition::INITIAL_ENTRY_STATUS,
                row,
            })
            .collect();
        self.post("competitions", &payload).await
    }

    async fn insert_records(&self, owner: &Ownership, rows: &[NewRecord]) -> Result<usize> {
        let payload: Vec<_> = rows
            .iter()
            .map(|row| RecordInsert {
                user_id: owner.user_id,
                row,
            })
            .collect();
        self.post("records", &payload).await
    }

    fn name(&self) -> &'static str {
        "postgrest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use storage::models::PoolType;

    #[test]
    fn test_table_url_strips_trailing_slash() {
        let sink = PostgrestSink::new("https://project.supabase.co/", "key").unwrap();
        assert_eq!(
            sink.table_url("records"),
            "https://project.supabase.co/rest/v1/records"
        );
    }

    #[test]
    fn test_team_competition_payload() {
        let team_id = Uuid::new_v4();
        let owner = Ownership::team(Uuid::new_v4(), team_id);
        let row = NewCompetition {
            title: "Spring Meet".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 20).unwrap(),
            end_date: None,
            place: "City Pool".to_string(),
            pool_type: PoolType::LongCourse,
            note: None,
        };

        let value = serde_json::to_value(CompetitionInsert {
            user_id: owner.competition_user_id(),
            team_id: owner.team_id,
            entry_status: NewCompetition::INITIAL_ENTRY_STATUS,
            row: &row,
        })
        .unwrap();

        assert_eq!(value["user_id"], json!(null));
        assert_eq!(value["team_id"], json!(team_id));
        assert_eq!(value["entry_status"], "before");
        assert_eq!(value["pool_type"], 1);
        assert_eq!(value["date"], "2025-04-20");
    }

    #[test]
    fn test_record_payload_is_personal() {
        let user_id = Uuid::new_v4();
        let row = NewRecord {
            style_id: 3,
            time: 58.31,
            is_relaying: false,
            pool_type: PoolType::ShortCourse,
            note: Some("taper".to_string()),
        };

        let value = serde_json::to_value(RecordInsert {
            user_id,
            row: &row,
        })
        .unwrap();

        assert_eq!(value["user_id"], json!(user_id));
        assert_eq!(value["style_id"], 3);
        assert_eq!(value["time"], 58.31);
        assert!(value.get("team_id").is_none());
    }
}
