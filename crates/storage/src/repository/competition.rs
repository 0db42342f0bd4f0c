use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::{NewCompetition, Ownership};
use crate::error::{Result, classify_insert_error};

/// Repository for Competition database operations
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    /// Create a new CompetitionRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert all rows with a single statement and return the new ids
    pub async fn insert_many(
        &self,
        owner: &Ownership,
        rows: &[NewCompetition],
    ) -> Result<Vec<Uuid>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new(
            r#"
            INSERT INTO competitions (
                user_id, team_id, title, date, end_date, place, pool_type, note, entry_status
            )
            "#,
        );

        query.push_values(rows, |mut b, row| {
            b.push_bind(owner.competition_user_id())
                .push_bind(owner.team_id)
                .push_bind(row.title.clone())
                .push_bind(row.date)
                .push_bind(row.end_date)
                .push_bind(row.place.clone())
                .push_bind(row.pool_type.as_i16())
                .push_bind(row.note.clone())
                .push_bind(NewCompetition::INITIAL_ENTRY_STATUS);
        });
        query.push(" RETURNING id");

        query
            .build_query_scalar::<Uuid>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify_insert_error("competitions", e))
    }
}
