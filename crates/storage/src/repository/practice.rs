use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::{NewPractice, Ownership};
use crate::error::{Result, classify_insert_error};

/// Repository for Practice database operations
pub struct PracticeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PracticeRepository<'a> {
    /// Create a new PracticeRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert all rows with a single statement and return the new ids
    pub async fn insert_many(&self, owner: &Ownership, rows: &[NewPractice]) -> Result<Vec<Uuid>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::new("INSERT INTO practices (user_id, team_id, date, title, place, note) ");

        query.push_values(rows, |mut b, row| {
            b.push_bind(owner.user_id)
                .push_bind(owner.team_id)
                .push_bind(row.date)
                .push_bind(row.title.clone())
                .push_bind(row.place.clone())
                .push_bind(row.note.clone());
        });
        query.push(" RETURNING id");

        query
            .build_query_scalar::<Uuid>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify_insert_error("practices", e))
    }
}
