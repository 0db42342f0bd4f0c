use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::{NewRecord, Ownership};
use crate::error::{Result, classify_insert_error};

/// Repository for best-time records. Records are personal: `team_id` and
/// `competition_id` are always left null here.
pub struct RecordRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecordRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_many(&self, owner: &Ownership, rows: &[NewRecord]) -> Result<Vec<Uuid>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new(
            "INSERT INTO records (user_id, style_id, time, is_relaying, pool_type, note) ",
        );

        query.push_values(rows, |mut b, row| {
            b.push_bind(owner.user_id)
                .push_bind(row.style_id)
                .push_bind(row.time)
                .push_bind(row.is_relaying)
                .push_bind(row.pool_type.as_i16())
                .push_bind(row.note.clone());
        });
        query.push(" RETURNING id");

        query
            .build_query_scalar::<Uuid>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| classify_insert_error("records", e))
    }
}
