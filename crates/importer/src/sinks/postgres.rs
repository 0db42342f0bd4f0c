use sqlx::PgPool;
use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};
use storage::repository::{CompetitionRepository, PracticeRepository, RecordRepository};

use crate::Result;
use crate::traits::RecordSink;

/// Writes straight into Postgres through the storage repositories. Each call
/// is one multi-row `INSERT`, so a chunk is stored entirely or not at all.
#[derive(Clone)]
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordSink for PostgresSink {
    async fn insert_practices(&self, owner: &Ownership, rows: &[NewPractice]) -> Result<usize> {
        let ids = PracticeRepository::new(&self.pool)
            .insert_many(owner, rows)
            .await?;
        Ok(ids.len())
    }

    async fn insert_competitions(
        &self,
        owner: &Ownership,
        rows: &[NewCompetition],
    ) -> Result<usize> {
        let ids = CompetitionRepository::new(&self.pool)
            .insert_many(owner, rows)
            .await?;
        Ok(ids.len())
    }

    async fn insert_records(&self, owner: &Ownership, rows: &[NewRecord]) -> Result<usize> {
        let ids = RecordRepository::new(&self.pool)
            .insert_many(owner, rows)
            .await?;
        Ok(ids.len())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
