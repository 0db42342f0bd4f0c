use crate::Result;
use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};

/// Row-level insert API the bulk writer talks to. Each call either stores the
/// whole slice or fails; implementations must not retry on their own.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert_practices(&self, owner: &Ownership, rows: &[NewPractice]) -> Result<usize>;

    async fn insert_competitions(
        &self,
        owner: &Ownership,
        rows: &[NewCompetition],
    ) -> Result<usize>;

    async fn insert_records(&self, owner: &Ownership, rows: &[NewRecord]) -> Result<usize>;

    fn name(&self) -> &'static str;
}
