//! Bulk writer: sends validated drafts to a [`RecordSink`] in chunks.
//!
//! Each destination group is cut into chunks of `chunk_size` rows. Chunks run
//! concurrently, at most `max_concurrency` at a time. A chunk the backend
//! rejects is replayed one row at a time so a single bad row only costs
//! itself. Nothing is rolled back: rows written before a failure stay.

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::Result;
use crate::traits::RecordSink;
use crate::validation::{Located, ValidatedBatch};

pub const DEFAULT_CHUNK_SIZE: usize = 100;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    pub chunk_size: usize,
    pub max_concurrency: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl WriterConfig {
    pub fn new(chunk_size: usize, max_concurrency: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            max_concurrency: max_concurrency.max(1),
        }
    }
}

/// Destination table of a draft group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Practices,
    Competitions,
    Records,
}

impl Target {
    pub fn table(self) -> &'static str {
        match self {
            Target::Practices => "practices",
            Target::Competitions => "competitions",
            Target::Records => "records",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GroupOutcome {
    pub created: usize,
    pub failed: usize,
}

/// A row the backend refused even when sent on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WriteFailure {
    pub target: Target,
    pub sheet: String,
    pub row: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub practices: GroupOutcome,
    pub competitions: GroupOutcome,
    pub records: GroupOutcome,
    /// Ordered by group, then by sheet row order.
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn group(&self, target: Target) -> GroupOutcome {
        match target {
            Target::Practices => self.practices,
            Target::Competitions => self.competitions,
            Target::Records => self.records,
        }
    }

    fn group_mut(&mut self, target: Target) -> &mut GroupOutcome {
        match target {
            Target::Practices => &mut self.practices,
            Target::Competitions => &mut self.competitions,
            Target::Records => &mut self.records,
        }
    }

    pub fn created(&self) -> usize {
        self.practices.created + self.competitions.created + self.records.created
    }

    pub fn failed(&self) -> usize {
        self.practices.failed + self.competitions.failed + self.records.failed
    }

    fn absorb(&mut self, chunk: ChunkOutcome) {
        let group = self.group_mut(chunk.target);
        group.created += chunk.created;
        group.failed += chunk.failed;
        self.failures.extend(chunk.failures);
    }
}

type InsertFuture<'a> = Pin<Box<dyn Future<Output = Result<usize>> + Send + 'a>>;

/// Draft types the writer knows how to route to a sink method.
trait Insertable: Clone + Send + Sync + 'static {
    const TARGET: Target;

    fn insert<'a>(
        sink: &'a dyn RecordSink,
        owner: &'a Ownership,
        rows: &'a [Self],
    ) -> InsertFuture<'a>;
}

impl Insertable for NewPractice {
    const TARGET: Target = Target::Practices;

    fn insert<'a>(sink: &'a dyn RecordSink, owner: &'a Ownership, rows: &'a [Self]) -> InsertFuture<'a> {
        Box::pin(async move { sink.insert_practices(owner, rows).await })
    }
}

impl Insertable for NewCompetition {
    const TARGET: Target = Target::Competitions;

    fn insert<'a>(sink: &'a dyn RecordSink, owner: &'a Ownership, rows: &'a [Self]) -> InsertFuture<'a> {
        Box::pin(async move { sink.insert_competitions(owner, rows).await })
    }
}

impl Insertable for NewRecord {
    const TARGET: Target = Target::Records;

    fn insert<'a>(sink: &'a dyn RecordSink, owner: &'a Ownership, rows: &'a [Self]) -> InsertFuture<'a> {
        Box::pin(async move { sink.insert_records(owner, rows).await })
    }
}

#[derive(Debug)]
struct ChunkOutcome {
    target: Target,
    created: usize,
    failed: usize,
    failures: Vec<WriteFailure>,
}

#[derive(Clone)]
pub struct BulkWriter {
    sink: Arc<dyn RecordSink>,
    config: WriterConfig,
}

impl BulkWriter {
    pub fn new(sink: Arc<dyn RecordSink>, config: WriterConfig) -> Self {
        Self {
            sink,
            config: WriterConfig::new(config.chunk_size, config.max_concurrency),
        }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn config(&self) -> WriterConfig {
        self.config
    }

    /// Writes every draft of the batch and waits for all chunks.
    ///
    /// Row-level rejections end up in the report; `Err` is only returned
    /// when a chunk task itself dies.
    pub async fn write(&self, owner: Ownership, batch: ValidatedBatch) -> Result<WriteReport> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut chunk_count = 0;

        self.spawn_group(&mut tasks, &semaphore, owner, batch.practices, &mut chunk_count);
        self.spawn_group(&mut tasks, &semaphore, owner, batch.competitions, &mut chunk_count);
        self.spawn_group(&mut tasks, &semaphore, owner, batch.records, &mut chunk_count);

        debug!(
            "Dispatched {} chunks to {} (max {} in flight)",
            chunk_count,
            self.sink.name(),
            self.config.max_concurrency
        );

        let mut outcomes: Vec<Option<ChunkOutcome>> = (0..chunk_count).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined?;
            outcomes[index] = Some(outcome);
        }

        let mut report = WriteReport::default();
        for outcome in outcomes.into_iter().flatten() {
            report.absorb(outcome);
        }

        info!(
            "Wrote {} rows to {}: {} failed",
            report.created(),
            self.sink.name(),
            report.failed()
        );
        Ok(report)
    }

    fn spawn_group<T: Insertable>(
        &self,
        tasks: &mut JoinSet<(usize, ChunkOutcome)>,
        semaphore: &Arc<Semaphore>,
        owner: Ownership,
        rows: Vec<Located<T>>,
        next_index: &mut usize,
    ) {
        let mut rows = rows.into_iter();
        loop {
            let chunk: Vec<Located<T>> = rows.by_ref().take(self.config.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let index = *next_index;
            *next_index += 1;
            let sink = Arc::clone(&self.sink);
            let semaphore = Arc::clone(semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                (index, write_chunk(sink.as_ref(), &owner, chunk).await)
            });
        }
    }
}

async fn write_chunk<T: Insertable>(
    sink: &dyn RecordSink,
    owner: &Ownership,
    chunk: Vec<Located<T>>,
) -> ChunkOutcome {
    let values: Vec<T> = chunk.iter().map(|r| r.value.clone()).collect();

    let error = match T::insert(sink, owner, &values).await {
        Ok(created) if created >= values.len() => {
            return ChunkOutcome {
                target: T::TARGET,
                created: values.len(),
                failed: 0,
                failures: Vec::new(),
            };
        }
        Ok(created) => return unconfirmed(chunk, created),
        Err(e) => e.to_string(),
    };

    if chunk.len() > 1 {
        warn!(
            "{} chunk of {} rows rejected ({}), retrying row by row",
            T::TARGET.table(),
            chunk.len(),
            error
        );
    }
    write_rows(sink, owner, chunk, error).await
}

async fn write_rows<T: Insertable>(
    sink: &dyn RecordSink,
    owner: &Ownership,
    chunk: Vec<Located<T>>,
    chunk_error: String,
) -> ChunkOutcome {
    let mut outcome = ChunkOutcome {
        target: T::TARGET,
        created: 0,
        failed: 0,
        failures: Vec::new(),
    };

    let single = chunk.len() == 1;
    for row in chunk {
        let result = if single {
            Err(chunk_error.clone())
        } else {
            T::insert(sink, owner, std::slice::from_ref(&row.value))
                .await
                .map_err(|e| e.to_string())
        };

        match result {
            Ok(created) if created > 0 => outcome.created += 1,
            Ok(_) => outcome.failures.push(failure::<T>(row, "Backend created no row".to_string())),
            Err(message) => outcome.failures.push(failure::<T>(row, message)),
        }
    }

    outcome.failed = outcome.failures.len();
    outcome
}

/// The backend accepted the chunk but confirmed fewer rows than it was sent.
/// Which rows are missing is unknown, so every unconfirmed row is reported
/// against the chunk's first sheet row with the row range in the message.
/// No retry: some of these rows are already stored.
fn unconfirmed<T: Insertable>(chunk: Vec<Located<T>>, created: usize) -> ChunkOutcome {
    let missing = chunk.len() - created;
    let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
        return ChunkOutcome {
            target: T::TARGET,
            created,
            failed: 0,
            failures: Vec::new(),
        };
    };

    warn!(
        "{} chunk rows {}-{}: backend confirmed {} of {}",
        T::TARGET.table(),
        first.row,
        last.row,
        created,
        chunk.len()
    );
    let message = format!(
        "Backend confirmed {} of {} rows sent from {} rows {}-{}",
        created,
        chunk.len(),
        first.sheet,
        first.row,
        last.row
    );
    let failures = (0..missing)
        .map(|_| WriteFailure {
            target: T::TARGET,
            sheet: first.sheet.clone(),
            row: first.row,
            message: message.clone(),
        })
        .collect();

    ChunkOutcome {
        target: T::TARGET,
        created,
        failed: missing,
        failures,
    }
}

fn failure<T: Insertable>(row: Located<T>, message: String) -> WriteFailure {
    WriteFailure {
        target: T::TARGET,
        sheet: row.sheet,
        row: row.row,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemorySink, practice_batch};
    use uuid::Uuid;

    fn owner() -> Ownership {
        Ownership::team(Uuid::new_v4(), Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_rows_are_chunked() {
        let sink = Arc::new(MemorySink::new());
        let writer = BulkWriter::new(sink.clone(), WriterConfig::new(10, 2));

        let report = writer.write(owner(), practice_batch(25)).await.unwrap();

        assert_eq!(report.practices.created, 25);
        assert_eq!(report.failed(), 0);
        assert_eq!(sink.calls(), 3);
        assert_eq!(sink.practice_count(), 25);
        assert!(sink.max_in_flight() <= 2);
    }

    #[tokio::test]
    async fn test_bad_row_does_not_block_chunk() {
        let sink = Arc::new(MemorySink::rejecting(&["row 7"]));
        let writer = BulkWriter::new(sink.clone(), WriterConfig::new(5, 4));

        let report = writer.write(owner(), practice_batch(12)).await.unwrap();

        assert_eq!(report.practices.created, 11);
        assert_eq!(report.practices.failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 7);
        assert_eq!(report.failures[0].target, Target::Practices);
        assert_eq!(sink.practice_count(), 11);
    }

    #[tokio::test]
    async fn test_failures_keep_row_order() {
        let sink = Arc::new(MemorySink::rejecting(&["row 3", "row 9", "row 14"]));
        let writer = BulkWriter::new(sink, WriterConfig::new(4, 3));

        let report = writer.write(owner(), practice_batch(16)).await.unwrap();

        let rows: Vec<u32> = report.failures.iter().map(|f| f.row).collect();
        assert_eq!(rows, vec![3, 9, 14]);
        assert_eq!(report.practices.created, 13);
    }

    #[tokio::test]
    async fn test_unconfirmed_rows_are_reported() {
        let sink = Arc::new(MemorySink::hiding(&["row 3", "row 4"]));
        let writer = BulkWriter::new(sink.clone(), WriterConfig::new(5, 1));

        let report = writer.write(owner(), practice_batch(7)).await.unwrap();

        assert_eq!(report.practices.created, 5);
        assert_eq!(report.practices.failed, 2);
        assert_eq!(report.failures.len(), report.failed());
        assert!(report.failures.iter().all(|f| f.row == 1));
        assert!(report.failures[0].message.contains("rows 1-5"));
        assert_eq!(sink.calls(), 2);
        assert_eq!(sink.practice_count(), 7);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let sink = Arc::new(MemorySink::new());
        let writer = BulkWriter::new(sink.clone(), WriterConfig::default());

        let report = writer.write(owner(), ValidatedBatch::default()).await.unwrap();

        assert_eq!(report, WriteReport::default());
        assert_eq!(sink.calls(), 0);
    }

    #[test]
    fn test_config_floors() {
        let config = WriterConfig::new(0, 0);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.max_concurrency, 1);
    }
}
