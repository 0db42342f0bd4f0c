//! Test doubles shared by the unit tests.

use rust_xlsxwriter::Workbook;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use storage::dto::{NewCompetition, NewPractice, NewRecord, Ownership};

use crate::error::{ImporterError, Result};
use crate::traits::RecordSink;
use crate::validation::{Located, ValidatedBatch};

/// In-memory sink. A call fails as a whole when any of its rows carries one
/// of the `rejected` markers (practice/competition title, record note).
/// Rows carrying a `hidden` marker are stored but left out of the count.
#[derive(Default)]
pub struct MemorySink {
    rejected: Vec<String>,
    hidden: Vec<String>,
    practices: Mutex<Vec<(Ownership, NewPractice)>>,
    competitions: Mutex<Vec<(Ownership, NewCompetition)>>,
    records: Mutex<Vec<(Ownership, NewRecord)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(markers: &[&str]) -> Self {
        Self {
            rejected: markers.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn hiding(markers: &[&str]) -> Self {
        Self {
            hidden: markers.iter().map(|m| m.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn practice_count(&self) -> usize {
        self.practices.lock().unwrap().len()
    }

    pub fn practices(&self) -> Vec<(Ownership, NewPractice)> {
        self.practices.lock().unwrap().clone()
    }

    pub fn competitions(&self) -> Vec<(Ownership, NewCompetition)> {
        self.competitions.lock().unwrap().clone()
    }

    pub fn records(&self) -> Vec<(Ownership, NewRecord)> {
        self.records.lock().unwrap().clone()
    }

    async fn store<T: Clone>(
        &self,
        table: &'static str,
        owner: &Ownership,
        rows: &[T],
        marker: impl Fn(&T) -> Option<&str>,
        target: &Mutex<Vec<(Ownership, T)>>,
    ) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let rejected = rows
            .iter()
            .filter_map(|r| marker(r))
            .any(|m| self.rejected.iter().any(|r| r == m));
        if rejected {
            return Err(ImporterError::Backend {
                table,
                status: 400,
                body: "row rejected".to_string(),
            });
        }

        let hidden = rows
            .iter()
            .filter(|r| marker(r).is_some_and(|m| self.hidden.iter().any(|h| h == m)))
            .count();

        let mut stored = target.lock().unwrap();
        stored.extend(rows.iter().map(|r| (*owner, r.clone())));
        Ok(rows.len() - hidden)
    }
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn insert_practices(&self, owner: &Ownership, rows: &[NewPractice]) -> Result<usize> {
        self.store("practices", owner, rows, |r| r.title.as_deref(), &self.practices)
            .await
    }

    async fn insert_competitions(
        &self,
        owner: &Ownership,
        rows: &[NewCompetition],
    ) -> Result<usize> {
        self.store("competitions", owner, rows, |r| Some(r.title.as_str()), &self.competitions)
            .await
    }

    async fn insert_records(&self, owner: &Ownership, rows: &[NewRecord]) -> Result<usize> {
        self.store("records", owner, rows, |r| r.note.as_deref(), &self.records)
            .await
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// `count` practices on sheet rows `1..=count`, titled `row N`.
pub fn practice_batch(count: u32) -> ValidatedBatch {
    let date = chrono::NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    ValidatedBatch {
        practices: (1..=count)
            .map(|row| Located {
                sheet: "4月".to_string(),
                row,
                value: NewPractice {
                    date,
                    title: Some(format!("row {row}")),
                    place: None,
                    note: None,
                },
            })
            .collect(),
        ..ValidatedBatch::default()
    }
}

/// Builds an `.xlsx` from string cells; empty strings leave the cell blank.
pub fn xlsx(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    ws.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}
