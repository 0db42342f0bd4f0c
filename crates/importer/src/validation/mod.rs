//! Turns parsed rows into insert drafts. Every row is checked on its own and
//! every problem is reported; nothing here fails fast.

mod dates;
mod times;

pub use dates::parse_date_cell;
pub use times::{parse_distance, parse_time_cell};

use serde::Serialize;
use std::fmt;
use storage::dto::{NewCompetition, NewPractice, NewRecord};
use storage::models::{PoolType, Style};
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::workbook::{
    BestTimeCells, BestTimeSheet, CompetitionCells, ParsedRow, PracticeCells, RowCells,
};

/// A problem with one cell (or one row) of the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationError {
    pub sheet: String,
    pub row: u32,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {} ({}): {}",
            self.sheet, self.row, self.field, self.message
        )
    }
}

/// A draft together with the sheet row it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    pub sheet: String,
    pub row: u32,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Practice(NewPractice),
    Competition(NewCompetition),
    Record(NewRecord),
}

/// Valid drafts grouped by destination table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub practices: Vec<Located<NewPractice>>,
    pub competitions: Vec<Located<NewCompetition>>,
    pub records: Vec<Located<NewRecord>>,
}

impl ValidatedBatch {
    pub fn len(&self) -> usize {
        self.practices.len() + self.competitions.len() + self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, row: &ParsedRow, draft: Draft) {
        let sheet = row.sheet.clone();
        let row = row.row;
        match draft {
            Draft::Practice(value) => self.practices.push(Located { sheet, row, value }),
            Draft::Competition(value) => self.competitions.push(Located { sheet, row, value }),
            Draft::Record(value) => self.records.push(Located { sheet, row, value }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub batch: ValidatedBatch,
    pub errors: Vec<ValidationError>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Collects the errors of a single row.
struct RowErrors<'a> {
    row: &'a ParsedRow,
    errors: Vec<ValidationError>,
}

impl<'a> RowErrors<'a> {
    fn new(row: &'a ParsedRow) -> Self {
        Self {
            row,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError {
            sheet: self.row.sheet.clone(),
            row: self.row.row,
            field: field.into(),
            message: message.into(),
        });
    }

    /// Runs the draft's own rules. `placeholders` names fields that hold a
    /// stand-in value because the cell was already reported.
    fn check<T: Validate>(&mut self, draft: &T, placeholders: &[&str]) {
        if let Err(e) = draft.validate() {
            self.extend(e, placeholders);
        }
    }

    fn extend(&mut self, errors: ValidationErrors, placeholders: &[&str]) {
        let mut fields: Vec<_> = errors
            .field_errors()
            .into_iter()
            .filter(|(field, _)| !placeholders.contains(&&**field))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        for (field, errors) in fields {
            for e in errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                self.push(field.to_string(), message);
            }
        }
    }

    fn finish(self, draft: Option<Draft>) -> Result<Draft, Vec<ValidationError>> {
        match draft {
            Some(draft) if self.errors.is_empty() => Ok(draft),
            _ => Err(self.errors),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RowValidator {
    year: i32,
}

impl RowValidator {
    /// `year` resolves dates written without one (`4月1日`).
    pub fn new(year: i32) -> Self {
        Self { year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn validate(&self, rows: &[ParsedRow]) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for row in rows {
            match self.validate_row(row) {
                Ok(draft) => outcome.batch.push(row, draft),
                Err(errors) => outcome.errors.extend(errors),
            }
        }

        debug!(
            "Validated {} rows: {} valid, {} errors",
            rows.len(),
            outcome.batch.len(),
            outcome.errors.len()
        );
        outcome
    }

    pub fn validate_row(&self, row: &ParsedRow) -> Result<Draft, Vec<ValidationError>> {
        let mut errors = RowErrors::new(row);
        let draft = match &row.cells {
            RowCells::Practice(cells) => self.practice(cells, &mut errors),
            RowCells::Competition(cells) => self.competition(cells, &mut errors),
            RowCells::BestTime(cells) => self.best_time(cells, &mut errors),
        };
        errors.finish(draft)
    }

    fn practice(&self, cells: &PracticeCells, errors: &mut RowErrors) -> Option<Draft> {
        let date = match parse_date_cell(&cells.date, self.year) {
            Ok(Some(date)) => Some(date),
            Ok(None) => {
                errors.push("date", "Date is required");
                None
            }
            Err(message) => {
                errors.push("date", message);
                None
            }
        };

        let practice = NewPractice {
            date: date.unwrap_or_default(),
            title: cells.title.non_empty(),
            place: cells.place.non_empty(),
            note: cells.note.non_empty(),
        };
        errors.check(&practice, &[]);
        date.map(|_| Draft::Practice(practice))
    }

    fn competition(&self, cells: &CompetitionCells, errors: &mut RowErrors) -> Option<Draft> {
        let start = match parse_date_cell(&cells.start_date, self.year) {
            Ok(Some(date)) => Some(date),
            Ok(None) => {
                errors.push("start_date", "Start date is required");
                None
            }
            Err(message) => {
                errors.push("start_date", message);
                None
            }
        };

        let end = parse_date_cell(&cells.end_date, self.year).unwrap_or_else(|message| {
            errors.push("end_date", message);
            None
        });

        let place = cells.place.non_empty();
        if place.is_none() {
            errors.push("place", "Place is required");
        }

        let pool_type = match cells.pool_type.non_empty() {
            None => {
                errors.push("pool_type", "Pool type is required");
                None
            }
            Some(label) => {
                let parsed = PoolType::from_label(&label);
                if parsed.is_none() {
                    errors.push("pool_type", format!("'{label}' is not a pool type (25m or 50m)"));
                }
                parsed
            }
        };

        let competition = NewCompetition {
            title: cells.title.display(),
            date: start.unwrap_or_default(),
            end_date: end,
            place: place.clone().unwrap_or_default(),
            pool_type: pool_type.unwrap_or(PoolType::ShortCourse),
            note: cells.note.non_empty(),
        };
        let placeholders: &[&str] = if place.is_none() { &["place"] } else { &[] };
        errors.check(&competition, placeholders);
        if start.is_some()
            && let Err(message) = competition.validate_dates()
        {
            errors.push("end_date", message);
        }

        match (start, place, pool_type) {
            (Some(_), Some(_), Some(_)) => Some(Draft::Competition(competition)),
            _ => None,
        }
    }

    fn best_time(&self, cells: &BestTimeCells, errors: &mut RowErrors) -> Option<Draft> {
        let layout = BestTimeSheet::find(cells.pool_type, cells.relay);

        let style = match parse_distance(&cells.distance) {
            None => {
                errors.push(
                    "distance",
                    format!("'{}' is not a distance", cells.distance.display()),
                );
                None
            }
            Some(distance) => {
                let style = Style::find(cells.stroke, distance)
                    .filter(|_| layout.offers(cells.stroke, distance));
                if style.is_none() {
                    errors.push(
                        cells.column.clone(),
                        format!(
                            "{}m {} is not an event on sheet {}",
                            distance,
                            cells.stroke.name_jp(),
                            layout.name
                        ),
                    );
                }
                style
            }
        };

        let time = parse_time_cell(&cells.time)
            .map_err(|message| errors.push(cells.column.clone(), message))
            .ok();

        let record = NewRecord {
            style_id: style.map_or(0, |s| s.id),
            time: time.unwrap_or_default(),
            is_relaying: cells.relay,
            pool_type: cells.pool_type,
            note: cells.note.non_empty(),
        };
        let mut placeholders = Vec::new();
        if style.is_none() {
            placeholders.push("style_id");
        }
        if time.is_none() {
            placeholders.push("time");
        }
        errors.check(&record, &placeholders);

        match (style, time) {
            (Some(_), Some(_)) => Some(Draft::Record(record)),
            _ => None,
        }
    }
}
