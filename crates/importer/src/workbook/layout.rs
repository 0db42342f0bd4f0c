use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use storage::models::{PoolType, Stroke};
use utoipa::ToSchema;

use crate::error::ImporterError;

/// Sheet holding example rows; never imported.
pub const SAMPLE_SHEET: &str = "サンプル";

/// Competition input sheet.
pub const COMPETITION_INPUT_SHEET: &str = "大会登録";

/// Filler written into best-time cells for events that do not exist.
pub const EMPTY_MARKER: &str = "━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    Practice,
    Competition,
    BestTime,
}

impl ImportKind {
    pub const ALL: [ImportKind; 3] = [
        ImportKind::Practice,
        ImportKind::Competition,
        ImportKind::BestTime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Practice => "practice",
            ImportKind::Competition => "competition",
            ImportKind::BestTime => "best-time",
        }
    }

    /// Guesses the kind from an uploaded file name such as
    /// `練習一括登録_2025.xlsx` or `best_times.xlsx`.
    pub fn detect(file_name: &str) -> Option<Self> {
        let name = file_name.to_lowercase();
        if name.contains("practice") || name.contains("練習") {
            Some(ImportKind::Practice)
        } else if name.contains("competition") || name.contains("大会") {
            Some(ImportKind::Competition)
        } else if name.contains("besttime")
            || name.contains("best_time")
            || name.contains("best-time")
            || name.contains("ベストタイム")
        {
            Some(ImportKind::BestTime)
        } else {
            None
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = ImporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "practice" | "practices" => Ok(ImportKind::Practice),
            "competition" | "competitions" => Ok(ImportKind::Competition),
            "best-time" | "best-times" | "besttime" | "besttimes" => Ok(ImportKind::BestTime),
            _ => Err(ImporterError::UnknownKind(s.to_string())),
        }
    }
}

/// A header cell of a fixed layout: the label written by the templates and an
/// English alias accepted on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub label: &'static str,
    pub alias: &'static str,
}

impl Column {
    pub const fn new(label: &'static str, alias: &'static str) -> Self {
        Self { label, alias }
    }

    /// Only the first line of the header cell is significant, so templates
    /// can carry a hint on a second line.
    pub fn matches(&self, header: &str) -> bool {
        let first_line = header.lines().next().unwrap_or_default().trim();
        first_line == self.label || first_line.eq_ignore_ascii_case(self.alias)
    }
}

pub const PRACTICE_COLUMNS: [Column; 5] = [
    Column::new("日付", "Date"),
    Column::new("曜日", "Weekday"),
    Column::new("タイトル", "Title"),
    Column::new("場所", "Place"),
    Column::new("備考", "Note"),
];

pub const COMPETITION_COLUMNS: [Column; 6] = [
    Column::new("開始日", "Start date"),
    Column::new("終了日", "End date"),
    Column::new("大会名", "Title"),
    Column::new("場所", "Place"),
    Column::new("プール種別", "Pool type"),
    Column::new("備考", "Note"),
];

const DISTANCE_COLUMN: Column = Column::new("距離", "Distance");
const NOTE_COLUMN: Column = Column::new("備考", "Note");

const INDIVIDUAL_STROKES: [Stroke; 5] = Stroke::ALL;
const RELAY_STROKES: [Stroke; 3] = [Stroke::Freestyle, Stroke::Breaststroke, Stroke::Butterfly];

/// One of the four best-time sheets: distance in column A, then a
/// time/note column pair per stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestTimeSheet {
    pub name: &'static str,
    pub pool_type: PoolType,
    pub relay: bool,
    pub distances: &'static [u32],
    pub strokes: &'static [Stroke],
}

pub const BEST_TIME_SHEETS: [BestTimeSheet; 4] = [
    BestTimeSheet {
        name: "短水路",
        pool_type: PoolType::ShortCourse,
        relay: false,
        distances: &[25, 50, 100, 200, 400, 800, 1500],
        strokes: &INDIVIDUAL_STROKES,
    },
    BestTimeSheet {
        name: "短水路（引き継ぎ有）",
        pool_type: PoolType::ShortCourse,
        relay: true,
        distances: &[25, 50, 100, 200],
        strokes: &RELAY_STROKES,
    },
    BestTimeSheet {
        name: "長水路",
        pool_type: PoolType::LongCourse,
        relay: false,
        distances: &[50, 100, 200, 400, 800, 1500],
        strokes: &INDIVIDUAL_STROKES,
    },
    BestTimeSheet {
        name: "長水路（引き継ぎ有）",
        pool_type: PoolType::LongCourse,
        relay: true,
        distances: &[50, 100, 200],
        strokes: &RELAY_STROKES,
    },
];

impl BestTimeSheet {
    pub fn find(pool_type: PoolType, relay: bool) -> &'static BestTimeSheet {
        match (pool_type, relay) {
            (PoolType::ShortCourse, false) => &BEST_TIME_SHEETS[0],
            (PoolType::ShortCourse, true) => &BEST_TIME_SHEETS[1],
            (PoolType::LongCourse, false) => &BEST_TIME_SHEETS[2],
            (PoolType::LongCourse, true) => &BEST_TIME_SHEETS[3],
        }
    }

    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![DISTANCE_COLUMN];
        for stroke in self.strokes {
            columns.push(Column::new(stroke.name_jp(), stroke.name_en()));
            columns.push(NOTE_COLUMN);
        }
        columns
    }

    pub fn time_column(stroke_index: usize) -> usize {
        1 + stroke_index * 2
    }

    /// Whether the event can be swum on this sheet.
    pub fn offers(&self, stroke: Stroke, distance: u32) -> bool {
        if !self.distances.contains(&distance) || !self.strokes.contains(&stroke) {
            return false;
        }
        if self.relay && distance == 200 && stroke != Stroke::Freestyle {
            return false;
        }
        match stroke {
            Stroke::Freestyle => true,
            Stroke::Breaststroke | Stroke::Backstroke | Stroke::Butterfly => distance <= 200,
            Stroke::IndividualMedley => match self.pool_type {
                PoolType::ShortCourse => matches!(distance, 100 | 200 | 400),
                PoolType::LongCourse => matches!(distance, 200 | 400),
            },
        }
    }
}
