use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Stroke {
    #[serde(rename = "fr")]
    Freestyle,
    #[serde(rename = "br")]
    Breaststroke,
    #[serde(rename = "ba")]
    Backstroke,
    #[serde(rename = "fly")]
    Butterfly,
    #[serde(rename = "im")]
    IndividualMedley,
}

impl Stroke {
    pub const ALL: [Stroke; 5] = [
        Stroke::Freestyle,
        Stroke::Breaststroke,
        Stroke::Backstroke,
        Stroke::Butterfly,
        Stroke::IndividualMedley,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Stroke::Freestyle => "fr",
            Stroke::Breaststroke => "br",
            Stroke::Backstroke => "ba",
            Stroke::Butterfly => "fly",
            Stroke::IndividualMedley => "im",
        }
    }

    /// Label printed in sheet headers.
    pub fn name_jp(self) -> &'static str {
        match self {
            Stroke::Freestyle => "自由形",
            Stroke::Breaststroke => "平泳ぎ",
            Stroke::Backstroke => "背泳ぎ",
            Stroke::Butterfly => "バタフライ",
            Stroke::IndividualMedley => "個人メドレー",
        }
    }

    pub fn name_en(self) -> &'static str {
        match self {
            Stroke::Freestyle => "Freestyle",
            Stroke::Breaststroke => "Breaststroke",
            Stroke::Backstroke => "Backstroke",
            Stroke::Butterfly => "Butterfly",
            Stroke::IndividualMedley => "IM",
        }
    }

    fn abbreviation(self) -> &'static str {
        match self {
            Stroke::Freestyle => "Fr",
            Stroke::Breaststroke => "Br",
            Stroke::Backstroke => "Ba",
            Stroke::Butterfly => "Fly",
            Stroke::IndividualMedley => "IM",
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name_en())
    }
}

/// One row of the `styles` master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Style {
    pub id: i32,
    pub stroke: Stroke,
    pub distance: u32,
}

impl Style {
    pub fn find(stroke: Stroke, distance: u32) -> Option<&'static Style> {
        STYLES
            .iter()
            .find(|s| s.stroke == stroke && s.distance == distance)
    }

    pub fn by_id(id: i32) -> Option<&'static Style> {
        STYLES.iter().find(|s| s.id == id)
    }

    /// Short event name such as `100Fr`.
    pub fn name(&self) -> String {
        format!("{}{}", self.distance, self.stroke.abbreviation())
    }

    /// Display name such as `100m自由形`.
    pub fn name_jp(&self) -> String {
        format!("{}m{}", self.distance, self.stroke.name_jp())
    }
}

const fn style(id: i32, stroke: Stroke, distance: u32) -> Style {
    Style {
        id,
        stroke,
        distance,
    }
}

/// Kept in sync with the seed rows of the `styles` table.
pub const STYLES: [Style; 22] = [
    style(1, Stroke::Freestyle, 25),
    style(2, Stroke::Freestyle, 50),
    style(3, Stroke::Freestyle, 100),
    style(4, Stroke::Freestyle, 200),
    style(5, Stroke::Freestyle, 400),
    style(6, Stroke::Freestyle, 800),
    style(7, Stroke::Freestyle, 1500),
    style(8, Stroke::Breaststroke, 25),
    style(9, Stroke::Breaststroke, 50),
    style(10, Stroke::Breaststroke, 100),
    style(11, Stroke::Breaststroke, 200),
    style(12, Stroke::Backstroke, 25),
    style(13, Stroke::Backstroke, 50),
    style(14, Stroke::Backstroke, 100),
    style(15, Stroke::Backstroke, 200),
    style(16, Stroke::Butterfly, 25),
    style(17, Stroke::Butterfly, 50),
    style(18, Stroke::Butterfly, 100),
    style(19, Stroke::Butterfly, 200),
    style(20, Stroke::IndividualMedley, 100),
    style(21, Stroke::IndividualMedley, 200),
    style(22, Stroke::IndividualMedley, 400),
];
