use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Numeric range and default countdown for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyConfig {
    pub max_range: u32,
    pub default_timer_secs: u32,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

const EASY: DifficultyConfig = DifficultyConfig {
    max_range: 5,
    default_timer_secs: 20,
};
const MEDIUM: DifficultyConfig = DifficultyConfig {
    max_range: 10,
    default_timer_secs: 15,
};
const HARD: DifficultyConfig = DifficultyConfig {
    max_range: 12,
    default_timer_secs: 10,
};

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn config(self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => EASY,
            Difficulty::Medium => MEDIUM,
            Difficulty::Hard => HARD,
        }
    }

    pub fn max_range(self) -> u32 {
        self.config().max_range
    }

    /// Number of cells in the grid, i.e. the completion target
    pub fn total_cells(self) -> usize {
        let n = self.max_range() as usize;
        n * n
    }

    /// Short label shown in the header, e.g. `1-10`
    pub fn range_label(self) -> String {
        format!("1-{}", self.max_range())
    }

    /// easy -> medium -> hard -> easy
    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}
