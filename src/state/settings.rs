use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::color;

/// Practice level; decides rounds per letter and how much help the guide gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// What a difficulty level changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyConfig {
    /// Rounds a letter has to be traced before it counts as completed.
    pub rounds: u32,
    pub guide_opacity: f32,
    pub show_ruled_lines: bool,
    pub default_stroke_size: f32,
    /// Coverage needed per round; rounds past the end use the settings threshold.
    pub round_thresholds: &'static [f32],
}

impl DifficultyConfig {
    pub fn threshold_for_round(&self, round: u32, fallback: f32) -> f32 {
        self.round_thresholds
            .get(round as usize)
            .copied()
            .unwrap_or(fallback)
    }
}

const BEGINNER: DifficultyConfig = DifficultyConfig {
    rounds: 1,
    guide_opacity: 0.15,
    show_ruled_lines: false,
    default_stroke_size: 24.0,
    round_thresholds: &[],
};

const INTERMEDIATE: DifficultyConfig = DifficultyConfig {
    rounds: 2,
    guide_opacity: 0.08,
    show_ruled_lines: false,
    default_stroke_size: 20.0,
    round_thresholds: &[],
};

// Last round traces over ruled lines only.
const ADVANCED: DifficultyConfig = DifficultyConfig {
    rounds: 3,
    guide_opacity: 0.0,
    show_ruled_lines: true,
    default_stroke_size: 16.0,
    round_thresholds: &[0.85, 0.9, 0.9],
};

impl DifficultyLevel {
    pub fn config(self) -> &'static DifficultyConfig {
        match self {
            DifficultyLevel::Beginner => &BEGINNER,
            DifficultyLevel::Intermediate => &INTERMEDIATE,
            DifficultyLevel::Advanced => &ADVANCED,
        }
    }
}

/// User-facing settings, persisted with the progress.
///
/// Missing fields take their defaults when loading, so older saves keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TracingSettings {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    #[serde(with = "color::css_hex")]
    pub stroke_color: Color32,
    pub stroke_size: f32,
    pub coverage_threshold: f32,
    pub difficulty: DifficultyLevel,
    /// UI language tag; carried for the host, never interpreted here.
    pub locale: String,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            font_family: "Caveat".to_owned(),
            font_size: 300.0,
            font_weight: 400,
            stroke_color: Color32::from_rgb(0x3b, 0x82, 0xf6),
            stroke_size: 20.0,
            coverage_threshold: 0.9,
            difficulty: DifficultyLevel::Beginner,
            locale: "pt-BR".to_owned(),
        }
    }
}

impl TracingSettings {
    pub fn difficulty_config(&self) -> &'static DifficultyConfig {
        self.difficulty.config()
    }

    /// Coverage needed to pass `round` at the current difficulty.
    pub fn threshold_for_round(&self, round: u32) -> f32 {
        self.difficulty_config()
            .threshold_for_round(round, self.coverage_threshold)
    }
}
