use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use super::progress::{LetterProgress, PersistedState};
use super::settings::{DifficultyLevel, TracingSettings};
use crate::stroke::StrokeRef;

/// Storage key the progress is saved under.
pub const STORAGE_KEY: &str = "hermes-tracing";

/// Schema version written by this build.
pub const STATE_VERSION: u32 = 2;

/// Errors that can occur while saving or restoring progress
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to (de)serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported state version {0}")]
    UnsupportedVersion(u32),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// The saved document: the state plus the schema version it was written with.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Version 1 predates rounds and difficulty levels.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1State {
    current_char: String,
    #[serde(default)]
    progress: BTreeMap<String, V1LetterProgress>,
    #[serde(default)]
    settings: V1Settings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V1LetterProgress {
    completed: bool,
    strokes: Vec<StrokeRef>,
}

// v1 settings are the v2 ones minus `difficulty`; serde defaults fill the gaps
type V1Settings = TracingSettings;

impl From<V1State> for PersistedState {
    fn from(v1: V1State) -> Self {
        let progress = v1
            .progress
            .into_iter()
            .map(|(ch, lp)| {
                let completed_rounds = u32::from(lp.completed);
                (
                    ch,
                    LetterProgress {
                        completed: lp.completed,
                        strokes: lp.strokes,
                        current_round: 0,
                        completed_rounds,
                    },
                )
            })
            .collect();

        PersistedState {
            current_char: v1.current_char,
            progress,
            settings: TracingSettings {
                difficulty: DifficultyLevel::Beginner,
                ..v1.settings
            },
        }
    }
}

/// Brings a raw saved state of `from_version` up to the current schema.
///
/// Settings missing from the saved data take their defaults.
pub fn migrate(raw: Value, from_version: u32) -> PersistenceResult<PersistedState> {
    match from_version {
        1 => {
            let v1: V1State = serde_json::from_value(raw)?;
            Ok(v1.into())
        }
        STATE_VERSION => Ok(serde_json::from_value(raw)?),
        other => Err(PersistenceError::UnsupportedVersion(other)),
    }
}

pub fn save_json(state: &PersistedState) -> PersistenceResult<String> {
    let envelope = Envelope {
        state,
        version: STATE_VERSION,
    };
    Ok(serde_json::to_string(&envelope)?)
}

pub fn load_json(json: &str) -> PersistenceResult<PersistedState> {
    let envelope: Envelope<Value> = serde_json::from_str(json)?;
    migrate(envelope.state, envelope.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ProgressStore;
    use crate::stroke::{PressureMode, Stroke, StrokePoint, StrokeStyle};
    use egui::Color32;
    use serde_json::json;

    #[test]
    fn v1_state_gains_rounds_and_difficulty() {
        let raw = json!({
            "currentChar": "C",
            "progress": {
                "A": { "completed": true, "strokes": [] },
                "B": {
                    "completed": false,
                    "strokes": [{
                        "points": [[1, 2, 0.5], [3, 4, 0.5]],
                        "color": "#ef4444",
                        "size": 18,
                        "thinning": 0.7,
                        "simulatePressure": true
                    }]
                }
            },
            "settings": {
                "fontFamily": "Kalam",
                "fontSize": 280,
                "fontWeight": 700,
                "strokeColor": "#ef4444",
                "strokeSize": 18,
                "coverageThreshold": 0.8,
                "locale": "en"
            }
        });

        let state = migrate(raw, 1).unwrap();
        assert_eq!(state.current_char, "C");
        assert_eq!(state.progress["A"].completed_rounds, 1);
        assert_eq!(state.progress["B"].completed_rounds, 0);
        assert_eq!(state.progress["B"].current_round, 0);
        assert_eq!(state.progress["B"].strokes[0].size(), 18.0);
        assert_eq!(state.settings.difficulty, DifficultyLevel::Beginner);
        assert_eq!(state.settings.font_family, "Kalam");
        assert_eq!(state.settings.coverage_threshold, 0.8);
        assert_eq!(state.settings.locale, "en");
    }

    #[test]
    fn partial_settings_merge_with_defaults() {
        let state = migrate(json!({ "currentChar": "a", "settings": { "strokeSize": 30 } }), 2).unwrap();
        assert_eq!(state.settings.stroke_size, 30.0);
        assert_eq!(state.settings.font_family, "Caveat");
        assert!(state.progress.is_empty());
    }

    #[test]
    fn unknown_versions_are_rejected() {
        let err = migrate(json!({}), 7).unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedVersion(7)));
    }

    #[test]
    fn saved_state_loads_back() {
        let mut store = ProgressStore::default();
        store.add_stroke(Stroke::new_ref(
            vec![StrokePoint::new(10.0, 20.0, 0.5), StrokePoint::new(30.0, 40.0, 0.75)],
            StrokeStyle::new(Color32::from_rgb(0x3b, 0x82, 0xf6), 20.0),
            PressureMode::Real,
        ));
        store.complete_round();

        let json = save_json(store.state()).unwrap();
        assert!(json.contains("\"version\":2"));
        assert_eq!(&load_json(&json).unwrap(), store.state());
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(load_json("not json"), Err(PersistenceError::Serialization(_))));
    }
}
