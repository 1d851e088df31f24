use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::settings::{DifficultyLevel, TracingSettings};
use crate::chars::{self, ALL_CHARS};
use crate::session::StrokeStore;
use crate::stroke::StrokeRef;

/// Stored as the current character once the whole sequence has been traced.
pub const COMPLETED_MARKER: &str = "COMPLETED";

/// Where the learner is for one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LetterProgress {
    pub completed: bool,
    pub strokes: Vec<StrokeRef>,
    pub current_round: u32,
    pub completed_rounds: u32,
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// A character, or [`COMPLETED_MARKER`].
    pub current_char: String,
    #[serde(default)]
    pub progress: BTreeMap<String, LetterProgress>,
    #[serde(default)]
    pub settings: TracingSettings,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            current_char: ALL_CHARS[0].to_string(),
            progress: BTreeMap::new(),
            settings: TracingSettings::default(),
        }
    }
}

/// Result of passing a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    /// The last configured round passed; the letter is done.
    LetterCompleted,
    /// Another round follows; strokes were cleared for it.
    RoundAdvanced { round: u32 },
}

/// In-memory progress store with the actions the tracing flow needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressStore {
    state: PersistedState,
}

impl ProgressStore {
    pub fn new(state: PersistedState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn into_state(self) -> PersistedState {
        self.state
    }

    pub fn settings(&self) -> &TracingSettings {
        &self.state.settings
    }

    /// The character being traced, or `None` once everything is completed.
    pub fn current_char(&self) -> Option<char> {
        if self.is_finished() {
            return None;
        }
        self.state.current_char.chars().next()
    }

    pub fn is_finished(&self) -> bool {
        self.state.current_char == COMPLETED_MARKER
    }

    pub fn set_current_char(&mut self, ch: char) {
        self.state.current_char = ch.to_string();
    }

    /// Progress for `ch`; untouched characters read as a fresh default.
    pub fn letter_progress(&self, ch: char) -> LetterProgress {
        self.state
            .progress
            .get(&ch.to_string())
            .cloned()
            .unwrap_or_default()
    }

    pub fn current_progress(&self) -> LetterProgress {
        self.current_char()
            .map(|ch| self.letter_progress(ch))
            .unwrap_or_default()
    }

    fn current_entry(&mut self) -> Option<&mut LetterProgress> {
        let ch = self.current_char()?;
        Some(self.state.progress.entry(ch.to_string()).or_default())
    }

    pub fn add_stroke(&mut self, stroke: StrokeRef) {
        if let Some(entry) = self.current_entry() {
            entry.strokes.push(stroke);
        }
    }

    /// Drops the current character's strokes and its completed flag.
    pub fn clear_current_strokes(&mut self) {
        let Some(ch) = self.current_char() else {
            return;
        };
        if let Some(entry) = self.state.progress.get_mut(&ch.to_string()) {
            entry.strokes.clear();
            entry.completed = false;
        }
    }

    /// Marks the current character done regardless of rounds.
    pub fn mark_letter_completed(&mut self) {
        let rounds = self.state.settings.difficulty_config().rounds;
        if let Some(entry) = self.current_entry() {
            entry.completed = true;
            entry.completed_rounds = rounds;
        }
    }

    /// Records a passed round for the current character.
    ///
    /// Before the last round the strokes are cleared for a fresh attempt;
    /// on the last one the letter is completed and its strokes kept.
    pub fn complete_round(&mut self) -> RoundResult {
        let rounds = self.state.settings.difficulty_config().rounds;
        let ch = self.current_char();
        let Some(entry) = self.current_entry() else {
            return RoundResult::LetterCompleted;
        };
        let done = entry.completed_rounds + 1;
        entry.completed_rounds = done;
        if done >= rounds {
            entry.completed = true;
            info!("Completed {ch:?} after {done} round(s)");
            RoundResult::LetterCompleted
        } else {
            entry.strokes.clear();
            entry.current_round = done;
            info!("Completed round {done} of {rounds} for {ch:?}");
            RoundResult::RoundAdvanced { round: done }
        }
    }

    /// Moves to the next character; past the last one the sequence is finished.
    pub fn advance_to_next(&mut self) {
        let Some(ch) = self.current_char() else {
            return;
        };
        match chars::next_char(ch) {
            Some(next) => self.set_current_char(next),
            None => self.state.current_char = COMPLETED_MARKER.to_owned(),
        }
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut TracingSettings)) {
        update(&mut self.state.settings);
    }

    /// Switches level, completing letters that already have enough rounds
    /// and applying the level's stroke size.
    pub fn set_difficulty(&mut self, level: DifficultyLevel) {
        let config = level.config();
        for progress in self.state.progress.values_mut() {
            if !progress.completed && progress.completed_rounds >= config.rounds {
                progress.completed = true;
            }
        }
        self.state.settings.difficulty = level;
        self.state.settings.stroke_size = config.default_stroke_size;
    }

    /// Starts over from the first character; settings are kept.
    pub fn reset_progress(&mut self) {
        self.state.current_char = ALL_CHARS[0].to_string();
        self.state.progress.clear();
    }

    pub fn is_all_completed(&self) -> bool {
        ALL_CHARS.iter().all(|ch| {
            self.state
                .progress
                .get(&ch.to_string())
                .is_some_and(|p| p.completed)
        })
    }
}

impl StrokeStore for ProgressStore {
    fn strokes(&self) -> Vec<StrokeRef> {
        self.current_progress().strokes
    }

    fn add_stroke(&mut self, stroke: StrokeRef) {
        ProgressStore::add_stroke(self, stroke);
    }

    fn clear_strokes(&mut self) {
        self.clear_current_strokes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{PressureMode, Stroke, StrokePoint, StrokeStyle};
    use egui::Color32;

    fn stroke() -> StrokeRef {
        Stroke::new_ref(
            vec![StrokePoint::new(0.0, 0.0, 0.5), StrokePoint::new(5.0, 5.0, 0.5)],
            StrokeStyle::new(Color32::BLUE, 20.0),
            PressureMode::Simulated,
        )
    }

    #[test]
    fn strokes_accumulate_for_the_current_character() {
        let mut store = ProgressStore::default();
        store.add_stroke(stroke());
        store.add_stroke(stroke());
        assert_eq!(store.letter_progress('A').strokes.len(), 2);
        assert!(store.letter_progress('B').strokes.is_empty());
    }

    #[test]
    fn clear_resets_completed() {
        let mut store = ProgressStore::default();
        store.add_stroke(stroke());
        store.mark_letter_completed();
        assert!(store.letter_progress('A').completed);

        store.clear_current_strokes();
        let progress = store.letter_progress('A');
        assert!(progress.strokes.is_empty());
        assert!(!progress.completed);
    }

    #[test]
    fn rounds_clear_strokes_until_the_last() {
        let mut store = ProgressStore::default();
        store.set_difficulty(DifficultyLevel::Intermediate);
        store.add_stroke(stroke());

        assert_eq!(store.complete_round(), RoundResult::RoundAdvanced { round: 1 });
        let progress = store.letter_progress('A');
        assert!(progress.strokes.is_empty());
        assert_eq!(progress.current_round, 1);
        assert!(!progress.completed);

        store.add_stroke(stroke());
        assert_eq!(store.complete_round(), RoundResult::LetterCompleted);
        let progress = store.letter_progress('A');
        assert!(progress.completed);
        assert_eq!(progress.completed_rounds, 2);
        assert_eq!(progress.strokes.len(), 1);
    }

    #[test]
    fn easier_level_retro_completes_letters() {
        let mut store = ProgressStore::default();
        store.set_difficulty(DifficultyLevel::Advanced);
        assert_eq!(store.settings().stroke_size, 16.0);
        store.complete_round();
        assert!(!store.letter_progress('A').completed);

        store.set_difficulty(DifficultyLevel::Beginner);
        assert!(store.letter_progress('A').completed);
        assert_eq!(store.settings().stroke_size, 24.0);
    }

    #[test]
    fn advancing_past_the_end_finishes() {
        let mut store = ProgressStore::default();
        store.set_current_char('8');
        store.advance_to_next();
        assert_eq!(store.current_char(), Some('9'));
        store.advance_to_next();
        assert!(store.is_finished());
        assert_eq!(store.current_char(), None);

        // nothing to trace, nothing to store
        store.add_stroke(stroke());
        assert!(store.state().progress.is_empty());

        store.reset_progress();
        assert_eq!(store.current_char(), Some('A'));
    }

    #[test]
    fn all_completed_requires_every_character() {
        let mut store = ProgressStore::default();
        for &ch in &ALL_CHARS[..ALL_CHARS.len() - 1] {
            store.set_current_char(ch);
            store.mark_letter_completed();
        }
        assert!(!store.is_all_completed());
        store.set_current_char('9');
        store.mark_letter_completed();
        assert!(store.is_all_completed());
    }
}
