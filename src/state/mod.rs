mod persistence;
mod progress;
mod settings;

pub use persistence::{
    PersistenceError, PersistenceResult, STATE_VERSION, STORAGE_KEY, load_json, migrate, save_json,
};
pub use progress::{COMPLETED_MARKER, LetterProgress, PersistedState, ProgressStore, RoundResult};
pub use settings::{DifficultyConfig, DifficultyLevel, TracingSettings};
