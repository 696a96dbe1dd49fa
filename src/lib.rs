//! Score recognition engine.
//!
//! Converts a recognized music-notation document (plain MusicXML or a
//! compressed `.mxl` container) into a performance timeline: a melody note
//! sequence with articulation-aware gate timings, plus per-hand playback
//! events ready for a sequencer.

pub mod engine;
pub mod models;

// Re-export the public surface
pub use engine::loader::ScoreFormat;
pub use engine::{recognize_score_path, recognize_score_str, Result, ScoreError};
pub use models::{
    Articulation, Hand, PlaybackEvent, RecognitionResult, RecognizeSettings, RecognizedNote,
    ResultMeta,
};
