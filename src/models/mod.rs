//! Public data model for recognition results.
//!
//! These types are the output contract of the engine: a `RecognitionResult`
//! carrying the melody note sequence, per-hand playback events and
//! pass-through metadata. Field names serialize in camelCase to match the
//! consumer-facing JSON shape.

use serde::{Deserialize, Serialize};

/// Articulation label attached to a recognized note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    Normal,
    Slur,
    Staccato,
    Tie,
}

/// Which hand a playback event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Right,
    Left,
}

/// One melody-facing note with performance timing attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedNote {
    /// Spelled pitch name, e.g. "G4" or "F#3"
    pub pitch: String,
    /// MIDI note number (0-127 expected, not enforced)
    pub midi: i32,
    /// Onset in beats from the start of the piece
    pub start_beat: f64,
    /// Notated length in beats
    pub duration_beat: f64,
    /// How long the note audibly sounds before note-off, in beats
    pub gate_beat: f64,
    /// True when a phrase boundary follows this note
    pub phrase_break_after: bool,
    pub articulation: Articulation,
    /// Measure the note was read from (1-based)
    pub source_measure: u32,
}

/// A chord-shaped sequencer event for one hand.
///
/// `pitches` and `midis` are the same length and co-sorted ascending by
/// MIDI number; duration and gate are the maxima across chord members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    pub start_beat: f64,
    pub duration_beat: f64,
    pub gate_beat: f64,
    pub pitches: Vec<String>,
    pub midis: Vec<i32>,
    pub hand: Hand,
    pub staff: String,
    pub voice: String,
    pub source_measure: u32,
}

/// Metadata echoed back with every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMeta {
    pub engine: String,
    pub input_type: String,
    /// Informational conditions collected while analyzing, in pipeline order
    pub warnings: Vec<String>,
}

/// Complete result of analyzing one score document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    /// Tempo in beats per minute
    pub tempo: i32,
    /// Time signature as "N/M", e.g. "4/4"
    pub time_signature: String,
    /// Melody (right hand lead voice) notes in temporal order
    pub notes: Vec<RecognizedNote>,
    /// Both hands' playback events in a deterministic merged order
    pub playback_events: Vec<PlaybackEvent>,
    pub meta: ResultMeta,
}

/// Configuration options for a recognition run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizeSettings {
    /// Engine tag recorded in the result metadata
    pub engine: String,
    /// Opaque source tag ("png", "pdf", ...) passed through verbatim
    pub input_type: String,
}

impl Default for RecognizeSettings {
    fn default() -> Self {
        RecognizeSettings {
            engine: "audiveris".to_string(),
            input_type: "png".to_string(),
        }
    }
}
