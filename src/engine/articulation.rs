//! Articulation and gate timing.
//!
//! Labels each note and derives the gate (audible note-off) duration: tied
//! notes sound in full, staccato halves the value, slurred notes are
//! near-legato, plain notes get a light detach. A phrase boundary shaves a
//! further 15% off so the gap before the next phrase is audible.

use crate::models::{Articulation, RecognizedNote};

use super::render::RenderNote;

/// Gap beyond which two notes no longer read as one phrase, in beats.
const PHRASE_GAP_EPSILON: f64 = 1e-4;

const GATE_STACCATO: f64 = 0.50;
const GATE_SLUR: f64 = 0.98;
const GATE_NORMAL: f64 = 0.92;
const PHRASE_END_FACTOR: f64 = 0.85;
/// Gates never drop below this, so every note stays audible.
const MIN_GATE_BEAT: f64 = 0.01;

/// Round a beat value to 4 decimal places.
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub(crate) fn to_recognized_notes(notes: &[RenderNote]) -> Vec<RecognizedNote> {
    notes
        .iter()
        .enumerate()
        .map(|(index, note)| {
            let phrase_break_after = match notes.get(index + 1) {
                None => true,
                Some(next) => {
                    next.start_beat - (note.start_beat + note.duration_beat) > PHRASE_GAP_EPSILON
                }
            };

            let (articulation, mut gate) = if note.is_tie {
                (Articulation::Tie, note.duration_beat)
            } else if note.staccato {
                (Articulation::Staccato, note.duration_beat * GATE_STACCATO)
            } else if note.in_slur {
                (Articulation::Slur, note.duration_beat * GATE_SLUR)
            } else {
                (Articulation::Normal, note.duration_beat * GATE_NORMAL)
            };

            if phrase_break_after && articulation != Articulation::Tie {
                gate *= PHRASE_END_FACTOR;
            }

            RecognizedNote {
                pitch: note.pitch.clone(),
                midi: note.midi,
                start_beat: round4(note.start_beat),
                duration_beat: round4(note.duration_beat),
                gate_beat: round4(gate.max(MIN_GATE_BEAT)),
                phrase_break_after,
                articulation,
                source_measure: note.source_measure,
            }
        })
        .collect()
}
