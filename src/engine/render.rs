//! Render-note construction.
//!
//! Narrows a hand's timeline subset to pitched, playable notes while
//! tracking slur nesting across the scan. The melody pass drops chord
//! members (warning once per run); the playback pass keeps them.

use super::timeline::TimelineNote;

/// A timeline note narrowed to one hand, annotated with merge-ready
/// tie/slur/staccato summary flags.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderNote {
    pub pitch: String,
    pub midi: i32,
    pub start_beat: f64,
    pub duration_beat: f64,
    pub source_measure: u32,
    pub staff: String,
    pub voice: String,
    pub tie_start: bool,
    pub tie_stop: bool,
    pub is_tie: bool,
    pub in_slur: bool,
    pub staccato: bool,
}

pub(crate) fn build_render_notes(
    timeline: &[TimelineNote],
    include_chords: bool,
    chord_warning_sent: &mut bool,
    warnings: &mut Vec<String>,
) -> Vec<RenderNote> {
    let mut slur_depth: u32 = 0;
    let mut render_notes = Vec::new();

    for event in timeline {
        if event.is_rest {
            // Rests carry slur boundaries but never render
            slur_depth = next_slur_depth(slur_depth, event);
            continue;
        }

        let (Some(pitch), Some(midi)) = (&event.pitch, event.midi) else {
            continue;
        };

        if event.is_chord && !include_chords {
            if !*chord_warning_sent {
                let message = "Detected chord notes; only lead note is kept in melody notes.";
                log::warn!("{}", message);
                warnings.push(message.to_string());
                *chord_warning_sent = true;
            }
            continue;
        }

        let in_slur = slur_depth > 0 || event.slur_starts > 0 || event.slur_stops > 0;
        slur_depth = next_slur_depth(slur_depth, event);

        render_notes.push(RenderNote {
            pitch: pitch.clone(),
            midi,
            start_beat: event.start_beat,
            duration_beat: event.duration_beat,
            source_measure: event.source_measure,
            staff: event.staff.clone(),
            voice: event.voice.clone(),
            tie_start: event.tie_start,
            tie_stop: event.tie_stop,
            is_tie: event.tie_start || event.tie_stop,
            in_slur,
            staccato: event.staccato,
        });
    }

    render_notes
}

fn next_slur_depth(depth: u32, event: &TimelineNote) -> u32 {
    (depth + event.slur_starts).saturating_sub(event.slur_stops)
}
