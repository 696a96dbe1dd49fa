//! Tie merging.
//!
//! Collapses chains of tied notes of the same pitch into one sustained
//! note. Active chains live in a map keyed by MIDI number; flushing the map
//! at end of data treats an unterminated tie as sounding through to the
//! end of the score.

use std::collections::BTreeMap;

use super::articulation::round4;
use super::render::RenderNote;

pub(crate) fn merge_ties(notes: Vec<RenderNote>) -> Vec<RenderNote> {
    let mut merged: Vec<RenderNote> = Vec::new();
    let mut active: BTreeMap<i32, RenderNote> = BTreeMap::new();

    for note in notes {
        if note.tie_stop {
            if let Some(mut base) = active.remove(&note.midi) {
                base.duration_beat = round4(base.duration_beat + note.duration_beat);
                base.in_slur |= note.in_slur;
                base.staccato |= note.staccato;
                if note.tie_start {
                    // Tie-through: the chain continues under the same pitch
                    active.insert(note.midi, base);
                } else {
                    merged.push(base);
                }
                continue;
            }
        }

        if note.tie_start {
            let midi = note.midi;
            active.insert(
                midi,
                RenderNote {
                    tie_start: false,
                    tie_stop: false,
                    is_tie: true,
                    ..note
                },
            );
            continue;
        }

        merged.push(note);
    }

    // Unterminated ties sound through to end of data
    merged.extend(active.into_values());
    merged.sort_by(|a, b| {
        a.start_beat
            .total_cmp(&b.start_beat)
            .then_with(|| a.source_measure.cmp(&b.source_measure))
            .then_with(|| a.midi.cmp(&b.midi))
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(midi: i32, start: f64, duration: f64) -> RenderNote {
        RenderNote {
            pitch: format!("M{}", midi),
            midi,
            start_beat: start,
            duration_beat: duration,
            source_measure: 1,
            staff: "1".to_string(),
            voice: "1".to_string(),
            tie_start: false,
            tie_stop: false,
            is_tie: false,
            in_slur: false,
            staccato: false,
        }
    }

    fn tied(midi: i32, start: f64, duration: f64, tie_start: bool, tie_stop: bool) -> RenderNote {
        RenderNote {
            tie_start,
            tie_stop,
            is_tie: tie_start || tie_stop,
            ..note(midi, start, duration)
        }
    }

    #[test]
    fn test_chain_of_three_merges_into_one() {
        let merged = merge_ties(vec![
            tied(67, 0.0, 1.0, true, false),
            tied(67, 1.0, 1.0, true, true),
            tied(67, 2.0, 1.0, false, true),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start_beat, 0.0);
        assert_eq!(merged[0].duration_beat, 3.0);
        assert!(merged[0].is_tie);
    }

    #[test]
    fn test_plain_notes_pass_through_unchanged() {
        let input = vec![note(60, 0.0, 1.0), note(62, 1.0, 1.0)];
        let merged = merge_ties(input.clone());
        assert_eq!(merged, input);
    }

    #[test]
    fn test_unterminated_tie_flushes_at_end() {
        let merged = merge_ties(vec![note(60, 0.0, 1.0), tied(64, 1.0, 2.0, true, false)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].midi, 64);
        assert_eq!(merged[1].duration_beat, 2.0);
        assert!(merged[1].is_tie);
    }

    #[test]
    fn test_flush_restores_temporal_order() {
        // The open tie starts before the plain note but flushes after it
        let merged = merge_ties(vec![tied(64, 0.0, 2.0, true, false), note(60, 2.0, 1.0)]);
        assert_eq!(merged[0].midi, 64);
        assert_eq!(merged[0].start_beat, 0.0);
        assert_eq!(merged[1].midi, 60);
    }

    #[test]
    fn test_concurrent_ties_on_distinct_pitches() {
        let merged = merge_ties(vec![
            tied(60, 0.0, 1.0, true, false),
            tied(64, 0.0, 1.0, true, false),
            tied(60, 1.0, 1.0, false, true),
            tied(64, 1.0, 1.0, false, true),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].midi, 60);
        assert_eq!(merged[0].duration_beat, 2.0);
        assert_eq!(merged[1].midi, 64);
        assert_eq!(merged[1].duration_beat, 2.0);
    }

    #[test]
    fn test_merge_ors_slur_and_staccato_flags() {
        let first = tied(60, 0.0, 1.0, true, false);
        let mut second = tied(60, 1.0, 1.0, false, true);
        second.in_slur = true;
        second.staccato = true;

        let merged = merge_ties(vec![first, second]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].in_slur);
        assert!(merged[0].staccato);
    }

    #[test]
    fn test_stop_without_matching_start_passes_through() {
        let merged = merge_ties(vec![tied(60, 0.0, 1.0, false, true)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].duration_beat, 1.0);
        assert!(merged[0].is_tie);
    }

    #[test]
    fn test_extension_rounds_to_four_decimals() {
        let merged = merge_ties(vec![
            tied(60, 0.0, 0.33333, true, false),
            tied(60, 0.33333, 0.33333, false, true),
        ]);
        assert_eq!(merged[0].duration_beat, 0.6667);
    }
}
