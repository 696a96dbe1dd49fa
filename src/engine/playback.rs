//! Playback event grouping.
//!
//! Regroups a hand's recognized notes into chord-shaped events: notes
//! sharing an onset and source measure become one event whose duration and
//! gate are the maxima across members, with pitches listed in ascending
//! MIDI order. The merged two-hand stream sorts right before left at equal
//! onsets so consumers see a stable order.

use crate::models::{Hand, PlaybackEvent, RecognizedNote};

use super::articulation::round4;

/// Group one hand's notes (already in temporal order) into chord events.
pub(crate) fn group_events(
    notes: &[RecognizedNote],
    hand: Hand,
    staff: &str,
    voice: &str,
) -> Vec<PlaybackEvent> {
    let mut events: Vec<PlaybackEvent> = Vec::new();
    let mut index = 0;

    while index < notes.len() {
        let start_beat = notes[index].start_beat;
        let source_measure = notes[index].source_measure;
        let mut members: Vec<&RecognizedNote> = Vec::new();
        while index < notes.len()
            && notes[index].start_beat == start_beat
            && notes[index].source_measure == source_measure
        {
            members.push(&notes[index]);
            index += 1;
        }
        members.sort_by_key(|member| member.midi);

        let duration_beat = members
            .iter()
            .map(|member| member.duration_beat)
            .fold(0.0_f64, f64::max);
        let gate_beat = members
            .iter()
            .map(|member| member.gate_beat)
            .fold(0.0_f64, f64::max);

        events.push(PlaybackEvent {
            start_beat: round4(start_beat),
            duration_beat: round4(duration_beat),
            gate_beat: round4(gate_beat),
            pitches: members.iter().map(|member| member.pitch.clone()).collect(),
            midis: members.iter().map(|member| member.midi).collect(),
            hand,
            staff: staff.to_string(),
            voice: voice.to_string(),
            source_measure,
        });
    }

    events
}

/// Deterministic merge order across both hands.
pub(crate) fn sort_events(events: &mut [PlaybackEvent]) {
    events.sort_by(|a, b| {
        a.start_beat
            .total_cmp(&b.start_beat)
            .then_with(|| hand_rank(a.hand).cmp(&hand_rank(b.hand)))
            .then_with(|| a.source_measure.cmp(&b.source_measure))
            .then_with(|| first_midi(a).cmp(&first_midi(b)))
    });
}

fn hand_rank(hand: Hand) -> u8 {
    match hand {
        Hand::Right => 0,
        Hand::Left => 1,
    }
}

fn first_midi(event: &PlaybackEvent) -> i32 {
    event.midis.first().copied().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Articulation;

    fn note(midi: i32, start: f64, duration: f64, gate: f64) -> RecognizedNote {
        RecognizedNote {
            pitch: format!("M{}", midi),
            midi,
            start_beat: start,
            duration_beat: duration,
            gate_beat: gate,
            phrase_break_after: false,
            articulation: Articulation::Normal,
            source_measure: 1,
        }
    }

    #[test]
    fn test_chord_members_group_into_one_event() {
        let notes = vec![
            note(67, 0.0, 1.0, 0.92),
            note(60, 0.0, 2.0, 1.84),
            note(64, 1.0, 1.0, 0.92),
        ];
        // Temporal order as the tie merger leaves it
        let mut ordered = notes.clone();
        ordered.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat).then(a.midi.cmp(&b.midi)));

        let events = group_events(&ordered, Hand::Right, "1", "1");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].midis, vec![60, 67]);
        assert_eq!(events[0].pitches, vec!["M60".to_string(), "M67".to_string()]);
        assert_eq!(events[0].duration_beat, 2.0);
        assert_eq!(events[0].gate_beat, 1.84);
        assert_eq!(events[1].midis, vec![64]);
    }

    #[test]
    fn test_same_onset_different_measures_stay_separate() {
        let mut first = note(60, 0.0, 1.0, 0.92);
        first.source_measure = 1;
        let mut second = note(64, 0.0, 1.0, 0.92);
        second.source_measure = 2;

        let events = group_events(&[first, second], Hand::Right, "1", "1");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_sort_puts_right_before_left_at_equal_onset() {
        let mut events = vec![
            PlaybackEvent {
                start_beat: 0.0,
                duration_beat: 1.0,
                gate_beat: 0.92,
                pitches: vec!["C3".to_string()],
                midis: vec![48],
                hand: Hand::Left,
                staff: "2".to_string(),
                voice: "1".to_string(),
                source_measure: 1,
            },
            PlaybackEvent {
                start_beat: 0.0,
                duration_beat: 1.0,
                gate_beat: 0.92,
                pitches: vec!["G4".to_string()],
                midis: vec![67],
                hand: Hand::Right,
                staff: "1".to_string(),
                voice: "1".to_string(),
                source_measure: 1,
            },
        ];
        sort_events(&mut events);
        assert_eq!(events[0].hand, Hand::Right);
        assert_eq!(events[1].hand, Hand::Left);
    }

    #[test]
    fn test_empty_pitch_list_sorts_first_via_sentinel() {
        let mut events = vec![
            PlaybackEvent {
                start_beat: 0.0,
                duration_beat: 1.0,
                gate_beat: 0.92,
                pitches: vec!["C4".to_string()],
                midis: vec![60],
                hand: Hand::Right,
                staff: "1".to_string(),
                voice: "1".to_string(),
                source_measure: 1,
            },
            PlaybackEvent {
                start_beat: 0.0,
                duration_beat: 1.0,
                gate_beat: 0.92,
                pitches: Vec::new(),
                midis: Vec::new(),
                hand: Hand::Right,
                staff: "1".to_string(),
                voice: "1".to_string(),
                source_measure: 1,
            },
        ];
        sort_events(&mut events);
        assert!(events[0].midis.is_empty());
    }
}
