//! Timeline reconstruction for one score part.
//!
//! Walks measures in document order with a per-part beat cursor, converting
//! raw durations (in divisions per quarter note) into beat positions. Chord
//! members reuse the start beat of the most recent non-chord note in the
//! same (staff, voice); `backup`/`forward` move a measure-local cursor, and
//! the part cursor only ever advances to the measure's maximum reached
//! position so short voices cannot leak gaps into the next measure.

use std::collections::BTreeMap;

use roxmltree::Node;

/// Key identifying one written voice on one staff. Both tokens are
/// free-form strings taken from the document, not necessarily numeric.
pub(crate) type VoiceKey = (String, String);

/// One sounding or resting event on the raw timeline.
#[derive(Debug, Clone)]
pub(crate) struct TimelineNote {
    pub start_beat: f64,
    pub duration_beat: f64,
    pub source_measure: u32,
    pub staff: String,
    pub voice: String,
    pub is_rest: bool,
    pub is_chord: bool,
    pub pitch: Option<String>,
    pub midi: Option<i32>,
    pub tie_start: bool,
    pub tie_stop: bool,
    pub slur_starts: u32,
    pub slur_stops: u32,
    pub staccato: bool,
}

/// Running per-voice aggregate consumed by hand selection.
#[derive(Debug, Clone, Default)]
pub(crate) struct VoiceStats {
    pub count: u32,
    pub pitch_sum: i64,
}

impl VoiceStats {
    pub fn avg_pitch(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.pitch_sum as f64 / self.count as f64
        }
    }
}

/// Everything the timeline walk produces for one part.
#[derive(Debug)]
pub(crate) struct PartTimeline {
    pub notes: Vec<TimelineNote>,
    pub voice_stats: BTreeMap<VoiceKey, VoiceStats>,
    /// First tempo marking found, if any.
    pub tempo: Option<i32>,
    /// Last declared time signature, "4/4" when never set.
    pub time_signature: String,
}

/// MIDI note number for a spelled pitch. MIDI 0 = C-1, so C4 = 60.
pub(crate) fn pitch_to_midi(step: &str, alter: i32, octave: i32) -> i32 {
    (octave + 1) * 12 + step_semitone(step) + alter
}

/// Semitone offsets of the 7-letter scale: C D E F G A B.
fn step_semitone(step: &str) -> i32 {
    match step {
        "C" => 0,
        "D" => 2,
        "E" => 4,
        "F" => 5,
        "G" => 7,
        "A" => 9,
        "B" => 11,
        _ => 0,
    }
}

/// Spelled pitch name: step + accidental + octave. Only single sharps and
/// flats render a glyph; other alterations still shift the MIDI number.
fn pitch_name(step: &str, alter: i32, octave: i32) -> String {
    let accidental = match alter {
        1 => "#",
        -1 => "b",
        _ => "",
    };
    format!("{}{}{}", step, accidental, octave)
}

pub(crate) fn build_timeline(part: &Node) -> PartTimeline {
    let mut notes: Vec<TimelineNote> = Vec::new();
    let mut voice_stats: BTreeMap<VoiceKey, VoiceStats> = BTreeMap::new();
    let mut tempo: Option<i32> = None;
    let mut time_signature = String::from("4/4");

    let mut cursor_beat = 0.0_f64;
    let mut divisions = 1_i64;
    let mut chord_anchor: BTreeMap<VoiceKey, f64> = BTreeMap::new();

    let measures = part
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("measure"));
    for (index, measure) in measures.enumerate() {
        let source_measure = measure
            .attribute("number")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(index as u32 + 1);

        let mut measure_cursor = cursor_beat;
        let mut measure_max = cursor_beat;

        for child in measure.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "attributes" => {
                    read_attributes(&child, &mut divisions, &mut time_signature);
                }
                "direction" if tempo.is_none() => {
                    tempo = read_tempo(&child);
                }
                "backup" => {
                    // May drive the cursor negative on malformed input;
                    // preserved as-is.
                    measure_cursor -= element_duration_beats(&child, divisions);
                }
                "forward" => {
                    measure_cursor += element_duration_beats(&child, divisions);
                    measure_max = measure_max.max(measure_cursor);
                }
                "note" => match read_note(
                    &child,
                    measure_cursor,
                    divisions,
                    source_measure,
                    &mut chord_anchor,
                ) {
                    ParsedNote::Kept(note, next_cursor) => {
                        measure_cursor = next_cursor;
                        measure_max = measure_max
                            .max(note.start_beat + note.duration_beat)
                            .max(measure_cursor);
                        if !note.is_rest {
                            if let Some(midi) = note.midi {
                                let stats = voice_stats
                                    .entry((note.staff.clone(), note.voice.clone()))
                                    .or_default();
                                stats.count += 1;
                                stats.pitch_sum += i64::from(midi);
                            }
                        }
                        notes.push(note);
                    }
                    ParsedNote::Dropped(next_cursor) => {
                        measure_cursor = next_cursor;
                        measure_max = measure_max.max(measure_cursor);
                    }
                },
                _ => {}
            }
        }

        cursor_beat = cursor_beat.max(measure_max);
    }

    PartTimeline {
        notes,
        voice_stats,
        tempo,
        time_signature,
    }
}

enum ParsedNote {
    /// A usable timeline record plus the cursor position after it.
    Kept(TimelineNote, f64),
    /// Grace note, non-positive duration or unresolvable pitch; only the
    /// cursor position survives.
    Dropped(f64),
}

fn read_note(
    note: &Node,
    cursor_beat: f64,
    divisions: i64,
    source_measure: u32,
    chord_anchor: &mut BTreeMap<VoiceKey, f64>,
) -> ParsedNote {
    if note.children().any(|n| n.has_tag_name("grace")) {
        return ParsedNote::Dropped(cursor_beat);
    }

    let duration = child_text(note, "duration")
        .and_then(parse_number)
        .unwrap_or(0.0);
    let duration_beat = duration / divisions as f64;
    if duration_beat <= 0.0 {
        return ParsedNote::Dropped(cursor_beat);
    }

    let staff = token_or_default(child_text(note, "staff"));
    let voice = token_or_default(child_text(note, "voice"));
    let key = (staff.clone(), voice.clone());
    let is_chord = note.children().any(|n| n.has_tag_name("chord"));
    let is_rest = note.children().any(|n| n.has_tag_name("rest"));

    let (start_beat, next_cursor) = if is_chord {
        // Chord members share the onset of the chord lead; the cursor
        // does not move.
        (*chord_anchor.get(&key).unwrap_or(&cursor_beat), cursor_beat)
    } else {
        chord_anchor.insert(key, cursor_beat);
        (cursor_beat, cursor_beat + duration_beat)
    };

    let mut tie_start = false;
    let mut tie_stop = false;
    for tie in note.children().filter(|n| n.has_tag_name("tie")) {
        match tie.attribute("type").unwrap_or("") {
            "start" => tie_start = true,
            "stop" => tie_stop = true,
            _ => {}
        }
    }

    let mut slur_starts = 0;
    let mut slur_stops = 0;
    let mut staccato = false;
    if let Some(notations) = note.children().find(|n| n.has_tag_name("notations")) {
        for mark in notations.children().filter(|n| n.is_element()) {
            match mark.tag_name().name() {
                "slur" => match mark.attribute("type").unwrap_or("") {
                    "start" => slur_starts += 1,
                    "stop" => slur_stops += 1,
                    _ => {}
                },
                "articulations" => {
                    if mark.children().any(|n| n.has_tag_name("staccato")) {
                        staccato = true;
                    }
                }
                _ => {}
            }
        }
    }

    let mut pitch = None;
    let mut midi = None;
    if !is_rest {
        let Some(pitch_node) = note.children().find(|n| n.has_tag_name("pitch")) else {
            return ParsedNote::Dropped(next_cursor);
        };
        let step = child_text(&pitch_node, "step")
            .filter(|s| !s.is_empty())
            .unwrap_or("C");
        let alter = child_text(&pitch_node, "alter")
            .and_then(|t| t.parse::<i32>().ok())
            .unwrap_or(0);
        let octave = child_text(&pitch_node, "octave")
            .and_then(|t| t.parse::<i32>().ok())
            .unwrap_or(4);
        midi = Some(pitch_to_midi(step, alter, octave));
        pitch = Some(pitch_name(step, alter, octave));
    }

    ParsedNote::Kept(
        TimelineNote {
            start_beat,
            duration_beat,
            source_measure,
            staff,
            voice,
            is_rest,
            is_chord,
            pitch,
            midi,
            tie_start,
            tie_stop,
            slur_starts,
            slur_stops,
            staccato,
        },
        next_cursor,
    )
}

fn read_attributes(node: &Node, divisions: &mut i64, time_signature: &mut String) {
    if let Some(text) = child_text(node, "divisions") {
        if let Ok(value) = text.parse::<u32>() {
            *divisions = i64::from(value.max(1));
        }
    }
    if let Some(time) = node.children().find(|n| n.has_tag_name("time")) {
        let beats = child_text(&time, "beats").unwrap_or("4");
        let beat_type = child_text(&time, "beat-type").unwrap_or("4");
        *time_signature = format!("{}/{}", beats, beat_type);
    }
}

/// First tempo marking in a direction block: a metronome per-minute value
/// wins over a playback sound tempo attribute.
fn read_tempo(direction: &Node) -> Option<i32> {
    if let Some(metronome) = direction
        .descendants()
        .find(|n| n.has_tag_name("metronome"))
    {
        if let Some(bpm) = child_text(&metronome, "per-minute").and_then(parse_number) {
            return Some(bpm as i32);
        }
    }
    direction
        .descendants()
        .find(|n| n.has_tag_name("sound"))
        .and_then(|n| n.attribute("tempo"))
        .and_then(parse_number)
        .map(|bpm| bpm as i32)
}

fn element_duration_beats(node: &Node, divisions: i64) -> f64 {
    let duration = child_text(node, "duration")
        .and_then(parse_number)
        .unwrap_or(0.0);
    duration / divisions as f64
}

fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

fn token_or_default(text: Option<&str>) -> String {
    match text {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "1".to_string(),
    }
}
