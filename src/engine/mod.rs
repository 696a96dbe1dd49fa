//! The notation-to-performance-timeline pipeline.
//!
//! One pass over one score document: load the root XML, rebuild the note
//! timeline per (staff, voice), pick the hand voices, merge ties, derive
//! articulation gates and regroup per-hand playback chords. Data flows
//! strictly forward; no stage revisits an earlier stage's output.

pub mod articulation;
pub mod loader;
pub mod playback;
pub mod render;
pub mod ties;
pub mod timeline;
pub mod voices;

use std::path::Path;

use roxmltree::Document;
use thiserror::Error;

use crate::models::{Hand, RecognitionResult, RecognizeSettings, ResultMeta};
use loader::ScoreFormat;
use timeline::{TimelineNote, VoiceKey};

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid score container: {0}")]
    Container(String),
    #[error("xml parse error: {0}")]
    Xml(String),
    #[error("invalid score: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ScoreError>;

/// Analyze a score file, plain MusicXML or compressed `.mxl` container
/// (inferred from the extension).
pub fn recognize_score_path(
    path: &Path,
    settings: &RecognizeSettings,
) -> Result<RecognitionResult> {
    let format = ScoreFormat::from_path(path);
    let xml = loader::read_score_source(path, format)?;
    recognize_score_str(&xml, settings)
}

/// Analyze a score document already held in memory as MusicXML text.
pub fn recognize_score_str(xml: &str, settings: &RecognizeSettings) -> Result<RecognitionResult> {
    let doc = Document::parse(xml).map_err(|e| ScoreError::Xml(e.to_string()))?;
    let root = doc.root_element();
    let part = root
        .children()
        .find(|n| n.is_element() && n.has_tag_name("part"))
        .ok_or_else(|| ScoreError::Invalid("no part element found".to_string()))?;

    let mut warnings = Vec::new();
    let part_timeline = timeline::build_timeline(&part);
    log::debug!(
        "timeline built: {} events across {} voices",
        part_timeline.notes.len(),
        part_timeline.voice_stats.len()
    );

    let hands = voices::select_hands(&part_timeline.voice_stats, &mut warnings);

    let right_subset = hand_subset(&part_timeline.notes, hands.right.as_ref());
    let left_subset = hand_subset(&part_timeline.notes, hands.left.as_ref());

    let mut chord_warning_sent = false;
    let melody_render =
        render::build_render_notes(&right_subset, false, &mut chord_warning_sent, &mut warnings);
    let right_render =
        render::build_render_notes(&right_subset, true, &mut chord_warning_sent, &mut warnings);
    let left_render =
        render::build_render_notes(&left_subset, true, &mut chord_warning_sent, &mut warnings);

    let notes = articulation::to_recognized_notes(&ties::merge_ties(melody_render));
    let right_notes = articulation::to_recognized_notes(&ties::merge_ties(right_render));
    let left_notes = articulation::to_recognized_notes(&ties::merge_ties(left_render));

    let mut playback_events = Vec::new();
    if let Some((staff, voice)) = &hands.right {
        playback_events.extend(playback::group_events(&right_notes, Hand::Right, staff, voice));
    }
    if let Some((staff, voice)) = &hands.left {
        playback_events.extend(playback::group_events(&left_notes, Hand::Left, staff, voice));
    }
    playback::sort_events(&mut playback_events);

    let tempo = match part_timeline.tempo {
        Some(bpm) => bpm,
        None => {
            let message = "Tempo not found in score; fallback to 120 BPM.";
            log::warn!("{}", message);
            warnings.push(message.to_string());
            120
        }
    };

    Ok(RecognitionResult {
        tempo,
        time_signature: part_timeline.time_signature,
        notes,
        playback_events,
        meta: ResultMeta {
            engine: settings.engine.clone(),
            input_type: settings.input_type.clone(),
            warnings,
        },
    })
}

/// Filter the timeline down to one hand's (staff, voice) and restore
/// temporal order for the scan stages.
fn hand_subset(notes: &[TimelineNote], key: Option<&VoiceKey>) -> Vec<TimelineNote> {
    let Some((staff, voice)) = key else {
        return Vec::new();
    };
    let mut subset: Vec<TimelineNote> = notes
        .iter()
        .filter(|n| n.staff == *staff && n.voice == *voice)
        .cloned()
        .collect();
    subset.sort_by(|a, b| {
        a.start_beat
            .total_cmp(&b.start_beat)
            .then_with(|| a.source_measure.cmp(&b.source_measure))
            .then_with(|| a.midi.unwrap_or(-1).cmp(&b.midi.unwrap_or(-1)))
    });
    subset
}
