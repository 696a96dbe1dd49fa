//! Hand/voice selection.
//!
//! Ranks written voices by note density, then average pitch, then staff and
//! voice token, and picks the melody voice (staff "1") and the
//! accompaniment voice (staff "2"). A score without staff "1" falls back to
//! the best voice overall; a score without staff "2" simply leaves playback
//! right-hand only.

use std::collections::{BTreeMap, BTreeSet};

use super::timeline::{VoiceKey, VoiceStats};

/// The (staff, voice) keys chosen for each hand. `right` is `None` only
/// when the score has no pitched notes at all; `left` whenever staff "2"
/// is absent.
#[derive(Debug, Clone)]
pub(crate) struct HandVoices {
    pub right: Option<VoiceKey>,
    pub left: Option<VoiceKey>,
}

pub(crate) fn select_hands(
    stats: &BTreeMap<VoiceKey, VoiceStats>,
    warnings: &mut Vec<String>,
) -> HandVoices {
    let mut right = best_voice_in_staff(stats, "1");
    if right.is_none() && !stats.is_empty() {
        right = best_voice(stats.iter());
        if let Some((staff, voice)) = &right {
            let message = format!(
                "Right-hand staff=1 not found; fallback to detected lead voice staff={} voice={}.",
                staff, voice
            );
            log::warn!("{}", message);
            warnings.push(message);
        }
    }

    let left = best_voice_in_staff(stats, "2");

    let right_staff_voices = voices_on_staff(stats, "1");
    let left_staff_voices = voices_on_staff(stats, "2");

    if let Some((staff, voice)) = &right {
        log::debug!("right hand: staff={} voice={}", staff, voice);
        warnings.push(format!(
            "Right-hand lead voice selected: staff={} voice={}.",
            staff, voice
        ));
        if right_staff_voices.len() > 1 {
            warnings.push(format!(
                "Detected multi-voice right hand; kept voice {} on staff=1.",
                voice
            ));
        }
    }
    if let Some((staff, voice)) = &left {
        log::debug!("left hand: staff={} voice={}", staff, voice);
        warnings.push(format!(
            "Left-hand accompaniment voice selected: staff={} voice={}.",
            staff, voice
        ));
        if left_staff_voices.len() > 1 {
            warnings.push(format!(
                "Detected multi-voice left hand; kept voice {} on staff=2.",
                voice
            ));
        }
    } else {
        let message = "Left-hand staff=2 not detected; playback will use right hand only.";
        log::warn!("{}", message);
        warnings.push(message.to_string());
    }

    HandVoices { right, left }
}

/// Best candidate under the fixed tie-break: note count descending,
/// average pitch descending, then staff and voice token ascending.
fn best_voice<'a, I>(candidates: I) -> Option<VoiceKey>
where
    I: Iterator<Item = (&'a VoiceKey, &'a VoiceStats)>,
{
    let mut ranked: Vec<(&VoiceKey, &VoiceStats)> = candidates.collect();
    ranked.sort_by(|(a_key, a), (b_key, b)| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.avg_pitch().total_cmp(&a.avg_pitch()))
            .then_with(|| a_key.cmp(b_key))
    });
    ranked.first().map(|(key, _)| (*key).clone())
}

fn best_voice_in_staff(stats: &BTreeMap<VoiceKey, VoiceStats>, staff: &str) -> Option<VoiceKey> {
    best_voice(stats.iter().filter(|(key, _)| key.0 == staff))
}

fn voices_on_staff<'a>(
    stats: &'a BTreeMap<VoiceKey, VoiceStats>,
    staff: &str,
) -> BTreeSet<&'a String> {
    stats
        .keys()
        .filter(|(s, _)| s == staff)
        .map(|(_, voice)| voice)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_of(entries: &[(&str, &str, u32, i64)]) -> BTreeMap<VoiceKey, VoiceStats> {
        entries
            .iter()
            .map(|(staff, voice, count, pitch_sum)| {
                (
                    (staff.to_string(), voice.to_string()),
                    VoiceStats {
                        count: *count,
                        pitch_sum: *pitch_sum,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_density_outranks_pitch() {
        let stats = stats_of(&[("1", "1", 1, 84), ("1", "2", 3, 150)]);
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.right, Some(("1".to_string(), "2".to_string())));
    }

    #[test]
    fn test_average_pitch_breaks_count_tie() {
        let stats = stats_of(&[("1", "1", 2, 120), ("1", "2", 2, 140)]);
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.right, Some(("1".to_string(), "2".to_string())));
    }

    #[test]
    fn test_voice_token_breaks_full_tie() {
        let stats = stats_of(&[("1", "2", 2, 120), ("1", "1", 2, 120)]);
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.right, Some(("1".to_string(), "1".to_string())));
    }

    #[test]
    fn test_multi_voice_staff_warns() {
        let stats = stats_of(&[("1", "1", 2, 120), ("1", "2", 1, 60)]);
        let mut warnings = Vec::new();
        select_hands(&stats, &mut warnings);
        assert!(warnings
            .iter()
            .any(|w| w.contains("multi-voice right hand")));
    }

    #[test]
    fn test_fallback_when_staff_one_missing() {
        let stats = stats_of(&[("3", "1", 2, 120), ("4", "1", 1, 60)]);
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.right, Some(("3".to_string(), "1".to_string())));
        assert!(warnings.iter().any(|w| w.contains("fallback")));
    }

    #[test]
    fn test_left_hand_is_staff_two_only() {
        let stats = stats_of(&[("1", "1", 2, 120)]);
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.left, None);
        assert!(warnings
            .iter()
            .any(|w| w.contains("right hand only")));
    }

    #[test]
    fn test_empty_stats_select_nothing() {
        let stats = BTreeMap::new();
        let mut warnings = Vec::new();
        let hands = select_hands(&stats, &mut warnings);
        assert_eq!(hands.right, None);
        assert_eq!(hands.left, None);
        // Only the missing-left warning applies to an empty score
        assert_eq!(warnings.len(), 1);
    }
}
