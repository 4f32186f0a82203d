//! Allocation engine
//!
//! Computes per-category ownership totals, validates them against the
//! policy caps, and redistributes percentage pools equally when a
//! participant list changes shape.
//!
//! All arithmetic is on whole percent points (`u32`); redistribution uses
//! floor division with the remainder assigned to the first participant, so
//! list totals always land exactly on the target.

use crate::participant::ContributionCategory;
use crate::splitsheet::Splitsheet;
use serde::{Deserialize, Serialize};

/// Songwriting/authors pool cap
pub const SONGWRITING_CAP: u32 = 50;
/// Melody creators pool cap
pub const MELODY_CAP: u32 = 25;
/// Beat/production pool cap
pub const BEAT_PRODUCTION_CAP: u32 = 25;

/// Writer/composer lists redistribute to this total
pub const WRITER_REDISTRIBUTION_TARGET: u32 = 50;
/// Recording-artist lists redistribute to this total.
///
/// Note the asymmetry against [`MELODY_CAP`]: music ownership is a broader
/// field than the melody-creation sub-allocation, and the two are validated
/// separately.
pub const ARTIST_REDISTRIBUTION_TARGET: u32 = 100;

/// Songwriting totals within this many points below the cap draw a warning
pub const SONGWRITING_WARNING_MARGIN: u32 = 5;

/// Per-bucket ownership totals derived from a splitsheet document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub songwriting: u32,
    pub melody: u32,
    pub beat_production: u32,
}

/// Severity of an allocation alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
}

/// One allocation policy finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationAlert {
    pub severity: AlertSeverity,
    /// Policy bucket label, e.g. "Songwriting/Authors (50%)"
    pub category: String,
    pub message: String,
    pub limit: u32,
    pub current: u32,
}

/// Sum each ownership bucket across the document.
///
/// Songwriting: writer/composer shares plus other-contributor entries in the
/// songwriting bucket. Melody: recording-artist music ownership plus
/// other-contributor melody entries. Beat/production has no first-class
/// field and exists only through other-contributor entries.
pub fn category_totals(sheet: &Splitsheet) -> CategoryTotals {
    let mut totals = CategoryTotals {
        songwriting: sheet
            .writer_composers
            .iter()
            .map(|w| w.songwriting_percentage)
            .sum(),
        melody: sheet
            .recording_artists
            .iter()
            .map(|a| a.music_ownership)
            .sum(),
        beat_production: 0,
    };

    for contributor in &sheet.other_contributors {
        match contributor.bucket() {
            ContributionCategory::Songwriting => totals.songwriting += contributor.work_ownership,
            ContributionCategory::Melody => totals.melody += contributor.work_ownership,
            ContributionCategory::BeatProduction => {
                totals.beat_production += contributor.work_ownership
            }
            ContributionCategory::Other => {}
        }
    }

    totals
}

/// Validate bucket totals against the policy caps.
///
/// Never fails; returns a possibly-empty alert list. Each cap breach is an
/// error alert; songwriting additionally warns when within
/// [`SONGWRITING_WARNING_MARGIN`] points below its cap.
pub fn validate_allocation(sheet: &Splitsheet) -> Vec<AllocationAlert> {
    let totals = category_totals(sheet);
    let mut alerts = Vec::new();

    if totals.songwriting > SONGWRITING_CAP {
        alerts.push(AllocationAlert {
            severity: AlertSeverity::Error,
            category: "Songwriting/Authors (50%)".to_string(),
            message: format!(
                "Songwriting percentages total {}% of the {}% limit",
                totals.songwriting, SONGWRITING_CAP
            ),
            limit: SONGWRITING_CAP,
            current: totals.songwriting,
        });
    }

    if totals.melody > MELODY_CAP {
        alerts.push(AllocationAlert {
            severity: AlertSeverity::Error,
            category: "Melody Creators (25%)".to_string(),
            message: format!(
                "Melody creation percentages total {}% of the {}% limit",
                totals.melody, MELODY_CAP
            ),
            limit: MELODY_CAP,
            current: totals.melody,
        });
    }

    if totals.beat_production > BEAT_PRODUCTION_CAP {
        alerts.push(AllocationAlert {
            severity: AlertSeverity::Error,
            category: "Music Composition (25%)".to_string(),
            message: format!(
                "Music composition percentages total {}% of the {}% limit",
                totals.beat_production, BEAT_PRODUCTION_CAP
            ),
            limit: BEAT_PRODUCTION_CAP,
            current: totals.beat_production,
        });
    }

    // Near-limit warning exists for songwriting only
    if totals.songwriting > SONGWRITING_CAP - SONGWRITING_WARNING_MARGIN
        && totals.songwriting <= SONGWRITING_CAP
    {
        alerts.push(AllocationAlert {
            severity: AlertSeverity::Warning,
            category: "Songwriting/Authors (50%)".to_string(),
            message: format!(
                "Songwriting percentages total {}% of the {}% limit (approaching limit)",
                totals.songwriting, SONGWRITING_CAP
            ),
            limit: SONGWRITING_CAP,
            current: totals.songwriting,
        });
    }

    alerts
}

/// Divide `target` equally across `values`.
///
/// Floor division; the remainder goes to index 0 so the sum is exactly
/// `target`. Idempotent for a fixed length. Empty slices are left alone.
pub fn redistribute_equally(values: &mut [u32], target: u32) {
    if values.is_empty() {
        return;
    }
    let count = values.len() as u32;
    let share = target / count;
    let remainder = target - share * count;

    for (i, value) in values.iter_mut().enumerate() {
        *value = if i == 0 { share + remainder } else { share };
    }
}

/// Re-divide the songwriting pool across the current writer/composer list.
/// Must run after every add or remove on that list.
pub fn redistribute_writers(sheet: &mut Splitsheet) {
    let mut shares: Vec<u32> = sheet
        .writer_composers
        .iter()
        .map(|w| w.songwriting_percentage)
        .collect();
    redistribute_equally(&mut shares, WRITER_REDISTRIBUTION_TARGET);
    for (writer, share) in sheet.writer_composers.iter_mut().zip(shares) {
        writer.songwriting_percentage = share;
    }
}

/// Re-divide music ownership across the current recording-artist list.
/// Must run after every add or remove on that list.
pub fn redistribute_recording_artists(sheet: &mut Splitsheet) {
    let mut shares: Vec<u32> = sheet
        .recording_artists
        .iter()
        .map(|a| a.music_ownership)
        .collect();
    redistribute_equally(&mut shares, ARTIST_REDISTRIBUTION_TARGET);
    for (artist, share) in sheet.recording_artists.iter_mut().zip(shares) {
        artist.music_ownership = share;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{ContactInfo, OtherContributor, RecordingArtist, WriterComposer};

    fn contact(n: u32, name: &str) -> ContactInfo {
        ContactInfo {
            reference_number: n,
            name: name.to_string(),
            address: "1 Test Road".to_string(),
            phone: None,
            email: None,
            pro_affiliation: None,
            national_id: None,
            date_of_birth: None,
            ipi_number: None,
        }
    }

    fn writer(n: u32, pct: u32) -> WriterComposer {
        WriterComposer {
            contact: contact(n, &format!("Writer {}", n)),
            songwriting_percentage: pct,
            role: None,
        }
    }

    fn artist(n: u32, pct: u32) -> RecordingArtist {
        RecordingArtist {
            contact: contact(n, &format!("Artist {}", n)),
            music_ownership: pct,
            role: None,
        }
    }

    fn contributor(n: u32, notes: &str, pct: u32) -> OtherContributor {
        OtherContributor {
            reference_number: n,
            name: format!("Contributor {}", n),
            email: format!("c{}@example.com", n),
            role_notes: Some(notes.to_string()),
            contribution: None,
            work_ownership: pct,
        }
    }

    #[test]
    fn test_redistribute_three_writers_cap_50() {
        let mut values = vec![50, 0, 0];
        redistribute_equally(&mut values, 50);
        assert_eq!(values, vec![18, 16, 16]);
        assert_eq!(values.iter().sum::<u32>(), 50);
    }

    #[test]
    fn test_redistribute_two_writers_even_split() {
        let mut values = vec![50, 0];
        redistribute_equally(&mut values, 50);
        assert_eq!(values, vec![25, 25]);
    }

    #[test]
    fn test_redistribute_is_idempotent() {
        let mut values = vec![7, 7, 7];
        redistribute_equally(&mut values, 50);
        let first = values.clone();
        redistribute_equally(&mut values, 50);
        assert_eq!(values, first);
    }

    #[test]
    fn test_redistribute_sums_to_target_for_many_counts() {
        for count in 1..=12 {
            for target in [50u32, 100] {
                let mut values = vec![0u32; count];
                redistribute_equally(&mut values, target);
                assert_eq!(
                    values.iter().sum::<u32>(),
                    target,
                    "count {} target {}",
                    count,
                    target
                );
                // only the first participant absorbs the remainder
                for v in &values[1..] {
                    assert_eq!(*v, target / count as u32);
                }
            }
        }
    }

    #[test]
    fn test_redistribute_empty_list_is_noop() {
        let mut values: Vec<u32> = vec![];
        redistribute_equally(&mut values, 50);
        assert!(values.is_empty());
    }

    #[test]
    fn test_totals_sum_all_buckets() {
        let sheet = Splitsheet {
            writer_composers: vec![writer(1, 30), writer(2, 10)],
            recording_artists: vec![artist(1, 20)],
            other_contributors: vec![
                contributor(1, "co-author", 5),
                contributor(2, "melody", 3),
                contributor(3, "beat maker", 7),
                contributor(4, "catering", 9),
            ],
            ..Splitsheet::default()
        };

        let totals = category_totals(&sheet);
        assert_eq!(totals.songwriting, 45);
        assert_eq!(totals.melody, 23);
        assert_eq!(totals.beat_production, 7);
    }

    #[test]
    fn test_totals_invariant_under_reordering() {
        let mut sheet = Splitsheet {
            writer_composers: vec![writer(1, 18), writer(2, 16), writer(3, 16)],
            other_contributors: vec![
                contributor(1, "producer", 10),
                contributor(2, "melody", 5),
            ],
            ..Splitsheet::default()
        };
        let before = category_totals(&sheet);

        sheet.writer_composers.reverse();
        sheet.other_contributors.reverse();
        assert_eq!(category_totals(&sheet), before);
    }

    #[test]
    fn test_over_cap_songwriting_emits_error_alert() {
        let sheet = Splitsheet {
            writer_composers: vec![writer(1, 32), writer(2, 20)],
            ..Splitsheet::default()
        };

        let alerts = validate_allocation(&sheet);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Error);
        assert_eq!(alerts[0].category, "Songwriting/Authors (50%)");
        assert_eq!(alerts[0].current, 52);
        assert_eq!(alerts[0].limit, 50);
    }

    #[test]
    fn test_songwriting_near_limit_warning() {
        let sheet = Splitsheet {
            writer_composers: vec![writer(1, 46)],
            ..Splitsheet::default()
        };

        let alerts = validate_allocation(&sheet);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
        assert_eq!(alerts[0].current, 46);
    }

    #[test]
    fn test_exactly_at_cap_warns_but_no_error() {
        let sheet = Splitsheet {
            writer_composers: vec![writer(1, 50)],
            ..Splitsheet::default()
        };

        let alerts = validate_allocation(&sheet);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_no_warning_for_melody_or_beat_near_limit() {
        let sheet = Splitsheet {
            recording_artists: vec![artist(1, 24)],
            other_contributors: vec![contributor(1, "producer", 24)],
            ..Splitsheet::default()
        };
        assert!(validate_allocation(&sheet).is_empty());
    }

    #[test]
    fn test_melody_and_beat_over_cap_errors() {
        let sheet = Splitsheet {
            recording_artists: vec![artist(1, 26)],
            other_contributors: vec![contributor(1, "beat", 30)],
            ..Splitsheet::default()
        };

        let alerts = validate_allocation(&sheet);
        assert_eq!(alerts.len(), 2);
        assert!(alerts
            .iter()
            .all(|a| a.severity == AlertSeverity::Error));
        assert!(alerts.iter().any(|a| a.category.starts_with("Melody")));
        assert!(alerts
            .iter()
            .any(|a| a.category.starts_with("Music Composition")));
    }

    #[test]
    fn test_redistribute_writers_after_add() {
        let mut sheet = Splitsheet {
            writer_composers: vec![writer(1, 50)],
            ..Splitsheet::default()
        };
        sheet.writer_composers.push(writer(2, 0));
        redistribute_writers(&mut sheet);
        assert_eq!(
            sheet
                .writer_composers
                .iter()
                .map(|w| w.songwriting_percentage)
                .collect::<Vec<_>>(),
            vec![25, 25]
        );
    }

    #[test]
    fn test_redistribute_artists_targets_100() {
        let mut sheet = Splitsheet {
            recording_artists: vec![artist(1, 100), artist(2, 0), artist(3, 0)],
            ..Splitsheet::default()
        };
        redistribute_recording_artists(&mut sheet);
        assert_eq!(
            sheet
                .recording_artists
                .iter()
                .map(|a| a.music_ownership)
                .collect::<Vec<_>>(),
            vec![34, 33, 33]
        );
    }
}
