//! Submission validation boundary
//!
//! Structural validation of a composed splitsheet document before it enters
//! the signature workflow. Validation always collects the complete list of
//! field errors so a caller can surface every problem at once; nothing is
//! partially applied.

use crate::allocation::{self, AlertSeverity};
use crate::participant::{ContactInfo, ParticipantCategory};
use crate::splitsheet::Splitsheet;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `writer_composers[0].name`
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Configurable validation rules resolved from settings
#[derive(Debug, Clone, Default)]
pub struct ValidationPolicy {
    /// Optional pattern the song reference must match; None disables the check
    pub song_reference_pattern: Option<Regex>,
}

impl ValidationPolicy {
    /// Build a policy from the stored setting value (empty string disables)
    pub fn from_pattern_setting(pattern: &str) -> crate::Result<Self> {
        if pattern.trim().is_empty() {
            return Ok(Self::default());
        }
        let regex = Regex::new(pattern).map_err(|e| {
            crate::Error::Config(format!("Invalid song_reference_pattern: {}", e))
        })?;
        Ok(Self {
            song_reference_pattern: Some(regex),
        })
    }
}

/// Validate a splitsheet document for submission.
///
/// Returns every field error found; an empty result means the document may
/// enter the workflow. Allocation cap breaches count as blocking errors and
/// are reported against the list field that feeds the breached bucket.
pub fn validate_document(
    sheet: &Splitsheet,
    policy: &ValidationPolicy,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if sheet.song_title.trim().is_empty() {
        errors.push(FieldError::new("song_title", "Song title is required"));
    }
    if sheet.song_reference.trim().is_empty() {
        errors.push(FieldError::new(
            "song_reference",
            "Song reference is required",
        ));
    } else if let Some(pattern) = &policy.song_reference_pattern {
        if !pattern.is_match(&sheet.song_reference) {
            errors.push(FieldError::new(
                "song_reference",
                format!(
                    "Song reference '{}' does not match the required pattern",
                    sheet.song_reference
                ),
            ));
        }
    }

    for category in ParticipantCategory::all() {
        if category.is_required() && sheet.category_len(category) == 0 {
            errors.push(FieldError::new(
                category.list_field(),
                format!("At least one {} is required", category.default_role().to_lowercase()),
            ));
        }
    }

    validate_participants(sheet, &mut errors);

    // Allocation cap breaches block submission
    for alert in allocation::validate_allocation(sheet) {
        if alert.severity == AlertSeverity::Error {
            let field = match alert.category.as_str() {
                s if s.starts_with("Songwriting") => "writer_composers",
                s if s.starts_with("Melody") => "recording_artists",
                _ => "other_contributors",
            };
            errors.push(FieldError::new(field, alert.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_participants(sheet: &Splitsheet, errors: &mut Vec<FieldError>) {
    for (i, w) in sheet.writer_composers.iter().enumerate() {
        let prefix = format!("writer_composers[{}]", i);
        validate_contact(&prefix, &w.contact, errors);
        validate_percentage(&prefix, "songwriting_percentage", w.songwriting_percentage, errors);
    }
    for (i, a) in sheet.recording_artists.iter().enumerate() {
        let prefix = format!("recording_artists[{}]", i);
        validate_contact(&prefix, &a.contact, errors);
        validate_percentage(&prefix, "music_ownership", a.music_ownership, errors);
    }
    for (i, l) in sheet.labels.iter().enumerate() {
        let prefix = format!("labels[{}]", i);
        validate_contact(&prefix, &l.contact, errors);
        if l.label_name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{}.label_name", prefix),
                "Label name is required",
            ));
        }
        if l.artist.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{}.artist", prefix),
                "Artist name is required",
            ));
        }
    }
    for (i, s) in sheet.studios.iter().enumerate() {
        let prefix = format!("studios[{}]", i);
        validate_contact(&prefix, &s.contact, errors);
        if s.studio_name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{}.studio_name", prefix),
                "Studio name is required",
            ));
        }
    }
    for (i, p) in sheet.publishers.iter().enumerate() {
        let prefix = format!("publishers[{}]", i);
        validate_contact(&prefix, &p.contact, errors);
        if p.publisher_name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{}.publisher_name", prefix),
                "Publisher name is required",
            ));
        }
        validate_percentage(&prefix, "publishing_percentage", p.publishing_percentage, errors);
    }
    for (i, e) in sheet.executive_producers.iter().enumerate() {
        let prefix = format!("executive_producers[{}]", i);
        if e.name.trim().is_empty() {
            errors.push(FieldError::new(format!("{}.name", prefix), "Name is required"));
        }
        if e.reference_number == 0 {
            errors.push(FieldError::new(
                format!("{}.reference_number", prefix),
                "Reference number must be at least 1",
            ));
        }
        validate_required_email(&prefix, &e.email, errors);
        validate_percentage(&prefix, "work_ownership", e.work_ownership, errors);
    }
    for (i, o) in sheet.other_contributors.iter().enumerate() {
        let prefix = format!("other_contributors[{}]", i);
        if o.name.trim().is_empty() {
            errors.push(FieldError::new(format!("{}.name", prefix), "Name is required"));
        }
        if o.reference_number == 0 {
            errors.push(FieldError::new(
                format!("{}.reference_number", prefix),
                "Reference number must be at least 1",
            ));
        }
        validate_required_email(&prefix, &o.email, errors);
        validate_percentage(&prefix, "work_ownership", o.work_ownership, errors);
    }
}

fn validate_contact(prefix: &str, contact: &ContactInfo, errors: &mut Vec<FieldError>) {
    if contact.name.trim().is_empty() {
        errors.push(FieldError::new(format!("{}.name", prefix), "Name is required"));
    }
    if contact.address.trim().is_empty() {
        errors.push(FieldError::new(
            format!("{}.address", prefix),
            "Address is required",
        ));
    }
    if contact.reference_number == 0 {
        errors.push(FieldError::new(
            format!("{}.reference_number", prefix),
            "Reference number must be at least 1",
        ));
    }
    if let Some(email) = &contact.email {
        if !email.trim().is_empty() && !is_valid_email(email) {
            errors.push(FieldError::new(
                format!("{}.email", prefix),
                format!("'{}' is not a valid email address", email),
            ));
        }
    }
}

fn validate_required_email(prefix: &str, email: &str, errors: &mut Vec<FieldError>) {
    if email.trim().is_empty() {
        errors.push(FieldError::new(
            format!("{}.email", prefix),
            "Email is required",
        ));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new(
            format!("{}.email", prefix),
            format!("'{}' is not a valid email address", email),
        ));
    }
}

fn validate_percentage(prefix: &str, field: &str, value: u32, errors: &mut Vec<FieldError>) {
    if value > 100 {
        errors.push(FieldError::new(
            format!("{}.{}", prefix, field),
            format!("Percentage must be between 0 and 100, got {}", value),
        ));
    }
}

/// Structural email check: one '@', non-empty local part, dotted domain,
/// no whitespace. Deliverability is the notification system's problem.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{
        ContactInfo, Label, Publisher, RecordingArtist, Studio, WriterComposer,
    };

    fn contact(n: u32, name: &str) -> ContactInfo {
        ContactInfo {
            reference_number: n,
            name: name.to_string(),
            address: "1 Test Road".to_string(),
            phone: None,
            email: Some(format!("{}@example.com", name.to_lowercase())),
            pro_affiliation: None,
            national_id: None,
            date_of_birth: None,
            ipi_number: None,
        }
    }

    fn complete_sheet() -> Splitsheet {
        Splitsheet {
            song_title: "Harbor Lights".to_string(),
            song_reference: "SR-100".to_string(),
            agreement_date: Some("2025-11-02".to_string()),
            writer_composers: vec![WriterComposer {
                contact: contact(1, "Ana"),
                songwriting_percentage: 50,
                role: None,
            }],
            recording_artists: vec![RecordingArtist {
                contact: contact(1, "Ben"),
                music_ownership: 25,
                role: None,
            }],
            labels: vec![Label {
                contact: contact(1, "Northway"),
                label_name: "Northway Records".to_string(),
                artist: "Ben".to_string(),
            }],
            studios: vec![Studio {
                contact: contact(1, "Harbor"),
                studio_name: "Harbor Lane Studio".to_string(),
            }],
            publishers: vec![Publisher {
                contact: contact(1, "Northway"),
                publisher_name: "Northway Publishing".to_string(),
                publishing_percentage: 100,
            }],
            executive_producers: vec![],
            other_contributors: vec![],
        }
    }

    #[test]
    fn test_complete_sheet_passes() {
        assert!(validate_document(&complete_sheet(), &ValidationPolicy::default()).is_ok());
    }

    #[test]
    fn test_missing_studios_names_the_category() {
        let mut sheet = complete_sheet();
        sheet.studios.clear();

        let errors = validate_document(&sheet, &ValidationPolicy::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "studios"));
    }

    #[test]
    fn test_all_errors_reported_at_once() {
        let mut sheet = complete_sheet();
        sheet.song_title.clear();
        sheet.song_reference.clear();
        sheet.labels.clear();
        sheet.writer_composers[0].contact.address.clear();

        let errors = validate_document(&sheet, &ValidationPolicy::default()).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"song_title"));
        assert!(fields.contains(&"song_reference"));
        assert!(fields.contains(&"labels"));
        assert!(fields.contains(&"writer_composers[0].address"));
    }

    #[test]
    fn test_malformed_email_rejected() {
        let mut sheet = complete_sheet();
        sheet.recording_artists[0].contact.email = Some("not-an-email".to_string());

        let errors = validate_document(&sheet, &ValidationPolicy::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "recording_artists[0].email"));
    }

    #[test]
    fn test_over_cap_blocks_submission() {
        let mut sheet = complete_sheet();
        sheet.writer_composers[0].songwriting_percentage = 52;

        let errors = validate_document(&sheet, &ValidationPolicy::default()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.field == "writer_composers" && e.message.contains("52%")));
    }

    #[test]
    fn test_reference_pattern_disabled_by_default() {
        let mut sheet = complete_sheet();
        sheet.song_reference = "anything goes here".to_string();
        // whitespace in the reference is fine when the pattern check is off
        assert!(validate_document(&sheet, &ValidationPolicy::default()).is_ok());
    }

    #[test]
    fn test_reference_pattern_enforced_when_configured() {
        let policy =
            ValidationPolicy::from_pattern_setting(r"^[A-Z]{2}-[A-Z0-9]{3}-\d{2}-\d{2}-\d{3}$")
                .unwrap();

        let mut sheet = complete_sheet();
        sheet.song_reference = "DM-A0D-25-01-001".to_string();
        assert!(validate_document(&sheet, &policy).is_ok());

        sheet.song_reference = "SR-100".to_string();
        let errors = validate_document(&sheet, &policy).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "song_reference"));
    }

    #[test]
    fn test_empty_pattern_setting_disables_check() {
        let policy = ValidationPolicy::from_pattern_setting("  ").unwrap();
        assert!(policy.song_reference_pattern.is_none());
    }

    #[test]
    fn test_email_structure_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@.co"));
    }
}
