//! Participant records for splitsheet contributor categories
//!
//! Each contributor category is a distinct struct; the `Participant` enum
//! ties them together as a tagged union so the allocation engine and the
//! HTTP boundary can match exhaustively instead of branching on strings.

use serde::{Deserialize, Serialize};

/// Contact fields shared by the five primary contributor categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Sequence within the category, starting at 1
    pub reference_number: u32,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_affiliation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipi_number: Option<String>,
}

/// Writer/composer: holds a share of the songwriting pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterComposer {
    #[serde(flatten)]
    pub contact: ContactInfo,
    /// Share of the 50% songwriting pool, in whole percent points
    #[serde(default = "default_songwriting_percentage")]
    pub songwriting_percentage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn default_songwriting_percentage() -> u32 {
    100
}

/// Recording artist: holds a share of the music ownership pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingArtist {
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub music_ownership: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Record label representative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub label_name: String,
    /// Artist the label represents on this song
    pub artist: String,
}

/// Recording studio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Studio {
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub studio_name: String,
}

/// Publisher: holds a share of the publishing ledger (separate from composition)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub publisher_name: String,
    pub publishing_percentage: u32,
}

/// Executive producer (optional category, email required)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveProducer {
    pub reference_number: u32,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub work_ownership: u32,
}

/// Any other contributor (optional category, email required)
///
/// `contribution` assigns the entry to an ownership bucket explicitly.
/// Documents migrated from older clients may omit it and carry only the
/// free-text `role_notes`; see [`ContributionCategory::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherContributor {
    pub reference_number: u32,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution: Option<ContributionCategory>,
    #[serde(default)]
    pub work_ownership: u32,
}

impl OtherContributor {
    /// Ownership bucket this entry counts toward.
    ///
    /// The explicit `contribution` field wins; otherwise legacy free-text
    /// role notes are classified by keyword.
    pub fn bucket(&self) -> ContributionCategory {
        if let Some(contribution) = self.contribution {
            return contribution;
        }
        self.role_notes
            .as_deref()
            .map(ContributionCategory::classify)
            .unwrap_or(ContributionCategory::Other)
    }
}

/// Ownership bucket for other-contributor entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionCategory {
    Songwriting,
    Melody,
    BeatProduction,
    Other,
}

impl ContributionCategory {
    /// Classify legacy free-text role notes into a bucket.
    ///
    /// Case-insensitive substring match, checked in songwriting, melody,
    /// beat/production order so a note matching several keywords lands in
    /// exactly one bucket.
    pub fn classify(role_notes: &str) -> Self {
        let notes = role_notes.to_lowercase();
        if notes.contains("songwriter") || notes.contains("author") {
            ContributionCategory::Songwriting
        } else if notes.contains("melody") {
            ContributionCategory::Melody
        } else if notes.contains("beat")
            || notes.contains("production")
            || notes.contains("producer")
        {
            ContributionCategory::BeatProduction
        } else {
            ContributionCategory::Other
        }
    }
}

/// Contributor category tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantCategory {
    WriterComposer,
    RecordingArtist,
    Label,
    Studio,
    Publisher,
    ExecutiveProducer,
    OtherContributor,
}

impl ParticipantCategory {
    /// All categories in document order
    pub fn all() -> [ParticipantCategory; 7] {
        [
            ParticipantCategory::WriterComposer,
            ParticipantCategory::RecordingArtist,
            ParticipantCategory::Label,
            ParticipantCategory::Studio,
            ParticipantCategory::Publisher,
            ParticipantCategory::ExecutiveProducer,
            ParticipantCategory::OtherContributor,
        ]
    }

    /// Snake-case tag used in documents, API paths and database rows
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantCategory::WriterComposer => "writer_composer",
            ParticipantCategory::RecordingArtist => "recording_artist",
            ParticipantCategory::Label => "label",
            ParticipantCategory::Studio => "studio",
            ParticipantCategory::Publisher => "publisher",
            ParticipantCategory::ExecutiveProducer => "executive_producer",
            ParticipantCategory::OtherContributor => "other_contributor",
        }
    }

    /// Parse a category tag (accepts both singular tags and list field names)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "writer_composer" | "writer_composers" => Some(ParticipantCategory::WriterComposer),
            "recording_artist" | "recording_artists" => Some(ParticipantCategory::RecordingArtist),
            "label" | "labels" => Some(ParticipantCategory::Label),
            "studio" | "studios" => Some(ParticipantCategory::Studio),
            "publisher" | "publishers" => Some(ParticipantCategory::Publisher),
            "executive_producer" | "executive_producers" => {
                Some(ParticipantCategory::ExecutiveProducer)
            }
            "other_contributor" | "other_contributors" => {
                Some(ParticipantCategory::OtherContributor)
            }
            _ => None,
        }
    }

    /// Two-letter role code used in party entry IDs
    pub fn short_code(&self) -> &'static str {
        match self {
            ParticipantCategory::WriterComposer => "WC",
            ParticipantCategory::RecordingArtist => "RA",
            ParticipantCategory::Label => "LD",
            ParticipantCategory::Studio => "SD",
            ParticipantCategory::Publisher => "PD",
            ParticipantCategory::ExecutiveProducer => "EP",
            ParticipantCategory::OtherContributor => "OC",
        }
    }

    /// Name of the document list field holding this category
    pub fn list_field(&self) -> &'static str {
        match self {
            ParticipantCategory::WriterComposer => "writer_composers",
            ParticipantCategory::RecordingArtist => "recording_artists",
            ParticipantCategory::Label => "labels",
            ParticipantCategory::Studio => "studios",
            ParticipantCategory::Publisher => "publishers",
            ParticipantCategory::ExecutiveProducer => "executive_producers",
            ParticipantCategory::OtherContributor => "other_contributors",
        }
    }

    /// Whether a submitted document must contain at least one entry
    pub fn is_required(&self) -> bool {
        !matches!(
            self,
            ParticipantCategory::ExecutiveProducer | ParticipantCategory::OtherContributor
        )
    }

    /// Default party role label
    pub fn default_role(&self) -> &'static str {
        match self {
            ParticipantCategory::WriterComposer => "Writer/Composer",
            ParticipantCategory::RecordingArtist => "Recording Artist",
            ParticipantCategory::Label => "Label Representative",
            ParticipantCategory::Studio => "Studio Representative",
            ParticipantCategory::Publisher => "Publisher",
            ParticipantCategory::ExecutiveProducer => "Executive Producer",
            ParticipantCategory::OtherContributor => "Contributor",
        }
    }
}

impl std::fmt::Display for ParticipantCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant of any category, tagged for exhaustive matching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Participant {
    WriterComposer(WriterComposer),
    RecordingArtist(RecordingArtist),
    Label(Label),
    Studio(Studio),
    Publisher(Publisher),
    ExecutiveProducer(ExecutiveProducer),
    OtherContributor(OtherContributor),
}

impl Participant {
    pub fn category(&self) -> ParticipantCategory {
        match self {
            Participant::WriterComposer(_) => ParticipantCategory::WriterComposer,
            Participant::RecordingArtist(_) => ParticipantCategory::RecordingArtist,
            Participant::Label(_) => ParticipantCategory::Label,
            Participant::Studio(_) => ParticipantCategory::Studio,
            Participant::Publisher(_) => ParticipantCategory::Publisher,
            Participant::ExecutiveProducer(_) => ParticipantCategory::ExecutiveProducer,
            Participant::OtherContributor(_) => ParticipantCategory::OtherContributor,
        }
    }

    pub fn reference_number(&self) -> u32 {
        match self {
            Participant::WriterComposer(p) => p.contact.reference_number,
            Participant::RecordingArtist(p) => p.contact.reference_number,
            Participant::Label(p) => p.contact.reference_number,
            Participant::Studio(p) => p.contact.reference_number,
            Participant::Publisher(p) => p.contact.reference_number,
            Participant::ExecutiveProducer(p) => p.reference_number,
            Participant::OtherContributor(p) => p.reference_number,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Participant::WriterComposer(p) => &p.contact.name,
            Participant::RecordingArtist(p) => &p.contact.name,
            Participant::Label(p) => &p.contact.name,
            Participant::Studio(p) => &p.contact.name,
            Participant::Publisher(p) => &p.contact.name,
            Participant::ExecutiveProducer(p) => &p.name,
            Participant::OtherContributor(p) => &p.name,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Participant::WriterComposer(p) => p.contact.email.as_deref(),
            Participant::RecordingArtist(p) => p.contact.email.as_deref(),
            Participant::Label(p) => p.contact.email.as_deref(),
            Participant::Studio(p) => p.contact.email.as_deref(),
            Participant::Publisher(p) => p.contact.email.as_deref(),
            Participant::ExecutiveProducer(p) => Some(&p.email),
            Participant::OtherContributor(p) => Some(&p.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_songwriting_keywords() {
        assert_eq!(
            ContributionCategory::classify("co-songwriter on the bridge"),
            ContributionCategory::Songwriting
        );
        assert_eq!(
            ContributionCategory::classify("AUTHOR of verse 2"),
            ContributionCategory::Songwriting
        );
    }

    #[test]
    fn test_classify_melody_and_beat_keywords() {
        assert_eq!(
            ContributionCategory::classify("melody arrangement"),
            ContributionCategory::Melody
        );
        assert_eq!(
            ContributionCategory::classify("beat maker"),
            ContributionCategory::BeatProduction
        );
        assert_eq!(
            ContributionCategory::classify("additional Production"),
            ContributionCategory::BeatProduction
        );
        assert_eq!(
            ContributionCategory::classify("co-producer"),
            ContributionCategory::BeatProduction
        );
    }

    #[test]
    fn test_classify_multi_keyword_lands_in_one_bucket() {
        // Songwriting wins over production when both keywords appear
        assert_eq!(
            ContributionCategory::classify("songwriter and producer"),
            ContributionCategory::Songwriting
        );
    }

    #[test]
    fn test_classify_unknown_is_other() {
        assert_eq!(
            ContributionCategory::classify("string section"),
            ContributionCategory::Other
        );
    }

    #[test]
    fn test_explicit_contribution_wins_over_role_notes() {
        let contributor = OtherContributor {
            reference_number: 1,
            name: "A".to_string(),
            email: "a@example.com".to_string(),
            role_notes: Some("producer".to_string()),
            contribution: Some(ContributionCategory::Melody),
            work_ownership: 10,
        };
        assert_eq!(contributor.bucket(), ContributionCategory::Melody);
    }

    #[test]
    fn test_category_round_trip() {
        for category in ParticipantCategory::all() {
            assert_eq!(
                ParticipantCategory::from_str(category.as_str()),
                Some(category)
            );
            assert_eq!(
                ParticipantCategory::from_str(category.list_field()),
                Some(category)
            );
        }
    }

    #[test]
    fn test_required_categories() {
        assert!(ParticipantCategory::WriterComposer.is_required());
        assert!(ParticipantCategory::RecordingArtist.is_required());
        assert!(ParticipantCategory::Label.is_required());
        assert!(ParticipantCategory::Studio.is_required());
        assert!(ParticipantCategory::Publisher.is_required());
        assert!(!ParticipantCategory::ExecutiveProducer.is_required());
        assert!(!ParticipantCategory::OtherContributor.is_required());
    }

    #[test]
    fn test_participant_tagged_serialization() {
        let participant = Participant::Studio(Studio {
            contact: ContactInfo {
                reference_number: 1,
                name: "Harbor Lane Studio".to_string(),
                address: "12 Harbor Lane".to_string(),
                phone: None,
                email: None,
                pro_affiliation: None,
                national_id: None,
                date_of_birth: None,
                ipi_number: None,
            },
            studio_name: "Harbor Lane Studio".to_string(),
        });

        let json = serde_json::to_string(&participant).unwrap();
        assert!(json.contains("\"category\":\"studio\""));

        let parsed: Participant = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, participant);
    }
}
