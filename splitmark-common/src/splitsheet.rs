//! Splitsheet document model
//!
//! The document aggregates the seven participant lists under the song
//! identity. It is a plain value: validation and redistribution are pure
//! functions over it, and the service persists the whole document as one
//! record.

use crate::participant::{
    ExecutiveProducer, Label, OtherContributor, Participant, ParticipantCategory, Publisher,
    RecordingArtist, Studio, WriterComposer,
};
use serde::{Deserialize, Serialize};

/// A splitsheet document as composed by a client
///
/// Identity is `song_reference`; a document with an empty reference is
/// rejected at the submission boundary before anything downstream sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Splitsheet {
    #[serde(default)]
    pub song_title: String,
    #[serde(default)]
    pub song_reference: String,
    /// Agreement date, ISO 8601 (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_date: Option<String>,
    #[serde(default)]
    pub writer_composers: Vec<WriterComposer>,
    #[serde(default)]
    pub recording_artists: Vec<RecordingArtist>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub studios: Vec<Studio>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub executive_producers: Vec<ExecutiveProducer>,
    #[serde(default)]
    pub other_contributors: Vec<OtherContributor>,
}

/// One signing party derived from a splitsheet document
///
/// Parties are keyed by (category, reference_number); the entry ID is the
/// human-readable label `<role code>-<song reference>-<NN>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningParty {
    pub category: ParticipantCategory,
    pub reference_number: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    /// Ownership share this party is consenting to, in whole percent points
    pub ownership_percentage: u32,
    pub entry_id: String,
}

impl Splitsheet {
    /// Number of entries in a category list
    pub fn category_len(&self, category: ParticipantCategory) -> usize {
        match category {
            ParticipantCategory::WriterComposer => self.writer_composers.len(),
            ParticipantCategory::RecordingArtist => self.recording_artists.len(),
            ParticipantCategory::Label => self.labels.len(),
            ParticipantCategory::Studio => self.studios.len(),
            ParticipantCategory::Publisher => self.publishers.len(),
            ParticipantCategory::ExecutiveProducer => self.executive_producers.len(),
            ParticipantCategory::OtherContributor => self.other_contributors.len(),
        }
    }

    /// Total number of participants across all categories
    pub fn participant_count(&self) -> usize {
        ParticipantCategory::all()
            .iter()
            .map(|c| self.category_len(*c))
            .sum()
    }

    /// Append a participant to its category list, assigning the next
    /// reference number in sequence.
    pub fn push_participant(&mut self, participant: Participant) {
        match participant {
            Participant::WriterComposer(mut p) => {
                p.contact.reference_number = self.writer_composers.len() as u32 + 1;
                self.writer_composers.push(p);
            }
            Participant::RecordingArtist(mut p) => {
                p.contact.reference_number = self.recording_artists.len() as u32 + 1;
                self.recording_artists.push(p);
            }
            Participant::Label(mut p) => {
                p.contact.reference_number = self.labels.len() as u32 + 1;
                self.labels.push(p);
            }
            Participant::Studio(mut p) => {
                p.contact.reference_number = self.studios.len() as u32 + 1;
                self.studios.push(p);
            }
            Participant::Publisher(mut p) => {
                p.contact.reference_number = self.publishers.len() as u32 + 1;
                self.publishers.push(p);
            }
            Participant::ExecutiveProducer(mut p) => {
                p.reference_number = self.executive_producers.len() as u32 + 1;
                self.executive_producers.push(p);
            }
            Participant::OtherContributor(mut p) => {
                p.reference_number = self.other_contributors.len() as u32 + 1;
                self.other_contributors.push(p);
            }
        }
    }

    /// Remove the participant with the given reference number from a
    /// category list, renumbering the remainder so references stay a
    /// 1-based sequence. Returns false if no such entry exists.
    pub fn remove_participant(
        &mut self,
        category: ParticipantCategory,
        reference_number: u32,
    ) -> bool {
        fn remove_and_renumber<T>(
            list: &mut Vec<T>,
            reference_number: u32,
            get: impl Fn(&T) -> u32,
            set: impl Fn(&mut T, u32),
        ) -> bool {
            let Some(pos) = list.iter().position(|p| get(p) == reference_number) else {
                return false;
            };
            list.remove(pos);
            for (i, entry) in list.iter_mut().enumerate() {
                set(entry, i as u32 + 1);
            }
            true
        }

        match category {
            ParticipantCategory::WriterComposer => remove_and_renumber(
                &mut self.writer_composers,
                reference_number,
                |p| p.contact.reference_number,
                |p, n| p.contact.reference_number = n,
            ),
            ParticipantCategory::RecordingArtist => remove_and_renumber(
                &mut self.recording_artists,
                reference_number,
                |p| p.contact.reference_number,
                |p, n| p.contact.reference_number = n,
            ),
            ParticipantCategory::Label => remove_and_renumber(
                &mut self.labels,
                reference_number,
                |p| p.contact.reference_number,
                |p, n| p.contact.reference_number = n,
            ),
            ParticipantCategory::Studio => remove_and_renumber(
                &mut self.studios,
                reference_number,
                |p| p.contact.reference_number,
                |p, n| p.contact.reference_number = n,
            ),
            ParticipantCategory::Publisher => remove_and_renumber(
                &mut self.publishers,
                reference_number,
                |p| p.contact.reference_number,
                |p, n| p.contact.reference_number = n,
            ),
            ParticipantCategory::ExecutiveProducer => remove_and_renumber(
                &mut self.executive_producers,
                reference_number,
                |p| p.reference_number,
                |p, n| p.reference_number = n,
            ),
            ParticipantCategory::OtherContributor => remove_and_renumber(
                &mut self.other_contributors,
                reference_number,
                |p| p.reference_number,
                |p, n| p.reference_number = n,
            ),
        }
    }

    /// Derive the signing parties for this document.
    ///
    /// Every participant entry is a required signing party. Party identity
    /// is (category, reference_number); ownership is the percentage field
    /// relevant to the category (0 for labels and studios, which sign as
    /// counterparties rather than owners).
    pub fn parties(&self) -> Vec<SigningParty> {
        let mut parties = Vec::with_capacity(self.participant_count());

        for w in &self.writer_composers {
            parties.push(self.party_from(
                ParticipantCategory::WriterComposer,
                w.contact.reference_number,
                &w.contact.name,
                w.contact.email.as_deref(),
                w.role.as_deref(),
                w.songwriting_percentage,
            ));
        }
        for a in &self.recording_artists {
            parties.push(self.party_from(
                ParticipantCategory::RecordingArtist,
                a.contact.reference_number,
                &a.contact.name,
                a.contact.email.as_deref(),
                a.role.as_deref(),
                a.music_ownership,
            ));
        }
        for l in &self.labels {
            parties.push(self.party_from(
                ParticipantCategory::Label,
                l.contact.reference_number,
                &l.contact.name,
                l.contact.email.as_deref(),
                None,
                0,
            ));
        }
        for s in &self.studios {
            parties.push(self.party_from(
                ParticipantCategory::Studio,
                s.contact.reference_number,
                &s.contact.name,
                s.contact.email.as_deref(),
                None,
                0,
            ));
        }
        for p in &self.publishers {
            parties.push(self.party_from(
                ParticipantCategory::Publisher,
                p.contact.reference_number,
                &p.contact.name,
                p.contact.email.as_deref(),
                None,
                p.publishing_percentage,
            ));
        }
        for e in &self.executive_producers {
            parties.push(self.party_from(
                ParticipantCategory::ExecutiveProducer,
                e.reference_number,
                &e.name,
                Some(&e.email),
                None,
                e.work_ownership,
            ));
        }
        for o in &self.other_contributors {
            parties.push(self.party_from(
                ParticipantCategory::OtherContributor,
                o.reference_number,
                &o.name,
                Some(&o.email),
                o.role_notes.as_deref(),
                o.work_ownership,
            ));
        }

        parties
    }

    fn party_from(
        &self,
        category: ParticipantCategory,
        reference_number: u32,
        name: &str,
        email: Option<&str>,
        role: Option<&str>,
        ownership_percentage: u32,
    ) -> SigningParty {
        SigningParty {
            category,
            reference_number,
            name: name.to_string(),
            email: email.map(str::to_string),
            role: role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(category.default_role())
                .to_string(),
            ownership_percentage,
            entry_id: format!(
                "{}-{}-{:02}",
                category.short_code(),
                self.song_reference,
                reference_number
            ),
        }
    }

    /// Classify other-contributor entries that arrived without an explicit
    /// contribution category (legacy documents). Idempotent.
    pub fn classify_legacy_contributors(&mut self) {
        for contributor in &mut self.other_contributors {
            if contributor.contribution.is_none() {
                contributor.contribution = Some(contributor.bucket());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ContactInfo;

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

    fn sheet_with_two_writers() -> Splitsheet {
        Splitsheet {
            song_title: "Harbor Lights".to_string(),
            song_reference: "SR-100".to_string(),
            writer_composers: vec![
                WriterComposer {
                    contact: contact(1, "Ana"),
                    songwriting_percentage: 25,
                    role: None,
                },
                WriterComposer {
                    contact: contact(2, "Ben"),
                    songwriting_percentage: 25,
                    role: None,
                },
            ],
            ..Splitsheet::default()
        }
    }

    #[test]
    fn test_push_assigns_next_reference_number() {
        let mut sheet = sheet_with_two_writers();
        sheet.push_participant(Participant::WriterComposer(WriterComposer {
            contact: contact(99, "Cleo"),
            songwriting_percentage: 0,
            role: None,
        }));
        assert_eq!(sheet.writer_composers[2].contact.reference_number, 3);
    }

    #[test]
    fn test_remove_renumbers_sequence() {
        let mut sheet = sheet_with_two_writers();
        assert!(sheet.remove_participant(ParticipantCategory::WriterComposer, 1));
        assert_eq!(sheet.writer_composers.len(), 1);
        assert_eq!(sheet.writer_composers[0].contact.name, "Ben");
        assert_eq!(sheet.writer_composers[0].contact.reference_number, 1);
    }

    #[test]
    fn test_remove_missing_reference_is_false() {
        let mut sheet = sheet_with_two_writers();
        assert!(!sheet.remove_participant(ParticipantCategory::Studio, 1));
    }

    #[test]
    fn test_parties_cover_every_entry_with_entry_ids() {
        let sheet = sheet_with_two_writers();
        let parties = sheet.parties();
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].entry_id, "WC-SR-100-01");
        assert_eq!(parties[1].entry_id, "WC-SR-100-02");
        assert_eq!(parties[0].role, "Writer/Composer");
    }

    #[test]
    fn test_document_round_trip_is_identical() {
        let sheet = sheet_with_two_writers();
        let json = serde_json::to_string(&sheet).unwrap();
        let parsed: Splitsheet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sheet);
        // Serialization is stable across the round trip
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }
}
