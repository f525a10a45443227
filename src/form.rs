use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::credential::MusicId;
use crate::gateway::UploadedFile;

/// Campaign objective. Conversions campaigns must carry music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Objective {
    Traffic,
    Conversions,
}

/// Enumerated call-to-action labels accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallToAction {
    LearnMore,
    ShopNow,
    SignUp,
    DownloadNow,
    ContactUs,
}

/// The operator's music choice for the ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicSelection {
    /// No music. Illegal when the objective is Conversions.
    None,
    /// An existing platform track, referenced by id.
    Existing { music_id: String },
    /// A locally picked file; `music_id` is filled in once the upload
    /// completes.
    Uploaded {
        music_id: Option<MusicId>,
        file: Option<UploadedFile>,
    },
}

impl MusicSelection {
    /// The music id this selection resolves to, if any.
    #[must_use]
    pub fn music_id(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Existing { music_id } => Some(music_id),
            Self::Uploaded { music_id, .. } => music_id.as_ref().map(MusicId::as_str),
        }
    }
}

/// Ad-creation form state. Constructed fresh per submission attempt and
/// never partially submitted: submission is blocked while
/// [`validate_draft`] reports any error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdDraft {
    pub campaign_name: String,
    pub objective: Option<Objective>,
    pub ad_text: String,
    pub call_to_action: Option<CallToAction>,
    pub music_selection: MusicSelection,
}

/// Form fields addressable by validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    CampaignName,
    Objective,
    AdText,
    CallToAction,
    MusicSelection,
}

impl FormField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CampaignName => "campaign_name",
            Self::Objective => "objective",
            Self::AdText => "ad_text",
            Self::CallToAction => "call_to_action",
            Self::MusicSelection => "music_selection",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation errors; an absent key means the field is fine.
pub type FieldErrors = BTreeMap<FormField, String>;

const CAMPAIGN_NAME_MIN: usize = 3;
const CAMPAIGN_NAME_MAX: usize = 100;
const AD_TEXT_MAX: usize = 100;
const UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;
const ACCEPTED_AUDIO_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/mp4"];

/// Validate an ad draft against the platform's form rules.
///
/// Stateless: run it on every field edit and once more at submission time.
/// Rules are independent except for the cross-field one — a Conversions
/// objective with no music overrides any other music-related finding.
#[must_use]
pub fn validate_draft(draft: &AdDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name_len = draft.campaign_name.chars().count();
    if draft.campaign_name.is_empty() {
        errors.insert(FormField::CampaignName, "Campaign name is required.".into());
    } else if name_len < CAMPAIGN_NAME_MIN {
        errors.insert(
            FormField::CampaignName,
            format!("Campaign name must be at least {CAMPAIGN_NAME_MIN} characters."),
        );
    } else if name_len > CAMPAIGN_NAME_MAX {
        errors.insert(
            FormField::CampaignName,
            format!("Campaign name must be at most {CAMPAIGN_NAME_MAX} characters."),
        );
    }

    if draft.objective.is_none() {
        errors.insert(FormField::Objective, "Choose a campaign objective.".into());
    }

    if draft.ad_text.is_empty() {
        errors.insert(FormField::AdText, "Ad text is required.".into());
    } else if draft.ad_text.chars().count() > AD_TEXT_MAX {
        errors.insert(
            FormField::AdText,
            format!("Ad text must be at most {AD_TEXT_MAX} characters."),
        );
    }

    if draft.call_to_action.is_none() {
        errors.insert(FormField::CallToAction, "Choose a call to action.".into());
    }

    if let Some(message) = music_error(draft) {
        errors.insert(FormField::MusicSelection, message);
    }

    errors
}

fn music_error(draft: &AdDraft) -> Option<String> {
    // Cross-field rule first: it overrides anything else about the music
    // selection.
    if draft.objective == Some(Objective::Conversions)
        && draft.music_selection == MusicSelection::None
    {
        return Some("Conversions campaigns must include music. Pick a track or upload one.".into());
    }

    match &draft.music_selection {
        MusicSelection::None => None,
        MusicSelection::Existing { music_id } => {
            if music_id.is_empty() {
                Some("Enter a music ID.".into())
            } else if !MusicId::is_valid_format(music_id) {
                Some("Music ID must be 10-20 digits.".into())
            } else {
                None
            }
        }
        MusicSelection::Uploaded { file, .. } => match file {
            None => Some("Select an audio file to upload.".into()),
            Some(file) if !ACCEPTED_AUDIO_TYPES.contains(&file.mime_type.as_str()) => {
                Some("Audio must be MP3, WAV, or M4A.".into())
            }
            Some(file) if file.size_bytes > UPLOAD_MAX_BYTES => {
                Some("Audio file must be 10 MiB or smaller.".into())
            }
            Some(_) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> AdDraft {
        AdDraft {
            campaign_name: "Summer Launch".into(),
            objective: Some(Objective::Traffic),
            ad_text: "Hear the difference".into(),
            call_to_action: Some(CallToAction::ShopNow),
            music_selection: MusicSelection::Existing {
                music_id: "7012345678901".into(),
            },
        }
    }

    fn audio_file(mime: &str, size: u64) -> UploadedFile {
        UploadedFile {
            file_name: "track.mp3".into(),
            mime_type: mime.into(),
            size_bytes: size,
        }
    }

    #[test]
    fn valid_draft_has_no_errors() {
        assert!(validate_draft(&valid_draft()).is_empty());
    }

    #[test]
    fn conversions_without_music_is_rejected() {
        let draft = AdDraft {
            objective: Some(Objective::Conversions),
            music_selection: MusicSelection::None,
            ..valid_draft()
        };
        let errors = validate_draft(&draft);
        assert!(errors.contains_key(&FormField::MusicSelection));
    }

    #[test]
    fn traffic_without_music_is_fine() {
        let draft = AdDraft {
            objective: Some(Objective::Traffic),
            music_selection: MusicSelection::None,
            ..valid_draft()
        };
        assert!(validate_draft(&draft).is_empty());
    }

    #[test]
    fn campaign_name_length_bounds() {
        let too_short = AdDraft {
            campaign_name: "ab".into(),
            ..valid_draft()
        };
        assert!(validate_draft(&too_short).contains_key(&FormField::CampaignName));

        let just_long_enough = AdDraft {
            campaign_name: "abc".into(),
            ..valid_draft()
        };
        assert!(!validate_draft(&just_long_enough).contains_key(&FormField::CampaignName));

        let too_long = AdDraft {
            campaign_name: "x".repeat(101),
            ..valid_draft()
        };
        assert!(validate_draft(&too_long).contains_key(&FormField::CampaignName));
    }

    #[test]
    fn empty_required_fields_each_report() {
        let draft = AdDraft {
            campaign_name: String::new(),
            objective: None,
            ad_text: String::new(),
            call_to_action: None,
            music_selection: MusicSelection::Existing {
                music_id: String::new(),
            },
        };
        let errors = validate_draft(&draft);
        for field in [
            FormField::CampaignName,
            FormField::Objective,
            FormField::AdText,
            FormField::CallToAction,
            FormField::MusicSelection,
        ] {
            assert!(errors.contains_key(&field), "missing error for {field}");
        }
    }

    #[test]
    fn ad_text_max_length() {
        let at_limit = AdDraft {
            ad_text: "x".repeat(100),
            ..valid_draft()
        };
        assert!(!validate_draft(&at_limit).contains_key(&FormField::AdText));

        let over = AdDraft {
            ad_text: "x".repeat(101),
            ..valid_draft()
        };
        assert!(validate_draft(&over).contains_key(&FormField::AdText));
    }

    #[test]
    fn existing_music_id_pattern() {
        for bad in ["123", "123456789", "123456789012345678901", "12345abcde"] {
            let draft = AdDraft {
                music_selection: MusicSelection::Existing {
                    music_id: bad.into(),
                },
                ..valid_draft()
            };
            assert!(
                validate_draft(&draft).contains_key(&FormField::MusicSelection),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn uploaded_file_rules() {
        let missing = AdDraft {
            music_selection: MusicSelection::Uploaded {
                music_id: None,
                file: None,
            },
            ..valid_draft()
        };
        assert!(validate_draft(&missing).contains_key(&FormField::MusicSelection));

        let wrong_type = AdDraft {
            music_selection: MusicSelection::Uploaded {
                music_id: None,
                file: Some(audio_file("video/mp4", 1024)),
            },
            ..valid_draft()
        };
        assert!(validate_draft(&wrong_type).contains_key(&FormField::MusicSelection));

        let at_size_limit = AdDraft {
            music_selection: MusicSelection::Uploaded {
                music_id: None,
                file: Some(audio_file("audio/mpeg", 10 * 1024 * 1024)),
            },
            ..valid_draft()
        };
        assert!(!validate_draft(&at_size_limit).contains_key(&FormField::MusicSelection));

        let too_big = AdDraft {
            music_selection: MusicSelection::Uploaded {
                music_id: None,
                file: Some(audio_file("audio/mpeg", 10 * 1024 * 1024 + 1)),
            },
            ..valid_draft()
        };
        assert!(validate_draft(&too_big).contains_key(&FormField::MusicSelection));
    }

    #[test]
    fn conversions_override_beats_other_music_findings() {
        // With Conversions + None, the objective-specific message wins even
        // though None would otherwise be acceptable.
        let draft = AdDraft {
            objective: Some(Objective::Conversions),
            music_selection: MusicSelection::None,
            ..valid_draft()
        };
        let errors = validate_draft(&draft);
        let message = &errors[&FormField::MusicSelection];
        assert!(message.contains("Conversions"), "got {message:?}");
    }
}
