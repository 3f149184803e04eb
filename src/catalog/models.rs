//! Catalog data model: media records and the fixed service categories.

use serde::{Deserialize, Serialize};

/// The service offerings a media item can illustrate.
///
/// The set is closed: projections dispatch on this enum exhaustively, and the
/// wire representation is the display name the admin dashboard submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI Video Studio")]
    VideoStudio,
    #[serde(rename = "Avatar Studio")]
    AvatarStudio,
    #[serde(rename = "AI Video Editing")]
    VideoEditing,
    #[serde(rename = "Professional Multilingual Voice Ads")]
    VoiceAds,
    #[serde(rename = "AI Podcast Production")]
    PodcastProduction,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::VideoStudio,
        Category::AvatarStudio,
        Category::VideoEditing,
        Category::VoiceAds,
        Category::PodcastProduction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::VideoStudio => "AI Video Studio",
            Category::AvatarStudio => "Avatar Studio",
            Category::VideoEditing => "AI Video Editing",
            Category::VoiceAds => "Professional Multilingual Voice Ads",
            Category::PodcastProduction => "AI Podcast Production",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// The file type records of this category are expected to carry; the
    /// projection layer filters on it.
    pub fn file_type(&self) -> MediaFileType {
        match self {
            Category::VideoStudio | Category::AvatarStudio | Category::VideoEditing => {
                MediaFileType::Video
            }
            Category::VoiceAds | Category::PodcastProduction => MediaFileType::Audio,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a record went through the video or the audio transcoding path.
/// Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFileType {
    Video,
    Audio,
}

impl MediaFileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFileType::Video => "video",
            MediaFileType::Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<MediaFileType> {
        match s {
            "video" => Some(MediaFileType::Video),
            "audio" => Some(MediaFileType::Audio),
            _ => None,
        }
    }
}

/// Best-effort encoding facts probed from the derived file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
}

/// Category-specific descriptive fields supplied by the admin alongside audio
/// uploads. Voice ads use the speaker fields, podcasts the episode fields;
/// everything is optional and unknown keys are ignored (the dashboard evolves
/// independently of the server).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
}

/// A cataloged media item. `derived_file_path` always points at a file that
/// exists in the media store; the ingestion orchestrator guarantees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_type: MediaFileType,
    pub original_filename: String,
    pub derived_file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    /// Whole seconds, as a string (what the projections render).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub file_size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_metadata: Option<TechnicalMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_metadata: Option<AudioDetails>,
    /// Unix milliseconds. Immutable.
    pub created_at: i64,
    /// Unix milliseconds. Refreshed on every update.
    pub updated_at: i64,
}

/// Input for `CatalogStore::create`; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub title: String,
    pub category: Category,
    pub description: Option<String>,
    pub file_type: MediaFileType,
    pub original_filename: String,
    pub derived_file_path: String,
    pub thumbnail_path: Option<String>,
    pub duration: Option<String>,
    pub file_size_bytes: i64,
    pub technical_metadata: Option<TechnicalMetadata>,
    pub audio_metadata: Option<AudioDetails>,
}

/// The mutable field subset for `CatalogStore::update`. Immutable fields
/// (id, file type, file paths, timestamps) are not representable here, and
/// unknown keys in a PATCH body are rejected rather than dropped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MediaUpdate {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub audio_metadata: Option<AudioDetails>,
}

impl MediaUpdate {
    /// Field-level validation; the store assumes this has been applied.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("Title must not be empty".to_string());
            }
        }
        Ok(())
    }
}
