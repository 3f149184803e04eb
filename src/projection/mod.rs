//! Public sample projections: reshape catalog records into the per-category
//! view objects the marketing site consumes.
//!
//! Pure and side-effect free: the output is a function of the records passed
//! in. Records are filtered to the category's expected file type, keep the
//! store's most-recent-first order, and are numbered with a zero-based
//! `orderIndex` (lower = newer = featured).

use crate::catalog::{Category, MediaFileType, MediaRecord};
use serde::{Deserialize, Serialize};

/// Fallback strings used when a record is missing optional fields. The
/// compiled-in values match what the site always showed; deployments can
/// override them in the `[projection]` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionDefaults {
    pub demo_video_description: String,
    pub demo_video_duration: String,
    pub avatar_description: String,
    pub voice_description: String,
    pub voice_duration: String,
    pub voice_language: String,
    pub voice_gender: String,
    pub edited_video_description: String,
    pub edited_video_duration: String,
    pub podcast_description: String,
    pub podcast_duration: String,
    pub podcast_category: String,
}

impl Default for ProjectionDefaults {
    fn default() -> Self {
        Self {
            demo_video_description: "Professional AI-generated video content".to_string(),
            demo_video_duration: "30s".to_string(),
            avatar_description: "Professional AI-generated avatar".to_string(),
            voice_description: "Custom voice ad".to_string(),
            voice_duration: "30s".to_string(),
            voice_language: "English".to_string(),
            voice_gender: "Neutral".to_string(),
            edited_video_description: "Professionally edited video content".to_string(),
            edited_video_duration: "60s".to_string(),
            podcast_description: "Professional podcast episode".to_string(),
            podcast_duration: "15m".to_string(),
            podcast_category: "general".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoVideoSample {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub category: String,
    pub duration: String,
    pub order_index: usize,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarSample {
    pub id: String,
    pub name: String,
    pub role: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub description: String,
    pub order_index: usize,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSample {
    pub id: String,
    pub name: String,
    pub language: String,
    pub gender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    pub audio_url: String,
    pub duration: String,
    pub description: String,
    pub order_index: usize,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditedVideoSample {
    pub id: String,
    pub title: String,
    pub project_type: String,
    pub duration: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub description: String,
    pub order_index: usize,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastSample {
    pub id: String,
    pub title: String,
    pub category: String,
    pub episode_number: String,
    pub duration: String,
    pub audio_url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    pub order_index: usize,
    pub is_published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One projected item; the variant is determined by the category.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SampleView {
    DemoVideo(DemoVideoSample),
    Avatar(AvatarSample),
    Voice(VoiceSample),
    EditedVideo(EditedVideoSample),
    Podcast(PodcastSample),
}

/// Project records of one category into its public shape. `records` must be
/// in store order (most recent first); the index assignment relies on it.
pub fn project(
    category: Category,
    records: &[MediaRecord],
    defaults: &ProjectionDefaults,
) -> Vec<SampleView> {
    let expected = category.file_type();

    records
        .iter()
        .filter(|record| record.file_type == expected)
        .enumerate()
        .map(|(index, record)| shape(category, record, index, defaults))
        .collect()
}

fn shape(
    category: Category,
    record: &MediaRecord,
    order_index: usize,
    defaults: &ProjectionDefaults,
) -> SampleView {
    debug_assert_eq!(record.file_type, category.file_type());

    let description = |fallback: &str| {
        record
            .description
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    };
    let duration = |fallback: &str| {
        record
            .duration
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    };
    let audio = record.audio_metadata.clone().unwrap_or_default();

    // Every item is published: the catalog has no draft state.
    match category {
        Category::VideoStudio => SampleView::DemoVideo(DemoVideoSample {
            id: record.id.clone(),
            title: record.title.clone(),
            description: description(&defaults.demo_video_description),
            video_url: record.derived_file_path.clone(),
            thumbnail_url: record.thumbnail_path.clone(),
            category: "demo".to_string(),
            duration: duration(&defaults.demo_video_duration),
            order_index,
            is_published: true,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }),
        Category::AvatarStudio => SampleView::Avatar(AvatarSample {
            id: record.id.clone(),
            name: record.title.clone(),
            role: "Custom Avatar".to_string(),
            video_url: record.derived_file_path.clone(),
            thumbnail_url: record.thumbnail_path.clone(),
            description: description(&defaults.avatar_description),
            order_index,
            is_published: true,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }),
        Category::VoiceAds => SampleView::Voice(VoiceSample {
            id: record.id.clone(),
            name: record.title.clone(),
            language: audio
                .language
                .unwrap_or_else(|| defaults.voice_language.clone()),
            gender: audio
                .gender
                .unwrap_or_else(|| defaults.voice_gender.clone()),
            accent: audio.accent,
            age_range: audio.age_range,
            audio_url: record.derived_file_path.clone(),
            duration: duration(&defaults.voice_duration),
            description: description(&defaults.voice_description),
            order_index,
            is_published: true,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }),
        Category::VideoEditing => SampleView::EditedVideo(EditedVideoSample {
            id: record.id.clone(),
            title: record.title.clone(),
            project_type: "Custom Edit".to_string(),
            duration: duration(&defaults.edited_video_duration),
            video_url: record.derived_file_path.clone(),
            thumbnail_url: record.thumbnail_path.clone(),
            description: description(&defaults.edited_video_description),
            order_index,
            is_published: true,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }),
        Category::PodcastProduction => SampleView::Podcast(PodcastSample {
            id: record.id.clone(),
            title: record.title.clone(),
            category: audio
                .tags
                .as_ref()
                .and_then(|tags| tags.first().cloned())
                .unwrap_or_else(|| defaults.podcast_category.clone()),
            episode_number: audio.episode_type.unwrap_or_default(),
            duration: duration(&defaults.podcast_duration),
            audio_url: record.derived_file_path.clone(),
            description: description(&defaults.podcast_description),
            host_name: audio.host_name,
            guest_name: audio.guest_name,
            order_index,
            is_published: true,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AudioDetails;

    fn record(title: &str, category: Category, file_type: MediaFileType) -> MediaRecord {
        MediaRecord {
            id: format!("id-{}", title),
            title: title.to_string(),
            category,
            description: None,
            file_type,
            original_filename: format!("{}.bin", title),
            derived_file_path: format!("/uploads/compressed/{}.bin", title),
            thumbnail_path: None,
            duration: None,
            file_size_bytes: 100,
            technical_metadata: None,
            audio_metadata: None,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    #[test]
    fn voice_sample_pulls_audio_metadata() {
        let mut r = record("ad", Category::VoiceAds, MediaFileType::Audio);
        r.audio_metadata = Some(AudioDetails {
            language: Some("English".to_string()),
            gender: Some("Female".to_string()),
            accent: Some("British".to_string()),
            ..Default::default()
        });

        let views = project(Category::VoiceAds, &[r], &ProjectionDefaults::default());
        assert_eq!(views.len(), 1);
        let SampleView::Voice(voice) = &views[0] else {
            panic!("expected a voice sample");
        };
        assert_eq!(voice.language, "English");
        assert_eq!(voice.gender, "Female");
        assert_eq!(voice.accent.as_deref(), Some("British"));
        assert_eq!(voice.age_range, None);
        assert!(voice.is_published);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let r = record("ad", Category::VoiceAds, MediaFileType::Audio);
        let defaults = ProjectionDefaults::default();

        let views = project(Category::VoiceAds, &[r], &defaults);
        let SampleView::Voice(voice) = &views[0] else {
            panic!("expected a voice sample");
        };
        assert_eq!(voice.language, "English");
        assert_eq!(voice.gender, "Neutral");
        assert_eq!(voice.duration, "30s");
        assert_eq!(voice.description, "Custom voice ad");
    }

    #[test]
    fn file_type_filter_drops_mismatched_records() {
        // An audio record that somehow sits in a video category is not shown
        let video = record("clip", Category::VideoStudio, MediaFileType::Video);
        let stray = record("stray", Category::VideoStudio, MediaFileType::Audio);

        let views = project(
            Category::VideoStudio,
            &[video, stray],
            &ProjectionDefaults::default(),
        );
        assert_eq!(views.len(), 1);
    }

    #[test]
    fn order_index_follows_input_order() {
        let records = vec![
            record("newest", Category::AvatarStudio, MediaFileType::Video),
            record("older", Category::AvatarStudio, MediaFileType::Video),
            record("oldest", Category::AvatarStudio, MediaFileType::Video),
        ];

        let views = project(
            Category::AvatarStudio,
            &records,
            &ProjectionDefaults::default(),
        );
        let indices: Vec<(usize, &str)> = views
            .iter()
            .map(|v| match v {
                SampleView::Avatar(a) => (a.order_index, a.name.as_str()),
                _ => panic!("expected avatars"),
            })
            .collect();
        assert_eq!(indices, vec![(0, "newest"), (1, "older"), (2, "oldest")]);
    }

    #[test]
    fn podcast_category_comes_from_first_tag() {
        let mut r = record("ep1", Category::PodcastProduction, MediaFileType::Audio);
        r.audio_metadata = Some(AudioDetails {
            tags: Some(vec!["tech".to_string(), "ai".to_string()]),
            episode_type: Some("S1E1".to_string()),
            host_name: Some("Ada".to_string()),
            ..Default::default()
        });

        let views = project(
            Category::PodcastProduction,
            &[r],
            &ProjectionDefaults::default(),
        );
        let SampleView::Podcast(podcast) = &views[0] else {
            panic!("expected a podcast sample");
        };
        assert_eq!(podcast.category, "tech");
        assert_eq!(podcast.episode_number, "S1E1");
        assert_eq!(podcast.host_name.as_deref(), Some("Ada"));
        assert_eq!(podcast.duration, "15m");
    }

    #[test]
    fn demo_video_serializes_expected_keys() {
        let mut r = record("demo", Category::VideoStudio, MediaFileType::Video);
        r.thumbnail_path = Some("/uploads/thumbnails/demo.jpg".to_string());
        r.duration = Some("30".to_string());

        let views = project(Category::VideoStudio, &[r], &ProjectionDefaults::default());
        let json = serde_json::to_value(&views[0]).unwrap();

        assert_eq!(json["videoUrl"], "/uploads/compressed/demo.bin");
        assert_eq!(json["thumbnailUrl"], "/uploads/thumbnails/demo.jpg");
        assert_eq!(json["category"], "demo");
        assert_eq!(json["duration"], "30");
        assert_eq!(json["orderIndex"], 0);
        assert_eq!(json["isPublished"], true);
    }

    #[test]
    fn projection_defaults_are_overridable_from_toml() {
        let parsed: ProjectionDefaults = toml::from_str(
            r#"
            voice_language = "Arabic"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.voice_language, "Arabic");
        // Unspecified fields keep the compiled-in values
        assert_eq!(parsed.voice_gender, "Neutral");
    }
}
