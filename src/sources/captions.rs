//! Platform caption source backed by yt-dlp.
//!
//! Lists the caption tracks of a video, picks the best one for the requested
//! language and downloads it as WebVTT. Manually created tracks are preferred over
//! auto-generated ones unless configured otherwise.

use super::TranscriptSource;
use crate::error::{RecapError, Result};
use crate::transcript::{parse_vtt, Transcript, TranscriptLine, TranscriptOrigin};
use crate::video::VideoReference;
use async_trait::async_trait;
use crate::tools::{arg, run_tool, YT_DLP};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Whether a caption track was written by a person or generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Manual,
    Automatic,
}

/// A caption track chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub kind: TrackKind,
}

/// Caption languages a video offers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionListing {
    pub manual: Vec<String>,
    pub automatic: Vec<String>,
}

impl CaptionListing {
    /// Read the `subtitles` and `automatic_captions` maps of yt-dlp's info JSON.
    ///
    /// Machine-translated automatic tracks (format URLs carrying `tlang=`) are
    /// left out; only the speech-recognized language counts as available.
    pub fn from_info_json(json: &serde_json::Value) -> Self {
        let languages = |key: &str, skip_translated: bool| -> Vec<String> {
            json[key]
                .as_object()
                .map(|tracks| {
                    tracks
                        .iter()
                        .filter(|(lang, formats)| {
                            let Some(formats) = formats.as_array().filter(|f| !f.is_empty()) else {
                                return false;
                            };
                            // Live chat replays show up as a pseudo subtitle track.
                            lang.as_str() != "live_chat"
                                && !(skip_translated && formats.iter().all(is_translated))
                        })
                        .map(|(lang, _)| lang.clone())
                        .collect()
                })
                .unwrap_or_default()
        };

        Self {
            manual: languages("subtitles", false),
            automatic: languages("automatic_captions", true),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.automatic.is_empty()
    }

    /// All offered languages, sorted and deduplicated.
    pub fn languages(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .manual
            .iter()
            .chain(self.automatic.iter())
            .cloned()
            .collect();
        all.sort();
        all.dedup();
        all
    }

    /// Pick a track for `language`.
    ///
    /// Within the preferred kind an exact tag match wins over a match on the base
    /// language (`en` vs `en-GB`); the other kind is only consulted when the
    /// preferred one has nothing usable.
    pub fn select(&self, language: &str, prefer_manual: bool) -> Option<CaptionTrack> {
        let order = if prefer_manual {
            [TrackKind::Manual, TrackKind::Automatic]
        } else {
            [TrackKind::Automatic, TrackKind::Manual]
        };

        order.into_iter().find_map(|kind| {
            let tracks = match kind {
                TrackKind::Manual => &self.manual,
                TrackKind::Automatic => &self.automatic,
            };
            let exact = tracks
                .iter()
                .find(|t| t.eq_ignore_ascii_case(language));
            let base = || {
                tracks
                    .iter()
                    .find(|t| base_language(t) == base_language(language))
            };
            exact.or_else(base).map(|lang| CaptionTrack {
                language: lang.clone(),
                kind,
            })
        })
    }
}

fn is_translated(format: &serde_json::Value) -> bool {
    format["url"]
        .as_str()
        .is_some_and(|url| url.contains("&tlang=") || url.contains("?tlang="))
}

/// `en-GB`, `en_US` and `en-orig` all reduce to `en`.
fn base_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase()
}

/// Caption source that shells out to yt-dlp.
pub struct YtDlpCaptions {
    prefer_manual: bool,
}

impl YtDlpCaptions {
    pub fn new() -> Self {
        Self::with_config(true)
    }

    pub fn with_config(prefer_manual: bool) -> Self {
        Self { prefer_manual }
    }

    /// List caption tracks using `yt-dlp --dump-json`.
    #[instrument(skip(self), fields(video = %video))]
    pub async fn list_tracks(&self, video: &VideoReference) -> Result<CaptionListing> {
        let output = run_tool(
            YT_DLP,
            &[
            "--dump-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            &video.url,
            ],
        )
        .await?;

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            RecapError::ToolFailed(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        let listing = CaptionListing::from_info_json(&json);
        debug!(
            "Caption tracks: {} manual, {} automatic",
            listing.manual.len(),
            listing.automatic.len()
        );
        Ok(listing)
    }

    /// Download one track as WebVTT and return its contents.
    async fn download_track(
        &self,
        video: &VideoReference,
        track: &CaptionTrack,
        dir: &Path,
    ) -> Result<String> {
        let template = arg(&dir.join("%(id)s.%(ext)s"));
        let write_flag = match track.kind {
            TrackKind::Manual => "--write-subs",
            TrackKind::Automatic => "--write-auto-subs",
        };

        run_tool(
            YT_DLP,
            &[
            "--skip-download",
            write_flag,
            "--sub-langs",
            &track.language,
            "--sub-format",
            "vtt",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            "--output",
            &template,
            &video.url,
            ],
        )
        .await?;

        let vtt_path = std::fs::read_dir(dir)?
            .flatten()
            .map(|e| e.path())
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some("vtt"))
            .ok_or_else(|| RecapError::CaptionsNotAvailable(video.id.clone()))?;

        Ok(tokio::fs::read_to_string(vtt_path).await?)
    }
}

impl Default for YtDlpCaptions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YtDlpCaptions {
    fn origin(&self) -> TranscriptOrigin {
        TranscriptOrigin::Captions
    }

    #[instrument(skip(self), fields(video = %video))]
    async fn fetch(&self, video: &VideoReference, language: &str) -> Result<Transcript> {
        let listing = self.list_tracks(video).await?;

        if listing.is_empty() {
            return Err(RecapError::CaptionsNotAvailable(video.id.clone()));
        }

        let track = listing
            .select(language, self.prefer_manual)
            .ok_or_else(|| RecapError::LanguageNotAvailable {
                video_id: video.id.clone(),
                requested: language.to_string(),
                available: listing.languages(),
            })?;

        info!("Downloading {:?} captions in {}", track.kind, track.language);

        let dir = tempfile::tempdir()?;
        let vtt = self.download_track(video, &track, dir.path()).await?;

        let mut cues = parse_vtt(&vtt, track.kind == TrackKind::Automatic);
        cues.sort_by_key(|cue| cue.start);

        let lines: Vec<TranscriptLine> = cues
            .into_iter()
            .map(|cue| {
                TranscriptLine::new(
                    cue.text,
                    cue.start,
                    Some(cue.end),
                    TranscriptOrigin::Captions,
                    track.language.clone(),
                )
            })
            .collect();

        if lines.is_empty() {
            return Err(RecapError::CaptionsNotAvailable(video.id.clone()));
        }

        debug!("Parsed {} caption lines", lines.len());
        Transcript::new(&video.id, &track.language, TranscriptOrigin::Captions, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> CaptionListing {
        CaptionListing::from_info_json(&json!({
            "subtitles": {
                "en-GB": [{"ext": "vtt"}],
                "live_chat": [{"ext": "json"}],
                "de": []
            },
            "automatic_captions": {
                "en": [{"ext": "vtt"}],
                "fr": [{"ext": "vtt"}],
                "ja": [
                    {"ext": "vtt", "url": "https://www.youtube.com/api/timedtext?v=x&lang=en&tlang=ja&fmt=vtt"},
                    {"ext": "json3", "url": "https://www.youtube.com/api/timedtext?v=x&lang=en&tlang=ja&fmt=json3"}
                ]
            }
        }))
    }

    #[test]
    fn test_listing_from_info_json() {
        let listing = listing();
        assert_eq!(listing.manual, vec!["en-GB".to_string()]);
        assert_eq!(listing.automatic, vec!["en".to_string(), "fr".to_string()]);
        assert_eq!(listing.languages(), vec!["en", "en-GB", "fr"]);
    }

    #[test]
    fn test_select_prefers_manual_base_match() {
        let track = listing().select("en", true).unwrap();
        assert_eq!(
            track,
            CaptionTrack {
                language: "en-GB".to_string(),
                kind: TrackKind::Manual
            }
        );
    }

    #[test]
    fn test_select_prefers_exact_when_automatic_first() {
        let track = listing().select("en", false).unwrap();
        assert_eq!(track.language, "en");
        assert_eq!(track.kind, TrackKind::Automatic);
    }

    #[test]
    fn test_select_falls_through_to_other_kind() {
        let track = listing().select("FR", true).unwrap();
        assert_eq!(track.language, "fr");
        assert_eq!(track.kind, TrackKind::Automatic);
    }

    #[test]
    fn test_select_missing_language() {
        assert!(listing().select("ja", true).is_none());
    }

    #[test]
    fn test_translated_tracks_are_not_languages() {
        let listing = CaptionListing::from_info_json(&json!({
            "automatic_captions": {
                "en": [{"ext": "vtt", "url": "https://www.youtube.com/api/timedtext?v=x&lang=en&fmt=vtt"}],
                "fr": [{"ext": "vtt", "url": "https://www.youtube.com/api/timedtext?v=x&lang=en&tlang=fr&fmt=vtt"}]
            }
        }));

        assert_eq!(listing.automatic, vec!["en".to_string()]);
        assert!(listing.select("fr", true).is_none());
        assert!(listing.select("en", true).is_some());
    }

    #[test]
    fn test_empty_listing() {
        let listing = CaptionListing::from_info_json(&json!({"title": "no captions"}));
        assert!(listing.is_empty());
    }

    #[test]
    fn test_base_language() {
        assert_eq!(base_language("en-orig"), "en");
        assert_eq!(base_language("pt_BR"), "pt");
        assert_eq!(base_language("DE"), "de");
    }
}
