//! Audio extraction for the transcription fallback.
//!
//! yt-dlp fetches the audio track as MP3, ffprobe reports its length and
//! ffmpeg's segment muxer cuts it into pieces small enough to upload.

use crate::error::{RecapError, Result};
use crate::tools::{arg, run_tool, FFMPEG, FFPROBE, YT_DLP};
use crate::video::VideoReference;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Download the audio track of `video` into `dir` as `<id>.mp3`.
#[instrument(skip(dir), fields(video = %video))]
pub async fn download_audio(video: &VideoReference, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let template = dir.join(format!("{}.%(ext)s", video.id));

    info!("Downloading audio from {}", video.url);
    run_tool(
        YT_DLP,
        &[
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "0",
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "--output",
            &arg(&template),
            &video.url,
        ],
    )
    .await
    .map_err(download_error)?;

    let audio = dir.join(format!("{}.mp3", video.id));
    if !audio.exists() {
        return Err(RecapError::AudioDownload(format!(
            "yt-dlp finished but {} is missing",
            audio.display()
        )));
    }
    Ok(audio)
}

/// Cut `source` into pieces of `piece_seconds` inside `dir`.
///
/// Returns `(path, offset_seconds)` in playback order. Audio no longer than one
/// piece is returned as is.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn split_audio(
    source: &Path,
    dir: &Path,
    piece_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    let piece_len = piece_seconds.max(1) as f64;
    let duration = audio_duration(source).await?;
    debug!("Audio is {:.1}s long", duration);

    if duration <= piece_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    std::fs::create_dir_all(dir)?;
    run_tool(
        FFMPEG,
        &[
            "-loglevel",
            "error",
            "-i",
            &arg(source),
            "-f",
            "segment",
            "-segment_time",
            &piece_seconds.max(1).to_string(),
            "-reset_timestamps",
            "1",
            "-c",
            "copy",
            &arg(&dir.join("piece_%04d.mp3")),
        ],
    )
    .await
    .map_err(download_error)?;

    let pieces = list_pieces(dir, piece_len)?;
    if pieces.is_empty() {
        return Err(RecapError::AudioDownload(
            "ffmpeg produced no audio pieces".to_string(),
        ));
    }

    info!("Split {:.0}s of audio into {} pieces", duration, pieces.len());
    Ok(pieces)
}

/// Pieces written by the segment muxer, in order, with their start offsets.
fn list_pieces(dir: &Path, piece_len: f64) -> Result<Vec<(PathBuf, f64)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("piece_") && n.ends_with(".mp3"))
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| (path, i as f64 * piece_len))
        .collect())
}

async fn audio_duration(path: &Path) -> Result<f64> {
    let output = run_tool(
        FFPROBE,
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            &arg(path),
        ],
    )
    .await
    .map_err(download_error)?;

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_duration(stdout: &str) -> Result<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            RecapError::AudioDownload(format!("Could not read audio duration from {:?}", stdout.trim()))
        })
}

/// Tool failures while fetching audio are download failures; a missing tool stays one.
fn download_error(error: RecapError) -> RecapError {
    match error {
        RecapError::ToolFailed(msg) => RecapError::AudioDownload(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("123.456000\n").unwrap(), 123.456);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_list_pieces_orders_and_offsets() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["piece_0002.mp3", "piece_0000.mp3", "piece_0001.mp3", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pieces = list_pieces(dir.path(), 600.0).unwrap();

        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].0, dir.path().join("piece_0000.mp3"));
        assert_eq!(pieces[2].0, dir.path().join("piece_0002.mp3"));
        assert_eq!(pieces[2].1, 1200.0);
    }

    #[test]
    fn test_download_error_mapping() {
        assert!(matches!(
            download_error(RecapError::ToolFailed("exit 1".into())),
            RecapError::AudioDownload(_)
        ));
        assert!(matches!(
            download_error(RecapError::ToolNotFound("ffmpeg".into())),
            RecapError::ToolNotFound(_)
        ));
    }
}
