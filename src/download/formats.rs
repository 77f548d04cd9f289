//! Format catalog: turns the extractor's raw descriptors into choices.
//!
//! Filtering and ranking are pure functions over the descriptor list so they can be
//! tested without a network call. [`FormatCatalog::resolve`] is the only place that talks
//! to the extractor.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use strum::Display;
use url::Url;

use crate::core::config::{self, Limits};
use crate::core::validation::NormalizedUrl;
use crate::download::error::PipelineError;
use crate::download::source::{MediaExtractor, RawFormat, RawMediaInfo};

/// Format id handed to the extractor when nothing better ranks
pub const FALLBACK_FORMAT_ID: &str = "best";

/// Preferred container for the automatic pick (plays everywhere)
const PREFERRED_EXT: &str = "mp4";

const MAX_VIDEO_CHOICES: usize = 4;
const MAX_AUDIO_CHOICES: usize = 2;

static HEIGHT_IN_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{3,4})p").expect("height regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// One selectable quality for a URL. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFormat {
    pub id: String,
    pub kind: MediaKind,
    pub label: String,
    pub size: Option<u64>,
    pub ext: Option<String>,
}

/// Payload of a selection event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Format(String),
    Auto,
}

/// A button of the quality prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedChoice {
    Format(CandidateFormat),
    Auto,
}

impl PresentedChoice {
    pub fn label(&self) -> String {
        match self {
            PresentedChoice::Format(format) => match format.kind {
                MediaKind::Video => format!("🎥 {}", format.label),
                MediaKind::Audio => format!("🔊 Audio ({})", format.label),
            },
            PresentedChoice::Auto => "⚡ Auto Select Best".to_string(),
        }
    }

    /// The selection this button stands for
    pub fn choice(&self) -> Choice {
        match self {
            PresentedChoice::Format(format) => Choice::Format(format.id.clone()),
            PresentedChoice::Auto => Choice::Auto,
        }
    }
}

/// Result of a successful catalog resolution
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The URL form the extractor accepted (canonical or its alternate)
    pub url: Url,
    pub title: String,
    pub duration_secs: u64,
    pub candidates: Vec<CandidateFormat>,
    pub presentable: Vec<PresentedChoice>,
    pub auto_pick: String,
    /// Longer than the advisory threshold but still allowed
    pub long_running: bool,
}

fn is_none_codec(codec: Option<&str>) -> bool {
    codec == Some("none")
}

/// Both streams explicitly absent (storyboards, thumbnails)
fn is_playable(format: &RawFormat) -> bool {
    !(is_none_codec(format.vcodec.as_deref()) && is_none_codec(format.acodec.as_deref()))
}

fn has_video(format: &RawFormat) -> bool {
    matches!(format.vcodec.as_deref(), Some(codec) if codec != "none")
}

/// Height from the explicit field, else from a `720p`-style note
fn format_height(format: &RawFormat) -> Option<u64> {
    format.height.or_else(|| {
        format
            .format_note
            .as_deref()
            .and_then(|note| HEIGHT_IN_LABEL.captures(note))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

fn video_label(format: &RawFormat) -> String {
    match format.format_note.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => note.to_string(),
        _ => match format.height {
            Some(height) => format!("{}p", height),
            None => format.format_id.clone(),
        },
    }
}

fn audio_label(format: &RawFormat) -> String {
    match format.abr.or(format.tbr).filter(|rate| *rate > 0.0) {
        Some(rate) => format!("{} kbps", rate.round() as u64),
        None => format.format_id.clone(),
    }
}

/// Converts playable raw descriptors into candidates, keeping the extractor's order.
pub fn build_candidates(formats: &[RawFormat]) -> Vec<CandidateFormat> {
    formats
        .iter()
        .filter(|f| is_playable(f))
        .map(|f| {
            let kind = if has_video(f) { MediaKind::Video } else { MediaKind::Audio };
            let label = match kind {
                MediaKind::Video => video_label(f),
                MediaKind::Audio => audio_label(f),
            };
            CandidateFormat {
                id: f.format_id.clone(),
                kind,
                label,
                size: f.filesize.or(f.filesize_approx),
                ext: f.ext.clone(),
            }
        })
        .collect()
}

/// Builds the bounded prompt: up to 4 videos, then up to 2 audios, then `Auto`.
///
/// Candidates with unknown size or above `size_ceiling` are not offered. Within a kind,
/// only the first candidate per label is kept.
pub fn presentable_formats(candidates: &[CandidateFormat], size_ceiling: u64) -> Vec<PresentedChoice> {
    let pick = |kind: MediaKind, limit: usize| {
        let mut seen: Vec<&str> = Vec::new();
        let mut picked = Vec::new();
        for candidate in candidates.iter().filter(|c| c.kind == kind) {
            if picked.len() == limit {
                break;
            }
            let fits = candidate.size.is_some_and(|size| size <= size_ceiling);
            if !fits || seen.contains(&candidate.label.as_str()) {
                continue;
            }
            seen.push(candidate.label.as_str());
            picked.push(PresentedChoice::Format(candidate.clone()));
        }
        picked
    };

    let mut choices = pick(MediaKind::Video, MAX_VIDEO_CHOICES);
    choices.extend(pick(MediaKind::Audio, MAX_AUDIO_CHOICES));
    choices.push(PresentedChoice::Auto);
    choices
}

/// Picks the automatic default.
///
/// Skips video-only descriptors, keeps the mp4 container, and takes the highest labeled
/// height at or below `quality_cap` (first occurrence wins ties). Falls back to
/// [`FALLBACK_FORMAT_ID`] when nothing qualifies.
pub fn select_best_format(formats: &[RawFormat], quality_cap: u32) -> String {
    let mut best: Option<(&RawFormat, u64)> = None;

    for format in formats {
        if is_none_codec(format.acodec.as_deref()) && has_video(format) {
            continue;
        }
        if format.ext.as_deref() != Some(PREFERRED_EXT) {
            continue;
        }
        let Some(height) = format_height(format) else {
            continue;
        };
        if height > u64::from(quality_cap) {
            continue;
        }
        if best.map_or(true, |(_, current)| height > current) {
            best = Some((format, height));
        }
    }

    best.map(|(format, _)| format.format_id.clone())
        .unwrap_or_else(|| FALLBACK_FORMAT_ID.to_string())
}

/// Queries the extractor and applies the duration policy and filters.
pub struct FormatCatalog {
    extractor: Arc<dyn MediaExtractor>,
    limits: Limits,
}

impl FormatCatalog {
    pub fn new(extractor: Arc<dyn MediaExtractor>, limits: Limits) -> Self {
        Self { extractor, limits }
    }

    /// Resolves a normalized URL into a catalog entry.
    ///
    /// One extractor call, plus one retry against the alternate form if the first fails.
    pub async fn resolve(&self, url: &NormalizedUrl) -> Result<CatalogEntry, PipelineError> {
        let (resolved_url, info) = match self.extractor.resolve(&url.url).await {
            Ok(info) => (url.url.clone(), info),
            Err(primary) => {
                let Some(alternate) = &url.alternate else {
                    log::warn!("{} could not resolve {}: {}", self.extractor.name(), url.url, primary);
                    return Err(PipelineError::ExtractionFailed(primary.to_string()));
                };
                log::warn!(
                    "{} could not resolve {} ({}), retrying with {}",
                    self.extractor.name(),
                    url.url,
                    primary,
                    alternate
                );
                match self.extractor.resolve(alternate).await {
                    Ok(info) => (alternate.clone(), info),
                    Err(fallback) => {
                        log::warn!("Fallback resolution of {} failed: {}", alternate, fallback);
                        return Err(PipelineError::ExtractionFailed(format!("{}; {}", primary, fallback)));
                    }
                }
            }
        };

        self.build_entry(resolved_url, info)
    }

    fn build_entry(&self, url: Url, info: RawMediaInfo) -> Result<CatalogEntry, PipelineError> {
        let duration = info.duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);
        let long_running = check_duration(duration, &self.limits)?;
        let duration_secs = duration.ceil() as u64;

        let candidates = build_candidates(&info.formats);
        if candidates.is_empty() {
            return Err(PipelineError::NoCandidates);
        }

        let presentable = presentable_formats(&candidates, self.limits.choice_size_ceiling_bytes);
        let auto_pick = select_best_format(&info.formats, self.limits.quality_cap);

        let title: String = info
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("video")
            .chars()
            .take(config::download::MAX_TITLE_CHARS)
            .collect();

        log::info!(
            "Catalog for {}: {} candidates, {} presentable, auto pick {}, duration {}s",
            url,
            candidates.len(),
            presentable.len(),
            auto_pick,
            duration_secs
        );

        Ok(CatalogEntry {
            url,
            title,
            duration_secs,
            candidates,
            presentable,
            auto_pick,
            long_running,
        })
    }
}

/// Rejects sources above the hard ceiling; returns whether the advisory applies.
///
/// Compares the unrounded duration, so 7200.4 s is already over a 7200 s ceiling.
pub fn check_duration(duration: f64, limits: &Limits) -> Result<bool, PipelineError> {
    if duration > limits.max_duration_secs as f64 {
        return Err(PipelineError::DurationExceeded {
            duration: duration.ceil() as u64,
            limit: limits.max_duration_secs,
        });
    }
    Ok(duration > limits.long_video_secs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MB: u64 = 1024 * 1024;

    fn video(id: &str, note: &str, height: u64, ext: &str, size: Option<u64>) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: Some(ext.to_string()),
            vcodec: Some("avc1.64001F".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            format_note: Some(note.to_string()),
            height: Some(height),
            filesize: size,
            ..Default::default()
        }
    }

    fn audio(id: &str, abr: f64, size: Option<u64>) -> RawFormat {
        RawFormat {
            format_id: id.to_string(),
            ext: Some("m4a".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            abr: Some(abr),
            filesize: size,
            ..Default::default()
        }
    }

    fn labels(choices: &[PresentedChoice]) -> Vec<String> {
        choices
            .iter()
            .map(|c| match c {
                PresentedChoice::Format(f) => f.label.clone(),
                PresentedChoice::Auto => "Auto".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_storyboards_are_not_candidates() {
        let storyboard = RawFormat {
            format_id: "sb0".to_string(),
            vcodec: Some("none".to_string()),
            acodec: Some("none".to_string()),
            ..Default::default()
        };
        let candidates = build_candidates(&[storyboard, audio("140", 129.6, Some(MB))]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MediaKind::Audio);
        assert_eq!(candidates[0].label, "130 kbps");
    }

    #[test]
    fn test_three_mp4_videos_present_in_order_with_auto() {
        let formats = vec![
            video("22", "720p", 720, "mp4", Some(20 * MB)),
            video("59", "480p", 480, "mp4", Some(12 * MB)),
            video("18", "360p", 360, "mp4", Some(8 * MB)),
        ];
        let candidates = build_candidates(&formats);
        let choices = presentable_formats(&candidates, 500 * MB);
        assert_eq!(labels(&choices), vec!["720p", "480p", "360p", "Auto"]);
        assert_eq!(select_best_format(&formats, 1080), "22");
    }

    #[test]
    fn test_presentable_caps_and_dedups_by_kind() {
        let formats = vec![
            audio("139", 48.0, Some(MB)),
            video("a", "1080p", 1080, "webm", Some(90 * MB)),
            video("b", "1080p", 1080, "mp4", Some(95 * MB)),
            video("c", "720p", 720, "mp4", Some(40 * MB)),
            video("d", "480p", 480, "mp4", Some(20 * MB)),
            video("e", "360p", 360, "mp4", Some(10 * MB)),
            video("f", "240p", 240, "mp4", Some(5 * MB)),
            audio("140", 128.0, Some(3 * MB)),
            audio("251", 160.0, Some(4 * MB)),
        ];
        let choices = presentable_formats(&build_candidates(&formats), 500 * MB);
        assert_eq!(
            labels(&choices),
            vec!["1080p", "720p", "480p", "360p", "48 kbps", "128 kbps", "Auto"]
        );
        assert_eq!(choices[0].choice(), Choice::Format("a".to_string()));
    }

    #[test]
    fn test_presentable_drops_unknown_and_oversized() {
        let formats = vec![
            video("big", "2160p", 2160, "mp4", Some(900 * MB)),
            video("unknown", "720p", 720, "mp4", None),
            video("ok", "480p", 480, "mp4", Some(30 * MB)),
        ];
        let choices = presentable_formats(&build_candidates(&formats), 500 * MB);
        assert_eq!(labels(&choices), vec!["480p", "Auto"]);
    }

    #[test]
    fn test_auto_pick_respects_quality_cap() {
        let formats = vec![
            video("4k", "2160p", 2160, "mp4", None),
            video("hd", "1080p", 1080, "mp4", None),
            video("sd", "720p", 720, "mp4", None),
        ];
        assert_eq!(select_best_format(&formats, 1080), "hd");
        assert_eq!(select_best_format(&formats, 720), "sd");
        assert_eq!(select_best_format(&formats, 240), FALLBACK_FORMAT_ID);
    }

    #[test]
    fn test_auto_pick_skips_video_only_and_other_containers() {
        let mut video_only = video("137", "1080p", 1080, "mp4", None);
        video_only.acodec = Some("none".to_string());
        let formats = vec![video_only, video("248", "1080p", 1080, "webm", None)];
        assert_eq!(select_best_format(&formats, 1080), FALLBACK_FORMAT_ID);

        let formats = vec![
            video("137", "1080p", 1080, "webm", None),
            video("18", "360p", 360, "mp4", None),
        ];
        assert_eq!(select_best_format(&formats, 1080), "18");
    }

    #[test]
    fn test_auto_pick_reads_height_from_note() {
        let mut format = video("x", "720p60", 0, "mp4", None);
        format.height = None;
        assert_eq!(select_best_format(&[format], 1080), "x");
    }

    #[test]
    fn test_auto_pick_first_occurrence_wins_ties() {
        let formats = vec![
            video("first", "720p", 720, "mp4", None),
            video("second", "720p", 720, "mp4", None),
        ];
        assert_eq!(select_best_format(&formats, 1080), "first");
    }

    #[test]
    fn test_duration_policy_boundaries() {
        let limits = Limits::default();
        assert!(matches!(
            check_duration(7201.0, &limits),
            Err(PipelineError::DurationExceeded { duration: 7201, limit: 7200 })
        ));
        assert!(matches!(
            check_duration(7200.4, &limits),
            Err(PipelineError::DurationExceeded { duration: 7201, limit: 7200 })
        ));
        assert_eq!(check_duration(7200.0, &limits), Ok(true));
        assert_eq!(check_duration(1801.0, &limits), Ok(true));
        assert_eq!(check_duration(1800.4, &limits), Ok(true));
        assert_eq!(check_duration(1800.0, &limits), Ok(false));
        assert_eq!(check_duration(1799.0, &limits), Ok(false));
        assert_eq!(check_duration(0.0, &limits), Ok(false));
    }

    #[test]
    fn test_choice_labels() {
        assert_eq!(PresentedChoice::Auto.label(), "⚡ Auto Select Best");
        assert_eq!(PresentedChoice::Auto.choice(), Choice::Auto);
        let candidates = build_candidates(&[audio("140", 128.0, Some(MB))]);
        assert_eq!(PresentedChoice::Format(candidates[0].clone()).label(), "🔊 Audio (128 kbps)");
    }
}
