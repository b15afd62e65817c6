//! Filename parser for scene-style release names.
//!
//! A deterministic grammar extracts season/episode numbers and quality
//! tokens. Recognized episode layouts, tried in order of specificity:
//! - `SxxEyy` ("Show.S02E05.1080p.WEB.mkv")
//! - `NxNN` ("Show 2x05.mkv")
//! - `Season N ... Episode M`
//! - absolute numbering ("Show - 117.mkv") with the season taken from a
//!   `Season N` parent folder
//!
//! Anything else is ambiguous and returns `None`; the caller routes the
//! file to Issues as unmatched rather than guessing.

use crate::models::quality::{QualityProfile, Resolution};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Season/episode numbers parsed from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeNumbers {
    pub season: u16,
    pub episode: u16,
}

/// Title and optional year parsed from a library subfolder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderName {
    pub title: String,
    pub year: Option<u16>,
}

fn sxxeyy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[Ss](\d{1,2})[Ee](\d{1,3})").unwrap())
}

fn nxnn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap())
}

fn verbose_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Season\s*(\d{1,2}).*?Episode\s*(\d{1,3})").unwrap())
}

fn absolute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[-_\s]\s*(\d{1,3})\s*(?:\.[a-z0-9]+)?$").unwrap())
}

fn season_folder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^Season\s*(\d{1,2})$|^S(\d{1,2})$").unwrap())
}

/// Parse season/episode numbers from a filename, consulting the parent
/// folder for absolute-numbered layouts.
pub fn parse_episode_numbers(path: &Path) -> Option<EpisodeNumbers> {
    let filename = path.file_name()?.to_string_lossy();
    let stem = path.file_stem()?.to_string_lossy();

    if let Some(caps) = sxxeyy_re().captures(&filename) {
        let season = caps.get(1)?.as_str().parse().ok()?;
        let episode = caps.get(2)?.as_str().parse().ok()?;
        return Some(EpisodeNumbers { season, episode });
    }

    if let Some(caps) = nxnn_re().captures(&filename) {
        let season = caps.get(1)?.as_str().parse().ok()?;
        let episode = caps.get(2)?.as_str().parse().ok()?;
        return Some(EpisodeNumbers { season, episode });
    }

    if let Some(caps) = verbose_re().captures(&filename) {
        let season = caps.get(1)?.as_str().parse().ok()?;
        let episode = caps.get(2)?.as_str().parse().ok()?;
        return Some(EpisodeNumbers { season, episode });
    }

    // Absolute numbering needs a season from the parent folder; a bare
    // trailing number with no season context stays ambiguous.
    let season = parent_season(path)?;
    if let Some(caps) = absolute_re().captures(&stem) {
        let episode: u16 = caps.get(1)?.as_str().parse().ok()?;
        // A trailing 4-digit-looking year fragment never reaches here
        // (capture is capped at 3 digits), but 0 is never an episode.
        if episode == 0 {
            return None;
        }
        return Some(EpisodeNumbers { season, episode });
    }

    None
}

/// Extract the show-name portion of a filename: the text before the
/// first recognized episode-number token, cleaned of separators.
pub fn parse_show_name(filename: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)^(?P<name>.+?)[\s._-]*(?:[Ss]\d{1,2}[Ee]\d{1,3}|\b\d{1,2}x\d{2,3}\b|Season\s*\d{1,2})")
            .unwrap()
    });
    let caps = re.captures(filename)?;
    let name = caps["name"].replace(['.', '_'], " ");
    let name = name.trim().trim_end_matches('-').trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Normalize a show name for matching: lowercase, articles and
/// punctuation stripped.
pub fn normalize_show_name(name: &str) -> String {
    let mut normalized = name.to_lowercase();
    for article in ["the ", "a ", "an "] {
        if normalized.starts_with(article) {
            normalized = normalized[article.len()..].to_string();
        }
    }
    normalized
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Season number from a `Season N` / `SN` parent folder, if present.
fn parent_season(path: &Path) -> Option<u16> {
    let parent = path.parent()?.file_name()?.to_string_lossy().to_string();
    let caps = season_folder_re().captures(parent.trim())?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    digits.as_str().parse().ok()
}

/// Extract a quality profile from quality tokens in a filename.
///
/// Used when no probe data is available; every field is best-effort.
pub fn parse_quality(filename: &str) -> QualityProfile {
    let upper = filename.to_uppercase();
    let mut quality = QualityProfile::default();

    static RES_RE: OnceLock<Regex> = OnceLock::new();
    let res_re =
        RES_RE.get_or_init(|| Regex::new(r"(?i)(2160p|1080p|720p|576p|480p|4K|UHD)").unwrap());
    if let Some(caps) = res_re.captures(filename) {
        quality.resolution = Resolution::parse(caps.get(1).unwrap().as_str());
    }

    if upper.contains("X265") || upper.contains("H265") || upper.contains("H.265") || upper.contains("HEVC")
    {
        quality.video_codec = Some("hevc".to_string());
    } else if upper.contains("X264") || upper.contains("H264") || upper.contains("H.264") {
        quality.video_codec = Some("h264".to_string());
    } else if upper.contains("AV1") {
        quality.video_codec = Some("av1".to_string());
    } else if upper.contains("XVID") {
        quality.video_codec = Some("xvid".to_string());
    }

    if upper.contains("TRUEHD") {
        quality.audio_codec = Some("truehd".to_string());
    } else if upper.contains("DTS-HD") || upper.contains("DTSHD") {
        quality.audio_codec = Some("dts-hd".to_string());
    } else if upper.contains("DTS") {
        quality.audio_codec = Some("dts".to_string());
    } else if upper.contains("EAC3") || upper.contains("DDP") || upper.contains("DD+") {
        quality.audio_codec = Some("eac3".to_string());
    } else if upper.contains("AC3") || upper.contains("DD5") {
        quality.audio_codec = Some("ac3".to_string());
    } else if upper.contains("AAC") {
        quality.audio_codec = Some("aac".to_string());
    }

    if upper.contains("7.1") || upper.contains("7 1CH") {
        quality.audio_channels = Some(8);
    } else if upper.contains("5.1") || upper.contains("DDP5") || upper.contains("DD5") {
        quality.audio_channels = Some(6);
    } else if upper.contains("2.0") || upper.contains("STEREO") {
        quality.audio_channels = Some(2);
    }

    quality.has_subtitles =
        upper.contains("SUBBED") || upper.contains("MULTI-SUB") || upper.contains("MULTISUB");

    quality
}

/// Parse a library subfolder name into a show title and optional year.
///
/// Recognizes "Title (2016)" and "Title.2016" style names; otherwise the
/// whole name is the title.
pub fn parse_show_folder(name: &str) -> FolderName {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?P<title>.+?)[\s.]*[\(\[.]?(?P<year>19\d{2}|20\d{2})[\)\]]?$").unwrap()
    });

    if let Some(caps) = re.captures(name.trim()) {
        let title = caps["title"].replace('.', " ").trim().to_string();
        let year = caps["year"].parse().ok();
        if !title.is_empty() {
            return FolderName { title, year };
        }
    }

    FolderName {
        title: name.replace('.', " ").trim().to_string(),
        year: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sxxeyy() {
        let path = PathBuf::from("/in/Chicago.Fire.S14E08.1080p.WEB.h264-ETHEL.mkv");
        let numbers = parse_episode_numbers(&path).unwrap();
        assert_eq!(numbers.season, 14);
        assert_eq!(numbers.episode, 8);
    }

    #[test]
    fn test_nxnn() {
        let path = PathBuf::from("/in/Show 2x05.mkv");
        let numbers = parse_episode_numbers(&path).unwrap();
        assert_eq!(numbers.season, 2);
        assert_eq!(numbers.episode, 5);
    }

    #[test]
    fn test_verbose() {
        let path = PathBuf::from("/in/Show Season 3 Episode 12.mkv");
        let numbers = parse_episode_numbers(&path).unwrap();
        assert_eq!(numbers.season, 3);
        assert_eq!(numbers.episode, 12);
    }

    #[test]
    fn test_absolute_with_season_folder() {
        let path = PathBuf::from("/library/Show/Season 02/Show - 117.mkv");
        let numbers = parse_episode_numbers(&path).unwrap();
        assert_eq!(numbers.season, 2);
        assert_eq!(numbers.episode, 117);
    }

    #[test]
    fn test_absolute_without_season_folder_is_ambiguous() {
        let path = PathBuf::from("/in/Show - 117.mkv");
        assert_eq!(parse_episode_numbers(&path), None);
    }

    #[test]
    fn test_unparseable() {
        let path = PathBuf::from("/in/definitely-not-an-episode.mkv");
        assert_eq!(parse_episode_numbers(&path), None);
    }

    #[test]
    fn test_parse_quality_tokens() {
        let quality = parse_quality("Show.S01E01.2160p.WEB-DL.DDP5.1.HEVC-GROUP.mkv");
        assert_eq!(quality.resolution, Some(Resolution::P2160));
        assert_eq!(quality.video_codec.as_deref(), Some("hevc"));
        assert_eq!(quality.audio_codec.as_deref(), Some("eac3"));
        assert_eq!(quality.audio_channels, Some(6));
    }

    #[test]
    fn test_parse_show_name() {
        assert_eq!(
            parse_show_name("Chicago.Fire.S14E08.1080p.WEB.h264-ETHEL.mkv").as_deref(),
            Some("Chicago Fire")
        );
        assert_eq!(parse_show_name("Show 2x05.mkv").as_deref(), Some("Show"));
        assert_eq!(parse_show_name("S01E01.mkv"), None);
    }

    #[test]
    fn test_normalize_show_name() {
        assert_eq!(normalize_show_name("The Office (US)"), "office us");
        assert_eq!(normalize_show_name("Chicago.Fire"), "chicagofire");
        assert_eq!(normalize_show_name("Chicago Fire"), "chicago fire");
    }

    #[test]
    fn test_parse_show_folder() {
        let parsed = parse_show_folder("Severance (2022)");
        assert_eq!(parsed.title, "Severance");
        assert_eq!(parsed.year, Some(2022));

        let parsed = parse_show_folder("The.Expanse.2015");
        assert_eq!(parsed.title, "The Expanse");
        assert_eq!(parsed.year, Some(2015));

        let parsed = parse_show_folder("Severance");
        assert_eq!(parsed.title, "Severance");
        assert_eq!(parsed.year, None);
    }
}
