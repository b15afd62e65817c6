//! Quality profile and priority list models.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// The six comparable quality factors, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFactor {
    Resolution,
    Bitrate,
    VideoCodec,
    AudioCodec,
    AudioChannels,
    Subtitles,
}

impl QualityFactor {
    /// All factors, used for priority-list validation.
    pub const ALL: [QualityFactor; 6] = [
        QualityFactor::Resolution,
        QualityFactor::Bitrate,
        QualityFactor::VideoCodec,
        QualityFactor::AudioCodec,
        QualityFactor::AudioChannels,
        QualityFactor::Subtitles,
    ];
}

impl std::fmt::Display for QualityFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QualityFactor::Resolution => "resolution",
            QualityFactor::Bitrate => "bitrate",
            QualityFactor::VideoCodec => "video_codec",
            QualityFactor::AudioCodec => "audio_codec",
            QualityFactor::AudioChannels => "audio_channels",
            QualityFactor::Subtitles => "subtitles",
        };
        write!(f, "{}", name)
    }
}

/// Resolution class mapped to a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Sd,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "2160p")]
    P2160,
}

impl Resolution {
    /// Parse a resolution token as found in filenames ("1080p", "4K", "UHD").
    pub fn parse(token: &str) -> Option<Resolution> {
        match token.to_lowercase().as_str() {
            "480p" | "576p" | "sd" => Some(Resolution::Sd),
            "720p" => Some(Resolution::P720),
            "1080p" => Some(Resolution::P1080),
            "2160p" | "4k" | "uhd" => Some(Resolution::P2160),
            _ => None,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Sd => write!(f, "SD"),
            Resolution::P720 => write!(f, "720p"),
            Resolution::P1080 => write!(f, "1080p"),
            Resolution::P2160 => write!(f, "2160p"),
        }
    }
}

/// Quality profile attached to a concrete file.
///
/// Fields are optional because they may come from filename parsing rather
/// than a real probe; a missing value ranks below any known value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Resolution class.
    pub resolution: Option<Resolution>,
    /// Overall bitrate in kbps.
    pub bitrate_kbps: Option<u32>,
    /// Video codec (e.g. "hevc", "h264").
    pub video_codec: Option<String>,
    /// Audio codec (e.g. "dts", "ac3", "aac").
    pub audio_codec: Option<String>,
    /// Audio channel count (e.g. 2, 6, 8).
    pub audio_channels: Option<u8>,
    /// Whether embedded or sidecar subtitles are present.
    pub has_subtitles: bool,
}

/// Point weights for priority positions 1..6. Display metadata only;
/// comparison cascades factor by factor and never sums points.
pub const PRIORITY_POINTS: [u32; 6] = [100, 80, 60, 40, 20, 10];

/// One position in the priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub factor: QualityFactor,
    pub points: u32,
}

/// Ordered, fixed-length permutation of the six quality factors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPriorityList {
    entries: Vec<PriorityEntry>,
}

impl QualityPriorityList {
    /// Build a priority list from a factor ordering, assigning the
    /// descending point weights to positions 1..6.
    pub fn new(order: [QualityFactor; 6]) -> Result<Self> {
        let entries = order
            .iter()
            .zip(PRIORITY_POINTS.iter())
            .map(|(&factor, &points)| PriorityEntry { factor, points })
            .collect();
        let list = Self { entries };
        list.validate()?;
        Ok(list)
    }

    /// Check that every factor appears exactly once.
    pub fn validate(&self) -> Result<()> {
        if self.entries.len() != 6 {
            return Err(Error::InvalidPriorityList(format!(
                "expected 6 factors, got {}",
                self.entries.len()
            )));
        }
        for factor in QualityFactor::ALL {
            let count = self.entries.iter().filter(|e| e.factor == factor).count();
            if count != 1 {
                return Err(Error::InvalidPriorityList(format!(
                    "factor {} appears {} times",
                    factor, count
                )));
            }
        }
        Ok(())
    }

    /// Factors in priority order.
    pub fn factors(&self) -> impl Iterator<Item = QualityFactor> + '_ {
        self.entries.iter().map(|e| e.factor)
    }

    /// Entries with their display points.
    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    /// Reorder the list. Points are reassigned by position.
    pub fn reorder(&mut self, order: [QualityFactor; 6]) -> Result<()> {
        *self = Self::new(order)?;
        Ok(())
    }
}

impl Default for QualityPriorityList {
    fn default() -> Self {
        Self::new(QualityFactor::ALL).expect("default factor order is a valid permutation")
    }
}

/// Codec preference orders used to map codec names to ordinals.
/// Earlier in the list means better; unlisted or missing codecs rank last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecPreferences {
    pub video: Vec<String>,
    pub audio: Vec<String>,
}

impl Default for CodecPreferences {
    fn default() -> Self {
        Self {
            video: ["av1", "hevc", "h265", "x265", "h264", "x264", "xvid"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            audio: ["truehd", "dts-hd", "dts", "eac3", "ac3", "aac", "mp3"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CodecPreferences {
    /// Ordinal for a video codec: higher is better, None for unknown.
    pub fn video_rank(&self, codec: Option<&str>) -> Option<usize> {
        rank_in(&self.video, codec)
    }

    /// Ordinal for an audio codec: higher is better, None for unknown.
    pub fn audio_rank(&self, codec: Option<&str>) -> Option<usize> {
        rank_in(&self.audio, codec)
    }
}

fn rank_in(order: &[String], codec: Option<&str>) -> Option<usize> {
    let codec = codec?.to_lowercase();
    order
        .iter()
        .position(|c| c.eq_ignore_ascii_case(&codec))
        .map(|pos| order.len() - pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        assert!(Resolution::Sd < Resolution::P720);
        assert!(Resolution::P720 < Resolution::P1080);
        assert!(Resolution::P1080 < Resolution::P2160);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!(Resolution::parse("1080p"), Some(Resolution::P1080));
        assert_eq!(Resolution::parse("4K"), Some(Resolution::P2160));
        assert_eq!(Resolution::parse("UHD"), Some(Resolution::P2160));
        assert_eq!(Resolution::parse("480p"), Some(Resolution::Sd));
        assert_eq!(Resolution::parse("wat"), None);
    }

    #[test]
    fn test_priority_list_points() {
        let list = QualityPriorityList::default();
        let points: Vec<u32> = list.entries().iter().map(|e| e.points).collect();
        assert_eq!(points, vec![100, 80, 60, 40, 20, 10]);
    }

    #[test]
    fn test_priority_list_rejects_duplicates() {
        let mut order = QualityFactor::ALL;
        order[1] = QualityFactor::Resolution;
        assert!(QualityPriorityList::new(order).is_err());
    }

    #[test]
    fn test_codec_rank() {
        let prefs = CodecPreferences::default();
        let hevc = prefs.video_rank(Some("HEVC"));
        let h264 = prefs.video_rank(Some("h264"));
        assert!(hevc > h264);
        assert_eq!(prefs.video_rank(Some("unheard-of")), None);
        assert_eq!(prefs.video_rank(None), None);
    }
}
