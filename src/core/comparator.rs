//! Quality comparator.
//!
//! Pure, deterministic comparison of two file quality profiles against an
//! ordered factor priority list. The first factor on which the profiles
//! differ decides the winner; a full tie keeps the incumbent. The point
//! weights attached to priority positions are display metadata only and
//! take no part in the arithmetic here.

use crate::models::quality::{
    CodecPreferences, QualityFactor, QualityPriorityList, QualityProfile,
};

/// Which side of a comparison won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Candidate,
    Incumbent,
    Tie,
}

/// Outcome of comparing a candidate file against an incumbent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub winner: Winner,
    /// Factor that decided the comparison; None on a full tie.
    pub deciding_factor: Option<QualityFactor>,
}

impl Comparison {
    /// Whether the candidate should replace the incumbent.
    /// Equals are never replaced (stability policy).
    pub fn candidate_wins(&self) -> bool {
        self.winner == Winner::Candidate
    }
}

/// Compare `candidate` against `incumbent` under the given priority list.
///
/// A missing value for a factor ranks below any known value, so a file
/// lacking codec information never beats one that has it, while two files
/// both lacking it tie on that factor and cascade to the next.
pub fn compare(
    candidate: &QualityProfile,
    incumbent: &QualityProfile,
    priority: &QualityPriorityList,
    codecs: &CodecPreferences,
) -> Comparison {
    for factor in priority.factors() {
        let ordering = compare_factor(candidate, incumbent, factor, codecs);
        match ordering {
            std::cmp::Ordering::Greater => {
                return Comparison {
                    winner: Winner::Candidate,
                    deciding_factor: Some(factor),
                }
            }
            std::cmp::Ordering::Less => {
                return Comparison {
                    winner: Winner::Incumbent,
                    deciding_factor: Some(factor),
                }
            }
            std::cmp::Ordering::Equal => continue,
        }
    }

    Comparison {
        winner: Winner::Tie,
        deciding_factor: None,
    }
}

/// Compare one factor. Greater means the candidate is better.
fn compare_factor(
    candidate: &QualityProfile,
    incumbent: &QualityProfile,
    factor: QualityFactor,
    codecs: &CodecPreferences,
) -> std::cmp::Ordering {
    match factor {
        QualityFactor::Resolution => candidate.resolution.cmp(&incumbent.resolution),
        QualityFactor::Bitrate => candidate.bitrate_kbps.cmp(&incumbent.bitrate_kbps),
        QualityFactor::VideoCodec => codecs
            .video_rank(candidate.video_codec.as_deref())
            .cmp(&codecs.video_rank(incumbent.video_codec.as_deref())),
        QualityFactor::AudioCodec => codecs
            .audio_rank(candidate.audio_codec.as_deref())
            .cmp(&codecs.audio_rank(incumbent.audio_codec.as_deref())),
        QualityFactor::AudioChannels => candidate.audio_channels.cmp(&incumbent.audio_channels),
        QualityFactor::Subtitles => candidate.has_subtitles.cmp(&incumbent.has_subtitles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quality::Resolution;

    fn profile() -> QualityProfile {
        QualityProfile {
            resolution: Some(Resolution::P1080),
            bitrate_kbps: Some(8000),
            video_codec: Some("h264".to_string()),
            audio_codec: Some("ac3".to_string()),
            audio_channels: Some(6),
            has_subtitles: false,
        }
    }

    #[test]
    fn test_reflexive_tie() {
        let p = profile();
        let result = compare(
            &p,
            &p,
            &QualityPriorityList::default(),
            &CodecPreferences::default(),
        );
        assert_eq!(result.winner, Winner::Tie);
        assert_eq!(result.deciding_factor, None);
    }

    #[test]
    fn test_first_decisive_factor_wins() {
        // Priority [resolution, bitrate]: candidate has better resolution
        // but worse bitrate; resolution decides.
        let candidate = QualityProfile {
            resolution: Some(Resolution::P2160),
            bitrate_kbps: Some(4000),
            ..profile()
        };
        let incumbent = QualityProfile {
            resolution: Some(Resolution::P1080),
            bitrate_kbps: Some(9000),
            ..profile()
        };
        let result = compare(
            &candidate,
            &incumbent,
            &QualityPriorityList::default(),
            &CodecPreferences::default(),
        );
        assert_eq!(result.winner, Winner::Candidate);
        assert_eq!(result.deciding_factor, Some(QualityFactor::Resolution));
    }

    #[test]
    fn test_codec_decides_on_resolution_tie() {
        // 1080p/H264/8000kbps incumbent vs 1080p/H265/6000kbps
        // candidate under [resolution, video_codec, bitrate, ...].
        let order = [
            QualityFactor::Resolution,
            QualityFactor::VideoCodec,
            QualityFactor::Bitrate,
            QualityFactor::AudioCodec,
            QualityFactor::AudioChannels,
            QualityFactor::Subtitles,
        ];
        let priority = QualityPriorityList::new(order).unwrap();
        let incumbent = profile();
        let candidate = QualityProfile {
            video_codec: Some("h265".to_string()),
            bitrate_kbps: Some(6000),
            ..profile()
        };
        let result = compare(&candidate, &incumbent, &priority, &CodecPreferences::default());
        assert_eq!(result.winner, Winner::Candidate);
        assert_eq!(result.deciding_factor, Some(QualityFactor::VideoCodec));
    }

    #[test]
    fn test_missing_value_never_beats_known() {
        let candidate = QualityProfile {
            video_codec: None,
            ..profile()
        };
        let incumbent = profile();
        let order = [
            QualityFactor::VideoCodec,
            QualityFactor::Resolution,
            QualityFactor::Bitrate,
            QualityFactor::AudioCodec,
            QualityFactor::AudioChannels,
            QualityFactor::Subtitles,
        ];
        let priority = QualityPriorityList::new(order).unwrap();
        let result = compare(&candidate, &incumbent, &priority, &CodecPreferences::default());
        assert_eq!(result.winner, Winner::Incumbent);
        assert_eq!(result.deciding_factor, Some(QualityFactor::VideoCodec));
    }

    #[test]
    fn test_both_missing_ties_on_factor() {
        let candidate = QualityProfile {
            video_codec: None,
            bitrate_kbps: Some(9000),
            ..profile()
        };
        let incumbent = QualityProfile {
            video_codec: None,
            ..profile()
        };
        let order = [
            QualityFactor::VideoCodec,
            QualityFactor::Bitrate,
            QualityFactor::Resolution,
            QualityFactor::AudioCodec,
            QualityFactor::AudioChannels,
            QualityFactor::Subtitles,
        ];
        let priority = QualityPriorityList::new(order).unwrap();
        let result = compare(&candidate, &incumbent, &priority, &CodecPreferences::default());
        // Cascades past the shared unknown codec to bitrate.
        assert_eq!(result.winner, Winner::Candidate);
        assert_eq!(result.deciding_factor, Some(QualityFactor::Bitrate));
    }

    #[test]
    fn test_single_differing_factor_decides_anywhere_in_list() {
        // The subtitles factor is last in the default priority order but
        // still decides when everything else ties.
        let candidate = QualityProfile {
            has_subtitles: true,
            ..profile()
        };
        let incumbent = profile();
        let result = compare(
            &candidate,
            &incumbent,
            &QualityPriorityList::default(),
            &CodecPreferences::default(),
        );
        assert_eq!(result.winner, Winner::Candidate);
        assert_eq!(result.deciding_factor, Some(QualityFactor::Subtitles));
    }
}
