//! Episode filename generator.
//!
//! Renders a show's episode-filename template. Supported placeholders:
//! `{show}`, `{season}`, `{season:02}`, `{episode}`, `{episode:02}`,
//! `{title}`, `{resolution}`.

use crate::models::episode::Episode;
use crate::models::quality::QualityProfile;
use crate::models::show::Show;

/// Render the full episode filename, including extension.
pub fn generate_episode_filename(
    show: &Show,
    episode: &Episode,
    quality: Option<&QualityProfile>,
    extension: &str,
) -> String {
    let resolution = quality
        .and_then(|q| q.resolution)
        .map(|r| r.to_string())
        .unwrap_or_default();

    let rendered = render_template(
        &show.formats.episode_filename,
        show,
        episode.season,
        episode.number,
        &episode.title,
        &resolution,
    );

    format!("{}.{}", sanitize_filename(rendered.trim().trim_end_matches('-').trim()), extension)
}

/// Render a naming template against show/episode fields.
pub fn render_template(
    template: &str,
    show: &Show,
    season: u16,
    episode: u16,
    title: &str,
    resolution: &str,
) -> String {
    template
        .replace("{show}", &show.title)
        .replace("{season:02}", &format!("{:02}", season))
        .replace("{season}", &season.to_string())
        .replace("{episode:02}", &format!("{:02}", episode))
        .replace("{episode}", &episode.to_string())
        .replace("{title}", title)
        .replace("{resolution}", resolution)
}

/// Sanitize a string for use in filenames.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::episode::FileStatus;
    use std::path::PathBuf;

    fn fixture() -> (Show, Episode) {
        let show = Show::new("Severance", PathBuf::from("/library/Severance"));
        let episode = Episode {
            show_id: show.id.clone(),
            season: 1,
            number: 2,
            title: "Half Loop".to_string(),
            air_date: None,
            status: FileStatus::Missing,
            file_path: None,
            quality: None,
            is_ignored: false,
            is_special: false,
        };
        (show, episode)
    }

    #[test]
    fn test_default_template() {
        let (show, episode) = fixture();
        let name = generate_episode_filename(&show, &episode, None, "mkv");
        assert_eq!(name, "Severance - S01E02 - Half Loop.mkv");
    }

    #[test]
    fn test_sanitizes_separators() {
        let (show, mut episode) = fixture();
        episode.title = "Who: Are/You?".to_string();
        let name = generate_episode_filename(&show, &episode, None, "mkv");
        assert!(!name.contains('/'));
        assert!(!name.contains('?'));
        assert!(name.contains("Who_ Are_You_"));
    }
}
