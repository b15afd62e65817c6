//! Season folder generator.

use crate::generators::filename::{render_template, sanitize_filename};
use crate::models::show::Show;
use std::path::PathBuf;

/// Season folder name for a show, from its template.
pub fn generate_season_folder(show: &Show, season: u16) -> String {
    sanitize_filename(render_template(&show.formats.season_folder, show, season, 0, "", "").trim())
}

/// Full directory for a season under the show's library folder.
pub fn season_dir(show: &Show, season: u16) -> PathBuf {
    show.folder.join(generate_season_folder(show, season))
}
