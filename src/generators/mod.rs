//! Library path generators driven by per-show naming templates.

pub mod filename;
pub mod folder;
