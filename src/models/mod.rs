//! Data models for shows, episodes, quality, actions and logs.

pub mod action;
pub mod config;
pub mod episode;
pub mod log;
pub mod quality;
pub mod show;
