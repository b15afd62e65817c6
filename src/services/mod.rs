//! External collaborator contracts: metadata providers and the
//! filesystem-event source.

pub mod events;
pub mod provider;
pub mod tmdb;
