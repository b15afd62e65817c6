//! Showkeeper Library
//!
//! A library reconciliation and file-resolution engine for self-hosted
//! TV libraries: it models which episodes should exist, watches a
//! download folder for candidate files, decides quality upgrades and
//! resolves everything through a reviewable action queue.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
