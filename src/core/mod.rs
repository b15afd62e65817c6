//! Core engine: quality comparison, episode expectation, file ingestion,
//! the action queue, scan orchestration and the watcher supervisor.

pub mod actions;
pub mod comparator;
pub mod expectation;
pub mod ingestion;
pub mod parser;
pub mod scanner;
pub mod supervisor;
