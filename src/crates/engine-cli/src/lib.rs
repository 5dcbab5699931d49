//! # engine-cli
//!
//! A thin command-line front end for the [`engine`] crate: loads a workflow
//! configuration file, runs it to completion, and prints the resulting
//! summary. Scaffolding to make the engine crate runnable end to end; the
//! dispatch logic itself lives entirely in `engine`.

pub mod version;
