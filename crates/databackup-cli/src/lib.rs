#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line entry point for directory backups.
//!
//! Layout:
//! - `cli.rs`: argument parsing, settings layering, and the run sequence
//! - `error.rs`: usage/failure split and exit-code mapping
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod error;

pub use cli::{USAGE, run, run_with};
