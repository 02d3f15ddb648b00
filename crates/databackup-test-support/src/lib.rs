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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (scratch directories, clocks, log capture), mocks.rs (recording capability fakes).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{capture_logger, fixed_instant, source_tree, stepping_clock, temp_dir};
pub use mocks::{
    ArchiveUpload, ColdUpload, RecordingArchiveStorage, RecordingArchiver, RecordingColdStorage,
};
