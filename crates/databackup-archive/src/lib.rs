#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Directory archiving for the backup pipeline.
//!
//! Layout: `archiver.rs` (the `Archiver` capability), `artifact.rs` (the
//! staged archive and its cleanup guard), `writer.rs` (zip implementation),
//! `error.rs`.

pub mod archiver;
pub mod artifact;
pub mod error;
pub mod writer;

pub use archiver::Archiver;
pub use artifact::{ARCHIVE_EXTENSION, ArchiveArtifact, ArtifactGuard, artifact_file_name};
pub use error::{ArchiveError, ArchiveResult};
pub use writer::{COMPRESSION_LEVEL, Clock, ZipArchiver};
