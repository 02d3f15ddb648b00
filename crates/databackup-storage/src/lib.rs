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

//! Upload backends for staged archives.
//!
//! Layout: `uploader.rs` (capability traits and confirmations), `s3.rs`
//! (cold storage), `glacier.rs` (archive storage), `client.rs` (AWS
//! provider-chain config), `error.rs` (upload error taxonomy and
//! classification).

pub mod client;
pub mod error;
pub mod glacier;
pub mod s3;
pub mod uploader;

pub use client::load_sdk_config;
pub use error::{
    FailureClass, StorageResult, UploadError, UploadErrorKind, classify_error_code, classify_failure,
};
pub use glacier::{GlacierUploader, archive_description};
pub use s3::{S3Uploader, object_key};
pub use uploader::{ArchiveStorageUploader, ColdStorageUploader, DestinationKind, UploadConfirmation};
