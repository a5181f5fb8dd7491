//! Shared test utilities for the packsync workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`roots`]: [`TestRoots`], a temporary directory per sandbox root
//! - [`sink`]: [`RecordingSink`], an event sink that keeps everything
//! - [`fakes`]: scripted [`FakeDownloader`] and [`FakeDecompressor`]

pub mod fakes;
pub mod roots;
pub mod sink;

pub use fakes::{FakeDecompressor, FakeDownloader};
pub use roots::TestRoots;
pub use sink::RecordingSink;
