//! Update-script compiler and interpreter for packsync.
//!
//! A pack's upstream changelist is a flat text file of version-pair headers
//! (`1.0.0 -> 1.1.0`) each followed by directive lines. This crate:
//!
//! - parses the changelist and assembles the directives needed to move from
//!   one version to another, routing through intermediate versions when no
//!   direct delta exists ([`Changelist`], [`find_route`]);
//! - tokenizes and executes directives against a [`pack_fs::PathSandbox`],
//!   reporting progress and failures to an [`EventSink`] ([`Interpreter`]).
//!
//! # Architecture
//!
//! ```text
//!   changelist text ──► Changelist::compile ──► Vec<directive>
//!                                                   │
//!                        Environment ◄──────► Interpreter ──► EventSink
//!                                                   │
//!                                  PathSandbox, Downloader, Decompressor
//! ```

pub mod capability;
pub mod changelist;
pub mod directive;
pub mod environment;
pub mod error;
pub mod event;
pub mod interpreter;
mod ops;
pub mod route;

pub use capability::{DecompressError, Decompressor, DownloadError, Downloader};
pub use changelist::{Changelist, compile};
pub use directive::{Directive, Opcode, argify};
pub use environment::Environment;
pub use error::{CompileError, ScriptError, ScriptFailure};
pub use event::{Event, EventKind, EventSink, Status, TracingSink};
pub use interpreter::{DEFAULT_MAX_IMPORT_DEPTH, Interpreter, RunReport};
pub use route::{VersionRoute, find_route};
