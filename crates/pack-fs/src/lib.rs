//! Sandboxed filesystem access for packsync
//!
//! Resolves symbolic path tokens (`$D/mods/foo.jar`) against a fixed set of
//! sandbox roots and provides the atomic I/O used by update scripts and the
//! configuration layer.

pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod sandbox;

pub use config::ConfigStore;
pub use error::{Error, Result, SandboxError};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
pub use sandbox::{NoVariables, PathRoots, PathSandbox, PathVariables, Root};
