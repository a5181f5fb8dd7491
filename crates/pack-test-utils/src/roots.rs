//! [`TestRoots`]: one temporary directory holding every sandbox root.

use std::fs;
use std::path::{Path, PathBuf};

use pack_fs::{PathRoots, PathSandbox, Root};
use tempfile::TempDir;

/// A temporary directory with a subdirectory per sandbox root.
///
/// ```rust,no_run
/// use pack_test_utils::TestRoots;
///
/// let roots = TestRoots::new();
/// roots.write("instance/mods/a.jar", "jar");
/// let sandbox = roots.sandbox();
/// ```
pub struct TestRoots {
    temp_dir: TempDir,
}

impl Default for TestRoots {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRoots {
    /// Create `downloads`, `instance`, `install`, `appdata` and `synchrony`
    /// under a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for name in ["downloads", "instance", "install", "appdata", "synchrony"] {
            fs::create_dir_all(temp_dir.path().join(name)).unwrap();
        }
        Self { temp_dir }
    }

    /// The temporary directory containing the roots.
    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of one root directory.
    pub fn root(&self, root: Root) -> PathBuf {
        let name = match root {
            Root::Downloads => "downloads",
            Root::Instance => "instance",
            Root::Install => "install",
            Root::AppData => "appdata",
            Root::Synchrony => "synchrony",
        };
        self.base().join(name)
    }

    pub fn path_roots(&self) -> PathRoots {
        PathRoots::new(
            self.root(Root::Downloads),
            self.root(Root::Instance),
            self.root(Root::Install),
            self.root(Root::AppData),
            self.root(Root::Synchrony),
        )
    }

    pub fn sandbox(&self) -> PathSandbox {
        PathSandbox::new(self.path_roots())
    }

    /// Write `content` at `path` relative to the base, creating parents.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.base().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Read the file at `path` relative to the base.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.base().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.base().join(path).exists()
    }
}
