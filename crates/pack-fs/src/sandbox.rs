//! Path sandbox for update scripts
//!
//! A path token is a `/`- or `\`-delimited string. Its first segment may name
//! a sandbox root (`$D`, `$I`, `$G`, `$A`, `$S`) or a path variable (`$name`,
//! or `$` followed by the name as the next segment). Every resolved path must
//! lie under one of the configured roots.

use std::path::{Component, Path, PathBuf};

use crate::error::SandboxError;
use crate::path::NormalizedPath;

/// The fixed set of named sandbox roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// `$D`: scratch space for downloads
    Downloads,
    /// `$I`: the pack instance directory
    Instance,
    /// `$G`: the game install directory
    Install,
    /// `$A`: the user's application data directory
    AppData,
    /// `$S`: packsync's own data directory
    Synchrony,
}

impl Root {
    pub const ALL: [Root; 5] = [
        Root::Downloads,
        Root::Instance,
        Root::Install,
        Root::AppData,
        Root::Synchrony,
    ];

    /// The token that selects this root in a path string.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Downloads => "$D",
            Self::Instance => "$I",
            Self::Install => "$G",
            Self::AppData => "$A",
            Self::Synchrony => "$S",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|root| root.token() == token)
    }
}

impl std::fmt::Display for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Downloads => "DOWNLOADS",
            Self::Instance => "INSTANCE",
            Self::Install => "INSTALL",
            Self::AppData => "APPDATA",
            Self::Synchrony => "SYNCHRONY",
        };
        f.write_str(name)
    }
}

/// Absolute directories bound to each [`Root`] for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRoots {
    downloads: PathBuf,
    instance: PathBuf,
    install: PathBuf,
    appdata: PathBuf,
    synchrony: PathBuf,
}

impl PathRoots {
    pub fn new(
        downloads: impl Into<PathBuf>,
        instance: impl Into<PathBuf>,
        install: impl Into<PathBuf>,
        appdata: impl Into<PathBuf>,
        synchrony: impl Into<PathBuf>,
    ) -> Self {
        Self {
            downloads: simplify(downloads.into()),
            instance: simplify(instance.into()),
            install: simplify(install.into()),
            appdata: simplify(appdata.into()),
            synchrony: simplify(synchrony.into()),
        }
    }

    /// Replace a single root binding.
    pub fn with_root(mut self, root: Root, path: impl Into<PathBuf>) -> Self {
        let path = simplify(path.into());
        match root {
            Root::Downloads => self.downloads = path,
            Root::Instance => self.instance = path,
            Root::Install => self.install = path,
            Root::AppData => self.appdata = path,
            Root::Synchrony => self.synchrony = path,
        }
        self
    }

    pub fn get(&self, root: Root) -> &Path {
        match root {
            Root::Downloads => &self.downloads,
            Root::Instance => &self.instance,
            Root::Install => &self.install,
            Root::AppData => &self.appdata,
            Root::Synchrony => &self.synchrony,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Root, &Path)> {
        Root::ALL.into_iter().map(move |root| (root, self.get(root)))
    }
}

fn simplify(path: PathBuf) -> PathBuf {
    dunce::simplified(&path).to_path_buf()
}

/// Lookup of `$name` path variables.
pub trait PathVariables {
    /// The string value of `name`, or `None` if it is unset or not a string.
    fn path_variable(&self, name: &str) -> Option<String>;
}

/// An empty variable scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVariables;

impl PathVariables for NoVariables {
    fn path_variable(&self, _name: &str) -> Option<String> {
        None
    }
}

impl PathVariables for serde_json::Map<String, serde_json::Value> {
    fn path_variable(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_str()).map(str::to_string)
    }
}

/// Resolves path tokens and enforces root containment.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    roots: PathRoots,
}

impl PathSandbox {
    pub fn new(roots: PathRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &PathRoots {
        &self.roots
    }

    /// Resolve a path token to an absolute path inside the sandbox.
    ///
    /// `..` segments are dropped. The result is checked with
    /// [`PathSandbox::check`] before it is returned.
    pub fn resolve(
        &self,
        token: &str,
        vars: &dyn PathVariables,
    ) -> Result<PathBuf, SandboxError> {
        let raw = token.trim();
        if raw.is_empty() {
            return Err(SandboxError::EmptyPath);
        }

        let normalized = NormalizedPath::new(raw);
        let mut segments = normalized.segments();

        let (base, rest): (PathBuf, Vec<&str>) = match segments.next() {
            Some(first) if first.starts_with('$') => {
                if let Some(root) = Root::from_token(first) {
                    (self.roots.get(root).to_path_buf(), segments.collect())
                } else if first == "$" {
                    let name = segments.next().ok_or(SandboxError::EmptyPath)?;
                    (variable_root(name, vars)?, segments.collect())
                } else {
                    (variable_root(&first[1..], vars)?, segments.collect())
                }
            }
            Some(first) => {
                let base = if normalized.is_absolute() {
                    PathBuf::from("/")
                } else {
                    PathBuf::new()
                };
                let mut rest = vec![first];
                rest.extend(segments);
                (base, rest)
            }
            None => return Err(SandboxError::EmptyPath),
        };

        let mut resolved = base;
        for segment in rest {
            resolved.push(segment);
        }

        tracing::trace!(token = raw, path = %resolved.display(), "resolved path token");
        self.check(&resolved)
    }

    /// Verify that an already-absolute path lies under a configured root.
    ///
    /// Paths containing `..` are rejected outright; `.` components are removed.
    pub fn check(&self, path: &Path) -> Result<PathBuf, SandboxError> {
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(SandboxError::escape(path));
        }
        let cleaned: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let cleaned = simplify(cleaned);

        if self.roots.iter().any(|(_, root)| {
            !root.as_os_str().is_empty() && cleaned.starts_with(root)
        }) {
            Ok(cleaned)
        } else {
            Err(SandboxError::escape(cleaned))
        }
    }

    /// Resolve a path that a directive will remove or overwrite.
    ///
    /// Same as [`PathSandbox::resolve`], except that a root directory itself
    /// is refused: `delete $I` or `move $A x` never touch a whole root.
    pub fn resolve_target(
        &self,
        token: &str,
        vars: &dyn PathVariables,
    ) -> Result<PathBuf, SandboxError> {
        let path = self.resolve(token, vars)?;
        match self
            .roots
            .iter()
            .find(|(_, root)| !root.as_os_str().is_empty() && *root == path.as_path())
        {
            Some((root, _)) => Err(SandboxError::RootTarget { root }),
            None => Ok(path),
        }
    }

    /// Scratch directory for one download, under the downloads root.
    pub fn scratch_dir(&self, name: &str) -> PathBuf {
        self.roots.get(Root::Downloads).join(name)
    }
}

fn variable_root(name: &str, vars: &dyn PathVariables) -> Result<PathBuf, SandboxError> {
    if name.is_empty() {
        return Err(SandboxError::EmptyPath);
    }
    vars.path_variable(name)
        .map(PathBuf::from)
        .ok_or_else(|| SandboxError::UndefinedVariable {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> PathRoots {
        PathRoots::new(
            "/sandbox/downloads",
            "/sandbox/instance",
            "/sandbox/install",
            "/sandbox/appdata",
            "/sandbox/synchrony",
        )
    }

    #[test]
    fn test_root_tokens_round_trip() {
        for root in Root::ALL {
            assert_eq!(Root::from_token(root.token()), Some(root));
        }
        assert_eq!(Root::from_token("$X"), None);
    }

    #[test]
    fn test_resolve_each_root() {
        let sandbox = PathSandbox::new(roots());
        let path = sandbox.resolve("$G/mods/a.jar", &NoVariables).unwrap();
        assert_eq!(path, PathBuf::from("/sandbox/install/mods/a.jar"));
        let path = sandbox.resolve("$S\\cache\\x", &NoVariables).unwrap();
        assert_eq!(path, PathBuf::from("/sandbox/synchrony/cache/x"));
    }

    #[test]
    fn test_bare_root_token_resolves_to_root() {
        let sandbox = PathSandbox::new(roots());
        let path = sandbox.resolve("$I", &NoVariables).unwrap();
        assert_eq!(path, PathBuf::from("/sandbox/instance"));
    }

    #[test]
    fn test_target_refuses_roots() {
        let sandbox = PathSandbox::new(roots());
        assert_eq!(
            sandbox.resolve_target("$I", &NoVariables),
            Err(SandboxError::RootTarget {
                root: Root::Instance
            })
        );
        assert_eq!(
            sandbox.resolve_target("$I/..", &NoVariables),
            Err(SandboxError::RootTarget {
                root: Root::Instance
            })
        );
        assert_eq!(
            sandbox.resolve_target("/sandbox/appdata/", &NoVariables),
            Err(SandboxError::RootTarget {
                root: Root::AppData
            })
        );
        assert_eq!(
            sandbox.resolve_target("$I/mods", &NoVariables).unwrap(),
            PathBuf::from("/sandbox/instance/mods")
        );
    }

    #[test]
    fn test_with_root_overrides_binding() {
        let roots = roots().with_root(Root::Install, "/games/mc");
        assert_eq!(roots.get(Root::Install), Path::new("/games/mc"));
    }

    #[test]
    fn test_check_rejects_parent_components() {
        let sandbox = PathSandbox::new(roots());
        let err = sandbox
            .check(Path::new("/sandbox/instance/../../etc"))
            .unwrap_err();
        assert!(matches!(err, SandboxError::Escape { .. }));
    }

    #[test]
    fn test_check_is_component_wise() {
        let sandbox = PathSandbox::new(roots());
        assert!(sandbox.check(Path::new("/sandbox/instance-evil/x")).is_err());
        assert!(sandbox.check(Path::new("/sandbox/instance/./x")).is_ok());
    }
}
