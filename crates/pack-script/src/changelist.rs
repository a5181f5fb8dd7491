//! Changelist parsing and compilation
//!
//! ```text
//! 1.0.0 -> 1.1.0
//! log `Updating to 1.1.0`
//! download $I/mods/foo.jar `https://example.com/foo.jar`
//! 1.1.0 -> 1.2.0
//! delete $I/mods/foo.jar
//! ```
//!
//! A line whose first character is an ASCII digit is a header. Every other
//! line belongs, verbatim, to the most recent header's bucket.

use indexmap::IndexMap;

use crate::error::CompileError;
use crate::route::find_route;

/// Parsed changelist: version-pair header to ordered directive lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelist {
    buckets: IndexMap<String, Vec<String>>,
}

impl Changelist {
    /// Partition changelist text into header buckets.
    ///
    /// Fails with [`CompileError::EmptyOrMalformedChangelist`] when the text
    /// holds no headers or a directive appears before the first header.
    pub fn parse(text: &str) -> Result<Self, CompileError> {
        if text.trim().is_empty() {
            return Err(CompileError::malformed("changelist is empty"));
        }

        let mut buckets: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut current: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.starts_with(|c: char| c.is_ascii_digit()) {
                let key = header_key(line);
                // a repeated header starts its bucket over
                buckets.insert(key.clone(), Vec::new());
                current = Some(key);
                continue;
            }

            match &current {
                Some(key) => {
                    if let Some(bucket) = buckets.get_mut(key) {
                        bucket.push(line.to_string());
                    }
                }
                None if line.trim().is_empty() => {}
                None => {
                    return Err(CompileError::malformed(format!(
                        "line {} appears before any version header",
                        index + 1
                    )));
                }
            }
        }

        tracing::debug!(headers = buckets.len(), "parsed changelist");
        Ok(Self { buckets })
    }

    /// Header keys in file order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// The directives listed under `from -> to`, if that header exists.
    pub fn bucket(&self, from: &str, to: &str) -> Option<&[String]> {
        self.buckets.get(&pair_key(from, to)).map(Vec::as_slice)
    }

    /// Every well-formed header as a `(from, to)` edge.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buckets.keys().filter_map(|key| split_header(key))
    }

    /// Assemble the directives that upgrade `old` to `new`.
    ///
    /// A direct `old -> new` header wins over any routed path. Otherwise the
    /// buckets along the shortest route are concatenated in route order.
    /// `old == new` without a direct header is already up to date and yields
    /// an empty list.
    pub fn compile(&self, old: &str, new: &str) -> Result<Vec<String>, CompileError> {
        if let Some(bucket) = self.bucket(old, new) {
            tracing::debug!(from = old, to = new, "direct changelist match");
            return Ok(bucket.to_vec());
        }
        if old == new {
            return Ok(Vec::new());
        }

        for key in self.buckets.keys() {
            if split_header(key).is_none() {
                tracing::warn!(header = %key, "ignoring malformed changelist header");
            }
        }

        let route = find_route(self.edges(), old, new).ok_or_else(|| {
            CompileError::NoRouteFound {
                from: old.to_string(),
                to: new.to_string(),
            }
        })?;
        tracing::debug!(route = ?route.versions(), "routed changelist");

        let mut directives = Vec::new();
        for (from, to) in route.hops() {
            if let Some(bucket) = self.bucket(from, to) {
                directives.extend(bucket.iter().cloned());
            }
        }
        Ok(directives)
    }
}

/// Parse `text` and compile the upgrade from `old` to `new` in one step.
pub fn compile(text: &str, old: &str, new: &str) -> Result<Vec<String>, CompileError> {
    Changelist::parse(text)?.compile(old, new)
}

fn pair_key(from: &str, to: &str) -> String {
    format!("{from} -> {to}")
}

fn header_key(line: &str) -> String {
    match split_header(line) {
        Some((from, to)) => pair_key(from, to),
        None => line.trim().to_string(),
    }
}

fn split_header(line: &str) -> Option<(&str, &str)> {
    let (from, to) = line.split_once("->")?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() || to.contains("->") {
        return None;
    }
    Some((from, to))
}
