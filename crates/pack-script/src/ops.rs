//! File and value operations behind the filesystem opcodes

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Result, ScriptError};

/// Apply `read` flags, in order, to text read from a file.
///
/// `l` folds CRLF to LF, `L` splits into an array of lines, `s` turns
/// backslashes into forward slashes and `J` parses JSON. After `L`, the
/// remaining flags apply to every line.
pub(crate) fn apply_read_flags(text: String, flags: &str) -> Result<Value> {
    let mut value = Value::String(text);
    for flag in flags.chars() {
        value = apply_flag(value, flag)?;
    }
    Ok(value)
}

fn apply_flag(value: Value, flag: char) -> Result<Value> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| apply_flag(item, flag))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::String(text) => match flag {
            'l' => Ok(Value::String(text.replace("\r\n", "\n"))),
            'L' => Ok(Value::Array(
                text.lines().map(|l| Value::String(l.to_string())).collect(),
            )),
            's' => Ok(Value::String(text.replace('\\', "/"))),
            'J' => Ok(serde_json::from_str(&text)?),
            other => Err(ScriptError::InvalidReadFlag(other)),
        },
        // already structured by an earlier `J`
        other => match flag {
            'l' | 'L' | 's' | 'J' => Ok(other),
            unknown => Err(ScriptError::InvalidReadFlag(unknown)),
        },
    }
}

/// Parse a `;`-separated list of 1-based line numbers.
pub(crate) fn parse_line_numbers(list: &str) -> Result<Vec<usize>> {
    list.split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ScriptError::InvalidLineNumber(part.to_string()))
        })
        .collect()
}

/// Replace the given 1-based lines of `text`, keeping its line endings.
pub(crate) fn splice_lines(text: &str, lines: &[usize], replacements: &[String]) -> Result<String> {
    if lines.len() != replacements.len() {
        return Err(ScriptError::SpliceArity {
            lines: lines.len(),
            replacements: replacements.len(),
        });
    }

    let mut content: Vec<&str> = text.split('\n').collect();
    let trailing_newline = text.ends_with('\n');
    if trailing_newline {
        content.pop();
    }
    let total = content.len();

    let mut owned: Vec<String> = content.iter().map(|l| l.to_string()).collect();
    for (&line, replacement) in lines.iter().zip(replacements) {
        let slot = owned
            .get_mut(line - 1)
            .ok_or(ScriptError::LineOutOfRange { line, total })?;
        let crlf = slot.ends_with('\r');
        *slot = replacement.clone();
        if crlf {
            slot.push('\r');
        }
    }

    let mut out = owned.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    Ok(out)
}

/// File name for a downloaded URL, stripped of query and fragment.
pub(crate) fn url_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_string(),
        _ => "download".to_string(),
    }
}

/// Move a file, falling back to copy and delete across filesystems.
pub(crate) async fn move_path(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ScriptError::io(parent, e))?;
    }
    if tokio::fs::rename(src, dest).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(src, dest)
        .await
        .map_err(|e| ScriptError::io(dest, e))?;
    tokio::fs::remove_file(src)
        .await
        .map_err(|e| ScriptError::io(src, e))
}

/// Remove a file, or a directory and its contents.
///
/// Callers resolve `path` with `PathSandbox::resolve_target`, so a sandbox
/// root is never passed here.
pub(crate) async fn delete_path(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ScriptError::io(path, e))?;
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    removed.map_err(|e| ScriptError::io(path, e))
}

/// Read, transform and atomically rewrite a text file off the async runtime.
pub(crate) async fn rewrite_file<F>(path: PathBuf, edit: F) -> Result<()>
where
    F: FnOnce(&str) -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> Result<()> {
        let text = pack_fs::io::read_text(&path)?;
        let updated = edit(&text)?;
        pack_fs::io::write_text(&path, &updated)?;
        Ok(())
    })
    .await
    .map_err(|e| ScriptError::io(PathBuf::new(), std::io::Error::other(e)))?
}
