//! Directive interpreter
//!
//! Runs a compiled script one line at a time against a [`PathSandbox`].
//! `import` does not recurse: it pushes a new [`Frame`] with its own cursor
//! and labels onto an explicit stack, sharing the caller's [`Environment`].
//! The first failing directive halts every frame on the stack.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pack_fs::{PathSandbox, PathVariables, Root, SandboxError};
use regex::Regex;
use serde_json::{Value, json};

use crate::capability::{DownloadError, Decompressor, Downloader};
use crate::changelist::Changelist;
use crate::directive::{Directive, Opcode, argify};
use crate::environment::Environment;
use crate::error::{Result, ScriptError, ScriptFailure};
use crate::event::{Event, EventKind, EventSink, Status};
use crate::ops;

/// Nesting limit for `import` when none is configured.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 16;

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Directives executed across all frames, blank lines excluded.
    pub executed: usize,
    /// Number of `import` directives entered.
    pub imports: usize,
    /// Downloads started; each gets its own scratch directory.
    pub downloads: usize,
}

/// One script on the call stack.
#[derive(Debug)]
struct Frame {
    script: Vec<String>,
    cursor: usize,
    labels: HashMap<String, usize>,
    /// The `(old, new)` pair this frame was imported for; `None` at the top.
    origin: Option<(String, String)>,
}

impl Frame {
    fn new(script: Vec<String>, origin: Option<(String, String)>) -> Self {
        let mut labels = HashMap::new();
        for (index, line) in script.iter().enumerate() {
            let args = argify(line.trim());
            if args.first().map(String::as_str) == Some(Opcode::Label.as_str()) {
                if let Some(name) = args.get(1) {
                    labels.insert(name.clone(), index + 1);
                }
            }
        }
        Self {
            script,
            cursor: 0,
            labels,
            origin,
        }
    }
}

/// Where a `download` puts its result.
enum DownloadTarget {
    Variable(String),
    File(PathBuf),
}

/// Executes directive scripts.
///
/// Holds no per-run state: every call to [`Interpreter::run`] starts a fresh
/// frame stack, so one interpreter can run many scripts.
pub struct Interpreter<'a> {
    sandbox: &'a PathSandbox,
    sink: &'a dyn EventSink,
    changelist: Option<&'a Changelist>,
    downloader: Option<&'a dyn Downloader>,
    decompressor: Option<&'a dyn Decompressor>,
    max_depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(sandbox: &'a PathSandbox, sink: &'a dyn EventSink) -> Self {
        Self {
            sandbox,
            sink,
            changelist: None,
            downloader: None,
            decompressor: None,
            max_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }

    /// Changelist that `import` directives compile from.
    pub fn with_changelist(mut self, changelist: &'a Changelist) -> Self {
        self.changelist = Some(changelist);
        self
    }

    pub fn with_downloader(mut self, downloader: &'a dyn Downloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_decompressor(mut self, decompressor: &'a dyn Decompressor) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Execute `script` to completion or to its first failing directive.
    ///
    /// On failure exactly one `PARSER-FAIL` error event is emitted before
    /// returning. Filesystem changes made by earlier directives are kept.
    pub async fn run(
        &self,
        script: Vec<String>,
        env: &mut Environment,
    ) -> std::result::Result<RunReport, ScriptFailure> {
        tracing::info!(lines = script.len(), "running update script");
        let mut frames = vec![Frame::new(script, None)];
        let mut report = RunReport::default();

        while let Some(frame) = frames.last_mut() {
            if frame.cursor >= frame.script.len() {
                if let Some(Frame {
                    origin: Some((from, to)),
                    ..
                }) = frames.pop()
                {
                    tracing::debug!(%from, %to, "leaving import");
                    self.sink
                        .emit(Event::info(Status::ParserContextExit, vec![json!(from), json!(to)]));
                }
                continue;
            }

            let index = frame.cursor;
            let total = frame.script.len();
            let raw = frame.script[index].clone();
            frame.cursor += 1;

            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            self.sink
                .emit(Event::info(Status::ParserStatus, vec![json!(index), json!(total)]));

            let depth = frames.len() - 1;
            let outcome = match Directive::parse(line.trim_start()) {
                Ok(directive) => {
                    tracing::debug!(opcode = %directive.opcode, line = index, depth, "executing directive");
                    self.dispatch(&directive, &mut frames, env, &mut report)
                        .await
                }
                Err(error) => Err(error),
            };

            match outcome {
                Ok(()) => report.executed += 1,
                Err(error) => return Err(self.fail(&frames, index, raw, error)),
            }
        }

        self.sink.emit(Event::info(Status::ParserComplete, Vec::new()));
        tracing::info!(
            executed = report.executed,
            imports = report.imports,
            "update script complete"
        );
        Ok(report)
    }

    async fn dispatch(
        &self,
        directive: &Directive,
        frames: &mut Vec<Frame>,
        env: &mut Environment,
        report: &mut RunReport,
    ) -> Result<()> {
        match directive.opcode {
            Opcode::Import => self.import(directive, frames, report),
            Opcode::Jump => jump(directive, frames),
            Opcode::Label => label(directive, frames),
            Opcode::Config | Opcode::Write => {
                tracing::debug!(opcode = %directive.opcode, "reserved directive, nothing to do");
                Ok(())
            }
            Opcode::Set => set(directive, env),
            Opcode::Read => self.read(directive, env).await,
            Opcode::Prompt => self.message(EventKind::Prompt, directive, env),
            Opcode::Comment => self.message(EventKind::Comment, directive, env),
            Opcode::Log => self.message(EventKind::Log, directive, env),
            Opcode::Debug => self.message(EventKind::Debug, directive, env),
            Opcode::Warn => self.message(EventKind::Warn, directive, env),
            Opcode::Error => self.message(EventKind::Error, directive, env),
            Opcode::Download => {
                // unique per run, so sibling imports never share a scratch file
                let scratch = report.downloads.to_string();
                report.downloads += 1;
                self.download(directive, env, &scratch).await
            }
            Opcode::Decompress => self.decompress(directive, env).await,
            Opcode::Delete => {
                let path = self.sandbox.resolve_target(directive.arg(0, "path")?, env)?;
                ops::delete_path(&path).await
            }
            Opcode::Move => {
                let src = self.sandbox.resolve_target(directive.arg(0, "source")?, env)?;
                let dest = self.sandbox.resolve_target(directive.arg(1, "destination")?, env)?;
                ops::move_path(&src, &dest).await
            }
            Opcode::Splice => self.splice(directive, env).await,
            Opcode::Regex => self.regex(directive, env).await,
        }
    }

    fn import(&self, directive: &Directive, frames: &mut Vec<Frame>, report: &mut RunReport) -> Result<()> {
        let from = directive.arg(0, "old version")?;
        let to = directive.arg(1, "new version")?;
        let changelist = self.changelist.ok_or(ScriptError::NoChangelist)?;
        if frames.len() > self.max_depth {
            return Err(ScriptError::ImportDepthExceeded {
                limit: self.max_depth,
            });
        }

        let script = changelist.compile(from, to)?;
        tracing::debug!(from, to, lines = script.len(), "entering import");
        self.sink
            .emit(Event::info(Status::ParserContextEnter, vec![json!(from), json!(to)]));
        frames.push(Frame::new(script, Some((from.to_string(), to.to_string()))));
        report.imports += 1;
        Ok(())
    }

    fn message(&self, kind: EventKind, directive: &Directive, env: &Environment) -> Result<()> {
        for arg in &directive.args {
            self.sink.emit(Event::message(kind, env.interpolate(arg)));
        }
        Ok(())
    }

    async fn read(&self, directive: &Directive, env: &mut Environment) -> Result<()> {
        let name = directive.arg(0, "variable")?;
        let path = self.sandbox.resolve(directive.arg(1, "path")?, env)?;
        let flags = directive.optional_arg(2).unwrap_or_default();

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ScriptError::io(&path, e))?;
        let value = ops::apply_read_flags(text, flags)?;
        env.set(name, value);
        Ok(())
    }

    async fn download(&self, directive: &Directive, env: &mut Environment, scratch: &str) -> Result<()> {
        let token = directive.arg(0, "destination")?;
        let url = directive
            .rest(1)
            .iter()
            .flat_map(|urls| urls.split_whitespace())
            .next()
            .ok_or(DownloadError::NoUrl)?;

        // resolve before any network traffic so an escape never downloads
        let target = match variable_target(token) {
            Some(name) => DownloadTarget::Variable(name.to_string()),
            None => DownloadTarget::File(self.sandbox.resolve_target(token, env)?),
        };
        let downloader = self
            .downloader
            .ok_or(ScriptError::MissingCapability("download"))?;

        let scratch_dir = self.sandbox.scratch_dir(scratch);
        let scratch_file = scratch_dir.join(ops::url_file_name(url));
        tracing::debug!(url, scratch = %scratch_file.display(), "downloading");

        if let Err(error) = downloader.download(url, &scratch_file).await {
            self.sink.emit(Event::error(
                Status::DownloadError,
                vec![json!(url), json!(error.to_string())],
            ));
            return Err(error.into());
        }

        match target {
            DownloadTarget::Variable(name) => {
                env.set(name, json!(scratch_file.to_string_lossy()));
            }
            DownloadTarget::File(dest) => {
                ops::move_path(&scratch_file, &dest).await?;
                if let Err(e) = tokio::fs::remove_dir_all(&scratch_dir).await {
                    tracing::debug!(error = %e, "could not remove scratch directory");
                }
            }
        }
        Ok(())
    }

    async fn decompress(&self, directive: &Directive, env: &Environment) -> Result<()> {
        let mode = directive.arg(0, "mode")?;
        let source = directive.arg(1, "source")?;
        let archive = match mode {
            "v" => {
                let name = source.trim_start_matches('$');
                let value = env
                    .path_variable(name)
                    .ok_or_else(|| SandboxError::UndefinedVariable {
                        name: name.to_string(),
                    })?;
                self.sandbox.check(Path::new(&value))?
            }
            "f" => self.sandbox.resolve(source, env)?,
            other => return Err(ScriptError::InvalidDecompressMode(other.to_string())),
        };
        let dest = self.sandbox.resolve(directive.arg(2, "destination")?, env)?;
        let decompressor = self
            .decompressor
            .ok_or(ScriptError::MissingCapability("decompress"))?;

        tracing::debug!(archive = %archive.display(), dest = %dest.display(), "extracting");
        decompressor.extract(&archive, &dest).await?;
        Ok(())
    }

    async fn splice(&self, directive: &Directive, env: &Environment) -> Result<()> {
        let path = self.sandbox.resolve(directive.arg(0, "path")?, env)?;
        let lines = ops::parse_line_numbers(directive.arg(1, "lines")?)?;
        let replacements: Vec<String> = directive
            .rest(2)
            .iter()
            .map(|r| env.interpolate(r))
            .collect();
        ops::rewrite_file(path, move |text| ops::splice_lines(text, &lines, &replacements)).await
    }

    async fn regex(&self, directive: &Directive, env: &Environment) -> Result<()> {
        let path = self.sandbox.resolve(directive.arg(0, "path")?, env)?;
        let pattern = Regex::new(directive.arg(1, "pattern")?)?;
        let replacement = directive.arg(2, "replacement")?.to_string();
        ops::rewrite_file(path, move |text| {
            Ok(pattern.replace_all(text, replacement.as_str()).into_owned())
        })
        .await
    }

    /// Report the failure once and wrap it for every enclosing import.
    fn fail(&self, frames: &[Frame], index: usize, raw: String, error: ScriptError) -> ScriptFailure {
        let remaining: Vec<Value> = frames
            .last()
            .map(|frame| frame.script[index..].iter().map(|l| json!(l)).collect())
            .unwrap_or_default();

        let mut error = error;
        for frame in frames.iter().rev() {
            if let Some((from, to)) = &frame.origin {
                error = ScriptError::SubScript {
                    from: from.clone(),
                    to: to.clone(),
                    source: Box::new(error),
                };
            }
        }

        tracing::warn!(line = index, directive = %raw, error = %error, "update script failed");
        self.sink.emit(Event::error(
            Status::ParserFail,
            vec![
                json!(index),
                json!(raw),
                json!(error.to_string()),
                Value::Array(remaining),
            ],
        ));

        ScriptFailure {
            line: index,
            directive: raw,
            error,
        }
    }
}

fn set(directive: &Directive, env: &mut Environment) -> Result<()> {
    let name = directive.arg(0, "variable")?;
    let raw = directive.rest(1).join(" ");
    if raw.trim().is_empty() {
        return Err(ScriptError::MissingArgument {
            opcode: "set",
            argument: "value",
        });
    }
    let value: Value = serde_json::from_str(&raw)?;
    env.set(name, value);
    Ok(())
}

fn jump(directive: &Directive, frames: &mut [Frame]) -> Result<()> {
    let name = directive.arg(0, "label")?;
    let Some(frame) = frames.last_mut() else {
        return Ok(());
    };
    let target = frame
        .labels
        .get(name)
        .copied()
        .ok_or_else(|| ScriptError::UnknownLabel(name.to_string()))?;
    frame.cursor = target;
    Ok(())
}

fn label(directive: &Directive, frames: &mut [Frame]) -> Result<()> {
    let name = directive.arg(0, "name")?;
    if let Some(frame) = frames.last_mut() {
        // the cursor already points past this line
        frame.labels.insert(name.to_string(), frame.cursor);
    }
    Ok(())
}

/// `$name` with no separators and not a root token names a variable.
fn variable_target(token: &str) -> Option<&str> {
    let name = token.strip_prefix('$')?;
    let is_plain = !name.is_empty() && !name.contains(['/', '\\']);
    (is_plain && Root::from_token(token).is_none()).then_some(name)
}
