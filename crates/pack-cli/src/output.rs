//! Terminal rendering of interpreter and update events

use colored::{ColoredString, Colorize};
use pack_script::{Event, EventKind, EventSink, Status, TracingSink};

/// How [`ConsoleSink`] presents events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Coloured severity tag followed by the payload text.
    Human,
    /// One JSON object per line on stdout.
    Json,
    /// Nothing printed; events go to the log.
    Quiet,
}

impl OutputMode {
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        match (json, quiet) {
            (true, _) => Self::Json,
            (false, true) => Self::Quiet,
            (false, false) => Self::Human,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    mode: OutputMode,
}

impl ConsoleSink {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: Event) {
        match self.mode {
            OutputMode::Json => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(error) => tracing::warn!(%error, "could not serialise event"),
            },
            OutputMode::Human => {
                if let Some(line) = format_event(&event) {
                    if event.is_error() {
                        eprintln!("{line}");
                    } else {
                        println!("{line}");
                    }
                }
            }
            OutputMode::Quiet => TracingSink.emit(event),
        }
    }
}

/// Render an event for a terminal. Per-line progress is not printed.
pub fn format_event(event: &Event) -> Option<String> {
    match event.status {
        Some(Status::ParserStatus) => None,
        Some(Status::ParserFail) => {
            let line = event.payload.first().and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            let raw = event.payload.get(1).and_then(|v| v.as_str()).unwrap_or_default();
            let error = event.payload.get(2).and_then(|v| v.as_str()).unwrap_or_default();
            Some(format!("{} line {line} `{raw}`: {error}", tag(event)))
        }
        _ => Some(format!("{} {}", tag(event), event.text())),
    }
}

fn tag(event: &Event) -> ColoredString {
    let label = match event.status {
        Some(status) => status.as_str(),
        None => event.kind.as_str(),
    };
    match event.kind {
        EventKind::SysError | EventKind::Error => label.red().bold(),
        EventKind::Warn => label.yellow().bold(),
        EventKind::SysInfo => label.blue().bold(),
        EventKind::Log => label.green().bold(),
        EventKind::Prompt => label.magenta().bold(),
        EventKind::Debug | EventKind::Comment => label.dimmed(),
    }
}
