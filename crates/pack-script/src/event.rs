//! Events reported to the host application
//!
//! The kind and status strings are the protocol the host UI keys on: they
//! drive progress bars and error routing, so they never change spelling.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Severity or channel of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    #[serde(rename = "SYS-INFO")]
    SysInfo,
    #[serde(rename = "SYS-ERROR")]
    SysError,
    #[serde(rename = "LOG")]
    Log,
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "PROMPT")]
    Prompt,
    #[serde(rename = "COMMENT")]
    Comment,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SysInfo => "SYS-INFO",
            Self::SysError => "SYS-ERROR",
            Self::Log => "LOG",
            Self::Debug => "DEBUG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Prompt => "PROMPT",
            Self::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-kind carried by `SYS-INFO` and `SYS-ERROR` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "PARSER-STATUS")]
    ParserStatus,
    #[serde(rename = "PARSER-CONTEXTENTER")]
    ParserContextEnter,
    #[serde(rename = "PARSER-CONTEXTEXIT")]
    ParserContextExit,
    #[serde(rename = "PARSER-COMPLETE")]
    ParserComplete,
    #[serde(rename = "PARSER-FAIL")]
    ParserFail,
    #[serde(rename = "DownloadError")]
    DownloadError,
    #[serde(rename = "UPDATE-CHANGELISTGET-START")]
    ChangelistGetStart,
    #[serde(rename = "UPDATE-CHANGELISTGET-SUCCEED")]
    ChangelistGetSucceed,
    #[serde(rename = "UPDATE-CHANGELISTGET-FAIL")]
    ChangelistGetFail,
    #[serde(rename = "UPDATE-CHANGELISTGET-EMPTYCHANGELIST")]
    ChangelistGetEmpty,
    #[serde(rename = "UPDATE-CHANGECOMPILE-SUCCEED")]
    ChangeCompileSucceed,
    #[serde(rename = "UPDATE-CHANGECOMPILE-FAIL")]
    ChangeCompileFail,
    #[serde(rename = "UPDATE-CHANGEPROCESS-SUCCEED")]
    ChangeProcessSucceed,
    #[serde(rename = "UPDATE-CHANGEPROCESS-FAIL")]
    ChangeProcessFail,
    #[serde(rename = "UPDATE-NOTNEEDED")]
    UpdateNotNeeded,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParserStatus => "PARSER-STATUS",
            Self::ParserContextEnter => "PARSER-CONTEXTENTER",
            Self::ParserContextExit => "PARSER-CONTEXTEXIT",
            Self::ParserComplete => "PARSER-COMPLETE",
            Self::ParserFail => "PARSER-FAIL",
            Self::DownloadError => "DownloadError",
            Self::ChangelistGetStart => "UPDATE-CHANGELISTGET-START",
            Self::ChangelistGetSucceed => "UPDATE-CHANGELISTGET-SUCCEED",
            Self::ChangelistGetFail => "UPDATE-CHANGELISTGET-FAIL",
            Self::ChangelistGetEmpty => "UPDATE-CHANGELISTGET-EMPTYCHANGELIST",
            Self::ChangeCompileSucceed => "UPDATE-CHANGECOMPILE-SUCCEED",
            Self::ChangeCompileFail => "UPDATE-CHANGECOMPILE-FAIL",
            Self::ChangeProcessSucceed => "UPDATE-CHANGEPROCESS-SUCCEED",
            Self::ChangeProcessFail => "UPDATE-CHANGEPROCESS-FAIL",
            Self::UpdateNotNeeded => "UPDATE-NOTNEEDED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub payload: Vec<Value>,
}

impl Event {
    pub fn info(status: Status, payload: Vec<Value>) -> Self {
        Self {
            kind: EventKind::SysInfo,
            status: Some(status),
            payload,
        }
    }

    pub fn error(status: Status, payload: Vec<Value>) -> Self {
        Self {
            kind: EventKind::SysError,
            status: Some(status),
            payload,
        }
    }

    /// A user-facing message from a log-family directive.
    pub fn message(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            payload: vec![Value::String(text.into())],
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::SysError
    }

    /// Payload rendered as space-separated text, strings unquoted.
    pub fn text(&self) -> String {
        self.payload
            .iter()
            .map(crate::environment::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Receiver of interpreter and update events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

impl<F> EventSink for F
where
    F: Fn(Event) + Send + Sync,
{
    fn emit(&self, event: Event) {
        self(event)
    }
}

/// Forwards every event to `tracing` at a matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        let status = event.status.map(|s| s.as_str()).unwrap_or_default();
        let text = event.text();
        match event.kind {
            EventKind::SysError | EventKind::Error => {
                tracing::error!(kind = %event.kind, status, "{text}")
            }
            EventKind::Warn => tracing::warn!(kind = %event.kind, "{text}"),
            EventKind::Debug => tracing::debug!(kind = %event.kind, "{text}"),
            EventKind::SysInfo if event.status == Some(Status::ParserStatus) => {
                tracing::trace!(status, "{text}")
            }
            _ => tracing::info!(kind = %event.kind, status, "{text}"),
        }
    }
}
