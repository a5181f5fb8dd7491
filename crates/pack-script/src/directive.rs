//! Directive tokenizing and opcode selection

use std::fmt;
use std::str::FromStr;

use crate::error::ScriptError;

/// Split a directive line into arguments.
///
/// Spaces separate arguments. A backtick toggles a quoted section in which
/// spaces are kept; the backticks themselves are dropped. There is no
/// escaping and no nesting.
pub fn argify(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut inside_string = false;

    for c in line.chars() {
        match c {
            '`' => inside_string = !inside_string,
            ' ' if !inside_string => args.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    args.push(current);
    args
}

/// Every directive the interpreter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Import,
    Config,
    Set,
    Read,
    Write,
    Jump,
    Label,
    Prompt,
    Comment,
    Log,
    Debug,
    Warn,
    Error,
    Download,
    Decompress,
    Delete,
    Move,
    Splice,
    Regex,
}

impl Opcode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Config => "config",
            Self::Set => "set",
            Self::Read => "read",
            Self::Write => "write",
            Self::Jump => "jump",
            Self::Label => "label",
            Self::Prompt => "prompt",
            Self::Comment => "comment",
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Download => "download",
            Self::Decompress => "decompress",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Splice => "splice",
            Self::Regex => "regex",
        }
    }
}

impl FromStr for Opcode {
    type Err = ScriptError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let opcode = match token {
            "import" => Self::Import,
            "config" => Self::Config,
            "set" => Self::Set,
            "read" => Self::Read,
            "write" => Self::Write,
            "jump" => Self::Jump,
            "label" => Self::Label,
            "prompt" => Self::Prompt,
            "comment" => Self::Comment,
            "log" => Self::Log,
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            "download" => Self::Download,
            "decompress" => Self::Decompress,
            "delete" => Self::Delete,
            "move" => Self::Move,
            "splice" => Self::Splice,
            "regex" => Self::Regex,
            other => return Err(ScriptError::UnknownCommand(other.to_string())),
        };
        Ok(opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tokenized directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub opcode: Opcode,
    pub args: Vec<String>,
}

impl Directive {
    /// Tokenize `line` and select its opcode from the first token.
    pub fn parse(line: &str) -> Result<Self, ScriptError> {
        let mut tokens = argify(line).into_iter();
        let head = tokens.next().unwrap_or_default();
        let opcode = head.parse()?;
        Ok(Self {
            opcode,
            args: tokens.collect(),
        })
    }

    /// The argument at `index`, or a `MissingArgument` error naming it.
    pub fn arg(&self, index: usize, name: &'static str) -> Result<&str, ScriptError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or(ScriptError::MissingArgument {
                opcode: self.opcode.as_str(),
                argument: name,
            })
    }

    /// The argument at `index`, if present and non-empty.
    pub fn optional_arg(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .filter(|arg| !arg.is_empty())
    }

    /// Arguments from `index` onward.
    pub fn rest(&self, index: usize) -> &[String] {
        self.args.get(index..).unwrap_or(&[])
    }
}
