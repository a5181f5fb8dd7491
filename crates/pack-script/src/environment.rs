//! Script variables and `${name}` interpolation

use std::sync::LazyLock;

use pack_fs::PathVariables;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]*)\}").expect("interpolation pattern is valid")
});

/// Named, JSON-typed variables shared by a script and every script it
/// imports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    vars: Map<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    /// Replace every `${name}` in `text` with the rendered variable.
    ///
    /// Unset variables render as a visible placeholder rather than failing.
    pub fn interpolate(&self, text: &str) -> String {
        INTERPOLATION
            .replace_all(text, |caps: &Captures<'_>| {
                let name = &caps[1];
                match self.vars.get(name) {
                    Some(value) => render(value),
                    None => format!("[Invalid Parser Environment Variable '{name}']"),
                }
            })
            .into_owned()
    }
}

/// String coercion used by interpolation.
///
/// Strings render bare, numbers in decimal, booleans as `true`/`false`,
/// null as `null`; arrays and objects render as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl PathVariables for Environment {
    fn path_variable(&self, name: &str) -> Option<String> {
        self.vars.path_variable(name)
    }
}

impl FromIterator<(String, Value)> for Environment {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
