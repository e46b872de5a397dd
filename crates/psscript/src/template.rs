//! Script templates and rendered scripts.

use crate::error::{Error, Result};
use crate::quote::quote;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lines every rendered script starts with.
///
/// `Stop` turns every non-terminating error into a terminating one, so a
/// failed cmdlet always surfaces as a non-zero exit code. Output is UTF-8;
/// redirected stdout otherwise uses the host's OEM code page.
pub const PRELUDE: &str = "$ErrorActionPreference = 'Stop'\n\
$ProgressPreference = 'SilentlyContinue'\n\
[Console]::OutputEncoding = New-Object System.Text.UTF8Encoding $false\n\
$OutputEncoding = [Console]::OutputEncoding\n";

/// Logical operation a template implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verb {
    /// Create the artifact, or leave an existing one in place
    CreateOrUpdate,
    /// Report the artifact's current attributes
    Read,
    /// Remove the artifact
    Delete,
    /// Change the artifact's size in place
    Resize,
}

impl Verb {
    /// All verbs, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::CreateOrUpdate, Self::Read, Self::Resize, Self::Delete];

    /// Kebab-case name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::CreateOrUpdate => "create-or-update",
            Verb::Read => "read",
            Verb::Delete => "delete",
            Verb::Resize => "resize",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameterized PowerShell script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    name: &'static str,
    verb: Verb,
    body: &'static str,
}

impl ScriptTemplate {
    /// Create a template from a static body.
    ///
    /// The body reads its arguments from the `$request` variable.
    pub const fn new(name: &'static str, verb: Verb, body: &'static str) -> Self {
        Self { name, verb, body }
    }

    /// Template name (e.g. "CreateOrUpdateVhd")
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Operation this template implements
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Render the template with the given arguments.
    ///
    /// Arguments must serialize to a JSON object. The output is deterministic
    /// for equal arguments.
    pub fn render<A: Serialize + ?Sized>(&self, args: &A) -> Result<Script> {
        let value = serde_json::to_value(args).map_err(|source| Error::Encode {
            template: self.name,
            source,
        })?;

        if !value.is_object() {
            return Err(Error::NotAnObject {
                template: self.name,
                kind: json_kind(&value),
            });
        }

        let json = serde_json::to_string(&value).map_err(|source| Error::Encode {
            template: self.name,
            source,
        })?;
        let literal = quote(&json);
        let body = self.body.trim_start_matches('\n');

        let mut text = String::with_capacity(PRELUDE.len() + literal.len() + body.len() + 48);
        text.push_str(PRELUDE);
        text.push_str("$request = ConvertFrom-Json -InputObject ");
        text.push_str(&literal);
        text.push('\n');
        text.push_str(body);

        log::trace!("Rendered {} ({} bytes)", self.name, text.len());

        Ok(Script {
            name: self.name,
            verb: self.verb,
            text,
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// A fully rendered script, ready to send to a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    name: &'static str,
    verb: Verb,
    text: String,
}

impl Script {
    /// Name of the template this script was rendered from
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Operation the script performs
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Script source text
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.verb)
    }
}
