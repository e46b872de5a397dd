//! Script runner abstraction.
//!
//! The [`ScriptRunner`] trait is the only seam between this crate and the
//! transport that reaches a host, allowing for:
//! - Local `powershell.exe` execution
//! - Remote execution over ssh
//! - Scripted runners for testing

pub mod powershell;

pub use powershell::{PowerShellRunner, Transport};

use crate::error::Result;
use crate::types::ScriptOutput;
use psscript::Script;

/// Executes rendered scripts on a host.
///
/// A runner only reports what happened. Interpreting exit codes and output
/// is the [`Executor`](crate::Executor)'s job.
pub trait ScriptRunner: Send + Sync {
    /// Run a script to completion and return its raw output.
    ///
    /// Errors are reserved for failing to run the script at all.
    fn run(&self, script: &Script) -> Result<ScriptOutput>;

    /// Short description of where scripts run, for logs.
    fn describe(&self) -> String {
        "script runner".to_string()
    }
}

impl<R: ScriptRunner + ?Sized> ScriptRunner for Box<R> {
    fn run(&self, script: &Script) -> Result<ScriptOutput> {
        (**self).run(script)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<R: ScriptRunner + ?Sized> ScriptRunner for std::sync::Arc<R> {
    fn run(&self, script: &Script) -> Result<ScriptOutput> {
        (**self).run(script)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
