//! Runner that executes scripts with `powershell.exe`.

use crate::error::{Error, Result};
use crate::runner::ScriptRunner;
use crate::types::ScriptOutput;
use base64::Engine;
use psscript::Script;
use std::io::Write;
use std::process::{Command, Stdio};

/// Default PowerShell executable.
pub const DEFAULT_PROGRAM: &str = "powershell.exe";

/// Flags passed to PowerShell before the script.
const POWERSHELL_FLAGS: [&str; 5] = [
    "-NoLogo",
    "-NoProfile",
    "-NonInteractive",
    "-ExecutionPolicy",
    "Bypass",
];

/// Loader passed as `-EncodedCommand`; the script itself arrives on stdin.
///
/// Windows OpenSSH hands the command line to `cmd.exe`, which rejects lines
/// over 8191 characters, so the command line must not grow with the script.
const LOADER: &str = "$ErrorActionPreference = 'Stop'\n\
$stdin = New-Object System.IO.StreamReader ([Console]::OpenStandardInput()), (New-Object System.Text.UTF8Encoding $false)\n\
& ([scriptblock]::Create($stdin.ReadToEnd()))\n";

/// Longest command line `cmd.exe` accepts.
pub const MAX_COMMAND_LINE: usize = 8191;

/// How the PowerShell process is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Run PowerShell on this machine
    Local,
    /// Run PowerShell on a remote host through the `ssh` client
    Ssh {
        /// Destination, e.g. `admin@hyperv01`
        target: String,
        /// Extra arguments for `ssh`, placed before the destination
        options: Vec<String>,
    },
}

/// Runs scripts with PowerShell, locally or over ssh.
///
/// The script text is written to PowerShell's stdin as UTF-8 and run by a
/// fixed loader passed as `-EncodedCommand` (base64 of the UTF-16LE text).
/// The script never goes through shell quoting on either side, and the
/// command line has the same length for every script. Over ssh the program
/// name is interpreted by the remote shell and must not contain spaces.
#[derive(Debug, Clone)]
pub struct PowerShellRunner {
    program: String,
    transport: Transport,
}

impl PowerShellRunner {
    /// Runner for the local machine.
    pub fn local() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            transport: Transport::Local,
        }
    }

    /// Runner for a remote host reached with `ssh <target>`.
    ///
    /// `BatchMode=yes` is set so a missing key fails instead of prompting.
    pub fn ssh(target: impl Into<String>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            transport: Transport::Ssh {
                target: target.into(),
                options: vec!["-o".to_string(), "BatchMode=yes".to_string()],
            },
        }
    }

    /// Use a different PowerShell executable (e.g. `pwsh`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Append extra `ssh` arguments. Ignored for local runners.
    pub fn with_ssh_options<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Transport::Ssh { options, .. } = &mut self.transport {
            options.extend(extra.into_iter().map(Into::into));
        }
        self
    }

    /// Transport this runner uses
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Program and arguments used to run any script.
    pub fn command_line(&self) -> (String, Vec<String>) {
        let mut powershell: Vec<String> = Vec::with_capacity(POWERSHELL_FLAGS.len() + 3);
        powershell.push(self.program.clone());
        powershell.extend(POWERSHELL_FLAGS.iter().map(|s| (*s).to_string()));
        powershell.push("-EncodedCommand".to_string());
        powershell.push(encode_command(LOADER));

        match &self.transport {
            Transport::Local => {
                let program = powershell.remove(0);
                (program, powershell)
            }
            Transport::Ssh { target, options } => {
                let mut args = options.clone();
                args.push("--".to_string());
                args.push(target.clone());
                args.extend(powershell);
                ("ssh".to_string(), args)
            }
        }
    }
}

impl Default for PowerShellRunner {
    fn default() -> Self {
        Self::local()
    }
}

impl ScriptRunner for PowerShellRunner {
    fn run(&self, script: &Script) -> Result<ScriptOutput> {
        let (program, args) = self.command_line();
        log::debug!("Running {} via {}", script, self.describe());
        let launch = |source| Error::Launch {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch)?;

        // The loader reads stdin to the end before running anything, so the
        // whole script can be written before output is collected.
        // A process that exits early closes the pipe; its stderr says why.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(script.text().as_bytes())
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(launch(e));
        }

        let output = child.wait_with_output().map_err(launch)?;
        Ok(ScriptOutput::from(output))
    }

    fn describe(&self) -> String {
        match &self.transport {
            Transport::Local => format!("local {}", self.program),
            Transport::Ssh { target, .. } => format!("{} on {}", self.program, target),
        }
    }
}

/// Encode script text the way `-EncodedCommand` expects.
pub fn encode_command(text: &str) -> String {
    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
