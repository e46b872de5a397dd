//! Script executor: runs rendered scripts and interprets their outcome.

use crate::error::{Error, Result};
use crate::runner::ScriptRunner;
use crate::types::ScriptOutput;
use psscript::Script;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

/// Header PowerShell puts before serialized streams on redirected stderr.
const CLIXML_HEADER: &str = "#< CLIXML";

static CLIXML_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<S S="Error">(.*?)</S>"#).expect("valid CLIXML pattern"));

/// Runs scripts through a [`ScriptRunner`] in one of two modes.
///
/// Holds no state between calls.
pub struct Executor {
    runner: Box<dyn ScriptRunner>,
}

impl Executor {
    /// Create an executor over a runner.
    pub fn new(runner: impl ScriptRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    /// Description of the underlying runner
    pub fn describe(&self) -> String {
        self.runner.describe()
    }

    /// Run a script, caring only about success.
    pub fn run_fire_and_forget(&self, script: &Script) -> Result<()> {
        self.run_checked(script)?;
        Ok(())
    }

    /// Run a script and decode the JSON payload it writes to stdout.
    pub fn run_with_result<T: DeserializeOwned>(&self, script: &Script) -> Result<T> {
        let output = self.run_checked(script)?;
        let stdout = output.stdout_str();
        let payload = stdout.trim_start_matches('\u{feff}').trim();

        serde_json::from_str(payload).map_err(|source| Error::Decode {
            script: script.name(),
            output: payload.to_string(),
            source,
        })
    }

    fn run_checked(&self, script: &Script) -> Result<ScriptOutput> {
        let output = self.runner.run(script)?;

        if !output.success {
            let diagnostic = diagnostic(&output);
            log::debug!("{} failed: {}", script, diagnostic);
            return Err(Error::Execution {
                script: script.name(),
                code: output.code,
                diagnostic,
            });
        }

        Ok(output)
    }
}

/// Best human-readable explanation of a failed run.
///
/// Prefers stderr (decoding CLIXML error records), then stdout.
pub fn diagnostic(output: &ScriptOutput) -> String {
    let stderr = output.stderr_str();
    let stderr = decode_clixml(stderr.trim());
    if !stderr.is_empty() {
        return stderr;
    }

    let stdout = output.stdout_str();
    let stdout = stdout.trim();
    if !stdout.is_empty() {
        return stdout.to_string();
    }

    "no diagnostic output".to_string()
}

/// Extract the error records from a CLIXML stream.
///
/// Text that is not CLIXML is returned unchanged.
pub fn decode_clixml(text: &str) -> String {
    let Some(body) = text.strip_prefix(CLIXML_HEADER) else {
        return text.to_string();
    };

    let records: Vec<String> = CLIXML_ERROR
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_clixml(m.as_str()))
        .collect();

    records.concat().trim().to_string()
}

fn unescape_clixml(text: &str) -> String {
    text.replace("_x000D__x000A_", "\n")
        .replace("_x000A_", "\n")
        .replace("_x000D_", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use psscript::{ScriptTemplate, Verb};
    use serde::Deserialize;
    use serde_json::json;

    struct FixedRunner(ScriptOutput);

    impl ScriptRunner for FixedRunner {
        fn run(&self, _script: &Script) -> Result<ScriptOutput> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Payload {
        path: String,
        size: u64,
    }

    fn script() -> Script {
        ScriptTemplate::new("GetThing", Verb::Read, "")
            .render(&json!({}))
            .unwrap()
    }

    #[test]
    fn test_fire_and_forget_success() {
        let executor = Executor::new(FixedRunner(ScriptOutput::ok("whatever\r\n")));
        assert!(executor.run_fire_and_forget(&script()).is_ok());
    }

    #[test]
    fn test_fire_and_forget_failure_carries_diagnostic() {
        let executor = Executor::new(FixedRunner(ScriptOutput::failed(1, "Access is denied.\r\n")));
        let err = executor.run_fire_and_forget(&script()).unwrap_err();

        match err {
            Error::Execution {
                script,
                code,
                diagnostic,
            } => {
                assert_eq!(script, "GetThing");
                assert_eq!(code, Some(1));
                assert_eq!(diagnostic, "Access is denied.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_result_decodes_payload() {
        let executor = Executor::new(FixedRunner(ScriptOutput::ok(
            "\u{feff}{\"Path\":\"C:\\\\a.vhdx\",\"Size\":42}\r\n",
        )));
        let payload: Payload = executor.run_with_result(&script()).unwrap();
        assert_eq!(
            payload,
            Payload {
                path: r"C:\a.vhdx".to_string(),
                size: 42
            }
        );
    }

    #[test]
    fn test_with_result_garbage_is_decode_error() {
        let executor = Executor::new(FixedRunner(ScriptOutput::ok("WARNING: something\r\n")));
        let err = executor.run_with_result::<Payload>(&script()).unwrap_err();
        assert!(matches!(err, Error::Decode { script: "GetThing", .. }));
    }

    #[test]
    fn test_with_result_empty_is_decode_error() {
        let executor = Executor::new(FixedRunner(ScriptOutput::ok("")));
        let err = executor.run_with_result::<Payload>(&script()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_with_result_failure_is_execution_error() {
        let executor = Executor::new(FixedRunner(ScriptOutput::failed(1, "boom")));
        let err = executor.run_with_result::<Payload>(&script()).unwrap_err();
        assert!(matches!(err, Error::Execution { .. }));
    }

    #[test]
    fn test_decode_clixml() {
        let stderr = concat!(
            "#< CLIXML\r\n",
            r#"<Objs Version="1.1.0.1" xmlns="http://schemas.microsoft.com/powershell/2004/04">"#,
            r#"<S S="Error">Get-VHD : &apos;C:\vms\x.vhdx&apos; is not a virtual disk._x000D__x000A_</S>"#,
            r#"<S S="Error">At line:4 char:12_x000D__x000A_</S>"#,
            r#"<S S="verbose">ignored</S>"#,
            "</Objs>"
        );
        assert_eq!(
            decode_clixml(stderr),
            "Get-VHD : 'C:\\vms\\x.vhdx' is not a virtual disk.\nAt line:4 char:12"
        );
    }

    #[test]
    fn test_diagnostic_falls_back_to_stdout() {
        let output = ScriptOutput {
            stdout: b"Resize-VHD : failed\r\n".to_vec(),
            stderr: Vec::new(),
            code: Some(1),
            success: false,
        };
        assert_eq!(diagnostic(&output), "Resize-VHD : failed");
        assert_eq!(diagnostic(&ScriptOutput::failed(1, "")), "no diagnostic output");
    }
}
