//! High-level client for virtual disk operations.

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::runner::ScriptRunner;
use crate::types::{CreateVhd, VhdInfo};
use psscript::{TemplateRegistry, Verb};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PathArgs<'a> {
    path: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResizeArgs<'a> {
    path: &'a str,
    size: u64,
}

/// Client for Hyper-V virtual disks.
///
/// Stateless: every method renders a template, runs it and returns the
/// result. Errors are returned unchanged, nothing is retried.
pub struct VhdClient {
    executor: Executor,
    templates: Arc<TemplateRegistry>,
}

impl VhdClient {
    /// Create a client from an executor and a template registry.
    pub fn new(executor: Executor, templates: Arc<TemplateRegistry>) -> Self {
        Self {
            executor,
            templates,
        }
    }

    /// Create a client over a runner with the standard Hyper-V templates.
    pub fn with_runner(runner: impl ScriptRunner + 'static) -> Self {
        Self::new(Executor::new(runner), Arc::new(TemplateRegistry::hyperv()))
    }

    /// Description of where scripts run
    pub fn describe(&self) -> String {
        self.executor.describe()
    }

    /// Create a disk, or leave an existing one in place.
    ///
    /// With `replace` set the existing file is removed and created again.
    pub fn create_or_update_vhd(&self, vhd: &CreateVhd) -> Result<()> {
        require_path(&vhd.path)?;
        let script = self.templates.render(Verb::CreateOrUpdate, vhd)?;
        log::info!("Creating {} (replace: {})", vhd.path, vhd.replace);
        self.executor.run_fire_and_forget(&script)
    }

    /// Read a disk.
    ///
    /// A disk that does not exist is returned as [`VhdInfo::default`], whose
    /// path is empty. That is not an error.
    pub fn get_vhd(&self, path: &str) -> Result<VhdInfo> {
        require_path(path)?;
        let script = self.templates.render(Verb::Read, &PathArgs { path })?;
        let vhd: VhdInfo = self.executor.run_with_result(&script)?;
        log::debug!("Read {}: exists={} size={}", path, vhd.exists(), vhd.size);
        Ok(vhd)
    }

    /// Resize a disk to `size` bytes.
    pub fn resize_vhd(&self, path: &str, size: u64) -> Result<()> {
        require_path(path)?;
        if size == 0 {
            return Err(Error::Invalid(format!("cannot resize {path} to 0 bytes")));
        }
        let script = self.templates.render(Verb::Resize, &ResizeArgs { path, size })?;
        log::info!("Resizing {} to {} bytes", path, size);
        self.executor.run_fire_and_forget(&script)
    }

    /// Delete a disk and its sibling files. Deleting a missing disk succeeds.
    pub fn delete_vhd(&self, path: &str) -> Result<()> {
        require_path(path)?;
        let script = self.templates.render(Verb::Delete, &PathArgs { path })?;
        log::info!("Deleting {}", path);
        self.executor.run_fire_and_forget(&script)
    }
}

fn require_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(Error::Invalid("path argument is required".to_string()));
    }
    if file_stem(path).trim().is_empty() {
        return Err(Error::Invalid(format!("{path} does not name a disk file")));
    }
    Ok(())
}

/// File name of a host path without its extension, as the delete template
/// matches sibling files by it. Empty for `C:\vms\` or `C:\vms\.vhdx`.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['\\', '/']).next().unwrap_or_default();
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScriptOutput, VhdType};
    use psscript::Script;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned outputs and records every script it was given.
    #[derive(Default)]
    struct ScriptedRunner {
        outputs: Mutex<VecDeque<ScriptOutput>>,
        scripts: Arc<Mutex<Vec<Script>>>,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<ScriptOutput>) -> (Self, Arc<Mutex<Vec<Script>>>) {
            let runner = Self {
                outputs: Mutex::new(outputs.into()),
                scripts: Arc::default(),
            };
            let scripts = Arc::clone(&runner.scripts);
            (runner, scripts)
        }
    }

    impl ScriptRunner for ScriptedRunner {
        fn run(&self, script: &Script) -> Result<ScriptOutput> {
            self.scripts.lock().unwrap().push(script.clone());
            Ok(self
                .outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ScriptOutput::ok("")))
        }
    }

    #[test]
    fn test_get_missing_disk_is_not_an_error() {
        let (runner, scripts) = ScriptedRunner::new(vec![ScriptOutput::ok("{}\r\n")]);
        let client = VhdClient::with_runner(runner);

        let vhd = client.get_vhd(r"C:\vms\missing.vhdx").unwrap();
        assert!(!vhd.exists());
        assert_eq!(vhd.path, "");

        let scripts = scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].verb(), Verb::Read);
        assert!(scripts[0].text().contains(r#"'{"Path":"C:\\vms\\missing.vhdx"}'"#));
    }

    #[test]
    fn test_get_existing_disk() {
        let (runner, _) = ScriptedRunner::new(vec![ScriptOutput::ok(
            r#"{"Path":"C:\\vms\\disk1.vhdx","Size":1073741824,"VhdType":"Dynamic"}"#,
        )]);
        let client = VhdClient::with_runner(runner);

        let vhd = client.get_vhd(r"C:\vms\disk1.vhdx").unwrap();
        assert!(vhd.exists());
        assert_eq!(vhd.size, 1_073_741_824);
        assert_eq!(vhd.vhd_type, VhdType::Dynamic);
    }

    #[test]
    fn test_get_keeps_non_ascii_parent() {
        let payload = r#"{"Path":"C:\\vms\\diff.vhdx","VhdType":"Differencing","ParentPath":"C:\\vms\\données.vhdx"}"#;
        let (runner, _) = ScriptedRunner::new(vec![ScriptOutput::ok(payload)]);
        let client = VhdClient::with_runner(runner);

        let vhd = client.get_vhd(r"C:\vms\diff.vhdx").unwrap();
        assert_eq!(vhd.parent_path, r"C:\vms\données.vhdx");
    }

    #[test]
    fn test_create_renders_all_arguments() {
        let (runner, scripts) = ScriptedRunner::new(vec![]);
        let client = VhdClient::with_runner(runner);

        client
            .create_or_update_vhd(&CreateVhd {
                path: r"C:\vms\diff.vhdx".into(),
                parent_path: r"C:\vms\base.vhdx".into(),
                vhd_type: VhdType::Differencing,
                replace: true,
                ..Default::default()
            })
            .unwrap();

        let scripts = scripts.lock().unwrap();
        let text = scripts[0].text();
        assert_eq!(scripts[0].name(), "CreateOrUpdateVhd");
        assert!(text.contains(r#""ParentPath":"C:\\vms\\base.vhdx""#));
        assert!(text.contains(r#""Replace":true"#));
        assert!(text.contains(r#""VhdType":"Differencing""#));
    }

    #[test]
    fn test_resize_passes_bytes() {
        let (runner, scripts) = ScriptedRunner::new(vec![]);
        let client = VhdClient::with_runner(runner);

        client.resize_vhd(r"C:\vms\disk1.vhdx", 2_147_483_648).unwrap();

        let scripts = scripts.lock().unwrap();
        assert_eq!(scripts[0].verb(), Verb::Resize);
        assert!(scripts[0].text().contains(r#""Size":2147483648"#));
    }

    #[test]
    fn test_resize_to_zero_rejected_before_running() {
        let (runner, scripts) = ScriptedRunner::new(vec![]);
        let client = VhdClient::with_runner(runner);

        let err = client.resize_vhd(r"C:\vms\disk1.vhdx", 0).unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_path_rejected_before_running() {
        let (runner, scripts) = ScriptedRunner::new(vec![]);
        let client = VhdClient::with_runner(runner);

        assert!(matches!(client.get_vhd("").unwrap_err(), Error::Invalid(_)));
        assert!(matches!(client.delete_vhd("  ").unwrap_err(), Error::Invalid(_)));
        assert!(matches!(
            client.create_or_update_vhd(&CreateVhd::default()).unwrap_err(),
            Error::Invalid(_)
        ));
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_directory_path_rejected_before_running() {
        let (runner, scripts) = ScriptedRunner::new(vec![]);
        let client = VhdClient::with_runner(runner);

        for path in [r"C:\vms\", "C:/vms/", r"C:\vms\.vhdx"] {
            let err = client.delete_vhd(path).unwrap_err();
            assert!(matches!(err, Error::Invalid(_)), "{path}");
            assert!(client.get_vhd(path).is_err());
        }
        assert!(scripts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(r"C:\vms\disk1.vhdx"), "disk1");
        assert_eq!(file_stem("C:/vms/web.data.vhdx"), "web.data");
        assert_eq!(file_stem(r"C:\vms\"), "");
        assert_eq!(file_stem(r"C:\vms\.vhdx"), "");
    }

    #[test]
    fn test_delete_of_absent_disk_succeeds() {
        // The delete template exits 0 when nothing matches
        let (runner, _) = ScriptedRunner::new(vec![ScriptOutput::ok(""), ScriptOutput::ok("{}")]);
        let client = VhdClient::with_runner(runner);

        client.delete_vhd(r"C:\vms\gone.vhdx").unwrap();
        assert!(!client.get_vhd(r"C:\vms\gone.vhdx").unwrap().exists());
    }

    #[test]
    fn test_execution_error_is_returned_unchanged() {
        let (runner, _) = ScriptedRunner::new(vec![ScriptOutput::failed(1, "New-VHD : disk full")]);
        let client = VhdClient::with_runner(runner);

        let err = client
            .create_or_update_vhd(&CreateVhd {
                path: r"C:\vms\disk1.vhdx".into(),
                size: 1024,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "CreateOrUpdateVhd failed (exit code 1): New-VHD : disk full");
    }

    #[test]
    fn test_missing_template_is_render_error() {
        let (runner, _) = ScriptedRunner::new(vec![]);
        let client = VhdClient::new(Executor::new(runner), Arc::new(TemplateRegistry::new()));

        let err = client.delete_vhd(r"C:\vms\disk1.vhdx").unwrap_err();
        assert!(matches!(err, Error::Render(psscript::Error::MissingTemplate(Verb::Delete))));
    }
}
