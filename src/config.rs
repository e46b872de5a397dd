//! vhdsync configuration: the host to talk to and the disks it should have.

use anyhow::{Context, Result, bail};
use hvclient::runner::powershell::DEFAULT_PROGRAM;
use hvclient::{PowerShellRunner, VhdClient};
use reconcile::DiskSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths;

/// How scripts reach the Hyper-V host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Run PowerShell on this machine
    #[default]
    Local,
    /// Run PowerShell through `ssh <ssh_target>`
    Ssh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub transport: TransportKind,
    pub ssh_target: Option<String>,
    /// Extra arguments passed to ssh before the target
    pub ssh_options: Vec<String>,
    /// PowerShell executable on the host
    pub powershell: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Local,
            ssh_target: None,
            ssh_options: Vec::new(),
            powershell: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl HostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transport == TransportKind::Ssh
            && self.ssh_target.as_deref().is_none_or(|t| t.trim().is_empty())
        {
            bail!("ssh transport requires ssh_target");
        }
        if self.powershell.trim().is_empty() {
            bail!("powershell program cannot be empty");
        }
        Ok(())
    }

    /// Build the script runner this host is reached with
    pub fn runner(&self) -> Result<PowerShellRunner> {
        self.validate()?;
        let runner = match self.transport {
            TransportKind::Local => PowerShellRunner::local(),
            TransportKind::Ssh => {
                let target = self.ssh_target.clone().unwrap_or_default();
                PowerShellRunner::ssh(target).with_ssh_options(self.ssh_options.iter().cloned())
            }
        };
        Ok(runner.with_program(self.powershell.clone()))
    }

    /// Build a client for this host
    pub fn client(&self) -> Result<VhdClient> {
        let client = VhdClient::with_runner(self.runner()?);
        log::debug!("Using {}", client.describe());
        Ok(client)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplyConfig {
    /// Disks reconciled in parallel
    pub jobs: usize,
    /// Times a failed cycle is retried
    pub retries: u32,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            retries: 0,
        }
    }
}

/// The vhdsync configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VhdsyncConfig {
    pub host: HostConfig,
    pub apply: ApplyConfig,
    pub disks: Vec<DiskSpec>,
}

impl VhdsyncConfig {
    /// Load the config from `path`, or from the default location.
    ///
    /// A missing default config yields an empty inventory; a missing
    /// explicit one is an error.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (paths::config_file()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok((Self::default(), path));
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} disk(s) from {}",
            config.disks.len(),
            path.display()
        );
        Ok((config, path))
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.host.validate().context("Invalid [host] section")?;

        if self.apply.jobs == 0 {
            bail!("apply.jobs must be at least 1");
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for disk in &self.disks {
            disk.validate()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Invalid disk '{}'", disk.path))?;

            if let Some(first) = seen.insert(path_key(&disk.path), &disk.path) {
                bail!("Disk '{}' is declared twice (also as '{}')", disk.path, first);
            }
        }

        Ok(())
    }

    /// Disks whose path contains `target`, ignoring case
    pub fn select(&self, target: Option<&str>) -> Vec<&DiskSpec> {
        let needle = target.map(str::to_lowercase);
        self.disks
            .iter()
            .filter(|d| {
                needle
                    .as_deref()
                    .is_none_or(|n| d.path.to_lowercase().contains(n))
            })
            .collect()
    }

    /// Find a declared disk by path
    pub fn find_disk(&self, path: &str) -> Option<&DiskSpec> {
        let key = path_key(path);
        self.disks.iter().find(|d| path_key(&d.path) == key)
    }
}

fn path_key(path: &str) -> String {
    path.replace('/', "\\").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hvclient::{Transport, VhdType};

    const EXAMPLE: &str = r#"
[host]
transport = "ssh"
ssh_target = "admin@hyperv01"
ssh_options = ["-p", "2222"]
powershell = "pwsh"

[apply]
jobs = 2
retries = 1

[[disks]]
path = 'C:\vms\disk1.vhdx'
size = 2147483648
vhd_type = "dynamic"

[[disks]]
path = 'C:\vms\child.vhdx'
parent_path = 'C:\vms\base.vhdx'
"#;

    #[test]
    fn test_parse_example_config() {
        let config = VhdsyncConfig::parse(EXAMPLE).unwrap();

        assert_eq!(config.host.transport, TransportKind::Ssh);
        assert_eq!(config.apply.jobs, 2);
        assert_eq!(config.disks.len(), 2);
        assert_eq!(config.disks[0].size, 2_147_483_648);
        assert_eq!(config.disks[0].vhd_type, VhdType::Dynamic);
        assert!(config.disks[1].is_differencing());
    }

    #[test]
    fn test_defaults() {
        let config = VhdsyncConfig::parse("").unwrap();
        assert_eq!(config.host.transport, TransportKind::Local);
        assert_eq!(config.host.powershell, "powershell.exe");
        assert_eq!(config.apply, ApplyConfig::default());
        assert!(config.disks.is_empty());
    }

    #[test]
    fn test_ssh_requires_target() {
        let err = VhdsyncConfig::parse("[host]\ntransport = \"ssh\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("ssh_target"));
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let toml = r#"
[[disks]]
path = 'C:\vms\a.vhdx'

[[disks]]
path = 'c:/VMS/A.vhdx'
"#;
        let err = VhdsyncConfig::parse(toml).unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn test_invalid_disk_rejected() {
        let toml = r#"
[[disks]]
path = 'C:\vms\a.vhdx'
vhd_type = "differencing"
"#;
        let err = VhdsyncConfig::parse(toml).unwrap_err();
        assert!(format!("{err:#}").contains("parent_path"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(VhdsyncConfig::parse("[[disks]]\npath = 'a'\nsise = 1\n").is_err());
    }

    #[test]
    fn test_select_by_substring() {
        let config = VhdsyncConfig::parse(EXAMPLE).unwrap();
        assert_eq!(config.select(None).len(), 2);
        assert_eq!(config.select(Some("DISK1")).len(), 1);
        assert!(config.select(Some("nothing")).is_empty());
        assert!(config.find_disk(r"c:\vms\CHILD.vhdx").is_some());
    }

    #[test]
    fn test_runner_from_host() {
        let config = VhdsyncConfig::parse(EXAMPLE).unwrap();
        let runner = config.host.runner().unwrap();
        match runner.transport() {
            Transport::Ssh { target, options } => {
                assert_eq!(target, "admin@hyperv01");
                assert!(options.contains(&"2222".to_string()));
            }
            Transport::Local => panic!("expected ssh"),
        }
    }

    #[test]
    fn test_load_missing_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(VhdsyncConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, EXAMPLE).unwrap();

        let (config, loaded_from) = VhdsyncConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.disks.len(), 2);
    }
}
