//! Core types for Hyper-V disk management.

use serde::{Deserialize, Serialize};
use std::process::Output;
use std::time::Duration;

/// Kind of virtual disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VhdType {
    /// Not specified, or not reported by the host
    #[default]
    #[serde(alias = "unknown")]
    Unknown,
    /// Fully allocated at creation
    #[serde(alias = "fixed")]
    Fixed,
    /// Grows on demand
    #[serde(alias = "dynamic")]
    Dynamic,
    /// Stores changes relative to a parent disk
    #[serde(alias = "differencing")]
    Differencing,
}

impl VhdType {
    /// Name as Hyper-V reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            VhdType::Unknown => "Unknown",
            VhdType::Fixed => "Fixed",
            VhdType::Dynamic => "Dynamic",
            VhdType::Differencing => "Differencing",
        }
    }
}

impl std::fmt::Display for VhdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk format of a virtual disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VhdFormat {
    #[default]
    Unknown,
    #[serde(rename = "VHD")]
    Vhd,
    #[serde(rename = "VHDX")]
    Vhdx,
    #[serde(rename = "VHDSet")]
    VhdSet,
}

/// A virtual disk as reported by the host.
///
/// An empty `path` means the disk does not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VhdInfo {
    pub path: String,
    /// Virtual size in bytes
    pub size: u64,
    /// Bytes the file currently occupies on the host
    pub file_size: u64,
    /// Smallest size the disk can be shrunk to, when the host knows it
    pub minimum_size: Option<u64>,
    pub vhd_type: VhdType,
    pub vhd_format: VhdFormat,
    pub parent_path: String,
    pub block_size: u32,
    pub logical_sector_size: u32,
    pub physical_sector_size: u32,
    /// Whether the disk is currently attached to a VM
    pub attached: bool,
}

impl VhdInfo {
    /// Check if the host reported the disk as present
    pub fn exists(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Arguments for creating (or recreating) a virtual disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVhd {
    pub path: String,
    /// File path or HTTP(S) URL to copy the disk from
    pub source: String,
    /// VM whose hard disk is copied
    pub source_vm: String,
    /// Index of the hard disk drive on `source_vm`
    pub source_disk: u32,
    pub vhd_type: VhdType,
    /// Parent of a differencing disk
    pub parent_path: String,
    /// Size in bytes; 0 leaves the size to the source
    pub size: u64,
    pub block_size: u32,
    pub logical_sector_size: u32,
    pub physical_sector_size: u32,
    /// Remove an existing file before creating
    pub replace: bool,
}

/// Raw outcome of running a script.
#[derive(Debug, Clone, Default)]
pub struct ScriptOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl From<Output> for ScriptOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            code: output.status.code(),
            success: output.status.success(),
        }
    }
}

impl ScriptOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into().into_bytes(),
            stderr: Vec::new(),
            code: Some(0),
            success: true,
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
            code: Some(code),
            success: false,
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Configuration for retrying failed operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between attempts
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between attempts
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Config allowing `retries` attempts after the first one.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vhd_info_absent_from_empty_object() {
        let info: VhdInfo = serde_json::from_str("{}").unwrap();
        assert!(!info.exists());
        assert_eq!(info, VhdInfo::default());
    }

    #[test]
    fn test_vhd_info_from_host_payload() {
        let payload = r#"{"Path":"C:\\vms\\disk1.vhdx","Size":1073741824,"FileSize":4194304,"MinimumSize":null,"VhdType":"Dynamic","VhdFormat":"VHDX","ParentPath":"","BlockSize":33554432,"LogicalSectorSize":512,"PhysicalSectorSize":4096,"Attached":false}"#;
        let info: VhdInfo = serde_json::from_str(payload).unwrap();

        assert!(info.exists());
        assert_eq!(info.path, r"C:\vms\disk1.vhdx");
        assert_eq!(info.size, 1_073_741_824);
        assert_eq!(info.minimum_size, None);
        assert_eq!(info.vhd_type, VhdType::Dynamic);
        assert_eq!(info.vhd_format, VhdFormat::Vhdx);
        assert_eq!(info.physical_sector_size, 4096);
    }

    #[test]
    fn test_vhd_type_accepts_lowercase() {
        let t: VhdType = serde_json::from_str("\"differencing\"").unwrap();
        assert_eq!(t, VhdType::Differencing);
        assert_eq!(serde_json::to_string(&VhdType::Fixed).unwrap(), "\"Fixed\"");
    }

    #[test]
    fn test_create_vhd_pascal_case() {
        let args = CreateVhd {
            path: "p".into(),
            replace: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["Path"], "p");
        assert_eq!(json["Replace"], true);
        assert_eq!(json["VhdType"], "Unknown");
    }

    #[test]
    fn test_retry_config_delays() {
        let config = RetryConfig::new(5, Duration::from_secs(5), 2.0);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(10));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(20));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(60));
    }

    #[test]
    fn test_retry_config_with_retries() {
        assert_eq!(RetryConfig::with_retries(0).max_attempts, 1);
        assert_eq!(RetryConfig::with_retries(2).max_attempts, 3);
    }
}
