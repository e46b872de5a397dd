//! # hvclient
//!
//! Client for Hyper-V virtual disks, driven by rendered PowerShell scripts.
//!
//! The crate is layered:
//!
//! - [`ScriptRunner`]: executes script text somewhere (locally, over ssh, or
//!   a scripted mock in tests) and returns exit status and output.
//! - [`Executor`]: runs a rendered [`psscript::Script`] either
//!   fire-and-forget or decoding one JSON payload from its output.
//! - [`VhdClient`]: one method per lifecycle verb, composing a
//!   [`psscript::TemplateRegistry`] with an executor.
//!
//! ## Example
//!
//! ```no_run
//! use hvclient::{PowerShellRunner, VhdClient};
//!
//! let client = VhdClient::with_runner(PowerShellRunner::ssh("admin@hyperv01"));
//!
//! let vhd = client.get_vhd(r"C:\vms\disk1.vhdx").expect("read failed");
//! if vhd.exists() {
//!     client.resize_vhd(&vhd.path, 2 * 1024 * 1024 * 1024).expect("resize failed");
//! }
//! ```
//!
//! The client performs no retries. Errors expose an [`ErrorCategory`] so a
//! caller can decide; [`retry::with_retry`] implements backoff for callers
//! that want it.

pub mod client;
pub mod error;
pub mod executor;
pub mod retry;
pub mod runner;
pub mod types;

pub use client::{VhdClient, file_stem};
pub use error::{Error, ErrorCategory, Result};
pub use executor::Executor;
pub use runner::{PowerShellRunner, ScriptRunner, Transport};
pub use types::{CreateVhd, RetryConfig, ScriptOutput, VhdFormat, VhdInfo, VhdType};
