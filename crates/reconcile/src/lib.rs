//! # Reconcile
//!
//! Diff-driven reconciliation of Hyper-V virtual disks.
//!
//! ## Core Concepts
//!
//! - **DiskSpec**: the desired attributes of one disk
//! - **ObservedState**: what the host last reported, plus an existence status
//! - **ChangeSet**: attributes whose desired value differs from the observed one
//! - **Plan**: the ordered actions one cycle will take, computed purely
//! - **Controller**: executes plans against a [`DiskApi`] and records the
//!   result in an [`AttributeStore`]
//! - **Executor**: runs many independent cycles on a thread pool
//!
//! ## Example
//!
//! ```no_run
//! use hvclient::{PowerShellRunner, VhdClient};
//! use reconcile::{AttributeStore, Controller, DiskSpec, MemoryStore};
//!
//! let client = VhdClient::with_runner(PowerShellRunner::ssh("admin@hyperv01"));
//! let controller = Controller::new(&client);
//!
//! let mut store = MemoryStore::new(DiskSpec::new(r"C:\vms\disk1.vhdx").with_size(1 << 30));
//! controller.apply(&mut store)?;
//! assert!(store.observed().exists());
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! ## Cycle rules
//!
//! 1. A missing disk, or a change to `path`, `source`, `source_vm`,
//!    `source_disk` or `parent_path`, (re)creates the disk.
//! 2. Otherwise a size change on a disk without a parent resizes it.
//! 3. The disk is always read back afterwards.
//!
//! Recreation wins over resizing: the create request carries the desired size.

pub mod api;
pub mod attributes;
pub mod context;
pub mod controller;
pub mod error;
pub mod executor;
pub mod plan;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use api::DiskApi;
pub use attributes::{Attribute, ChangeSet, DiskSpec, DiskStatus, ObservedState};
pub use context::{CancelToken, NoProgress, ProgressCallback};
pub use controller::Controller;
pub use error::{Error, Result};
pub use executor::{Operation, apply_all, execute};
pub use plan::{Action, Plan};
pub use store::{AttributeStore, MemoryStore};
pub use types::{ApplyResult, ExecuteOptions, ExecuteSummary};
