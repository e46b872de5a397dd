//! # psscript
//!
//! Parameterized PowerShell script templates for remote Hyper-V hosts.
//!
//! A [`ScriptTemplate`] pairs a logical operation ([`Verb`]) with a static
//! PowerShell body. Rendering a template embeds a typed argument structure
//! as a single JSON document inside an escaped single-quoted literal, which
//! the script decodes host-side with `ConvertFrom-Json`. No argument value is
//! ever spliced into the script text itself.
//!
//! Templates are collected in an explicit [`TemplateRegistry`] that callers
//! construct at startup and hand to whoever renders scripts.
//!
//! ## Example
//!
//! ```
//! use psscript::{TemplateRegistry, Verb};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct ResizeArgs<'a> {
//!     path: &'a str,
//!     size: u64,
//! }
//!
//! let registry = TemplateRegistry::hyperv();
//! let script = registry
//!     .render(Verb::Resize, &ResizeArgs { path: r"C:\vms\it's.vhdx", size: 1 << 30 })
//!     .unwrap();
//!
//! assert!(script.text().contains(r"it''s.vhdx"));
//! ```

pub mod error;
pub mod hyperv;
pub mod quote;
pub mod registry;
pub mod template;

pub use error::{Error, Result};
pub use quote::quote;
pub use registry::TemplateRegistry;
pub use template::{Script, ScriptTemplate, Verb};
