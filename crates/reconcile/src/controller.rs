//! Executes reconciliation cycles for one disk at a time.

use crate::api::DiskApi;
use crate::attributes::{DiskSpec, DiskStatus, ObservedState};
use crate::context::CancelToken;
use crate::error::{Error, Result};
use crate::plan::{Action, Plan};
use crate::store::AttributeStore;
use crate::types::ApplyResult;
use psscript::Verb;

/// Drives a [`DiskApi`] towards the attributes in an [`AttributeStore`].
pub struct Controller<'a, A: DiskApi + ?Sized> {
    api: &'a A,
    cancel: CancelToken,
}

impl<'a, A: DiskApi + ?Sized> Controller<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            cancel: CancelToken::new(),
        }
    }

    /// Share a cancel token with other controllers.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Decide what [`apply`](Self::apply) would do, without any remote call.
    pub fn plan<S: AttributeStore + ?Sized>(&self, store: &S) -> Plan {
        Plan::compute(store.desired(), store.observed())
    }

    /// Run one cycle: create or resize as needed, then read the disk back.
    ///
    /// A failed create or resize ends the cycle before the read, leaving the
    /// previous observation in the store.
    pub fn apply<S: AttributeStore + ?Sized>(&self, store: &mut S) -> Result<ApplyResult> {
        let desired = store.desired().clone();
        validate(&desired)?;

        let plan = self.plan(store);
        let previously = store.observed().status;
        let unapplied = plan.unapplied();
        if !unapplied.is_empty() {
            let names: Vec<&str> = unapplied.iter().map(|a| a.as_str()).collect();
            log::warn!(
                "{}: {} differs from the host and is only set when the disk is created",
                desired.path,
                names.join(", ")
            );
        }
        let mut result = ApplyResult::NoChange;

        for action in &plan.actions {
            match *action {
                Action::CreateOrUpdate { replace } => {
                    self.checkpoint(Verb::CreateOrUpdate, &desired.path)?;
                    log::debug!(
                        "{} {}",
                        if replace { "Replacing" } else { "Creating" },
                        desired.path
                    );
                    self.api
                        .create_or_update(&desired.to_create(replace))
                        .map_err(|e| operation(Verb::CreateOrUpdate, &desired.path, e))?;
                    store.set_id(&desired.path);
                    result = match (replace, previously) {
                        (true, _) => ApplyResult::Replaced,
                        (false, DiskStatus::Unknown) => ApplyResult::Ensured,
                        (false, _) => ApplyResult::Created,
                    };
                }
                Action::Resize { size } => {
                    self.checkpoint(Verb::Resize, &desired.path)?;
                    log::debug!("Resizing {} to {} bytes", desired.path, size);
                    self.api
                        .resize(&desired.path, size)
                        .map_err(|e| operation(Verb::Resize, &desired.path, e))?;
                    result = ApplyResult::Modified;
                }
                Action::Refresh => {
                    let observed = self.read(store, plan.creates())?;
                    if !observed.exists() {
                        log::warn!("{} not found after apply", desired.path);
                        store.set_id("");
                    }
                    store.set_observed(observed);
                }
            }
        }

        Ok(result)
    }

    /// Read the disk and record what the host reports.
    pub fn refresh<S: AttributeStore + ?Sized>(&self, store: &mut S) -> Result<ObservedState> {
        require_path(store.desired())?;
        let observed = self.read(store, false)?;
        if !observed.exists() {
            store.set_id("");
        }
        store.set_observed(observed.clone());
        Ok(observed)
    }

    /// Delete the disk and mark it absent.
    ///
    /// A failed delete leaves the previous observation in the store.
    pub fn destroy<S: AttributeStore + ?Sized>(&self, store: &mut S) -> Result<ApplyResult> {
        let path = store.desired().path.clone();
        require_path(store.desired())?;

        self.checkpoint(Verb::Delete, &path)?;
        log::debug!("Deleting {path}");
        self.api
            .delete(&path)
            .map_err(|e| operation(Verb::Delete, &path, e))?;

        store.set_observed(ObservedState::absent());
        store.set_id("");
        Ok(ApplyResult::Removed)
    }

    fn read<S: AttributeStore + ?Sized>(&self, store: &S, created: bool) -> Result<ObservedState> {
        let desired = store.desired();
        self.checkpoint(Verb::Read, &desired.path)?;

        let vhd = self
            .api
            .get(&desired.path)
            .map_err(|e| operation(Verb::Read, &desired.path, e))?;

        // Creation attributes cannot be read back. Without a previous record
        // of the disk they are taken from the desired spec.
        let previous = store.observed();
        let creation = if created || !previous.exists() {
            desired
        } else {
            &previous.attributes
        };

        Ok(ObservedState::from_read(&desired.path, &vhd, creation))
    }

    fn checkpoint(&self, verb: Verb, path: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                verb,
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

fn validate(desired: &DiskSpec) -> Result<()> {
    desired.validate().map_err(|message| Error::Invalid {
        path: desired.path.clone(),
        message,
    })
}

fn require_path(desired: &DiskSpec) -> Result<()> {
    if desired.path.trim().is_empty() {
        return Err(Error::Invalid {
            path: String::new(),
            message: "path argument is required".to_string(),
        });
    }
    if hvclient::file_stem(&desired.path).trim().is_empty() {
        return Err(Error::Invalid {
            path: desired.path.clone(),
            message: "path does not name a disk file".to_string(),
        });
    }
    Ok(())
}

fn operation(verb: Verb, path: &str, source: hvclient::Error) -> Error {
    Error::Operation {
        verb,
        path: path.to_string(),
        source,
    }
}
