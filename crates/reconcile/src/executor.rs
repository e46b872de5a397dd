//! Batch execution - reconciles independent disks on a thread pool

use crate::api::DiskApi;
use crate::context::{CancelToken, NoProgress, ProgressCallback};
use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::store::AttributeStore;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use hvclient::retry::{LogCallback, with_retry};
use rayon::prelude::*;

/// What to run for each instance of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// A full reconciliation cycle
    Apply,
    /// Read-only refresh of the observed state
    Refresh,
    /// Delete the disk
    Destroy,
}

/// Run `operation` for every store.
///
/// Instances are independent and may run concurrently, up to `opts.jobs`
/// at a time. Failures are counted in the summary rather than returned;
/// the only error is a thread pool that cannot be built.
pub fn execute<A, S, P>(
    api: &A,
    stores: &mut [S],
    operation: Operation,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ExecuteSummary>
where
    A: DiskApi + ?Sized,
    S: AttributeStore + Send,
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();
    if stores.is_empty() {
        return Ok(summary);
    }

    let cancel = CancelToken::new();
    progress.on_batch_start(stores.len());

    if opts.jobs <= 1 || stores.len() == 1 {
        for store in stores.iter_mut() {
            let id = store.desired().path.clone();
            progress.on_resource_start(&id);
            let result = run_one(api, store, operation, opts, &cancel);
            progress.on_resource_complete(&id, &result);
            summary.add_result(&result);
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.jobs)
            .build()?;

        // The progress callback is not thread-safe: every instance is
        // reported as started up front, and results once the pool is done.
        for store in stores.iter() {
            progress.on_resource_start(&store.desired().path);
        }
        let results: Vec<(String, ApplyResult)> = pool.install(|| {
            stores
                .par_iter_mut()
                .map(|store| {
                    let id = store.desired().path.clone();
                    let result = run_one(api, store, operation, opts, &cancel);
                    (id, result)
                })
                .collect()
        });

        for (id, result) in &results {
            progress.on_resource_complete(id, result);
            summary.add_result(result);
        }
    }

    progress.on_batch_complete();
    Ok(summary)
}

/// Apply every store without progress reporting.
pub fn apply_all<A, S>(api: &A, stores: &mut [S], opts: &ExecuteOptions) -> Result<ExecuteSummary>
where
    A: DiskApi + ?Sized,
    S: AttributeStore + Send,
{
    execute(api, stores, Operation::Apply, opts, &mut NoProgress)
}

fn run_one<A, S>(
    api: &A,
    store: &mut S,
    operation: Operation,
    opts: &ExecuteOptions,
    cancel: &CancelToken,
) -> ApplyResult
where
    A: DiskApi + ?Sized,
    S: AttributeStore,
{
    let controller = Controller::new(api).with_cancel(cancel.clone());

    let outcome = with_retry(&opts.retry, Some(&LogCallback), Error::client_error, || {
        match operation {
            Operation::Apply => controller.apply(store),
            Operation::Refresh => controller.refresh(store).map(|_| ApplyResult::NoChange),
            Operation::Destroy => controller.destroy(store),
        }
    });

    match outcome {
        Ok(result) => result,
        Err(Error::Cancelled { verb, .. }) => ApplyResult::Skipped {
            reason: format!("cancelled before {verb}"),
        },
        Err(e) => {
            log::debug!("{operation:?} failed: {e}");
            if opts.fail_fast {
                cancel.cancel();
            }
            ApplyResult::Failed {
                error: e.to_string(),
            }
        }
    }
}
