//! Bounded worker pool over the VM list.

use crate::models::VmSpec;
use crate::BoxError;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;

/// Run `f` for every VM with at most `concurrency` calls in flight and
/// return once all of them finished. This is the join barrier between
/// pipeline phases.
///
/// Results come back in list order. The first error ends the phase: work
/// still in flight is dropped and the error is returned.
pub async fn for_each_vm<'a, T, F, Fut>(
    specs: &'a [VmSpec],
    concurrency: usize,
    f: F,
) -> Result<Vec<T>, BoxError>
where
    F: Fn(&'a VmSpec) -> Fut,
    Fut: Future<Output = Result<T, BoxError>> + 'a,
{
    let concurrency = concurrency.max(1);
    log::debug!(
        "for_each_vm: {} VM(s), {} at a time",
        specs.len(),
        concurrency
    );
    stream::iter(specs.iter().map(f))
        .buffered(concurrency)
        .try_collect()
        .await
}
