use std::sync::{LockResult, PoisonError};

/// Takes the guard out of a poisoned lock result.
///
/// Every mutation behind our internal locks finishes before any user code
/// runs, so a panic elsewhere cannot leave the protected state half-updated.
#[inline]
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(PoisonError::into_inner)
}
