//! Fan-in: many source channels piped into one destination.

use crate::{pipe, Channel, ClosePolicy};
use std::sync::Arc;

/// Installs an independent [`pipe`] from every channel in `sources` into
/// `destination`, sharing `policy` and `transform`.
///
/// Payloads keep their order per source; there is no ordering across
/// sources. Under [`ClosePolicy::CloseBoth`] the first source to close also
/// closes `destination`, and payloads still arriving from the other sources
/// are discarded by the closed destination.
pub fn merge<'a, T, U, F>(
    sources: &[Channel<T>],
    destination: &'a Channel<U>,
    policy: ClosePolicy,
    transform: F,
) -> &'a Channel<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let transform = Arc::new(transform);
    for source in sources {
        let transform = Arc::clone(&transform);
        pipe(source, destination, policy, move |value| (*transform)(value));
    }
    destination
}
