//! Standing forwarding subscription from one channel into another.

use crate::channel::subscribe;
use crate::{Channel, ClosePolicy};
use tracing::trace;

/// Forwards every message of `source` into `destination`, applying `transform`
/// to payloads.
///
/// The pipe re-registers on `source` after each payload and terminates when
/// `source` delivers `End`. Under [`ClosePolicy::KeepOpen`] that `End` is
/// absorbed; under [`ClosePolicy::CloseBoth`] it is forwarded untransformed
/// and closes `destination`.
///
/// Returns `destination` immediately; forwarding happens on later scheduler
/// turns.
///
/// # Example
///
/// ```
/// use chanflow::{pipe, Message, RunLoop, KEEP_OPEN};
/// use std::sync::Arc;
///
/// let run_loop = Arc::new(RunLoop::new());
/// let input = run_loop.channel::<u32>();
/// let output = run_loop.channel::<u32>();
///
/// pipe(&input, &output, KEEP_OPEN, |v| v * 2);
/// input.put(3);
/// output.take(|message| assert_eq!(message, Message::Value(6)));
/// run_loop.run_until_idle();
/// ```
pub fn pipe<'a, T, U, F>(
    source: &Channel<T>,
    destination: &'a Channel<U>,
    policy: ClosePolicy,
    transform: F,
) -> &'a Channel<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + 'static,
{
    let sink = destination.clone();
    let from = source.label();
    subscribe(source, move |message| {
        if policy.propagates(&message) {
            sink.put_message(message.map(&transform));
        } else {
            trace!(from, to = sink.label(), "pipe absorbed close");
        }
    });
    destination
}

/// [`pipe`] with [`ClosePolicy::KeepOpen`] and no transform.
pub fn pipe_into<'a, T>(source: &Channel<T>, destination: &'a Channel<T>) -> &'a Channel<T>
where
    T: Send + 'static,
{
    pipe(source, destination, ClosePolicy::KeepOpen, crate::identity)
}
