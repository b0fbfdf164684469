#[cfg(debug_assertions)]
use crate::invariants::{
    debug_assert_end_at_tail, debug_assert_no_idle_match, debug_assert_not_drained,
    debug_assert_open_for_append,
};
use crate::{Config, Message, Metrics, Scheduler};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, trace};

/// Error returned by [`Channel::try_put`] when the channel is closed.
///
/// The rejected value is handed back to the caller.
#[derive(PartialEq, Eq, Clone, Error)]
#[error("channel is closed")]
pub struct TryPutError<T>(pub T);

impl<T> TryPutError<T> {
    /// Consumes the error, returning the rejected value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for TryPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryPutError(..)")
    }
}

/// A consumer waiting for exactly one message.
type Consumer<T> = Box<dyn FnOnce(Message<T>) + Send + 'static>;

/// Closable FIFO channel with deferred delivery.
///
/// A channel owns two unbounded FIFO queues: buffered messages and waiting
/// consumers. Whenever both are non-empty, the oldest message is paired with
/// the oldest consumer and the invocation is handed to the channel's
/// [`Scheduler`]. Consumers therefore never run on the stack of the `put` or
/// `take` call that produced the match.
///
/// `Channel` is a cheap handle; clones share the same queues.
///
/// # Closing
///
/// [`close`](Self::close) appends [`Message::End`]. After that every `put`
/// is discarded, buffered messages (END included) are still delivered in
/// order, and once END has been handed out `take` becomes a no-op.
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

struct ChannelInner<T> {
    state: Mutex<State<T>>,
    scheduler: Arc<dyn Scheduler>,
    label: &'static str,
}

struct State<T> {
    buffer: VecDeque<Message<T>>,
    consumers: VecDeque<Consumer<T>>,
    closed: bool,
    metrics: Metrics,
}

impl<T> State<T> {
    #[inline]
    fn is_drained(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }
}

impl<T: Send + 'static> Channel<T> {
    /// Creates an empty, open channel delivering through `scheduler`.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_config(scheduler, Config::default())
    }

    /// Creates an empty, open channel with the given configuration.
    pub fn with_config(scheduler: Arc<dyn Scheduler>, config: Config) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                state: Mutex::new(State {
                    buffer: VecDeque::with_capacity(config.buffer_capacity),
                    consumers: VecDeque::with_capacity(config.consumer_capacity),
                    closed: false,
                    metrics: Metrics::new(),
                }),
                scheduler,
                label: config.label.unwrap_or("anonymous"),
            }),
        }
    }

    /// Puts a payload into the channel. Discarded if the channel is closed.
    pub fn put(&self, value: T) -> &Self {
        self.put_message(Message::Value(value))
    }

    /// Puts a payload or the close sentinel into the channel.
    ///
    /// On a closed channel this is a no-op, including for a second `End`.
    pub fn put_message(&self, message: Message<T>) -> &Self {
        let mut state = self.inner.state.lock();

        if state.closed {
            state.metrics.values_dropped += 1;
            trace!(
                channel = self.inner.label,
                end = message.is_end(),
                "put on closed channel discarded"
            );
            return self;
        }

        self.accept(&mut state, message);
        self
    }

    /// Puts a payload, handing it back if the channel is already closed.
    pub fn try_put(&self, value: T) -> Result<(), TryPutError<T>> {
        let mut state = self.inner.state.lock();

        if state.closed {
            state.metrics.values_dropped += 1;
            return Err(TryPutError(value));
        }

        self.accept(&mut state, Message::Value(value));
        Ok(())
    }

    /// Closes the channel by putting [`Message::End`]. Idempotent.
    pub fn close(&self) -> &Self {
        self.put_message(Message::End)
    }

    /// Registers `consumer` to receive the next unclaimed message.
    ///
    /// The consumer runs exactly once, on a later scheduler turn. If the
    /// channel is closed and drained, the consumer is dropped without being
    /// stored or invoked.
    pub fn take<F>(&self, consumer: F) -> &Self
    where
        F: FnOnce(Message<T>) + Send + 'static,
    {
        let mut state = self.inner.state.lock();

        if state.is_drained() {
            state.metrics.takes_ignored += 1;
            trace!(channel = self.inner.label, "take on drained channel ignored");
            return self;
        }

        #[cfg(debug_assertions)]
        debug_assert_not_drained!(state.closed, state.buffer.len());

        state.metrics.consumers_registered += 1;
        state.consumers.push_back(Box::new(consumer));
        self.run_matches(&mut state);
        self
    }

    /// Installs a standing consumer that receives every message until `End`.
    ///
    /// After each payload the consumer registers itself again; it sees `End`
    /// once and is then dropped. On a closed and drained channel nothing is
    /// registered.
    ///
    /// Several processing stages are expressed by composing them inside the
    /// one consumer; each message runs through all of them, in order, before
    /// the next registration.
    ///
    /// ```
    /// use chanflow::{Message, RunLoop};
    /// use std::sync::{Arc, Mutex};
    ///
    /// let run_loop = Arc::new(RunLoop::new());
    /// let channel = run_loop.channel::<u32>();
    /// let total = Arc::new(Mutex::new(0));
    ///
    /// let sum = Arc::clone(&total);
    /// let double = |m: Message<u32>| m.map(|v| v * 2);
    /// let add = move |m: Message<u32>| {
    ///     if let Message::Value(v) = m {
    ///         *sum.lock().unwrap() += v;
    ///     }
    /// };
    /// channel.for_each(move |m| add(double(m)));
    ///
    /// channel.put(1).put(2).close();
    /// run_loop.run_until_idle();
    /// assert_eq!(*total.lock().unwrap(), 6);
    /// ```
    pub fn for_each<F>(&self, consumer: F) -> &Self
    where
        F: FnMut(Message<T>) + Send + 'static,
    {
        subscribe(self, consumer);
        self
    }

    /// Appends `message` to the buffer of an open channel and runs the matching step.
    fn accept(&self, state: &mut State<T>, message: Message<T>) {
        #[cfg(debug_assertions)]
        debug_assert_open_for_append!(state.closed);

        if message.is_end() {
            state.closed = true;
            debug!(
                channel = self.inner.label,
                buffered = state.buffer.len(),
                "channel closed"
            );
        } else {
            state.metrics.values_put += 1;
        }
        state.buffer.push_back(message);

        #[cfg(debug_assertions)]
        debug_assert_end_at_tail!(state.closed, state.buffer);

        self.run_matches(state);
    }

    /// Pairs buffered messages with waiting consumers and schedules each pair.
    ///
    /// Runs under the state lock so the scheduler observes deliveries in
    /// match order even with concurrent producers.
    fn run_matches(&self, state: &mut State<T>) {
        while !state.buffer.is_empty() && !state.consumers.is_empty() {
            let (Some(message), Some(consumer)) =
                (state.buffer.pop_front(), state.consumers.pop_front())
            else {
                break;
            };

            state.metrics.deliveries += 1;
            trace!(
                channel = self.inner.label,
                end = message.is_end(),
                "delivery scheduled"
            );
            // A channel outlives its deliveries in flight, so a subscription
            // re-arming from inside `consumer` still finds it.
            let keep_alive = Arc::clone(&self.inner);
            self.inner.scheduler.schedule(Box::new(move || {
                consumer(message);
                drop(keep_alive);
            }));
        }

        #[cfg(debug_assertions)]
        debug_assert_no_idle_match!(state.buffer.len(), state.consumers.len());
    }
}

impl<T> Channel<T> {
    /// Returns `true` once `End` has been accepted.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Returns `true` once the channel is closed and every buffered message,
    /// `End` included, has been handed to a consumer.
    pub fn is_drained(&self) -> bool {
        self.inner.state.lock().is_drained()
    }

    /// Number of buffered messages not yet matched with a consumer.
    pub fn buffered(&self) -> usize {
        self.inner.state.lock().buffer.len()
    }

    /// Number of consumers waiting for a message.
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().consumers.len()
    }

    /// Snapshot of this channel's counters.
    pub fn metrics(&self) -> Metrics {
        self.inner.state.lock().metrics
    }

    /// Label reported in log events.
    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    /// Returns `true` if both handles refer to the same channel.
    pub fn same_channel(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Channel<T> {
    /// Clones the buffered messages in delivery order.
    pub fn snapshot(&self) -> Vec<Message<T>> {
        self.inner.state.lock().buffer.iter().cloned().collect()
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Channel")
            .field("label", &self.inner.label)
            .field("buffered", &state.buffer.len())
            .field("waiting", &state.consumers.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Registers `consumer` on `channel` and re-registers it after every payload.
///
/// Ownership of the consumer moves from one delivery to the next; each
/// re-registration happens inside a scheduler turn, so the chain never grows
/// the call stack. The waiting consumer only holds a weak reference to its
/// channel: once every handle is gone and no delivery is in flight, the
/// channel is freed together with the subscription.
pub(crate) fn subscribe<T, F>(channel: &Channel<T>, consumer: F)
where
    T: Send + 'static,
    F: FnMut(Message<T>) + Send + 'static,
{
    arm(channel, Arc::downgrade(&channel.inner), consumer);
}

fn arm<T, F>(channel: &Channel<T>, source: Weak<ChannelInner<T>>, mut consumer: F)
where
    T: Send + 'static,
    F: FnMut(Message<T>) + Send + 'static,
{
    let label = channel.label();
    channel.take(move |message| {
        let end = message.is_end();
        consumer(message);
        if end {
            trace!(channel = label, "subscription finished");
            return;
        }
        match source.upgrade() {
            Some(inner) => arm(&Channel { inner }, source, consumer),
            None => trace!(channel = label, "subscription source dropped"),
        }
    });
}
