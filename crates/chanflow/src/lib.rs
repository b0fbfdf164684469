//! Chanflow - Closable FIFO Channels with Deferred Delivery
//!
//! A channel pairs an unbounded FIFO of values with an unbounded FIFO of
//! waiting consumers. Each value is handed to exactly one consumer, in order,
//! and every hand-off runs on a later turn of a [`Scheduler`] rather than on
//! the producer's or consumer's call stack.
//!
//! Closing a channel appends [`Message::End`]; buffered values are still
//! delivered, everything put afterwards is discarded. Channels compose with
//! [`pipe`], [`merge`] (fan-in) and [`mux`] (fan-out), whose
//! [`ClosePolicy`] decides whether a source's close reaches its destinations.
//!
//! # Key Features
//!
//! - Tagged `Value(T) | End` messages instead of an in-band sentinel
//! - Strict FIFO for values and for waiting consumers
//! - Deferred, non-reentrant delivery through a pluggable scheduler
//! - Standing subscriptions that never grow the call stack
//!
//! # Example
//!
//! ```
//! use chanflow::{merge, Message, RunLoop, KEEP_OPEN};
//! use std::sync::{Arc, Mutex};
//!
//! let run_loop = Arc::new(RunLoop::new());
//! let left = run_loop.channel::<u32>();
//! let right = run_loop.channel::<u32>();
//! let output = run_loop.channel::<u32>();
//!
//! merge(&[left.clone(), right.clone()], &output, KEEP_OPEN, |v| v + 1);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! output.for_each(move |message| sink.lock().unwrap().push(message));
//!
//! left.put(1);
//! right.put(10);
//! run_loop.run_until_idle();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![Message::Value(2), Message::Value(11)]);
//! ```

mod channel;
mod config;
mod invariants;
mod merge;
mod message;
mod metrics;
mod mux;
mod pipe;
mod scheduler;

pub use channel::{Channel, TryPutError};
pub use config::{Config, BULK_CONFIG, DEFAULT_CONFIG, SMALL_CONFIG};
pub use merge::merge;
pub use message::{identity, ClosePolicy, Message, CLOSE_BOTH, KEEP_OPEN};
pub use metrics::Metrics;
pub use mux::mux;
pub use pipe::{pipe, pipe_into};
pub use scheduler::{RunLoop, RunLoopError, Scheduler, Task};
