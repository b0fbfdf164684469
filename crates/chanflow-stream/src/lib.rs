//! Async Stream/Sink Adapters for chanflow
//!
//! This crate runs chanflow deliveries on tokio and exposes channels as
//! [`futures_core::Stream`] and [`futures_sink::Sink`].
//!
//! # Features
//!
//! - **Ordered scheduling**: [`TokioScheduler`] feeds one worker task through an
//!   unbounded queue, so deliveries run one at a time in scheduling order
//! - **Stream receiver**: one outstanding `take` per poll, ends after `End`
//! - **Sink sender**: rejects payloads once the channel is closed
//!
//! # Example
//!
//! ```ignore
//! use chanflow::{pipe, CLOSE_BOTH};
//! use chanflow_stream::{ChannelReceiver, TokioScheduler, StreamExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scheduler = TokioScheduler::spawn();
//!     let input = scheduler.channel::<u64>();
//!     let output = scheduler.channel::<u64>();
//!     pipe(&input, &output, CLOSE_BOTH, |v| v * 2);
//!
//!     input.put(21).close();
//!
//!     let mut rx = ChannelReceiver::new(output);
//!     while let Some(item) = rx.next().await {
//!         println!("Received: {}", item);
//!     }
//! }
//! ```

mod error;
mod receiver;
mod scheduler;
mod sender;

pub use error::StreamError;
pub use receiver::ChannelReceiver;
pub use scheduler::TokioScheduler;
pub use sender::ChannelSender;

// Re-export useful stream combinators
pub use tokio_stream::StreamExt;
