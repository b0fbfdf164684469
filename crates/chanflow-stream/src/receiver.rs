//! Async receiver implementing `futures::Stream`.

use chanflow::{Channel, Message};
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::trace;

/// Async stream receiver wrapping a chanflow [`Channel`].
///
/// Each poll without an outstanding request registers exactly one `take` on
/// the channel. The consumer hands the message over through a oneshot and
/// wakes the polling task, so payloads are yielded in channel order.
///
/// The stream ends after the channel delivers `End`. It also ends when the
/// channel drops the request without delivering it, which is what a closed
/// and drained channel does with every `take`.
///
/// # Cancellation
///
/// Dropping the receiver is not cancellation-safe. A request registered
/// before the drop still consumes one message from the channel, and that
/// message is lost with the receiver (reported as a `trace!` event). Keep the
/// receiver alive across `select!` branches or `timeout`s that may fire
/// instead of recreating it.
#[derive(Debug)]
pub struct ChannelReceiver<T> {
    channel: Channel<T>,
    pending: Option<oneshot::Receiver<Message<T>>>,
    finished: bool,
}

impl<T: Send + 'static> ChannelReceiver<T> {
    /// Creates a receiver consuming from `channel`.
    pub fn new(channel: Channel<T>) -> Self {
        Self {
            channel,
            pending: None,
            finished: false,
        }
    }

    /// Returns `true` once the stream has yielded `None`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    fn request(channel: &Channel<T>) -> oneshot::Receiver<Message<T>> {
        let (tx, rx) = oneshot::channel();
        let label = channel.label();
        channel.take(move |message| {
            if let Err(message) = tx.send(message) {
                trace!(
                    channel = label,
                    end = message.is_end(),
                    "receiver dropped before delivery, message lost"
                );
            }
        });
        rx
    }
}

impl<T: Send + 'static> Stream for ChannelReceiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if this.pending.is_none() {
            this.pending = Some(Self::request(&this.channel));
        }
        let Some(rx) = this.pending.as_mut() else {
            return Poll::Pending;
        };

        match Pin::new(rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Message::Value(value))) => {
                this.pending = None;
                Poll::Ready(Some(value))
            }
            Poll::Ready(Ok(Message::End)) => {
                trace!(channel = this.channel.label(), "receiver reached end");
                this.pending = None;
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Ready(Err(_)) => {
                trace!(channel = this.channel.label(), "request dropped by channel");
                this.pending = None;
                this.finished = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<T> Drop for ChannelReceiver<T> {
    fn drop(&mut self) {
        let Some(mut rx) = self.pending.take() else {
            return;
        };
        rx.close();
        if let Ok(message) = rx.try_recv() {
            trace!(
                channel = self.channel.label(),
                end = message.is_end(),
                "receiver dropped with an undelivered message, message lost"
            );
        }
    }
}
