//! Async sender implementing `futures::Sink`.

use crate::error::StreamError;
use chanflow::Channel;
use futures_sink::Sink;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sink sender wrapping a chanflow [`Channel`].
///
/// Channels are unbounded, so the sink is always ready while the channel is
/// open. Once the channel is closed every send fails with
/// [`StreamError::Closed`] instead of being silently discarded.
///
/// `ChannelSender` is `Clone`; clones feed the same channel.
#[derive(Debug)]
pub struct ChannelSender<T> {
    channel: Channel<T>,
}

impl<T> Clone for ChannelSender<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

impl<T: Send + 'static> ChannelSender<T> {
    /// Creates a sender feeding `channel`.
    pub fn new(channel: Channel<T>) -> Self {
        Self { channel }
    }

    /// Puts `item` into the channel.
    ///
    /// Never waits; returns [`StreamError::Closed`] if the channel is closed.
    pub fn send(&self, item: T) -> Result<(), StreamError> {
        self.channel
            .try_put(item)
            .map_err(|_| StreamError::Closed)
    }

    /// Returns `true` if the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Closes the channel. Idempotent.
    pub fn close(&self) {
        self.channel.close();
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }
}

impl<T: Send + 'static> Sink<T> for ChannelSender<T> {
    type Error = StreamError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.channel.is_closed() {
            return Poll::Ready(Err(StreamError::Closed));
        }
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: T) -> Result<(), Self::Error> {
        self.send(item)
    }

    /// Items are in the channel as soon as `start_send` returns.
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    /// Closes the channel, which lets receivers finish after draining it.
    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.channel.close();
        Poll::Ready(Ok(()))
    }
}
