//! Values as they travel through a channel, and close-propagation policies.

/// A single item in a channel's stream: either a payload or the end marker.
///
/// `End` is the close sentinel. It is accepted into a channel at most once
/// and is always the last message a channel ever delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message<T> {
    /// An ordinary payload.
    Value(T),
    /// No further values will be produced.
    End,
}

impl<T> Message<T> {
    /// Returns `true` for the close sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` for an ordinary payload.
    #[inline]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns the payload, or `None` for the close sentinel.
    #[inline]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::End => None,
        }
    }

    /// Borrows the payload, or `None` for the close sentinel.
    #[inline]
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::End => None,
        }
    }

    /// Applies `f` to the payload. `End` passes through untouched.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Message<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Value(value) => Message::Value(f(value)),
            Self::End => Message::End,
        }
    }
}

impl<T> From<T> for Message<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

/// What a composition operator does when its source delivers `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClosePolicy {
    /// Absorb the source's close; the destination stays open for other producers.
    #[default]
    KeepOpen,
    /// Forward the source's close, closing the destination too.
    CloseBoth,
}

impl ClosePolicy {
    /// Returns `true` if `message` should be forwarded to a destination.
    ///
    /// Payloads are always forwarded; `End` only under [`ClosePolicy::CloseBoth`].
    #[inline]
    pub fn propagates<T>(self, message: &Message<T>) -> bool {
        match message {
            Message::Value(_) => true,
            Message::End => self == Self::CloseBoth,
        }
    }
}

/// Shorthand for [`ClosePolicy::KeepOpen`].
pub const KEEP_OPEN: ClosePolicy = ClosePolicy::KeepOpen;

/// Shorthand for [`ClosePolicy::CloseBoth`].
pub const CLOSE_BOTH: ClosePolicy = ClosePolicy::CloseBoth;

/// The default transform for composition operators.
#[inline]
pub fn identity<T>(value: T) -> T {
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_passes_end_through() {
        let end: Message<u32> = Message::End;
        assert_eq!(end.map(|v| v * 2), Message::End);
        assert_eq!(Message::Value(4).map(|v| v * 2), Message::Value(8));
    }

    #[test]
    fn keep_open_absorbs_end_only() {
        assert!(KEEP_OPEN.propagates(&Message::Value(1)));
        assert!(!KEEP_OPEN.propagates::<u32>(&Message::End));
        assert!(CLOSE_BOTH.propagates::<u32>(&Message::End));
        assert_eq!(ClosePolicy::default(), KEEP_OPEN);
    }

    #[test]
    fn payload_accessors() {
        let msg = Message::from("a");
        assert!(msg.is_value());
        assert_eq!(msg.as_value(), Some(&"a"));
        assert_eq!(msg.into_value(), Some("a"));
        assert_eq!(Message::<&str>::End.into_value(), None);
    }
}
