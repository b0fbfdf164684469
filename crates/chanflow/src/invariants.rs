//! Debug assertion macros for channel invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`); release builds
//! carry no overhead.

// =============================================================================
// No idle match
// =============================================================================

/// Assert that the matching step left at most one queue non-empty.
///
/// **Invariant**: `buffer.is_empty() || consumers.is_empty()` at rest
///
/// Used in: `Channel::run_matches()` after the matching loop
macro_rules! debug_assert_no_idle_match {
    ($buffered:expr, $waiting:expr) => {
        debug_assert!(
            $buffered == 0 || $waiting == 0,
            "idle match: {} buffered values left beside {} waiting consumers",
            $buffered,
            $waiting
        )
    };
}

// =============================================================================
// END is terminal
// =============================================================================

/// Assert that nothing is appended to the buffer after END was accepted.
///
/// **Invariant**: `closed → no append`
///
/// Used in: `Channel::put_message()` before pushing onto the buffer
macro_rules! debug_assert_open_for_append {
    ($closed:expr) => {
        debug_assert!(!$closed, "append attempted on a closed channel")
    };
}

/// Assert that END, when buffered, sits at the tail of the buffer.
///
/// **Invariant**: `closed → buffer.back() == End` while the buffer is non-empty
///
/// Used in: `Channel::put_message()` after accepting END
macro_rules! debug_assert_end_at_tail {
    ($closed:expr, $buffer:expr) => {
        debug_assert!(
            !$closed || $buffer.back().map_or(true, |m: &$crate::Message<_>| m.is_end()),
            "END is not the last buffered message of a closed channel"
        )
    };
}

// =============================================================================
// No lingering consumer
// =============================================================================

/// Assert that a consumer is never registered on a closed, drained channel.
///
/// **Invariant**: `closed && buffer.is_empty() → take is a no-op`
///
/// Used in: `Channel::take()` before pushing onto the consumer queue
macro_rules! debug_assert_not_drained {
    ($closed:expr, $buffered:expr) => {
        debug_assert!(
            !$closed || $buffered > 0,
            "consumer registered on a closed and drained channel"
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_end_at_tail;
pub(crate) use debug_assert_no_idle_match;
pub(crate) use debug_assert_not_drained;
pub(crate) use debug_assert_open_for_append;
