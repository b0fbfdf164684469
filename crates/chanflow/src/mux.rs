//! Fan-out: one source channel republished into many destinations.

use crate::channel::subscribe;
use crate::{Channel, ClosePolicy, Message};

/// Republishes every message of `source` into each channel in `destinations`.
///
/// Each payload is transformed once and put into every destination
/// independently, so a closed destination does not affect the others. The
/// consumer re-registers on `source` until `End`, which is forwarded to all
/// destinations only under [`ClosePolicy::CloseBoth`].
pub fn mux<'a, T, U, F>(
    source: &Channel<T>,
    destinations: &'a [Channel<U>],
    policy: ClosePolicy,
    transform: F,
) -> &'a [Channel<U>]
where
    T: Send + 'static,
    U: Clone + Send + 'static,
    F: Fn(T) -> U + Send + 'static,
{
    let sinks = destinations.to_vec();
    subscribe(source, move |message| {
        if !policy.propagates(&message) {
            return;
        }
        match message.map(&transform) {
            Message::Value(value) => {
                if let Some((last, rest)) = sinks.split_last() {
                    for sink in rest {
                        sink.put(value.clone());
                    }
                    last.put(value);
                }
            }
            Message::End => {
                for sink in &sinks {
                    sink.close();
                }
            }
        }
    });
    destinations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RunLoop, CLOSE_BOTH, KEEP_OPEN};
    use std::sync::Arc;

    #[test]
    fn every_destination_receives_every_value() {
        let run_loop = Arc::new(RunLoop::new());
        let input = run_loop.channel::<u32>();
        let outputs: Vec<Channel<u32>> = (0..3).map(|_| run_loop.channel()).collect();

        mux(&input, &outputs, KEEP_OPEN, |v| v * 10);
        input.put(1).put(2).close();
        run_loop.run_until_idle();

        for output in &outputs {
            assert_eq!(output.snapshot(), vec![Message::Value(10), Message::Value(20)]);
            assert!(!output.is_closed());
        }
    }

    #[test]
    fn closed_destination_does_not_block_others() {
        let run_loop = Arc::new(RunLoop::new());
        let input = run_loop.channel::<&str>();
        let outputs: Vec<Channel<&str>> = (0..2).map(|_| run_loop.channel()).collect();

        outputs[0].close();
        mux(&input, &outputs, CLOSE_BOTH, crate::identity);
        input.put("x").close();
        run_loop.run_until_idle();

        assert_eq!(outputs[0].snapshot(), vec![Message::End]);
        assert_eq!(outputs[1].snapshot(), vec![Message::Value("x"), Message::End]);
    }

    #[test]
    fn empty_destination_set_still_drains_source() {
        let run_loop = Arc::new(RunLoop::new());
        let input = run_loop.channel::<u32>();

        let outputs: Vec<Channel<u32>> = Vec::new();
        assert!(mux(&input, &outputs, KEEP_OPEN, crate::identity).is_empty());
        input.put(5).close();
        run_loop.run_until_idle();

        assert!(input.is_drained());
    }

    #[test]
    fn dropping_every_handle_frees_muxed_channels() {
        let run_loop = Arc::new(RunLoop::new());
        let input = run_loop.channel::<u32>();
        let outputs: Vec<Channel<u32>> = (0..2).map(|_| run_loop.channel()).collect();

        mux(&input, &outputs, CLOSE_BOTH, crate::identity);
        input.put(3);
        run_loop.run_until_idle();

        drop(input);
        drop(outputs);
        assert_eq!(Arc::strong_count(&run_loop), 1);
    }
}
