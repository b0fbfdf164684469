use chanflow::{
    identity, merge, mux, pipe, Channel, Config, Message, RunLoop, RunLoopError, CLOSE_BOTH,
    KEEP_OPEN,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Attaches a standing consumer that records every message it sees.
fn record<T: Send + 'static>(channel: &Channel<T>) -> Arc<Mutex<Vec<Message<T>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    channel.for_each(move |message| sink.lock().push(message));
    seen
}

#[test]
fn test_values_after_end_are_never_delivered() {
    init_tracing();
    let run_loop = Arc::new(RunLoop::new());
    let channel = run_loop.channel::<u32>();

    channel.put(5);
    channel.put_message(Message::End);
    channel.put(6);
    let seen = record(&channel);
    run_loop.run_until_idle();

    assert_eq!(*seen.lock(), vec![Message::Value(5), Message::End]);
}

#[test]
fn test_double_close_yields_one_end() {
    let run_loop = Arc::new(RunLoop::new());
    let channel = run_loop.channel::<u32>();

    channel.close().close();
    assert_eq!(channel.snapshot(), vec![Message::End]);
    let seen = record(&channel);
    run_loop.run_until_idle();

    assert_eq!(*seen.lock(), vec![Message::End]);
    assert_eq!(channel.metrics().values_dropped, 1);
}

#[test]
fn test_pipe_transform_and_keep_open() {
    init_tracing();
    let run_loop = Arc::new(RunLoop::new());
    let input = run_loop.channel::<i64>();
    let output = run_loop.channel::<i64>();

    pipe(&input, &output, KEEP_OPEN, |v| v * 2);
    let seen = record(&output);

    input.put(3);
    run_loop.run_until_idle();
    assert_eq!(*seen.lock(), vec![Message::Value(6)]);

    input.close();
    run_loop.run_until_idle();
    assert_eq!(*seen.lock(), vec![Message::Value(6)]);
    assert!(!output.is_closed());
}

#[test]
fn test_delivery_is_not_reentrant() {
    let run_loop = Arc::new(RunLoop::new());
    let channel = run_loop.channel::<u32>();
    let depth = Arc::new(Mutex::new(Vec::new()));

    // A consumer that puts back into its own channel must not observe its
    // own put before returning.
    let handle = channel.clone();
    let log = Arc::clone(&depth);
    channel.for_each(move |message| {
        if let Message::Value(v) = message {
            log.lock().push(("enter", v));
            if v < 3 {
                handle.put(v + 1);
            } else {
                handle.close();
            }
            log.lock().push(("exit", v));
        }
    });
    channel.put(1);
    run_loop.run_until_idle();

    assert_eq!(
        *depth.lock(),
        vec![
            ("enter", 1),
            ("exit", 1),
            ("enter", 2),
            ("exit", 2),
            ("enter", 3),
            ("exit", 3),
        ]
    );
    assert!(channel.is_drained());
}

#[test]
fn test_long_pipe_chain_does_not_grow_the_stack() {
    const STAGES: usize = 2_000;

    let run_loop = Arc::new(RunLoop::new());
    let head = run_loop.channel::<u64>();
    let mut tail = head.clone();
    for _ in 0..STAGES {
        let next = run_loop.channel::<u64>();
        pipe(&tail, &next, CLOSE_BOTH, |v| v + 1);
        tail = next;
    }
    let seen = record(&tail);

    head.put(0).close();
    run_loop.run_until_idle();

    assert_eq!(
        *seen.lock(),
        vec![Message::Value(STAGES as u64), Message::End]
    );
}

#[test]
fn test_merge_then_mux_topology() {
    init_tracing();
    let run_loop = Arc::new(RunLoop::new());
    let sources: Vec<Channel<u32>> = (0..2).map(|_| run_loop.channel()).collect();
    let hub = run_loop.channel_with_config::<u32>(Config::default().with_label("hub"));
    let sinks: Vec<Channel<String>> = (0..3).map(|_| run_loop.channel()).collect();

    merge(&sources, &hub, KEEP_OPEN, identity);
    mux(&hub, &sinks, CLOSE_BOTH, |v| format!("v{v}"));
    let records: Vec<_> = sinks.iter().map(record).collect();

    sources[0].put(1);
    sources[1].put(2);
    sources[0].put(3).close();
    sources[1].close();
    run_loop.run_until_idle();
    assert!(!hub.is_closed(), "KEEP_OPEN merge must absorb source closes");

    hub.close();
    run_loop.run_until_idle();

    for seen in &records {
        let seen = seen.lock();
        let values: Vec<String> = seen.iter().filter_map(|m| m.as_value().cloned()).collect();
        assert_eq!(values.len(), 3);
        let pos = |s: &str| values.iter().position(|v| v == s);
        assert!(pos("v1") < pos("v3"), "per-source FIFO violated: {values:?}");
        assert_eq!(seen.last(), Some(&Message::End));
    }
}

#[test]
fn test_concurrent_producers_keep_per_producer_fifo() {
    const N_PRODUCERS: usize = 4;
    const ITEMS_PER_PRODUCER: u64 = 2_000;

    let run_loop = Arc::new(RunLoop::new());
    let channel = run_loop.channel::<(usize, u64)>();
    let seen = record(&channel);

    let handles: Vec<_> = (0..N_PRODUCERS)
        .map(|producer_id| {
            let ch = channel.clone();
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    ch.put((producer_id, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    channel.close();
    run_loop.run_until_idle();

    let seen = seen.lock();
    let mut next = vec![0u64; N_PRODUCERS];
    for message in seen.iter() {
        if let Message::Value((producer_id, i)) = message {
            assert_eq!(*i, next[*producer_id], "FIFO violation for producer {producer_id}");
            next[*producer_id] += 1;
        }
    }
    assert!(next.iter().all(|&n| n == ITEMS_PER_PRODUCER));
    assert_eq!(seen.last(), Some(&Message::End));
}

#[test]
fn test_run_loop_budget_stops_endless_topology() {
    let run_loop = Arc::new(RunLoop::new());
    let ping = run_loop.channel::<u32>();
    let pong = run_loop.channel::<u32>();

    pipe(&ping, &pong, KEEP_OPEN, identity);
    pipe(&pong, &ping, KEEP_OPEN, identity);
    ping.put(1);

    match run_loop.run_with_budget(100) {
        Err(RunLoopError::BudgetExhausted { budget, pending }) => {
            assert_eq!(budget, 100);
            assert_eq!(pending, 1);
        }
        other => panic!("expected budget exhaustion, got {other:?}"),
    }

    // Closing one side with KEEP_OPEN stops the bounce once the value reaches it.
    ping.close();
    assert!(run_loop.run_with_budget(100).is_ok());
}

#[test]
fn test_unreferenced_intermediate_channel_keeps_forwarding() {
    let run_loop = Arc::new(RunLoop::new());
    let sources: Vec<Channel<u32>> = (0..2).map(|_| run_loop.channel()).collect();
    let tail = run_loop.channel::<u32>();
    {
        let hub = run_loop.channel::<u32>();
        merge(&sources, &hub, KEEP_OPEN, identity);
        pipe(&hub, &tail, KEEP_OPEN, identity);
    }

    sources[0].put(1).close();
    sources[1].put(2).close();
    let seen = record(&tail);
    run_loop.run_until_idle();
    assert_eq!(*seen.lock(), vec![Message::Value(1), Message::Value(2)]);

    drop(sources);
    drop(tail);
    assert_eq!(Arc::strong_count(&run_loop), 1);
}
