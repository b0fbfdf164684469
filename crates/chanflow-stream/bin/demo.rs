//! Demonstration of chanflow composition on tokio.
//!
//! Run with: `cargo run -p chanflow-stream --features demo --bin demo`
//! Set `RUST_LOG=chanflow=trace` to watch deliveries being scheduled.

use chanflow::{identity, merge, mux, pipe, Channel, Config, CLOSE_BOTH, KEEP_OPEN};
use chanflow_stream::{ChannelReceiver, ChannelSender, StreamExt, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== chanflow Demo ===\n");

    let scheduler = TokioScheduler::spawn();

    demo_pipe(&scheduler).await?;
    demo_merge(&scheduler).await?;
    demo_mux(&scheduler).await?;

    scheduler.shutdown().await?;
    println!("\n=== All demos completed ({} deliveries) ===", scheduler.executed());
    Ok(())
}

/// Demo 1: pipe with a transform, KEEP_OPEN absorbing the source's close
async fn demo_pipe(scheduler: &Arc<TokioScheduler>) -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Pipe ---");

    let input = scheduler.channel_with_config::<u64>(Config::default().with_label("input"));
    let output = scheduler.channel_with_config::<u64>(Config::default().with_label("output"));
    pipe(&input, &output, KEEP_OPEN, |v| v * 2);

    let mut rx = ChannelReceiver::new(output.clone());
    input.put(3);
    println!("  put 3 -> received {:?}", rx.next().await);

    input.close();
    let after_close = timeout(Duration::from_millis(20), rx.next()).await;
    println!(
        "  input closed -> output closed: {}, anything received: {}",
        output.is_closed(),
        after_close.is_ok()
    );

    output.close();
    println!("  ✓ Pipe complete\n");
    Ok(())
}

/// Demo 2: merge producers running on separate tasks
async fn demo_merge(scheduler: &Arc<TokioScheduler>) -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Merge ---");

    let sources: Vec<Channel<String>> = (0..3).map(|_| scheduler.channel()).collect();
    let output = scheduler.channel::<String>();
    merge(&sources, &output, KEEP_OPEN, identity);

    let producers: Vec<_> = sources
        .iter()
        .enumerate()
        .map(|(id, source)| {
            let tx = ChannelSender::new(source.clone());
            tokio::spawn(async move {
                for i in 0..3 {
                    tx.send(format!("producer-{id}/{i}"))?;
                    tokio::task::yield_now().await;
                }
                tx.close();
                Ok::<_, chanflow_stream::StreamError>(())
            })
        })
        .collect();
    for producer in producers {
        producer.await??;
    }

    // Sources closed under KEEP_OPEN, so the output never ends on its own.
    let merged: Vec<String> = ChannelReceiver::new(output.clone()).take(9).collect().await;
    output.close();
    for item in &merged {
        println!("  Received: {item}");
    }
    println!("  ✓ Merged {} values\n", merged.len());
    Ok(())
}

/// Demo 3: mux one source into several receivers, CLOSE_BOTH ending them all
async fn demo_mux(scheduler: &Arc<TokioScheduler>) -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 3: Mux ---");

    let source = scheduler.channel::<u32>();
    let outputs: Vec<Channel<u32>> = (0..3).map(|_| scheduler.channel()).collect();
    mux(&source, &outputs, CLOSE_BOTH, |v| v * v);

    for v in 1..=4 {
        source.put(v);
    }
    source.close();

    for (id, output) in outputs.iter().enumerate() {
        let received: Vec<u32> = ChannelReceiver::new(output.clone()).collect().await;
        println!("  Receiver {id}: {received:?}");
    }
    println!("  ✓ Mux complete");
    Ok(())
}
