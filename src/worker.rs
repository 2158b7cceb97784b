use std::fmt::Write;

use anyhow::{anyhow, Context};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::partition::Range;

/// Minimum number of hex digits per line, zero-padded.
pub const LINE_WIDTH: usize = 6;

/// The rendered text of one range, moved as a single unit from a worker to the writer.
#[derive(Debug)]
pub struct Chunk {
    pub range: Range,
    pub text: String,
}

/// Renders every integer of `range` in ascending order, one lowercase hex line each.
pub fn render(range: Range) -> String {
    // Values above 0xFFFFFF print wider than the padding, so size the buffer for the widest one.
    let digits = LINE_WIDTH.max(hex_digits(range.end));
    let mut text = String::with_capacity(range.count() as usize * (digits + 1));
    for i in range.start..=range.end {
        // Writing into a String cannot fail.
        let _ = writeln!(text, "{:0width$x}", i, width = LINE_WIDTH);
    }
    text
}

fn hex_digits(value: u32) -> usize {
    ((u32::BITS - value.leading_zeros()) as usize).div_ceil(4).max(1)
}

/// Spawns a worker for `range`. It sends one [`Chunk`] to the writer and then one
/// completion signal to the driver.
///
/// If the writer has already gone away the worker logs the failure and exits without
/// signalling, which the driver notices once every completion sender is dropped.
pub fn spawn(
    id: usize,
    range: Range,
    chunk_tx: mpsc::Sender<Chunk>,
    done_tx: mpsc::Sender<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = run(id, range, chunk_tx, done_tx).await {
            tracing::error!("Worker {} failed: {:#}", id, err);
        }
    })
}

async fn run(
    id: usize,
    range: Range,
    chunk_tx: mpsc::Sender<Chunk>,
    done_tx: mpsc::Sender<()>,
) -> anyhow::Result<()> {
    tracing::debug!("Worker {} rendering {}", id, range);
    // Rendering is pure CPU work, keep it off the async worker threads.
    let text = tokio::task::spawn_blocking(move || render(range))
        .await
        .context("Rendering task panicked")?;
    tracing::debug!("Worker {} rendered {} bytes", id, text.len());

    chunk_tx
        .send(Chunk { range, text })
        .await
        .map_err(|_| anyhow!("writer closed before chunk {} was handed off", range))?;
    done_tx
        .send(())
        .await
        .map_err(|_| anyhow!("driver stopped listening for completion signals"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_zero_padded_lowercase_hex() {
        assert_eq!(render(Range::new(0, 3)), "000000\n000001\n000002\n000003\n");
        assert_eq!(render(Range::new(255, 255)), "0000ff\n");
        assert_eq!(render(Range::new(0xFF_FFFE, 0xFF_FFFF)), "fffffe\nffffff\n");
    }

    #[test]
    fn values_wider_than_the_padding_are_not_truncated() {
        assert_eq!(render(Range::new(0x100_0000, 0x100_0001)), "1000000\n1000001\n");
    }

    #[test]
    fn render_capacity_matches_output_for_the_full_width() {
        let text = render(Range::new(0x10_0000, 0x10_0fff));
        assert_eq!(text.len(), 0x1000 * 7);
        assert!(text.lines().all(|line| line.len() == LINE_WIDTH));
    }

    #[test]
    fn hex_digit_counts() {
        assert_eq!(hex_digits(0), 1);
        assert_eq!(hex_digits(0xf), 1);
        assert_eq!(hex_digits(0x10), 2);
        assert_eq!(hex_digits(0xFF_FFFF), 6);
        assert_eq!(hex_digits(u32::MAX), 8);
    }

    #[tokio::test]
    async fn worker_sends_one_chunk_then_one_signal() {
        let (chunk_tx, mut chunk_rx) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel(1);

        let handle = spawn(0, Range::new(4, 6), chunk_tx, done_tx);

        let chunk = chunk_rx.recv().await.unwrap();
        assert_eq!(chunk.range, Range::new(4, 6));
        assert_eq!(chunk.text, "000004\n000005\n000006\n");
        assert_eq!(done_rx.recv().await, Some(()));

        handle.await.unwrap();
        // The worker dropped both senders.
        assert!(chunk_rx.recv().await.is_none());
        assert!(done_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn worker_does_not_signal_when_the_writer_is_gone() {
        let (chunk_tx, chunk_rx) = mpsc::channel(1);
        let (done_tx, mut done_rx) = mpsc::channel(1);
        drop(chunk_rx);

        spawn(0, Range::new(0, 10), chunk_tx, done_tx).await.unwrap();

        assert!(done_rx.recv().await.is_none());
    }
}
