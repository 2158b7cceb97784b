use std::collections::BTreeMap;

use anyhow::{ensure, Context};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

use crate::worker::Chunk;

/// What the writer hands back through its completion signal.
#[derive(Debug)]
pub struct Drained<W> {
    pub sink: W,
    pub chunks: usize,
    pub bytes: u64,
}

// The only task that touches the sink. Every worker funnels its chunk through the
// hand-off channel and this struct appends them one at a time, so no two writes can
// ever interleave.
pub struct Writer<W> {
    sink: W,
    ordered: bool,
    // Chunks that arrived ahead of `next_start`, keyed by their range start. Only used
    // in ordered mode.
    pending: BTreeMap<u32, Chunk>,
    next_start: u64,
    chunks: usize,
    bytes: u64,
}

impl<W> Writer<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Moves the writer onto its own task, listening on `chunk_rx` until every sender is
    /// dropped. The returned receiver resolves exactly once, after the sink is flushed.
    pub fn start(
        sink: W,
        ordered: bool,
        chunk_rx: mpsc::Receiver<Chunk>,
    ) -> oneshot::Receiver<anyhow::Result<Drained<W>>> {
        tracing::debug!("Starting Writer [ordered={}]", ordered);
        let writer = Self {
            sink,
            ordered,
            pending: BTreeMap::new(),
            next_start: 0,
            chunks: 0,
            bytes: 0,
        };
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = writer.listen(chunk_rx).await;
            if let Err(err) = &result {
                tracing::error!("Writer failed: {:#}", err);
            }
            // The driver may have given up already, nothing left to tell it then.
            let _ = done_tx.send(result);
        });
        done_rx
    }

    async fn listen(mut self, mut chunk_rx: mpsc::Receiver<Chunk>) -> anyhow::Result<Drained<W>> {
        while let Some(chunk) = chunk_rx.recv().await {
            tracing::debug!("Chunk received: {} ({} bytes)", chunk.range, chunk.text.len());
            if self.ordered {
                self.pending.insert(chunk.range.start, chunk);
                self.append_ready().await?;
            } else {
                self.append(chunk).await?;
            }
        }
        tracing::debug!("Hand-off channel closed, flushing");
        self.finish().await
    }

    // Appends every held chunk that directly continues what was already written.
    async fn append_ready(&mut self) -> anyhow::Result<()> {
        while let Some(entry) = self.pending.first_entry() {
            if u64::from(*entry.key()) != self.next_start {
                break;
            }
            let chunk = entry.remove();
            self.append(chunk).await?;
        }
        Ok(())
    }

    async fn append(&mut self, chunk: Chunk) -> anyhow::Result<()> {
        self.sink
            .write_all(chunk.text.as_bytes())
            .await
            .with_context(|| format!("Error writing chunk {}", chunk.range))?;
        self.next_start = u64::from(chunk.range.end) + 1;
        self.chunks += 1;
        self.bytes += chunk.text.len() as u64;
        Ok(())
    }

    async fn finish(mut self) -> anyhow::Result<Drained<W>> {
        ensure!(
            self.pending.is_empty(),
            "{} chunk(s) still waiting for the range starting at {}",
            self.pending.len(),
            self.next_start
        );
        self.sink
            .flush()
            .await
            .context("Error flushing output")?;
        tracing::info!(
            "Writer drained [chunks={}, bytes={}]",
            self.chunks,
            self.bytes
        );
        Ok(Drained {
            sink: self.sink,
            chunks: self.chunks,
            bytes: self.bytes,
        })
    }
}
