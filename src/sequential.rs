use anyhow::Context;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::driver::RunReport;
use crate::partition::Range;
use crate::worker::render;

// Integers rendered per write call.
const BATCH: u64 = 1 << 16;

/// Writes `[0, end]` to `sink` in ascending order from the calling task, one batch at a time.
pub async fn write_all<W>(mut sink: W, end: u32) -> anyhow::Result<(W, RunReport)>
where
    W: AsyncWrite + Unpin,
{
    tracing::debug!("Writing [0, {}] sequentially", end);
    let mut report = RunReport::default();
    let mut start = 0_u64;
    while start <= u64::from(end) {
        let last = (start + BATCH - 1).min(u64::from(end));
        let range = Range::new(start as u32, last as u32);
        let text = render(range);
        sink.write_all(text.as_bytes())
            .await
            .with_context(|| format!("Error writing {}", range))?;
        report.chunks += 1;
        report.bytes += text.len() as u64;
        report.lines += range.count();
        start = last + 1;
    }
    sink.flush().await.context("Error flushing output")?;
    Ok((sink, report))
}
