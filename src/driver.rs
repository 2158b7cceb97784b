use anyhow::{anyhow, Context};
use tokio::fs::File;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use crate::config::{Config, Strategy};
use crate::partition::partition;
use crate::sequential;
use crate::worker;
use crate::writer::{Drained, Writer};

/// What the driver observed during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub ranges: usize,
    pub worker_signals: usize,
    pub writer_signals: usize,
    pub chunks: usize,
    pub lines: u64,
    pub bytes: u64,
}

/// Creates (or truncates) the output file and fills it using the configured strategy.
///
/// Failing to create the file is returned before anything else starts.
pub async fn run(config: &Config) -> anyhow::Result<RunReport> {
    let file = File::create(&config.output_file)
        .await
        .with_context(|| format!("Error creating {}", config.output_file))?;
    tracing::debug!("Created {}", config.output_file);

    let (file, report) = match config.strategy {
        Strategy::Sequential => sequential::write_all(file, config.end).await?,
        Strategy::Pipeline => {
            pipeline(file, config.end, config.worker_count, config.ordered).await?
        }
    };
    drop(file);

    tracing::debug!(
        "Wrote {} lines, {} bytes in {} chunks [ranges={}, worker_signals={}, writer_signals={}]",
        report.lines,
        report.bytes,
        report.chunks,
        report.ranges,
        report.worker_signals,
        report.writer_signals
    );
    tracing::info!("finished!!");
    Ok(report)
}

/// Renders `[0, end]` with one worker per partitioned range and a single writer task
/// owning `sink`.
///
/// The hand-off channel only closes after every launched worker has signalled completion,
/// and the sink is only handed back once the writer has signalled that it drained.
pub async fn pipeline<W>(
    sink: W,
    end: u32,
    worker_count: usize,
    ordered: bool,
) -> anyhow::Result<(W, RunReport)>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    // Capacity 1 is as close to a rendezvous as tokio's mpsc gets.
    let (chunk_tx, chunk_rx) = mpsc::channel(1);
    let writer_done = Writer::start(sink, ordered, chunk_rx);

    let ranges = partition(end, worker_count);
    tracing::debug!("Launching {} workers over [0, {}]", ranges.len(), end);
    let (done_tx, mut done_rx) = mpsc::channel(1);
    for (id, range) in ranges.iter().enumerate() {
        worker::spawn(id, *range, chunk_tx.clone(), done_tx.clone());
    }
    // From here on only the workers hold completion senders, so the channel closes early
    // if one of them exits without signalling.
    drop(done_tx);

    let mut report = RunReport {
        ranges: ranges.len(),
        ..RunReport::default()
    };
    while report.worker_signals < ranges.len() {
        if done_rx.recv().await.is_none() {
            drop(chunk_tx);
            // A dead writer is the usual reason a worker could not finish.
            await_writer(writer_done).await?;
            return Err(anyhow!(
                "worker exited before signalling completion ({} of {} finished)",
                report.worker_signals,
                ranges.len()
            ));
        }
        report.worker_signals += 1;
        tracing::info!("finish {} go routine", report.worker_signals);
    }

    // Closing our sender is the last one: the writer sees the channel end once it drains.
    drop(chunk_tx);
    let drained = await_writer(writer_done).await?;
    report.writer_signals += 1;
    report.chunks = drained.chunks;
    report.bytes = drained.bytes;
    report.lines = ranges.iter().map(|range| range.count()).sum();
    Ok((drained.sink, report))
}

async fn await_writer<W>(
    writer_done: tokio::sync::oneshot::Receiver<anyhow::Result<Drained<W>>>,
) -> anyhow::Result<Drained<W>> {
    writer_done
        .await
        .map_err(|_| anyhow!("writer stopped without signalling completion"))?
}
