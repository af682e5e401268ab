use std::io;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::model::Event;
use crate::observability::{WAL_FLUSH_BATCH_SIZE, WAL_FLUSH_DURATION_SECONDS};
use crate::wal::Wal;

use super::StoreError;

type Ack = oneshot::Sender<io::Result<()>>;

enum JournalCommand {
    Append { event: Event, response: Ack },
    Compact { events: Vec<Event>, response: Ack },
    AppendsSinceCompact { response: oneshot::Sender<u64> },
}

/// Handle to the background task that owns the WAL.
pub(super) struct Journal {
    tx: mpsc::Sender<JournalCommand>,
}

impl Journal {
    /// Move `wal` onto a writer task. Must be called inside a Tokio runtime.
    pub fn spawn(wal: Wal) -> Self {
        let (tx, rx) = mpsc::channel(4096);
        tokio::spawn(writer_loop(wal, rx));
        Self { tx }
    }

    /// Durably append one event; resolves once it is fsynced.
    pub async fn append(&self, event: Event) -> Result<(), StoreError> {
        let (response, rx) = oneshot::channel();
        self.request(JournalCommand::Append { event, response }, rx)
            .await
    }

    /// Replace the log with `events`.
    pub async fn compact(&self, events: Vec<Event>) -> Result<(), StoreError> {
        let (response, rx) = oneshot::channel();
        self.request(JournalCommand::Compact { events, response }, rx)
            .await
    }

    pub async fn appends_since_compact(&self) -> u64 {
        let (response, rx) = oneshot::channel();
        if self
            .tx
            .send(JournalCommand::AppendsSinceCompact { response })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    async fn request(
        &self,
        cmd: JournalCommand,
        rx: oneshot::Receiver<io::Result<()>>,
    ) -> Result<(), StoreError> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| StoreError::Unavailable("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| StoreError::Unavailable("WAL writer dropped response".into()))?
            .map_err(|e| {
                warn!("WAL write failed: {e}");
                StoreError::Unavailable(format!("WAL error: {e}"))
            })
    }
}

/// Group commit: block for the first append, drain whatever else is already
/// queued, then pay for a single fsync covering the whole batch.
async fn writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<JournalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let JournalCommand::Append { event, response } = cmd else {
            handle_other(&mut wal, cmd);
            continue;
        };
        let mut batch = vec![(event, response)];
        let mut deferred = None;
        loop {
            match rx.try_recv() {
                Ok(JournalCommand::Append { event, response }) => batch.push((event, response)),
                // Anything else waits until the batch ahead of it is durable.
                Ok(other) => {
                    deferred = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }
        commit_batch(&mut wal, batch);
        if let Some(other) = deferred {
            handle_other(&mut wal, other);
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: Vec<(Event, Ack)>) {
    metrics::histogram!(WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let started = Instant::now();

    let mut result = Ok(());
    for (event, _) in &batch {
        if let Err(e) = wal.append_buffered(event) {
            result = Err(e);
            break;
        }
    }
    let result = result.and_then(|()| wal.flush_sync());
    if let Err(e) = &result {
        // Nobody in this batch is acknowledged, so none of it may survive
        // on disk either.
        warn!("WAL batch of {} events failed: {e}", batch.len());
        if let Err(e) = wal.rollback() {
            warn!("WAL rollback failed, refusing appends until compaction: {e}");
        }
    }

    metrics::histogram!(WAL_FLUSH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    for (_, ack) in batch {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = ack.send(r);
    }
}

fn handle_other(wal: &mut Wal, cmd: JournalCommand) {
    match cmd {
        JournalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        JournalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        JournalCommand::Append { event, response } => commit_batch(wal, vec![(event, response)]),
    }
}
