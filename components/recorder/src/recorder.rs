use tokio::{
    sync::{
        mpsc,
        mpsc::{Receiver, Sender},
        oneshot,
    },
    task::JoinHandle,
};

use crate::{
    error::RecorderError,
    ledger::{Ledger, WriteError},
    parser::BetRecord,
};

mod seen;

use seen::SeenMessages;

/// Terminal outcome for one recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Appended,
    Duplicate,
}

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub appended: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

pub(crate) enum Command {
    Record(BetRecord, oneshot::Sender<Result<Outcome, WriteError>>),
    Close,
}

/// Duplicate check then append, in that order. Both halves must run without
/// another record for the same id in between, which the worker task below
/// guarantees by being the only caller.
pub(crate) struct Recorder<L: Ledger> {
    ledger: L,
    seen: SeenMessages,
}

impl<L: Ledger> Recorder<L> {
    pub(crate) fn new(ledger: L) -> Self {
        Self { ledger, seen: SeenMessages::default() }
    }

    pub(crate) async fn record(&mut self, record: BetRecord) -> Result<Outcome, WriteError> {
        if self.seen.contains(&record.message_id) {
            return Ok(Outcome::Duplicate);
        }

        if self.ledger.exists(&record.message_id).await {
            // rows written before this process started count as seen too
            self.seen.insert(record.message_id);
            return Ok(Outcome::Duplicate);
        }

        self.ledger.append_row(&record).await?;
        self.seen.insert(record.message_id);
        Ok(Outcome::Appended)
    }

    fn into_ledger(self) -> L {
        self.ledger
    }
}

/// Cheap clonable producer side of the recorder queue.
#[derive(Clone)]
pub(crate) struct RecorderHandle {
    sender: Sender<Command>,
}

impl RecorderHandle {
    pub(crate) async fn record(&self, record: BetRecord) -> Result<Outcome, RecorderError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender.send(Command::Record(record, reply_tx)).await?;
        let outcome = reply_rx.await.map_err(|_| RecorderError::ReplyDropped)??;
        Ok(outcome)
    }
}

pub(crate) struct RecorderTask<L> {
    sender: Sender<Command>,
    join_handle: Option<JoinHandle<(L, Summary)>>,
}

impl<L: Ledger + 'static> RecorderTask<L> {
    /// Spawns the single consuming task that owns the ledger. Every check
    /// then append runs there, so two producers racing on one id can never
    /// both observe it as unseen.
    pub(crate) fn spawn(ledger: L) -> Self {
        let (tx, rx) = mpsc::channel::<Command>(32);

        let mut task = Self { sender: tx, join_handle: None };
        task.run(Recorder::new(ledger), rx);
        task
    }

    fn run(&mut self, mut recorder: Recorder<L>, mut receiver: Receiver<Command>) {
        let handle = tokio::spawn(async move {
            let mut summary = Summary::default();

            // commands are received until Command::Close, then the queue is
            // drained and the ledger handed back through the join handle
            while let Some(command) = receiver.recv().await {
                match command {
                    Command::Record(record, reply) => {
                        let outcome = recorder.record(record).await;
                        match &outcome {
                            Ok(Outcome::Appended) => summary.appended += 1,
                            Ok(Outcome::Duplicate) => summary.duplicates += 1,
                            Err(_) => {},
                        }
                        // the reply only fails when the producer went away,
                        // the row state is settled either way
                        let _ = reply.send(outcome);
                    },
                    Command::Close => receiver.close(),
                }
            }

            (recorder.into_ledger(), summary)
        });

        self.join_handle = Some(handle)
    }

    pub(crate) fn handle(&self) -> RecorderHandle {
        RecorderHandle { sender: self.sender.clone() }
    }

    /// Closes the queue, waits for in flight appends to settle and returns
    /// the ledger together with the run counters.
    pub(crate) async fn finish(mut self) -> Result<(L, Summary), RecorderError> {
        self.sender.send(Command::Close).await?;
        if let Some(handle) = self.join_handle.take() {
            Ok(handle.await?)
        } else {
            // this should not happen, spawn always sets the handle
            Err(RecorderError::FailedToGetLedger)
        }
    }
}
