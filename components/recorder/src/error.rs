use thiserror::Error;
use tokio::{sync::mpsc::error::SendError, task::JoinError};

use crate::{
    ledger::WriteError,
    recorder::Command,
    RecorderError::SendCommandError,
};

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("CsvError: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Failed to get ledger back from worker. THIS SHOULD NOT HAPPEN")]
    FailedToGetLedger,
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JoinError: {0}")]
    JoinError(#[from] JoinError),
    #[error("Recorder worker dropped a reply. THIS SHOULD NOT HAPPEN")]
    ReplyDropped,
    #[error("SendCommandError: {0}")]
    SendCommandError(String),
    #[error("WriteError: {0}")]
    WriteError(#[from] WriteError),
}

impl From<SendError<Command>> for RecorderError {
    fn from(value: SendError<Command>) -> Self {
        match value.0 {
            Command::Record(record, _) => SendCommandError(format!("{:?}", record)),
            Command::Close => SendCommandError("Close".to_string()),
        }
    }
}
