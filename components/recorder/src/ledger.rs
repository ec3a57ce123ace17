use std::{
    collections::HashSet,
    fs::{File, OpenOptions},
    path::Path,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::{message::MessageId, parser::BetRecord};

pub(crate) const HEADER: [&str; 8] =
    ["message_id", "received", "account", "details", "amount", "odds", "correct_odds", "currency"];

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("CsvError: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
}

/// Row store behind the recorder. Implementations only append rows and
/// answer membership, corrections happen outside this crate.
#[async_trait]
pub(crate) trait Ledger: Send {
    async fn append_row(&mut self, record: &BetRecord) -> Result<(), WriteError>;

    async fn exists(&self, message_id: &str) -> bool;
}

pub(crate) fn row_fields(record: &BetRecord) -> [String; 8] {
    [
        record.message_id.clone(),
        record.received_at.to_rfc3339(),
        record.account.clone(),
        record.details.clone(),
        record.amount.to_string(),
        record.odds.map(|odds| odds.to_string()).unwrap_or_default(),
        record.correct_odds.map(|odds| odds.to_string()).unwrap_or_default(),
        record.currency.clone(),
    ]
}

#[derive(Default)]
pub(crate) struct MemoryLedger {
    rows: Vec<BetRecord>,
}

impl MemoryLedger {
    pub(crate) fn rows(&self) -> &[BetRecord] {
        &self.rows
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append_row(&mut self, record: &BetRecord) -> Result<(), WriteError> {
        self.rows.push(record.clone());
        Ok(())
    }

    async fn exists(&self, message_id: &str) -> bool {
        self.rows.iter().any(|row| row.message_id == message_id)
    }
}

/// Append only csv file, one row per recorded bet. The id column of rows
/// already in the file is loaded on open, so a feed replayed after a crash
/// comes back as duplicates instead of being written twice.
pub(crate) struct CsvLedger {
    writer: csv::Writer<File>,
    ids: HashSet<MessageId>,
}

impl CsvLedger {
    pub(crate) fn open(path: &Path) -> Result<Self, WriteError> {
        let mut ids = HashSet::new();

        let has_rows = path.exists() && std::fs::metadata(path)?.len() > 0;
        if has_rows {
            let mut rdr = csv::Reader::from_path(path)?;
            for result in rdr.records() {
                let row = result?;
                if let Some(id) = row.get(0) {
                    ids.insert(id.to_string());
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if !has_rows {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        Ok(Self { writer, ids })
    }
}

#[async_trait]
impl Ledger for CsvLedger {
    async fn append_row(&mut self, record: &BetRecord) -> Result<(), WriteError> {
        self.writer.write_record(row_fields(record))?;
        // flushed per row so an interrupted run leaves whole rows only
        self.writer.flush()?;
        self.ids.insert(record.message_id.clone());
        Ok(())
    }

    async fn exists(&self, message_id: &str) -> bool {
        self.ids.contains(message_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn bet(id: &str) -> BetRecord {
        BetRecord {
            message_id: id.to_string(),
            received_at: "2024-03-01T12:00:00Z".parse().unwrap(),
            account: "AccountA".to_string(),
            details: "bets on TeamX".to_string(),
            amount: Decimal::from(50),
            odds: None,
            correct_odds: None,
            currency: "USD".to_string(),
        }
    }

    #[tokio::test]
    async fn csv_ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        {
            let mut ledger = CsvLedger::open(&path).unwrap();
            ledger.append_row(&bet("msg_1")).await.unwrap();
        }

        let mut ledger = CsvLedger::open(&path).unwrap();
        assert!(ledger.exists("msg_1").await);
        assert!(!ledger.exists("msg_2").await);

        ledger.append_row(&bet("msg_2")).await.unwrap();
        drop(ledger);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "message_id,received,account,details,amount,odds,correct_odds,currency");
        assert!(lines[1].starts_with("msg_1,"));
        assert!(lines[2].starts_with("msg_2,"));
    }

    #[tokio::test]
    async fn memory_ledger_answers_membership() {
        let mut ledger = MemoryLedger::default();
        assert!(!ledger.exists("msg_1").await);

        ledger.append_row(&bet("msg_1")).await.unwrap();
        assert!(ledger.exists("msg_1").await);
        assert_eq!(ledger.rows().len(), 1);
    }
}
