use csv::Trim;

use crate::{
    ledger::{CsvLedger, Ledger, MemoryLedger},
    message::InboundMessage,
    parser::BetRecord,
    recorder::RecorderTask,
};

mod error;
mod ledger;
mod message;
mod parser;
mod recorder;

pub use crate::{error::RecorderError, ledger::WriteError, recorder::Summary};

/// Reads delivered messages (csv columns `id`, `received`, `text`), records
/// each bet once per message id and writes the resulting ledger rows as csv
/// to `io_writer`.
#[tokio::main]
pub async fn process_messages<R: std::io::Read, W: std::io::Write>(
    io_reader: R,
    io_writer: W,
) -> Result<Summary, RecorderError> {
    let (ledger, summary) = run_pipeline(io_reader, MemoryLedger::default()).await?;
    write_rows(ledger.rows(), io_writer)?;
    Ok(summary)
}

/// Same pipeline against a durable csv ledger at `path`. Rows survive
/// restarts and ids already in the file come back as duplicates.
#[tokio::main]
pub async fn process_messages_to_file<R: std::io::Read>(
    io_reader: R,
    path: &std::path::Path,
) -> Result<Summary, RecorderError> {
    let ledger = CsvLedger::open(path)?;
    let (_, summary) = run_pipeline(io_reader, ledger).await?;
    Ok(summary)
}

async fn run_pipeline<R: std::io::Read, L: Ledger + 'static>(
    io_reader: R,
    ledger: L,
) -> Result<(L, Summary), RecorderError> {
    let mut rdr =
        csv::ReaderBuilder::new().trim(Trim::All).comment(Some(b'#')).from_reader(io_reader);

    let task = RecorderTask::spawn(ledger);
    let handle = task.handle();
    let mut rejected = 0;

    // messages are settled in delivery order, each one is recorded before
    // the next is sent
    for result in rdr.deserialize() {
        let message: InboundMessage = result?;
        log::info!("{:?}", &message);

        match parser::parse(&message) {
            Ok(record) => {
                handle.record(record).await?;
            },
            Err(rejection) => {
                // scoped to this one message, log it and move on
                log::warn!("{}: {}", message.message_id, rejection);
                rejected += 1;
            },
        }
    }

    let (ledger, mut summary) = task.finish().await?;
    summary.rejected = rejected;
    Ok((ledger, summary))
}

fn write_rows<W: std::io::Write>(rows: &[BetRecord], io_writer: W) -> Result<(), RecorderError> {
    let mut wtr = csv::Writer::from_writer(io_writer);
    wtr.write_record(ledger::HEADER)?;
    for row in rows {
        wtr.write_record(ledger::row_fields(row))?;
    }
    wtr.flush()?;
    Ok(())
}
