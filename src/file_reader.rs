use std::io;

use crate::{
    error::DataFormatError,
    model::transaction::{Rejected, Transaction, TransactionRecord},
};

pub fn csv_stream<R: io::Read>(
    buffer: R,
) -> impl Iterator<Item = Result<TransactionRecord, csv::Error>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(buffer);

    reader.into_deserialize::<TransactionRecord>()
}

/// Rows the CSV layer cannot decode are rejected in place, so positions in the
/// diagnostics line up with data rows in the export.
pub fn read_transactions<R: io::Read>(
    buffer: R,
) -> impl Iterator<Item = Result<Transaction, Rejected>> {
    csv_stream(buffer).map(|row| match row {
        Ok(record) => record.validate(),
        Err(err) => Err(Rejected {
            id: None,
            reason: DataFormatError::MalformedRow(err.to_string()),
        }),
    })
}
