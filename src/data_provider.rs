//! A data provider returns the machines to decide in batches, e.g. a DB file reader
//! or an index-file driven subset of a DB file.

pub mod db_reader;
pub mod index_file;

use std::fmt::Display;

use crate::machine_binary::MachineId;

// Returning DataProviderBatch in a box degrades performance.
pub type ResultDataProvider = Result<DataProviderBatch, Box<DataProviderError>>;

pub trait DataProvider {
    /// Returns the name of this data provider.
    fn name(&self) -> &str;

    /// Returns the next batch of machines. The batch has end_reason IsLastBatch on the last batch.
    fn machine_batch_next(&mut self) -> ResultDataProvider;

    /// The actual used batch size (number of machines returned in each call).
    fn batch_size(&self) -> usize;

    /// Total number of machines if all batches are requested.
    fn num_machines_to_process(&self) -> u64;
}

/// End reason of one batch.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub enum EndReason {
    #[default]
    InProgress,
    IsLastBatch,
    NoMoreData,
    Error(String),
}

impl Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::InProgress => write!(f, "in progress"),
            EndReason::IsLastBatch => write!(f, "last batch"),
            EndReason::NoMoreData => write!(f, "no more data"),
            EndReason::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Result of a batch request: the machines with their DB ids.
#[derive(Debug, Default)]
pub struct DataProviderBatch {
    /// Current batch no, first batch is 0.
    pub batch_no: usize,
    /// Machines for the deciders, each with its DB index.
    pub machines: Vec<MachineId>,
    /// End reason of this batch. This can be an error or the info that this is the last batch.
    pub end_reason: EndReason,
}

impl DataProviderBatch {
    pub fn new(batch_no: usize) -> Self {
        Self {
            batch_no,
            ..Default::default()
        }
    }
}

impl Display for DataProviderBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Num machines: {}, batch result: {}",
            self.machines.len(),
            self.end_reason
        )?;
        if !self.machines.is_empty() {
            write!(f, "First machine: {}", self.machines.first().unwrap())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DataProviderError {
    pub name: String,
    pub batch: Option<DataProviderBatch>,
    pub msg: String,
}

impl std::error::Error for DataProviderError {}

impl Display for DataProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.msg)?;
        if let Some(batch) = &self.batch {
            write!(f, "\n{batch}")?;
        }
        Ok(())
    }
}
