//! Errors for the file-backed inputs (machine DB, index file, DVF). \
//! Budget exhaustion and abstract halt witnesses are not errors, they are
//! ordinary [crate::status::MachineStatus] values; everything in here aborts
//! the entry or the run.

use std::fmt::Display;

/// Structural error in one of the binary input files. \
/// `offset` is the byte offset of the first offending field.
#[derive(Debug)]
pub enum FileFormatError {
    Io(std::io::Error),
    /// Record or header does not decode; the offset names the first bad byte.
    Malformed { offset: u64, msg: String },
    /// A DVF entry header carries a decider-type tag this library does not know.
    UnknownDeciderType { offset: u64, tag: u32 },
}

impl FileFormatError {
    pub fn malformed(offset: u64, msg: impl Into<String>) -> Self {
        Self::Malformed {
            offset,
            msg: msg.into(),
        }
    }
}

impl std::error::Error for FileFormatError {}

impl From<std::io::Error> for FileFormatError {
    fn from(error: std::io::Error) -> Self {
        FileFormatError::Io(error)
    }
}

impl Display for FileFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormatError::Io(e) => write!(f, "IO error: {e}"),
            FileFormatError::Malformed { offset, msg } => {
                write!(f, "Malformed input at byte offset {offset}: {msg}")
            }
            FileFormatError::UnknownDeciderType { offset, tag } => {
                write!(f, "Unknown decider type tag {tag} at byte offset {offset}")
            }
        }
    }
}
