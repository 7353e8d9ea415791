//! Fatal generator errors.

use std::path::PathBuf;

use thiserror::Error;

/// A failed decoder-generation run.
///
/// Generation is a one-shot batch transformation; every variant is fatal
/// and reported to the caller without retries. The first two variants are
/// user facing; the remaining ones name a consistency defect between the
/// machine and its encoding map.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The machine falls outside the supported subset.
    #[error("unsupported machine: {0}")]
    Incompatible(String),
    /// The destination file could not be created or written.
    #[error("unable to create file {path}: {source}")]
    Io {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A required encoding is missing from the encoding map.
    #[error("no encoding found for {0}")]
    MissingEncoding(String),
    /// A required port is missing from the machine or netlist.
    #[error("no port found for {0}")]
    MissingPort(String),
    /// A required field is missing from the encoding map.
    #[error("no field found for {0}")]
    MissingField(String),
    /// An instruction template refers to resources inconsistently.
    #[error("inconsistent instruction template: {0}")]
    InconsistentTemplate(String),
    /// A port with the same name was already added to the decoder block.
    #[error("decoder port `{0}` already exists")]
    DuplicatePort(String),
}
