//! Instruction-decoder generator for transport-triggered processors.
//!
//! Takes a machine description and its binary encoding map and produces
//! the RTL source of the control unit's instruction decoder, in either
//! entity/architecture or module style. Generation is a two-phase batch
//! run: a wiring phase fixes the decoder's ports and external
//! connections, then a synthesis phase emits the decode logic. Both
//! phases are deterministic, so the same inputs always yield
//! byte-identical output and the two language backends decode
//! identically.

/// Fatal generator errors.
pub mod error;
pub use error::GeneratorError;

/// Deterministic signal and port naming.
pub mod names;

/// Decoder ports and connections.
pub mod netlist;
pub use netlist::{Connection, DecoderNetlist, NetlistBlock, Port, PortDirection};

/// Generation options.
pub mod options;
pub use options::DecoderOptions;

/// Shared emission IR and the two backend printers.
pub mod hdl;
pub use hdl::{HdlLanguage, HdlWriter};

/// Wiring phase.
pub mod wiring;
pub use wiring::{wire_decoder, WiringMap};

/// Per-bus transport-cancel signals.
pub mod squash;

/// Long-immediate write process.
pub mod limm;

/// Global-lock merging, lock registers and the optional lock trace.
pub mod lock;

/// Move decode rules.
pub mod rules;

/// Generation entry points.
pub mod generator;
pub use generator::{generate, verify_compatibility, write_decoder, GeneratedDecoder};

#[cfg(test)]
use tempfile as _;
