//! Read-only topology model for transport-triggered machines.
//!
//! The decoder generator consumes this model as an immutable input: buses
//! and their guards, sockets with their bus segments and port connections,
//! function units, the distinguished control unit, register files,
//! immediate units, and long-immediate instruction templates. Declaration
//! order of every collection is part of the contract; downstream code bakes
//! it into emitted branch chains and positional lock-bit vectors.

/// Transport buses, immediate extension policy and guard terms.
pub mod bus;
pub use bus::{Bus, ExtensionMode, Guard};

/// Sockets binding unit ports to bus segments.
pub mod socket;
pub use socket::{PortRef, Socket, SocketDirection};

/// Function units, the control unit, register files and immediate units.
pub mod unit;
pub use unit::{
    ControlUnit, FuPort, FunctionUnit, ImmediateUnit, RegisterFile, UnitPort, UnitPortDirection,
};

/// Long-immediate instruction templates.
pub mod template;
pub use template::{InstructionTemplate, TemplateSlot};

/// The machine root aggregating all topology collections.
pub mod machine;
pub use machine::Machine;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
