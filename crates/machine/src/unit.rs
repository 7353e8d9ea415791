//! Function units, the control unit, register files and immediate units.

use crate::bus::ExtensionMode;

/// One operand or trigger port of a function unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FuPort {
    /// Port name within the unit.
    pub name: String,
    /// Port width in bits.
    pub width: u32,
    /// True for operand-input ports, false for result outputs.
    pub is_input: bool,
    /// True if a write to this port triggers operation execution.
    pub is_trigger: bool,
}

/// A function unit of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FunctionUnit {
    /// Unit name, unique within the machine.
    pub name: String,
    /// Operand and result ports, in declaration order.
    pub ports: Vec<FuPort>,
    /// Operation names in declaration order. This order assigns the
    /// natural opcode of each operation.
    pub operations: Vec<String>,
    /// True if the unit exposes a pipeline-stall request output.
    pub emits_lock_request: bool,
    /// True if the unit consumes the global-lock signal.
    pub uses_global_lock: bool,
}

impl FunctionUnit {
    /// Looks up a port by name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&FuPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Returns the declaration-order opcode of the named operation.
    #[must_use]
    pub fn opcode(&self, operation: &str) -> Option<u32> {
        self.operations
            .iter()
            .position(|op| op == operation)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Input ports in declaration order.
    pub fn input_ports(&self) -> impl Iterator<Item = &FuPort> {
        self.ports.iter().filter(|p| p.is_input)
    }
}

/// The distinguished control unit fetching and dispatching instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ControlUnit {
    /// Unit name.
    pub name: String,
    /// Operand ports, in declaration order.
    pub ports: Vec<FuPort>,
    /// Control-flow operation names in declaration order.
    pub operations: Vec<String>,
    /// Number of delay slots after a taken control-flow operation.
    pub delay_slots: u32,
    /// Cycles between a guard-register write and its effect on execution.
    pub global_guard_latency: u32,
    /// Name of the return-address port, if the unit has one.
    pub return_address_port: Option<String>,
}

impl ControlUnit {
    /// Looks up a port by name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&FuPort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Tells whether the named port is the return-address port.
    #[must_use]
    pub fn is_return_address_port(&self, name: &str) -> bool {
        self.return_address_port.as_deref() == Some(name)
    }
}

/// Read/write direction of a register-file or immediate-unit port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnitPortDirection {
    /// The port reads register contents onto a socket.
    Read,
    /// The port writes socket data into a register.
    Write,
}

/// One data port of a register file or immediate unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct UnitPort {
    /// Port name within the unit.
    pub name: String,
    /// Direction of the port.
    pub direction: UnitPortDirection,
}

/// A general-purpose register file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    /// Unit name, unique within the machine.
    pub name: String,
    /// Number of registers in the file.
    pub registers: u32,
    /// Register width in bits.
    pub width: u32,
    /// Data ports, in declaration order.
    pub ports: Vec<UnitPort>,
    /// True if the unit consumes the global-lock signal.
    pub uses_global_lock: bool,
}

/// An immediate unit holding long-immediate values written by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImmediateUnit {
    /// Unit name, unique within the machine.
    pub name: String,
    /// Number of immediate registers in the unit.
    pub registers: u32,
    /// Register width in bits.
    pub width: u32,
    /// Extension policy when the assigned template bits are narrower than
    /// the register width.
    pub extension: ExtensionMode,
    /// Read latency in cycles.
    pub latency: u32,
    /// Read ports, in declaration order.
    pub ports: Vec<UnitPort>,
    /// True if the unit consumes the global-lock signal.
    pub uses_global_lock: bool,
}

impl ImmediateUnit {
    /// Tells whether long immediates written to the unit are sign extended.
    #[must_use]
    pub const fn sign_extends(&self) -> bool {
        matches!(self.extension, ExtensionMode::Sign)
    }
}
