//! The machine root aggregating all topology collections.

use crate::bus::Bus;
use crate::socket::Socket;
use crate::template::InstructionTemplate;
use crate::unit::{ControlUnit, FunctionUnit, ImmediateUnit, RegisterFile};

/// A complete transport-triggered machine.
///
/// All collections keep declaration order; that order is baked into
/// generated branch chains and positional lock-bit vectors, so it must be
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Machine {
    /// Transport buses in declaration order.
    pub buses: Vec<Bus>,
    /// Sockets in declaration order.
    pub sockets: Vec<Socket>,
    /// Function units in declaration order, excluding the control unit.
    pub function_units: Vec<FunctionUnit>,
    /// The control unit.
    pub control_unit: ControlUnit,
    /// Register files in declaration order.
    pub register_files: Vec<RegisterFile>,
    /// Immediate units in declaration order.
    pub immediate_units: Vec<ImmediateUnit>,
    /// Instruction templates in declaration order.
    pub templates: Vec<InstructionTemplate>,
}

impl Machine {
    /// Creates a machine holding only the given control unit.
    #[must_use]
    pub const fn new(control_unit: ControlUnit) -> Self {
        Self {
            buses: Vec::new(),
            sockets: Vec::new(),
            function_units: Vec::new(),
            control_unit,
            register_files: Vec::new(),
            immediate_units: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// Looks up a bus by name.
    #[must_use]
    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses.iter().find(|b| b.name == name)
    }

    /// Looks up a socket by name.
    #[must_use]
    pub fn socket(&self, name: &str) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.name == name)
    }

    /// Looks up a function unit by name. The control unit is not included.
    #[must_use]
    pub fn function_unit(&self, name: &str) -> Option<&FunctionUnit> {
        self.function_units.iter().find(|f| f.name == name)
    }

    /// Looks up a register file by name.
    #[must_use]
    pub fn register_file(&self, name: &str) -> Option<&RegisterFile> {
        self.register_files.iter().find(|r| r.name == name)
    }

    /// Looks up an immediate unit by name.
    #[must_use]
    pub fn immediate_unit(&self, name: &str) -> Option<&ImmediateUnit> {
        self.immediate_units.iter().find(|i| i.name == name)
    }

    /// Looks up an instruction template by name.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&InstructionTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Tells whether the named unit is the control unit.
    #[must_use]
    pub fn is_control_unit(&self, name: &str) -> bool {
        self.control_unit.name == name
    }

    /// Templates claiming the named slot, in declaration order.
    pub fn templates_using_slot<'a>(
        &'a self,
        slot: &'a str,
    ) -> impl Iterator<Item = &'a InstructionTemplate> {
        self.templates.iter().filter(move |t| t.uses_slot(slot))
    }
}
