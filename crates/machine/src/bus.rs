//! Transport buses and the guard terms attached to them.

/// Extension policy applied when a narrower value is driven onto a wider
/// target (short immediates onto a bus, long immediates into an immediate
/// unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ExtensionMode {
    /// Replicate the most significant assigned bit.
    Sign,
    /// Pad with zero bits.
    Zero,
}

/// A boolean condition that can cancel the transport scheduled on a bus.
///
/// The polarity flag selects between the raw resource value and its
/// complement; an inverted guard is true when the resource value is false.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Guard {
    /// Guard sourced from a function-unit output port.
    Port {
        /// Name of the function unit.
        fu: String,
        /// Name of the output port within the unit.
        port: String,
        /// Polarity flag.
        inverted: bool,
    },
    /// Guard sourced from a single general-purpose register bit.
    Register {
        /// Name of the register file.
        rf: String,
        /// Register index within the file.
        index: u32,
        /// Polarity flag.
        inverted: bool,
    },
}

impl Guard {
    /// Returns the polarity flag of the guard.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        match self {
            Self::Port { inverted, .. } | Self::Register { inverted, .. } => *inverted,
        }
    }
}

/// One transport bus of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Bus {
    /// Bus name, unique within the machine.
    pub name: String,
    /// Data width of the bus in bits.
    pub width: u32,
    /// Width of the short-immediate field of the bus, zero if none.
    pub immediate_width: u32,
    /// Extension policy for short immediates narrower than the bus.
    pub extension: ExtensionMode,
    /// Guard terms usable on this bus, in declaration order.
    pub guards: Vec<Guard>,
}

impl Bus {
    /// Creates a bus without guards.
    #[must_use]
    pub const fn new(
        name: String,
        width: u32,
        immediate_width: u32,
        extension: ExtensionMode,
    ) -> Self {
        Self {
            name,
            width,
            immediate_width,
            extension,
            guards: Vec::new(),
        }
    }

    /// Tells whether short immediates on this bus are sign extended.
    #[must_use]
    pub const fn sign_extends(&self) -> bool {
        matches!(self.extension, ExtensionMode::Sign)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bus, ExtensionMode, Guard};

    #[test]
    fn guard_polarity_is_reported_for_both_kinds() {
        let port = Guard::Port {
            fu: "alu".to_owned(),
            port: "r1".to_owned(),
            inverted: true,
        };
        let reg = Guard::Register {
            rf: "rf0".to_owned(),
            index: 3,
            inverted: false,
        };
        assert!(port.is_inverted());
        assert!(!reg.is_inverted());
    }

    #[test]
    fn new_bus_has_no_guards() {
        let bus = Bus::new("b0".to_owned(), 32, 8, ExtensionMode::Sign);
        assert!(bus.guards.is_empty());
        assert!(bus.sign_extends());
    }
}
