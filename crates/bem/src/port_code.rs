//! Port codes disambiguating resources that share one socket.

use crate::error::BemError;
use crate::width::{bit_length, encoding_width_for};

/// One port code inside a socket code table.
///
/// Register-file and immediate-unit codes carry an index sub-range for the
/// register index; function-unit codes instead name an optional operation,
/// so distinct operations on the same port get distinct codes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PortCode {
    /// Code for a function-unit port, optionally per operation.
    Fu {
        /// Function unit name.
        unit: String,
        /// Port name within the unit.
        port: String,
        /// Operation selected by this code, if the port is opcode setting.
        operation: Option<String>,
        /// Selecting code.
        encoding: u32,
    },
    /// Code for a register-file port.
    Rf {
        /// Register file name.
        unit: String,
        /// Selecting code.
        encoding: u32,
        /// Width of the register-index sub-range.
        index_width: u32,
    },
    /// Code for an immediate-unit port.
    Iu {
        /// Immediate unit name.
        unit: String,
        /// Selecting code.
        encoding: u32,
        /// Width of the register-index sub-range.
        index_width: u32,
    },
}

impl PortCode {
    /// Returns the selecting code.
    #[must_use]
    pub const fn encoding(&self) -> u32 {
        match self {
            Self::Fu { encoding, .. } | Self::Rf { encoding, .. } | Self::Iu { encoding, .. } => {
                *encoding
            }
        }
    }

    /// Returns the width of the register-index sub-range, zero for
    /// function-unit codes.
    #[must_use]
    pub const fn index_width(&self) -> u32 {
        match self {
            Self::Fu { .. } => 0,
            Self::Rf { index_width, .. } | Self::Iu { index_width, .. } => *index_width,
        }
    }

    /// Returns the name of the unit the code selects.
    #[must_use]
    pub fn unit(&self) -> &str {
        match self {
            Self::Fu { unit, .. } | Self::Rf { unit, .. } | Self::Iu { unit, .. } => unit,
        }
    }

    /// Tells whether two codes select the same resource.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Fu {
                    unit: a,
                    port: ap,
                    operation: ao,
                    ..
                },
                Self::Fu {
                    unit: b,
                    port: bp,
                    operation: bo,
                    ..
                },
            ) => a == b && ap == bp && ao == bo,
            (Self::Rf { unit: a, .. }, Self::Rf { unit: b, .. })
            | (Self::Iu { unit: a, .. }, Self::Iu { unit: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A table of port codes attached to one socket encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SocketCodeTable {
    codes: Vec<PortCode>,
}

impl SocketCodeTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { codes: Vec::new() }
    }

    /// Adds a port code to the table.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate resource identity, a duplicate code value, or
    /// a code not representable in the selector width the table has after
    /// the addition.
    pub fn add_port_code(&mut self, code: PortCode) -> Result<(), BemError> {
        if self.codes.iter().any(|c| c.same_identity(&code)) {
            return Err(BemError::DuplicatePortCode(code.unit().to_owned()));
        }
        if self.codes.iter().any(|c| c.encoding() == code.encoding()) {
            return Err(BemError::DuplicatePortCodeValue(code.encoding()));
        }
        let selector_width = encoding_width_for(self.codes.len() + 1);
        for existing in self.codes.iter().chain(std::iter::once(&code)) {
            if bit_length(existing.encoding()) > selector_width {
                return Err(BemError::CodeNotRepresentable {
                    code: existing.encoding(),
                    width: selector_width,
                });
            }
        }
        self.codes.push(code);
        Ok(())
    }

    /// All codes, in the order they were added.
    #[must_use]
    pub fn codes(&self) -> &[PortCode] {
        &self.codes
    }

    /// Width of the selector sub-range shared by all codes.
    #[must_use]
    pub fn encoding_width(&self) -> u32 {
        encoding_width_for(self.codes.len())
    }

    /// Total width of the table: selector plus the widest index sub-range.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.encoding_width()
            + self
                .codes
                .iter()
                .map(PortCode::index_width)
                .max()
                .unwrap_or(0)
    }

    /// Looks up the code of the named function-unit port and operation.
    #[must_use]
    pub fn fu_port_code(
        &self,
        unit: &str,
        port: &str,
        operation: Option<&str>,
    ) -> Option<&PortCode> {
        self.codes.iter().find(|c| {
            matches!(c, PortCode::Fu { unit: u, port: p, operation: o, .. }
                if u == unit && p == port && o.as_deref() == operation)
        })
    }

    /// Looks up the code of the named register file.
    #[must_use]
    pub fn rf_port_code(&self, unit: &str) -> Option<&PortCode> {
        self.codes
            .iter()
            .find(|c| matches!(c, PortCode::Rf { unit: u, .. } if u == unit))
    }

    /// Looks up the code of the named immediate unit.
    #[must_use]
    pub fn iu_port_code(&self, unit: &str) -> Option<&PortCode> {
        self.codes
            .iter()
            .find(|c| matches!(c, PortCode::Iu { unit: u, .. } if u == unit))
    }
}
