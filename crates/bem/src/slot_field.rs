//! Source/destination slot fields and their socket encodings.

use crate::error::BemError;
use crate::port_code::{PortCode, SocketCodeTable};
use crate::width::{bit_length, encoding_width_for};

/// Which side of a move the field encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SlotFieldKind {
    /// The field selects the data source of the move.
    Source,
    /// The field selects the data destination of the move.
    Destination,
}

/// Placement of the socket-identifier sub-range within the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum IdPosition {
    /// Socket identifier occupies the most significant field bits.
    Left,
    /// Socket identifier occupies the least significant field bits.
    Right,
}

/// The encoding marking a source field as carrying a short immediate.
///
/// The code shares the socket-identifier space of the field; the
/// immediate value itself occupies `width` bits placed where a port-code
/// table would sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImmediateEncoding {
    /// Identifier code selecting the immediate source.
    pub encoding: u32,
    /// Width of the immediate value sub-range.
    pub width: u32,
}

/// The encoding of one socket reachable through a slot field.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SocketEncoding {
    /// Name of the encoded socket.
    pub socket: String,
    /// Socket-identifier code selecting this socket.
    pub encoding: u32,
    /// Port codes disambiguating resources behind the socket, if any.
    pub codes: Option<SocketCodeTable>,
}

impl SocketEncoding {
    /// Width of the attached code table, zero if there is none.
    #[must_use]
    pub fn code_table_width(&self) -> u32 {
        self.codes.as_ref().map_or(0, SocketCodeTable::width)
    }
}

/// A source or destination field of a move slot.
///
/// The field width follows its content: the socket-identifier sub-range
/// (zero bits when only one socket is encoded) plus the widest attached
/// port-code table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SlotField {
    /// Side of the move this field encodes.
    pub kind: SlotFieldKind,
    /// Placement of the socket identifier within the field.
    pub id_position: IdPosition,
    encodings: Vec<SocketEncoding>,
    immediate: Option<ImmediateEncoding>,
}

impl SlotField {
    /// Creates an empty slot field.
    #[must_use]
    pub const fn new(kind: SlotFieldKind, id_position: IdPosition) -> Self {
        Self {
            kind,
            id_position,
            encodings: Vec::new(),
            immediate: None,
        }
    }

    fn alternative_count(&self) -> usize {
        self.encodings.len() + usize::from(self.immediate.is_some())
    }

    /// Adds a socket encoding.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate socket, a duplicate code, or a code not
    /// representable in the identifier width the field has after the
    /// addition.
    pub fn add_socket_encoding(&mut self, encoding: SocketEncoding) -> Result<(), BemError> {
        if self.encodings.iter().any(|e| e.socket == encoding.socket) {
            return Err(BemError::DuplicateSocketEncoding(encoding.socket));
        }
        if self.taken_codes().any(|code| code == encoding.encoding) {
            return Err(BemError::DuplicateSocketCode(encoding.encoding));
        }
        let id_width = encoding_width_for(self.alternative_count() + 1);
        for code in self.taken_codes().chain(std::iter::once(encoding.encoding)) {
            if bit_length(code) > id_width {
                return Err(BemError::CodeNotRepresentable {
                    code,
                    width: id_width,
                });
            }
        }
        self.encodings.push(encoding);
        Ok(())
    }

    /// Marks the field as able to carry a short immediate.
    ///
    /// # Errors
    ///
    /// Fails if the field has an immediate encoding already, or the code
    /// collides with a socket code or does not fit the identifier width.
    pub fn set_immediate_encoding(&mut self, immediate: ImmediateEncoding) -> Result<(), BemError> {
        if self.immediate.is_some() {
            return Err(BemError::DuplicateImmediateEncoding);
        }
        if self.taken_codes().any(|code| code == immediate.encoding) {
            return Err(BemError::DuplicateSocketCode(immediate.encoding));
        }
        let id_width = encoding_width_for(self.alternative_count() + 1);
        for code in self.taken_codes().chain(std::iter::once(immediate.encoding)) {
            if bit_length(code) > id_width {
                return Err(BemError::CodeNotRepresentable {
                    code,
                    width: id_width,
                });
            }
        }
        self.immediate = Some(immediate);
        Ok(())
    }

    fn taken_codes(&self) -> impl Iterator<Item = u32> + '_ {
        self.encodings
            .iter()
            .map(|e| e.encoding)
            .chain(self.immediate.iter().map(|i| i.encoding))
    }

    /// The immediate encoding, if the field carries one.
    #[must_use]
    pub const fn immediate_encoding(&self) -> Option<&ImmediateEncoding> {
        self.immediate.as_ref()
    }

    /// All socket encodings, in the order they were added.
    #[must_use]
    pub fn encodings(&self) -> &[SocketEncoding] {
        &self.encodings
    }

    /// Looks up the encoding of the named socket.
    #[must_use]
    pub fn socket_encoding(&self, socket: &str) -> Option<&SocketEncoding> {
        self.encodings.iter().find(|e| e.socket == socket)
    }

    /// Width of the socket-identifier sub-range.
    #[must_use]
    pub fn socket_id_width(&self) -> u32 {
        encoding_width_for(self.alternative_count())
    }

    /// Total field width: identifier plus the widest of the port-code
    /// tables and the immediate value sub-range.
    #[must_use]
    pub fn width(&self) -> u32 {
        let tables = self
            .encodings
            .iter()
            .map(SocketEncoding::code_table_width)
            .max()
            .unwrap_or(0);
        let immediate = self.immediate.map_or(0, |i| i.width);
        self.socket_id_width() + tables.max(immediate)
    }

    /// Field-relative position of the immediate value sub-range.
    #[must_use]
    pub fn immediate_value_position(&self) -> Option<u32> {
        self.immediate.map(|i| match self.id_position {
            IdPosition::Right => self.width() - i.width,
            IdPosition::Left => 0,
        })
    }

    /// Field-relative position of the socket-identifier sub-range.
    #[must_use]
    pub fn socket_id_position(&self) -> u32 {
        match self.id_position {
            IdPosition::Right => 0,
            IdPosition::Left => self.width() - self.socket_id_width(),
        }
    }

    /// Field-relative position of the selector sub-range of a port code.
    #[must_use]
    pub fn code_selector_position(&self, code: &PortCode) -> u32 {
        match self.id_position {
            IdPosition::Right => self.socket_id_width() + code.index_width(),
            IdPosition::Left => code.index_width(),
        }
    }

    /// Field-relative position of the register-index sub-range of a code
    /// table.
    #[must_use]
    pub fn index_position(&self, table: &SocketCodeTable) -> u32 {
        match self.id_position {
            IdPosition::Right => self.width() - table.width(),
            IdPosition::Left => 0,
        }
    }
}
