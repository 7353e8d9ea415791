//! Construction-time errors of the encoding model.

use thiserror::Error;

/// Rejected attempt to build a structurally invalid encoding map.
///
/// Every variant corresponds to a violated construction invariant; the
/// model never reaches an inconsistent state because the offending
/// addition is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BemError {
    /// A move slot for the bus exists already.
    #[error("move slot for bus `{0}` already exists")]
    DuplicateMoveSlot(String),
    /// An immediate slot with the name exists already.
    #[error("immediate slot `{0}` already exists")]
    DuplicateImmediateSlot(String),
    /// The map already has an immediate control field.
    #[error("encoding map already has an immediate control field")]
    DuplicateImmediateControlField,
    /// A destination-register field for the template/unit pair exists.
    #[error("destination register field for template `{template}` and unit `{unit}` already exists")]
    DuplicateDstRegisterField {
        /// Instruction template name.
        template: String,
        /// Immediate unit name.
        unit: String,
    },
    /// The move slot already owns a field of this kind.
    #[error("move slot already has a {0} field")]
    DuplicateSlotField(&'static str),
    /// The field does not fit inside its move slot.
    #[error("field at bits [{lsb}, {msb}] does not fit or overlaps a sibling in a {width}-bit slot")]
    FieldTiling {
        /// Least significant bit of the rejected field, relative to the slot.
        lsb: u32,
        /// Most significant bit of the rejected field, relative to the slot.
        msb: u32,
        /// Declared width of the move slot.
        width: u32,
    },
    /// A guard encoding with the same resource and polarity exists.
    #[error("guard encoding with the same resource and polarity already exists")]
    DuplicateGuardIdentity,
    /// A guard encoding with the same numeric code exists.
    #[error("guard encoding code {0} is already in use")]
    DuplicateGuardCode(u32),
    /// The field already has a short-immediate encoding.
    #[error("slot field already has an immediate encoding")]
    DuplicateImmediateEncoding,
    /// The socket already has an encoding in the field.
    #[error("socket `{0}` already has an encoding in this field")]
    DuplicateSocketEncoding(String),
    /// The socket-encoding code collides with an existing one.
    #[error("socket encoding code {0} is already in use")]
    DuplicateSocketCode(u32),
    /// A port code for the same resource exists in the table.
    #[error("port code for `{0}` already exists in this table")]
    DuplicatePortCode(String),
    /// A port code with the same numeric code exists in the table.
    #[error("port code {0} is already in use in this table")]
    DuplicatePortCodeValue(u32),
    /// An instruction template encoding with the name exists.
    #[error("template encoding for `{0}` already exists")]
    DuplicateTemplateEncoding(String),
    /// An instruction template encoding with the code exists.
    #[error("template encoding code {0} is already in use")]
    DuplicateTemplateCode(u32),
    /// A code value does not fit the width its position implies.
    #[error("code {code} is not representable in {width} bits")]
    CodeNotRepresentable {
        /// The rejected code value.
        code: u32,
        /// The width available for the code.
        width: u32,
    },
}
