//! Binary encoding model for transport-triggered instruction words.
//!
//! The model is an ordered, hierarchical bit-field tree: move slots (one
//! per bus) own source, destination and guard fields; slot fields own
//! socket encodings with optional port-code tables; the root additionally
//! carries immediate slots, long-immediate destination-register fields and
//! at most one immediate control field. The tree is built once, with every
//! structural invariant (field tiling, code uniqueness, width
//! representability) enforced at construction, and is read-only afterwards.

/// Construction-time error type.
pub mod error;
pub use error::BemError;

/// Bit-width arithmetic shared by all field types.
pub mod width;
pub use width::{bit_length, encoding_width_for};

/// Guard fields and guard-encoding variants.
pub mod guard;
pub use guard::{GuardEncoding, GuardField};

/// Port codes and socket code tables.
pub mod port_code;
pub use port_code::{PortCode, SocketCodeTable};

/// Source/destination slot fields and socket encodings.
pub mod slot_field;
pub use slot_field::{IdPosition, ImmediateEncoding, SlotField, SlotFieldKind, SocketEncoding};

/// Move slots tiling the per-bus fields.
pub mod move_slot;
pub use move_slot::MoveSlot;

/// The encoding-map root and its top-level fields.
pub mod bem;
pub use bem::{
    BinaryEncoding, ImmediateControlField, ImmediateSlotField, LimmDstRegisterField,
};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
