//! Move slots tiling the per-bus instruction-word fields.

use crate::error::BemError;
use crate::guard::GuardField;
use crate::slot_field::SlotField;

/// The instruction-word portion dedicated to one bus.
///
/// A slot has a declared width and owns at most one source, destination
/// and guard field, each placed at an explicit slot-relative bit position.
/// Attached fields must tile: pairwise disjoint and inside the declared
/// width.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MoveSlot {
    /// Name of the bus this slot programs.
    pub bus: String,
    /// Declared slot width in bits.
    pub width: u32,
    guard: Option<(u32, GuardField)>,
    source: Option<(u32, SlotField)>,
    destination: Option<(u32, SlotField)>,
}

impl MoveSlot {
    /// Creates an empty move slot of the given declared width.
    #[must_use]
    pub const fn new(bus: String, width: u32) -> Self {
        Self {
            bus,
            width,
            guard: None,
            source: None,
            destination: None,
        }
    }

    fn check_tiling(&self, position: u32, width: u32) -> Result<(), BemError> {
        let msb = position + width.max(1) - 1;
        let overlaps = |other: Option<(u32, u32)>| {
            other.is_some_and(|(pos, w)| {
                let other_msb = pos + w.max(1) - 1;
                position <= other_msb && pos <= msb
            })
        };
        let fits = msb < self.width;
        let clash = overlaps(self.guard.as_ref().map(|(p, f)| (*p, f.width())))
            || overlaps(self.source.as_ref().map(|(p, f)| (*p, f.width())))
            || overlaps(self.destination.as_ref().map(|(p, f)| (*p, f.width())));
        if fits && !clash {
            Ok(())
        } else {
            Err(BemError::FieldTiling {
                lsb: position,
                msb,
                width: self.width,
            })
        }
    }

    /// Attaches the guard field at the given slot-relative position.
    ///
    /// # Errors
    ///
    /// Fails if the slot has a guard field already, or the field does not
    /// tile with its siblings.
    pub fn set_guard_field(&mut self, position: u32, field: GuardField) -> Result<(), BemError> {
        if self.guard.is_some() {
            return Err(BemError::DuplicateSlotField("guard"));
        }
        self.check_tiling(position, field.width())?;
        self.guard = Some((position, field));
        Ok(())
    }

    /// Attaches the source field at the given slot-relative position.
    ///
    /// # Errors
    ///
    /// Fails if the slot has a source field already, or the field does not
    /// tile with its siblings.
    pub fn set_source_field(&mut self, position: u32, field: SlotField) -> Result<(), BemError> {
        if self.source.is_some() {
            return Err(BemError::DuplicateSlotField("source"));
        }
        self.check_tiling(position, field.width())?;
        self.source = Some((position, field));
        Ok(())
    }

    /// Attaches the destination field at the given slot-relative position.
    ///
    /// # Errors
    ///
    /// Fails if the slot has a destination field already, or the field
    /// does not tile with its siblings.
    pub fn set_destination_field(
        &mut self,
        position: u32,
        field: SlotField,
    ) -> Result<(), BemError> {
        if self.destination.is_some() {
            return Err(BemError::DuplicateSlotField("destination"));
        }
        self.check_tiling(position, field.width())?;
        self.destination = Some((position, field));
        Ok(())
    }

    /// Tells whether the slot has a guard field.
    #[must_use]
    pub const fn has_guard_field(&self) -> bool {
        self.guard.is_some()
    }

    /// Tells whether the slot has a source field.
    #[must_use]
    pub const fn has_source_field(&self) -> bool {
        self.source.is_some()
    }

    /// Tells whether the slot has a destination field.
    #[must_use]
    pub const fn has_destination_field(&self) -> bool {
        self.destination.is_some()
    }

    /// The guard field, if attached.
    #[must_use]
    pub fn guard_field(&self) -> Option<&GuardField> {
        self.guard.as_ref().map(|(_, f)| f)
    }

    /// Slot-relative position of the guard field, if attached.
    #[must_use]
    pub fn guard_field_position(&self) -> Option<u32> {
        self.guard.as_ref().map(|(p, _)| *p)
    }

    /// The source field, if attached.
    #[must_use]
    pub fn source_field(&self) -> Option<&SlotField> {
        self.source.as_ref().map(|(_, f)| f)
    }

    /// Slot-relative position of the source field, if attached.
    #[must_use]
    pub fn source_field_position(&self) -> Option<u32> {
        self.source.as_ref().map(|(p, _)| *p)
    }

    /// The destination field, if attached.
    #[must_use]
    pub fn destination_field(&self) -> Option<&SlotField> {
        self.destination.as_ref().map(|(_, f)| f)
    }

    /// Slot-relative position of the destination field, if attached.
    #[must_use]
    pub fn destination_field_position(&self) -> Option<u32> {
        self.destination.as_ref().map(|(p, _)| *p)
    }
}
