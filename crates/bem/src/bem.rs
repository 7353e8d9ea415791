//! The encoding-map root and its top-level fields.

use crate::error::BemError;
use crate::move_slot::MoveSlot;
use crate::width::bit_length;

/// A dedicated long-immediate bit range outside any move slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImmediateSlotField {
    /// Slot name, unique within the map.
    pub name: String,
    /// Slot width in bits.
    pub width: u32,
}

/// The template-selector field choosing the active instruction template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImmediateControlField {
    encodings: Vec<(String, u32)>,
}

impl ImmediateControlField {
    /// Creates a field with no template encodings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            encodings: Vec::new(),
        }
    }

    /// Assigns a selector code to the named instruction template.
    ///
    /// # Errors
    ///
    /// Fails if the template or the code already has an assignment.
    pub fn add_template_encoding(&mut self, template: String, code: u32) -> Result<(), BemError> {
        if self.encodings.iter().any(|(name, _)| *name == template) {
            return Err(BemError::DuplicateTemplateEncoding(template));
        }
        if self.encodings.iter().any(|(_, c)| *c == code) {
            return Err(BemError::DuplicateTemplateCode(code));
        }
        self.encodings.push((template, code));
        Ok(())
    }

    /// Returns the selector code of the named template.
    #[must_use]
    pub fn template_encoding(&self, template: &str) -> Option<u32> {
        self.encodings
            .iter()
            .find(|(name, _)| name == template)
            .map(|(_, code)| *code)
    }

    /// All template encodings, in the order they were added.
    #[must_use]
    pub fn encodings(&self) -> &[(String, u32)] {
        &self.encodings
    }

    /// Width of the field: enough bits for the largest selector code.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.encodings
            .iter()
            .map(|(_, code)| bit_length(*code))
            .max()
            .unwrap_or(0)
    }
}

/// A destination-register index field for a long-immediate write.
///
/// Present once per (template, immediate unit) pair whenever the unit has
/// more than one register.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LimmDstRegisterField {
    /// Instruction template the field belongs to.
    pub template: String,
    /// Immediate unit the index addresses.
    pub unit: String,
    /// Field width in bits.
    pub width: u32,
}

/// The complete binary encoding map of an instruction word.
///
/// Top-level fields occupy the word from bit 0 upward in a fixed order:
/// the immediate control field first, then destination-register fields,
/// immediate slots and move slots, each group in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BinaryEncoding {
    move_slots: Vec<MoveSlot>,
    immediate_slots: Vec<ImmediateSlotField>,
    immediate_control: Option<ImmediateControlField>,
    dst_register_fields: Vec<LimmDstRegisterField>,
}

impl BinaryEncoding {
    /// Creates an empty encoding map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            move_slots: Vec::new(),
            immediate_slots: Vec::new(),
            immediate_control: None,
            dst_register_fields: Vec::new(),
        }
    }

    /// Adds a move slot.
    ///
    /// # Errors
    ///
    /// Fails if a slot for the same bus exists.
    pub fn add_move_slot(&mut self, slot: MoveSlot) -> Result<(), BemError> {
        if self.move_slots.iter().any(|s| s.bus == slot.bus) {
            return Err(BemError::DuplicateMoveSlot(slot.bus));
        }
        self.move_slots.push(slot);
        Ok(())
    }

    /// Adds a dedicated immediate slot.
    ///
    /// # Errors
    ///
    /// Fails if a slot with the same name exists.
    pub fn add_immediate_slot(&mut self, slot: ImmediateSlotField) -> Result<(), BemError> {
        if self.immediate_slots.iter().any(|s| s.name == slot.name) {
            return Err(BemError::DuplicateImmediateSlot(slot.name));
        }
        self.immediate_slots.push(slot);
        Ok(())
    }

    /// Installs the immediate control field.
    ///
    /// # Errors
    ///
    /// Fails if the map has one already.
    pub fn set_immediate_control_field(
        &mut self,
        field: ImmediateControlField,
    ) -> Result<(), BemError> {
        if self.immediate_control.is_some() {
            return Err(BemError::DuplicateImmediateControlField);
        }
        self.immediate_control = Some(field);
        Ok(())
    }

    /// Adds a destination-register index field.
    ///
    /// # Errors
    ///
    /// Fails if a field for the same (template, unit) pair exists.
    pub fn add_dst_register_field(&mut self, field: LimmDstRegisterField) -> Result<(), BemError> {
        if self
            .dst_register_fields
            .iter()
            .any(|f| f.template == field.template && f.unit == field.unit)
        {
            return Err(BemError::DuplicateDstRegisterField {
                template: field.template,
                unit: field.unit,
            });
        }
        self.dst_register_fields.push(field);
        Ok(())
    }

    /// Move slots in insertion order.
    #[must_use]
    pub fn move_slots(&self) -> &[MoveSlot] {
        &self.move_slots
    }

    /// Dedicated immediate slots in insertion order.
    #[must_use]
    pub fn immediate_slots(&self) -> &[ImmediateSlotField] {
        &self.immediate_slots
    }

    /// Destination-register index fields in insertion order.
    #[must_use]
    pub fn dst_register_fields(&self) -> &[LimmDstRegisterField] {
        &self.dst_register_fields
    }

    /// Looks up the move slot of the named bus.
    #[must_use]
    pub fn move_slot(&self, bus: &str) -> Option<&MoveSlot> {
        self.move_slots.iter().find(|s| s.bus == bus)
    }

    /// Looks up a dedicated immediate slot by name.
    #[must_use]
    pub fn immediate_slot(&self, name: &str) -> Option<&ImmediateSlotField> {
        self.immediate_slots.iter().find(|s| s.name == name)
    }

    /// The immediate control field, if present.
    #[must_use]
    pub const fn immediate_control_field(&self) -> Option<&ImmediateControlField> {
        self.immediate_control.as_ref()
    }

    /// Tells whether the map has an immediate control field.
    #[must_use]
    pub const fn has_immediate_control_field(&self) -> bool {
        self.immediate_control.is_some()
    }

    /// Looks up the destination-register field of a (template, unit) pair.
    #[must_use]
    pub fn dst_register_field(&self, template: &str, unit: &str) -> Option<&LimmDstRegisterField> {
        self.dst_register_fields
            .iter()
            .find(|f| f.template == template && f.unit == unit)
    }

    /// Total width of the instruction word.
    #[must_use]
    pub fn width(&self) -> u32 {
        let control = self.immediate_control.as_ref().map_or(0, |f| f.width());
        let dst: u32 = self.dst_register_fields.iter().map(|f| f.width).sum();
        let imm: u32 = self.immediate_slots.iter().map(|s| s.width).sum();
        let moves: u32 = self.move_slots.iter().map(|s| s.width).sum();
        control + dst + imm + moves
    }

    /// Absolute bit position of the immediate control field.
    #[must_use]
    pub fn immediate_control_field_position(&self) -> Option<u32> {
        self.immediate_control.as_ref().map(|_| 0)
    }

    /// Absolute bit position of a destination-register field.
    #[must_use]
    pub fn dst_register_field_position(&self, template: &str, unit: &str) -> Option<u32> {
        let mut position = self.immediate_control.as_ref().map_or(0, |f| f.width());
        for field in &self.dst_register_fields {
            if field.template == template && field.unit == unit {
                return Some(position);
            }
            position += field.width;
        }
        None
    }

    /// Absolute bit position of a dedicated immediate slot.
    #[must_use]
    pub fn immediate_slot_position(&self, name: &str) -> Option<u32> {
        let mut position = self.immediate_control.as_ref().map_or(0, |f| f.width())
            + self
                .dst_register_fields
                .iter()
                .map(|f| f.width)
                .sum::<u32>();
        for slot in &self.immediate_slots {
            if slot.name == name {
                return Some(position);
            }
            position += slot.width;
        }
        None
    }

    /// Absolute bit position of the move slot of the named bus.
    #[must_use]
    pub fn move_slot_position(&self, bus: &str) -> Option<u32> {
        let mut position = self.immediate_control.as_ref().map_or(0, |f| f.width())
            + self
                .dst_register_fields
                .iter()
                .map(|f| f.width)
                .sum::<u32>()
            + self.immediate_slots.iter().map(|s| s.width).sum::<u32>();
        for slot in &self.move_slots {
            if slot.bus == bus {
                return Some(position);
            }
            position += slot.width;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::error::BemError;
    use crate::move_slot::MoveSlot;

    use super::{BinaryEncoding, ImmediateControlField, ImmediateSlotField, LimmDstRegisterField};

    fn map_with_two_slots() -> BinaryEncoding {
        let mut bem = BinaryEncoding::new();
        let mut control = ImmediateControlField::new();
        control
            .add_template_encoding("default".to_owned(), 0)
            .unwrap();
        control.add_template_encoding("limm".to_owned(), 1).unwrap();
        bem.set_immediate_control_field(control).unwrap();
        bem.add_immediate_slot(ImmediateSlotField {
            name: "limm0".to_owned(),
            width: 8,
        })
        .unwrap();
        bem.add_move_slot(MoveSlot::new("b0".to_owned(), 10)).unwrap();
        bem.add_move_slot(MoveSlot::new("b1".to_owned(), 12)).unwrap();
        bem
    }

    #[test]
    fn width_sums_all_top_level_fields() {
        // 1 control bit + 8 immediate bits + 10 + 12 move-slot bits
        assert_eq!(map_with_two_slots().width(), 31);
    }

    #[test]
    fn positions_grow_rightmost_first_in_insertion_order() {
        let bem = map_with_two_slots();
        assert_eq!(bem.immediate_control_field_position(), Some(0));
        assert_eq!(bem.immediate_slot_position("limm0"), Some(1));
        assert_eq!(bem.move_slot_position("b0"), Some(9));
        assert_eq!(bem.move_slot_position("b1"), Some(19));
        assert_eq!(bem.move_slot_position("b2"), None);
    }

    #[test]
    fn duplicate_top_level_fields_are_rejected() {
        let mut bem = map_with_two_slots();
        assert_eq!(
            bem.add_move_slot(MoveSlot::new("b0".to_owned(), 4)),
            Err(BemError::DuplicateMoveSlot("b0".to_owned()))
        );
        assert_eq!(
            bem.add_immediate_slot(ImmediateSlotField {
                name: "limm0".to_owned(),
                width: 4,
            }),
            Err(BemError::DuplicateImmediateSlot("limm0".to_owned()))
        );
        assert_eq!(
            bem.set_immediate_control_field(ImmediateControlField::new()),
            Err(BemError::DuplicateImmediateControlField)
        );
    }

    #[test]
    fn dst_register_fields_are_keyed_by_template_and_unit() {
        let mut bem = BinaryEncoding::new();
        bem.add_dst_register_field(LimmDstRegisterField {
            template: "limm".to_owned(),
            unit: "imm".to_owned(),
            width: 2,
        })
        .unwrap();
        assert!(bem.dst_register_field("limm", "imm").is_some());
        assert!(bem.dst_register_field("limm", "other").is_none());
        assert_eq!(
            bem.add_dst_register_field(LimmDstRegisterField {
                template: "limm".to_owned(),
                unit: "imm".to_owned(),
                width: 3,
            }),
            Err(BemError::DuplicateDstRegisterField {
                template: "limm".to_owned(),
                unit: "imm".to_owned(),
            })
        );
    }

    #[test]
    fn template_selector_width_follows_largest_code() {
        let mut control = ImmediateControlField::new();
        assert_eq!(control.width(), 0);
        control.add_template_encoding("a".to_owned(), 0).unwrap();
        control.add_template_encoding("b".to_owned(), 2).unwrap();
        assert_eq!(control.width(), 2);
        assert_eq!(control.template_encoding("b"), Some(2));
        assert_eq!(control.template_encoding("c"), None);
    }
}
