//! Long-immediate instruction templates.

/// One bit range an instruction template claims for a long immediate.
///
/// The slot name refers either to a move slot (by bus name) or to a
/// dedicated immediate slot of the encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TemplateSlot {
    /// Name of the claimed slot.
    pub slot: String,
    /// Number of immediate bits carried in the slot.
    pub width: u32,
    /// Name of the immediate unit receiving the bits.
    pub destination: String,
}

/// An instruction template assigning slots to immediate-unit destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionTemplate {
    /// Template name, unique within the machine.
    pub name: String,
    /// Claimed slots in declaration order. The first declared slot for a
    /// unit carries the most significant assigned bits.
    pub slots: Vec<TemplateSlot>,
}

impl InstructionTemplate {
    /// Tells whether the template claims the named slot.
    #[must_use]
    pub fn uses_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s.slot == slot)
    }

    /// Tells whether the template writes to the named immediate unit.
    #[must_use]
    pub fn is_one_of_destinations(&self, unit: &str) -> bool {
        self.slots.iter().any(|s| s.destination == unit)
    }

    /// Returns the slots targeting the named immediate unit, in
    /// declaration order.
    pub fn slots_of_destination<'a>(
        &'a self,
        unit: &'a str,
    ) -> impl Iterator<Item = &'a TemplateSlot> {
        self.slots.iter().filter(move |s| s.destination == unit)
    }

    /// Total immediate width the template supplies to the named unit.
    #[must_use]
    pub fn supported_width(&self, unit: &str) -> u32 {
        self.slots_of_destination(unit).map(|s| s.width).sum()
    }

    /// Tells whether the template claims no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
