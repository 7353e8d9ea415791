//! Generation options shared by the wiring and synthesis phases.

use crate::hdl::HdlLanguage;

/// Options steering one decoder-generation run.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Output language of the synthesis phase.
    pub language: HdlLanguage,
    /// Base name of the processor; the decoder entity is named
    /// `<name>_decoder`.
    pub entity_name: String,
    /// Emit an asynchronous active-low reset instead of a synchronous one.
    pub async_reset: bool,
    /// Add the `db_tta_nreset` soft-reset input that re-applies the reset
    /// values while the core keeps running.
    pub debug_soft_reset: bool,
    /// Emit the simulation-only lock-trace dump process.
    pub lock_trace: bool,
    /// First cycle the lock-trace dump reports on.
    pub lock_trace_start_cycle: u32,
    /// Emit one registered bus-enable output per bus, the complement of
    /// the squash signal.
    pub bus_enable_registers: bool,
    /// Exclude each unit's own lock request from the lock it receives.
    pub no_self_lock_loopback: bool,
    /// Reserve a global-lock bit for the interconnect.
    pub lock_interconnect: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            language: HdlLanguage::Vhdl,
            entity_name: "tta0".to_owned(),
            async_reset: true,
            debug_soft_reset: false,
            lock_trace: false,
            lock_trace_start_cycle: 0,
            bus_enable_registers: false,
            no_self_lock_loopback: false,
            lock_interconnect: true,
        }
    }
}

impl DecoderOptions {
    /// Options for the given language with all defaults.
    #[must_use]
    pub fn for_language(language: HdlLanguage) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// Name of the generated decoder entity or module.
    #[must_use]
    pub fn decoder_entity(&self) -> String {
        format!("{}_decoder", self.entity_name)
    }
}
