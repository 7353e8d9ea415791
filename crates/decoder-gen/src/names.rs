//! Deterministic signal and port naming shared by both backends.
//!
//! Every name emitted into the decoder is derived from the declared
//! resource names through the templates below; downstream tooling matches
//! on these names, so they are part of the external contract.

use machine_model::Guard;

/// Name of the long-immediate template-selector signal.
pub const LIMM_TAG_SIGNAL: &str = "limm_tag";
/// Name of the instruction-word input port.
pub const INSTRUCTION_PORT: &str = "instructionword";
/// Name of the global-lock output port.
pub const GLOCK_PORT: &str = "glock";
/// Name of the per-unit lock-request input port.
pub const LOCK_REQ_PORT: &str = "lock_req";
/// Name of the external lock-request input port.
pub const LOCK_IN_PORT: &str = "lock";
/// Name of the merged lock-request output port.
pub const LOCK_OUT_PORT: &str = "lock_r";
/// Name of the registered lock-status output port.
pub const LOCK_STATUS_PORT: &str = "locked";
/// Name of the debug soft-reset input port.
pub const DEBUG_RESET_PORT: &str = "db_tta_nreset";
/// Name of the program-counter load output port.
pub const PC_LOAD_PORT: &str = "pc_load";
/// Name of the return-address load output port.
pub const RA_LOAD_PORT: &str = "ra_load";
/// Name of the program-counter opcode output port.
pub const PC_OPCODE_PORT: &str = "pc_opcode";
/// Name of the merged internal lock-request signal.
pub const MERGED_GLOCK_REQ_SIGNAL: &str = "merged_glock_req";
/// Name of the pre-decode merged lock signal.
pub const PRE_DECODE_GLOCK_SIGNAL: &str = "pre_decode_merged_glock";
/// Name of the post-decode merged lock signal.
pub const POST_DECODE_GLOCK_SIGNAL: &str = "post_decode_merged_glock";
/// Name of the registered post-decode merged lock signal.
pub const POST_DECODE_GLOCK_OUTREG: &str = "post_decode_merged_glock_r";
/// Name of the pipeline-fill lock register.
pub const PIPELINE_FILL_SIGNAL: &str = "decode_fill_lock_reg";

/// Data port for the short immediate of a bus.
#[must_use]
pub fn simm_data_port(bus: &str) -> String {
    format!("simm_{bus}")
}

/// Control port for the short immediate of a bus.
#[must_use]
pub fn simm_control_port(bus: &str) -> String {
    format!("simm_cntrl_{bus}")
}

/// Register backing the short-immediate data port.
#[must_use]
pub fn simm_data_signal(bus: &str) -> String {
    format!("simm_{bus}_reg")
}

/// Register backing the short-immediate control port.
#[must_use]
pub fn simm_control_signal(bus: &str) -> String {
    format!("simm_cntrl_{bus}_reg")
}

/// Load control port of a function-unit data port.
#[must_use]
pub fn fu_load_port(fu: &str, port: &str) -> String {
    format!("fu_{fu}_{port}_load")
}

/// Register backing a function-unit load control port.
#[must_use]
pub fn fu_load_signal(fu: &str, port: &str) -> String {
    format!("{}_reg", fu_load_port(fu, port))
}

/// Opcode control port of a function unit.
#[must_use]
pub fn fu_opcode_port(fu: &str) -> String {
    format!("fu_{fu}_opc")
}

/// Register backing a function-unit opcode port.
#[must_use]
pub fn fu_opcode_signal(fu: &str) -> String {
    format!("{}_reg", fu_opcode_port(fu))
}

/// Load control port of a register-file data port.
#[must_use]
pub fn rf_load_port(rf: &str, port: &str) -> String {
    format!("rf_{rf}_{port}_load")
}

/// Register backing a register-file load control port.
#[must_use]
pub fn rf_load_signal(rf: &str, port: &str) -> String {
    format!("{}_reg", rf_load_port(rf, port))
}

/// Opcode control port of a register-file data port.
#[must_use]
pub fn rf_opcode_port(rf: &str, port: &str) -> String {
    format!("rf_{rf}_{port}_opc")
}

/// Register backing a register-file opcode port.
#[must_use]
pub fn rf_opcode_signal(rf: &str, port: &str) -> String {
    format!("{}_reg", rf_opcode_port(rf, port))
}

/// Load control port of an immediate-unit read port.
#[must_use]
pub fn iu_read_load_port(iu: &str, port: &str) -> String {
    format!("iu_{iu}_{port}_read_load")
}

/// Register backing an immediate-unit read load port.
#[must_use]
pub fn iu_read_load_signal(iu: &str, port: &str) -> String {
    format!("{}_reg", iu_read_load_port(iu, port))
}

/// Opcode control port of an immediate-unit read port.
#[must_use]
pub fn iu_read_opcode_port(iu: &str, port: &str) -> String {
    format!("iu_{iu}_{port}_read_opc")
}

/// Register backing an immediate-unit read opcode port.
#[must_use]
pub fn iu_read_opcode_signal(iu: &str, port: &str) -> String {
    format!("{}_reg", iu_read_opcode_port(iu, port))
}

/// Write data port of an immediate unit.
#[must_use]
pub fn iu_write_port(iu: &str) -> String {
    format!("iu_{iu}_write")
}

/// Register backing an immediate-unit write data port.
#[must_use]
pub fn iu_write_signal(iu: &str) -> String {
    format!("{}_reg", iu_write_port(iu))
}

/// Write load port of an immediate unit.
#[must_use]
pub fn iu_write_load_port(iu: &str) -> String {
    format!("{}_load", iu_write_port(iu))
}

/// Register backing an immediate-unit write load port.
#[must_use]
pub fn iu_write_load_signal(iu: &str) -> String {
    format!("{}_reg", iu_write_load_port(iu))
}

/// Write opcode port of an immediate unit.
#[must_use]
pub fn iu_write_opcode_port(iu: &str) -> String {
    format!("{}_opc", iu_write_port(iu))
}

/// Register backing an immediate-unit write opcode port.
#[must_use]
pub fn iu_write_opcode_signal(iu: &str) -> String {
    format!("{}_reg", iu_write_opcode_port(iu))
}

/// Guard input port of the decoder for a machine guard.
#[must_use]
pub fn guard_port(guard: &Guard) -> String {
    match guard {
        Guard::Port { fu, port, .. } => format!("fu_guard_{fu}_{port}"),
        Guard::Register { rf, index, .. } => format!("rf_guard_{rf}_{index}"),
    }
}

/// Bus connection control port of a socket.
#[must_use]
pub fn socket_bus_control_port(socket: &str) -> String {
    format!("socket_{socket}_bus_cntrl")
}

/// Register backing a socket bus control port.
#[must_use]
pub fn socket_bus_control_signal(socket: &str) -> String {
    format!("{}_reg", socket_bus_control_port(socket))
}

/// Data-source control port of a socket.
#[must_use]
pub fn socket_data_control_port(socket: &str) -> String {
    format!("socket_{socket}_data_cntrl")
}

/// Register backing a socket data control port.
#[must_use]
pub fn socket_data_control_signal(socket: &str) -> String {
    format!("{}_reg", socket_data_control_port(socket))
}

/// Signal carrying the whole move slot of a bus.
#[must_use]
pub fn move_field_signal(bus: &str) -> String {
    format!("move_{bus}")
}

/// Signal carrying the source field of a bus.
#[must_use]
pub fn src_field_signal(bus: &str) -> String {
    format!("src_{bus}")
}

/// Signal carrying the destination field of a bus.
#[must_use]
pub fn dst_field_signal(bus: &str) -> String {
    format!("dst_{bus}")
}

/// Signal carrying the guard field of a bus.
#[must_use]
pub fn guard_field_signal(bus: &str) -> String {
    format!("grd_{bus}")
}

/// Per-bus transport-cancel signal.
#[must_use]
pub fn squash_signal(bus: &str) -> String {
    format!("squash_{bus}")
}

/// Bus-enable output port of a bus.
#[must_use]
pub fn bus_enable_port(bus: &str) -> String {
    format!("{bus}_src_ena")
}

/// Register backing a bus-enable port.
#[must_use]
pub fn bus_enable_signal(bus: &str) -> String {
    format!("{}_reg", bus_enable_port(bus))
}

#[cfg(test)]
mod tests {
    use machine_model::Guard;

    use super::{fu_load_signal, guard_port, simm_data_port, squash_signal};

    #[test]
    fn names_follow_the_fixed_templates() {
        assert_eq!(simm_data_port("b0"), "simm_b0");
        assert_eq!(fu_load_signal("alu", "in1t"), "fu_alu_in1t_load_reg");
        assert_eq!(squash_signal("b2"), "squash_b2");
    }

    #[test]
    fn guard_ports_encode_the_resource_identity() {
        let port = Guard::Port {
            fu: "alu".to_owned(),
            port: "r1".to_owned(),
            inverted: false,
        };
        let reg = Guard::Register {
            rf: "rf0".to_owned(),
            index: 2,
            inverted: true,
        };
        assert_eq!(guard_port(&port), "fu_guard_alu_r1");
        assert_eq!(guard_port(&reg), "rf_guard_rf0_2");
    }
}
