//! Wiring phase: decoder ports and their external connections.
//!
//! Runs before any text is synthesized and fixes the decoder's port
//! inventory in a deterministic order. Both backends render the result
//! verbatim, so the two outputs expose identical interfaces. Lock-request
//! and global-lock bit positions are positional contracts recorded here
//! and consumed by the lock-merging pass.

use encoding_map::{bit_length, encoding_width_for, BinaryEncoding};
use machine_model::{Bus, Machine, Socket, SocketDirection};

use crate::error::GeneratorError;
use crate::names;
use crate::netlist::{Connection, DecoderNetlist, Port, PortDirection};
use crate::options::DecoderOptions;

/// Products of the wiring phase.
#[derive(Debug, Clone)]
pub struct WiringMap {
    /// The decoder block and its connections.
    pub netlist: DecoderNetlist,
    /// Units with a lock-request output, in `lock_req` bit order.
    pub lock_request_order: Vec<String>,
    /// Global-lock consumers, in `glock` bit order.
    pub global_lock_order: Vec<String>,
}

/// Width of the register-index sub-range addressing `registers` registers.
#[must_use]
pub fn register_index_width(registers: u32) -> u32 {
    registers.checked_sub(1).map_or(0, bit_length)
}

/// Width of the short-immediate data port of a bus.
///
/// A sign-extending bus transports the immediate already extended to the
/// bus width; a zero-extending bus transports the raw field.
#[must_use]
pub const fn simm_port_width(bus: &Bus) -> u32 {
    if bus.sign_extends() {
        bus.width
    } else {
        bus.immediate_width
    }
}

/// Tells whether a socket needs a bus-connection control port.
///
/// Output sockets always need one, even with a single segment, because
/// the segment driver must be disabled on a squashed move.
#[must_use]
pub fn needs_bus_control(socket: &Socket) -> bool {
    socket.segments.len() > 1
        || (socket.segments.len() == 1 && socket.direction == SocketDirection::Output)
}

/// Tells whether a socket needs a data-source control port.
#[must_use]
pub fn needs_data_control(socket: &Socket) -> bool {
    socket.direction == SocketDirection::Output && socket.ports.len() > 1
}

/// Width of the bus-connection control port of a socket.
///
/// Input sockets multiplex one segment through a binary code; output
/// sockets drive one enable bit per attached segment.
#[must_use]
pub fn bus_control_width(socket: &Socket) -> u32 {
    match socket.direction {
        SocketDirection::Input => encoding_width_for(socket.segments.len()),
        SocketDirection::Output => u32::try_from(socket.segments.len()).unwrap_or(u32::MAX),
    }
}

/// Width of the data-source control port of a socket.
#[must_use]
pub fn data_control_width(socket: &Socket) -> u32 {
    encoding_width_for(socket.ports.len())
}

/// Wires the decoder block: adds every port and records the connections.
///
/// # Errors
///
/// Fails only on a duplicate port name, which indicates clashing resource
/// names in the machine.
pub fn wire_decoder(
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
) -> Result<WiringMap, GeneratorError> {
    let mut netlist = DecoderNetlist::new();
    add_fixed_ports(&mut netlist, machine, encoding, options)?;
    add_short_immediate_ports(&mut netlist, machine)?;
    add_socket_control_ports(&mut netlist, machine)?;
    add_unit_control_ports(&mut netlist, machine)?;
    add_guard_ports(&mut netlist, machine)?;
    if options.bus_enable_registers {
        add_bus_enable_ports(&mut netlist, machine)?;
    }
    let lock_request_order = add_lock_request_port(&mut netlist, machine, options)?;
    let global_lock_order = add_global_lock_port(&mut netlist, machine, options)?;
    Ok(WiringMap {
        netlist,
        lock_request_order,
        global_lock_order,
    })
}

fn in_port(name: &str, width: u32) -> Port {
    Port {
        name: name.to_owned(),
        width,
        direction: PortDirection::In,
    }
}

fn out_port(name: &str, width: u32) -> Port {
    Port {
        name: name.to_owned(),
        width,
        direction: PortDirection::Out,
    }
}

fn add_fixed_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
) -> Result<(), GeneratorError> {
    netlist.decoder.add_port(in_port("clk", 1))?;
    netlist.decoder.add_port(in_port("rstx", 1))?;
    netlist.add_connected_port(
        in_port(names::INSTRUCTION_PORT, encoding.width()),
        "ifetch",
        names::INSTRUCTION_PORT,
        None,
    )?;
    netlist.add_connected_port(
        out_port(names::PC_LOAD_PORT, 1),
        "ifetch",
        names::PC_LOAD_PORT,
        None,
    )?;
    if machine.control_unit.return_address_port.is_some() {
        netlist.add_connected_port(
            out_port(names::RA_LOAD_PORT, 1),
            "ifetch",
            names::RA_LOAD_PORT,
            None,
        )?;
    }
    let pc_opcode_width = encoding_width_for(machine.control_unit.operations.len());
    if pc_opcode_width > 0 {
        netlist.add_connected_port(
            out_port(names::PC_OPCODE_PORT, pc_opcode_width),
            "ifetch",
            names::PC_OPCODE_PORT,
            None,
        )?;
    }
    netlist.decoder.add_port(in_port(names::LOCK_IN_PORT, 1))?;
    netlist.decoder.add_port(out_port(names::LOCK_OUT_PORT, 1))?;
    netlist
        .decoder
        .add_port(out_port(names::LOCK_STATUS_PORT, 1))?;
    if options.debug_soft_reset {
        netlist
            .decoder
            .add_port(in_port(names::DEBUG_RESET_PORT, 1))?;
    }
    Ok(())
}

fn add_short_immediate_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
) -> Result<(), GeneratorError> {
    for bus in &machine.buses {
        if bus.immediate_width == 0 {
            continue;
        }
        let data = names::simm_data_port(&bus.name);
        netlist.add_connected_port(out_port(&data, simm_port_width(bus)), "ic", &data, None)?;
        let cntrl = names::simm_control_port(&bus.name);
        netlist.add_connected_port(out_port(&cntrl, 1), "ic", &cntrl, None)?;
    }
    Ok(())
}

fn add_socket_control_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
) -> Result<(), GeneratorError> {
    for socket in &machine.sockets {
        if needs_bus_control(socket) {
            let name = names::socket_bus_control_port(&socket.name);
            let peer = format!("{}_bus_cntrl", socket.name);
            netlist.add_connected_port(
                out_port(&name, bus_control_width(socket)),
                "ic",
                &peer,
                None,
            )?;
        }
        if needs_data_control(socket) {
            let name = names::socket_data_control_port(&socket.name);
            let peer = format!("{}_data_cntrl", socket.name);
            netlist.add_connected_port(
                out_port(&name, data_control_width(socket)),
                "ic",
                &peer,
                None,
            )?;
        }
    }
    Ok(())
}

fn add_unit_control_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
) -> Result<(), GeneratorError> {
    for fu in &machine.function_units {
        for port in fu.input_ports() {
            let name = names::fu_load_port(&fu.name, &port.name);
            let peer = format!("{}_load", port.name);
            netlist.add_connected_port(out_port(&name, 1), &fu.name, &peer, None)?;
        }
        let opcode_width = encoding_width_for(fu.operations.len());
        if opcode_width > 0 {
            let name = names::fu_opcode_port(&fu.name);
            netlist.add_connected_port(out_port(&name, opcode_width), &fu.name, "opc", None)?;
        }
    }

    let gcu = &machine.control_unit;
    for port in &gcu.ports {
        if !port.is_input || port.is_trigger || gcu.is_return_address_port(&port.name) {
            continue;
        }
        let name = names::fu_load_port(&gcu.name, &port.name);
        let peer = format!("{}_load", port.name);
        netlist.add_connected_port(out_port(&name, 1), &gcu.name, &peer, None)?;
    }

    for rf in &machine.register_files {
        let index_width = register_index_width(rf.registers);
        for port in &rf.ports {
            let load = names::rf_load_port(&rf.name, &port.name);
            let peer = format!("{}_load", port.name);
            netlist.add_connected_port(out_port(&load, 1), &rf.name, &peer, None)?;
            if index_width > 0 {
                let opc = names::rf_opcode_port(&rf.name, &port.name);
                let peer = format!("{}_opc", port.name);
                netlist.add_connected_port(out_port(&opc, index_width), &rf.name, &peer, None)?;
            }
        }
    }

    for iu in &machine.immediate_units {
        let index_width = register_index_width(iu.registers);
        for port in &iu.ports {
            let load = names::iu_read_load_port(&iu.name, &port.name);
            let peer = format!("{}_read_load", port.name);
            netlist.add_connected_port(out_port(&load, 1), &iu.name, &peer, None)?;
            if index_width > 0 {
                let opc = names::iu_read_opcode_port(&iu.name, &port.name);
                let peer = format!("{}_read_opc", port.name);
                netlist.add_connected_port(out_port(&opc, index_width), &iu.name, &peer, None)?;
            }
        }
        let write = names::iu_write_port(&iu.name);
        netlist.add_connected_port(out_port(&write, iu.width), &iu.name, "write", None)?;
        let load = names::iu_write_load_port(&iu.name);
        netlist.add_connected_port(out_port(&load, 1), &iu.name, "write_load", None)?;
        if index_width > 0 {
            let opc = names::iu_write_opcode_port(&iu.name);
            netlist.add_connected_port(out_port(&opc, index_width), &iu.name, "write_opc", None)?;
        }
    }
    Ok(())
}

fn add_guard_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
) -> Result<(), GeneratorError> {
    // Guard ports are keyed by resource; both polarities of one resource
    // share a single input.
    let mut seen: Vec<String> = Vec::new();
    for bus in &machine.buses {
        for guard in &bus.guards {
            let name = names::guard_port(guard);
            if seen.contains(&name) {
                continue;
            }
            seen.push(name.clone());
            match guard {
                machine_model::Guard::Port { fu, port, .. } => {
                    netlist.add_connected_port(in_port(&name, 1), fu, port, None)?;
                }
                machine_model::Guard::Register { rf, index, .. } => {
                    netlist.add_connected_port(in_port(&name, 1), rf, "guard", Some(*index))?;
                }
            }
        }
    }
    Ok(())
}

fn add_bus_enable_ports(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
) -> Result<(), GeneratorError> {
    for bus in &machine.buses {
        let name = names::bus_enable_port(&bus.name);
        netlist.add_connected_port(out_port(&name, 1), "ic", &name, None)?;
    }
    Ok(())
}

fn add_lock_request_port(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
    options: &DecoderOptions,
) -> Result<Vec<String>, GeneratorError> {
    let requesters: Vec<String> = machine
        .function_units
        .iter()
        .filter(|fu| fu.emits_lock_request)
        .map(|fu| fu.name.clone())
        .collect();
    // The debug interface requests the lock through the last bit, after
    // every function-unit bit.
    let mut width = u32::try_from(requesters.len()).unwrap_or(u32::MAX);
    if options.debug_soft_reset {
        width += 1;
    }
    if width == 0 {
        return Ok(requesters);
    }
    netlist.decoder.add_port(in_port(names::LOCK_REQ_PORT, width))?;
    let mut bit: u32 = 0;
    for unit in &requesters {
        netlist.connections.push(Connection {
            decoder_port: names::LOCK_REQ_PORT.to_owned(),
            unit: unit.clone(),
            unit_port: "glockreq".to_owned(),
            bit: Some(bit),
        });
        bit += 1;
    }
    Ok(requesters)
}

fn add_global_lock_port(
    netlist: &mut DecoderNetlist,
    machine: &Machine,
    options: &DecoderOptions,
) -> Result<Vec<String>, GeneratorError> {
    let mut consumers: Vec<String> = Vec::new();
    for fu in &machine.function_units {
        if fu.uses_global_lock {
            consumers.push(fu.name.clone());
        }
    }
    for rf in &machine.register_files {
        if rf.uses_global_lock {
            consumers.push(rf.name.clone());
        }
    }
    for iu in &machine.immediate_units {
        if iu.uses_global_lock {
            consumers.push(iu.name.clone());
        }
    }
    if options.lock_interconnect {
        consumers.push("ic".to_owned());
    }
    if consumers.is_empty() {
        return Ok(consumers);
    }
    let width = u32::try_from(consumers.len()).unwrap_or(u32::MAX);
    netlist.decoder.add_port(out_port(names::GLOCK_PORT, width))?;
    let mut bit: u32 = 0;
    for unit in &consumers {
        netlist.connections.push(Connection {
            decoder_port: names::GLOCK_PORT.to_owned(),
            unit: unit.clone(),
            unit_port: "glock".to_owned(),
            bit: Some(bit),
        });
        bit += 1;
    }
    Ok(consumers)
}

#[cfg(test)]
mod tests {
    use encoding_map::BinaryEncoding;
    use encoding_map::MoveSlot;
    use machine_model::{
        Bus, ControlUnit, ExtensionMode, FuPort, FunctionUnit, Guard, ImmediateUnit, Machine,
        PortRef, RegisterFile, Socket, SocketDirection, UnitPort, UnitPortDirection,
    };

    use proptest::prelude::*;

    use crate::options::DecoderOptions;

    use super::{register_index_width, simm_port_width, wire_decoder};

    fn fixture_machine() -> Machine {
        let gcu = ControlUnit {
            name: "gcu".to_owned(),
            ports: vec![
                FuPort {
                    name: "pc".to_owned(),
                    width: 12,
                    is_input: true,
                    is_trigger: true,
                },
                FuPort {
                    name: "ra".to_owned(),
                    width: 12,
                    is_input: true,
                    is_trigger: false,
                },
            ],
            operations: vec!["jump".to_owned(), "call".to_owned()],
            delay_slots: 3,
            global_guard_latency: 1,
            return_address_port: Some("ra".to_owned()),
        };
        let mut machine = Machine::new(gcu);
        let mut b0 = Bus::new("b0".to_owned(), 32, 8, ExtensionMode::Sign);
        b0.guards.push(Guard::Register {
            rf: "rf1".to_owned(),
            index: 0,
            inverted: false,
        });
        b0.guards.push(Guard::Register {
            rf: "rf1".to_owned(),
            index: 0,
            inverted: true,
        });
        machine.buses.push(b0);
        machine.sockets.push(Socket {
            name: "alu_o1".to_owned(),
            direction: SocketDirection::Output,
            segments: vec!["b0".to_owned()],
            ports: vec![PortRef {
                unit: "alu".to_owned(),
                port: "out1".to_owned(),
            }],
        });
        machine.function_units.push(FunctionUnit {
            name: "alu".to_owned(),
            ports: vec![
                FuPort {
                    name: "in1t".to_owned(),
                    width: 32,
                    is_input: true,
                    is_trigger: true,
                },
                FuPort {
                    name: "out1".to_owned(),
                    width: 32,
                    is_input: false,
                    is_trigger: false,
                },
            ],
            operations: vec!["add".to_owned(), "sub".to_owned()],
            emits_lock_request: true,
            uses_global_lock: true,
        });
        machine.register_files.push(RegisterFile {
            name: "rf1".to_owned(),
            registers: 4,
            width: 32,
            ports: vec![UnitPort {
                name: "wr".to_owned(),
                direction: UnitPortDirection::Write,
            }],
            uses_global_lock: true,
        });
        machine.immediate_units.push(ImmediateUnit {
            name: "imm".to_owned(),
            registers: 1,
            width: 32,
            extension: ExtensionMode::Zero,
            latency: 1,
            ports: vec![UnitPort {
                name: "rd".to_owned(),
                direction: UnitPortDirection::Read,
            }],
            uses_global_lock: true,
        });
        machine
    }

    fn fixture_encoding() -> BinaryEncoding {
        let mut bem = BinaryEncoding::new();
        bem.add_move_slot(MoveSlot::new("b0".to_owned(), 16)).unwrap();
        bem
    }

    #[test]
    fn port_inventory_is_deterministic() {
        let machine = fixture_machine();
        let bem = fixture_encoding();
        let options = DecoderOptions::default();
        let map = wire_decoder(&machine, &bem, &options).unwrap();
        let names: Vec<&str> = map
            .netlist
            .decoder
            .ports()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "clk",
                "rstx",
                "instructionword",
                "pc_load",
                "ra_load",
                "pc_opcode",
                "lock",
                "lock_r",
                "locked",
                "simm_b0",
                "simm_cntrl_b0",
                "socket_alu_o1_bus_cntrl",
                "fu_alu_in1t_load",
                "fu_alu_opc",
                "rf_rf1_wr_load",
                "rf_rf1_wr_opc",
                "iu_imm_rd_read_load",
                "iu_imm_write",
                "iu_imm_write_load",
                "rf_guard_rf1_0",
                "lock_req",
                "glock"
            ]
        );
    }

    #[test]
    fn opposite_guard_polarities_share_one_port() {
        let machine = fixture_machine();
        let map = wire_decoder(&machine, &fixture_encoding(), &DecoderOptions::default()).unwrap();
        let guard_ports: Vec<_> = map
            .netlist
            .decoder
            .ports()
            .iter()
            .filter(|p| p.name.starts_with("rf_guard"))
            .collect();
        assert_eq!(guard_ports.len(), 1);
    }

    #[test]
    fn lock_bit_orders_follow_declaration_order() {
        let machine = fixture_machine();
        let map = wire_decoder(&machine, &fixture_encoding(), &DecoderOptions::default()).unwrap();
        assert_eq!(map.lock_request_order, ["alu"]);
        assert_eq!(map.global_lock_order, ["alu", "rf1", "imm", "ic"]);
        assert_eq!(map.netlist.decoder.port("glock").unwrap().width, 4);
    }

    #[test]
    fn sign_extending_bus_transports_full_width_immediates() {
        let machine = fixture_machine();
        assert_eq!(simm_port_width(&machine.buses[0]), 32);
        let map = wire_decoder(&machine, &fixture_encoding(), &DecoderOptions::default()).unwrap();
        assert_eq!(map.netlist.decoder.port("simm_b0").unwrap().width, 32);
    }

    proptest! {
        #[test]
        fn index_width_is_minimal_and_sufficient(registers in 1u32..=4096) {
            let width = register_index_width(registers);
            prop_assert!(u64::from(registers) <= 1u64 << width);
            if width > 0 {
                prop_assert!(u64::from(registers) > 1u64 << (width - 1));
            }
        }
    }

    #[test]
    fn debug_reset_adds_the_soft_reset_input() {
        let machine = fixture_machine();
        let options = DecoderOptions {
            debug_soft_reset: true,
            ..DecoderOptions::default()
        };
        let map = wire_decoder(&machine, &fixture_encoding(), &options).unwrap();
        assert!(map.netlist.decoder.port("db_tta_nreset").is_some());
    }

    #[test]
    fn debug_interface_reserves_a_trailing_lock_request_bit() {
        let machine = fixture_machine();
        let options = DecoderOptions {
            debug_soft_reset: true,
            ..DecoderOptions::default()
        };
        let map = wire_decoder(&machine, &fixture_encoding(), &options).unwrap();
        // One requesting unit plus the debug bit.
        assert_eq!(map.netlist.decoder.port("lock_req").unwrap().width, 2);
        assert_eq!(map.lock_request_order, ["alu"]);
    }

    #[test]
    fn lock_ports_are_omitted_when_nothing_requests_or_consumes() {
        let gcu = ControlUnit {
            name: "gcu".to_owned(),
            ports: vec![FuPort {
                name: "pc".to_owned(),
                width: 12,
                is_input: true,
                is_trigger: true,
            }],
            operations: vec!["jump".to_owned()],
            delay_slots: 3,
            global_guard_latency: 1,
            return_address_port: None,
        };
        let machine = Machine::new(gcu);
        let options = DecoderOptions {
            lock_interconnect: false,
            ..DecoderOptions::default()
        };
        let map = wire_decoder(&machine, &fixture_encoding(), &options).unwrap();
        assert!(map.netlist.decoder.port("lock_req").is_none());
        assert!(map.netlist.decoder.port("glock").is_none());
    }
}
