//! Control-signal decode rules of the main decode process.
//!
//! Source rules route data onto buses: output-socket bus and data
//! controls, short-immediate drivers, and register-file/immediate-unit
//! read enables. Destination rules route bus data into units: input-socket
//! controls, load enables and operation codes. Every rule chain walks
//! sockets, units and bus segments in declaration order, so the emitted
//! branch order is identical across backends and across runs.

use encoding_map::{BinaryEncoding, PortCode, SlotField, SocketCodeTable};
use machine_model::{FuPort, Machine, PortRef, Socket, SocketDirection};

use crate::error::GeneratorError;
use crate::hdl::{Condition, HdlLanguage, HdlWriter, Rhs, Slice};
use crate::names;
use crate::options::DecoderOptions;
use crate::wiring::{
    bus_control_width, data_control_width, needs_bus_control, needs_data_control, simm_port_width,
};

/// A slot field together with the dismembered signal carrying it.
struct FieldRef<'a> {
    field: &'a SlotField,
    signal: String,
}

fn source_field<'a>(encoding: &'a BinaryEncoding, bus: &str) -> Option<FieldRef<'a>> {
    encoding
        .move_slot(bus)
        .and_then(|s| s.source_field())
        .map(|field| FieldRef {
            field,
            signal: names::src_field_signal(bus),
        })
}

fn destination_field<'a>(encoding: &'a BinaryEncoding, bus: &str) -> Option<FieldRef<'a>> {
    encoding
        .move_slot(bus)
        .and_then(|s| s.destination_field())
        .map(|field| FieldRef {
            field,
            signal: names::dst_field_signal(bus),
        })
}

impl FieldRef<'_> {
    /// Condition matching the socket-identifier sub-range against a code.
    /// A zero-width identifier matches unconditionally.
    fn id_condition(&self, code: u32) -> Option<Condition> {
        let width = self.field.socket_id_width();
        if width == 0 {
            return None;
        }
        let lsb = self.field.socket_id_position();
        Some(Condition::SliceEq {
            slice: Slice::new(self.signal.clone(), lsb + width - 1, lsb),
            value: code,
        })
    }

    /// Condition matching the port-code selector sub-range of a table.
    fn selector_condition(&self, table: &SocketCodeTable, code: &PortCode) -> Option<Condition> {
        let width = table.encoding_width();
        if width == 0 {
            return None;
        }
        let lsb = self.field.code_selector_position(code);
        Some(Condition::SliceEq {
            slice: Slice::new(self.signal.clone(), lsb + width - 1, lsb),
            value: code.encoding(),
        })
    }

    /// Slice of the register-index sub-range of a table.
    fn index_slice(&self, table: &SocketCodeTable, code: &PortCode) -> Slice {
        let lsb = self.field.index_position(table);
        Slice::new(self.signal.clone(), lsb + code.index_width() - 1, lsb)
    }
}

fn squash_condition(bus: &str) -> Condition {
    Condition::BitEq {
        signal: names::squash_signal(bus),
        value: false,
    }
}

fn and_all(parts: Vec<Condition>) -> Condition {
    if parts.len() == 1 {
        parts.into_iter().next().unwrap_or(Condition::Always)
    } else {
        Condition::And(parts)
    }
}

fn bit_target(name: &str, bit: u32, width: u32, language: HdlLanguage) -> String {
    if width <= 1 {
        name.to_owned()
    } else {
        Slice::new(name.to_owned(), bit, bit).render(language)
    }
}

/// One guarded branch of a decode chain.
struct Branch {
    condition: Condition,
    actions: Vec<(String, Rhs)>,
}

fn emit_chain(w: &mut HdlWriter, branches: &[Branch], default: &[(String, Rhs)]) {
    if branches.is_empty() {
        return;
    }
    for (i, branch) in branches.iter().enumerate() {
        if i == 0 {
            w.if_start(&branch.condition);
        } else {
            w.else_if(&branch.condition);
        }
        for (target, rhs) in &branch.actions {
            w.assign(target, rhs);
        }
    }
    w.else_start();
    for (target, rhs) in default {
        w.assign(target, rhs);
    }
    w.if_end();
}

fn output_sockets_of_port<'a>(
    machine: &'a Machine,
    unit: &str,
    port: &str,
) -> impl Iterator<Item = &'a Socket> {
    let unit = unit.to_owned();
    let port = port.to_owned();
    machine.sockets.iter().filter(move |s| {
        s.direction == SocketDirection::Output
            && s.ports.iter().any(|p| p.unit == unit && p.port == port)
    })
}

fn input_sockets_of_port<'a>(
    machine: &'a Machine,
    unit: &str,
    port: &str,
) -> impl Iterator<Item = &'a Socket> {
    let unit = unit.to_owned();
    let port = port.to_owned();
    machine.sockets.iter().filter(move |s| {
        s.direction == SocketDirection::Input
            && s.ports.iter().any(|p| p.unit == unit && p.port == port)
    })
}

fn emit_output_socket_bus_controls(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) {
    for socket in &machine.sockets {
        if socket.direction != SocketDirection::Output || !needs_bus_control(socket) {
            continue;
        }
        let width = bus_control_width(socket);
        let reg = names::socket_bus_control_signal(&socket.name);
        for (pin, bus) in socket.segments.iter().enumerate() {
            let Some(fref) = source_field(encoding, bus) else {
                continue;
            };
            let Some(enc) = fref.field.socket_encoding(&socket.name) else {
                continue;
            };
            let mut parts = vec![squash_condition(bus)];
            parts.extend(fref.id_condition(enc.encoding));
            let pin = u32::try_from(pin).unwrap_or(u32::MAX);
            let target = bit_target(&reg, pin, width, w.language());
            w.if_start(&and_all(parts));
            w.assign(&target, &Rhs::Bit(true));
            w.else_start();
            w.assign(&target, &Rhs::Bit(false));
            w.if_end();
        }
    }
}

fn emit_short_immediate_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    for bus in &machine.buses {
        if bus.immediate_width == 0 {
            continue;
        }
        let fref = source_field(encoding, &bus.name).ok_or_else(|| {
            GeneratorError::MissingField(format!("source field of bus {}", bus.name))
        })?;
        let imm = fref.field.immediate_encoding().ok_or_else(|| {
            GeneratorError::MissingEncoding(format!("short immediate of bus {}", bus.name))
        })?;
        let lsb = fref.field.immediate_value_position().ok_or_else(|| {
            GeneratorError::MissingEncoding(format!("short immediate of bus {}", bus.name))
        })?;
        let mut parts = vec![squash_condition(&bus.name)];
        parts.extend(fref.id_condition(imm.encoding));
        let slice = Slice::new(fref.signal.clone(), lsb + imm.width - 1, lsb);
        let rhs = if bus.sign_extends() {
            Rhs::SignExtend {
                slice,
                width: simm_port_width(bus),
            }
        } else {
            Rhs::ZeroExtend {
                slice,
                width: simm_port_width(bus),
            }
        };
        w.if_start(&and_all(parts));
        w.assign(&names::simm_control_signal(&bus.name), &Rhs::Bit(true));
        w.assign(&names::simm_data_signal(&bus.name), &rhs);
        w.else_start();
        w.assign(&names::simm_control_signal(&bus.name), &Rhs::Bit(false));
        w.if_end();
    }
    Ok(())
}

fn codes_of_port<'a>(table: &'a SocketCodeTable, port: &PortRef) -> Vec<&'a PortCode> {
    table
        .codes()
        .iter()
        .filter(|code| match code {
            PortCode::Fu { unit, port: p, .. } => *unit == port.unit && *p == port.port,
            PortCode::Rf { unit, .. } | PortCode::Iu { unit, .. } => *unit == port.unit,
        })
        .collect()
}

fn emit_output_socket_data_controls(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) {
    for socket in &machine.sockets {
        if !needs_data_control(socket) {
            continue;
        }
        let width = data_control_width(socket);
        let reg = names::socket_data_control_signal(&socket.name);
        for (pin, port) in socket.ports.iter().enumerate() {
            let pin = u32::try_from(pin).unwrap_or(u32::MAX);
            for bus in &socket.segments {
                let Some(fref) = source_field(encoding, bus) else {
                    continue;
                };
                let Some(enc) = fref.field.socket_encoding(&socket.name) else {
                    continue;
                };
                let Some(table) = enc.codes.as_ref() else {
                    continue;
                };
                for code in codes_of_port(table, port) {
                    let mut parts = vec![squash_condition(bus)];
                    parts.extend(fref.id_condition(enc.encoding));
                    parts.extend(fref.selector_condition(table, code));
                    w.if_start(&and_all(parts));
                    w.assign(&reg, &Rhs::Const { value: pin, width });
                    w.if_end();
                }
            }
        }
    }
}

fn read_port_branches(
    machine: &Machine,
    encoding: &BinaryEncoding,
    unit: &str,
    port: &str,
    load_reg: &str,
    opcode_reg: Option<&str>,
) -> Vec<Branch> {
    let mut branches = Vec::new();
    for socket in output_sockets_of_port(machine, unit, port) {
        for bus in &socket.segments {
            let Some(fref) = source_field(encoding, bus) else {
                continue;
            };
            let Some(enc) = fref.field.socket_encoding(&socket.name) else {
                continue;
            };
            let mut parts = vec![squash_condition(bus)];
            parts.extend(fref.id_condition(enc.encoding));
            let mut actions = vec![(load_reg.to_owned(), Rhs::Bit(true))];
            if let Some(table) = enc.codes.as_ref() {
                let code = table
                    .rf_port_code(unit)
                    .or_else(|| table.iu_port_code(unit));
                if let Some(code) = code {
                    parts.extend(fref.selector_condition(table, code));
                    if let Some(opcode_reg) = opcode_reg {
                        if code.index_width() > 0 {
                            let slice = fref.index_slice(table, code);
                            actions.push((opcode_reg.to_owned(), Rhs::Slice(slice)));
                        }
                    }
                }
            }
            branches.push(Branch {
                condition: and_all(parts),
                actions,
            });
        }
    }
    branches
}

fn emit_register_read_rules(w: &mut HdlWriter, machine: &Machine, encoding: &BinaryEncoding) {
    for rf in &machine.register_files {
        for port in &rf.ports {
            if port.direction != machine_model::UnitPortDirection::Read {
                continue;
            }
            let load = names::rf_load_signal(&rf.name, &port.name);
            let opc = names::rf_opcode_signal(&rf.name, &port.name);
            let branches =
                read_port_branches(machine, encoding, &rf.name, &port.name, &load, Some(&opc));
            emit_chain(w, &branches, &[(load, Rhs::Bit(false))]);
        }
    }
    for iu in &machine.immediate_units {
        for port in &iu.ports {
            if port.direction != machine_model::UnitPortDirection::Read {
                continue;
            }
            let load = names::iu_read_load_signal(&iu.name, &port.name);
            let opc = names::iu_read_opcode_signal(&iu.name, &port.name);
            let branches =
                read_port_branches(machine, encoding, &iu.name, &port.name, &load, Some(&opc));
            emit_chain(w, &branches, &[(load, Rhs::Bit(false))]);
        }
    }
}

/// Emits all data-source rules: bus controls of output sockets, short
/// immediates, data-source controls, and register read enables.
///
/// # Errors
///
/// Fails when a bus with a short immediate has no source field or no
/// immediate encoding.
pub fn emit_source_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    emit_output_socket_bus_controls(w, machine, encoding);
    emit_short_immediate_rules(w, machine, encoding)?;
    emit_output_socket_data_controls(w, machine, encoding);
    emit_register_read_rules(w, machine, encoding);
    Ok(())
}

/// Destination targets a matched move loads into.
struct LoadTargets {
    load_reg: String,
    opcode_reg: Option<String>,
    opcode_width: u32,
}

/// Tells whether the opcode can be sliced straight out of the field: the
/// table must encode only this port and assign every operation its
/// natural declaration-order opcode.
fn opcode_slice_applies(
    table: &SocketCodeTable,
    port: &PortRef,
    opcode_of: &dyn Fn(&str) -> Option<u32>,
) -> bool {
    table.codes().iter().all(|code| match code {
        PortCode::Fu {
            unit,
            port: p,
            operation: Some(op),
            encoding,
        } => *unit == port.unit && *p == port.port && opcode_of(op) == Some(*encoding),
        _ => false,
    })
}

#[allow(clippy::too_many_lines)]
fn input_port_branches(
    machine: &Machine,
    encoding: &BinaryEncoding,
    port: &PortRef,
    targets: &LoadTargets,
    opcode_of: &dyn Fn(&str) -> Option<u32>,
) -> Result<Vec<Branch>, GeneratorError> {
    let mut branches = Vec::new();
    for socket in input_sockets_of_port(machine, &port.unit, &port.port) {
        let control_width = bus_control_width(socket);
        for (segment, bus) in socket.segments.iter().enumerate() {
            let Some(fref) = destination_field(encoding, bus) else {
                continue;
            };
            let Some(enc) = fref.field.socket_encoding(&socket.name) else {
                continue;
            };
            let base: Vec<Condition> = {
                let mut parts = vec![squash_condition(bus)];
                parts.extend(fref.id_condition(enc.encoding));
                parts
            };
            let socket_control = if needs_bus_control(socket) {
                let segment = u32::try_from(segment).unwrap_or(u32::MAX);
                Some((
                    names::socket_bus_control_signal(&socket.name),
                    Rhs::Const {
                        value: segment,
                        width: control_width,
                    },
                ))
            } else {
                None
            };
            let table = enc.codes.as_ref();
            let codes = table.map(|t| codes_of_port(t, port)).unwrap_or_default();
            if codes.is_empty() {
                // Socket dedicated to this port; the identifier match is
                // the whole condition.
                let mut actions = vec![(targets.load_reg.clone(), Rhs::Bit(true))];
                actions.extend(socket_control.clone());
                branches.push(Branch {
                    condition: and_all(base),
                    actions,
                });
                continue;
            }
            let table = table.unwrap_or(&EMPTY_TABLE);
            if targets.opcode_reg.is_some() && opcode_slice_applies(table, port, opcode_of) {
                let mut actions = vec![(targets.load_reg.clone(), Rhs::Bit(true))];
                if let (Some(opcode_reg), Some(code)) = (&targets.opcode_reg, codes.first()) {
                    let lsb = fref.field.code_selector_position(code);
                    let slice =
                        Slice::new(fref.signal.clone(), lsb + table.encoding_width() - 1, lsb);
                    actions.push((opcode_reg.clone(), Rhs::Slice(slice)));
                }
                actions.extend(socket_control.clone());
                branches.push(Branch {
                    condition: and_all(base),
                    actions,
                });
                continue;
            }
            for code in codes {
                let mut parts = base.clone();
                parts.extend(fref.selector_condition(table, code));
                let mut actions = vec![(targets.load_reg.clone(), Rhs::Bit(true))];
                if let (
                    Some(opcode_reg),
                    PortCode::Fu {
                        operation: Some(op),
                        ..
                    },
                ) = (&targets.opcode_reg, code)
                {
                    let value = opcode_of(op).ok_or_else(|| {
                        GeneratorError::MissingEncoding(format!(
                            "operation {op} of unit {}",
                            port.unit
                        ))
                    })?;
                    actions.push((
                        opcode_reg.clone(),
                        Rhs::Const {
                            value,
                            width: targets.opcode_width,
                        },
                    ));
                }
                actions.extend(socket_control.clone());
                branches.push(Branch {
                    condition: and_all(parts),
                    actions,
                });
            }
        }
    }
    Ok(branches)
}

static EMPTY_TABLE: SocketCodeTable = SocketCodeTable::new();

fn fu_port_targets(machine: &Machine, fu: &str, port: &FuPort) -> LoadTargets {
    let unit = machine.function_unit(fu);
    let opcode_width =
        unit.map_or(0, |u| encoding_map::encoding_width_for(u.operations.len()));
    let sets_opcode = port.is_trigger && opcode_width > 0;
    LoadTargets {
        load_reg: names::fu_load_signal(fu, &port.name),
        opcode_reg: sets_opcode.then(|| names::fu_opcode_signal(fu)),
        opcode_width,
    }
}

fn emit_fu_destination_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    for fu in &machine.function_units {
        for port in fu.input_ports() {
            let targets = fu_port_targets(machine, &fu.name, port);
            let port_ref = PortRef {
                unit: fu.name.clone(),
                port: port.name.clone(),
            };
            let opcode_of = |op: &str| fu.opcode(op);
            let branches =
                input_port_branches(machine, encoding, &port_ref, &targets, &opcode_of)?;
            emit_chain(w, &branches, &[(targets.load_reg.clone(), Rhs::Bit(false))]);
        }
    }
    Ok(())
}

fn emit_gcu_destination_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    let gcu = &machine.control_unit;
    let opcode_width = encoding_map::encoding_width_for(gcu.operations.len());
    for port in &gcu.ports {
        if !port.is_input {
            continue;
        }
        let targets = if port.is_trigger {
            LoadTargets {
                load_reg: format!("{}_reg", names::PC_LOAD_PORT),
                opcode_reg: (opcode_width > 0)
                    .then(|| format!("{}_reg", names::PC_OPCODE_PORT)),
                opcode_width,
            }
        } else if gcu.is_return_address_port(&port.name) {
            LoadTargets {
                load_reg: format!("{}_reg", names::RA_LOAD_PORT),
                opcode_reg: None,
                opcode_width: 0,
            }
        } else {
            LoadTargets {
                load_reg: names::fu_load_signal(&gcu.name, &port.name),
                opcode_reg: None,
                opcode_width: 0,
            }
        };
        let port_ref = PortRef {
            unit: gcu.name.clone(),
            port: port.name.clone(),
        };
        let opcode_of = |op: &str| {
            gcu.operations
                .iter()
                .position(|o| o == op)
                .and_then(|i| u32::try_from(i).ok())
        };
        let branches = input_port_branches(machine, encoding, &port_ref, &targets, &opcode_of)?;
        emit_chain(w, &branches, &[(targets.load_reg.clone(), Rhs::Bit(false))]);
    }
    Ok(())
}

fn emit_register_write_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    for rf in &machine.register_files {
        for port in &rf.ports {
            if port.direction != machine_model::UnitPortDirection::Write {
                continue;
            }
            let load = names::rf_load_signal(&rf.name, &port.name);
            let opc = names::rf_opcode_signal(&rf.name, &port.name);
            let mut branches = Vec::new();
            for socket in input_sockets_of_port(machine, &rf.name, &port.name) {
                let control_width = bus_control_width(socket);
                for (segment, bus) in socket.segments.iter().enumerate() {
                    let Some(fref) = destination_field(encoding, bus) else {
                        continue;
                    };
                    let Some(enc) = fref.field.socket_encoding(&socket.name) else {
                        continue;
                    };
                    let mut parts = vec![squash_condition(bus)];
                    parts.extend(fref.id_condition(enc.encoding));
                    let mut actions = vec![(load.clone(), Rhs::Bit(true))];
                    if let Some(table) = enc.codes.as_ref() {
                        if let Some(code) = table.rf_port_code(&rf.name) {
                            parts.extend(fref.selector_condition(table, code));
                            if code.index_width() > 0 {
                                let slice = fref.index_slice(table, code);
                                actions.push((opc.clone(), Rhs::Slice(slice)));
                            }
                        }
                    }
                    if needs_bus_control(socket) {
                        let segment = u32::try_from(segment).unwrap_or(u32::MAX);
                        actions.push((
                            names::socket_bus_control_signal(&socket.name),
                            Rhs::Const {
                                value: segment,
                                width: control_width,
                            },
                        ));
                    }
                    branches.push(Branch {
                        condition: and_all(parts),
                        actions,
                    });
                }
            }
            emit_chain(w, &branches, &[(load, Rhs::Bit(false))]);
        }
    }
    Ok(())
}

fn emit_bus_enable_rules(w: &mut HdlWriter, machine: &Machine) {
    for bus in &machine.buses {
        w.assign(
            &names::bus_enable_signal(&bus.name),
            &Rhs::Not(names::squash_signal(&bus.name)),
        );
    }
}

/// Emits all data-destination rules: load enables, operation codes and
/// input-socket controls, plus the optional bus-enable updates.
///
/// # Errors
///
/// Fails when an encoded operation does not exist in the machine.
pub fn emit_destination_rules(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
) -> Result<(), GeneratorError> {
    emit_fu_destination_rules(w, machine, encoding)?;
    emit_gcu_destination_rules(w, machine, encoding)?;
    emit_register_write_rules(w, machine, encoding)?;
    if options.bus_enable_registers {
        emit_bus_enable_rules(w, machine);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use encoding_map::{
        BinaryEncoding, IdPosition, ImmediateEncoding, MoveSlot, PortCode, SlotField,
        SlotFieldKind, SocketCodeTable, SocketEncoding,
    };
    use machine_model::{
        Bus, ControlUnit, ExtensionMode, FuPort, FunctionUnit, Machine, PortRef, RegisterFile,
        Socket, SocketDirection, UnitPort, UnitPortDirection,
    };

    use crate::hdl::{HdlLanguage, HdlWriter};
    use crate::options::DecoderOptions;

    use super::{emit_destination_rules, emit_source_rules};

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
        machine
            .buses
            .push(Bus::new("b0".to_owned(), 32, 8, ExtensionMode::Sign));
        machine
            .buses
            .push(Bus::new("b1".to_owned(), 32, 0, ExtensionMode::Zero));
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
            emits_lock_request: false,
            uses_global_lock: true,
        });
        machine.register_files.push(RegisterFile {
            name: "rf1".to_owned(),
            registers: 4,
            width: 32,
            ports: vec![
                UnitPort {
                    name: "rd".to_owned(),
                    direction: UnitPortDirection::Read,
                },
                UnitPort {
                    name: "wr".to_owned(),
                    direction: UnitPortDirection::Write,
                },
            ],
            uses_global_lock: true,
        });
        let socket = |name: &str, direction, segments: &[&str], ports: &[(&str, &str)]| Socket {
            name: name.to_owned(),
            direction,
            segments: segments.iter().map(|s| (*s).to_owned()).collect(),
            ports: ports
                .iter()
                .map(|(u, p)| PortRef {
                    unit: (*u).to_owned(),
                    port: (*p).to_owned(),
                })
                .collect(),
        };
        machine.sockets = vec![
            socket(
                "alu_i1",
                SocketDirection::Input,
                &["b0", "b1"],
                &[("alu", "in1t")],
            ),
            socket("alu_o1", SocketDirection::Output, &["b0"], &[("alu", "out1")]),
            socket("rf1_rd", SocketDirection::Output, &["b0"], &[("rf1", "rd")]),
            socket("rf1_wr", SocketDirection::Input, &["b1"], &[("rf1", "wr")]),
            socket("gcu_pc", SocketDirection::Input, &["b1"], &[("gcu", "pc")]),
            socket("gcu_ra", SocketDirection::Input, &["b1"], &[("gcu", "ra")]),
        ];
        machine
    }

    fn alu_code_table() -> SocketCodeTable {
        let mut table = SocketCodeTable::new();
        table
            .add_port_code(PortCode::Fu {
                unit: "alu".to_owned(),
                port: "in1t".to_owned(),
                operation: Some("add".to_owned()),
                encoding: 0,
            })
            .unwrap();
        table
            .add_port_code(PortCode::Fu {
                unit: "alu".to_owned(),
                port: "in1t".to_owned(),
                operation: Some("sub".to_owned()),
                encoding: 1,
            })
            .unwrap();
        table
    }

    fn fixture_encoding() -> BinaryEncoding {
        // b0 source field: alu_o1 (code 0), rf1_rd (code 1), simm (code 2).
        let mut src0 = SlotField::new(SlotFieldKind::Source, IdPosition::Right);
        let mut out_table = SocketCodeTable::new();
        out_table
            .add_port_code(PortCode::Fu {
                unit: "alu".to_owned(),
                port: "out1".to_owned(),
                operation: None,
                encoding: 0,
            })
            .unwrap();
        src0.add_socket_encoding(SocketEncoding {
            socket: "alu_o1".to_owned(),
            encoding: 0,
            codes: Some(out_table),
        })
        .unwrap();
        let mut rd_table = SocketCodeTable::new();
        rd_table
            .add_port_code(PortCode::Rf {
                unit: "rf1".to_owned(),
                encoding: 0,
                index_width: 2,
            })
            .unwrap();
        src0.add_socket_encoding(SocketEncoding {
            socket: "rf1_rd".to_owned(),
            encoding: 1,
            codes: Some(rd_table),
        })
        .unwrap();
        src0.set_immediate_encoding(ImmediateEncoding {
            encoding: 2,
            width: 8,
        })
        .unwrap();

        // b0 destination field: alu_i1 only, opcode codes equal to the
        // declaration-order opcodes.
        let mut dst0 = SlotField::new(SlotFieldKind::Destination, IdPosition::Right);
        dst0.add_socket_encoding(SocketEncoding {
            socket: "alu_i1".to_owned(),
            encoding: 0,
            codes: Some(alu_code_table()),
        })
        .unwrap();

        // b1 destination field: alu_i1, rf1_wr, gcu_pc, gcu_ra.
        let mut dst1 = SlotField::new(SlotFieldKind::Destination, IdPosition::Right);
        dst1.add_socket_encoding(SocketEncoding {
            socket: "alu_i1".to_owned(),
            encoding: 0,
            codes: Some(alu_code_table()),
        })
        .unwrap();
        let mut wr_table = SocketCodeTable::new();
        wr_table
            .add_port_code(PortCode::Rf {
                unit: "rf1".to_owned(),
                encoding: 0,
                index_width: 2,
            })
            .unwrap();
        dst1.add_socket_encoding(SocketEncoding {
            socket: "rf1_wr".to_owned(),
            encoding: 1,
            codes: Some(wr_table),
        })
        .unwrap();
        let mut pc_table = SocketCodeTable::new();
        pc_table
            .add_port_code(PortCode::Fu {
                unit: "gcu".to_owned(),
                port: "pc".to_owned(),
                operation: Some("jump".to_owned()),
                encoding: 0,
            })
            .unwrap();
        pc_table
            .add_port_code(PortCode::Fu {
                unit: "gcu".to_owned(),
                port: "pc".to_owned(),
                operation: Some("call".to_owned()),
                encoding: 1,
            })
            .unwrap();
        dst1.add_socket_encoding(SocketEncoding {
            socket: "gcu_pc".to_owned(),
            encoding: 2,
            codes: Some(pc_table),
        })
        .unwrap();
        dst1.add_socket_encoding(SocketEncoding {
            socket: "gcu_ra".to_owned(),
            encoding: 3,
            codes: None,
        })
        .unwrap();

        let mut slot0 = MoveSlot::new("b0".to_owned(), 16);
        slot0.set_destination_field(0, dst0).unwrap();
        slot0.set_source_field(1, src0).unwrap();
        let mut slot1 = MoveSlot::new("b1".to_owned(), 8);
        slot1.set_destination_field(0, dst1).unwrap();

        let mut bem = BinaryEncoding::new();
        bem.add_move_slot(slot0).unwrap();
        bem.add_move_slot(slot1).unwrap();
        bem
    }

    fn render_sources(lang: HdlLanguage) -> String {
        let mut w = HdlWriter::new(lang);
        emit_source_rules(&mut w, &fixture_machine(), &fixture_encoding()).unwrap();
        w.finish()
    }

    fn render_destinations(options: &DecoderOptions) -> String {
        let mut w = HdlWriter::new(options.language);
        emit_destination_rules(&mut w, &fixture_machine(), &fixture_encoding(), options).unwrap();
        w.finish()
    }

    #[test]
    fn output_socket_bus_control_toggles_on_source_match() {
        let text = render_sources(HdlLanguage::Vhdl);
        assert!(text.contains(
            "if squash_b0 = '0' and conv_integer(unsigned(src_b0(1 downto 0))) = 0 then"
        ));
        assert!(text.contains("socket_alu_o1_bus_cntrl_reg <= '1';"));
        assert!(text.contains("socket_alu_o1_bus_cntrl_reg <= '0';"));
    }

    #[test]
    fn short_immediate_sign_extends_to_the_bus_width() {
        let text = render_sources(HdlLanguage::Vhdl);
        assert!(text.contains(
            "if squash_b0 = '0' and conv_integer(unsigned(src_b0(1 downto 0))) = 2 then"
        ));
        assert!(text.contains("simm_cntrl_b0_reg <= '1';"));
        assert!(text.contains("simm_b0_reg <= sxt(src_b0(9 downto 2), 32);"));
    }

    #[test]
    fn register_read_decodes_the_index_sub_range() {
        let text = render_sources(HdlLanguage::Vhdl);
        assert!(text.contains("rf_rf1_rd_load_reg <= '1';"));
        assert!(text.contains("rf_rf1_rd_opc_reg <= src_b0(9 downto 8);"));
        assert!(text.contains("rf_rf1_rd_load_reg <= '0';"));
    }

    #[test]
    fn fu_trigger_chains_buses_and_slices_the_opcode() {
        let text = render_destinations(&DecoderOptions::default());
        // Both port-code values equal the natural opcodes, so the opcode
        // comes straight from the field on both buses.
        assert!(text.contains("fu_alu_opc_reg <= dst_b0(0 downto 0);"));
        assert!(text.contains("fu_alu_opc_reg <= dst_b1(2 downto 2);"));
        // The b1 branch also resolves the two-bit socket identifier.
        assert!(text.contains("conv_integer(unsigned(dst_b1(1 downto 0))) = 0"));
        // Chain falls through to a load deassert.
        assert!(text.contains("fu_alu_in1t_load_reg <= '0';"));
        // The two-segment input socket records which bus it listens to.
        assert!(text.contains("socket_alu_i1_bus_cntrl_reg <= conv_std_logic_vector(0, 1);"));
        assert!(text.contains("socket_alu_i1_bus_cntrl_reg <= conv_std_logic_vector(1, 1);"));
    }

    #[test]
    fn control_unit_trigger_drives_pc_load_and_opcode() {
        let text = render_destinations(&DecoderOptions::default());
        assert!(text.contains("pc_load_reg <= '1';"));
        assert!(text.contains("pc_opcode_reg <= dst_b1(2 downto 2);"));
        assert!(text.contains("pc_load_reg <= '0';"));
        assert!(text.contains("ra_load_reg <= '1';"));
        assert!(text.contains("ra_load_reg <= '0';"));
    }

    #[test]
    fn register_write_slices_the_index_from_the_destination_field() {
        let text = render_destinations(&DecoderOptions::default());
        assert!(text.contains("conv_integer(unsigned(dst_b1(1 downto 0))) = 1"));
        assert!(text.contains("rf_rf1_wr_load_reg <= '1';"));
        assert!(text.contains("rf_rf1_wr_opc_reg <= dst_b1(3 downto 2);"));
    }

    #[test]
    fn bus_enables_follow_the_squash_complement() {
        let options = DecoderOptions {
            bus_enable_registers: true,
            ..DecoderOptions::default()
        };
        let text = render_destinations(&options);
        assert!(text.contains("b0_src_ena_reg <= not squash_b0;"));
        assert!(text.contains("b1_src_ena_reg <= not squash_b1;"));
    }

    #[test]
    fn branch_order_is_identical_across_backends() {
        let vhdl = render_destinations(&DecoderOptions::default());
        let verilog = render_destinations(&DecoderOptions::for_language(HdlLanguage::Verilog));
        let vhdl_order: Vec<usize> = ["dst_b0(0 downto 0)", "dst_b1(2 downto 2)"]
            .iter()
            .map(|n| vhdl.find(n).unwrap())
            .collect();
        let verilog_order: Vec<usize> = ["dst_b0[0 : 0]", "dst_b1[2 : 2]"]
            .iter()
            .map(|n| verilog.find(n).unwrap())
            .collect();
        assert!(vhdl_order[0] < vhdl_order[1]);
        assert!(verilog_order[0] < verilog_order[1]);
    }
}
