//! Decoder generation entry points.
//!
//! Generation runs in two phases: the wiring phase fixes the decoder's
//! port inventory and connections, then the synthesis phase emits the
//! decoder body through the shared emission passes. Both phases walk
//! every collection in declaration order, so re-running on identical
//! inputs produces byte-identical output.

use std::path::{Path, PathBuf};

use encoding_map::BinaryEncoding;
use log::{debug, info};
use machine_model::Machine;

use crate::error::GeneratorError;
use crate::hdl::{Condition, HdlLanguage, HdlWriter, Rhs, SignalDecl};
use crate::limm::{emit_limm_write_process, uses_long_immediates};
use crate::lock::{emit_lock_merge, emit_lock_registers, emit_lock_trace, lock_declarations};
use crate::names;
use crate::netlist::{Port, PortDirection};
use crate::options::DecoderOptions;
use crate::rules::{emit_destination_rules, emit_source_rules};
use crate::squash::{emit_squash_signals, squash_declaration};
use crate::wiring::{wire_decoder, WiringMap};

/// One generated decoder: the emitted text plus the wiring side effects.
#[derive(Debug)]
pub struct GeneratedDecoder {
    /// Ports and connections added during the wiring phase.
    pub wiring: WiringMap,
    /// The complete decoder description.
    pub text: String,
    /// Deterministic file name for the output.
    pub file_name: String,
}

/// Pre-flight check rejecting machines outside the supported subset.
///
/// # Errors
///
/// Returns [`GeneratorError::Incompatible`] with a user-facing message
/// naming the offending property.
pub fn verify_compatibility(machine: &Machine) -> Result<(), GeneratorError> {
    let gcu = &machine.control_unit;
    if gcu.delay_slots != 3 {
        return Err(GeneratorError::Incompatible(format!(
            "control unit {} has {} delay slots, only 3 are supported",
            gcu.name, gcu.delay_slots
        )));
    }
    if gcu.global_guard_latency > 1 {
        return Err(GeneratorError::Incompatible(format!(
            "control unit {} has global guard latency {}, only 0 and 1 are supported",
            gcu.name, gcu.global_guard_latency
        )));
    }
    for operation in &gcu.operations {
        if operation != "jump" && operation != "call" {
            return Err(GeneratorError::Incompatible(format!(
                "control unit {} implements operation {operation}, only jump and call are supported",
                gcu.name
            )));
        }
    }
    Ok(())
}

/// Internal signals split by the process that resets them.
struct Declarations {
    all: Vec<SignalDecl>,
    decode_reset: Vec<SignalDecl>,
}

fn iu_write_reg_names(machine: &Machine) -> Vec<String> {
    let mut regs = Vec::new();
    for iu in &machine.immediate_units {
        regs.push(names::iu_write_signal(&iu.name));
        regs.push(names::iu_write_load_signal(&iu.name));
        regs.push(names::iu_write_opcode_signal(&iu.name));
    }
    regs
}

fn is_iu_write_port(machine: &Machine, port: &str) -> bool {
    machine.immediate_units.iter().any(|iu| {
        port == names::iu_write_port(&iu.name)
            || port == names::iu_write_load_port(&iu.name)
            || port == names::iu_write_opcode_port(&iu.name)
    })
}

fn is_reg_backed(machine: &Machine, port: &Port) -> bool {
    if port.direction != PortDirection::Out {
        return false;
    }
    if matches!(
        port.name.as_str(),
        names::LOCK_OUT_PORT | names::LOCK_STATUS_PORT | names::GLOCK_PORT
    ) {
        return false;
    }
    // Without long immediates there is no process to drive the
    // immediate-unit write registers; the ports are tied low instead.
    !(is_iu_write_port(machine, &port.name) && !uses_long_immediates(machine))
}

fn collect_declarations(
    machine: &Machine,
    encoding: &BinaryEncoding,
    wiring: &WiringMap,
) -> Result<Declarations, GeneratorError> {
    let mut all = Vec::new();

    let selector_width = encoding
        .immediate_control_field()
        .map_or(0, encoding_map::ImmediateControlField::width);
    if selector_width > 0 {
        all.push(SignalDecl::vector_wire(
            names::LIMM_TAG_SIGNAL.to_owned(),
            selector_width,
        ));
    }
    for slot in encoding.move_slots() {
        if slot.width == 0 {
            continue;
        }
        all.push(SignalDecl::vector_wire(
            names::move_field_signal(&slot.bus),
            slot.width,
        ));
        if let Some(field) = slot.source_field() {
            if field.width() > 0 {
                all.push(SignalDecl::vector_wire(
                    names::src_field_signal(&slot.bus),
                    field.width(),
                ));
            }
        }
        if let Some(field) = slot.destination_field() {
            if field.width() > 0 {
                all.push(SignalDecl::vector_wire(
                    names::dst_field_signal(&slot.bus),
                    field.width(),
                ));
            }
        }
        if let Some(field) = slot.guard_field() {
            if field.width() > 0 {
                all.push(SignalDecl::vector_wire(
                    names::guard_field_signal(&slot.bus),
                    field.width(),
                ));
            }
        }
    }

    for bus in &machine.buses {
        all.push(squash_declaration(machine, encoding, bus)?);
    }

    for port in wiring.netlist.decoder.ports() {
        if !is_reg_backed(machine, port) {
            continue;
        }
        let name = format!("{}_reg", port.name);
        all.push(if port.width > 1 {
            SignalDecl::vector_reg(name, port.width)
        } else {
            SignalDecl::bit_reg(name)
        });
    }

    all.extend(lock_declarations());

    let limm_owned = if uses_long_immediates(machine) {
        iu_write_reg_names(machine)
    } else {
        Vec::new()
    };
    let decode_reset = all
        .iter()
        .filter(|d| d.reset && !limm_owned.contains(&d.name))
        .cloned()
        .collect();
    Ok(Declarations { all, decode_reset })
}

fn port_declaration(port: &Port, language: HdlLanguage) -> String {
    match language {
        HdlLanguage::Vhdl => {
            let direction = match port.direction {
                PortDirection::In => "in",
                PortDirection::Out => "out",
            };
            if port.width > 1 {
                format!(
                    "{} : {direction} std_logic_vector({} downto 0)",
                    port.name,
                    port.width - 1
                )
            } else {
                format!("{} : {direction} std_logic", port.name)
            }
        }
        HdlLanguage::Verilog => {
            let direction = match port.direction {
                PortDirection::In => "input",
                PortDirection::Out => "output",
            };
            if port.width > 1 {
                format!("{direction}[{} : 0] {};", port.width - 1, port.name)
            } else {
                format!("{direction} {};", port.name)
            }
        }
    }
}

fn emit_header(
    w: &mut HdlWriter,
    wiring: &WiringMap,
    declarations: &Declarations,
    options: &DecoderOptions,
) {
    let entity = options.decoder_entity();
    let ports = wiring.netlist.decoder.ports();
    match w.language() {
        HdlLanguage::Vhdl => {
            w.line("library IEEE;");
            w.line("use IEEE.std_logic_1164.all;");
            w.line("use IEEE.std_logic_arith.all;");
            if options.lock_trace {
                w.line("use std.textio.all;");
            }
            w.blank();
            let open = format!("entity {entity} is");
            w.line(&open);
            w.blank();
            w.indent();
            w.line("port (");
            w.indent();
            for (i, port) in ports.iter().enumerate() {
                let decl = port_declaration(port, HdlLanguage::Vhdl);
                if i + 1 == ports.len() {
                    let last = format!("{decl});");
                    w.line(&last);
                } else {
                    let line = format!("{decl};");
                    w.line(&line);
                }
            }
            w.dedent();
            w.dedent();
            w.blank();
            let close = format!("end {entity};");
            w.line(&close);
            w.blank();
            let arch = format!("architecture rtl of {entity} is");
            w.line(&arch);
            w.blank();
            w.indent();
            for decl in &declarations.all {
                w.signal(decl);
            }
            w.dedent();
            w.blank();
            w.line("begin");
            w.blank();
            w.indent();
        }
        HdlLanguage::Verilog => {
            let open = format!("module {entity} (");
            w.line(&open);
            w.indent();
            for (i, port) in ports.iter().enumerate() {
                if i + 1 == ports.len() {
                    let last = format!("{});", port.name);
                    w.line(&last);
                } else {
                    let line = format!("{},", port.name);
                    w.line(&line);
                }
            }
            w.blank();
            for port in ports {
                let decl = port_declaration(port, HdlLanguage::Verilog);
                w.line(&decl);
            }
            w.blank();
            for decl in &declarations.all {
                w.signal(decl);
            }
            w.blank();
        }
    }
}

fn emit_footer(w: &mut HdlWriter) {
    w.dedent();
    match w.language() {
        HdlLanguage::Vhdl => w.line("end rtl;"),
        HdlLanguage::Verilog => w.line("endmodule"),
    }
}

fn emit_dismembering(w: &mut HdlWriter, encoding: &BinaryEncoding) {
    let selector_width = encoding
        .immediate_control_field()
        .map_or(0, encoding_map::ImmediateControlField::width);
    if selector_width > 0 {
        if let Some(position) = encoding.immediate_control_field_position() {
            w.cont_assign(
                names::LIMM_TAG_SIGNAL,
                &Rhs::Slice(crate::hdl::Slice::new(
                    names::INSTRUCTION_PORT.to_owned(),
                    position + selector_width - 1,
                    position,
                )),
            );
        }
    }
    for slot in encoding.move_slots() {
        if slot.width == 0 {
            continue;
        }
        let Some(position) = encoding.move_slot_position(&slot.bus) else {
            continue;
        };
        let move_signal = names::move_field_signal(&slot.bus);
        w.cont_assign(
            &move_signal,
            &Rhs::Slice(crate::hdl::Slice::new(
                names::INSTRUCTION_PORT.to_owned(),
                position + slot.width - 1,
                position,
            )),
        );
        let mut sub = |signal: String, lsb: Option<u32>, width: u32| {
            if let Some(lsb) = lsb {
                if width > 0 {
                    w.cont_assign(
                        &signal,
                        &Rhs::Slice(crate::hdl::Slice::new(
                            move_signal.clone(),
                            lsb + width - 1,
                            lsb,
                        )),
                    );
                }
            }
        };
        sub(
            names::src_field_signal(&slot.bus),
            slot.source_field_position(),
            slot.source_field().map_or(0, encoding_map::SlotField::width),
        );
        sub(
            names::dst_field_signal(&slot.bus),
            slot.destination_field_position(),
            slot.destination_field()
                .map_or(0, encoding_map::SlotField::width),
        );
        sub(
            names::guard_field_signal(&slot.bus),
            slot.guard_field_position(),
            slot.guard_field().map_or(0, encoding_map::GuardField::width),
        );
    }
    w.blank();
}

fn emit_reset_assigns(w: &mut HdlWriter, declarations: &[SignalDecl]) {
    for decl in declarations {
        let rhs = if decl.width.is_some() {
            Rhs::Zeros
        } else {
            Rhs::Bit(false)
        };
        w.assign(&decl.name, &rhs);
    }
}

fn emit_decode_process(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
    declarations: &Declarations,
    options: &DecoderOptions,
) -> Result<(), GeneratorError> {
    w.reset_process_start("decode", options.async_reset);
    emit_reset_assigns(w, &declarations.decode_reset);
    w.reset_process_else(options.async_reset);
    if options.debug_soft_reset {
        let soft = Condition::BitEq {
            signal: names::DEBUG_RESET_PORT.to_owned(),
            value: false,
        };
        w.if_start(&soft);
        emit_reset_assigns(w, &declarations.decode_reset);
        w.else_start();
    }
    let unlocked = Condition::BitEq {
        signal: names::PRE_DECODE_GLOCK_SIGNAL.to_owned(),
        value: false,
    };
    w.if_start(&unlocked);
    emit_source_rules(w, machine, encoding)?;
    emit_destination_rules(w, machine, encoding, options)?;
    w.if_end();
    if options.debug_soft_reset {
        w.if_end();
    }
    w.reset_process_end("decode", options.async_reset);
    w.blank();
    Ok(())
}

fn emit_port_mappings(w: &mut HdlWriter, machine: &Machine, wiring: &WiringMap) {
    for port in wiring.netlist.decoder.ports() {
        if port.direction != PortDirection::Out {
            continue;
        }
        if matches!(
            port.name.as_str(),
            names::LOCK_OUT_PORT | names::LOCK_STATUS_PORT | names::GLOCK_PORT
        ) {
            continue;
        }
        if is_reg_backed(machine, port) {
            let reg = format!("{}_reg", port.name);
            w.cont_assign(&port.name, &Rhs::Signal(reg));
        } else {
            let rhs = if port.width > 1 { Rhs::Zeros } else { Rhs::Bit(false) };
            w.cont_assign(&port.name, &rhs);
        }
    }
    w.blank();
}

/// Generates the decoder text without touching the filesystem.
///
/// # Errors
///
/// Fails on an incompatible machine or an inconsistency between the
/// machine and its encoding map.
pub fn write_decoder(
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
) -> Result<GeneratedDecoder, GeneratorError> {
    verify_compatibility(machine)?;
    let wiring = wire_decoder(machine, encoding, options)?;
    debug!(
        "wired {} decoder ports, {} connections",
        wiring.netlist.decoder.ports().len(),
        wiring.netlist.connections.len()
    );

    let declarations = collect_declarations(machine, encoding, &wiring)?;
    let mut w = HdlWriter::new(options.language);
    emit_header(&mut w, &wiring, &declarations, options);
    emit_dismembering(&mut w, encoding);
    emit_squash_signals(&mut w, machine, encoding)?;
    emit_decode_process(&mut w, machine, encoding, &declarations, options)?;
    emit_limm_write_process(&mut w, machine, encoding, options)?;
    emit_port_mappings(&mut w, machine, &wiring);
    emit_lock_merge(&mut w, &wiring, options);
    emit_lock_registers(&mut w, options);
    emit_lock_trace(&mut w, options);
    emit_footer(&mut w);

    let extension = match options.language {
        HdlLanguage::Vhdl => "vhdl",
        HdlLanguage::Verilog => "v",
    };
    let file_name = format!("{}.{extension}", options.decoder_entity());
    Ok(GeneratedDecoder {
        wiring,
        text: w.finish(),
        file_name,
    })
}

/// Generates the decoder and writes it into the destination directory.
/// Returns the path of the written file.
///
/// # Errors
///
/// Fails like [`write_decoder`], or with [`GeneratorError::Io`] when the
/// destination file cannot be created.
pub fn generate(
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
    destination: &Path,
) -> Result<PathBuf, GeneratorError> {
    let generated = write_decoder(machine, encoding, options)?;
    let path = destination.join(&generated.file_name);
    std::fs::write(&path, &generated.text).map_err(|source| GeneratorError::Io {
        path: path.clone(),
        source,
    })?;
    info!("wrote instruction decoder {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use machine_model::{ControlUnit, Machine};

    use crate::error::GeneratorError;

    use super::verify_compatibility;

    fn gcu(delay_slots: u32, latency: u32, operations: &[&str]) -> ControlUnit {
        ControlUnit {
            name: "gcu".to_owned(),
            ports: Vec::new(),
            operations: operations.iter().map(|s| (*s).to_owned()).collect(),
            delay_slots,
            global_guard_latency: latency,
            return_address_port: None,
        }
    }

    #[test]
    fn supported_control_unit_passes_the_pre_flight_check() {
        let machine = Machine::new(gcu(3, 1, &["jump", "call"]));
        assert!(verify_compatibility(&machine).is_ok());
    }

    #[test]
    fn wrong_delay_slot_count_is_incompatible() {
        let machine = Machine::new(gcu(2, 1, &["jump"]));
        let err = verify_compatibility(&machine).unwrap_err();
        assert!(matches!(err, GeneratorError::Incompatible(msg) if msg.contains("delay slots")));
    }

    #[test]
    fn unsupported_guard_latency_is_incompatible() {
        let machine = Machine::new(gcu(3, 2, &["jump"]));
        let err = verify_compatibility(&machine).unwrap_err();
        assert!(matches!(err, GeneratorError::Incompatible(msg) if msg.contains("guard latency")));
    }

    #[test]
    fn unsupported_control_operation_is_incompatible() {
        let machine = Machine::new(gcu(3, 0, &["jump", "loop"]));
        let err = verify_compatibility(&machine).unwrap_err();
        assert!(matches!(err, GeneratorError::Incompatible(msg) if msg.contains("loop")));
    }
}
