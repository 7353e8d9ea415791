//! Synchronous long-immediate write process.
//!
//! Selects the active instruction template from the template-selector
//! field and forwards each claimed slot's bits into the targeted
//! immediate units, most significant slot first. A locked pipeline must
//! not update immediate-unit state, so the whole body is gated on the
//! pre-decode merged lock.

use encoding_map::BinaryEncoding;
use machine_model::{ImmediateUnit, InstructionTemplate, Machine};

use crate::error::GeneratorError;
use crate::hdl::{Condition, HdlWriter, Rhs, Slice};
use crate::names;
use crate::options::DecoderOptions;
use crate::wiring::register_index_width;

/// Tells whether any instruction template carries a long immediate.
#[must_use]
pub fn uses_long_immediates(machine: &Machine) -> bool {
    machine.templates.iter().any(|t| !t.is_empty())
}

fn slot_slice(
    encoding: &BinaryEncoding,
    slot: &str,
    width: u32,
) -> Result<Slice, GeneratorError> {
    let position = encoding
        .move_slot_position(slot)
        .or_else(|| encoding.immediate_slot_position(slot))
        .ok_or_else(|| GeneratorError::MissingField(format!("instruction slot {slot}")))?;
    Ok(Slice::new(
        names::INSTRUCTION_PORT.to_owned(),
        position + width - 1,
        position,
    ))
}

fn emit_unit_write(
    w: &mut HdlWriter,
    encoding: &BinaryEncoding,
    template: &InstructionTemplate,
    iu: &ImmediateUnit,
) -> Result<(), GeneratorError> {
    let write_reg = names::iu_write_signal(&iu.name);
    let supported = template.supported_width(&iu.name);
    let mut remaining = supported;
    for (i, slot) in template.slots_of_destination(&iu.name).enumerate() {
        let source = slot_slice(encoding, &slot.slot, slot.width)?;
        if i == 0 {
            // The first declared slot carries the most significant bits
            // and absorbs the extension up to the register width.
            let target = Slice::new(write_reg.clone(), iu.width - 1, supported - slot.width);
            let rhs = if iu.sign_extends() {
                Rhs::SignExtend {
                    slice: source,
                    width: target.width(),
                }
            } else {
                Rhs::ZeroExtend {
                    slice: source,
                    width: target.width(),
                }
            };
            w.assign(&target.render(w.language()), &rhs);
        } else {
            let target = Slice::new(write_reg.clone(), remaining - 1, remaining - slot.width);
            w.assign(&target.render(w.language()), &Rhs::Slice(source));
        }
        remaining -= slot.width;
    }
    w.assign(&names::iu_write_load_signal(&iu.name), &Rhs::Bit(true));
    if iu.registers > 1 {
        let field = encoding
            .dst_register_field(&template.name, &iu.name)
            .ok_or_else(|| {
                GeneratorError::MissingField(format!(
                    "destination register field of template {} for unit {}",
                    template.name, iu.name
                ))
            })?;
        let position = encoding
            .dst_register_field_position(&template.name, &iu.name)
            .ok_or_else(|| {
                GeneratorError::MissingField(format!(
                    "destination register field of template {} for unit {}",
                    template.name, iu.name
                ))
            })?;
        let source = Slice::new(
            names::INSTRUCTION_PORT.to_owned(),
            position + field.width - 1,
            position,
        );
        w.assign(&names::iu_write_opcode_signal(&iu.name), &Rhs::Slice(source));
    }
    Ok(())
}

fn emit_template_actions(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
    template: &InstructionTemplate,
) -> Result<(), GeneratorError> {
    for iu in &machine.immediate_units {
        if template.is_one_of_destinations(&iu.name) {
            emit_unit_write(w, encoding, template, iu)?;
        } else {
            w.assign(&names::iu_write_load_signal(&iu.name), &Rhs::Bit(false));
            if template.is_empty() {
                w.assign(&names::iu_write_signal(&iu.name), &Rhs::Zeros);
            }
        }
    }
    Ok(())
}

/// Emits the reset assignments of the immediate-unit write registers.
pub fn emit_limm_reset(w: &mut HdlWriter, machine: &Machine) {
    for iu in &machine.immediate_units {
        w.assign(&names::iu_write_load_signal(&iu.name), &Rhs::Bit(false));
        w.assign(&names::iu_write_signal(&iu.name), &Rhs::Zeros);
        if register_index_width(iu.registers) > 0 {
            w.assign(&names::iu_write_opcode_signal(&iu.name), &Rhs::Zeros);
        }
    }
}

/// Emits the long-immediate write process. A machine with no
/// immediate-carrying template produces no output at all.
///
/// # Errors
///
/// Fails when a template lacks a selector encoding, a claimed slot has no
/// bit position, or a multi-register unit has no destination-register
/// field.
pub fn emit_limm_write_process(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
    options: &DecoderOptions,
) -> Result<(), GeneratorError> {
    if !uses_long_immediates(machine) {
        return Ok(());
    }
    let control = encoding
        .immediate_control_field()
        .ok_or_else(|| GeneratorError::MissingField("immediate control field".to_owned()))?;

    w.reset_process_start("limm_write", options.async_reset);
    emit_limm_reset(w, machine);
    w.reset_process_else(options.async_reset);

    let gate = Condition::BitEq {
        signal: names::PRE_DECODE_GLOCK_SIGNAL.to_owned(),
        value: false,
    };
    w.if_start(&gate);
    if machine.templates.len() == 1 {
        if let Some(template) = machine.templates.first() {
            emit_template_actions(w, machine, encoding, template)?;
        }
    } else {
        for (i, template) in machine.templates.iter().enumerate() {
            if i + 1 == machine.templates.len() {
                w.else_start();
            } else {
                let code = control.template_encoding(&template.name).ok_or_else(|| {
                    GeneratorError::MissingEncoding(format!(
                        "instruction template {}",
                        template.name
                    ))
                })?;
                let cond = Condition::SignalEq {
                    signal: names::LIMM_TAG_SIGNAL.to_owned(),
                    value: code,
                };
                if i == 0 {
                    w.if_start(&cond);
                } else {
                    w.else_if(&cond);
                }
            }
            emit_template_actions(w, machine, encoding, template)?;
        }
        w.if_end();
    }
    w.if_end();
    w.reset_process_end("limm_write", options.async_reset);
    w.blank();
    Ok(())
}

#[cfg(test)]
mod tests {
    use encoding_map::{
        BinaryEncoding, ImmediateControlField, ImmediateSlotField, LimmDstRegisterField, MoveSlot,
    };
    use machine_model::{
        Bus, ControlUnit, ExtensionMode, ImmediateUnit, InstructionTemplate, Machine,
        TemplateSlot, UnitPort, UnitPortDirection,
    };

    use crate::hdl::{HdlLanguage, HdlWriter};
    use crate::options::DecoderOptions;

    use super::emit_limm_write_process;

    fn machine_with_limm(iu_registers: u32, extension: ExtensionMode) -> Machine {
        let gcu = ControlUnit {
            name: "gcu".to_owned(),
            ports: Vec::new(),
            operations: vec!["jump".to_owned(), "call".to_owned()],
            delay_slots: 3,
            global_guard_latency: 1,
            return_address_port: None,
        };
        let mut machine = Machine::new(gcu);
        machine
            .buses
            .push(Bus::new("b0".to_owned(), 32, 0, ExtensionMode::Zero));
        machine.immediate_units.push(ImmediateUnit {
            name: "imm".to_owned(),
            registers: iu_registers,
            width: 32,
            extension,
            latency: 1,
            ports: vec![UnitPort {
                name: "rd".to_owned(),
                direction: UnitPortDirection::Read,
            }],
            uses_global_lock: true,
        });
        machine.templates.push(InstructionTemplate {
            name: "default".to_owned(),
            slots: Vec::new(),
        });
        machine.templates.push(InstructionTemplate {
            name: "limm".to_owned(),
            slots: vec![
                TemplateSlot {
                    slot: "b0".to_owned(),
                    width: 16,
                    destination: "imm".to_owned(),
                },
                TemplateSlot {
                    slot: "limm0".to_owned(),
                    width: 8,
                    destination: "imm".to_owned(),
                },
            ],
        });
        machine
    }

    fn encoding_with_limm(dst_field: bool) -> BinaryEncoding {
        let mut bem = BinaryEncoding::new();
        let mut control = ImmediateControlField::new();
        control
            .add_template_encoding("default".to_owned(), 0)
            .unwrap();
        control.add_template_encoding("limm".to_owned(), 1).unwrap();
        bem.set_immediate_control_field(control).unwrap();
        if dst_field {
            bem.add_dst_register_field(LimmDstRegisterField {
                template: "limm".to_owned(),
                unit: "imm".to_owned(),
                width: 1,
            })
            .unwrap();
        }
        bem.add_immediate_slot(ImmediateSlotField {
            name: "limm0".to_owned(),
            width: 8,
        })
        .unwrap();
        bem.add_move_slot(MoveSlot::new("b0".to_owned(), 16)).unwrap();
        bem
    }

    fn render(machine: &Machine, bem: &BinaryEncoding, options: &DecoderOptions) -> String {
        let mut w = HdlWriter::new(options.language);
        emit_limm_write_process(&mut w, machine, bem, options).unwrap();
        w.finish()
    }

    #[test]
    fn no_immediate_template_emits_nothing() {
        let mut machine = machine_with_limm(1, ExtensionMode::Zero);
        machine.templates = vec![InstructionTemplate {
            name: "default".to_owned(),
            slots: Vec::new(),
        }];
        let text = render(&machine, &encoding_with_limm(false), &DecoderOptions::default());
        assert!(text.is_empty());
    }

    #[test]
    fn empty_template_zeroes_write_data_and_load() {
        let machine = machine_with_limm(1, ExtensionMode::Zero);
        let bem = encoding_with_limm(false);
        let text = render(&machine, &bem, &DecoderOptions::default());
        let branch = text.find("conv_integer(unsigned(limm_tag)) = 0").unwrap();
        let tail = &text[branch..];
        assert!(tail.contains("iu_imm_write_load_reg <= '0';"));
        assert!(tail.contains("iu_imm_write_reg <= (others => '0');"));
    }

    #[test]
    fn slots_concatenate_most_significant_first() {
        let machine = machine_with_limm(1, ExtensionMode::Zero);
        let bem = encoding_with_limm(false);
        let text = render(&machine, &bem, &DecoderOptions::default());
        // The selector sits at bit 0, limm0 at bits 8..1, the b0 move
        // slot at bits 24..9. The move-slot chunk lands in the high
        // target bits, extended from 16 to 24, and the dedicated slot
        // fills the low byte.
        assert!(text.contains(
            "iu_imm_write_reg(31 downto 8) <= ext(instructionword(24 downto 9), 24);"
        ));
        assert!(text.contains(
            "iu_imm_write_reg(7 downto 0) <= instructionword(8 downto 1);"
        ));
        assert!(text.contains("iu_imm_write_load_reg <= '1';"));
    }

    #[test]
    fn sign_extending_unit_uses_sxt() {
        let machine = machine_with_limm(1, ExtensionMode::Sign);
        let bem = encoding_with_limm(false);
        let text = render(&machine, &bem, &DecoderOptions::default());
        assert!(text.contains("sxt(instructionword(24 downto 9), 24)"));
    }

    #[test]
    fn multi_register_unit_decodes_the_destination_index() {
        let machine = machine_with_limm(2, ExtensionMode::Zero);
        let bem = encoding_with_limm(true);
        let text = render(&machine, &bem, &DecoderOptions::default());
        // The destination-register field sits at instruction bit 1, after
        // the one-bit selector.
        assert!(text.contains("iu_imm_write_opc_reg <= instructionword(1 downto 1);"));
    }

    #[test]
    fn body_is_gated_on_the_pre_decode_lock() {
        let machine = machine_with_limm(1, ExtensionMode::Zero);
        let bem = encoding_with_limm(false);
        let vhdl = render(&machine, &bem, &DecoderOptions::default());
        assert!(vhdl.contains("if pre_decode_merged_glock = '0' then"));
        let verilog = render(
            &machine,
            &bem,
            &DecoderOptions::for_language(HdlLanguage::Verilog),
        );
        assert!(verilog.contains("if (pre_decode_merged_glock == 1'b0)"));
        assert!(verilog.contains("always@(posedge clk or negedge rstx)"));
    }
}
