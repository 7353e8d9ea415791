//! Per-bus squash-signal synthesis.
//!
//! The squash signal cancels the transport scheduled on its bus. Template
//! claims take priority: when the template selector names a long-immediate
//! template claiming the slot, the move bits carry immediate data and the
//! transport is squashed no matter what the guard says. Otherwise the
//! guard-field value is decoded against the guard encodings; an
//! unrecognized code never cancels.

use encoding_map::{BinaryEncoding, GuardEncoding};
use machine_model::{Bus, Guard, Machine};

use crate::error::GeneratorError;
use crate::hdl::{Condition, HdlWriter, Rhs, SignalDecl, SignalKind};
use crate::names;

/// How the squash signal of one bus is driven.
enum SquashForm {
    /// Constant value, driven by a continuous assignment.
    Constant(bool),
    /// Computed by a combinational process.
    Process,
}

fn template_claims(
    machine: &Machine,
    encoding: &BinaryEncoding,
    bus: &Bus,
) -> Result<Vec<(String, u32)>, GeneratorError> {
    let claimants: Vec<&str> = machine
        .templates_using_slot(&bus.name)
        .map(|t| t.name.as_str())
        .collect();
    if claimants.is_empty() {
        return Ok(Vec::new());
    }
    let control = encoding
        .immediate_control_field()
        .ok_or_else(|| GeneratorError::MissingField("immediate control field".to_owned()))?;
    claimants
        .into_iter()
        .map(|name| {
            control
                .template_encoding(name)
                .map(|code| (name.to_owned(), code))
                .ok_or_else(|| GeneratorError::MissingEncoding(format!("instruction template {name}")))
        })
        .collect()
}

fn classify(
    machine: &Machine,
    encoding: &BinaryEncoding,
    bus: &Bus,
) -> Result<SquashForm, GeneratorError> {
    let claims = template_claims(machine, encoding, bus)?;
    let selector_width = encoding
        .immediate_control_field()
        .map_or(0, encoding_map::ImmediateControlField::width);
    if !claims.is_empty() && selector_width == 0 {
        // A zero-width selector means every instruction uses the claiming
        // template, so the move is always displaced by immediate bits.
        return Ok(SquashForm::Constant(true));
    }
    if !claims.is_empty() {
        return Ok(SquashForm::Process);
    }
    let Some(slot) = encoding.move_slot(&bus.name) else {
        return Ok(SquashForm::Constant(false));
    };
    match slot.guard_field() {
        None => Ok(SquashForm::Constant(false)),
        Some(field) if field.encodings().is_empty() => Ok(SquashForm::Constant(false)),
        Some(field) if field.width() == 0 => {
            // Exactly one encoding selected by zero bits.
            match field.encodings().first() {
                Some(GuardEncoding::Unconditional { value, .. }) => {
                    Ok(SquashForm::Constant(*value))
                }
                _ => Ok(SquashForm::Process),
            }
        }
        Some(_) => Ok(SquashForm::Process),
    }
}

/// Declaration of the squash signal of one bus.
///
/// # Errors
///
/// Fails if the bus is claimed by a template with no selector encoding.
pub fn squash_declaration(
    machine: &Machine,
    encoding: &BinaryEncoding,
    bus: &Bus,
) -> Result<SignalDecl, GeneratorError> {
    let kind = match classify(machine, encoding, bus)? {
        SquashForm::Constant(_) => SignalKind::Wire,
        SquashForm::Process => SignalKind::Reg,
    };
    Ok(SignalDecl {
        name: names::squash_signal(&bus.name),
        width: None,
        kind,
        reset: false,
    })
}

fn live_guard_rhs(bus: &Bus, guard_encoding: &GuardEncoding) -> Result<Rhs, GeneratorError> {
    match guard_encoding {
        GuardEncoding::Gpr {
            rf,
            index,
            inverted,
            ..
        } => {
            let guard = bus
                .guards
                .iter()
                .find(|g| {
                    matches!(g, Guard::Register { rf: r, index: i, inverted: v }
                        if r == rf && i == index && v == inverted)
                })
                .ok_or_else(|| {
                    GeneratorError::MissingEncoding(format!(
                        "register guard {rf}[{index}] on bus {}",
                        bus.name
                    ))
                })?;
            let port = names::guard_port(guard);
            Ok(if *inverted { Rhs::Signal(port) } else { Rhs::Not(port) })
        }
        GuardEncoding::Fu {
            fu,
            port,
            inverted,
            ..
        } => {
            let guard = bus
                .guards
                .iter()
                .find(|g| {
                    matches!(g, Guard::Port { fu: f, port: p, inverted: v }
                        if f == fu && p == port && v == inverted)
                })
                .ok_or_else(|| {
                    GeneratorError::MissingEncoding(format!(
                        "port guard {fu}.{port} on bus {}",
                        bus.name
                    ))
                })?;
            let port = names::guard_port(guard);
            Ok(if *inverted { Rhs::Signal(port) } else { Rhs::Not(port) })
        }
        GuardEncoding::Unconditional { value, .. } => Ok(Rhs::Bit(*value)),
    }
}

fn sensitivity_list(
    bus: &Bus,
    encoding: &BinaryEncoding,
    has_claims: bool,
) -> Vec<String> {
    let mut list = Vec::new();
    if let Some(field) = encoding.move_slot(&bus.name).and_then(|s| s.guard_field()) {
        for guard_encoding in field.encodings() {
            let port = match guard_encoding {
                GuardEncoding::Gpr { rf, index, .. } => {
                    names::guard_port(&Guard::Register {
                        rf: rf.clone(),
                        index: *index,
                        inverted: false,
                    })
                }
                GuardEncoding::Fu { fu, port, .. } => names::guard_port(&Guard::Port {
                    fu: fu.clone(),
                    port: port.clone(),
                    inverted: false,
                }),
                GuardEncoding::Unconditional { .. } => continue,
            };
            if !list.contains(&port) {
                list.push(port);
            }
        }
        if field.width() > 0 {
            list.push(names::guard_field_signal(&bus.name));
        }
    }
    if has_claims {
        list.push(names::LIMM_TAG_SIGNAL.to_owned());
    }
    list
}

fn emit_guard_evaluation(
    w: &mut HdlWriter,
    bus: &Bus,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    let squash = names::squash_signal(&bus.name);
    let field = encoding.move_slot(&bus.name).and_then(|s| s.guard_field());
    match field {
        None => w.assign(&squash, &Rhs::Bit(false)),
        Some(field) if field.width() == 0 => {
            let rhs = field.encodings().first().map_or(Ok(Rhs::Bit(false)), |e| {
                live_guard_rhs(bus, e)
            })?;
            w.assign(&squash, &rhs);
        }
        Some(field) => {
            w.case_start(&names::guard_field_signal(&bus.name));
            for guard_encoding in field.encodings() {
                let rhs = live_guard_rhs(bus, guard_encoding)?;
                w.case_arm(guard_encoding.code());
                w.assign(&squash, &rhs);
                w.case_arm_end();
            }
            w.case_default();
            w.assign(&squash, &Rhs::Bit(false));
            w.case_arm_end();
            w.case_end();
        }
    }
    Ok(())
}

/// Emits the squash signal of every bus, in machine declaration order.
///
/// # Errors
///
/// Fails when a guard encoding has no matching machine guard, or a
/// claiming template has no selector encoding.
pub fn emit_squash_signals(
    w: &mut HdlWriter,
    machine: &Machine,
    encoding: &BinaryEncoding,
) -> Result<(), GeneratorError> {
    for bus in &machine.buses {
        let squash = names::squash_signal(&bus.name);
        match classify(machine, encoding, bus)? {
            SquashForm::Constant(value) => {
                w.cont_assign(&squash, &Rhs::Bit(value));
                w.blank();
            }
            SquashForm::Process => {
                let claims = template_claims(machine, encoding, bus)?;
                let sensitivity = sensitivity_list(bus, encoding, !claims.is_empty());
                let process = format!("squash_gen_{}", bus.name);
                w.comb_process_start(&process, &sensitivity);
                let mut open_if = false;
                for (i, (_, code)) in claims.iter().enumerate() {
                    let cond = Condition::SignalEq {
                        signal: names::LIMM_TAG_SIGNAL.to_owned(),
                        value: *code,
                    };
                    if i == 0 {
                        w.if_start(&cond);
                        open_if = true;
                    } else {
                        w.else_if(&cond);
                    }
                    w.assign(&squash, &Rhs::Bit(true));
                }
                if open_if {
                    w.else_start();
                }
                emit_guard_evaluation(w, bus, encoding)?;
                if open_if {
                    w.if_end();
                }
                w.process_end(&process);
                w.blank();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use encoding_map::{
        BinaryEncoding, GuardEncoding, GuardField, ImmediateControlField, MoveSlot,
    };
    use machine_model::{
        Bus, ControlUnit, ExtensionMode, Guard, InstructionTemplate, Machine, TemplateSlot,
    };

    use crate::hdl::{HdlLanguage, HdlWriter};

    use super::emit_squash_signals;

    fn gcu() -> ControlUnit {
        ControlUnit {
            name: "gcu".to_owned(),
            ports: Vec::new(),
            operations: vec!["jump".to_owned(), "call".to_owned()],
            delay_slots: 3,
            global_guard_latency: 1,
            return_address_port: None,
        }
    }

    fn guarded_machine() -> Machine {
        let mut machine = Machine::new(gcu());
        let mut bus = Bus::new("b0".to_owned(), 32, 0, ExtensionMode::Zero);
        bus.guards.push(Guard::Register {
            rf: "rf1".to_owned(),
            index: 0,
            inverted: false,
        });
        bus.guards.push(Guard::Port {
            fu: "fu1".to_owned(),
            port: "port1".to_owned(),
            inverted: true,
        });
        machine.buses.push(bus);
        machine
    }

    fn guarded_encoding() -> BinaryEncoding {
        let mut field = GuardField::new();
        field
            .add_encoding(GuardEncoding::Gpr {
                rf: "rf1".to_owned(),
                index: 0,
                inverted: false,
                code: 0,
            })
            .unwrap();
        field
            .add_encoding(GuardEncoding::Fu {
                fu: "fu1".to_owned(),
                port: "port1".to_owned(),
                inverted: true,
                code: 1,
            })
            .unwrap();
        field
            .add_encoding(GuardEncoding::Unconditional {
                value: true,
                code: 2,
            })
            .unwrap();
        let mut slot = MoveSlot::new("b0".to_owned(), 16);
        slot.set_guard_field(0, field).unwrap();
        let mut bem = BinaryEncoding::new();
        bem.add_move_slot(slot).unwrap();
        bem
    }

    fn render(machine: &Machine, bem: &BinaryEncoding, lang: HdlLanguage) -> String {
        let mut w = HdlWriter::new(lang);
        emit_squash_signals(&mut w, machine, bem).unwrap();
        w.finish()
    }

    #[test]
    fn guard_branches_resolve_polarity_and_constants() {
        let text = render(&guarded_machine(), &guarded_encoding(), HdlLanguage::Vhdl);
        assert!(text.contains("case conv_integer(unsigned(grd_b0)) is"));
        // Non-inverted register guard squashes on the complement.
        assert!(text.contains("squash_b0 <= not rf_guard_rf1_0;"));
        // Inverted port guard squashes on the raw value.
        assert!(text.contains("squash_b0 <= fu_guard_fu1_port1;"));
        // The always-true encoding squashes unconditionally.
        let true_arm = text
            .find("when 2 =>")
            .map(|i| &text[i..i + 60])
            .unwrap();
        assert!(true_arm.contains("squash_b0 <= '1';"));
        // Unknown codes never cancel.
        let default_arm = text
            .find("when others =>")
            .map(|i| &text[i..i + 70])
            .unwrap();
        assert!(default_arm.contains("squash_b0 <= '0';"));
    }

    #[test]
    fn both_backends_branch_in_the_same_order() {
        let machine = guarded_machine();
        let bem = guarded_encoding();
        let vhdl = render(&machine, &bem, HdlLanguage::Vhdl);
        let verilog = render(&machine, &bem, HdlLanguage::Verilog);
        let vhdl_order: Vec<usize> = ["not rf_guard_rf1_0", "fu_guard_fu1_port1"]
            .iter()
            .map(|n| vhdl.find(n).unwrap())
            .collect();
        let verilog_order: Vec<usize> = ["~rf_guard_rf1_0", "fu_guard_fu1_port1"]
            .iter()
            .map(|n| verilog.find(n).unwrap())
            .collect();
        assert!(vhdl_order[0] < vhdl_order[1]);
        assert!(verilog_order[0] < verilog_order[1]);
        assert!(verilog.contains("case (grd_b0)"));
    }

    #[test]
    fn unguarded_unclaimed_bus_is_never_squashed() {
        let mut machine = Machine::new(gcu());
        machine
            .buses
            .push(Bus::new("b1".to_owned(), 32, 0, ExtensionMode::Zero));
        let mut bem = BinaryEncoding::new();
        bem.add_move_slot(MoveSlot::new("b1".to_owned(), 8)).unwrap();
        let vhdl = render(&machine, &bem, HdlLanguage::Vhdl);
        assert!(vhdl.contains("squash_b1 <= '0';"));
        assert!(!vhdl.contains("process"));
        let verilog = render(&machine, &bem, HdlLanguage::Verilog);
        assert!(verilog.contains("assign squash_b1 = 1'b0;"));
    }

    #[test]
    fn template_claims_take_priority_over_guards() {
        let mut machine = guarded_machine();
        machine.templates.push(InstructionTemplate {
            name: "default".to_owned(),
            slots: Vec::new(),
        });
        machine.templates.push(InstructionTemplate {
            name: "limm".to_owned(),
            slots: vec![TemplateSlot {
                slot: "b0".to_owned(),
                width: 16,
                destination: "imm".to_owned(),
            }],
        });
        let mut bem = guarded_encoding();
        let mut control = ImmediateControlField::new();
        control
            .add_template_encoding("default".to_owned(), 0)
            .unwrap();
        control.add_template_encoding("limm".to_owned(), 1).unwrap();
        bem.set_immediate_control_field(control).unwrap();

        let text = render(&machine, &bem, HdlLanguage::Vhdl);
        let claim = text.find("conv_integer(unsigned(limm_tag)) = 1").unwrap();
        let case = text.find("case conv_integer(unsigned(grd_b0))").unwrap();
        assert!(claim < case);
        assert!(text.contains("process (rf_guard_rf1_0, fu_guard_fu1_port1, grd_b0, limm_tag)"));
    }
}
