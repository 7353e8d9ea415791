//! Global lock/stall merging.
//!
//! All per-unit lock-request bits are OR-merged with the external lock
//! input into a pre-decode lock, registered for one cycle into the
//! post-decode lock, and OR'd with the pipeline-fill lock that holds the
//! core stalled until the first instruction is decoded after reset.

use crate::hdl::{Condition, HdlWriter, Rhs, SignalDecl, SignalKind, Slice};
use crate::names;
use crate::options::DecoderOptions;
use crate::wiring::WiringMap;

/// Internal signals of the lock-merging logic.
#[must_use]
pub fn lock_declarations() -> Vec<SignalDecl> {
    vec![
        SignalDecl::bit_wire(names::MERGED_GLOCK_REQ_SIGNAL.to_owned()),
        SignalDecl::bit_wire(names::PRE_DECODE_GLOCK_SIGNAL.to_owned()),
        SignalDecl::bit_wire(names::POST_DECODE_GLOCK_SIGNAL.to_owned()),
        // Registered by dedicated processes with a reset value of one;
        // deliberately outside the main reset block.
        SignalDecl {
            name: names::POST_DECODE_GLOCK_OUTREG.to_owned(),
            width: None,
            kind: SignalKind::Reg,
            reset: false,
        },
        SignalDecl {
            name: names::PIPELINE_FILL_SIGNAL.to_owned(),
            width: None,
            kind: SignalKind::Reg,
            reset: false,
        },
    ]
}

fn lock_req_width(wiring: &WiringMap) -> u32 {
    wiring
        .netlist
        .decoder
        .port(names::LOCK_REQ_PORT)
        .map_or(0, |p| p.width)
}

fn lock_req_bit(wiring: &WiringMap, bit: u32) -> Rhs {
    if lock_req_width(wiring) <= 1 {
        Rhs::Signal(names::LOCK_REQ_PORT.to_owned())
    } else {
        Rhs::Slice(Slice::new(names::LOCK_REQ_PORT.to_owned(), bit, bit))
    }
}

/// Emits the continuous lock-merging assignments and the per-consumer
/// global-lock bits.
///
/// Every `lock_req` bit joins the merge, including the trailing
/// debug-request bit when the debug interface is wired in.
pub fn emit_lock_merge(w: &mut HdlWriter, wiring: &WiringMap, options: &DecoderOptions) {
    let requests: Vec<Rhs> = (0..lock_req_width(wiring))
        .map(|bit| lock_req_bit(wiring, bit))
        .collect();
    w.cont_assign(names::MERGED_GLOCK_REQ_SIGNAL, &Rhs::OrReduce(requests));
    w.cont_assign(
        names::PRE_DECODE_GLOCK_SIGNAL,
        &Rhs::OrReduce(vec![
            Rhs::Signal(names::LOCK_IN_PORT.to_owned()),
            Rhs::Signal(names::MERGED_GLOCK_REQ_SIGNAL.to_owned()),
        ]),
    );
    w.cont_assign(
        names::POST_DECODE_GLOCK_SIGNAL,
        &Rhs::OrReduce(vec![
            Rhs::Signal(names::POST_DECODE_GLOCK_OUTREG.to_owned()),
            Rhs::Signal(names::PIPELINE_FILL_SIGNAL.to_owned()),
        ]),
    );
    w.cont_assign(
        names::LOCK_OUT_PORT,
        &Rhs::Signal(names::MERGED_GLOCK_REQ_SIGNAL.to_owned()),
    );
    w.cont_assign(
        names::LOCK_STATUS_PORT,
        &Rhs::Signal(names::POST_DECODE_GLOCK_SIGNAL.to_owned()),
    );
    w.blank();

    let glock_width = wiring
        .netlist
        .decoder
        .port(names::GLOCK_PORT)
        .map_or(1, |p| p.width);
    for (i, consumer) in wiring.global_lock_order.iter().enumerate() {
        let bit = u32::try_from(i).unwrap_or(u32::MAX);
        let target = if glock_width <= 1 {
            names::GLOCK_PORT.to_owned()
        } else {
            Slice::new(names::GLOCK_PORT.to_owned(), bit, bit).render(w.language())
        };
        let own_request = wiring
            .lock_request_order
            .iter()
            .position(|unit| unit == consumer);
        let rhs = match own_request {
            Some(own) if options.no_self_lock_loopback => {
                // A unit that stalled the core on its own behalf keeps
                // running; it only locks when someone else asks.
                let mut terms: Vec<Rhs> = (0..wiring.lock_request_order.len())
                    .filter(|i| *i != own)
                    .map(|i| lock_req_bit(wiring, u32::try_from(i).unwrap_or(u32::MAX)))
                    .collect();
                terms.push(Rhs::Signal(names::LOCK_IN_PORT.to_owned()));
                Rhs::OrReduce(terms)
            }
            _ => Rhs::Signal(names::POST_DECODE_GLOCK_SIGNAL.to_owned()),
        };
        let note = format!("to {consumer}");
        w.comment(&note);
        w.cont_assign(&target, &rhs);
    }
    w.blank();
}

/// Emits the post-decode lock register and the pipeline-fill register.
/// Both reset to one so the core stays locked through reset.
pub fn emit_lock_registers(w: &mut HdlWriter, options: &DecoderOptions) {
    w.reset_process_start("lock_reg_proc", options.async_reset);
    w.assign(names::POST_DECODE_GLOCK_OUTREG, &Rhs::Bit(true));
    w.reset_process_else(options.async_reset);
    w.assign(
        names::POST_DECODE_GLOCK_OUTREG,
        &Rhs::Signal(names::PRE_DECODE_GLOCK_SIGNAL.to_owned()),
    );
    w.reset_process_end("lock_reg_proc", options.async_reset);
    w.blank();

    w.reset_process_start("decode_pipeline_fill_lock", options.async_reset);
    w.assign(names::PIPELINE_FILL_SIGNAL, &Rhs::Bit(true));
    w.reset_process_else(options.async_reset);
    let unlocked = Condition::BitEq {
        signal: names::LOCK_IN_PORT.to_owned(),
        value: false,
    };
    w.if_start(&unlocked);
    w.assign(names::PIPELINE_FILL_SIGNAL, &Rhs::Bit(false));
    w.if_end();
    w.reset_process_end("decode_pipeline_fill_lock", options.async_reset);
    w.blank();
}

/// Emits the simulation-only lock trace dump, guarded by translate
/// pragmas so synthesis ignores it.
pub fn emit_lock_trace(w: &mut HdlWriter, options: &DecoderOptions) {
    if !options.lock_trace {
        return;
    }
    let start = options.lock_trace_start_cycle;
    match w.language() {
        crate::hdl::HdlLanguage::Vhdl => {
            w.line("-- pragma translate_off");
            w.line("lock_trace : process (clk)");
            w.line("  file trace : text open write_mode is \"lock_trace.dump\";");
            w.line("  variable trace_line : line;");
            w.line("  variable cycle : integer := 0;");
            w.line("begin");
            w.indent();
            w.line("if clk'event and clk = '1' then");
            w.indent();
            let guard = format!("if cycle >= {start} then");
            w.line(&guard);
            w.indent();
            w.line("write(trace_line, cycle);");
            w.line("write(trace_line, string'(\" | \"));");
            let status = format!(
                "write(trace_line, to_bit({}));",
                names::POST_DECODE_GLOCK_SIGNAL
            );
            w.line(&status);
            w.line("writeline(trace, trace_line);");
            w.dedent();
            w.line("end if;");
            w.line("cycle := cycle + 1;");
            w.dedent();
            w.line("end if;");
            w.dedent();
            w.line("end process lock_trace;");
            w.line("-- pragma translate_on");
        }
        crate::hdl::HdlLanguage::Verilog => {
            w.line("// pragma translate_off");
            w.line("integer lock_trace_fd;");
            w.line("integer lock_trace_cycle = 0;");
            w.line("initial lock_trace_fd = $fopen(\"lock_trace.dump\");");
            w.line("always@(posedge clk)");
            w.line("begin");
            w.indent();
            let guard = format!("if (lock_trace_cycle >= {start})");
            w.line(&guard);
            w.indent();
            let dump = format!(
                "$fwrite(lock_trace_fd, \"%0d | %b\\n\", lock_trace_cycle, {});",
                names::POST_DECODE_GLOCK_SIGNAL
            );
            w.line(&dump);
            w.dedent();
            w.line("lock_trace_cycle = lock_trace_cycle + 1;");
            w.dedent();
            w.line("end");
            w.line("// pragma translate_on");
        }
    }
    w.blank();
}
