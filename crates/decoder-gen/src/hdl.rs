//! Shared emission IR rendered by the two backend printers.
//!
//! Conditions, bit-slice references and assignment right-hand sides are
//! one data type; the VHDL and Verilog printers differ only in literal
//! syntax. Every emission pass walks the same structures in the same
//! order, so the two outputs decode identically.

/// Target output language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdlLanguage {
    /// Entity/architecture style output.
    Vhdl,
    /// Module style output.
    Verilog,
}

/// A bit-slice reference into a named signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    /// Sliced signal name.
    pub signal: String,
    /// Most significant bit of the slice.
    pub msb: u32,
    /// Least significant bit of the slice.
    pub lsb: u32,
}

impl Slice {
    /// Creates a slice covering bits `lsb..=msb` of `signal`.
    #[must_use]
    pub const fn new(signal: String, msb: u32, lsb: u32) -> Self {
        Self { signal, msb, lsb }
    }

    /// Width of the slice in bits.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.msb - self.lsb + 1
    }

    /// Renders the slice in the given language.
    #[must_use]
    pub fn render(&self, language: HdlLanguage) -> String {
        match language {
            HdlLanguage::Vhdl => format!("{}({} downto {})", self.signal, self.msb, self.lsb),
            HdlLanguage::Verilog => format!("{}[{} : {}]", self.signal, self.msb, self.lsb),
        }
    }
}

/// A boolean condition of a decode rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Always true; emitted when a zero-width sub-range selects the only
    /// alternative.
    Always,
    /// A bit slice compares equal to an unsigned constant.
    SliceEq {
        /// The compared slice.
        slice: Slice,
        /// The constant.
        value: u32,
    },
    /// A whole vector signal compares equal to an unsigned constant.
    SignalEq {
        /// The compared signal.
        signal: String,
        /// The constant.
        value: u32,
    },
    /// A scalar signal has the given value.
    BitEq {
        /// The compared signal.
        signal: String,
        /// The constant.
        value: bool,
    },
    /// All inner conditions hold.
    And(Vec<Condition>),
}

impl Condition {
    /// Renders the condition in the given language.
    #[must_use]
    pub fn render(&self, language: HdlLanguage) -> String {
        match self {
            Self::Always => match language {
                HdlLanguage::Vhdl => "true".to_owned(),
                HdlLanguage::Verilog => "1".to_owned(),
            },
            Self::SliceEq { slice, value } => match language {
                HdlLanguage::Vhdl => format!(
                    "conv_integer(unsigned({})) = {value}",
                    slice.render(language)
                ),
                HdlLanguage::Verilog => format!("{} == {value}", slice.render(language)),
            },
            Self::SignalEq { signal, value } => match language {
                HdlLanguage::Vhdl => format!("conv_integer(unsigned({signal})) = {value}"),
                HdlLanguage::Verilog => format!("{signal} == {value}"),
            },
            Self::BitEq { signal, value } => match language {
                HdlLanguage::Vhdl => format!("{signal} = '{}'", u8::from(*value)),
                HdlLanguage::Verilog => format!("{signal} == 1'b{}", u8::from(*value)),
            },
            Self::And(inner) => {
                let glue = match language {
                    HdlLanguage::Vhdl => " and ",
                    HdlLanguage::Verilog => " && ",
                };
                inner
                    .iter()
                    .map(|c| c.render(language))
                    .collect::<Vec<_>>()
                    .join(glue)
            }
        }
    }
}

/// The right-hand side of a signal assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rhs {
    /// A scalar constant.
    Bit(bool),
    /// An all-zero vector of the target's width.
    Zeros,
    /// An unsigned constant of explicit width.
    Const {
        /// The constant value.
        value: u32,
        /// Width of the target in bits.
        width: u32,
    },
    /// A bit slice.
    Slice(Slice),
    /// A whole signal.
    Signal(String),
    /// The complement of a scalar signal.
    Not(String),
    /// A slice sign-extended to the given width.
    SignExtend {
        /// The extended slice.
        slice: Slice,
        /// Target width in bits.
        width: u32,
    },
    /// A slice zero-extended to the given width.
    ZeroExtend {
        /// The extended slice.
        slice: Slice,
        /// Target width in bits.
        width: u32,
    },
    /// The disjunction of scalar signals or slices, or a constant zero
    /// when empty.
    OrReduce(Vec<Rhs>),
}

impl Rhs {
    /// Renders the right-hand side in the given language.
    #[must_use]
    pub fn render(&self, language: HdlLanguage) -> String {
        match self {
            Self::Bit(value) => match language {
                HdlLanguage::Vhdl => format!("'{}'", u8::from(*value)),
                HdlLanguage::Verilog => format!("1'b{}", u8::from(*value)),
            },
            Self::Zeros => match language {
                HdlLanguage::Vhdl => "(others => '0')".to_owned(),
                HdlLanguage::Verilog => "0".to_owned(),
            },
            Self::Const { value, width } => match language {
                HdlLanguage::Vhdl => format!("conv_std_logic_vector({value}, {width})"),
                HdlLanguage::Verilog => format!("{width}'d{value}"),
            },
            Self::Slice(slice) => slice.render(language),
            Self::Signal(name) => name.clone(),
            Self::Not(name) => match language {
                HdlLanguage::Vhdl => format!("not {name}"),
                HdlLanguage::Verilog => format!("~{name}"),
            },
            Self::SignExtend { slice, width } => {
                if slice.width() == *width {
                    return slice.render(language);
                }
                match language {
                    HdlLanguage::Vhdl => format!("sxt({}, {width})", slice.render(language)),
                    HdlLanguage::Verilog => {
                        let pad = width - slice.width();
                        format!(
                            "{{{{{pad}{{{}[{}]}}}}, {}}}",
                            slice.signal,
                            slice.msb,
                            slice.render(language)
                        )
                    }
                }
            }
            Self::ZeroExtend { slice, width } => {
                if slice.width() == *width {
                    return slice.render(language);
                }
                match language {
                    HdlLanguage::Vhdl => format!("ext({}, {width})", slice.render(language)),
                    HdlLanguage::Verilog => {
                        let pad = width - slice.width();
                        format!("{{{{{pad}{{1'b0}}}}, {}}}", slice.render(language))
                    }
                }
            }
            Self::OrReduce(terms) => {
                if terms.is_empty() {
                    return Self::Bit(false).render(language);
                }
                let glue = match language {
                    HdlLanguage::Vhdl => " or ",
                    HdlLanguage::Verilog => " | ",
                };
                terms
                    .iter()
                    .map(|t| t.render(language))
                    .collect::<Vec<_>>()
                    .join(glue)
            }
        }
    }
}

/// Backing storage class of a declared signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Driven by a continuous assignment.
    Wire,
    /// Driven inside a process.
    Reg,
}

/// One internal signal declaration of the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDecl {
    /// Signal name.
    pub name: String,
    /// Vector width; scalar when `None`.
    pub width: Option<u32>,
    /// Storage class, relevant to the module-style backend.
    pub kind: SignalKind,
    /// True if the control-register reset block drives the signal to
    /// zero.
    pub reset: bool,
}

impl SignalDecl {
    /// Declares a scalar control register.
    #[must_use]
    pub const fn bit_reg(name: String) -> Self {
        Self {
            name,
            width: None,
            kind: SignalKind::Reg,
            reset: true,
        }
    }

    /// Declares a vector control register.
    #[must_use]
    pub const fn vector_reg(name: String, width: u32) -> Self {
        Self {
            name,
            width: Some(width),
            kind: SignalKind::Reg,
            reset: true,
        }
    }

    /// Declares a scalar wire.
    #[must_use]
    pub const fn bit_wire(name: String) -> Self {
        Self {
            name,
            width: None,
            kind: SignalKind::Wire,
            reset: false,
        }
    }

    /// Declares a vector wire.
    #[must_use]
    pub const fn vector_wire(name: String, width: u32) -> Self {
        Self {
            name,
            width: Some(width),
            kind: SignalKind::Wire,
            reset: false,
        }
    }

    fn render(&self, language: HdlLanguage) -> String {
        match language {
            HdlLanguage::Vhdl => self.width.map_or_else(
                || format!("signal {} : std_logic;", self.name),
                |w| format!("signal {} : std_logic_vector({} downto 0);", self.name, w - 1),
            ),
            HdlLanguage::Verilog => {
                let storage = match self.kind {
                    SignalKind::Wire => "wire",
                    SignalKind::Reg => "reg",
                };
                self.width.map_or_else(
                    || format!("{storage} {};", self.name),
                    |w| format!("{storage}[{} : 0] {};", w - 1, self.name),
                )
            }
        }
    }
}

/// Indented text sink emitting one backend's output.
#[derive(Debug)]
pub struct HdlWriter {
    language: HdlLanguage,
    out: String,
    indent: usize,
}

impl HdlWriter {
    /// Creates an empty writer for the given language.
    #[must_use]
    pub const fn new(language: HdlLanguage) -> Self {
        Self {
            language,
            out: String::new(),
            indent: 0,
        }
    }

    /// The target language of this writer.
    #[must_use]
    pub const fn language(&self) -> HdlLanguage {
        self.language
    }

    /// Consumes the writer and returns the emitted text.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    /// Appends one line at the current indentation.
    pub fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Appends an empty line.
    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Appends a comment line.
    pub fn comment(&mut self, text: &str) {
        let line = match self.language {
            HdlLanguage::Vhdl => format!("-- {text}"),
            HdlLanguage::Verilog => format!("// {text}"),
        };
        self.line(&line);
    }

    /// Increases the indentation level.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases the indentation level.
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Appends a signal declaration.
    pub fn signal(&mut self, decl: &SignalDecl) {
        let line = decl.render(self.language);
        self.line(&line);
    }

    /// Appends a process-internal assignment.
    pub fn assign(&mut self, target: &str, rhs: &Rhs) {
        let line = format!("{target} <= {};", rhs.render(self.language));
        self.line(&line);
    }

    /// Appends a continuous assignment.
    pub fn cont_assign(&mut self, target: &str, rhs: &Rhs) {
        let line = match self.language {
            HdlLanguage::Vhdl => format!("{target} <= {};", rhs.render(self.language)),
            HdlLanguage::Verilog => format!("assign {target} = {};", rhs.render(self.language)),
        };
        self.line(&line);
    }

    /// Opens an if statement.
    pub fn if_start(&mut self, condition: &Condition) {
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("if {} then", condition.render(self.language));
                self.line(&line);
            }
            HdlLanguage::Verilog => {
                let line = format!("if ({})", condition.render(self.language));
                self.line(&line);
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Continues an if statement with another condition.
    pub fn else_if(&mut self, condition: &Condition) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("elsif {} then", condition.render(self.language));
                self.line(&line);
            }
            HdlLanguage::Verilog => {
                self.line("end");
                let line = format!("else if ({})", condition.render(self.language));
                self.line(&line);
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Continues an if statement with the default branch.
    pub fn else_start(&mut self) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => self.line("else"),
            HdlLanguage::Verilog => {
                self.line("end");
                self.line("else");
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Closes an if statement.
    pub fn if_end(&mut self) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => self.line("end if;"),
            HdlLanguage::Verilog => self.line("end"),
        }
    }

    /// Opens a case statement over an unsigned-interpreted vector.
    pub fn case_start(&mut self, selector: &str) {
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("case conv_integer(unsigned({selector})) is");
                self.line(&line);
            }
            HdlLanguage::Verilog => {
                let line = format!("case ({selector})");
                self.line(&line);
            }
        }
        self.indent();
    }

    /// Opens one case arm.
    pub fn case_arm(&mut self, value: u32) {
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("when {value} =>");
                self.line(&line);
            }
            HdlLanguage::Verilog => {
                let line = format!("{value} :");
                self.line(&line);
            }
        }
        self.indent();
    }

    /// Opens the default case arm.
    pub fn case_default(&mut self) {
        match self.language {
            HdlLanguage::Vhdl => self.line("when others =>"),
            HdlLanguage::Verilog => self.line("default :"),
        }
        self.indent();
    }

    /// Closes a case arm.
    pub fn case_arm_end(&mut self) {
        self.dedent();
    }

    /// Closes a case statement.
    pub fn case_end(&mut self) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => self.line("end case;"),
            HdlLanguage::Verilog => self.line("endcase"),
        }
    }

    /// Opens a combinational process with the given sensitivity list.
    pub fn comb_process_start(&mut self, name: &str, sensitivity: &[String]) {
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("{name} : process ({})", sensitivity.join(", "));
                self.line(&line);
                self.line("begin");
            }
            HdlLanguage::Verilog => {
                let line = format!("always@({})", sensitivity.join(" or "));
                self.line(&line);
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Opens a clocked process, with the reset in the sensitivity list
    /// when asynchronous.
    pub fn clocked_process_start(&mut self, name: &str, async_reset: bool) {
        match self.language {
            HdlLanguage::Vhdl => {
                let line = if async_reset {
                    format!("{name} : process (clk, rstx)")
                } else {
                    format!("{name} : process (clk)")
                };
                self.line(&line);
                self.line("begin");
            }
            HdlLanguage::Verilog => {
                let line = if async_reset {
                    "always@(posedge clk or negedge rstx)".to_owned()
                } else {
                    "always@(posedge clk)".to_owned()
                };
                self.line(&line);
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Closes a process.
    pub fn process_end(&mut self, name: &str) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => {
                let line = format!("end process {name};");
                self.line(&line);
            }
            HdlLanguage::Verilog => self.line("end"),
        }
    }

    /// Opens a clocked process and its reset branch. After this call the
    /// writer is positioned inside the reset branch.
    pub fn reset_process_start(&mut self, name: &str, async_reset: bool) {
        match self.language {
            HdlLanguage::Vhdl => {
                if async_reset {
                    let line = format!("{name} : process (clk, rstx)");
                    self.line(&line);
                    self.line("begin");
                    self.indent();
                    self.line("if rstx = '0' then");
                } else {
                    let line = format!("{name} : process (clk)");
                    self.line(&line);
                    self.line("begin");
                    self.indent();
                    self.line("if clk'event and clk = '1' then");
                    self.indent();
                    self.line("if rstx = '0' then");
                }
                self.indent();
            }
            HdlLanguage::Verilog => {
                if async_reset {
                    self.line("always@(posedge clk or negedge rstx)");
                } else {
                    self.line("always@(posedge clk)");
                }
                self.line("begin");
                self.indent();
                self.line("if (rstx == 1'b0)");
                self.line("begin");
                self.indent();
            }
        }
    }

    /// Moves from the reset branch to the clocked body.
    pub fn reset_process_else(&mut self, async_reset: bool) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => {
                if async_reset {
                    self.line("elsif clk'event and clk = '1' then");
                } else {
                    self.line("else");
                }
            }
            HdlLanguage::Verilog => {
                self.line("end");
                self.line("else");
                self.line("begin");
            }
        }
        self.indent();
    }

    /// Closes a process opened by [`Self::reset_process_start`].
    pub fn reset_process_end(&mut self, name: &str, async_reset: bool) {
        self.dedent();
        match self.language {
            HdlLanguage::Vhdl => {
                self.line("end if;");
                if !async_reset {
                    self.dedent();
                    self.line("end if;");
                }
                self.dedent();
                let line = format!("end process {name};");
                self.line(&line);
            }
            HdlLanguage::Verilog => {
                self.line("end");
                self.dedent();
                self.line("end");
            }
        }
    }
}
