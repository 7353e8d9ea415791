//! Caller-owned netlist surface mutated by the wiring phase.
//!
//! Only the decoder-facing boundary is modeled: the decoder block with
//! its ports, and the connections tying those ports to ports of other
//! blocks. The rest of the hardware-generation pipeline consumes the
//! result.

use crate::error::GeneratorError;

/// Direction of a decoder port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// Driven from outside the decoder.
    In,
    /// Driven by the decoder.
    Out,
}

/// One port of the decoder block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Port name.
    pub name: String,
    /// Port width in bits; 1 renders as a scalar.
    pub width: u32,
    /// Port direction.
    pub direction: PortDirection,
}

/// A connection from a decoder port to a port of another block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Name of the decoder port.
    pub decoder_port: String,
    /// Name of the peer block (unit or interconnect).
    pub unit: String,
    /// Name of the peer port.
    pub unit_port: String,
    /// Bit of the peer port the connection attaches to, if not whole.
    pub bit: Option<u32>,
}

/// The decoder block under construction.
#[derive(Debug, Clone, Default)]
pub struct NetlistBlock {
    ports: Vec<Port>,
}

impl NetlistBlock {
    /// Creates an empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// Adds a port to the block.
    ///
    /// # Errors
    ///
    /// Fails if a port with the same name exists.
    pub fn add_port(&mut self, port: Port) -> Result<(), GeneratorError> {
        if self.ports.iter().any(|p| p.name == port.name) {
            return Err(GeneratorError::DuplicatePort(port.name));
        }
        self.ports.push(port);
        Ok(())
    }

    /// Looks up a port by name.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// All ports, in the order they were added.
    #[must_use]
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }
}

/// The decoder block plus its external connections.
#[derive(Debug, Clone, Default)]
pub struct DecoderNetlist {
    /// The decoder block.
    pub decoder: NetlistBlock,
    /// Connections added by the wiring phase, in insertion order.
    pub connections: Vec<Connection>,
}

impl DecoderNetlist {
    /// Creates an empty netlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: NetlistBlock::new(),
            connections: Vec::new(),
        }
    }

    /// Adds a decoder port and records its connection to a peer port.
    ///
    /// # Errors
    ///
    /// Fails if the decoder already has a port with the same name.
    pub fn add_connected_port(
        &mut self,
        port: Port,
        unit: &str,
        unit_port: &str,
        bit: Option<u32>,
    ) -> Result<(), GeneratorError> {
        let decoder_port = port.name.clone();
        self.decoder.add_port(port)?;
        self.connections.push(Connection {
            decoder_port,
            unit: unit.to_owned(),
            unit_port: unit_port.to_owned(),
            bit,
        });
        Ok(())
    }
}
