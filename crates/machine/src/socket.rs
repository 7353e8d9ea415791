//! Sockets routing data between unit ports and bus segments.

/// Data direction of a socket, seen from the connected unit ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SocketDirection {
    /// The socket writes bus data into unit ports.
    Input,
    /// The socket reads unit ports onto buses.
    Output,
}

/// Reference to one port of a named unit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PortRef {
    /// Name of the owning unit (function unit, register file or
    /// immediate unit).
    pub unit: String,
    /// Port name within the unit.
    pub port: String,
}

/// One socket of the interconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Socket {
    /// Socket name, unique within the machine.
    pub name: String,
    /// Direction of the socket.
    pub direction: SocketDirection,
    /// Names of the buses whose segments the socket is attached to, in
    /// attachment order.
    pub segments: Vec<String>,
    /// Unit ports connected to the socket, in attachment order.
    pub ports: Vec<PortRef>,
}

impl Socket {
    /// Creates a detached socket.
    #[must_use]
    pub const fn new(name: String, direction: SocketDirection) -> Self {
        Self {
            name,
            direction,
            segments: Vec::new(),
            ports: Vec::new(),
        }
    }

    /// Tells whether the socket is attached to a segment of the named bus.
    #[must_use]
    pub fn is_connected_to_bus(&self, bus: &str) -> bool {
        self.segments.iter().any(|s| s == bus)
    }
}

#[cfg(test)]
mod tests {
    use super::{Socket, SocketDirection};

    #[test]
    fn bus_connectivity_query_matches_segments() {
        let mut socket = Socket::new("s0".to_owned(), SocketDirection::Output);
        socket.segments.push("b1".to_owned());
        assert!(socket.is_connected_to_bus("b1"));
        assert!(!socket.is_connected_to_bus("b2"));
    }
}
