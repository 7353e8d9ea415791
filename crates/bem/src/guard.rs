//! Guard fields and guard-encoding variants.

use crate::error::BemError;
use crate::width::bit_length;

/// One encoding of a guard expression inside a guard field.
///
/// The numeric code is the guard-field value that selects this guard;
/// codes are unique within one field, as is the (resource, polarity)
/// identity of each variant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum GuardEncoding {
    /// Guard on one general-purpose register bit.
    Gpr {
        /// Register file name.
        rf: String,
        /// Register index within the file.
        index: u32,
        /// Polarity flag.
        inverted: bool,
        /// Selecting code.
        code: u32,
    },
    /// Guard on a function-unit output port.
    Fu {
        /// Function unit name.
        fu: String,
        /// Port name within the unit.
        port: String,
        /// Polarity flag.
        inverted: bool,
        /// Selecting code.
        code: u32,
    },
    /// Constant guard.
    Unconditional {
        /// The constant value; true cancels the transport, false never
        /// cancels.
        value: bool,
        /// Selecting code.
        code: u32,
    },
}

impl GuardEncoding {
    /// Returns the selecting code of the encoding.
    #[must_use]
    pub const fn code(&self) -> u32 {
        match self {
            Self::Gpr { code, .. } | Self::Fu { code, .. } | Self::Unconditional { code, .. } => {
                *code
            }
        }
    }

    /// Tells whether two encodings denote the same resource and polarity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Gpr {
                    rf: a,
                    index: ai,
                    inverted: av,
                    ..
                },
                Self::Gpr {
                    rf: b,
                    index: bi,
                    inverted: bv,
                    ..
                },
            ) => a == b && ai == bi && av == bv,
            (
                Self::Fu {
                    fu: a,
                    port: ap,
                    inverted: av,
                    ..
                },
                Self::Fu {
                    fu: b,
                    port: bp,
                    inverted: bv,
                    ..
                },
            ) => a == b && ap == bp && av == bv,
            (
                Self::Unconditional { value: a, .. },
                Self::Unconditional { value: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

/// The guard field of a move slot.
///
/// The field width is not declared; it follows the largest code in use,
/// so every code is representable by construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GuardField {
    encodings: Vec<GuardEncoding>,
}

impl GuardField {
    /// Creates an empty guard field.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            encodings: Vec::new(),
        }
    }

    /// Adds a guard encoding.
    ///
    /// # Errors
    ///
    /// Fails if an encoding with the same (resource, polarity) identity or
    /// the same code exists.
    pub fn add_encoding(&mut self, encoding: GuardEncoding) -> Result<(), BemError> {
        if self.encodings.iter().any(|e| e.same_identity(&encoding)) {
            return Err(BemError::DuplicateGuardIdentity);
        }
        if self.encodings.iter().any(|e| e.code() == encoding.code()) {
            return Err(BemError::DuplicateGuardCode(encoding.code()));
        }
        self.encodings.push(encoding);
        Ok(())
    }

    /// Width of the field: enough bits for the largest code in use.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.encodings
            .iter()
            .map(|e| bit_length(e.code()))
            .max()
            .unwrap_or(0)
    }

    /// All encodings, in the order they were added.
    #[must_use]
    pub fn encodings(&self) -> &[GuardEncoding] {
        &self.encodings
    }

    /// Looks up a register-guard encoding by identity.
    #[must_use]
    pub fn gpr_encoding(&self, rf: &str, index: u32, inverted: bool) -> Option<&GuardEncoding> {
        self.encodings.iter().find(|e| {
            matches!(e, GuardEncoding::Gpr { rf: r, index: i, inverted: v, .. }
                if r == rf && *i == index && *v == inverted)
        })
    }

    /// Looks up a port-guard encoding by identity.
    #[must_use]
    pub fn fu_encoding(&self, fu: &str, port: &str, inverted: bool) -> Option<&GuardEncoding> {
        self.encodings.iter().find(|e| {
            matches!(e, GuardEncoding::Fu { fu: f, port: p, inverted: v, .. }
                if f == fu && p == port && *v == inverted)
        })
    }

    /// Looks up an unconditional encoding by value.
    #[must_use]
    pub fn unconditional_encoding(&self, value: bool) -> Option<&GuardEncoding> {
        self.encodings
            .iter()
            .find(|e| matches!(e, GuardEncoding::Unconditional { value: v, .. } if *v == value))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::error::BemError;

    use super::{GuardEncoding, GuardField};

    fn gpr(rf: &str, index: u32, inverted: bool, code: u32) -> GuardEncoding {
        GuardEncoding::Gpr {
            rf: rf.to_owned(),
            index,
            inverted,
            code,
        }
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut field = GuardField::new();
        field.add_encoding(gpr("rf1", 0, false, 0)).unwrap();
        assert_eq!(
            field.add_encoding(gpr("rf1", 0, false, 1)),
            Err(BemError::DuplicateGuardIdentity)
        );
    }

    #[test]
    fn duplicate_code_is_rejected() {
        let mut field = GuardField::new();
        field.add_encoding(gpr("rf1", 0, false, 1)).unwrap();
        assert_eq!(
            field.add_encoding(gpr("rf1", 1, false, 1)),
            Err(BemError::DuplicateGuardCode(1))
        );
    }

    #[test]
    fn opposite_polarity_is_a_distinct_identity() {
        let mut field = GuardField::new();
        field.add_encoding(gpr("rf1", 0, false, 0)).unwrap();
        assert!(field.add_encoding(gpr("rf1", 0, true, 1)).is_ok());
    }

    #[test]
    fn width_follows_largest_code() {
        let mut field = GuardField::new();
        assert_eq!(field.width(), 0);
        field.add_encoding(gpr("rf1", 0, false, 0)).unwrap();
        assert_eq!(field.width(), 0);
        field.add_encoding(gpr("rf1", 1, false, 2)).unwrap();
        assert_eq!(field.width(), 2);
        field.add_encoding(gpr("rf1", 2, false, 5)).unwrap();
        assert_eq!(field.width(), 3);
    }

    #[test]
    fn identity_lookups_resolve_each_variant() {
        let mut field = GuardField::new();
        field.add_encoding(gpr("rf1", 0, false, 0)).unwrap();
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

        assert_eq!(
            field.gpr_encoding("rf1", 0, false).map(GuardEncoding::code),
            Some(0)
        );
        assert_eq!(
            field
                .fu_encoding("fu1", "port1", true)
                .map(GuardEncoding::code),
            Some(1)
        );
        assert_eq!(
            field.unconditional_encoding(true).map(GuardEncoding::code),
            Some(2)
        );
        assert!(field.gpr_encoding("rf1", 1, false).is_none());
        assert!(field.unconditional_encoding(false).is_none());
    }

    proptest! {
        #[test]
        fn distinct_indices_with_distinct_codes_always_insert(indices in proptest::collection::hash_set(0u32..64, 1..16)) {
            let mut field = GuardField::new();
            for (code, index) in indices.iter().enumerate() {
                let code = u32::try_from(code).unwrap();
                prop_assert!(field.add_encoding(gpr("rf", *index, false, code)).is_ok());
            }
            prop_assert_eq!(field.encodings().len(), indices.len());
        }
    }
}
