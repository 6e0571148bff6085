//! Link-layer identity addresses and resolving keys.

use std::fmt;

use crate::{IdentityError, IdentityResult};

/// Length of a link-layer address in bytes.
pub const ADDR_LEN: usize = 6;

/// Length of one stored identity record: the type byte followed by the
/// address bytes.
pub const RECORD_LEN: usize = ADDR_LEN + 1;

/// Address type discriminant. Only two values exist, which is what keeps
/// the key codec's type digit a single ASCII character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddrType {
    Public = 0,
    Random = 1,
}

impl TryFrom<u8> for AddrType {
    type Error = IdentityError;

    fn try_from(raw: u8) -> IdentityResult<Self> {
        match raw {
            0 => Ok(AddrType::Public),
            1 => Ok(AddrType::Random),
            other => Err(IdentityError::InvalidKey(format!(
                "address type {other} out of range"
            ))),
        }
    }
}

/// A device identity: a 6-byte link-layer address plus its type.
///
/// Address bytes are held least-significant first, matching the order they
/// travel over the air; display and key encoding emit them reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityAddr {
    pub val: [u8; ADDR_LEN],
    pub kind: AddrType,
}

impl IdentityAddr {
    pub fn new(kind: AddrType, val: [u8; ADDR_LEN]) -> Self {
        Self { val, kind }
    }

    pub fn public(val: [u8; ADDR_LEN]) -> Self {
        Self::new(AddrType::Public, val)
    }

    pub fn random(val: [u8; ADDR_LEN]) -> Self {
        Self::new(AddrType::Random, val)
    }

    /// Stored record form: type byte, then the six address bytes as held
    /// in memory.
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut rec = [0u8; RECORD_LEN];
        rec[0] = self.kind as u8;
        rec[1..].copy_from_slice(&self.val);
        rec
    }

    /// Parse one stored record. The slice must be exactly [`RECORD_LEN`]
    /// bytes with a valid type byte.
    pub fn from_record(rec: &[u8]) -> IdentityResult<Self> {
        if rec.len() != RECORD_LEN {
            return Err(IdentityError::InvalidKey(format!(
                "identity record is {} bytes, expected {RECORD_LEN}",
                rec.len()
            )));
        }
        let kind = AddrType::try_from(rec[0])?;
        let mut val = [0u8; ADDR_LEN];
        val.copy_from_slice(&rec[1..]);
        Ok(Self { val, kind })
    }
}

impl fmt::Display for IdentityAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.val.iter().rev().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{b:02X}")?;
        }
        match self.kind {
            AddrType::Public => write!(f, " (public)"),
            AddrType::Random => write!(f, " (random)"),
        }
    }
}

/// A 16-byte identity resolving key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ResolvingKey(pub [u8; Self::LEN]);

impl ResolvingKey {
    pub const LEN: usize = 16;

    pub fn zeroed() -> Self {
        Self([0u8; Self::LEN])
    }
}

impl fmt::Debug for ResolvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trip() {
        let addr = IdentityAddr::random([0xc0, 0x01, 0x02, 0x03, 0x04, 0xc5]);
        let rec = addr.to_record();
        assert_eq!(rec[0], 1);
        assert_eq!(IdentityAddr::from_record(&rec).unwrap(), addr);
    }

    #[test]
    fn record_rejects_bad_type_byte() {
        let mut rec = IdentityAddr::public([0; ADDR_LEN]).to_record();
        rec[0] = 2;
        assert!(matches!(
            IdentityAddr::from_record(&rec),
            Err(IdentityError::InvalidKey(_))
        ));
    }

    #[test]
    fn record_rejects_short_slice() {
        assert!(IdentityAddr::from_record(&[0u8; RECORD_LEN - 1]).is_err());
    }

    #[test]
    fn display_is_most_significant_first() {
        let addr = IdentityAddr::public([0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(addr.to_string(), "06:05:04:03:02:01 (public)");
    }
}
