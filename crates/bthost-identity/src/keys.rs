//! Settings key path codec.
//!
//! Identity data lives under `bt/<subsys>/<addr><type>[/<key>]`, where
//! `<addr>` is the address printed most-significant byte first as 12 hex
//! digits and `<type>` is a single digit, `0` for public and `1` for
//! random.
//!
//! [`encode_key`] is a best-effort formatter, not a validated serializer:
//! it never fails and never writes past the destination buffer. If the
//! buffer is too small the path is silently truncated and still
//! NUL-terminated. Callers are expected to size their buffers generously.

use crate::addr::{AddrType, IdentityAddr, ADDR_LEN};
use crate::{IdentityError, IdentityResult};

/// Root settings namespace for the host stack.
pub const NAMESPACE: &str = "bt";

/// Fixed path of the persisted identity list.
pub const ID_KEY: &str = "bt/id";

/// Fixed path of the persisted resolving-key list.
pub const IRK_KEY: &str = "bt/irk";

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Encode `bt/<subsys>/<addr><type>[/<key>]` into `buf`.
///
/// Returns the length of the encoded string, not counting the NUL that is
/// always written after it (or in the final byte when truncated). A zero
/// capacity buffer stays untouched.
pub fn encode_key(buf: &mut [u8], subsys: &str, addr: &IdentityAddr, key: Option<&str>) -> usize {
    let cap = buf.len();
    if cap == 0 {
        return 0;
    }

    let mut len = 0usize;
    {
        let mut put = |b: u8| {
            if len < cap {
                buf[len] = b;
                len += 1;
            }
        };

        for &b in NAMESPACE.as_bytes() {
            put(b);
        }
        put(b'/');
        for &b in subsys.as_bytes() {
            put(b);
        }
        put(b'/');
        for i in (0..ADDR_LEN).rev() {
            let v = addr.val[i];
            put(HEX[(v >> 4) as usize]);
            put(HEX[(v & 0x0f) as usize]);
        }
        put(b'0' + addr.kind as u8);
        if let Some(key) = key {
            put(b'/');
            for &b in key.as_bytes() {
                put(b);
            }
        }
    }

    let end = len.min(cap - 1);
    buf[end] = 0;
    end
}

/// Decode the address head of a settings key.
///
/// The first `/`-separated segment must be exactly 13 characters: 12 hex
/// digits followed by the type digit. Anything after the segment is
/// ignored; nothing after it is required.
pub fn decode_key(key: &str) -> IdentityResult<IdentityAddr> {
    let head = key.split('/').next().unwrap_or("");
    let bytes = head.as_bytes();
    if bytes.len() != ADDR_LEN * 2 + 1 {
        return Err(IdentityError::InvalidKey(format!(
            "address segment {head:?} is not {} characters",
            ADDR_LEN * 2 + 1
        )));
    }

    let kind = match bytes[ADDR_LEN * 2] {
        b'0' => AddrType::Public,
        b'1' => AddrType::Random,
        other => {
            return Err(IdentityError::InvalidKey(format!(
                "invalid address type digit {:?}",
                other as char
            )))
        }
    };

    let mut val = [0u8; ADDR_LEN];
    for i in 0..ADDR_LEN {
        let hi = hex_digit(bytes[i * 2])?;
        let lo = hex_digit(bytes[i * 2 + 1])?;
        val[ADDR_LEN - 1 - i] = (hi << 4) | lo;
    }

    Ok(IdentityAddr::new(kind, val))
}

fn hex_digit(b: u8) -> IdentityResult<u8> {
    (b as char)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| IdentityError::InvalidKey(format!("invalid hex digit {:?}", b as char)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_to_string(subsys: &str, addr: &IdentityAddr, key: Option<&str>) -> String {
        let mut buf = [0u8; 128];
        let len = encode_key(&mut buf, subsys, addr, key);
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn encodes_address_most_significant_first() {
        let addr = IdentityAddr::public([0x01, 0x02, 0x03, 0x04, 0x05, 0xc6]);
        assert_eq!(
            encode_to_string("keys", &addr, None),
            "bt/keys/c605040302010"
        );
        assert_eq!(
            encode_to_string("keys", &addr, Some("ltk")),
            "bt/keys/c605040302010/ltk"
        );
    }

    #[test]
    fn random_type_uses_digit_one() {
        let addr = IdentityAddr::random([0; ADDR_LEN]);
        assert_eq!(encode_to_string("ccc", &addr, None), "bt/ccc/0000000000001");
    }

    #[test]
    fn truncation_stays_in_bounds_and_terminated() {
        let addr = IdentityAddr::random([0xaa; ADDR_LEN]);
        let full = encode_to_string("keys", &addr, Some("ltk"));

        for cap in 1..=full.len() + 1 {
            let mut buf = vec![0xffu8; cap + 2];
            // Sentinel bytes past the declared capacity must survive.
            let len = encode_key(&mut buf[..cap], "keys", &addr, Some("ltk"));
            assert!(len < cap);
            assert_eq!(buf[len], 0);
            assert_eq!(&buf[cap..], &[0xff, 0xff]);
            assert_eq!(&buf[..len], &full.as_bytes()[..len]);
        }
    }

    #[test]
    fn zero_capacity_buffer_is_untouched() {
        let addr = IdentityAddr::public([0; ADDR_LEN]);
        assert_eq!(encode_key(&mut [], "keys", &addr, None), 0);
    }

    #[test]
    fn decode_rejects_malformed_segments() {
        assert!(decode_key("").is_err());
        assert!(decode_key("00112233aabb").is_err()); // 12 chars, no type
        assert!(decode_key("00112233aabb00").is_err()); // 14 chars
        assert!(decode_key("00112233aabb2").is_err()); // type digit out of range
        assert!(decode_key("0011g233aabb0").is_err()); // non-hex digit
        assert!(decode_key("/ltk").is_err());
    }

    #[test]
    fn decode_ignores_trailing_leaf() {
        let addr = decode_key("c605040302010/ltk").unwrap();
        assert_eq!(addr, IdentityAddr::public([0x01, 0x02, 0x03, 0x04, 0x05, 0xc6]));
    }

    proptest! {
        #[test]
        fn round_trip(val in proptest::array::uniform6(any::<u8>()), random in any::<bool>()) {
            let kind = if random { AddrType::Random } else { AddrType::Public };
            let addr = IdentityAddr::new(kind, val);

            let mut buf = [0u8; 64];
            let len = encode_key(&mut buf, "keys", &addr, None);
            let path = std::str::from_utf8(&buf[..len]).unwrap();

            // Strip "bt/keys/" the way the settings subsystem would before
            // handing the remainder to a per-address handler.
            let rest = path.strip_prefix("bt/keys/").unwrap();
            prop_assert_eq!(decode_key(rest).unwrap(), addr);
        }
    }
}
