use std::fmt;
use std::str::FromStr;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// Width of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Opaque account identity.
///
/// Addresses are handed to the ledger by the host environment; the ledger
/// never mints or validates them beyond their fixed width. Two addresses
/// are the same account iff their bytes are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    #[error("address must be {} hex chars, got {0}", ADDRESS_LEN * 2)]
    BadLength(usize),
    #[error("invalid hex in address: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::BadLength(digits.len()));
        }
        let bytes = hex::decode(digits)?;
        let mut arr = [0u8; ADDRESS_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Hex-string representation on the wire, so addresses double as JSON map
// keys in the persisted ledger state.
impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_prefix() {
        let plain: Address = "00112233445566778899aabbccddeeff00112233".parse().unwrap();
        let prefixed: Address = "0x00112233445566778899aabbccddeeff00112233"
            .parse()
            .unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(
            plain.to_string(),
            "0x00112233445566778899aabbccddeeff00112233"
        );
    }

    #[test]
    fn rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Address>().unwrap_err();
        assert!(matches!(err, AddressParseError::BadLength(8)));
    }

    #[test]
    fn rejects_non_hex() {
        assert!("zz112233445566778899aabbccddeeff00112233"
            .parse::<Address>()
            .is_err());
    }

    #[test]
    fn serde_round_trip_as_hex_string() {
        let addr = Address::from_bytes([7u8; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x0707070707070707070707070707070707070707\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
