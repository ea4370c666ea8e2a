//! 0x v2 asset data: a self-describing byte string naming the asset proxy that
//! moves the asset and the asset itself.
//!
//! <https://github.com/0xProject/0x-protocol-specification/blob/master/v2/v2-specification.md#erc20proxy>

use {
    alloy::primitives::{Address, Bytes},
    hex_literal::hex,
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

/// `bytes4(keccak256("ERC20Token(address)"))`
pub const ERC20_PROXY_ID: [u8; 4] = hex!("f47261b0");

const ERC20_ASSET_DATA_LEN: usize = 4 + 32;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("invalid token address {input:?}: {reason}")]
pub struct InvalidAddress {
    pub input: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("unsupported asset proxy id 0x{}", const_hex::encode(.0))]
    UnsupportedProxy([u8; 4]),
    #[error("asset data has {0} bytes, expected {ERC20_ASSET_DATA_LEN}")]
    Length(usize),
    #[error("address word has non-zero padding")]
    Padding,
}

/// The decoded form of [`AssetData`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Asset {
    Erc20(Address),
}

/// Encoded asset data as it appears in an order and on the wire.
#[derive(Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AssetData(pub Bytes);

impl AssetData {
    /// Encodes an ERC20 token. Total for any address.
    pub fn erc20(token: Address) -> Self {
        let mut data = [0u8; ERC20_ASSET_DATA_LEN];
        data[..4].copy_from_slice(&ERC20_PROXY_ID);
        data[16..].copy_from_slice(token.as_slice());
        Self(Bytes::copy_from_slice(&data))
    }

    /// Encodes an ERC20 token given its raw address bytes.
    pub fn erc20_from_slice(token: &[u8]) -> Result<Self, InvalidAddress> {
        if token.len() != 20 {
            return Err(InvalidAddress {
                input: format!("0x{}", const_hex::encode(token)),
                reason: "expected 20 bytes",
            });
        }
        Ok(Self::erc20(Address::from_slice(token)))
    }

    /// Encodes an ERC20 token given its `0x`-prefixed hex address.
    pub fn erc20_from_str(token: &str) -> Result<Self, InvalidAddress> {
        let invalid = |reason| InvalidAddress {
            input: token.to_owned(),
            reason,
        };
        let digits = token
            .strip_prefix("0x")
            .ok_or_else(|| invalid("missing 0x prefix"))?;
        let bytes = const_hex::decode(digits).map_err(|_| invalid("not hex"))?;
        Self::erc20_from_slice(&bytes).map_err(|err| invalid(err.reason))
    }

    pub fn decode(&self) -> Result<Asset, DecodeError> {
        let data = self.0.as_ref();
        let Some(proxy_id) = data.first_chunk::<4>().copied() else {
            return Err(DecodeError::Length(data.len()));
        };
        if proxy_id != ERC20_PROXY_ID {
            return Err(DecodeError::UnsupportedProxy(proxy_id));
        }
        if data.len() != ERC20_ASSET_DATA_LEN {
            return Err(DecodeError::Length(data.len()));
        }
        if data[4..16].iter().any(|byte| *byte != 0) {
            return Err(DecodeError::Padding);
        }
        Ok(Asset::Erc20(Address::from_slice(&data[16..])))
    }

    /// The ERC20 token this asset data refers to, if any.
    pub fn erc20_token(&self) -> Option<Address> {
        match self.decode() {
            Ok(Asset::Erc20(token)) => Some(token),
            Err(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl FromStr for AssetData {
    type Err = const_hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Bytes::from(const_hex::decode(s)?)))
    }
}

impl fmt::Debug for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", const_hex::encode(self.as_bytes()))
    }
}

impl fmt::Display for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address, serde_json::json, std::collections::HashSet};

    #[test]
    fn encodes_erc20_token() {
        let zrx = address!("871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c");
        assert_eq!(
            AssetData::erc20(zrx).to_string(),
            "0xf47261b0000000000000000000000000871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c",
        );
    }

    #[test]
    fn proxy_id_is_erc20_token_selector() {
        assert_eq!(
            alloy::primitives::keccak256("ERC20Token(address)")[..4],
            ERC20_PROXY_ID
        );
    }

    #[test]
    fn encoding_is_deterministic_and_injective() {
        let mut seen = HashSet::new();
        for i in 0..=255u8 {
            let mut raw = [0u8; 20];
            raw[0] = i;
            raw[19] = 255 - i;
            let token = Address::from(raw);
            let encoded = AssetData::erc20(token);
            assert_eq!(encoded, AssetData::erc20(token));
            assert_eq!(encoded.decode().unwrap(), Asset::Erc20(token));
            assert!(seen.insert(encoded));
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(AssetData::erc20_from_slice(&[1u8; 19]).is_err());
        assert!(AssetData::erc20_from_slice(&[1u8; 32]).is_err());
        assert!(AssetData::erc20_from_str("871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c").is_err());
        assert!(AssetData::erc20_from_str("0x871dd7c2b4b25e1aa18728e9d5f2af4c4e431f").is_err());
        assert!(AssetData::erc20_from_str("0xzz1dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c").is_err());

        let token = "0x871dd7c2b4b25e1aa18728e9d5f2af4c4e431f5c";
        assert_eq!(
            AssetData::erc20_from_str(token).unwrap(),
            AssetData::erc20(token.parse().unwrap()),
        );
    }

    #[test]
    fn decode_errors() {
        let unknown: AssetData = "0x025717920000".parse().unwrap();
        assert_eq!(
            unknown.decode(),
            Err(DecodeError::UnsupportedProxy(hex!("02571792")))
        );

        let short: AssetData = "0xf47261b00000".parse().unwrap();
        assert_eq!(short.decode(), Err(DecodeError::Length(6)));

        let mut dirty = AssetData::erc20(Address::repeat_byte(1)).0.to_vec();
        dirty[4] = 1;
        assert_eq!(
            AssetData(dirty.into()).decode(),
            Err(DecodeError::Padding)
        );
    }

    #[test]
    fn serializes_as_hex() {
        let data = AssetData::erc20(Address::repeat_byte(0x11));
        let value = json!(data);
        assert_eq!(
            value,
            json!("0xf47261b00000000000000000000000001111111111111111111111111111111111111111")
        );
        assert_eq!(serde_json::from_value::<AssetData>(value).unwrap(), data);
    }
}
