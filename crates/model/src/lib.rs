//! Contains the 0x v2 order models shared between the relayer client and the
//! maker pipeline.

pub mod asset_data;
pub mod order;
pub mod orderbook;
pub mod salt;
pub mod signature;
pub mod units;

use {
    alloy::{
        primitives::{Address, B256, keccak256},
        sol,
        sol_types::SolType,
    },
    std::{fmt, str::FromStr, sync::LazyLock},
};

type DomainSeparatorSol = sol! {
    tuple(
        bytes32, // EIP712_DOMAIN_TYPEHASH
        bytes32, // keccak(domain.name)
        bytes32, // keccak(domain.version)
        address, // verifyingContract
    )
};

/// The EIP-712 domain separator of a 0x v2 exchange deployment.
///
/// Exchange v2 domains do not commit to a chain id, only to the exchange
/// contract address.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DomainSeparator(pub [u8; 32]);

impl FromStr for DomainSeparator {
    type Err = const_hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(const_hex::decode_to_array(s)?))
    }
}

impl fmt::Debug for DomainSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

impl DomainSeparator {
    pub const NAME: &'static str = "0x Protocol";
    pub const VERSION: &'static str = "2";

    pub fn new(exchange: Address) -> Self {
        static DOMAIN_TYPE_HASH: LazyLock<B256> = LazyLock::new(|| {
            keccak256(b"EIP712Domain(string name,string version,address verifyingContract)")
        });
        static DOMAIN_NAME: LazyLock<B256> =
            LazyLock::new(|| keccak256(DomainSeparator::NAME.as_bytes()));
        static DOMAIN_VERSION: LazyLock<B256> =
            LazyLock::new(|| keccak256(DomainSeparator::VERSION.as_bytes()));

        let encoded = DomainSeparatorSol::abi_encode_sequence(&(
            *DOMAIN_TYPE_HASH,
            *DOMAIN_NAME,
            *DOMAIN_VERSION,
            exchange,
        ));
        Self(keccak256(encoded).0)
    }
}

/// Returns the final EIP-712 digest `keccak256(0x1901 || domain || struct)`.
///
/// https://eips.ethereum.org/EIPS/eip-712#specification
pub fn hashed_eip712_message(domain: &DomainSeparator, struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut message = [0u8; 66];
    message[0..2].copy_from_slice(&[0x19, 0x01]);
    message[2..34].copy_from_slice(&domain.0);
    message[34..66].copy_from_slice(struct_hash);
    keccak256(message).0
}
