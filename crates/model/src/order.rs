//! Contains the 0x v2 order type with serialization as described by the
//! Standard Relayer API v2.

use {
    crate::{
        DomainSeparator,
        asset_data::AssetData,
        hashed_eip712_message,
        salt,
        signature::{Signature, VerificationError},
    },
    alloy::primitives::{Address, B256, U256, keccak256},
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
    std::sync::LazyLock,
    thiserror::Error,
};

/// The fields of an order the maker commits to. This is what gets sent to the
/// relayer to ask for fees.
#[serde_as]
#[derive(Eq, PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfigRequest {
    pub exchange_address: Address,
    pub maker_address: Address,
    /// The zero address makes the order fillable by anyone.
    pub taker_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_asset_amount: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_asset_amount: U256,
    pub maker_asset_data: AssetData,
    pub taker_asset_data: AssetData,
    #[serde_as(as = "DisplayFromStr")]
    pub expiration_time_seconds: U256,
}

/// Fee parameters chosen by the relayer.
///
/// Unknown keys in the relayer's response are ignored, so nothing a relayer
/// returns can end up in a maker committed field.
#[serde_as]
#[derive(Eq, PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfig {
    pub sender_address: Address,
    pub fee_recipient_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_fee: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_fee: U256,
}

/// An unsigned 0x v2 order.
#[serde_as]
#[derive(Eq, PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub exchange_address: Address,
    pub maker_address: Address,
    pub taker_address: Address,
    pub fee_recipient_address: Address,
    pub sender_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_asset_amount: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_asset_amount: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub maker_fee: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub taker_fee: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub expiration_time_seconds: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub salt: U256,
    pub maker_asset_data: AssetData,
    pub taker_asset_data: AssetData,
}

/// Builds complete orders out of what the maker committed to and what the
/// relayer asked for.
///
/// The two inputs cover disjoint field sets. The request owns the exchange,
/// the parties, the amounts, the assets and the expiration. The relayer
/// config owns the sender, the fee recipient and both fees. Nothing is merged
/// by key, so a relayer can never override a committed value.
#[derive(Clone, Debug)]
pub struct OrderBuilder {
    request: OrderConfigRequest,
}

impl OrderBuilder {
    pub fn new(request: OrderConfigRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &OrderConfigRequest {
        &self.request
    }

    /// Completes the order with a freshly generated salt.
    pub fn build(self, config: &OrderConfig) -> Order {
        self.build_with_salt(config, salt::generate())
    }

    pub fn build_with_salt(self, config: &OrderConfig, salt: U256) -> Order {
        let OrderConfigRequest {
            exchange_address,
            maker_address,
            taker_address,
            maker_asset_amount,
            taker_asset_amount,
            maker_asset_data,
            taker_asset_data,
            expiration_time_seconds,
        } = self.request;
        let OrderConfig {
            sender_address,
            fee_recipient_address,
            maker_fee,
            taker_fee,
        } = *config;
        Order {
            exchange_address,
            maker_address,
            taker_address,
            fee_recipient_address,
            sender_address,
            maker_asset_amount,
            taker_asset_amount,
            maker_fee,
            taker_fee,
            expiration_time_seconds,
            salt,
            maker_asset_data,
            taker_asset_data,
        }
    }
}

impl Order {
    pub const TYPE: &'static str = "Order(\
        address makerAddress,\
        address takerAddress,\
        address feeRecipientAddress,\
        address senderAddress,\
        uint256 makerAssetAmount,\
        uint256 takerAssetAmount,\
        uint256 makerFee,\
        uint256 takerFee,\
        uint256 expirationTimeSeconds,\
        uint256 salt,\
        bytes makerAssetData,\
        bytes takerAssetData\
    )";

    pub fn type_hash() -> B256 {
        static TYPE_HASH: LazyLock<B256> = LazyLock::new(|| keccak256(Order::TYPE));
        *TYPE_HASH
    }

    /// Returns the value of hashStruct() over the order as defined by EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712#definition-of-hashstruct
    pub fn hash_struct(&self) -> [u8; 32] {
        let mut hash_data = [0u8; 416];
        hash_data[0..32].copy_from_slice(Self::type_hash().as_slice());
        // Addresses are left padded to 32 bytes, the padding stays 0.
        hash_data[44..64].copy_from_slice(self.maker_address.as_slice());
        hash_data[76..96].copy_from_slice(self.taker_address.as_slice());
        hash_data[108..128].copy_from_slice(self.fee_recipient_address.as_slice());
        hash_data[140..160].copy_from_slice(self.sender_address.as_slice());
        hash_data[160..192].copy_from_slice(&self.maker_asset_amount.to_be_bytes::<32>());
        hash_data[192..224].copy_from_slice(&self.taker_asset_amount.to_be_bytes::<32>());
        hash_data[224..256].copy_from_slice(&self.maker_fee.to_be_bytes::<32>());
        hash_data[256..288].copy_from_slice(&self.taker_fee.to_be_bytes::<32>());
        hash_data[288..320].copy_from_slice(&self.expiration_time_seconds.to_be_bytes::<32>());
        hash_data[320..352].copy_from_slice(&self.salt.to_be_bytes::<32>());
        hash_data[352..384].copy_from_slice(keccak256(self.maker_asset_data.as_bytes()).as_slice());
        hash_data[384..416].copy_from_slice(keccak256(self.taker_asset_data.as_bytes()).as_slice());
        keccak256(hash_data).0
    }

    pub fn domain_separator(&self) -> DomainSeparator {
        DomainSeparator::new(self.exchange_address)
    }

    /// The order hash as computed by `Exchange.getOrderHash`.
    pub fn hash(&self) -> B256 {
        B256::from(hashed_eip712_message(
            &self.domain_separator(),
            &self.hash_struct(),
        ))
    }

    pub fn with_signature(self, signature: Signature) -> SignedOrder {
        SignedOrder {
            order: self,
            signature,
        }
    }
}

/// An order together with the maker's signature over its hash.
#[derive(Eq, PartialEq, Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub signature: Signature,
}

impl SignedOrder {
    pub fn hash(&self) -> B256 {
        self.order.hash()
    }

    /// Checks that the signature was produced by the maker over this exact
    /// order.
    pub fn verify(&self) -> Result<(), VerificationError> {
        self.signature
            .verify(&self.order.hash().0, self.order.maker_address)
    }
}

/// Order status as reported by `Exchange.getOrderInfo`.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OrderStatus {
    Invalid = 0,
    InvalidMakerAssetAmount = 1,
    InvalidTakerAssetAmount = 2,
    Fillable = 3,
    Expired = 4,
    FullyFilled = 5,
    Cancelled = 6,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown order status {0}")]
pub struct UnknownOrderStatus(pub u8);

impl TryFrom<u8> for OrderStatus {
    type Error = UnknownOrderStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Invalid,
            1 => Self::InvalidMakerAssetAmount,
            2 => Self::InvalidTakerAssetAmount,
            3 => Self::Fillable,
            4 => Self::Expired,
            5 => Self::FullyFilled,
            6 => Self::Cancelled,
            other => return Err(UnknownOrderStatus(other)),
        })
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub struct OrderInfo {
    pub status: OrderStatus,
    pub hash: B256,
    pub taker_asset_filled_amount: U256,
}
