use {
    alloy::primitives::{Address, B256, Bytes, U256, keccak256},
    serde::{Deserialize, Serialize},
    std::fmt::{self, Debug, Formatter},
    thiserror::Error,
};

/// The trailing signature type byte understood by the 0x v2 exchange.
///
/// https://github.com/0xProject/0x-protocol-specification/blob/master/v2/v2-specification.md#signature-types
#[derive(Eq, PartialEq, Clone, Copy, Debug, Hash)]
#[repr(u8)]
pub enum SignatureType {
    Illegal = 0,
    Invalid = 1,
    Eip712 = 2,
    EthSign = 3,
    Wallet = 4,
    Validator = 5,
    PreSigned = 6,
}

impl TryFrom<u8> for SignatureType {
    type Error = SignatureError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Illegal,
            1 => Self::Invalid,
            2 => Self::Eip712,
            3 => Self::EthSign,
            4 => Self::Wallet,
            5 => Self::Validator,
            6 => Self::PreSigned,
            other => return Err(SignatureError::UnknownType(other)),
        })
    }
}

/// Schemes that sign the order hash with an externally owned account.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EcdsaSigningScheme {
    /// The order hash itself is signed.
    Eip712,
    /// The order hash is signed according to EIP-191's `personal_sign`
    /// format. This is what wallets do for `eth_sign`.
    #[default]
    EthSign,
}

impl From<EcdsaSigningScheme> for SignatureType {
    fn from(scheme: EcdsaSigningScheme) -> Self {
        match scheme {
            EcdsaSigningScheme::Eip712 => Self::Eip712,
            EcdsaSigningScheme::EthSign => Self::EthSign,
        }
    }
}

impl std::str::FromStr for EcdsaSigningScheme {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eip712" => Ok(Self::Eip712),
            "ethsign" => Ok(Self::EthSign),
            other => Err(SignatureError::UnknownScheme(other.to_owned())),
        }
    }
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum SignatureError {
    #[error("signature is empty")]
    Empty,
    #[error("unknown signature type {0}")]
    UnknownType(u8),
    #[error("unknown signing scheme {0:?}")]
    UnknownScheme(String),
    #[error("signature type {0:?} is never valid")]
    Unusable(SignatureType),
    #[error("ECDSA signature must be 65 bytes long plus the type byte, got {0}")]
    EcdsaLength(usize),
    #[error("presigned signatures carry no data")]
    PreSignedData,
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("unable to recover signer: {0}")]
    UnableToRecoverSigner(#[from] alloy::primitives::SignatureError),
    #[error("signature was produced by {recovered}, expected {expected}")]
    UnexpectedSigner { recovered: Address, expected: Address },
    #[error("{0:?} signatures can only be verified on-chain")]
    OnchainScheme(SignatureType),
}

/// Signature over an order hash, in the exact byte layout the 0x v2 exchange
/// expects: the signature data followed by a single signature type byte.
#[derive(Eq, PartialEq, Clone, Hash, Deserialize, Serialize)]
#[serde(into = "Bytes", try_from = "Bytes")]
pub enum Signature {
    Eip712(EcdsaSignature),
    EthSign(EcdsaSignature),
    /// Verified by calling `isValidSignature` on the maker contract.
    Wallet(Vec<u8>),
    /// Verified by an approved validator contract. The data ends with the
    /// validator address.
    Validator(Vec<u8>),
    /// The maker approved the order hash on-chain with `preSign`.
    PreSigned,
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let bytes = format!("0x{}", const_hex::encode(self.to_bytes()));
        f.debug_tuple(&format!("{:?}", self.signature_type()))
            .field(&bytes)
            .finish()
    }
}

impl Signature {
    pub fn signature_type(&self) -> SignatureType {
        match self {
            Self::Eip712(_) => SignatureType::Eip712,
            Self::EthSign(_) => SignatureType::EthSign,
            Self::Wallet(_) => SignatureType::Wallet,
            Self::Validator(_) => SignatureType::Validator,
            Self::PreSigned => SignatureType::PreSigned,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = match self {
            Self::Eip712(signature) | Self::EthSign(signature) => signature.to_bytes().to_vec(),
            Self::Wallet(data) | Self::Validator(data) => data.clone(),
            Self::PreSigned => Vec::new(),
        };
        bytes.push(self.signature_type() as u8);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let (&type_byte, data) = bytes.split_last().ok_or(SignatureError::Empty)?;
        let ecdsa = |data: &[u8]| -> Result<EcdsaSignature, SignatureError> {
            let data: &[u8; 65] = data
                .try_into()
                .map_err(|_| SignatureError::EcdsaLength(data.len()))?;
            Ok(EcdsaSignature::from_bytes(data))
        };
        Ok(match SignatureType::try_from(type_byte)? {
            kind @ (SignatureType::Illegal | SignatureType::Invalid) => {
                return Err(SignatureError::Unusable(kind));
            }
            SignatureType::Eip712 => Self::Eip712(ecdsa(data)?),
            SignatureType::EthSign => Self::EthSign(ecdsa(data)?),
            SignatureType::Wallet => Self::Wallet(data.to_vec()),
            SignatureType::Validator => Self::Validator(data.to_vec()),
            SignatureType::PreSigned => {
                if !data.is_empty() {
                    return Err(SignatureError::PreSignedData);
                }
                Self::PreSigned
            }
        })
    }

    /// Recovers the signer of an order hash, or `None` for schemes that are
    /// only verifiable by the exchange contract.
    pub fn recover(&self, hash: &[u8; 32]) -> Result<Option<Address>, VerificationError> {
        match self {
            Self::Eip712(signature) => signature.recover(EcdsaSigningScheme::Eip712, hash).map(Some),
            Self::EthSign(signature) => signature
                .recover(EcdsaSigningScheme::EthSign, hash)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Checks that the signature over `hash` was produced by `expected`.
    pub fn verify(&self, hash: &[u8; 32], expected: Address) -> Result<(), VerificationError> {
        match self.recover(hash)? {
            Some(recovered) if recovered == expected => Ok(()),
            Some(recovered) => Err(VerificationError::UnexpectedSigner {
                recovered,
                expected,
            }),
            None => Err(VerificationError::OnchainScheme(self.signature_type())),
        }
    }
}

impl From<Signature> for Bytes {
    fn from(signature: Signature) -> Self {
        signature.to_bytes().into()
    }
}

impl TryFrom<Bytes> for Signature {
    type Error = SignatureError;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        Self::from_bytes(&bytes)
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Hash)]
pub struct EcdsaSignature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// Returns the message that actually gets signed for an order hash.
pub fn signing_message(scheme: EcdsaSigningScheme, hash: &[u8; 32]) -> [u8; 32] {
    match scheme {
        EcdsaSigningScheme::Eip712 => *hash,
        EcdsaSigningScheme::EthSign => {
            let mut buffer = [0u8; 60];
            buffer[..28].copy_from_slice(b"\x19Ethereum Signed Message:\n32");
            buffer[28..].copy_from_slice(hash);
            keccak256(buffer).0
        }
    }
}

impl EcdsaSignature {
    pub fn to_signature(self, scheme: EcdsaSigningScheme) -> Signature {
        match scheme {
            EcdsaSigningScheme::Eip712 => Signature::Eip712(self),
            EcdsaSigningScheme::EthSign => Signature::EthSign(self),
        }
    }

    /// v + r + s
    pub fn to_bytes(self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0] = self.v;
        bytes[1..33].copy_from_slice(self.r.as_slice());
        bytes[33..65].copy_from_slice(self.s.as_slice());
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        Self {
            v: bytes[0],
            r: B256::from_slice(&bytes[1..33]),
            s: B256::from_slice(&bytes[33..65]),
        }
    }

    pub fn recover(
        &self,
        scheme: EcdsaSigningScheme,
        hash: &[u8; 32],
    ) -> Result<Address, VerificationError> {
        let message = B256::from(signing_message(scheme, hash));
        Ok(self.to_alloy()?.recover_address_from_prehash(&message)?)
    }

    fn to_alloy(self) -> Result<alloy::primitives::Signature, alloy::primitives::SignatureError> {
        let parity = match self.v {
            0 | 27 => false,
            1 | 28 => true,
            other => return Err(alloy::primitives::SignatureError::InvalidParity(other.into())),
        };
        Ok(alloy::primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        ))
    }
}

impl From<alloy::primitives::Signature> for EcdsaSignature {
    fn from(signature: alloy::primitives::Signature) -> Self {
        Self {
            v: 27 + u8::from(signature.v()),
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        }
    }
}
