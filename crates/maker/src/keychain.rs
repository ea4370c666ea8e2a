//! Accounts available to the maker and the keys behind them.

use {
    alloy::{
        network::EthereumWallet,
        primitives::{Address, B256},
        signers::{
            Signature,
            Signer,
            local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
        },
    },
    anyhow::{Context, Result},
    thiserror::Error,
};

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum KeyError {
    #[error("no key available for {0}")]
    UnknownSigner(Address),
    #[error("key provider refused to sign for {address}: {reason}")]
    Rejected { address: Address, reason: String },
}

/// Enumerates the addresses that can sign. The first one acts as maker, the
/// second one as taker.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait AddressProvider: Send + Sync {
    async fn accounts(&self) -> Result<Vec<Address>>;
}

/// Signs digests with the key of an address. Implementations own the keys,
/// callers only ever see signatures.
#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait KeyProvider: Send + Sync {
    /// Signs `hash` as is. Any message prefix has to be applied by the
    /// caller.
    async fn sign_hash(&self, address: Address, hash: B256) -> Result<Signature, KeyError>;
}

/// Local keys derived from a mnemonic.
#[derive(Debug, Clone)]
pub struct Keychain {
    signers: Vec<PrivateKeySigner>,
}

impl Keychain {
    pub fn new(signers: Vec<PrivateKeySigner>) -> Self {
        Self { signers }
    }

    /// Derives the keys at `m/44'/60'/0'/0/{index}` for every index.
    pub fn from_mnemonic(phrase: &str, indices: impl IntoIterator<Item = u32>) -> Result<Self> {
        let signers = indices
            .into_iter()
            .map(|index| {
                MnemonicBuilder::<English>::default()
                    .phrase(phrase)
                    .index(index)
                    .with_context(|| format!("invalid derivation index {index}"))?
                    .build()
                    .context("invalid mnemonic")
            })
            .collect::<Result<_>>()?;
        Ok(Self::new(signers))
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(|signer| signer.address()).collect()
    }

    /// A transaction signing wallet holding every key of the keychain.
    pub fn wallet(&self) -> Result<EthereumWallet> {
        let (first, rest) = self.signers.split_first().context("empty keychain")?;
        let mut wallet = EthereumWallet::new(first.clone());
        for signer in rest {
            wallet.register_signer(signer.clone());
        }
        Ok(wallet)
    }

    fn signer(&self, address: Address) -> Option<&PrivateKeySigner> {
        self.signers
            .iter()
            .find(|signer| signer.address() == address)
    }
}

#[async_trait::async_trait]
impl AddressProvider for Keychain {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.addresses())
    }
}

#[async_trait::async_trait]
impl KeyProvider for Keychain {
    async fn sign_hash(&self, address: Address, hash: B256) -> Result<Signature, KeyError> {
        let signer = self.signer(address).ok_or(KeyError::UnknownSigner(address))?;
        signer
            .sign_hash(&hash)
            .await
            .map_err(|err| KeyError::Rejected {
                address,
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    const MNEMONIC: &str =
        "concert load couple harbor equip island argue ramp clarify fence smart topic";

    #[test]
    fn derives_development_accounts() {
        let keychain = Keychain::from_mnemonic(MNEMONIC, [0, 1]).unwrap();
        assert_eq!(
            keychain.addresses(),
            [
                address!("5409ed021d9299bf6814279a6a1411a7e866a631"),
                address!("6ecbe1db9ef729cbe972c83fb886247691fb6beb"),
            ]
        );
    }

    #[test]
    fn rejects_invalid_mnemonic() {
        assert!(Keychain::from_mnemonic("not a mnemonic", [0]).is_err());
        assert!(Keychain::new(vec![]).wallet().is_err());
    }

    #[tokio::test]
    async fn signs_only_for_known_addresses() {
        let keychain = Keychain::new(vec![PrivateKeySigner::random()]);
        let owner = keychain.addresses()[0];
        let hash = B256::repeat_byte(7);

        let signature = keychain.sign_hash(owner, hash).await.unwrap();
        assert_eq!(signature.recover_address_from_prehash(&hash).unwrap(), owner);

        let stranger = Address::repeat_byte(1);
        assert_eq!(
            keychain.sign_hash(stranger, hash).await,
            Err(KeyError::UnknownSigner(stranger))
        );
        assert_eq!(keychain.accounts().await.unwrap(), [owner]);
    }
}
