use {
    crate::keychain::{KeyError, KeyProvider},
    alloy::primitives::{Address, B256},
    model::{
        order::{Order, SignedOrder},
        signature::{EcdsaSignature, EcdsaSigningScheme, Signature, signing_message},
    },
    std::sync::Arc,
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("key provider returned a signature of {recovered:?} instead of {expected}")]
    WrongSigner {
        expected: Address,
        recovered: Option<Address>,
    },
}

/// Signs order hashes on behalf of the maker. Keys stay with the
/// [`KeyProvider`].
#[derive(Clone)]
pub struct OrderSigner {
    keys: Arc<dyn KeyProvider>,
    scheme: EcdsaSigningScheme,
}

impl OrderSigner {
    pub fn new(keys: Arc<dyn KeyProvider>, scheme: EcdsaSigningScheme) -> Self {
        Self { keys, scheme }
    }

    pub fn scheme(&self) -> EcdsaSigningScheme {
        self.scheme
    }

    /// Signs an order hash. The signature type byte of the result tells
    /// verifiers which scheme was used.
    pub async fn sign_hash(&self, hash: B256, maker: Address) -> Result<Signature, SignError> {
        let message = B256::from(signing_message(self.scheme, &hash.0));
        let signature = self.keys.sign_hash(maker, message).await?;
        let signature = EcdsaSignature::from(signature).to_signature(self.scheme);

        // Never hand out a signature the exchange would attribute to someone
        // else.
        let recovered = signature.recover(&hash.0).ok().flatten();
        if recovered != Some(maker) {
            return Err(SignError::WrongSigner {
                expected: maker,
                recovered,
            });
        }
        Ok(signature)
    }

    #[tracing::instrument(skip_all, fields(maker = %order.maker_address))]
    pub async fn sign(&self, order: Order) -> Result<SignedOrder, SignError> {
        let hash = order.hash();
        let signature = self.sign_hash(hash, order.maker_address).await?;
        tracing::debug!(%hash, scheme = ?self.scheme, "signed order");
        Ok(order.with_signature(signature))
    }
}
