//! Pre-submission checks of a signed order against the chain.
//!
//! The result is advisory. Balances and allowances can change between
//! validation and the relayer accepting the order.

use {
    crate::blockchain::Blockchain,
    alloy::primitives::{Address, B256, U256},
    contracts::Network,
    futures::future::{try_join, try_join_all},
    model::{
        asset_data::Asset,
        order::{OrderStatus, SignedOrder},
    },
    std::{collections::BTreeMap, fmt, sync::Arc},
    thiserror::Error,
};

/// A single reason why an order cannot be filled right now.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Unfillable {
    InsufficientBalance {
        token: Address,
        required: U256,
        available: U256,
    },
    InsufficientAllowance {
        token: Address,
        required: U256,
        available: U256,
    },
    Expired {
        expiration: u64,
        now: u64,
    },
    /// The exchange reports a status other than fillable.
    Status(OrderStatus),
    InvalidSignature(String),
    UnsupportedAsset(String),
}

impl fmt::Display for Unfillable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientBalance {
                token,
                required,
                available,
            } => write!(
                f,
                "balance of {token} is {available}, need {required}"
            ),
            Self::InsufficientAllowance {
                token,
                required,
                available,
            } => write!(
                f,
                "allowance of {token} is {available}, need {required}"
            ),
            Self::Expired { expiration, now } => {
                write!(f, "expired at {expiration} (now {now})")
            }
            Self::Status(status) => write!(f, "exchange reports {status:?}"),
            Self::InvalidSignature(reason) => write!(f, "invalid signature: {reason}"),
            Self::UnsupportedAsset(reason) => write!(f, "unsupported maker asset: {reason}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("order {hash} is not fillable")]
    NotFillable {
        hash: B256,
        reasons: Vec<Unfillable>,
    },
    #[error(transparent)]
    Chain(#[from] anyhow::Error),
}

pub struct OrderValidator {
    chain: Arc<dyn Blockchain>,
    network: Network,
}

impl OrderValidator {
    pub fn new(chain: Arc<dyn Blockchain>, network: Network) -> Self {
        Self { chain, network }
    }

    /// Collects every reason the order is not fillable at time `now` (unix
    /// seconds). Succeeds only if there is none.
    #[tracing::instrument(skip_all, fields(hash = %order.hash()))]
    pub async fn validate(&self, order: &SignedOrder, now: u64) -> Result<(), ValidationError> {
        let hash = order.hash();
        let mut reasons = Vec::new();

        if let Err(err) = order.verify() {
            reasons.push(Unfillable::InvalidSignature(err.to_string()));
        }

        let expiration = order.order.expiration_time_seconds;
        let expired = U256::from(now) >= expiration;
        if expired {
            reasons.push(Unfillable::Expired {
                expiration: expiration.saturating_to(),
                now,
            });
        }

        let required = match self.required_funds(order) {
            Ok(required) => required,
            Err(reason) => {
                reasons.push(reason);
                BTreeMap::new()
            }
        };

        let maker = order.order.maker_address;
        let proxy = self.network.addresses.erc20_proxy;
        let funds = try_join_all(required.iter().map(|(&token, &amount)| async move {
            let (balance, allowance) = try_join(
                self.chain.balance(token, maker),
                self.chain.allowance(token, maker, proxy),
            )
            .await?;
            anyhow::Ok((token, amount, balance, allowance))
        }));
        let (funds, info) = try_join(
            funds,
            self.chain
                .order_info(self.network.addresses.exchange, &order.order),
        )
        .await?;

        for (token, required, balance, allowance) in funds {
            if balance < required {
                reasons.push(Unfillable::InsufficientBalance {
                    token,
                    required,
                    available: balance,
                });
            }
            if allowance < required {
                reasons.push(Unfillable::InsufficientAllowance {
                    token,
                    required,
                    available: allowance,
                });
            }
        }

        // An expired order is already reported above.
        let status_reported = expired && info.status == OrderStatus::Expired;
        if info.status != OrderStatus::Fillable && !status_reported {
            reasons.push(Unfillable::Status(info.status));
        }

        if reasons.is_empty() {
            tracing::debug!("order is fillable");
            Ok(())
        } else {
            tracing::warn!(?reasons, "order is not fillable");
            Err(ValidationError::NotFillable { hash, reasons })
        }
    }

    /// Amount of every token the maker has to hold and have approved.
    fn required_funds(&self, order: &SignedOrder) -> Result<BTreeMap<Address, U256>, Unfillable> {
        let order = &order.order;
        let Asset::Erc20(token) = order
            .maker_asset_data
            .decode()
            .map_err(|err| Unfillable::UnsupportedAsset(err.to_string()))?;

        let mut required = BTreeMap::new();
        required.insert(token, order.maker_asset_amount);
        if !order.maker_fee.is_zero() {
            let fee = required
                .entry(self.network.addresses.zrx_token)
                .or_insert(U256::ZERO);
            *fee = fee.saturating_add(order.maker_fee);
        }
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            blockchain::MockBlockchain,
            keychain::Keychain,
            signer::OrderSigner,
        },
        alloy::signers::local::PrivateKeySigner,
        model::{
            asset_data::AssetData,
            order::{Order, OrderInfo},
            signature::EcdsaSigningScheme,
            units::TokenUnit,
        },
    };

    const NOW: u64 = 1_700_000_000;

    async fn signed(expiration: u64, maker_fee: U256) -> SignedOrder {
        let key = PrivateKeySigner::random();
        let network = Network::GANACHE;
        let order = Order {
            exchange_address: network.addresses.exchange,
            maker_address: key.address(),
            maker_asset_amount: 5u64.atoms(),
            taker_asset_amount: U256::from(100_000_000_000_000_000u64),
            maker_fee,
            expiration_time_seconds: U256::from(expiration),
            salt: U256::from(1),
            maker_asset_data: AssetData::erc20(network.addresses.zrx_token),
            taker_asset_data: AssetData::erc20(network.addresses.weth_token),
            ..Default::default()
        };
        OrderSigner::new(
            Arc::new(Keychain::new(vec![key])),
            EcdsaSigningScheme::EthSign,
        )
        .sign(order)
        .await
        .unwrap()
    }

    fn chain(balance: U256, allowance: U256, status: OrderStatus) -> MockBlockchain {
        let mut chain = MockBlockchain::new();
        chain.expect_balance().returning(move |_, _| Ok(balance));
        chain
            .expect_allowance()
            .withf(|_, _, spender| *spender == Network::GANACHE.addresses.erc20_proxy)
            .returning(move |_, _, _| Ok(allowance));
        chain.expect_order_info().returning(move |_, order| {
            Ok(OrderInfo {
                status,
                hash: order.hash(),
                taker_asset_filled_amount: U256::ZERO,
            })
        });
        chain
    }

    fn validator(chain: MockBlockchain) -> OrderValidator {
        OrderValidator::new(Arc::new(chain), Network::GANACHE)
    }

    fn reasons(result: Result<(), ValidationError>) -> Vec<Unfillable> {
        match result {
            Err(ValidationError::NotFillable { reasons, .. }) => reasons,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn fillable_order_passes() {
        let order = signed(NOW + 600, U256::ZERO).await;
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Fillable);
        validator(chain).validate(&order, NOW).await.unwrap();
    }

    #[tokio::test]
    async fn expired_order_is_not_fillable() {
        let order = signed(NOW - 1, U256::ZERO).await;
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Expired);
        let reasons = reasons(validator(chain).validate(&order, NOW).await);
        assert_eq!(
            reasons,
            [Unfillable::Expired {
                expiration: NOW - 1,
                now: NOW
            }]
        );
    }

    #[tokio::test]
    async fn expires_exactly_at_expiration_time() {
        let order = signed(NOW, U256::ZERO).await;
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Fillable);
        let reasons = reasons(validator(chain).validate(&order, NOW).await);
        assert!(matches!(reasons[..], [Unfillable::Expired { .. }]));
    }

    #[tokio::test]
    async fn reports_every_missing_fund() {
        let order = signed(NOW + 600, U256::ZERO).await;
        let chain = chain(4u64.atoms(), U256::ZERO, OrderStatus::Fillable);
        let token = Network::GANACHE.addresses.zrx_token;
        assert_eq!(
            reasons(validator(chain).validate(&order, NOW).await),
            [
                Unfillable::InsufficientBalance {
                    token,
                    required: 5u64.atoms(),
                    available: 4u64.atoms(),
                },
                Unfillable::InsufficientAllowance {
                    token,
                    required: 5u64.atoms(),
                    available: U256::ZERO,
                },
            ]
        );
    }

    #[tokio::test]
    async fn maker_fee_adds_to_zrx_requirement() {
        let order = signed(NOW + 600, 1u64.atoms()).await;
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Fillable);
        assert_eq!(
            reasons(validator(chain).validate(&order, NOW).await),
            [Unfillable::InsufficientBalance {
                token: Network::GANACHE.addresses.zrx_token,
                required: 6u64.atoms(),
                available: 5u64.atoms(),
            }]
        );
    }

    #[tokio::test]
    async fn cancelled_order_is_not_fillable() {
        let order = signed(NOW + 600, U256::ZERO).await;
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Cancelled);
        assert_eq!(
            reasons(validator(chain).validate(&order, NOW).await),
            [Unfillable::Status(OrderStatus::Cancelled)]
        );
    }

    #[tokio::test]
    async fn tampered_order_has_invalid_signature() {
        let mut order = signed(NOW + 600, U256::ZERO).await;
        order.order.taker_asset_amount = U256::from(1);
        let chain = chain(5u64.atoms(), U256::MAX, OrderStatus::Fillable);
        assert!(matches!(
            reasons(validator(chain).validate(&order, NOW).await)[..],
            [Unfillable::InvalidSignature(_)]
        ));
    }

    #[tokio::test]
    async fn chain_errors_are_propagated() {
        let order = signed(NOW + 600, U256::ZERO).await;
        let mut chain = MockBlockchain::new();
        chain
            .expect_balance()
            .returning(|_, _| Err(anyhow::anyhow!("node down")));
        chain.expect_allowance().returning(|_, _, _| Ok(U256::MAX));
        chain.expect_order_info().returning(|_, order| {
            Ok(OrderInfo {
                status: OrderStatus::Fillable,
                hash: order.hash(),
                taker_asset_filled_amount: U256::ZERO,
            })
        });
        let result = validator(chain).validate(&order, NOW).await;
        assert!(matches!(result, Err(ValidationError::Chain(_))));
    }
}
