//! The order flow from account selection to relayer submission.

use {
    crate::{
        Error,
        blockchain::Blockchain,
        confirmation::{Cancellation, Cancelled, Confirmation},
        keychain::AddressProvider,
        setup::{Funding, Setup},
        signer::OrderSigner,
        validator::OrderValidator,
    },
    alloy::primitives::{Address, B256, TxHash, U256},
    contracts::Network,
    model::{
        asset_data::AssetData,
        order::{OrderBuilder, OrderConfigRequest, SignedOrder},
    },
    relayer::RelayerApi,
    std::{fmt, sync::Arc, time::Duration},
    thiserror::Error,
};

/// What the maker offers and asks for.
#[derive(Clone, Copy, Debug)]
pub struct OrderParameters {
    pub maker_token: Address,
    pub maker_amount: U256,
    /// Always the network's WETH.
    pub taker_amount: U256,
    pub valid_for: Duration,
}

/// How far the flow got. Transactions listed here are mined and stay in
/// effect whatever happens afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Progress {
    pub maker: Option<Address>,
    pub taker: Option<Address>,
    pub setup_transactions: Vec<TxHash>,
    pub order_hash: Option<B256>,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} setup transactions confirmed", self.setup_transactions.len())?;
        if let Some(hash) = self.order_hash {
            write!(f, ", order {hash}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("{error} ({progress})")]
pub struct Failure {
    pub progress: Progress,
    #[source]
    pub error: Error,
}

pub struct Pipeline {
    pub accounts: Arc<dyn AddressProvider>,
    pub signer: OrderSigner,
    pub chain: Arc<dyn Blockchain>,
    pub relayer: Arc<dyn RelayerApi>,
    pub network: Network,
    pub confirmation: Confirmation,
}

impl Pipeline {
    /// Creates, signs, validates and submits one order. Stops at the first
    /// failing stage. Nothing that already happened on chain is undone.
    #[tracing::instrument(skip_all)]
    pub async fn run(
        &self,
        params: &OrderParameters,
        cancellation: &Cancellation,
    ) -> Result<SignedOrder, Failure> {
        let mut progress = Progress::default();
        match self.execute(params, cancellation, &mut progress).await {
            Ok(order) => Ok(order),
            Err(error) => Err(Failure { progress, error }),
        }
    }

    async fn execute(
        &self,
        params: &OrderParameters,
        cancellation: &Cancellation,
        progress: &mut Progress,
    ) -> Result<SignedOrder, Error> {
        let accounts = cancellable(cancellation, self.accounts.accounts()).await?;
        let [maker, taker, ..] = accounts[..] else {
            return Err(Error::Accounts(accounts.len()));
        };
        progress.maker = Some(maker);
        progress.taker = Some(taker);
        tracing::info!(%maker, %taker, "selected accounts");

        let funding = Funding {
            maker,
            taker,
            maker_token: params.maker_token,
            maker_amount: params.maker_amount,
            taker_amount: params.taker_amount,
        };
        Setup::new(
            self.chain.as_ref(),
            self.network,
            self.confirmation,
            cancellation,
        )
        .run(&funding, &mut progress.setup_transactions)
        .await?;

        let now = now_in_epoch_seconds();
        let request = OrderConfigRequest {
            exchange_address: self.network.addresses.exchange,
            maker_address: maker,
            taker_address: Address::ZERO,
            maker_asset_amount: params.maker_amount,
            taker_asset_amount: params.taker_amount,
            maker_asset_data: AssetData::erc20(params.maker_token),
            taker_asset_data: AssetData::erc20(self.network.addresses.weth_token),
            expiration_time_seconds: U256::from(now.saturating_add(params.valid_for.as_secs())),
        };
        let config = cancellable(cancellation, self.relayer.order_config(&request)).await?;
        tracing::debug!(?config, "received order config");

        let order = OrderBuilder::new(request).build(&config);
        let hash = order.hash();
        progress.order_hash = Some(hash);
        tracing::info!(%hash, "built order");

        let order = cancellable(cancellation, self.signer.sign(order)).await?;

        let validator = OrderValidator::new(self.chain.clone(), self.network);
        cancellable(
            cancellation,
            validator.validate(&order, now_in_epoch_seconds()),
        )
        .await?;

        cancellable(cancellation, self.relayer.submit_order(&order)).await?;
        tracing::info!(%hash, "relayer accepted order");
        Ok(order)
    }
}

async fn cancellable<T, E>(
    cancellation: &Cancellation,
    future: impl Future<Output = Result<T, E>>,
) -> Result<T, Error>
where
    E: Into<Error>,
{
    cancellation
        .run(future)
        .await
        .map_err(|Cancelled| Error::Cancelled)?
        .map_err(Into::into)
}

fn now_in_epoch_seconds() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
