//! Access to the chain: token balances and allowances, the exchange's view of
//! an order, and the setup transactions.

use {
    alloy::{
        network::EthereumWallet,
        primitives::{Address, TxHash, U256},
        providers::{Provider as _, ProviderBuilder},
    },
    anyhow::{Context, Result},
    contracts::alloy::{ERC20, Exchange, Provider, WETH9},
    model::order::{Order, OrderInfo, OrderStatus},
    url::Url,
};

/// Gas limit of the setup transactions.
const GAS_LIMIT: u64 = 400_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionStatus {
    Pending,
    Mined,
    Reverted,
}

#[cfg_attr(any(test, feature = "test-util"), mockall::automock)]
#[async_trait::async_trait]
pub trait Blockchain: Send + Sync {
    async fn balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// The exchange's view of the order: whether it is fillable and how much
    /// of it has been filled already.
    async fn order_info(&self, exchange: Address, order: &Order) -> Result<OrderInfo>;

    /// Sends an `approve` transaction from `owner` and returns without waiting
    /// for it to be mined.
    async fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash>;

    /// Wraps `amount` ether of `owner` into WETH. Returns without waiting for
    /// the transaction to be mined.
    async fn deposit(&self, weth: Address, owner: Address, amount: U256) -> Result<TxHash>;

    async fn transaction_status(&self, tx: TxHash) -> Result<TransactionStatus>;
}

/// The Ethereum blockchain, accessed over JSON RPC.
#[derive(Clone, Debug)]
pub struct Ethereum {
    provider: Provider,
}

impl Ethereum {
    /// Connects to the node at `url`. Transactions are signed locally with
    /// the keys of `wallet`.
    pub fn new(url: Url, wallet: EthereumWallet) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(url)
            .erased();
        Self { provider }
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("could not fetch current chain id")
    }
}

fn exchange_order(order: &Order) -> Exchange::Order {
    Exchange::Order {
        makerAddress: order.maker_address,
        takerAddress: order.taker_address,
        feeRecipientAddress: order.fee_recipient_address,
        senderAddress: order.sender_address,
        makerAssetAmount: order.maker_asset_amount,
        takerAssetAmount: order.taker_asset_amount,
        makerFee: order.maker_fee,
        takerFee: order.taker_fee,
        expirationTimeSeconds: order.expiration_time_seconds,
        salt: order.salt,
        makerAssetData: order.maker_asset_data.0.clone(),
        takerAssetData: order.taker_asset_data.0.clone(),
    }
}

#[async_trait::async_trait]
impl Blockchain for Ethereum {
    async fn balance(&self, token: Address, owner: Address) -> Result<U256> {
        ERC20::Instance::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .with_context(|| format!("balance of {owner} in {token}"))
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        ERC20::Instance::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .with_context(|| format!("allowance of {owner} for {spender} in {token}"))
    }

    async fn order_info(&self, exchange: Address, order: &Order) -> Result<OrderInfo> {
        let info = Exchange::Instance::new(exchange, self.provider.clone())
            .getOrderInfo(exchange_order(order))
            .call()
            .await
            .context("getOrderInfo")?;
        Ok(OrderInfo {
            status: OrderStatus::try_from(info.orderStatus)?,
            hash: info.orderHash,
            taker_asset_filled_amount: info.orderTakerAssetFilledAmount,
        })
    }

    async fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash> {
        let pending = ERC20::Instance::new(token, self.provider.clone())
            .approve(spender, amount)
            .from(owner)
            .gas(GAS_LIMIT)
            .send()
            .await
            .with_context(|| format!("failed to send approval of {token} for {spender}"))?;
        Ok(*pending.tx_hash())
    }

    async fn deposit(&self, weth: Address, owner: Address, amount: U256) -> Result<TxHash> {
        let pending = WETH9::Instance::new(weth, self.provider.clone())
            .deposit()
            .from(owner)
            .value(amount)
            .gas(GAS_LIMIT)
            .send()
            .await
            .context("failed to send WETH deposit")?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_status(&self, tx: TxHash) -> Result<TransactionStatus> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx)
            .await
            .with_context(|| format!("receipt of {tx}"))?;
        Ok(match receipt {
            None => TransactionStatus::Pending,
            Some(receipt) if receipt.status() => TransactionStatus::Mined,
            Some(_) => TransactionStatus::Reverted,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{primitives::address, sol_types::SolCall},
        model::asset_data::AssetData,
    };

    #[test]
    fn exchange_order_keeps_every_field() {
        let order = Order {
            exchange_address: address!("48bacb9266a570d521063ef5dd96e61686dbe788"),
            maker_address: Address::repeat_byte(1),
            taker_address: Address::repeat_byte(2),
            fee_recipient_address: Address::repeat_byte(3),
            sender_address: Address::repeat_byte(4),
            maker_asset_amount: U256::from(5),
            taker_asset_amount: U256::from(6),
            maker_fee: U256::from(7),
            taker_fee: U256::from(8),
            expiration_time_seconds: U256::from(9),
            salt: U256::from(10),
            maker_asset_data: AssetData::erc20(Address::repeat_byte(11)),
            taker_asset_data: AssetData::erc20(Address::repeat_byte(12)),
        };
        let converted = exchange_order(&order);
        assert_eq!(converted.makerAddress, order.maker_address);
        assert_eq!(converted.feeRecipientAddress, order.fee_recipient_address);
        assert_eq!(converted.salt, order.salt);
        assert_eq!(converted.takerAssetData, order.taker_asset_data.0);

        // The call encodes the order as a dynamic tuple.
        let call = Exchange::getOrderInfoCall {
            order: converted,
        };
        assert!(call.abi_encode().len() > 4 + 13 * 32);
    }
}
