//! On-chain preparation before an order can be filled: the maker and the
//! taker allow the ERC20 asset proxy to move their tokens and the taker wraps
//! enough ether.

use {
    crate::{
        Error,
        blockchain::Blockchain,
        confirmation::{Cancellation, Cancelled, Confirmation},
    },
    alloy::primitives::{Address, TxHash, U256},
    contracts::Network,
};

/// What has to be in place for a maker and a taker to trade.
#[derive(Clone, Copy, Debug)]
pub struct Funding {
    pub maker: Address,
    pub taker: Address,
    pub maker_token: Address,
    pub maker_amount: U256,
    /// Amount of WETH the taker needs.
    pub taker_amount: U256,
}

pub struct Setup<'a> {
    chain: &'a dyn Blockchain,
    network: Network,
    confirmation: Confirmation,
    cancellation: &'a Cancellation,
}

impl<'a> Setup<'a> {
    pub fn new(
        chain: &'a dyn Blockchain,
        network: Network,
        confirmation: Confirmation,
        cancellation: &'a Cancellation,
    ) -> Self {
        Self {
            chain,
            network,
            confirmation,
            cancellation,
        }
    }

    /// Sends and confirms the missing transactions. Confirmed transactions are
    /// appended to `transactions` as they happen so they are known even if a
    /// later step fails.
    ///
    /// Approvals are only sent when the current allowance is too small, and
    /// only the missing WETH gets deposited. Running this twice therefore does
    /// not move additional funds.
    #[tracing::instrument(skip_all, fields(maker = %funding.maker, taker = %funding.taker))]
    pub async fn run(&self, funding: &Funding, transactions: &mut Vec<TxHash>) -> Result<(), Error> {
        let weth = self.network.addresses.weth_token;
        if let Some(tx) = self
            .ensure_allowance(funding.maker_token, funding.maker, funding.maker_amount)
            .await?
        {
            transactions.push(tx);
        }
        if let Some(tx) = self
            .ensure_allowance(weth, funding.taker, funding.taker_amount)
            .await?
        {
            transactions.push(tx);
        }
        if let Some(tx) = self.ensure_weth(funding.taker, funding.taker_amount).await? {
            transactions.push(tx);
        }
        Ok(())
    }

    async fn ensure_allowance(
        &self,
        token: Address,
        owner: Address,
        amount: U256,
    ) -> Result<Option<TxHash>, Error> {
        let spender = self.network.addresses.erc20_proxy;
        let allowance = self
            .cancellable(self.chain.allowance(token, owner, spender))
            .await?;
        if allowance >= amount {
            tracing::debug!(%token, %owner, %allowance, "allowance sufficient");
            return Ok(None);
        }

        let tx = self
            .cancellable(self.chain.approve(token, owner, spender, U256::MAX))
            .await?;
        tracing::info!(%token, %owner, %tx, "sent unlimited approval");
        self.confirmation
            .wait(self.chain, tx, self.cancellation)
            .await?;
        Ok(Some(tx))
    }

    async fn ensure_weth(&self, owner: Address, amount: U256) -> Result<Option<TxHash>, Error> {
        let weth = self.network.addresses.weth_token;
        let balance = self.cancellable(self.chain.balance(weth, owner)).await?;
        let Some(shortfall) = amount.checked_sub(balance).filter(|s| !s.is_zero()) else {
            tracing::debug!(%owner, %balance, "weth balance sufficient");
            return Ok(None);
        };

        let tx = self
            .cancellable(self.chain.deposit(weth, owner, shortfall))
            .await?;
        tracing::info!(%owner, %shortfall, %tx, "sent weth deposit");
        self.confirmation
            .wait(self.chain, tx, self.cancellation)
            .await?;
        Ok(Some(tx))
    }

    async fn cancellable<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, Error> {
        self.cancellation
            .run(call)
            .await
            .map_err(|Cancelled| Error::Cancelled)?
            .map_err(Error::Chain)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::blockchain::{MockBlockchain, TransactionStatus},
        mockall::predicate::{always, eq},
        model::units::TokenUnit,
    };

    const MAKER: Address = Address::repeat_byte(1);
    const TAKER: Address = Address::repeat_byte(2);

    fn funding() -> Funding {
        Funding {
            maker: MAKER,
            taker: TAKER,
            maker_token: Network::GANACHE.addresses.zrx_token,
            maker_amount: 5u64.atoms(),
            taker_amount: U256::from(100_000_000_000_000_000u64),
        }
    }

    fn mined(chain: &mut MockBlockchain) {
        chain
            .expect_transaction_status()
            .returning(|_| Ok(TransactionStatus::Mined));
    }

    #[tokio::test]
    async fn approves_and_deposits_what_is_missing() {
        let addresses = Network::GANACHE.addresses;
        let mut chain = MockBlockchain::new();
        chain.expect_allowance().returning(|_, _, _| Ok(U256::ZERO));
        chain
            .expect_approve()
            .with(
                eq(addresses.zrx_token),
                eq(MAKER),
                eq(addresses.erc20_proxy),
                eq(U256::MAX),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(TxHash::repeat_byte(0xa1)));
        chain
            .expect_approve()
            .with(
                eq(addresses.weth_token),
                eq(TAKER),
                eq(addresses.erc20_proxy),
                eq(U256::MAX),
            )
            .times(1)
            .returning(|_, _, _, _| Ok(TxHash::repeat_byte(0xa2)));
        chain
            .expect_balance()
            .with(eq(addresses.weth_token), eq(TAKER))
            .returning(|_, _| Ok(U256::from(40_000_000_000_000_000u64)));
        chain
            .expect_deposit()
            .with(
                eq(addresses.weth_token),
                eq(TAKER),
                eq(U256::from(60_000_000_000_000_000u64)),
            )
            .times(1)
            .returning(|_, _, _| Ok(TxHash::repeat_byte(0xd0)));
        mined(&mut chain);

        let cancellation = Cancellation::never();
        let setup = Setup::new(
            &chain,
            Network::GANACHE,
            Confirmation::default(),
            &cancellation,
        );
        let mut transactions = Vec::new();
        setup.run(&funding(), &mut transactions).await.unwrap();
        assert_eq!(
            transactions,
            [
                TxHash::repeat_byte(0xa1),
                TxHash::repeat_byte(0xa2),
                TxHash::repeat_byte(0xd0),
            ]
        );
    }

    #[tokio::test]
    async fn nothing_to_do_when_funded() {
        let mut chain = MockBlockchain::new();
        chain.expect_allowance().returning(|_, _, _| Ok(U256::MAX));
        chain.expect_balance().returning(|_, _| Ok(1u64.atoms()));
        chain.expect_approve().never();
        chain.expect_deposit().never();

        let cancellation = Cancellation::never();
        let setup = Setup::new(
            &chain,
            Network::GANACHE,
            Confirmation::default(),
            &cancellation,
        );
        let mut transactions = Vec::new();
        setup.run(&funding(), &mut transactions).await.unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn keeps_confirmed_transactions_on_failure() {
        let mut chain = MockBlockchain::new();
        chain
            .expect_allowance()
            .with(eq(Network::GANACHE.addresses.zrx_token), eq(MAKER), always())
            .returning(|_, _, _| Ok(U256::ZERO));
        chain
            .expect_allowance()
            .with(eq(Network::GANACHE.addresses.weth_token), eq(TAKER), always())
            .returning(|_, _, _| Err(anyhow::anyhow!("connection reset")));
        chain
            .expect_approve()
            .times(1)
            .returning(|_, _, _, _| Ok(TxHash::repeat_byte(0xa1)));
        mined(&mut chain);

        let cancellation = Cancellation::never();
        let setup = Setup::new(
            &chain,
            Network::GANACHE,
            Confirmation::default(),
            &cancellation,
        );
        let mut transactions = Vec::new();
        let err = setup.run(&funding(), &mut transactions).await.unwrap_err();
        assert!(matches!(err, Error::Chain(_)));
        assert_eq!(transactions, [TxHash::repeat_byte(0xa1)]);
    }

    #[tokio::test]
    async fn reverted_approval_fails() {
        let mut chain = MockBlockchain::new();
        chain.expect_allowance().returning(|_, _, _| Ok(U256::ZERO));
        chain
            .expect_approve()
            .returning(|_, _, _, _| Ok(TxHash::repeat_byte(0xa1)));
        chain
            .expect_transaction_status()
            .returning(|_| Ok(TransactionStatus::Reverted));

        let cancellation = Cancellation::never();
        let setup = Setup::new(
            &chain,
            Network::GANACHE,
            Confirmation::default(),
            &cancellation,
        );
        let mut transactions = Vec::new();
        let err = setup.run(&funding(), &mut transactions).await.unwrap_err();
        assert!(matches!(err, Error::Reverted(tx) if tx == TxHash::repeat_byte(0xa1)));
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_sending() {
        let mut chain = MockBlockchain::new();
        chain.expect_allowance().returning(|_, _, _| Ok(U256::ZERO));
        chain.expect_approve().never();

        let (handle, cancellation) = Cancellation::new();
        handle.cancel();
        let setup = Setup::new(
            &chain,
            Network::GANACHE,
            Confirmation::default(),
            &cancellation,
        );
        let err = setup.run(&funding(), &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
