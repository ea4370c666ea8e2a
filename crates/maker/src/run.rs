use {
    crate::{
        arguments::Arguments,
        blockchain::Ethereum,
        confirmation::{Cancellation, CancellationHandle},
        keychain::Keychain,
        pipeline::{OrderParameters, Pipeline},
        signer::OrderSigner,
    },
    alloy::primitives::U256,
    anyhow::{Context, Result},
    clap::Parser,
    model::{
        asset_data::AssetData,
        orderbook::{OrderBook, OrderRecord, Side, price},
        units::{DEFAULT_DECIMALS, to_base_units, to_unit_amount},
    },
    relayer::RelayerApi,
    std::{process::ExitCode, sync::Arc},
};

pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = Arguments::parse_from(args);
    observe::tracing::initialize(&args.observe());
    tracing::info!("running maker with validated arguments:\n{}", args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(?err, "maker failed");
            ExitCode::FAILURE
        }
    }
}

pub async fn run(args: Arguments) -> Result<()> {
    let network = args.network;
    let keychain = Arc::new(
        Keychain::from_mnemonic(
            &args.mnemonic,
            [args.maker_account_index, args.taker_account_index],
        )
        .context("deriving accounts")?,
    );
    let ethereum = Ethereum::new(args.node_url(), keychain.wallet()?);
    let chain_id = ethereum.chain_id().await?;
    tracing::debug!(%network, chain_id, "connected to node");

    let relayer = Arc::new(relayer::Client::from_arguments(&args.relayer, network.id)?);
    let maker_asset = AssetData::erc20(args.maker_token());
    let taker_asset = AssetData::erc20(network.addresses.weth_token);

    if !args.orderbook_only {
        let params = OrderParameters {
            maker_token: args.maker_token(),
            maker_amount: to_base_units(&args.maker_amount, args.maker_token_decimals)?,
            taker_amount: to_base_units(&args.taker_amount, DEFAULT_DECIMALS)?,
            valid_for: args.order_validity,
        };
        let pipeline = Pipeline {
            accounts: keychain.clone(),
            signer: OrderSigner::new(keychain, args.signing_scheme),
            chain: Arc::new(ethereum),
            relayer: relayer.clone(),
            network,
            confirmation: args.confirmation(),
        };

        let (handle, cancellation) = Cancellation::new();
        tokio::spawn(cancel_on_interrupt(handle));
        match pipeline.run(&params, &cancellation).await {
            Ok(order) => tracing::info!(hash = %order.hash(), "order submitted"),
            Err(failure) => {
                tracing::error!(
                    progress = ?failure.progress,
                    retryable = failure.error.is_retryable(),
                    "order flow failed"
                );
                return Err(failure.into());
            }
        }
    }

    let book = relayer.order_book(&maker_asset, &taker_asset).await?;
    tracing::info!(
        "orderbook:\n{}",
        summary(&book, args.maker_token_decimals)
    );
    Ok(())
}

async fn cancel_on_interrupt(handle: CancellationHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("received SIGINT, abandoning order flow");
            handle.cancel();
        }
        Err(err) => tracing::warn!(?err, "failed to listen for SIGINT"),
    }
}

/// Renders the orderbook as one line per order, asks before bids. Amounts are
/// in units of the base token, prices in WETH per base token.
fn summary(book: &OrderBook, base_decimals: u8) -> String {
    let section = |title: &str, records: &[OrderRecord], side: Side| {
        let mut out = format!("{title} ({})\n", records.len());
        for record in records {
            let order = &record.order.order;
            let amount = match side {
                Side::Ask => order.maker_asset_amount,
                Side::Bid => order.taker_asset_amount,
            };
            let (numerator, denominator) = price(&record.order, side);
            out.push_str(&format!(
                "  {} @ {} (maker {})\n",
                to_unit_amount(amount, base_decimals),
                display_price(numerator, denominator),
                order.maker_address,
            ));
        }
        out
    };
    section("asks", &book.asks, Side::Ask) + &section("bids", &book.bids, Side::Bid)
}

/// Formats `numerator / denominator` with six decimals.
fn display_price(numerator: U256, denominator: U256) -> String {
    const SCALE: u64 = 1_000_000;
    if denominator.is_zero() {
        return "-".to_owned();
    }
    let scaled = numerator.saturating_mul(U256::from(SCALE)) / denominator;
    let (whole, fraction) = scaled.div_rem(U256::from(SCALE));
    format!("{whole}.{:0>6}", fraction.to_string())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::Address,
        model::{
            order::Order,
            signature::{EcdsaSignature, EcdsaSigningScheme},
            units::TokenUnit,
        },
    };

    fn record(maker_amount: U256, taker_amount: U256) -> OrderRecord {
        OrderRecord {
            order: Order {
                maker_address: Address::repeat_byte(1),
                maker_asset_amount: maker_amount,
                taker_asset_amount: taker_amount,
                ..Default::default()
            }
            .with_signature(EcdsaSignature::default().to_signature(EcdsaSigningScheme::EthSign)),
            meta_data: Default::default(),
        }
    }

    #[test]
    fn formats_prices() {
        assert_eq!(display_price(U256::from(1), U256::from(50)), "0.020000");
        assert_eq!(display_price(U256::from(3), U256::from(2)), "1.500000");
        assert_eq!(display_price(U256::from(1), U256::ZERO), "-");
    }

    #[test]
    fn summarizes_empty_book_and_unpriced_orders() {
        assert_eq!(summary(&OrderBook::default(), 18), "asks (0)\nbids (0)\n");

        let book = OrderBook {
            asks: vec![record(U256::ZERO, 1u64.atoms())],
            bids: vec![],
        };
        assert_eq!(
            summary(&book, 18),
            format!(
                "asks (1)\n  0.000000000000000000 @ - (maker {maker})\nbids (0)\n",
                maker = Address::repeat_byte(1),
            )
        );
    }

    #[test]
    fn summarizes_both_sides() {
        let book = OrderBook {
            asks: vec![record(5u64.atoms(), U256::from(100_000_000_000_000_000u64))],
            bids: vec![record(U256::from(200_000_000_000_000_000u64), 10u64.atoms())],
        };
        let summary = summary(&book, 18);
        assert_eq!(
            summary,
            format!(
                "asks (1)\n  5.000000000000000000 @ 0.020000 (maker {maker})\n\
                 bids (1)\n  10.000000000000000000 @ 0.020000 (maker {maker})\n",
                maker = Address::repeat_byte(1),
            )
        );
    }
}
