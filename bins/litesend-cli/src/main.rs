//! litesend — send Litecoin from the command line.
//!
//! The extended private key is read from `--key`, then `LITESEND_KEY`, and
//! otherwise prompted for without echo.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use litesend_core::amount::Amount;
use litesend_core::constants::{Network, DEFAULT_FEE_TARGET_BLOCKS};
use litesend_core::traits::{LedgerReader, TransactionSigner};
use litesend_core::types::KeyMaterial;
use litesend_insight::Endpoints;
use litesend_keys::LitecoinSigner;
use litesend_wallet::fee::fee_from_quote;
use litesend_wallet::{FailureClass, PaymentPipeline, PipelineConfig};
use tokio::sync::watch;
use tracing::info;

/// Litecoin payment sender backed by an Insight explorer.
#[derive(Parser, Debug)]
#[command(name = "litesend")]
#[command(version, about = "Send a Litecoin payment from a single key.")]
struct Cli {
    /// Network (mainnet or testnet).
    #[arg(short, long, global = true, default_value = "mainnet")]
    network: Network,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pay an address.
    Send(SendArgs),
    /// Show the address controlled by a key.
    Address(KeyArgs),
    /// List spendable outputs of an address.
    Utxos(UtxosArgs),
    /// Show the current fee estimate.
    Fee(FeeArgs),
}

#[derive(Args, Debug)]
struct KeyArgs {
    /// Extended private key (xprv/tprv). Prefer LITESEND_KEY or the prompt.
    #[arg(short, long)]
    key: Option<String>,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Recipient address.
    #[arg(short, long)]
    to: String,

    /// Amount in LTC (e.g. 0.5).
    #[arg(short, long)]
    amount: String,

    #[command(flatten)]
    key: KeyArgs,

    /// Confirmation target for the fee estimate, in blocks.
    #[arg(long, default_value_t = DEFAULT_FEE_TARGET_BLOCKS)]
    fee_blocks: u32,

    /// Skip outputs with fewer confirmations.
    #[arg(long, default_value_t = 0)]
    min_confirmations: u64,

    /// Give up on any network stage after this many seconds.
    #[arg(long)]
    stage_timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct UtxosArgs {
    /// Address to query.
    address: String,
}

#[derive(Args, Debug)]
struct FeeArgs {
    /// Confirmation target in blocks.
    #[arg(short, long, default_value_t = DEFAULT_FEE_TARGET_BLOCKS)]
    blocks: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let endpoints = Endpoints::from_env().context("invalid endpoint configuration")?;

    match cli.command {
        Commands::Send(args) => send(cli.network, &endpoints, args).await,
        Commands::Address(args) => show_address(cli.network, args),
        Commands::Utxos(args) => list_utxos(cli.network, &endpoints, args).await,
        Commands::Fee(args) => show_fee(cli.network, &endpoints, args).await,
    }
}

async fn send(network: Network, endpoints: &Endpoints, args: SendArgs) -> Result<()> {
    let key = resolve_key(args.key)?;
    let config = pipeline_config(
        network,
        args.fee_blocks,
        args.min_confirmations,
        args.stage_timeout,
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping at the next stage");
            cancel_tx.send_replace(true);
        }
    });

    let pipeline = PaymentPipeline::connect(endpoints, config)
        .context("failed to create explorer client")?
        .with_cancellation(cancel_rx);

    match pipeline.send_payment(&key, &args.to, &args.amount).await {
        Ok(receipt) => {
            println!("txid:   {}", receipt.txid);
            println!("amount: {} LTC", receipt.amount.to_major_string());
            println!("fee:    {} LTC", receipt.fee.to_major_string());
            println!("change: {} LTC", receipt.change.to_major_string());
            println!("inputs: {}", receipt.inputs.len());
            Ok(())
        }
        Err(failure) => {
            let class = failure.error.class();
            if class == FailureClass::Unknown {
                if let Some(signed) = &failure.signed {
                    eprintln!("transaction may have been relayed, check txid {}", signed.txid);
                }
            }
            Err(failure).with_context(|| format!("payment not sent ({class:?})"))
        }
    }
}

fn show_address(network: Network, args: KeyArgs) -> Result<()> {
    let key = resolve_key(args)?;
    let address = LitecoinSigner::new(network)
        .derive_address(&key)
        .context("invalid key")?;
    println!("{address}");
    Ok(())
}

async fn list_utxos(network: Network, endpoints: &Endpoints, args: UtxosArgs) -> Result<()> {
    LitecoinSigner::new(network)
        .validate_address(&args.address)
        .context("invalid address")?;
    let client = litesend_insight::connect(network, endpoints)?;
    let mut utxos = client
        .fetch_unspent_outputs(&args.address)
        .await
        .context("failed to fetch outputs")?;
    litesend_wallet::utxo_source::sort_descending(&mut utxos);

    let total = Amount::checked_sum(utxos.iter().map(|u| u.value))
        .context("output total overflows")?;
    for utxo in &utxos {
        println!(
            "{}  {:>20} LTC  {} conf",
            utxo.outpoint(),
            utxo.value.to_major_string(),
            utxo.confirmations
        );
    }
    println!("{} outputs, {} LTC", utxos.len(), total.to_major_string());
    Ok(())
}

async fn show_fee(network: Network, endpoints: &Endpoints, args: FeeArgs) -> Result<()> {
    let client = litesend_insight::connect(network, endpoints)?;
    let quote = client
        .fetch_fee_rate(args.blocks)
        .await
        .context("failed to fetch fee estimate")?;
    let fee = fee_from_quote(&quote)?;
    println!(
        "{} LTC/kB for {} blocks ({} litoshis)",
        quote.fee_rate_per_kb,
        quote.blocks_to_confirm,
        fee.as_minor()
    );
    Ok(())
}

fn pipeline_config(
    network: Network,
    fee_blocks: u32,
    min_confirmations: u64,
    stage_timeout: Option<u64>,
) -> PipelineConfig {
    PipelineConfig {
        network,
        fee_target_blocks: fee_blocks,
        min_confirmations,
        stage_timeout: stage_timeout.map(Duration::from_secs),
    }
}

/// Key from the flag, then `LITESEND_KEY`, then an interactive prompt.
fn resolve_key(args: KeyArgs) -> Result<KeyMaterial> {
    if let Some(key) = args.key {
        return Ok(KeyMaterial::new(key));
    }
    if let Ok(key) = std::env::var("LITESEND_KEY") {
        if !key.trim().is_empty() {
            return Ok(KeyMaterial::new(key));
        }
    }
    let key = rpassword::prompt_password("Extended private key: ")
        .context("failed to read key")?;
    if key.trim().is_empty() {
        bail!("no key provided");
    }
    Ok(KeyMaterial::new(key))
}
