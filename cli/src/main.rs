//! Command-line tool to quote, redeem, mint and recharge NFT gift cards.

use anyhow::Context;
use clap::Parser;
use giftcard_balance::{redeem_with_policy, CardFlags, ChangePolicy, GiftCardBalance, RedemptionRequest};
use giftcard_contract::EthContractClient;
use giftcard_service::{init_logging, ChangePolicyKind, LogFormat, RedemptionService, ServiceConfig};
use giftcard_store::MemoryStore;
use giftcard_types::{AccountAddress, ChainId, Money, SystemClock, Timestamp, TokenId};
use giftcard_wallet::{JsonRpcTransport, Role, RpcWalletConnector, Session, WalletConnector};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "giftcard", about = "NFT gift card balance and redemption tool")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "GIFTCARD_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the Ethereum provider.
    #[arg(long, env = "GIFTCARD_RPC_URL")]
    rpc_url: Option<String>,

    /// Chain id the contract is deployed on.
    #[arg(long, env = "GIFTCARD_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Gift card contract address.
    #[arg(long, env = "GIFTCARD_CONTRACT")]
    contract: Option<AccountAddress>,

    /// Change policy: "same-token" or "new-token".
    #[arg(long, env = "GIFTCARD_CHANGE_POLICY", value_parser = parse_policy)]
    policy: Option<ChangePolicyKind>,

    /// Roles granted to this session (comma-separated: "merchant,admin").
    #[arg(long, env = "GIFTCARD_ROLES", value_delimiter = ',', value_parser = parse_role)]
    role: Vec<Role>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GIFTCARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GIFTCARD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compute a redemption offline, without touching the chain.
    Quote {
        /// Current card balance, e.g. "150.00".
        #[arg(long)]
        balance: Money,
        #[arg(long)]
        amount: Money,
    },
    /// Show a card as recorded on chain.
    Balance {
        #[arg(long)]
        token: u64,
    },
    /// Redeem an amount from a card.
    Redeem {
        #[arg(long)]
        token: u64,
        #[arg(long)]
        amount: Money,
    },
    /// Mint a new card.
    Mint {
        #[arg(long)]
        owner: AccountAddress,
        #[arg(long)]
        value: Money,
        /// Unix seconds after which the card can no longer be spent. Omit for no expiry.
        #[arg(long)]
        expires_at: Option<u64>,
        #[arg(long)]
        rechargeable: bool,
        #[arg(long)]
        not_redeemable: bool,
    },
    /// Add value to a rechargeable card.
    Recharge {
        #[arg(long)]
        token: u64,
        #[arg(long)]
        amount: Money,
    },
}

fn parse_policy(s: &str) -> Result<ChangePolicyKind, String> {
    match s.to_ascii_lowercase().replace('_', "-").as_str() {
        "same-token" => Ok(ChangePolicyKind::SameToken),
        "new-token" => Ok(ChangePolicyKind::NewToken),
        other => Err(format!("unknown change policy '{other}'")),
    }
}

fn parse_role(s: &str) -> Result<Role, String> {
    match s.to_ascii_lowercase().as_str() {
        "customer" => Ok(Role::Customer),
        "merchant" => Ok(Role::Merchant),
        "admin" => Ok(Role::Admin),
        other => Err(format!("unknown role '{other}'")),
    }
}

/// File settings first, then flags and env vars on top.
fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = ChainId::new(chain_id);
    }
    if let Some(contract) = &cli.contract {
        config.contract_address = Some(contract.clone());
    }
    if let Some(policy) = cli.policy {
        config.change_policy = policy;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Quote { balance, amount } => quote(balance, amount, config.change_policy),
        command => run(command, &cli.role, &config).await,
    }
}

/// Commands that talk to the provider.
async fn run(command: Command, roles: &[Role], config: &ServiceConfig) -> anyhow::Result<()> {
    let transport = Arc::new(JsonRpcTransport::new(config.rpc_url.clone(), config.rpc_timeout())?);
    let wallet = Arc::new(RpcWalletConnector::new(Arc::clone(&transport)));
    let contract = Arc::new(EthContractClient::new(
        Arc::clone(&transport),
        wallet.clone(),
        config.contract_config()?,
    ));
    let service = RedemptionService::new(
        contract,
        Arc::new(MemoryStore::new()),
        wallet.clone(),
        Arc::new(SystemClock),
        config,
    );
    tracing::debug!(rpc_url = %config.rpc_url, chain_id = %config.chain_id, "service ready");

    match command {
        Command::Quote { balance, amount } => quote(balance, amount, config.change_policy)?,
        Command::Balance { token } => {
            let token_id = TokenId::new(token);
            let card = service.balance(token_id).await?;
            let chain_balance = service.chain_balance(token_id).await?;
            if chain_balance != card.current_balance {
                tracing::warn!(%token_id, %chain_balance, stored = %card.current_balance, "balance differs from chain");
            }
            print_json(&serde_json::json!({ "card": card, "chain_balance": chain_balance }))?;
        }
        Command::Redeem { token, amount } => {
            let session = connect(wallet.as_ref(), roles).await?;
            let request = RedemptionRequest {
                token_id: TokenId::new(token),
                amount,
            };
            let outcome = service.redeem(&session, request).await?;
            print_json(&outcome)?;
        }
        Command::Mint {
            owner,
            value,
            expires_at,
            rechargeable,
            not_redeemable,
        } => {
            let session = connect(wallet.as_ref(), roles).await?;
            let expiration = expires_at.map(Timestamp::new).unwrap_or(Timestamp::NEVER);
            let flags = CardFlags {
                redeemable: !not_redeemable,
                rechargeable,
            };
            let minted = service.mint(&session, owner, value, expiration, flags).await?;
            print_json(&minted)?;
        }
        Command::Recharge { token, amount } => {
            let session = connect(wallet.as_ref(), roles).await?;
            let write = service.recharge(&session, TokenId::new(token), amount).await?;
            print_json(&write)?;
        }
    }
    Ok(())
}

async fn connect(wallet: &RpcWalletConnector, roles: &[Role]) -> anyhow::Result<Session> {
    wallet.connect().await.context("wallet connection failed")?;
    let session = Session::from_connector(wallet, roles.iter().copied())?;
    tracing::info!(account = %session.account, chain_id = %session.chain_id, "session opened");
    Ok(session)
}

fn quote(balance: Money, amount: Money, policy: ChangePolicyKind) -> anyhow::Result<()> {
    let card = GiftCardBalance::mint(TokenId::new(0), balance, Timestamp::NEVER, CardFlags::default())?;
    let policy = match policy {
        ChangePolicyKind::SameToken => ChangePolicy::SameToken,
        ChangePolicyKind::NewToken => ChangePolicy::NewToken {
            change_token_id: TokenId::new(1),
        },
    };
    let result = redeem_with_policy(&card, amount, Timestamp::now(), policy)?;
    print_json(&result)
}
