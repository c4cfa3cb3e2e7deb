use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
    sync::Arc,
    time::Duration,
};
use tickwire_common::{
    codec::{ParameterCodec, Payload},
    crypto::{IdentityCodec, StandardIdentityCodec},
    schema::ContractSchema,
    transaction::{inspect_transaction, InspectedTransaction},
};
use tickwire_wallet::{
    api::run_faucet_server,
    config::{Command, Config, DataEncoding},
    confirmation::PendingConfirmation,
    cooldown::CooldownLedger,
    faucet::{FaucetBackend, FaucetService},
    logger::setup_logger,
    node_api::{NodeApi, NodeClient},
    session::{QueryClient, WalletSession},
    signer::RemoteSigner,
    storage::SledCooldownStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        // Command line only values survive the reload
        let command = config.command.take();
        let yes = config.yes;
        let file = File::open(path).context("Error while opening config file")?;
        config = serde_json::from_reader(file).context("Error while reading config file")?;
        config.command = command;
        config.yes = yes;
    } else if config.generate_config_template {
        eprintln!("Provided config file path is required to generate the template with --config-file");
        return Ok(());
    }

    config.validate().context("Invalid configuration")?;
    setup_logger(&config.log)?;

    let Some(command) = config.command.take() else {
        bail!("No command given, see --help");
    };
    run(command, &config).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Error while serializing output")?;
    println!("{}", json);
    Ok(())
}

fn identity_codec() -> Arc<dyn IdentityCodec> {
    Arc::new(StandardIdentityCodec::new())
}

fn node(config: &Config) -> Result<Arc<dyn NodeClient>> {
    let node = NodeApi::with_config(&config.network.node_address, config.network.node_api_config())
        .context("Error while creating the node client")?;
    Ok(Arc::new(node))
}

fn remote_signer(config: &Config, identity: &dyn IdentityCodec) -> Result<RemoteSigner> {
    let url = config
        .signer
        .signer_url
        .as_deref()
        .context("--signer-url is required to sign transactions")?;
    let source = config
        .signer
        .source_identity
        .as_deref()
        .context("--source-identity is required to sign transactions")?;
    let key = identity
        .decode_identity(source)
        .context("Invalid source identity")?;

    RemoteSigner::new(url, key, config.network.node_api_config())
        .context("Error while creating the signer client")
}

fn session(config: &Config) -> Result<WalletSession> {
    let codec = ParameterCodec::default();
    let signer = remote_signer(config, codec.identity())?;
    Ok(WalletSession::new(
        node(config)?,
        Arc::new(signer),
        codec,
        config.tick.tick_offset,
    ))
}

fn load_schema(path: &str) -> Result<ContractSchema> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Error while reading schema file {}", path))?;
    ContractSchema::from_json(&json).with_context(|| format!("Invalid schema file {}", path))
}

fn parse_params(params: &str) -> Result<Map<String, JsonValue>> {
    match serde_json::from_str(params).context("Parameters are not valid JSON")? {
        JsonValue::Object(map) => Ok(map),
        _ => bail!("Parameters must be a JSON object"),
    }
}

async fn ask_approval(pending: &PendingConfirmation) -> Result<bool> {
    if let Some(summary) = pending.summary() {
        println!("{}", summary);
    }
    print!("Approve this transaction? [y/N] ");
    std::io::stdout().flush().context("Error while writing to stdout")?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Error while reading the answer")?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn confirm(pending: PendingConfirmation, yes: bool) -> Result<()> {
    if !yes && !ask_approval(&pending).await? {
        pending.cancel();
        println!("Transaction rejected");
        return Ok(());
    }

    let receipt = pending.approve().await.context("Transaction failed")?;
    print_json(&receipt)
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Tick => {
            let node = node(config)?;
            let current = node.current_tick().await?;
            print_json(&serde_json::json!({
                "tick": current,
                "targetTick": current.saturating_add(config.tick.tick_offset),
                "offset": config.tick.tick_offset,
            }))
        }
        Command::Transfer {
            destination,
            amount,
        } => {
            let session = session(config)?;
            let pending = session.prepare_transfer(&destination, &amount).await?;
            confirm(pending, config.yes).await
        }
        Command::Invoke {
            schema,
            procedure,
            params,
            amount,
        } => {
            let schema = load_schema(&schema)?;
            let params = parse_params(&params)?;
            let session = session(config)?;
            let pending = session
                .prepare_invocation(&schema, &procedure, &params, amount.as_deref())
                .await?;
            confirm(pending, config.yes).await
        }
        Command::Query {
            schema,
            function,
            params,
        } => {
            let schema = load_schema(&schema)?;
            let params = parse_params(&params)?;
            let codec = ParameterCodec::default();
            let client = QueryClient::new(node(config)?, codec.clone());
            let result = client.query(&schema, &function, &params).await?;
            print_json(&codec.render(&result))
        }
        Command::QueryRaw {
            contract_index,
            input_type,
            data,
        } => {
            let payload = Payload::new(DataEncoding::Hex.decode(&data)?);
            let codec = ParameterCodec::default();
            let client = QueryClient::new(node(config)?, codec.clone());
            let result = client
                .query_raw(contract_index, input_type, &payload, None)
                .await?;
            print_json(&codec.render(&result))
        }
        Command::Decode {
            data,
            schema,
            function,
        } => {
            let bytes = DataEncoding::Hex.decode(&data)?;
            let codec = ParameterCodec::default();
            let result = match (schema, function) {
                (Some(schema), Some(function)) => {
                    let schema = load_schema(&schema)?;
                    let entry = schema.function(&function)?;
                    codec.decode_response(&bytes, Some(&entry.outputs))?
                }
                _ => codec.decode_response(&bytes, None)?,
            };
            print_json(&codec.render(&result))
        }
        Command::Inspect { data, encoding } => {
            let bytes = encoding.decode(&data)?;
            let (tx, signature) = inspect_transaction(&bytes)?;
            let identity = identity_codec();
            let inspected =
                InspectedTransaction::new(&tx, signature.as_ref(), bytes.len(), identity.as_ref());
            print_json(&inspected)
        }
        Command::FaucetServer => {
            let identity = identity_codec();
            let signer = remote_signer(config, identity.as_ref())?;
            let store = SledCooldownStore::open(&config.faucet.faucet_ledger_path)
                .context("Error while opening the faucet ledger")?;
            let ledger = CooldownLedger::new(
                Arc::new(store),
                Duration::from_secs(config.faucet.cooldown_seconds),
            );
            let backend = FaucetBackend::new(node(config)?, Arc::new(signer), config.tick.tick_offset);
            let service = FaucetService::new(config.faucet.faucet_amount, ledger, identity)?
                .with_backend(config.network.network, backend);

            if log::log_enabled!(log::Level::Info) {
                info!(
                    "faucet sends {} per claim on {}, one claim every {}s per address",
                    config.faucet.faucet_amount,
                    config.network.network,
                    config.faucet.cooldown_seconds
                );
            }
            run_faucet_server(
                Arc::new(service),
                &config.faucet.faucet_bind_address,
                config.faucet.faucet_threads,
            )
            .await
            .context("Faucet server failed")
        }
    }
}
