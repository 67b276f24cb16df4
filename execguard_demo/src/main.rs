// execguard_demo/src/main.rs
//
// Thin command-line shell over the gateway.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use execguard_demo::{Gateway, PrintSink, SymbolDiscovery};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xws::{ProcessEnv, XwsRuntime};

#[derive(Parser, Debug)]
#[command(name = "execguard_demo", about = "Execution-guard demo shell")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List exchanges and datastreams.
    Streams,
    /// Open a session and list discoverable symbols.
    Connect { exchange: String },
    /// Submit an order through the execution guard.
    Order {
        exchange: String,
        symbol: String,
        datastream: String,
        side: String,
        order_type: String,
        #[arg(allow_negative_numbers = true)]
        quantity: f64,
    },
    /// Subscribe and print lines until the stream ends.
    Subscribe {
        exchange: String,
        symbol: String,
        datastream: String,
        #[arg(long)]
        max_messages: Option<u32>,
        /// Seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let env = Arc::new(ProcessEnv);
    let runtime = Arc::new(XwsRuntime::new(env.clone()).context("init exchange runtime")?);
    let gateway = Gateway::new(runtime, env).context("init gateway")?;

    let ok = match cli.command {
        Command::Streams => {
            println!("exchanges: {}", gateway.list_exchanges().join(", "));
            println!("datastreams: {}", gateway.list_datastreams().join(", "));
            true
        }
        Command::Connect { exchange } => match gateway.try_connect(&exchange) {
            Ok(session) => {
                println!(
                    "connected: {} ({})",
                    session.exchange,
                    session.config.network.as_str()
                );
                match gateway.discover_symbols(&exchange) {
                    Ok(SymbolDiscovery::Listed(symbols)) => {
                        println!("symbols ({}): {}", symbols.len(), symbols.join(", "))
                    }
                    Ok(SymbolDiscovery::NotSupported) => println!("symbols: discovery not supported"),
                    Ok(SymbolDiscovery::Failed(reason)) => println!("symbols: unavailable ({reason})"),
                    Err(err) => eprintln!("Error: {err}"),
                }
                true
            }
            Err(err) => {
                eprintln!("Error: {err}");
                false
            }
        },
        Command::Order {
            exchange,
            symbol,
            datastream,
            side,
            order_type,
            quantity,
        } => match gateway.submit_order(&exchange, &symbol, &datastream, &side, &order_type, quantity) {
            Ok(receipt) => {
                println!(
                    "order {} {}: {} {} {} {} {} (mode {}, client id {})",
                    receipt.order_id,
                    receipt.status,
                    receipt.exchange,
                    receipt.symbol,
                    receipt.side,
                    receipt.order_type,
                    receipt.quantity,
                    receipt.mode,
                    receipt.client_order_id.as_deref().unwrap_or("-"),
                );
                true
            }
            Err(err) => {
                eprintln!("Error: {err}");
                false
            }
        },
        Command::Subscribe {
            exchange,
            symbol,
            datastream,
            max_messages,
            timeout,
        } => {
            let settings = gateway.settings().clone();
            let max_messages = max_messages.unwrap_or(settings.default_max_messages);
            let timeout = timeout.unwrap_or(settings.default_timeout_secs);
            match gateway.start_subscription(&exchange, &symbol, &datastream, max_messages, timeout) {
                Ok(mut handle) => {
                    let options = handle.options();
                    eprintln!(
                        "subscribed: {} {} {} (max {}, timeout {})",
                        handle.exchange(),
                        handle.symbol(),
                        handle.datastream(),
                        options.max_messages.map_or("none".to_string(), |m| m.to_string()),
                        options.timeout.map_or("none".to_string(), |t| format!("{}s", t.as_secs())),
                    );
                    let summary = gateway.poll_loop().run(&mut handle, &mut PrintSink);
                    tracing::info!(
                        cycles = summary.cycles,
                        lines = summary.lines,
                        stop = ?summary.stop,
                        "subscription finished"
                    );
                    summary.stop != execguard_demo::StopReason::ReadFailed
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    false
                }
            }
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
