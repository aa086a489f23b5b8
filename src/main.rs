use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use addressbook::{
    api,
    book::InMemoryAddressBook,
    client::{AddressClient, HttpClient, LocalClient},
    config::Config,
    controller::{SearchController, FIRST_NAME, HOUSE_NUMBER, LAST_NAME, POSTCODE},
    lookup::{LookupService, MockRegistry},
};

mod utils;

#[derive(Debug, Parser)]
#[command(about = "Find addresses by postcode and house number")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Serve GET /api/getAddresses
    Serve,
    /// Look up an address and optionally add it to the address book
    Find(FindArgs),
}

#[derive(Clone, Debug, clap::Args)]
struct FindArgs {
    postcode: String,
    streetnumber: String,

    /// Use an in-process lookup instead of the configured base URL
    #[arg(long)]
    local: bool,

    /// Index of the result to add to the address book
    #[arg(long, requires_all = ["first_name", "last_name"])]
    select: Option<usize>,

    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("addressbook=info,tower_http=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => serve(&cli.config).await,
        Command::Find(args) if args.local => {
            let service = LookupService::with_latency(MockRegistry, cli.config.latency());
            find(LocalClient::new(Arc::new(service)), args).await
        }
        Command::Find(args) => find(HttpClient::new(&cli.config.base_url), args).await,
    }
}

async fn serve(config: &Config) -> Result<()> {
    let service = Arc::new(LookupService::with_latency(MockRegistry, config.latency()));
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(
        "listening on http://{} (lookup latency {}ms)",
        listener.local_addr()?,
        service.latency().as_millis()
    );
    axum::serve(listener, api::router(service)).await?;

    Ok(())
}

async fn find<C: AddressClient>(client: C, args: FindArgs) -> Result<()> {
    let ctl = SearchController::new(client, InMemoryAddressBook::new())?;
    ctl.on_change(POSTCODE, &args.postcode);
    ctl.on_change(HOUSE_NUMBER, &args.streetnumber);

    let mut rx = ctl.subscribe();
    let lookup = ctl.submit();
    let pb = utils::spinner("Finding addresses...")?;
    let loading = async {
        while rx.borrow_and_update().loading() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        pb.finish_and_clear();
    };
    tokio::join!(lookup, loading);

    let state = ctl.state();
    if let Some(error) = &state.error {
        bail!("{error}");
    }
    eprintln!(
        "{}",
        state
            .results
            .iter()
            .enumerate()
            .map(|(i, x)| format!("[{i}] {x}"))
            .join("\n")
    );

    let Some(index) = args.select else {
        println!("{}", serde_json::to_string_pretty(&state.results)?);
        return Ok(());
    };

    ctl.select(index);
    if let Some(address) = ctl.state().selected_address() {
        info!("selected {address}");
    }
    ctl.on_person_change(FIRST_NAME, args.first_name.as_deref().unwrap_or_default());
    ctl.on_person_change(LAST_NAME, args.last_name.as_deref().unwrap_or_default());
    ctl.submit_person()?;

    println!("{}", serde_json::to_string_pretty(&ctl.book().entries())?);
    Ok(())
}
