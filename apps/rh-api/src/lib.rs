pub mod routes;
pub mod state;

use std::net::SocketAddr;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

use rh_cli::ConfigArgs;

#[derive(Debug, Parser)]
#[command(
	version = rh_cli::VERSION,
	rename_all = "kebab",
	styles = rh_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = rh_config::load(&args.config.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(config).await?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}

fn init_tracing(config: &rh_config::Config) -> color_eyre::Result<()> {
	let filter = EnvFilter::try_new(&config.service.log_level)?;

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
