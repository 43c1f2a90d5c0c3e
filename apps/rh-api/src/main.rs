use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = rh_api::Args::parse();

	rh_api::run(args).await
}
