use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = ora_api::Args::parse();

	ora_api::run(args).await
}
