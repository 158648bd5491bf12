use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = lexrag_api::Args::parse();

	lexrag_api::run(args).await
}
