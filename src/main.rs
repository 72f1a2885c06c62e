use conversor_api::{log, Config, ConversorService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log::init_logging();
    let config = Config::from_env()?;
    ConversorService::new(config).run().await?;
    Ok(())
}
