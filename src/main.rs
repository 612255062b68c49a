#![forbid(unsafe_code)]

use anyhow::Result;

use berrytest::{cli, station};

#[tokio::main]
async fn main() -> Result<()> {
    let config = cli::parse_args()?;
    station::run(config).await
}
