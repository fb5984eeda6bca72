//! Prints a forecast as JSON.
//!
//! ```text
//! cargo run --example forecast -- [model|api] [hours]
//! ```
//!
//! Credentials are read from the environment or a `.env` file.

use std::env;
use weathercast::{DefaultForecaster, ForecastConfig, Strategy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let strategy = match args.next().as_deref() {
        Some("api") => Strategy::Api,
        _ => Strategy::Model,
    };
    let period = args.next().unwrap_or_else(|| "24".to_string());

    let forecaster = DefaultForecaster::from_config()
        .config(ForecastConfig::from_env())
        .call()
        .await?;
    let points = forecaster.forecast(strategy, period).await?;

    println!("{}", serde_json::to_string_pretty(&points)?);
    Ok(())
}
