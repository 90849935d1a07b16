use dotenvy::dotenv;
use season_ledger::{
    config::{database, market::market_data_config_from_env, settings::load_default_settings},
    core::{
        balance::get_owner_balances,
        market::{MarketDataSource, market_source},
        prediction::get_season_predictions,
        report::{format_currency, format_grand_totals, format_season_summary, global_report},
    },
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Application settings and optional market data source
    let settings = load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {}", e))?;
    let market = market_source(market_data_config_from_env());
    info!(
        market_data = market.as_ref().is_some_and(MarketDataSource::is_configured),
        "Settings loaded"
    );

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Reports
    let report = global_report(&db, None).await?;
    for summary in &report.seasons {
        println!("{}", format_season_summary(summary));
    }
    println!("{}", format_grand_totals(&report.grand_totals));

    println!("Owner balances (all seasons)");
    for balance in get_owner_balances(&db, None, &settings.balances).await? {
        println!(
            "  {:<24} seats {:>3}  balance {}",
            balance.name,
            balance.seats_owned,
            format_currency(balance.balance)
        );
    }

    // 6. Refresh seat value predictions for the latest season
    if let Some(latest) = report.seasons.iter().max_by_key(|s| (s.season_year, s.season_id)) {
        let predictions = get_season_predictions(&db, latest.season_id, &settings).await?;
        info!(
            season_id = latest.season_id,
            predictions = predictions.len(),
            "Seat value predictions ready"
        );
    }

    Ok(())
}
