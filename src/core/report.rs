//! Season and multi-season financial reporting.
//!
//! Season figures use game costs only. Grand totals add one-time license costs
//! on top, so the two cost figures differ by exactly the license costs of the
//! owned seats. Both are shown side by side and must not be merged.

use crate::{
    core::{
        balance::{seat_totals, unique_seats_by_owner},
        ledger::{LedgerSnapshot, PaymentType},
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;
use tracing::{debug, warn};

/// Sales, costs, and profit of one owner within one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSeasonDetail {
    /// Owner id
    pub owner_id: i64,
    /// Owner display name
    pub name: String,
    /// Distinct seats held this season
    pub seats_owned: usize,
    /// Realized sales this season
    pub sales: f64,
    /// Game costs this season
    pub costs: f64,
    /// `sales - costs`
    pub profit: f64,
}

/// Financial summary of one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    /// Season id
    pub season_id: i64,
    /// Season year
    pub season_year: i32,
    /// Team id
    pub team_id: i64,
    /// Team display name
    pub team_name: String,
    /// Sum of owner sales
    pub total_sales: f64,
    /// Sum of owner game costs (license costs excluded)
    pub total_costs: f64,
    /// `total_sales - total_costs`
    pub total_profit: f64,
    /// Per-owner breakdown, ordered by owner name
    pub owner_details: Vec<OwnerSeasonDetail>,
}

/// Totals across all reported seasons.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrandTotals {
    /// Number of seasons summed
    pub season_count: usize,
    /// Sales across seasons
    pub total_sales: f64,
    /// Game costs across seasons
    pub total_game_costs: f64,
    /// One-time license costs of owned seats, once per seat
    pub total_license_costs: f64,
    /// `total_game_costs + total_license_costs`
    pub total_costs: f64,
    /// `total_sales - total_costs`
    pub total_profit: f64,
    /// All `from_owner` payments, one-time categories included
    pub payments_from_owners: f64,
    /// All `to_owner` payments
    pub payments_to_owners: f64,
    /// All `to_team` payments
    pub payments_to_team: f64,
    /// All `from_team` payments
    pub payments_from_team: f64,
    /// `total_costs - payments_to_team + payments_from_team`
    pub amount_owed_to_team: f64,
}

/// Season summaries together with their grand totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiSeasonReport {
    /// Per-season summaries in chronological order
    pub seasons: Vec<SeasonSummary>,
    /// Totals across those seasons
    pub grand_totals: GrandTotals,
}

/// Summarizes every season, optionally restricted to one team.
///
/// Seasons whose team is missing are logged and skipped.
#[must_use]
pub fn summarize_seasons(snapshot: &LedgerSnapshot, team_id: Option<i64>) -> Vec<SeasonSummary> {
    snapshot
        .seasons_for_team(team_id)
        .into_iter()
        .filter_map(|season| {
            let Some(team) = snapshot.teams.get(&season.team_id) else {
                warn!(
                    season_id = season.id,
                    team_id = season.team_id,
                    "Skipping season with unknown team"
                );
                return None;
            };

            let owner_seats = unique_seats_by_owner(snapshot, Some(season.id));
            let totals = seat_totals(snapshot, Some(season.id));

            let mut owner_details: Vec<OwnerSeasonDetail> = owner_seats
                .iter()
                .filter_map(|(owner_id, seats)| {
                    let owner = snapshot.owners.get(owner_id)?;
                    let (sales, costs) = seats.keys().fold((0.0, 0.0), |(sales, costs), seat| {
                        let seat = totals.get(seat).copied().unwrap_or_default();
                        (sales + seat.sales, costs + seat.costs)
                    });
                    Some(OwnerSeasonDetail {
                        owner_id: *owner_id,
                        name: owner.name.clone(),
                        seats_owned: seats.len(),
                        sales,
                        costs,
                        profit: sales - costs,
                    })
                })
                .collect();
            owner_details.sort_by(|a, b| a.name.cmp(&b.name).then(a.owner_id.cmp(&b.owner_id)));

            let total_sales: f64 = owner_details.iter().map(|d| d.sales).sum();
            let total_costs: f64 = owner_details.iter().map(|d| d.costs).sum();

            Some(SeasonSummary {
                season_id: season.id,
                season_year: season.year,
                team_id: team.id,
                team_name: team.name.clone(),
                total_sales,
                total_costs,
                total_profit: total_sales - total_costs,
                owner_details,
            })
        })
        .collect()
}

/// License costs of every distinct seat owned in the given seasons.
fn owned_license_costs(snapshot: &LedgerSnapshot, season_ids: &[i64]) -> f64 {
    let mut seats: BTreeMap<i64, f64> = BTreeMap::new();
    for season_id in season_ids {
        for owned in unique_seats_by_owner(snapshot, Some(*season_id)).into_values() {
            for (seat_id, license_cost) in owned {
                seats.entry(seat_id).or_insert(license_cost);
            }
        }
    }
    seats.values().sum()
}

/// Sums season summaries and adds license costs and payments pulled from the ledger.
///
/// With a team filter, a payment is included when it names the team or is
/// booked against one of the team's seasons.
#[must_use]
pub fn grand_totals(
    snapshot: &LedgerSnapshot,
    team_id: Option<i64>,
    seasons: &[SeasonSummary],
) -> GrandTotals {
    let season_ids: Vec<i64> = seasons.iter().map(|s| s.season_id).collect();
    let team_seasons: HashSet<i64> = season_ids.iter().copied().collect();

    let mut totals = GrandTotals {
        season_count: seasons.len(),
        total_sales: seasons.iter().map(|s| s.total_sales).sum(),
        total_game_costs: seasons.iter().map(|s| s.total_costs).sum(),
        total_license_costs: owned_license_costs(snapshot, &season_ids),
        ..GrandTotals::default()
    };

    for payment in &snapshot.payments {
        let in_scope = team_id.is_none_or(|team| {
            payment.team_id == Some(team)
                || payment.season_id.is_some_and(|s| team_seasons.contains(&s))
        });
        if !in_scope {
            continue;
        }
        match payment.payment_type {
            PaymentType::FromOwner => totals.payments_from_owners += payment.amount,
            PaymentType::ToOwner => totals.payments_to_owners += payment.amount,
            PaymentType::ToTeam => totals.payments_to_team += payment.amount,
            PaymentType::FromTeam => totals.payments_from_team += payment.amount,
        }
    }

    totals.total_costs = totals.total_game_costs + totals.total_license_costs;
    totals.total_profit = totals.total_sales - totals.total_costs;
    totals.amount_owed_to_team =
        totals.total_costs - totals.payments_to_team + totals.payments_from_team;
    totals
}

/// Builds the full multi-season report from a snapshot.
#[must_use]
pub fn build_report(snapshot: &LedgerSnapshot, team_id: Option<i64>) -> MultiSeasonReport {
    let seasons = summarize_seasons(snapshot, team_id);
    let grand_totals = grand_totals(snapshot, team_id, &seasons);
    MultiSeasonReport {
        seasons,
        grand_totals,
    }
}

/// Loads the ledger and summarizes each season, optionally for one team.
pub async fn season_summary(
    db: &DatabaseConnection,
    team_id: Option<i64>,
) -> Result<Vec<SeasonSummary>> {
    Ok(global_report(db, team_id).await?.seasons)
}

/// Loads the ledger and builds season summaries plus grand totals.
///
/// # Errors
/// Returns `TeamNotFound` for an unknown team, or an error for malformed ledger rows.
pub async fn global_report(
    db: &DatabaseConnection,
    team_id: Option<i64>,
) -> Result<MultiSeasonReport> {
    let snapshot = LedgerSnapshot::load(db).await?;
    if let Some(team_id) = team_id {
        if !snapshot.teams.contains_key(&team_id) {
            return Err(Error::TeamNotFound { team_id });
        }
    }
    let report = build_report(&snapshot, team_id);
    debug!(seasons = report.seasons.len(), ?team_id, "Built season report");
    Ok(report)
}

/// Formats an amount as dollars with thousands separators, e.g. `-$1,234.50`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

/// Renders a season summary as text, one line per owner.
#[must_use]
pub fn format_season_summary(summary: &SeasonSummary) -> String {
    let mut text = format!(
        "{} {} | Sales {} | Costs {} | Profit {}\n",
        summary.team_name,
        summary.season_year,
        format_currency(summary.total_sales),
        format_currency(summary.total_costs),
        format_currency(summary.total_profit),
    );
    for owner in &summary.owner_details {
        // Writing into a String cannot fail
        let _ = writeln!(
            text,
            "  {} ({} seats) | Sales {} | Costs {} | Profit {}",
            owner.name,
            owner.seats_owned,
            format_currency(owner.sales),
            format_currency(owner.costs),
            format_currency(owner.profit),
        );
    }
    text
}

/// Renders grand totals as text.
#[must_use]
pub fn format_grand_totals(totals: &GrandTotals) -> String {
    let mut text = format!("Grand totals across {} seasons\n", totals.season_count);
    let lines = [
        ("Sales", totals.total_sales),
        ("Game costs", totals.total_game_costs),
        ("License costs", totals.total_license_costs),
        ("Total costs", totals.total_costs),
        ("Profit", totals.total_profit),
        ("Paid by owners", totals.payments_from_owners),
        ("Paid to owners", totals.payments_to_owners),
        ("Paid to team", totals.payments_to_team),
        ("Received from team", totals.payments_from_team),
        ("Owed to team", totals.amount_owed_to_team),
    ];
    for (label, amount) in lines {
        let _ = writeln!(text, "  {label:<20}{:>16}", format_currency(amount));
    }
    text
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    /// One game, one seat (cost 100, sold 150, license 1000), owned by one owner.
    fn single_game_fixture() -> LedgerFixture {
        LedgerFixture::default()
            .team(1, "Harbor City FC")
            .season(10, 1, 2024)
            .game(100, 10, "Rivals", "2024-04-01")
            .seat(1000, 1, "101", "5", Some(1000.0))
            .owner(7, "Owner A")
            .ownership(1000, 10, 7)
            .pricing(100, 1000, 100.0, Some(150.0))
    }

    #[test]
    fn test_single_game_season_and_grand_totals() {
        let report = build_report(&single_game_fixture().snapshot(), None);

        assert_eq!(report.seasons.len(), 1);
        let season = &report.seasons[0];
        assert_eq!(season.season_year, 2024);
        assert_eq!(season.team_name, "Harbor City FC");
        assert_eq!(season.total_sales, 150.0);
        assert_eq!(season.total_costs, 100.0);
        assert_eq!(season.total_profit, 50.0);
        assert_eq!(season.owner_details.len(), 1);
        assert_eq!(season.owner_details[0].profit, 50.0);

        let totals = &report.grand_totals;
        assert_eq!(totals.total_costs, 1100.0);
        assert_eq!(totals.total_profit, -950.0);
    }

    #[test]
    fn test_grand_total_costs_exceed_season_costs_by_license_costs() {
        let snapshot = single_game_fixture()
            .seat(1001, 1, "101", "6", Some(250.0))
            .owner(8, "Owner B")
            .ownership(1001, 10, 8)
            .ownership(1001, 10, 8)
            .pricing(100, 1001, 40.0, None)
            .snapshot();

        let report = build_report(&snapshot, None);
        let season_costs: f64 = report.seasons.iter().map(|s| s.total_costs).sum();

        assert_eq!(report.grand_totals.total_license_costs, 1250.0);
        assert_eq!(
            report.grand_totals.total_costs - season_costs,
            report.grand_totals.total_license_costs
        );
    }

    #[test]
    fn test_license_counted_once_across_seasons_in_grand_totals() {
        let snapshot = single_game_fixture()
            .season(11, 1, 2025)
            .game(101, 11, "Rivals", "2025-04-01")
            .ownership(1000, 11, 7)
            .pricing(101, 1000, 100.0, Some(120.0))
            .snapshot();

        let report = build_report(&snapshot, None);

        assert_eq!(report.seasons.len(), 2);
        assert_eq!(report.seasons[1].total_sales, 120.0);
        assert_eq!(report.grand_totals.total_game_costs, 200.0);
        assert_eq!(report.grand_totals.total_license_costs, 1000.0);
        assert_eq!(report.grand_totals.total_sales, 270.0);
    }

    #[test]
    fn test_grand_totals_include_all_payment_types() {
        let snapshot = single_game_fixture()
            .payment(Some(7), Some(10), 1000.0, "from_owner", "seat_license")
            .payment(Some(7), Some(10), 200.0, "from_owner", "installment")
            .payment(Some(7), Some(10), 50.0, "to_owner", "payout")
            .team_payment(1, Some(10), 800.0, "to_team", "tickets")
            .team_payment(1, None, 30.0, "from_team", "credit")
            .snapshot();

        let totals = build_report(&snapshot, Some(1)).grand_totals;

        assert_eq!(totals.payments_from_owners, 1200.0);
        assert_eq!(totals.payments_to_owners, 50.0);
        assert_eq!(totals.payments_to_team, 800.0);
        assert_eq!(totals.payments_from_team, 30.0);
        assert_eq!(totals.amount_owed_to_team, 1100.0 - 800.0 + 30.0);
    }

    #[test]
    fn test_team_filter() {
        let snapshot = single_game_fixture()
            .team(2, "Valley Rovers")
            .season(20, 2, 2024)
            .game(200, 20, "Harbor City FC", "2024-05-01")
            .seat(2000, 2, "A", "1", Some(300.0))
            .ownership(2000, 20, 7)
            .pricing(200, 2000, 10.0, Some(15.0))
            .snapshot();

        let all = build_report(&snapshot, None);
        assert_eq!(all.seasons.len(), 2);

        let rovers = build_report(&snapshot, Some(2));
        assert_eq!(rovers.seasons.len(), 1);
        assert_eq!(rovers.seasons[0].team_name, "Valley Rovers");
        assert_eq!(rovers.grand_totals.total_license_costs, 300.0);
        assert_eq!(rovers.grand_totals.total_sales, 15.0);
    }

    #[test]
    fn test_season_with_unknown_team_is_skipped() {
        let snapshot = single_game_fixture().season(30, 99, 2024).snapshot();
        let summaries = summarize_seasons(&snapshot, None);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].season_id, 10);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(150.0), "$150.00");
        assert_eq!(format_currency(1234.5), "$1,234.50");
        assert_eq!(format_currency(-950.0), "-$950.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn test_format_season_summary() {
        let report = build_report(&single_game_fixture().snapshot(), None);
        let text = format_season_summary(&report.seasons[0]);

        assert!(text.contains("Harbor City FC 2024"));
        assert!(text.contains("Profit $50.00"));
        assert!(text.contains("Owner A (1 seats)"));

        let totals = format_grand_totals(&report.grand_totals);
        assert!(totals.contains("Grand totals across 1 seasons"));
        assert!(totals.contains("-$950.00"));
    }

    #[tokio::test]
    async fn test_global_report_integration() -> Result<()> {
        let db = setup_test_db().await?;
        single_game_fixture().insert(&db).await?;

        let report = global_report(&db, Some(1)).await?;
        assert_eq!(report.seasons.len(), 1);
        assert_eq!(report.grand_totals.total_profit, -950.0);

        let summaries = season_summary(&db, None).await?;
        assert_eq!(summaries[0].total_profit, 50.0);

        let missing = global_report(&db, Some(77)).await;
        assert!(matches!(missing, Err(Error::TeamNotFound { team_id: 77 })));

        Ok(())
    }
}
