//! Owner balance aggregation.
//!
//! Turns ownership, pricing, and payment rows into one net position per owner.
//! Seats are deduplicated per owner before anything is summed: a seat held in
//! two seasons (or entered twice for one season) counts once toward
//! `seats_owned`, once toward its game totals, and once toward its one-time
//! license cost.
//!
//! `to_team`/`from_team` payments never touch an individual owner's balance.

use crate::{
    config::settings::BalanceSettings,
    core::ledger::{LedgerSnapshot, PaymentType},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Net financial position of one owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerBalance {
    /// Owner id
    pub owner_id: i64,
    /// Owner display name
    pub name: String,
    /// Distinct seats held in scope
    pub seats_owned: usize,
    /// Realized sales across the owner's seats
    pub sales_total: f64,
    /// Game costs across the owner's seats
    pub costs_total: f64,
    /// One-time license costs, once per distinct seat
    pub license_costs_total: f64,
    /// Recurring payments received from the owner
    pub payments_from_owner: f64,
    /// Payments made to the owner
    pub payments_to_owner: f64,
    /// `(sales + payments_from_owner) - (costs + licenses + payments_to_owner)`
    pub balance: f64,
}

/// Scope and rules for a balance computation.
#[derive(Debug, Clone, Copy)]
pub struct BalanceOptions<'a> {
    /// Restrict to one season; `None` computes lifetime balances
    pub season_id: Option<i64>,
    /// Payment exclusion and owner retention rules
    pub settings: &'a BalanceSettings,
}

/// Sales and cost totals for one seat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeatTotals {
    /// Sum of sale prices, unsold read as zero
    pub sales: f64,
    /// Sum of game costs
    pub costs: f64,
}

/// Distinct seats per owner, keyed by seat id, holding the first-seen license cost.
pub type OwnerSeats = BTreeMap<i64, BTreeMap<i64, f64>>;

/// Builds the owner → distinct seat map from ownership rows.
///
/// Rows pointing at a missing seat or owner are logged and skipped. When
/// `season_id` is set only that season's rows are considered.
#[must_use]
pub fn unique_seats_by_owner(snapshot: &LedgerSnapshot, season_id: Option<i64>) -> OwnerSeats {
    let mut owner_seats = OwnerSeats::new();

    for row in &snapshot.ownerships {
        if season_id.is_some_and(|season| row.season_id != season) {
            continue;
        }
        let Some(seat) = snapshot.seats.get(&row.seat_id) else {
            warn!(
                ownership_id = row.id,
                seat_id = row.seat_id,
                "Skipping ownership row with unknown seat"
            );
            continue;
        };
        if !snapshot.owners.contains_key(&row.owner_id) {
            warn!(
                ownership_id = row.id,
                owner_id = row.owner_id,
                "Skipping ownership row with unknown owner"
            );
            continue;
        }

        owner_seats
            .entry(row.owner_id)
            .or_default()
            .entry(seat.id)
            .or_insert_with(|| seat.license_cost_or_zero());
    }

    owner_seats
}

/// Sums sales and costs per seat, optionally restricted to one season's games.
///
/// Pricing rows for games that do not exist are logged and skipped. Lifetime
/// totals are keyed by seat only, so a seat held by different owners in
/// different seasons contributes its full totals to each of them.
#[must_use]
pub fn seat_totals(snapshot: &LedgerSnapshot, season_id: Option<i64>) -> HashMap<i64, SeatTotals> {
    let season_games: Option<HashSet<i64>> =
        season_id.map(|season| snapshot.game_ids_for_season(season));
    let mut totals: HashMap<i64, SeatTotals> = HashMap::new();

    for row in &snapshot.pricing {
        match &season_games {
            Some(games) if !games.contains(&row.game_id) => continue,
            None if !snapshot.games.contains_key(&row.game_id) => {
                warn!(
                    pricing_id = row.id,
                    game_id = row.game_id,
                    "Skipping pricing row with unknown game"
                );
                continue;
            }
            _ => {}
        }
        let entry = totals.entry(row.seat_id).or_default();
        entry.sales += row.sold_or_zero();
        entry.costs += row.cost;
    }

    totals
}

#[derive(Debug, Default)]
struct PaymentTotals {
    from_owner: f64,
    to_owner: f64,
}

fn payment_totals_by_owner(
    snapshot: &LedgerSnapshot,
    options: &BalanceOptions<'_>,
) -> BTreeMap<i64, PaymentTotals> {
    let mut totals: BTreeMap<i64, PaymentTotals> = BTreeMap::new();

    for payment in &snapshot.payments {
        let Some(owner_id) = payment.owner_id else {
            continue;
        };
        if options
            .season_id
            .is_some_and(|season| payment.season_id != Some(season))
        {
            continue;
        }
        if !snapshot.owners.contains_key(&owner_id) {
            warn!(
                payment_id = payment.id,
                owner_id, "Skipping payment with unknown owner"
            );
            continue;
        }

        match payment.payment_type {
            PaymentType::FromOwner => {
                if options
                    .settings
                    .excludes_payment(&payment.category, payment.amount)
                {
                    debug!(
                        payment_id = payment.id,
                        "Excluding one-time payment from recurring balance"
                    );
                    continue;
                }
                totals.entry(owner_id).or_default().from_owner += payment.amount;
            }
            PaymentType::ToOwner => {
                totals.entry(owner_id).or_default().to_owner += payment.amount;
            }
            PaymentType::ToTeam | PaymentType::FromTeam => {}
        }
    }

    totals
}

/// Computes one balance per owner from a ledger snapshot.
///
/// Season-scoped results only contain owners holding at least one seat that
/// season. Lifetime results additionally contain owners with payment history
/// but no seats when `include_payment_only_owners` is set. Results are ordered
/// by owner name, then id.
#[must_use]
pub fn aggregate_owner_balances(
    snapshot: &LedgerSnapshot,
    options: &BalanceOptions<'_>,
) -> Vec<OwnerBalance> {
    let owner_seats = unique_seats_by_owner(snapshot, options.season_id);
    let totals = seat_totals(snapshot, options.season_id);
    let payments = payment_totals_by_owner(snapshot, options);

    let mut owner_ids: Vec<i64> = owner_seats.keys().copied().collect();
    if options.season_id.is_none() && options.settings.include_payment_only_owners {
        owner_ids.extend(payments.keys().filter(|id| !owner_seats.contains_key(*id)));
    }

    let mut balances: Vec<OwnerBalance> = owner_ids
        .into_iter()
        .filter_map(|owner_id| {
            let owner = snapshot.owners.get(&owner_id)?;
            let seats = owner_seats.get(&owner_id);

            let mut sales_total = 0.0;
            let mut costs_total = 0.0;
            let mut license_costs_total = 0.0;
            for (seat_id, license_cost) in seats.into_iter().flatten() {
                let seat = totals.get(seat_id).copied().unwrap_or_default();
                sales_total += seat.sales;
                costs_total += seat.costs;
                license_costs_total += license_cost;
            }

            let paid = payments.get(&owner_id);
            let payments_from_owner = paid.map_or(0.0, |p| p.from_owner);
            let payments_to_owner = paid.map_or(0.0, |p| p.to_owner);

            Some(OwnerBalance {
                owner_id,
                name: owner.name.clone(),
                seats_owned: seats.map_or(0, BTreeMap::len),
                sales_total,
                costs_total,
                license_costs_total,
                payments_from_owner,
                payments_to_owner,
                balance: (sales_total + payments_from_owner)
                    - (costs_total + license_costs_total + payments_to_owner),
            })
        })
        .collect();

    balances.sort_by(|a, b| a.name.cmp(&b.name).then(a.owner_id.cmp(&b.owner_id)));
    balances
}

/// Loads the ledger and computes owner balances, lifetime or for one season.
///
/// # Errors
/// Returns `SeasonNotFound` for an unknown season, or an error for malformed ledger rows.
pub async fn get_owner_balances(
    db: &DatabaseConnection,
    season_id: Option<i64>,
    settings: &BalanceSettings,
) -> Result<Vec<OwnerBalance>> {
    let snapshot = LedgerSnapshot::load(db).await?;
    if let Some(season_id) = season_id {
        if !snapshot.seasons.contains_key(&season_id) {
            return Err(Error::SeasonNotFound { season_id });
        }
    }

    let balances = aggregate_owner_balances(
        &snapshot,
        &BalanceOptions {
            season_id,
            settings,
        },
    );
    debug!(count = balances.len(), ?season_id, "Computed owner balances");
    Ok(balances)
}

/// Computes the balance of a single owner, if the owner is in scope.
pub async fn get_owner_balance(
    db: &DatabaseConnection,
    owner_id: i64,
    season_id: Option<i64>,
    settings: &BalanceSettings,
) -> Result<Option<OwnerBalance>> {
    Ok(get_owner_balances(db, season_id, settings)
        .await?
        .into_iter()
        .find(|balance| balance.owner_id == owner_id))
}
