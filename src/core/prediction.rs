//! Seat value prediction.
//!
//! Blends a seat's license cost with similar-seat pricing, its own sales
//! history, and opponent pricing trends, then scales the result by team
//! performance and demand. The confidence score is an additive scorecard of
//! which data sources were available, not a statistical measure.
//!
//! Predictions are cached per `(seat_id, season_id)` until `valid_until`.
//! Reading an expired or missing prediction recomputes the whole season.

use crate::{
    config::settings::Settings,
    core::{
        cache::{CachePolicy, Cached, Expiring},
        ledger::{PricingFilter, list_game_pricing, list_team_games, list_team_seats, require_season},
        performance::{PerformanceProfile, calculate_team_performance},
    },
    entities::{
        SeatValuePrediction, game, game_pricing, seat, seat_value_prediction,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use tracing::{debug, info};

/// Baseline used when a seat has no license cost.
pub const DEFAULT_BASELINE_VALUE: f64 = 100.0;

const CURRENT_PRICING_WEIGHT: f64 = 0.3;
const RECENT_PRICING_WEIGHT: f64 = 0.2;
const MARKET_PRICING_WEIGHT_CAP: f64 = 0.5;
const SIMILAR_SALES_WEIGHT_PER_SEAT: f64 = 0.2;
const SIMILAR_SALES_WEIGHT_CAP: f64 = 0.4;
const OWN_SALES_WEIGHT_PER_SALE: f64 = 0.1;
const OWN_SALES_WEIGHT_CAP: f64 = 0.6;
const OPPONENT_WEIGHT: f64 = 0.15;
const MIN_OPPONENT_GAMES: usize = 2;
const MIN_QUALIFYING_OPPONENTS: usize = 3;

/// A data source that contributed to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionFactor {
    /// The seat's own sales
    SeatHistory,
    /// Pricing of seats in the same section
    SimilarSeats,
    /// Similar-seat costs in the predicted season
    CurrentPricing,
    /// Similar-seat sales inside the recent window
    RecentSales,
    /// Pricing trends across repeat opponents
    OpponentTrends,
    /// A team performance profile backed by games
    TeamPerformance,
    /// Nonzero average attendance
    Attendance,
}

impl PredictionFactor {
    /// Tag stored in `factors_considered`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SeatHistory => "seat_history",
            Self::SimilarSeats => "similar_seats",
            Self::CurrentPricing => "current_pricing",
            Self::RecentSales => "recent_sales",
            Self::OpponentTrends => "opponent_trends",
            Self::TeamPerformance => "team_performance",
            Self::Attendance => "attendance",
        }
    }
}

impl fmt::Display for PredictionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionFactor {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "seat_history" => Ok(Self::SeatHistory),
            "similar_seats" => Ok(Self::SimilarSeats),
            "current_pricing" => Ok(Self::CurrentPricing),
            "recent_sales" => Ok(Self::RecentSales),
            "opponent_trends" => Ok(Self::OpponentTrends),
            "team_performance" => Ok(Self::TeamPerformance),
            "attendance" => Ok(Self::Attendance),
            other => Err(Error::Config {
                message: format!("Unknown prediction factor: {other}"),
            }),
        }
    }
}

/// Pricing history of the seat being valued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeatHistory {
    /// Mean game cost
    pub avg_cost: f64,
    /// Mean realized sale price over actual sales
    pub avg_sold_price: f64,
    /// Highest realized sale price
    pub max_sold_price: f64,
    /// Number of actual sales (`sold_price > 0`)
    pub sales_count: usize,
}

/// Pricing of seats in the same section as the seat being valued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimilarSeatStats {
    /// Similar seats with any pricing data
    pub seat_count: usize,
    /// Mean sale price over all their sales
    pub avg_sold_price: f64,
    /// Mean cost for games in the predicted season
    pub avg_current_cost: f64,
    /// Mean sale price over sales inside the recent window
    pub recent_avg_sold_price: f64,
    /// Sales inside the recent window
    pub recent_sales_count: usize,
    /// All sales across similar seats
    pub sales_count: usize,
}

/// Average sale price for one opponent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpponentPricing {
    /// Opponent name
    pub opponent: String,
    /// Games played against this opponent
    pub games: usize,
    /// Mean sale price across those games
    pub avg_sold_price: f64,
}

/// Opponent pricing across the team's history, repeat opponents only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpponentTrends {
    /// Opponents with enough games and at least one sale, by name
    pub opponents: Vec<OpponentPricing>,
}

impl OpponentTrends {
    /// Number of opponents that qualify.
    #[must_use]
    pub fn qualifying_count(&self) -> usize {
        self.opponents.len()
    }

    /// Mean of the per-opponent averages, zero without opponents.
    #[must_use]
    pub fn average_price(&self) -> f64 {
        mean(self.opponents.iter().map(|o| o.avg_sold_price))
    }
}

/// Everything the valuation model consumes for one seat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionInputs {
    /// The seat's one-time license cost
    pub license_cost: Option<f64>,
    /// The seat's own pricing history
    pub history: SeatHistory,
    /// Similar-seat pricing
    pub similar: SimilarSeatStats,
    /// Opponent trends for the seat's team
    pub opponents: OpponentTrends,
    /// Performance profile of the team-season
    pub performance: PerformanceProfile,
}

/// Output of the valuation model for one seat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valuation {
    /// Blended baseline before multipliers
    pub baseline_value: f64,
    /// `1 + win% * 0.5 + demand * 0.1`
    pub performance_multiplier: f64,
    /// `1 + demand * 0.15 + attendance * 0.01`
    pub demand_multiplier: f64,
    /// `1 + similar sales * 0.02`
    pub similar_seats_multiplier: f64,
    /// Baseline times all multipliers
    pub predicted_value: f64,
    /// Additive confidence scorecard
    pub confidence_score: f64,
    /// Sources that contributed to the score, in tag order
    pub factors: Vec<PredictionFactor>,
}

impl Valuation {
    /// Comma-separated factor tags for storage.
    #[must_use]
    pub fn factor_tags(&self) -> String {
        self.factors
            .iter()
            .map(|factor| factor.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn blend(base: f64, source: f64, weight: f64) -> f64 {
    base.mul_add(1.0 - weight, source * weight)
}

/// Runs the valuation model on prepared inputs.
///
/// Blends are applied in a fixed order, each consuming the previous result:
/// similar-seat market pricing (or plain similar-seat sales when no market
/// pricing exists), then the seat's own sales, then opponent trends.
#[must_use]
pub fn value_seat(inputs: &PredictionInputs, clamp_confidence: bool) -> Valuation {
    let history = &inputs.history;
    let similar = &inputs.similar;
    let performance = &inputs.performance;

    let mut baseline = inputs
        .license_cost
        .filter(|cost| *cost > 0.0)
        .unwrap_or(DEFAULT_BASELINE_VALUE);

    let has_current = similar.avg_current_cost > 0.0;
    let has_recent = similar.recent_sales_count > 0 && similar.recent_avg_sold_price > 0.0;
    if has_current || has_recent {
        let mut weight = 0.0;
        let mut weighted_price = 0.0;
        if has_current {
            weight += CURRENT_PRICING_WEIGHT;
            weighted_price += similar.avg_current_cost * CURRENT_PRICING_WEIGHT;
        }
        if has_recent {
            weight += RECENT_PRICING_WEIGHT;
            weighted_price += similar.recent_avg_sold_price * RECENT_PRICING_WEIGHT;
        }
        baseline = blend(
            baseline,
            weighted_price / weight,
            f64::min(weight, MARKET_PRICING_WEIGHT_CAP),
        );
    } else if similar.sales_count > 0 && similar.avg_sold_price > 0.0 {
        let weight = (similar.seat_count as f64 * SIMILAR_SALES_WEIGHT_PER_SEAT)
            .min(SIMILAR_SALES_WEIGHT_CAP);
        baseline = blend(baseline, similar.avg_sold_price, weight);
    }

    if history.sales_count > 0 {
        let weight =
            (history.sales_count as f64 * OWN_SALES_WEIGHT_PER_SALE).min(OWN_SALES_WEIGHT_CAP);
        baseline = blend(baseline, history.avg_sold_price, weight);
    }

    let has_opponents = inputs.opponents.qualifying_count() >= MIN_QUALIFYING_OPPONENTS;
    if has_opponents {
        baseline = blend(baseline, inputs.opponents.average_price(), OPPONENT_WEIGHT);
    }

    let performance_multiplier =
        1.0 + performance.win_percentage * 0.5 + performance.market_demand * 0.1;
    let demand_multiplier =
        1.0 + performance.market_demand * 0.15 + performance.average_attendance * 0.01;
    let similar_seats_multiplier = 1.0 + similar.sales_count as f64 * 0.02;
    let predicted_value =
        baseline * performance_multiplier * demand_multiplier * similar_seats_multiplier;

    let mut factors = Vec::new();
    let mut confidence_score = 0.0;
    if history.sales_count > 0 {
        confidence_score += (history.sales_count as f64 * 4.0).min(20.0);
        factors.push(PredictionFactor::SeatHistory);
    }
    if similar.seat_count > 0 {
        confidence_score += (similar.seat_count as f64 * 8.0).min(25.0);
        factors.push(PredictionFactor::SimilarSeats);
    }
    if has_current {
        confidence_score += 15.0;
        factors.push(PredictionFactor::CurrentPricing);
    }
    if has_recent {
        confidence_score += 10.0;
        factors.push(PredictionFactor::RecentSales);
    }
    if has_opponents {
        confidence_score += 15.0;
        factors.push(PredictionFactor::OpponentTrends);
    }
    if performance.has_games() {
        confidence_score += 10.0;
        factors.push(PredictionFactor::TeamPerformance);
    }
    if performance.average_attendance > 0.0 {
        confidence_score += 5.0;
        factors.push(PredictionFactor::Attendance);
    }
    if clamp_confidence {
        confidence_score = confidence_score.clamp(0.0, 100.0);
    }

    Valuation {
        baseline_value: baseline,
        performance_multiplier,
        demand_multiplier,
        similar_seats_multiplier,
        predicted_value,
        confidence_score,
        factors,
    }
}

/// Summarizes a seat's own pricing rows.
#[must_use]
pub fn seat_history(seat_id: i64, pricing: &[game_pricing::Model]) -> SeatHistory {
    let rows: Vec<&game_pricing::Model> = pricing.iter().filter(|p| p.seat_id == seat_id).collect();
    let sales: Vec<f64> = rows
        .iter()
        .filter(|p| p.is_sold())
        .map(|p| p.sold_or_zero())
        .collect();

    SeatHistory {
        avg_cost: mean(rows.iter().map(|p| p.cost)),
        avg_sold_price: mean(sales.iter().copied()),
        max_sold_price: sales.iter().copied().fold(0.0, f64::max),
        sales_count: sales.len(),
    }
}

/// Whether `candidate` is comparable to `target`: another seat of the same
/// team in the same section. Adjacent rows of that section are included.
#[must_use]
pub fn is_similar_seat(target: &seat::Model, candidate: &seat::Model) -> bool {
    candidate.id != target.id
        && candidate.team_id == target.team_id
        && candidate.section == target.section
}

/// Summarizes pricing of the seats similar to `target`.
///
/// `current_season_id` selects the games whose costs count as current pricing;
/// sales of games dated inside `recent` count as recent. Games after the end
/// of the window have not been played yet and never count as recent.
#[must_use]
pub fn similar_seat_stats(
    target: &seat::Model,
    team_seats: &[seat::Model],
    pricing: &[game_pricing::Model],
    games: &HashMap<i64, game::Model>,
    current_season_id: i64,
    recent: &RangeInclusive<NaiveDate>,
) -> SimilarSeatStats {
    let similar_ids: HashSet<i64> = team_seats
        .iter()
        .filter(|candidate| is_similar_seat(target, candidate))
        .map(|candidate| candidate.id)
        .collect();

    let mut priced_seats = HashSet::new();
    let mut sales = Vec::new();
    let mut current_costs = Vec::new();
    let mut recent_sales = Vec::new();

    for row in pricing.iter().filter(|p| similar_ids.contains(&p.seat_id)) {
        let Some(game) = games.get(&row.game_id) else {
            continue;
        };
        priced_seats.insert(row.seat_id);
        if game.season_id == current_season_id && row.cost > 0.0 {
            current_costs.push(row.cost);
        }
        if row.is_sold() {
            sales.push(row.sold_or_zero());
            if recent.contains(&game.date) {
                recent_sales.push(row.sold_or_zero());
            }
        }
    }

    SimilarSeatStats {
        seat_count: priced_seats.len(),
        avg_sold_price: mean(sales.iter().copied()),
        avg_current_cost: mean(current_costs.iter().copied()),
        recent_avg_sold_price: mean(recent_sales.iter().copied()),
        recent_sales_count: recent_sales.len(),
        sales_count: sales.len(),
    }
}

/// Average sale price per repeat opponent across a team's games.
///
/// Opponents met fewer than two times, or with no sales, are left out.
#[must_use]
pub fn opponent_trends(team_games: &[game::Model], pricing: &[game_pricing::Model]) -> OpponentTrends {
    let mut games_by_opponent: BTreeMap<&str, HashSet<i64>> = BTreeMap::new();
    for game in team_games {
        games_by_opponent
            .entry(game.opponent.as_str())
            .or_default()
            .insert(game.id);
    }

    let opponents = games_by_opponent
        .into_iter()
        .filter(|(_, games)| games.len() >= MIN_OPPONENT_GAMES)
        .filter_map(|(opponent, games)| {
            let sales: Vec<f64> = pricing
                .iter()
                .filter(|p| games.contains(&p.game_id) && p.is_sold())
                .map(|p| p.sold_or_zero())
                .collect();
            if sales.is_empty() {
                return None;
            }
            Some(OpponentPricing {
                opponent: opponent.to_string(),
                games: games.len(),
                avg_sold_price: mean(sales.into_iter()),
            })
        })
        .collect();

    OpponentTrends { opponents }
}

/// Recomputes predictions for every seat of the season's team.
pub async fn calculate_for_season(
    db: &DatabaseConnection,
    season_id: i64,
    settings: &Settings,
) -> Result<Vec<seat_value_prediction::Model>> {
    calculate_for_season_at(db, season_id, settings, Utc::now()).await
}

/// Recomputes predictions for every seat of the season's team as of `now`,
/// refreshing the team performance profile first. Existing rows are overwritten.
///
/// # Errors
/// Returns `SeasonNotFound`/`TeamNotFound` when the season or its team does not exist.
pub async fn calculate_for_season_at(
    db: &DatabaseConnection,
    season_id: i64,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Vec<seat_value_prediction::Model>> {
    let season = require_season(db, season_id).await?;
    let team_id = season.team_id;

    let performance_row =
        calculate_team_performance(db, team_id, season_id, &settings.performance).await?;
    let performance = PerformanceProfile::from(&performance_row);

    let seats = list_team_seats(db, team_id).await?;
    let team_games = list_team_games(db, team_id).await?;
    let pricing = if team_games.is_empty() {
        Vec::new()
    } else {
        list_game_pricing(
            db,
            &PricingFilter {
                game_ids: team_games.iter().map(|g| g.id).collect(),
                seat_ids: Vec::new(),
            },
        )
        .await?
    };
    let games: HashMap<i64, game::Model> = team_games.iter().map(|g| (g.id, g.clone())).collect();

    let today = now.date_naive();
    let recent_since = TimeDelta::try_days(settings.prediction.recent_sales_days)
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    let recent = recent_since..=today;
    let opponents = opponent_trends(&team_games, &pricing);
    let policy = CachePolicy::days(settings.prediction.validity_days);
    let valid_until = policy.expiry_from(now);

    let valuations: Vec<(i64, Valuation)> = seats
        .iter()
        .map(|seat| {
            let inputs = PredictionInputs {
                license_cost: seat.license_cost,
                history: seat_history(seat.id, &pricing),
                similar: similar_seat_stats(
                    seat,
                    &seats,
                    &pricing,
                    &games,
                    season_id,
                    &recent,
                ),
                opponents: opponents.clone(),
                performance,
            };
            (
                seat.id,
                value_seat(&inputs, settings.prediction.clamp_confidence),
            )
        })
        .collect();

    let txn = db.begin().await?;
    for (seat_id, valuation) in &valuations {
        upsert_prediction(&txn, *seat_id, season_id, valuation, now, valid_until).await?;
    }
    txn.commit().await?;

    info!(
        season_id,
        team_id,
        seats = valuations.len(),
        "Seat value predictions calculated"
    );

    let seat_ids: Vec<i64> = seats.iter().map(|s| s.id).collect();
    SeatValuePrediction::find()
        .filter(seat_value_prediction::Column::SeasonId.eq(season_id))
        .filter(seat_value_prediction::Column::SeatId.is_in(seat_ids))
        .order_by_asc(seat_value_prediction::Column::SeatId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Reads the stored prediction for a seat-season, if any, regardless of expiry.
pub async fn find_prediction<C>(
    db: &C,
    seat_id: i64,
    season_id: i64,
) -> Result<Option<seat_value_prediction::Model>>
where
    C: ConnectionTrait,
{
    SeatValuePrediction::find()
        .filter(seat_value_prediction::Column::SeatId.eq(seat_id))
        .filter(seat_value_prediction::Column::SeasonId.eq(season_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns a valid prediction for a seat-season, recomputing the season when
/// the stored row is missing or expired.
pub async fn get_seat_prediction(
    db: &DatabaseConnection,
    seat_id: i64,
    season_id: i64,
    settings: &Settings,
) -> Result<seat_value_prediction::Model> {
    Ok(get_seat_prediction_at(db, seat_id, season_id, settings, Utc::now())
        .await?
        .value)
}

/// [`get_seat_prediction`] as of `now`, reporting whether the cache was used.
///
/// # Errors
/// Returns `SeatNotFound` when the seat does not belong to the season's team.
pub async fn get_seat_prediction_at(
    db: &DatabaseConnection,
    seat_id: i64,
    season_id: i64,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Cached<seat_value_prediction::Model>> {
    let cached = find_prediction(db, seat_id, season_id).await?;
    let policy = CachePolicy::days(settings.prediction.validity_days);

    let result = policy
        .get_or_recompute(cached, now, move || async move {
            debug!(seat_id, season_id, "Prediction missing or expired, recomputing season");
            calculate_for_season_at(db, season_id, settings, now)
                .await?
                .into_iter()
                .find(|row| row.seat_id == seat_id)
                .ok_or(Error::SeatNotFound { seat_id })
        })
        .await?;
    Ok(result)
}

/// All stored predictions of a season, valid as a whole until the earliest expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonPredictions(pub Vec<seat_value_prediction::Model>);

impl Expiring for SeasonPredictions {
    fn valid_until(&self) -> DateTime<Utc> {
        self.0
            .iter()
            .map(|row| row.valid_until)
            .min()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Returns valid predictions for every seat of the season's team, recomputing
/// the season once if any seat is missing a row or any row has expired.
pub async fn get_season_predictions(
    db: &DatabaseConnection,
    season_id: i64,
    settings: &Settings,
) -> Result<Vec<seat_value_prediction::Model>> {
    Ok(get_season_predictions_at(db, season_id, settings, Utc::now())
        .await?
        .value
        .0)
}

/// [`get_season_predictions`] as of `now`, reporting whether the cache was used.
pub async fn get_season_predictions_at(
    db: &DatabaseConnection,
    season_id: i64,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Cached<SeasonPredictions>> {
    let season = require_season(db, season_id).await?;
    let seat_ids: Vec<i64> = list_team_seats(db, season.team_id)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let stored = SeatValuePrediction::find()
        .filter(seat_value_prediction::Column::SeasonId.eq(season_id))
        .filter(seat_value_prediction::Column::SeatId.is_in(seat_ids.clone()))
        .order_by_asc(seat_value_prediction::Column::SeatId)
        .all(db)
        .await?;
    let cached = (stored.len() == seat_ids.len()).then_some(SeasonPredictions(stored));

    let policy = CachePolicy::days(settings.prediction.validity_days);
    policy
        .get_or_recompute(cached, now, move || async move {
            debug!(season_id, "Season predictions incomplete or expired, recomputing");
            Ok(SeasonPredictions(
                calculate_for_season_at(db, season_id, settings, now).await?,
            ))
        })
        .await
}

async fn upsert_prediction<C>(
    db: &C,
    seat_id: i64,
    season_id: i64,
    valuation: &Valuation,
    now: DateTime<Utc>,
    valid_until: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = seat_value_prediction::ActiveModel {
        seat_id: Set(seat_id),
        season_id: Set(season_id),
        predicted_value: Set(valuation.predicted_value),
        confidence_score: Set(valuation.confidence_score),
        baseline_value: Set(valuation.baseline_value),
        performance_multiplier: Set(valuation.performance_multiplier),
        demand_multiplier: Set(valuation.demand_multiplier),
        similar_seats_multiplier: Set(valuation.similar_seats_multiplier),
        factors_considered: Set(valuation.factor_tags()),
        calculated_at: Set(now),
        valid_until: Set(valid_until),
        ..Default::default()
    };

    SeatValuePrediction::insert(row)
        .on_conflict(
            OnConflict::columns([
                seat_value_prediction::Column::SeatId,
                seat_value_prediction::Column::SeasonId,
            ])
            .update_columns([
                seat_value_prediction::Column::PredictedValue,
                seat_value_prediction::Column::ConfidenceScore,
                seat_value_prediction::Column::BaselineValue,
                seat_value_prediction::Column::PerformanceMultiplier,
                seat_value_prediction::Column::DemandMultiplier,
                seat_value_prediction::Column::SimilarSeatsMultiplier,
                seat_value_prediction::Column::FactorsConsidered,
                seat_value_prediction::Column::CalculatedAt,
                seat_value_prediction::Column::ValidUntil,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
