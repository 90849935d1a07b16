//! Ledger reader - read-only access to the bookkeeping tables.
//!
//! The aggregators never query the database row by row. They work on a
//! [`LedgerSnapshot`] loaded up front, which keeps every computation a pure
//! function of its inputs and makes the dedup-sensitive logic testable
//! without a database.

use crate::{
    entities::{
        Attendance, Game, GamePricing, Owner, Payment, Season, Seat, SeatOwnership, Team, game,
        game_pricing, owner, payment, season, seat, seat_ownership, team,
    },
    errors::{Error, Result, ensure_finite},
};
use sea_orm::{QueryOrder, prelude::*};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Direction of a payment relative to the managing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Money received from an owner (inflow)
    FromOwner,
    /// Money paid out to an owner (outflow)
    ToOwner,
    /// Money paid to the team (outflow)
    ToTeam,
    /// Money received from the team (inflow)
    FromTeam,
}

impl PaymentType {
    /// The string stored in the `payment_type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FromOwner => "from_owner",
            Self::ToOwner => "to_owner",
            Self::ToTeam => "to_team",
            Self::FromTeam => "from_team",
        }
    }

    /// Whether money flows into the managing entity.
    #[must_use]
    pub const fn is_inflow(self) -> bool {
        matches!(self, Self::FromOwner | Self::FromTeam)
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "from_owner" => Ok(Self::FromOwner),
            "to_owner" => Ok(Self::ToOwner),
            "to_team" => Ok(Self::ToTeam),
            "from_team" => Ok(Self::FromTeam),
            other => Err(Error::InvalidPaymentType {
                value: other.to_string(),
            }),
        }
    }
}

/// A payment row with its type parsed and amount validated.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerPayment {
    /// Source row id
    pub id: i64,
    /// Owner involved, if any
    pub owner_id: Option<i64>,
    /// Team involved, if any
    pub team_id: Option<i64>,
    /// Season booked against, if any
    pub season_id: Option<i64>,
    /// Amount moved
    pub amount: f64,
    /// Parsed direction
    pub payment_type: PaymentType,
    /// Free-text category
    pub category: String,
}

impl TryFrom<payment::Model> for LedgerPayment {
    type Error = Error;

    fn try_from(row: payment::Model) -> Result<Self> {
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            team_id: row.team_id,
            season_id: row.season_id,
            amount: ensure_finite("payments.amount", row.amount)?,
            payment_type: row.payment_type.parse()?,
            category: row.category,
        })
    }
}

/// Every ledger row needed by the aggregators, with lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Teams by id
    pub teams: HashMap<i64, team::Model>,
    /// Seasons by id
    pub seasons: HashMap<i64, season::Model>,
    /// Games by id
    pub games: HashMap<i64, game::Model>,
    /// Seats by id
    pub seats: HashMap<i64, seat::Model>,
    /// Owners by id
    pub owners: HashMap<i64, owner::Model>,
    /// Ownership rows in id order
    pub ownerships: Vec<seat_ownership::Model>,
    /// Pricing rows in id order
    pub pricing: Vec<game_pricing::Model>,
    /// Validated payments in id order
    pub payments: Vec<LedgerPayment>,
}

impl LedgerSnapshot {
    /// Loads the full ledger.
    ///
    /// Non-finite amounts and unknown payment types fail the load, since those
    /// are malformed input rather than sparse data.
    pub async fn load(db: &DatabaseConnection) -> Result<Self> {
        let teams = Team::find().all(db).await?;
        let seasons = Season::find().all(db).await?;
        let games = Game::find().all(db).await?;
        let seats = Seat::find().all(db).await?;
        let owners = Owner::find().all(db).await?;
        let ownerships = list_ownerships(db, None).await?;
        let pricing = list_game_pricing(db, &PricingFilter::default()).await?;
        let payments = list_payments(db, &PaymentFilter::default()).await?;

        Self::from_rows(
            teams, seasons, games, seats, owners, ownerships, pricing, payments,
        )
    }

    /// Builds a snapshot from already-loaded rows.
    #[allow(clippy::too_many_arguments)]
    pub fn from_rows(
        teams: Vec<team::Model>,
        seasons: Vec<season::Model>,
        games: Vec<game::Model>,
        seats: Vec<seat::Model>,
        owners: Vec<owner::Model>,
        ownerships: Vec<seat_ownership::Model>,
        pricing: Vec<game_pricing::Model>,
        payments: Vec<payment::Model>,
    ) -> Result<Self> {
        for seat in &seats {
            if let Some(cost) = seat.license_cost {
                ensure_finite("seats.license_cost", cost)?;
            }
        }
        for row in &pricing {
            ensure_finite("game_pricing.cost", row.cost)?;
            if let Some(price) = row.sold_price {
                ensure_finite("game_pricing.sold_price", price)?;
            }
        }
        let payments = payments
            .into_iter()
            .map(LedgerPayment::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            teams: teams.into_iter().map(|t| (t.id, t)).collect(),
            seasons: seasons.into_iter().map(|s| (s.id, s)).collect(),
            games: games.into_iter().map(|g| (g.id, g)).collect(),
            seats: seats.into_iter().map(|s| (s.id, s)).collect(),
            owners: owners.into_iter().map(|o| (o.id, o)).collect(),
            ownerships,
            pricing,
            payments,
        })
    }

    /// Ids of the games played in a season.
    #[must_use]
    pub fn game_ids_for_season(&self, season_id: i64) -> HashSet<i64> {
        self.games
            .values()
            .filter(|g| g.season_id == season_id)
            .map(|g| g.id)
            .collect()
    }

    /// Seasons in chronological order, optionally restricted to one team.
    #[must_use]
    pub fn seasons_for_team(&self, team_id: Option<i64>) -> Vec<&season::Model> {
        let mut seasons: Vec<&season::Model> = self
            .seasons
            .values()
            .filter(|s| team_id.is_none_or(|t| s.team_id == t))
            .collect();
        seasons.sort_by_key(|s| (s.year, s.id));
        seasons
    }
}

/// Lists ownership rows, optionally restricted to one season.
pub async fn list_ownerships(
    db: &DatabaseConnection,
    season_id: Option<i64>,
) -> Result<Vec<seat_ownership::Model>> {
    let mut query = SeatOwnership::find().order_by_asc(seat_ownership::Column::Id);
    if let Some(season_id) = season_id {
        query = query.filter(seat_ownership::Column::SeasonId.eq(season_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Filter for [`list_game_pricing`]. Empty filter lists mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct PricingFilter {
    /// Restrict to these games
    pub game_ids: Vec<i64>,
    /// Restrict to these seats
    pub seat_ids: Vec<i64>,
}

/// Lists game pricing rows matching the filter.
pub async fn list_game_pricing(
    db: &DatabaseConnection,
    filter: &PricingFilter,
) -> Result<Vec<game_pricing::Model>> {
    let mut query = GamePricing::find().order_by_asc(game_pricing::Column::Id);
    if !filter.game_ids.is_empty() {
        query = query.filter(game_pricing::Column::GameId.is_in(filter.game_ids.clone()));
    }
    if !filter.seat_ids.is_empty() {
        query = query.filter(game_pricing::Column::SeatId.is_in(filter.seat_ids.clone()));
    }
    query.all(db).await.map_err(Into::into)
}

/// Filter for [`list_payments`].
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Restrict to one owner
    pub owner_id: Option<i64>,
    /// Restrict to one season
    pub season_id: Option<i64>,
    /// Restrict to one team
    pub team_id: Option<i64>,
}

/// Lists raw payment rows matching the filter.
pub async fn list_payments(
    db: &DatabaseConnection,
    filter: &PaymentFilter,
) -> Result<Vec<payment::Model>> {
    let mut query = Payment::find().order_by_asc(payment::Column::Id);
    if let Some(owner_id) = filter.owner_id {
        query = query.filter(payment::Column::OwnerId.eq(owner_id));
    }
    if let Some(season_id) = filter.season_id {
        query = query.filter(payment::Column::SeasonId.eq(season_id));
    }
    if let Some(team_id) = filter.team_id {
        query = query.filter(payment::Column::TeamId.eq(team_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Lists games, optionally restricted to one season, ordered by date.
pub async fn list_games(db: &DatabaseConnection, season_id: Option<i64>) -> Result<Vec<game::Model>> {
    let mut query = Game::find()
        .order_by_asc(game::Column::Date)
        .order_by_asc(game::Column::Id);
    if let Some(season_id) = season_id {
        query = query.filter(game::Column::SeasonId.eq(season_id));
    }
    query.all(db).await.map_err(Into::into)
}

/// Lists every game played in any season of a team.
pub async fn list_team_games(db: &DatabaseConnection, team_id: i64) -> Result<Vec<game::Model>> {
    let season_ids: Vec<i64> = Season::find()
        .filter(season::Column::TeamId.eq(team_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    if season_ids.is_empty() {
        return Ok(Vec::new());
    }
    Game::find()
        .filter(game::Column::SeasonId.is_in(season_ids))
        .order_by_asc(game::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts attendance records per game. Games without records are absent from the map.
pub async fn count_attendance_by_game(
    db: &DatabaseConnection,
    game_ids: &[i64],
) -> Result<HashMap<i64, u64>> {
    if game_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Attendance::find()
        .filter(crate::entities::attendance::Column::GameId.is_in(game_ids.to_vec()))
        .all(db)
        .await?;

    let mut counts = HashMap::new();
    for row in rows {
        *counts.entry(row.game_id).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Lists the seats in a team's venue.
pub async fn list_team_seats(db: &DatabaseConnection, team_id: i64) -> Result<Vec<seat::Model>> {
    Seat::find()
        .filter(seat::Column::TeamId.eq(team_id))
        .order_by_asc(seat::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up a season, failing if it does not exist.
pub async fn require_season(db: &DatabaseConnection, season_id: i64) -> Result<season::Model> {
    Season::find_by_id(season_id)
        .one(db)
        .await?
        .ok_or(Error::SeasonNotFound { season_id })
}

/// Looks up a team, failing if it does not exist.
pub async fn require_team(db: &DatabaseConnection, team_id: i64) -> Result<team::Model> {
    Team::find_by_id(team_id)
        .one(db)
        .await?
        .ok_or(Error::TeamNotFound { team_id })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_payment_type_parsing() {
        assert_eq!("from_owner".parse::<PaymentType>().unwrap(), PaymentType::FromOwner);
        assert_eq!(" to_team ".parse::<PaymentType>().unwrap(), PaymentType::ToTeam);
        assert!(PaymentType::FromTeam.is_inflow());
        assert!(!PaymentType::ToOwner.is_inflow());
        assert!(matches!(
            "refund".parse::<PaymentType>(),
            Err(Error::InvalidPaymentType { value }) if value == "refund"
        ));
    }

    #[test]
    fn test_snapshot_rejects_non_finite_amounts() {
        let bad_payment = payment::Model {
            id: 1,
            owner_id: Some(1),
            team_id: None,
            season_id: None,
            amount: f64::NAN,
            payment_type: "from_owner".to_string(),
            category: "general".to_string(),
            description: None,
        };
        let result = LedgerSnapshot::from_rows(
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![bad_payment],
        );
        assert!(matches!(
            result,
            Err(Error::InvalidAmount { field: "payments.amount", .. })
        ));
    }

    #[tokio::test]
    async fn test_filtered_reads() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Harbor City FC").await?;
        let season_a = create_test_season(&db, team.id, 2023).await?;
        let season_b = create_test_season(&db, team.id, 2024).await?;
        let game_a = create_test_game(&db, season_a.id, "Rivals", "2023-05-01").await?;
        let game_b = create_test_game(&db, season_b.id, "Rivals", "2024-05-01").await?;
        let seat = create_test_seat(&db, team.id, "101", "1", Some(500.0)).await?;
        let owner = create_test_owner(&db, "Avery").await?;
        create_test_ownership(&db, seat.id, season_a.id, owner.id).await?;
        create_test_ownership(&db, seat.id, season_b.id, owner.id).await?;
        create_test_pricing(&db, game_a.id, seat.id, 50.0, Some(80.0)).await?;
        create_test_pricing(&db, game_b.id, seat.id, 55.0, None).await?;
        create_attendance(&db, game_a.id, 4).await?;

        assert_eq!(list_ownerships(&db, Some(season_a.id)).await?.len(), 1);
        assert_eq!(list_ownerships(&db, None).await?.len(), 2);
        let pricing = list_game_pricing(
            &db,
            &PricingFilter {
                game_ids: vec![game_b.id],
                seat_ids: vec![],
            },
        )
        .await?;
        assert_eq!(pricing.len(), 1);
        assert_eq!(pricing[0].sold_price, None);
        assert_eq!(list_games(&db, Some(season_b.id)).await?.len(), 1);
        assert_eq!(list_team_games(&db, team.id).await?.len(), 2);

        let counts = count_attendance_by_game(&db, &[game_a.id, game_b.id]).await?;
        assert_eq!(counts.get(&game_a.id), Some(&4));
        assert_eq!(counts.get(&game_b.id), None);

        let snapshot = LedgerSnapshot::load(&db).await?;
        assert_eq!(snapshot.game_ids_for_season(season_a.id).len(), 1);
        assert_eq!(snapshot.seasons_for_team(Some(team.id)).len(), 2);
        assert_eq!(snapshot.seasons_for_team(Some(team.id))[0].year, 2023);

        Ok(())
    }

    #[tokio::test]
    async fn test_require_missing_season() -> Result<()> {
        let db = setup_test_db().await?;
        let result = require_season(&db, 42).await;
        assert!(matches!(result, Err(Error::SeasonNotFound { season_id: 42 })));
        Ok(())
    }
}
