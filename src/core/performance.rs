//! Team performance calculation.
//!
//! No score data exists in the ledger, so a game counts as a win when its
//! attendance record count exceeds a fixed threshold. Seat valuation depends
//! on the exact shape of this proxy, so it must stay as is.

use crate::{
    config::settings::PerformanceSettings,
    core::ledger::{count_attendance_by_game, list_games, require_season, require_team},
    entities::{TeamPerformance, team_performance},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use serde::Serialize;
use tracing::{debug, info, warn};

const MAX_AVERAGE_ATTENDANCE: f64 = 100_000.0;
const MAX_MARKET_DEMAND: f64 = 10.0;
const MAX_PLAYOFF_PROBABILITY: f64 = 100.0;

/// Derived performance figures for one team-season.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceProfile {
    /// Games classified as wins
    pub wins: i32,
    /// Games classified as losses
    pub losses: i32,
    /// `wins / (wins + losses)`, zero without games
    pub win_percentage: f64,
    /// Attendance records per game, clamped to `[0, 100000]`
    pub average_attendance: f64,
    /// Demand score in `[0, 10]`
    pub market_demand: f64,
    /// Playoff likelihood in `[0, 100]`
    pub playoff_probability: f64,
}

impl PerformanceProfile {
    /// Whether any games fed this profile.
    #[must_use]
    pub const fn has_games(&self) -> bool {
        self.wins + self.losses > 0
    }
}

impl From<&team_performance::Model> for PerformanceProfile {
    fn from(row: &team_performance::Model) -> Self {
        Self {
            wins: row.wins,
            losses: row.losses,
            win_percentage: row.win_percentage,
            average_attendance: row.average_attendance,
            market_demand: row.market_demand,
            playoff_probability: row.playoff_probability,
        }
    }
}

/// Computes a performance profile from per-game attendance counts.
///
/// Each entry of `attendance_counts` is one game of the season, including
/// games with zero attendance records.
#[must_use]
pub fn compute_performance(attendance_counts: &[u64], win_threshold: u64) -> PerformanceProfile {
    let game_count = attendance_counts.len();
    if game_count == 0 {
        return PerformanceProfile::default();
    }

    let wins = attendance_counts
        .iter()
        .filter(|&&count| count > win_threshold)
        .count();
    let losses = game_count - wins;
    let total_attendance: u64 = attendance_counts.iter().sum();

    let win_percentage = wins as f64 / game_count as f64;
    let average_attendance =
        (total_attendance as f64 / game_count as f64).clamp(0.0, MAX_AVERAGE_ATTENDANCE);
    let market_demand = (win_percentage * 5.0 + (average_attendance / 100.0).min(5.0))
        .clamp(0.0, MAX_MARKET_DEMAND);
    let playoff_probability =
        (win_percentage * 100.0 + market_demand * 2.0).clamp(0.0, MAX_PLAYOFF_PROBABILITY);

    PerformanceProfile {
        wins: i32::try_from(wins).unwrap_or(i32::MAX),
        losses: i32::try_from(losses).unwrap_or(i32::MAX),
        win_percentage,
        average_attendance,
        market_demand,
        playoff_probability,
    }
}

/// Recomputes the performance profile of a team-season and upserts it.
///
/// Recomputing overwrites the existing row for `(team_id, season_id)`; concurrent
/// recomputes resolve through the upsert, last writer wins.
///
/// # Errors
/// Returns `TeamNotFound`/`SeasonNotFound` when either does not exist.
pub async fn calculate_team_performance(
    db: &DatabaseConnection,
    team_id: i64,
    season_id: i64,
    settings: &PerformanceSettings,
) -> Result<team_performance::Model> {
    require_team(db, team_id).await?;
    let season = require_season(db, season_id).await?;
    if season.team_id != team_id {
        warn!(
            team_id,
            season_id,
            season_team_id = season.team_id,
            "Computing performance for a season that belongs to another team"
        );
    }

    let games = list_games(db, Some(season_id)).await?;
    let game_ids: Vec<i64> = games.iter().map(|g| g.id).collect();
    let counts = count_attendance_by_game(db, &game_ids).await?;
    let per_game: Vec<u64> = game_ids
        .iter()
        .map(|id| counts.get(id).copied().unwrap_or(0))
        .collect();

    let profile = compute_performance(&per_game, settings.win_attendance_threshold);
    upsert_performance(db, team_id, season_id, &profile).await?;

    info!(
        team_id,
        season_id,
        wins = profile.wins,
        losses = profile.losses,
        "Team performance calculated"
    );
    find_performance(db, team_id, season_id)
        .await?
        .ok_or_else(|| {
            DbErr::RecordNotFound(format!("team_performance ({team_id}, {season_id})")).into()
        })
}

/// Returns the stored profile, computing it on first request.
pub async fn get_or_calculate_team_performance(
    db: &DatabaseConnection,
    team_id: i64,
    season_id: i64,
    settings: &PerformanceSettings,
) -> Result<team_performance::Model> {
    if let Some(existing) = find_performance(db, team_id, season_id).await? {
        debug!(team_id, season_id, "Using stored team performance");
        return Ok(existing);
    }
    calculate_team_performance(db, team_id, season_id, settings).await
}

/// Reads the stored profile of a team-season, if any.
pub async fn find_performance<C>(
    db: &C,
    team_id: i64,
    season_id: i64,
) -> Result<Option<team_performance::Model>>
where
    C: ConnectionTrait,
{
    TeamPerformance::find()
        .filter(team_performance::Column::TeamId.eq(team_id))
        .filter(team_performance::Column::SeasonId.eq(season_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn upsert_performance<C>(
    db: &C,
    team_id: i64,
    season_id: i64,
    profile: &PerformanceProfile,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = team_performance::ActiveModel {
        team_id: Set(team_id),
        season_id: Set(season_id),
        wins: Set(profile.wins),
        losses: Set(profile.losses),
        win_percentage: Set(profile.win_percentage),
        average_attendance: Set(profile.average_attendance),
        market_demand: Set(profile.market_demand),
        playoff_probability: Set(profile.playoff_probability),
        calculated_at: Set(Utc::now()),
        ..Default::default()
    };

    TeamPerformance::insert(row)
        .on_conflict(
            OnConflict::columns([
                team_performance::Column::TeamId,
                team_performance::Column::SeasonId,
            ])
            .update_columns([
                team_performance::Column::Wins,
                team_performance::Column::Losses,
                team_performance::Column::WinPercentage,
                team_performance::Column::AverageAttendance,
                team_performance::Column::MarketDemand,
                team_performance::Column::PlayoffProbability,
                team_performance::Column::CalculatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Season;
    use crate::test_utils::*;

    #[test]
    fn test_zero_games_is_all_zero() {
        let profile = compute_performance(&[], 3);
        assert_eq!(profile, PerformanceProfile::default());
        assert_eq!(profile.win_percentage, 0.0);
        assert_eq!(profile.market_demand, 0.0);
        assert_eq!(profile.playoff_probability, 0.0);
        assert!(!profile.has_games());
    }

    #[test]
    fn test_attendance_threshold_classifies_wins() {
        // 5 and 4 exceed the threshold; exactly 3 does not
        let profile = compute_performance(&[5, 4, 0, 3], 3);

        assert_eq!(profile.wins, 2);
        assert_eq!(profile.losses, 2);
        assert_eq!(profile.win_percentage, 0.5);
        assert_eq!(profile.average_attendance, 3.0);
        assert_close(profile.market_demand, 2.53);
        assert_close(profile.playoff_probability, 55.06);
    }

    #[test]
    fn test_values_are_clamped() {
        let profile = compute_performance(&[250_000, 150_000], 3);

        assert_eq!(profile.win_percentage, 1.0);
        assert_eq!(profile.average_attendance, 100_000.0);
        assert_eq!(profile.market_demand, 10.0);
        assert_eq!(profile.playoff_probability, 100.0);
    }

    #[test]
    fn test_ranges_hold_for_many_shapes() {
        let shapes: [&[u64]; 6] = [&[0], &[1, 2, 3], &[4], &[10, 0, 0, 0, 0], &[600; 3], &[3, 3]];
        for counts in shapes {
            let profile = compute_performance(counts, 3);
            assert!((0.0..=1.0).contains(&profile.win_percentage));
            assert!((0.0..=10.0).contains(&profile.market_demand));
            assert!((0.0..=100.0).contains(&profile.playoff_probability));
            assert_eq!(
                usize::try_from(profile.wins + profile.losses).ok(),
                Some(counts.len())
            );
        }
    }

    #[tokio::test]
    async fn test_calculate_is_idempotent_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Harbor City FC").await?;
        let season = create_test_season(&db, team.id, 2024).await?;
        let game_a = create_test_game(&db, season.id, "Rivals", "2024-04-01").await?;
        let game_b = create_test_game(&db, season.id, "Comets", "2024-04-08").await?;
        create_attendance(&db, game_a.id, 5).await?;
        let settings = PerformanceSettings::default();

        let first = calculate_team_performance(&db, team.id, season.id, &settings).await?;
        assert_eq!(first.wins, 1);
        assert_eq!(first.losses, 1);

        create_attendance(&db, game_b.id, 4).await?;
        let second = calculate_team_performance(&db, team.id, season.id, &settings).await?;
        assert_eq!(second.id, first.id);
        assert_eq!(second.wins, 2);
        assert_eq!(second.losses, 0);

        let rows = TeamPerformance::find().count(&db).await?;
        assert_eq!(rows, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_calculate_uses_stored_row() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Harbor City FC").await?;
        let season = create_test_season(&db, team.id, 2024).await?;
        let game = create_test_game(&db, season.id, "Rivals", "2024-04-01").await?;
        let settings = PerformanceSettings::default();

        let computed = get_or_calculate_team_performance(&db, team.id, season.id, &settings).await?;
        assert_eq!(computed.losses, 1);

        // New attendance is not seen until an explicit recompute
        create_attendance(&db, game.id, 10).await?;
        let stored = get_or_calculate_team_performance(&db, team.id, season.id, &settings).await?;
        assert_eq!(stored, computed);

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_season_and_missing_team() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Harbor City FC").await?;
        let season = create_test_season(&db, team.id, 2024).await?;
        let settings = PerformanceSettings::default();

        let row = calculate_team_performance(&db, team.id, season.id, &settings).await?;
        assert_eq!(row.win_percentage, 0.0);
        assert_eq!(row.market_demand, 0.0);
        assert_eq!(row.playoff_probability, 0.0);

        let missing = calculate_team_performance(&db, 999, season.id, &settings).await;
        assert!(matches!(missing, Err(crate::errors::Error::TeamNotFound { team_id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_season_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let team = create_test_team(&db, "Harbor City FC").await?;
        let season = create_test_season(&db, team.id, 2024).await?;
        let settings = PerformanceSettings::default();
        calculate_team_performance(&db, team.id, season.id, &settings).await?;

        Season::delete_by_id(season.id).exec(&db).await?;

        assert!(find_performance(&db, team.id, season.id).await?.is_none());
        Ok(())
    }
}
