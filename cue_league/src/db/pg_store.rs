//! PostgreSQL implementation of [`LeagueStore`] and [`RulesProvider`].
//!
//! Each commit runs in one transaction. Versioned rows are updated with
//! `WHERE version = $n`; a zero row count rolls the whole transaction back.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use std::sync::Arc;

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_default_timeout, with_timeout};
use crate::bracket::{BracketError, SlotAssignment};
use crate::matches::{BracketLink, Match, MatchId, ParticipantId, PlayerId, Slot, TournamentId};
use crate::rating::{MatchHistoryEntry, PlayerProfile, RatingHistoryEntry, SkillCategory};
use crate::store::{ChangeSet, LeagueStore, MatchFilter, StoreError, StoreResult};
use crate::tournament::{
    MatchRules, Participant, RulesError, RulesProvider, RulesResult, TournamentConfig,
};

const MATCH_COLUMNS: &str = r#"
    id, tournament_id, stage_id, round, round_label, kind,
    player1_id, player2_id, player1_score, player2_score, winner_id, loser_id, status,
    submitted_by, submitted_at, confirmed_by, confirmed_at, disputed_by, disputed_at,
    dispute_reason, resolved_by, resolved_at, resolution_notes,
    result_deadline, confirmation_deadline, completed_at, expired_at,
    next_match_id, next_match_slot, loser_next_match_id, loser_next_match_slot, version
"#;

const PARTICIPANT_COLUMNS: &str = r#"
    id, tournament_id, player_id, seed, status, matches_played, matches_won, matches_lost,
    frames_won, frames_lost, frame_difference, points, current_stage, group_label,
    final_position, version
"#;

const PROFILE_COLUMNS: &str = r#"
    player_id, display_name, rating, best_rating, matches_played, wins, losses,
    frames_won, frames_lost, last_match_at, version
"#;

/// Postgres-backed league store
#[derive(Clone)]
pub struct PgLeagueStore {
    pool: Arc<PgPool>,
}

impl PgLeagueStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn load_config(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<TournamentConfig>> {
        let row = with_default_timeout(
            sqlx::query("SELECT config::TEXT AS config FROM tournaments WHERE id = $1")
                .bind(tournament_id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("config")?;
                parse_config(&raw).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn apply(&self, changes: ChangeSet) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for m in &changes.matches {
            update_match(&mut tx, m).await?;
        }
        for m in &changes.new_matches {
            insert_match(&mut tx, m).await?;
        }
        for assignment in &changes.slot_assignments {
            assign_slot(&mut tx, assignment).await?;
        }
        for p in &changes.participants {
            update_participant(&mut tx, p).await?;
        }
        for profile in &changes.profiles {
            update_profile(&mut tx, profile).await?;
        }
        for entry in &changes.rating_history {
            insert_rating_history(&mut tx, entry).await?;
        }
        for entry in &changes.match_history {
            insert_match_history(&mut tx, entry).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl LeagueStore for PgLeagueStore {
    async fn load_match(&self, match_id: MatchId) -> StoreResult<Match> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(match_id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?
        .ok_or(StoreError::MatchNotFound(match_id))?;

        match_from_row(&row)
    }

    async fn load_participant(&self, participant_id: ParticipantId) -> StoreResult<Participant> {
        let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(participant_id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?
        .ok_or(StoreError::ParticipantNotFound(participant_id))?;

        participant_from_row(&row)
    }

    async fn find_participant_by_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> StoreResult<Option<Participant>> {
        let sql = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants
             WHERE tournament_id = $1 AND player_id = $2"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(tournament_id)
                .bind(player_id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        row.as_ref().map(participant_from_row).transpose()
    }

    async fn load_profile(&self, player_id: PlayerId) -> StoreResult<Option<PlayerProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM player_profiles WHERE player_id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(player_id)
                .fetch_optional(self.pool.as_ref()),
        )
        .await?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn list_matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        let sql = format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE ($1::BIGINT IS NULL OR tournament_id = $1)
               AND ($2::VARCHAR IS NULL OR status = $2)
               AND ($3::BIGINT IS NULL OR player1_id = $3 OR player2_id = $3)
             ORDER BY id
             LIMIT $4"
        );
        let rows = with_default_timeout(
            sqlx::query(&sql)
                .bind(filter.tournament_id)
                .bind(filter.status.map(|s| s.as_str()))
                .bind(filter.participant_id)
                .bind(filter.limit)
                .fetch_all(self.pool.as_ref()),
        )
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn list_overdue(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<MatchId>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id FROM (
                    SELECT id,
                           CASE WHEN status = 'scheduled' THEN result_deadline
                                ELSE confirmation_deadline END AS deadline
                    FROM matches
                    WHERE (status = 'scheduled' AND result_deadline < $1)
                       OR (status = 'pending_confirmation' AND confirmation_deadline < $1)
                ) due
                ORDER BY deadline, id
                LIMIT $2
                "#,
            )
            .bind(now.naive_utc())
            .bind(limit)
            .fetch_all(self.pool.as_ref()),
        )
        .await?;

        rows.iter()
            .map(|row| row.try_get::<MatchId, _>("id").map_err(StoreError::from))
            .collect()
    }

    async fn rating_history(
        &self,
        player_id: PlayerId,
        limit: i64,
    ) -> StoreResult<Vec<RatingHistoryEntry>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT player_id, old_rating, new_rating, delta, reason,
                       match_id, tournament_id, note, created_at
                FROM rating_history
                WHERE player_id = $1
                ORDER BY id DESC
                LIMIT $2
                "#,
            )
            .bind(player_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref()),
        )
        .await?;

        rows.iter().map(rating_entry_from_row).collect()
    }

    async fn match_history(
        &self,
        participant_id: ParticipantId,
    ) -> StoreResult<Vec<MatchHistoryEntry>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT match_id, tournament_id, participant_id, player_id,
                       opponent_participant_id, opponent_player_id, opponent_rating,
                       frames_won, frames_lost, won, rating_before, rating_after,
                       rating_delta, played_at
                FROM match_history
                WHERE participant_id = $1
                ORDER BY played_at, id
                "#,
            )
            .bind(participant_id)
            .fetch_all(self.pool.as_ref()),
        )
        .await?;

        rows.iter().map(match_entry_from_row).collect()
    }

    async fn allocate_match_id(&self) -> StoreResult<MatchId> {
        let row = with_default_timeout(
            sqlx::query("SELECT nextval(pg_get_serial_sequence('matches', 'id')) AS id")
                .fetch_one(self.pool.as_ref()),
        )
        .await?;

        Ok(row.try_get("id")?)
    }

    async fn commit(&self, changes: ChangeSet) -> StoreResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let result = with_timeout(DEFAULT_TRANSACTION_TIMEOUT, self.apply(changes)).await;
        if let Err(e) = &result {
            warn!("commit rolled back: {e}");
        }
        result
    }
}

#[async_trait]
impl RulesProvider for PgLeagueStore {
    async fn rules_for(&self, m: &Match) -> RulesResult<MatchRules> {
        let config = self
            .load_config(m.tournament_id)
            .await
            .map_err(|e| rules_error(m.tournament_id, e))?
            .ok_or(RulesError::UnknownTournament(m.tournament_id))?;

        config
            .validate()
            .map_err(|reason| RulesError::InvalidConfig {
                tournament_id: m.tournament_id,
                reason,
            })?;

        Ok(MatchRules::from_config(&config, m))
    }
}

/// Undecodable JSON is the tournament's fault; anything else is the backend's
fn rules_error(tournament_id: TournamentId, err: StoreError) -> RulesError {
    match err {
        StoreError::Serialization(e) => RulesError::InvalidConfig {
            tournament_id,
            reason: e.to_string(),
        },
        other => RulesError::Backend(other.to_string()),
    }
}

fn parse_config(raw: &str) -> StoreResult<TournamentConfig> {
    Ok(serde_json::from_str(raw)?)
}

fn naive(t: Option<DateTime<Utc>>) -> Option<NaiveDateTime> {
    t.map(|t| t.naive_utc())
}

fn utc(row: &PgRow, column: &str) -> StoreResult<Option<DateTime<Utc>>> {
    Ok(row
        .try_get::<Option<NaiveDateTime>, _>(column)?
        .map(|t| t.and_utc()))
}

fn parse<T: FromStr<Err = String>>(value: &str) -> StoreResult<T> {
    value.parse().map_err(StoreError::Corrupt)
}

fn link(row: &PgRow, id_column: &str, slot_column: &str) -> StoreResult<Option<BracketLink>> {
    let id: Option<MatchId> = row.try_get(id_column)?;
    let slot: Option<String> = row.try_get(slot_column)?;

    match (id, slot) {
        (Some(id), Some(slot)) => Ok(Some(BracketLink::new(id, parse(&slot)?))),
        (None, None) => Ok(None),
        _ => Err(StoreError::Corrupt(format!(
            "{id_column} and {slot_column} must be set together"
        ))),
    }
}

fn match_from_row(row: &PgRow) -> StoreResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        stage_id: row.try_get("stage_id")?,
        round: row.try_get("round")?,
        round_label: row.try_get("round_label")?,
        kind: parse(&row.try_get::<String, _>("kind")?)?,
        player1_id: row.try_get("player1_id")?,
        player2_id: row.try_get("player2_id")?,
        player1_score: row.try_get("player1_score")?,
        player2_score: row.try_get("player2_score")?,
        winner_id: row.try_get("winner_id")?,
        cached_loser_id: row.try_get("loser_id")?,
        status: parse(&row.try_get::<String, _>("status")?)?,
        submitted_by: row.try_get("submitted_by")?,
        submitted_at: utc(row, "submitted_at")?,
        confirmed_by: row.try_get("confirmed_by")?,
        confirmed_at: utc(row, "confirmed_at")?,
        disputed_by: row.try_get("disputed_by")?,
        disputed_at: utc(row, "disputed_at")?,
        dispute_reason: row.try_get("dispute_reason")?,
        resolved_by: row.try_get("resolved_by")?,
        resolved_at: utc(row, "resolved_at")?,
        resolution_notes: row.try_get("resolution_notes")?,
        result_deadline: utc(row, "result_deadline")?,
        confirmation_deadline: utc(row, "confirmation_deadline")?,
        completed_at: utc(row, "completed_at")?,
        expired_at: utc(row, "expired_at")?,
        next_match: link(row, "next_match_id", "next_match_slot")?,
        loser_next_match: link(row, "loser_next_match_id", "loser_next_match_slot")?,
        version: row.try_get("version")?,
    })
}

fn participant_from_row(row: &PgRow) -> StoreResult<Participant> {
    Ok(Participant {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        player_id: row.try_get("player_id")?,
        seed: row.try_get("seed")?,
        status: parse(&row.try_get::<String, _>("status")?)?,
        matches_played: row.try_get("matches_played")?,
        matches_won: row.try_get("matches_won")?,
        matches_lost: row.try_get("matches_lost")?,
        frames_won: row.try_get("frames_won")?,
        frames_lost: row.try_get("frames_lost")?,
        frame_difference: row.try_get("frame_difference")?,
        points: row.try_get("points")?,
        current_stage: row.try_get("current_stage")?,
        group_label: row.try_get("group_label")?,
        final_position: row.try_get("final_position")?,
        version: row.try_get("version")?,
    })
}

fn profile_from_row(row: &PgRow) -> StoreResult<PlayerProfile> {
    let rating: i32 = row.try_get("rating")?;
    Ok(PlayerProfile {
        player_id: row.try_get("player_id")?,
        display_name: row.try_get("display_name")?,
        rating,
        category: SkillCategory::from_rating(rating),
        best_rating: row.try_get("best_rating")?,
        matches_played: row.try_get("matches_played")?,
        wins: row.try_get("wins")?,
        losses: row.try_get("losses")?,
        frames_won: row.try_get("frames_won")?,
        frames_lost: row.try_get("frames_lost")?,
        last_match_at: utc(row, "last_match_at")?,
        version: row.try_get("version")?,
    })
}

fn rating_entry_from_row(row: &PgRow) -> StoreResult<RatingHistoryEntry> {
    Ok(RatingHistoryEntry {
        player_id: row.try_get("player_id")?,
        old_rating: row.try_get("old_rating")?,
        new_rating: row.try_get("new_rating")?,
        delta: row.try_get("delta")?,
        reason: parse(&row.try_get::<String, _>("reason")?)?,
        match_id: row.try_get("match_id")?,
        tournament_id: row.try_get("tournament_id")?,
        note: row.try_get("note")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
    })
}

fn match_entry_from_row(row: &PgRow) -> StoreResult<MatchHistoryEntry> {
    Ok(MatchHistoryEntry {
        match_id: row.try_get("match_id")?,
        tournament_id: row.try_get("tournament_id")?,
        participant_id: row.try_get("participant_id")?,
        player_id: row.try_get("player_id")?,
        opponent_participant_id: row.try_get("opponent_participant_id")?,
        opponent_player_id: row.try_get("opponent_player_id")?,
        opponent_rating: row.try_get("opponent_rating")?,
        frames_won: row.try_get("frames_won")?,
        frames_lost: row.try_get("frames_lost")?,
        won: row.try_get("won")?,
        rating_before: row.try_get("rating_before")?,
        rating_after: row.try_get("rating_after")?,
        rating_delta: row.try_get("rating_delta")?,
        played_at: row.try_get::<NaiveDateTime, _>("played_at")?.and_utc(),
    })
}

/// Binds `$1` (id) through `$32` (version) in [`MATCH_COLUMNS`] order
fn bind_match<'q>(
    query: Query<'q, Postgres, PgArguments>,
    m: &'q Match,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(m.id)
        .bind(m.tournament_id)
        .bind(m.stage_id)
        .bind(m.round)
        .bind(m.round_label.as_str())
        .bind(m.kind.as_str())
        .bind(m.player1_id)
        .bind(m.player2_id)
        .bind(m.player1_score)
        .bind(m.player2_score)
        .bind(m.winner_id)
        .bind(m.loser_id())
        .bind(m.status.as_str())
        .bind(m.submitted_by)
        .bind(naive(m.submitted_at))
        .bind(m.confirmed_by)
        .bind(naive(m.confirmed_at))
        .bind(m.disputed_by)
        .bind(naive(m.disputed_at))
        .bind(m.dispute_reason.as_deref())
        .bind(m.resolved_by)
        .bind(naive(m.resolved_at))
        .bind(m.resolution_notes.as_deref())
        .bind(naive(m.result_deadline))
        .bind(naive(m.confirmation_deadline))
        .bind(naive(m.completed_at))
        .bind(naive(m.expired_at))
        .bind(m.next_match.map(|l| l.match_id))
        .bind(m.next_match.map(|l| l.slot.as_str()))
        .bind(m.loser_next_match.map(|l| l.match_id))
        .bind(m.loser_next_match.map(|l| l.slot.as_str()))
        .bind(m.version)
}

async fn update_match(tx: &mut Transaction<'_, Postgres>, m: &Match) -> StoreResult<()> {
    let result = bind_match(
        sqlx::query(
            r#"
            UPDATE matches SET
                tournament_id = $2, stage_id = $3, round = $4, round_label = $5, kind = $6,
                player1_id = $7, player2_id = $8, player1_score = $9, player2_score = $10,
                winner_id = $11, loser_id = $12, status = $13,
                submitted_by = $14, submitted_at = $15, confirmed_by = $16, confirmed_at = $17,
                disputed_by = $18, disputed_at = $19, dispute_reason = $20,
                resolved_by = $21, resolved_at = $22, resolution_notes = $23,
                result_deadline = $24, confirmation_deadline = $25,
                completed_at = $26, expired_at = $27,
                next_match_id = $28, next_match_slot = $29,
                loser_next_match_id = $30, loser_next_match_slot = $31,
                version = version + 1
            WHERE id = $1 AND version = $32
            "#,
        ),
        m,
    )
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(missing_or_conflict(tx, "matches", "id", "match", m.id).await);
    }
    Ok(())
}

async fn insert_match(tx: &mut Transaction<'_, Postgres>, m: &Match) -> StoreResult<()> {
    let sql = format!(
        "INSERT INTO matches ({MATCH_COLUMNS}) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
            $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32
        )"
    );
    bind_match(sqlx::query(&sql), m).execute(&mut **tx).await?;
    Ok(())
}

async fn assign_slot(
    tx: &mut Transaction<'_, Postgres>,
    assignment: &SlotAssignment,
) -> StoreResult<()> {
    let (update, select) = match assignment.slot {
        Slot::First => (
            "UPDATE matches SET player1_id = $2, version = version + 1
             WHERE id = $1 AND (player1_id IS NULL OR player1_id = $2)",
            "SELECT player1_id AS occupant FROM matches WHERE id = $1",
        ),
        Slot::Second => (
            "UPDATE matches SET player2_id = $2, version = version + 1
             WHERE id = $1 AND (player2_id IS NULL OR player2_id = $2)",
            "SELECT player2_id AS occupant FROM matches WHERE id = $1",
        ),
    };

    let result = sqlx::query(update)
        .bind(assignment.match_id)
        .bind(assignment.participant_id)
        .execute(&mut **tx)
        .await?;
    if result.rows_affected() > 0 {
        debug!(
            "participant {} placed in {} slot of match {}",
            assignment.participant_id, assignment.slot, assignment.match_id
        );
        return Ok(());
    }

    let row = sqlx::query(select)
        .bind(assignment.match_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::MatchNotFound(assignment.match_id))?;

    match row.try_get::<Option<ParticipantId>, _>("occupant")? {
        Some(occupant) => Err(BracketError::SlotOccupied {
            match_id: assignment.match_id,
            slot: assignment.slot,
            occupant,
        }
        .into()),
        None => Err(StoreError::Conflict {
            entity: "match",
            id: assignment.match_id,
        }),
    }
}

async fn update_participant(tx: &mut Transaction<'_, Postgres>, p: &Participant) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE tournament_participants SET
            seed = $2, status = $3, matches_played = $4, matches_won = $5, matches_lost = $6,
            frames_won = $7, frames_lost = $8, frame_difference = $9, points = $10,
            current_stage = $11, group_label = $12, final_position = $13,
            version = version + 1
        WHERE id = $1 AND version = $14
        "#,
    )
    .bind(p.id)
    .bind(p.seed)
    .bind(p.status.as_str())
    .bind(p.matches_played)
    .bind(p.matches_won)
    .bind(p.matches_lost)
    .bind(p.frames_won)
    .bind(p.frames_lost)
    .bind(p.frame_difference)
    .bind(p.points)
    .bind(p.current_stage)
    .bind(p.group_label.as_deref())
    .bind(p.final_position)
    .bind(p.version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(missing_or_conflict(tx, "tournament_participants", "id", "participant", p.id).await);
    }
    Ok(())
}

async fn update_profile(
    tx: &mut Transaction<'_, Postgres>,
    profile: &PlayerProfile,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE player_profiles SET
            display_name = $2, rating = $3, category = $4, best_rating = $5,
            matches_played = $6, wins = $7, losses = $8, frames_won = $9, frames_lost = $10,
            last_match_at = $11, version = version + 1, updated_at = NOW()
        WHERE player_id = $1 AND version = $12
        "#,
    )
    .bind(profile.player_id)
    .bind(profile.display_name.as_str())
    .bind(profile.rating)
    .bind(profile.category.as_str())
    .bind(profile.best_rating)
    .bind(profile.matches_played)
    .bind(profile.wins)
    .bind(profile.losses)
    .bind(profile.frames_won)
    .bind(profile.frames_lost)
    .bind(naive(profile.last_match_at))
    .bind(profile.version)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(
            missing_or_conflict(tx, "player_profiles", "player_id", "profile", profile.player_id)
                .await,
        );
    }
    Ok(())
}

async fn insert_rating_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &RatingHistoryEntry,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO rating_history
            (player_id, old_rating, new_rating, delta, reason, match_id, tournament_id, note, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(entry.player_id)
    .bind(entry.old_rating)
    .bind(entry.new_rating)
    .bind(entry.delta)
    .bind(entry.reason.as_str())
    .bind(entry.match_id)
    .bind(entry.tournament_id)
    .bind(entry.note.as_deref())
    .bind(entry.created_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_match_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &MatchHistoryEntry,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO match_history
            (match_id, tournament_id, participant_id, player_id,
             opponent_participant_id, opponent_player_id, opponent_rating,
             frames_won, frames_lost, won, rating_before, rating_after, rating_delta, played_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(entry.match_id)
    .bind(entry.tournament_id)
    .bind(entry.participant_id)
    .bind(entry.player_id)
    .bind(entry.opponent_participant_id)
    .bind(entry.opponent_player_id)
    .bind(entry.opponent_rating)
    .bind(entry.frames_won)
    .bind(entry.frames_lost)
    .bind(entry.won)
    .bind(entry.rating_before)
    .bind(entry.rating_after)
    .bind(entry.rating_delta)
    .bind(entry.played_at.naive_utc())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Tell a stale version apart from a missing row after a zero-row update
async fn missing_or_conflict(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    key: &str,
    entity: &'static str,
    id: i64,
) -> StoreError {
    let sql = format!("SELECT 1 FROM {table} WHERE {key} = $1");
    match sqlx::query(&sql).bind(id).fetch_optional(&mut **tx).await {
        Ok(Some(_)) => StoreError::Conflict { entity, id },
        Ok(None) => match entity {
            "participant" => StoreError::ParticipantNotFound(id),
            "profile" => StoreError::ProfileNotFound(id),
            _ => StoreError::MatchNotFound(id),
        },
        Err(e) => e.into(),
    }
}
