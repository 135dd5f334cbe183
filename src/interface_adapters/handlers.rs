use crate::domain::errors::LeaderboardError;
use crate::frameworks::config::DEFAULT_LEADERBOARD_LIMIT;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{
    LeaderboardQuery, LeaderboardResponse, RoomDto, ScoreCreatedResponse, ScoreRequest,
    StandingDto, StandingsResponse,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::leaderboard::{
    LeaderboardUseCase, ScoreSubmission, SubmitScoreUseCase, multiplayer_standings,
};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info};

type ApiError = (StatusCode, Json<ErrorResponse>);

// Handler listing joinable public rooms.
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomDto>> {
    let rooms = state.orchestrator.public_rooms().await;
    Json(rooms.iter().map(RoomDto::from).collect())
}

// Handler for storing a single-player score.
pub async fn submit_score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScoreCreatedResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "malformed score submission");
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("invalid score submission: {}", rejection.body_text()),
        )
    })?;
    let use_case = SubmitScoreUseCase {
        clock: SystemClock,
        store: state.scores.clone(),
    };

    let record = use_case
        .execute(ScoreSubmission {
            player_name: payload.player_name,
            score: payload.score.unwrap_or(-1),
            lines: payload.lines,
            level: payload.level,
            date: payload.date,
        })
        .await
        .map_err(map_leaderboard_error)?;

    info!(score_id = record.id, player_name = %record.player_name, score = record.score, "score submitted");
    Ok((
        StatusCode::CREATED,
        Json(ScoreCreatedResponse {
            message: "Score saved successfully".to_string(),
            score: record.into(),
        }),
    ))
}

// Handler for the single-player leaderboard.
pub async fn single_player_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    fetch_single_player(&state, &query).await.map(Json)
}

// Handler for the combined leaderboard; win/loss standings unless `mode=single-player`.
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Response, ApiError> {
    if query.is_multiplayer() {
        let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
        let standings = multiplayer_standings(state.orchestrator.registry(), limit);
        let leaderboard: Vec<StandingDto> = standings.into_iter().map(Into::into).collect();
        return Ok(Json(StandingsResponse {
            total_players: leaderboard.len(),
            leaderboard,
            mode: "multiplayer",
        })
        .into_response());
    }
    let response = fetch_single_player(&state, &query).await?;
    Ok(Json(response).into_response())
}

async fn fetch_single_player(
    state: &AppState,
    query: &LeaderboardQuery,
) -> Result<LeaderboardResponse, ApiError> {
    let use_case = LeaderboardUseCase {
        clock: SystemClock,
        store: state.scores.clone(),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let leaderboard = use_case
        .execute(query.period(), limit)
        .await
        .map_err(map_leaderboard_error)?;
    Ok(leaderboard.into())
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn map_leaderboard_error(err: LeaderboardError) -> ApiError {
    match err {
        LeaderboardError::InvalidName => {
            error_response(StatusCode::BAD_REQUEST, "player_name is required")
        }
        LeaderboardError::InvalidScore => error_response(
            StatusCode::BAD_REQUEST,
            "score must be a non-negative integer",
        ),
        LeaderboardError::StorageFailure => {
            error!("score store failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}
