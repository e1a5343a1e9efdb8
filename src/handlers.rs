use crate::competition;
use crate::errors::AppError;
use crate::models::{
    Activity, AdminLoginRequest, AdminLoginResponse, CompetitionDay, CreateParticipantRequest,
    DailyLogEntry, Habit, HabitStatusRequest, HabitToggle, HistoryQuery, LeaderboardEntry,
    NewHabitRequest, Participant, ParticipantDay, RemoteHistoryQuery, RemoteHistoryResponse,
    RewardRequest, Statistics, StreakResponse, TodayProgress,
};
use crate::state::AppState;
use crate::stats::{self, history_window, today};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use tracing::{info, warn};

pub async fn list_participants(State(state): State<AppState>) -> Json<Vec<Participant>> {
    let data = state.data.lock().await;
    Json(data.participants.values().cloned().collect())
}

pub async fn create_participant(
    State(state): State<AppState>,
    Json(payload): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>), AppError> {
    let participant = state
        .mutate(|data, now| competition::create_participant(data, &payload.name, now))
        .await?;
    info!(participant = %participant.name, "participant joined");
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Participant>, AppError> {
    let data = state.data.lock().await;
    data.participants
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("participant '{name}' not found")))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<TodayProgress> {
    let data = state.data.lock().await;
    let progress = match data.participants.get(&name) {
        Some(participant) => stats::progress_on(participant, today()),
        None => TodayProgress {
            completed: 0,
            total: 0,
            percentage: 0,
        },
    };
    Json(progress)
}

pub async fn get_streak(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StreakResponse>, AppError> {
    let streak = state
        .mutate(|data, now| competition::refresh_streak(data, &name, now.date_naive()))
        .await?;
    Ok(Json(StreakResponse { name, streak }))
}

pub async fn get_participant_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ParticipantDay>>, AppError> {
    let data = state.data.lock().await;
    if !data.participants.contains_key(&name) {
        return Err(AppError::not_found(format!("participant '{name}' not found")));
    }
    Ok(Json(stats::participant_history_at(
        today(),
        &data,
        &name,
        history_window(query.days),
    )))
}

pub async fn add_participant_habit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<NewHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state
        .mutate(|data, now| competition::add_participant_habit(data, &name, payload, now))
        .await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn set_habit_status(
    State(state): State<AppState>,
    Path((name, habit_id)): Path<(String, String)>,
    Json(payload): Json<HabitStatusRequest>,
) -> Result<Json<HabitToggle>, AppError> {
    let toggle = state
        .mutate(|data, now| {
            let date = payload.date.unwrap_or_else(|| now.date_naive());
            competition::update_habit_status(data, &name, &habit_id, payload.completed, date, now)
        })
        .await?;
    Ok(Json(toggle))
}

pub async fn remove_participant_habit(
    State(state): State<AppState>,
    Path((name, habit_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .mutate(|data, _| competition::remove_participant_habit(data, &name, &habit_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn complete_all(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<HabitToggle>>, AppError> {
    let toggles = state
        .mutate(|data, now| competition::complete_all_habits(data, &name, now))
        .await?;
    Ok(Json(toggles))
}

pub async fn reset_day(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<HabitToggle>>, AppError> {
    let toggles = state
        .mutate(|data, now| competition::reset_day(data, &name, now))
        .await?;
    Ok(Json(toggles))
}

pub async fn give_reward(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<RewardRequest>,
) -> Result<Json<Participant>, AppError> {
    let participant = state
        .mutate(|data, now| {
            competition::give_reward(data, &name, &payload.title, payload.points, now)
        })
        .await?;
    info!(participant = %name, points = payload.points, "reward given");
    Ok(Json(participant))
}

pub async fn list_global_habits(State(state): State<AppState>) -> Json<Vec<Habit>> {
    let data = state.data.lock().await;
    Json(data.global_habits.clone())
}

pub async fn add_global_habit(
    State(state): State<AppState>,
    Json(payload): Json<NewHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state
        .mutate(|data, now| competition::add_global_habit(data, payload, now))
        .await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn remove_global_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .mutate(|data, _| competition::remove_global_habit(data, &habit_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_leaderboard(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    let data = state.data.lock().await;
    Json(stats::leaderboard(&data))
}

pub async fn get_statistics(State(state): State<AppState>) -> Json<Statistics> {
    let data = state.data.lock().await;
    Json(stats::build_statistics(&data))
}

pub async fn get_activities(State(state): State<AppState>) -> Json<Vec<Activity>> {
    let data = state.data.lock().await;
    Json(data.activities.clone())
}

pub async fn get_competition_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<CompetitionDay>> {
    let data = state.data.lock().await;
    Json(stats::competition_history_at(
        today(),
        &data,
        history_window(query.days),
    ))
}

pub async fn get_daily_logs(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<Vec<DailyLogEntry>>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("date must be formatted as YYYY-MM-DD"))?;
    let data = state.data.lock().await;
    Ok(Json(stats::daily_logs(&data, date)))
}

/// Rows come straight from the remote sheet; empty when it is unavailable.
pub async fn get_remote_history(
    State(state): State<AppState>,
    Query(query): Query<RemoteHistoryQuery>,
) -> Json<RemoteHistoryResponse> {
    let Some(mirror) = state.mirror.as_ref() else {
        return Json(RemoteHistoryResponse {
            history: Vec::new(),
        });
    };

    let result = match query.participant.as_deref() {
        Some(participant) => mirror.participant_history(participant).await,
        None => mirror.competition_history().await,
    };
    let history = result.unwrap_or_else(|err| {
        warn!("failed to fetch remote history: {err}");
        Vec::new()
    });
    Json(RemoteHistoryResponse { history })
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Json<AdminLoginResponse> {
    let data = state.data.lock().await;
    Json(AdminLoginResponse {
        authenticated: competition::verify_admin_password(&data, &payload.password),
    })
}
