use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/participants",
            get(handlers::list_participants).post(handlers::create_participant),
        )
        .route("/api/participants/:name", get(handlers::get_participant))
        .route("/api/participants/:name/progress", get(handlers::get_progress))
        .route("/api/participants/:name/streak", get(handlers::get_streak))
        .route(
            "/api/participants/:name/history",
            get(handlers::get_participant_history),
        )
        .route(
            "/api/participants/:name/habits",
            post(handlers::add_participant_habit),
        )
        .route(
            "/api/participants/:name/habits/:habit_id",
            post(handlers::set_habit_status).delete(handlers::remove_participant_habit),
        )
        .route(
            "/api/participants/:name/complete-all",
            post(handlers::complete_all),
        )
        .route("/api/participants/:name/reset-day", post(handlers::reset_day))
        .route("/api/participants/:name/rewards", post(handlers::give_reward))
        .route(
            "/api/habits",
            get(handlers::list_global_habits).post(handlers::add_global_habit),
        )
        .route("/api/habits/:habit_id", delete(handlers::remove_global_habit))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/activities", get(handlers::get_activities))
        .route("/api/history", get(handlers::get_competition_history))
        .route("/api/logs/:date", get(handlers::get_daily_logs))
        .route("/api/remote/history", get(handlers::get_remote_history))
        .route("/api/admin/login", post(handlers::admin_login))
        .with_state(state)
}
