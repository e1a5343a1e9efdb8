use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HABIT_POINTS: i64 = 10;
pub const DEFAULT_HABIT_DESCRIPTION: &str = "Daily habit";
pub const DEFAULT_HABIT_ICON: &str = "⭐";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    pub id: String,
    pub icon: String,
    pub name: String,
    pub description: String,
    pub points: i64,
}

impl Habit {
    fn seed(id: &str, icon: &str, name: &str, description: &str, points: i64) -> Self {
        Self {
            id: id.to_string(),
            icon: icon.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    pub title: String,
    pub points: i64,
    pub date: DateTime<Utc>,
}

/// Completion flags for one day, keyed by habit id.
pub type DayProgress = BTreeMap<String, bool>;

/// Fields missing from a stored document fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Participant {
    /// Filled from the map key when a stored entry omits it.
    pub name: String,
    pub points: i64,
    pub streak: u32,
    pub total_completed: u64,
    pub habits: Vec<Habit>,
    /// Keyed by `YYYY-MM-DD` in server local time.
    pub daily_progress: BTreeMap<String, DayProgress>,
    pub rewards: Vec<Reward>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Completed,
    Undone,
    Reward,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyLogEntry {
    pub participant: String,
    pub habit: String,
    pub action: LogAction,
    pub points: i64,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminSettings {
    pub password: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

/// The whole competition document. Persisted locally and mirrored remotely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    pub admin: AdminSettings,
    pub global_habits: Vec<Habit>,
    pub participants: BTreeMap<String, Participant>,
    /// Newest first.
    pub activities: Vec<Activity>,
    pub daily_logs: BTreeMap<String, Vec<DailyLogEntry>>,
    /// Activities recorded since the last save, waiting to be sent to the remote log.
    #[serde(skip)]
    pub pending_activities: Vec<Activity>,
}

impl AppData {
    /// Repairs entries whose stored name is missing.
    pub fn normalize(&mut self) {
        for (key, participant) in self.participants.iter_mut() {
            if participant.name.is_empty() {
                participant.name = key.clone();
            }
        }
    }
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            admin: AdminSettings::default(),
            global_habits: vec![
                Habit::seed("water", "💧", "Drink water", "8 glasses a day", 10),
                Habit::seed("prayer", "🕌", "Prayer", "5 times a day", 15),
                Habit::seed("reading", "📖", "Reading", "At least 15 minutes", 10),
            ],
            participants: BTreeMap::new(),
            activities: Vec::new(),
            daily_logs: BTreeMap::new(),
            pending_activities: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateParticipantRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct HabitStatusRequest {
    pub completed: bool,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHabitRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RewardRequest {
    pub title: String,
    pub points: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub authenticated: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteHistoryQuery {
    #[serde(default)]
    pub participant: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HabitToggle {
    pub habit_id: String,
    pub completed: bool,
    pub points_delta: i64,
    pub points: i64,
    pub progress: TodayProgress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreakResponse {
    pub name: String,
    pub streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub points: i64,
    pub streak: u32,
    pub total_completed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statistics {
    pub total_participants: usize,
    pub total_habits_today: usize,
    pub total_rewards: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantDay {
    pub date: String,
    pub total_points: i64,
    pub logs: Vec<DailyLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantLogGroup {
    pub participant: String,
    pub points: i64,
    pub logs: Vec<DailyLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitionDay {
    pub date: String,
    pub total_points: i64,
    pub participants: Vec<ParticipantLogGroup>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteHistoryResponse {
    pub history: Vec<serde_json::Value>,
}
