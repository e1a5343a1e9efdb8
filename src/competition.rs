use crate::models::{
    Activity, AppData, DEFAULT_HABIT_DESCRIPTION, DEFAULT_HABIT_ICON, DEFAULT_HABIT_POINTS,
    DailyLogEntry, Habit, HabitToggle, LogAction, NewHabitRequest, Participant, Reward,
};
use crate::stats::{date_key, progress_on, streak_at};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

pub const MAX_ACTIVITIES: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompetitionError {
    #[error("participant name must not be empty")]
    EmptyName,
    #[error("participant '{0}' already exists")]
    ParticipantExists(String),
    #[error("participant '{0}' not found")]
    ParticipantNotFound(String),
    #[error("habit '{0}' not found")]
    HabitNotFound(String),
    #[error("habit name must not be empty")]
    EmptyHabitName,
    #[error("reward title must not be empty")]
    EmptyRewardTitle,
}

pub fn create_participant(
    data: &mut AppData,
    name: &str,
    now: DateTime<Local>,
) -> Result<Participant, CompetitionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CompetitionError::EmptyName);
    }
    if data.participants.contains_key(name) {
        return Err(CompetitionError::ParticipantExists(name.to_string()));
    }

    let participant = Participant {
        name: name.to_string(),
        points: 0,
        streak: 0,
        total_completed: 0,
        habits: data.global_habits.clone(),
        daily_progress: BTreeMap::new(),
        rewards: Vec::new(),
        joined_at: now.with_timezone(&Utc),
    };
    data.participants
        .insert(name.to_string(), participant.clone());
    add_activity(
        data,
        format!("{name} joined the competition"),
        Some(name),
        now,
    );
    Ok(participant)
}

pub fn update_habit_status(
    data: &mut AppData,
    name: &str,
    habit_id: &str,
    completed: bool,
    date: NaiveDate,
    now: DateTime<Local>,
) -> Result<HabitToggle, CompetitionError> {
    let participant = participant_mut(data, name)?;

    let day = participant.daily_progress.entry(date_key(date)).or_default();
    let was_completed = day.get(habit_id).copied().unwrap_or(false);
    day.insert(habit_id.to_string(), completed);

    let (habit_points, habit_label) = match participant.habits.iter().find(|h| h.id == habit_id) {
        Some(habit) => (habit.points, habit.name.clone()),
        None => (DEFAULT_HABIT_POINTS, habit_id.to_string()),
    };

    let points_delta = match (was_completed, completed) {
        (false, true) => {
            participant.points = participant.points.saturating_add(habit_points);
            participant.total_completed = participant.total_completed.saturating_add(1);
            habit_points
        }
        (true, false) => {
            participant.points = participant.points.saturating_sub(habit_points);
            participant.total_completed = participant.total_completed.saturating_sub(1);
            habit_points.saturating_neg()
        }
        _ => 0,
    };

    let toggle = HabitToggle {
        habit_id: habit_id.to_string(),
        completed,
        points_delta,
        points: participant.points,
        progress: progress_on(participant, date),
    };

    if completed && !was_completed {
        add_activity(
            data,
            format!("{name} completed habit: {habit_label}"),
            Some(name),
            now,
        );
        log_daily_activity(data, name, &habit_label, LogAction::Completed, habit_points, now);
    } else if !completed && was_completed {
        log_daily_activity(data, name, &habit_label, LogAction::Undone, -habit_points, now);
    }

    Ok(toggle)
}

/// Marks every habit that is still open today.
pub fn complete_all_habits(
    data: &mut AppData,
    name: &str,
    now: DateTime<Local>,
) -> Result<Vec<HabitToggle>, CompetitionError> {
    let today = now.date_naive();
    let participant = participant_mut(data, name)?;
    let done = participant.daily_progress.get(&date_key(today));
    let open: Vec<String> = participant
        .habits
        .iter()
        .filter(|habit| !done.and_then(|flags| flags.get(&habit.id)).copied().unwrap_or(false))
        .map(|habit| habit.id.clone())
        .collect();

    open.iter()
        .map(|habit_id| update_habit_status(data, name, habit_id, true, today, now))
        .collect()
}

pub fn reset_day(
    data: &mut AppData,
    name: &str,
    now: DateTime<Local>,
) -> Result<Vec<HabitToggle>, CompetitionError> {
    let today = now.date_naive();
    let habit_ids: Vec<String> = participant_mut(data, name)?
        .habits
        .iter()
        .map(|habit| habit.id.clone())
        .collect();

    habit_ids
        .iter()
        .map(|habit_id| update_habit_status(data, name, habit_id, false, today, now))
        .collect()
}

pub fn give_reward(
    data: &mut AppData,
    name: &str,
    title: &str,
    points: i64,
    now: DateTime<Local>,
) -> Result<Participant, CompetitionError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CompetitionError::EmptyRewardTitle);
    }

    let participant = participant_mut(data, name)?;
    participant.rewards.push(Reward {
        title: title.to_string(),
        points,
        date: now.with_timezone(&Utc),
    });
    participant.points = participant.points.saturating_add(points);
    let updated = participant.clone();

    add_activity(
        data,
        format!("{name} received reward: {title} ({points:+} points)"),
        Some(name),
        now,
    );
    log_daily_activity(data, name, title, LogAction::Reward, points, now);
    Ok(updated)
}

pub fn add_participant_habit(
    data: &mut AppData,
    name: &str,
    request: NewHabitRequest,
    now: DateTime<Local>,
) -> Result<Habit, CompetitionError> {
    let participant = participant_mut(data, name)?;
    let id = unique_habit_id("habit", &participant.habits, now);
    let habit = build_habit(id, request)?;
    participant.habits.push(habit.clone());

    add_activity(
        data,
        format!("{name} added a new habit: {}", habit.name),
        Some(name),
        now,
    );
    Ok(habit)
}

pub fn remove_participant_habit(
    data: &mut AppData,
    name: &str,
    habit_id: &str,
) -> Result<(), CompetitionError> {
    let participant = participant_mut(data, name)?;
    let before = participant.habits.len();
    participant.habits.retain(|habit| habit.id != habit_id);
    if participant.habits.len() == before {
        return Err(CompetitionError::HabitNotFound(habit_id.to_string()));
    }
    Ok(())
}

pub fn add_global_habit(
    data: &mut AppData,
    request: NewHabitRequest,
    now: DateTime<Local>,
) -> Result<Habit, CompetitionError> {
    let id = unique_habit_id("global", &data.global_habits, now);
    let habit = build_habit(id, request)?;
    data.global_habits.push(habit.clone());
    add_activity(
        data,
        format!("New global habit added: {}", habit.name),
        None,
        now,
    );
    Ok(habit)
}

/// Participants keep their own copies of the habit.
pub fn remove_global_habit(data: &mut AppData, habit_id: &str) -> Result<(), CompetitionError> {
    let before = data.global_habits.len();
    data.global_habits.retain(|habit| habit.id != habit_id);
    if data.global_habits.len() == before {
        return Err(CompetitionError::HabitNotFound(habit_id.to_string()));
    }
    Ok(())
}

/// Recomputes the streak and stores it on the participant.
pub fn refresh_streak(
    data: &mut AppData,
    name: &str,
    today: NaiveDate,
) -> Result<u32, CompetitionError> {
    let participant = participant_mut(data, name)?;
    participant.streak = streak_at(participant, today);
    Ok(participant.streak)
}

pub fn verify_admin_password(data: &AppData, password: &str) -> bool {
    data.admin.password == password.trim()
}

pub fn add_activity(
    data: &mut AppData,
    message: impl Into<String>,
    participant: Option<&str>,
    now: DateTime<Local>,
) {
    let activity = Activity {
        message: message.into(),
        participant: participant.map(str::to_string),
        timestamp: now.with_timezone(&Utc),
    };

    data.activities.insert(0, activity.clone());
    data.activities.truncate(MAX_ACTIVITIES);
    data.pending_activities.push(activity);
}

/// Filed under the day the action happened, whatever day it edited.
pub fn log_daily_activity(
    data: &mut AppData,
    participant: &str,
    habit: &str,
    action: LogAction,
    points: i64,
    now: DateTime<Local>,
) {
    data.daily_logs
        .entry(date_key(now.date_naive()))
        .or_default()
        .push(DailyLogEntry {
            participant: participant.to_string(),
            habit: habit.to_string(),
            action,
            points,
            time: now.format("%H:%M:%S").to_string(),
        });
}

fn participant_mut<'a>(
    data: &'a mut AppData,
    name: &str,
) -> Result<&'a mut Participant, CompetitionError> {
    data.participants
        .get_mut(name)
        .ok_or_else(|| CompetitionError::ParticipantNotFound(name.to_string()))
}

fn build_habit(id: String, request: NewHabitRequest) -> Result<Habit, CompetitionError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(CompetitionError::EmptyHabitName);
    }

    let non_blank = |value: Option<String>| value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    Ok(Habit {
        id,
        icon: non_blank(request.icon).unwrap_or_else(|| DEFAULT_HABIT_ICON.to_string()),
        name: name.to_string(),
        description: non_blank(request.description)
            .unwrap_or_else(|| DEFAULT_HABIT_DESCRIPTION.to_string()),
        points: match request.points {
            Some(0) | None => DEFAULT_HABIT_POINTS,
            Some(points) => points,
        },
    })
}

fn unique_habit_id(prefix: &str, existing: &[Habit], now: DateTime<Local>) -> String {
    let base = format!("{prefix}_{}", now.timestamp_millis());
    let taken = |id: &str| existing.iter().any(|habit| habit.id == id);
    if !taken(&base) {
        return base;
    }

    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
