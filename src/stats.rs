use crate::models::{
    AppData, CompetitionDay, DailyLogEntry, LeaderboardEntry, Participant, ParticipantDay,
    ParticipantLogGroup, Statistics, TodayProgress,
};
use chrono::{Duration, Local, NaiveDate};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;
const MAX_STREAK_DAYS: i64 = 365;

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn history_window(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, MAX_HISTORY_DAYS)
}

/// Sorted by points, highest first. Ties keep name order.
pub fn leaderboard(data: &AppData) -> Vec<LeaderboardEntry> {
    let mut participants: Vec<&Participant> = data.participants.values().collect();
    participants.sort_by(|a, b| b.points.cmp(&a.points));

    participants
        .into_iter()
        .enumerate()
        .map(|(index, participant)| LeaderboardEntry {
            rank: index + 1,
            name: participant.name.clone(),
            points: participant.points,
            streak: participant.streak,
            total_completed: participant.total_completed,
        })
        .collect()
}

pub fn build_statistics(data: &AppData) -> Statistics {
    build_statistics_at(today(), data)
}

pub fn build_statistics_at(today: NaiveDate, data: &AppData) -> Statistics {
    let key = date_key(today);
    let mut total_habits_today = 0usize;
    let mut total_rewards = 0usize;

    for participant in data.participants.values() {
        if let Some(progress) = participant.daily_progress.get(&key) {
            total_habits_today += progress.values().filter(|done| **done).count();
        }
        total_rewards += participant.rewards.len();
    }

    Statistics {
        total_participants: data.participants.len(),
        total_habits_today,
        total_rewards,
    }
}

/// Only habits the participant currently has are counted.
pub fn progress_on(participant: &Participant, date: NaiveDate) -> TodayProgress {
    let total = participant.habits.len();
    let completed = completed_on(participant, date);
    let percentage = if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };

    TodayProgress {
        completed,
        total,
        percentage,
    }
}

fn completed_on(participant: &Participant, date: NaiveDate) -> usize {
    let Some(progress) = participant.daily_progress.get(&date_key(date)) else {
        return 0;
    };
    participant
        .habits
        .iter()
        .filter(|habit| progress.get(&habit.id).copied().unwrap_or(false))
        .count()
}

/// Consecutive fully-completed days ending today.
pub fn streak_at(participant: &Participant, today: NaiveDate) -> u32 {
    let total = participant.habits.len();
    if total == 0 {
        return 0;
    }

    let mut streak = 0u32;
    for offset in 0..MAX_STREAK_DAYS {
        let date = today - Duration::days(offset);
        if !participant.daily_progress.contains_key(&date_key(date)) {
            break;
        }
        if completed_on(participant, date) != total {
            break;
        }
        streak += 1;
    }
    streak
}

pub fn daily_logs(data: &AppData, date: NaiveDate) -> Vec<DailyLogEntry> {
    data.daily_logs
        .get(&date_key(date))
        .cloned()
        .unwrap_or_default()
}

fn sum_points(points: impl Iterator<Item = i64>) -> i64 {
    points.fold(0, i64::saturating_add)
}

pub fn participant_history_at(
    today: NaiveDate,
    data: &AppData,
    name: &str,
    days: u32,
) -> Vec<ParticipantDay> {
    let mut history = Vec::new();
    for offset in 0..i64::from(days) {
        let key = date_key(today - Duration::days(offset));
        let Some(entries) = data.daily_logs.get(&key) else {
            continue;
        };

        let logs: Vec<DailyLogEntry> = entries
            .iter()
            .filter(|entry| entry.participant == name)
            .cloned()
            .collect();
        if logs.is_empty() {
            continue;
        }

        history.push(ParticipantDay {
            total_points: sum_points(logs.iter().map(|entry| entry.points)),
            date: key,
            logs,
        });
    }
    history
}

pub fn competition_history_at(today: NaiveDate, data: &AppData, days: u32) -> Vec<CompetitionDay> {
    let mut history = Vec::new();
    for offset in 0..i64::from(days) {
        let key = date_key(today - Duration::days(offset));
        let entries = match data.daily_logs.get(&key) {
            Some(entries) if !entries.is_empty() => entries,
            _ => continue,
        };

        let mut groups: Vec<ParticipantLogGroup> = Vec::new();
        for entry in entries {
            match groups
                .iter_mut()
                .find(|group| group.participant == entry.participant)
            {
                Some(group) => {
                    group.points = group.points.saturating_add(entry.points);
                    group.logs.push(entry.clone());
                }
                None => groups.push(ParticipantLogGroup {
                    participant: entry.participant.clone(),
                    points: entry.points,
                    logs: vec![entry.clone()],
                }),
            }
        }

        history.push(CompetitionDay {
            date: key,
            total_points: sum_points(groups.iter().map(|group| group.points)),
            participants: groups,
        });
    }
    history
}
