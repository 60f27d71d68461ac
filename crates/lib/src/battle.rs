//! # Weekly Battles
//!
//! Helpers for the weekly cooking challenge: picking the two battle
//! ingredients with the model, computing date keys and ranking winners.

use crate::errors::BattleError;
use crate::providers::ai::AiProvider;
use crate::types::Record;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Points for first and second place.
pub const DEFAULT_POINTS: [i64; 2] = [30, 20];

/// Model calls made before giving up on an ingredient pair.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Days from a battle's start to its deadline.
const BATTLE_LENGTH_DAYS: u64 = 6;

/// Minimum number of participants for a battle to have winners.
const MIN_PARTICIPANTS: usize = 2;

/// Reads the first two names of a comma-separated model answer, lowercased.
pub fn parse_ingredient_pair(text: &str) -> Option<(String, String)> {
    let mut names = text
        .split(',')
        .map(|name| {
            name.trim()
                .trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | '`'))
                .trim()
                .to_lowercase()
        })
        .filter(|name| !name.is_empty());
    let first = names.next()?;
    let second = names.next()?;
    Some((first, second))
}

/// `YYYY-MM-DD`.
pub fn battle_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn battle_deadline(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(BATTLE_LENGTH_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// The most recent existing battle key. Keys are `YYYY-MM-DD`, so the
/// lexicographic maximum is the latest date.
pub fn previous_battle_key<'a, I>(keys: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter().max().map(str::to_string)
}

/// Document id of a week's winner record.
pub fn week_id(battle_key: &str) -> String {
    format!("week_{battle_key}")
}

/// A new battle week, ready to be stored under its date key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBattle {
    pub date_key: String,
    pub ingredients: Vec<String>,
    pub status: String,
    pub battle_deadline: NaiveDate,
    pub prev_battle: Option<String>,
}

impl NewBattle {
    pub fn new<'a, I>(pair: (String, String), today: NaiveDate, existing_keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self {
            date_key: battle_date_key(today),
            ingredients: vec![pair.0, pair.1],
            status: "active".to_string(),
            battle_deadline: battle_deadline(today),
            prev_battle: previous_battle_key(existing_keys),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub votes: usize,
}

/// Reads a `{userId: {votes: [...]}}` participants map. The vote count is
/// the length of the `votes` list; a bare number is accepted too.
pub fn participants_from_record(participants: &Record) -> Vec<Participant> {
    participants
        .iter()
        .map(|(user_id, data)| {
            let votes = match data.get("votes") {
                Some(Value::Array(voters)) => voters.len(),
                Some(Value::Number(count)) => count.as_u64().unwrap_or(0) as usize,
                _ => 0,
            };
            Participant {
                user_id: user_id.clone(),
                votes,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub user_id: String,
    /// 1-based.
    pub position: usize,
    pub votes: usize,
    pub points_awarded: i64,
}

/// Orders participants by votes (ties by user id) and awards `points` to the
/// top `points.len()`.
pub fn rank_winners(
    participants: &[Participant],
    points: &[i64],
) -> Result<Vec<Winner>, BattleError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(BattleError::NotEnoughParticipants(participants.len()));
    }
    let mut ranked: Vec<&Participant> = participants.iter().collect();
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.user_id.cmp(&b.user_id)));

    Ok(ranked
        .into_iter()
        .zip(points)
        .enumerate()
        .map(|(i, (participant, award))| Winner {
            user_id: participant.user_id.clone(),
            position: i + 1,
            votes: participant.votes,
            points_awarded: *award,
        })
        .collect())
}

/// Asks the model for two ingredients until an answer parses.
pub async fn generate_battle_ingredients(
    provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt: &str,
    max_attempts: usize,
) -> Result<(String, String), BattleError> {
    let attempts = max_attempts.max(1);
    let mut last_response = String::new();
    for attempt in 1..=attempts {
        info!("Attempt {attempt}/{attempts} to generate battle ingredients");
        match provider.generate(system_prompt, user_prompt).await {
            Ok(text) => {
                if let Some(pair) = parse_ingredient_pair(&text) {
                    info!("Battle ingredients: {} and {}", pair.0, pair.1);
                    return Ok(pair);
                }
                warn!("Model did not return two ingredients. Raw response: {text:?}");
                last_response = text;
            }
            Err(e) => {
                warn!("AI provider failed while generating battle ingredients: {e}");
                last_response = e.to_string();
            }
        }
    }
    Err(BattleError::NoIngredientPair {
        attempts,
        last_response,
    })
}
