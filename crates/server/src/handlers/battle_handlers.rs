//! # Battle Route Handlers
//!
//! The two weekly battle jobs: opening a battle with a fresh ingredient pair
//! and ranking the winners of a finished one.

use super::{wrap_response, ApiResponse, AppError, AppState, DebugParams};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use mealforge::battle::{
    generate_battle_ingredients, participants_from_record, rank_winners, week_id, NewBattle,
    Winner,
};
use mealforge::prompts::BATTLE_INGREDIENTS_TASK;
use mealforge::{render_prompt, Record};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

// --- API Payloads for Battle Handlers ---

#[derive(Deserialize, Debug, Default)]
pub struct BattleIngredientsRequest {
    /// Start date of the battle; today (UTC) when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Date keys of the battles that already exist.
    #[serde(default)]
    pub existing_battles: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct BattleWinnersRequest {
    /// Date key of the finished battle.
    #[serde(default)]
    pub battle_key: Option<String>,
    /// User id to participant data (`{"votes": [...]}`).
    pub participants: Record,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BattleWinnersResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_id: Option<String>,
    pub winners: Vec<Winner>,
}

// --- Battle Handlers ---

/// Asks the model for this week's two ingredients.
pub async fn battle_ingredients_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<BattleIngredientsRequest>,
) -> Result<Json<ApiResponse<NewBattle>>, AppError> {
    let date = payload.date.unwrap_or_else(|| Utc::now().date_naive());
    let date_text = date.to_string();
    info!("Generating battle ingredients for {date_text}");

    let (task, provider) = app_state.task(BATTLE_INGREDIENTS_TASK)?;
    let user_prompt = render_prompt(&task.user_prompt, &[("date", date_text.as_str())]);
    let pair = generate_battle_ingredients(
        provider,
        &task.system_prompt,
        &user_prompt,
        app_state.config.battle.max_attempts,
    )
    .await?;

    let battle = NewBattle::new(
        pair,
        date,
        payload.existing_battles.iter().map(String::as_str),
    );
    let debug_info = Some(json!({ "userPrompt": user_prompt }));
    Ok(wrap_response(battle, debug_params, debug_info))
}

/// Ranks the participants of a finished battle and assigns points.
pub async fn battle_winners_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<BattleWinnersRequest>,
) -> Result<Json<ApiResponse<BattleWinnersResponse>>, AppError> {
    let participants = participants_from_record(&payload.participants);
    info!("Ranking {} battle participants", participants.len());
    let winners = rank_winners(&participants, &app_state.config.battle.points)?;

    let response = BattleWinnersResponse {
        week_id: payload.battle_key.as_deref().map(week_id),
        winners,
    };
    let debug_info = Some(json!({ "participants": participants }));
    Ok(wrap_response(response, debug_params, debug_info))
}
