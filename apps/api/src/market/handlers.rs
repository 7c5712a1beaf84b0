use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::market::store::list_market_skills;
use crate::models::job::MarketSkillRow;
use crate::state::AppState;

/// GET /api/market/skills
/// Any signed-in role may read market demand, highest first.
pub async fn handle_market_skills(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<MarketSkillRow>>, AppError> {
    Ok(Json(list_market_skills(&state.db).await?))
}
