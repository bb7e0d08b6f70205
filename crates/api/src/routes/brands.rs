//! Brand routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::projects::ListResponse;
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_db::BrandRepository;
use contentforge_db::entities::brand;
use contentforge_db::repositories::NewBrand;

/// Creates the brand router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", post(create_brand).get(list_brands))
        .route("/brands/{id}", delete(delete_brand))
}

/// Body of `POST /brands`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrandBody {
    /// Brand name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Voice used when generating content, a string or an object with a
    /// `description`.
    #[serde(default)]
    pub voice_profile: Option<serde_json::Value>,
    /// Colours, fonts, logos.
    #[serde(default)]
    pub visual_identity: Option<serde_json::Value>,
    /// Industry.
    #[serde(default)]
    pub industry: Option<String>,
    /// Audience.
    #[serde(default)]
    pub target_audience: Option<String>,
}

/// Prompt text for a brand's voice profile.
pub(crate) fn brand_voice(brand: &brand::Model) -> Option<String> {
    let voice = match brand.voice_profile.as_ref()? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Object(map) => match map.get("description") {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            _ => serde_json::Value::Object(map.clone()).to_string(),
        },
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    (!voice.is_empty()).then_some(voice)
}

/// POST /brands
async fn create_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateBrandBody>,
) -> ApiResult<(StatusCode, Json<brand::Model>)> {
    body.validate()?;

    let brand = BrandRepository::new(state.conn())
        .create(
            auth.user_id(),
            NewBrand {
                name: body.name,
                description: body.description,
                voice_profile: body.voice_profile,
                visual_identity: body.visual_identity,
                industry: body.industry,
                target_audience: body.target_audience,
            },
        )
        .await?;

    info!(brand_id = %brand.id, user_id = %auth.user_id(), "Brand created");
    Ok((StatusCode::CREATED, Json(brand)))
}

/// GET /brands
async fn list_brands(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ListResponse<brand::Model>>> {
    let data = BrandRepository::new(state.conn())
        .list_by_user(auth.user_id())
        .await?;
    Ok(Json(ListResponse { data }))
}

/// DELETE /brands/{id}
async fn delete_brand(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !BrandRepository::new(state.conn())
        .delete_owned(id, auth.user_id())
        .await?
    {
        return Err(ApiError::not_found("Brand"));
    }

    info!(brand_id = %id, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn brand_with(voice: Option<serde_json::Value>) -> brand::Model {
        let now = chrono::Utc::now().naive_utc();
        brand::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Acme".to_string(),
            description: None,
            voice_profile: voice,
            visual_identity: None,
            industry: None,
            target_audience: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(Some(json!("Warm and direct")), Some("Warm and direct"))]
    #[case(Some(json!({ "description": " Playful " })), Some("Playful"))]
    #[case(Some(json!({ "tone": "bold" })), Some(r#"{"tone":"bold"}"#))]
    #[case(Some(json!("   ")), None)]
    #[case(Some(serde_json::Value::Null), None)]
    #[case(None, None)]
    fn test_brand_voice(#[case] profile: Option<serde_json::Value>, #[case] expected: Option<&str>) {
        assert_eq!(brand_voice(&brand_with(profile)).as_deref(), expected);
    }

    #[test]
    fn test_create_body_requires_name() {
        let body = CreateBrandBody {
            name: String::new(),
            description: None,
            voice_profile: None,
            visual_identity: None,
            industry: None,
            target_audience: None,
        };
        assert!(body.validate().is_err());
    }
}
