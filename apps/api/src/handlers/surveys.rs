use axum::Json;
use axum::extract::{Extension, Path, State};

use sondeo_application::resolve_tenant;
use sondeo_core::UserIdentity;
use sondeo_domain::{QuestionId, SurveyId};

use crate::dto::{NextQuestionRequest, NextQuestionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{parse_declared_tenant, parse_uuid};

pub async fn next_question_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((survey_id, question_id)): Path<(String, String)>,
    Json(payload): Json<NextQuestionRequest>,
) -> ApiResult<Json<NextQuestionResponse>> {
    let survey_id = SurveyId::from_uuid(parse_uuid(&survey_id, "survey id")?);
    let question_id = QuestionId::from_uuid(parse_uuid(&question_id, "question id")?);
    let declared_tenant = parse_declared_tenant(payload.tenant_id.as_deref())?;
    let tenant_id = resolve_tenant(&user, declared_tenant)?;

    let next = state
        .survey_service
        .advance(tenant_id, survey_id, question_id, &payload.answer)
        .await?;

    Ok(Json(NextQuestionResponse {
        next_question_id: next.map(|question_id| question_id.to_string()),
    }))
}
