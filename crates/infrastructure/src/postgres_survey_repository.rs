use std::str::FromStr;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use sondeo_application::SurveyRepository;
use sondeo_core::{AppError, AppResult, TenantId};
use sondeo_domain::{LogicRule, Question, QuestionId, QuestionType, SurveyId};

/// PostgreSQL-backed repository for published survey questions.
#[derive(Clone)]
pub struct PostgresSurveyRepository {
    pool: PgPool,
}

impl PostgresSurveyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: uuid::Uuid,
    question_text: String,
    question_type: String,
    options: Value,
    logic_rules: Value,
}

impl QuestionRow {
    fn into_question(self) -> AppResult<Question> {
        let question_type = QuestionType::from_str(&self.question_type)?;
        let options: Vec<String> = serde_json::from_value(self.options).map_err(|error| {
            AppError::Internal(format!("failed to decode question options: {error}"))
        })?;
        let logic_rules: Vec<LogicRule> =
            serde_json::from_value(self.logic_rules).map_err(|error| {
                AppError::Internal(format!("failed to decode question logic rules: {error}"))
            })?;

        Question::new(
            QuestionId::from_uuid(self.id),
            self.question_text,
            question_type,
            options,
            logic_rules,
        )
    }
}

#[async_trait]
impl SurveyRepository for PostgresSurveyRepository {
    async fn find_question(
        &self,
        tenant_id: TenantId,
        survey_id: SurveyId,
        question_id: QuestionId,
    ) -> AppResult<Option<Question>> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_text, question_type, options, logic_rules
            FROM survey_questions
            WHERE tenant_id = $1 AND survey_id = $2 AND id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(survey_id.as_uuid())
        .bind(question_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load question: {error}")))?;

        row.map(QuestionRow::into_question).transpose()
    }
}
