use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sondeo_core::{AppError, AppResult, TenantId};
use sondeo_domain::{Question, QuestionId, SurveyId, next_question};

/// Repository port for published survey questions.
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// Finds a question of a tenant's survey.
    async fn find_question(
        &self,
        tenant_id: TenantId,
        survey_id: SurveyId,
        question_id: QuestionId,
    ) -> AppResult<Option<Question>>;
}

/// Application service driving dynamic survey branching.
///
/// The branching evaluation itself is a pure domain function; this service
/// only loads the question. The caller keeps the "current question"
/// bookkeeping across submissions.
#[derive(Clone)]
pub struct SurveyService {
    repository: Arc<dyn SurveyRepository>,
}

impl SurveyService {
    /// Creates a new survey service.
    #[must_use]
    pub fn new(repository: Arc<dyn SurveyRepository>) -> Self {
        Self { repository }
    }

    /// Resolves the next question for a submitted answer, or `None` when
    /// the caller should advance sequentially.
    pub async fn advance(
        &self,
        tenant_id: TenantId,
        survey_id: SurveyId,
        question_id: QuestionId,
        answer: &Value,
    ) -> AppResult<Option<QuestionId>> {
        let question = self
            .repository
            .find_question(tenant_id, survey_id, question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".to_owned()))?;

        Ok(next_question(answer, &question))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use sondeo_core::{AppError, AppResult, TenantId};
    use sondeo_domain::{
        LogicCondition, LogicOperator, LogicRule, Question, QuestionId, QuestionType, SurveyId,
    };

    use super::{SurveyRepository, SurveyService};

    struct FakeSurveyRepository {
        question: Option<Question>,
    }

    #[async_trait]
    impl SurveyRepository for FakeSurveyRepository {
        async fn find_question(
            &self,
            _tenant_id: TenantId,
            _survey_id: SurveyId,
            _question_id: QuestionId,
        ) -> AppResult<Option<Question>> {
            Ok(self.question.clone())
        }
    }

    #[tokio::test]
    async fn advance_applies_the_branching_rules() {
        let target = QuestionId::new();
        let question = Question::new(
            QuestionId::new(),
            "Would you recommend us?",
            QuestionType::SingleChoice,
            vec!["yes".to_owned(), "no".to_owned()],
            vec![LogicRule {
                condition: LogicCondition {
                    operator: LogicOperator::Equals,
                    value: json!("no"),
                },
                next_question_id: target,
            }],
        );
        assert!(question.is_ok());
        let service = SurveyService::new(Arc::new(FakeSurveyRepository {
            question: question.ok(),
        }));

        let next = service
            .advance(TenantId::new(), SurveyId::new(), QuestionId::new(), &json!("no"))
            .await;
        assert_eq!(next.ok(), Some(Some(target)));
    }

    #[tokio::test]
    async fn advance_reports_missing_questions() {
        let service = SurveyService::new(Arc::new(FakeSurveyRepository { question: None }));

        let result = service
            .advance(
                TenantId::new(),
                SurveyId::new(),
                QuestionId::new(),
                &json!("yes"),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
