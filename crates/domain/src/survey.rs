use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sondeo_core::{AppError, AppResult, NonEmptyString};
use uuid::Uuid;

/// Stable identifier of a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyId(Uuid);

impl SurveyId {
    /// Creates a random survey identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a survey identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SurveyId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SurveyId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Stable identifier of a survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Creates a random question identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a question identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QuestionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Free-form text answer.
    Text,
    /// Single choice from the option list.
    SingleChoice,
    /// Multiple choices from the option list.
    MultipleChoice,
    /// Numeric rating answer.
    Rating,
}

impl QuestionType {
    /// Returns a stable storage value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::SingleChoice => "single_choice",
            Self::MultipleChoice => "multiple_choice",
            Self::Rating => "rating",
        }
    }

    /// Returns whether this type requires a non-empty option list.
    #[must_use]
    pub fn requires_options(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

impl FromStr for QuestionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "single_choice" => Ok(Self::SingleChoice),
            "multiple_choice" => Ok(Self::MultipleChoice),
            "rating" => Ok(Self::Rating),
            _ => Err(AppError::Validation(format!(
                "unknown question type '{value}'"
            ))),
        }
    }
}

/// Comparison operator of a logic condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    /// Strict value equality.
    Equals,
    /// Negation of strict equality.
    NotEquals,
    /// Numeric comparison after coercing both sides.
    GreaterThan,
    /// Numeric comparison after coercing both sides.
    LessThan,
    /// Element containment in a collection answer.
    Includes,
}

impl LogicOperator {
    /// Returns a stable storage value for this operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Includes => "includes",
        }
    }
}

impl FromStr for LogicOperator {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "includes" => Ok(Self::Includes),
            _ => Err(AppError::Validation(format!(
                "unknown logic operator '{value}'"
            ))),
        }
    }
}

/// Condition evaluated against a submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicCondition {
    /// Comparison operator.
    pub operator: LogicOperator,
    /// Comparison value.
    pub value: Value,
}

/// A condition/branch-target pair attached to a question.
///
/// Rules are evaluated in declaration order; the first matching rule wins.
/// There is no priority field and no multi-match merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicRule {
    /// Condition to evaluate against the answer.
    pub condition: LogicCondition,
    /// Question to branch to when the condition matches.
    pub next_question_id: QuestionId,
}

/// A survey question with its ordered branching rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: NonEmptyString,
    question_type: QuestionType,
    options: Vec<String>,
    logic_rules: Vec<LogicRule>,
}

impl Question {
    /// Creates a validated question.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        question_type: QuestionType,
        options: Vec<String>,
        logic_rules: Vec<LogicRule>,
    ) -> AppResult<Self> {
        if question_type.requires_options() && options.is_empty() {
            return Err(AppError::Validation(format!(
                "question type '{}' requires at least one option",
                question_type.as_str()
            )));
        }

        Ok(Self {
            id,
            text: NonEmptyString::new(text)?,
            question_type,
            options,
            logic_rules,
        })
    }

    /// Returns the question identifier.
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// Returns the question text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Returns the question type.
    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    /// Returns the answer options.
    #[must_use]
    pub fn options(&self) -> &[String] {
        self.options.as_slice()
    }

    /// Returns the branching rules in declaration order.
    #[must_use]
    pub fn logic_rules(&self) -> &[LogicRule] {
        self.logic_rules.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{LogicOperator, Question, QuestionId, QuestionType};

    #[test]
    fn operator_roundtrip_storage_value() {
        for operator in [
            LogicOperator::Equals,
            LogicOperator::NotEquals,
            LogicOperator::GreaterThan,
            LogicOperator::LessThan,
            LogicOperator::Includes,
        ] {
            let restored = LogicOperator::from_str(operator.as_str());
            assert_eq!(restored.ok(), Some(operator));
        }
    }

    #[test]
    fn choice_question_requires_options() {
        let result = Question::new(
            QuestionId::new(),
            "How did you hear about us?",
            QuestionType::SingleChoice,
            Vec::new(),
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn text_question_allows_empty_options() {
        let result = Question::new(
            QuestionId::new(),
            "Anything else?",
            QuestionType::Text,
            Vec::new(),
            Vec::new(),
        );
        assert!(result.is_ok());
    }
}
