//! Conditional branching evaluation for survey questions.

use serde_json::Value;

use crate::survey::{LogicOperator, Question, QuestionId};

/// Resolves the next question for a submitted answer.
///
/// Rules are evaluated in declaration order and the first matching rule wins.
/// Returns `None` when the question has no rules or no rule matches; the
/// caller decides what sequential advancement means. Each call is a pure
/// function of one answer and one question; there is no cross-question state.
#[must_use]
pub fn next_question(answer: &Value, question: &Question) -> Option<QuestionId> {
    question
        .logic_rules()
        .iter()
        .find(|rule| condition_matches(answer, rule.condition.operator, &rule.condition.value))
        .map(|rule| rule.next_question_id)
}

fn condition_matches(answer: &Value, operator: LogicOperator, expected: &Value) -> bool {
    match operator {
        LogicOperator::Equals => answer == expected,
        LogicOperator::NotEquals => answer != expected,
        LogicOperator::GreaterThan => match (coerce_number(answer), coerce_number(expected)) {
            (Some(left), Some(right)) => left > right,
            // Non-numeric input coerces to nothing and never compares.
            _ => false,
        },
        LogicOperator::LessThan => match (coerce_number(answer), coerce_number(expected)) {
            (Some(left), Some(right)) => left < right,
            _ => false,
        },
        LogicOperator::Includes => answer
            .as_array()
            .is_some_and(|items| items.iter().any(|item| item == expected)),
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(content) => content.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::survey::{
        LogicCondition, LogicOperator, LogicRule, Question, QuestionId, QuestionType,
    };

    use super::next_question;

    fn rule(operator: LogicOperator, value: Value, next: QuestionId) -> LogicRule {
        LogicRule {
            condition: LogicCondition { operator, value },
            next_question_id: next,
        }
    }

    fn question(rules: Vec<LogicRule>) -> Question {
        let built = Question::new(
            QuestionId::new(),
            "How satisfied are you?",
            QuestionType::Text,
            Vec::new(),
            rules,
        );
        assert!(built.is_ok());
        built.unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn empty_rule_list_yields_none() {
        let next = next_question(&json!("A"), &question(Vec::new()));
        assert!(next.is_none());
    }

    #[test]
    fn first_matching_rule_wins() {
        let second = QuestionId::new();
        let third = QuestionId::new();
        let question = question(vec![
            rule(LogicOperator::Equals, json!("A"), second),
            rule(LogicOperator::Equals, json!("A"), third),
        ]);

        assert_eq!(next_question(&json!("A"), &question), Some(second));
    }

    #[test]
    fn unmatched_rules_fall_through_to_none() {
        let question = question(vec![rule(
            LogicOperator::Equals,
            json!("A"),
            QuestionId::new(),
        )]);

        assert!(next_question(&json!("B"), &question).is_none());
    }

    #[test]
    fn not_equals_matches_differing_answer() {
        let target = QuestionId::new();
        let question = question(vec![rule(LogicOperator::NotEquals, json!("A"), target)]);

        assert_eq!(next_question(&json!("B"), &question), Some(target));
        assert!(next_question(&json!("A"), &question).is_none());
    }

    #[test]
    fn greater_than_coerces_numeric_strings() {
        let target = QuestionId::new();
        let question = question(vec![rule(LogicOperator::GreaterThan, json!("5"), target)]);

        assert_eq!(next_question(&json!(7), &question), Some(target));
        assert_eq!(next_question(&json!("7"), &question), Some(target));
        assert!(next_question(&json!(3), &question).is_none());
    }

    #[test]
    fn non_numeric_answer_never_matches_numeric_operators() {
        let question = question(vec![
            rule(LogicOperator::GreaterThan, json!("5"), QuestionId::new()),
            rule(LogicOperator::LessThan, json!("5"), QuestionId::new()),
        ]);

        assert!(next_question(&json!("abc"), &question).is_none());
    }

    #[test]
    fn includes_requires_element_equality() {
        let target = QuestionId::new();
        let question = question(vec![rule(LogicOperator::Includes, json!("email"), target)]);

        assert_eq!(
            next_question(&json!(["phone", "email"]), &question),
            Some(target)
        );
        // Substring containment does not count.
        assert!(next_question(&json!(["emails"]), &question).is_none());
        // Scalar answers are not collections.
        assert!(next_question(&json!("email"), &question).is_none());
    }

    #[test]
    fn equals_distinguishes_number_and_string() {
        let target = QuestionId::new();
        let question = question(vec![rule(LogicOperator::Equals, json!(5), target)]);

        assert_eq!(next_question(&json!(5), &question), Some(target));
        assert!(next_question(&json!("5"), &question).is_none());
    }
}
