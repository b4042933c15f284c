//! The structured answer to a multiple-choice question.
//!
//! Gemini replies with free-form JSON, so the payload is parsed as an untyped
//! [`serde_json::Value`] and only promoted to [`AnswerResult`] once it passes
//! [`AnswerResult::from_value`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question: String,
    pub options: Vec<AnswerOption>,
    /// Always equals the `label` of one entry in `options`.
    pub answer_label: String,
    pub explanation: String,
}

/// Why a parsed payload was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnswerValidationError {
    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` has the wrong type")]
    WrongType(String),

    #[error("no answer options")]
    NoOptions,

    #[error("answer label `{0}` matches no option")]
    UnknownAnswerLabel(String),

    #[error("answer label `{0}` matches more than one option")]
    AmbiguousAnswerLabel(String),
}

impl AnswerResult {
    /// Validates an untyped payload and builds the answer from it.
    pub fn from_value(value: Value) -> Result<Self, AnswerValidationError> {
        let Value::Object(map) = value else {
            return Err(AnswerValidationError::NotAnObject);
        };

        let question = required_str(&map, "question")?;
        let answer_label = required_str(&map, "answerLabel")?;
        let explanation = required_str(&map, "explanation")?;

        let raw_options = map
            .get("options")
            .ok_or(AnswerValidationError::MissingField("options"))?
            .as_array()
            .ok_or_else(|| AnswerValidationError::WrongType("options".to_string()))?;

        if raw_options.is_empty() {
            return Err(AnswerValidationError::NoOptions);
        }

        let options = raw_options
            .iter()
            .enumerate()
            .map(|(i, raw)| -> Result<AnswerOption, AnswerValidationError> {
                let field = |name: &str| {
                    raw.get(name)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| AnswerValidationError::WrongType(format!("options[{i}].{name}")))
                };
                Ok(AnswerOption {
                    label: field("label")?,
                    text: field("text")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match options.iter().filter(|o| o.label == answer_label).count() {
            1 => {}
            0 => return Err(AnswerValidationError::UnknownAnswerLabel(answer_label)),
            _ => return Err(AnswerValidationError::AmbiguousAnswerLabel(answer_label)),
        }

        Ok(Self {
            question,
            options,
            answer_label,
            explanation,
        })
    }

    /// The option the model picked.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| self.is_correct(o))
    }

    pub fn is_correct(&self, option: &AnswerOption) -> bool {
        option.label == self.answer_label
    }
}

fn required_str(
    map: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<String, AnswerValidationError> {
    map.get(name)
        .ok_or(AnswerValidationError::MissingField(name))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AnswerValidationError::WrongType(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn addition() -> Value {
        json!({
            "question": "2+2=?",
            "options": [{"label": "A", "text": "3"}, {"label": "B", "text": "4"}],
            "answerLabel": "B",
            "explanation": "Basic addition."
        })
    }

    #[test]
    fn accepts_well_formed_answer() {
        let answer = AnswerResult::from_value(addition()).unwrap();
        assert_eq!(answer.question, "2+2=?");
        assert_eq!(answer.options.len(), 2);
        assert_eq!(answer.correct_option().unwrap().text, "4");
        assert!(!answer.is_correct(&answer.options[0]));
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let answer = AnswerResult::from_value(addition()).unwrap();
        assert_eq!(serde_json::to_value(&answer).unwrap(), addition());
    }

    #[test]
    fn rejects_missing_and_mistyped_fields() {
        let mut payload = addition();
        payload.as_object_mut().unwrap().remove("explanation");
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::MissingField("explanation"))
        );

        let mut payload = addition();
        payload["options"] = json!("A, B");
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::WrongType("options".to_string()))
        );

        let mut payload = addition();
        payload["options"][1]["text"] = json!(4);
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::WrongType("options[1].text".to_string()))
        );
    }

    #[test]
    fn rejects_label_outside_options() {
        let mut payload = addition();
        payload["answerLabel"] = json!("C");
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::UnknownAnswerLabel("C".to_string()))
        );
    }

    #[test]
    fn rejects_duplicate_answer_label() {
        let mut payload = addition();
        payload["options"] = json!([
            {"label": "A", "text": "3"},
            {"label": "B", "text": "4"},
            {"label": "B", "text": "5"}
        ]);
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::AmbiguousAnswerLabel("B".to_string()))
        );
    }

    #[test]
    fn rejects_empty_options_and_non_objects() {
        let mut payload = addition();
        payload["options"] = json!([]);
        assert_eq!(
            AnswerResult::from_value(payload),
            Err(AnswerValidationError::NoOptions)
        );
        assert_eq!(
            AnswerResult::from_value(json!([1, 2])),
            Err(AnswerValidationError::NotAnObject)
        );
    }
}
