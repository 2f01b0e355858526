//! Declarative JSON shape validation
//!
//! One mechanism checks both incoming HTTP bodies and objects recovered from
//! LLM output. A [`Schema`] is a list of field rules; validation walks the
//! whole object and aggregates every violation instead of stopping at the
//! first one.

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::FieldError;

/// Accepted experience levels, in display order
pub const LEVELS: &[&str] = &["Junior", "Mid-level", "Senior", "Lead", "Principal"];

/// Constraint on a single JSON value
#[derive(Debug, Clone)]
pub enum Rule {
    /// String whose character count lies in `min..=max`
    Text { min: usize, max: usize },
    /// String equal to one of the listed values
    OneOf(&'static [&'static str]),
    /// Any JSON number
    Number,
    /// Array whose length lies in `min..=max`, each item checked against `items`
    List {
        min: usize,
        max: usize,
        items: Box<Rule>,
    },
    /// Nested object
    Object(Schema),
}

impl Rule {
    /// Non-empty string of any length
    pub fn non_empty() -> Self {
        Rule::Text {
            min: 1,
            max: usize::MAX,
        }
    }

    pub fn text(min: usize, max: usize) -> Self {
        Rule::Text { min, max }
    }

    pub fn list_of(items: Rule, min: usize, max: usize) -> Self {
        Rule::List {
            min,
            max,
            items: Box::new(items),
        }
    }

    /// Array of strings with no length bound
    pub fn strings() -> Self {
        Self::list_of(Rule::Text { min: 0, max: usize::MAX }, 0, usize::MAX)
    }

    fn check(&self, path: &str, value: &Value, errors: &mut Vec<FieldError>) {
        match self {
            Rule::Text { min, max } => {
                let Some(s) = value.as_str() else {
                    errors.push(FieldError::new(path, format!("{} must be a string", path)));
                    return;
                };
                let len = s.chars().count();
                if len == 0 && *min > 0 {
                    errors.push(FieldError::new(path, format!("{} must not be empty", path)));
                } else if len < *min {
                    errors.push(FieldError::new(
                        path,
                        format!("{} must be at least {} characters", path, min),
                    ));
                } else if len > *max {
                    errors.push(FieldError::new(
                        path,
                        format!("{} must not exceed {} characters", path, max),
                    ));
                }
            }
            Rule::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                _ => errors.push(FieldError::new(
                    path,
                    format!("{} must be one of: {}", path, allowed.join(", ")),
                )),
            },
            Rule::Number => {
                if !value.is_number() {
                    errors.push(FieldError::new(path, format!("{} must be a number", path)));
                }
            }
            Rule::List { min, max, items } => {
                let Some(array) = value.as_array() else {
                    errors.push(FieldError::new(path, format!("{} must be an array", path)));
                    return;
                };
                if array.len() < *min {
                    errors.push(FieldError::new(
                        path,
                        format!("{} must contain at least {} item(s)", path, min),
                    ));
                } else if array.len() > *max {
                    errors.push(FieldError::new(
                        path,
                        format!("{} must contain at most {} item(s)", path, max),
                    ));
                }
                for (i, item) in array.iter().enumerate() {
                    items.check(&format!("{}.{}", path, i), item, errors);
                }
            }
            Rule::Object(schema) => schema.check_at(path, value, errors),
        }
    }
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: &'static str,
    rule: Rule,
    required: bool,
}

/// A set of field rules for a JSON object. Unknown fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldRule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: &'static str, rule: Rule) -> Self {
        self.fields.push(FieldRule {
            name,
            rule,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, rule: Rule) -> Self {
        self.fields.push(FieldRule {
            name,
            rule,
            required: false,
        });
        self
    }

    /// Validate a value, collecting every violation
    pub fn validate(&self, value: &Value) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.check_at("", value, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_at(&self, prefix: &str, value: &Value, errors: &mut Vec<FieldError>) {
        let Some(object) = value.as_object() else {
            let field = if prefix.is_empty() { "body" } else { prefix };
            errors.push(FieldError::new(field, format!("{} must be a JSON object", field)));
            return;
        };

        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{}.{}", prefix, field.name)
            };

            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        errors.push(FieldError::new(&path, format!("{} is required", path)));
                    }
                }
                Some(v) => field.rule.check(&path, v, errors),
            }
        }
    }
}

/// Join field errors into a single log-friendly line
pub fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// `POST /api/interviews/start` body
pub static START_INTERVIEW: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .required("role", Rule::text(2, 100))
        .required("level", Rule::OneOf(LEVELS))
        .required("topics", Rule::list_of(Rule::non_empty(), 1, 5))
});

/// `POST /api/interviews/:id/answer` body
pub static SUBMIT_ANSWER: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .required("answer", Rule::text(10, 5000))
        .optional(
            "audioMetadata",
            Rule::Object(
                Schema::new()
                    .optional("duration", Rule::Number)
                    .optional("pauseCount", Rule::Number)
                    .optional("averageConfidence", Rule::Number),
            ),
        )
});

/// Question object returned by the LLM
pub static QUESTION_PAYLOAD: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .required("question", Rule::non_empty())
        .required("type", Rule::non_empty())
        .required("difficulty", Rule::Number)
        .optional("expectedKeyPoints", Rule::strings())
});

/// Evaluation object returned by the LLM
pub static EVALUATION_PAYLOAD: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .required("score", Rule::Number)
        .required("feedback", Rule::non_empty())
        .optional("strengths", Rule::strings())
        .optional("improvements", Rule::strings())
        .optional("keyPointsCovered", Rule::strings())
});

/// Report object returned by the LLM
pub static REPORT_PAYLOAD: Lazy<Schema> = Lazy::new(|| {
    Schema::new()
        .required("overallScore", Rule::Number)
        .required("summary", Rule::non_empty())
        .optional(
            "categoryScores",
            Rule::Object(
                Schema::new()
                    .optional("technical", Rule::Number)
                    .optional("communication", Rule::Number)
                    .optional("problemSolving", Rule::Number),
            ),
        )
        .optional("strengths", Rule::strings())
        .optional("improvements", Rule::strings())
        .optional("recommendations", Rule::strings())
});
