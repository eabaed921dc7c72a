use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::utils::normalize_answer;

/// Category used when answers are not split into categories.
pub const DEFAULT_CATEGORY: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCategory {
    pub category: String,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptableAnswers {
    pub answer_categories: Vec<AnswerCategory>,
}

impl AcceptableAnswers {
    pub fn new(answer_categories: Vec<AnswerCategory>) -> Self {
        Self { answer_categories }
    }

    /// All answers in the [`DEFAULT_CATEGORY`].
    pub fn uncategorized(answers: &[String]) -> Self {
        Self {
            answer_categories: vec![AnswerCategory {
                category: DEFAULT_CATEGORY.to_string(),
                answers: answers.to_vec(),
            }],
        }
    }

    /// Normalized answers from the enabled categories only.
    pub fn flatten<S: AsRef<str>>(&self, enabled_categories: &[S]) -> HashSet<String> {
        self.answer_categories
            .iter()
            .filter(|c| enabled_categories.iter().any(|name| name.as_ref() == c.category))
            .flat_map(|c| c.answers.iter())
            .map(|a| normalize_answer(a))
            .filter(|a| !a.is_empty())
            .collect()
    }
}

/// Exact match after normalization against the answers of the enabled categories.
/// There is no fuzzy matching: a typo is a wrong answer.
pub fn validate_written<S: AsRef<str>>(
    user_answer: &str,
    acceptable: &AcceptableAnswers,
    enabled_categories: &[S],
) -> bool {
    let normalized = normalize_answer(user_answer);
    if normalized.is_empty() {
        return false;
    }
    acceptable.flatten(enabled_categories).contains(&normalized)
}
