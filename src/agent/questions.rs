//! Answer helpers for a UI showing an `ASK_USER` question.

use super::events::QuestionNotice;

/// Submitted when a free-form question is answered with nothing.
pub const IMPLICIT_YES: &str = "Yes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPrompt {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    recommended_index: Option<usize>,
}

impl From<QuestionNotice> for QuestionPrompt {
    fn from(notice: QuestionNotice) -> Self {
        Self {
            id: notice.id,
            question: notice.question,
            options: notice.options,
            recommended_index: notice.recommended_index,
        }
    }
}

impl QuestionPrompt {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Free-form answer; an empty submission means yes.
    pub fn typed_answer(&self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            IMPLICIT_YES.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// The literal text of option `index` (0-based).
    pub fn choose(&self, index: usize) -> Option<String> {
        self.options.get(index).cloned()
    }

    /// Recommended option, ignored when it points outside the list.
    pub fn recommended(&self) -> Option<usize> {
        self.recommended_index.filter(|i| *i < self.options.len())
    }

    /// Interpret a line of terminal input: a 1-based number picks an option,
    /// anything else is a typed answer.
    pub fn answer_from_input(&self, input: &str) -> String {
        if self.has_options() {
            if let Some(choice) = input
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.choose(i))
            {
                return choice;
            }
        }
        self.typed_answer(input)
    }
}
