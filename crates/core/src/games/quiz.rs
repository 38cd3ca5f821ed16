use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::settings::{QuizSettings, ScoreBand};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("a quiz needs at least one question")]
    NoQuestions,

    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must offer at least one option")]
    NoOptions,

    #[error("correct option {correct} is out of range for {options} options")]
    CorrectOutOfRange { correct: usize, options: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Field names on the wire follow the stored game config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct: usize,
}

#[derive(Serialize, Deserialize)]
struct QuestionRecord {
    question: String,
    options: Vec<String>,
    correct: usize,
}

impl Question {
    /// # Errors
    ///
    /// Returns `QuizError` if the prompt is blank, there are no options, or
    /// `correct` does not index into `options`.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, QuizError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuizError::NoOptions);
        }
        if correct >= options.len() {
            return Err(QuizError::CorrectOutOfRange {
                correct,
                options: options.len(),
            });
        }
        Ok(Self {
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct)
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuizError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(record.question, record.options, record.correct)
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            question: q.prompt,
            options: q.options,
            correct: q.correct,
        }
    }
}

//
// ─── OUTCOME / EVENTS ──────────────────────────────────────────────────────────
//

/// Final result of a quiz, produced exactly once when the last question is advanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    /// One entry per question; `None` when nothing was selected before advancing.
    pub answers: Vec<Option<usize>>,
}

impl QuizOutcome {
    /// Answers in their persisted form, `-1` standing for "no answer".
    #[must_use]
    pub fn answer_indices(&self) -> Vec<i64> {
        self.answers
            .iter()
            .map(|a| a.and_then(|i| i64::try_from(i).ok()).unwrap_or(-1))
            .collect()
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum QuizState {
    AwaitingAnswer(usize),
    Complete,
}

/// What an `advance` did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The session was already complete.
    Ignored,
    /// Moved on to the question at `index`.
    Next { index: usize },
    Completed(QuizOutcome),
}

impl Advance {
    #[must_use]
    pub fn into_outcome(self) -> Option<QuizOutcome> {
        match self {
            Advance::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// What a one-second `tick` did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizTick {
    Ignored,
    Counting { remaining: u32 },
    /// The countdown hit zero and the pending selection was submitted.
    TimedOut(Advance),
}

/// Immutable view of a quiz the host renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizSnapshot {
    pub state: QuizState,
    pub total: usize,
    pub question: Option<Question>,
    pub selected: Option<usize>,
    pub answers: Vec<Option<usize>>,
    pub correct: usize,
    pub time_remaining: u32,
    pub seconds_per_question: u32,
    pub outcome: Option<QuizOutcome>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Timed multiple-choice quiz.
///
/// Each question runs under its own countdown. The host calls `tick` once per
/// second; when the countdown reaches zero the current selection (possibly none)
/// is submitted as if `advance` had been called.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    settings: QuizSettings,
    current: usize,
    selected: Option<usize>,
    answers: Vec<Option<usize>>,
    correct: usize,
    time_remaining: u32,
    outcome: Option<QuizOutcome>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question list.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        Self::with_settings(questions, QuizSettings::default())
    }

    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question list.
    pub fn with_settings(
        questions: Vec<Question>,
        settings: QuizSettings,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        let answers = Vec::with_capacity(questions.len());
        Ok(Self {
            questions,
            settings,
            current: 0,
            selected: None,
            answers,
            correct: 0,
            time_remaining: settings.seconds_per_question(),
            outcome: None,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn settings(&self) -> QuizSettings {
        self.settings
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// The final result, once the session is complete.
    #[must_use]
    pub fn outcome(&self) -> Option<&QuizOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        if self.is_complete() {
            QuizState::Complete
        } else {
            QuizState::AwaitingAnswer(self.current)
        }
    }

    /// Replace the pending selection for the current question.
    ///
    /// Returns `false` (and changes nothing) when the session is complete or the
    /// option does not exist.
    pub fn select_answer(&mut self, option: usize) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        if self.is_complete() || option >= question.options().len() {
            return false;
        }
        self.selected = Some(option);
        true
    }

    /// Count the timer down by one second, submitting on timeout.
    pub fn tick(&mut self) -> QuizTick {
        if self.is_complete() {
            return QuizTick::Ignored;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining == 0 {
            QuizTick::TimedOut(self.advance())
        } else {
            QuizTick::Counting {
                remaining: self.time_remaining,
            }
        }
    }

    /// Record the pending selection for the current question and move on.
    pub fn advance(&mut self) -> Advance {
        if self.is_complete() {
            return Advance::Ignored;
        }
        let Some(question) = self.questions.get(self.current) else {
            return Advance::Ignored;
        };

        let answer = self.selected.take();
        if question.is_correct(answer) {
            self.correct += 1;
        }
        self.answers.push(answer);
        self.current += 1;

        if self.current < self.questions.len() {
            self.time_remaining = self.settings.seconds_per_question();
            return Advance::Next {
                index: self.current,
            };
        }

        let outcome = QuizOutcome {
            score: percent(self.correct, self.questions.len()),
            correct: self.correct,
            total: self.questions.len(),
            answers: self.answers.clone(),
        };
        self.outcome = Some(outcome.clone());
        Advance::Completed(outcome)
    }

    /// Start over with the same questions.
    pub fn reset(&mut self) {
        self.current = 0;
        self.selected = None;
        self.answers.clear();
        self.correct = 0;
        self.time_remaining = self.settings.seconds_per_question();
        self.outcome = None;
    }

    #[must_use]
    pub fn snapshot(&self) -> QuizSnapshot {
        QuizSnapshot {
            state: self.state(),
            total: self.questions.len(),
            question: self.current_question().cloned(),
            selected: self.selected,
            answers: self.answers.clone(),
            correct: self.correct,
            time_remaining: self.time_remaining,
            seconds_per_question: self.settings.seconds_per_question(),
            outcome: self.outcome.clone(),
        }
    }
}

/// `round(part / total * 100)` with halves rounded up; `total` must be non-zero.
fn percent(part: usize, total: usize) -> u32 {
    let scaled = (200 * part + total) / (2 * total);
    u32::try_from(scaled).unwrap_or(100).min(100)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
