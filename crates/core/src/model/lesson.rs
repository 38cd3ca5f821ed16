use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{LessonId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("updated_at is before created_at")]
    InvalidTimeRange,

    #[error("completed_at must be set exactly when the lesson is completed")]
    InconsistentProgress,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Editable fields of a lesson, as submitted by an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub description: Option<String>,
    /// HTML or Markdown body.
    pub content: String,
    pub order: u32,
}

impl LessonDraft {
    /// Trim and check the draft.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is blank.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedLesson, LessonError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        let description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(ValidatedLesson {
            title,
            description,
            content: self.content,
            order: self.order,
            published: false,
            created_at: now,
        })
    }
}

/// A checked lesson waiting for a storage id. New lessons start unpublished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLesson {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub order: u32,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl ValidatedLesson {
    /// Store the lesson already published.
    #[must_use]
    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    #[must_use]
    pub fn assign_id(self, id: LessonId) -> Lesson {
        Lesson {
            id,
            title: self.title,
            description: self.description,
            content: self.content,
            order: self.order,
            published: self.published,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    description: Option<String>,
    content: String,
    order: u32,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Lesson {
    /// Rehydrate a lesson from storage.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank or the timestamps are reversed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: LessonId,
        title: String,
        description: Option<String>,
        content: String,
        order: u32,
        published: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if updated_at < created_at {
            return Err(LessonError::InvalidTimeRange);
        }
        Ok(Self {
            id,
            title,
            description,
            content,
            order,
            published,
            created_at,
            updated_at,
        })
    }

    /// Replace the editable fields and the publication flag.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the new title is blank.
    pub fn update(
        &mut self,
        draft: LessonDraft,
        published: bool,
        now: DateTime<Utc>,
    ) -> Result<(), LessonError> {
        let validated = draft.validate(now)?;
        self.title = validated.title;
        self.description = validated.description;
        self.content = validated.content;
        self.order = validated.order;
        self.published = published;
        self.updated_at = now.max(self.created_at);
        Ok(())
    }

    pub fn set_published(&mut self, published: bool, now: DateTime<Utc>) {
        self.published = published;
        self.updated_at = now.max(self.created_at);
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Completion state of one lesson for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonProgress {
    user_id: UserId,
    lesson_id: LessonId,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// `completed_at` is stamped with `now` when completed and cleared otherwise.
    #[must_use]
    pub fn mark(user_id: UserId, lesson_id: LessonId, completed: bool, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            lesson_id,
            completed,
            completed_at: completed.then_some(now),
        }
    }

    /// # Errors
    ///
    /// Returns `LessonError::InconsistentProgress` when `completed_at` disagrees
    /// with `completed`.
    pub fn from_persisted(
        user_id: UserId,
        lesson_id: LessonId,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, LessonError> {
        if completed != completed_at.is_some() {
            return Err(LessonError::InconsistentProgress);
        }
        Ok(Self {
            user_id,
            lesson_id,
            completed,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
