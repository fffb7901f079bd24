use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::icon::Icon;
use crate::realtime::ChangeFeed;
use crate::store::profiles::{self, Gender, NewProfile, Profile};
use crate::store::StoreError;

/// Where the wizard is. Serialized into the session between form posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    StudentId,
    Register {
        student_id: String,
    },
    SelectIcon {
        student_id: String,
        nickname: String,
        gender: Gender,
    },
    /// Returning user: show the welcome screen, then the timed redirect to
    /// the feed.
    WelcomeBack(Profile),
    /// Fresh profile created; straight to the feed.
    Done(Profile),
}

/// The onboarding state machine. Store failures land in `error` and the
/// step does not advance; `busy` gates repeated submission of an in-flight
/// step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wizard {
    pub step: Step,
    pub error: Option<String>,
    pub busy: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            step: Step::StudentId,
            error: None,
            busy: false,
        }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-empty id → profile lookup. A known id short-circuits to
    /// `WelcomeBack`; an unknown one moves on to registration.
    pub async fn submit_student_id(&mut self, pool: &SqlitePool, student_id: &str) {
        if self.busy {
            return;
        }
        let student_id = student_id.trim();
        if student_id.is_empty() {
            self.error = Some("Student ID is required".to_owned());
            return;
        }
        self.busy = true;
        self.error = None;
        match profiles::lookup(pool, student_id).await {
            Ok(Some(profile)) => self.step = Step::WelcomeBack(profile),
            Ok(None) => {
                self.step = Step::Register {
                    student_id: student_id.to_owned(),
                }
            }
            Err(err) => self.error = Some(err.to_string()),
        }
        self.busy = false;
    }

    /// Nickname required; gender defaults to male when unset.
    pub fn submit_registration(&mut self, nickname: &str, gender: Option<Gender>) {
        let Step::Register { student_id } = &self.step else {
            return;
        };
        let nickname = nickname.trim();
        if nickname.is_empty() {
            self.error = Some("Nickname is required".to_owned());
            return;
        }
        self.step = Step::SelectIcon {
            student_id: student_id.clone(),
            nickname: nickname.to_owned(),
            gender: gender.unwrap_or(Gender::Male),
        };
        self.error = None;
    }

    /// Creates the profile. A `Conflict` means another device won the
    /// registration race; it is re-resolved into the returning-user path.
    pub async fn select_icon(&mut self, pool: &SqlitePool, changes: &ChangeFeed, icon: Icon) {
        if self.busy {
            return;
        }
        let Step::SelectIcon {
            student_id,
            nickname,
            gender,
        } = self.step.clone()
        else {
            return;
        };
        self.busy = true;
        self.error = None;
        let new = NewProfile {
            student_id: student_id.clone(),
            nickname,
            gender,
            icon,
        };
        match profiles::create(pool, changes, new).await {
            Ok(profile) => self.step = Step::Done(profile),
            Err(StoreError::Conflict) => match profiles::lookup(pool, &student_id).await {
                Ok(Some(profile)) => self.step = Step::WelcomeBack(profile),
                Ok(None) => self.error = Some("Registration conflicted, try again".to_owned()),
                Err(err) => self.error = Some(err.to_string()),
            },
            Err(err) => self.error = Some(err.to_string()),
        }
        self.busy = false;
    }

    /// The signed-in profile once a terminal step is reached.
    pub fn profile(&self) -> Option<&Profile> {
        match &self.step {
            Step::WelcomeBack(profile) | Step::Done(profile) => Some(profile),
            _ => None,
        }
    }
}
