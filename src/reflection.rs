//! Korthagen's five-phase reflection cycle.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A phase answer needs more than this many characters (ignoring surrounding
/// whitespace) before the cycle moves on.
pub const MIN_ANSWER_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectionPhase {
    Action,
    LookingBack,
    Awareness,
    CreatingAlternatives,
    Trial,
}

impl ReflectionPhase {
    pub const ALL: [ReflectionPhase; 5] = [
        ReflectionPhase::Action,
        ReflectionPhase::LookingBack,
        ReflectionPhase::Awareness,
        ReflectionPhase::CreatingAlternatives,
        ReflectionPhase::Trial,
    ];

    pub fn index(self) -> usize {
        match self {
            ReflectionPhase::Action => 0,
            ReflectionPhase::LookingBack => 1,
            ReflectionPhase::Awareness => 2,
            ReflectionPhase::CreatingAlternatives => 3,
            ReflectionPhase::Trial => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// One value for every phase. All five are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPhase<T> {
    pub action: T,
    pub looking_back: T,
    pub awareness: T,
    pub creating_alternatives: T,
    pub trial: T,
}

impl<T> PerPhase<T> {
    pub fn get(&self, phase: ReflectionPhase) -> &T {
        match phase {
            ReflectionPhase::Action => &self.action,
            ReflectionPhase::LookingBack => &self.looking_back,
            ReflectionPhase::Awareness => &self.awareness,
            ReflectionPhase::CreatingAlternatives => &self.creating_alternatives,
            ReflectionPhase::Trial => &self.trial,
        }
    }

    pub fn get_mut(&mut self, phase: ReflectionPhase) -> &mut T {
        match phase {
            ReflectionPhase::Action => &mut self.action,
            ReflectionPhase::LookingBack => &mut self.looking_back,
            ReflectionPhase::Awareness => &mut self.awareness,
            ReflectionPhase::CreatingAlternatives => &mut self.creating_alternatives,
            ReflectionPhase::Trial => &mut self.trial,
        }
    }

    /// Values in cycle order.
    pub fn iter(&self) -> impl Iterator<Item = (ReflectionPhase, &T)> {
        ReflectionPhase::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionPrompt {
    pub phase: ReflectionPhase,
    pub question: String,
    #[serde(default)]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reflection {
    pub current_phase: usize,
    pub answers: PerPhase<String>,
    pub complete: bool,
}

impl Reflection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ReflectionPhase {
        ReflectionPhase::from_index(self.current_phase).unwrap_or(ReflectionPhase::Trial)
    }

    pub fn current_answer(&self) -> &str {
        self.answers.get(self.phase())
    }

    /// Length of the current answer without surrounding whitespace.
    pub fn answer_length(&self) -> usize {
        self.current_answer().trim().chars().count()
    }

    /// Overwrites the answer for any phase, not only the current one.
    pub fn set_answer(
        &mut self,
        phase: ReflectionPhase,
        text: &str,
    ) -> Result<(), ValidationError> {
        if self.complete {
            return Err(ValidationError::ReflectionComplete);
        }
        *self.answers.get_mut(phase) = text.to_string();
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        !self.complete && self.answer_length() > MIN_ANSWER_LENGTH
    }

    /// Moves to the next phase, or completes the cycle after the last one.
    pub fn next(&mut self) -> Result<(), ValidationError> {
        if self.complete {
            return Err(ValidationError::ReflectionComplete);
        }
        if !self.can_advance() {
            return Err(ValidationError::AnswerTooShort {
                length: self.answer_length(),
                minimum: MIN_ANSWER_LENGTH,
            });
        }

        if self.current_phase + 1 < ReflectionPhase::ALL.len() {
            self.current_phase += 1;
            debug!("Reflection moved to {:?}", self.phase());
        } else {
            self.complete = true;
            debug!("Reflection cycle complete");
        }
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), ValidationError> {
        if self.complete {
            return Err(ValidationError::ReflectionComplete);
        }
        if self.current_phase == 0 {
            return Err(ValidationError::AtFirstPhase);
        }
        self.current_phase -= 1;
        debug!("Reflection moved back to {:?}", self.phase());
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Every phase with its answer, only once the cycle is complete.
    pub fn summary(&self) -> Option<Vec<(ReflectionPhase, &str)>> {
        if !self.complete {
            return None;
        }
        Some(self.answers.iter().map(|(p, a)| (p, a.as_str())).collect())
    }
}
