use log::{debug, warn};
use crate::content::Content;
use crate::error::ValidationError;
use crate::matching::{MatchOutcome, Matching};
use crate::quiz::{Advance, FeedbackRequest, Quiz};
use crate::reflection::Reflection;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Home,
    Quiz,
    Matching,
    Summary,
    AiTutor,
    Reflection,
}

/// Everything a user can do, already decoded from the chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    GoHome,
    StartQuiz,
    StartMatching,
    ViewSummary,
    OpenTutor,
    /// Start over with an empty reflection.
    StartReflection,
    /// Go to the reflection as it was left.
    OpenReflection,
    AnswerOption(usize),
    NextQuestion,
    SelectType(String),
    /// Index into the descriptions as they are shown.
    MatchDescription(usize),
    ReflectionText(String),
    NextPhase,
    PreviousPhase,
    AskTutor(String),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Nothing,
    Answered { correct: bool },
    Match(MatchOutcome),
    /// The quiz finished; the feedback has to be fetched in the background.
    Feedback(FeedbackRequest),
    Tutor(TutorRequest),
    Rejected(ValidationError),
    NotUnderstood,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorRequest {
    pub generation: u64,
    pub query: String,
}

/// A text that arrives later from the tutor.
///
/// Answers are tagged with the generation they were requested for; once the
/// slot has moved on to a newer generation, older answers are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingText {
    pub generation: u64,
    pub loading: bool,
    pub text: Option<String>,
}

impl PendingText {
    pub fn issue(&mut self, generation: u64) {
        self.generation = generation;
        self.loading = true;
        self.text = None;
    }

    pub fn clear(&mut self, generation: u64) {
        self.generation = generation;
        self.loading = false;
        self.text = None;
    }

    pub fn resolve(&mut self, generation: u64, text: String) -> bool {
        if generation != self.generation {
            debug!(
                "Dropping answer for generation {}, now at {}",
                generation, self.generation
            );
            return false;
        }
        self.loading = false;
        self.text = Some(text);
        true
    }
}

/// State of one chat: the active mode plus one machine per mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub mode: Mode,
    pub quiz: Quiz,
    pub matching: Matching,
    pub reflection: Reflection,
    pub quiz_feedback: PendingText,
    pub tutor_answer: PendingText,
    tutor_generation: u64,
}

impl App {
    pub fn new() -> Self {
        Self {
            mode: Mode::Home,
            quiz: Quiz::new(),
            matching: Matching::default(),
            reflection: Reflection::new(),
            quiz_feedback: PendingText::default(),
            tutor_answer: PendingText::default(),
            tutor_generation: 0,
        }
    }

    /// Plain navigation; nothing is reset.
    pub fn switch_to(&mut self, mode: Mode) {
        debug!("Switching from {:?} to {:?}", self.mode, mode);
        self.mode = mode;
    }

    pub fn start_quiz(&mut self) {
        self.quiz.reset();
        self.quiz_feedback.clear(self.quiz.generation);
        self.switch_to(Mode::Quiz);
    }

    pub fn start_matching(&mut self, content: &Content) {
        self.matching = Matching::new(&content.organizers);
        self.switch_to(Mode::Matching);
    }

    pub fn start_reflection(&mut self) {
        self.reflection.reset();
        self.switch_to(Mode::Reflection);
    }

    pub fn dispatch(&mut self, content: &Content, action: Action) -> Effect {
        let result = match action {
            Action::GoHome => Ok(self.navigate(Mode::Home)),
            Action::ViewSummary => Ok(self.navigate(Mode::Summary)),
            Action::OpenTutor => Ok(self.navigate(Mode::AiTutor)),
            Action::OpenReflection => Ok(self.navigate(Mode::Reflection)),
            Action::StartQuiz => {
                self.start_quiz();
                Ok(Effect::Nothing)
            }
            Action::StartMatching => {
                self.start_matching(content);
                Ok(Effect::Nothing)
            }
            Action::StartReflection => {
                self.start_reflection();
                Ok(Effect::Nothing)
            }
            Action::AnswerOption(option) => self.in_mode(Mode::Quiz).and_then(|_| {
                let correct = self.quiz.submit_answer(&content.questions, option)?;
                Ok(Effect::Answered { correct })
            }),
            Action::NextQuestion => self.in_mode(Mode::Quiz).and_then(|_| {
                match self.quiz.advance(&content.questions)? {
                    Advance::Next(_) => Ok(Effect::Nothing),
                    Advance::Finished(request) => {
                        self.quiz_feedback.issue(request.generation);
                        Ok(Effect::Feedback(request))
                    }
                }
            }),
            Action::SelectType(kind) => self.in_mode(Mode::Matching).and_then(|_| {
                self.matching.select_type(&kind)?;
                Ok(Effect::Nothing)
            }),
            Action::MatchDescription(index) => self.in_mode(Mode::Matching).and_then(|_| {
                let description = self
                    .matching
                    .descriptions()
                    .nth(index)
                    .map(|e| e.description.clone())
                    .ok_or(ValidationError::UnknownDescription(index))?;
                Ok(Effect::Match(
                    self.matching.match_selected(&content.organizers, &description),
                ))
            }),
            Action::ReflectionText(text) => self.in_mode(Mode::Reflection).and_then(|_| {
                let phase = self.reflection.phase();
                self.reflection.set_answer(phase, &text)?;
                Ok(Effect::Nothing)
            }),
            Action::NextPhase => self.in_mode(Mode::Reflection).and_then(|_| {
                self.reflection.next()?;
                Ok(Effect::Nothing)
            }),
            Action::PreviousPhase => self.in_mode(Mode::Reflection).and_then(|_| {
                self.reflection.previous()?;
                Ok(Effect::Nothing)
            }),
            Action::AskTutor(query) => self
                .in_mode(Mode::AiTutor)
                .map(|_| Effect::Tutor(self.ask_tutor(query))),
            Action::Unknown(text) => {
                debug!("Could not make sense of {:?} in {:?}", text, self.mode);
                Ok(Effect::NotUnderstood)
            }
        };

        result.unwrap_or_else(|err| {
            warn!("Rejected action in {:?}: {}", self.mode, err);
            Effect::Rejected(err)
        })
    }

    fn navigate(&mut self, mode: Mode) -> Effect {
        self.switch_to(mode);
        Effect::Nothing
    }

    fn in_mode(&self, mode: Mode) -> Result<(), ValidationError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(ValidationError::WrongMode(self.mode))
        }
    }

    fn ask_tutor(&mut self, query: String) -> TutorRequest {
        self.tutor_generation = self.tutor_generation.wrapping_add(1);
        self.tutor_answer.issue(self.tutor_generation);
        TutorRequest {
            generation: self.tutor_generation,
            query,
        }
    }

    /// Stores the end-of-quiz feedback unless the quiz was restarted meanwhile.
    pub fn resolve_feedback(&mut self, generation: u64, text: String) -> bool {
        self.quiz_feedback.resolve(generation, text)
    }

    /// Stores a tutor answer unless a newer question was asked meanwhile.
    pub fn resolve_tutor_answer(&mut self, generation: u64, text: String) -> bool {
        self.tutor_answer.resolve(generation, text)
    }
}
