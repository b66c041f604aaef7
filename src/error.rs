use crate::app::Mode;

/// A user action that does not fit the current state of a machine.
///
/// These are never fatal: the router logs them and leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("option {index} does not exist, the question has {len} options")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("question {0} does not exist")]
    QuestionOutOfRange(usize),
    #[error("the answer to this question has already been given")]
    AlreadyRevealed,
    #[error("the current question has not been answered yet")]
    NotRevealed,
    #[error("the quiz is already finished")]
    QuizFinished,
    #[error("unknown organizer type '{0}'")]
    UnknownType(String),
    #[error("organizer type '{0}' is already matched")]
    AlreadyMatched(String),
    #[error("description {0} does not exist")]
    UnknownDescription(usize),
    #[error("answer is {length} characters, more than {minimum} are needed")]
    AnswerTooShort { length: usize, minimum: usize },
    #[error("already at the first phase")]
    AtFirstPhase,
    #[error("the reflection is complete, start a new one to edit it")]
    ReflectionComplete,
    #[error("this action is not available while in {0:?}")]
    WrongMode(Mode),
}
