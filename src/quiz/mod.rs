use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Topic label sent along with the final score.
pub const FEEDBACK_TOPIC: &str = "Algemene beheersing van Bouwsteen 1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub explanation: String,
}

impl Question {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_answer
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

/// Progress through the fixed question list.
///
/// The questions themselves live in the reference data; the quiz only keeps
/// indices into them, so every operation takes the question slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quiz {
    pub current_question: usize,
    pub score: usize,
    pub revealed: bool,
    pub selected_option: Option<usize>,
    pub finished: bool,
    /// Bumped on every reset so late feedback for an older run can be told apart.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Answering(usize),
    Revealed(usize),
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Finished(FeedbackRequest),
}

/// What the gateway needs to produce the end-of-quiz feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub generation: u64,
    pub score_summary: String,
    pub topic: String,
}

impl Quiz {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> QuizStep {
        if self.finished {
            QuizStep::Finished
        } else if self.revealed {
            QuizStep::Revealed(self.current_question)
        } else {
            QuizStep::Answering(self.current_question)
        }
    }

    pub fn current<'a>(&self, questions: &'a [Question]) -> Option<&'a Question> {
        questions.get(self.current_question)
    }

    /// Records the chosen option and reveals the explanation.
    ///
    /// Returns whether the option was the correct one. The score goes up by one
    /// for a correct answer and never goes down.
    pub fn submit_answer(
        &mut self,
        questions: &[Question],
        option: usize,
    ) -> Result<bool, ValidationError> {
        if self.finished {
            return Err(ValidationError::QuizFinished);
        }
        if self.revealed {
            return Err(ValidationError::AlreadyRevealed);
        }
        let question = self
            .current(questions)
            .ok_or(ValidationError::QuestionOutOfRange(self.current_question))?;
        if option >= question.options.len() {
            return Err(ValidationError::OptionOutOfRange {
                index: option,
                len: question.options.len(),
            });
        }

        let correct = question.is_correct(option);
        self.selected_option = Some(option);
        self.revealed = true;
        if correct {
            self.score += 1;
        }
        debug!(
            "Question {} answered with option {} (correct: {}), score {}",
            question.id, option, correct, self.score
        );
        Ok(correct)
    }

    /// Moves past a revealed question.
    ///
    /// On the last question the quiz finishes and hands back the feedback
    /// request; the caller fires it off without waiting for the answer.
    pub fn advance(&mut self, questions: &[Question]) -> Result<Advance, ValidationError> {
        if self.finished {
            return Err(ValidationError::QuizFinished);
        }
        if !self.revealed {
            return Err(ValidationError::NotRevealed);
        }

        if self.current_question + 1 < questions.len() {
            self.current_question += 1;
            self.revealed = false;
            self.selected_option = None;
            debug!("Moving on to question {}", self.current_question + 1);
            return Ok(Advance::Next(self.current_question));
        }

        self.finished = true;
        debug!("Quiz finished with {}/{}", self.score, questions.len());
        Ok(Advance::Finished(FeedbackRequest {
            generation: self.generation,
            score_summary: format!("{}/{} op de quiz", self.score, questions.len()),
            topic: FEEDBACK_TOPIC.to_string(),
        }))
    }

    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation.wrapping_add(1),
            ..Self::default()
        };
    }

    /// Rounded share of correct answers, for the result screen.
    pub fn percentage(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        (self.score * 100 + total / 2) / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                id: i as u32 + 1,
                text: format!("Vraag {}", i + 1),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer: i % 3,
                explanation: "uitleg".into(),
            })
            .collect()
    }

    #[test]
    fn starts_answering_the_first_question() {
        let quiz = Quiz::new();
        assert_eq!(quiz.step(), QuizStep::Answering(0));
        assert_eq!(quiz.score, 0);
    }

    #[test]
    fn correct_answer_scores_once() {
        let qs = questions(3);
        let mut quiz = Quiz::new();

        assert_eq!(quiz.submit_answer(&qs, 0), Ok(true));
        assert_eq!(quiz.score, 1);
        assert_eq!(quiz.step(), QuizStep::Revealed(0));

        assert_eq!(
            quiz.submit_answer(&qs, 0),
            Err(ValidationError::AlreadyRevealed)
        );
        assert_eq!(quiz.score, 1);
        assert_eq!(quiz.selected_option, Some(0));
    }

    #[test]
    fn second_submit_cannot_change_the_selection() {
        let qs = questions(2);
        let mut quiz = Quiz::new();
        quiz.submit_answer(&qs, 2).unwrap();
        assert!(quiz.submit_answer(&qs, 0).is_err());
        assert_eq!(quiz.selected_option, Some(2));
        assert_eq!(quiz.score, 0);
    }

    #[test]
    fn out_of_range_option_leaves_state_alone() {
        let qs = questions(2);
        let mut quiz = Quiz::new();
        let before = quiz.clone();

        assert_eq!(
            quiz.submit_answer(&qs, 3),
            Err(ValidationError::OptionOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(quiz, before);
    }

    #[test]
    fn advance_requires_a_revealed_answer() {
        let qs = questions(2);
        let mut quiz = Quiz::new();
        assert_eq!(quiz.advance(&qs), Err(ValidationError::NotRevealed));
        assert_eq!(quiz.step(), QuizStep::Answering(0));
    }

    #[test]
    fn advance_clears_reveal_and_selection() {
        let qs = questions(2);
        let mut quiz = Quiz::new();
        quiz.submit_answer(&qs, 1).unwrap();

        assert_eq!(quiz.advance(&qs), Ok(Advance::Next(1)));
        assert!(!quiz.revealed);
        assert_eq!(quiz.selected_option, None);
        assert_eq!(quiz.step(), QuizStep::Answering(1));
    }

    #[test]
    fn all_correct_finishes_with_one_feedback_request() {
        let qs = questions(5);
        let mut quiz = Quiz::new();
        let mut requests = Vec::new();

        for q in &qs {
            quiz.submit_answer(&qs, q.correct_answer).unwrap();
            if let Advance::Finished(request) = quiz.advance(&qs).unwrap() {
                requests.push(request);
            }
        }

        assert_eq!(quiz.score, 5);
        assert!(quiz.finished);
        assert_eq!(quiz.step(), QuizStep::Finished);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].score_summary, "5/5 op de quiz");
        assert_eq!(requests[0].topic, FEEDBACK_TOPIC);
        assert_eq!(requests[0].generation, quiz.generation);
        assert_eq!(quiz.percentage(qs.len()), 100);
    }

    #[test]
    fn finished_quiz_rejects_further_actions() {
        let qs = questions(1);
        let mut quiz = Quiz::new();
        quiz.submit_answer(&qs, 0).unwrap();
        quiz.advance(&qs).unwrap();

        assert_eq!(quiz.submit_answer(&qs, 0), Err(ValidationError::QuizFinished));
        assert_eq!(quiz.advance(&qs), Err(ValidationError::QuizFinished));
        assert_eq!(quiz.score, 1);
    }

    #[test]
    fn score_never_exceeds_correct_submissions() {
        let qs = questions(4);
        // Every combination of answers, with a stray double submit each time.
        for pattern in 0..81usize {
            let mut quiz = Quiz::new();
            let mut digits = pattern;
            let mut correct_calls = 0;
            let mut answered = 0;
            for q in &qs {
                let option = digits % 3;
                digits /= 3;
                for _ in 0..2 {
                    if q.is_correct(option) {
                        correct_calls += 1;
                    }
                    if quiz.submit_answer(&qs, option).is_ok() {
                        answered += 1;
                    }
                }
                assert!(quiz.score <= answered);
                assert!(quiz.score <= correct_calls);
                quiz.advance(&qs).unwrap();
            }
            assert_eq!(answered, qs.len());
        }
    }

    #[test]
    fn reset_after_finish_restores_the_start() {
        let qs = questions(2);
        let mut quiz = Quiz::new();
        for q in &qs {
            quiz.submit_answer(&qs, q.correct_answer).unwrap();
            quiz.advance(&qs).unwrap();
        }
        let old_generation = quiz.generation;

        quiz.reset();

        assert_eq!(quiz.current_question, 0);
        assert_eq!(quiz.score, 0);
        assert!(!quiz.revealed);
        assert!(!quiz.finished);
        assert_eq!(quiz.selected_option, None);
        assert_eq!(quiz.generation, old_generation + 1);
    }

    #[test]
    fn percentage_rounds() {
        let quiz = Quiz {
            score: 2,
            ..Quiz::default()
        };
        assert_eq!(quiz.percentage(3), 67);
        assert_eq!(quiz.percentage(0), 0);
    }
}
