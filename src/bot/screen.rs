//! Turning chat text into actions and app state into chat text.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::app::{Action, App, Effect, Mode};
use crate::content::Content;
use crate::error::ValidationError;
use crate::matching::MatchOutcome;
use crate::quiz::QuizStep;
use crate::reflection::{ReflectionPhase, MIN_ANSWER_LENGTH};

pub const HOME: &str = "Home";
pub const START_QUIZ: &str = "Start de quiz";
pub const START_MATCHING: &str = "Koppel de organizers";
pub const SUMMARY: &str = "Samenvatting";
pub const TUTOR: &str = "Vraag de AI tutor";
pub const START_REFLECTION: &str = "Start reflectie";
pub const REFLECTION: &str = "Reflectie";
pub const NEXT_QUESTION: &str = "Volgende vraag";
pub const SHOW_RESULT: &str = "Bekijk resultaat";
pub const NEXT_PHASE: &str = "Volgende fase";
pub const PREVIOUS_PHASE: &str = "Vorige fase";

const GREETING_TEXT: &str = "Welkom bij Bouwsteen 1: \"Activeer relevante voorkennis.\"
Ontdek waarom wat de leerling al weet de belangrijkste factor is voor succesvol leren.

Wist je dat? Een advance organizer aan het begin van de les zorgt gemiddeld voor betere resultaten dan een puur historisch of motiverend verhaal. Structuur is de sleutel!

Wat wil je doen?";

pub struct Screen {
    pub text: String,
    pub keyboard: KeyboardMarkup,
}

/// Reads a chat message as an action for the current mode.
pub fn parse_action(app: &App, text: &str) -> Action {
    let text = text.trim();
    match text {
        HOME | "/start" => return Action::GoHome,
        START_QUIZ => return Action::StartQuiz,
        START_MATCHING => return Action::StartMatching,
        SUMMARY => return Action::ViewSummary,
        TUTOR => return Action::OpenTutor,
        START_REFLECTION => return Action::StartReflection,
        REFLECTION => return Action::OpenReflection,
        _ => {}
    }

    let number = text.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
    match app.mode {
        Mode::Quiz => match (text, number) {
            (NEXT_QUESTION | SHOW_RESULT, _) => Action::NextQuestion,
            (_, Some(option)) => Action::AnswerOption(option),
            _ => Action::Unknown(text.to_string()),
        },
        Mode::Matching => match number {
            Some(index) => Action::MatchDescription(index),
            None if app.matching.entries.iter().any(|e| e.kind == text) => {
                Action::SelectType(text.to_string())
            }
            None => Action::Unknown(text.to_string()),
        },
        Mode::Reflection => match text {
            NEXT_PHASE => Action::NextPhase,
            PREVIOUS_PHASE => Action::PreviousPhase,
            _ => Action::ReflectionText(text.to_string()),
        },
        Mode::AiTutor => Action::AskTutor(text.to_string()),
        Mode::Home | Mode::Summary => Action::Unknown(text.to_string()),
    }
}

/// A short reply about what just happened, sent before the screen itself.
pub fn effect_message(effect: &Effect) -> Option<String> {
    match effect {
        Effect::Match(MatchOutcome::Matched) => Some("Juist gekoppeld!".to_string()),
        Effect::Match(MatchOutcome::Mismatch) => {
            Some("Dat klopt niet. Kies opnieuw een type en probeer het nog eens.".to_string())
        }
        Effect::Match(MatchOutcome::NoSelection) => {
            Some("Kies eerst een type organizer.".to_string())
        }
        Effect::Rejected(err) => Some(hint(err)),
        Effect::NotUnderstood => {
            Some("Dat begreep ik niet. Gebruik de knoppen hieronder.".to_string())
        }
        Effect::Nothing
        | Effect::Answered { .. }
        | Effect::Feedback(_)
        | Effect::Tutor(_) => None,
    }
}

fn hint(err: &ValidationError) -> String {
    match err {
        ValidationError::OptionOutOfRange { len, .. } => {
            format!("Kies een antwoord van 1 tot en met {}.", len)
        }
        ValidationError::AlreadyRevealed => "Je hebt deze vraag al beantwoord.".to_string(),
        ValidationError::NotRevealed => "Beantwoord eerst de vraag.".to_string(),
        ValidationError::QuizFinished => "De quiz is al afgelopen.".to_string(),
        ValidationError::UnknownType(_) | ValidationError::UnknownDescription(_) => {
            "Die keuze bestaat niet.".to_string()
        }
        ValidationError::AlreadyMatched(kind) => format!("{} is al gekoppeld.", kind),
        ValidationError::AnswerTooShort { length, minimum } => format!(
            "Je antwoord is nog te kort: {} karakters, er zijn er meer dan {} nodig.",
            length, minimum
        ),
        ValidationError::AtFirstPhase => "Je bent al bij de eerste fase.".to_string(),
        ValidationError::ReflectionComplete => {
            "Deze reflectie is afgerond. Start een nieuwe reflectie om opnieuw te beginnen."
                .to_string()
        }
        ValidationError::QuestionOutOfRange(_) | ValidationError::WrongMode(_) => {
            "Dat kan hier niet.".to_string()
        }
    }
}

pub fn render(app: &App, content: &Content) -> Screen {
    match app.mode {
        Mode::Home => Screen {
            text: GREETING_TEXT.to_string(),
            keyboard: keyboard(vec![
                vec![START_QUIZ, START_MATCHING],
                vec![SUMMARY, TUTOR],
                vec![START_REFLECTION],
            ]),
        },
        Mode::Quiz => render_quiz(app, content),
        Mode::Matching => render_matching(app),
        Mode::Summary => Screen {
            text: content
                .summary
                .iter()
                .map(|s| format!("{}\n{}", s.title, s.body))
                .collect::<Vec<_>>()
                .join("\n\n"),
            keyboard: keyboard(vec![navigation()]),
        },
        Mode::AiTutor => render_tutor(app),
        Mode::Reflection => render_reflection(app, content),
    }
}

fn render_quiz(app: &App, content: &Content) -> Screen {
    let quiz = &app.quiz;
    let total = content.questions.len();
    let question = quiz.current(&content.questions);

    match (quiz.step(), question) {
        (QuizStep::Answering(i), Some(question)) => {
            let options = question
                .options
                .iter()
                .enumerate()
                .map(|(n, o)| format!("{}. {}", n + 1, o))
                .collect::<Vec<_>>()
                .join("\n");
            let numbers: Vec<String> = (1..=question.options.len())
                .map(|n| n.to_string())
                .collect();
            Screen {
                text: format!("Vraag {} van {}\n\n{}\n\n{}", i + 1, total, question.text, options),
                keyboard: keyboard(vec![
                    numbers.iter().map(String::as_str).collect(),
                    navigation(),
                ]),
            }
        }
        (QuizStep::Revealed(i), Some(question)) => {
            let verdict = if quiz.selected_option == Some(question.correct_answer) {
                "Correct!".to_string()
            } else {
                format!(
                    "Helaas, het juiste antwoord is: {}",
                    question.correct_option().unwrap_or_default()
                )
            };
            let next = if i + 1 < total { NEXT_QUESTION } else { SHOW_RESULT };
            Screen {
                text: format!("{}\n\n{}", verdict, question.explanation),
                keyboard: keyboard(vec![vec![next], navigation()]),
            }
        }
        _ => {
            let feedback = match (&app.quiz_feedback.text, app.quiz_feedback.loading) {
                (Some(text), _) => text.clone(),
                (None, true) => "De AI tutor bekijkt je resultaat...".to_string(),
                (None, false) => String::new(),
            };
            Screen {
                text: format!(
                    "Quiz voltooid: {}%\nJe hebt {} van de {} vragen goed beantwoord.\n\n{}",
                    quiz.percentage(total),
                    quiz.score,
                    total,
                    feedback
                )
                .trim_end()
                .to_string(),
                keyboard: keyboard(vec![vec![START_QUIZ], navigation()]),
            }
        }
    }
}

fn render_matching(app: &App) -> Screen {
    let matching = &app.matching;
    if matching.is_complete() {
        return Screen {
            text: "Fantastisch! Je hebt alle advance organizers correct gekoppeld.".to_string(),
            keyboard: keyboard(vec![vec![START_MATCHING], navigation()]),
        };
    }

    let types = matching
        .entries
        .iter()
        .map(|e| {
            let mark = if e.matched {
                "✓"
            } else if matching.selected.as_deref() == Some(e.kind.as_str()) {
                "→"
            } else {
                "•"
            };
            format!("{} {}", mark, e.kind)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let descriptions = matching
        .descriptions()
        .enumerate()
        .map(|(n, e)| {
            let mark = if e.matched { " ✓" } else { "" };
            format!("{}. {}{}", n + 1, e.description, mark)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let instruction = match &matching.selected {
        Some(kind) => format!("Welke beschrijving hoort bij {}? Stuur het nummer.", kind),
        None => "Kies een type organizer.".to_string(),
    };

    let mut rows: Vec<Vec<&str>> = Vec::new();
    if matching.selected.is_some() {
        let numbers: Vec<&str> = ["1", "2", "3", "4", "5", "6", "7", "8", "9"]
            .into_iter()
            .take(matching.entries.len())
            .collect();
        rows.push(numbers);
    } else {
        rows.push(
            matching
                .entries
                .iter()
                .filter(|e| !e.matched)
                .map(|e| e.kind.as_str())
                .collect(),
        );
    }
    rows.push(navigation());

    Screen {
        text: format!(
            "Advance Organizer Match ({}/{})\n\nTypes:\n{}\n\nBeschrijvingen:\n{}\n\n{}",
            matching.matched_count(),
            matching.entries.len(),
            types,
            descriptions,
            instruction
        ),
        keyboard: keyboard(rows),
    }
}

fn render_tutor(app: &App) -> Screen {
    let answer = &app.tutor_answer;
    let text = match (&answer.text, answer.loading) {
        (_, true) => "De AI tutor denkt na...".to_string(),
        (Some(text), false) => format!("{}\n\nHeb je nog een vraag? Typ hem hieronder.", text),
        (None, false) => "Heb je een vraag over misconcepties, advance organizers of de spiraalaanpak? Typ hem hieronder (maximaal 500 tekens).".to_string(),
    };
    Screen {
        text,
        keyboard: keyboard(vec![navigation()]),
    }
}

fn render_reflection(app: &App, content: &Content) -> Screen {
    let reflection = &app.reflection;

    if let Some(summary) = reflection.summary() {
        let overview = summary
            .iter()
            .map(|(phase, answer)| {
                let answer = if answer.trim().is_empty() {
                    "Niet ingevuld"
                } else {
                    *answer
                };
                format!(
                    "Fase {}: {}\n{}",
                    phase.index() + 1,
                    content.phase_info.get(*phase).title,
                    answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        return Screen {
            text: format!(
                "Reflectie voltooid! Je hebt de volledige Korthagen-cyclus doorlopen.\n\n{}",
                overview
            ),
            keyboard: keyboard(vec![vec![START_REFLECTION, HOME]]),
        };
    }

    let phase = reflection.phase();
    let info = content.phase_info.get(phase);
    let mut text = format!(
        "Fase {} van {}: {}\n{}",
        phase.index() + 1,
        ReflectionPhase::ALL.len(),
        info.title,
        info.description
    );
    if let Some(prompt) = content.prompt(phase) {
        text.push_str(&format!("\n\n{}", prompt.question));
        if let Some(help) = &prompt.help_text {
            text.push_str(&format!("\n({})", help));
        }
    }
    let answer = reflection.current_answer();
    if answer.is_empty() {
        text.push_str("\n\nTyp je antwoord.");
    } else {
        text.push_str(&format!(
            "\n\nJouw antwoord ({} karakters{}):\n{}",
            reflection.answer_length(),
            if reflection.can_advance() {
                String::new()
            } else {
                format!(", minimaal {}", MIN_ANSWER_LENGTH + 1)
            },
            answer
        ));
    }

    let mut controls = Vec::new();
    if reflection.current_phase > 0 {
        controls.push(PREVIOUS_PHASE);
    }
    if reflection.can_advance() {
        controls.push(NEXT_PHASE);
    }
    let mut rows = vec![controls];
    rows.push(navigation());
    rows.retain(|row| !row.is_empty());

    Screen {
        text,
        keyboard: keyboard(rows),
    }
}

/// The header row that is reachable from every screen.
fn navigation() -> Vec<&'static str> {
    vec![REFLECTION, SUMMARY, TUTOR, HOME]
}

fn keyboard(rows: Vec<Vec<&str>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_in(mode: Mode) -> App {
        let mut app = App::new();
        app.switch_to(mode);
        app
    }

    #[test]
    fn navigation_works_everywhere() {
        for mode in [Mode::Home, Mode::Quiz, Mode::Reflection, Mode::AiTutor] {
            let app = app_in(mode);
            assert_eq!(parse_action(&app, HOME), Action::GoHome);
            assert_eq!(parse_action(&app, START_QUIZ), Action::StartQuiz);
            assert_eq!(parse_action(&app, REFLECTION), Action::OpenReflection);
            assert_eq!(parse_action(&app, START_REFLECTION), Action::StartReflection);
        }
    }

    #[test]
    fn numbers_pick_quiz_options() {
        let app = app_in(Mode::Quiz);
        assert_eq!(parse_action(&app, "2"), Action::AnswerOption(1));
        assert_eq!(parse_action(&app, NEXT_QUESTION), Action::NextQuestion);
        assert_eq!(parse_action(&app, "0"), Action::Unknown("0".into()));
    }

    #[test]
    fn matching_reads_types_and_numbers() {
        let content = Content::builtin();
        let mut app = App::new();
        app.start_matching(&content);
        assert_eq!(
            parse_action(&app, "Narratief"),
            Action::SelectType("Narratief".into())
        );
        assert_eq!(parse_action(&app, "3"), Action::MatchDescription(2));
        assert_eq!(parse_action(&app, "Iets"), Action::Unknown("Iets".into()));
    }

    #[test]
    fn free_text_goes_to_reflection_and_tutor() {
        let text = "Ik liet leerlingen eerst brainstormen.";
        assert_eq!(
            parse_action(&app_in(Mode::Reflection), text),
            Action::ReflectionText(text.into())
        );
        assert_eq!(
            parse_action(&app_in(Mode::AiTutor), text),
            Action::AskTutor(text.into())
        );
        assert_eq!(
            parse_action(&app_in(Mode::Summary), text),
            Action::Unknown(text.into())
        );
    }

    #[test]
    fn quiz_screen_lists_the_options() {
        let content = Content::builtin();
        let mut app = App::new();
        app.start_quiz();
        let screen = render(&app, &content);
        assert!(screen.text.starts_with("Vraag 1 van 5"));
        assert!(screen.text.contains("2. Wat de leerling al weet"));
    }

    #[test]
    fn finished_quiz_shows_pending_feedback() {
        let content = Content::builtin();
        let mut app = App::new();
        app.dispatch(&content, Action::StartQuiz);
        for q in &content.questions {
            app.dispatch(&content, Action::AnswerOption(q.correct_answer));
            app.dispatch(&content, Action::NextQuestion);
        }
        let screen = render(&app, &content);
        assert!(screen.text.contains("Quiz voltooid: 100%"));
        assert!(screen.text.contains("bekijkt je resultaat"));
    }

    #[test]
    fn completed_reflection_lists_every_phase() {
        let content = Content::builtin();
        let mut app = App::new();
        app.start_reflection();
        for _ in ReflectionPhase::ALL {
            app.dispatch(
                &content,
                Action::ReflectionText("Een voldoende lang antwoord.".into()),
            );
            app.dispatch(&content, Action::NextPhase);
        }
        let screen = render(&app, &content);
        assert!(screen.text.starts_with("Reflectie voltooid!"));
        assert!(screen.text.contains("Fase 5: Uitproberen"));
    }

    #[test]
    fn short_answer_is_explained() {
        let message = effect_message(&Effect::Rejected(ValidationError::AnswerTooShort {
            length: 4,
            minimum: 10,
        }));
        assert!(message.unwrap().contains("4 karakters"));
    }
}
