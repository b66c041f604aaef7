pub mod screen;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use teloxide::{prelude::*, types::ChatAction};

use crate::app::{App, Effect, TutorRequest};
use crate::content::Content;
use crate::quiz::FeedbackRequest;
use crate::tutor::TutorGateway;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// One `App` per chat, kept in memory only.
///
/// The lock is only taken for synchronous work and never held across an
/// `.await`, so background answers and new messages never block each other
/// for long. Entries are never evicted: a session lives as long as the
/// process, which is fine for a class-sized audience.
#[derive(Clone, Default)]
pub struct Sessions {
    apps: Arc<Mutex<HashMap<ChatId, App>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, chat_id: ChatId, f: impl FnOnce(&mut App) -> R) -> R {
        let mut apps = self.apps.lock().unwrap_or_else(PoisonError::into_inner);
        f(apps.entry(chat_id).or_insert_with(App::new))
    }
}

pub async fn handle_message(
    bot: Bot,
    msg: Message,
    sessions: Sessions,
    content: Arc<Content>,
    tutor: Arc<TutorGateway>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Stuur je antwoord als tekstbericht.")
            .await?;
        return Ok(());
    };

    let (effect, screen) = sessions.with(msg.chat.id, |app| {
        let action = screen::parse_action(app, text);
        debug!("Chat {} in {:?}: {:?}", msg.chat.id.0, app.mode, action);
        let effect = app.dispatch(&content, action);
        (effect, screen::render(app, &content))
    });

    // The state already waits for an answer, so the request goes out even
    // when the replies could not be delivered.
    let sent = send_screen(&bot, msg.chat.id, &effect, screen).await;

    match effect {
        Effect::Feedback(request) => spawn_feedback(bot, msg.chat.id, sessions, tutor, request),
        Effect::Tutor(request) => spawn_tutor_answer(bot, msg.chat.id, sessions, tutor, request),
        _ => {}
    }
    sent
}

async fn send_screen(
    bot: &Bot,
    chat_id: ChatId,
    effect: &Effect,
    screen: screen::Screen,
) -> HandlerResult {
    if let Some(reply) = screen::effect_message(effect) {
        bot.send_message(chat_id, reply).await?;
    }
    bot.send_message(chat_id, screen.text)
        .reply_markup(screen.keyboard)
        .await?;
    Ok(())
}

/// Fetches the end-of-quiz feedback without holding up the chat.
fn spawn_feedback(
    bot: Bot,
    chat_id: ChatId,
    sessions: Sessions,
    tutor: Arc<TutorGateway>,
    request: FeedbackRequest,
) {
    tokio::spawn(async move {
        // We don't really care if the typing indicator fails
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

        let text = tutor
            .get_feedback(&request.score_summary, &request.topic)
            .await;
        let fresh = sessions.with(chat_id, |app| {
            app.resolve_feedback(request.generation, text.clone())
        });
        if !fresh {
            return;
        }
        if let Err(err) = bot.send_message(chat_id, text).await {
            warn!("Failed to deliver quiz feedback to {}: {}", chat_id.0, err);
        }
    });
}

fn spawn_tutor_answer(
    bot: Bot,
    chat_id: ChatId,
    sessions: Sessions,
    tutor: Arc<TutorGateway>,
    request: TutorRequest,
) {
    tokio::spawn(async move {
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

        let text = tutor.answer_question(&request.query).await;
        let fresh = sessions.with(chat_id, |app| {
            app.resolve_tutor_answer(request.generation, text.clone())
        });
        if !fresh {
            return;
        }
        if let Err(err) = bot.send_message(chat_id, text).await {
            warn!("Failed to deliver tutor answer to {}: {}", chat_id.0, err);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Action, Mode, PendingText};
    use crate::tutor::gemini::{GeminiBackend, DEFAULT_ENDPOINT, DEFAULT_MODEL};
    use std::time::Duration;

    /// A bot whose every request fails: nothing listens on the discard port.
    fn unreachable_bot() -> Bot {
        Bot::new("0:test").set_api_url(reqwest::Url::parse("http://127.0.0.1:9/").unwrap())
    }

    /// A tutor without a key, so it answers from its fallbacks.
    fn offline_tutor() -> Arc<TutorGateway> {
        let backend =
            GeminiBackend::new(None, DEFAULT_ENDPOINT, DEFAULT_MODEL, Duration::from_secs(1))
                .unwrap();
        Arc::new(TutorGateway::new(backend))
    }

    fn message(chat_id: i64, text: &str) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1_700_000_000,
            "chat": { "id": chat_id, "type": "private", "first_name": "Student" },
            "from": { "id": chat_id, "is_bot": false, "first_name": "Student" },
            "text": text,
        }))
        .unwrap()
    }

    /// Waits for the background task to write its answer back.
    async fn settled(
        sessions: &Sessions,
        chat_id: ChatId,
        pick: fn(&App) -> &PendingText,
    ) -> PendingText {
        for _ in 0..250 {
            let slot = sessions.with(chat_id, |app| pick(app).clone());
            if !slot.loading {
                return slot;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        sessions.with(chat_id, |app| pick(app).clone())
    }

    #[tokio::test]
    async fn tutor_question_is_answered_when_replies_fail() {
        let content = Arc::new(Content::builtin());
        let sessions = Sessions::new();
        let chat_id = ChatId(7);
        sessions.with(chat_id, |app| app.dispatch(&content, Action::OpenTutor));

        let result = handle_message(
            unreachable_bot(),
            message(7, "Wat is voorkennis?"),
            sessions.clone(),
            content,
            offline_tutor(),
        )
        .await;
        assert!(result.is_err());

        let answer = settled(&sessions, chat_id, |app| &app.tutor_answer).await;
        assert!(!answer.loading);
        assert!(answer.text.is_some());
    }

    #[tokio::test]
    async fn quiz_feedback_is_fetched_when_replies_fail() {
        let content = Arc::new(Content::builtin());
        let sessions = Sessions::new();
        let chat_id = ChatId(8);
        sessions.with(chat_id, |app| {
            app.dispatch(&content, Action::StartQuiz);
            let last = content.questions.len() - 1;
            for (i, question) in content.questions.iter().enumerate() {
                app.dispatch(&content, Action::AnswerOption(question.correct_answer));
                if i < last {
                    app.dispatch(&content, Action::NextQuestion);
                }
            }
        });

        let result = handle_message(
            unreachable_bot(),
            message(8, screen::SHOW_RESULT),
            sessions.clone(),
            content,
            offline_tutor(),
        )
        .await;
        assert!(result.is_err());
        assert!(sessions.with(chat_id, |app| app.quiz.finished));

        let feedback = settled(&sessions, chat_id, |app| &app.quiz_feedback).await;
        assert!(!feedback.loading);
        assert!(feedback.text.is_some());
    }

    #[test]
    fn sessions_are_kept_per_chat() {
        let content = Content::builtin();
        let sessions = Sessions::new();

        sessions.with(ChatId(1), |app| app.dispatch(&content, Action::StartQuiz));
        sessions.with(ChatId(2), |app| app.dispatch(&content, Action::OpenTutor));

        assert_eq!(sessions.with(ChatId(1), |app| app.mode), Mode::Quiz);
        assert_eq!(sessions.with(ChatId(2), |app| app.mode), Mode::AiTutor);
        assert_eq!(sessions.with(ChatId(3), |app| app.mode), Mode::Home);
    }

    #[test]
    fn new_chat_gets_a_fresh_app() {
        let content = Content::builtin();
        let sessions = Sessions::new();

        let app = sessions.with(ChatId(4), |app| app.clone());
        assert_eq!(app, App::new());
        assert!(app.matching.entries.is_empty());

        sessions.with(ChatId(4), |app| app.dispatch(&content, Action::StartMatching));
        let board = sessions.with(ChatId(4), |app| app.matching.clone());
        assert_eq!(board.entries.len(), content.organizers.len());
        assert_eq!(board.matched_count(), 0);
    }
}
