pub mod chatgpt;
pub mod gemini;

use async_trait::async_trait;
use log::{debug, warn};

/// Longest tutor question that is forwarded to the model, in characters.
pub const MAX_QUERY_LENGTH: usize = 500;

pub const EMPTY_QUERY_ANSWER: &str = "Stel eerst een vraag over Bouwsteen 1.";
pub const TOO_LONG_ANSWER: &str =
    "Je vraag is te lang. Houd het bij maximaal 500 tekens en probeer het opnieuw.";
pub const QUOTA_ANSWER: &str =
    "De AI-tutor heeft even te veel vragen gekregen. Probeer het over een paar minuten opnieuw.";
pub const NETWORK_ANSWER: &str =
    "Ik kan de AI-tutor nu niet bereiken. Controleer je verbinding en probeer het later opnieuw.";
pub const BLOCKED_ANSWER: &str =
    "Op deze vraag kan ik geen antwoord geven. Probeer je vraag anders te formuleren.";
pub const EMPTY_RESPONSE_ANSWER: &str =
    "Ik kon geen antwoord genereren. Probeer je vraag anders te formuleren.";
pub const GENERIC_ANSWER: &str = "Er ging iets mis met de AI. Probeer het later opnieuw.";

const DEFAULT_OFFLINE_ANSWER: &str = "Dat is een interessante vraag! Bouwsteen 1 draait om het activeren van voorkennis. De kern: wat de leerling al weet, bepaalt wat en hoe snel hij leert. Gebruik advance organizers als kapstok voor nieuwe informatie.";

// Answers for common questions, used when no model is configured.
const OFFLINE_ANSWERS: [(&str, &str); 4] = [
    ("misconceptie", "Een misconceptie is een hardnekkige, onjuiste voorstelling van zaken die leerlingen hebben. Bijvoorbeeld: veel kinderen denken dat bomen groeien doordat ze voedsel uit de grond halen. In werkelijkheid maken bomen hun \"voedsel\" zelf via fotosynthese. Misconcepties moet je expliciet benoemen en weerleggen."),
    ("spiraalaanpak", "De spiraalaanpak betekent dat je leerstof steeds terugkeert, maar telkens op een hoger niveau. Denk aan concentrische cirkels: je begint met de basis en bouwt daar elk jaar op voort. Zo activeer je automatisch voorkennis."),
    ("advance organizer", "Een advance organizer is een \"kapstok\" die je aan het begin van de les geeft om nieuwe informatie aan te hangen. Er zijn 4 types: grafisch (visueel overzicht), expository (vertellen wat komt), narratief (verhaal/film), en vergelijkend (linken aan bekende stof)."),
    ("voorkennis", "Voorkennis activeren is cruciaal omdat nieuwe informatie alleen beklijft als het kan \"vastklikken\" aan wat de leerling al weet. Zonder die verbinding wordt nieuwe stof snel vergeten."),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingCredential,
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("blocked by the content filter: {0}")]
    Blocked(String),
    #[error("the model returned no text")]
    EmptyResponse,
    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingCredential,
    QuotaExceeded,
    Network,
    SafetyBlock,
    EmptyResponse,
    Generic,
}

impl From<&CompletionError> for FailureKind {
    fn from(err: &CompletionError) -> Self {
        match err {
            CompletionError::MissingCredential => FailureKind::MissingCredential,
            CompletionError::QuotaExceeded(_) => FailureKind::QuotaExceeded,
            CompletionError::Network(_) => FailureKind::Network,
            CompletionError::Blocked(_) => FailureKind::SafetyBlock,
            CompletionError::EmptyResponse => FailureKind::EmptyResponse,
            CompletionError::Backend(_) => FailureKind::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("the question is empty")]
    Empty,
    #[error("the question is {0} characters long, at most 500 are allowed")]
    TooLong(usize),
}

/// A text generation service that turns one prompt into one answer.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Front door to the model. Both operations always produce text: failures
/// are swapped for a fixed Dutch fallback that depends on what went wrong.
pub struct TutorGateway {
    backend: Box<dyn CompletionBackend>,
}

impl TutorGateway {
    pub fn new(backend: impl CompletionBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn get_feedback(&self, score_summary: &str, topic: &str) -> String {
        let prompt = feedback_prompt(score_summary, topic);
        match self.complete(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Feedback for '{}' falls back: {}", score_summary, err);
                feedback_fallback(FailureKind::from(&err), score_summary, topic)
            }
        }
    }

    pub async fn answer_question(&self, query: &str) -> String {
        let query = match validate_query(query) {
            Ok(query) => query,
            Err(err) => {
                warn!("Tutor question rejected: {}", err);
                return match err {
                    QueryError::Empty => EMPTY_QUERY_ANSWER.to_string(),
                    QueryError::TooLong(_) => TOO_LONG_ANSWER.to_string(),
                };
            }
        };

        let prompt = question_prompt(query);
        match self.complete(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                warn!("Tutor answer falls back: {}", err);
                answer_fallback(FailureKind::from(&err), query)
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        debug!("Sending prompt to {}: {:?}", self.backend.name(), prompt);
        let text = self.backend.complete(prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        debug!("Completion: {:?}", text);
        Ok(text.to_string())
    }
}

/// Trims the question and checks it is neither empty nor too long.
pub fn validate_query(query: &str) -> Result<&str, QueryError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(QueryError::Empty);
    }
    let length = query.chars().count();
    if length > MAX_QUERY_LENGTH {
        return Err(QueryError::TooLong(length));
    }
    Ok(query)
}

fn feedback_prompt(score_summary: &str, topic: &str) -> String {
    format!(
        "Je bent een vriendelijke AI tutor die docenten helpt met Bouwsteen 1 van Wijze Lessen (voorkennis activeren).
        Geef korte, bemoedigende feedback (max 3 zinnen) over deze score: {} voor onderwerp: {}.
        Focus op wat ze kunnen doen om te verbeteren.",
        score_summary, topic
    )
}

fn question_prompt(query: &str) -> String {
    format!(
        "Je bent een expert AI tutor voor Bouwsteen 1 van \"Wijze Lessen\" over het activeren van voorkennis.

        Kernconcepten die je kent:
        - Ausubel: \"De belangrijkste factor die het leren beïnvloedt, is wat de leerling al weet\"
        - Advance organizers: grafisch, expository, narratief, vergelijkend
        - Misconcepties expliciet benoemen en weerleggen
        - Spiraalaanpak: leerstof die terugkeert op steeds hoger niveau
        - Voorkennis = kapstok voor nieuwe informatie

        Beantwoord deze vraag beknopt en praktisch (max 4 zinnen): {}",
        query
    )
}

pub fn feedback_fallback(kind: FailureKind, score_summary: &str, topic: &str) -> String {
    match kind {
        FailureKind::MissingCredential => format!(
            "Goed bezig met {}! Je score van {} laat zien dat je de stof aan het beheersen bent. Blijf oefenen met de reflectiecyclus om je inzichten te verdiepen.",
            topic, score_summary
        ),
        FailureKind::EmptyResponse => format!(
            "Goed bezig! Je score van {} toont vooruitgang. Blijf reflecteren op je lespraktijk.",
            score_summary
        ),
        FailureKind::QuotaExceeded => format!(
            "Goed bezig met {}! De AI-tutor is even druk bezet, maar je score van {} spreekt voor zich. Blijf oefenen!",
            topic, score_summary
        ),
        FailureKind::Network | FailureKind::SafetyBlock | FailureKind::Generic => format!(
            "Goed bezig met {}! Je score van {} laat zien dat je de stof aan het beheersen bent.",
            topic, score_summary
        ),
    }
}

pub fn answer_fallback(kind: FailureKind, query: &str) -> String {
    match kind {
        FailureKind::MissingCredential => offline_answer(query).to_string(),
        FailureKind::QuotaExceeded => QUOTA_ANSWER.to_string(),
        FailureKind::Network => NETWORK_ANSWER.to_string(),
        FailureKind::SafetyBlock => BLOCKED_ANSWER.to_string(),
        FailureKind::EmptyResponse => EMPTY_RESPONSE_ANSWER.to_string(),
        FailureKind::Generic => GENERIC_ANSWER.to_string(),
    }
}

fn offline_answer(query: &str) -> &'static str {
    let query = query.to_lowercase();
    OFFLINE_ANSWERS
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, answer)| *answer)
        .unwrap_or(DEFAULT_OFFLINE_ANSWER)
}
