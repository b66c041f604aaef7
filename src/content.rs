use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::matching::OrganizerPair;
use crate::quiz::Question;
use crate::reflection::{PerPhase, PhaseInfo, ReflectionPhase, ReflectionPrompt};

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read content file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse content file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("there are no quiz questions")]
    NoQuestions,
    #[error("question {id} has {count} options, at least 2 are needed")]
    TooFewOptions { id: u32, count: usize },
    #[error("question {id} marks option {index} as correct but has {count} options")]
    CorrectAnswerOutOfRange { id: u32, index: usize, count: usize },
    #[error("question id {0} is used more than once")]
    DuplicateQuestionId(u32),
    #[error("there are no organizer pairs")]
    NoOrganizers,
    #[error("organizer type '{0}' is used more than once")]
    DuplicateOrganizerType(String),
    #[error("organizer description '{0}' is used more than once")]
    DuplicateOrganizerDescription(String),
    #[error("expected 5 reflection prompts, found {0}")]
    WrongPromptCount(usize),
    #[error("reflection prompt {index} is for {found:?}, expected {expected:?}")]
    PromptOutOfOrder {
        index: usize,
        expected: ReflectionPhase,
        found: ReflectionPhase,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    pub title: String,
    pub body: String,
}

/// All reference data the machines work on. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub questions: Vec<Question>,
    pub organizers: Vec<OrganizerPair>,
    pub reflection_prompts: Vec<ReflectionPrompt>,
    pub phase_info: PerPhase<PhaseInfo>,
    #[serde(default)]
    pub summary: Vec<SummarySection>,
}

impl Content {
    pub fn new(file: File) -> Result<Self, ContentError> {
        Self::from_reader(file)
    }

    pub fn open(path: &Path) -> Result<Self, ContentError> {
        Self::new(File::open(path)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ContentError> {
        let content: Content = serde_json::from_reader(reader)?;
        content.validate()?;
        Ok(content)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if self.questions.is_empty() {
            return Err(ContentError::NoQuestions);
        }
        let mut ids = HashSet::new();
        for q in &self.questions {
            if q.options.len() < 2 {
                return Err(ContentError::TooFewOptions {
                    id: q.id,
                    count: q.options.len(),
                });
            }
            if q.correct_answer >= q.options.len() {
                return Err(ContentError::CorrectAnswerOutOfRange {
                    id: q.id,
                    index: q.correct_answer,
                    count: q.options.len(),
                });
            }
            if !ids.insert(q.id) {
                return Err(ContentError::DuplicateQuestionId(q.id));
            }
        }

        if self.organizers.is_empty() {
            return Err(ContentError::NoOrganizers);
        }
        let mut kinds = HashSet::new();
        let mut descriptions = HashSet::new();
        for o in &self.organizers {
            if !kinds.insert(o.kind.as_str()) {
                return Err(ContentError::DuplicateOrganizerType(o.kind.clone()));
            }
            if !descriptions.insert(o.description.as_str()) {
                return Err(ContentError::DuplicateOrganizerDescription(
                    o.description.clone(),
                ));
            }
        }

        if self.reflection_prompts.len() != ReflectionPhase::ALL.len() {
            return Err(ContentError::WrongPromptCount(self.reflection_prompts.len()));
        }
        for (index, (prompt, expected)) in self
            .reflection_prompts
            .iter()
            .zip(ReflectionPhase::ALL)
            .enumerate()
        {
            if prompt.phase != expected {
                return Err(ContentError::PromptOutOfOrder {
                    index,
                    expected,
                    found: prompt.phase,
                });
            }
        }
        Ok(())
    }

    pub fn prompt(&self, phase: ReflectionPhase) -> Option<&ReflectionPrompt> {
        self.reflection_prompts.get(phase.index())
    }

    /// The Bouwsteen 1 material the bot ships with.
    pub fn builtin() -> Self {
        Self {
            questions: builtin_questions(),
            organizers: builtin_organizers(),
            reflection_prompts: builtin_prompts(),
            phase_info: builtin_phase_info(),
            summary: builtin_summary(),
        }
    }
}

fn question(
    id: u32,
    text: &str,
    options: [&str; 4],
    correct_answer: usize,
    explanation: &str,
) -> Question {
    Question {
        id,
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
        explanation: explanation.to_string(),
    }
}

fn builtin_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "Wat is volgens David Ausubel de belangrijkste factor die het leren beïnvloedt?",
            [
                "De intelligentie van de leerling",
                "Wat de leerling al weet",
                "De motivatie van de leraar",
                "De kwaliteit van het lesmateriaal",
            ],
            1,
            "Ausubel stelde in 1968: 'de belangrijkste factor die het leren beïnvloedt, is wat de leerling al weet.'",
        ),
        question(
            2,
            "Wat gebeurt er met nieuwe leerstof die niet wordt gelinkt aan geactiveerde kennis in het langetermijngeheugen?",
            [
                "Het wordt automatisch opgeslagen",
                "Het wordt beter onthouden door herhaling",
                "Het zal snel weer vergeten worden",
                "Het vormt een nieuw kennisschema",
            ],
            2,
            "Nieuwe leerstof die geen 'greep' vindt in het langetermijngeheugen omdat het niet gelinkt is aan voorkennis, wordt snel vergeten.",
        ),
        question(
            3,
            "Wat is de beste manier om een misconceptie bij leerlingen aan te pakken?",
            [
                "Negeren en hopen dat het weggaat",
                "De juiste informatie herhaaldelijk voorlezen",
                "De misconceptie expliciet benoemen en weerleggen",
                "Een toets geven over het onderwerp",
            ],
            2,
            "Je kunt misconcepties het beste doorprikken door ze expliciet te benoemen en daarna te weerleggen.",
        ),
        question(
            4,
            "Je toont een visueel overzicht van de leerstof aan het begin van de les. Welk type advance organizer is dit?",
            [
                "Expository advance organizer",
                "Narratieve advance organizer",
                "Vergelijkende advance organizer",
                "Grafische advance organizer",
            ],
            3,
            "Een grafische advance organizer toont een visueel overzicht van de leerstof en waar de nieuwe inhoud past in het grotere geheel.",
        ),
        question(
            5,
            "Wat houdt de 'Think-Pair-Share' werkvorm in bij het ophalen van voorkennis?",
            [
                "Leerlingen denken na, overleggen in duo's en delen het dan klassikaal",
                "De leraar denkt na en deelt de kennis met de leerlingen",
                "Leerlingen zoeken informatie op internet en delen dit",
                "Een snelle quiz met stemkastjes",
            ],
            0,
            "Bij Think-Pair-Share denken leerlingen eerst individueel na, bespreken dit dan in duo's en tenslotte komt het klassikaal aan bod.",
        ),
    ]
}

fn organizer(id: &str, kind: &str, description: &str) -> OrganizerPair {
    OrganizerPair {
        id: id.to_string(),
        kind: kind.to_string(),
        description: description.to_string(),
    }
}

fn builtin_organizers() -> Vec<OrganizerPair> {
    vec![
        organizer(
            "1",
            "Grafisch",
            "Toont een visueel overzicht van de leerstof in het grotere geheel.",
        ),
        organizer(
            "2",
            "Expository",
            "De leraar vertelt wat de leerlingen gaan leren en wat de verwachtingen zijn.",
        ),
        organizer(
            "3",
            "Narratief",
            "De klas wordt 'opgewarmd' met een passend verhaal of een filmpje.",
        ),
        organizer(
            "4",
            "Vergelijkend",
            "Vergelijkt de nieuwe leerstof met wat de leerling al weet.",
        ),
    ]
}

fn prompt(phase: ReflectionPhase, question: &str, help_text: &str) -> ReflectionPrompt {
    ReflectionPrompt {
        phase,
        question: question.to_string(),
        help_text: Some(help_text.to_string()),
    }
}

fn builtin_prompts() -> Vec<ReflectionPrompt> {
    vec![
        prompt(
            ReflectionPhase::Action,
            "Beschrijf een les waarin je voorkennis probeerde te activeren. Wat deed je precies?",
            "Denk aan de opening van de les: welke vraag, werkvorm of advance organizer gebruikte je?",
        ),
        prompt(
            ReflectionPhase::LookingBack,
            "Wat gebeurde er? Wat dacht, voelde en wilde jij, en wat dachten, voelden en wilden je leerlingen?",
            "Kijk terug zonder meteen te oordelen. Beschrijf concreet wat je zag en hoorde.",
        ),
        prompt(
            ReflectionPhase::Awareness,
            "Wat is de kern van wat er gebeurde? Welke voorkennis of misconcepties werden zichtbaar?",
            "Zoek het verband tussen jouw aanpak en de reactie van de leerlingen.",
        ),
        prompt(
            ReflectionPhase::CreatingAlternatives,
            "Welke andere aanpakken zijn mogelijk? Welke kies je voor de volgende keer en waarom?",
            "Denk aan een ander type advance organizer, Think-Pair-Share of een korte instapquiz.",
        ),
        prompt(
            ReflectionPhase::Trial,
            "Hoe ga je het nieuwe plan uitproberen? Wanneer, in welke klas en waar let je op?",
            "Maak het plan zo concreet dat je het morgen kunt uitvoeren.",
        ),
    ]
}

fn info(title: &str, description: &str) -> PhaseInfo {
    PhaseInfo {
        title: title.to_string(),
        description: description.to_string(),
    }
}

fn builtin_phase_info() -> PerPhase<PhaseInfo> {
    PerPhase {
        action: info("Handelen", "Je voert een les of activiteit uit."),
        looking_back: info("Terugblikken", "Je kijkt terug op wat er gebeurde."),
        awareness: info("Bewustwording", "Je wordt je bewust van de essentiële aspecten."),
        creating_alternatives: info("Alternatieven", "Je bedenkt andere mogelijke aanpakken."),
        trial: info("Uitproberen", "Je probeert de nieuwe aanpak uit in de praktijk."),
    }
}

fn section(title: &str, body: &str) -> SummarySection {
    SummarySection {
        title: title.to_string(),
        body: body.to_string(),
    }
}

fn builtin_summary() -> Vec<SummarySection> {
    vec![
        section(
            "De Kapstok-theorie",
            "Wat je al weet, bepaalt wat en hoe snel je leert. Door voorkennis actief op te halen, geef je leerlingen een kapstok om nieuwe leerstof aan te verbinden.",
        ),
        section("Veranker", "Nieuwe informatie 'kleeft' aan bestaande kennis in het geheugen."),
        section("Organiseer", "Plaats nieuwe stof binnen een abstract en omvattend kader."),
        section("Kleine Quiz", "Maak lacunes zichtbaar aan het begin van de les."),
        section("Advance Organizers", "Bied mentale kapstokken (Grafisch, Narratief, etc.)."),
        section("Spiraalaanpak", "Bouw structureel voort op kennis van vorige jaren."),
        section(
            "Misconcepties weerleggen",
            "Benoem de fout expliciet en zet er de waarheid tegenover.",
        ),
        section(
            "David Ausubel (1968)",
            "\"De belangrijkste factor die het leren beïnvloedt, is wat de leerling al weet.\"",
        ),
    ]
}
