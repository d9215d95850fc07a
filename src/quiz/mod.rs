pub mod ai_helper;
pub mod session;

use std::fmt;

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 30;
pub const MIN_LIVES: u32 = 1;
pub const MAX_LIVES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Topic {
    Mixed,
    Bible,
    Liturgy,
    LiturgicalObjects,
    Catechism,
    Saints,
    Prayers,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::Mixed,
        Topic::Bible,
        Topic::Liturgy,
        Topic::LiturgicalObjects,
        Topic::Catechism,
        Topic::Saints,
        Topic::Prayers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Topic::Mixed => "Diversos (Misto)",
            Topic::Bible => "Bíblia Sagrada",
            Topic::Liturgy => "Liturgia e Missa",
            Topic::LiturgicalObjects => "Objetos Litúrgicos",
            Topic::Catechism => "Catecismo (Doutrina)",
            Topic::Saints => "Vida dos Santos",
            Topic::Prayers => "Orações e Devoções",
        }
    }

    pub fn from_label(label: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|t| t.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Mixed,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Mixed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Iniciante",
            Difficulty::Intermediate => "Intermediário",
            Difficulty::Advanced => "Avançado",
            Difficulty::Mixed => "Mista",
        }
    }

    pub fn from_label(label: &str) -> Option<Difficulty> {
        Difficulty::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Short questions and options are requested for the easier levels.
    pub fn wants_brevity(&self) -> bool {
        matches!(self, Difficulty::Beginner | Difficulty::Intermediate)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the questions of a quiz come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TopicSelection {
    /// Freshly generated questions about a category.
    Category(Topic),
    /// A random sample of the locally saved question bank.
    SavedPool,
}

impl TopicSelection {
    pub fn is_saved_pool(&self) -> bool {
        matches!(self, TopicSelection::SavedPool)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TopicSelection::Category(topic) => topic.label(),
            TopicSelection::SavedPool => "Banco de Questões",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizConfig {
    pub topic: TopicSelection,
    pub difficulty: Difficulty,
    pub question_count: usize,
    pub lives: u32,
    pub avoid_repeats: bool,
    pub confirm_answer: bool,
}

impl QuizConfig {
    /// Starting point of the setup wizard for a generated quiz.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic: TopicSelection::Category(topic),
            difficulty: Difficulty::Beginner,
            question_count: 10,
            lives: 3,
            avoid_repeats: false,
            confirm_answer: false,
        }
    }

    /// The fixed configuration used when practicing with saved questions.
    pub fn saved_pool() -> Self {
        Self {
            topic: TopicSelection::SavedPool,
            difficulty: Difficulty::Intermediate,
            question_count: 10,
            lives: 3,
            avoid_repeats: false,
            confirm_answer: false,
        }
    }

    pub fn validate(&self) -> Result<(), QuestionError> {
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.question_count) {
            return Err(QuestionError::QuestionCount(self.question_count));
        }
        if !(MIN_LIVES..=MAX_LIVES).contains(&self.lives) {
            return Err(QuestionError::Lives(self.lives));
        }
        Ok(())
    }

    /// Difficulty as shown to players, saved-pool quizzes have no single level.
    pub fn difficulty_label(&self) -> &'static str {
        if self.topic.is_saved_pool() {
            "Misto (Salvas)"
        } else {
            self.difficulty.label()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("expected 4 options, got {0}")]
    OptionCount(usize),
    #[error("correct option index {0} is out of range")]
    CorrectIndex(i64),
    #[error("question has no identifier")]
    MissingId,
    #[error("question text is empty")]
    EmptyText,
    #[error("question count must be between 1 and 30, got {0}")]
    QuestionCount(usize),
    #[error("lives must be between 1 and 10, got {0}")]
    Lives(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuestion")]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: [String; OPTION_COUNT],
    pub correct_option_index: u8,
    pub explanation: String,
    #[serde(default)]
    pub image_keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl Question {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_option_index as usize
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_option_index as usize]
    }

    /// Save/unsave identity: two questions are the same saved item when their text matches.
    pub fn same_text(&self, other: &Question) -> bool {
        self.question_text == other.question_text
    }
}

/// Unvalidated question shape, as produced by the generator or read from disk.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(default)]
    pub id: Option<String>,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option_index: i64,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub image_keyword: String,
    #[serde(default)]
    pub more_info_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl RawQuestion {
    pub fn into_question(self, id: String) -> Result<Question, QuestionError> {
        if self.question_text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let option_count = self.options.len();
        let options: [String; OPTION_COUNT] = self
            .options
            .try_into()
            .map_err(|_| QuestionError::OptionCount(option_count))?;
        let correct_option_index = u8::try_from(self.correct_option_index)
            .ok()
            .filter(|i| (*i as usize) < OPTION_COUNT)
            .ok_or(QuestionError::CorrectIndex(self.correct_option_index))?;

        Ok(Question {
            id,
            question_text: self.question_text,
            options,
            correct_option_index,
            explanation: self.explanation,
            image_keyword: self.image_keyword,
            more_info_url: self.more_info_url.filter(|url| !url.trim().is_empty()),
            category: self.category.filter(|c| !c.trim().is_empty()),
            difficulty: self.difficulty.filter(|d| !d.trim().is_empty()),
        })
    }
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let id = raw.id.clone().ok_or(QuestionError::MissingId)?;
        raw.into_question(id)
    }
}
