use std::future::Future;
use std::time::Duration;

use crate::quiz::{Difficulty, Question, QuestionError, RawQuestion, Topic};
use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub count: usize,
    pub avoid_repeats: bool,
}

/// Questions handed back by a provider. `failure` is set when the questions
/// are the fallback set rather than freshly generated ones.
#[derive(Debug)]
pub struct Generation {
    pub questions: Vec<Question>,
    pub failure: Option<ProviderFailure>,
}

impl Generation {
    pub fn generated(questions: Vec<Question>) -> Self {
        Self { questions, failure: None }
    }

    pub fn fallback(failure: ProviderFailure) -> Self {
        Self {
            questions: fallback_questions(),
            failure: Some(failure),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderFailure {
    #[error("ChatGPT request failed: {0}")]
    ChatGpt(#[from] chatgpt::err::Error),
    #[error("no answer after {0:?}")]
    Timeout(Duration),
    #[error("empty reply")]
    EmptyReply,
    #[error("reply is not a question list: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid question: {0}")]
    InvalidQuestion(#[from] QuestionError),
}

/// Source of freshly generated questions.
///
/// Implementations never fail outright: on any error they return a non-empty
/// fallback set together with the reason.
pub trait QuestionProvider: Send + Sync {
    fn generate(&self, request: GenerationRequest) -> impl Future<Output = Generation> + Send;
}

pub struct QuizHelper {
    chat_gpt: ChatGPT,
    timeout: Duration,
}

impl QuizHelper {
    pub fn new(chat_gpt: ChatGPT, timeout: Duration) -> Self {
        Self { chat_gpt, timeout }
    }

    pub async fn generate_questions(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<Vec<Question>, ProviderFailure> {
        log::debug!(
            "Generating {} questions about {:?} ({:?}, avoid repeats: {})",
            request.count,
            request.topic,
            request.difficulty,
            request.avoid_repeats
        );
        let prompt = build_prompt(request);

        let response: CompletionResponse =
            match tokio::time::timeout(self.timeout, self.chat_gpt.send_message(&prompt)).await {
                Ok(response) => response?,
                Err(_) => return Err(ProviderFailure::Timeout(self.timeout)),
            };
        let content = response.message().clone().content;
        log::debug!("Completion: {:?}", content);

        parse_questions(&content, request)
    }
}

impl QuestionProvider for QuizHelper {
    fn generate(&self, request: GenerationRequest) -> impl Future<Output = Generation> + Send {
        async move {
            match self.generate_questions(&request).await {
                Ok(questions) => Generation::generated(questions),
                Err(failure) => {
                    log::warn!("Question generation failed, using fallback: {}", failure);
                    Generation::fallback(failure)
                }
            }
        }
    }
}

fn build_prompt(request: &GenerationRequest) -> String {
    let topic_instruction = match request.topic {
        Topic::Mixed => "Tópico: Misto. Gere perguntas variadas abrangendo Bíblia, Liturgia, Catecismo, Santos e Objetos Litúrgicos.".to_string(),
        topic => format!("Tópico: {}", topic.label()),
    };

    let (difficulty_instruction, brevity_instruction) = match request.difficulty {
        Difficulty::Mixed => (
            "Nível de Dificuldade: MISTO. Gere uma variedade equilibrada de perguntas fáceis (Iniciante), médias (Intermediário) e difíceis (Avançado), identificando o nível de cada uma no campo 'difficulty'.".to_string(),
            "Para perguntas de nível Iniciante ou Intermediário, mantenha as opções CURTAS. Para Avançado, podem ser mais elaboradas.",
        ),
        difficulty if difficulty.wants_brevity() => (
            format!("Nível de Dificuldade Geral: {}", difficulty.label()),
            "As perguntas e as opções de resposta devem ser CURTAS e DIRETAS. Evite textos longos nas opções.",
        ),
        difficulty => (format!("Nível de Dificuldade Geral: {}", difficulty.label()), ""),
    };

    let creativity_instruction = if request.avoid_repeats {
        "MODO CRIATIVO: gere perguntas INÉDITAS ou POUCO COMUNS. Evite perguntas clichês de catequese básica (ex: \"Quem é a mãe de Jesus?\", \"Onde Jesus nasceu?\"). Explore curiosidades teológicas, detalhes da liturgia, santos menos conhecidos ou livros bíblicos menos citados."
    } else {
        ""
    };

    format!(
        "Você é um especialista em teologia católica e catequese.
        Crie {} perguntas de múltipla escolha para um \"Quiz Catequético\".

        {}
        {}
        {}
        Público alvo: católicos de língua portuguesa.

        Requisitos:
        - As perguntas devem ser doutrinariamente corretas conforme o Catecismo da Igreja Católica.
        - Gere EXATAMENTE 4 opções de resposta para cada pergunta.
        - {}
        - A explicação deve ser breve e educativa.
        - 'imageKeyword' é uma palavra-chave simples em inglês que descreve o tema (ex: 'chalice', 'rosary').
        - 'moreInfoUrl' é uma URL de busca do Google no formato https://www.google.com/search?q=site:vatican.va+TEMA ou um link da Wikipedia em português.
        - 'category' indica a área da pergunta (ex: \"Liturgia\", \"Bíblia\").
        - 'difficulty' é \"Iniciante\", \"Intermediário\" ou \"Avançado\" conforme a pergunta.

        Responda APENAS com um array JSON, sem texto adicional, onde cada item tem os campos:
        questionText (string), options (array com 4 strings), correctOptionIndex (inteiro de 0 a 3),
        explanation (string), imageKeyword (string), moreInfoUrl (string), category (string), difficulty (string).",
        request.count,
        topic_instruction,
        difficulty_instruction,
        creativity_instruction,
        brevity_instruction,
    )
}

/// Drops a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn parse_questions(
    content: &str,
    request: &GenerationRequest,
) -> std::result::Result<Vec<Question>, ProviderFailure> {
    let json = strip_code_fence(content);
    if json.is_empty() {
        return Err(ProviderFailure::EmptyReply);
    }

    let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
    if raw.is_empty() {
        return Err(ProviderFailure::EmptyReply);
    }

    let default_difficulty = match request.difficulty {
        Difficulty::Mixed => "Geral",
        difficulty => difficulty.label(),
    };

    raw.into_iter()
        .map(|mut q| {
            q.category = non_blank(q.category).or_else(|| Some(request.topic.label().to_string()));
            q.difficulty = non_blank(q.difficulty).or_else(|| Some(default_difficulty.to_string()));
            q.into_question(uuid::Uuid::new_v4().to_string())
                .map_err(ProviderFailure::from)
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Always-available question set shown when generation fails.
pub fn fallback_questions() -> Vec<Question> {
    vec![Question {
        id: "fallback-1".to_string(),
        question_text: "Ocorreu um erro ao gerar perguntas novas. Quem é a mãe de Jesus?".to_string(),
        options: [
            "Santa Ana".to_string(),
            "Maria".to_string(),
            "Santa Isabel".to_string(),
            "Maria Madalena".to_string(),
        ],
        correct_option_index: 1,
        explanation: "Maria é a Mãe de Deus (Theotokos) e mãe de Jesus, concebida sem pecado original.".to_string(),
        image_keyword: "virgin mary".to_string(),
        more_info_url: Some(
            "https://www.google.com/search?q=site:vatican.va+Maria+M%C3%A3e+de+Deus".to_string(),
        ),
        category: Some("Mariologia".to_string()),
        difficulty: Some("Iniciante".to_string()),
    }]
}
