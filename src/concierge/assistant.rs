use super::actions::{extract_actions, Action};
use super::llm::LanguageModel;
use super::prompt::{PromptBuilder, PromptContext, MORE_INFO_QUESTION};
use crate::config::ChatConfig;
use crate::error::{AppError, Result};
use crate::metrics::CHAT_TURNS_TOTAL;
use crate::models::{CompanyProfile, ConversationTurn};
use crate::retrieval::ContentRetriever;
use crate::state::cache::AppCache;
use crate::state::UserLocks;
use crate::tour::TourService;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

fn default_page() -> String {
    "home".to_string()
}

/// A visitor message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,

    #[validate(length(min = 1, max = 4000))]
    pub message: String,

    #[serde(default = "default_page")]
    pub current_page: String,

    /// Taken from the visitor's tour progress when absent
    #[serde(default)]
    pub tour_started: Option<bool>,
}

/// The concierge's answer to one message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub turn_id: Uuid,
    pub response: String,
    pub current_page: String,
    pub tour_started: bool,
    pub has_more_info: bool,
    pub actions: Vec<Action>,
    /// Titles of the documents used as context
    pub sources: Vec<String>,
}

/// Detailed follow-up for the previous answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoreInfoReply {
    pub response: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default)]
struct Session {
    history: VecDeque<ConversationTurn>,
    pending_detail: Option<String>,
}

impl Session {
    fn record(&mut self, turn: ConversationTurn, limit: usize) {
        self.history.push_back(turn);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}

/// Split a model answer into the short reply and the stored detail
fn split_answer(answer: &str) -> (String, String) {
    match answer.split_once(MORE_INFO_QUESTION) {
        Some((initial, rest)) => {
            // only the text up to a second marker belongs to the detail
            let detail = rest.split(MORE_INFO_QUESTION).next().unwrap_or_default();
            (initial.trim().to_string(), detail.trim().to_string())
        }
        None => (answer.trim().to_string(), answer.trim().to_string()),
    }
}

/// Answers visitor questions using retrieved content and a language model.
///
/// Sessions (history and the pending detailed answer) are kept per visitor
/// and expire after `chat.session_ttl_secs` of inactivity. Messages from one
/// visitor are answered one at a time so no turn is lost.
pub struct ConciergeAssistant {
    retriever: Arc<ContentRetriever>,
    model: Arc<dyn LanguageModel>,
    tours: Arc<TourService>,
    prompts: PromptBuilder,
    config: ChatConfig,
    sessions: AppCache<String, Session>,
    session_locks: UserLocks,
}

impl ConciergeAssistant {
    pub fn new(
        retriever: Arc<ContentRetriever>,
        model: Arc<dyn LanguageModel>,
        tours: Arc<TourService>,
        company: CompanyProfile,
        config: ChatConfig,
    ) -> Self {
        let sessions = AppCache::new(
            config.max_sessions,
            Duration::from_secs(config.session_ttl_secs),
        );
        Self {
            retriever,
            model,
            tours,
            prompts: PromptBuilder::new(company),
            config,
            sessions,
            session_locks: UserLocks::new(),
        }
    }

    pub fn company(&self) -> &CompanyProfile {
        self.prompts.company()
    }

    fn apology(&self) -> String {
        format!(
            "I apologize, but I'm having trouble generating a response at the moment. \
             How else can I assist you with information about {} or help you navigate our website?",
            self.company().name
        )
    }

    fn nothing_more(&self) -> String {
        format!(
            "I'm sorry, but I don't have any additional information on this topic at the moment. \
             Is there anything else I can help you with regarding {} or navigating our website?",
            self.company().name
        )
    }

    /// Answer a visitor message
    pub async fn respond(&self, request: ChatRequest) -> Result<ChatReply> {
        request.validate()?;
        if request.message.trim().is_empty() {
            return Err(AppError::Validation("message must not be empty".to_string()));
        }

        let _guard = self.session_locks.lock(&request.user_id).await;

        let documents = self.retriever.relevant_content(&request.message).await;
        info!(user_id = %request.user_id, documents = documents.len(), "Context retrieved");

        let current_step = match self.tours.peek_step(&request.user_id).await {
            Ok(step) => step,
            Err(e) => {
                warn!(error = %e, "Could not read tour progress");
                None
            }
        };
        let tour_started = request.tour_started.unwrap_or(current_step.is_some());

        let mut session = self
            .sessions
            .get(&request.user_id)
            .await
            .unwrap_or_default();
        let history: Vec<ConversationTurn> = session.history.iter().cloned().collect();

        let prompt = self.prompts.build(&PromptContext {
            current_page: &request.current_page,
            tour_started,
            current_step: current_step.as_ref(),
            history: &history,
            user_input: &request.message,
            documents: &documents,
        });

        let (response, detail, status) = match self.model.complete(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => {
                let (initial, detail) = split_answer(&answer);
                let response = format!("{}\n\n{}", initial, MORE_INFO_QUESTION);
                (response, Some(detail).filter(|d| !d.is_empty()), "success")
            }
            Ok(_) => {
                warn!(provider = self.model.provider(), "Empty completion");
                (self.apology(), None, "fallback")
            }
            Err(e) => {
                warn!(provider = self.model.provider(), error = %e, "Answering with apology");
                (self.apology(), None, "fallback")
            }
        };
        CHAT_TURNS_TOTAL
            .with_label_values(&["respond", status])
            .inc();

        let limit = self.config.history_limit;
        session.record(ConversationTurn::user(request.message.clone()), limit);
        session.record(ConversationTurn::assistant(response.clone()), limit);
        let has_more_info = detail.is_some();
        session.pending_detail = detail;
        self.sessions.insert(request.user_id.clone(), session).await;

        Ok(ChatReply {
            turn_id: Uuid::new_v4(),
            actions: extract_actions(&response),
            response,
            current_page: request.current_page,
            tour_started,
            has_more_info,
            sources: documents
                .iter()
                .map(|scored| scored.document.title.clone())
                .collect(),
        })
    }

    /// The detailed answer held back from the last reply.
    ///
    /// Stays available until the visitor sends another message.
    pub async fn more_info(&self, user_id: &str) -> Result<MoreInfoReply> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id must not be empty".to_string()));
        }

        let _guard = self.session_locks.lock(user_id).await;
        let session = self.sessions.get(&user_id.to_string()).await;
        let response = match session {
            Some(mut session) if session.pending_detail.is_some() => {
                let detail = session.pending_detail.clone().unwrap_or_default();
                CHAT_TURNS_TOTAL
                    .with_label_values(&["more_info", "success"])
                    .inc();
                session.record(
                    ConversationTurn::assistant(detail.clone()),
                    self.config.history_limit,
                );
                self.sessions.insert(user_id.to_string(), session).await;
                detail
            }
            _ => {
                CHAT_TURNS_TOTAL
                    .with_label_values(&["more_info", "empty"])
                    .inc();
                self.nothing_more()
            }
        };

        Ok(MoreInfoReply {
            actions: extract_actions(&response),
            response,
        })
    }

    /// Recent turns for a visitor, oldest first
    pub async fn history(&self, user_id: &str) -> Vec<ConversationTurn> {
        self.sessions
            .get(&user_id.to_string())
            .await
            .map(|s| s.history.into_iter().collect())
            .unwrap_or_default()
    }
}
