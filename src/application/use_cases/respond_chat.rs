use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::application::{ChatRepository, EmbeddingService, LlmClient, VectorRepository};
use crate::domain::{ChatMessage, DomainError, ResponseEvent, ScoredDocument};

/// Placeholder content used when language-model generation is disabled.
pub const NO_LLM_NOTICE: &str =
    "Language-model generation is disabled for this deployment; the retrieved documents below are the full answer.";

#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Skip generation entirely and answer with retrieval results only.
    /// A first-class mode, not a debug shortcut.
    pub no_llm: bool,
    pub top_k: usize,
    pub collections: Vec<String>,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            no_llm: false,
            top_k: 5,
            collections: vec!["default".to_string()],
        }
    }
}

/// Concurrent retrieval-augmented response aggregator.
///
/// One call fans out N per-collection retrieval producers plus one
/// generation producer onto a single event channel. Retrieval hits are
/// fanned back in to the generation producer, so generation sees the
/// retrieved context while events stream out in completion order. The
/// channel is closed only after every producer has finished.
pub struct RespondChatUseCase {
    chat_repo: Arc<dyn ChatRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    vector_repo: Arc<dyn VectorRepository>,
    llm_client: Arc<dyn LlmClient>,
    config: ResponderConfig,
}

impl RespondChatUseCase {
    pub fn new(
        chat_repo: Arc<dyn ChatRepository>,
        embedding_service: Arc<dyn EmbeddingService>,
        vector_repo: Arc<dyn VectorRepository>,
        llm_client: Arc<dyn LlmClient>,
        config: ResponderConfig,
    ) -> Self {
        Self {
            chat_repo,
            embedding_service,
            vector_repo,
            llm_client,
            config,
        }
    }

    /// Run one user turn. Returns the persisted assistant placeholder
    /// (updated in place as generation completes) and the event stream.
    pub async fn execute(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<(ChatMessage, mpsc::Receiver<ResponseEvent>), DomainError> {
        let user = ChatMessage::user(session_id.to_string(), user_text.to_string());
        self.chat_repo.save_message(&user).await?;

        // Persisted before any work starts so the client has something to
        // poll while producers run.
        let placeholder =
            ChatMessage::assistant_placeholder(session_id.to_string(), user.id().to_string());
        self.chat_repo.save_message(&placeholder).await?;

        let history = self.chat_repo.session_messages(session_id).await?;

        // A failed query embedding degrades to generation without context
        // rather than a turn with no terminal event.
        let query_vector = match self.embedding_service.embed_query(user_text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("Query embedding failed, skipping retrieval: {}", e);
                None
            }
        };

        let (tx, rx) = mpsc::channel::<ResponseEvent>(64);
        let (ctx_tx, ctx_rx) = oneshot::channel::<Vec<ScoredDocument>>();
        let (hits_tx, mut hits_rx) = mpsc::unbounded_channel::<Vec<ScoredDocument>>();

        let mut producers: JoinSet<()> = JoinSet::new();

        if let Some(query_vector) = query_vector {
            for collection in self.config.collections.clone() {
                let vector_repo = Arc::clone(&self.vector_repo);
                let query_vector = query_vector.clone();
                let top_k = self.config.top_k;
                let tx = tx.clone();
                let hits_tx = hits_tx.clone();
                producers.spawn(async move {
                    match vector_repo.search(&collection, &query_vector, top_k).await {
                        Ok(hits) => {
                            for hit in &hits {
                                let _ = tx.send(ResponseEvent::Document(hit.clone())).await;
                            }
                            let _ = hits_tx.send(hits);
                        }
                        Err(e) => {
                            warn!("Retrieval failed for collection '{}': {}", collection, e);
                        }
                    }
                });
            }
        }
        drop(hits_tx);

        // Fan-in: hand the merged, score-ordered hits to generation once
        // every lookup has reported.
        producers.spawn(async move {
            let mut collected: Vec<ScoredDocument> = Vec::new();
            while let Some(mut hits) = hits_rx.recv().await {
                collected.append(&mut hits);
            }
            collected
                .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            let _ = ctx_tx.send(collected);
        });

        {
            let chat_repo = Arc::clone(&self.chat_repo);
            let llm_client = Arc::clone(&self.llm_client);
            let no_llm = self.config.no_llm;
            let tx = tx.clone();
            let user_text = user_text.to_string();
            let placeholder = placeholder.clone();
            producers.spawn(async move {
                let retrieved = ctx_rx.await.unwrap_or_default();
                generate(
                    chat_repo,
                    llm_client,
                    no_llm,
                    placeholder,
                    &history,
                    &user_text,
                    &retrieved,
                    tx,
                )
                .await;
            });
        }

        // Counted completion: the coordinator drains every producer before
        // dropping the last sender, so the stream can neither lose events
        // nor close early.
        tokio::spawn(async move {
            while producers.join_next().await.is_some() {}
            drop(tx);
        });

        Ok((placeholder, rx))
    }

}

#[allow(clippy::too_many_arguments)]
async fn generate(
    chat_repo: Arc<dyn ChatRepository>,
    llm_client: Arc<dyn LlmClient>,
    no_llm: bool,
    mut message: ChatMessage,
    history: &[ChatMessage],
    user_text: &str,
    retrieved: &[ScoredDocument],
    tx: mpsc::Sender<ResponseEvent>,
) {
    if no_llm {
        message.set_content(NO_LLM_NOTICE);
        persist_update(&chat_repo, &message).await;
        let _ = tx.send(ResponseEvent::Message(message)).await;
        return;
    }

    let prompt = build_prompt(history, retrieved, user_text);
    debug!("Generating response ({} context documents)", retrieved.len());

    match llm_client.generate(&prompt).await {
        Ok(text) => {
            message.set_content(text);
            persist_update(&chat_repo, &message).await;
            let _ = tx.send(ResponseEvent::Message(message)).await;
        }
        Err(e) => {
            // The error lands both on the persisted message and on the
            // stream, so neither polling nor streaming clients stall.
            message.set_error(e.to_string());
            persist_update(&chat_repo, &message).await;
            let _ = tx.send(ResponseEvent::Error(message)).await;
        }
    }
}

async fn persist_update(chat_repo: &Arc<dyn ChatRepository>, message: &ChatMessage) {
    if let Err(e) = chat_repo.update_message(message).await {
        warn!(
            message_id = message.id(),
            "Failed to persist assistant message: {}", e
        );
    }
}

fn build_prompt(history: &[ChatMessage], retrieved: &[ScoredDocument], user_text: &str) -> String {
    let mut prompt = String::from(
        "Answer the user's question using the context documents when they are relevant.\n",
    );

    if !retrieved.is_empty() {
        prompt.push_str("\nContext:\n");
        for doc in retrieved {
            prompt.push_str(&format!(
                "[{}#{}] {}\n",
                doc.document_id, doc.chunk_index, doc.content
            ));
        }
    }

    let prior: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| !m.content().is_empty())
        .collect();
    if !prior.is_empty() {
        prompt.push_str("\nConversation:\n");
        for message in prior {
            let role = match message.message_type() {
                crate::domain::MessageType::User => "User",
                crate::domain::MessageType::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n", role, message.content()));
        }
    }

    prompt.push_str(&format!("\nUser: {}\nAssistant:", user_text));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageType;

    fn message(t: MessageType, content: &str) -> ChatMessage {
        let mut m = match t {
            MessageType::User => ChatMessage::user("s".to_string(), content.to_string()),
            MessageType::Assistant => {
                ChatMessage::assistant_placeholder("s".to_string(), "p".to_string())
            }
        };
        m.set_content(content);
        m
    }

    #[test]
    fn test_prompt_includes_context_and_history() {
        let history = vec![
            message(MessageType::User, "what is a connector?"),
            message(MessageType::Assistant, "a configured content source"),
        ];
        let retrieved = vec![ScoredDocument {
            document_id: "d1".to_string(),
            chunk_index: 0,
            content: "connectors ingest external content".to_string(),
            score: 0.9,
            collection: "default".to_string(),
        }];

        let prompt = build_prompt(&history, &retrieved, "how often do they run?");

        assert!(prompt.contains("connectors ingest external content"));
        assert!(prompt.contains("User: what is a connector?"));
        assert!(prompt.contains("Assistant: a configured content source"));
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn test_prompt_skips_empty_placeholder_messages() {
        let history = vec![
            message(MessageType::User, "hi"),
            ChatMessage::assistant_placeholder("s".to_string(), "p".to_string()),
        ];
        let prompt = build_prompt(&history, &[], "hello again");
        assert!(!prompt.contains("Assistant: \n"));
    }
}
