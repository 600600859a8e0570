use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::adapter::{
    ConnectorRegistry, HttpEmbedding, HttpLlmClient, InMemoryChatRepository,
    InMemoryConnectorRepository, InMemoryDocumentRepository, InMemoryMessageBus,
    InMemoryVectorRepository, MockEmbedding, MockLlm, ModelAwareChunker, StaticChunker,
};
use crate::application::{
    ChatRepository, Chunking, ConnectorFactory, ConnectorRepository, DocumentRepository,
    EmbedDocumentsUseCase, EmbeddingService, ExecuteConnectorUseCase, LlmClient, MessageBus,
    ResponderConfig, RespondChatUseCase, ScheduleConnectorsUseCase, SchedulerConfig,
    VectorRepository,
};
use crate::domain::EmbeddingConfig;

pub struct ContainerConfig {
    pub mock_embeddings: bool,
    pub embedding_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub llm_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub no_llm: bool,
    /// Fixed-size chunking instead of model-aware windows.
    pub static_chunking: bool,
    pub reload_interval_secs: u64,
    pub collection: String,
    pub top_k: usize,
    pub batch_size: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            mock_embeddings: true,
            embedding_url: None,
            embedding_api_key: None,
            llm_url: None,
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            no_llm: false,
            static_chunking: false,
            reload_interval_secs: 30,
            collection: "default".to_string(),
            top_k: 5,
            batch_size: 16,
        }
    }
}

/// Explicit constructor wiring: leaves first (storage, bus), then use
/// cases, then loops under one cancellable root token. Shutdown cancels
/// that token and awaits loop exit.
pub struct Container {
    connector_repo: Arc<dyn ConnectorRepository>,
    document_repo: Arc<dyn DocumentRepository>,
    chat_repo: Arc<dyn ChatRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    bus: Arc<InMemoryMessageBus>,
    embedding_service: Arc<dyn EmbeddingService>,
    scheduler: Arc<ScheduleConnectorsUseCase>,
    executor: Arc<ExecuteConnectorUseCase>,
    responder: Arc<RespondChatUseCase>,
    cancel: CancellationToken,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Self {
        let cancel = CancellationToken::new();

        let connector_repo: Arc<dyn ConnectorRepository> =
            Arc::new(InMemoryConnectorRepository::new());
        let document_repo: Arc<dyn DocumentRepository> =
            Arc::new(InMemoryDocumentRepository::new());
        let chat_repo: Arc<dyn ChatRepository> = Arc::new(InMemoryChatRepository::new());
        let vector_repo: Arc<dyn VectorRepository> = Arc::new(InMemoryVectorRepository::new());
        let bus = Arc::new(InMemoryMessageBus::new());

        let embedding_service: Arc<dyn EmbeddingService> = if config.mock_embeddings {
            debug!("Using mock embedding service");
            Arc::new(MockEmbedding::new())
        } else if let Some(url) = config.embedding_url.as_deref() {
            debug!("Using HTTP embedding service at {}", url);
            Arc::new(HttpEmbedding::new(
                url,
                config.embedding_api_key.clone(),
                EmbeddingConfig::default(),
            ))
        } else {
            warn!("No embedding backend configured, falling back to mock embeddings");
            Arc::new(MockEmbedding::new())
        };

        let chunking: Arc<dyn Chunking> = if config.static_chunking {
            Arc::new(StaticChunker::default())
        } else {
            Arc::new(ModelAwareChunker::for_model(embedding_service.config()))
        };

        let llm_client: Arc<dyn LlmClient> = if let Some(url) = config.llm_url.as_deref() {
            debug!("Using HTTP language model at {}", url);
            Arc::new(HttpLlmClient::new(
                url,
                config.llm_api_key.clone(),
                config.llm_model.clone(),
            ))
        } else {
            debug!("Using mock language model");
            Arc::new(MockLlm::new(
                "No language model is configured; this is a canned response.",
            ))
        };

        let embed_pipeline = Arc::new(
            EmbedDocumentsUseCase::new(
                chunking,
                Arc::clone(&embedding_service),
                Arc::clone(&vector_repo),
                Arc::clone(&document_repo),
            )
            .with_batch_size(config.batch_size),
        );

        let scheduler = Arc::new(ScheduleConnectorsUseCase::new(
            Arc::clone(&connector_repo),
            Arc::clone(&bus) as Arc<dyn MessageBus>,
            SchedulerConfig {
                reload_interval: Duration::from_secs(config.reload_interval_secs),
            },
        ));

        let registry: Arc<dyn ConnectorFactory> = Arc::new(ConnectorRegistry::new());
        let executor = Arc::new(ExecuteConnectorUseCase::new(
            Arc::clone(&connector_repo),
            Arc::clone(&document_repo),
            registry,
            Arc::clone(&embed_pipeline),
            Arc::clone(&bus) as Arc<dyn MessageBus>,
            config.collection.clone(),
            cancel.child_token(),
        ));

        let responder = Arc::new(RespondChatUseCase::new(
            Arc::clone(&chat_repo),
            Arc::clone(&embedding_service),
            Arc::clone(&vector_repo),
            llm_client,
            ResponderConfig {
                no_llm: config.no_llm,
                top_k: config.top_k,
                collections: vec![config.collection.clone()],
            },
        ));

        Self {
            connector_repo,
            document_repo,
            chat_repo,
            vector_repo,
            bus,
            embedding_service,
            scheduler,
            executor,
            responder,
            cancel,
            config,
        }
    }

    /// Start the scheduler's reload loop, the scheduler's update-event
    /// listener, and the executor's consumer loop.
    pub fn spawn_loops(&self) -> JoinSet<()> {
        let mut loops = JoinSet::new();

        {
            let scheduler = Arc::clone(&self.scheduler);
            let cancel = self.cancel.child_token();
            loops.spawn(async move {
                scheduler.run(cancel).await;
            });
        }
        {
            let scheduler = Arc::clone(&self.scheduler);
            let cancel = self.cancel.child_token();
            loops.spawn(async move {
                if let Err(e) = scheduler.listen_updates(cancel).await {
                    error!("Scheduler update listener stopped: {}", e);
                }
            });
        }
        {
            let executor = Arc::clone(&self.executor);
            loops.spawn(async move {
                if let Err(e) = executor.run().await {
                    error!("Executor loop stopped: {}", e);
                }
            });
        }

        info!("Started scheduler, update listener, and executor loops");
        loops
    }

    /// Cancel the root token and wait for every loop to exit.
    pub async fn shutdown(&self, mut loops: JoinSet<()>) {
        self.cancel.cancel();
        while loops.join_next().await.is_some() {}
        info!("All loops stopped");
    }

    pub fn scheduler(&self) -> Arc<ScheduleConnectorsUseCase> {
        Arc::clone(&self.scheduler)
    }

    pub fn executor(&self) -> Arc<ExecuteConnectorUseCase> {
        Arc::clone(&self.executor)
    }

    pub fn responder(&self) -> Arc<RespondChatUseCase> {
        Arc::clone(&self.responder)
    }

    pub fn bus(&self) -> Arc<InMemoryMessageBus> {
        Arc::clone(&self.bus)
    }

    pub fn connector_repo(&self) -> Arc<dyn ConnectorRepository> {
        Arc::clone(&self.connector_repo)
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        Arc::clone(&self.document_repo)
    }

    pub fn chat_repo(&self) -> Arc<dyn ChatRepository> {
        Arc::clone(&self.chat_repo)
    }

    pub fn vector_repo(&self) -> Arc<dyn VectorRepository> {
        Arc::clone(&self.vector_repo)
    }

    pub fn embedding_service(&self) -> Arc<dyn EmbeddingService> {
        Arc::clone(&self.embedding_service)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn collection(&self) -> &str {
        &self.config.collection
    }
}
