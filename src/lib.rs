pub mod adapter;
pub mod application;
pub mod container;
pub mod domain;

pub use application::{
    ChatRepository, Chunking, ConnectorFactory, ConnectorRepository, DocumentRepository,
    EmbedDocumentsUseCase, EmbeddingService, ExecuteConnectorUseCase, LlmClient, MessageBus,
    MessageHandler, ResponderConfig, RespondChatUseCase, ScheduleConnectorsUseCase,
    SchedulerConfig, SourceConnector, VectorRepository,
};

pub use adapter::{
    ConnectorRegistry, HttpEmbedding, HttpLlmClient, InMemoryChatRepository,
    InMemoryConnectorRepository, InMemoryDocumentRepository, InMemoryMessageBus,
    InMemoryVectorRepository, MockEmbedding, MockLlm, ModelAwareChunker, StaticChunker,
    WebConnector,
};

pub use container::{Container, ContainerConfig};

pub use domain::{
    ChatMessage, ChatSession, Chunk, Connector, ConnectorStatus, Document, DomainError,
    EmbeddingConfig, EmbeddingReport, MessageType, ResponseEvent, ScoredDocument, Source,
    TriggerParams, TriggerRequest,
};
