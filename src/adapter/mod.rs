mod http_embedding;
mod http_llm;
mod in_memory_bus;
mod in_memory_chat_repository;
mod in_memory_connector_repository;
mod in_memory_document_repository;
mod in_memory_vector_repository;
mod mock_embedding;
mod mock_llm;
mod model_aware_chunker;
mod source;
mod static_chunker;

pub use http_embedding::HttpEmbedding;
pub use http_llm::HttpLlmClient;
pub use in_memory_bus::InMemoryMessageBus;
pub use in_memory_chat_repository::InMemoryChatRepository;
pub use in_memory_connector_repository::InMemoryConnectorRepository;
pub use in_memory_document_repository::InMemoryDocumentRepository;
pub use in_memory_vector_repository::InMemoryVectorRepository;
pub use mock_embedding::MockEmbedding;
pub use mock_llm::MockLlm;
pub use model_aware_chunker::ModelAwareChunker;
pub use source::{ConnectorRegistry, WebConnector};
pub use static_chunker::StaticChunker;
