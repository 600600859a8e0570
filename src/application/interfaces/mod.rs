mod chat_repository;
mod chunking;
mod connector_factory;
mod connector_repository;
mod document_repository;
mod embedding_service;
mod llm_client;
mod message_bus;
mod source_connector;
mod vector_repository;

pub use chat_repository::*;
pub use chunking::*;
pub use connector_factory::*;
pub use connector_repository::*;
pub use document_repository::*;
pub use embedding_service::*;
pub use llm_client::*;
pub use message_bus::*;
pub use source_connector::*;
pub use vector_repository::*;
