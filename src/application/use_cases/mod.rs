mod embed_documents;
mod execute_connector;
mod respond_chat;
mod schedule_connectors;

pub use embed_documents::*;
pub use execute_connector::*;
pub use respond_chat::*;
pub use schedule_connectors::*;
