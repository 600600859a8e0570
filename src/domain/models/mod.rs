mod chat;
mod connector;
mod document;
mod embedding;
mod trigger;

pub use chat::*;
pub use connector::*;
pub use document::*;
pub use embedding::*;
pub use trigger::*;
