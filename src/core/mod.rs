pub mod chat_stream;
pub mod config;
pub mod error;
pub mod front_matter;
pub mod message;
pub mod model_catalog;
pub mod providers;
pub mod reframe;
pub mod settings;
pub mod tokenizer;
pub mod transcript;
