//! Concrete collaborators and process-level plumbing shared by the server and CLI.

pub mod config_store;
pub mod debug_store;
pub mod defaults;
pub mod fs_util;
pub mod llm;
pub mod prior;
pub mod runtime_engine;
pub mod secrets;
pub mod stt;
pub mod transcoder;
pub mod tts;

pub use config_store::ConfigStore;
pub use debug_store::DebugStore;
pub use runtime_engine::{build_engine_from_config, prior_context_from_config};
pub use secrets::Secrets;
