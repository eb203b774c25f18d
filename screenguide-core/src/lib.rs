pub mod config;
pub mod mode;
pub mod prompt;
pub mod text;
pub mod types;
pub mod verdict;

// Keep the public surface small and intentional.
pub use config::*;
pub use mode::*;
pub use prompt::*;
pub use text::*;
pub use types::*;
pub use verdict::*;
