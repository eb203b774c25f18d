pub mod advisor;
pub mod engine;
pub mod error;
pub mod session;
pub mod traits;

pub use advisor::{AdvisorConfig, MissionAdvisor};
pub use engine::{AssistEngine, AssistRequest};
pub use error::{AdvisorError, AssistError};
pub use session::{AssistOutcome, AssistTimings};
