pub mod cli;
pub mod config;
pub mod generator;
pub mod llm;

// Re-export commonly used types
pub use config::Config;
pub use generator::research::{
    ClarificationAnswers, ResearchAgents, ResearchError, ResearchEvent, ResearchManager,
    ResearchOutcome, SessionHandle,
};
pub use generator::workflow::{ResearchRequest, launch};
