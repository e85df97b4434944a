// 调研流水线：评估 -> 澄清 -> 规划 -> 检索 -> 综合
//
// 首次调用可能在澄清阶段暂停，交出SessionHandle；
// 调用方收集答案后通过resume续跑，续跑不会再次评估。

pub mod agents;
pub mod error;
pub mod events;
pub mod manager;
pub mod session;
pub mod types;

pub use agents::{LlmResearchAgents, ResearchAgents};
pub use error::ResearchError;
pub use events::{EventLine, ResearchEvent};
pub use manager::{ResearchManager, ResearchOutcome, ResearchRun, run_to_completion};
pub use session::{
    ANSWER_SKIPPED, ClarificationAnswers, QaPairs, SearchCountHint, SessionHandle,
    normalize_search_count,
};
pub use types::{ClarificationPlan, FollowUpQuestion, ReportData, WebSearchItem, WebSearchPlan};
