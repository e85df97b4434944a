use thiserror::Error;

/// 导致整个调研流失败的阶段错误
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("search planning failed: {0}")]
    Planning(#[source] anyhow::Error),

    #[error("the search planner returned no searches")]
    EmptySearchPlan,

    #[error("report synthesis failed: {0}")]
    Synthesis(#[source] anyhow::Error),

    #[error("research stream ended before a final report or clarification request")]
    Incomplete,
}
