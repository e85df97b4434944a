use anyhow::Result;
use async_trait::async_trait;

use crate::generator::context::GeneratorContext;
use crate::generator::research::types::{
    ClarificationPlan, ReportData, WebSearchItem, WebSearchPlan,
};
use crate::generator::step_forward_agent::StepForwardAgent;

pub mod clarification_agent;
pub mod planner_agent;
pub mod search_agent;
pub mod writer_agent;

use clarification_agent::ClarificationAgent;
use planner_agent::{PlannerAgent, PlannerInput};
use search_agent::SearchAgent;
use writer_agent::{WriterAgent, WriterInput};

/// 调研流程依赖的四个协作方
#[async_trait]
pub trait ResearchAgents: Send + Sync + 'static {
    /// 评估查询复杂度并决定是否追问
    async fn assess(&self, query: &str) -> Result<ClarificationPlan>;

    /// 为增强查询生成检索计划
    async fn plan(&self, enhanced_query: &str, requested_searches: usize) -> Result<WebSearchPlan>;

    /// 执行单条检索并返回摘要
    async fn search(&self, item: &WebSearchItem) -> Result<String>;

    /// 综合检索摘要生成最终报告
    async fn synthesize(&self, query: &str, summaries: &[String]) -> Result<ReportData>;
}

/// 基于LLM的协作方实现
#[derive(Clone)]
pub struct LlmResearchAgents {
    context: GeneratorContext,
}

impl LlmResearchAgents {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ResearchAgents for LlmResearchAgents {
    async fn assess(&self, query: &str) -> Result<ClarificationPlan> {
        ClarificationAgent
            .execute(&self.context, &query.to_string())
            .await
    }

    async fn plan(&self, enhanced_query: &str, requested_searches: usize) -> Result<WebSearchPlan> {
        let input = PlannerInput {
            enhanced_query: enhanced_query.to_string(),
            requested_searches,
        };
        PlannerAgent.execute(&self.context, &input).await
    }

    async fn search(&self, item: &WebSearchItem) -> Result<String> {
        SearchAgent.execute(&self.context, item).await
    }

    async fn synthesize(&self, query: &str, summaries: &[String]) -> Result<ReportData> {
        let input = WriterInput {
            query: query.to_string(),
            summaries: summaries.to_vec(),
        };
        WriterAgent.execute(&self.context, &input).await
    }
}
