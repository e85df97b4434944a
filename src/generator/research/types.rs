use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 检索次数下限
pub const MIN_SEARCHES: usize = 1;
/// 检索次数上限（硬上限，规划结果超出时截断）
pub const MAX_SEARCHES: usize = 5;
/// 检索次数无法解析时的默认值
pub const DEFAULT_SEARCHES: usize = 3;

/// 智能体类型枚举
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    ClarificationAgent,
    PlannerAgent,
    SearchAgent,
    WriterAgent,
}

impl Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            AgentType::ClarificationAgent => "ClarificationAgent",
            AgentType::PlannerAgent => "PlannerAgent",
            AgentType::SearchAgent => "SearchAgent",
            AgentType::WriterAgent => "WriterAgent",
        };
        write!(f, "{}", str)
    }
}

/// 查询复杂度评估
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct QueryAssessment {
    /// Query complexity on a scale of 1-3 (1=simple, 2=moderate, 3=complex)
    pub complexity: u8,
    /// Brief explanation of why this complexity was assigned
    pub reasoning: String,
}

/// 澄清问题
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct FollowUpQuestion {
    /// A specific follow-up question to clarify the user's intent
    pub question: String,
    /// Why this question is important for better research
    pub purpose: String,
}

/// 澄清计划：是否需要、以及需要向用户追问什么
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ClarificationPlan {
    /// Assessment of the query complexity
    pub assessment: QueryAssessment,
    /// Follow-up questions to ask the user
    #[serde(default)]
    pub questions: Vec<FollowUpQuestion>,
    /// Whether follow-up questions are needed
    pub should_ask_questions: bool,
}

impl ClarificationPlan {
    /// 复杂度规整到1..=3
    pub fn complexity(&self) -> u8 {
        self.assessment.complexity.clamp(1, 3)
    }

    /// 要求追问但问题列表为空时按无需澄清处理
    pub fn needs_clarification(&self) -> bool {
        self.should_ask_questions && !self.questions.is_empty()
    }
}

/// 单条检索意图
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct WebSearchItem {
    /// Your reasoning for why this search is important to the query.
    pub reason: String,
    /// The search term to use for the web search.
    pub query: String,
}

/// 检索计划
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct WebSearchPlan {
    /// A list of web searches to perform to best answer the query (between 1 and 5 items).
    pub searches: Vec<WebSearchItem>,
    /// Explain why you chose this specific number of searches and how it's optimal for this query complexity.
    #[serde(default)]
    pub deviation_reasoning: String,
}

impl WebSearchPlan {
    /// 强制执行硬上限：只截断，不补齐
    pub fn enforce_cap(mut self) -> Self {
        self.searches.truncate(MAX_SEARCHES);
        self
    }
}

/// 最终调研报告
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ReportData {
    /// A short 2-3 sentence summary of the findings.
    pub short_summary: String,
    /// The final report in markdown format.
    pub markdown_report: String,
    /// Suggested topics to research further.
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}
