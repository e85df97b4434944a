use crate::generator::research::types::{AgentType, WebSearchItem};
use crate::generator::step_forward_agent::{LLMCallMode, PromptTemplate, StepForwardAgent};

const SEARCH_INSTRUCTIONS: &str = "You are a research assistant. Given a search term and the reason it matters, \
produce a concise summary of what a web search for that term would surface. The summary must be 2-3 paragraphs \
and less than 300 words. Capture the main points. Write succinctly, no need to have complete sentences or good \
grammar. This will be consumed by someone synthesizing a report, so it's vital you capture the essence and \
ignore any fluff. Do not include any additional commentary other than the summary itself.";

/// 检索执行员 - 为单条检索意图产出摘要
#[derive(Default)]
pub struct SearchAgent;

impl StepForwardAgent for SearchAgent {
    type Input = WebSearchItem;
    type Output = String;

    fn agent_type(&self) -> String {
        AgentType::SearchAgent.to_string()
    }

    fn prompt_template(&self, item: &WebSearchItem) -> PromptTemplate {
        PromptTemplate {
            system_prompt: SEARCH_INSTRUCTIONS.to_string(),
            user_prompt: format!(
                "Search term: {}\nReason for searching: {}",
                item.query, item.reason
            ),
            llm_call_mode: LLMCallMode::Prompt,
        }
    }
}
