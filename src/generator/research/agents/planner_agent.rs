use anyhow::Result;

use crate::generator::research::types::{AgentType, MAX_SEARCHES, MIN_SEARCHES, WebSearchPlan};
use crate::generator::step_forward_agent::{LLMCallMode, PromptTemplate, StepForwardAgent};

/// 规划器输入：增强查询 + 用户建议的检索次数
#[derive(Debug, Clone)]
pub struct PlannerInput {
    pub enhanced_query: String,
    pub requested_searches: usize,
}

/// 检索规划员 - 根据（可能带澄清上下文的）查询确定检索次数并产出检索计划
#[derive(Default)]
pub struct PlannerAgent;

impl PlannerAgent {
    fn instructions(requested_searches: usize) -> String {
        format!(
            r#"You are an expert research strategist. Given a query (possibly with additional clarification context), create a comprehensive search plan.

**USER PREFERENCE:** The user suggested {requested} searches, but you should determine the OPTIMAL number based on the query complexity.
**GUARDRAILS:** You must generate between {min} and {max} searches (inclusive).

**YOUR PRIMARY GOAL:** Determine the ideal number of searches for this specific query:

**SIMPLE QUERIES (1-2 searches optimal):**
- Basic definitions (e.g., "What is photosynthesis?")
- Simple factual questions (e.g., "What is the capital of France?")
- Single-concept explanations (e.g., "How does a microwave work?")

**MODERATE QUERIES (2-3 searches optimal):**
- Technology overviews (e.g., "What is blockchain?")
- Process explanations (e.g., "How does machine learning work?")
- Comparing 2-3 concepts

**COMPLEX QUERIES (3-5 searches optimal):**
- Multi-faceted topics (e.g., "AI impact on healthcare")
- Broad subjects requiring multiple perspectives
- Topics needing historical + current + future views
- Industry analysis with multiple stakeholders

**CRITICAL:** Always explain your reasoning in the deviation_reasoning field, even if you use the suggested number. Explain why that number is optimal for this query.

When additional context is provided from clarification questions, use that information to:
- Focus searches on the specific aspects the user is most interested in
- Adjust the scope and depth based on their preferences
- Target the appropriate audience level (technical vs. general)
- Consider the specified time frame or geographical scope
- Include the requested perspectives or viewpoints

For each search, consider:
- **Relevance to clarified intent**: Prioritize aspects highlighted in clarification
- **Coverage**: Ensure searches cover different aspects/angles of the topic
- **Specificity**: Balance broad overview searches with specific detailed searches
- **Recency**: Include searches for recent developments or current information
- **Authority**: Consider searches that would find authoritative/expert sources
- **Practical**: Include searches for real-world applications or examples

Create searches that complement each other and would provide a researcher with comprehensive information to write a detailed report.

**EFFICIENCY PRINCIPLE:** Use the minimum number of searches needed to thoroughly answer the query. Don't create redundant searches just to reach a target number."#,
            requested = requested_searches,
            min = MIN_SEARCHES,
            max = MAX_SEARCHES,
        )
    }
}

impl StepForwardAgent for PlannerAgent {
    type Input = PlannerInput;
    type Output = WebSearchPlan;

    fn agent_type(&self) -> String {
        AgentType::PlannerAgent.to_string()
    }

    fn prompt_template(&self, input: &PlannerInput) -> PromptTemplate {
        PromptTemplate {
            system_prompt: Self::instructions(input.requested_searches),
            user_prompt: input.enhanced_query.clone(),
            llm_call_mode: LLMCallMode::Extract,
        }
    }

    fn post_process(&self, result: WebSearchPlan, _input: &PlannerInput) -> Result<WebSearchPlan> {
        Ok(result.enforce_cap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::research::types::WebSearchItem;

    #[test]
    fn test_instructions_carry_requested_count_and_guardrails() {
        let template = PlannerAgent.prompt_template(&PlannerInput {
            enhanced_query: "Query: x".to_string(),
            requested_searches: 4,
        });

        assert!(template.system_prompt.contains("The user suggested 4 searches"));
        assert!(template.system_prompt.contains("between 1 and 5 searches"));
        assert_eq!(template.user_prompt, "Query: x");
    }

    #[test]
    fn test_post_process_truncates_to_cap() {
        let searches = (0..8)
            .map(|i| WebSearchItem {
                reason: format!("r{}", i),
                query: format!("q{}", i),
            })
            .collect();
        let plan = WebSearchPlan {
            searches,
            deviation_reasoning: String::new(),
        };
        let input = PlannerInput {
            enhanced_query: String::new(),
            requested_searches: 3,
        };

        let capped = PlannerAgent.post_process(plan, &input).unwrap();
        assert_eq!(capped.searches.len(), MAX_SEARCHES);
        assert_eq!(capped.searches[0].query, "q0");
        assert_eq!(capped.searches[4].query, "q4");
    }
}
