use crate::generator::research::types::{AgentType, ClarificationPlan};
use crate::generator::step_forward_agent::{LLMCallMode, PromptTemplate, StepForwardAgent};

const ASSESSMENT_INSTRUCTIONS: &str = r#"You are a research query analyst. Your job is to assess the complexity and clarity of user queries and determine if follow-up questions would improve the research outcome.

Assess the query complexity:
- **Level 1 (Simple)**: Clear, specific queries with well-defined scope (e.g., "What is photosynthesis?")
- **Level 2 (Moderate)**: Queries that could benefit from some clarification but have reasonable scope (e.g., "How does AI impact healthcare?")
- **Level 3 (Complex)**: Broad, ambiguous, or multi-faceted queries that would greatly benefit from clarification (e.g., "What should I know about climate change?")

For each complexity level, generate follow-up questions:
- **Level 1**: 1 question (if any needed)
- **Level 2**: 1-2 questions
- **Level 3**: 2-3 questions

Questions should help clarify:
- Specific aspects or focus areas of interest
- Target audience or application context
- Time frame or geographical scope
- Depth level required (overview vs. technical details)
- Particular perspectives or viewpoints desired

Only suggest questions that would meaningfully improve the research quality. If the query is already sufficiently clear and specific, set should_ask_questions to false."#;

/// 查询复杂度评估员 - 判断是否需要向用户追问澄清问题
#[derive(Default)]
pub struct ClarificationAgent;

impl StepForwardAgent for ClarificationAgent {
    type Input = String;
    type Output = ClarificationPlan;

    fn agent_type(&self) -> String {
        AgentType::ClarificationAgent.to_string()
    }

    fn prompt_template(&self, query: &String) -> PromptTemplate {
        PromptTemplate {
            system_prompt: ASSESSMENT_INSTRUCTIONS.to_string(),
            user_prompt: format!("Query: {}", query),
            llm_call_mode: LLMCallMode::Extract,
        }
    }
}
