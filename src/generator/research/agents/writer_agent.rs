use crate::generator::research::types::{AgentType, ReportData};
use crate::generator::step_forward_agent::{LLMCallMode, PromptTemplate, StepForwardAgent};

const WRITER_INSTRUCTIONS: &str = r#"You are a senior researcher tasked with writing a cohesive report for a research query.
You will be provided with the original query, and some initial research done by a research assistant.

You should first come up with an outline for the report that describes the structure and flow of the report.
Then, generate the report and return that as your final output.

The final output should be in markdown format, and it should be lengthy and detailed. Aim for 5-10 pages of content, at least 1000 words.
If the research material is empty or thin, say so explicitly in the report instead of inventing sources."#;

/// 报告撰写输入
#[derive(Debug, Clone)]
pub struct WriterInput {
    pub query: String,
    pub summaries: Vec<String>,
}

/// 报告撰写员 - 基于检索摘要综合出最终报告
#[derive(Default)]
pub struct WriterAgent;

impl WriterAgent {
    fn format_summaries(summaries: &[String]) -> String {
        if summaries.is_empty() {
            return "(no search results were available)".to_string();
        }
        summaries
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{}] {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl StepForwardAgent for WriterAgent {
    type Input = WriterInput;
    type Output = ReportData;

    fn agent_type(&self) -> String {
        AgentType::WriterAgent.to_string()
    }

    fn prompt_template(&self, input: &WriterInput) -> PromptTemplate {
        PromptTemplate {
            system_prompt: WRITER_INSTRUCTIONS.to_string(),
            user_prompt: format!(
                "Original query: {}\nSummarized search results:\n{}",
                input.query,
                Self::format_summaries(&input.summaries)
            ),
            llm_call_mode: LLMCallMode::Extract,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_numbers_summaries() {
        let template = WriterAgent.prompt_template(&WriterInput {
            query: "q".to_string(),
            summaries: vec!["first".to_string(), "second".to_string()],
        });

        assert!(template.user_prompt.starts_with("Original query: q\n"));
        assert!(template.user_prompt.contains("[1] first\n\n[2] second"));
    }

    #[test]
    fn test_prompt_with_no_results() {
        let template = WriterAgent.prompt_template(&WriterInput {
            query: "q".to_string(),
            summaries: vec![],
        });
        assert!(template.user_prompt.contains("(no search results were available)"));
    }
}
