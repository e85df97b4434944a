use anyhow::Result;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::generator::context::GeneratorContext;

/// LLM调用方式配置
#[derive(Debug, Clone, PartialEq)]
pub enum LLMCallMode {
    /// 使用extract方法，返回特定要求的结构化数据
    Extract,
    /// 使用prompt方法，返回泛化推理文本
    Prompt,
}

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: String,
    /// 用户提示词
    pub user_prompt: String,
    /// LLM调用方式
    pub llm_call_mode: LLMCallMode,
}

/// 极简Agent trait：声明提示词与输出类型，执行流程由默认实现完成
#[async_trait]
pub trait StepForwardAgent: Send + Sync {
    /// Agent的输入
    type Input: Send + Sync;

    /// Agent的输出类型 - 必须支持JSON序列化
    type Output: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static;

    /// Agent类型标识
    fn agent_type(&self) -> String;

    /// Prompt模板配置
    fn prompt_template(&self, input: &Self::Input) -> PromptTemplate;

    /// 可选的后处理钩子
    fn post_process(&self, result: Self::Output, _input: &Self::Input) -> Result<Self::Output> {
        Ok(result)
    }

    /// 默认实现的execute方法
    async fn execute(&self, context: &GeneratorContext, input: &Self::Input) -> Result<Self::Output> {
        let template = self.prompt_template(input);
        let agent_type = self.agent_type();

        tracing::debug!(agent = %agent_type, mode = ?template.llm_call_mode, "executing agent");

        let result = match template.llm_call_mode {
            LLMCallMode::Extract => {
                context
                    .llm_client
                    .extract::<Self::Output>(&template.system_prompt, &template.user_prompt)
                    .await?
            }
            LLMCallMode::Prompt => {
                let text = context
                    .llm_client
                    .prompt(&template.system_prompt, &template.user_prompt)
                    .await?;
                serde_json::from_value(serde_json::Value::String(text))?
            }
        };

        let result = self.post_process(result, input)?;
        tracing::debug!(agent = %agent_type, "agent finished");
        Ok(result)
    }
}
