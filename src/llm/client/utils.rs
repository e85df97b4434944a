use std::time::Duration;

use crate::config::LLMConfig;

/// 提示词总长度低于该阈值时优先使用高能效模型
const EFFICIENT_PROMPT_LIMIT: usize = 32 * 1024;

/// 根据提示词规模选择模型，返回（首选模型，兜底模型）
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= EFFICIENT_PROMPT_LIMIT {
        let fallover = (llm_config.model_powerful != llm_config.model_efficient)
            .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 单次调用的超时时间，至少1秒
pub fn attempt_timeout(llm_config: &LLMConfig) -> Duration {
    Duration::from_secs(llm_config.timeout_seconds.max(1))
}

/// 在重试时附加上一次的错误信息，提示模型规避
pub fn append_error_hint(user_prompt: &str, error: &anyhow::Error) -> String {
    format!(
        "{}\n\n**Note:** a previous attempt to answer this request failed with the error \"{}\". Make sure your answer avoids it.",
        user_prompt, error
    )
}
