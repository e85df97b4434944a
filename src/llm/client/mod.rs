//! LLM客户端 - 提供统一的LLM服务接口

use anyhow::{Result, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::Config;

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::{append_error_hint, attempt_timeout, evaluate_befitting_model};

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: Config,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.llm)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        println!("🔄 正在检查模型连接...");
        match self
            .prompt("System: You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                println!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，每次尝试都受`timeout_seconds`约束
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let llm_config = &self.config.llm;
        let max_retries = llm_config.retry_attempts.max(1);
        let timeout = attempt_timeout(llm_config);
        let mut retries = 0;

        loop {
            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "model call timed out after {}s",
                    timeout.as_secs()
                )),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        attempt = retries,
                        max_attempts = max_retries,
                        error = %err,
                        "model call failed"
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(llm_config.retry_delay_ms)).await;
                }
            }
        }
    }

    /// 结构化数据提取
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config.llm, system_prompt, user_prompt);

        let result = self
            .extract_with_model::<T>(system_prompt, user_prompt, &befitting_model)
            .await;

        match (result, fallover_model) {
            (Ok(value), _) => Ok(value),
            (Err(e), Some(model)) => {
                tracing::warn!(
                    model = %model,
                    error = %e,
                    "extraction failed on every attempt, switching to fallover model"
                );
                let user_prompt_with_fixer = append_error_hint(user_prompt, &e);
                self.extract_with_model::<T>(system_prompt, &user_prompt_with_fixer, &model)
                    .await
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn extract_with_model<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor =
            self.client
                .create_extractor::<T>(model, system_prompt, &self.config.llm)?;

        self.retry_with_backoff(|| extractor.extract(user_prompt))
            .await
    }

    /// 单轮对话，返回文本
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, _) =
            evaluate_befitting_model(&self.config.llm, system_prompt, user_prompt);
        let agent = self
            .client
            .create_agent(&befitting_model, system_prompt, &self.config.llm)?;

        self.retry_with_backoff(|| agent.prompt(user_prompt)).await
    }
}
