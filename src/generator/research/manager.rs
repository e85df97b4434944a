//! 调研流程编排：评估 -> （暂停澄清 | 续跑回显）-> 规划 -> 并发检索 -> 报告综合

use anyhow::Result;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::{Config, ResearchConfig};
use crate::generator::research::agents::ResearchAgents;
use crate::generator::research::error::ResearchError;
use crate::generator::research::events::ResearchEvent;
use crate::generator::research::session::{
    AnswerState, ClarificationAnswers, ResearchSession, SearchCountHint, SessionHandle,
};
use crate::generator::research::types::{ReportData, WebSearchPlan};

/// 调研管理器，自身不持有跨会话状态
pub struct ResearchManager<A: ResearchAgents> {
    agents: Arc<A>,
    research: ResearchConfig,
    max_parallels: usize,
}

impl<A: ResearchAgents> Clone for ResearchManager<A> {
    fn clone(&self) -> Self {
        Self {
            agents: Arc::clone(&self.agents),
            research: self.research.clone(),
            max_parallels: self.max_parallels,
        }
    }
}

impl<A: ResearchAgents> ResearchManager<A> {
    pub fn new(agents: Arc<A>, config: &Config) -> Self {
        Self {
            agents,
            research: config.research.clone(),
            max_parallels: config.llm.max_parallels.max(1),
        }
    }

    /// 通用入口：`answers`为空表示首次调用，否则为澄清后的续跑
    pub fn run(
        &self,
        query: &str,
        hint: impl Into<SearchCountHint>,
        answers: Option<ClarificationAnswers>,
        trace_id: Option<String>,
    ) -> impl Stream<Item = Result<ResearchEvent>> + Send + 'static {
        self.drive(ResearchSession::new(query, hint, answers, trace_id))
    }

    /// 开启新会话
    pub fn start(
        &self,
        query: &str,
        hint: impl Into<SearchCountHint>,
    ) -> impl Stream<Item = Result<ResearchEvent>> + Send + 'static {
        self.run(query, hint, None, None)
    }

    /// 携带暂停时拿到的句柄续跑
    pub fn resume(
        &self,
        handle: SessionHandle,
        answers: ClarificationAnswers,
    ) -> impl Stream<Item = Result<ResearchEvent>> + Send + 'static {
        self.drive(ResearchSession::resume(handle, answers))
    }

    fn drive(
        &self,
        mut session: ResearchSession,
    ) -> impl Stream<Item = Result<ResearchEvent>> + Send + 'static {
        let agents = Arc::clone(&self.agents);
        let research = self.research.clone();
        let max_parallels = self.max_parallels;

        async_stream::stream! {
            let span = tracing::info_span!("research_session", trace_id = %session.trace_id);

            if !session.is_resuming() {
                yield Ok(ResearchEvent::Progress(research.trace_link(&session.trace_id)));

                yield Ok(ResearchEvent::progress("## Analyzing query complexity..."));
                match agents.assess(&session.original_query).instrument(span.clone()).await {
                    Ok(plan) if plan.needs_clarification() => {
                        let handle = session.pause(plan);
                        span.in_scope(|| tracing::info!(
                            questions = handle.questions().len(),
                            "clarification requested, pausing session"
                        ));
                        yield Ok(ResearchEvent::ClarificationNeeded(handle));
                        return;
                    }
                    Ok(plan) => {
                        span.in_scope(|| tracing::debug!(
                            complexity = plan.assessment.complexity,
                            "query is clear enough, skipping clarification"
                        ));
                    }
                    Err(e) => {
                        span.in_scope(|| tracing::warn!(
                            error = %e,
                            "complexity assessment failed, continuing without clarification"
                        ));
                    }
                }
            } else {
                for line in clarification_log(&session) {
                    yield Ok(ResearchEvent::Progress(line));
                }
            }

            yield Ok(ResearchEvent::progress("## Generating search plan..."));
            let plan = match plan_searches(agents.as_ref(), &session).instrument(span.clone()).await {
                Ok(plan) => plan,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            yield Ok(ResearchEvent::Progress(announce_plan(&plan, session.search_count)));
            for item in &plan.searches {
                yield Ok(ResearchEvent::Progress(format!(
                    "Query: **{}** \t\nReason: {} \n",
                    item.query, item.reason
                )));
            }

            yield Ok(ResearchEvent::progress("## Searching..."));
            let total = plan.searches.len();
            let semaphore = Arc::new(Semaphore::new(max_parallels));
            let mut tasks = JoinSet::new();
            for item in plan.searches {
                let agents = Arc::clone(&agents);
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(
                    async move {
                        let _permit = semaphore.acquire_owned().await?;
                        agents.search(&item).await
                    }
                    .instrument(span.clone()),
                );
            }

            let mut summaries = Vec::with_capacity(total);
            let mut completed = 0;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(summary)) => summaries.push(summary),
                    Ok(Err(e)) => {
                        span.in_scope(|| tracing::warn!(error = %e, "search failed, dropping its result"));
                    }
                    Err(e) => {
                        span.in_scope(|| tracing::warn!(error = %e, "search task aborted, dropping its result"));
                    }
                }
                completed += 1;
                yield Ok(ResearchEvent::Progress(format!(
                    "Searching... {}/{} completed \n",
                    completed, total
                )));
            }
            yield Ok(ResearchEvent::progress("Finished searching \n"));

            yield Ok(ResearchEvent::progress("## Thinking about report..."));
            let report = match synthesize_report(agents.as_ref(), &session.original_query, &summaries)
                .instrument(span.clone())
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            yield Ok(ResearchEvent::progress("Finished writing report"));
            yield Ok(ResearchEvent::FinalReport(report));
        }
    }
}

async fn plan_searches<A: ResearchAgents>(
    agents: &A,
    session: &ResearchSession,
) -> Result<WebSearchPlan> {
    let plan = agents
        .plan(&session.enhanced_query(), session.search_count)
        .await
        .map_err(ResearchError::Planning)?
        .enforce_cap();

    if plan.searches.is_empty() {
        return Err(ResearchError::EmptySearchPlan.into());
    }
    Ok(plan)
}

async fn synthesize_report<A: ResearchAgents>(
    agents: &A,
    query: &str,
    summaries: &[String],
) -> Result<ReportData> {
    Ok(agents
        .synthesize(query, summaries)
        .await
        .map_err(ResearchError::Synthesis)?)
}

/// 续跑时回显澄清问答
fn clarification_log(session: &ResearchSession) -> Vec<String> {
    let mut lines = vec!["## Clarification Questions & Answers".to_string()];

    if let Some(assessment) = &session.assessment {
        lines.push(format!(
            "**Why clarification was requested:** {} \n",
            assessment.reasoning
        ));
        lines.push(format!(
            "**Query complexity level:** {}/3 \n",
            assessment.complexity
        ));
    }

    match &session.answers {
        Some(ClarificationAnswers::Answered(pairs)) => {
            for (i, (question, answer)) in pairs.iter().enumerate() {
                let rendered = match AnswerState::of(answer) {
                    AnswerState::Skipped => "*[Skipped]*".to_string(),
                    AnswerState::Blank => "*[Left blank]*".to_string(),
                    AnswerState::Answered => answer.to_string(),
                };
                lines.push(format!(
                    "**Question {}:** {} \t\n**Answer:** {} \t",
                    i + 1,
                    question,
                    rendered
                ));
            }
        }
        Some(ClarificationAnswers::Skip) => {
            lines.push("*All clarification questions were skipped*".to_string());
        }
        None => {}
    }
    lines
}

fn announce_plan(plan: &WebSearchPlan, requested: usize) -> String {
    let count = plan.searches.len();
    let mut line = if count == requested {
        format!("Will perform **{}** searches \n", count)
    } else {
        format!("Will perform **{}** searches ({} requested) \n", count, requested)
    };
    let reasoning = plan.deviation_reasoning.trim();
    if !reasoning.is_empty() {
        line.push_str(&format!("**Search count reasoning:** {} \n", reasoning));
    }
    line
}

/// 一次调用的最终结局
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    Paused(SessionHandle),
    Completed(ReportData),
}

/// 消费完整个事件流后的结果
#[derive(Debug, Clone)]
pub struct ResearchRun {
    pub progress: Vec<String>,
    pub outcome: ResearchOutcome,
}

/// 消费事件流直到结束，供非交互调用方使用
pub async fn run_to_completion<S>(stream: S) -> Result<ResearchRun>
where
    S: Stream<Item = Result<ResearchEvent>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut progress = Vec::new();
    let mut outcome = None;

    while let Some(event) = stream.next().await {
        match event? {
            ResearchEvent::Progress(line) => progress.push(line),
            ResearchEvent::ClarificationNeeded(handle) => {
                outcome = Some(ResearchOutcome::Paused(handle))
            }
            ResearchEvent::FinalReport(report) => {
                outcome = Some(ResearchOutcome::Completed(report))
            }
        }
    }

    let outcome = outcome.ok_or(ResearchError::Incomplete)?;
    Ok(ResearchRun { progress, outcome })
}
