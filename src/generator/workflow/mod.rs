use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::save_report;
use crate::generator::research::agents::{LlmResearchAgents, ResearchAgents};
use crate::generator::research::error::ResearchError;
use crate::generator::research::events::ResearchEvent;
use crate::generator::research::manager::{ResearchManager, ResearchOutcome};
use crate::generator::research::session::{
    ANSWER_SKIPPED, ClarificationAnswers, QaPairs, SearchCountHint, SessionHandle,
};
use crate::generator::research::types::{FollowUpQuestion, ReportData};

use anyhow::{Result, anyhow};
use futures::{Stream, StreamExt};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// 单次调研请求
#[derive(Debug, Clone, Default)]
pub struct ResearchRequest {
    /// 调研问题
    pub query: String,
    /// 期望的检索次数，未指定时使用配置中的默认值
    pub searches: Option<String>,
    /// 跳过澄清，暂停时直接以SKIP续跑
    pub skip_clarification: bool,
    /// 输出带标记的原始事件行
    pub raw_events: bool,
}

impl ResearchRequest {
    fn search_hint(&self, config: &Config) -> SearchCountHint {
        self.searches
            .clone()
            .unwrap_or_else(|| config.research.default_searches.clone())
            .into()
    }
}

/// 启动调研工作流
///
/// 返回的错误均已向用户输出过一次，调用方只需决定退出码。
pub async fn launch(config: &Config, request: &ResearchRequest) -> Result<()> {
    let context = GeneratorContext::new(config.clone())
        .inspect_err(|e| eprintln!("❌ 初始化失败: {:#}", e))?;

    // 启动时检查模型连接，失败信息由check_connection输出
    context.llm_client.check_connection().await?;

    let started = Instant::now();
    let manager = ResearchManager::new(Arc::new(LlmResearchAgents::new(context.clone())), config);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();

    let report = run_session(&manager, request, config, stdin, &mut stdout).await?;

    if config.research.save_report {
        save_report(&context, &request.query, &report)
            .await
            .inspect_err(|e| eprintln!("❌ 报告保存失败: {:#}", e))?;
    }

    println!("⏱️ 调研耗时: {:.2}秒", started.elapsed().as_secs_f64());
    Ok(())
}

/// 把`launch`的结果映射为进程退出码，错误此前已经输出过
pub fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// 驱动一次完整的调研：开始 -> （澄清 -> 续跑）-> 报告
///
/// 失败时在已输出的进度之后写一条错误信息，再返回该错误。
pub async fn run_session<A, R, W>(
    manager: &ResearchManager<A>,
    request: &ResearchRequest,
    config: &Config,
    input: R,
    out: &mut W,
) -> Result<ReportData>
where
    A: ResearchAgents,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    match drive_session(manager, request, config, input, out).await {
        Ok(report) => Ok(report),
        Err(e) => {
            writeln!(out, "❌ 调研失败: {}", e)?;
            Err(e)
        }
    }
}

async fn drive_session<A, R, W>(
    manager: &ResearchManager<A>,
    request: &ResearchRequest,
    config: &Config,
    input: R,
    out: &mut W,
) -> Result<ReportData>
where
    A: ResearchAgents,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let hint = request.search_hint(config);

    let outcome = consume(
        manager.start(&request.query, hint),
        request.raw_events,
        out,
    )
    .await?;

    let report = match outcome {
        ResearchOutcome::Completed(report) => report,
        ResearchOutcome::Paused(handle) => {
            let answers = if request.skip_clarification {
                writeln!(out, "⏭️ 已跳过澄清问题")?;
                ClarificationAnswers::Skip
            } else {
                collect_answers(handle.questions(), &mut lines, out).await?
            };
            match consume(manager.resume(handle, answers), request.raw_events, out).await? {
                ResearchOutcome::Completed(report) => report,
                ResearchOutcome::Paused(_) => {
                    return Err(anyhow!("research paused again after clarification"));
                }
            }
        }
    };

    if !request.raw_events {
        render_report(&report, out)?;
    }
    Ok(report)
}

/// 消费事件流，返回终止事件
async fn consume<S, W>(stream: S, raw_events: bool, out: &mut W) -> Result<ResearchOutcome>
where
    S: Stream<Item = Result<ResearchEvent>>,
    W: Write,
{
    let mut stream = std::pin::pin!(stream);
    let mut outcome = None;

    while let Some(event) = stream.next().await {
        let event = event?;

        if raw_events {
            writeln!(out, "{}", event.to_line()?)?;
        } else if let ResearchEvent::Progress(line) = &event {
            writeln!(out, "{}", line)?;
        }

        match event {
            ResearchEvent::Progress(_) => {}
            ResearchEvent::ClarificationNeeded(handle) => {
                if !raw_events {
                    announce_clarification(&handle, out)?;
                }
                outcome = Some(ResearchOutcome::Paused(handle));
            }
            ResearchEvent::FinalReport(report) => {
                outcome = Some(ResearchOutcome::Completed(report));
            }
        }
    }

    Ok(outcome.ok_or(ResearchError::Incomplete)?)
}

fn announce_clarification<W: Write>(handle: &SessionHandle, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "\n🤔 为了更好地完成调研，需要澄清 {} 个问题（复杂度 {}/3）",
        handle.questions().len(),
        handle.plan.complexity()
    )?;
    writeln!(out, "   {}", handle.plan.assessment.reasoning)?;
    writeln!(
        out,
        "💡 直接回车表示留空，输入 skip 跳过当前问题，首个问题输入 skip all 跳过全部"
    )?;
    Ok(())
}

/// 逐个提问并读取答案
pub async fn collect_answers<R, W>(
    questions: &[FollowUpQuestion],
    lines: &mut Lines<R>,
    out: &mut W,
) -> Result<ClarificationAnswers>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut pairs = QaPairs::new();

    for (i, question) in questions.iter().enumerate() {
        writeln!(out, "\n❓ 问题 {}: {}", i + 1, question.question)?;
        writeln!(out, "   目的: {}", question.purpose)?;
        write!(out, "> ")?;
        out.flush()?;

        // 输入结束时按留空处理
        let line = lines.next_line().await?.unwrap_or_default();
        let answer = line.trim();

        if i == 0 && answer.eq_ignore_ascii_case("skip all") {
            return Ok(ClarificationAnswers::Skip);
        }
        if answer.eq_ignore_ascii_case("skip") {
            pairs.insert(question.question.as_str(), ANSWER_SKIPPED);
        } else {
            pairs.insert(question.question.as_str(), answer);
        }
    }

    Ok(ClarificationAnswers::Answered(pairs))
}

fn render_report<W: Write>(report: &ReportData, out: &mut W) -> Result<()> {
    writeln!(out, "\n=====REPORT=====\n")?;
    writeln!(out, "{}", report.markdown_report)?;
    writeln!(out, "\n📝 摘要: {}", report.short_summary)?;

    if !report.follow_up_questions.is_empty() {
        writeln!(out, "\n🔎 后续可调研的问题:")?;
        for question in &report.follow_up_questions {
            writeln!(out, "   - {}", question)?;
        }
    }
    Ok(())
}
