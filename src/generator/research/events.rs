//! 调研进度事件，以及面向纯文本消费方的行编码

use anyhow::{Context, Result};

use crate::generator::research::session::SessionHandle;
use crate::generator::research::types::{ClarificationPlan, ReportData};

/// 澄清请求的行前缀
pub const CLARIFICATION_MARKER: &str = "CLARIFICATION_NEEDED:";
/// 澄清请求中trace id的分隔标记
pub const TRACE_ID_MARKER: &str = "|TRACE_ID:";
/// 最终报告的行前缀
pub const FINAL_REPORT_MARKER: &str = "FINAL_REPORT:";

/// 调研流中的单个事件
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchEvent {
    /// 普通进度，markdown文本
    Progress(String),
    /// 会话暂停，需要用户回答澄清问题后携带句柄续跑
    ClarificationNeeded(SessionHandle),
    /// 最终报告，成功流的最后一个事件
    FinalReport(ReportData),
}

impl ResearchEvent {
    pub fn progress(text: impl Into<String>) -> Self {
        ResearchEvent::Progress(text.into())
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResearchEvent::Progress(_))
    }

    /// 编码为单行文本
    pub fn to_line(&self) -> Result<String> {
        Ok(match self {
            ResearchEvent::Progress(text) => text.clone(),
            ResearchEvent::ClarificationNeeded(handle) => format!(
                "{}{}{}{}",
                CLARIFICATION_MARKER,
                serde_json::to_string(&handle.plan)?,
                TRACE_ID_MARKER,
                handle.trace_id
            ),
            ResearchEvent::FinalReport(report) => {
                format!("{}{}", FINAL_REPORT_MARKER, report.markdown_report)
            }
        })
    }
}

/// 解析后的文本行
#[derive(Debug, Clone, PartialEq)]
pub enum EventLine {
    Progress(String),
    Clarification {
        plan: ClarificationPlan,
        trace_id: String,
    },
    FinalReport(String),
}

impl EventLine {
    pub fn parse(line: &str) -> Result<Self> {
        if let Some(rest) = line.strip_prefix(CLARIFICATION_MARKER) {
            let (plan_json, trace_id) = rest
                .rsplit_once(TRACE_ID_MARKER)
                .context("clarification line is missing its trace id")?;
            let plan = serde_json::from_str(plan_json)
                .context("clarification line carries an unreadable plan")?;
            return Ok(EventLine::Clarification {
                plan,
                trace_id: trace_id.to_string(),
            });
        }
        if let Some(report) = line.strip_prefix(FINAL_REPORT_MARKER) {
            return Ok(EventLine::FinalReport(report.to_string()));
        }
        Ok(EventLine::Progress(line.to_string()))
    }
}
