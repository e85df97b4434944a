use anyhow::{Result, anyhow};
use async_trait::async_trait;
use deep_research_rs::config::Config;
use deep_research_rs::generator::research::events::EventLine;
use deep_research_rs::generator::research::manager::run_to_completion;
use deep_research_rs::generator::research::session::QaPairs;
use deep_research_rs::generator::research::types::{
    ClarificationPlan, FollowUpQuestion, QueryAssessment, ReportData, WebSearchItem,
    WebSearchPlan,
};
use deep_research_rs::{
    ClarificationAnswers, ResearchAgents, ResearchError, ResearchEvent, ResearchManager,
    ResearchOutcome, SessionHandle,
};
use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// 按脚本应答的协作方，记录每次调用
struct ScriptedAgents {
    clarification: Result<ClarificationPlan, String>,
    planned: usize,
    failing_search: Option<usize>,
    log: Mutex<Vec<String>>,
}

impl ScriptedAgents {
    fn new(clarification: Result<ClarificationPlan, String>, planned: usize) -> Self {
        Self {
            clarification,
            planned,
            failing_search: None,
            log: Mutex::new(Vec::new()),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResearchAgents for ScriptedAgents {
    async fn assess(&self, query: &str) -> Result<ClarificationPlan> {
        self.log.lock().unwrap().push(format!("assess:{}", query));
        self.clarification.clone().map_err(|e| anyhow!(e))
    }

    async fn plan(&self, enhanced_query: &str, requested: usize) -> Result<WebSearchPlan> {
        self.log
            .lock()
            .unwrap()
            .push(format!("plan:{}:{}", requested, enhanced_query));
        Ok(WebSearchPlan {
            searches: (1..=self.planned)
                .map(|i| WebSearchItem {
                    reason: format!("angle {}", i),
                    query: format!("search {}", i),
                })
                .collect(),
            deviation_reasoning: String::new(),
        })
    }

    async fn search(&self, item: &WebSearchItem) -> Result<String> {
        if let Some(n) = self.failing_search {
            if item.query == format!("search {}", n) {
                return Err(anyhow!("upstream error"));
            }
        }
        Ok(format!("found: {}", item.query))
    }

    async fn synthesize(&self, query: &str, summaries: &[String]) -> Result<ReportData> {
        self.log
            .lock()
            .unwrap()
            .push(format!("synthesize:{}", summaries.len()));
        Ok(ReportData {
            short_summary: format!("{} sources", summaries.len()),
            markdown_report: format!("# {}", query),
            follow_up_questions: vec![],
        })
    }
}

fn clear_query() -> ClarificationPlan {
    ClarificationPlan {
        assessment: QueryAssessment {
            complexity: 1,
            reasoning: "specific".to_string(),
        },
        questions: vec![],
        should_ask_questions: false,
    }
}

fn broad_query() -> ClarificationPlan {
    ClarificationPlan {
        assessment: QueryAssessment {
            complexity: 3,
            reasoning: "very broad".to_string(),
        },
        questions: vec![
            FollowUpQuestion {
                question: "Which area of healthcare?".to_string(),
                purpose: "narrow the field".to_string(),
            },
            FollowUpQuestion {
                question: "Clinical or administrative?".to_string(),
                purpose: "pick a lens".to_string(),
            },
        ],
        should_ask_questions: true,
    }
}

fn manager(agents: &Arc<ScriptedAgents>) -> ResearchManager<ScriptedAgents> {
    let mut config = Config::default();
    config.research.trace_url_template = None;
    ResearchManager::new(agents.clone(), &config)
}

#[tokio::test]
async fn test_simple_query_runs_straight_through() {
    let agents = Arc::new(ScriptedAgents::new(Ok(clear_query()), 3));

    let run = run_to_completion(manager(&agents).start("What is photosynthesis?", "3"))
        .await
        .unwrap();

    assert!(run.progress[0].starts_with("🔍 Trace ID: `trace_"));
    let ResearchOutcome::Completed(report) = run.outcome else {
        panic!("expected a final report");
    };
    assert_eq!(report.markdown_report, "# What is photosynthesis?");
    assert_eq!(
        agents.log(),
        vec![
            "assess:What is photosynthesis?".to_string(),
            "plan:3:Query: What is photosynthesis?".to_string(),
            "synthesize:3".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_pause_and_resume_round_trip() {
    let agents = Arc::new(ScriptedAgents::new(Ok(broad_query()), 2));
    let manager = manager(&agents);

    let paused = run_to_completion(manager.start("AI in healthcare", "abc"))
        .await
        .unwrap();
    let ResearchOutcome::Paused(handle) = paused.outcome else {
        panic!("expected the session to pause");
    };
    assert_eq!(handle.search_count, 3);

    // 句柄可以序列化保存后再取回
    let stored = serde_json::to_string(&handle).unwrap();
    let handle: SessionHandle = serde_json::from_str(&stored).unwrap();

    let answers: QaPairs = [
        ("Which area of healthcare?", "Diagnostics"),
        ("Clinical or administrative?", "Answer skipped"),
    ]
    .into_iter()
    .collect();
    let resumed = run_to_completion(manager.resume(handle, ClarificationAnswers::Answered(answers)))
        .await
        .unwrap();

    assert!(resumed.progress.contains(
        &"**Question 1:** Which area of healthcare? \t\n**Answer:** Diagnostics \t".to_string()
    ));
    assert!(resumed.progress.contains(
        &"**Question 2:** Clinical or administrative? \t\n**Answer:** *[Skipped]* \t".to_string()
    ));
    assert!(matches!(resumed.outcome, ResearchOutcome::Completed(_)));

    let log = agents.log();
    assert_eq!(log.iter().filter(|l| l.starts_with("assess:")).count(), 1);
    assert!(log.contains(
        &"plan:3:Original Query: AI in healthcare\n\nAdditional Context from User:\nQ: Which area of healthcare?\nA: Diagnostics\n\nQ: Clinical or administrative?\nA: Answer skipped\n\n"
            .to_string()
    ));
}

#[tokio::test]
async fn test_resume_from_restored_fields() {
    let agents = Arc::new(ScriptedAgents::new(Ok(clear_query()), 1));

    let handle = SessionHandle::restore("trace_saved", "AI in healthcare", 2_i64, "[]", "garbage");
    let events: Vec<_> = manager(&agents)
        .resume(handle, ClarificationAnswers::Skip)
        .collect()
        .await;

    assert!(matches!(
        &events[0],
        Ok(ResearchEvent::Progress(line)) if line == "## Clarification Questions & Answers"
    ));
    // 评估信息无法解析时不回显
    assert!(matches!(
        &events[1],
        Ok(ResearchEvent::Progress(line)) if line == "*All clarification questions were skipped*"
    ));
    assert!(matches!(
        events.last().unwrap(),
        Ok(ResearchEvent::FinalReport(_))
    ));
    assert!(agents.log().iter().all(|l| !l.starts_with("assess:")));
}

#[tokio::test]
async fn test_failed_search_degrades_gracefully() {
    let agents = Arc::new(ScriptedAgents {
        failing_search: Some(3),
        ..ScriptedAgents::new(Ok(clear_query()), 5)
    });

    let run = run_to_completion(manager(&agents).start("Rust async runtimes", "5"))
        .await
        .unwrap();

    let last_counter = run
        .progress
        .iter()
        .filter(|line| line.starts_with("Searching... "))
        .last()
        .unwrap();
    assert_eq!(last_counter, "Searching... 5/5 completed \n");
    assert!(agents.log().contains(&"synthesize:4".to_string()));
}

#[tokio::test]
async fn test_assessor_failure_is_not_fatal() {
    let agents = Arc::new(ScriptedAgents::new(Err("model overloaded".to_string()), 1));

    let events: Vec<_> = manager(&agents).start("q", "1").collect().await;
    assert!(events.iter().all(|e| e.is_ok()));
    assert!(matches!(
        events.last().unwrap(),
        Ok(ResearchEvent::FinalReport(_))
    ));
}

#[tokio::test]
async fn test_empty_plan_is_fatal() {
    let agents = Arc::new(ScriptedAgents::new(Ok(clear_query()), 0));

    let err = run_to_completion(manager(&agents).start("q", "1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ResearchError>(),
        Some(ResearchError::EmptySearchPlan)
    ));
}

#[tokio::test]
async fn test_marker_lines_for_text_consumers() {
    let agents = Arc::new(ScriptedAgents::new(Ok(broad_query()), 1));

    let events: Vec<_> = manager(&agents).start("AI in healthcare", "2").collect().await;
    let ResearchEvent::ClarificationNeeded(handle) = events.last().unwrap().as_ref().unwrap()
    else {
        panic!("expected a clarification request");
    };

    let line = ResearchEvent::ClarificationNeeded(handle.clone())
        .to_line()
        .unwrap();
    assert!(line.starts_with("CLARIFICATION_NEEDED:"));
    match EventLine::parse(&line).unwrap() {
        EventLine::Clarification { plan, trace_id } => {
            assert_eq!(trace_id, handle.trace_id);
            assert_eq!(plan.questions.len(), 2);
        }
        other => panic!("unexpected line {:?}", other),
    }
}
