//! 调研会话状态：检索次数规整、澄清问答、会话句柄

use serde::{Deserialize, Serialize};

use crate::generator::research::types::{
    ClarificationPlan, DEFAULT_SEARCHES, FollowUpQuestion, MAX_SEARCHES, MIN_SEARCHES,
    QueryAssessment,
};

/// 单个问题被用户跳过时的答案哨兵值
pub const ANSWER_SKIPPED: &str = "Answer skipped";

/// 用户输入的检索次数，可以是文本也可以是整数
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCountHint {
    Text(String),
    Number(i64),
}

impl From<&str> for SearchCountHint {
    fn from(value: &str) -> Self {
        SearchCountHint::Text(value.to_string())
    }
}

impl From<String> for SearchCountHint {
    fn from(value: String) -> Self {
        SearchCountHint::Text(value)
    }
}

impl From<i64> for SearchCountHint {
    fn from(value: i64) -> Self {
        SearchCountHint::Number(value)
    }
}

impl From<i32> for SearchCountHint {
    fn from(value: i32) -> Self {
        SearchCountHint::Number(value.into())
    }
}

impl From<usize> for SearchCountHint {
    fn from(value: usize) -> Self {
        SearchCountHint::Number(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl SearchCountHint {
    /// 规整到`[MIN_SEARCHES, MAX_SEARCHES]`，无法解析时返回`DEFAULT_SEARCHES`
    pub fn normalize(&self) -> usize {
        match self {
            SearchCountHint::Number(n) => clamp_searches(*n),
            SearchCountHint::Text(text) => parse_search_count(text)
                .map(clamp_searches)
                .unwrap_or(DEFAULT_SEARCHES),
        }
    }
}

/// 检索次数规整，全函数且幂等
pub fn normalize_search_count(hint: impl Into<SearchCountHint>) -> usize {
    hint.into().normalize()
}

fn clamp_searches(n: i64) -> usize {
    if n < MIN_SEARCHES as i64 {
        MIN_SEARCHES
    } else if n > MAX_SEARCHES as i64 {
        MAX_SEARCHES
    } else {
        n as usize
    }
}

fn parse_search_count(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }

    // 只接受ASCII十进制；"1_0"与非ASCII数字按无法解析处理
    // 超出i64范围的整数按符号饱和
    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Some(if negative { i64::MIN } else { i64::MAX });
    }
    None
}

/// 单个澄清答案的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Skipped,
    Blank,
    Answered,
}

impl AnswerState {
    pub fn of(answer: &str) -> Self {
        if answer == ANSWER_SKIPPED {
            AnswerState::Skipped
        } else if answer.trim().is_empty() {
            AnswerState::Blank
        } else {
            AnswerState::Answered
        }
    }
}

/// 保持插入顺序、问题唯一的问答映射
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaPairs {
    pairs: Vec<(String, String)>,
}

impl QaPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入问答；问题已存在时原位替换答案
    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let question = question.into();
        let answer = answer.into();
        match self.pairs.iter_mut().find(|(q, _)| *q == question) {
            Some(existing) => existing.1 = answer,
            None => self.pairs.push((question, answer)),
        }
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(q, _)| q == question)
            .map(|(_, a)| a.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<Q, A> FromIterator<(Q, A)> for QaPairs
where
    Q: Into<String>,
    A: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (Q, A)>>(iter: I) -> Self {
        let mut pairs = QaPairs::new();
        for (question, answer) in iter {
            pairs.insert(question, answer);
        }
        pairs
    }
}

/// 续跑时调用方提供的澄清结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClarificationAnswers {
    /// 用户跳过了整个澄清步骤
    Skip,
    /// 按问题文本索引的答案
    Answered(QaPairs),
}

impl ClarificationAnswers {
    /// 规划阶段可用的澄清上下文；`Skip`与空映射都视为无上下文
    pub fn context(&self) -> Option<&QaPairs> {
        match self {
            ClarificationAnswers::Skip => None,
            ClarificationAnswers::Answered(pairs) if pairs.is_empty() => None,
            ClarificationAnswers::Answered(pairs) => Some(pairs),
        }
    }
}

/// 构建交给规划器的增强查询
pub fn build_enhanced_query(original_query: &str, context: Option<&QaPairs>) -> String {
    let Some(pairs) = context.filter(|p| !p.is_empty()) else {
        return format!("Query: {}", original_query);
    };

    let mut enhanced = format!(
        "Original Query: {}\n\nAdditional Context from User:\n",
        original_query
    );
    for (question, answer) in pairs.iter() {
        enhanced.push_str(&format!("Q: {}\nA: {}\n\n", question, answer));
    }
    enhanced
}

fn align_to_questions(questions: &[FollowUpQuestion], pairs: QaPairs) -> QaPairs {
    let mut aligned = QaPairs::new();
    for question in questions {
        if let Some(answer) = pairs.get(&question.question) {
            aligned.insert(question.question.as_str(), answer);
        }
    }
    for (question, answer) in pairs.iter() {
        if aligned.get(question).is_none() {
            aligned.insert(question, answer);
        }
    }
    aligned
}

/// 生成新的trace id
pub fn gen_trace_id() -> String {
    format!("trace_{}", uuid::Uuid::new_v4().simple())
}

/// 澄清阶段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClarificationState {
    NotStarted,
    AwaitingAnswers,
    Answered,
    Skipped,
}

/// 暂停时交给调用方保存的会话句柄，续跑时原样传回
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub trace_id: String,
    pub original_query: String,
    pub search_count: usize,
    pub plan: ClarificationPlan,
}

impl SessionHandle {
    pub fn questions(&self) -> &[FollowUpQuestion] {
        &self.plan.questions
    }

    /// 从松散保存的字段还原句柄；无法解析的问题列表或评估信息降级为空
    pub fn restore(
        trace_id: &str,
        original_query: &str,
        search_count: impl Into<SearchCountHint>,
        questions_json: &str,
        assessment_json: &str,
    ) -> Self {
        let questions: Vec<FollowUpQuestion> = serde_json::from_str(questions_json)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored clarification questions are unreadable");
                Vec::new()
            });
        let assessment: QueryAssessment = serde_json::from_str(assessment_json)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "stored clarification assessment is unreadable");
                QueryAssessment {
                    complexity: 0,
                    reasoning: String::new(),
                }
            });

        Self {
            trace_id: trace_id.to_string(),
            original_query: original_query.to_string(),
            search_count: normalize_search_count(search_count),
            plan: ClarificationPlan {
                should_ask_questions: !questions.is_empty(),
                assessment,
                questions,
            },
        }
    }
}

/// 单次调研的会话状态，只存在于一次流式消费期间
#[derive(Debug, Clone)]
pub struct ResearchSession {
    pub trace_id: String,
    pub original_query: String,
    pub search_count: usize,
    pub clarification_state: ClarificationState,
    pub answers: Option<ClarificationAnswers>,
    /// 暂停前的评估结果，续跑时用于在进度中回显
    pub assessment: Option<QueryAssessment>,
}

impl ResearchSession {
    pub fn new(
        query: &str,
        hint: impl Into<SearchCountHint>,
        answers: Option<ClarificationAnswers>,
        trace_id: Option<String>,
    ) -> Self {
        let clarification_state = match &answers {
            None => ClarificationState::NotStarted,
            Some(ClarificationAnswers::Skip) => ClarificationState::Skipped,
            Some(ClarificationAnswers::Answered(_)) => ClarificationState::Answered,
        };

        Self {
            trace_id: trace_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(gen_trace_id),
            original_query: query.to_string(),
            search_count: normalize_search_count(hint),
            clarification_state,
            answers,
            assessment: None,
        }
    }

    /// 由暂停时的句柄恢复会话
    pub fn resume(handle: SessionHandle, answers: ClarificationAnswers) -> Self {
        let assessment = (handle.plan.assessment.complexity > 0
            || !handle.plan.assessment.reasoning.is_empty())
        .then(|| handle.plan.assessment.clone());

        // 答案按问题文本对齐到原提问顺序，未知问题保留在末尾
        let answers = match answers {
            ClarificationAnswers::Answered(pairs) => {
                ClarificationAnswers::Answered(align_to_questions(handle.questions(), pairs))
            }
            ClarificationAnswers::Skip => ClarificationAnswers::Skip,
        };

        let mut session = Self::new(
            &handle.original_query,
            handle.search_count,
            Some(answers),
            Some(handle.trace_id),
        );
        session.assessment = assessment;
        session
    }

    /// 已拿到澄清结果（逐题回答或整体跳过）时走续跑分支
    pub fn is_resuming(&self) -> bool {
        matches!(
            self.clarification_state,
            ClarificationState::Answered | ClarificationState::Skipped
        )
    }

    /// 进入等待澄清状态，生成交给调用方的句柄
    pub fn pause(&mut self, plan: ClarificationPlan) -> SessionHandle {
        self.clarification_state = ClarificationState::AwaitingAnswers;
        self.assessment = Some(plan.assessment.clone());
        SessionHandle {
            trace_id: self.trace_id.clone(),
            original_query: self.original_query.clone(),
            search_count: self.search_count,
            plan,
        }
    }

    pub fn enhanced_query(&self) -> String {
        build_enhanced_query(
            &self.original_query,
            self.answers.as_ref().and_then(ClarificationAnswers::context),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_numeric_text() {
        assert_eq!(normalize_search_count("3"), 3);
        assert_eq!(normalize_search_count(" 4 "), 4);
        assert_eq!(normalize_search_count("+2"), 2);
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(normalize_search_count("0"), 1);
        assert_eq!(normalize_search_count("-7"), 1);
        assert_eq!(normalize_search_count("12"), 5);
        assert_eq!(normalize_search_count(0_i64), 1);
        assert_eq!(normalize_search_count(99_i64), 5);
        assert_eq!(normalize_search_count(i64::MIN), 1);
        assert_eq!(normalize_search_count(usize::MAX), 5);
        assert_eq!(normalize_search_count("99999999999999999999999"), 5);
        assert_eq!(normalize_search_count("-99999999999999999999999"), 1);
    }

    #[test]
    fn test_normalize_unparseable_defaults_to_three() {
        for raw in ["", "   ", "abc", "3.5", "two", "-", "+", "4x"] {
            assert_eq!(normalize_search_count(raw), DEFAULT_SEARCHES, "input {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_total_and_idempotent() {
        let inputs = ["-100", "-1", "0", "1", "2", "3", "4", "5", "6", "1000", "abc", ""];
        for raw in inputs {
            let once = normalize_search_count(raw);
            assert!((MIN_SEARCHES..=MAX_SEARCHES).contains(&once));
            assert_eq!(normalize_search_count(once), once);
            assert_eq!(normalize_search_count(once.to_string()), once);
        }
        for n in -20_i64..=20 {
            let once = normalize_search_count(n);
            assert!((MIN_SEARCHES..=MAX_SEARCHES).contains(&once));
            assert_eq!(normalize_search_count(once), once);
        }
    }

    #[test]
    fn test_answer_state() {
        assert_eq!(AnswerState::of("Answer skipped"), AnswerState::Skipped);
        assert_eq!(AnswerState::of(""), AnswerState::Blank);
        assert_eq!(AnswerState::of("  \t"), AnswerState::Blank);
        assert_eq!(AnswerState::of("Europe only"), AnswerState::Answered);
    }

    #[test]
    fn test_qa_pairs_keep_order_and_replace_in_place() {
        let mut pairs = QaPairs::new();
        pairs.insert("Q1", "a");
        pairs.insert("Q2", "b");
        pairs.insert("Q1", "c");

        let collected: Vec<_> = pairs.iter().collect();
        assert_eq!(collected, vec![("Q1", "c"), ("Q2", "b")]);
        assert_eq!(pairs.get("Q2"), Some("b"));
        assert_eq!(pairs.get("Q3"), None);
    }

    #[test]
    fn test_enhanced_query_without_context() {
        assert_eq!(
            build_enhanced_query("What is photosynthesis?", None),
            "Query: What is photosynthesis?"
        );
        assert_eq!(
            build_enhanced_query("x", Some(&QaPairs::new())),
            "Query: x"
        );
    }

    #[test]
    fn test_enhanced_query_with_context() {
        let pairs: QaPairs = [("Q1", "Answer skipped"), ("Q2", "")].into_iter().collect();
        assert_eq!(
            build_enhanced_query("AI in healthcare", Some(&pairs)),
            "Original Query: AI in healthcare\n\nAdditional Context from User:\nQ: Q1\nA: Answer skipped\n\nQ: Q2\nA: \n\n"
        );
    }

    #[test]
    fn test_skip_has_no_context() {
        assert!(ClarificationAnswers::Skip.context().is_none());
        let all_skipped: QaPairs = [("Q1", ANSWER_SKIPPED)].into_iter().collect();
        assert!(ClarificationAnswers::Answered(all_skipped).context().is_some());
    }

    #[test]
    fn test_session_new_reuses_or_mints_trace_id() {
        let session = ResearchSession::new("q", "abc", None, Some("trace_given".to_string()));
        assert_eq!(session.trace_id, "trace_given");
        assert_eq!(session.search_count, 3);
        assert_eq!(session.clarification_state, ClarificationState::NotStarted);

        let a = ResearchSession::new("q", 2_i64, None, None);
        let b = ResearchSession::new("q", 2_i64, None, Some(String::new()));
        assert!(a.trace_id.starts_with("trace_"));
        assert_eq!(a.trace_id.len(), "trace_".len() + 32);
        assert_ne!(a.trace_id, b.trace_id);
    }

    #[test]
    fn test_restore_with_malformed_payload() {
        let handle = SessionHandle::restore("trace_1", "q", "9", "not json", "{oops");
        assert_eq!(handle.trace_id, "trace_1");
        assert_eq!(handle.search_count, 5);
        assert!(handle.questions().is_empty());

        let session = ResearchSession::resume(handle, ClarificationAnswers::Skip);
        assert!(session.assessment.is_none());
        assert_eq!(session.clarification_state, ClarificationState::Skipped);
    }

    #[test]
    fn test_restore_with_valid_payload() {
        let handle = SessionHandle::restore(
            "trace_1",
            "q",
            "2",
            r#"[{"question":"Which region?","purpose":"scope"}]"#,
            r#"{"complexity":2,"reasoning":"broad"}"#,
        );
        assert_eq!(handle.questions().len(), 1);
        assert_eq!(handle.plan.assessment.complexity, 2);

        let session = ResearchSession::resume(handle, ClarificationAnswers::Answered(QaPairs::new()));
        assert_eq!(session.assessment.map(|a| a.reasoning), Some("broad".to_string()));
        assert_eq!(session.search_count, 2);
    }

    #[test]
    fn test_is_resuming_follows_clarification_state() {
        let mut fresh = ResearchSession::new("q", "3", None, None);
        assert!(!fresh.is_resuming());
        fresh.pause(ClarificationPlan {
            assessment: QueryAssessment {
                complexity: 2,
                reasoning: "broad".to_string(),
            },
            questions: vec![],
            should_ask_questions: true,
        });
        assert_eq!(fresh.clarification_state, ClarificationState::AwaitingAnswers);
        assert!(!fresh.is_resuming());

        let skipped = ResearchSession::new("q", "3", Some(ClarificationAnswers::Skip), None);
        assert!(skipped.is_resuming());
        let answered = ResearchSession::new(
            "q",
            "3",
            Some(ClarificationAnswers::Answered(QaPairs::new())),
            None,
        );
        assert!(answered.is_resuming());
    }

    #[test]
    fn test_normalize_rejects_non_ascii_integer_forms() {
        assert_eq!(normalize_search_count("1_0"), DEFAULT_SEARCHES);
        assert_eq!(normalize_search_count("\u{0664}"), DEFAULT_SEARCHES);
        assert_eq!(normalize_search_count("４"), DEFAULT_SEARCHES);
    }

    #[test]
    fn test_resume_aligns_answers_to_question_order() {
        let handle = SessionHandle::restore(
            "trace_1",
            "q",
            "3",
            r#"[{"question":"A?","purpose":"p"},{"question":"B?","purpose":"p"}]"#,
            r#"{"complexity":3,"reasoning":"r"}"#,
        );
        let answers: QaPairs = [("extra", "x"), ("B?", "b"), ("A?", "a")].into_iter().collect();

        let session = ResearchSession::resume(handle, ClarificationAnswers::Answered(answers));
        let Some(ClarificationAnswers::Answered(pairs)) = session.answers else {
            panic!("expected answered clarification");
        };
        let order: Vec<_> = pairs.iter().map(|(q, _)| q).collect();
        assert_eq!(order, vec!["A?", "B?", "extra"]);
    }
}
