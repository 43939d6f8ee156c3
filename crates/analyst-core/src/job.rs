//! Job record, status and the ordered stage enumeration

use crate::{AnalysisReport, AnalystRole, CoreError, Market};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Completed or failed
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Pipeline stage, in execution order
///
/// `Error` sits outside the order and is reachable from every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    CheckCache,
    CollectBasic,
    CollectKline,
    CollectFinancial,
    CollectNews,
    CalculateTechnical,
    AiValue,
    AiTechnical,
    AiGrowth,
    AiFundamental,
    AiRisk,
    AiMacro,
    Synthesize,
    SaveResult,
    Complete,
    Error,
}

impl Stage {
    /// Non-error stages in execution order
    pub const ORDERED: [Stage; 16] = [
        Stage::Start,
        Stage::CheckCache,
        Stage::CollectBasic,
        Stage::CollectKline,
        Stage::CollectFinancial,
        Stage::CollectNews,
        Stage::CalculateTechnical,
        Stage::AiValue,
        Stage::AiTechnical,
        Stage::AiGrowth,
        Stage::AiFundamental,
        Stage::AiRisk,
        Stage::AiMacro,
        Stage::Synthesize,
        Stage::SaveResult,
        Stage::Complete,
    ];

    /// Progress percentage reported on entering the stage; `-1` for `Error`
    pub fn progress(self) -> i32 {
        match self {
            Stage::Start => 0,
            Stage::CheckCache => 5,
            Stage::CollectBasic => 10,
            Stage::CollectKline => 20,
            Stage::CollectFinancial => 25,
            Stage::CollectNews => 30,
            Stage::CalculateTechnical => 40,
            Stage::AiValue => 50,
            Stage::AiTechnical => 60,
            Stage::AiGrowth => 70,
            Stage::AiFundamental => 80,
            Stage::AiRisk => 85,
            Stage::AiMacro => 90,
            Stage::Synthesize => 95,
            Stage::SaveResult => 98,
            Stage::Complete => 100,
            Stage::Error => -1,
        }
    }

    /// Default human-readable message
    pub fn default_message(self) -> &'static str {
        match self {
            Stage::Start => "开始分析",
            Stage::CheckCache => "检查缓存中...",
            Stage::CollectBasic => "采集股票基本信息...",
            Stage::CollectKline => "采集历史K线数据...",
            Stage::CollectFinancial => "采集财务数据...",
            Stage::CollectNews => "采集新闻资讯...",
            Stage::CalculateTechnical => "计算技术指标...",
            Stage::AiValue => "价值投资者分析中...",
            Stage::AiTechnical => "技术分析师分析中...",
            Stage::AiGrowth => "成长股分析师分析中...",
            Stage::AiFundamental => "基本面分析师分析中...",
            Stage::AiRisk => "风险分析师评估中...",
            Stage::AiMacro => "宏观分析师研判中...",
            Stage::Synthesize => "综合各分析师意见...",
            Stage::SaveResult => "保存分析结果...",
            Stage::Complete => "分析完成!",
            Stage::Error => "分析失败",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::CheckCache => "check_cache",
            Stage::CollectBasic => "collect_basic",
            Stage::CollectKline => "collect_kline",
            Stage::CollectFinancial => "collect_financial",
            Stage::CollectNews => "collect_news",
            Stage::CalculateTechnical => "calculate_technical",
            Stage::AiValue => "ai_value",
            Stage::AiTechnical => "ai_technical",
            Stage::AiGrowth => "ai_growth",
            Stage::AiFundamental => "ai_fundamental",
            Stage::AiRisk => "ai_risk",
            Stage::AiMacro => "ai_macro",
            Stage::Synthesize => "synthesize",
            Stage::SaveResult => "save_result",
            Stage::Complete => "complete",
            Stage::Error => "error",
        }
    }

    /// Stage that announces a role's analysis
    pub fn for_role(role: AnalystRole) -> Stage {
        match role {
            AnalystRole::Value => Stage::AiValue,
            AnalystRole::Technical => Stage::AiTechnical,
            AnalystRole::Growth => Stage::AiGrowth,
            AnalystRole::Fundamental => Stage::AiFundamental,
            AnalystRole::Risk => Stage::AiRisk,
            AnalystRole::Macro => Stage::AiMacro,
            AnalystRole::Synthesizer => Stage::Synthesize,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ORDERED
            .into_iter()
            .chain(std::iter::once(Stage::Error))
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStage(s.to_string()))
    }
}

/// Partial update applied by the orchestrator while a job runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub stage: Option<Stage>,
    pub progress: Option<i32>,
    pub message: Option<String>,
}

impl JobUpdate {
    /// Enter a stage with its default progress and message, marking the job running
    pub fn stage(stage: Stage) -> Self {
        Self {
            status: Some(JobStatus::Running),
            stage: Some(stage),
            progress: Some(stage.progress()),
            message: Some(stage.default_message().to_string()),
        }
    }

    /// Replace the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Replace the progress value
    pub fn with_progress(mut self, progress: i32) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// One asynchronous analysis request, from submission to terminal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub symbol: String,
    pub market: Market,
    pub status: JobStatus,
    pub stage: Stage,
    /// 0..=100 while running, 100 when completed, -1 when failed
    pub progress: i32,
    pub message: String,
    pub result: Option<AnalysisReport>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly submitted job in `pending`
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, market: Market) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            symbol: symbol.into(),
            market,
            status: JobStatus::Pending,
            stage: Stage::Start,
            progress: 0,
            message: "等待开始".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; terminal jobs are left untouched
    ///
    /// Progress never moves backwards while the job runs.
    pub fn apply(&mut self, update: &JobUpdate) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(stage) = update.stage {
            self.stage = stage;
        }
        if let Some(progress) = update.progress {
            self.progress = progress.clamp(0, 100).max(self.progress);
        }
        if let Some(message) = &update.message {
            self.message.clone_from(message);
        }
        self.updated_at = Utc::now();
        true
    }

    /// Move to `completed` with the final report
    pub fn complete(&mut self, report: AnalysisReport) {
        self.status = JobStatus::Completed;
        self.stage = Stage::Complete;
        self.progress = Stage::Complete.progress();
        self.message = Stage::Complete.default_message().to_string();
        self.result = Some(report);
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Move to `failed` with an error message
    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.status = JobStatus::Failed;
        self.stage = Stage::Error;
        self.progress = Stage::Error.progress();
        self.message = format!("错误: {error}");
        self.error = Some(error);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progress_strictly_increasing() {
        for pair in Stage::ORDERED.windows(2) {
            assert!(
                pair[0].progress() < pair[1].progress(),
                "{} -> {}",
                pair[0],
                pair[1]
            );
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(Stage::Complete.progress(), 100);
        assert_eq!(Stage::Error.progress(), -1);
    }

    #[test]
    fn test_stage_round_trip_names() {
        for stage in Stage::ORDERED {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert_eq!("error".parse::<Stage>(), Ok(Stage::Error));
        assert!("warmup".parse::<Stage>().is_err());
    }

    #[test]
    fn test_role_stages_follow_role_order() {
        let stages: Vec<Stage> = AnalystRole::INDEPENDENT
            .iter()
            .map(|r| Stage::for_role(*r))
            .collect();
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Stage::for_role(AnalystRole::Synthesizer), Stage::Synthesize);
    }

    #[test]
    fn test_new_job_is_pending() {
        let job = Job::new("job-1", "000001", Market::A);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.stage, Stage::Start);
        assert_eq!(job.progress, 0);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_apply_stage_update() {
        let mut job = Job::new("job-1", "000001", Market::A);
        assert!(job.apply(&JobUpdate::stage(Stage::CollectKline)));
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.stage, Stage::CollectKline);
        assert_eq!(job.progress, 20);
        assert_eq!(job.message, "采集历史K线数据...");
    }

    #[test]
    fn test_progress_never_moves_backwards() {
        let mut job = Job::new("job-1", "000001", Market::A);
        assert!(job.apply(&JobUpdate::stage(Stage::AiGrowth)));
        assert_eq!(job.progress, 70);

        assert!(job.apply(&JobUpdate::stage(Stage::CollectKline)));
        assert_eq!(job.progress, 70);
        assert!(job.apply(&JobUpdate::default().with_progress(-20)));
        assert_eq!(job.progress, 70);

        assert!(job.apply(&JobUpdate::default().with_progress(150)));
        assert_eq!(job.progress, 100);

        job.fail("行情接口超时");
        assert_eq!(job.progress, -1);
    }

    #[test]
    fn test_fail_sets_sentinel_progress() {
        let mut job = Job::new("job-1", "000001", Market::A);
        job.fail("数据源不可用");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stage, Stage::Error);
        assert_eq!(job.progress, -1);
        assert_eq!(job.message, "错误: 数据源不可用");
        assert_eq!(job.error.as_deref(), Some("数据源不可用"));
    }

    #[test]
    fn test_terminal_job_ignores_updates() {
        let mut job = Job::new("job-1", "000001", Market::A);
        job.fail("boom");
        assert!(!job.apply(&JobUpdate::stage(Stage::AiValue)));
        assert_eq!(job.stage, Stage::Error);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn test_job_serializes_flat() {
        let job = Job::new("job-1", "AAPL", Market::US);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["stage"], "start");
        assert_eq!(json["market"], "US");
        assert!(json["result"].is_null());
        assert!(json["error"].is_null());
    }
}
