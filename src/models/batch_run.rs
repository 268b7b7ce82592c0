//! 一次批量运行的状态
//!
//! `BatchRun` 只被它所属的 `BatchDriver` 修改，进入终态后不再变化。
//! 每次运行都会新建一个 `BatchRun` 和新的连接标识，不存在跨运行共享的可变状态。

use std::fmt;

use serde::Serialize;

use crate::infrastructure::ConnectionId;
use crate::models::row::{Item, OutputRecord};

/// 执行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// 调用远程服务
    Remote,
    /// 本地原样保留
    Local,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Remote => f.write_str("在线"),
            Mode::Local => f.write_str("离线"),
        }
    }
}

/// 运行终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// 全程在线完成
    CompletedRemote,
    /// 全程离线完成
    CompletedLocal,
    /// 中途切换到离线后完成
    CompletedMixed,
    /// 被取消，保留了部分结果
    PartiallyCancelled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunOutcome::CompletedRemote => "在线完成",
            RunOutcome::CompletedLocal => "离线完成",
            RunOutcome::CompletedMixed => "混合完成（中途切换离线）",
            RunOutcome::PartiallyCancelled => "已取消（部分结果）",
        };
        f.write_str(text)
    }
}

/// 运行过程中被吸收的可恢复事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunNotice {
    /// 没有配置远程地址，整个运行离线处理
    RemoteNotConfigured,
    /// 网络不可用，从该行开始切换离线
    NetworkFallback { index: usize, reason: String },
    /// 远程调用失败，该行原样保留
    ItemSubstituted { index: usize, reason: String },
    /// 在该行分发前被取消
    Cancelled { at_index: usize },
}

impl fmt::Display for RunNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunNotice::RemoteNotConfigured => write!(f, "未配置远程地址，使用离线模式"),
            RunNotice::NetworkFallback { index, reason } => {
                write!(f, "第 {} 行检测到网络错误，切换到离线模式: {}", index + 1, reason)
            }
            RunNotice::ItemSubstituted { index, reason } => {
                write!(f, "第 {} 行远程处理失败，保留原始数据: {}", index + 1, reason)
            }
            RunNotice::Cancelled { at_index } => {
                write!(f, "上传已取消，第 {} 行及之后未处理", at_index + 1)
            }
        }
    }
}

/// 一次批量运行
#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    connection_id: ConnectionId,
    initial_mode: Mode,
    mode: Mode,
    processed: usize,
    total: usize,
    cancelled: bool,
    results: Vec<OutputRecord>,
    notices: Vec<RunNotice>,
    outcome: Option<RunOutcome>,
}

impl BatchRun {
    pub(crate) fn new(connection_id: ConnectionId, initial_mode: Mode, total: usize) -> Self {
        Self {
            connection_id,
            initial_mode,
            mode: initial_mode,
            processed: 0,
            total,
            cancelled: false,
            results: Vec::with_capacity(total),
            notices: Vec::new(),
            outcome: None,
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn initial_mode(&self) -> Mode {
        self.initial_mode
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn results(&self) -> &[OutputRecord] {
        &self.results
    }

    pub fn notices(&self) -> &[RunNotice] {
        &self.notices
    }

    /// 终态，运行中为 `None`
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// 结果行（不含来源信息）
    pub fn result_rows(&self) -> impl Iterator<Item = &crate::models::row::Row> {
        self.results.iter().map(|r| &r.row)
    }

    // ========== 仅供 BatchDriver 使用 ==========

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        debug_assert!(!self.is_finished());
        self.mode = mode;
    }

    pub(crate) fn set_processed(&mut self, processed: usize) {
        debug_assert!(!self.is_finished());
        debug_assert!(processed >= self.processed && processed <= self.total);
        self.processed = processed;
    }

    pub(crate) fn push_records(&mut self, records: Vec<OutputRecord>) {
        debug_assert!(!self.is_finished());
        self.results.extend(records);
    }

    pub(crate) fn push_pass_through(&mut self, item: &Item) {
        self.push_records(vec![OutputRecord::pass_through(item)]);
    }

    pub(crate) fn push_notice(&mut self, notice: RunNotice) {
        self.notices.push(notice);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        debug_assert!(!self.is_finished());
        self.outcome = Some(outcome);
    }
}
