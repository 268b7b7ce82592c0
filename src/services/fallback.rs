//! 在线/离线模式切换 - 业务能力层
//!
//! 只允许 在线 → 离线 的单向切换，运行中不会自动恢复在线

use crate::models::batch_run::{Mode, RunOutcome};

/// 两态模式开关
#[derive(Debug, Clone)]
pub struct FallbackSwitch {
    initial: Mode,
    current: Mode,
    flipped_at: Option<usize>,
}

impl FallbackSwitch {
    /// 创建新的开关
    ///
    /// 没有配置远程地址时从离线开始，并且整个运行都保持离线
    pub fn new(remote_configured: bool) -> Self {
        let initial = if remote_configured {
            Mode::Remote
        } else {
            Mode::Local
        };
        Self {
            initial,
            current: initial,
            flipped_at: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.current
    }

    pub fn initial_mode(&self) -> Mode {
        self.initial
    }

    /// 切换发生时所在的行
    pub fn flipped_at(&self) -> Option<usize> {
        self.flipped_at
    }

    /// 网络不可用时切换到离线
    ///
    /// 返回是否真的发生了切换，已经离线时什么也不做
    pub fn degrade(&mut self, index: usize) -> bool {
        if self.current == Mode::Local {
            return false;
        }
        self.current = Mode::Local;
        self.flipped_at = Some(index);
        true
    }

    /// 根据模式历史得出完成态
    pub fn completed_outcome(&self) -> RunOutcome {
        match (self.initial, self.flipped_at) {
            (Mode::Local, _) => RunOutcome::CompletedLocal,
            (Mode::Remote, None) => RunOutcome::CompletedRemote,
            (Mode::Remote, Some(_)) => RunOutcome::CompletedMixed,
        }
    }
}
