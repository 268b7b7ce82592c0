//! 批量上传驱动 - 编排层
//!
//! ## 职责
//!
//! 按原始顺序逐行处理输入，一次最多只有一个远程调用在进行。
//!
//! ## 每行的处理顺序
//!
//! 1. 检查取消开关，已取消则停止，保留已有结果
//! 2. 离线模式：原样保留该行
//! 3. 在线模式：调用远程服务
//!    - 返回多行：全部按顺序写入（扇出）
//!    - 返回空：原样保留
//!    - 网络不可用：切换到离线，原样保留，剩余行全部离线处理
//!    - 超时 / 响应异常：原样保留，继续在线
//! 4. 推进进度，发出进度事件
//!
//! 运行一旦开始，总会到达四个终态之一，不会向调用方抛出错误。

use std::sync::Arc;
use std::time::Duration;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::clients::{HttpRowProcessor, RemoteProcessor};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{CancellationGate, ConnectionId};
use crate::models::batch_run::{BatchRun, Mode, RunNotice, RunOutcome};
use crate::models::row::{Item, OutputRecord};
use crate::services::fallback::FallbackSwitch;
use crate::services::progress::{ProgressEvent, ProgressTracker};
use crate::utils::logging;
use crate::workflow::{ItemFlow, ItemOutcome};

/// 驱动参数
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    /// 单次远程调用超时
    pub request_timeout: Duration,
    /// 两行之间的最小间隔
    pub inter_item_delay: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(150_000),
            inter_item_delay: Duration::from_millis(50),
        }
    }
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            inter_item_delay: config.inter_item_delay(),
        }
    }
}

/// 批量上传驱动
pub struct BatchDriver {
    flow: Option<ItemFlow>,
    settings: DriverSettings,
    cancel: CancellationGate,
}

impl BatchDriver {
    /// 创建新的驱动
    ///
    /// `processor` 为 `None` 时整个运行走离线模式，不会有任何网络调用
    pub fn new(processor: Option<Arc<dyn RemoteProcessor>>, settings: DriverSettings) -> Self {
        Self {
            flow: processor.map(|p| ItemFlow::new(p, settings.request_timeout)),
            settings,
            cancel: CancellationGate::new(),
        }
    }

    /// 根据配置创建，配置了远程地址时使用 HTTP 客户端
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let settings = DriverSettings::from_config(config);
        let processor = match config.remote_endpoint() {
            Some(url) => {
                let client = HttpRowProcessor::new(url, settings.request_timeout)?;
                Some(Arc::new(client) as Arc<dyn RemoteProcessor>)
            }
            None => None,
        };
        Ok(Self::new(processor, settings))
    }

    /// 使用外部提供的取消开关
    pub fn with_cancel_gate(mut self, cancel: CancellationGate) -> Self {
        self.cancel = cancel;
        self
    }

    /// 请求取消：之后不会再有新的分发，进行中的调用会被中断并丢弃其结果
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 在后台启动一次运行
    ///
    /// 输入为空时返回 `NoData`，此时不会生成连接标识
    pub fn start(self, items: Vec<Item>) -> AppResult<BatchHandle> {
        if items.is_empty() {
            return Err(AppError::NoData);
        }

        let connection_id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded();
        let cancel = self.cancel.clone();
        let id = connection_id.clone();

        let task = tokio::spawn(async move { self.drive(&items, id, Some(tx)).await });

        Ok(BatchHandle {
            connection_id,
            events: rx,
            cancel,
            task,
        })
    }

    /// 在当前任务中完成一次运行
    ///
    /// 与 `start` 一样消费驱动，取消开关只属于这一次运行
    pub async fn run(
        self,
        items: &[Item],
        events: Option<UnboundedSender<ProgressEvent>>,
    ) -> AppResult<BatchRun> {
        if items.is_empty() {
            return Err(AppError::NoData);
        }
        Ok(self.drive(items, ConnectionId::generate(), events).await)
    }

    async fn drive(
        &self,
        items: &[Item],
        connection_id: ConnectionId,
        events: Option<UnboundedSender<ProgressEvent>>,
    ) -> BatchRun {
        let total = items.len();
        let mut switch = FallbackSwitch::new(self.flow.is_some());
        let mut tracker = ProgressTracker::new(total);
        let mut run = BatchRun::new(connection_id, switch.initial_mode(), total);

        if switch.mode() == Mode::Local {
            run.push_notice(RunNotice::RemoteNotConfigured);
        }

        logging::log_run_start(run.connection_id(), total, switch.mode());

        for (position, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                stop_cancelled(&mut run, position);
                break;
            }

            logging::log_item_start(position, total, &item.part_label());

            match (switch.mode(), self.flow.as_ref()) {
                (Mode::Remote, Some(flow)) => {
                    match flow.dispatch(item, run.connection_id(), &self.cancel).await {
                        ItemOutcome::Records(rows) => {
                            if rows.len() > 1 {
                                info!(
                                    "[第 {}/{} 行] ✓ 远程返回 {} 行",
                                    position + 1,
                                    total,
                                    rows.len()
                                );
                            }
                            run.push_records(
                                rows.into_iter()
                                    .map(|row| OutputRecord::remote(item.index, row))
                                    .collect(),
                            );
                        }
                        ItemOutcome::Empty => {
                            info!(
                                "[第 {}/{} 行] 远程未返回数据，保留原始行",
                                position + 1,
                                total
                            );
                            run.push_pass_through(item);
                        }
                        ItemOutcome::Failed(err) if err.is_network_unavailable() => {
                            warn!(
                                "[第 {}/{} 行] 🔌 网络错误，切换到离线模式: {}",
                                position + 1,
                                total,
                                err
                            );
                            switch.degrade(position);
                            run.set_mode(switch.mode());
                            run.push_notice(RunNotice::NetworkFallback {
                                index: position,
                                reason: err.to_string(),
                            });
                            run.push_pass_through(item);
                        }
                        ItemOutcome::Failed(err) => {
                            warn!(
                                "[第 {}/{} 行] ⚠️ 远程处理失败，保留原始行: {}",
                                position + 1,
                                total,
                                err
                            );
                            run.push_notice(RunNotice::ItemSubstituted {
                                index: position,
                                reason: err.to_string(),
                            });
                            run.push_pass_through(item);
                        }
                        ItemOutcome::Cancelled => {
                            stop_cancelled(&mut run, position);
                            break;
                        }
                    }
                }
                _ => run.push_pass_through(item),
            }

            if let Some(event) = tracker.advance() {
                run.set_processed(event.processed);
                logging::log_progress(&event);
                if let Some(tx) = events.as_ref() {
                    // 接收端已关闭时继续运行
                    let _ = tx.unbounded_send(event);
                }
            }

            if position + 1 < total {
                self.pause_between_items().await;
            }
        }

        let outcome = if run.is_cancelled() {
            RunOutcome::PartiallyCancelled
        } else {
            switch.completed_outcome()
        };
        run.finish(outcome);

        if let Some(at) = switch.flipped_at() {
            info!("🔌 自第 {} 行起离线处理", at + 1);
        }
        info!("🏁 运行结束: {} | 已处理 {}/{}", outcome, run.processed(), total);
        run
    }

    async fn pause_between_items(&self) {
        if self.settings.inter_item_delay.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.settings.inter_item_delay) => {}
        }
    }
}

fn stop_cancelled(run: &mut BatchRun, position: usize) {
    warn!("⛔ 上传已取消，停止于第 {} 行", position + 1);
    run.mark_cancelled();
    run.push_notice(RunNotice::Cancelled {
        at_index: position,
    });
}

/// 后台运行的句柄
pub struct BatchHandle {
    /// 本次运行的连接标识
    pub connection_id: ConnectionId,
    /// 进度事件流，运行结束后关闭
    pub events: UnboundedReceiver<ProgressEvent>,
    cancel: CancellationGate,
    task: JoinHandle<BatchRun>,
}

impl BatchHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 等待运行结束，返回终态的 `BatchRun`
    pub async fn join(self) -> AppResult<BatchRun> {
        self.task
            .await
            .map_err(|e| AppError::Other(format!("上传任务异常结束: {}", e)))
    }
}
