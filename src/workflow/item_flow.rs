//! 单行处理流程 - 流程层
//!
//! 核心职责：把一行发送给远程服务，并把结果归类为 `ItemOutcome`
//!
//! - 调用受超时限制
//! - 调用过程中收到取消请求时立即放弃，丢弃迟到的结果
//! - 不修改运行状态，由编排层决定如何写入结果

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clients::{ProcessRequest, RemoteError, RemoteProcessor};
use crate::infrastructure::{CancellationGate, ConnectionId};
use crate::models::row::{Item, Row};

/// 单行远程处理的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// 返回了一条或多条结果
    Records(Vec<Row>),
    /// 调用成功但没有结果
    Empty,
    /// 调用失败
    Failed(RemoteError),
    /// 调用过程中被取消
    Cancelled,
}

/// 单行处理流程
pub struct ItemFlow {
    processor: Arc<dyn RemoteProcessor>,
    timeout: Duration,
}

impl ItemFlow {
    pub fn new(processor: Arc<dyn RemoteProcessor>, timeout: Duration) -> Self {
        Self { processor, timeout }
    }

    pub async fn dispatch(
        &self,
        item: &Item,
        connection_id: &ConnectionId,
        cancel: &CancellationGate,
    ) -> ItemOutcome {
        let request = ProcessRequest {
            rows: vec![item.fields.clone()],
            connection_id: connection_id.to_string(),
        };

        debug!("分发第 {} 行 (Part: {})", item.index + 1, item.part_label());

        // 取消优先；被丢弃的调用 future 会中断底层请求
        tokio::select! {
            biased;
            _ = cancel.cancelled() => ItemOutcome::Cancelled,
            result = tokio::time::timeout(self.timeout, self.processor.process(&request)) => {
                match result {
                    Err(_) => ItemOutcome::Failed(RemoteError::Timeout {
                        after_ms: self.timeout.as_millis() as u64,
                    }),
                    Ok(Ok(rows)) if rows.is_empty() => ItemOutcome::Empty,
                    Ok(Ok(rows)) => ItemOutcome::Records(rows),
                    Ok(Err(e)) => ItemOutcome::Failed(e),
                }
            }
        }
    }
}
