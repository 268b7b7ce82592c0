//! 取消开关 - 基础设施层
//!
//! 只能由外部的取消请求设置，一旦设置不可恢复。
//! `BatchDriver` 在每次分发前读取它，并把它传给正在进行的远程调用。

use tokio_util::sync::CancellationToken;

/// 协作式取消开关
#[derive(Debug, Clone, Default)]
pub struct CancellationGate {
    token: CancellationToken,
}

impl CancellationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待取消，用于中断正在进行的远程调用
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
