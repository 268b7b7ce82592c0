//! 连接标识 - 基础设施层
//!
//! 每次运行生成一个随机标识，随每次远程调用发送，用于服务端关联请求

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// 连接标识（UUID v4 字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 生成新的连接标识
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
