/// 行处理服务客户端
///
/// 封装所有与远程行处理服务相关的调用逻辑
use crate::error::{AppResult, ConfigError};
use crate::models::row::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// 远程调用失败的分类
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 传输层失败，服务不可达
    #[error("网络不可用: {0}")]
    NetworkUnavailable(String),
    /// 超过调用时限
    #[error("请求超时 ({after_ms} ms)")]
    Timeout { after_ms: u64 },
    /// 响应格式异常或 success 不为 true
    #[error("响应异常: {0}")]
    MalformedResponse(String),
}

impl RemoteError {
    /// 是否需要切换到离线模式
    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, RemoteError::NetworkUnavailable(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { after_ms: 0 }
        } else if err.is_connect() || err.is_request() {
            Self::NetworkUnavailable(err.to_string())
        } else {
            Self::MalformedResponse(err.to_string())
        }
    }
}

/// 发送给远程服务的请求体
#[derive(Debug, Clone, Serialize)]
pub struct ProcessRequest {
    #[serde(rename = "sheets")]
    pub rows: Vec<Row>,
    #[serde(rename = "connectionId")]
    pub connection_id: String,
}

/// 远程服务的响应体
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

impl ProcessResponse {
    /// 提取结果行
    ///
    /// `success` 不为 true 或者结果中有非对象元素时视为响应异常
    pub fn into_rows(self) -> Result<Vec<Row>, RemoteError> {
        if !self.success {
            return Err(RemoteError::MalformedResponse(
                "success 字段不为 true".to_string(),
            ));
        }

        self.data
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(row) => Ok(row),
                other => Err(RemoteError::MalformedResponse(format!(
                    "data[{}] 不是对象: {}",
                    i, other
                ))),
            })
            .collect()
    }
}

/// 远程行处理服务
///
/// 输入一批行，返回零条或多条结果行
#[async_trait]
pub trait RemoteProcessor: Send + Sync {
    async fn process(&self, request: &ProcessRequest) -> Result<Vec<Row>, RemoteError>;
}

/// 基于 HTTP 的行处理客户端
pub struct HttpRowProcessor {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRowProcessor {
    /// 创建新的客户端
    ///
    /// # 参数
    /// - `base_url`: 服务基础地址
    /// - `timeout`: 单次请求超时
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint {
                url: base_url.to_string(),
                reason: "必须以 http:// 或 https:// 开头".to_string(),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidEndpoint {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/scrape", base),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteProcessor for HttpRowProcessor {
    async fn process(&self, request: &ProcessRequest) -> Result<Vec<Row>, RemoteError> {
        debug!(
            "POST {} | 行数: {} | 连接: {}",
            self.endpoint,
            request.rows.len(),
            request.connection_id
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::MalformedResponse(format!("HTTP {}", status)));
        }

        let body: ProcessResponse = response.json().await.map_err(|e| self.classify(e))?;
        let rows = body.into_rows()?;

        debug!("远程服务返回 {} 行", rows.len());
        Ok(rows)
    }
}

impl HttpRowProcessor {
    fn classify(&self, err: reqwest::Error) -> RemoteError {
        match RemoteError::from(err) {
            RemoteError::Timeout { .. } => RemoteError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            },
            other => other,
        }
    }
}
