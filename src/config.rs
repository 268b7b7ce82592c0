use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 行处理服务的基础地址，为空时整个运行走本地模式
    pub remote_base_url: Option<String>,
    /// 单次远程调用的超时时间（毫秒）
    pub request_timeout_ms: u64,
    /// 两行之间的最小让出间隔（毫秒）
    pub inter_item_delay_ms: u64,
    /// 强制离线模式
    pub force_local: bool,
    /// 导出文件存放目录
    pub export_dir: String,
    /// 运行提示日志文件
    pub notice_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_base_url: None,
            request_timeout_ms: 150_000,
            inter_item_delay_ms: 50,
            force_local: false,
            export_dir: ".".to_string(),
            notice_log_file: "upload_notices.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            remote_base_url: std::env::var("ROW_PROCESSOR_BASE_URL")
                .ok()
                .or(default.remote_base_url),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", default.request_timeout_ms),
            inter_item_delay_ms: env_parse("INTER_ITEM_DELAY_MS", default.inter_item_delay_ms),
            force_local: env_parse("FORCE_LOCAL", default.force_local),
            export_dir: std::env::var("EXPORT_DIR").unwrap_or(default.export_dir),
            notice_log_file: std::env::var("NOTICE_LOG_FILE").unwrap_or(default.notice_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 实际可用的远程地址
    ///
    /// 地址为空或者开启了强制离线时返回 `None`
    pub fn remote_endpoint(&self) -> Option<&str> {
        if self.force_local {
            return None;
        }
        self.remote_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
