//! 提示写入服务 - 业务能力层
//!
//! 只负责把运行中被吸收的可恢复事件追加到提示文件

use crate::infrastructure::ConnectionId;
use crate::models::batch_run::RunNotice;
use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::debug;

/// 提示写入服务
pub struct NoticeWriter {
    notice_file_path: String,
}

impl NoticeWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            notice_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.notice_file_path
    }

    /// 写入文件头（覆盖旧内容）
    pub fn init_log_file(&self) -> Result<()> {
        let header = format!(
            "{}\n上传提示日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.notice_file_path, header)?;
        Ok(())
    }

    /// 追加一次运行的全部提示
    pub fn write_all(&self, connection_id: &ConnectionId, notices: &[RunNotice]) -> Result<()> {
        if notices.is_empty() {
            return Ok(());
        }

        debug!("写入 {} 条提示到 {}", notices.len(), self.notice_file_path);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.notice_file_path)?;

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        for notice in notices {
            writeln!(file, "[{}] 连接 {} | {}", now, connection_id, notice)?;
        }

        Ok(())
    }
}
