/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use crate::config::Config;
use crate::infrastructure::ConnectionId;
use crate::models::batch_run::{BatchRun, Mode};
use crate::services::progress::ProgressEvent;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 info，开启详细日志时为 debug。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 逐行上传模式");
    match config.remote_endpoint() {
        Some(url) => info!("🌐 远程服务: {}", url),
        None => info!("📴 未配置远程服务，使用离线模式"),
    }
    info!("⏱️ 单次请求超时: {} ms", config.request_timeout_ms);
    info!("{}", "=".repeat(60));
}

/// 记录输入加载信息
pub fn log_rows_loaded(path: &Path, total: usize) {
    info!("✓ 从 {} 读取到 {} 行数据", path.display(), total);
}

/// 记录运行开始信息
pub fn log_run_start(connection_id: &ConnectionId, total: usize, mode: Mode) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始上传 | 连接: {}", connection_id);
    info!("📄 共 {} 行 | 模式: {}", total, mode);
    info!("{}", "=".repeat(60));
}

/// 记录单行开始
pub fn log_item_start(index: usize, total: usize, part: &str) {
    info!("[第 {}/{} 行] Part: {}", index + 1, total, truncate_text(part, 40));
}

/// 记录进度
pub fn log_progress(event: &ProgressEvent) {
    info!(
        "📈 进度 {}/{} ({}%)",
        event.processed, event.total, event.percent
    );
}

/// 打印最终统计信息
pub fn print_final_stats(run: &BatchRun, export_path: Option<&Path>) {
    let remote = run.results().iter().filter(|r| r.is_remote()).count();

    info!("\n{}", "=".repeat(60));
    info!("📊 上传完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if let Some(outcome) = run.outcome() {
        info!("🏁 结果: {}", outcome);
    }
    info!("✅ 已处理: {}/{}", run.processed(), run.total());
    info!(
        "🧾 结果行数: {} (远程 {} / 原样 {})",
        run.results().len(),
        remote,
        run.results().len() - remote
    );
    info!("⚠️ 提示: {}", run.notices().len());
    info!("{}", "=".repeat(60));
    if let Some(path) = export_path {
        info!("\n结果已导出至: {}", path.display());
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
