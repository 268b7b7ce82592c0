use anyhow::Result;
use clap::Parser;
use sheet_row_upload::utils::logging;
use sheet_row_upload::{App, AppError, CancellationGate, Config};
use std::path::PathBuf;
use tracing::{error, warn};

/// 把表格数据逐行上传到行处理服务
#[derive(Debug, Parser)]
#[command(name = "sheet-row-upload", version)]
struct Cli {
    /// 输入文件（.json / .csv）
    input: PathBuf,

    /// 导出文件名，缺省为 `<输入文件名>_exported`
    #[arg(short, long)]
    output: Option<String>,

    /// TOML 配置文件，不指定时从环境变量读取
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 强制离线模式
    #[arg(long)]
    offline: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env(),
    };
    config.force_local |= cli.offline;
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    // Ctrl-C 取消上传，已完成的部分仍会导出
    let cancel = CancellationGate::new();
    let signal_gate = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到 Ctrl-C，正在取消上传...");
            signal_gate.cancel();
        }
    });

    // 初始化并运行应用
    let app = App::initialize(config)?;
    if let Err(e) = app.run(&cli.input, cli.output.as_deref(), cancel).await {
        if matches!(e.downcast_ref::<AppError>(), Some(err) if err.is_pre_run()) {
            error!("❌ 输入未通过检查，没有发起任何远程请求");
        }
        return Err(e);
    }

    Ok(())
}
