//! 上传应用 - 编排层
//!
//! ## 职责
//!
//! 1. **读取输入**：通过 `TabularExtractor` 把文件转换为行
//! 2. **校验**：在任何网络活动之前检查数据
//! 3. **驱动运行**：交给 `BatchDriver` 逐行处理，记录进度
//! 4. **收尾**：写入运行提示、导出两张表、输出统计

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::CancellationGate;
use crate::models::batch_run::{BatchRun, RunOutcome};
use crate::models::loaders::{FileRowExtractor, TabularExtractor};
use crate::models::row::Item;
use crate::orchestrator::batch_driver::BatchDriver;
use crate::services::artifact_writer::{self, ArtifactWriter, JsonWorkbookWriter};
use crate::services::notice_writer::NoticeWriter;
use crate::services::validation::validate_rows;
use crate::utils::logging;

/// 一次上传的汇总
#[derive(Debug)]
pub struct UploadSummary {
    pub run: BatchRun,
    pub items: Vec<Item>,
    pub export_path: Option<PathBuf>,
}

impl UploadSummary {
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.run.outcome()
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    extractor: Box<dyn TabularExtractor>,
    writer: Box<dyn ArtifactWriter>,
    notice_writer: NoticeWriter,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let notice_writer = NoticeWriter::with_path(&config.notice_log_file);
        notice_writer
            .init_log_file()
            .with_context(|| format!("无法创建提示日志: {}", notice_writer.path()))?;

        logging::log_startup(&config);

        Ok(Self {
            config,
            extractor: Box::new(FileRowExtractor),
            writer: Box::new(JsonWorkbookWriter),
            notice_writer,
        })
    }

    /// 替换输入提取器
    pub fn with_extractor(mut self, extractor: Box<dyn TabularExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// 替换导出写入器
    pub fn with_writer(mut self, writer: Box<dyn ArtifactWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// 运行一次上传
    ///
    /// # 参数
    /// - `input`: 输入文件
    /// - `export_name`: 导出文件名（可选，缺省为 `<输入文件名>_exported`）
    /// - `cancel`: 外部取消开关（例如 Ctrl-C）
    pub async fn run(
        &self,
        input: &Path,
        export_name: Option<&str>,
        cancel: CancellationGate,
    ) -> Result<UploadSummary> {
        let rows = self.extractor.extract(input).await?;
        if rows.is_empty() {
            return Err(AppError::NoData.into());
        }
        logging::log_rows_loaded(input, rows.len());

        // 校验失败时不会生成连接标识，也不会有网络调用
        validate_rows(&rows).map_err(AppError::from)?;

        let items = Item::from_rows(rows);
        let driver = BatchDriver::from_config(&self.config)?.with_cancel_gate(cancel);
        let mut handle = driver.start(items.clone())?;

        let mut last_percent = 0;
        while let Some(event) = handle.events.next().await {
            last_percent = event.percent;
        }
        let run = handle.join().await?;
        info!("📈 最终进度: {}%", last_percent);

        for notice in run.notices() {
            warn!("ℹ️ {}", notice);
        }
        if let Err(e) = self.notice_writer.write_all(run.connection_id(), run.notices()) {
            warn!("写入提示日志失败: {}", e);
        }

        let export_path = self.export(input, export_name, &run, &items)?;
        logging::print_final_stats(&run, export_path.as_deref());

        Ok(UploadSummary {
            run,
            items,
            export_path,
        })
    }

    fn export(
        &self,
        input: &Path,
        export_name: Option<&str>,
        run: &BatchRun,
        items: &[Item],
    ) -> Result<Option<PathBuf>> {
        let default_name = artifact_writer::default_export_name(Some(input));
        let file_name = artifact_writer::resolve_export_file_name(
            export_name,
            &default_name,
            self.writer.extension(),
        );

        let dir = Path::new(&self.config.export_dir);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("无法创建导出目录: {}", dir.display()))?;

        match artifact_writer::export_run(self.writer.as_ref(), dir, &file_name, run, items) {
            Ok(path) => Ok(Some(path)),
            Err(AppError::Export(crate::error::ExportError::NothingToExport)) => {
                warn!("没有可导出的数据");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
