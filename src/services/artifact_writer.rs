//! 导出服务 - 业务能力层
//!
//! 把一次运行导出为两张表：处理结果 + 原始数据

use crate::error::{AppError, AppResult, ExportError};
use crate::models::batch_run::BatchRun;
use crate::models::row::{Item, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// 结果表名称
pub const GENERATED_SHEET: &str = "Generated Data";
/// 原始数据表名称
pub const ORIGINAL_SHEET: &str = "Original Data";
/// 没有源文件名时的默认导出名
pub const DEFAULT_EXPORT_NAME: &str = "exported_data";

/// 一张表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// 导出文件写入
pub trait ArtifactWriter: Send + Sync {
    /// 文件扩展名（不含点）
    fn extension(&self) -> &str;

    fn write(&self, path: &Path, sheets: &[Sheet]) -> AppResult<()>;
}

/// 以 JSON 工作簿形式写入：`{ "sheets": [ { "name", "rows" } ] }`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWorkbookWriter;

#[derive(Serialize)]
struct Workbook<'a> {
    sheets: &'a [Sheet],
}

impl ArtifactWriter for JsonWorkbookWriter {
    fn extension(&self) -> &str {
        "json"
    }

    fn write(&self, path: &Path, sheets: &[Sheet]) -> AppResult<()> {
        let path_str = path.display().to_string();
        let content = serde_json::to_string_pretty(&Workbook { sheets })
            .map_err(|e| AppError::export_write_failed(&path_str, e))?;
        std::fs::write(path, content).map_err(|e| AppError::export_write_failed(&path_str, e))?;
        Ok(())
    }
}

/// 根据运行结果构建两张表
///
/// 结果和原始数据都为空时返回 `NothingToExport`
pub fn build_sheets(run: &BatchRun, items: &[Item]) -> AppResult<Vec<Sheet>> {
    if run.results().is_empty() && items.is_empty() {
        return Err(ExportError::NothingToExport.into());
    }

    Ok(vec![
        Sheet::new(GENERATED_SHEET, run.result_rows().cloned().collect()),
        Sheet::new(
            ORIGINAL_SHEET,
            items.iter().map(|item| item.fields.clone()).collect(),
        ),
    ])
}

/// 默认导出名：`<源文件名>_exported`，没有源文件时为 `exported_data`
pub fn default_export_name(source: Option<&Path>) -> String {
    source
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|stem| format!("{}_exported", stem))
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string())
}

/// 确定最终的导出文件名
///
/// 名称为空时使用默认名，缺少扩展名时补上
pub fn resolve_export_file_name(name: Option<&str>, default_name: &str, extension: &str) -> String {
    let base = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name);

    let suffix = format!(".{}", extension);
    if base.ends_with(&suffix) {
        base.to_string()
    } else {
        format!("{}{}", base, suffix)
    }
}

/// 导出一次运行，返回写入的文件路径
pub fn export_run(
    writer: &dyn ArtifactWriter,
    dir: &Path,
    file_name: &str,
    run: &BatchRun,
    items: &[Item],
) -> AppResult<PathBuf> {
    let sheets = build_sheets(run, items)?;
    let path = dir.join(file_name);

    writer.write(&path, &sheets)?;

    info!(
        "💾 已导出: {} (结果 {} 行, 原始 {} 行)",
        path.display(),
        sheets[0].rows.len(),
        sheets[1].rows.len()
    );
    Ok(path)
}
