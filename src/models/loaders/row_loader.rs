use crate::error::{AppError, AppResult, InputError};
use crate::models::row::Row;
use async_trait::async_trait;
use serde_json::{Number, Value};
use std::path::Path;
use tokio::fs;

/// 表格数据提取
///
/// 把上传的文件转换为按顺序排列的行
#[async_trait]
pub trait TabularExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> AppResult<Vec<Row>>;
}

/// 基于文件扩展名的提取器，支持 `.json` 和 `.csv`
#[derive(Debug, Default, Clone, Copy)]
pub struct FileRowExtractor;

#[async_trait]
impl TabularExtractor for FileRowExtractor {
    async fn extract(&self, path: &Path) -> AppResult<Vec<Row>> {
        load_rows(path).await
    }
}

/// 从文件加载所有行
pub async fn load_rows(path: &Path) -> AppResult<Vec<Row>> {
    let path_str = path.display().to_string();

    if !path.exists() {
        return Err(InputError::NotFound { path: path_str }.into());
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::input_parse_failed(&path_str, e))?;

    let rows = match extension.as_deref() {
        Some("json") => parse_json_rows(&content, &path_str)?,
        Some("csv") => parse_csv_rows(&content, &path_str)?,
        _ => return Err(InputError::UnsupportedFormat { path: path_str }.into()),
    };

    tracing::info!("成功加载 {} 行数据: {}", rows.len(), path_str);
    Ok(rows)
}

/// 解析 JSON：顶层数组，或者 `{ "rows": [...] }`
pub fn parse_json_rows(content: &str, source_name: &str) -> AppResult<Vec<Row>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| AppError::input_parse_failed(source_name, e))?;

    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("rows") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(InputError::NotARecord {
                    path: source_name.to_string(),
                    index: 0,
                }
                .into())
            }
        },
        _ => {
            return Err(InputError::NotARecord {
                path: source_name.to_string(),
                index: 0,
            }
            .into())
        }
    };

    array
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(row) => Ok(row),
            _ => Err(InputError::NotARecord {
                path: source_name.to_string(),
                index,
            }
            .into()),
        })
        .collect()
}

/// 解析 CSV：第一行为表头
///
/// 空单元格不写入该行，能原样还原的数字单元格转换为数字，其余保持文本
pub fn parse_csv_rows(content: &str, source_name: &str) -> AppResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::input_parse_failed(source_name, e))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::input_parse_failed(source_name, e))?;
        let mut row = Row::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || cell.is_empty() {
                continue;
            }
            row.insert(header.to_string(), cell_value(cell));
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

/// 只有转换后再输出与原文完全一致时才当作数字，`00123`、`1e3`、`1.50` 保持文本
fn cell_value(cell: &str) -> Value {
    if let Ok(int) = cell.parse::<i64>() {
        if int.to_string() == cell {
            return Value::Number(int.into());
        }
    }
    if let Ok(float) = cell.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            if number.to_string() == cell {
                return Value::Number(number);
            }
        }
    }
    Value::String(cell.to_string())
}
