//! 数据校验 - 业务能力层
//!
//! 在任何网络活动之前运行，失败时不产生任何副作用

use crate::error::ValidationError;
use crate::models::row::Row;

/// 必须存在的列名（大小写不敏感）
pub const REQUIRED_COLUMN: &str = "part";

/// 校验输入数据
///
/// 要求数据非空，并且第一行包含 `part` 列（大小写不敏感）
pub fn validate_rows(rows: &[Row]) -> Result<(), ValidationError> {
    let first = rows.first().ok_or(ValidationError::EmptyInput)?;

    let has_part = first
        .keys()
        .any(|key| key.eq_ignore_ascii_case(REQUIRED_COLUMN));

    if !has_part {
        return Err(ValidationError::MissingPartColumn {
            found_keys: first.keys().cloned().collect(),
        });
    }

    Ok(())
}
