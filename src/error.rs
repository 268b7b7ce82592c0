use std::fmt;

/// 应用程序错误类型
///
/// 只包含运行开始之前的致命错误，以及输入/导出阶段的错误。
/// 运行中的可恢复错误（网络不可用、超时、响应异常）不会出现在这里，
/// 它们被 `BatchRun` 吸收为提示信息。
#[derive(Debug)]
pub enum AppError {
    /// 数据校验失败
    Validation(ValidationError),
    /// 没有可处理的数据
    NoData,
    /// 读取输入文件错误
    Input(InputError),
    /// 导出错误
    Export(ExportError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::NoData => write!(f, "文件中没有找到数据"),
            AppError::Input(e) => write!(f, "输入错误: {}", e),
            AppError::Export(e) => write!(f, "导出错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::Input(e) => Some(e),
            AppError::Export(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::NoData | AppError::Other(_) => None,
        }
    }
}

/// 数据校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 输入为空
    EmptyInput,
    /// 第一行缺少 Part 列
    MissingPartColumn { found_keys: Vec<String> },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyInput => write!(f, "输入数据为空"),
            ValidationError::MissingPartColumn { found_keys } => {
                write!(
                    f,
                    "文件必须包含 'Part' 列 (第一行的列: [{}])",
                    found_keys.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 读取输入文件错误
#[derive(Debug)]
pub enum InputError {
    /// 文件不存在
    NotFound { path: String },
    /// 不支持的文件格式
    UnsupportedFormat { path: String },
    /// 读取或解析失败
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 某一行不是键值对象
    NotARecord { path: String, index: usize },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::NotFound { path } => write!(f, "文件不存在: {}", path),
            InputError::UnsupportedFormat { path } => {
                write!(f, "不支持的文件格式: {}", path)
            }
            InputError::ParseFailed { path, source } => {
                write!(f, "解析文件失败 ({}): {}", path, source)
            }
            InputError::NotARecord { path, index } => {
                write!(f, "第 {} 行不是对象 ({})", index + 1, path)
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 导出错误
#[derive(Debug)]
pub enum ExportError {
    /// 没有可导出的数据
    NothingToExport,
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NothingToExport => write!(f, "没有可导出的数据"),
            ExportError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            ExportError::NothingToExport => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 远程地址无法使用
    InvalidEndpoint { url: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidEndpoint { url, reason } => {
                write!(f, "远程地址 {} 无法使用: {}", url, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::Input(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件解析错误
    pub fn input_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Input(InputError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建导出写入错误
    pub fn export_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Export(ExportError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否是运行开始前的致命错误
    pub fn is_pre_run(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::NoData)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
