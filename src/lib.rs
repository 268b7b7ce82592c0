//! # Sheet Row Upload
//!
//! 把表格数据逐行发送到远程行处理服务，并在服务不可用时自动切换到离线模式
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 每次运行独立的资源
//! - `ConnectionId` - 每次运行一个的关联标识
//! - `CancellationGate` - 协作式取消开关
//!
//! ### ② 客户端与业务能力层（Clients / Services）
//! - `clients/` - `RemoteProcessor` 及其 HTTP 实现
//! - `services/` - 校验、在线/离线开关、进度、导出、提示日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行"的远程处理流程（超时 + 取消 + 失败分类）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_driver` - 逐行驱动，产出终态的 `BatchRun`
//! - `orchestrator/app` - 读取、校验、驱动、导出
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpRowProcessor, ProcessRequest, RemoteError, RemoteProcessor};
pub use config::Config;
pub use error::{AppError, AppResult, ValidationError};
pub use infrastructure::{CancellationGate, ConnectionId};
pub use models::{BatchRun, Item, Mode, OutputRecord, RunNotice, RunOutcome, Row};
pub use orchestrator::{App, BatchDriver, BatchHandle, DriverSettings, UploadSummary};
pub use services::ProgressEvent;
pub use workflow::{ItemFlow, ItemOutcome};
