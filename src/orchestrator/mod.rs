//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_driver` - 批量上传驱动
//! - 按顺序逐行分发，一次只有一个远程调用
//! - 持有在线/离线开关、进度计数和取消开关
//! - 产出终态的 `BatchRun`
//!
//! ### `app` - 上传应用
//! - 读取输入、校验、启动驱动
//! - 写入运行提示、导出结果
//!
//! ## 层次关系
//!
//! ```text
//! app (读取 / 校验 / 导出)
//!     ↓
//! batch_driver (处理 Vec<Item>)
//!     ↓
//! workflow::ItemFlow (处理单个 Item)
//!     ↓
//! clients (RemoteProcessor)
//!     ↓
//! infrastructure (ConnectionId / CancellationGate)
//! ```

pub mod app;
pub mod batch_driver;

pub use app::{App, UploadSummary};
pub use batch_driver::{BatchDriver, BatchHandle, DriverSettings};
