//! # 外围服务模块
//!
//! 围绕生成引擎的薄编排层：
//! - `pipeline`: 加载模板、生成、编码
//! - `store`: 产物写入、备份轮转、回滚与校验
//! - `updater`: 单次/守护模式的定时更新
//! - `status`: 产物状态快照

pub mod pipeline;
pub mod status;
pub mod store;
pub mod updater;

// 重新导出常用类型
pub use pipeline::render;
pub use status::Status;
pub use store::ProfileStore;
pub use updater::{UpdateOutcome, Updater};
