//! # 地区模块
//!
//! 地区目录：名称、显示图标与节点名匹配关键词。

mod catalog;

// 重新导出常用类型
pub use catalog::{Region, RegionCatalog};
