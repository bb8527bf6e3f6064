//! # 配置管理模块
//!
//! 提供多数据库配置的数据结构、文件加载与构建器

pub mod builders;
pub mod core;

// 重新导出所有公共类型以保持API兼容性
pub use builders::MultiDbConfigBuilder;
pub use self::core::{Configuration, Environment, MultiDbConfig};
