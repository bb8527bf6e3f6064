//! # 配置构建器模块
//!
//! 提供配置类型的构建器实现，支持链式调用和严格验证

pub mod multidb_builder;

// 重新导出所有Builder类型以保持API兼容性
pub use multidb_builder::MultiDbConfigBuilder;
