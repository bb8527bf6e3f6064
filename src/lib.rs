//! rat_multidb - 多数据库连接均衡器
//!
//! 按角色管理一组连接池，为每次请求在角色的候选连接池中随机选择，
//! 并在作用域内把借出的连接发布为“当前连接”

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod pool;
pub mod adapter;
pub mod config;
pub mod i18n;
pub mod context;
pub mod balancer;
pub mod global;

// 重新导出常用类型和函数
pub use error::{MultiDbError, MultiDbResult};
pub use types::*;
pub use pool::{
    ConnectionLease, ConnectionPool, MemoryPool, PoolSettings, PoolSpec, PoolStatus,
    PooledConnection,
};
pub use adapter::{AdapterRegistry, PoolFactory, global_adapter_registry, register_adapter};
pub use config::{Configuration, Environment, MultiDbConfig, MultiDbConfigBuilder};
pub use context::ActiveBinding;
pub use balancer::{Balancer, Candidate, PoolSource, Registry};

// 全局便捷函数
pub use global::{
    balancer, configure, current_connection, current_connection_name, disconnect_all, enter,
    is_initialized, use_collect, use_connection, use_with,
};

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化rat_multidb库
///
/// 初始化多语言错误消息系统
///
/// 注意：日志系统由调用者自行初始化，本库不会自动初始化日志
pub fn init() {
    i18n::ErrorMessageI18n::init();
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
