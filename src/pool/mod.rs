//! 连接池模块
//!
//! 定义均衡器依赖的连接池接口、作用域租约以及内置的内存连接池

pub mod config;
pub mod types;
pub mod traits;
pub mod lease;
pub mod memory;

// 重新导出主要的公共类型和结构体
pub use config::PoolSettings;
pub use types::{PoolSpec, PoolStatus, PooledConnection};
pub use traits::ConnectionPool;
pub use lease::ConnectionLease;
pub use memory::MemoryPool;
