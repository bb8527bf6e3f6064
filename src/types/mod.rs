//! 类型定义
//!
//! 角色名与候选连接池配置

pub mod role_name;
pub mod database_config;

// 重新导出所有公共类型
pub use role_name::RoleName;
pub use database_config::{
    CandidateConfig, RoleTargets, CHECKOUT_TIMEOUT_KEY, DEFAULT_POOL_SIZE, POOL_SIZE_KEY,
};
