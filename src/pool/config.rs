//! 连接池配置模块

use std::time::Duration;

use crate::types::database_config::{CandidateConfig, DEFAULT_POOL_SIZE};

/// 连接池运行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// 最大连接数
    pub max_connections: u32,
    /// 获取连接的超时时间，`None` 表示一直等待
    pub checkout_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_POOL_SIZE,
            checkout_timeout: None,
        }
    }
}

impl PoolSettings {
    /// 从候选配置的连接参数中读取
    pub fn from_config(config: &CandidateConfig) -> Self {
        Self {
            max_connections: config.pool_size(),
            checkout_timeout: config.checkout_timeout(),
        }
    }
}
