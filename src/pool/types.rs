//! 连接池类型定义模块

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::PoolSettings;
use crate::types::{CandidateConfig, RoleName};

/// 池化连接
///
/// 连接池借出的连接句柄，以 `id` 标识同一条物理连接
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PooledConnection {
    /// 连接ID
    pub id: String,
    /// 所属角色
    pub role: RoleName,
    /// 适配器名称
    pub adapter: String,
}

impl PooledConnection {
    /// 创建新连接，ID 随机生成
    pub fn new(role: RoleName, adapter: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            adapter: adapter.into(),
        }
    }
}

/// 连接池规格
///
/// 由候选配置构建，交给适配器工厂创建连接池
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSpec {
    /// 所属角色
    pub role: RoleName,
    /// 规范化后的适配器名称
    pub adapter: String,
    /// 连接参数（不含 adapter 与 query_cache）
    pub params: BTreeMap<String, Value>,
    /// 连接池运行参数
    pub settings: PoolSettings,
}

impl PoolSpec {
    pub fn from_config(role: RoleName, adapter: impl Into<String>, config: &CandidateConfig) -> Self {
        Self {
            role,
            adapter: adapter.into(),
            params: config.params.clone(),
            settings: PoolSettings::from_config(config),
        }
    }
}

/// 连接池状态快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// 所属角色
    pub role: String,
    /// 适配器名称
    pub adapter: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 已借出连接数
    pub checked_out: usize,
    /// 空闲连接数
    pub idle: usize,
    /// 累计打开的连接数
    pub opened: u64,
    /// 查询缓存是否开启
    pub query_cache_enabled: bool,
}
