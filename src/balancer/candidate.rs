//! 候选连接池

use rat_logger::{debug, error};
use std::future::Future;
use std::sync::Arc;

use crate::adapter::{AdapterRegistry, normalize_adapter_name};
use crate::error::MultiDbResult;
use crate::pool::{ConnectionLease, ConnectionPool, PoolSpec, PooledConnection};
use crate::types::{CandidateConfig, RoleName};

/// 连接池来源：已构建的连接池或待构建的配置
#[derive(Debug, Clone)]
pub enum PoolSource {
    /// 已构建的连接池
    Pool(Arc<dyn ConnectionPool>),
    /// 通过适配器注册表构建
    Config(CandidateConfig),
}

impl From<CandidateConfig> for PoolSource {
    fn from(config: CandidateConfig) -> Self {
        PoolSource::Config(config)
    }
}

impl From<Arc<dyn ConnectionPool>> for PoolSource {
    fn from(pool: Arc<dyn ConnectionPool>) -> Self {
        PoolSource::Pool(pool)
    }
}

/// 候选连接池
///
/// 一个角色下的一个连接池及其查询缓存策略，构建后不可变
#[derive(Debug)]
pub struct Candidate {
    name: RoleName,
    pool: Arc<dyn ConnectionPool>,
    query_cache_enabled: bool,
}

impl Candidate {
    /// 包装已有连接池，查询缓存由连接池自行管理
    pub fn from_pool(name: impl AsRef<str>, pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            name: RoleName::new(name),
            pool,
            query_cache_enabled: false,
        }
    }

    /// 通过适配器注册表从配置构建连接池
    pub fn from_config(
        name: impl AsRef<str>,
        config: &CandidateConfig,
        adapters: &AdapterRegistry,
    ) -> MultiDbResult<Self> {
        let name = RoleName::new(name);
        let adapter = config.adapter.as_deref().ok_or_else(|| {
            crate::multidb_error!(
                config,
                crate::i18n::tf("error.missing_adapter", &[("role", name.as_str())])
            )
        })?;

        let spec = PoolSpec::from_config(name.clone(), normalize_adapter_name(adapter), config);
        let pool = adapters.create_pool(&spec).map_err(|e| {
            error!("候选连接池创建失败: 角色={}, 错误={}", name, e);
            e
        })?;

        debug!(
            "创建候选连接池: 角色={}, 适配器={}, 查询缓存={}",
            name,
            spec.adapter,
            config.query_cache_enabled()
        );

        Ok(Self {
            name,
            pool,
            query_cache_enabled: config.query_cache_enabled(),
        })
    }

    /// 根据来源构建
    pub fn from_source(
        name: impl AsRef<str>,
        source: PoolSource,
        adapters: &AdapterRegistry,
    ) -> MultiDbResult<Self> {
        match source {
            PoolSource::Pool(pool) => Ok(Self::from_pool(name, pool)),
            PoolSource::Config(config) => Self::from_config(name, &config, adapters),
        }
    }

    /// 所属角色
    pub fn name(&self) -> &RoleName {
        &self.name
    }

    /// 底层连接池
    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    /// 作用域内是否开启查询缓存
    pub fn query_cache_enabled(&self) -> bool {
        self.query_cache_enabled
    }

    /// 借出连接，由调用方负责归还
    pub async fn connection(&self) -> MultiDbResult<PooledConnection> {
        self.pool.acquire_connection().await
    }

    /// 借出连接执行 `action`，任何退出路径都会归还连接
    pub async fn with_connection<F, Fut>(&self, action: F) -> MultiDbResult<Fut::Output>
    where
        F: FnOnce(PooledConnection) -> Fut,
        Fut: Future,
    {
        let lease = ConnectionLease::acquire(self.pool.clone()).await?;
        let output = action(lease.connection().clone()).await;
        drop(lease);
        Ok(output)
    }

    /// 按需开启查询缓存，返回的守卫析构时关闭
    pub(crate) fn query_cache_scope(&self) -> Option<QueryCacheGuard<'_>> {
        if !self.query_cache_enabled {
            return None;
        }
        self.pool.enable_query_cache();
        Some(QueryCacheGuard { pool: self.pool.as_ref() })
    }
}

/// 查询缓存守卫
pub(crate) struct QueryCacheGuard<'a> {
    pool: &'a dyn ConnectionPool,
}

impl Drop for QueryCacheGuard<'_> {
    fn drop(&mut self) {
        self.pool.disable_query_cache();
    }
}
