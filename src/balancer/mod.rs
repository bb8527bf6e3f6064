//! 连接均衡器模块
//!
//! 按角色在多个连接池之间选择，并在作用域内把借出的连接发布为
//! “当前连接”

mod candidate;
mod registry;
mod maintenance;

pub use candidate::{Candidate, PoolSource};
pub use registry::Registry;
pub use maintenance::HEALTH_CHECK_TIMEOUT;

use futures::{Stream, TryStreamExt};
use rand::seq::SliceRandom;
use rat_logger::{debug, info, warn};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::adapter::{AdapterRegistry, global_adapter_registry};
use crate::config::Configuration;
use crate::context::{self, ActiveBinding};
use crate::error::{MultiDbError, MultiDbResult};
use crate::pool::PooledConnection;
use crate::types::{RoleName, RoleTargets};

/// 连接均衡器
#[derive(Debug)]
pub struct Balancer {
    /// 角色注册表
    registry: Registry,
    /// 适配器注册表
    adapters: AdapterRegistry,
    /// 合并到角色配置下的默认适配器配置
    default_adapter: crate::types::CandidateConfig,
    /// 默认候选连接池
    default_candidate: Option<Arc<Candidate>>,
    /// 作用域外使用的默认连接
    default_connection: Mutex<Option<PooledConnection>>,
    /// 未知角色是否回退到默认角色
    fallback: bool,
}

impl Balancer {
    /// 使用全局适配器注册表创建均衡器
    pub fn new(configuration: Configuration) -> MultiDbResult<Self> {
        Self::with_adapters(configuration, global_adapter_registry())
    }

    /// 使用指定适配器注册表创建均衡器
    pub fn with_adapters(configuration: Configuration, adapters: AdapterRegistry) -> MultiDbResult<Self> {
        let Configuration {
            raw,
            default_pool,
            default_adapter,
        } = configuration;

        let mut balancer = Self {
            registry: Registry::new(),
            adapters,
            default_adapter,
            default_candidate: None,
            default_connection: Mutex::new(None),
            fallback: raw.resolve_fallback(),
        };

        balancer.append(&raw.databases)?;

        if let Some(source) = default_pool {
            let candidate = Arc::new(Candidate::from_source(
                RoleName::DEFAULT,
                source,
                &balancer.adapters,
            )?);
            balancer
                .registry
                .insert_if_absent(RoleName::default_role(), vec![candidate.clone()]);
            balancer.default_candidate = Some(candidate);
        }

        info!(
            "创建连接均衡器: 角色数={}, 回退={}, 默认连接池={}",
            balancer.registry.len(),
            balancer.fallback,
            balancer.default_candidate.is_some()
        );
        Ok(balancer)
    }

    /// 追加角色配置
    ///
    /// 纯追加：重复追加同一配置会产生重复的候选连接池。应在并发使用前完成
    pub fn append(&self, databases: &BTreeMap<String, RoleTargets>) -> MultiDbResult<()> {
        self.registry
            .append(databases, &self.default_adapter, &self.adapters)?;
        Ok(())
    }

    /// 未知角色是否回退到默认角色
    pub fn fallback(&self) -> bool {
        self.fallback
    }

    /// 默认候选连接池
    pub fn default_candidate(&self) -> Option<&Arc<Candidate>> {
        self.default_candidate.as_ref()
    }

    /// 角色注册表
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 为角色随机选择一个候选连接池
    ///
    /// 在角色的候选列表中均匀随机选择，不考虑亲和性与健康状态
    pub fn get(&self, role: impl AsRef<str>) -> MultiDbResult<Arc<Candidate>> {
        let requested = RoleName::new(role.as_ref());

        let candidates = match self.registry.candidates(&requested) {
            Some(candidates) => candidates,
            None if self.fallback => {
                warn!("未知角色 '{}'，回退到默认角色", requested);
                self.registry
                    .candidates(&RoleName::default_role())
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        let candidate = candidates
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| crate::multidb_error!(unknown_role, role.as_ref()))?;

        debug!(
            "选择候选连接池: 角色={}, 候选数={}, 适配器={}",
            requested,
            candidates.len(),
            candidate.pool().adapter()
        );
        Ok(candidate)
    }

    /// 选择候选连接池并交给 `callback`
    pub fn get_with<F, R>(&self, role: impl AsRef<str>, callback: F) -> MultiDbResult<R>
    where
        F: FnOnce(Arc<Candidate>) -> R,
    {
        Ok(callback(self.get(role)?))
    }

    /// 在角色连接的作用域内执行 `action`
    ///
    /// 作用域内 [`Balancer::current_connection`] 返回借出的连接，
    /// [`Balancer::current_connection_name`] 返回 `role`。`action` 本身（包括
    /// 返回 future 之前的同步部分）在绑定生效后才被调用。无论 `action`
    /// 成功、出错还是被取消，退出时都会关闭查询缓存、恢复外层绑定并归还连接，
    /// 然后才返回 `action` 的结果。
    ///
    /// 选中的是默认候选连接池且均衡器已持有默认连接时，直接复用该连接，
    /// 不再从连接池借出。
    ///
    /// `action` 的结果在连接归还前已经完成计算；需要流式结果时使用
    /// [`Balancer::use_collect`]
    pub async fn use_with<F, Fut, T>(&self, role: impl AsRef<str>, action: F) -> MultiDbResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MultiDbResult<T>>,
    {
        let role = RoleName::new(role.as_ref());
        let candidate = self.get(&role)?;

        let _query_cache = candidate.query_cache_scope();
        if let Some(connection) = self.held_default_connection(&candidate).await {
            debug!("复用默认连接: 角色={}, 连接ID={}", role, connection.id);
            return Self::run_scoped(role, connection, action).await;
        }

        candidate
            .with_connection(|connection| Self::run_scoped(role, connection, action))
            .await?
    }

    /// 在角色连接的作用域内执行返回流的 `action`
    ///
    /// 流在绑定生效后创建，并在连接归还前被完整收集到内存
    pub async fn use_collect<F, S, T>(&self, role: impl AsRef<str>, action: F) -> MultiDbResult<Vec<T>>
    where
        F: FnOnce() -> S,
        S: Stream<Item = MultiDbResult<T>>,
    {
        self.use_with(role, || action().try_collect::<Vec<T>>()).await
    }

    /// 在空的根上下文中执行 `future`
    ///
    /// 根上下文内可以调用 [`Balancer::use_connection`] 切换当前连接，切换只
    /// 对该任务可见
    pub async fn enter<F: Future>(&self, future: F) -> F::Output {
        context::root(future).await
    }

    /// 借出角色连接并设为当前连接
    ///
    /// 连接所有权交给调用方，不会自动归还。当前绑定被直接覆盖，没有作用域
    /// 可供恢复，持续到最内层的上下文（`use_with` 作用域或
    /// [`Balancer::enter`] 根上下文）结束。不在任何上下文内时返回配置错误，
    /// 不借出连接
    pub async fn use_connection(&self, role: impl AsRef<str>) -> MultiDbResult<PooledConnection> {
        if !context::in_scope() {
            return Err(crate::multidb_error!(
                config,
                crate::i18n::t("error.no_context")
            ));
        }

        let role = RoleName::new(role.as_ref());
        let candidate = self.get(&role)?;
        let connection = candidate.connection().await?;

        debug!("切换当前连接: 角色={}, 连接ID={}", role, connection.id);
        if let Err(e) = context::install(ActiveBinding::new(connection.clone(), role)) {
            candidate.pool().release_connection(connection);
            return Err(e);
        }
        Ok(connection)
    }

    /// 当前连接
    ///
    /// 作用域内返回作用域的连接；作用域外返回默认连接池的常驻连接
    pub async fn current_connection(&self) -> MultiDbResult<PooledConnection> {
        if let Some(binding) = context::current() {
            return Ok(binding.connection);
        }

        let candidate = self
            .default_candidate
            .as_ref()
            .ok_or(MultiDbError::NoDefaultConfigured)?;

        let mut slot = self.default_connection.lock().await;
        if let Some(connection) = slot.as_ref() {
            return Ok(connection.clone());
        }
        let connection = candidate.connection().await?;
        *slot = Some(connection.clone());
        Ok(connection)
    }

    /// 当前角色名
    ///
    /// 作用域外为 "default"；既没有绑定也没有默认候选连接池时返回
    /// `NoDefaultConfigured`
    pub fn current_connection_name(&self) -> MultiDbResult<RoleName> {
        match context::current() {
            Some(binding) => Ok(binding.role),
            None if self.default_candidate.is_some() => Ok(RoleName::default_role()),
            None => Err(MultiDbError::NoDefaultConfigured),
        }
    }

    /// `candidate` 为默认候选连接池时，均衡器已持有的默认连接
    pub(crate) async fn held_default_connection(&self, candidate: &Arc<Candidate>) -> Option<PooledConnection> {
        let default = self.default_candidate.as_ref()?;
        if !Arc::ptr_eq(default, candidate) {
            return None;
        }
        self.default_connection.lock().await.clone()
    }

    async fn run_scoped<F, Fut, T>(role: RoleName, connection: PooledConnection, action: F) -> MultiDbResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MultiDbResult<T>>,
    {
        debug!("进入连接作用域: 角色={}, 连接ID={}", role, connection.id);
        let exit_role = role.clone();
        let result = context::scope(ActiveBinding::new(connection, role), async move {
            action().await
        })
        .await;
        debug!("退出连接作用域: 角色={}", exit_role);
        result
    }

    /// 断开所有连接池
    ///
    /// 可重复调用。调用时不应有进行中的连接借出
    pub async fn disconnect_all(&self) -> MultiDbResult<()> {
        info!("断开所有连接池");

        if let Some(connection) = self.default_connection.lock().await.take() {
            if let Some(candidate) = &self.default_candidate {
                candidate.pool().release_connection(connection);
            }
        }

        let mut candidates = self.registry.all();
        if let Some(default) = &self.default_candidate {
            if !candidates.iter().any(|c| Arc::ptr_eq(c, default)) {
                candidates.push(default.clone());
            }
        }

        let mut first_error = None;
        for candidate in candidates {
            if let Err(e) = candidate.pool().disconnect_all().await {
                warn!("断开连接池失败: 角色={}, 错误={}", candidate.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MultiDbConfig;
    use crate::types::CandidateConfig;

    fn balancer(fallback: bool) -> Balancer {
        let raw = MultiDbConfig::builder()
            .default_database(CandidateConfig::new("memory"))
            .database("reporting", CandidateConfig::default().param("host", "b"))
            .database("reporting", CandidateConfig::default().param("host", "c"))
            .fallback(fallback)
            .build()
            .unwrap();
        Balancer::with_adapters(Configuration::from_raw(raw), AdapterRegistry::with_builtin()).unwrap()
    }

    #[test]
    fn test_default_role_registered() {
        let balancer = balancer(false);
        let default = balancer.get("default").unwrap();
        assert!(Arc::ptr_eq(&default, balancer.default_candidate().unwrap()));
        assert_eq!(balancer.registry().roles().len(), 2);
    }

    #[test]
    fn test_get_with_callback() {
        let balancer = balancer(false);
        let name = balancer.get_with("Reporting", |c| c.name().to_string()).unwrap();
        assert_eq!(name, "reporting");
    }

    #[tokio::test]
    async fn test_use_with_binds_role_and_releases() {
        let balancer = balancer(false);
        let (name, connection) = balancer
            .use_with("reporting", || async {
                Ok::<_, MultiDbError>((
                    balancer.current_connection_name()?,
                    balancer.current_connection().await?,
                ))
            })
            .await
            .unwrap();

        assert_eq!(name, "reporting");
        assert_eq!(connection.role, "reporting");
        for candidate in balancer.registry().all() {
            assert_eq!(candidate.pool().status().checked_out, 0);
        }
    }

    #[tokio::test]
    async fn test_use_collect_materializes_before_release() {
        let balancer = balancer(false);
        let rows = balancer
            .use_collect("reporting", || {
                futures::stream::iter(vec![Ok(1), Ok(2), Ok(3)])
            })
            .await
            .unwrap();
        assert_eq!(rows, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_role_without_fallback() {
        let balancer = balancer(false);
        let err = balancer
            .use_with("missing", || async { Ok::<_, MultiDbError>(()) }).await.unwrap_err();
        assert!(err.is_unknown_role());
    }

    #[tokio::test]
    async fn test_current_connection_name_without_default() {
        let raw = MultiDbConfig::builder()
            .database("reporting", CandidateConfig::new("memory"))
            .build()
            .unwrap();
        let balancer = Balancer::with_adapters(Configuration::from_raw(raw), AdapterRegistry::with_builtin()).unwrap();

        assert!(matches!(
            balancer.current_connection_name(),
            Err(MultiDbError::NoDefaultConfigured)
        ));
        let name = balancer
            .use_with("reporting", || async { balancer.current_connection_name() })
            .await
            .unwrap();
        assert_eq!(name, "reporting");
    }

    #[tokio::test]
    async fn test_disconnect_releases_default_connection() {
        let balancer = balancer(true);
        balancer.current_connection().await.unwrap();
        let default = balancer.default_candidate().unwrap().clone();
        assert_eq!(default.pool().status().checked_out, 1);

        balancer.disconnect_all().await.unwrap();
        assert_eq!(default.pool().status().checked_out, 0);
        balancer.disconnect_all().await.unwrap();
    }
}
