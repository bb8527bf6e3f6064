//! 内存连接池
//!
//! 进程内的参考实现，注册为 `memory` 适配器。借出数量由信号量限制，
//! 空闲连接按先进先出复用

use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use rat_logger::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::{ConnectionPool, PoolSettings, PoolSpec, PoolStatus, PooledConnection};
use crate::error::MultiDbResult;
use crate::types::RoleName;

/// 内存连接池
#[derive(Debug)]
pub struct MemoryPool {
    /// 所属角色
    role: RoleName,
    /// 适配器名称
    adapter: String,
    /// 运行参数
    settings: PoolSettings,
    /// 借出许可
    permits: Arc<Semaphore>,
    /// 空闲连接队列
    idle: SegQueue<PooledConnection>,
    /// 已借出的连接 (连接ID -> 许可)
    checked_out: DashMap<String, OwnedSemaphorePermit>,
    /// 查询缓存开关
    query_cache: AtomicBool,
    /// 累计打开的连接数
    opened: AtomicU64,
    /// 断开次数
    disconnects: AtomicU64,
}

impl MemoryPool {
    /// 根据连接池规格创建
    pub fn new(spec: &PoolSpec) -> Self {
        Self::with_settings(spec.role.clone(), spec.adapter.clone(), spec.settings.clone())
    }

    /// 使用指定参数创建
    pub fn with_settings(role: RoleName, adapter: impl Into<String>, settings: PoolSettings) -> Self {
        let adapter = adapter.into();
        info!(
            "创建内存连接池: 角色={}, 适配器={}, 最大连接数={}",
            role, adapter, settings.max_connections
        );

        Self {
            permits: Arc::new(Semaphore::new(settings.max_connections as usize)),
            role,
            adapter,
            settings,
            idle: SegQueue::new(),
            checked_out: DashMap::new(),
            query_cache: AtomicBool::new(false),
            opened: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
        }
    }

    /// 适配器工厂
    pub fn factory(spec: &PoolSpec) -> MultiDbResult<Arc<dyn ConnectionPool>> {
        Ok(Arc::new(Self::new(spec)))
    }

    /// 当前借出的连接数
    pub fn checked_out(&self) -> usize {
        self.checked_out.len()
    }

    /// 已执行的断开次数
    pub fn disconnect_count(&self) -> u64 {
        self.disconnects.load(Ordering::SeqCst)
    }

    async fn acquire_permit(&self) -> MultiDbResult<OwnedSemaphorePermit> {
        let acquire = self.permits.clone().acquire_owned();

        let permit = match self.settings.checkout_timeout {
            Some(timeout) => tokio::time::timeout(timeout, acquire).await.map_err(|_| {
                crate::multidb_error!(
                    pool,
                    crate::i18n::tf(
                        "error.checkout_timeout",
                        &[
                            ("role", self.role.as_str()),
                            ("seconds", &timeout.as_secs().to_string()),
                        ],
                    )
                )
            })?,
            None => acquire.await,
        };

        permit.map_err(|e| crate::multidb_error!(pool, e))
    }
}

#[async_trait::async_trait]
impl ConnectionPool for MemoryPool {
    fn adapter(&self) -> &str {
        &self.adapter
    }

    async fn acquire_connection(&self) -> MultiDbResult<PooledConnection> {
        let permit = self.acquire_permit().await?;

        let connection = match self.idle.pop() {
            Some(connection) => connection,
            None => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                PooledConnection::new(self.role.clone(), self.adapter.clone())
            }
        };

        debug!("借出连接: 角色={}, ID={}", self.role, connection.id);
        self.checked_out.insert(connection.id.clone(), permit);
        Ok(connection)
    }

    fn release_connection(&self, connection: PooledConnection) {
        // 断开之前借出的连接不再放回队列
        if self.checked_out.remove(&connection.id).is_some() {
            debug!("归还连接: 角色={}, ID={}", self.role, connection.id);
            self.idle.push(connection);
        } else {
            crate::debug_log!("忽略未登记的连接: 角色={}, ID={}", self.role, connection.id);
        }
    }

    fn enable_query_cache(&self) {
        self.query_cache.store(true, Ordering::SeqCst);
    }

    fn disable_query_cache(&self) {
        self.query_cache.store(false, Ordering::SeqCst);
    }

    fn query_cache_enabled(&self) -> bool {
        self.query_cache.load(Ordering::SeqCst)
    }

    async fn disconnect_all(&self) -> MultiDbResult<()> {
        let mut closed = 0usize;
        while self.idle.pop().is_some() {
            closed += 1;
        }
        closed += self.checked_out.len();
        self.checked_out.clear();
        self.disconnects.fetch_add(1, Ordering::SeqCst);

        info!("内存连接池已断开: 角色={}, 关闭连接数={}", self.role, closed);
        Ok(())
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            role: self.role.to_string(),
            adapter: self.adapter.clone(),
            max_connections: self.settings.max_connections,
            checked_out: self.checked_out.len(),
            idle: self.idle.len(),
            opened: self.opened.load(Ordering::SeqCst),
            query_cache_enabled: self.query_cache_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ConnectionLease;
    use std::time::Duration;

    fn pool(max_connections: u32, checkout_timeout: Option<Duration>) -> Arc<MemoryPool> {
        Arc::new(MemoryPool::with_settings(
            RoleName::new("reporting"),
            "memory",
            PoolSettings {
                max_connections,
                checkout_timeout,
            },
        ))
    }

    #[tokio::test]
    async fn test_release_reuses_connection() {
        let pool = pool(2, None);
        let first = pool.acquire_connection().await.unwrap();
        let first_id = first.id.clone();
        pool.release_connection(first);

        let again = pool.acquire_connection().await.unwrap();
        assert_eq!(again.id, first_id);
        assert_eq!(pool.status().opened, 1);
        assert_eq!(pool.checked_out(), 1);
    }

    #[tokio::test]
    async fn test_checkout_timeout_when_exhausted() {
        let pool = pool(1, Some(Duration::from_millis(20)));
        let _held = pool.acquire_connection().await.unwrap();

        let err = pool.acquire_connection().await.unwrap_err();
        assert!(matches!(err, crate::MultiDbError::PoolError { .. }));
    }

    #[tokio::test]
    async fn test_lease_releases_on_cancellation() {
        let pool = pool(1, None);
        let shared: Arc<dyn ConnectionPool> = pool.clone();

        let task = tokio::spawn(async move {
            let _lease = ConnectionLease::acquire(shared).await.unwrap();
            std::future::pending::<()>().await;
        });
        while pool.checked_out() == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        assert_eq!(pool.checked_out(), 0);
        assert_eq!(pool.status().idle, 1);
    }

    #[tokio::test]
    async fn test_disconnect_all_is_idempotent() {
        let pool = pool(2, None);
        let connection = pool.acquire_connection().await.unwrap();
        pool.disconnect_all().await.unwrap();
        pool.disconnect_all().await.unwrap();
        assert_eq!(pool.disconnect_count(), 2);

        // 断开前借出的连接归还后不再复用
        pool.release_connection(connection);
        assert_eq!(pool.status().idle, 0);
        assert_eq!(pool.status().checked_out, 0);
    }

    #[test]
    fn test_query_cache_toggle() {
        let pool = pool(1, None);
        assert!(!pool.query_cache_enabled());
        pool.enable_query_cache();
        assert!(pool.status().query_cache_enabled);
        pool.disable_query_cache();
        assert!(!pool.query_cache_enabled());
    }
}
