//! 连接池接口

use async_trait::async_trait;

use super::{PoolStatus, PooledConnection};
use crate::error::MultiDbResult;

/// 连接池接口
///
/// 实现方负责连接的排队、复用与并发安全。均衡器只通过本接口
/// 借出/归还连接、切换查询缓存以及断开全部连接
#[async_trait]
pub trait ConnectionPool: Send + Sync + std::fmt::Debug {
    /// 适配器名称
    fn adapter(&self) -> &str;

    /// 借出一个连接，连接池耗尽时等待
    async fn acquire_connection(&self) -> MultiDbResult<PooledConnection>;

    /// 归还连接
    ///
    /// 同步调用，保证在 `Drop` 中也能归还
    fn release_connection(&self, connection: PooledConnection);

    /// 开启查询缓存（连接池级别）
    fn enable_query_cache(&self);

    /// 关闭查询缓存
    fn disable_query_cache(&self);

    /// 查询缓存是否开启
    fn query_cache_enabled(&self) -> bool;

    /// 关闭并释放所有持有的连接，可重复调用
    async fn disconnect_all(&self) -> MultiDbResult<()>;

    /// 状态快照
    fn status(&self) -> PoolStatus;
}
