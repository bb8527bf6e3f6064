//! # 全局均衡器和便捷函数
//!
//! 首次使用时根据 [`configure`] 安装的环境配置构建唯一的均衡器；
//! [`disconnect_all`] 断开并销毁它，之后的调用会重新构建

use arc_swap::ArcSwapOption;
use futures::Stream;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use rat_logger::info;
use std::future::Future;
use std::sync::Arc;

use crate::balancer::Balancer;
use crate::config::Configuration;
use crate::error::MultiDbResult;
use crate::pool::PooledConnection;
use crate::types::RoleName;

/// 环境配置
static AMBIENT_CONFIGURATION: Lazy<RwLock<Configuration>> =
    Lazy::new(|| RwLock::new(Configuration::default()));

/// 全局均衡器实例
static GLOBAL_BALANCER: Lazy<ArcSwapOption<Balancer>> = Lazy::new(ArcSwapOption::empty);

/// 构建与销毁互斥
static INIT_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// 安装环境配置
///
/// 必须在全局均衡器构建之前调用；已构建时返回配置错误
pub fn configure(configuration: impl Into<Configuration>) -> MultiDbResult<()> {
    let _init = INIT_LOCK.lock();
    if GLOBAL_BALANCER.load().is_some() {
        return Err(crate::multidb_error!(
            config,
            crate::i18n::t("error.already_configured")
        ));
    }

    *AMBIENT_CONFIGURATION.write() = configuration.into();
    info!("已安装全局多数据库配置");
    Ok(())
}

/// 获取全局均衡器，首次调用时构建
pub fn balancer() -> MultiDbResult<Arc<Balancer>> {
    if let Some(balancer) = GLOBAL_BALANCER.load_full() {
        return Ok(balancer);
    }

    let _init = INIT_LOCK.lock();
    if let Some(balancer) = GLOBAL_BALANCER.load_full() {
        return Ok(balancer);
    }

    let configuration = AMBIENT_CONFIGURATION.read().clone();
    let balancer = Arc::new(Balancer::new(configuration)?);
    GLOBAL_BALANCER.store(Some(balancer.clone()));
    info!("全局均衡器已构建");
    Ok(balancer)
}

/// 全局均衡器是否已构建
pub fn is_initialized() -> bool {
    GLOBAL_BALANCER.load().is_some()
}

/// 便捷函数 - 在角色连接的作用域内执行
pub async fn use_with<F, Fut, T>(role: impl AsRef<str>, action: F) -> MultiDbResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = MultiDbResult<T>>,
{
    balancer()?.use_with(role, action).await
}

/// 便捷函数 - 在角色连接的作用域内收集流
pub async fn use_collect<F, S, T>(role: impl AsRef<str>, action: F) -> MultiDbResult<Vec<T>>
where
    F: FnOnce() -> S,
    S: Stream<Item = MultiDbResult<T>>,
{
    balancer()?.use_collect(role, action).await
}

/// 便捷函数 - 在空的根上下文中执行 `future`
///
/// 不需要已构建的均衡器
pub async fn enter<F: Future>(future: F) -> F::Output {
    crate::context::root(future).await
}

/// 便捷函数 - 借出角色连接并设为当前连接
///
/// 需在 [`enter`] 或 [`use_with`] 内调用
pub async fn use_connection(role: impl AsRef<str>) -> MultiDbResult<PooledConnection> {
    balancer()?.use_connection(role).await
}

/// 便捷函数 - 当前连接
pub async fn current_connection() -> MultiDbResult<PooledConnection> {
    balancer()?.current_connection().await
}

/// 便捷函数 - 当前角色名
pub fn current_connection_name() -> MultiDbResult<RoleName> {
    balancer()?.current_connection_name()
}

/// 便捷函数 - 断开所有连接并销毁全局均衡器
pub async fn disconnect_all() -> MultiDbResult<()> {
    let taken = {
        let _init = INIT_LOCK.lock();
        GLOBAL_BALANCER.swap(None)
    };

    match taken {
        Some(balancer) => balancer.disconnect_all().await,
        None => Ok(()),
    }
}
