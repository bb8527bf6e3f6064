//! 当前连接上下文
//!
//! 记录“当前连接与角色”的环境绑定。绑定保存在 tokio 任务本地变量中，
//! 只对运行该作用域的任务可见；嵌套作用域遮蔽外层绑定，退出（含出错与
//! 取消）时外层绑定自动恢复。
//!
//! 需要在作用域外切换当前连接的任务，先用 [`root`] 建立任务级的根上下文。
//! 不在任何上下文内时没有可写入的绑定，[`install`] 返回错误。

use std::cell::RefCell;
use std::future::Future;

use crate::error::MultiDbResult;
use crate::pool::PooledConnection;
use crate::types::RoleName;

/// 上下文绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBinding {
    /// 当前连接
    pub connection: PooledConnection,
    /// 当前角色
    pub role: RoleName,
}

impl ActiveBinding {
    pub fn new(connection: PooledConnection, role: RoleName) -> Self {
        Self { connection, role }
    }
}

tokio::task_local! {
    static ACTIVE_CONTEXT: RefCell<Option<ActiveBinding>>;
}

/// 在 `binding` 生效的作用域内执行 `future`
///
/// `future` 结束或被丢弃后，外层绑定恢复可见
pub async fn scope<F: Future>(binding: ActiveBinding, future: F) -> F::Output {
    ACTIVE_CONTEXT.scope(RefCell::new(Some(binding)), future).await
}

/// 在空的根上下文中执行 `future`
///
/// 根上下文内可以用 [`install`] 切换当前连接，切换只对该任务可见，
/// `future` 结束后随之丢弃。通常包在任务入口处
pub async fn root<F: Future>(future: F) -> F::Output {
    ACTIVE_CONTEXT.scope(RefCell::new(None), future).await
}

/// 当前可见的绑定
pub fn current() -> Option<ActiveBinding> {
    ACTIVE_CONTEXT
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

/// 是否位于某个上下文（根上下文或作用域）内
pub fn in_scope() -> bool {
    ACTIVE_CONTEXT.try_with(|_| ()).is_ok()
}

/// 覆盖当前绑定，不保存旧值
///
/// 覆盖最内层上下文的绑定，该上下文退出时随之失效。不在任何上下文内
/// 时返回配置错误
pub fn install(binding: ActiveBinding) -> MultiDbResult<()> {
    replace(Some(binding))
}

/// 清除当前绑定，不在任何上下文内时什么也不做
pub fn clear() {
    let _ = replace(None);
}

fn replace(binding: Option<ActiveBinding>) -> MultiDbResult<()> {
    ACTIVE_CONTEXT
        .try_with(|cell| *cell.borrow_mut() = binding)
        .map_err(|_| crate::multidb_error!(config, crate::i18n::t("error.no_context")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(role: &str) -> ActiveBinding {
        let role = RoleName::new(role);
        ActiveBinding::new(PooledConnection::new(role.clone(), "memory"), role)
    }

    #[tokio::test]
    async fn test_nested_scopes_restore() {
        let outer = binding("default");
        let inner = binding("reporting");

        scope(outer.clone(), async {
            assert_eq!(current(), Some(outer.clone()));
            scope(inner.clone(), async {
                assert_eq!(current(), Some(inner.clone()));
            })
            .await;
            assert_eq!(current(), Some(outer.clone()));
        })
        .await;

        assert!(!in_scope());
    }

    #[tokio::test]
    async fn test_install_inside_scope_is_undone_on_exit() {
        let outer = binding("default");
        let switched = binding("analytics");

        scope(outer.clone(), async {
            scope(binding("reporting"), async {
                install(switched.clone()).unwrap();
                assert_eq!(current(), Some(switched.clone()));
            })
            .await;
            assert_eq!(current(), Some(outer.clone()));
        })
        .await;
    }

    #[test]
    fn test_install_outside_context_fails() {
        let (err, seen) = tokio_test::block_on(async {
            assert!(!in_scope());
            (install(binding("analytics")).unwrap_err(), current())
        });
        assert!(matches!(err, crate::MultiDbError::ConfigError { .. }));
        assert_eq!(seen, None);
        clear();
    }

    #[tokio::test]
    async fn test_root_switch_is_private_to_task() {
        let switched = binding("analytics");

        let seen_inside = root(async {
            assert_eq!(current(), None);
            install(switched.clone()).unwrap();
            // 其他任务看不到本任务的切换
            let other = tokio::spawn(async { current() }).await.unwrap();
            assert_eq!(other, None);
            current()
        })
        .await;

        assert_eq!(seen_inside, Some(switched));
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn test_scope_visible_only_to_its_task() {
        let inner = binding("reporting");
        scope(inner.clone(), async {
            let seen = tokio::spawn(async { current() }).await.unwrap();
            assert_eq!(seen, None);
            assert_eq!(current(), Some(inner.clone()));
        })
        .await;
    }
}
