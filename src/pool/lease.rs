//! 作用域连接租约

use std::sync::Arc;

use super::{ConnectionPool, PooledConnection};
use crate::error::MultiDbResult;

/// 连接租约
///
/// 持有期间连接归调用方使用，析构时归还连接池。正常返回、错误、
/// panic 展开以及 future 被取消都会经过 `Drop`
#[derive(Debug)]
pub struct ConnectionLease {
    pool: Arc<dyn ConnectionPool>,
    connection: PooledConnection,
    detached: bool,
}

impl ConnectionLease {
    /// 从连接池借出连接
    pub async fn acquire(pool: Arc<dyn ConnectionPool>) -> MultiDbResult<Self> {
        let connection = pool.acquire_connection().await?;
        Ok(Self {
            pool,
            connection,
            detached: false,
        })
    }

    pub fn connection(&self) -> &PooledConnection {
        &self.connection
    }

    /// 解除租约，连接所有权转交调用方，不再自动归还
    pub fn detach(mut self) -> PooledConnection {
        self.detached = true;
        self.connection.clone()
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if !self.detached {
            self.pool.release_connection(self.connection.clone());
        }
    }
}
