//! 维护操作相关方法

use rat_logger::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

use super::Balancer;
use crate::pool::{ConnectionLease, PoolStatus};
use crate::types::RoleName;

/// 健康检查中单次借出连接的最长等待时间
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

impl Balancer {
    /// 所有已注册角色
    pub fn roles(&self) -> Vec<RoleName> {
        self.registry.roles()
    }

    /// 各角色连接池的状态快照 (角色 -> 每个副本的状态)
    pub fn pools_status(&self) -> BTreeMap<String, Vec<PoolStatus>> {
        let mut pools_status = BTreeMap::new();

        for role in self.registry.roles() {
            let statuses = self
                .registry
                .candidates(&role)
                .unwrap_or_default()
                .iter()
                .map(|candidate| candidate.pool().status())
                .collect();
            pools_status.insert(role.to_string(), statuses);
        }

        info!("连接池状态收集完成，共 {} 个角色", pools_status.len());
        pools_status
    }

    /// 检查连接池健康状态 (角色 -> 每个副本是否可借出连接)
    ///
    /// 每次借出最多等待 [`HEALTH_CHECK_TIMEOUT`]。只做报告，不影响候选选择
    pub async fn health_check(&self) -> BTreeMap<String, Vec<bool>> {
        self.health_check_with_timeout(HEALTH_CHECK_TIMEOUT).await
    }

    /// 使用指定的借出等待时间检查连接池健康状态
    ///
    /// 超时视为不健康。均衡器已持有默认连接时，默认候选连接池直接视为健康
    pub async fn health_check_with_timeout(&self, timeout: Duration) -> BTreeMap<String, Vec<bool>> {
        let mut health_status = BTreeMap::new();

        for role in self.registry.roles() {
            let mut results = Vec::new();
            for candidate in self.registry.candidates(&role).unwrap_or_default() {
                if self.held_default_connection(&candidate).await.is_some() {
                    results.push(true);
                    continue;
                }

                // 借出后立即归还
                let acquire = ConnectionLease::acquire(candidate.pool().clone());
                let healthy = match tokio::time::timeout(timeout, acquire).await {
                    Ok(Ok(_lease)) => true,
                    Ok(Err(e)) => {
                        warn!("连接池 {} 健康检查失败: {}", role, e);
                        false
                    }
                    Err(_) => {
                        warn!("连接池 {} 健康检查超时: {:?}", role, timeout);
                        false
                    }
                };
                results.push(healthy);
            }
            debug!("角色 {} 健康检查完成: {:?}", role, results);
            health_status.insert(role.to_string(), results);
        }

        health_status
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::AdapterRegistry;
    use crate::balancer::Balancer;
    use crate::config::{Configuration, MultiDbConfig};
    use crate::types::CandidateConfig;
    use std::time::Duration;

    fn balancer() -> Balancer {
        let raw = MultiDbConfig::builder()
            .default_database(CandidateConfig::new("memory").param("pool", 2))
            .replicas(
                "analytics",
                vec![CandidateConfig::default(), CandidateConfig::default().query_cache(true)],
            )
            .build()
            .unwrap();
        Balancer::with_adapters(Configuration::from_raw(raw), AdapterRegistry::with_builtin()).unwrap()
    }

    #[test]
    fn test_pools_status() {
        let balancer = balancer();
        let status = balancer.pools_status();
        assert_eq!(status["analytics"].len(), 2);
        assert_eq!(status["analytics"][0].max_connections, 2);
        assert_eq!(status["default"].len(), 1);
        assert!(serde_json::to_value(&status).is_ok());
    }

    #[tokio::test]
    async fn test_health_check() {
        let balancer = balancer();
        let health = balancer.health_check().await;
        assert_eq!(health["analytics"], vec![true, true]);
        assert_eq!(health["default"], vec![true]);
        assert_eq!(balancer.roles().len(), 2);
    }

    #[tokio::test]
    async fn test_health_check_times_out_on_exhausted_pool() {
        let raw = MultiDbConfig::builder()
            .database("reporting", CandidateConfig::new("memory").param("pool", 1))
            .build()
            .unwrap();
        let balancer = Balancer::with_adapters(Configuration::from_raw(raw), AdapterRegistry::with_builtin()).unwrap();

        let candidate = balancer.get("reporting").unwrap();
        let held = candidate.connection().await.unwrap();

        let health = balancer.health_check_with_timeout(Duration::from_millis(50)).await;
        assert_eq!(health["reporting"], vec![false]);

        candidate.pool().release_connection(held);
        let health = balancer.health_check_with_timeout(Duration::from_millis(50)).await;
        assert_eq!(health["reporting"], vec![true]);
    }
}
