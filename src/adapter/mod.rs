//! 数据库适配器注册模块
//!
//! 适配器名称到连接池工厂的映射。配置中出现的 `adapter` 通过本模块
//! 解析为具体的连接池实现，找不到时返回 `AdapterLoad` 错误

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rat_logger::{error, info};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::MultiDbResult;
use crate::pool::{ConnectionPool, MemoryPool, PoolSpec};

/// 内置内存适配器名称
pub const MEMORY_ADAPTER: &str = "memory";

/// 连接池工厂
pub type PoolFactory =
    Arc<dyn Fn(&PoolSpec) -> MultiDbResult<Arc<dyn ConnectionPool>> + Send + Sync>;

/// 规范化适配器名称
///
/// 大小写不敏感，并合并常见别名
pub fn normalize_adapter_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        "postgresql" | "postgres" | "pg" => "postgresql".to_string(),
        "mongodb" | "mongo" => "mongodb".to_string(),
        "sqlite" | "sqlite3" => "sqlite".to_string(),
        "mysql" | "mysql2" => "mysql".to_string(),
        _ => name,
    }
}

/// 适配器注册表
#[derive(Clone)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, PoolFactory>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl AdapterRegistry {
    /// 空注册表
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// 包含内置适配器的注册表
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(MEMORY_ADAPTER, MemoryPool::factory);
        registry
    }

    /// 注册适配器，同名适配器会被替换
    pub fn register<S, F>(&mut self, name: S, factory: F)
    where
        S: AsRef<str>,
        F: Fn(&PoolSpec) -> MultiDbResult<Arc<dyn ConnectionPool>> + Send + Sync + 'static,
    {
        let name = normalize_adapter_name(name.as_ref());
        info!("注册数据库适配器: {}", name);
        self.factories.insert(name, Arc::new(factory));
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&normalize_adapter_name(name))
    }

    /// 已注册的适配器名称
    pub fn adapters(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// 根据规格创建连接池
    pub fn create_pool(&self, spec: &PoolSpec) -> MultiDbResult<Arc<dyn ConnectionPool>> {
        let name = normalize_adapter_name(&spec.adapter);
        let factory = self.factories.get(&name).ok_or_else(|| {
            error!("找不到数据库适配器: {} (角色={})", name, spec.role);
            crate::multidb_error!(
                adapter_load,
                name,
                format!("available adapters: {}", self.adapters().join(", "))
            )
        })?;
        factory(spec)
    }
}

/// 全局适配器注册表
static GLOBAL_ADAPTER_REGISTRY: Lazy<RwLock<AdapterRegistry>> =
    Lazy::new(|| RwLock::new(AdapterRegistry::with_builtin()));

/// 便捷函数 - 向全局注册表注册适配器
///
/// 需在构建均衡器之前调用
pub fn register_adapter<S, F>(name: S, factory: F)
where
    S: AsRef<str>,
    F: Fn(&PoolSpec) -> MultiDbResult<Arc<dyn ConnectionPool>> + Send + Sync + 'static,
{
    GLOBAL_ADAPTER_REGISTRY.write().register(name, factory);
}

/// 便捷函数 - 获取全局注册表的快照
pub fn global_adapter_registry() -> AdapterRegistry {
    GLOBAL_ADAPTER_REGISTRY.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CandidateConfig, RoleName};

    fn spec(adapter: &str) -> PoolSpec {
        PoolSpec::from_config(RoleName::new("reporting"), adapter, &CandidateConfig::new(adapter))
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_adapter_name("Postgres"), "postgresql");
        assert_eq!(normalize_adapter_name("pg"), "postgresql");
        assert_eq!(normalize_adapter_name("sqlite3"), "sqlite");
        assert_eq!(normalize_adapter_name(" MEMORY "), "memory");
    }

    #[test]
    fn test_builtin_memory_adapter() {
        let registry = AdapterRegistry::with_builtin();
        assert!(registry.contains("Memory"));
        let pool = registry.create_pool(&spec("memory")).unwrap();
        assert_eq!(pool.adapter(), "memory");
    }

    #[test]
    fn test_missing_adapter_fails_with_adapter_load() {
        let registry = AdapterRegistry::with_builtin();
        match registry.create_pool(&spec("oracle")) {
            Err(crate::MultiDbError::AdapterLoad { adapter, .. }) => assert_eq!(adapter, "oracle"),
            other => panic!("unexpected result: {:?}", other.map(|p| p.status())),
        }
    }

    #[test]
    fn test_register_alias_resolves() {
        let mut registry = AdapterRegistry::empty();
        registry.register("postgres", MemoryPool::factory);
        assert!(registry.contains("pg"));
        assert_eq!(registry.adapters(), vec!["postgresql".to_string()]);
        assert!(registry.create_pool(&spec("postgresql")).is_ok());
    }
}
