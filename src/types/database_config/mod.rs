use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// 连接池大小参数名
pub const POOL_SIZE_KEY: &str = "pool";
/// 获取连接超时参数名（秒）
pub const CHECKOUT_TIMEOUT_KEY: &str = "checkout_timeout";
/// 未配置时的连接池大小
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// 单个候选连接池的配置
///
/// 除 `adapter` 与 `query_cache` 外的所有键都作为连接参数原样保留，
/// 交给适配器工厂解释
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// 适配器名称（如 "memory"、"postgresql"）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<String>,
    /// 在 `use_with` 作用域内是否开启查询缓存
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_cache: Option<bool>,
    /// 连接参数
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

impl CandidateConfig {
    /// 使用指定适配器创建配置
    pub fn new<S: Into<String>>(adapter: S) -> Self {
        Self {
            adapter: Some(adapter.into()),
            ..Default::default()
        }
    }

    /// 设置连接参数
    pub fn param<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// 设置查询缓存开关
    pub fn query_cache(mut self, enabled: bool) -> Self {
        self.query_cache = Some(enabled);
        self
    }

    /// 以 `base` 为底合并当前配置
    ///
    /// 当前配置中出现的键覆盖 `base`，未出现的键继承 `base`
    pub fn merged_over(&self, base: &CandidateConfig) -> CandidateConfig {
        let mut params = base.params.clone();
        params.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));

        CandidateConfig {
            adapter: self.adapter.clone().or_else(|| base.adapter.clone()),
            query_cache: self.query_cache.or(base.query_cache),
            params,
        }
    }

    /// 查询缓存是否开启（默认关闭）
    pub fn query_cache_enabled(&self) -> bool {
        self.query_cache.unwrap_or(false)
    }

    /// 读取无符号整数参数，兼容字符串写法
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        match self.params.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 连接池大小
    pub fn pool_size(&self) -> u32 {
        self.param_u64(POOL_SIZE_KEY)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// 获取连接的超时时间
    pub fn checkout_timeout(&self) -> Option<Duration> {
        self.param_u64(CHECKOUT_TIMEOUT_KEY).map(Duration::from_secs)
    }
}

/// 角色对应的配置：单个配置或配置列表
///
/// 在加载阶段通过 [`RoleTargets::into_configs`] 统一为列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleTargets {
    /// 多个副本
    Many(Vec<CandidateConfig>),
    /// 单个连接池
    One(CandidateConfig),
}

impl RoleTargets {
    /// 配置切片视图
    pub fn configs(&self) -> &[CandidateConfig] {
        match self {
            RoleTargets::Many(configs) => configs,
            RoleTargets::One(config) => std::slice::from_ref(config),
        }
    }

    /// 转换为配置列表
    pub fn into_configs(self) -> Vec<CandidateConfig> {
        match self {
            RoleTargets::Many(configs) => configs,
            RoleTargets::One(config) => vec![config],
        }
    }

    /// 追加一个配置，单个配置会升级为列表
    pub fn push(self, config: CandidateConfig) -> Self {
        let mut configs = self.into_configs();
        configs.push(config);
        RoleTargets::Many(configs)
    }
}

impl From<CandidateConfig> for RoleTargets {
    fn from(config: CandidateConfig) -> Self {
        RoleTargets::One(config)
    }
}

impl From<Vec<CandidateConfig>> for RoleTargets {
    fn from(configs: Vec<CandidateConfig>) -> Self {
        RoleTargets::Many(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overrides_and_inherits() {
        let base = CandidateConfig::new("memory")
            .param("host", "primary.db")
            .param("username", "app")
            .param(POOL_SIZE_KEY, 10);
        let replica = CandidateConfig::default()
            .param("host", "replica.db")
            .query_cache(true);

        let merged = replica.merged_over(&base);
        assert_eq!(merged.adapter.as_deref(), Some("memory"));
        assert_eq!(merged.params["host"], json!("replica.db"));
        assert_eq!(merged.params["username"], json!("app"));
        assert_eq!(merged.pool_size(), 10);
        assert!(merged.query_cache_enabled());
    }

    #[test]
    fn test_pool_params() {
        let config = CandidateConfig::new("memory")
            .param(POOL_SIZE_KEY, "3")
            .param(CHECKOUT_TIMEOUT_KEY, 2);
        assert_eq!(config.pool_size(), 3);
        assert_eq!(config.checkout_timeout(), Some(Duration::from_secs(2)));

        let zero = CandidateConfig::new("memory").param(POOL_SIZE_KEY, 0);
        assert_eq!(zero.pool_size(), DEFAULT_POOL_SIZE);
        assert_eq!(zero.checkout_timeout(), None);
    }

    #[test]
    fn test_role_targets_untagged() {
        let one: RoleTargets = serde_json::from_value(json!({"adapter": "memory", "host": "a"})).unwrap();
        assert_eq!(one.configs().len(), 1);
        assert_eq!(one.configs()[0].params["host"], json!("a"));

        let many: RoleTargets = serde_json::from_value(json!([
            {"adapter": "memory", "host": "b"},
            {"adapter": "memory", "host": "c", "query_cache": true}
        ]))
        .unwrap();
        let configs = many.into_configs();
        assert_eq!(configs.len(), 2);
        assert!(configs[1].query_cache_enabled());
        assert!(!configs[1].params.contains_key("query_cache"));
    }
}
