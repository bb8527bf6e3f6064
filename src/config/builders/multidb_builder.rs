//! # 多数据库配置构建器模块
//!
//! 提供多数据库配置的构建器实现，支持链式调用和严格验证

use crate::config::core::{Environment, MultiDbConfig};
use crate::error::MultiDbResult;
use crate::types::*;
use rat_logger::info;
use std::collections::BTreeMap;

/// 多数据库配置构建器
#[derive(Debug, Default)]
pub struct MultiDbConfigBuilder {
    databases: BTreeMap<String, RoleTargets>,
    fallback: Option<bool>,
    environment: Option<Environment>,
    default: Option<CandidateConfig>,
}

impl MultiDbConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 为角色追加一个连接池配置
    ///
    /// 同一角色多次调用时，配置依次追加为多个副本
    ///
    /// # 参数
    ///
    /// * `role` - 角色名
    /// * `config` - 连接池配置
    pub fn database<S: Into<String>>(mut self, role: S, config: CandidateConfig) -> Self {
        let role = role.into();
        let targets = match self.databases.remove(&role) {
            Some(existing) => existing.push(config),
            None => RoleTargets::One(config),
        };
        self.databases.insert(role, targets);
        self
    }

    /// 为角色追加多个副本配置
    ///
    /// # 参数
    ///
    /// * `role` - 角色名
    /// * `configs` - 副本配置列表
    pub fn replicas<S: Into<String>>(mut self, role: S, configs: Vec<CandidateConfig>) -> Self {
        let role = role.into();
        for config in configs {
            self = self.database(role.clone(), config);
        }
        self
    }

    /// 设置回退策略
    pub fn fallback(mut self, fallback: bool) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// 设置运行环境
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// 设置默认数据库配置
    pub fn default_database(mut self, config: CandidateConfig) -> Self {
        self.default = Some(config);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 角色配置列表为空时返回配置错误
    pub fn build(self) -> MultiDbResult<MultiDbConfig> {
        let config = MultiDbConfig {
            databases: self.databases,
            fallback: self.fallback,
            environment: self.environment,
            default: self.default,
        };
        config.validate()?;

        info!("多数据库配置构建完成: 角色数={}", config.databases.len());
        Ok(config)
    }
}
