//! # 配置管理模块 - 核心配置类型
//!
//! 多数据库配置的数据结构，支持从 TOML/JSON 文件加载

use crate::balancer::PoolSource;
use crate::error::{MultiDbError, MultiDbResult};
use crate::pool::ConnectionPool;
use crate::types::*;
use rat_logger::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// 环境类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// 开发环境
    Development,
    /// 测试环境
    Testing,
    /// 预发布环境
    Staging,
    /// 生产环境
    Production,
}

impl Environment {
    /// 该环境下未显式配置 `fallback` 时是否回退到默认角色
    pub fn fallback_by_default(&self) -> bool {
        matches!(self, Environment::Development | Environment::Testing)
    }
}

/// 多数据库原始配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiDbConfig {
    /// 角色配置映射 (角色 -> 单个配置或配置列表)
    #[serde(default)]
    pub databases: BTreeMap<String, RoleTargets>,
    /// 未知角色是否回退到默认角色
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    /// 运行环境
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    /// 默认数据库配置，同时作为其他角色配置合并的底
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<CandidateConfig>,
}

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FileFormat::Toml => "TOML",
            FileFormat::Json => "JSON",
        }
    }
}

impl MultiDbConfig {
    /// 创建配置构建器
    pub fn builder() -> super::builders::MultiDbConfigBuilder {
        super::builders::MultiDbConfigBuilder::new()
    }

    /// 从配置文件加载配置
    ///
    /// 扩展名为 `.toml` 时按 TOML 解析，否则按 JSON 解析
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> MultiDbResult<Self> {
        let path = config_path.as_ref();
        let content = std::fs::read_to_string(path).map_err(MultiDbError::IoError)?;

        let format = FileFormat::of(path);
        let config: MultiDbConfig = match format {
            FileFormat::Toml => toml::from_str(&content).map_err(|e| parse_error(format, e))?,
            FileFormat::Json => serde_json::from_str(&content).map_err(|e| parse_error(format, e))?,
        };
        config.validate()?;

        info!("从文件加载配置: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, config_path: P) -> MultiDbResult<()> {
        let path = config_path.as_ref();
        let format = FileFormat::of(path);
        let content = match format {
            FileFormat::Toml => toml::to_string_pretty(self).map_err(|e| serialize_error(format, e))?,
            FileFormat::Json => serde_json::to_string_pretty(self).map_err(|e| serialize_error(format, e))?,
        };

        std::fs::write(path, content).map_err(MultiDbError::IoError)?;

        info!("保存配置到文件: {:?}", path);
        Ok(())
    }

    /// 校验每个角色至少有一个配置
    pub fn validate(&self) -> MultiDbResult<()> {
        for (role, targets) in &self.databases {
            if targets.configs().is_empty() {
                return Err(crate::multidb_error!(
                    config,
                    format!("角色 '{}' 的配置列表为空", role)
                ));
            }
        }
        Ok(())
    }

    /// 实际生效的回退策略
    ///
    /// 显式配置优先；否则开发与测试环境开启，其余关闭
    pub fn resolve_fallback(&self) -> bool {
        match (self.fallback, self.environment) {
            (Some(fallback), _) => fallback,
            (None, Some(environment)) => environment.fallback_by_default(),
            (None, None) => false,
        }
    }
}

fn parse_error(format: FileFormat, e: impl std::fmt::Display) -> MultiDbError {
    crate::multidb_error!(
        config,
        crate::i18n::tf(
            "error.config_parse",
            &[("format", format.name()), ("message", &e.to_string())],
        )
    )
}

fn serialize_error(format: FileFormat, e: impl std::fmt::Display) -> MultiDbError {
    crate::multidb_error!(
        serialization,
        crate::i18n::tf(
            "error.config_serialize",
            &[("format", format.name()), ("message", &e.to_string())],
        )
    )
}

/// 均衡器的完整输入
///
/// 原始配置之外，还包括默认连接池来源与默认适配器配置
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    /// 原始配置
    pub raw: MultiDbConfig,
    /// 默认连接池（已构建的连接池或配置）
    pub default_pool: Option<PoolSource>,
    /// 合并到每个非默认角色配置下的默认适配器配置
    pub default_adapter: CandidateConfig,
}

impl Configuration {
    /// 从原始配置派生，`default` 同时作为默认连接池和默认适配器配置
    pub fn from_raw(raw: MultiDbConfig) -> Self {
        let default_pool = raw.default.clone().map(PoolSource::Config);
        let default_adapter = raw.default.clone().unwrap_or_default();
        Self {
            raw,
            default_pool,
            default_adapter,
        }
    }

    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> MultiDbResult<Self> {
        Ok(Self::from_raw(MultiDbConfig::from_file(config_path)?))
    }

    /// 使用已构建的连接池作为默认连接池
    pub fn with_default_pool(mut self, pool: Arc<dyn ConnectionPool>) -> Self {
        self.default_pool = Some(PoolSource::Pool(pool));
        self
    }

    /// 替换默认适配器配置
    pub fn with_default_adapter(mut self, default_adapter: CandidateConfig) -> Self {
        self.default_adapter = default_adapter;
        self
    }
}

impl From<MultiDbConfig> for Configuration {
    fn from(raw: MultiDbConfig) -> Self {
        Self::from_raw(raw)
    }
}
