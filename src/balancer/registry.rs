//! 角色注册表

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rat_logger::info;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::Candidate;
use crate::adapter::AdapterRegistry;
use crate::error::MultiDbResult;
use crate::types::{CandidateConfig, RoleName, RoleTargets};

/// 角色注册表 (角色 -> 候选连接池列表)
///
/// 出现的角色总是对应非空列表；只追加，不单独移除
#[derive(Debug, Default)]
pub struct Registry {
    candidates: DashMap<RoleName, Vec<Arc<Candidate>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加角色配置
    ///
    /// 每个配置以 `default_adapter` 为底合并后构建候选连接池。重复调用会
    /// 重复追加；中途失败时之前追加的候选保留
    pub fn append(
        &self,
        databases: &BTreeMap<String, RoleTargets>,
        default_adapter: &CandidateConfig,
        adapters: &AdapterRegistry,
    ) -> MultiDbResult<usize> {
        let mut appended = 0;
        for (role, targets) in databases {
            for config in targets.configs() {
                let merged = config.merged_over(default_adapter);
                let candidate = Candidate::from_config(role, &merged, adapters)?;
                self.push(Arc::new(candidate));
                appended += 1;
            }
        }
        Ok(appended)
    }

    /// 追加单个候选连接池
    pub fn push(&self, candidate: Arc<Candidate>) {
        let role = candidate.name().clone();
        let mut list = self.candidates.entry(role.clone()).or_default();
        list.push(candidate);
        info!("注册候选连接池: 角色={}, 副本数={}", role, list.len());
    }

    /// 角色不存在时注册候选列表
    pub fn insert_if_absent(&self, role: RoleName, candidates: Vec<Arc<Candidate>>) -> bool {
        if candidates.is_empty() {
            return false;
        }
        match self.candidates.entry(role) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(candidates);
                true
            }
        }
    }

    /// 角色的候选列表副本
    pub fn candidates(&self, role: &RoleName) -> Option<Vec<Arc<Candidate>>> {
        self.candidates.get(role).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, role: &RoleName) -> bool {
        self.candidates.contains_key(role)
    }

    /// 所有角色，按名称排序
    pub fn roles(&self) -> Vec<RoleName> {
        let mut roles: Vec<RoleName> = self.candidates.iter().map(|entry| entry.key().clone()).collect();
        roles.sort();
        roles
    }

    /// 所有候选连接池
    pub fn all(&self) -> Vec<Arc<Candidate>> {
        self.candidates
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// 角色数量
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
