//! 错误类型定义模块
//!
//! 统一的错误类型，错误消息通过 i18n 模块进行多语言渲染

use thiserror::Error;

/// rat_multidb 错误类型
#[derive(Error, Debug)]
pub enum MultiDbError {
    /// 适配器驱动不可用
    #[error("{}", crate::i18n::tf("error.adapter_load", &[("adapter", .adapter.as_str()), ("message", .message.as_str())]))]
    AdapterLoad { adapter: String, message: String },

    /// 角色未注册（且未启用回退）
    #[error("{}", crate::i18n::tf("error.unknown_role", &[("role", .role.as_str())]))]
    UnknownRole { role: String },

    /// 作用域外访问当前连接，但没有配置默认连接池
    #[error("{}", crate::i18n::t("error.no_default"))]
    NoDefaultConfigured,

    /// 连接池错误（原样透传）
    #[error("{}", crate::i18n::tf("error.pool", &[("message", .message.as_str())]))]
    PoolError { message: String },

    /// 连接错误（原样透传）
    #[error("{}", crate::i18n::tf("error.connection", &[("message", .message.as_str())]))]
    ConnectionError { message: String },

    /// 配置错误
    #[error("{}", crate::i18n::tf("error.config", &[("message", .message.as_str())]))]
    ConfigError { message: String },

    /// 序列化错误
    #[error("{}", crate::i18n::tf("error.serialization", &[("message", .message.as_str())]))]
    SerializationError { message: String },

    /// IO 错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 结果类型别名
pub type MultiDbResult<T> = Result<T, MultiDbError>;

impl MultiDbError {
    /// 是否为角色未找到错误
    pub fn is_unknown_role(&self) -> bool {
        matches!(self, MultiDbError::UnknownRole { .. })
    }
}

impl From<serde_json::Error> for MultiDbError {
    fn from(e: serde_json::Error) -> Self {
        MultiDbError::SerializationError {
            message: e.to_string(),
        }
    }
}

/// 快速构造错误
///
/// ```ignore
/// multidb_error!(unknown_role, "reporting");
/// multidb_error!(config, "缺少适配器");
/// ```
#[macro_export]
macro_rules! multidb_error {
    (adapter_load, $adapter:expr, $message:expr) => {
        $crate::error::MultiDbError::AdapterLoad {
            adapter: $adapter.to_string(),
            message: $message.to_string(),
        }
    };
    (unknown_role, $role:expr) => {
        $crate::error::MultiDbError::UnknownRole {
            role: $role.to_string(),
        }
    };
    (no_default) => {
        $crate::error::MultiDbError::NoDefaultConfigured
    };
    (pool, $message:expr) => {
        $crate::error::MultiDbError::PoolError {
            message: $message.to_string(),
        }
    };
    (connection, $message:expr) => {
        $crate::error::MultiDbError::ConnectionError {
            message: $message.to_string(),
        }
    };
    (config, $message:expr) => {
        $crate::error::MultiDbError::ConfigError {
            message: $message.to_string(),
        }
    };
    (serialization, $message:expr) => {
        $crate::error::MultiDbError::SerializationError {
            message: $message.to_string(),
        }
    };
}
