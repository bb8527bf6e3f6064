use serde::{Deserialize, Serialize};
use std::fmt;

/// 规范化后的数据库角色名
///
/// 去除首尾空白并将ASCII字母转为小写，`"Reporting"`、`" reporting "`
/// 与 `"reporting"` 指向同一个角色
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// 默认角色名
    pub const DEFAULT: &'static str = "default";

    /// 创建并规范化角色名
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// 默认角色
    pub fn default_role() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// 是否为默认角色
    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RoleName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&RoleName> for RoleName {
    fn from(name: &RoleName) -> Self {
        name.clone()
    }
}

impl From<RoleName> for String {
    fn from(name: RoleName) -> Self {
        name.0
    }
}

impl PartialEq<str> for RoleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RoleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_name_normalization() {
        assert_eq!(RoleName::new(" Reporting "), RoleName::new("reporting"));
        assert_eq!(RoleName::from("ANALYTICS"), "analytics");
        assert!(RoleName::new("Default").is_default());
        assert!(!RoleName::new("replica").is_default());
    }

    #[test]
    fn test_role_name_serde() {
        let role: RoleName = serde_json::from_str("\"Reporting\"").unwrap();
        assert_eq!(role.as_str(), "reporting");
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"reporting\"");
    }
}
