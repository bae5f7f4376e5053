use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::constants::{defaults, env, version};
use crate::error::{AppError, AppResult};

/// 命令配置：工具名、配置文件名、受保护名称等
///
/// 三种分发器变体（路由二进制、shim、管理脚本）共用这一份配置，
/// 所有字段都有默认值，`<home>/config.toml` 中只需写要覆盖的键。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub tool_name: String,
    /// 工具专用的项目配置文件名，同目录下优先于 compat_rc
    pub tool_rc: String,
    pub compat_rc: String,
    pub runtime: String,
    pub package_manager: String,
    pub core_commands: Vec<String>,
    pub protected_names: Vec<String>,
    pub install_prefix_var: String,
    pub management_markers: Vec<String>,
    pub management_scripts: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            tool_name: version::APP_NAME.to_string(),
            tool_rc: defaults::TOOL_RC.to_string(),
            compat_rc: defaults::COMPAT_RC.to_string(),
            runtime: defaults::RUNTIME.to_string(),
            package_manager: defaults::PACKAGE_MANAGER.to_string(),
            core_commands: owned(defaults::CORE_COMMANDS),
            protected_names: owned(defaults::PROTECTED_NAMES),
            install_prefix_var: env::INSTALL_PREFIX.to_string(),
            management_markers: owned(defaults::MANAGEMENT_MARKERS),
            management_scripts: owned(defaults::MANAGEMENT_SCRIPTS),
        }
    }
}

impl Profile {
    /// 从文件加载配置，文件不存在时使用默认配置
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config_load_failed(path, &e.to_string()))?;

        Self::from_toml(&content).map_err(|e| match e {
            AppError::Config { message } => AppError::config_load_failed(path, &message),
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config {
            message: e.to_string(),
        })
    }

    /// 核心命令总是存在于每个版本中，不会路由到默认版本
    pub fn is_core(&self, command: &str) -> bool {
        self.core_commands.iter().any(|c| c == command)
    }

    pub fn is_protected(&self, base_name: &str) -> bool {
        self.protected_names.iter().any(|p| p == base_name)
    }

    pub fn is_package_manager(&self, command: &str) -> bool {
        self.package_manager == command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let profile = Profile::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.tool_rc, ".nvurc");
        assert!(profile.is_protected("corepack"));
        assert!(!profile.is_core("corepack"));
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let profile = Profile::from_toml("compat_rc = \".node-version\"\n").unwrap();
        assert_eq!(profile.compat_rc, ".node-version");
        assert_eq!(profile.tool_rc, ".nvurc");
        assert_eq!(profile.package_manager, "npm");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "core_commands = 3").unwrap();

        let err = Profile::load(&path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
