use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::core::constants::env::PATH;
use crate::utils::paths::PathUtils;

/// 进程环境变量的快照
///
/// 在入口处捕获一次，之后显式传递给各组件；任何组件都不直接读取
/// 或修改 `std::env`。覆盖只作用于传给子进程的副本。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: Vec<(OsString, OsString)>,
}

/// Windows 上环境变量名大小写不敏感
fn key_matches(key: &OsStr, name: &str) -> bool {
    if cfg!(target_os = "windows") {
        key.eq_ignore_ascii_case(name)
    } else {
        key == name
    }
}

impl EnvSnapshot {
    /// 捕获当前进程的环境变量
    pub fn capture() -> Self {
        Self {
            vars: env::vars_os().collect(),
        }
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 获取变量值，同名时最后一个生效
    pub fn get(&self, name: &str) -> Option<&OsStr> {
        self.vars
            .iter()
            .rev()
            .find(|(key, _)| key_matches(key, name))
            .map(|(_, value)| value.as_os_str())
    }

    /// 获取非空变量值
    pub fn get_non_empty(&self, name: &str) -> Option<&OsStr> {
        self.get(name).filter(|value| !value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// 搜索路径的所有条目，保持原有顺序
    pub fn path_entries(&self) -> Vec<PathBuf> {
        self.get(PATH)
            .map(|value| env::split_paths(value).collect())
            .unwrap_or_default()
    }

    /// 应用覆盖：每个覆盖项先移除同名变量（大小写不敏感），再追加新值
    pub fn with_overrides<K, V>(&self, overrides: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<OsStr>,
    {
        let mut vars = self.vars.clone();
        for (name, value) in overrides {
            let name = name.as_ref();
            vars.retain(|(key, _)| key != name && !key.eq_ignore_ascii_case(name));
            vars.push((OsString::from(name), value.as_ref().to_os_string()));
        }
        Self { vars }
    }

    /// 去掉指定目录后的搜索路径，用于引导到系统运行时时避免子进程重新进入分发器
    pub fn path_without(&self, excluded: &Path) -> OsString {
        let kept: Vec<PathBuf> = self
            .path_entries()
            .into_iter()
            .filter(|entry| !entry.as_os_str().is_empty())
            .filter(|entry| !PathUtils::same_location(entry, excluded))
            .collect();

        env::join_paths(kept).unwrap_or_default()
    }
}
