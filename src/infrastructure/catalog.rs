//! 已安装版本目录
//!
//! 每次调用都重新检查文件系统，不做缓存：一个版本 "存在" 当且仅当
//! 其目录和入口二进制在解析时都存在。

use std::path::{Path, PathBuf};

use crate::core::constants::version::MARKER_PREFIX;
use crate::core::version::{compare_names, InstalledVersion, VersionToken};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Profile;
use crate::utils::{FileSystemUtils, PathUtils};

pub struct VersionCatalog<'a> {
    root: PathBuf,
    profile: &'a Profile,
}

impl<'a> VersionCatalog<'a> {
    pub fn new(root: impl Into<PathBuf>, profile: &'a Profile) -> Self {
        Self {
            root: root.into(),
            profile,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 校验安装用的入口二进制：Unix 为 `bin/node`，Windows 为根目录下的 `node.exe`
    pub fn entry_binary(&self, version_root: &Path) -> PathBuf {
        if cfg!(target_os = "windows") {
            version_root.join(PathUtils::executable_name(&self.profile.runtime))
        } else {
            version_root.join("bin").join(&self.profile.runtime)
        }
    }

    pub fn is_installation(&self, version_root: &Path) -> bool {
        self.entry_binary(version_root).is_file()
    }

    /// 将令牌解析为已安装目录
    ///
    /// 先按原样、加前缀、去前缀三种形式精确匹配目录名；否则扫描所有目录，
    /// 取去前缀后与令牌相等或以 `令牌.` 开头的目录中版本最高者。
    pub fn resolve_installed(&self, token: &VersionToken) -> AppResult<InstalledVersion> {
        let stripped = token.stripped();
        let candidates = [
            token.as_str().to_string(),
            format!("{MARKER_PREFIX}{stripped}"),
            stripped.to_string(),
        ];

        for name in candidates.iter().filter(|name| !name.is_empty()) {
            let dir = self.root.join(name);
            if dir.is_dir() {
                tracing::debug!("exact match for {}: {}", token, dir.display());
                return Ok(InstalledVersion::new(name.clone(), dir));
            }
        }

        let dirs = FileSystemUtils::subdirectories(&self.root).map_err(|e| {
            tracing::debug!("cannot enumerate {}: {}", self.root.display(), e);
            self.no_match(token)
        })?;

        let prefix = format!("{stripped}.");
        dirs.into_iter()
            .filter_map(|dir| {
                let name = dir.file_name()?.to_string_lossy().into_owned();
                let bare = name.strip_prefix(MARKER_PREFIX).unwrap_or(&name);
                (bare == stripped || bare.starts_with(&prefix)).then(|| InstalledVersion::new(name, dir))
            })
            .max_by(|a, b| compare_names(&a.name, &b.name))
            .inspect(|found| tracing::debug!("prefix match for {}: {}", token, found.name))
            .ok_or_else(|| self.no_match(token))
    }

    /// 所有通过校验的已安装版本，最高版本在前
    pub fn list_installed(&self) -> Vec<InstalledVersion> {
        let mut versions: Vec<InstalledVersion> = FileSystemUtils::subdirectories(&self.root)
            .unwrap_or_default()
            .into_iter()
            .filter(|dir| self.is_installation(dir))
            .filter_map(|dir| {
                let name = dir.file_name()?.to_string_lossy().into_owned();
                Some(InstalledVersion::new(name, dir))
            })
            .collect();

        versions.sort_by(|a, b| compare_names(&b.name, &a.name));
        versions
    }

    /// 引导时的最佳可用版本：优先稳定通道（偶数主版本）中的最高版本，
    /// 没有稳定通道版本时取任意最高版本
    pub fn best_available(&self) -> AppResult<InstalledVersion> {
        let installed = self.list_installed();

        let stable = installed
            .iter()
            .filter(|v| v.version().is_some_and(|parsed| parsed.is_stable_channel()))
            .max_by(|a, b| compare_names(&a.name, &b.name));

        stable
            .or_else(|| installed.iter().max_by(|a, b| compare_names(&a.name, &b.name)))
            .cloned()
            .ok_or_else(|| AppError::NoInstalledVersions {
                installed_dir: self.root.clone(),
            })
    }

    /// 未匹配时给出精确匹配所需的入口二进制路径
    fn no_match(&self, token: &VersionToken) -> AppError {
        AppError::no_match(token.as_str(), self.entry_binary(&self.root.join(token.stripped())))
    }
}
