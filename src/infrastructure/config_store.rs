use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::context::HomeLayout;
use crate::core::version::VersionToken;
use crate::error::AppResult;
use crate::infrastructure::config::Profile;
use crate::utils::FileSystemUtils;

/// 版本令牌的来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    /// 项目目录（或其祖先目录）中的配置文件
    Project(PathBuf),
    /// home 下的全局默认文件
    GlobalDefault(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Project(path) | ConfigSource::GlobalDefault(path) => path,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Project(path) => write!(f, "{}", path.display()),
            ConfigSource::GlobalDefault(path) => {
                write!(f, "{} (global default)", path.display())
            }
        }
    }
}

/// 一个配置文件：路径加上去除空白后的版本令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub token: VersionToken,
}

/// 读写单行版本文件
pub struct ConfigStore<'a> {
    layout: &'a HomeLayout,
    profile: &'a Profile,
}

impl<'a> ConfigStore<'a> {
    pub fn new(layout: &'a HomeLayout, profile: &'a Profile) -> Self {
        Self { layout, profile }
    }

    /// 读取文件中的令牌，缺失、不可读或为空时返回 None
    pub fn read_token(path: &Path) -> Option<VersionToken> {
        FileSystemUtils::read_trimmed(path)
            .map(|content| VersionToken::new(&content))
            .filter(|token| !token.is_empty())
    }

    /// 从 start 开始向上查找项目配置，同一目录中工具专用文件优先
    pub fn find_project(&self, start: &Path) -> Option<ConfigFile> {
        for dir in start.ancestors() {
            if let Some(found) = self.read_local(dir) {
                tracing::debug!("project config found: {}", found.path.display());
                return Some(found);
            }
        }
        None
    }

    /// 只检查给定目录本身
    pub fn read_local(&self, dir: &Path) -> Option<ConfigFile> {
        [&self.profile.tool_rc, &self.profile.compat_rc]
            .into_iter()
            .find_map(|name| {
                let path = dir.join(name);
                Self::read_token(&path).map(|token| ConfigFile { path, token })
            })
    }

    /// 写入项目配置文件，返回写入的路径
    pub fn write_local(&self, dir: &Path, token: &VersionToken, tool_specific: bool) -> AppResult<PathBuf> {
        let name = if tool_specific {
            &self.profile.tool_rc
        } else {
            &self.profile.compat_rc
        };
        let path = dir.join(name);
        FileSystemUtils::write_line(&path, token.as_str())?;
        Ok(path)
    }

    pub fn read_default(&self) -> Option<ConfigFile> {
        let path = self.layout.default_file();
        Self::read_token(&path).map(|token| ConfigFile { path, token })
    }

    pub fn default_token(&self) -> Option<VersionToken> {
        self.read_default().map(|file| file.token)
    }

    /// 写入全局默认版本，必要时创建 home 目录
    pub fn write_default(&self, token: &VersionToken) -> AppResult<PathBuf> {
        let path = self.layout.default_file();
        FileSystemUtils::write_line(&path, token.as_str())?;
        Ok(path)
    }
}
