//! 版本令牌与版本号解析
//!
//! 版本比较采用结构化的数字比较（主、次、修订号），缺失的段视为 0。
//! 这与按目录名排序的旧行为在实际版本目录上等价，但不是完整的语义化
//! 版本比较器：预发布后缀只参与名称上的最终排序。

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::constants::patterns::VERSION_PATTERN;
use crate::core::constants::version::{MARKER_PREFIX, SYSTEM_SENTINEL};

/// 配置文件中的一个版本令牌（已去除首尾空白）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 去掉前缀标记后的令牌，匹配时以此为准
    pub fn stripped(&self) -> &str {
        self.0.strip_prefix(MARKER_PREFIX).unwrap_or(&self.0)
    }

    /// 是否为 "使用系统副本" 哨兵
    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_SENTINEL
    }

    /// 匹配等价：去掉标记后相等
    pub fn matches(&self, other: &str) -> bool {
        self.stripped() == other.strip_prefix(MARKER_PREFIX).unwrap_or(other)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 结构化的版本号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct NodeVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

fn version_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).ok()).as_ref()
}

impl NodeVersion {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = version_regex()?.captures(text.trim())?;
        let part = |index: usize| -> Option<u64> {
            match caps.get(index) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };

        Some(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }

    /// 稳定通道：偶数主版本；0.x 时看次版本号（0.8、0.10、0.12）
    pub fn is_stable_channel(&self) -> bool {
        if self.major == 0 {
            self.minor % 2 == 0
        } else {
            self.major % 2 == 0
        }
    }
}

impl fmt::Display for NodeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// 版本目录名的排序：先按解析出的版本号，无法解析的排在最前，名称兜底
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NodeVersion::parse(a)
        .cmp(&NodeVersion::parse(b))
        .then_with(|| a.cmp(b))
}

/// 已安装版本目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledVersion {
    /// 版本目录名，例如 `v20.19.6`
    pub name: String,
    pub root: PathBuf,
}

impl InstalledVersion {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn version(&self) -> Option<NodeVersion> {
        NodeVersion::parse(&self.name)
    }

    /// 包管理器写入全局可执行文件的目录：Unix 在 bin/ 下，Windows 在根目录
    pub fn global_bin_dir(&self) -> PathBuf {
        if cfg!(target_os = "windows") {
            self.root.clone()
        } else {
            self.root.join("bin")
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
