use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::version::InstalledVersion;
use crate::error::AppResult;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// 安装状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    Installed,
    /// 目录存在但入口二进制缺失
    BinaryMissing,
    NotInstalled,
    System,
}

/// `which` 命令的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhichReport {
    pub version: String,
    pub source: String,
    pub binary: Option<PathBuf>,
    pub status: InstallStatus,
}

#[derive(Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    path: &'a Path,
    default: bool,
}

/// 输出格式化器
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_which(&self, report: &WhichReport, format: OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Text => {
                let mut output = format!("Version: {}\nSource: {}\n", report.version, report.source);
                if let Some(binary) = &report.binary {
                    output.push_str(&format!("Binary: {}\n", binary.display()));
                }
                let status = match report.status {
                    InstallStatus::Installed => "Installed".to_string(),
                    InstallStatus::BinaryMissing => "Directory exists but binary not found".to_string(),
                    InstallStatus::NotInstalled if report.binary.is_some() => {
                        format!("Not installed (install Node {} so that the binary above exists)", report.version)
                    }
                    InstallStatus::NotInstalled => "Not installed".to_string(),
                    InstallStatus::System => "System".to_string(),
                };
                output.push_str(&format!("Status: {status}\n"));
                Ok(output)
            }
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
        }
    }

    /// 格式化已安装版本列表，default 为默认版本对应的目录名，root 为已安装版本根目录
    pub fn format_list(
        &self,
        versions: &[InstalledVersion],
        default: Option<&str>,
        root: &Path,
        format: OutputFormat,
    ) -> AppResult<String> {
        match format {
            OutputFormat::Text => {
                if versions.is_empty() {
                    return Ok(format!(
                        "No Node versions installed.\nUnpack a release into {}\n",
                        root.join("<version>").display()
                    ));
                }

                let mut output = String::from("Installed Node versions:\n");
                for version in versions {
                    let marker = if default == Some(version.name.as_str()) {
                        " (default)"
                    } else {
                        ""
                    };
                    output.push_str(&format!("  {}{}\n", version.name, marker));
                }
                Ok(output)
            }
            OutputFormat::Json => {
                let entries: Vec<ListEntry> = versions
                    .iter()
                    .map(|version| ListEntry {
                        name: &version.name,
                        path: version.root(),
                        default: default == Some(version.name.as_str()),
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&entries)? + "\n")
            }
        }
    }
}

/// 全局格式化器实例
pub const FORMATTER: OutputFormatter = OutputFormatter;
