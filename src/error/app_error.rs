use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 没有任何项目配置文件，也没有全局默认版本
    #[error("no Node version configured")]
    NotConfigured,

    /// expected 为精确匹配时应当存在的入口二进制
    #[error("no installed version matching {version}")]
    NoMatch { version: String, expected: PathBuf },

    #[error("binary not found: {}", path.display())]
    BinaryNotFound { version: String, path: PathBuf },

    /// 非核心命令在当前版本和默认版本中都不存在
    #[error("'{command}' not found")]
    CommandNotFound { command: String },

    /// 仅在所有回退都失败后才会展示
    #[error("system {command} not found")]
    SystemBinaryAbsent { command: String },

    #[error("no Node versions installed and no system Node found in PATH")]
    NoInstalledVersions { installed_dir: PathBuf },

    #[error("failed to exec {}: {source}", path.display())]
    DispatchStart {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to determine the nvu home directory")]
    HomeUnavailable,

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },
}

/// 修复建议：一行标题加编号步骤
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remediation {
    pub header: String,
    pub steps: Vec<String>,
}

impl Remediation {
    fn new(header: impl Into<String>, steps: &[String]) -> Self {
        Self {
            header: header.into(),
            steps: steps.to_vec(),
        }
    }
}

/// 应用程序 Result 类型
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 配置相关的错误附带具体的修复步骤，tool 为当前的工具命令名
    pub fn remediation(&self, tool: &str) -> Option<Remediation> {
        match self {
            AppError::NotConfigured => Some(Remediation::new(
                "To fix this, either:",
                &[
                    "Create a .nvmrc file with a version: echo 20 > .nvmrc".to_string(),
                    format!("Set a global default: {tool} default 20"),
                ],
            )),
            AppError::NoMatch { version, expected } => Some(Remediation::new(
                format!("Node {version} may not be installed."),
                &[format!(
                    "Install Node {version} so that {} exists",
                    expected.display()
                )],
            )),
            AppError::BinaryNotFound { version, path } => Some(Remediation::new(
                format!("Node {version} may be incomplete."),
                &[format!(
                    "Reinstall Node {version} so that {} exists",
                    path.display()
                )],
            )),
            AppError::NoInstalledVersions { installed_dir } => Some(Remediation::new(
                format!("To bootstrap {tool}:"),
                &[
                    "Install Node.js from https://nodejs.org".to_string(),
                    format!(
                        "Or unpack a release into {}",
                        installed_dir.join("<version>").display()
                    ),
                ],
            )),
            AppError::HomeUnavailable => Some(Remediation::new(
                "To fix this:",
                &[format!(
                    "Set {} to a writable directory",
                    crate::core::constants::env::HOME_OVERRIDE
                )],
            )),
            _ => None,
        }
    }

    /// 获取用户友好的错误消息（写入标准错误流）
    pub fn user_message(&self, tool: &str) -> String {
        let mut msg = format!("{tool} error: {self}\n");

        if let Some(remediation) = self.remediation(tool) {
            msg.push('\n');
            msg.push_str(&remediation.header);
            msg.push('\n');
            if remediation.steps.len() == 1 {
                msg.push_str(&format!("  {}\n", remediation.steps[0]));
            } else {
                for (index, step) in remediation.steps.iter().enumerate() {
                    msg.push_str(&format!("  {}. {}\n", index + 1, step));
                }
            }
        }

        msg
    }
}

/// 便捷的错误创建函数
impl AppError {
    pub fn no_match(version: &str, expected: PathBuf) -> Self {
        Self::NoMatch {
            version: version.to_string(),
            expected,
        }
    }

    pub fn system_absent(command: &str) -> Self {
        Self::SystemBinaryAbsent {
            command: command.to_string(),
        }
    }

    pub fn command_not_found(command: &str) -> Self {
        Self::CommandNotFound {
            command: command.to_string(),
        }
    }

    pub fn config_load_failed(path: &std::path::Path, reason: &str) -> Self {
        Self::Config {
            message: format!("cannot load {}: {}", path.display(), reason),
        }
    }

    pub fn invalid_version(reason: &str) -> Self {
        Self::Validation {
            field: "version".to_string(),
            reason: reason.to_string(),
        }
    }
}
