//! 应用程序常量定义
//!
//! 本模块包含全局使用的常量，避免魔数并提供统一的默认值。
//! 与命令名相关的默认值会被 [`Profile`](crate::infrastructure::config::Profile) 引用，
//! 可通过 `<home>/config.toml` 覆盖。

/// 环境变量相关常量
pub mod env {
    /// 覆盖 home 根目录
    pub const HOME_OVERRIDE: &str = "NVU_HOME";
    /// 日志过滤器
    pub const LOG_FILTER: &str = "NVU_LOG";
    /// 搜索路径
    pub const PATH: &str = "PATH";
    /// 包管理器的安装前缀变量
    pub const INSTALL_PREFIX: &str = "npm_config_prefix";
}

/// home 目录布局
pub mod layout {
    /// 未设置 NVU_HOME 时，位于用户目录下的默认目录名
    pub const DEFAULT_HOME_DIR: &str = ".nvu";
    /// 已安装版本根目录
    pub const INSTALLED_DIR: &str = "installed";
    /// shim 代理文件目录
    pub const SHIM_BIN_DIR: &str = "bin";
    /// 全局默认版本文件
    pub const DEFAULT_FILE: &str = "default";
    /// 可选的 profile 覆盖文件
    pub const PROFILE_FILE: &str = "config.toml";
}

/// 版本信息常量
pub mod version {
    /// 应用程序名称
    pub const APP_NAME: &str = "nvu";
    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    /// 版本前缀标记
    pub const MARKER_PREFIX: &str = "v";
    /// 表示使用系统安装副本的哨兵值
    pub const SYSTEM_SENTINEL: &str = "system";
}

/// 默认的命令配置
pub mod defaults {
    pub const TOOL_RC: &str = ".nvurc";
    pub const COMPAT_RC: &str = ".nvmrc";
    pub const RUNTIME: &str = "node";
    pub const PACKAGE_MANAGER: &str = "npm";
    /// 始终存在于每个 Node 安装中的命令
    pub const CORE_COMMANDS: &[&str] = &["node", "npm", "npx"];
    /// 永远不会被 shim 机制创建或删除的名称
    pub const PROTECTED_NAMES: &[&str] = &["node", "npm", "npx", "corepack"];
    /// 参数中出现这些子串时视为在运行 nvu 自身的管理脚本
    pub const MANAGEMENT_MARKERS: &[&str] = &["node-version-use"];
    pub const MANAGEMENT_SCRIPTS: &[&str] = &["nvu", "nvu.js"];
}

/// 包管理器参数
pub mod package_manager {
    pub const GLOBAL_FLAGS: &[&str] = &["-g", "--global"];
    pub const INSTALL_VERBS: &[&str] = &["install", "i", "add"];
    pub const UNINSTALL_VERBS: &[&str] = &["uninstall", "remove", "rm", "r", "un", "unlink"];
    /// 查询全局前缀: `npm prefix -g`
    pub const PREFIX_QUERY: &[&str] = &["prefix", "-g"];
}

/// 退出码
pub mod exit {
    /// 任何子进程启动前的解析/查找失败
    pub const FAILURE: i32 = 1;
}

/// 日志相关常量
pub mod log {
    /// 默认日志级别
    pub const DEFAULT_LOG_LEVEL: &str = "warn";
}

/// Windows 上可执行类文件扩展名
pub const EXECUTABLE_EXTENSIONS: &[&str] = &["exe", "cmd", "bat"];

/// 正则表达式模式
pub mod patterns {
    /// 版本目录名：可选的 v 前缀，最多三段数字，允许后缀
    pub const VERSION_PATTERN: &str = r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-+].*)?$";
}
