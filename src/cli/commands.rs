use clap::{Parser, Subcommand};
use std::ffi::OsString;

/// nvu 管理命令
#[derive(Parser, Debug)]
#[command(name = "nvu")]
#[command(about = "Node version dispatcher: per-project Node versions through shims", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 顶级命令
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show which Node binary would be used in the current directory
    Which {
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },
    /// List installed Node versions
    #[command(alias = "ls")]
    List {
        /// JSON 格式输出
        #[arg(long)]
        json: bool,
    },
    /// Show or pin the Node version of the current directory
    Local {
        /// 版本号，省略时显示当前目录的配置
        version: Option<String>,
        /// 写入 .nvurc 而不是 .nvmrc
        #[arg(long)]
        nvurc: bool,
    },
    /// Show or set the global default Node version
    Default {
        /// 版本号，省略时显示当前默认版本
        version: Option<String>,
    },
    /// Install the dispatcher into the shim directory
    Setup,
    /// Remove the core shims from the shim directory
    Teardown,
    /// Run the system copy of a command, bypassing version routing
    System {
        /// 命令名，例如 npm
        command: String,
        /// 原样转发的参数
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}
