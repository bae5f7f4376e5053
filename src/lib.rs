// 核心模块
pub mod cli;
pub mod core;
pub mod error;
pub mod infrastructure;
pub mod utils;

// 重新导出常用类型
pub use crate::cli::{Cli, CommandHandler, Commands};
pub use crate::core::{
    DispatchContext, DispatchStrategy, HomeLayout, InstalledVersion, Invocation, NodeVersion,
    Plan, ProcessDispatcher, ResolvedCommand, Router, VersionResolver, VersionToken,
};
pub use crate::error::{AppError, AppResult};
pub use crate::infrastructure::{
    BinaryLocator, CommandRunner, ConfigSource, ConfigStore, Mutation, Profile, ShimReconciler,
    SystemRunner, VersionCatalog,
};
pub use crate::utils::EnvSnapshot;
// 使用命名空间导入常量，避免冲突
pub use crate::core::constants as app_constants;
