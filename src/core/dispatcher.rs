use std::ffi::OsString;
use std::path::Path;
use std::process::{self, Command, Stdio};

use crate::core::constants::exit;
use crate::error::AppError;
use crate::utils::EnvSnapshot;

/// 进程分发策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStrategy {
    /// 用目标程序替换当前进程映像，退出码即目标的退出码
    ReplaceInPlace,
    /// 启动子进程并继承标准流，等待结束后以其退出码退出
    SpawnAndRelay,
}

impl DispatchStrategy {
    /// 按宿主平台能力选择
    pub fn for_host() -> Self {
        if cfg!(unix) {
            DispatchStrategy::ReplaceInPlace
        } else {
            DispatchStrategy::SpawnAndRelay
        }
    }
}

/// 进程分发器
///
/// `dispatch` 成功时不会返回：要么当前进程已被替换，要么已经以子进程的
/// 退出码结束。只有目标无法启动时才返回错误。
#[derive(Debug, Clone, Copy)]
pub struct ProcessDispatcher {
    strategy: DispatchStrategy,
}

impl ProcessDispatcher {
    pub fn new(strategy: DispatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn for_host() -> Self {
        Self::new(DispatchStrategy::for_host())
    }

    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }

    /// 组装目标命令：argv[0] 为目标路径，其余参数原样转发，环境完全由快照决定
    pub fn build_command(program: &Path, argv: &[OsString], env: &EnvSnapshot) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(argv.iter().skip(1))
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    pub fn dispatch(&self, program: &Path, argv: &[OsString], env: &EnvSnapshot) -> AppError {
        tracing::debug!("dispatching {} ({:?})", program.display(), self.strategy);
        let mut cmd = Self::build_command(program, argv, env);

        let source = match self.strategy {
            DispatchStrategy::ReplaceInPlace => Self::replace(&mut cmd),
            DispatchStrategy::SpawnAndRelay => match cmd.status() {
                Ok(status) => process::exit(status.code().unwrap_or(exit::FAILURE)),
                Err(e) => e,
            },
        };

        AppError::DispatchStart {
            path: program.to_path_buf(),
            source,
        }
    }

    #[cfg(unix)]
    fn replace(cmd: &mut Command) -> std::io::Error {
        use std::os::unix::process::CommandExt;
        cmd.exec()
    }

    #[cfg(not(unix))]
    fn replace(cmd: &mut Command) -> std::io::Error {
        match cmd.status() {
            Ok(status) => process::exit(status.code().unwrap_or(exit::FAILURE)),
            Err(e) => e,
        }
    }
}
