use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::utils::EnvSnapshot;

/// 同步执行外部程序的能力
///
/// 包装包管理器时只依赖这个 trait，测试中可以用假实现替代真实的 npm。
pub trait CommandRunner {
    /// 继承标准流运行程序并等待结束；被信号终止时返回 `Ok(None)`
    fn run(&self, program: &Path, args: &[OsString], env: &EnvSnapshot) -> io::Result<Option<i32>>;

    /// 运行程序并捕获标准输出
    fn capture(&self, program: &Path, args: &[OsString], env: &EnvSnapshot) -> io::Result<String>;
}

/// 基于 `std::process::Command` 的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(program: &Path, args: &[OsString], env: &EnvSnapshot) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).env_clear().envs(env.iter());
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString], env: &EnvSnapshot) -> io::Result<Option<i32>> {
        let status = Self::command(program, args, env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.code())
    }

    fn capture(&self, program: &Path, args: &[OsString], env: &EnvSnapshot) -> io::Result<String> {
        let output = Self::command(program, args, env)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;

        if !output.status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}", program.display(), output.status),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
