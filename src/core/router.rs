//! 入口路由：由调用名和项目配置决定最终执行什么
//!
//! 先生成一个 [`Plan`]，再执行它；生成计划的过程只读文件系统，
//! 测试中可以直接断言计划内容而不真正启动进程。

use std::ffi::OsString;
use std::path::PathBuf;

use crate::core::constants::{env::PATH, exit};
use crate::core::context::DispatchContext;
use crate::core::dispatcher::ProcessDispatcher;
use crate::core::resolver::{is_management_invocation, VersionResolver};
use crate::core::version::{InstalledVersion, VersionToken};
use crate::error::{AppError, AppResult};
use crate::infrastructure::catalog::VersionCatalog;
use crate::infrastructure::locator::BinaryLocator;
use crate::infrastructure::runner::CommandRunner;
use crate::infrastructure::shims::{Mutation, ShimReconciler};
use crate::utils::PathUtils;

/// 一次调用：逻辑命令名加完整参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub argv: Vec<OsString>,
}

impl Invocation {
    /// 命令名取 argv[0] 的文件名并去掉 `.exe`
    pub fn from_argv(argv: Vec<OsString>) -> Self {
        let command = argv
            .first()
            .map(|arg0| PathUtils::command_name(arg0))
            .unwrap_or_default();
        Self { command, argv }
    }

    /// 不含 argv[0] 的参数
    pub fn args(&self) -> &[OsString] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// 可以直接分发的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: PathBuf,
    pub argv: Vec<OsString>,
    /// 只作用于子进程环境的覆盖项
    pub env_overrides: Vec<(String, OsString)>,
}

/// 路由结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// 直接替换为目标程序
    Dispatch(ResolvedCommand),
    /// 包装一次全局安装/卸载
    Wrap {
        package_manager: PathBuf,
        argv: Vec<OsString>,
        mutation: Mutation,
        resolved: Option<InstalledVersion>,
    },
}

pub struct Router<'a> {
    ctx: &'a DispatchContext,
}

impl<'a> Router<'a> {
    pub fn new(ctx: &'a DispatchContext) -> Self {
        Self { ctx }
    }

    fn locator(&self) -> BinaryLocator<'a> {
        BinaryLocator::new(self.ctx)
    }

    fn catalog(&self) -> VersionCatalog<'a> {
        VersionCatalog::new(self.ctx.layout.installed_dir(), &self.ctx.profile)
    }

    pub fn plan(&self, inv: &Invocation) -> AppResult<Plan> {
        let resolver = VersionResolver::new(self.ctx);

        if is_management_invocation(&inv.argv, &self.ctx.profile) {
            tracing::debug!("management invocation, using bootstrap resolution");
            return match resolver.resolve_bootstrap() {
                Ok(installed) => self.plan_installed(inv, Ok(installed)),
                Err(AppError::NoInstalledVersions { .. }) => self.plan_bootstrap_system(inv),
                Err(e) => Err(e),
            };
        }

        let token = match resolver.resolve(&self.ctx.cwd) {
            Ok(resolved) => resolved.token,
            Err(AppError::NotConfigured) => {
                return self
                    .system_dispatch(inv)
                    .ok_or(AppError::NotConfigured);
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("{} resolved to {}", inv.command, token);

        if token.is_system() {
            return self
                .system_dispatch(inv)
                .ok_or_else(|| AppError::system_absent(&inv.command));
        }

        self.plan_token(inv, &token)
    }

    fn plan_token(&self, inv: &Invocation, token: &VersionToken) -> AppResult<Plan> {
        self.plan_installed(inv, self.catalog().resolve_installed(token))
    }

    /// 在选定版本中定位命令；非核心命令找不到时转到默认版本
    fn plan_installed(&self, inv: &Invocation, installed: AppResult<InstalledVersion>) -> AppResult<Plan> {
        let locator = self.locator();
        let located = installed.and_then(|installed| {
            locator
                .locate(&inv.command, &installed)
                .map(|program| (program, installed))
        });

        match located {
            Ok((program, installed)) => Ok(self.finish(inv, program, Some(installed))),
            Err(e) if self.ctx.profile.is_core(&inv.command) => Err(e),
            Err(e) => {
                tracing::debug!("{} not in resolved version ({}), trying default", inv.command, e);
                let program = locator
                    .route_to_default(&inv.command)
                    .map_err(|_| AppError::command_not_found(&inv.command))?;
                Ok(self.finish(inv, program, None))
            }
        }
    }

    fn finish(&self, inv: &Invocation, program: PathBuf, resolved: Option<InstalledVersion>) -> Plan {
        if self.ctx.profile.is_package_manager(&inv.command) {
            if let Some(mutation) = Mutation::detect(inv.args()) {
                return Plan::Wrap {
                    package_manager: program,
                    argv: inv.argv.clone(),
                    mutation,
                    resolved,
                };
            }
        }

        Plan::Dispatch(ResolvedCommand {
            program,
            argv: inv.argv.clone(),
            env_overrides: Vec::new(),
        })
    }

    fn system_dispatch(&self, inv: &Invocation) -> Option<Plan> {
        let program = self.locator().locate_system(&inv.command)?;
        Some(Plan::Dispatch(ResolvedCommand {
            program,
            argv: inv.argv.clone(),
            env_overrides: Vec::new(),
        }))
    }

    /// 没有任何已安装版本时用系统运行时引导，并把 shim 目录移出搜索路径，
    /// 避免子进程重新进入分发器
    fn plan_bootstrap_system(&self, inv: &Invocation) -> AppResult<Plan> {
        let program = self
            .locator()
            .locate_system(&self.ctx.profile.runtime)
            .ok_or_else(|| AppError::NoInstalledVersions {
                installed_dir: self.ctx.layout.installed_dir(),
            })?;
        let clean_path = self.ctx.env.path_without(&self.ctx.layout.shim_bin_dir());

        Ok(Plan::Dispatch(ResolvedCommand {
            program,
            argv: inv.argv.clone(),
            env_overrides: vec![(PATH.to_string(), clean_path)],
        }))
    }

    /// 执行计划，返回进程应当使用的退出码
    pub fn execute<R: CommandRunner + ?Sized>(
        &self,
        plan: Plan,
        dispatcher: &ProcessDispatcher,
        runner: &R,
    ) -> i32 {
        let result = match plan {
            Plan::Dispatch(command) => {
                let env = self.ctx.env.with_overrides(&command.env_overrides);
                Err(dispatcher.dispatch(&command.program, &command.argv, &env))
            }
            Plan::Wrap {
                package_manager,
                argv,
                mutation,
                resolved,
            } => ShimReconciler::new(self.ctx, runner).wrap_mutation(
                &package_manager,
                &argv,
                mutation,
                resolved.as_ref(),
            ),
        };

        match result {
            Ok(code) => code,
            Err(e) => {
                self.report(&e);
                exit::FAILURE
            }
        }
    }

    fn report(&self, e: &AppError) {
        eprint!("{}", e.user_message(&self.ctx.profile.tool_name));
    }

    pub fn run<R: CommandRunner + ?Sized>(
        &self,
        inv: &Invocation,
        dispatcher: &ProcessDispatcher,
        runner: &R,
    ) -> i32 {
        match self.plan(inv) {
            Ok(plan) => self.execute(plan, dispatcher, runner),
            Err(e) => {
                self.report(&e);
                exit::FAILURE
            }
        }
    }
}
