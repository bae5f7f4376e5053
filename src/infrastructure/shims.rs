//! shim 生命周期
//!
//! 包装一次全局安装/卸载：快照目标目录、委托给包管理器、再次快照并对比。
//! 快照只是参考，不加锁；包管理器运行期间其他进程对同一目录的修改不做防护。

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::core::constants::package_manager::{
    GLOBAL_FLAGS, INSTALL_VERBS, PREFIX_QUERY, UNINSTALL_VERBS,
};
use crate::core::constants::{exit, EXECUTABLE_EXTENSIONS};
use crate::core::context::DispatchContext;
use crate::core::version::InstalledVersion;
use crate::error::{AppError, AppResult};
use crate::infrastructure::catalog::VersionCatalog;
use crate::infrastructure::config_store::ConfigStore;
use crate::infrastructure::locator::BinaryLocator;
use crate::infrastructure::runner::CommandRunner;
use crate::utils::{FileSystemUtils, PathUtils};

/// 全局包变更的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Install,
    Uninstall,
}

impl Mutation {
    /// 从包管理器参数（不含 argv[0]）中识别全局安装或卸载
    pub fn detect<S: AsRef<OsStr>>(args: &[S]) -> Option<Self> {
        let has = |words: &[&str]| {
            args.iter()
                .any(|arg| words.iter().any(|word| arg.as_ref() == OsStr::new(word)))
        };

        if !has(GLOBAL_FLAGS) {
            return None;
        }
        if has(INSTALL_VERBS) {
            Some(Mutation::Install)
        } else if has(UNINSTALL_VERBS) {
            Some(Mutation::Uninstall)
        } else {
            None
        }
    }
}

/// 包管理器写入全局二进制的位置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalTarget {
    /// 需要快照的目录，无法确定时为 None（此时不做任何 shim 变更）
    pub bin_dir: Option<PathBuf>,
    /// 固定给包管理器的安装前缀；系统通道下为 None
    pub install_prefix: Option<PathBuf>,
}

impl GlobalTarget {
    fn managed(installed: &InstalledVersion) -> Self {
        Self {
            bin_dir: Some(installed.global_bin_dir()),
            install_prefix: Some(installed.root().to_path_buf()),
        }
    }
}

/// shim 对账的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

pub struct ShimReconciler<'a, R: CommandRunner + ?Sized> {
    ctx: &'a DispatchContext,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> ShimReconciler<'a, R> {
    pub fn new(ctx: &'a DispatchContext, runner: &'a R) -> Self {
        Self { ctx, runner }
    }

    /// shim 目录中某个命令对应的文件
    pub fn shim_path(&self, entry_name: &str) -> PathBuf {
        let shim_dir = self.ctx.layout.shim_bin_dir();
        if cfg!(target_os = "windows") {
            shim_dir.join(format!("{}.exe", PathUtils::base_name(entry_name)))
        } else {
            shim_dir.join(entry_name)
        }
    }

    /// 复制新 shim 时使用的模板：shim 目录中运行时自身的代理
    pub fn template_path(&self) -> PathBuf {
        self.ctx
            .layout
            .shim_bin_dir()
            .join(PathUtils::executable_name(&self.ctx.profile.runtime))
    }

    /// 计算目标目录
    ///
    /// 以全局默认版本为准；未设置默认版本时使用本次解析出的版本；默认为
    /// system 时询问系统包管理器的全局前缀。
    pub fn global_target(&self, resolved: Option<&InstalledVersion>) -> GlobalTarget {
        let store = ConfigStore::new(&self.ctx.layout, &self.ctx.profile);

        match store.default_token() {
            Some(token) if token.is_system() => GlobalTarget {
                bin_dir: self.system_global_bin(),
                install_prefix: None,
            },
            Some(token) => {
                let catalog =
                    VersionCatalog::new(self.ctx.layout.installed_dir(), &self.ctx.profile);
                match catalog.resolve_installed(&token) {
                    Ok(installed) => GlobalTarget::managed(&installed),
                    Err(e) => {
                        tracing::warn!("default version {} is unusable: {}", token, e);
                        GlobalTarget::default()
                    }
                }
            }
            None => resolved.map(GlobalTarget::managed).unwrap_or_default(),
        }
    }

    fn system_global_bin(&self) -> Option<PathBuf> {
        let package_manager = &self.ctx.profile.package_manager;
        let system_pm = BinaryLocator::new(self.ctx).locate_system(package_manager)?;
        let args: Vec<OsString> = PREFIX_QUERY.iter().map(OsString::from).collect();

        match self.runner.capture(&system_pm, &args, &self.ctx.env) {
            Ok(prefix) if !prefix.is_empty() => {
                let prefix = PathBuf::from(prefix);
                Some(if cfg!(target_os = "windows") {
                    prefix
                } else {
                    prefix.join("bin")
                })
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("cannot query global prefix of {}: {}", system_pm.display(), e);
                None
            }
        }
    }

    fn snapshot(dir: Option<&Path>) -> BTreeSet<String> {
        dir.map(FileSystemUtils::entry_names).unwrap_or_default()
    }

    /// 包装一次全局变更，返回应当使用的退出码
    ///
    /// 包管理器非零退出时原样返回其退出码，不做任何对账。
    pub fn wrap_mutation(
        &self,
        package_manager: &Path,
        argv: &[OsString],
        mutation: Mutation,
        resolved: Option<&InstalledVersion>,
    ) -> AppResult<i32> {
        let target = self.global_target(resolved);
        let before = Self::snapshot(target.bin_dir.as_deref());

        let env = match &target.install_prefix {
            Some(prefix) => self
                .ctx
                .env
                .with_overrides(&[(&self.ctx.profile.install_prefix_var, prefix)]),
            None => self.ctx.env.clone(),
        };

        let args = argv.get(1..).unwrap_or_default();
        let code = self
            .runner
            .run(package_manager, args, &env)
            .map_err(|source| AppError::DispatchStart {
                path: package_manager.to_path_buf(),
                source,
            })?
            .unwrap_or(exit::FAILURE);

        if code != 0 {
            tracing::debug!("package manager exited with {}, skipping shim reconciliation", code);
            return Ok(code);
        }

        let Some(bin_dir) = target.bin_dir.as_deref() else {
            return Ok(0);
        };
        let after = Self::snapshot(Some(bin_dir));

        let report = match mutation {
            Mutation::Install => self.create_shims(&after),
            Mutation::Uninstall => self.remove_shims(&before, &after),
        };
        tracing::debug!(
            "shims created: {}, removed: {}",
            report.created.len(),
            report.removed.len()
        );

        Ok(0)
    }

    fn is_shimmable(&self, entry_name: &str) -> bool {
        if self.ctx.profile.is_protected(PathUtils::base_name(entry_name)) {
            return false;
        }
        if cfg!(target_os = "windows") {
            return PathUtils::extension(entry_name)
                .is_some_and(|ext| EXECUTABLE_EXTENSIONS.contains(&ext.as_str()));
        }
        true
    }

    /// 为目录中每个尚无 shim 的非保护条目创建代理文件
    ///
    /// 单个 shim 失败只记录日志并继续，包变更本身已经完成。
    pub fn create_shims(&self, entries: &BTreeSet<String>) -> ReconcileReport {
        let template = self.template_path();
        let mut report = ReconcileReport::default();

        for name in entries.iter().filter(|name| self.is_shimmable(name)) {
            let shim = self.shim_path(name);
            if shim.exists() {
                continue;
            }

            match FileSystemUtils::copy_executable(&template, &shim) {
                Ok(()) => {
                    tracing::debug!("created shim {}", shim.display());
                    report.created.push(shim);
                }
                Err(e) => tracing::warn!("failed to create shim {}: {}", shim.display(), e),
            }
        }

        report
    }

    /// 删除卸载后消失的条目对应的 shim；shim 不存在不算错误
    pub fn remove_shims(&self, before: &BTreeSet<String>, after: &BTreeSet<String>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for name in before.difference(after) {
            if self.ctx.profile.is_protected(PathUtils::base_name(name)) {
                continue;
            }

            let shim = self.shim_path(name);
            match FileSystemUtils::remove_file(&shim) {
                Ok(true) => {
                    tracing::debug!("removed shim {}", shim.display());
                    report.removed.push(shim);
                }
                Ok(false) => {}
                Err(e) => tracing::warn!("failed to remove shim {}: {}", shim.display(), e),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::EnvSnapshot;
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use tempfile::TempDir;

    /// 记录调用的假运行器
    struct RecordingRunner {
        code: Option<i32>,
        calls: RefCell<Vec<(PathBuf, Vec<OsString>, Option<OsString>)>>,
    }

    impl RecordingRunner {
        fn exiting(code: Option<i32>) -> Self {
            Self {
                code,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &Path, args: &[OsString], env: &EnvSnapshot) -> io::Result<Option<i32>> {
            self.calls.borrow_mut().push((
                program.to_path_buf(),
                args.to_vec(),
                env.get("npm_config_prefix").map(OsStr::to_os_string),
            ));
            Ok(self.code)
        }

        fn capture(&self, _program: &Path, _args: &[OsString], _env: &EnvSnapshot) -> io::Result<String> {
            Ok(String::new())
        }
    }

    fn context(temp: &TempDir) -> DispatchContext {
        DispatchContext::for_home(temp.path().join("home"), temp.path(), EnvSnapshot::default())
    }

    fn install_version(ctx: &DispatchContext, name: &str) -> InstalledVersion {
        let root = ctx.layout.installed_dir().join(name);
        let installed = InstalledVersion::new(name, &root);
        fs::create_dir_all(installed.global_bin_dir()).unwrap();
        installed
    }

    #[test]
    fn test_detect_mutation() {
        assert_eq!(Mutation::detect(&["install", "-g", "eslint"]), Some(Mutation::Install));
        assert_eq!(Mutation::detect(&["--global", "rm", "eslint"]), Some(Mutation::Uninstall));
        assert_eq!(Mutation::detect(&["install", "eslint"]), None);
        assert_eq!(Mutation::detect(&["-g", "ls"]), None);
    }

    #[test]
    fn test_target_prefers_default_then_resolved() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let resolved = install_version(&ctx, "18.20.4");
        let default = install_version(&ctx, "22.3.0");
        let runner = RecordingRunner::exiting(Some(0));
        let reconciler = ShimReconciler::new(&ctx, &runner);

        let target = reconciler.global_target(Some(&resolved));
        assert_eq!(target.install_prefix.as_deref(), Some(resolved.root()));

        fs::write(ctx.layout.default_file(), "22\n").unwrap();
        let target = reconciler.global_target(Some(&resolved));
        assert_eq!(target.bin_dir, Some(default.global_bin_dir()));
        assert_eq!(target.install_prefix.as_deref(), Some(default.root()));
    }

    #[test]
    fn test_failed_package_manager_skips_reconciliation() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let resolved = install_version(&ctx, "20.19.6");
        fs::write(resolved.global_bin_dir().join("eslint"), "").unwrap();
        let runner = RecordingRunner::exiting(Some(7));

        let argv: Vec<OsString> = ["npm", "i", "-g", "eslint"].iter().map(OsString::from).collect();
        let code = ShimReconciler::new(&ctx, &runner)
            .wrap_mutation(Path::new("/fake/npm"), &argv, Mutation::Install, Some(&resolved))
            .unwrap();

        assert_eq!(code, 7);
        assert!(!ctx.layout.shim_bin_dir().exists());

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, argv[1..].to_vec());
        assert_eq!(calls[0].2.as_deref(), Some(resolved.root().as_os_str()));
    }

    #[test]
    fn test_signal_exit_maps_to_failure() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let resolved = install_version(&ctx, "20.19.6");
        let runner = RecordingRunner::exiting(None);

        let argv = vec![OsString::from("npm"), OsString::from("i"), OsString::from("-g")];
        let code = ShimReconciler::new(&ctx, &runner)
            .wrap_mutation(Path::new("/fake/npm"), &argv, Mutation::Install, Some(&resolved))
            .unwrap();
        assert_eq!(code, exit::FAILURE);
    }

    #[test]
    fn test_create_skips_protected_and_existing() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let shim_dir = ctx.layout.shim_bin_dir();
        fs::create_dir_all(&shim_dir).unwrap();
        fs::write(reconciler_template(&ctx), "shim").unwrap();
        fs::write(shim_dir.join(PathUtils::executable_name("tsc")), "existing").unwrap();

        let runner = RecordingRunner::exiting(Some(0));
        let reconciler = ShimReconciler::new(&ctx, &runner);
        let entries: BTreeSet<String> = if cfg!(target_os = "windows") {
            ["corepack.cmd", "tsc.cmd", "eslint.cmd", "README.md"]
        } else {
            ["corepack", "tsc", "eslint", "npx"]
        }
        .iter()
        .map(|s| s.to_string())
        .collect();

        let report = reconciler.create_shims(&entries);
        assert_eq!(report.created, vec![reconciler.shim_path(if cfg!(target_os = "windows") {
            "eslint.cmd"
        } else {
            "eslint"
        })]);
        assert_eq!(
            fs::read_to_string(shim_dir.join(PathUtils::executable_name("tsc"))).unwrap(),
            "existing"
        );

        // 再次运行不会重复创建
        assert!(reconciler.create_shims(&entries).created.is_empty());
    }

    fn reconciler_template(ctx: &DispatchContext) -> PathBuf {
        ctx.layout
            .shim_bin_dir()
            .join(PathUtils::executable_name("node"))
    }

    #[test]
    fn test_remove_only_vanished_entries() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let runner = RecordingRunner::exiting(Some(0));
        let reconciler = ShimReconciler::new(&ctx, &runner);

        let shim_dir = ctx.layout.shim_bin_dir();
        fs::create_dir_all(&shim_dir).unwrap();
        fs::write(reconciler.shim_path("eslint"), "").unwrap();
        fs::write(reconciler.shim_path("tsc"), "").unwrap();
        fs::write(reconciler.shim_path("npx"), "").unwrap();

        let before: BTreeSet<String> = ["eslint", "tsc", "npx", "ghost"].iter().map(|s| s.to_string()).collect();
        let after: BTreeSet<String> = ["tsc"].iter().map(|s| s.to_string()).collect();

        let report = reconciler.remove_shims(&before, &after);
        assert_eq!(report.removed, vec![reconciler.shim_path("eslint")]);
        assert!(reconciler.shim_path("tsc").exists());
        assert!(reconciler.shim_path("npx").exists());
    }
}
