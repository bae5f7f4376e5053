use std::env;
use std::path::{Path, PathBuf};

use crate::core::context::DispatchContext;
use crate::core::version::InstalledVersion;
use crate::error::{AppError, AppResult};
use crate::infrastructure::catalog::VersionCatalog;
use crate::infrastructure::config_store::ConfigStore;
use crate::utils::PathUtils;

/// 二进制文件定位器
pub struct BinaryLocator<'a> {
    ctx: &'a DispatchContext,
}

impl<'a> BinaryLocator<'a> {
    pub fn new(ctx: &'a DispatchContext) -> Self {
        Self { ctx }
    }

    /// 按固定顺序列出候选路径
    pub fn candidates(command: &str, installed: &InstalledVersion) -> Vec<PathBuf> {
        let root = installed.root();
        let bin = root.join("bin");

        if cfg!(target_os = "windows") {
            vec![
                bin.join(format!("{command}.exe")),
                root.join(format!("{command}.exe")),
                root.join(format!("{command}.cmd")),
                bin.join(format!("{command}.cmd")),
                bin.join(format!("{command}.bat")),
            ]
        } else {
            vec![bin.join(command), root.join(command)]
        }
    }

    /// 在已安装版本中定位命令，第一个存在的普通文件胜出
    pub fn locate(&self, command: &str, installed: &InstalledVersion) -> AppResult<PathBuf> {
        let candidates = Self::candidates(command, installed);

        for candidate in &candidates {
            tracing::trace!("probing {}", candidate.display());
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }

        Err(AppError::BinaryNotFound {
            version: installed.name.clone(),
            path: candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| installed.root().to_path_buf()),
        })
    }

    /// 在系统搜索路径中查找真正的系统二进制
    ///
    /// 跳过分发器自身所在目录和 shim 目录；候选路径解析链接后若指向
    /// 分发器自身或位于 shim 目录下，同样跳过，否则会回退到自己造成无限递归。
    pub fn locate_system(&self, command: &str) -> Option<PathBuf> {
        let shim_dir = self.ctx.layout.shim_bin_dir();
        let self_exe = self.ctx.self_exe.as_deref();
        let self_dir = self_exe.and_then(Path::parent);
        let self_real = self_exe.map(PathUtils::real_path);

        let search: Vec<PathBuf> = self
            .ctx
            .env
            .path_entries()
            .into_iter()
            .filter(|dir| !dir.as_os_str().is_empty())
            .filter(|dir| !self_dir.is_some_and(|own| PathUtils::paths_equal(dir, own)))
            .filter(|dir| !PathUtils::same_location(dir, &shim_dir))
            .collect();

        if search.is_empty() {
            return None;
        }

        let joined = env::join_paths(&search).ok()?;
        let found = which::which_in_all(command, Some(joined), &self.ctx.cwd).ok()?;

        for candidate in found {
            if !candidate.is_file() {
                continue;
            }

            let real = PathUtils::real_path(&candidate);
            if self_real
                .as_deref()
                .is_some_and(|own| PathUtils::paths_equal(&real, own))
            {
                tracing::debug!("skipping {}: resolves to the dispatcher itself", candidate.display());
                continue;
            }
            if PathUtils::is_within(&candidate, &shim_dir) {
                tracing::debug!("skipping {}: lives in the shim directory", candidate.display());
                continue;
            }

            tracing::debug!("system {} found at {}", command, candidate.display());
            return Some(candidate);
        }

        None
    }

    /// 非核心命令在当前版本中找不到时，改用全局默认版本（或系统副本）
    pub fn route_to_default(&self, command: &str) -> AppResult<PathBuf> {
        let store = ConfigStore::new(&self.ctx.layout, &self.ctx.profile);

        let token = match store.default_token() {
            Some(token) if !token.is_system() => token,
            _ => {
                return self
                    .locate_system(command)
                    .ok_or_else(|| AppError::system_absent(command));
            }
        };

        let catalog = VersionCatalog::new(self.ctx.layout.installed_dir(), &self.ctx.profile);
        let installed = catalog.resolve_installed(&token)?;
        tracing::debug!("routing {} to default version {}", command, installed.name);

        self.locate(command, &installed)
            .map_err(|_| AppError::command_not_found(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::EnvSnapshot;
    use std::fs;
    use tempfile::TempDir;

    fn write_exe(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/sh\n").unwrap();
        crate::utils::FileSystemUtils::mark_executable(path).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_prefers_bin_dir() {
        let temp = TempDir::new().unwrap();
        let ctx = DispatchContext::for_home(temp.path(), temp.path(), EnvSnapshot::default());
        let root = temp.path().join("installed").join("20.19.6");
        write_exe(&root.join("bin").join("npm"));
        write_exe(&root.join("npm"));
        write_exe(&root.join("corepack"));

        let installed = InstalledVersion::new("20.19.6", &root);
        let locator = BinaryLocator::new(&ctx);
        assert_eq!(locator.locate("npm", &installed).unwrap(), root.join("bin").join("npm"));
        assert_eq!(locator.locate("corepack", &installed).unwrap(), root.join("corepack"));
    }

    #[test]
    fn test_locate_missing_reports_bin_path() {
        let temp = TempDir::new().unwrap();
        let ctx = DispatchContext::for_home(temp.path(), temp.path(), EnvSnapshot::default());
        let root = temp.path().join("installed").join("18.20.4");
        fs::create_dir_all(root.join("bin")).unwrap();

        let err = BinaryLocator::new(&ctx)
            .locate("tsc", &InstalledVersion::new("18.20.4", &root))
            .unwrap_err();
        match err {
            AppError::BinaryNotFound { version, path } => {
                assert_eq!(version, "18.20.4");
                assert!(path.starts_with(root.join("bin")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_locate_system_without_path_is_none() {
        let temp = TempDir::new().unwrap();
        let ctx = DispatchContext::for_home(temp.path(), temp.path(), EnvSnapshot::default());
        assert!(BinaryLocator::new(&ctx).locate_system("node").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_route_to_default_uses_default_version() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let ctx = DispatchContext::for_home(&home, temp.path(), EnvSnapshot::default());
        let root = home.join("installed").join("22.3.0");
        write_exe(&root.join("bin").join("node"));
        write_exe(&root.join("bin").join("eslint"));
        fs::write(home.join("default"), "22\n").unwrap();

        let locator = BinaryLocator::new(&ctx);
        assert_eq!(locator.route_to_default("eslint").unwrap(), root.join("bin").join("eslint"));
        assert!(matches!(
            locator.route_to_default("prettier"),
            Err(AppError::CommandNotFound { .. })
        ));
    }

    #[test]
    fn test_route_to_default_system_without_path() {
        let temp = TempDir::new().unwrap();
        let ctx = DispatchContext::for_home(temp.path(), temp.path(), EnvSnapshot::default());
        fs::write(temp.path().join("default"), "system\n").unwrap();

        assert!(matches!(
            BinaryLocator::new(&ctx).route_to_default("eslint"),
            Err(AppError::SystemBinaryAbsent { .. })
        ));
    }
}
