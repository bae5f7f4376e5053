use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use crate::cli::commands::Commands;
use crate::cli::output::{InstallStatus, OutputFormat, WhichReport, FORMATTER};
use crate::core::context::DispatchContext;
use crate::core::dispatcher::ProcessDispatcher;
use crate::core::resolver::VersionResolver;
use crate::core::version::VersionToken;
use crate::error::{AppError, AppResult};
use crate::infrastructure::catalog::VersionCatalog;
use crate::infrastructure::config_store::ConfigStore;
use crate::infrastructure::locator::BinaryLocator;
use crate::utils::{FileSystemUtils, PathUtils};

/// 命令处理器
pub struct CommandHandler<'a> {
    ctx: &'a DispatchContext,
    dispatcher: ProcessDispatcher,
}

impl<'a> CommandHandler<'a> {
    pub fn new(ctx: &'a DispatchContext, dispatcher: ProcessDispatcher) -> Self {
        Self { ctx, dispatcher }
    }

    fn store(&self) -> ConfigStore<'a> {
        ConfigStore::new(&self.ctx.layout, &self.ctx.profile)
    }

    fn catalog(&self) -> VersionCatalog<'a> {
        VersionCatalog::new(self.ctx.layout.installed_dir(), &self.ctx.profile)
    }

    /// 处理命令
    pub fn handle_command(&self, command: Commands) -> AppResult<()> {
        match command {
            Commands::Which { json } => {
                let report = self.which()?;
                print!("{}", FORMATTER.format_which(&report, OutputFormat::from_json_flag(json))?);
            }
            Commands::List { json } => {
                let catalog = self.catalog();
                let installed = catalog.list_installed();
                let default = self.default_install_name();
                print!(
                    "{}",
                    FORMATTER.format_list(
                        &installed,
                        default.as_deref(),
                        catalog.root(),
                        OutputFormat::from_json_flag(json)
                    )?
                );
            }
            Commands::Local { version, nvurc } => self.handle_local(version, nvurc)?,
            Commands::Default { version } => self.handle_default(version)?,
            Commands::Setup => self.handle_setup()?,
            Commands::Teardown => self.handle_teardown()?,
            Commands::System { command, args } => return Err(self.handle_system(&command, args)),
        }
        Ok(())
    }

    /// 模拟分发器对当前目录的解析
    pub fn which(&self) -> AppResult<WhichReport> {
        let resolved = VersionResolver::new(self.ctx).resolve(&self.ctx.cwd)?;
        let version = resolved.token.to_string();
        let source = resolved.source.to_string();

        if resolved.token.is_system() {
            let binary = BinaryLocator::new(self.ctx).locate_system(&self.ctx.profile.runtime);
            let status = if binary.is_some() {
                InstallStatus::System
            } else {
                InstallStatus::NotInstalled
            };
            return Ok(WhichReport { version, source, binary, status });
        }

        let catalog = self.catalog();
        let report = match catalog.resolve_installed(&resolved.token) {
            Ok(installed) => {
                let binary = catalog.entry_binary(installed.root());
                let status = if binary.is_file() {
                    InstallStatus::Installed
                } else {
                    InstallStatus::BinaryMissing
                };
                WhichReport { version, source, binary: Some(binary), status }
            }
            Err(e) => {
                let expected = match e {
                    AppError::NoMatch { expected, .. } => Some(expected),
                    _ => None,
                };
                WhichReport {
                    version,
                    source,
                    binary: expected,
                    status: InstallStatus::NotInstalled,
                }
            }
        };
        Ok(report)
    }

    /// 全局默认版本实际对应的目录名
    fn default_install_name(&self) -> Option<String> {
        let token = self.store().default_token()?;
        self.catalog()
            .resolve_installed(&token)
            .ok()
            .map(|installed| installed.name)
    }

    fn tool_name(&self) -> &str {
        &self.ctx.profile.tool_name
    }

    fn validate(&self, version: &str) -> AppResult<VersionToken> {
        let token = VersionToken::new(version);
        if token.is_empty() || token.as_str().starts_with('-') {
            return Err(AppError::invalid_version(&format!(
                "'{version}' is not a version, example: {} local 20",
                self.tool_name()
            )));
        }
        Ok(token)
    }

    fn handle_local(&self, version: Option<String>, nvurc: bool) -> AppResult<()> {
        let store = self.store();

        let Some(version) = version else {
            match store.read_local(&self.ctx.cwd) {
                Some(found) => {
                    let name = found
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    println!("Current local version ({name}): {}", found.token);
                }
                None => {
                    println!("No local version set in this directory.");
                    println!("Usage: {} local <version> [--nvurc]", self.tool_name());
                }
            }
            return Ok(());
        };

        let token = self.validate(&version)?;
        let path = store.write_local(&self.ctx.cwd, &token, nvurc)?;
        tracing::debug!("wrote {}", path.display());
        println!(
            "Created {} with version: {}",
            path.file_name().unwrap_or_default().to_string_lossy(),
            token
        );
        Ok(())
    }

    fn handle_default(&self, version: Option<String>) -> AppResult<()> {
        let store = self.store();

        let Some(version) = version else {
            match store.default_token() {
                Some(token) => println!("Current default: {token}"),
                None => {
                    println!("No default version set.");
                    println!("Usage: {} default <version>", self.tool_name());
                }
            }
            return Ok(());
        };

        let token = self.validate(&version)?;
        store.write_default(&token)?;
        println!("Default Node version set to: {token}");
        Ok(())
    }

    /// 把分发器自身复制为工具名和所有受保护名称，再把其他已有 shim 同步到当前版本
    fn handle_setup(&self) -> AppResult<()> {
        let source = self.ctx.self_exe.clone().ok_or_else(|| {
            AppError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "cannot determine the path of the running executable",
            ))
        })?;
        let shim_dir = self.ctx.layout.shim_bin_dir();
        FileSystemUtils::create_dir_all(&shim_dir)?;

        let profile = &self.ctx.profile;
        let mut names: Vec<&str> = vec![profile.tool_name.as_str()];
        names.extend(profile.protected_names.iter().map(String::as_str));

        let mut written = BTreeSet::new();
        for name in names {
            let file_name = PathUtils::executable_name(name);
            let target = shim_dir.join(&file_name);
            written.insert(file_name);

            if PathUtils::same_location(&source, &target) {
                continue;
            }
            FileSystemUtils::copy_executable(&source, &target)?;
            tracing::debug!("installed {}", target.display());
        }

        let mut synced = 0;
        for name in FileSystemUtils::entry_names(&shim_dir) {
            if written.contains(&name) || name.starts_with('.') {
                continue;
            }
            let target = shim_dir.join(&name);
            if !target.is_file() || PathUtils::same_location(&source, &target) {
                continue;
            }
            match FileSystemUtils::copy_executable(&source, &target) {
                Ok(()) => synced += 1,
                Err(e) => tracing::warn!("failed to sync shim {}: {}", target.display(), e),
            }
        }

        println!("Installed {} binaries to {}", written.len(), shim_dir.display());
        if synced > 0 {
            println!("Synced {synced} existing shim(s)");
        }
        println!();
        println!("Add {} to the front of your PATH to start using it.", shim_dir.display());
        Ok(())
    }

    fn handle_teardown(&self) -> AppResult<()> {
        let shim_dir = self.ctx.layout.shim_bin_dir();

        let mut removed = 0;
        for command in &self.ctx.profile.core_commands {
            let path: PathBuf = shim_dir.join(PathUtils::executable_name(command));
            if FileSystemUtils::remove_file(&path)? {
                removed += 1;
            }
        }

        if removed > 0 {
            println!("Removed {removed} shim(s) from {}", shim_dir.display());
            println!();
            println!("You may also want to remove {} from your PATH.", shim_dir.display());
        } else {
            println!("No shims found to remove.");
        }
        Ok(())
    }

    /// 绕过版本路由执行系统副本；只有启动失败时才会返回
    fn handle_system(&self, command: &str, args: Vec<OsString>) -> AppError {
        let Some(program) = BinaryLocator::new(self.ctx).locate_system(command) else {
            return AppError::system_absent(command);
        };

        let mut argv = vec![OsString::from(command)];
        argv.extend(args);
        self.dispatcher.dispatch(&program, &argv, &self.ctx.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::Profile;
    use crate::utils::EnvSnapshot;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> DispatchContext {
        DispatchContext::for_home(temp.path().join("home"), temp.path(), EnvSnapshot::default())
    }

    #[test]
    fn test_local_and_default_write_files() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        handler
            .handle_command(Commands::Local { version: Some("20".into()), nvurc: false })
            .unwrap();
        handler
            .handle_command(Commands::Default { version: Some(" v22 ".into()) })
            .unwrap();

        assert_eq!(fs::read_to_string(temp.path().join(".nvmrc")).unwrap(), "20\n");
        assert_eq!(fs::read_to_string(ctx.layout.default_file()).unwrap(), "v22\n");
    }

    #[test]
    fn test_rejects_flag_like_versions() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        let err = handler
            .handle_command(Commands::Default { version: Some("-g".into()) })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(!ctx.layout.default_file().exists());
    }

    #[test]
    fn test_messages_follow_configured_tool_name() {
        let temp = TempDir::new().unwrap();
        let profile = Profile {
            tool_name: "nv".to_string(),
            ..Profile::default()
        };
        let ctx = context(&temp).with_profile(profile);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        let err = handler
            .handle_command(Commands::Local { version: Some("--lts".into()), nvurc: false })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref reason, .. } if reason.ends_with("example: nv local 20")));
        assert!(err.user_message(handler.tool_name()).starts_with("nv error: "));
    }

    #[test]
    fn test_which_reports_status() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        assert!(matches!(handler.which(), Err(AppError::NotConfigured)));

        fs::write(temp.path().join(".nvurc"), "18").unwrap();
        let report = handler.which().unwrap();
        assert_eq!(report.status, InstallStatus::NotInstalled);
        assert_eq!(
            report.binary,
            Some(handler.catalog().entry_binary(&ctx.layout.installed_dir().join("18")))
        );
        assert_eq!(report.source, temp.path().join(".nvurc").display().to_string());

        let root = ctx.layout.installed_dir().join("18.20.4");
        fs::create_dir_all(&root).unwrap();
        let report = handler.which().unwrap();
        assert_eq!(report.status, InstallStatus::BinaryMissing);
    }

    #[test]
    fn test_setup_then_teardown() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("nvu-binary");
        fs::write(&exe, "dispatcher").unwrap();
        let ctx = context(&temp).with_self_exe(&exe);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        let shim_dir = ctx.layout.shim_bin_dir();
        fs::create_dir_all(&shim_dir).unwrap();
        fs::write(shim_dir.join(PathUtils::executable_name("eslint")), "stale").unwrap();

        handler.handle_command(Commands::Setup).unwrap();
        for name in ["nvu", "node", "npm", "npx", "corepack", "eslint"] {
            let path = shim_dir.join(PathUtils::executable_name(name));
            assert_eq!(fs::read_to_string(path).unwrap(), "dispatcher");
        }

        handler.handle_command(Commands::Teardown).unwrap();
        assert!(!shim_dir.join(PathUtils::executable_name("node")).exists());
        assert!(shim_dir.join(PathUtils::executable_name("corepack")).exists());
        assert!(shim_dir.join(PathUtils::executable_name("nvu")).exists());
    }

    #[test]
    fn test_system_without_copy_is_absent() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let handler = CommandHandler::new(&ctx, ProcessDispatcher::for_host());

        let err = handler
            .handle_command(Commands::System { command: "npm".into(), args: vec![] })
            .unwrap_err();
        assert!(matches!(err, AppError::SystemBinaryAbsent { .. }));
    }
}
