use std::ffi::OsString;
use std::path::Path;

use crate::core::context::DispatchContext;
use crate::core::version::{InstalledVersion, VersionToken};
use crate::error::{AppError, AppResult};
use crate::infrastructure::catalog::VersionCatalog;
use crate::infrastructure::config::Profile;
use crate::infrastructure::config_store::{ConfigSource, ConfigStore};

/// 解析结果：版本令牌及其来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub token: VersionToken,
    pub source: ConfigSource,
}

/// 版本解析器
///
/// 优先级：当前目录及其祖先中的项目配置 → 全局默认文件 → `NotConfigured`。
pub struct VersionResolver<'a> {
    ctx: &'a DispatchContext,
}

impl<'a> VersionResolver<'a> {
    pub fn new(ctx: &'a DispatchContext) -> Self {
        Self { ctx }
    }

    fn store(&self) -> ConfigStore<'_> {
        ConfigStore::new(&self.ctx.layout, &self.ctx.profile)
    }

    /// 从 cwd 开始解析；system 哨兵原样返回，不查询已安装版本
    pub fn resolve(&self, cwd: &Path) -> AppResult<ResolvedVersion> {
        let store = self.store();

        if let Some(found) = store.find_project(cwd) {
            return Ok(ResolvedVersion {
                token: found.token,
                source: ConfigSource::Project(found.path),
            });
        }

        match store.read_default() {
            Some(found) => {
                tracing::debug!("using global default {}", found.token);
                Ok(ResolvedVersion {
                    token: found.token,
                    source: ConfigSource::GlobalDefault(found.path),
                })
            }
            None => Err(AppError::NotConfigured),
        }
    }

    /// 引导解析：忽略项目配置，选择最佳可用的已安装版本
    pub fn resolve_bootstrap(&self) -> AppResult<InstalledVersion> {
        VersionCatalog::new(self.ctx.layout.installed_dir(), &self.ctx.profile).best_available()
    }
}

/// 本次调用是否在运行 nvu 自身的管理脚本
///
/// 只看 argv[1]：包含标记子串、以 `/nvu` 或 `\nvu` 结尾、或文件名为管理脚本名。
/// 这是基于子串的启发式判断，路径中恰好含有标记的项目目录会被误判。
pub fn is_management_invocation(argv: &[OsString], profile: &Profile) -> bool {
    let Some(script) = argv.get(1) else {
        return false;
    };
    let script = script.to_string_lossy();

    if profile
        .management_markers
        .iter()
        .any(|marker| script.contains(marker.as_str()))
    {
        return true;
    }

    let tool = &profile.tool_name;
    if script.ends_with(&format!("/{tool}")) || script.ends_with(&format!("\\{tool}")) {
        return true;
    }

    let base = script
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(&*script);
    profile.management_scripts.iter().any(|name| name == base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::EnvSnapshot;
    use std::fs;
    use tempfile::TempDir;

    fn argv(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_project_config_beats_default() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let project = temp.path().join("project");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&project).unwrap();
        fs::write(home.join("default"), "22\n").unwrap();
        fs::write(project.join(".nvmrc"), "18\n").unwrap();

        let ctx = DispatchContext::for_home(&home, &project, EnvSnapshot::default());
        let resolver = VersionResolver::new(&ctx);

        let resolved = resolver.resolve(&project).unwrap();
        assert_eq!(resolved.token.as_str(), "18");
        assert_eq!(resolved.source, ConfigSource::Project(project.join(".nvmrc")));

        let resolved = resolver.resolve(&home).unwrap();
        assert_eq!(resolved.token.as_str(), "22");
        assert!(matches!(resolved.source, ConfigSource::GlobalDefault(_)));
    }

    #[test]
    fn test_system_sentinel_returned_unchanged() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".nvurc"), "system").unwrap();
        let ctx = DispatchContext::for_home(temp.path().join("home"), temp.path(), EnvSnapshot::default());

        let resolved = VersionResolver::new(&ctx).resolve(temp.path()).unwrap();
        assert!(resolved.token.is_system());
    }

    #[test]
    fn test_management_invocation_heuristic() {
        let profile = Profile::default();
        assert!(is_management_invocation(
            &argv(&["node", "/usr/lib/node_modules/node-version-use/bin/cli.js"]),
            &profile
        ));
        assert!(is_management_invocation(&argv(&["node", "/home/u/.local/bin/nvu"]), &profile));
        assert!(is_management_invocation(&argv(&["node", "C:\\tools\\nvu"]), &profile));
        assert!(is_management_invocation(&argv(&["node", "nvu.js"]), &profile));
        assert!(!is_management_invocation(&argv(&["node", "server.js"]), &profile));
        assert!(!is_management_invocation(&argv(&["node"]), &profile));
    }
}
