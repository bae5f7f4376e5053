use std::env;
use std::path::{Path, PathBuf};

use crate::core::constants::{env as env_names, layout};
use crate::error::{AppError, AppResult};
use crate::infrastructure::config::Profile;
use crate::utils::EnvSnapshot;

/// nvu home 目录布局，所有路径都从这个根派生
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 优先使用 NVU_HOME，否则为用户目录下的 `.nvu`
    pub fn discover(env: &EnvSnapshot) -> AppResult<Self> {
        if let Some(root) = env.get_non_empty(env_names::HOME_OVERRIDE) {
            return Ok(Self::new(root));
        }

        let home = dirs::home_dir().ok_or(AppError::HomeUnavailable)?;
        Ok(Self::new(home.join(layout::DEFAULT_HOME_DIR)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn installed_dir(&self) -> PathBuf {
        self.root.join(layout::INSTALLED_DIR)
    }

    pub fn shim_bin_dir(&self) -> PathBuf {
        self.root.join(layout::SHIM_BIN_DIR)
    }

    pub fn default_file(&self) -> PathBuf {
        self.root.join(layout::DEFAULT_FILE)
    }

    pub fn profile_file(&self) -> PathBuf {
        self.root.join(layout::PROFILE_FILE)
    }
}

/// 一次调用的上下文
///
/// 在入口处构建一次，显式传入每个组件。
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub layout: HomeLayout,
    pub profile: Profile,
    pub cwd: PathBuf,
    pub env: EnvSnapshot,
    /// 分发器自身的可执行文件路径，无法确定时为 None
    pub self_exe: Option<PathBuf>,
}

impl DispatchContext {
    /// 从当前进程构建上下文
    pub fn from_process() -> AppResult<Self> {
        let env = EnvSnapshot::capture();
        let layout = HomeLayout::discover(&env)?;
        let profile = Profile::load(&layout.profile_file())?;
        let cwd = env::current_dir()?;
        let self_exe = env::current_exe().ok();

        tracing::debug!("home root: {}", layout.root().display());

        Ok(Self {
            layout,
            profile,
            cwd,
            env,
            self_exe,
        })
    }

    /// 使用指定的 home 根目录构建上下文，使用默认 profile
    pub fn for_home(home: impl Into<PathBuf>, cwd: impl Into<PathBuf>, env: EnvSnapshot) -> Self {
        Self {
            layout: HomeLayout::new(home),
            profile: Profile::default(),
            cwd: cwd.into(),
            env,
            self_exe: None,
        }
    }

    pub fn with_self_exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.self_exe = Some(path.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_override_wins() {
        let env = EnvSnapshot::from_vars([("NVU_HOME", "/opt/nvu")]);
        let layout = HomeLayout::discover(&env).unwrap();

        assert_eq!(layout.root(), Path::new("/opt/nvu"));
        assert_eq!(layout.installed_dir(), Path::new("/opt/nvu/installed"));
        assert_eq!(layout.shim_bin_dir(), Path::new("/opt/nvu/bin"));
        assert_eq!(layout.default_file(), Path::new("/opt/nvu/default"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let env = EnvSnapshot::from_vars([("NVU_HOME", "")]);
        if let Ok(layout) = HomeLayout::discover(&env) {
            assert!(layout.root().ends_with(".nvu"));
        }
    }
}
