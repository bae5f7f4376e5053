use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// 路径工具
pub struct PathUtils;

impl PathUtils {
    /// 比较两个路径字符串（Windows 上大小写不敏感）
    pub fn paths_equal(a: &Path, b: &Path) -> bool {
        if cfg!(target_os = "windows") {
            a.as_os_str().eq_ignore_ascii_case(b.as_os_str())
        } else {
            a == b
        }
    }

    /// 解析符号链接后的真实路径，失败时原样返回
    pub fn real_path(path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// 两个路径是否指向同一位置：先比较字面值，再比较解析链接后的路径
    pub fn same_location(a: &Path, b: &Path) -> bool {
        Self::paths_equal(a, b) || Self::paths_equal(&Self::real_path(a), &Self::real_path(b))
    }

    /// 解析链接后，path 是否位于 dir 之下
    pub fn is_within(path: &Path, dir: &Path) -> bool {
        let real = Self::real_path(path);
        let real_dir = Self::real_path(dir);

        if cfg!(target_os = "windows") {
            let real = real.to_string_lossy().to_lowercase();
            let real_dir = real_dir.to_string_lossy().to_lowercase();
            Path::new(&real).starts_with(Path::new(&real_dir))
        } else {
            real.starts_with(&real_dir)
        }
    }

    /// 调用名去掉 `.exe` 后缀，得到逻辑命令名
    pub fn command_name(argv0: &OsStr) -> String {
        let file_name = Path::new(argv0)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match file_name.strip_suffix(".exe") {
            Some(stripped) => stripped.to_string(),
            None => file_name,
        }
    }

    /// 去掉最后一个扩展名（`eslint.cmd` -> `eslint`）
    pub fn base_name(name: &str) -> &str {
        match Path::new(name).extension() {
            Some(ext) if !ext.is_empty() => &name[..name.len() - ext.len() - 1],
            _ => name,
        }
    }

    /// 小写扩展名
    pub fn extension(name: &str) -> Option<String> {
        Path::new(name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// 当前平台上可执行文件的文件名
    pub fn executable_name(command: &str) -> String {
        if cfg!(target_os = "windows") {
            format!("{command}.exe")
        } else {
            command.to_string()
        }
    }
}
