use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 文件系统工具
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// 安全地创建目录
    pub fn create_dir_all(path: &Path) -> Result<(), io::Error> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// 安全地删除文件，文件不存在不算错误
    pub fn remove_file(path: &Path) -> Result<bool, io::Error> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 读取整个文件并去掉首尾空白；文件不存在或不可读时返回 None
    pub fn read_trimmed(path: &Path) -> Option<String> {
        fs::read_to_string(path)
            .ok()
            .map(|content| content.trim().to_string())
    }

    /// 写入单行内容，创建目录如果不存在
    pub fn write_line(path: &Path, content: &str) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            Self::create_dir_all(parent)?;
        }

        fs::write(path, format!("{content}\n"))
    }

    /// 目录中所有条目的名称；目录缺失或不可读时视为空
    pub fn entry_names(dir: &Path) -> BTreeSet<String> {
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                tracing::debug!("treating {} as empty: {}", dir.display(), e);
                BTreeSet::new()
            }
        }
    }

    /// 目录中的子目录
    pub fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, io::Error> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    /// 复制可执行文件：先写入同目录的临时文件再重命名，
    /// 这样即使目标正在运行也能被替换
    pub fn copy_executable(src: &Path, dst: &Path) -> Result<(), io::Error> {
        let parent = dst
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
        Self::create_dir_all(parent)?;

        let file_name = dst
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid file name"))?;
        let staging = parent.join(format!(".{}.nvu-tmp", file_name.to_string_lossy()));

        fs::copy(src, &staging)?;
        Self::mark_executable(&staging)?;
        if let Err(e) = fs::rename(&staging, dst) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        Ok(())
    }

    /// Unix 上设置 0755 权限
    #[cfg(unix)]
    pub fn mark_executable(path: &Path) -> Result<(), io::Error> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
    }

    #[cfg(not(unix))]
    pub fn mark_executable(_path: &Path) -> Result<(), io::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_trimmed() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(".nvmrc");
        fs::write(&file, "  v20.19.6 \n\n").unwrap();

        assert_eq!(FileSystemUtils::read_trimmed(&file).as_deref(), Some("v20.19.6"));
        assert_eq!(FileSystemUtils::read_trimmed(&temp.path().join("missing")), None);
    }

    #[test]
    fn test_entry_names_of_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(FileSystemUtils::entry_names(&temp.path().join("nope")).is_empty());

        fs::write(temp.path().join("b"), "").unwrap();
        fs::create_dir(temp.path().join("a")).unwrap();
        let names: Vec<_> = FileSystemUtils::entry_names(temp.path()).into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_copy_executable_replaces_target() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("template");
        let dst = temp.path().join("bin").join("eslint");
        fs::write(&src, "new").unwrap();
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, "old").unwrap();

        FileSystemUtils::copy_executable(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
        assert_eq!(FileSystemUtils::entry_names(dst.parent().unwrap()).len(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dst).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_remove_missing_file_is_not_error() {
        let temp = TempDir::new().unwrap();
        assert!(!FileSystemUtils::remove_file(&temp.path().join("gone")).unwrap());
    }
}
