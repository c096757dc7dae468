//! 保存后处理
//!
//! 写回成功后可选地调用外部工具（默认 `msgmerge --update`）按模板整理目录。
//! 该步骤是尽力而为的：失败只报告，不影响保存结果。

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::config::PostSaveConfig;

/// 后处理错误
#[derive(Error, Debug)]
pub enum HookError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// 后处理执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// 工具已运行，文件可能被修改
    Applied,
    /// 条件不满足，未运行（附原因）
    Skipped(String),
}

/// 保存后处理 trait
pub trait PostSaveHook {
    fn after_save(&self, path: &Path) -> Result<HookOutcome, HookError>;
}

/// 调用 `msgmerge --update` 的后处理器
#[derive(Debug, Clone)]
pub struct MsgmergeHook {
    program: String,
    template: Option<PathBuf>,
}

impl MsgmergeHook {
    pub fn new(program: impl Into<String>, template: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            template,
        }
    }

    pub fn from_config(config: &PostSaveConfig) -> Self {
        Self::new(config.program.clone(), config.template.clone())
    }

    /// 查找参考模板：配置优先，其次是同目录下唯一的 .pot 文件
    fn find_template(&self, path: &Path) -> Option<PathBuf> {
        if let Some(template) = &self.template {
            return template.is_file().then(|| template.clone());
        }

        let dir = path.parent()?;
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "pot"))
            .collect();

        if candidates.len() == 1 {
            candidates.pop()
        } else {
            None
        }
    }
}

impl PostSaveHook for MsgmergeHook {
    fn after_save(&self, path: &Path) -> Result<HookOutcome, HookError> {
        let Some(template) = self.find_template(path) else {
            return Ok(HookOutcome::Skipped(format!(
                "no template found for {}",
                path.display()
            )));
        };

        debug!(program = %self.program, path = %path.display(), template = %template.display(), "运行保存后处理");

        let output = Command::new(&self.program)
            .arg("--update")
            .arg("--backup=none")
            .arg("--quiet")
            .arg(path)
            .arg(&template)
            .output()
            .map_err(|e| HookError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if output.status.success() {
            Ok(HookOutcome::Applied)
        } else {
            Err(HookError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skipped_without_template() {
        let temp_dir = TempDir::new().unwrap();
        let po = temp_dir.path().join("fr.po");
        std::fs::write(&po, "").unwrap();

        let hook = MsgmergeHook::new("msgmerge", None);
        assert!(matches!(hook.after_save(&po), Ok(HookOutcome::Skipped(_))));

        let hook = MsgmergeHook::new("msgmerge", Some(temp_dir.path().join("missing.pot")));
        assert!(matches!(hook.after_save(&po), Ok(HookOutcome::Skipped(_))));
    }

    #[test]
    fn test_missing_program_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let po = temp_dir.path().join("fr.po");
        std::fs::write(&po, "").unwrap();
        std::fs::write(temp_dir.path().join("app.pot"), "").unwrap();

        let hook = MsgmergeHook::new("po-catalog-no-such-program", None);
        let result = hook.after_save(&po);
        assert!(matches!(result, Err(HookError::Spawn { .. })));
    }
}
