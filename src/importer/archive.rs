// ==========================================
// ERP 表格导入 - 源文件归档
// ==========================================
// 规则: 提交成功后将源文件移动到 <history>/<YYYYmmdd_HHMMSS>_<文件名>
// 规则: 目标已存在时追加序号，不覆盖已有归档
// 红线: 只在事务提交之后调用
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub trait Archiver {
    /// 归档源文件
    ///
    /// # 返回
    /// - Ok(PathBuf): 归档后的路径
    fn archive(&self, source: &Path) -> ImportResult<PathBuf>;
}

/// 移动到历史目录的归档器
#[derive(Debug, Clone)]
pub struct HistoryArchiver {
    history_dir: PathBuf,
}

impl HistoryArchiver {
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        Self {
            history_dir: history_dir.into(),
        }
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// 计算归档目标路径
    pub fn target_path(&self, source: &Path, at: DateTime<Local>) -> ImportResult<PathBuf> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ImportError::ArchiveError(format!("无效的文件路径: {}", source.display())))?;

        let archived_name = format!(
            "{}_{}",
            at.format(ARCHIVE_TIMESTAMP_FORMAT),
            file_name.to_string_lossy()
        );
        Ok(self.history_dir.join(archived_name))
    }

    /// 同一秒内归档同名文件时追加序号: <stem>_1.<ext>, <stem>_2.<ext> ...
    fn free_target(target: PathBuf) -> PathBuf {
        if !target.exists() {
            return target;
        }

        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = target.extension().map(|e| e.to_string_lossy().into_owned());

        let mut n = 1u32;
        loop {
            let name = match &ext {
                Some(ext) => format!("{}_{}.{}", stem, n, ext),
                None => format!("{}_{}", stem, n),
            };
            let candidate = target.with_file_name(name);
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }

    fn archive_at(&self, source: &Path, at: DateTime<Local>) -> ImportResult<PathBuf> {
        fs::create_dir_all(&self.history_dir).map_err(|e| {
            ImportError::ArchiveError(format!("无法创建归档目录 {}: {}", self.history_dir.display(), e))
        })?;

        let target = Self::free_target(self.target_path(source, at)?);

        // 跨文件系统时 rename 失败，退回复制后删除
        if fs::rename(source, &target).is_err() {
            fs::copy(source, &target)
                .and_then(|_| fs::remove_file(source))
                .map_err(|e| ImportError::ArchiveError(format!("{} → {}: {}", source.display(), target.display(), e)))?;
        }

        debug!(from = %source.display(), to = %target.display(), "源文件已归档");
        Ok(target)
    }
}

impl Archiver for HistoryArchiver {
    fn archive(&self, source: &Path) -> ImportResult<PathBuf> {
        self.archive_at(source, Local::now())
    }
}
