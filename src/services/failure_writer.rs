//! 失败单元报告服务 - 业务能力层
//!
//! 只负责"把失败单元写进报告文件"能力，不关心流程
//!
//! 报告面向运维：除失败原因外，附上各候选图片的校验记录，
//! 便于排查误分类

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::verdict::ImageCandidate;

/// 失败单元报告服务
pub struct FailureWriter {
    report_file_path: String,
}

impl FailureWriter {
    /// 创建新的报告服务
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            report_file_path: path.into(),
        }
    }

    /// 追加一条失败记录
    ///
    /// # 参数
    /// - `unit_name`: 单元名
    /// - `reason`: 失败原因
    /// - `candidates`: 已完成的分类结论（可能为空，如图片数量不足时）
    pub fn write(
        &self,
        unit_name: &str,
        reason: &str,
        candidates: &[ImageCandidate],
    ) -> Result<()> {
        debug!("写入失败报告: 单元 {} | 原因: {}", unit_name, reason);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.report_file_path)?;

        let mut record = format!("单元 {} | 原因: {}\n", unit_name, reason);
        for candidate in candidates {
            record.push_str(&format!(
                "  图片 {} | 正面 {} 分 | 背面 {} 分\n",
                candidate.image_name,
                candidate.front_score(),
                candidate.back_score()
            ));
            for verdict in [&candidate.front_verdict, &candidate.back_verdict]
                .into_iter()
                .flatten()
            {
                for reason_line in &verdict.reasons {
                    record.push_str(&format!("    {}\n", reason_line));
                }
            }
        }

        file.write_all(record.as_bytes())?;

        Ok(())
    }
}
