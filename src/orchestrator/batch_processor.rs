//! 批量单元处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量单元的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验凭证、加载规则表、准备输出目录、组装各层服务
//! 2. **并发控制**：使用 Semaphore 限制并发单元数量
//! 3. **分批处理**：将单元分批次处理，每批完成后再开始下一批
//! 4. **顺序恢复**：结果按输入顺序写回固定槽位，汇总顺序与并发无关
//! 5. **隔离兜底**：单个单元失败或超时绝不中止批次
//! 6. **资源清理**：单元结局定稿后删除其临时目录（成功失败都删）
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个单元的细节，向下委托 UnitFlow
//! - **先验后跑**：凭证缺失属于批次级错误，在任何单元开始前中止
//! - **计数一次**：汇总计数在全部结局定稿后按输入顺序折叠，不提前累计

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::clients::{ComposeClient, Compositor, OcrClient, RecognitionProvider};
use crate::config::Config;
use crate::error::{AppError, AppResult, BatchError, UnitError};
use crate::models::unit::{BatchReport, BatchSummary, LogicalUnit, UnitOutcome};
use crate::orchestrator::grouping;
use crate::services::{
    BackRuleTable, FailureWriter, FieldValidator, RecognitionGateway, SideClassifier,
};
use crate::utils::logging;
use crate::workflow::{UnitCtx, UnitFlow};

/// 应用主结构
pub struct App<P, C> {
    config: Config,
    flow: Arc<UnitFlow<P, C>>,
    failure_writer: Arc<FailureWriter>,
}

impl<P, C> std::fmt::Debug for App<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl App<OcrClient, ComposeClient> {
    /// 初始化应用：校验配置并组装真实的外部客户端
    pub fn initialize(config: Config) -> AppResult<Self> {
        if config.ocr_access_token.trim().is_empty() {
            return Err(AppError::missing_credentials("OCR_ACCESS_TOKEN"));
        }

        let rules = match &config.rules_file {
            Some(path) => Arc::new(BackRuleTable::from_file(path)?),
            None => Arc::new(BackRuleTable::default()),
        };

        let ocr_client = OcrClient::new(&config, rules.clone());
        let gateway = Arc::new(RecognitionGateway::new(ocr_client, &config));
        let classifier = SideClassifier::new(gateway, FieldValidator::new(rules));
        let compositor = Arc::new(ComposeClient::new(&config));
        let failure_writer = Arc::new(FailureWriter::new(config.failed_report_file.clone()));

        let flow = Arc::new(UnitFlow::new(
            classifier,
            compositor,
            failure_writer.clone(),
            config.output_folder.clone(),
        ));

        Self::with_flow(config, flow, failure_writer)
    }
}

impl<P, C> App<P, C>
where
    P: RecognitionProvider + 'static,
    C: Compositor + 'static,
{
    /// 用外部组装好的流程创建应用（测试用桩走这里）
    pub fn with_flow(
        config: Config,
        flow: Arc<UnitFlow<P, C>>,
        failure_writer: Arc<FailureWriter>,
    ) -> AppResult<Self> {
        std::fs::create_dir_all(&config.output_folder).map_err(|e| {
            AppError::Batch(BatchError::OutputDirUnavailable {
                path: config.output_folder.clone(),
                source: Box::new(e),
            })
        })?;

        Ok(Self {
            config,
            flow,
            failure_writer,
        })
    }

    /// 从输入目录加载、按约定分组并处理整个批次
    pub async fn run_from_input_folder(&self) -> Result<BatchReport> {
        logging::init_log_file(&self.config.output_log_file)?;

        info!("\n📁 正在扫描待处理的单元...");
        let uploads = crate::models::load_uploads_from_dir(&self.config.input_folder).await?;

        if uploads.is_empty() {
            warn!("⚠️ 没有找到待处理的图片，程序结束");
            return Ok(BatchReport {
                results: Vec::new(),
                summary: BatchSummary::default(),
            });
        }

        let units = grouping::group_units(uploads, None);
        let report = self.run(units).await?;

        // 响应面落盘，供传输层或人工取用
        let report_path = Path::new(&self.config.output_folder).join("report.json");
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;
        info!("📄 批次报告已保存至: {}", report_path.display());

        Ok(report)
    }

    /// 处理一个批次的全部单元
    pub async fn run(&self, units: Vec<LogicalUnit>) -> Result<BatchReport> {
        let total = units.len();
        log_startup(total, self.config.max_concurrent_units);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_units.max(1)));
        let unit_timeout = Duration::from_secs(self.config.unit_timeout_secs);

        // 结果按输入顺序写回固定槽位，与任务完成顺序无关
        let mut outcomes: Vec<Option<UnitOutcome>> = Vec::new();
        outcomes.resize_with(total, || None);

        let batch_size = self.config.max_concurrent_units.max(1);
        let total_batches = total.div_ceil(batch_size);
        let mut pending = units.into_iter().enumerate().collect::<Vec<_>>();

        let mut batch_num = 0usize;
        while !pending.is_empty() {
            batch_num += 1;
            let take = batch_size.min(pending.len());
            let batch: Vec<_> = pending.drain(..take).collect();
            log_batch_start(batch_num, total_batches, &batch);

            // 为本批创建并发任务
            let mut batch_handles = Vec::new();
            for (index, unit) in batch {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Other(format!("并发信号量已关闭: {}", e)))?;

                let flow = self.flow.clone();
                let failure_writer = self.failure_writer.clone();
                let unit_name = unit.name.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    let ctx = UnitCtx::new(unit.name.clone(), index + 1);

                    let outcome = match timeout(unit_timeout, flow.run(&unit, &ctx)).await {
                        Ok(Ok(outcome)) => outcome,
                        Ok(Err(unit_err)) => {
                            error!("{} ❌ {}", ctx, unit_err);
                            UnitOutcome::failure(unit.name.clone(), unit_err.to_string())
                        }
                        Err(_) => {
                            let err = UnitError::Timeout {
                                unit_name: unit.name.clone(),
                                seconds: unit_timeout.as_secs(),
                            };
                            error!("{} ❌ {}", ctx, err);
                            if let Err(e) = failure_writer.write(&unit.name, &err.to_string(), &[])
                            {
                                warn!("{} ⚠️ 失败报告写入失败: {}", ctx, e);
                            }
                            UnitOutcome::failure(unit.name.clone(), err.to_string())
                        }
                    };

                    cleanup_temp_dir(&unit);
                    (index, outcome)
                });
                batch_handles.push((index, unit_name, handle));
            }

            // 等待本批全部任务完成
            let mut batch_success = 0usize;
            let mut batch_total = 0usize;
            for (index, unit_name, handle) in batch_handles {
                batch_total += 1;
                match handle.await {
                    Ok((slot, outcome)) => {
                        if outcome.success {
                            batch_success += 1;
                        }
                        outcomes[slot] = Some(outcome);
                    }
                    Err(e) => {
                        error!("[单元 {}] 任务执行失败: {}", unit_name, e);
                        outcomes[index] =
                            Some(UnitOutcome::failure(unit_name, format!("任务执行失败: {}", e)));
                    }
                }
            }

            log_batch_complete(batch_num, batch_success, batch_total);
        }

        // 计数只在这里发生一次：全部结局定稿后按输入顺序折叠
        let results: Vec<UnitOutcome> = outcomes
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    UnitOutcome::failure(format!("unit-{}", index + 1), "结果槽位缺失")
                })
            })
            .collect();
        let summary = BatchSummary::from_outcomes(&results);

        print_final_stats(&summary, &self.config);

        Ok(BatchReport { results, summary })
    }
}

/// 删除单元的临时目录（成功失败都要删）
fn cleanup_temp_dir(unit: &LogicalUnit) {
    if let Some(dir) = &unit.temp_dir {
        if dir.exists() {
            match std::fs::remove_dir_all(dir) {
                Ok(_) => info!("[单元 {}] 🗑️ 临时目录已清理", unit.name),
                Err(e) => warn!(
                    "[单元 {}] ⚠️ 临时目录清理失败 ({}): {}",
                    unit.name,
                    dir.display(),
                    e
                ),
            }
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(total: usize, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 批次开始 - 证件合并处理模式");
    info!("📊 单元总数: {}, 最大并发数: {}", total, max_concurrent);
    info!("{}", "=".repeat(60));
}

fn log_batch_start(batch_num: usize, total_batches: usize, batch: &[(usize, LogicalUnit)]) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批 ({} 个单元)", batch_num, total_batches, batch.len());
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

fn print_final_stats(summary: &BatchSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.succeeded, summary.total);
    info!("❌ 失败: {}", summary.failed);
    if !summary.failed_unit_names.is_empty() {
        info!("失败单元: {}", summary.failed_unit_names.join("、"));
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}
