//! 单元配对服务 - 业务能力层
//!
//! 只负责"从已分类的候选中挑出正背一对"能力，不做任何 I/O
//!
//! 必须等单元内全部图片分类完成后再挑选：最佳背面依赖正面已被谁占用，
//! 需要全局视角。正背互斥，一张图片绝不会同时当选两面。

use tracing::{info, warn};

use crate::error::UnitError;
use crate::models::extraction::FrontFields;
use crate::models::unit::LogicalUnit;
use crate::models::verdict::{ImageCandidate, RecommendedSide};

/// 配对结果
#[derive(Debug)]
pub struct MatchSelection {
    /// 正面图片在单元内的下标
    pub front_index: usize,
    /// 背面图片在单元内的下标（必不等于 front_index）
    pub back_index: usize,
    /// 提取的姓名（无法提取时回退为单元名）
    pub extracted_name: String,
    /// 正面提取字段
    pub front_fields: Option<FrontFields>,
    /// 背面为兜底选择时的降级标记，写入结果供下游知晓校验未通过
    pub back_note: Option<String>,
}

/// 单元配对服务
pub struct BatchMatcher;

impl BatchMatcher {
    /// 在已分类的候选中选出正背一对
    ///
    /// 候选列表与 `unit.images` 按下标一一对应。
    /// 正面池：推荐为正面或正面得分 > 0，按正面得分降序（稳定排序，
    /// 平分时保持单元内顺序）；池空时回退为单元首图、姓名回退为单元名。
    /// 背面池：推荐为背面或背面得分 > 0，排除已当选的正面，按背面得分
    /// 降序；池空时回退为首张非正面图片并打降级标记。
    pub fn select(
        unit: &LogicalUnit,
        candidates: &[ImageCandidate],
    ) -> Result<MatchSelection, UnitError> {
        // 少于 2 张的单元不应到达这里，编排层已提前拒绝；防御复查
        if unit.images.len() < 2 {
            return Err(UnitError::InsufficientImages {
                unit_name: unit.name.clone(),
                count: unit.images.len(),
            });
        }

        // ========== 正面挑选 ==========
        let mut front_pool: Vec<usize> = (0..candidates.len())
            .filter(|&i| {
                candidates[i].recommended_side == RecommendedSide::Front
                    || candidates[i].front_score() > 0
            })
            .collect();
        front_pool.sort_by(|&a, &b| candidates[b].front_score().cmp(&candidates[a].front_score()));

        let (front_index, extracted_name, front_fields) = match front_pool.first() {
            Some(&index) => {
                let fields = candidates[index].front_fields.clone();
                let name = fields
                    .as_ref()
                    .map(|f| f.name.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| unit.name.clone());
                (index, name, fields)
            }
            None => {
                warn!(
                    "[单元 {}] 没有任何正面候选，回退为首图，姓名取单元名",
                    unit.name
                );
                (0, unit.name.clone(), None)
            }
        };

        // ========== 背面挑选（排除已当选的正面） ==========
        let mut back_pool: Vec<usize> = (0..candidates.len())
            .filter(|&i| {
                i != front_index
                    && (candidates[i].recommended_side == RecommendedSide::Back
                        || candidates[i].back_score() > 0)
            })
            .collect();
        back_pool.sort_by(|&a, &b| candidates[b].back_score().cmp(&candidates[a].back_score()));

        let (back_index, back_note) = match back_pool.first() {
            Some(&index) => (index, None),
            None => {
                // 兜底：取首张非正面图片，不看得分，打降级标记
                let fallback = (0..unit.images.len()).find(|&i| i != front_index);
                match fallback {
                    Some(index) => {
                        warn!(
                            "[单元 {}] 没有通过校验的背面候选，兜底选择 {}",
                            unit.name, candidates[index].image_name
                        );
                        (
                            index,
                            Some(format!(
                                "背面为兜底选择 ({}): 校验未通过",
                                candidates[index].image_name
                            )),
                        )
                    }
                    None => {
                        return Err(UnitError::DocumentIncomplete {
                            unit_name: unit.name.clone(),
                        })
                    }
                }
            }
        };

        info!(
            "[单元 {}] 配对完成: 正面 {} ({} 分), 背面 {} ({} 分)",
            unit.name,
            candidates[front_index].image_name,
            candidates[front_index].front_score(),
            candidates[back_index].image_name,
            candidates[back_index].back_score(),
        );

        Ok(MatchSelection {
            front_index,
            back_index,
            extracted_name,
            front_fields,
            back_note,
        })
    }
}
