//! 原始上传分组 - 编排层
//!
//! 在批次处理开始前，把原始上传项组装成逻辑单元：
//! - 调用方给出显式声明时，按声明的单元/文件名配对（大小写不敏感），
//!   每个上传项最多被一个单元认领（按声明顺序）
//! - 未给出声明时，按约定分组：声明路径在第一个分隔符处切开，
//!   前半是单元名，后半是文件名
//!
//! 声明的单元一个文件都没匹配到时产出零图片单元，
//! 随后走"图片数量不足"路径失败，错误信息会提示配对可能失败

use std::collections::HashMap;

use tracing::{info, warn};

use crate::models::unit::{LogicalUnit, RawUpload, UnitImage, UnitSpec};

/// 把原始上传项组装成逻辑单元
pub fn group_units(uploads: Vec<RawUpload>, specs: Option<&[UnitSpec]>) -> Vec<LogicalUnit> {
    match specs {
        Some(specs) => group_by_specs(uploads, specs),
        None => group_by_convention(uploads),
    }
}

/// 按显式声明分组
fn group_by_specs(uploads: Vec<RawUpload>, specs: &[UnitSpec]) -> Vec<LogicalUnit> {
    let mut pool: Vec<Option<RawUpload>> = uploads.into_iter().map(Some).collect();
    let mut units = Vec::with_capacity(specs.len());

    for spec in specs {
        let mut images = Vec::new();
        for expected in &spec.expected_file_names {
            let expected_lower = expected.to_lowercase();
            let mut claimed = None;
            for slot in pool.iter_mut() {
                let matched = slot
                    .as_ref()
                    .map(|u| file_name_of(&u.declared_path).to_lowercase() == expected_lower)
                    .unwrap_or(false);
                if matched {
                    claimed = slot.take();
                    break;
                }
            }
            if let Some(upload) = claimed {
                images.push(UnitImage {
                    name: file_name_of(&upload.declared_path).to_string(),
                    bytes: upload.bytes,
                });
            } else {
                warn!(
                    "[单元 {}] 声明的文件 {} 未匹配到任何上传项",
                    spec.unit_name, expected
                );
            }
        }

        if images.is_empty() {
            warn!("[单元 {}] 没有匹配到任何上传文件", spec.unit_name);
        }

        units.push(LogicalUnit::new(spec.unit_name.clone(), images));
    }

    let unclaimed = pool.iter().filter(|slot| slot.is_some()).count();
    if unclaimed > 0 {
        info!("有 {} 个上传项未被任何声明单元认领，已忽略", unclaimed);
    }

    units
}

/// 按约定分组：路径在第一个分隔符处切开
fn group_by_convention(uploads: Vec<RawUpload>) -> Vec<LogicalUnit> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<UnitImage>> = HashMap::new();

    for upload in uploads {
        let (unit_name, file_name) = split_on_first_separator(&upload.declared_path);
        if !grouped.contains_key(&unit_name) {
            order.push(unit_name.clone());
        }
        grouped.entry(unit_name).or_default().push(UnitImage {
            name: file_name,
            bytes: upload.bytes,
        });
    }

    order
        .into_iter()
        .map(|name| {
            let images = grouped.remove(&name).unwrap_or_default();
            LogicalUnit::new(name, images)
        })
        .collect()
}

/// 在第一个分隔符处切开声明路径；没有分隔符时按文件主名成组
fn split_on_first_separator(path: &str) -> (String, String) {
    match path.find(['/', '\\']) {
        Some(index) => (path[..index].to_string(), path[index + 1..].to_string()),
        None => {
            let stem = path.rsplit_once('.').map(|(s, _)| s).unwrap_or(path);
            (stem.to_string(), path.to_string())
        }
    }
}

/// 路径的文件名部分
fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(path: &str) -> RawUpload {
        RawUpload {
            declared_path: path.to_string(),
            bytes: vec![1],
        }
    }

    fn spec(name: &str, files: &[&str]) -> UnitSpec {
        UnitSpec {
            unit_name: name.to_string(),
            expected_file_names: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_convention_groups_by_first_separator() {
        let units = group_units(
            vec![
                upload("alice/front.jpg"),
                upload("alice/back.jpg"),
                upload("bob/scan.jpg"),
            ],
            None,
        );
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name, "alice");
        assert_eq!(units[0].images.len(), 2);
        assert_eq!(units[0].images[0].name, "front.jpg");
        assert_eq!(units[1].name, "bob");
    }

    #[test]
    fn test_convention_preserves_first_seen_order() {
        let units = group_units(
            vec![
                upload("zeta/1.jpg"),
                upload("alpha/1.jpg"),
                upload("zeta/2.jpg"),
            ],
            None,
        );
        assert_eq!(units[0].name, "zeta");
        assert_eq!(units[1].name, "alpha");
        assert_eq!(units[0].images.len(), 2);
    }

    #[test]
    fn test_convention_splits_only_first_separator() {
        let units = group_units(vec![upload("alice/scans/front.jpg")], None);
        assert_eq!(units[0].name, "alice");
        assert_eq!(units[0].images[0].name, "scans/front.jpg");
    }

    #[test]
    fn test_separatorless_path_groups_by_stem() {
        let units = group_units(vec![upload("loose.jpg")], None);
        assert_eq!(units[0].name, "loose");
        assert_eq!(units[0].images[0].name, "loose.jpg");
    }

    #[test]
    fn test_specs_match_case_insensitively() {
        let units = group_units(
            vec![upload("x/Front.JPG"), upload("y/BACK.jpg")],
            Some(&[spec("alice", &["front.jpg", "back.jpg"])]),
        );
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "alice");
        assert_eq!(units[0].images.len(), 2);
    }

    #[test]
    fn test_unmatched_spec_yields_empty_unit() {
        let units = group_units(
            vec![upload("x/other.jpg")],
            Some(&[spec("ghost", &["a.jpg", "b.jpg"])]),
        );
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "ghost");
        assert!(units[0].images.is_empty());
    }

    /// 每个上传项最多被一个单元认领，按声明顺序
    #[test]
    fn test_upload_claimed_once() {
        let units = group_units(
            vec![upload("x/shared.jpg")],
            Some(&[
                spec("first", &["shared.jpg"]),
                spec("second", &["shared.jpg"]),
            ]),
        );
        assert_eq!(units[0].images.len(), 1);
        assert!(units[1].images.is_empty());
    }
}
