use crate::models::unit::RawUpload;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;

/// 支持的图片扩展名
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// 扫描输入目录，把"每个子目录一个单元"的磁盘结构转成原始上传列表
///
/// 声明路径形如 `子目录名/文件名`，后续按约定分组时在第一个分隔符处切开
pub async fn load_uploads_from_dir(folder_path: &str) -> Result<Vec<RawUpload>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut uploads = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    // 子目录顺序会影响批次处理顺序，先收集再排序保证可复现
    let mut unit_dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_dir() {
            unit_dirs.push(path);
        }
    }
    unit_dirs.sort();

    for unit_dir in unit_dirs {
        let unit_name = unit_dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let mut files = Vec::new();
        let mut unit_entries = fs::read_dir(&unit_dir)
            .await
            .with_context(|| format!("无法读取单元目录: {}", unit_dir.display()))?;
        while let Some(entry) = unit_entries.next_entry().await? {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();

        tracing::info!("正在加载单元 {} ({} 张图片)", unit_name, files.len());

        for file in files {
            let file_name = file.file_name().unwrap_or_default().to_string_lossy().to_string();
            match fs::read(&file).await {
                Ok(bytes) => uploads.push(RawUpload {
                    declared_path: format!("{}/{}", unit_name, file_name),
                    bytes,
                }),
                Err(e) => {
                    tracing::warn!("读取图片失败 {}: {}", file.display(), e);
                }
            }
        }
    }

    Ok(uploads)
}
