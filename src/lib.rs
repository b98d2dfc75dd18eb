// 该文件是 Qingnang （青囊） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

//! 青囊：基于手工规则的皮肤病变图像初筛演示。
//!
//! 结果仅由亮度、颜色与纹理统计量经固定规则打分得到，不是医学诊断。

use std::path::PathBuf;

use image::DynamicImage;

use crate::model::{ImageProcessingError, Jitter, Pipeline, PredictionResult, features::Sobel};

pub mod doctors;
pub mod input;
pub mod model;
pub mod output;
#[cfg(feature = "quality_check")]
pub mod quality;
pub mod record;
pub mod task;
pub mod tensor;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// URL 路径部分解码为本地路径，如 `%20` 还原为空格
pub fn url_path(url: &url::Url) -> std::io::Result<PathBuf> {
  let path = urlencoding::decode(url.path())
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
  Ok(PathBuf::from(path.into_owned()))
}

/// 分析一张已解码的图像
pub fn analyze<J: Jitter>(
  image: &DynamicImage,
  jitter: J,
) -> Result<PredictionResult, ImageProcessingError> {
  Pipeline::new(Sobel).analyze(image, jitter)
}

/// 分析编码后的图像字节（PNG/JPEG）
pub fn analyze_bytes<J: Jitter>(
  bytes: &[u8],
  jitter: J,
) -> Result<PredictionResult, ImageProcessingError> {
  Pipeline::new(Sobel).analyze_bytes(bytes, jitter)
}
