// 该文件是 Qingnang （青囊） 项目的一部分。
// src/quality.rs - 上传图像质量检查
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

use image::{GrayImage, ImageFormat};
use imageproc::filter::laplacian_filter;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::input::Upload;

const MIN_SIDE: u32 = 100;
const MAX_SIDE: u32 = 4000;
const MIN_BRIGHTNESS: f64 = 10.0;
const MAX_BRIGHTNESS: f64 = 245.0;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
  #[error("图像过小 ({0}x{1})，请上传至少 100x100 像素的图像")]
  TooSmall(u32, u32),
  #[error("图像过大 ({0}x{1})，请上传小于 4000x4000 像素的图像")]
  TooLarge(u32, u32),
  #[error("不支持的图像格式 {0:?}，请上传 JPEG 或 PNG 图像")]
  UnsupportedFormat(Option<ImageFormat>),
  #[error("图像过暗 (平均亮度 {0:.1})，请上传更清晰的图像")]
  TooDark(f64),
  #[error("图像过亮 (平均亮度 {0:.1})，请上传更清晰的图像")]
  TooBright(f64),
}

/// 尺寸、格式与整体亮度检查
pub fn validate(upload: &Upload) -> Result<(), ValidationError> {
  let (width, height) = (upload.image.width(), upload.image.height());
  if width < MIN_SIDE || height < MIN_SIDE {
    return Err(ValidationError::TooSmall(width, height));
  }
  if width > MAX_SIDE || height > MAX_SIDE {
    return Err(ValidationError::TooLarge(width, height));
  }

  match upload.format {
    Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
    other => return Err(ValidationError::UnsupportedFormat(other)),
  }

  let (brightness, _) = luma_stats(&upload.image.to_luma8());
  if brightness < MIN_BRIGHTNESS {
    return Err(ValidationError::TooDark(brightness));
  }
  if brightness > MAX_BRIGHTNESS {
    return Err(ValidationError::TooBright(brightness));
  }

  debug!("图像校验通过: {}", upload.name);
  Ok(())
}

/// 0-255 尺度下的图像属性
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProperties {
  pub width: u32,
  pub height: u32,
  pub format: Option<String>,
  pub color: String,
  pub brightness: f64,
  pub contrast: f64,
  /// 拉普拉斯响应的方差
  pub sharpness: f64,
  pub mean_color: [f64; 3],
  pub color_std: [f64; 3],
}

impl ImageProperties {
  pub fn analyze(upload: &Upload) -> Self {
    let image = &upload.image;
    let gray = image.to_luma8();
    let (brightness, contrast) = luma_stats(&gray);

    let laplacian = laplacian_filter(&gray);
    let (_, sharpness_std) = stats(laplacian.as_raw().iter().map(|&v| v as f64));

    let rgb = image.to_rgb8();
    let mut mean_color = [0.0; 3];
    let mut color_std = [0.0; 3];
    for c in 0..3 {
      let (m, s) = stats(rgb.pixels().map(|p| p[c] as f64));
      mean_color[c] = m;
      color_std[c] = s;
    }

    ImageProperties {
      width: image.width(),
      height: image.height(),
      format: upload.format.map(|f| format!("{:?}", f)),
      color: format!("{:?}", image.color()),
      brightness,
      contrast,
      sharpness: sharpness_std * sharpness_std,
      mean_color,
      color_std,
    }
  }

  /// 拍摄建议
  pub fn suggestions(&self) -> Vec<&'static str> {
    let mut suggestions = Vec::new();

    if self.brightness < 50.0 {
      suggestions.push("Image appears too dark. Try taking the photo in better lighting.");
    } else if self.brightness > 200.0 {
      suggestions.push("Image appears overexposed. Reduce lighting or camera flash.");
    }

    if self.contrast < 30.0 {
      suggestions.push("Image has low contrast. Ensure good lighting and focus.");
    }

    if self.sharpness < 100.0 {
      suggestions.push("Image appears blurry. Hold the camera steady and ensure proper focus.");
    }

    if self.width < 300 || self.height < 300 {
      suggestions.push("Image resolution is low. Try capturing a higher resolution image.");
    }

    suggestions
  }
}

fn luma_stats(gray: &GrayImage) -> (f64, f64) {
  stats(gray.as_raw().iter().map(|&v| v as f64))
}

/// 总体均值与标准差，空输入返回 0
fn stats(values: impl Iterator<Item = f64>) -> (f64, f64) {
  let (n, sum, sum_sq) = values.fold((0usize, 0.0, 0.0), |(n, s, q), v| (n + 1, s + v, q + v * v));
  if n == 0 {
    return (0.0, 0.0);
  }
  let mean = sum / n as f64;
  let var = (sum_sq / n as f64 - mean * mean).max(0.0);
  (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{DynamicImage, Rgb, RgbImage};

  fn upload(image: RgbImage, format: Option<ImageFormat>) -> Upload {
    Upload::new("test.png", DynamicImage::ImageRgb8(image), format)
  }

  fn checkerboard(side: u32) -> RgbImage {
    RgbImage::from_fn(side, side, |x, y| {
      if (x / 8 + y / 8) % 2 == 0 {
        Rgb([230, 180, 160])
      } else {
        Rgb([60, 40, 30])
      }
    })
  }

  #[test]
  fn accepts_reasonable_upload() {
    let up = upload(checkerboard(320), Some(ImageFormat::Png));
    assert_eq!(validate(&up), Ok(()));
  }

  #[test]
  fn rejects_bad_dimensions() {
    let up = upload(checkerboard(64), Some(ImageFormat::Png));
    assert_eq!(validate(&up), Err(ValidationError::TooSmall(64, 64)));

    let wide = RgbImage::from_pixel(4001, 120, Rgb([128, 128, 128]));
    let up = upload(wide, Some(ImageFormat::Jpeg));
    assert_eq!(validate(&up), Err(ValidationError::TooLarge(4001, 120)));
  }

  #[test]
  fn rejects_unsupported_format() {
    let up = upload(checkerboard(200), Some(ImageFormat::Bmp));
    assert_eq!(
      validate(&up),
      Err(ValidationError::UnsupportedFormat(Some(ImageFormat::Bmp)))
    );
    let up = upload(checkerboard(200), None);
    assert_eq!(validate(&up), Err(ValidationError::UnsupportedFormat(None)));
  }

  #[test]
  fn rejects_black_and_white_frames() {
    let up = upload(RgbImage::new(200, 200), Some(ImageFormat::Png));
    assert_eq!(validate(&up), Err(ValidationError::TooDark(0.0)));

    let white = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
    let up = upload(white, Some(ImageFormat::Png));
    assert_eq!(validate(&up), Err(ValidationError::TooBright(255.0)));
  }

  #[test]
  fn flat_dark_image_gets_suggestions() {
    let flat = RgbImage::from_pixel(200, 150, Rgb([20, 20, 20]));
    let props = ImageProperties::analyze(&upload(flat, Some(ImageFormat::Jpeg)));
    assert_eq!(props.format.as_deref(), Some("Jpeg"));
    assert!((props.brightness - 20.0).abs() < 1e-9);
    assert_eq!(props.contrast, 0.0);
    assert_eq!(props.sharpness, 0.0);
    assert_eq!(props.mean_color, [20.0; 3]);

    let suggestions = props.suggestions();
    assert_eq!(suggestions.len(), 4);
    assert!(suggestions[0].contains("too dark"));
  }

  #[test]
  fn sharp_image_has_no_blur_warning() {
    let props = ImageProperties::analyze(&upload(checkerboard(320), Some(ImageFormat::Png)));
    assert!(props.sharpness > 100.0);
    assert!(props.contrast > 30.0);
    assert!(props.suggestions().is_empty());
  }
}
