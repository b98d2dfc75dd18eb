// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/features.rs - 图像特征提取
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::tensor::{GrayPlane, ImageTensor, RGB_CHANNELS};

/// 灰度低于该值的像素计为暗像素
pub const DARK_THRESHOLD: f64 = 0.3;

// 降级特征的固定取值
pub const DEGRADED_CONTRAST: f64 = 0.5;
pub const DEGRADED_TEXTURE_STRENGTH: f64 = 0.5;
pub const DEGRADED_DARK_PIXELS_RATIO: f64 = 0.3;
pub const DEGRADED_COLOR_VARIATION: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
  pub brightness: f64,
  pub contrast: f64,
  pub avg_red: f64,
  pub avg_green: f64,
  pub avg_blue: f64,
  pub texture_strength: f64,
  pub dark_pixels_ratio: f64,
  pub color_variation: f64,
}

impl FeatureVector {
  /// 梯度不可用时的降级特征，除亮度外均为固定值
  pub fn degraded(mean: f64) -> Self {
    FeatureVector {
      brightness: mean,
      contrast: DEGRADED_CONTRAST,
      avg_red: mean,
      avg_green: mean,
      avg_blue: mean,
      texture_strength: DEGRADED_TEXTURE_STRENGTH,
      dark_pixels_ratio: DEGRADED_DARK_PIXELS_RATIO,
      color_variation: DEGRADED_COLOR_VARIATION,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
  Full,
  Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extraction {
  pub features: FeatureVector,
  pub mode: ExtractionMode,
}

#[derive(Error, Debug, PartialEq)]
pub enum GradientError {
  #[error("梯度算子不可用")]
  Unavailable,
  #[error("灰度平面为空")]
  EmptyPlane,
  #[error("梯度幅值非有限: 索引 {0}")]
  NonFinite(usize),
}

/// 灰度平面上的梯度幅值算子
pub trait Gradient {
  fn magnitude(&self, plane: &GrayPlane) -> Result<Vec<f64>, GradientError>;
}

/// 3x3 Sobel 算子，边界复制边缘像素
#[derive(Debug, Clone, Copy, Default)]
pub struct Sobel;

const SOBEL_SMOOTH: [f64; 3] = [1.0, 2.0, 1.0];

impl Gradient for Sobel {
  fn magnitude(&self, plane: &GrayPlane) -> Result<Vec<f64>, GradientError> {
    if plane.is_empty() {
      return Err(GradientError::EmptyPlane);
    }

    let (h, w) = (plane.height() as isize, plane.width() as isize);
    let mut out = Vec::with_capacity(plane.len());

    for y in 0..h {
      for x in 0..w {
        let mut gy = 0.0;
        let mut gx = 0.0;
        for (k, weight) in (-1..=1).zip(SOBEL_SMOOTH) {
          gy += weight * (plane.get_clamped(y + 1, x + k) - plane.get_clamped(y - 1, x + k));
          gx += weight * (plane.get_clamped(y + k, x + 1) - plane.get_clamped(y + k, x - 1));
        }
        let magnitude = (gx * gx + gy * gy).sqrt();
        if !magnitude.is_finite() {
          return Err(GradientError::NonFinite(out.len()));
        }
        out.push(magnitude);
      }
    }

    Ok(out)
  }
}

/// 始终不可用的梯度算子，用于关闭纹理计算
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGradient;

impl Gradient for NoGradient {
  fn magnitude(&self, _plane: &GrayPlane) -> Result<Vec<f64>, GradientError> {
    Err(GradientError::Unavailable)
  }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor<G> {
  gradient: G,
}

impl<G: Gradient> FeatureExtractor<G> {
  pub fn new(gradient: G) -> Self {
    Self { gradient }
  }

  pub fn extract(&self, tensor: &ImageTensor) -> Extraction {
    let gray = tensor.gray();

    let texture = match self.gradient.magnitude(&gray) {
      Ok(magnitude) => mean(&magnitude),
      Err(e) => {
        warn!("纹理计算失败，使用降级特征: {}", e);
        return Extraction {
          features: FeatureVector::degraded(tensor.mean()),
          mode: ExtractionMode::Degraded,
        };
      }
    };

    let (brightness, contrast) = mean_std(gray.values().iter().copied());

    let mut channel_mean = [0.0; RGB_CHANNELS];
    let mut channel_std = [0.0; RGB_CHANNELS];
    for c in 0..RGB_CHANNELS {
      let (m, s) = mean_std(tensor.pixels().map(|p| p[c] as f64));
      channel_mean[c] = m;
      channel_std[c] = s;
    }

    let dark = gray.values().iter().filter(|&&v| v < DARK_THRESHOLD).count();

    let features = FeatureVector {
      brightness,
      contrast,
      avg_red: channel_mean[0],
      avg_green: channel_mean[1],
      avg_blue: channel_mean[2],
      texture_strength: texture,
      dark_pixels_ratio: dark as f64 / gray.len() as f64,
      color_variation: channel_std.iter().sum::<f64>() / RGB_CHANNELS as f64,
    };
    debug!("图像特征: {:?}", features);

    Extraction {
      features,
      mode: ExtractionMode::Full,
    }
  }
}

fn mean(values: &[f64]) -> f64 {
  values.iter().sum::<f64>() / values.len() as f64
}

/// 总体均值与总体标准差
fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
  let (sum, count) = values.clone().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
  let m = sum / count as f64;
  let var = values.map(|v| (v - m) * (v - m)).sum::<f64>() / count as f64;
  (m, var.sqrt())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
  }

  #[test]
  fn all_black_tensor() {
    let tensor = ImageTensor::filled(224, 224, [0.0; 3]).unwrap();
    let Extraction { features, mode } = FeatureExtractor::new(Sobel).extract(&tensor);
    assert_eq!(mode, ExtractionMode::Full);
    assert!(approx(features.brightness, 0.0));
    assert!(approx(features.contrast, 0.0));
    assert!(approx(features.texture_strength, 0.0));
    assert!(approx(features.dark_pixels_ratio, 1.0));
    assert!(approx(features.color_variation, 0.0));
  }

  #[test]
  fn uniform_fill_has_no_variation() {
    let tensor = ImageTensor::filled(224, 224, [0.65, 0.3, 0.3]).unwrap();
    let features = FeatureExtractor::new(Sobel).extract(&tensor).features;
    assert!(approx(features.avg_red, 0.65));
    assert!(approx(features.avg_green, 0.3));
    assert!(approx(features.avg_blue, 0.3));
    assert!(approx(features.brightness, 1.25 / 3.0));
    assert!(approx(features.color_variation, 0.0));
    assert!(approx(features.texture_strength, 0.0));
    assert!(approx(features.dark_pixels_ratio, 0.0));
  }

  #[test]
  fn vertical_step_edge() {
    // 左半黑右半白：仅分界两侧两列梯度为 4
    let tensor =
      ImageTensor::from_fn(224, 224, |_, x| if x < 112 { [0.0; 3] } else { [1.0; 3] }).unwrap();
    let features = FeatureExtractor::new(Sobel).extract(&tensor).features;
    assert!(approx(features.brightness, 0.5));
    assert!(approx(features.contrast, 0.5));
    assert!(approx(features.dark_pixels_ratio, 0.5));
    assert!(approx(features.color_variation, 0.5));
    assert!(approx(features.texture_strength, 8.0 / 224.0));
  }

  #[test]
  fn sobel_on_single_pixel() {
    let tensor = ImageTensor::filled(1, 1, [0.2, 0.4, 0.6]).unwrap();
    let magnitude = Sobel.magnitude(&tensor.gray()).unwrap();
    assert_eq!(magnitude, vec![0.0]);
  }

  #[cfg(feature = "quality_check")]
  #[test]
  fn sobel_matches_imageproc_gradients() {
    let level = |x: u32, y: u32| ((x * 37 + y * 91 + x * y * 13) % 256) as u8;
    let (w, h) = (9u32, 7u32);
    let gray = image::GrayImage::from_fn(w, h, |x, y| image::Luma([level(x, y)]));
    let tensor = ImageTensor::from_fn(h as usize, w as usize, |y, x| {
      [level(x as u32, y as u32) as f32 / 255.0; 3]
    })
    .unwrap();

    let ours = Sobel.magnitude(&tensor.gray()).unwrap();
    let reference = imageproc::gradients::sobel_gradients(&gray);
    for y in 0..h {
      for x in 0..w {
        let expected = reference.get_pixel(x, y)[0] as f64;
        let actual = ours[(y * w + x) as usize] * 255.0;
        assert!((expected - actual).abs() <= 1.0, "({x}, {y}): {expected} vs {actual}");
      }
    }
  }

  #[test]
  fn degraded_extraction_uses_literal_defaults() {
    let tensor = ImageTensor::from_fn(8, 8, |y, _| if y < 4 { [0.9, 0.1, 0.2] } else { [0.0; 3] })
      .unwrap();
    let Extraction { features, mode } = FeatureExtractor::new(NoGradient).extract(&tensor);
    assert_eq!(mode, ExtractionMode::Degraded);

    let mean = 0.5 * (0.9 + 0.1 + 0.2) / 3.0;
    assert!(approx(features.brightness, mean));
    assert!(approx(features.avg_red, mean));
    assert!(approx(features.avg_green, mean));
    assert!(approx(features.avg_blue, mean));
    assert_eq!(features.contrast, 0.5);
    assert_eq!(features.texture_strength, 0.5);
    assert_eq!(features.dark_pixels_ratio, 0.3);
    assert_eq!(features.color_variation, 0.4);
  }

  #[test]
  fn degraded_extraction_is_reproducible() {
    let tensor = ImageTensor::filled(16, 16, [0.3, 0.6, 0.9]).unwrap();
    let extractor = FeatureExtractor::new(NoGradient);
    assert_eq!(extractor.extract(&tensor), extractor.extract(&tensor));
  }
}
