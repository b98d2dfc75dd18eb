// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/preprocess.rs - 图像预处理
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

use image::{DynamicImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;

use crate::tensor::{INPUT_SIZE, ImageTensor};

#[derive(Error, Debug)]
pub enum ImageProcessingError {
  #[error("图像解码错误: {0}")]
  Decode(#[from] image::ImageError),
  #[error("图像尺寸为零: {0}x{1}")]
  EmptyImage(u32, u32),
}

/// 解码原始字节，格式由内容推断
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageProcessingError> {
  Ok(image::load_from_memory(bytes)?)
}

/// 转为 RGB，双线性缩放到 224x224，再将 0-255 映射到 [0, 1]
pub fn preprocess(image: &DynamicImage) -> Result<ImageTensor, ImageProcessingError> {
  let (width, height) = (image.width(), image.height());
  if width == 0 || height == 0 {
    return Err(ImageProcessingError::EmptyImage(width, height));
  }

  let rgb = image.to_rgb8();
  let resized = if (width, height) == (INPUT_SIZE, INPUT_SIZE) {
    rgb
  } else {
    debug!("缩放图像: {}x{} -> {}x{}", width, height, INPUT_SIZE, INPUT_SIZE);
    image::imageops::resize(&rgb, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
  };

  Ok(ImageTensor::from(&resized))
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{GrayImage, Luma, Rgba, RgbaImage};

  #[test]
  fn any_mode_becomes_224_rgb() {
    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 480, Luma([255])));
    let tensor = preprocess(&gray).unwrap();
    assert_eq!(tensor.height(), 224);
    assert_eq!(tensor.width(), 224);
    assert_eq!(tensor.channels(), 3);
    assert!(tensor.as_ref().iter().all(|&v| (v - 1.0).abs() < 1e-6));
  }

  #[test]
  fn alpha_is_dropped() {
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0])));
    let tensor = preprocess(&rgba).unwrap();
    assert_eq!(tensor.pixel(100, 100), [1.0, 0.0, 0.0]);
  }

  #[test]
  fn zero_sized_image_is_rejected() {
    let empty = DynamicImage::new_rgb8(0, 0);
    assert!(matches!(
      preprocess(&empty),
      Err(ImageProcessingError::EmptyImage(0, 0))
    ));
  }

  #[test]
  fn garbage_bytes_fail_to_decode() {
    assert!(matches!(
      decode(b"definitely not an image"),
      Err(ImageProcessingError::Decode(_))
    ));
  }

  #[test]
  fn resize_is_deterministic() {
    let image = DynamicImage::ImageRgb8(image::RgbImage::from_fn(97, 53, |x, y| {
      image::Rgb([(x * 2) as u8, (y * 4) as u8, ((x + y) % 256) as u8])
    }));
    assert_eq!(preprocess(&image).unwrap(), preprocess(&image).unwrap());
  }
}
