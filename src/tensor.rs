// 该文件是 Qingnang （青囊） 项目的一部分。
// src/tensor.rs - HWC 浮点张量定义
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

use std::slice::ChunksExact;

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

pub const RGB_CHANNELS: usize = 3;

/// 预处理后的固定边长
pub const INPUT_SIZE: u32 = 224;

#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
  #[error("张量尺寸为零: {0}x{1}")]
  ZeroSized(usize, usize),
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("采样值超出 [0, 1] 范围: 索引 {index}, 值 {value}")]
  OutOfRange { index: usize, value: f32 },
}

/// HWC 排布的 RGB 浮点张量，取值范围 [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
  height: usize,
  width: usize,
  data: Box<[f32]>,
}

impl ImageTensor {
  pub fn from_raw(height: usize, width: usize, data: Vec<f32>) -> Result<Self, TensorError> {
    if height == 0 || width == 0 {
      return Err(TensorError::ZeroSized(height, width));
    }

    let expected = RGB_CHANNELS * height * width;
    if data.len() != expected {
      return Err(TensorError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    if let Some((index, &value)) = data
      .iter()
      .enumerate()
      .find(|(_, v)| !(0.0..=1.0).contains(*v))
    {
      return Err(TensorError::OutOfRange { index, value });
    }

    Ok(Self {
      height,
      width,
      data: data.into_boxed_slice(),
    })
  }

  /// 按像素生成张量，`f(y, x)` 返回该像素的 RGB 值
  pub fn from_fn<F>(height: usize, width: usize, mut f: F) -> Result<Self, TensorError>
  where
    F: FnMut(usize, usize) -> [f32; RGB_CHANNELS],
  {
    let mut data = Vec::with_capacity(RGB_CHANNELS * height * width);
    for y in 0..height {
      for x in 0..width {
        data.extend_from_slice(&f(y, x));
      }
    }
    Self::from_raw(height, width, data)
  }

  pub fn filled(height: usize, width: usize, rgb: [f32; RGB_CHANNELS]) -> Result<Self, TensorError> {
    Self::from_fn(height, width, |_, _| rgb)
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn pixel(&self, y: usize, x: usize) -> [f32; RGB_CHANNELS] {
    let idx = (y * self.width + x) * RGB_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  pub fn pixels(&self) -> ChunksExact<'_, f32> {
    self.data.chunks_exact(RGB_CHANNELS)
  }

  /// 三通道等权平均得到的灰度平面（不是感知亮度加权）
  pub fn gray(&self) -> GrayPlane {
    let data = self
      .pixels()
      .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
      .collect::<Vec<_>>();
    GrayPlane {
      height: self.height,
      width: self.width,
      data: data.into_boxed_slice(),
    }
  }

  /// 全部采样值的算术平均
  pub fn mean(&self) -> f64 {
    self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
  }
}

impl AsRef<[f32]> for ImageTensor {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

impl From<&RgbImage> for ImageTensor {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let data = image
      .as_raw()
      .iter()
      .map(|&v| v as f32 / 255.0)
      .collect::<Vec<_>>();

    Self {
      height: height as usize,
      width: width as usize,
      data: data.into_boxed_slice(),
    }
  }
}

impl ImageTensor {
  pub fn to_rgb_image(&self) -> RgbImage {
    ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
      let [r, g, b] = self.pixel(y as usize, x as usize);
      Rgb([to_u8(r), to_u8(g), to_u8(b)])
    })
  }
}

fn to_u8(v: f32) -> u8 {
  (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// 单通道 f64 平面
#[derive(Debug, Clone, PartialEq)]
pub struct GrayPlane {
  height: usize,
  width: usize,
  data: Box<[f64]>,
}

impl GrayPlane {
  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  /// 越界坐标取最近的边缘像素
  pub fn get_clamped(&self, y: isize, x: isize) -> f64 {
    let y = y.clamp(0, self.height as isize - 1) as usize;
    let x = x.clamp(0, self.width as isize - 1) as usize;
    self.data[y * self.width + x]
  }

  pub fn values(&self) -> &[f64] {
    &self.data
  }
}
