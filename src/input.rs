// 该文件是 Qingnang （青囊） 项目的一部分。
// src/input.rs - 上传图像输入
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

use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

mod read_directory;
mod read_image_file;

pub use self::read_directory::DirectoryInput;
pub use self::read_image_file::ImageFileInput;

/// 一次上传：文件名、解码后的图像与原始格式
#[derive(Debug, Clone)]
pub struct Upload {
  pub name: String,
  pub image: DynamicImage,
  pub format: Option<ImageFormat>,
}

impl Upload {
  pub fn new(name: impl Into<String>, image: DynamicImage, format: Option<ImageFormat>) -> Self {
    Upload {
      name: name.into(),
      image,
      format,
    }
  }

  pub fn open(path: &Path) -> Result<Self, ImageFileInputError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?;
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());

    Ok(Upload::new(name, image, format))
  }

  /// 按 URL 查询参数决定是否执行质量校验
  #[cfg(feature = "quality_check")]
  fn check(&self, enabled: bool) -> Result<(), ImageFileInputError> {
    if enabled {
      crate::quality::validate(self)?;
    }
    Ok(())
  }

  #[cfg(not(feature = "quality_check"))]
  fn check(&self, enabled: bool) -> Result<(), ImageFileInputError> {
    if enabled {
      tracing::warn!("未启用 quality_check 特性，跳过图像校验: {}", self.name);
    }
    Ok(())
  }
}

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[cfg(feature = "quality_check")]
  #[error("Image validation error: {0}")]
  ValidationError(#[from] crate::quality::ValidationError),
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

fn wants_validation(url: &Url) -> bool {
  url.query_pairs().any(|(k, _)| k == "validate")
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  ReadDirectory(DirectoryInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ImageFileInput::SCHEME => Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?)),
      DirectoryInput::SCHEME => Ok(InputWrapper::ReadDirectory(DirectoryInput::from_url(url)?)),
      _ => Err(InputError::SchemeMismatch),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next(),
      InputWrapper::ReadDirectory(input) => input.next(),
    }
  }
}
