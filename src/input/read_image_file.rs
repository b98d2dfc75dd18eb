// 该文件是 Qingnang （青囊） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  url_path,
  input::{ImageFileInputError, Upload, wants_validation},
};

pub struct ImageFileInput {
  upload: Option<Upload>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let upload = Upload::open(&url_path(url)?)?;
    upload.check(wants_validation(url))?;
    info!(
      "读取图像文件: {} ({}x{})",
      upload.name,
      upload.image.width(),
      upload.image.height()
    );

    Ok(ImageFileInput {
      upload: Some(upload),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    self.upload.take()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  #[test]
  fn yields_the_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesion.png");
    RgbImage::from_pixel(120, 110, Rgb([200, 90, 80]))
      .save(&path)
      .unwrap();

    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&url.as_str().replacen("file", "image", 1)).unwrap();
    let mut input = ImageFileInput::from_url(&url).unwrap();

    let upload = input.next().unwrap();
    assert_eq!(upload.name, "lesion.png");
    assert_eq!(upload.format, Some(image::ImageFormat::Png));
    assert_eq!((upload.image.width(), upload.image.height()), (120, 110));
    assert!(input.next().is_none());
  }

  #[test]
  fn escaped_path_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("left arm.png");
    RgbImage::from_pixel(120, 110, Rgb([200, 90, 80]))
      .save(&path)
      .unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let upload = ImageFileInput::from_url(&url).unwrap().next().unwrap();
    assert_eq!(upload.name, "left arm.png");
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("folder:///tmp").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::SchemaMismatch)
    ));
  }

  #[test]
  fn missing_file_is_io_error() {
    let url = Url::parse("image:///nonexistent/qingnang/lesion.png").unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::IoError(_))
    ));
  }

  #[cfg(feature = "quality_check")]
  #[test]
  fn validation_rejects_tiny_upload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.png");
    RgbImage::from_pixel(32, 32, Rgb([200, 90, 80]))
      .save(&path)
      .unwrap();

    let url = Url::parse(&format!("image://{}?validate", path.display())).unwrap();
    assert!(matches!(
      ImageFileInput::from_url(&url),
      Err(ImageFileInputError::ValidationError(_))
    ));
  }
}
