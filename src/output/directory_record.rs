// 该文件是 Qingnang （青囊） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use chrono::{Datelike, Utc};
use image::RgbImage;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Upload,
  model::{
    ImageProcessingError, PredictionResult,
    preprocess::preprocess,
  },
  output::Render,
  record::{RecordError, RecordStore},
  url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("记录错误: {0}")]
  RecordError(#[from] RecordError),
  #[error("图像处理错误: {0}")]
  ImageProcessingError(#[from] ImageProcessingError),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 将每次预测追加到记录目录；带 `image` 参数时同时保存预处理后的图像
pub struct DirectoryRecordOutput {
  store: RecordStore,
  save_image: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let save_image = uri.query_pairs().any(|(k, _)| k == "image");

    Ok(DirectoryRecordOutput {
      store: RecordStore::open(url_path(uri)?)?,
      save_image,
    })
  }
}

impl DirectoryRecordOutput {
  pub fn store(&self) -> &RecordStore {
    &self.store
  }

  fn image_path(&self, id: u64) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .store
      .directory()
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!("{}-{:04X}.png", now.format("%H-%M-%S"), id)))
  }

  fn save_image(&self, id: u64, image: &RgbImage) -> Result<PathBuf, DirectoryRecordOutputError> {
    let path = self.image_path(id)?;
    image.save(&path)?;
    debug!("保存预处理图像: {}", path.display());
    Ok(path)
  }
}

impl Render<Upload, PredictionResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Upload, result: &PredictionResult) -> Result<(), Self::Error> {
    // 预处理失败时不写记录
    let image = if self.save_image {
      Some(preprocess(&frame.image)?.to_rgb_image())
    } else {
      None
    };

    let record = self.store.save_prediction(&frame.name, result)?;
    if let Some(image) = image {
      if let Err(e) = self.save_image(record.id, &image) {
        warn!("预测记录 {} 已保存，但图像保存失败: {}", record.id, e);
      }
    }
    Ok(())
  }
}
