// 该文件是 Qingnang （青囊） 项目的一部分。
// src/input/read_directory.rs - 目录批量输入
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

use std::{collections::VecDeque, path::PathBuf};

use tracing::{error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  url_path,
  input::{ImageFileInputError, Upload, wants_validation},
};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 按文件名顺序逐个读取目录中的 PNG/JPEG 图像，读取或校验失败的文件被跳过
pub struct DirectoryInput {
  pending: VecDeque<PathBuf>,
  validate: bool,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let directory = url_path(url)?;
    let mut files = std::fs::read_dir(&directory)?
      .filter_map(|entry| entry.ok().map(|e| e.path()))
      .filter(|path| {
        path.is_file()
          && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
      })
      .collect::<Vec<_>>();
    files.sort();

    info!("目录 {} 中共有 {} 个图像文件", directory.display(), files.len());

    Ok(DirectoryInput {
      pending: files.into(),
      validate: wants_validation(url),
    })
  }
}

impl Iterator for DirectoryInput {
  type Item = Upload;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.pending.pop_front() {
      let upload = match Upload::open(&path) {
        Ok(upload) => upload,
        Err(e) => {
          error!("读取图像失败 {}: {}", path.display(), e);
          continue;
        }
      };

      if let Err(e) = upload.check(self.validate) {
        warn!("跳过未通过校验的图像 {}: {}", upload.name, e);
        continue;
      }

      return Some(upload);
    }
    None
  }
}
