// 该文件是 Qingnang （青囊） 项目的一部分。
// src/record.rs - 预测与反馈记录
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

use std::{
  fs::{File, OpenOptions},
  io::{BufRead, BufReader, Write},
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::info;

use crate::model::{PredictionResult, WithLabel};

const PREDICTIONS_FILE: &str = "predictions.jsonl";
const FEEDBACK_FILE: &str = "feedback.jsonl";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Error, Debug)]
pub enum RecordError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录格式错误 (第 {line} 行): {source}")]
  Malformed {
    line: usize,
    source: serde_json::Error,
  },
  #[error("序列化错误: {0}")]
  Serialize(#[from] serde_json::Error),
  #[error("评分必须在 1 到 5 之间, 实际为 {0}")]
  InvalidRating(u8),
  #[error("预测记录 {0} 不存在")]
  UnknownPrediction(u64),
  #[error("预测记录 {0} 已有反馈")]
  AlreadyRated(u64),
  #[error("置信度不是有限值: {0}")]
  InvalidConfidence(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
  pub id: u64,
  pub image_name: String,
  pub disease: String,
  pub confidence: f64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
  pub id: u64,
  pub prediction_id: u64,
  pub rating: u8,
  pub comments: String,
  pub created_at: DateTime<Utc>,
}

/// 一条预测及其反馈
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
  pub prediction: PredictionRecord,
  pub feedback: Option<FeedbackRecord>,
}

/// 目录下的两个 JSON Lines 文件，只追加不修改
#[derive(Debug, Clone)]
pub struct RecordStore {
  directory: PathBuf,
}

impl RecordStore {
  pub fn open(directory: impl Into<PathBuf>) -> Result<Self, RecordError> {
    let directory = directory.into();
    std::fs::create_dir_all(&directory)?;
    Ok(RecordStore { directory })
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  pub fn predictions(&self) -> Result<Vec<PredictionRecord>, RecordError> {
    read_lines(&self.directory.join(PREDICTIONS_FILE))
  }

  pub fn feedback(&self) -> Result<Vec<FeedbackRecord>, RecordError> {
    read_lines(&self.directory.join(FEEDBACK_FILE))
  }

  pub fn save_prediction(
    &self,
    image_name: &str,
    result: &PredictionResult,
  ) -> Result<PredictionRecord, RecordError> {
    if !result.confidence.is_finite() {
      return Err(RecordError::InvalidConfidence(result.confidence));
    }

    let record = PredictionRecord {
      id: next_id(self.predictions()?.iter().map(|r| r.id)),
      image_name: image_name.to_string(),
      disease: result.disease.to_label_str().to_string(),
      confidence: result.confidence,
      created_at: Utc::now(),
    };
    append_line(&self.directory.join(PREDICTIONS_FILE), &record)?;
    info!(
      "保存预测记录 #{}: {} -> {} ({:.2}%)",
      record.id,
      record.image_name,
      record.disease,
      record.confidence * 100.0
    );
    Ok(record)
  }

  pub fn save_feedback(
    &self,
    prediction_id: u64,
    rating: u8,
    comments: &str,
  ) -> Result<FeedbackRecord, RecordError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
      return Err(RecordError::InvalidRating(rating));
    }
    if !self.predictions()?.iter().any(|r| r.id == prediction_id) {
      return Err(RecordError::UnknownPrediction(prediction_id));
    }
    let feedback = self.feedback()?;
    if feedback.iter().any(|r| r.prediction_id == prediction_id) {
      return Err(RecordError::AlreadyRated(prediction_id));
    }

    let record = FeedbackRecord {
      id: next_id(feedback.iter().map(|r| r.id)),
      prediction_id,
      rating,
      comments: comments.to_string(),
      created_at: Utc::now(),
    };
    append_line(&self.directory.join(FEEDBACK_FILE), &record)?;
    info!("保存反馈 #{}: 预测 #{} 评分 {}", record.id, prediction_id, rating);
    Ok(record)
  }

  /// 全部预测按时间从新到旧排列，附带各自的反馈
  pub fn history(&self) -> Result<Vec<HistoryEntry>, RecordError> {
    let mut feedback = self.feedback()?;
    let mut entries = self
      .predictions()?
      .into_iter()
      .map(|prediction| {
        let feedback = feedback
          .iter()
          .position(|f| f.prediction_id == prediction.id)
          .map(|idx| feedback.swap_remove(idx));
        HistoryEntry {
          prediction,
          feedback,
        }
      })
      .collect::<Vec<_>>();
    entries.sort_by(|a, b| {
      b.prediction
        .created_at
        .cmp(&a.prediction.created_at)
        .then(b.prediction.id.cmp(&a.prediction.id))
    });
    Ok(entries)
  }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
  ids.max().unwrap_or(0) + 1
}

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RecordError> {
  if !path.exists() {
    return Ok(Vec::new());
  }

  let reader = BufReader::new(File::open(path)?);
  let mut records = Vec::new();
  for (idx, line) in reader.lines().enumerate() {
    let line = line?;
    if line.trim().is_empty() {
      continue;
    }
    let record = serde_json::from_str(&line).map_err(|source| RecordError::Malformed {
      line: idx + 1,
      source,
    })?;
    records.push(record);
  }
  Ok(records)
}

fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<(), RecordError> {
  let mut line = serde_json::to_string(record)?;
  line.push('\n');
  let mut file = OpenOptions::new().create(true).append(true).open(path)?;
  file.write_all(line.as_bytes())?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{
    Disease, FixedJitter, Pipeline, features::Sobel, preprocess::preprocess,
  };
  use image::DynamicImage;

  fn result() -> PredictionResult {
    let tensor = preprocess(&DynamicImage::new_rgb8(50, 50)).unwrap();
    Pipeline::new(Sobel).analyze_tensor(&tensor, FixedJitter::OFF)
  }

  #[test]
  fn prediction_ids_increase_from_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path().join("records")).unwrap();
    let result = result();

    let first = store.save_prediction("a.png", &result).unwrap();
    let second = store.save_prediction("b.png", &result).unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    let saved = store.predictions().unwrap();
    assert_eq!(saved, vec![first, second]);
    assert_eq!(saved[0].disease, Disease::Eczema.to_label_str());
    assert!((saved[0].confidence - 0.1).abs() < 1e-12);
  }

  #[test]
  fn feedback_is_validated_and_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let prediction = store.save_prediction("a.png", &result()).unwrap();

    assert!(matches!(
      store.save_feedback(prediction.id, 0, ""),
      Err(RecordError::InvalidRating(0))
    ));
    assert!(matches!(
      store.save_feedback(prediction.id, 6, ""),
      Err(RecordError::InvalidRating(6))
    ));
    assert!(matches!(
      store.save_feedback(99, 3, ""),
      Err(RecordError::UnknownPrediction(99))
    ));

    let feedback = store.save_feedback(prediction.id, 4, "looks right").unwrap();
    assert_eq!(feedback.id, 1);
    assert_eq!(store.feedback().unwrap(), vec![feedback]);
  }

  #[test]
  fn each_prediction_takes_one_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let prediction = store.save_prediction("a.png", &result()).unwrap();

    store.save_feedback(prediction.id, 2, "").unwrap();
    assert!(matches!(
      store.save_feedback(prediction.id, 5, "changed my mind"),
      Err(RecordError::AlreadyRated(1))
    ));
    assert_eq!(store.feedback().unwrap().len(), 1);
  }

  #[test]
  fn history_is_newest_first_with_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let result = result();
    let first = store.save_prediction("a.png", &result).unwrap();
    let second = store.save_prediction("b.png", &result).unwrap();
    let third = store.save_prediction("c.png", &result).unwrap();
    let rated = store.save_feedback(second.id, 3, "unsure").unwrap();

    let history = store.history().unwrap();
    assert_eq!(
      history.iter().map(|e| e.prediction.id).collect::<Vec<_>>(),
      vec![third.id, second.id, first.id]
    );
    assert_eq!(history[1].feedback, Some(rated));
    assert!(history[0].feedback.is_none());
    assert!(history[2].feedback.is_none());
  }

  #[test]
  fn history_of_empty_store_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(RecordStore::open(dir.path()).unwrap().history().unwrap().is_empty());
  }

  #[test]
  fn non_finite_confidence_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    let mut broken = result();
    broken.confidence = f64::NAN;

    assert!(matches!(
      store.save_prediction("nan.png", &broken),
      Err(RecordError::InvalidConfidence(_))
    ));
    assert!(store.predictions().unwrap().is_empty());

    let saved = store.save_prediction("ok.png", &result()).unwrap();
    assert_eq!(saved.id, 1);
    assert_eq!(store.predictions().unwrap(), vec![saved]);
  }

  #[test]
  fn malformed_line_reports_position() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordStore::open(dir.path()).unwrap();
    store.save_prediction("a.png", &result()).unwrap();
    let mut file = OpenOptions::new()
      .append(true)
      .open(dir.path().join(PREDICTIONS_FILE))
      .unwrap();
    writeln!(file, "{{not json").unwrap();

    assert!(matches!(
      store.predictions(),
      Err(RecordError::Malformed { line: 2, .. })
    ));
  }
}
