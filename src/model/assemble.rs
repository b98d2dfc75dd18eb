// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/assemble.rs - 预测结果组装
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

use serde::Serialize;
use tracing::warn;

use crate::model::{
  WithLabel,
  catalog::{Disease, DiseaseInfo},
  features::{Extraction, ExtractionMode, FeatureVector},
  scorer::ScoreVector,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedPrediction {
  pub disease: Disease,
  pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
  pub disease: Disease,
  pub confidence: f64,
  pub ranked: Box<[RankedPrediction]>,
  pub features: FeatureVector,
  pub extraction: ExtractionMode,
  pub info: DiseaseInfo,
}

impl PredictionResult {
  pub fn is_degraded(&self) -> bool {
    self.extraction == ExtractionMode::Degraded
  }
}

/// 最大值下标，并列时取目录顺序靠前者
pub fn top_index(scores: &ScoreVector) -> usize {
  let mut best = 0;
  for (i, &s) in scores.as_slice().iter().enumerate().skip(1) {
    if s > scores.as_slice()[best] {
      best = i;
    }
  }
  best
}

/// 按置信度降序排列，并列时保持目录顺序
pub fn rank(scores: &ScoreVector) -> Box<[RankedPrediction]> {
  let mut ranked = scores
    .iter()
    .map(|(disease, confidence)| RankedPrediction {
      disease,
      confidence,
    })
    .collect::<Vec<_>>();
  ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
  ranked.into_boxed_slice()
}

pub fn assemble(scores: &ScoreVector, extraction: Extraction) -> PredictionResult {
  let disease = Disease::ALL[top_index(scores)];
  let info = DiseaseInfo::lookup(disease.to_label_str());
  if !info.is_available() {
    warn!("未找到疾病说明: {}", disease);
  }

  PredictionResult {
    disease,
    confidence: scores[disease],
    ranked: rank(scores),
    features: extraction.features,
    extraction: extraction.mode,
    info,
  }
}
