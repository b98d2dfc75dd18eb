// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/scorer.rs - 规则打分与归一化
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

//! 阈值与加分值均为未经数据拟合的经验常数，不代表任何医学依据，
//! 仅为保持行为兼容而原样保留。

use std::ops::Index;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::model::{
  catalog::{DISEASE_NUM, Disease},
  features::FeatureVector,
};

pub const BASE_SCORE: f64 = 0.1;
pub const JITTER_LOW: f64 = 0.8;
pub const JITTER_HIGH: f64 = 1.2;

/// 乘性扰动来源
pub trait Jitter {
  fn factor(&mut self) -> f64;
}

/// 在 [0.8, 1.2) 上均匀采样
#[derive(Debug, Clone)]
pub struct UniformJitter<R> {
  rng: R,
}

impl<R: Rng> UniformJitter<R> {
  pub fn new(rng: R) -> Self {
    Self { rng }
  }
}

impl UniformJitter<ChaCha8Rng> {
  pub fn seeded(seed: u64) -> Self {
    Self::new(ChaCha8Rng::seed_from_u64(seed))
  }

  pub fn from_entropy() -> Self {
    Self::new(ChaCha8Rng::from_entropy())
  }
}

impl<R: Rng> Jitter for UniformJitter<R> {
  fn factor(&mut self) -> f64 {
    self.rng.gen_range(JITTER_LOW..JITTER_HIGH)
  }
}

/// 固定系数，须为有限正数；`FixedJitter::OFF` 即关闭扰动
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJitter(f64);

impl FixedJitter {
  pub const OFF: FixedJitter = FixedJitter(1.0);

  pub fn new(factor: f64) -> Option<Self> {
    (factor.is_finite() && factor > 0.0).then_some(FixedJitter(factor))
  }

  pub fn get(&self) -> f64 {
    self.0
  }
}

impl Default for FixedJitter {
  fn default() -> Self {
    FixedJitter::OFF
  }
}

impl Jitter for FixedJitter {
  fn factor(&mut self) -> f64 {
    self.0
  }
}

impl<J: Jitter + ?Sized> Jitter for &mut J {
  fn factor(&mut self) -> f64 {
    (**self).factor()
  }
}

/// 单条加分规则：谓词成立时给目标疾病加分
#[derive(Clone, Copy)]
pub struct BoostRule {
  pub target: Disease,
  pub boost: f64,
  pub condition: &'static str,
  pub predicate: fn(&FeatureVector) -> bool,
}

impl BoostRule {
  pub fn applies(&self, features: &FeatureVector) -> bool {
    (self.predicate)(features)
  }
}

impl std::fmt::Debug for BoostRule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BoostRule")
      .field("target", &self.target)
      .field("boost", &self.boost)
      .field("condition", &self.condition)
      .finish()
  }
}

pub static BOOST_RULES: [BoostRule; DISEASE_NUM] = [
  BoostRule {
    target: Disease::Eczema,
    boost: 0.25,
    condition: "avg_red > 0.6 && color_variation > 0.4",
    predicate: |f| f.avg_red > 0.6 && f.color_variation > 0.4,
  },
  BoostRule {
    target: Disease::ViralInfection,
    boost: 0.2,
    condition: "texture_strength > 0.5 && contrast > 0.4",
    predicate: |f| f.texture_strength > 0.5 && f.contrast > 0.4,
  },
  BoostRule {
    target: Disease::Melanoma,
    boost: 0.3,
    condition: "dark_pixels_ratio > 0.4 && color_variation > 0.5",
    predicate: |f| f.dark_pixels_ratio > 0.4 && f.color_variation > 0.5,
  },
  BoostRule {
    target: Disease::AtopicDermatitis,
    boost: 0.2,
    condition: "avg_red > 0.5 && brightness < 0.5",
    predicate: |f| f.avg_red > 0.5 && f.brightness < 0.5,
  },
  BoostRule {
    target: Disease::BasalCellCarcinoma,
    boost: 0.25,
    condition: "brightness > 0.6 && contrast > 0.5",
    predicate: |f| f.brightness > 0.6 && f.contrast > 0.5,
  },
  BoostRule {
    target: Disease::MelanocyticNevi,
    boost: 0.15,
    condition: "contrast > 0.4 && color_variation < 0.4",
    predicate: |f| f.contrast > 0.4 && f.color_variation < 0.4,
  },
  BoostRule {
    target: Disease::BenignKeratosis,
    boost: 0.2,
    condition: "texture_strength > 0.6 && dark_pixels_ratio > 0.3",
    predicate: |f| f.texture_strength > 0.6 && f.dark_pixels_ratio > 0.3,
  },
  BoostRule {
    target: Disease::Psoriasis,
    boost: 0.25,
    condition: "avg_red > 0.6 && texture_strength > 0.5",
    predicate: |f| f.avg_red > 0.6 && f.texture_strength > 0.5,
  },
  BoostRule {
    target: Disease::SeborrheicKeratoses,
    boost: 0.2,
    condition: "dark_pixels_ratio > 0.5 && texture_strength > 0.4",
    predicate: |f| f.dark_pixels_ratio > 0.5 && f.texture_strength > 0.4,
  },
  BoostRule {
    target: Disease::FungalInfection,
    boost: 0.2,
    condition: "texture_strength > 0.5 && color_variation > 0.3",
    predicate: |f| f.texture_strength > 0.5 && f.color_variation > 0.3,
  },
];

/// 归一化后的得分向量，下标与疾病目录一致
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreVector([f64; DISEASE_NUM]);

impl ScoreVector {
  /// 按总和归一化，总和须为正
  pub fn normalized(raw: [f64; DISEASE_NUM]) -> Self {
    let sum: f64 = raw.iter().sum();
    ScoreVector(raw.map(|s| s / sum))
  }

  pub fn as_slice(&self) -> &[f64] {
    &self.0
  }

  pub fn sum(&self) -> f64 {
    self.0.iter().sum()
  }

  pub fn iter(&self) -> impl Iterator<Item = (Disease, f64)> + '_ {
    Disease::ALL.into_iter().zip(self.0.iter().copied())
  }
}

impl Index<Disease> for ScoreVector {
  type Output = f64;

  fn index(&self, disease: Disease) -> &f64 {
    &self.0[disease.index()]
  }
}

/// 基础分 + 规则加分，尚未扰动与归一化
pub fn boosted_scores(features: &FeatureVector) -> [f64; DISEASE_NUM] {
  let mut scores = [BASE_SCORE; DISEASE_NUM];
  for rule in BOOST_RULES.iter().filter(|rule| rule.applies(features)) {
    debug!("命中规则 {}: {} (+{})", rule.target, rule.condition, rule.boost);
    scores[rule.target.index()] += rule.boost;
  }
  scores
}

/// 扰动后归一化；非有限或非正的扰动系数按 1.0 处理
pub fn score<J: Jitter>(features: &FeatureVector, mut jitter: J) -> ScoreVector {
  let mut scores = boosted_scores(features);
  for s in scores.iter_mut() {
    let factor = jitter.factor();
    if factor.is_finite() && factor > 0.0 {
      *s *= factor;
    } else {
      warn!("忽略无效扰动系数: {}", factor);
    }
  }
  ScoreVector::normalized(scores)
}
