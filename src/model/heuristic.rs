// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/heuristic.rs - 启发式分析模型
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

use image::DynamicImage;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::Upload,
  model::{
    Model,
    assemble::{PredictionResult, assemble},
    features::{FeatureExtractor, Gradient, GradientError, NoGradient, Sobel},
    preprocess::{ImageProcessingError, decode, preprocess},
    scorer::{FixedJitter, Jitter, UniformJitter, score},
  },
  tensor::{GrayPlane, ImageTensor},
};

/// 预处理 -> 特征提取 -> 打分 -> 组装
#[derive(Debug, Clone, Default)]
pub struct Pipeline<G> {
  extractor: FeatureExtractor<G>,
}

impl<G: Gradient> Pipeline<G> {
  pub fn new(gradient: G) -> Self {
    Self {
      extractor: FeatureExtractor::new(gradient),
    }
  }

  pub fn analyze<J: Jitter>(
    &self,
    image: &DynamicImage,
    jitter: J,
  ) -> Result<PredictionResult, ImageProcessingError> {
    let tensor = preprocess(image)?;
    Ok(self.analyze_tensor(&tensor, jitter))
  }

  pub fn analyze_bytes<J: Jitter>(
    &self,
    bytes: &[u8],
    jitter: J,
  ) -> Result<PredictionResult, ImageProcessingError> {
    self.analyze(&decode(bytes)?, jitter)
  }

  pub fn analyze_tensor<J: Jitter>(&self, tensor: &ImageTensor, jitter: J) -> PredictionResult {
    let extraction = self.extractor.extract(tensor);
    let scores = score(&extraction.features, jitter);
    debug!("得分向量: {:?}", scores);
    assemble(&scores, extraction)
  }
}

/// 纹理算子选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureOperator {
  #[default]
  Sobel,
  Disabled,
}

impl Gradient for TextureOperator {
  fn magnitude(&self, plane: &GrayPlane) -> Result<Vec<f64>, GradientError> {
    match self {
      TextureOperator::Sobel => Sobel.magnitude(plane),
      TextureOperator::Disabled => NoGradient.magnitude(plane),
    }
  }
}

/// 扰动配置，每次推理据此新建扰动来源
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JitterMode {
  #[default]
  Entropy,
  Seeded(u64),
  Fixed(FixedJitter),
}

pub enum JitterSource {
  Uniform(UniformJitter<ChaCha8Rng>),
  Fixed(FixedJitter),
}

impl JitterMode {
  pub fn source(&self) -> JitterSource {
    match *self {
      JitterMode::Entropy => JitterSource::Uniform(UniformJitter::from_entropy()),
      JitterMode::Seeded(seed) => JitterSource::Uniform(UniformJitter::seeded(seed)),
      JitterMode::Fixed(jitter) => JitterSource::Fixed(jitter),
    }
  }
}

impl Jitter for JitterSource {
  fn factor(&mut self) -> f64 {
    match self {
      JitterSource::Uniform(jitter) => jitter.factor(),
      JitterSource::Fixed(jitter) => jitter.factor(),
    }
  }
}

#[derive(Error, Debug)]
pub enum HeuristicError {
  #[error("模型地址必须使用 {0} 方案")]
  SchemeMismatch(&'static str),
  #[error("参数 {0} 的值无效: {1}")]
  InvalidParameter(String, String),
}

fn invalid(k: &str, v: &str) -> HeuristicError {
  HeuristicError::InvalidParameter(k.to_string(), v.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicBuilder {
  texture: TextureOperator,
  jitter: JitterMode,
}

impl FromUrlWithScheme for HeuristicBuilder {
  const SCHEME: &'static str = "heuristic";
}

impl FromUrl for HeuristicBuilder {
  type Error = HeuristicError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(HeuristicError::SchemeMismatch(Self::SCHEME));
    }

    let mut builder = HeuristicBuilder::default();

    for (k, v) in url.query_pairs() {
      match &*k {
        "seed" => {
          // 固定系数优先于种子
          if !matches!(builder.jitter, JitterMode::Fixed(_)) {
            let seed = v.parse::<u64>().map_err(|_| invalid(&k, &v))?;
            builder.jitter = JitterMode::Seeded(seed);
          }
        }
        "jitter" => {
          builder.jitter = match &*v {
            "off" => JitterMode::Fixed(FixedJitter::OFF),
            "random" => JitterMode::Entropy,
            other => other
              .parse::<f64>()
              .ok()
              .and_then(FixedJitter::new)
              .map(JitterMode::Fixed)
              .ok_or_else(|| invalid(&k, &v))?,
          };
        }
        "texture" => {
          builder.texture = match &*v {
            "sobel" => TextureOperator::Sobel,
            "none" => TextureOperator::Disabled,
            _ => return Err(invalid(&k, &v)),
          };
        }
        _ => debug!("忽略未知参数: {}={}", k, v),
      }
    }

    Ok(builder)
  }
}

impl HeuristicBuilder {
  pub fn texture(mut self, texture: TextureOperator) -> Self {
    self.texture = texture;
    self
  }

  pub fn jitter(mut self, jitter: JitterMode) -> Self {
    self.jitter = jitter;
    self
  }

  pub fn build(self) -> Heuristic {
    info!(
      "创建启发式模型: 纹理算子 {:?}, 扰动 {:?}",
      self.texture, self.jitter
    );
    Heuristic {
      pipeline: Pipeline::new(self.texture),
      jitter: self.jitter,
    }
  }
}

pub struct Heuristic {
  pipeline: Pipeline<TextureOperator>,
  jitter: JitterMode,
}

impl Heuristic {
  pub fn analyze_tensor(&self, tensor: &ImageTensor) -> PredictionResult {
    self.pipeline.analyze_tensor(tensor, self.jitter.source())
  }
}

impl Model for Heuristic {
  type Input = Upload;
  type Output = PredictionResult;
  type Error = ImageProcessingError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("分析上传图像: {}", input.name);
    self.pipeline.analyze(&input.image, self.jitter.source())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::catalog::Disease;

  fn builder(url: &str) -> Result<HeuristicBuilder, HeuristicError> {
    HeuristicBuilder::from_url(&Url::parse(url).unwrap())
  }

  #[test]
  fn defaults_to_sobel_with_random_jitter() {
    let b = builder("heuristic:").unwrap();
    assert_eq!(b.texture, TextureOperator::Sobel);
    assert_eq!(b.jitter, JitterMode::Entropy);
  }

  #[test]
  fn parses_query_parameters() {
    let b = builder("heuristic:?seed=42&texture=none").unwrap();
    assert_eq!(b.texture, TextureOperator::Disabled);
    assert_eq!(b.jitter, JitterMode::Seeded(42));

    let b = builder("heuristic:?jitter=off&seed=42").unwrap();
    assert_eq!(b.jitter, JitterMode::Fixed(FixedJitter::OFF));

    let b = builder("heuristic:?jitter=1.1").unwrap();
    assert_eq!(b.jitter, JitterMode::Fixed(FixedJitter::new(1.1).unwrap()));
  }

  #[test]
  fn rejects_bad_parameters() {
    assert!(matches!(
      builder("onnx:///model.onnx"),
      Err(HeuristicError::SchemeMismatch("heuristic"))
    ));
    assert!(matches!(
      builder("heuristic:?seed=abc"),
      Err(HeuristicError::InvalidParameter(..))
    ));
    assert!(matches!(
      builder("heuristic:?jitter=0"),
      Err(HeuristicError::InvalidParameter(..))
    ));
    assert!(matches!(
      builder("heuristic:?texture=laplace"),
      Err(HeuristicError::InvalidParameter(..))
    ));
  }

  #[test]
  fn disabled_texture_degrades() {
    let model = HeuristicBuilder::default()
      .texture(TextureOperator::Disabled)
      .jitter(JitterMode::Fixed(FixedJitter::OFF))
      .build();
    let tensor = ImageTensor::filled(224, 224, [0.2, 0.2, 0.2]).unwrap();
    let result = model.analyze_tensor(&tensor);
    assert!(result.is_degraded());
    assert_eq!(result.features.texture_strength, 0.5);
    // 降级特征恰好落在各阈值上，没有规则命中，按目录顺序取第一项
    assert_eq!(result.disease, Disease::Eczema);
    assert!((result.confidence - 0.1).abs() < 1e-12);
  }

  #[test]
  fn seeded_model_is_deterministic() {
    let model = HeuristicBuilder::default()
      .jitter(JitterMode::Seeded(2026))
      .build();
    let upload = Upload::new("lesion.png", DynamicImage::new_rgb8(300, 200), None);
    assert_eq!(model.infer(&upload).unwrap(), model.infer(&upload).unwrap());
  }
}
