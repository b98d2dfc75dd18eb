// 该文件是 Qingnang （青囊） 项目的一部分。
// src/output/console.rs - 控制台报告输出
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

use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  doctors::{Doctor, DoctorDirectory, DoctorDirectoryError},
  input::Upload,
  model::PredictionResult,
  output::Render,
};

#[cfg(feature = "quality_check")]
use crate::quality::ImageProperties;

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("不支持的输出格式: {0}")]
  UnknownFormat(String),
  #[error("医生目录错误: {0}")]
  DoctorDirectoryError(#[from] DoctorDirectoryError),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
  Text,
  Json,
}

/// 一次分析的完整报告
#[derive(Debug, Serialize)]
pub struct Report<'a> {
  pub image: &'a str,
  pub result: &'a PredictionResult,
  pub specialists: Vec<&'a Doctor>,
  #[cfg(feature = "quality_check")]
  pub quality: ImageProperties,
  pub suggestions: Vec<&'static str>,
}

pub struct ConsoleOutput {
  format: Format,
  doctors: DoctorDirectory,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut format = Format::Text;
    let mut doctors = DoctorDirectory::default();
    for (k, v) in uri.query_pairs() {
      match &*k {
        "format" => {
          format = match &*v {
            "text" => Format::Text,
            "json" => Format::Json,
            other => return Err(ConsoleOutputError::UnknownFormat(other.to_string())),
          }
        }
        "doctors" => doctors = DoctorDirectory::load(Path::new(&*v))?,
        _ => warn!("忽略未知参数: {}={}", k, v),
      }
    }

    Ok(ConsoleOutput { format, doctors })
  }
}

impl ConsoleOutput {
  pub fn report<'a>(&'a self, upload: &'a Upload, result: &'a PredictionResult) -> Report<'a> {
    #[cfg(feature = "quality_check")]
    let quality = ImageProperties::analyze(upload);
    #[cfg(feature = "quality_check")]
    let suggestions = quality.suggestions();
    #[cfg(not(feature = "quality_check"))]
    let suggestions = Vec::new();

    Report {
      image: &upload.name,
      result,
      specialists: self.doctors.recommend(result.disease),
      #[cfg(feature = "quality_check")]
      quality,
      suggestions,
    }
  }

  fn print_text(report: &Report) {
    let result = report.result;
    println!("图像: {}", report.image);
    println!(
      "初步判断: {} ({:.2}%)",
      result.disease,
      result.confidence * 100.0
    );
    if result.is_degraded() {
      println!("注意: 纹理特征不可用，本次结果使用降级特征，不确定性更高");
    }
    println!("说明: {}", result.info.description);
    println!("严重程度: {}", result.info.severity);
    println!("建议专科: {}", result.info.specialist);

    println!("建议:");
    for (i, rec) in result.info.recommendations.iter().enumerate() {
      println!("  {}. {}", i + 1, rec);
    }

    println!("概率分布:");
    for pred in result.ranked.iter() {
      println!("  - {}: {:.2}%", pred.disease, pred.confidence * 100.0);
    }

    let f = &result.features;
    println!("图像特征:");
    println!(
      "  亮度 {:.3} 对比度 {:.3} 纹理强度 {:.3} 暗像素比例 {:.3}",
      f.brightness, f.contrast, f.texture_strength, f.dark_pixels_ratio
    );
    println!(
      "  平均红 {:.3} 平均绿 {:.3} 平均蓝 {:.3} 颜色变化 {:.3}",
      f.avg_red, f.avg_green, f.avg_blue, f.color_variation
    );

    if report.specialists.is_empty() {
      println!("未找到合适的医生，请咨询皮肤科医生");
    } else {
      println!("推荐医生:");
      for doctor in report.specialists.iter() {
        println!(
          "  - {} ({}, {} 年经验) {} {}",
          doctor.name,
          doctor.specialization,
          doctor.experience_years,
          doctor.contact_email,
          doctor.contact_phone
        );
      }
    }

    for suggestion in report.suggestions.iter() {
      println!("拍摄建议: {}", suggestion);
    }

    println!("以上结果由启发式规则生成，不构成医学诊断");
    println!();
  }
}

impl Render<Upload, PredictionResult> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &Upload, result: &PredictionResult) -> Result<(), Self::Error> {
    let report = self.report(frame, result);
    match self.format {
      Format::Text => Self::print_text(&report),
      Format::Json => println!("{}", serde_json::to_string(&report)?),
    }
    Ok(())
  }
}
