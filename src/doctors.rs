// 该文件是 Qingnang （青囊） 项目的一部分。
// src/doctors.rs - 专科医生目录
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Disease, WithLabel};

const FALLBACK_SPECIALIZATION: &str = "dermatology";

#[derive(Error, Debug)]
pub enum DoctorDirectoryError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("医生目录格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
  pub name: String,
  pub specialization: String,
  pub contact_email: String,
  pub contact_phone: String,
  pub address: String,
  pub experience_years: u32,
  /// 逗号分隔的病种列表
  pub diseases_treated: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorDirectory {
  doctors: Vec<Doctor>,
}

impl DoctorDirectory {
  pub fn new(doctors: Vec<Doctor>) -> Self {
    DoctorDirectory { doctors }
  }

  /// 从 JSON 数组文件加载
  pub fn load(path: &Path) -> Result<Self, DoctorDirectoryError> {
    let data = std::fs::read_to_string(path)?;
    let doctors: Vec<Doctor> = serde_json::from_str(&data)?;
    info!("加载医生目录 {}: {} 位医生", path.display(), doctors.len());
    Ok(DoctorDirectory { doctors })
  }

  pub fn doctors(&self) -> &[Doctor] {
    &self.doctors
  }

  /// 优先推荐诊治该病的医生，否则退回皮肤科医生；按从业年限降序
  pub fn recommend(&self, disease: Disease) -> Vec<&Doctor> {
    let label = disease.to_label_str().to_lowercase();
    let mut matched = self.select(|d| d.diseases_treated.to_lowercase().contains(&label));

    if matched.is_empty() {
      debug!("没有诊治 {} 的医生，推荐皮肤科医生", disease);
      matched = self.select(|d| {
        d.specialization
          .to_lowercase()
          .contains(FALLBACK_SPECIALIZATION)
      });
    }

    matched
  }

  fn select(&self, predicate: impl Fn(&Doctor) -> bool) -> Vec<&Doctor> {
    let mut selected = self.doctors.iter().filter(|&d| predicate(d)).collect::<Vec<_>>();
    selected.sort_by(|a, b| b.experience_years.cmp(&a.experience_years));
    selected
  }
}

fn doctor(
  name: &str,
  specialization: &str,
  contact_email: &str,
  contact_phone: &str,
  address: &str,
  experience_years: u32,
  diseases_treated: &str,
) -> Doctor {
  Doctor {
    name: name.to_string(),
    specialization: specialization.to_string(),
    contact_email: contact_email.to_string(),
    contact_phone: contact_phone.to_string(),
    address: address.to_string(),
    experience_years,
    diseases_treated: diseases_treated.to_string(),
  }
}

impl Default for DoctorDirectory {
  fn default() -> Self {
    DoctorDirectory::new(vec![
      doctor(
        "Dr. Sarah Johnson",
        "Dermatology & Oncology",
        "sarah.johnson@hospital.com",
        "555-0123",
        "123 Medical Center Dr",
        15,
        "Melanoma, Squamous Cell Carcinoma, Actinic Keratosis",
      ),
      doctor(
        "Dr. Michael Chen",
        "Dermatopathology",
        "michael.chen@clinic.com",
        "555-0124",
        "456 Health Plaza",
        12,
        "Melanoma, Seborrheic Keratosis, Dermatofibroma",
      ),
      doctor(
        "Dr. Emily Davis",
        "Dermatology",
        "emily.davis@skincare.com",
        "555-0125",
        "789 Beauty Ave",
        8,
        "Actinic Keratosis, Seborrheic Keratosis, Dermatofibroma",
      ),
      doctor(
        "Dr. Robert Wilson",
        "Oncology & Dermatology",
        "robert.wilson@childcare.com",
        "555-0126",
        "321 Kids Health St",
        10,
        "Squamous Cell Carcinoma, Melanoma, Actinic Keratosis",
      ),
      doctor(
        "Dr. Lisa Martinez",
        "Mohs Surgery",
        "lisa.martinez@mohscenter.com",
        "555-0127",
        "555 Surgical Suite",
        18,
        "Squamous Cell Carcinoma, Melanoma, Actinic Keratosis",
      ),
      doctor(
        "Dr. David Park",
        "Dermatology",
        "david.park@dermclinic.com",
        "555-0128",
        "888 Skin Care Ave",
        7,
        "Dermatofibroma, Seborrheic Keratosis, Actinic Keratosis",
      ),
    ])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(doctors: Vec<&Doctor>) -> Vec<&str> {
    doctors.into_iter().map(|d| d.name.as_str()).collect()
  }

  #[test]
  fn melanoma_specialists_by_experience() {
    let directory = DoctorDirectory::default();
    assert_eq!(
      names(directory.recommend(Disease::Melanoma)),
      vec![
        "Dr. Lisa Martinez",
        "Dr. Sarah Johnson",
        "Dr. Michael Chen",
        "Dr. Robert Wilson"
      ]
    );
  }

  #[test]
  fn falls_back_to_dermatologists() {
    let directory = DoctorDirectory::default();
    assert_eq!(
      names(directory.recommend(Disease::Eczema)),
      vec![
        "Dr. Sarah Johnson",
        "Dr. Robert Wilson",
        "Dr. Emily Davis",
        "Dr. David Park"
      ]
    );
  }

  #[test]
  fn empty_directory_recommends_nobody() {
    assert!(DoctorDirectory::new(vec![]).recommend(Disease::Melanoma).is_empty());
  }

  #[test]
  fn loads_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doctors.json");
    let doctors = DoctorDirectory::default().doctors()[..2].to_vec();
    std::fs::write(&path, serde_json::to_string(&doctors).unwrap()).unwrap();

    let loaded = DoctorDirectory::load(&path).unwrap();
    assert_eq!(loaded.doctors(), &doctors[..]);

    std::fs::write(&path, "{}").unwrap();
    assert!(matches!(
      DoctorDirectory::load(&path),
      Err(DoctorDirectoryError::JsonError(_))
    ));
  }
}
