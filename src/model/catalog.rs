// 该文件是 Qingnang （青囊） 项目的一部分。
// src/model/catalog.rs - 疾病目录与说明信息
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

use std::fmt;

use serde::{Serialize, Serializer};

use crate::model::WithLabel;

pub const DISEASE_NUM: usize = 10;

/// 疾病目录，声明顺序即得分向量的下标顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Disease {
  Eczema,
  ViralInfection,
  Melanoma,
  AtopicDermatitis,
  BasalCellCarcinoma,
  MelanocyticNevi,
  BenignKeratosis,
  Psoriasis,
  SeborrheicKeratoses,
  FungalInfection,
}

impl Disease {
  pub const ALL: [Disease; DISEASE_NUM] = [
    Disease::Eczema,
    Disease::ViralInfection,
    Disease::Melanoma,
    Disease::AtopicDermatitis,
    Disease::BasalCellCarcinoma,
    Disease::MelanocyticNevi,
    Disease::BenignKeratosis,
    Disease::Psoriasis,
    Disease::SeborrheicKeratoses,
    Disease::FungalInfection,
  ];

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn info(self) -> DiseaseInfo {
    DiseaseInfo::lookup(self.to_label_str())
  }
}

impl WithLabel for Disease {
  fn to_label_str(&self) -> &'static str {
    match self {
      Disease::Eczema => "Eczema",
      Disease::ViralInfection => "Warts Molluscum and other Viral Infections",
      Disease::Melanoma => "Melanoma",
      Disease::AtopicDermatitis => "Atopic Dermatitis",
      Disease::BasalCellCarcinoma => "Basal Cell Carcinoma (BCC)",
      Disease::MelanocyticNevi => "Melanocytic Nevi (NV)",
      Disease::BenignKeratosis => "Benign Keratosis-like Lesions (BKL)",
      Disease::Psoriasis => "Psoriasis pictures Lichen Planus and related diseases",
      Disease::SeborrheicKeratoses => "Seborrheic Keratoses and other Benign Tumors",
      Disease::FungalInfection => "Tinea Ringworm Candidiasis and other Fungal Infections",
    }
  }

  fn to_label_id(&self) -> u32 {
    self.index() as u32
  }

  fn from_label_id(id: u32) -> Option<Self> {
    Disease::ALL.get(id as usize).copied()
  }
}

impl fmt::Display for Disease {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.to_label_str())
  }
}

impl Serialize for Disease {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.to_label_str())
  }
}

/// 疾病说明：描述、严重程度、对应专科与建议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
  pub description: &'static str,
  pub severity: &'static str,
  pub specialist: &'static str,
  pub recommendations: &'static [&'static str],
}

impl DiseaseInfo {
  pub const UNAVAILABLE: DiseaseInfo = DiseaseInfo {
    description: "Information not available for this condition.",
    severity: "Unknown",
    specialist: "General Medicine",
    recommendations: &[
      "Consult a healthcare professional for proper diagnosis",
      "Maintain good general skincare practices",
      "Monitor symptoms and seek medical advice if condition worsens",
    ],
  };

  /// 按名称查询，未收录的名称返回占位信息
  pub fn lookup(name: &str) -> DiseaseInfo {
    DISEASE_INFO
      .iter()
      .find(|(label, _)| *label == name)
      .map(|(_, info)| *info)
      .unwrap_or(DiseaseInfo::UNAVAILABLE)
  }

  pub fn is_available(&self) -> bool {
    *self != DiseaseInfo::UNAVAILABLE
  }
}

static DISEASE_INFO: [(&str, DiseaseInfo); DISEASE_NUM] = [
  (
    "Eczema",
    DiseaseInfo {
      description: "A chronic inflammatory skin condition characterized by red, itchy, and inflamed skin patches.",
      severity: "Mild to Moderate - Manageable",
      specialist: "Dermatology",
      recommendations: &[
        "Keep skin moisturized with gentle, fragrance-free moisturizers",
        "Avoid known triggers such as harsh soaps, allergens, and stress",
        "Use mild, hypoallergenic skincare products",
        "Consider topical corticosteroids as prescribed by a dermatologist",
        "Consult a dermatologist for persistent or severe symptoms",
      ],
    },
  ),
  (
    "Warts Molluscum and other Viral Infections",
    DiseaseInfo {
      description: "Skin infections caused by viruses, including common warts and molluscum contagiosum bumps.",
      severity: "Mild - Usually Self-limiting",
      specialist: "Dermatology/Family Medicine",
      recommendations: &[
        "Most viral skin infections resolve on their own over time",
        "Avoid picking, scratching, or touching the affected areas",
        "Keep the area clean and dry",
        "Consult a dermatologist for treatment options if needed",
        "Practice good hygiene to prevent spreading to others",
      ],
    },
  ),
  (
    "Melanoma",
    DiseaseInfo {
      description: "The most serious type of skin cancer that develops in melanocytes. Requires immediate medical attention.",
      severity: "Severe - Requires Immediate Attention",
      specialist: "Dermatology/Oncology",
      recommendations: &[
        "URGENT: Seek immediate medical attention from a dermatologist or oncologist",
        "Do not delay - early treatment is critical for better outcomes",
        "Avoid sun exposure and use high SPF sunscreen",
        "Perform regular skin self-examinations using the ABCDE method",
        "Follow all medical recommendations and attend regular follow-up appointments",
      ],
    },
  ),
  (
    "Atopic Dermatitis",
    DiseaseInfo {
      description: "A chronic inflammatory skin condition often associated with allergies, causing dry, itchy skin.",
      severity: "Mild to Moderate - Chronic condition",
      specialist: "Dermatology/Allergy",
      recommendations: &[
        "Maintain good skin hydration with regular moisturizing",
        "Identify and avoid personal triggers (foods, allergens, stress)",
        "Use gentle, fragrance-free skincare products",
        "Consider seeing an allergist for comprehensive evaluation",
        "Follow prescribed treatment plans from your dermatologist",
      ],
    },
  ),
  (
    "Basal Cell Carcinoma (BCC)",
    DiseaseInfo {
      description: "The most common type of skin cancer, usually slow-growing and rarely spreads to other parts of the body.",
      severity: "Moderate - Requires Treatment",
      specialist: "Dermatology/Oncology",
      recommendations: &[
        "IMPORTANT: Consult a dermatologist promptly for evaluation and treatment",
        "Early treatment is highly effective for this type of skin cancer",
        "Protect skin from further sun damage with SPF 30+ sunscreen",
        "Wear protective clothing and seek shade during peak sun hours",
        "Schedule regular skin screenings and follow-up appointments",
      ],
    },
  ),
  (
    "Melanocytic Nevi (NV)",
    DiseaseInfo {
      description: "Common moles or nevi that are usually benign but should be monitored for changes.",
      severity: "Mild - Usually Benign",
      specialist: "Dermatology",
      recommendations: &[
        "Monitor moles regularly for any changes in size, color, or shape",
        "Use the ABCDE method for self-examination (Asymmetry, Border, Color, Diameter, Evolving)",
        "Protect from sun exposure to prevent changes",
        "Consult a dermatologist for annual skin checks",
        "Seek immediate evaluation if any mole changes appearance",
      ],
    },
  ),
  (
    "Benign Keratosis-like Lesions (BKL)",
    DiseaseInfo {
      description: "Non-cancerous skin growths that may appear raised, scaly, or waxy.",
      severity: "Mild - Benign",
      specialist: "Dermatology",
      recommendations: &[
        "Usually no treatment is required as these are benign",
        "Monitor for any changes in appearance or texture",
        "Consult a dermatologist to confirm the diagnosis",
        "Removal can be considered for cosmetic reasons or if irritated",
        "Use gentle skincare to avoid irritation",
      ],
    },
  ),
  (
    "Psoriasis pictures Lichen Planus and related diseases",
    DiseaseInfo {
      description: "Chronic autoimmune skin conditions causing red, scaly patches and inflammatory lesions.",
      severity: "Moderate - Chronic condition",
      specialist: "Dermatology/Rheumatology",
      recommendations: &[
        "Work with a dermatologist to develop a comprehensive treatment plan",
        "Consider topical treatments, light therapy, or systemic medications",
        "Manage stress levels as stress can worsen symptoms",
        "Maintain good skin care with gentle, moisturizing products",
        "Join support groups for chronic skin condition management",
      ],
    },
  ),
  (
    "Seborrheic Keratoses and other Benign Tumors",
    DiseaseInfo {
      description: "Non-cancerous skin growths that appear as brown, black, or tan patches with a waxy texture.",
      severity: "Mild - Benign",
      specialist: "Dermatology",
      recommendations: &[
        "Usually no treatment is needed as these are benign growths",
        "Monitor for any sudden changes in appearance",
        "Consult a dermatologist to confirm diagnosis",
        "Removal can be considered for cosmetic reasons or if irritated",
        "Use gentle skincare products to avoid irritation",
      ],
    },
  ),
  (
    "Tinea Ringworm Candidiasis and other Fungal Infections",
    DiseaseInfo {
      description: "Fungal skin infections causing circular, scaly patches or other inflammatory symptoms.",
      severity: "Mild to Moderate - Treatable",
      specialist: "Dermatology/Infectious Disease",
      recommendations: &[
        "Keep affected areas clean and dry",
        "Use antifungal medications as prescribed by a healthcare provider",
        "Avoid sharing personal items like towels, clothing, or shoes",
        "Maintain good hygiene and change clothes frequently",
        "Consult a dermatologist for persistent or severe infections",
      ],
    },
  ),
];
