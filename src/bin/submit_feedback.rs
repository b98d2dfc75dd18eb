// 该文件是 Qingnang （青囊） 项目的一部分。
// src/bin/submit_feedback.rs - 提交对预测结果的反馈
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use qingnang::{record::RecordStore, url_path};
use tracing::info;

/// 青囊反馈参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 记录目录，如 folder:///records
  #[arg(long, value_name = "RECORDS")]
  pub records: Url,
  /// 列出历史预测及反馈（从新到旧）
  #[arg(long, conflicts_with_all = ["prediction_id", "rating"])]
  pub list: bool,
  /// 预测记录编号
  #[arg(long, required_unless_present = "list")]
  pub prediction_id: Option<u64>,
  /// 评分 (1-5)
  #[arg(long, required_unless_present = "list", value_parser = clap::value_parser!(u8).range(1..=5))]
  pub rating: Option<u8>,
  /// 备注
  #[arg(long, default_value = "")]
  pub comments: String,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  if args.records.scheme() != "folder" {
    anyhow::bail!("记录目录必须使用 folder 方案: {}", args.records);
  }

  let store = RecordStore::open(url_path(&args.records)?)?;

  if args.list {
    for entry in store.history()? {
      println!("{}", serde_json::to_string(&entry)?);
    }
    return Ok(());
  }

  let (Some(prediction_id), Some(rating)) = (args.prediction_id, args.rating) else {
    anyhow::bail!("需要 --prediction-id 与 --rating");
  };
  let feedback = store.save_feedback(prediction_id, rating, &args.comments)?;
  info!("反馈已保存: #{}", feedback.id);
  println!("{}", serde_json::to_string(&feedback)?);

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn list_mode_needs_no_rating() {
    let args = Args::try_parse_from(["submit-feedback", "--records", "folder:///tmp/r", "--list"])
      .unwrap();
    assert!(args.list);
    assert_eq!((args.prediction_id, args.rating), (None, None));

    assert!(Args::try_parse_from(["submit-feedback", "--records", "folder:///tmp/r"]).is_err());
    assert!(
      Args::try_parse_from([
        "submit-feedback",
        "--records",
        "folder:///tmp/r",
        "--list",
        "--rating",
        "3"
      ])
      .is_err()
    );
    let args = Args::try_parse_from([
      "submit-feedback",
      "--records",
      "folder:///tmp/r",
      "--prediction-id",
      "2",
      "--rating",
      "5",
    ])
    .unwrap();
    assert_eq!((args.prediction_id, args.rating), (Some(2), Some(5)));
  }
}
