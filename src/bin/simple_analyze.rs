// 该文件是 Qingnang （青囊） 项目的一部分。
// src/bin/simple_analyze.rs - 逐张分析上传图像
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

use qingnang::{
  FromUrl,
  input::InputWrapper,
  model::HeuristicBuilder,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// 青囊图像分析参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型配置，如 heuristic:?seed=42
  #[arg(long, value_name = "MODEL", default_value = "heuristic:")]
  pub model: Url,
  /// 输入来源，如 image:///path/to/lesion.jpg 或 folder:///uploads
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出方式，如 console: 或 folder:///records?image
  #[arg(long, value_name = "OUTPUT", default_value = "console:")]
  pub output: Url,
  /// 最多处理的图像数
  #[arg(long, value_name = "N")]
  pub max_uploads: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型配置: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出方式: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = HeuristicBuilder::from_url(&args.model)?.build();
  let output = OutputWrapper::from_url(&args.output)?;

  let summary = ContinuousTask::default()
    .with_upload_number(args.max_uploads)
    .interruptible()
    .run_task(input, model, output)?;

  if summary.processed == 0 {
    anyhow::bail!("没有成功分析的图像 (失败 {} 张)", summary.failed);
  }

  Ok(())
}
