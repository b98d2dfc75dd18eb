// 该文件是 Qingnang （青囊） 项目的一部分。
// src/task.rs - 分析任务
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
  sync::mpsc::{self, Receiver},
  time::{Duration, Instant},
};
use tracing::{error, info, warn};

use crate::{model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<TaskSummary, Self::Error>;
}

/// 任务统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskSummary {
  pub processed: usize,
  pub failed: usize,
  pub average: Option<Duration>,
}

pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始分析...");
    let now = Instant::now();
    let result = model.infer(&upload)?;
    let elapsed = now.elapsed();
    info!("分析完成，耗时: {:.2?}", elapsed);
    output.render_result(&upload, &result)?;
    info!("输出完成，耗时: {:.2?}", now.elapsed());

    Ok(TaskSummary {
      processed: 1,
      failed: 0,
      average: Some(elapsed),
    })
  }
}

/// 对同一张图像重复分析，统计平均耗时
pub struct RepeatShotTask {
  times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    RepeatShotTask { times: 100 }
  }
}

impl RepeatShotTask {
  /// 前两次作为预热不计入平均耗时
  const WARMUP: usize = 2;

  pub fn with_times(mut self, times: usize) -> Self {
    self.times = times.max(1);
    self
  }

  fn average(times: &[Duration]) -> Option<Duration> {
    let measured = if times.len() > Self::WARMUP {
      &times[Self::WARMUP..]
    } else {
      times
    };
    if measured.is_empty() {
      return None;
    }
    Some(measured.iter().sum::<Duration>() / measured.len() as u32)
  }
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for RepeatShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let upload = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，重复分析 {} 次...", self.times);
    let mut times = Vec::with_capacity(self.times);
    for i in 0..self.times {
      let now = Instant::now();
      let result = model.infer(&upload)?;
      let elapsed = now.elapsed();
      info!("({})分析完成，耗时: {:.2?}", i, elapsed);
      output.render_result(&upload, &result)?;
      times.push(elapsed);
    }

    let average = Self::average(&times);
    if let Some(average) = average {
      warn!("平均分析时间: {:.2?}", average);
    }

    Ok(TaskSummary {
      processed: times.len(),
      failed: 0,
      average,
    })
  }
}

/// 依次分析全部输入；单张图像分析失败只记录错误，输出失败终止任务
#[derive(Default, Debug)]
pub struct ContinuousTask {
  upload_number: Option<usize>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn with_upload_number(mut self, upload_number: Option<usize>) -> Self {
    self.upload_number = upload_number;
    self
  }

  /// 安装 Ctrl-C 处理器，收到中断后处理完当前图像即退出
  pub fn interruptible(mut self) -> Self {
    self.interruptible = true;
    self
  }

  fn interrupt_channel(&self) -> anyhow::Result<Option<Receiver<()>>> {
    if !self.interruptible {
      return Ok(None);
    }

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
    })?;
    Ok(Some(rx))
  }
}

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let rx = self.interrupt_channel()?;

    let mut summary = TaskSummary::default();
    let mut total = Duration::ZERO;
    for (index, upload) in input.enumerate() {
      info!("处理第 {} 张图像", index + 1);
      let now = Instant::now();
      match model.infer(&upload) {
        Ok(result) => {
          let elapsed_a = now.elapsed();
          output.render_result(&upload, &result)?;
          let elapsed_b = now.elapsed();
          info!("分析完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
          summary.processed += 1;
          total += elapsed_a;
        }
        Err(e) => {
          error!("第 {} 张图像分析失败: {}", index + 1, e);
          summary.failed += 1;
        }
      }

      if self.upload_number.is_some_and(|n| index + 1 >= n) {
        info!("达到指定图像数 {}, 退出任务循环", index + 1);
        break;
      }
      if rx.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    if summary.processed > 0 {
      summary.average = Some(total / summary.processed as u32);
    }
    info!(
      "任务完成，成功 {} 张，失败 {} 张",
      summary.processed, summary.failed
    );
    Ok(summary)
  }
}
