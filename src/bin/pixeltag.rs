// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/bin/pixeltag.rs - 命令行入口
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

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pixeltag::{
  codec,
  config::{Services, Settings},
  enrich::{DescribeRequest, stylize::DEFAULT_BLOCK_SIZE},
  error::ServiceError,
  model::{LabelPayload, NormalizedBounds},
};

/// PixelTag 像素风作品合成工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  settings: Settings,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// 检测图片中的物体
  Detect {
    #[arg(long, value_name = "FILE")]
    image: PathBuf,
    /// 最多返回的检测框数量 (1 - 20)
    #[arg(long, default_value = "5", value_name = "COUNT")]
    max_results: usize,
  },
  /// 生成物品文案
  Describe {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long)]
    context: Option<String>,
  },
  /// 生成像素风格图片
  Stylize {
    #[arg(long, value_name = "FILE")]
    image: PathBuf,
    #[arg(long)]
    prompt: Option<String>,
    /// 兜底像素化的块大小 (2 - 64)
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, value_name = "PIXELS")]
    block_size: u32,
    /// 输出 PNG 路径；未指定时输出 data URL
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
  },
  /// 合成并保存作品
  Save {
    #[arg(long)]
    user: String,
    #[arg(long, value_name = "FILE")]
    image: PathBuf,
    /// 标签 JSON 文件
    #[arg(long, value_name = "FILE")]
    label: PathBuf,
    /// 选中物体的归一化边界 JSON
    #[arg(long, value_name = "JSON")]
    bounds: Option<String>,
  },
  /// 列出最近的作品
  List {
    /// 返回数量 (1 - 50)
    #[arg(long, default_value = "20", value_name = "COUNT")]
    limit: usize,
  },
}

/// 业务错误以 JSON 输出；其余错误交给 anyhow
enum Outcome {
  Done(Value),
  Failed(ServiceError),
}

impl From<ServiceError> for Outcome {
  fn from(err: ServiceError) -> Self {
    Outcome::Failed(err)
  }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
  std::fs::read(path).with_context(|| format!("无法读取文件: {}", path.display()))
}

fn run(services: &Services, command: Command) -> Result<Outcome> {
  let outcome = match command {
    Command::Detect { image, max_results } => {
      let image = read_file(&image)?;
      match services.detection.detect(&image, max_results) {
        Ok(result) => Outcome::Done(json!({
          "boxes": result.value.boxes,
          "image_size": result.value.image_size,
          "source": result.source.label(),
        })),
        Err(err) => err.into(),
      }
    }
    Command::Describe {
      name,
      category,
      context,
    } => {
      let request = DescribeRequest::new(&name, &category, context.as_deref());
      let result = services.description.describe(&request);
      Outcome::Done(json!({
        "description": result.value,
        "source": result.source.label(),
      }))
    }
    Command::Stylize {
      image,
      prompt,
      block_size,
      output,
    } => {
      let image = read_file(&image)?;
      match services
        .stylize
        .stylize(&image, prompt.as_deref(), block_size)
      {
        Ok(result) => {
          let source = result.source.label();
          match output {
            Some(path) => {
              std::fs::write(&path, &result.value)
                .with_context(|| format!("无法写入文件: {}", path.display()))?;
              info!("已写入: {}", path.display());
              Outcome::Done(json!({ "path": path, "source": source }))
            }
            None => Outcome::Done(json!({
              "image_base64": codec::to_png_data_url(&result.value),
              "source": source,
            })),
          }
        }
        Err(err) => err.into(),
      }
    }
    Command::Save {
      user,
      image,
      label,
      bounds,
    } => {
      let image = read_file(&image)?;
      let label = read_file(&label)?;
      let parsed = LabelPayload::from_json(&label).and_then(|label| {
        let bounds = bounds
          .as_deref()
          .map(|b| NormalizedBounds::from_json(b.as_bytes()))
          .transpose()?;
        Ok((label, bounds))
      });
      match parsed {
        Ok((label, bounds)) => match services
          .artworks
          .save(&user, &image, &label, bounds.as_ref())
        {
          Ok(saved) => Outcome::Done(serde_json::to_value(saved)?),
          Err(err) => err.into(),
        },
        Err(err) => ServiceError::from(err).into(),
      }
    }
    Command::List { limit } => match services.artworks.list(limit) {
      Ok(items) => Outcome::Done(json!({ "items": items })),
      Err(err) => err.into(),
    },
  };
  Ok(outcome)
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  info!("存储位置: {}", cli.settings.store);

  let outcome = match Services::from_settings(&cli.settings) {
    Ok(services) => run(&services, cli.command)?,
    Err(err) => Outcome::Failed(err),
  };

  match outcome {
    Outcome::Done(value) => {
      println!("{}", serde_json::to_string_pretty(&value)?);
      Ok(ExitCode::SUCCESS)
    }
    Outcome::Failed(err) => {
      error!("处理失败: {}", err);
      println!("{}", serde_json::to_string_pretty(&json!({ "error": err.to_json() }))?);
      Ok(ExitCode::FAILURE)
    }
  }
}
