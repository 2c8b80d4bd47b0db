// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/model.rs - 数据模型
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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
  #[error("字段 {field} 超出范围: {value}（允许 {range}）")]
  OutOfRange {
    field: &'static str,
    value: f64,
    range: &'static str,
  },
  #[error("字段 {0} 不能为空")]
  Empty(&'static str),
  #[error("{what} 格式错误: {reason}")]
  Malformed { what: &'static str, reason: String },
}

/// 解析 JSON 输入，类型不符（溢出、负数、缺字段）同样视为参数无效
fn parse_json<T: for<'de> Deserialize<'de>>(
  what: &'static str,
  data: &[u8],
) -> Result<T, ValidationError> {
  serde_json::from_slice(data).map_err(|e| ValidationError::Malformed {
    what,
    reason: e.to_string(),
  })
}

fn check_range(
  field: &'static str,
  value: f64,
  ok: bool,
  range: &'static str,
) -> Result<(), ValidationError> {
  if ok {
    Ok(())
  } else {
    Err(ValidationError::OutOfRange {
      field,
      value,
      range,
    })
  }
}

/// 相对于图像尺寸的归一化矩形，`x`/`y` 为左上角
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBounds {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl NormalizedBounds {
  pub fn from_json(data: &[u8]) -> Result<Self, ValidationError> {
    parse_json("bounds", data)
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    check_range(
      "bounds.x",
      self.x as f64,
      (0.0..=1.0).contains(&self.x),
      "[0, 1]",
    )?;
    check_range(
      "bounds.y",
      self.y as f64,
      (0.0..=1.0).contains(&self.y),
      "[0, 1]",
    )?;
    check_range(
      "bounds.width",
      self.width as f64,
      self.width > 0.0 && self.width <= 1.0,
      "(0, 1]",
    )?;
    check_range(
      "bounds.height",
      self.height as f64,
      self.height > 0.0 && self.height <= 1.0,
      "(0, 1]",
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
  pub width: u32,
  pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
  pub id: String,
  pub bounds: NormalizedBounds,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence: Option<f32>,
}

/// 钟面时间与日历日期，不校验月份天数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePayload {
  pub hour: u8,
  pub minute: u8,
  pub month: u8,
  pub day: u8,
}

impl TimePayload {
  pub fn validate(&self) -> Result<(), ValidationError> {
    check_range("time.hour", self.hour as f64, self.hour <= 23, "[0, 23]")?;
    check_range(
      "time.minute",
      self.minute as f64,
      self.minute <= 59,
      "[0, 59]",
    )?;
    check_range(
      "time.month",
      self.month as f64,
      (1..=12).contains(&self.month),
      "[1, 12]",
    )?;
    check_range(
      "time.day",
      self.day as f64,
      (1..=31).contains(&self.day),
      "[1, 31]",
    )
  }
}

/// 标签中心锚点，按画布比例
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagPosition {
  pub x_percent: f32,
  pub y_percent: f32,
}

fn default_tag_scale() -> f32 {
  1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPayload {
  pub name: String,
  pub category: String,
  pub description: String,
  pub energy: u16,
  pub health: u16,
  pub time: TimePayload,
  pub tag_position: TagPosition,
  #[serde(default = "default_tag_scale")]
  pub tag_scale: f32,
}

impl LabelPayload {
  pub fn from_json(data: &[u8]) -> Result<Self, ValidationError> {
    parse_json("label", data)
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    check_range("energy", self.energy as f64, self.energy <= 200, "[0, 200]")?;
    check_range("health", self.health as f64, self.health <= 200, "[0, 200]")?;
    self.time.validate()?;
    let TagPosition {
      x_percent,
      y_percent,
    } = self.tag_position;
    check_range(
      "tag_position.x_percent",
      x_percent as f64,
      (0.0..=1.0).contains(&x_percent),
      "[0, 1]",
    )?;
    check_range(
      "tag_position.y_percent",
      y_percent as f64,
      (0.0..=1.0).contains(&y_percent),
      "[0, 1]",
    )?;
    check_range(
      "tag_scale",
      self.tag_scale as f64,
      self.tag_scale > 0.0 && self.tag_scale <= 3.0,
      "(0, 3]",
    )
  }
}

/// 已保存作品的元数据，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRecord {
  pub id: String,
  pub user_id: String,
  pub url: String,
  pub created_at: DateTime<Utc>,
}
