// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/error.rs - 服务边界错误
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

use serde_json::{Value, json};
use thiserror::Error;

use crate::{codec::CodecError, compose::FontLoadError, model::ValidationError, store::StoreError};

/// 穿出服务边界的终止性错误。可恢复的上游错误在增强调用内部被吸收，不会出现在这里。
#[derive(Error, Debug)]
pub enum ServiceError {
  #[error("无法读取图片: {0}")]
  InvalidImage(String),
  #[error("参数无效: {0}")]
  InvalidInput(#[from] ValidationError),
  #[error("存储失败: {0}")]
  Storage(#[from] StoreError),
  #[error("配置错误: {0}")]
  Configuration(String),
  #[error("图像编码失败: {0}")]
  Encode(String),
}

impl ServiceError {
  /// 稳定的机器可读错误码
  pub fn code(&self) -> &'static str {
    match self {
      ServiceError::InvalidImage(_) => "invalid_image",
      ServiceError::InvalidInput(_) => "invalid_input",
      ServiceError::Storage(_) => "storage_failed",
      ServiceError::Configuration(_) => "configuration",
      ServiceError::Encode(_) => "encode_failed",
    }
  }

  pub fn to_json(&self) -> Value {
    json!({ "code": self.code(), "message": self.to_string() })
  }
}

impl From<CodecError> for ServiceError {
  fn from(err: CodecError) -> Self {
    match err {
      CodecError::InvalidBase64(_) | CodecError::InvalidImage(_) => {
        ServiceError::InvalidImage(err.to_string())
      }
      CodecError::Encode(e) => ServiceError::Encode(e.to_string()),
    }
  }
}

impl From<FontLoadError> for ServiceError {
  fn from(err: FontLoadError) -> Self {
    ServiceError::Configuration(err.to_string())
  }
}
