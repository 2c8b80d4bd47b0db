// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/store.rs - 作品存储定义
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

use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::ArtworkRecord};

/// 存储后端能力集合。
///
/// 图像按对象键覆盖写入；元数据只追加，不按 id 去重。
pub trait ArtworkStore: Send + Sync {
  /// 写入图像并返回可访问的 URL
  fn upload_image(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError>;
  fn save_record(&self, record: &ArtworkRecord) -> Result<(), StoreError>;
  /// 按 `created_at` 降序返回最多 `limit` 条记录，跳过损坏的记录
  fn list_records(&self, limit: usize) -> Result<Vec<ArtworkRecord>, StoreError>;
}

mod filesystem;
pub use self::filesystem::FilesystemStore;

#[cfg(feature = "hosted_store")]
mod hosted;
#[cfg(feature = "hosted_store")]
pub use self::hosted::HostedStore;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  SerdeError(#[from] serde_json::Error),
  #[error("对象键无效: {0}")]
  InvalidKey(String),
  #[error("存储配置无效: {0}")]
  InvalidConfig(String),
  #[error("远程存储返回错误 {status}: {body}")]
  Status { status: u16, body: String },
  #[error("远程存储请求失败: {0}")]
  Transport(String),
  #[error("存储锁已损坏")]
  Poisoned,
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub(crate) fn check_key(name: &str) -> Result<(), StoreError> {
  if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
    return Err(StoreError::InvalidKey(name.to_string()));
  }
  Ok(())
}

/// 按记录时间降序，时间相同时后写入的在前
pub(crate) fn newest_first(mut records: Vec<ArtworkRecord>, limit: usize) -> Vec<ArtworkRecord> {
  records.reverse();
  records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  records.truncate(limit);
  records
}

pub enum StoreWrapper {
  Filesystem(FilesystemStore),
  #[cfg(feature = "hosted_store")]
  Hosted(HostedStore),
}

impl FromUrl for StoreWrapper {
  type Error = StoreError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      FilesystemStore::SCHEME => Ok(StoreWrapper::Filesystem(FilesystemStore::from_url(url)?)),
      #[cfg(feature = "hosted_store")]
      HostedStore::SCHEME => Ok(StoreWrapper::Hosted(HostedStore::from_url(url)?)),
      other => Err(StoreError::SchemeMismatch(other.to_string())),
    }
  }
}

impl ArtworkStore for StoreWrapper {
  fn upload_image(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError> {
    match self {
      StoreWrapper::Filesystem(store) => store.upload_image(name, bytes),
      #[cfg(feature = "hosted_store")]
      StoreWrapper::Hosted(store) => store.upload_image(name, bytes),
    }
  }

  fn save_record(&self, record: &ArtworkRecord) -> Result<(), StoreError> {
    match self {
      StoreWrapper::Filesystem(store) => store.save_record(record),
      #[cfg(feature = "hosted_store")]
      StoreWrapper::Hosted(store) => store.save_record(record),
    }
  }

  fn list_records(&self, limit: usize) -> Result<Vec<ArtworkRecord>, StoreError> {
    match self {
      StoreWrapper::Filesystem(store) => store.list_records(limit),
      #[cfg(feature = "hosted_store")]
      StoreWrapper::Hosted(store) => store.list_records(limit),
    }
  }
}
