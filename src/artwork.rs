// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/artwork.rs - 作品保存与列表
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
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::{
  compose::Compositor,
  error::ServiceError,
  model::{ArtworkRecord, LabelPayload, NormalizedBounds, ValidationError},
  store::{ArtworkStore, StoreError},
};

pub const RECORD_ID_LEN: usize = 16;
pub const LIST_LIMIT_MAX: usize = 50;

/// SHA-256 十六进制摘要
pub fn checksum(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

pub fn object_key(checksum: &str) -> String {
  format!("artwork-{}.png", checksum)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtwork {
  pub id: String,
  pub url: String,
  pub created_at: DateTime<Utc>,
  pub checksum: String,
}

/// 合成并保存作品。
///
/// 相同内容得到相同的对象键与 id，对象被覆盖写入；但每次保存都会追加一条新的元数据记录，
/// 记录流水不去重。
pub struct ArtworkManager<S> {
  store: S,
  compositor: Compositor,
}

impl<S: ArtworkStore> ArtworkManager<S> {
  pub fn new(store: S, compositor: Compositor) -> Self {
    ArtworkManager { store, compositor }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn save(
    &self,
    user_id: &str,
    base_image: &[u8],
    label: &LabelPayload,
    box_bounds: Option<&NormalizedBounds>,
  ) -> Result<SavedArtwork, ServiceError> {
    if user_id.trim().is_empty() {
      return Err(ValidationError::Empty("user_id").into());
    }
    label.validate()?;
    if let Some(bounds) = box_bounds {
      bounds.validate()?;
    }

    let composed = self.compositor.compose(base_image, label, box_bounds)?;
    Ok(self.save_composed(&composed, user_id)?)
  }

  /// 保存已合成的图像字节
  pub fn save_composed(&self, composed: &[u8], user_id: &str) -> Result<SavedArtwork, StoreError> {
    let checksum = checksum(composed);
    let url = self.store.upload_image(&object_key(&checksum), composed)?;

    let record = ArtworkRecord {
      id: checksum[..RECORD_ID_LEN].to_string(),
      user_id: user_id.to_string(),
      url,
      created_at: Utc::now(),
    };
    self.store.save_record(&record)?;
    info!("保存作品: id={} checksum={}", record.id, checksum);

    Ok(SavedArtwork {
      id: record.id,
      url: record.url,
      created_at: record.created_at,
      checksum,
    })
  }

  pub fn list(&self, limit: usize) -> Result<Vec<ArtworkRecord>, ServiceError> {
    let limit = limit.clamp(1, LIST_LIMIT_MAX);
    Ok(self.store.list_records(limit)?)
  }
}
