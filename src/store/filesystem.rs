// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/store/filesystem.rs - 本地目录存储
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

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::ArtworkRecord,
  store::{ArtworkStore, StoreError, check_key, newest_first},
};

const IMAGES_DIR: &str = "images";
const RECORDS_FILE: &str = "records.jsonl";
const URL_PREFIX: &str = "local://artworks/";

/// 目录结构:
///
/// ```text
/// <base>/images/artwork-<sha256>.png
/// <base>/records.jsonl   每行一条 JSON 记录
/// ```
pub struct FilesystemStore {
  images_dir: PathBuf,
  records_file: PathBuf,
  // 写记录时独占，读记录时共享
  records_lock: RwLock<()>,
  temp_counter: AtomicU64,
}

impl FromUrlWithScheme for FilesystemStore {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FilesystemStore {
  type Error = StoreError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(StoreError::SchemeMismatch(format!(
        "期望存储方式 '{}', 实际存储方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }
    let path = percent_decode_str(uri.path())
      .decode_utf8()
      .map_err(|e| StoreError::InvalidConfig(format!("存储目录编码无效: {}", e)))?;
    if path.is_empty() {
      return Err(StoreError::InvalidConfig("存储目录为空".to_string()));
    }
    Self::open(path.into_owned())
  }
}

impl FilesystemStore {
  pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let base_dir = base_dir.into();
    let images_dir = base_dir.join(IMAGES_DIR);
    std::fs::create_dir_all(&images_dir)?;
    info!("本地存储目录: {}", base_dir.display());

    Ok(FilesystemStore {
      records_file: base_dir.join(RECORDS_FILE),
      images_dir,
      records_lock: RwLock::new(()),
      temp_counter: AtomicU64::new(0),
    })
  }

  pub fn image_path(&self, name: &str) -> PathBuf {
    self.images_dir.join(name)
  }

  fn read_records(&self) -> Result<Vec<ArtworkRecord>, StoreError> {
    let raw = match std::fs::read_to_string(&self.records_file) {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e.into()),
    };

    let mut records = Vec::new();
    for (index, line) in raw.lines().enumerate() {
      if line.trim().is_empty() {
        continue;
      }
      match serde_json::from_str::<ArtworkRecord>(line) {
        Ok(record) => records.push(record),
        Err(e) => warn!("跳过损坏的记录 (第 {} 行): {}", index + 1, e),
      }
    }
    Ok(records)
  }
}

impl ArtworkStore for FilesystemStore {
  fn upload_image(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError> {
    check_key(name)?;
    let target = self.image_path(name);

    // 先写临时文件再改名，同一对象键整体覆盖
    let serial = self.temp_counter.fetch_add(1, Ordering::Relaxed);
    let temp = self
      .images_dir
      .join(format!(".{}.{}-{}.tmp", name, std::process::id(), serial));
    std::fs::write(&temp, bytes)?;
    if let Err(e) = std::fs::rename(&temp, &target) {
      let _ = std::fs::remove_file(&temp);
      return Err(e.into());
    }

    debug!("写入图像: {} ({} 字节)", target.display(), bytes.len());
    Ok(format!("{}{}", URL_PREFIX, name))
  }

  fn save_record(&self, record: &ArtworkRecord) -> Result<(), StoreError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let _guard = self.records_lock.write().map_err(|_| StoreError::Poisoned)?;
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.records_file)?;
    file.write_all(line.as_bytes())?;
    file.sync_data()?;
    Ok(())
  }

  fn list_records(&self, limit: usize) -> Result<Vec<ArtworkRecord>, StoreError> {
    let records = {
      let _guard = self.records_lock.read().map_err(|_| StoreError::Poisoned)?;
      self.read_records()?
    };
    Ok(newest_first(records, limit))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone, Utc};
  use std::sync::Arc;

  fn record(id: &str, offset_secs: i64) -> ArtworkRecord {
    ArtworkRecord {
      id: id.to_string(),
      user_id: "user-1".to_string(),
      url: format!("{}artwork-{}.png", URL_PREFIX, id),
      created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
        + Duration::seconds(offset_secs),
    }
  }

  #[test]
  fn folder_url_path_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("my dir");
    let url = Url::parse(&format!("folder:{}", base.display())).unwrap();
    assert!(url.path().contains("%20"));

    let store = FilesystemStore::from_url(&url).unwrap();
    assert_eq!(store.image_path("a.png"), base.join("images").join("a.png"));
    assert!(base.join("images").is_dir());
  }

  #[test]
  fn empty_store_lists_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::open(dir.path()).unwrap();
    assert!(store.list_records(20).unwrap().is_empty());
  }

  #[test]
  fn records_are_listed_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::open(dir.path()).unwrap();
    store.save_record(&record("a", 0)).unwrap();
    store.save_record(&record("c", 20)).unwrap();
    store.save_record(&record("b", 10)).unwrap();

    let ids: Vec<_> = store
      .list_records(20)
      .unwrap()
      .into_iter()
      .map(|r| r.id)
      .collect();
    assert_eq!(ids, ["c", "b", "a"]);
    assert_eq!(store.list_records(2).unwrap().len(), 2);
  }

  #[test]
  fn corrupt_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::open(dir.path()).unwrap();
    store.save_record(&record("a", 0)).unwrap();
    {
      let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join(RECORDS_FILE))
        .unwrap();
      writeln!(file, "{{\"id\": \"broken\", \"created_at\": \"yesterday\"}}").unwrap();
      writeln!(file, "not json at all").unwrap();
    }
    store.save_record(&record("b", 5)).unwrap();

    let ids: Vec<_> = store
      .list_records(20)
      .unwrap()
      .into_iter()
      .map(|r| r.id)
      .collect();
    assert_eq!(ids, ["b", "a"]);
  }

  #[test]
  fn upload_overwrites_same_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemStore::open(dir.path()).unwrap();
    let url = store.upload_image("artwork-x.png", b"first").unwrap();
    assert_eq!(url, "local://artworks/artwork-x.png");
    store.upload_image("artwork-x.png", b"second").unwrap();

    assert_eq!(
      std::fs::read(store.image_path("artwork-x.png")).unwrap(),
      b"second"
    );
    let files: Vec<_> = std::fs::read_dir(dir.path().join(IMAGES_DIR))
      .unwrap()
      .collect();
    assert_eq!(files.len(), 1);
  }

  #[test]
  fn concurrent_saves_keep_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FilesystemStore::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..8)
      .map(|t| {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
          for i in 0..25 {
            store
              .save_record(&record(&format!("{t}-{i}"), i as i64))
              .unwrap();
          }
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(store.list_records(usize::MAX).unwrap().len(), 200);
  }
}
