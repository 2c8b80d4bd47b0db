// 该文件是 PixelTag （像素标签） 项目的一部分。
// tests/pipeline.rs - 端到端流程测试
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

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde_json::json;

use pixeltag::{
  artwork::checksum,
  codec,
  config::{Services, Settings},
  enrich::{DescribeRequest, Source},
  model::LabelPayload,
  store::StoreWrapper,
};

fn photo(width: u32, height: u32) -> Vec<u8> {
  let image = RgbImage::from_fn(width, height, |x, y| {
    Rgb([(x * 4) as u8, (y * 5) as u8, 120])
  });
  codec::encode_png(&DynamicImage::ImageRgb8(image)).unwrap()
}

fn label() -> LabelPayload {
  serde_json::from_value(json!({
    "name": "蓝莓",
    "category": "食物",
    "description": "夏天的浆果，一串能摘好几颗。",
    "energy": 25,
    "health": 11,
    "time": { "hour": 14, "minute": 5, "month": 7, "day": 2 },
    "tag_position": { "x_percent": 0.3, "y_percent": 0.8 }
  }))
  .unwrap()
}

fn services(dir: &tempfile::TempDir) -> Services {
  let settings = Settings {
    store: format!("folder:{}", dir.path().display()),
    ..Settings::default()
  };
  Services::from_settings(&settings).unwrap()
}

#[test]
fn saving_twice_is_content_addressed() {
  let dir = tempfile::tempdir().unwrap();
  let services = services(&dir);
  let base = photo(64, 48);

  let first = services.artworks.save("farmer", &base, &label(), None).unwrap();
  let second = services.artworks.save("farmer", &base, &label(), None).unwrap();
  assert_eq!(first.checksum, second.checksum);
  assert_eq!(first.url, second.url);

  let StoreWrapper::Filesystem(store) = services.artworks.store() else {
    panic!("expected filesystem store");
  };
  let stored = std::fs::read(store.image_path(&format!("artwork-{}.png", first.checksum))).unwrap();
  assert_eq!(checksum(&stored), first.checksum);
  assert_eq!(
    codec::decode_image(&stored).unwrap().dimensions(),
    (64, 48)
  );

  let items = services.artworks.list(10).unwrap();
  assert_eq!(items.len(), 2);
  assert_eq!(items[0].id, first.id);
  assert_eq!(items[0].user_id, "farmer");
  assert!(items[0].created_at >= items[1].created_at);
}

#[test]
fn offline_detection_uses_landscape_layout() {
  let dir = tempfile::tempdir().unwrap();
  let result = services(&dir).detection.detect(&photo(64, 48), 20).unwrap();

  assert_eq!(result.source.label(), "fallback");
  let boxes = result.value.boxes;
  assert_eq!(boxes.len(), 3);
  assert_eq!(boxes[0].label.as_deref(), Some("主物体"));
  assert_eq!(boxes[1].label.as_deref(), Some("前景物体"));
  for b in &boxes {
    for v in [b.bounds.x, b.bounds.y, b.bounds.width, b.bounds.height] {
      assert!((0.0..=1.0).contains(&v));
    }
  }
}

#[test]
fn offline_enrichment_is_deterministic() {
  let dir = tempfile::tempdir().unwrap();
  let services = services(&dir);

  let request = DescribeRequest::new("蓝莓", "食物", None);
  let first = services.description.describe(&request);
  assert_eq!(first, services.description.describe(&request));
  assert!(matches!(first.source, Source::Fallback(_)));

  let base = photo(50, 30);
  let a = services.stylize.stylize(&base, None, 6).unwrap();
  let b = services.stylize.stylize(&base, None, 6).unwrap();
  assert_eq!(a.value, b.value);
  assert_eq!(codec::decode_image(&a.value).unwrap().dimensions(), (50, 30));
}

#[test]
fn corrupt_input_surfaces_a_stable_code() {
  let dir = tempfile::tempdir().unwrap();
  let services = services(&dir);

  let err = services.detection.detect(b"\x89PNG broken", 5).unwrap_err();
  assert_eq!(err.to_json()["code"], "invalid_image");

  let err = services
    .artworks
    .save("farmer", b"\x89PNG broken", &label(), None)
    .unwrap_err();
  assert_eq!(err.code(), "invalid_image");
  assert!(services.artworks.list(5).unwrap().is_empty());
}

#[test]
fn label_text_reaches_the_saved_image() {
  let dir = tempfile::tempdir().unwrap();
  let services = services(&dir);
  let base = photo(320, 240);

  let original = services.artworks.save("farmer", &base, &label(), None).unwrap();

  let mut renamed = label();
  renamed.name = "Parsnip".to_string();
  let renamed = services.artworks.save("farmer", &base, &renamed, None).unwrap();

  let mut recategorized = label();
  recategorized.category = "家具".to_string();
  let recategorized = services
    .artworks
    .save("farmer", &base, &recategorized, None)
    .unwrap();

  assert_ne!(original.checksum, renamed.checksum);
  assert_ne!(original.checksum, recategorized.checksum);
  assert_ne!(renamed.checksum, recategorized.checksum);
}
