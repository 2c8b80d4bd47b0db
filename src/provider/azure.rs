// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/provider/azure.rs - Azure Computer Vision 物体检测
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

use serde_json::Value;
use tracing::debug;

use crate::{
  enrich::{ProviderError, detection::DETECTION_TIMEOUT, Detector},
  layout::clamp,
  model::{DetectionBox, ImageSize, NormalizedBounds},
  provider::http,
};

pub struct AzureDetector {
  agent: ureq::Agent,
  endpoint: String,
  key: String,
}

impl AzureDetector {
  pub fn new(endpoint: &str, key: &str) -> Self {
    AzureDetector {
      agent: http::agent(DETECTION_TIMEOUT),
      endpoint: endpoint.trim_end_matches('/').to_string(),
      key: key.to_string(),
    }
  }

  fn detect_url(&self) -> String {
    format!("{}/vision/v3.2/detect", self.endpoint)
  }
}

impl Detector for AzureDetector {
  fn name(&self) -> &str {
    "azure-cv"
  }

  fn detect(
    &self,
    image: &[u8],
    size: ImageSize,
    max_results: usize,
  ) -> Result<Vec<DetectionBox>, ProviderError> {
    let response = self
      .agent
      .post(&self.detect_url())
      .set("Ocp-Apim-Subscription-Key", &self.key)
      .set("Content-Type", "application/octet-stream")
      .send_bytes(image)
      .map_err(|e| http::classify(e, DETECTION_TIMEOUT))?;
    let body = http::read_json(response)?;
    let boxes = parse_objects(&body, size, max_results);
    debug!("Azure 返回 {} 个物体", boxes.len());
    Ok(boxes)
  }
}

fn number(rect: &Value, keys: [&str; 2]) -> Option<f32> {
  keys
    .iter()
    .find_map(|key| rect.get(key).and_then(Value::as_f64))
    .map(|v| v as f32)
}

/// 解析 `objects[]`，像素坐标按图像尺寸归一化；缺少坐标的条目被跳过
pub fn parse_objects(body: &Value, size: ImageSize, max_results: usize) -> Vec<DetectionBox> {
  let Some(objects) = body.get("objects").and_then(Value::as_array) else {
    return Vec::new();
  };
  let width = size.width.max(1) as f32;
  let height = size.height.max(1) as f32;

  objects
    .iter()
    .take(max_results)
    .enumerate()
    .filter_map(|(index, object)| {
      let rect = object
        .get("rectangle")
        .or_else(|| object.get("boundingBox"))?;
      let x = number(rect, ["x", "left"])?;
      let y = number(rect, ["y", "top"])?;
      let w = number(rect, ["w", "width"])?;
      let h = number(rect, ["h", "height"])?;

      let label = object.get("object").and_then(Value::as_str).map(str::to_string);
      Some(DetectionBox {
        id: label.clone().unwrap_or_else(|| format!("box-{}", index + 1)),
        bounds: NormalizedBounds {
          x: clamp(x / width, 0.0, 1.0),
          y: clamp(y / height, 0.0, 1.0),
          width: clamp(w / width, 0.0, 1.0),
          height: clamp(h / height, 0.0, 1.0),
        },
        label,
        confidence: object
          .get("confidence")
          .and_then(Value::as_f64)
          .map(|c| c as f32),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  const SIZE: ImageSize = ImageSize {
    width: 200,
    height: 100,
  };

  #[test]
  fn rectangle_schema_is_normalized() {
    let body = json!({
      "objects": [
        { "rectangle": { "x": 50, "y": 25, "w": 100, "h": 50 }, "object": "cup", "confidence": 0.8 }
      ]
    });
    let boxes = parse_objects(&body, SIZE, 5);
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].id, "cup");
    assert_eq!(boxes[0].label.as_deref(), Some("cup"));
    assert_eq!(
      boxes[0].bounds,
      NormalizedBounds {
        x: 0.25,
        y: 0.25,
        width: 0.5,
        height: 0.5
      }
    );
    assert_eq!(boxes[0].confidence, Some(0.8));
  }

  #[test]
  fn bounding_box_schema_and_zero_origin() {
    let body = json!({
      "objects": [
        { "boundingBox": { "left": 0, "top": 0, "width": 400, "height": 20 } },
        { "rectangle": { "x": 10 } },
        { "rectangle": { "x": 20, "y": 10, "w": 20, "h": 10 } }
      ]
    });
    let boxes = parse_objects(&body, SIZE, 5);
    assert_eq!(boxes.len(), 2);
    assert_eq!(boxes[0].id, "box-1");
    assert_eq!(boxes[0].bounds.x, 0.0);
    assert_eq!(boxes[0].bounds.width, 1.0);
    assert_eq!(boxes[1].id, "box-3");
  }

  #[test]
  fn respects_max_results_and_missing_objects() {
    let one = json!({ "rectangle": { "x": 1, "y": 1, "w": 1, "h": 1 } });
    let body = json!({ "objects": [one.clone(), one.clone(), one] });
    assert_eq!(parse_objects(&body, SIZE, 2).len(), 2);
    assert!(parse_objects(&json!({}), SIZE, 5).is_empty());
  }

  #[test]
  fn endpoint_path() {
    let detector = AzureDetector::new("https://cv.example.com/", "k");
    assert_eq!(
      detector.detect_url(),
      "https://cv.example.com/vision/v3.2/detect"
    );
  }
}
