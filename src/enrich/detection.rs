// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/enrich/detection.rs - 物体检测
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

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::{
  codec,
  enrich::{Enriched, FallbackPolicy, ProviderError},
  error::ServiceError,
  layout::clamp,
  model::{DetectionBox, ImageSize, NormalizedBounds},
};

pub const DETECTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_RESULTS_LIMIT: usize = 20;

pub trait Detector: Send + Sync {
  fn name(&self) -> &str;
  /// 返回归一化坐标的检测框
  fn detect(
    &self,
    image: &[u8],
    size: ImageSize,
    max_results: usize,
  ) -> Result<Vec<DetectionBox>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
  pub boxes: Vec<DetectionBox>,
  pub image_size: ImageSize,
}

// (x, y, w, h, 标签, 置信度)
type BoxSpec = (f32, f32, f32, f32, &'static str, f32);

const LANDSCAPE_LAYOUT: [BoxSpec; 3] = [
  (0.2, 0.16, 0.48, 0.42, "主物体", 0.9),
  (0.65, 0.2, 0.22, 0.26, "前景物体", 0.82),
  (0.28, 0.58, 0.26, 0.28, "次物体", 0.76),
];

const PORTRAIT_LAYOUT: [BoxSpec; 3] = [
  (0.22, 0.12, 0.44, 0.5, "主物体", 0.9),
  (0.18, 0.64, 0.28, 0.26, "左侧物体", 0.78),
  (0.58, 0.64, 0.24, 0.26, "右侧物体", 0.74),
];

/// 只依赖宽高比的固定检测框
pub fn fallback_boxes(size: ImageSize, max_results: usize) -> Vec<DetectionBox> {
  let aspect = if size.height == 0 {
    1.0
  } else {
    size.width as f32 / size.height as f32
  };
  let layout = if aspect >= 1.0 {
    &LANDSCAPE_LAYOUT
  } else {
    &PORTRAIT_LAYOUT
  };

  layout
    .iter()
    .take(max_results.max(1))
    .enumerate()
    .map(|(index, &(x, y, w, h, label, confidence))| DetectionBox {
      id: format!("box-{}", index + 1),
      bounds: NormalizedBounds {
        x: clamp(x, 0.0, 1.0),
        y: clamp(y, 0.0, 1.0),
        width: clamp(w, 0.05, 0.95),
        height: clamp(h, 0.05, 0.95),
      },
      label: Some(label.to_string()),
      confidence: Some(confidence),
    })
    .collect()
}

/// 截断到 `max_results`，把坐标夹到 [0, 1]，丢弃退化的框
pub fn sanitize_boxes(boxes: Vec<DetectionBox>, max_results: usize) -> Vec<DetectionBox> {
  boxes
    .into_iter()
    .filter_map(|mut item| {
      let b = &mut item.bounds;
      if [b.x, b.y, b.width, b.height].iter().any(|v| !v.is_finite()) {
        return None;
      }
      b.x = clamp(b.x, 0.0, 1.0);
      b.y = clamp(b.y, 0.0, 1.0);
      b.width = clamp(b.width, 0.0, 1.0);
      b.height = clamp(b.height, 0.0, 1.0);
      if b.width <= 0.0 || b.height <= 0.0 {
        return None;
      }
      item.confidence = item
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| clamp(c, 0.0, 1.0));
      Some(item)
    })
    .take(max_results)
    .collect()
}

pub struct DetectionService {
  detector: Option<Arc<dyn Detector>>,
  policy: FallbackPolicy,
}

impl DetectionService {
  pub fn new(detector: Option<Arc<dyn Detector>>) -> Self {
    if let Some(detector) = &detector {
      info!("检测服务: {}", detector.name());
    }
    DetectionService {
      detector,
      policy: FallbackPolicy::new("detection", DETECTION_TIMEOUT),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.policy = self.policy.with_timeout(timeout);
    self
  }

  /// 无法读取的图片是终止性错误；其余失败都返回兜底检测框
  pub fn detect(
    &self,
    image: &[u8],
    max_results: usize,
  ) -> Result<Enriched<Detection>, ServiceError> {
    let decoded = codec::decode_image(image)?;
    let size = ImageSize {
      width: decoded.width(),
      height: decoded.height(),
    };
    let max_results = max_results.clamp(1, MAX_RESULTS_LIMIT);

    let primary = self.detector.clone().map(|detector| {
      let image = image.to_vec();
      move || {
        let boxes = sanitize_boxes(detector.detect(&image, size, max_results)?, max_results);
        if boxes.is_empty() {
          return Err(ProviderError::Empty);
        }
        Ok(boxes)
      }
    });

    let enriched = self.policy.run(primary, || {
      Ok::<_, ServiceError>(fallback_boxes(size, max_results))
    })?;
    Ok(enriched.map(|boxes| Detection {
      boxes,
      image_size: size,
    }))
  }
}
