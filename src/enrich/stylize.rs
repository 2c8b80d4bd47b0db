// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/enrich/stylize.rs - 像素风格化
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

use image::{DynamicImage, imageops::FilterType};
use tracing::info;

use crate::{
  codec::{self, CodecError},
  enrich::{Enriched, FallbackPolicy, ProviderError},
  error::ServiceError,
};

pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(15);
pub const BLOCK_MIN: u32 = 2;
pub const BLOCK_MAX: u32 = 64;
pub const DEFAULT_BLOCK_SIZE: u32 = 10;

pub trait ImageGenerator: Send + Sync {
  fn name(&self) -> &str;
  /// 返回生成图片的原始字节，格式不限
  fn generate_image(&self, image: &[u8], prompt: Option<&str>) -> Result<Vec<u8>, ProviderError>;
}

/// 最近邻缩小再放大回原尺寸，输出 PNG
pub fn pixelate(image: &DynamicImage, block_size: u32) -> Result<Vec<u8>, CodecError> {
  let block = block_size.clamp(BLOCK_MIN, BLOCK_MAX);
  let (width, height) = (image.width(), image.height());
  let small = image.to_rgb8();
  let small = image::imageops::resize(
    &small,
    (width / block).max(1),
    (height / block).max(1),
    FilterType::Nearest,
  );
  let pixelated = image::imageops::resize(&small, width, height, FilterType::Nearest);
  codec::encode_png(&DynamicImage::ImageRgb8(pixelated))
}

pub struct StylizeService {
  generator: Option<Arc<dyn ImageGenerator>>,
  policy: FallbackPolicy,
}

impl StylizeService {
  pub fn new(generator: Option<Arc<dyn ImageGenerator>>) -> Self {
    if let Some(generator) = &generator {
      info!("生图服务: {}", generator.name());
    }
    StylizeService {
      generator,
      policy: FallbackPolicy::new("stylize", IMAGE_TIMEOUT),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.policy = self.policy.with_timeout(timeout);
    self
  }

  /// 返回 PNG 字节；主服务的输出无法解码时视为失败并走本地像素化
  pub fn stylize(
    &self,
    image: &[u8],
    prompt: Option<&str>,
    block_size: u32,
  ) -> Result<Enriched<Vec<u8>>, ServiceError> {
    let decoded = codec::decode_image(image)?;

    let primary = self.generator.clone().map(|generator| {
      let image = image.to_vec();
      let prompt = prompt.map(str::to_string);
      move || {
        let generated = generator.generate_image(&image, prompt.as_deref())?;
        if generated.is_empty() {
          return Err(ProviderError::Empty);
        }
        let generated = codec::decode_image(&generated)
          .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        codec::encode_png(&generated).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
      }
    });

    self.policy.run(primary, || {
      pixelate(&decoded, block_size).map_err(ServiceError::from)
    })
  }
}
