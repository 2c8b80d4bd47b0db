// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/codec.rs - 图像与 Base64 编解码
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

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
  #[error("无法解析 Base64 图像内容: {0}")]
  InvalidBase64(#[from] base64::DecodeError),
  #[error("无法读取图片: {0}")]
  InvalidImage(image::ImageError),
  #[error("图像编码失败: {0}")]
  Encode(image::ImageError),
}

/// 解码 Base64 字符串或 data URL
pub fn decode_base64_image(data: &str) -> Result<Vec<u8>, CodecError> {
  let encoded = match data.split_once("base64,") {
    Some((_, encoded)) => encoded,
    None => data,
  };
  Ok(STANDARD.decode(encoded.trim())?)
}

pub fn to_png_data_url(png: &[u8]) -> String {
  format!("data:image/png;base64,{}", STANDARD.encode(png))
}

/// 按内容猜测格式并完整解码
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, CodecError> {
  ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()
    .map_err(|e| CodecError::InvalidImage(image::ImageError::IoError(e)))?
    .decode()
    .map_err(CodecError::InvalidImage)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
  let mut bytes = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .map_err(CodecError::Encode)?;
  Ok(bytes)
}
