// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/provider/gemini.rs - Gemini 风格生图接口
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

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};

use crate::{
  codec,
  enrich::{ImageGenerator, ProviderError, stylize::IMAGE_TIMEOUT},
  provider::http,
};

pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_PROMPT: &str = "Convert this photo into a Stardew Valley pixel art style.";

pub struct GeminiImageGenerator {
  agent: ureq::Agent,
  endpoint: String,
  key: String,
  model: String,
}

impl GeminiImageGenerator {
  pub fn new(endpoint: &str, key: &str, model: Option<&str>) -> Self {
    GeminiImageGenerator {
      agent: http::agent(IMAGE_TIMEOUT),
      endpoint: endpoint.to_string(),
      key: key.to_string(),
      model: model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string(),
    }
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  pub fn request_body(&self, image: &[u8], prompt: Option<&str>) -> Value {
    let prompt = prompt.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_PROMPT);
    json!({
      "contents": [{
        "parts": [
          { "inline_data": { "mime_type": "image/png", "data": STANDARD.encode(image) } },
          { "text": prompt },
        ]
      }],
      "model": self.model,
    })
  }
}

/// 取出响应中的第一张图片，接受原始 Base64 或 data URL
pub fn extract_image(body: &Value) -> Result<Vec<u8>, ProviderError> {
  let encoded = http::str_at(body, &["image_base64"]).or_else(|| {
    let first = body
      .get("candidates")
      .or_else(|| body.get("predictions"))?
      .get(0)?;
    first
      .get("content")?
      .get("parts")?
      .as_array()?
      .iter()
      .find_map(|part| {
        http::str_at(part, &["inline_data", "data"])
          .or_else(|| http::str_at(part, &["inlineData", "data"]))
      })
  });

  let encoded =
    encoded.ok_or_else(|| ProviderError::MalformedResponse("响应中没有图片".to_string()))?;
  codec::decode_base64_image(encoded).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

impl ImageGenerator for GeminiImageGenerator {
  fn name(&self) -> &str {
    "gemini"
  }

  fn generate_image(&self, image: &[u8], prompt: Option<&str>) -> Result<Vec<u8>, ProviderError> {
    let response = self
      .agent
      .post(&self.endpoint)
      .query("key", &self.key)
      .set("Content-Type", "application/json")
      .send_json(self.request_body(image, prompt))
      .map_err(|e| http::classify(e, IMAGE_TIMEOUT))?;
    let body = http::read_json(response)?;
    extract_image(&body)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_model_and_prompt() {
    let generator = GeminiImageGenerator::new("https://gen.example.com", "k", Some(" "));
    assert_eq!(generator.model(), DEFAULT_MODEL);
    let body = generator.request_body(b"png", None);
    assert_eq!(body["contents"][0]["parts"][1]["text"], DEFAULT_PROMPT);
    assert_eq!(
      body["contents"][0]["parts"][0]["inline_data"]["data"],
      STANDARD.encode(b"png")
    );
  }

  #[test]
  fn extracts_from_all_schemas() {
    let raw = STANDARD.encode(b"img");
    assert_eq!(extract_image(&json!({ "image_base64": raw })).unwrap(), b"img");

    let body = json!({
      "candidates": [{ "content": { "parts": [
        { "text": "ok" },
        { "inline_data": { "mime_type": "image/png", "data": raw } }
      ] } }]
    });
    assert_eq!(extract_image(&body).unwrap(), b"img");

    let body = json!({
      "predictions": [{ "content": { "parts": [
        { "inlineData": { "data": format!("data:image/png;base64,{}", raw) } }
      ] } }]
    });
    assert_eq!(extract_image(&body).unwrap(), b"img");
  }

  #[test]
  fn missing_image_is_malformed() {
    assert!(matches!(
      extract_image(&json!({ "candidates": [] })),
      Err(ProviderError::MalformedResponse(_))
    ));
    assert!(matches!(
      extract_image(&json!({ "image_base64": "@@@" })),
      Err(ProviderError::MalformedResponse(_))
    ));
  }
}
