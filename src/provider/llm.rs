// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/provider/llm.rs - 通用文案生成接口
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

use crate::{
  enrich::{DescribeRequest, ProviderError, TextGenerator, describe::TEXT_TIMEOUT},
  provider::http,
};

pub struct LlmTextGenerator {
  agent: ureq::Agent,
  endpoint: String,
  key: String,
}

impl LlmTextGenerator {
  pub fn new(endpoint: &str, key: &str) -> Self {
    LlmTextGenerator {
      agent: http::agent(TEXT_TIMEOUT),
      endpoint: endpoint.to_string(),
      key: key.to_string(),
    }
  }
}

pub fn request_body(request: &DescribeRequest) -> Value {
  json!({
    "object_name": request.object_name,
    "category": request.category,
    "context": request.context,
    "tone": "stardew",
  })
}

/// 依次尝试 `description`、`text`、`choices[0].message.content`
pub fn extract_text(body: &Value) -> Option<String> {
  http::str_at(body, &["description"])
    .or_else(|| http::str_at(body, &["text"]))
    .or_else(|| {
      body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|first| http::str_at(first, &["message", "content"]))
    })
    .map(|text| text.trim().to_string())
}

impl TextGenerator for LlmTextGenerator {
  fn name(&self) -> &str {
    "llm"
  }

  fn generate_text(&self, request: &DescribeRequest) -> Result<String, ProviderError> {
    let response = self
      .agent
      .post(&self.endpoint)
      .set("Authorization", &format!("Bearer {}", self.key))
      .send_json(request_body(request))
      .map_err(|e| http::classify(e, TEXT_TIMEOUT))?;
    let body = http::read_json(response)?;
    extract_text(&body)
      .ok_or_else(|| ProviderError::MalformedResponse("缺少文案字段".to_string()))
  }
}
