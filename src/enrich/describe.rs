// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/enrich/describe.rs - 物品文案生成
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

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::enrich::{Enriched, FallbackPolicy, ProviderError};

pub const TEXT_TIMEOUT: Duration = Duration::from_secs(12);

const DEFAULT_OBJECT_NAME: &str = "这件物品";
const DEFAULT_CATEGORY: &str = "杂物";
const SENTENCE_END: char = '。';

pub trait TextGenerator: Send + Sync {
  fn name(&self) -> &str;
  fn generate_text(&self, request: &DescribeRequest) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeRequest {
  pub object_name: String,
  pub category: String,
  pub context: Option<String>,
}

impl DescribeRequest {
  /// 空白的名称与类别替换为默认值
  pub fn new(object_name: &str, category: &str, context: Option<&str>) -> Self {
    let or_default = |value: &str, default: &str| {
      let value = value.trim();
      if value.is_empty() {
        default.to_string()
      } else {
        value.to_string()
      }
    };
    DescribeRequest {
      object_name: or_default(object_name, DEFAULT_OBJECT_NAME),
      category: or_default(category, DEFAULT_CATEGORY),
      context: context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string),
    }
  }
}

pub fn template_description(request: &DescribeRequest) -> String {
  let hint = match request.category.as_str() {
    "杂物" | "家具" => "像是从谷仓里翻出的旧物",
    _ => "带着刚晒过的暖意",
  };
  let context_note = request
    .context
    .as_deref()
    .map(|c| format!(" 关于{}", c))
    .unwrap_or_default();
  format!(
    "{}散发着{}，{}让人想起星露谷的慢生活。轻轻触碰，仿佛能听到远处风铃声。",
    request.object_name, hint, context_note
  )
}

/// 保留前两句，按 `。` 切分；没有可用句子时返回 `None`
pub fn trim_to_two_sentences(text: &str) -> Option<String> {
  let normalized = text.trim().replace('\n', " ");
  let parts: Vec<&str> = normalized
    .split(SENTENCE_END)
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .take(2)
    .collect();
  if parts.is_empty() {
    return None;
  }
  let mut trimmed = parts.join("。");
  trimmed.push(SENTENCE_END);
  Some(trimmed)
}

pub struct DescriptionService {
  generator: Option<Arc<dyn TextGenerator>>,
  policy: FallbackPolicy,
}

impl DescriptionService {
  pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
    if let Some(generator) = &generator {
      info!("文案服务: {}", generator.name());
    }
    DescriptionService {
      generator,
      policy: FallbackPolicy::new("text", TEXT_TIMEOUT),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.policy = self.policy.with_timeout(timeout);
    self
  }

  /// 总会返回一段文案
  pub fn describe(&self, request: &DescribeRequest) -> Enriched<String> {
    let primary = self.generator.clone().map(|generator| {
      let request = request.clone();
      move || {
        let text = generator.generate_text(&request)?;
        trim_to_two_sentences(&text).ok_or(ProviderError::Empty)
      }
    });

    let result = self
      .policy
      .run(primary, || Ok::<_, Infallible>(template_description(request)));
    match result {
      Ok(enriched) => enriched,
      Err(never) => match never {},
    }
  }
}
