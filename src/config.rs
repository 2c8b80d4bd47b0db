// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/config.rs - 运行配置与服务装配
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

use std::path::PathBuf;
#[cfg(feature = "remote_providers")]
use std::sync::Arc;

use clap::Args;
use tracing::info;
use url::Url;

use crate::{
  FromUrl,
  artwork::ArtworkManager,
  compose::Compositor,
  enrich::{DescriptionService, DetectionService, StylizeService},
  error::ServiceError,
  store::StoreWrapper,
};

/// PixelTag 运行配置，命令行参数与环境变量均可设置
#[derive(Args, Debug, Clone, Default)]
pub struct Settings {
  /// 存储位置
  /// 支持格式:
  /// - 本地目录: folder:<path>
  /// - Supabase: supabase://service:<key>@<host>?bucket=..&table=..
  #[arg(long, env = "PIXELTAG_STORE", default_value = "folder:storage", value_name = "URL")]
  pub store: String,

  /// Azure Computer Vision 服务地址
  #[arg(long, env = "AZURE_CV_ENDPOINT", value_name = "URL")]
  pub azure_cv_endpoint: Option<String>,

  /// Azure Computer Vision 密钥
  #[arg(long, env = "AZURE_CV_KEY", hide_env_values = true, value_name = "KEY")]
  pub azure_cv_key: Option<String>,

  /// 文案生成服务地址
  #[arg(long, env = "TEXT_GEN_ENDPOINT", value_name = "URL")]
  pub text_gen_endpoint: Option<String>,

  /// 文案生成服务密钥
  #[arg(long, env = "TEXT_GEN_KEY", hide_env_values = true, value_name = "KEY")]
  pub text_gen_key: Option<String>,

  /// 生图服务地址
  #[arg(long, env = "IMAGE_GEN_ENDPOINT", value_name = "URL")]
  pub image_gen_endpoint: Option<String>,

  /// 生图服务密钥
  #[arg(long, env = "IMAGE_GEN_KEY", hide_env_values = true, value_name = "KEY")]
  pub image_gen_key: Option<String>,

  /// 生图模型名称
  #[arg(
    long,
    env = "IMAGE_GEN_MODEL",
    default_value = "gemini-3-pro-image-preview",
    value_name = "MODEL"
  )]
  pub image_gen_model: String,

  /// 叠加文字所用字体（TTF/OTF），未设置时使用内嵌字体
  #[arg(long, env = "PIXELTAG_FONT", value_name = "FILE")]
  pub font: Option<PathBuf>,
}

/// 地址与密钥都非空时才算已配置
fn credentials<'a>(endpoint: &'a Option<String>, key: &'a Option<String>) -> Option<(&'a str, &'a str)> {
  let endpoint = endpoint.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
  let key = key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
  Some((endpoint, key))
}

impl Settings {
  pub fn detection_credentials(&self) -> Option<(&str, &str)> {
    credentials(&self.azure_cv_endpoint, &self.azure_cv_key)
  }

  pub fn text_credentials(&self) -> Option<(&str, &str)> {
    credentials(&self.text_gen_endpoint, &self.text_gen_key)
  }

  pub fn image_credentials(&self) -> Option<(&str, &str)> {
    credentials(&self.image_gen_endpoint, &self.image_gen_key)
  }

  pub fn store_url(&self) -> Result<Url, ServiceError> {
    Url::parse(&self.store)
      .map_err(|e| ServiceError::Configuration(format!("无效的存储地址 '{}': {}", self.store, e)))
  }
}

/// 由 [`Settings`] 一次性装配的服务集合
pub struct Services {
  pub detection: DetectionService,
  pub description: DescriptionService,
  pub stylize: StylizeService,
  pub artworks: ArtworkManager<StoreWrapper>,
}

impl Services {
  pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
    let store = StoreWrapper::from_url(&settings.store_url()?)
      .map_err(|e| ServiceError::Configuration(format!("无法打开存储: {}", e)))?;

    let compositor = match &settings.font {
      Some(path) => Compositor::from_font_file(path)?,
      None => Compositor::new(),
    };

    let services = Services {
      detection: DetectionService::new(detector(settings)),
      description: DescriptionService::new(text_generator(settings)),
      stylize: StylizeService::new(image_generator(settings)),
      artworks: ArtworkManager::new(store, compositor),
    };
    info!("服务装配完成");
    Ok(services)
  }
}

#[cfg(feature = "remote_providers")]
fn detector(settings: &Settings) -> Option<Arc<dyn crate::enrich::Detector>> {
  settings
    .detection_credentials()
    .map(|(endpoint, key)| -> Arc<dyn crate::enrich::Detector> {
      Arc::new(crate::provider::AzureDetector::new(endpoint, key))
    })
}

#[cfg(feature = "remote_providers")]
fn text_generator(settings: &Settings) -> Option<Arc<dyn crate::enrich::TextGenerator>> {
  settings
    .text_credentials()
    .map(|(endpoint, key)| -> Arc<dyn crate::enrich::TextGenerator> {
      Arc::new(crate::provider::LlmTextGenerator::new(endpoint, key))
    })
}

#[cfg(feature = "remote_providers")]
fn image_generator(settings: &Settings) -> Option<Arc<dyn crate::enrich::ImageGenerator>> {
  settings
    .image_credentials()
    .map(|(endpoint, key)| -> Arc<dyn crate::enrich::ImageGenerator> {
      Arc::new(crate::provider::GeminiImageGenerator::new(
        endpoint,
        key,
        Some(&settings.image_gen_model),
      ))
    })
}

#[cfg(not(feature = "remote_providers"))]
fn detector(_settings: &Settings) -> Option<std::sync::Arc<dyn crate::enrich::Detector>> {
  None
}

#[cfg(not(feature = "remote_providers"))]
fn text_generator(_settings: &Settings) -> Option<std::sync::Arc<dyn crate::enrich::TextGenerator>> {
  None
}

#[cfg(not(feature = "remote_providers"))]
fn image_generator(
  _settings: &Settings,
) -> Option<std::sync::Arc<dyn crate::enrich::ImageGenerator>> {
  None
}
