// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/enrich.rs - 增强服务的主备调度
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

//! 检测、文案、生图三类增强调用共用的调度策略：
//! 先在限时内调用主服务，任何可恢复的失败都转入确定性的兜底生成。
//! 终止性错误只能由兜底闭包返回，因此会原样向上传播。

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

pub mod describe;
pub mod detection;
pub mod stylize;

pub use self::describe::{DescribeRequest, DescriptionService, TextGenerator};
pub use self::detection::{Detection, DetectionService, Detector};
pub use self::stylize::{ImageGenerator, StylizeService};

/// 主服务的可恢复错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
  #[error("服务未配置")]
  NotConfigured,
  #[error("服务认证失败")]
  Unauthorized,
  #[error("服务繁忙，请求被限流")]
  RateLimited,
  #[error("服务超时 ({0:?})")]
  Timeout(Duration),
  #[error("服务返回错误状态: {0}")]
  Upstream(u16),
  #[error("请求失败: {0}")]
  Transport(String),
  #[error("响应不可用: {0}")]
  MalformedResponse(String),
  #[error("响应为空")]
  Empty,
}

impl ProviderError {
  pub fn code(&self) -> &'static str {
    match self {
      ProviderError::NotConfigured => "not_configured",
      ProviderError::Unauthorized => "unauthorized",
      ProviderError::RateLimited => "rate_limited",
      ProviderError::Timeout(_) => "timeout",
      ProviderError::Upstream(_) => "upstream_error",
      ProviderError::Transport(_) => "transport_error",
      ProviderError::MalformedResponse(_) => "invalid_response",
      ProviderError::Empty => "empty_response",
    }
  }

  /// 按 HTTP 状态码归类
  pub fn from_status(status: u16) -> Self {
    match status {
      401 | 403 => ProviderError::Unauthorized,
      429 => ProviderError::RateLimited,
      408 | 504 => ProviderError::Timeout(Duration::ZERO),
      other => ProviderError::Upstream(other),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Primary,
  Fallback(ProviderError),
}

impl Source {
  pub fn is_fallback(&self) -> bool {
    matches!(self, Source::Fallback(_))
  }

  pub fn label(&self) -> &'static str {
    match self {
      Source::Primary => "primary",
      Source::Fallback(_) => "fallback",
    }
  }
}

/// 增强结果及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched<T> {
  pub value: T,
  pub source: Source,
}

impl<T> Enriched<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Enriched<U> {
    Enriched {
      value: f(self.value),
      source: self.source,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
  name: &'static str,
  timeout: Duration,
}

impl FallbackPolicy {
  pub const fn new(name: &'static str, timeout: Duration) -> Self {
    FallbackPolicy { name, timeout }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// 主服务只调用一次，不重试。`primary` 为 `None` 表示未配置。
  pub fn run<T, E, P, F>(&self, primary: Option<P>, fallback: F) -> Result<Enriched<T>, E>
  where
    T: Send + 'static,
    P: FnOnce() -> Result<T, ProviderError> + Send + 'static,
    F: FnOnce() -> Result<T, E>,
  {
    let reason = match primary {
      None => {
        debug!("{}: 主服务未配置，使用兜底结果", self.name);
        ProviderError::NotConfigured
      }
      Some(primary) => match self.try_primary(primary) {
        Ok(value) => {
          debug!("{}: 使用主服务结果", self.name);
          return Ok(Enriched {
            value,
            source: Source::Primary,
          });
        }
        Err(err) => {
          warn!("{}: 主服务失败 ({}), 使用兜底结果: {}", self.name, err.code(), err);
          err
        }
      },
    };

    let value = fallback()?;
    Ok(Enriched {
      value,
      source: Source::Fallback(reason),
    })
  }

  /// 在独立线程中调用主服务；超时后不再等待，线程结果被丢弃
  fn try_primary<T, P>(&self, primary: P) -> Result<T, ProviderError>
  where
    T: Send + 'static,
    P: FnOnce() -> Result<T, ProviderError> + Send + 'static,
  {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
      .name(format!("{}-primary", self.name))
      .spawn(move || {
        let _ = tx.send(primary());
      })
      .map_err(|e| ProviderError::Transport(e.to_string()))?;

    match rx.recv_timeout(self.timeout) {
      Ok(result) => result,
      Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout(self.timeout)),
      Err(RecvTimeoutError::Disconnected) => {
        Err(ProviderError::Transport("主服务调用异常中断".to_string()))
      }
    }
  }
}
