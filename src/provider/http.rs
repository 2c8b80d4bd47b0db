// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/provider/http.rs - HTTP 调用公共部分
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

use std::io::ErrorKind;
use std::time::Duration;

use serde_json::Value;

use crate::enrich::ProviderError;

pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
  ureq::AgentBuilder::new().timeout(timeout).build()
}

/// 状态码与传输错误统一归类为可恢复错误
pub(crate) fn classify(err: ureq::Error, timeout: Duration) -> ProviderError {
  match err {
    ureq::Error::Status(status, _) => match ProviderError::from_status(status) {
      ProviderError::Timeout(_) => ProviderError::Timeout(timeout),
      other => other,
    },
    ureq::Error::Transport(transport) => {
      let timed_out = std::error::Error::source(&transport)
        .and_then(|e| e.downcast_ref::<std::io::Error>())
        .is_some_and(|e| matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock));
      if timed_out {
        ProviderError::Timeout(timeout)
      } else {
        ProviderError::Transport(transport.to_string())
      }
    }
  }
}

pub(crate) fn read_json(response: ureq::Response) -> Result<Value, ProviderError> {
  response
    .into_json()
    .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}

/// 按路径逐级取字符串字段
pub(crate) fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
  path
    .iter()
    .try_fold(value, |v, key| v.get(key))
    .and_then(Value::as_str)
}
