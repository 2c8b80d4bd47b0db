// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/text.rs - 文本折行与时间文本
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

/// 按字符数贪心折行，不寻找词边界。
///
/// 所有行按顺序拼接后与原文完全一致；`limit` 小于 1 时按 1 处理。
pub fn wrap_text(text: &str, limit: usize) -> Vec<String> {
  let limit = limit.max(1);
  if text.chars().count() <= limit {
    return vec![text.to_string()];
  }

  let mut lines = Vec::new();
  let mut current = String::new();
  let mut count = 0;
  for ch in text.chars() {
    if count == limit {
      lines.push(std::mem::take(&mut current));
      count = 0;
    }
    current.push(ch);
    count += 1;
  }
  if !current.is_empty() {
    lines.push(current);
  }
  lines
}

/// 例如 `上午 9:05`、`下午 12:30`
pub fn format_time_label(hour: u8, minute: u8) -> String {
  let suffix = if hour < 12 { "上午" } else { "下午" };
  let display_hour = match hour % 12 {
    0 => 12,
    h => h,
  };
  format!("{} {}:{:02}", suffix, display_hour, minute)
}

pub fn format_date_label(month: u8, day: u8) -> String {
  format!("{}月{}日", month, day)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLES: [&str; 5] = [
    "",
    "短句",
    "春天的根茎作物，口感清甜。放在背包里还能闻到泥土的气味。",
    "mixed 中英 text with  double spaces ",
    "🎃南瓜🎃",
  ];

  #[test]
  fn wrap_round_trips() {
    for text in SAMPLES {
      for limit in 0..12 {
        let lines = wrap_text(text, limit);
        assert_eq!(lines.concat(), text, "limit {limit}");
        for line in &lines {
          assert!(line.chars().count() <= limit.max(1));
        }
      }
    }
  }

  #[test]
  fn short_text_is_single_line() {
    assert_eq!(wrap_text("短句", 2), vec!["短句".to_string()]);
    assert_eq!(wrap_text("", 0), vec![String::new()]);
  }

  #[test]
  fn wrap_breaks_by_characters() {
    assert_eq!(wrap_text("abcdefg", 3), vec!["abc", "def", "g"]);
    assert_eq!(wrap_text("abc", 0), vec!["a", "b", "c"]);
  }

  #[test]
  fn wrap_is_idempotent() {
    for text in SAMPLES {
      let first = wrap_text(text, 4);
      let second = wrap_text(&first.concat(), 4);
      assert_eq!(first, second);
    }
  }

  #[test]
  fn time_labels() {
    assert_eq!(format_time_label(0, 0), "上午 12:00");
    assert_eq!(format_time_label(9, 5), "上午 9:05");
    assert_eq!(format_time_label(12, 30), "下午 12:30");
    assert_eq!(format_time_label(23, 59), "下午 11:59");
    assert_eq!(format_date_label(3, 14), "3月14日");
  }
}
