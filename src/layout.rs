// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/layout.rs - 画布布局几何
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

//! 叠加层的像素布局。所有函数都是纯函数，返回的矩形总在画布内。

use crate::model::{TagPosition, TimePayload};

pub const TAG_BASE_WIDTH: f32 = 320.0;
pub const TAG_BASE_HEIGHT: f32 = 210.0;
pub const TAG_SCALE_MIN: f32 = 0.6;
pub const TAG_SCALE_MAX: f32 = 2.0;
pub const TAG_ANCHOR_MIN: f32 = 0.05;
pub const TAG_ANCHOR_MAX: f32 = 0.95;

pub const PANEL_MARGIN: f32 = 12.0;
pub const CHIP_WIDTH: f32 = 180.0;
pub const CHIP_HEIGHT: f32 = 74.0;
pub const COIN_WIDTH: f32 = 140.0;
pub const COIN_HEIGHT: f32 = 32.0;
pub const COIN_GAP: f32 = 10.0;

pub const CLOCK_RADIUS: f32 = 24.0;
pub const CLOCK_RIGHT_INSET: f32 = 36.0;
pub const MINUTE_HAND_RATIO: f32 = 0.9;
pub const HOUR_HAND_RATIO: f32 = 0.65;

/// 像素空间矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRect {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl PanelRect {
  pub fn right(&self) -> f32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.y + self.height
  }

  pub fn is_within(&self, canvas_width: u32, canvas_height: u32) -> bool {
    self.x >= 0.0
      && self.y >= 0.0
      && self.right() <= canvas_width as f32
      && self.bottom() <= canvas_height as f32
  }

  /// 尺寸超出画布时先截到画布尺寸，再把左上角夹到合法区间
  fn fit(x: f32, y: f32, width: f32, height: f32, canvas_width: u32, canvas_height: u32) -> Self {
    let (cw, ch) = (canvas_width as f32, canvas_height as f32);
    let width = width.min(cw).max(0.0);
    let height = height.min(ch).max(0.0);
    PanelRect {
      x: clamp(x, 0.0, cw - width),
      y: clamp(y, 0.0, ch - height),
      width,
      height,
    }
  }
}

/// NaN 视为下界，避免 `f32::clamp` 传播 NaN
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
  if value.is_nan() {
    min
  } else {
    value.max(min).min(max)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagLayout {
  pub rect: PanelRect,
  /// 夹紧后的缩放系数
  pub scale: f32,
  /// 绘制内容时使用的缩放，小画布上可能小于 `scale`
  pub content_scale: f32,
}

pub fn effective_tag_scale(tag_scale: f32) -> f32 {
  clamp(tag_scale, TAG_SCALE_MIN, TAG_SCALE_MAX)
}

pub fn effective_anchor(position: &TagPosition) -> (f32, f32) {
  (
    clamp(position.x_percent, TAG_ANCHOR_MIN, TAG_ANCHOR_MAX),
    clamp(position.y_percent, TAG_ANCHOR_MIN, TAG_ANCHOR_MAX),
  )
}

pub fn tag_panel(
  canvas_width: u32,
  canvas_height: u32,
  position: &TagPosition,
  tag_scale: f32,
) -> TagLayout {
  let scale = effective_tag_scale(tag_scale);
  let tag_width = (TAG_BASE_WIDTH * scale).floor();
  let tag_height = (TAG_BASE_HEIGHT * scale).floor();

  let (ax, ay) = effective_anchor(position);
  let x_center = ax * canvas_width as f32;
  let y_center = ay * canvas_height as f32;

  let rect = PanelRect::fit(
    x_center - tag_width / 2.0,
    y_center - tag_height / 2.0,
    tag_width,
    tag_height,
    canvas_width,
    canvas_height,
  );

  let content_scale = scale
    .min(rect.width / TAG_BASE_WIDTH)
    .min(rect.height / TAG_BASE_HEIGHT);

  TagLayout {
    rect,
    scale,
    content_scale,
  }
}

pub fn time_chip(canvas_width: u32, canvas_height: u32) -> PanelRect {
  let right = canvas_width as f32 - PANEL_MARGIN;
  PanelRect::fit(
    right - CHIP_WIDTH,
    PANEL_MARGIN,
    CHIP_WIDTH,
    CHIP_HEIGHT,
    canvas_width,
    canvas_height,
  )
}

pub fn coin_badge(canvas_width: u32, canvas_height: u32) -> PanelRect {
  let right = canvas_width as f32 - PANEL_MARGIN;
  PanelRect::fit(
    right - COIN_WIDTH,
    PANEL_MARGIN + CHIP_HEIGHT + COIN_GAP,
    COIN_WIDTH,
    COIN_HEIGHT,
    canvas_width,
    canvas_height,
  )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockFace {
  pub center: (f32, f32),
  pub radius: f32,
}

pub fn clock_face(chip: &PanelRect) -> ClockFace {
  let radius = CLOCK_RADIUS.min(chip.height / 2.0 - 2.0).max(1.0);
  let cx = (chip.right() - CLOCK_RIGHT_INSET).max(chip.x + radius);
  let cy = chip.y + chip.height / 2.0;
  ClockFace {
    center: (cx, cy),
    radius,
  }
}

/// 时针与分针角度（度），从 12 点方向顺时针计
pub fn hand_angles(hour: u8, minute: u8) -> (f32, f32) {
  let minute_fraction = minute as f32 / 60.0;
  let minute_angle = minute_fraction * 360.0;
  let hour_angle = (hour % 12) as f32 / 12.0 * 360.0 + minute_fraction * 30.0;
  (hour_angle, minute_angle)
}

pub fn hand_endpoint(center: (f32, f32), length: f32, angle_deg: f32) -> (f32, f32) {
  let radians = (angle_deg - 90.0).to_radians();
  (
    center.0 + length * radians.cos(),
    center.1 + length * radians.sin(),
  )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockHands {
  pub hour: (f32, f32),
  pub minute: (f32, f32),
}

pub fn clock_hands(face: &ClockFace, time: &TimePayload) -> ClockHands {
  let (hour_angle, minute_angle) = hand_angles(time.hour, time.minute);
  ClockHands {
    hour: hand_endpoint(face.center, face.radius * HOUR_HAND_RATIO, hour_angle),
    minute: hand_endpoint(face.center, face.radius * MINUTE_HAND_RATIO, minute_angle),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CANVASES: [(u32, u32); 6] = [(1, 1), (64, 48), (48, 64), (200, 100), (1024, 768), (4000, 3000)];
  const EXTREMES: [f32; 8] = [
    -5.0,
    0.0,
    0.01,
    0.5,
    0.99,
    1.0,
    7.0,
    f32::NAN,
  ];

  #[test]
  fn tag_scale_is_clamped() {
    for scale in [-1.0, 0.0, 0.1, 0.6, 1.0, 2.0, 2.5, 3.0, 100.0, f32::NAN] {
      let effective = effective_tag_scale(scale);
      assert!((TAG_SCALE_MIN..=TAG_SCALE_MAX).contains(&effective), "{scale} -> {effective}");
    }
    assert_eq!(effective_tag_scale(1.3), 1.3);
  }

  #[test]
  fn anchor_is_clamped() {
    for x in EXTREMES {
      for y in EXTREMES {
        let (ax, ay) = effective_anchor(&TagPosition {
          x_percent: x,
          y_percent: y,
        });
        assert!((TAG_ANCHOR_MIN..=TAG_ANCHOR_MAX).contains(&ax));
        assert!((TAG_ANCHOR_MIN..=TAG_ANCHOR_MAX).contains(&ay));
      }
    }
  }

  #[test]
  fn tag_panel_stays_inside_canvas() {
    for (w, h) in CANVASES {
      for x in EXTREMES {
        for y in EXTREMES {
          for scale in [0.1, 1.0, 2.0, 3.0] {
            let layout = tag_panel(
              w,
              h,
              &TagPosition {
                x_percent: x,
                y_percent: y,
              },
              scale,
            );
            assert!(
              layout.rect.is_within(w, h),
              "canvas {w}x{h}, anchor ({x},{y}), scale {scale}: {:?}",
              layout.rect
            );
            assert!(layout.content_scale <= layout.scale);
          }
        }
      }
    }
  }

  #[test]
  fn tag_panel_centers_on_anchor_when_room() {
    let layout = tag_panel(
      1000,
      1000,
      &TagPosition {
        x_percent: 0.5,
        y_percent: 0.5,
      },
      1.0,
    );
    assert_eq!(
      layout.rect,
      PanelRect {
        x: 340.0,
        y: 395.0,
        width: 320.0,
        height: 210.0
      }
    );
    assert_eq!(layout.content_scale, 1.0);
  }

  #[test]
  fn near_edge_anchor_is_pushed_inside() {
    let layout = tag_panel(
      800,
      600,
      &TagPosition {
        x_percent: 1.0,
        y_percent: 0.0,
      },
      2.0,
    );
    assert_eq!(layout.rect.width, 640.0);
    assert_eq!(layout.rect.right(), 800.0);
    assert_eq!(layout.rect.y, 0.0);
  }

  #[test]
  fn chip_and_coin_anchor_top_right() {
    let chip = time_chip(1024, 768);
    assert_eq!(
      chip,
      PanelRect {
        x: 1024.0 - 12.0 - 180.0,
        y: 12.0,
        width: 180.0,
        height: 74.0
      }
    );
    let coin = coin_badge(1024, 768);
    assert_eq!(coin.right(), chip.right());
    assert_eq!(coin.y, chip.bottom() + COIN_GAP);
    assert_eq!((coin.width, coin.height), (140.0, 32.0));
  }

  #[test]
  fn fixed_panels_fit_small_canvases() {
    for (w, h) in CANVASES {
      assert!(time_chip(w, h).is_within(w, h));
      assert!(coin_badge(w, h).is_within(w, h));
    }
  }

  #[test]
  fn clock_angles() {
    assert_eq!(hand_angles(0, 0), (0.0, 0.0));
    assert_eq!(hand_angles(12, 0), (0.0, 0.0));
    assert_eq!(hand_angles(6, 0).0, 180.0);
    assert_eq!(hand_angles(3, 30), (105.0, 180.0));
    assert_eq!(hand_angles(15, 30).0, 105.0);
  }

  #[test]
  fn zero_angle_points_straight_up() {
    let (x, y) = hand_endpoint((50.0, 50.0), 10.0, 0.0);
    assert!((x - 50.0).abs() < 1e-4);
    assert!((y - 40.0).abs() < 1e-4);

    let (x, y) = hand_endpoint((50.0, 50.0), 10.0, 90.0);
    assert!((x - 60.0).abs() < 1e-4);
    assert!((y - 50.0).abs() < 1e-4);
  }

  #[test]
  fn hands_scale_with_radius() {
    let chip = time_chip(1024, 768);
    let face = clock_face(&chip);
    assert_eq!(face.radius, CLOCK_RADIUS);
    assert_eq!(face.center, (chip.right() - 36.0, chip.y + 37.0));

    let hands = clock_hands(
      &face,
      &TimePayload {
        hour: 6,
        minute: 0,
        month: 1,
        day: 1,
      },
    );
    let (cx, cy) = face.center;
    assert!((hands.minute.1 - (cy - face.radius * MINUTE_HAND_RATIO)).abs() < 1e-3);
    assert!((hands.hour.1 - (cy + face.radius * HOUR_HAND_RATIO)).abs() < 1e-3);
    assert!((hands.hour.0 - cx).abs() < 1e-3);
  }
}
