// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/compose/draw.rs - 绘制图元
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
  Blend, Canvas, draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut,
  draw_text_mut,
};

use crate::layout::PanelRect;

/// 带透明度混合的绘制层
pub type Layer = Blend<RgbaImage>;

/// 圆角矩形，逐像素判断，保证每个像素只混合一次
pub fn rounded_panel(
  layer: &mut Layer,
  rect: &PanelRect,
  radius: f32,
  fill: Rgba<u8>,
  outline: Rgba<u8>,
  outline_width: f32,
) {
  if rect.width <= 0.0 || rect.height <= 0.0 {
    return;
  }

  let (cw, ch) = layer.dimensions();
  let half_w = rect.width / 2.0;
  let half_h = rect.height / 2.0;
  let r = radius.min(half_w).min(half_h).max(0.0);
  let (cx, cy) = (rect.x + half_w, rect.y + half_h);

  let x0 = rect.x.floor().max(0.0) as u32;
  let y0 = rect.y.floor().max(0.0) as u32;
  let x1 = (rect.right().ceil().max(0.0) as u32).min(cw);
  let y1 = (rect.bottom().ceil().max(0.0) as u32).min(ch);

  for py in y0..y1 {
    for px in x0..x1 {
      // 圆角矩形的有向距离，负值在内部
      let qx = (px as f32 + 0.5 - cx).abs() - (half_w - r);
      let qy = (py as f32 + 0.5 - cy).abs() - (half_h - r);
      let sdf = qx.max(0.0).hypot(qy.max(0.0)) + qx.max(qy).min(0.0) - r;
      if sdf > 0.0 {
        continue;
      }
      let color = if sdf > -outline_width { outline } else { fill };
      layer.draw_pixel(px, py, color);
    }
  }
}

/// 水平分隔线，`width` 向下加粗
pub fn rule(layer: &mut Layer, x0: f32, x1: f32, y: f32, width: u32, color: Rgba<u8>) {
  for i in 0..width {
    let y = y + i as f32;
    draw_line_segment_mut(layer, (x0, y), (x1, y), color);
  }
}

pub fn thick_line(
  layer: &mut Layer,
  start: (f32, f32),
  end: (f32, f32),
  width: u32,
  color: Rgba<u8>,
) {
  for offset in 0..width {
    let o = offset as f32;
    draw_line_segment_mut(layer, (start.0 + o, start.1), (end.0 + o, end.1), color);
    draw_line_segment_mut(layer, (start.0, start.1 + o), (end.0, end.1 + o), color);
  }
}

pub fn disc(layer: &mut Layer, center: (f32, f32), radius: f32, color: Rgba<u8>) {
  draw_filled_circle_mut(
    layer,
    (center.0.round() as i32, center.1.round() as i32),
    radius.round() as i32,
    color,
  );
}

pub fn ring(layer: &mut Layer, center: (f32, f32), radius: f32, width: u32, color: Rgba<u8>) {
  let center = (center.0.round() as i32, center.1.round() as i32);
  for i in 0..width as i32 {
    let r = radius.round() as i32 - i;
    if r > 0 {
      draw_hollow_circle_mut(layer, center, r, color);
    }
  }
}

pub fn text(
  layer: &mut Layer,
  font: &FontArc,
  position: (f32, f32),
  px: f32,
  color: Rgba<u8>,
  content: &str,
) {
  if content.is_empty() || px < 1.0 {
    return;
  }
  draw_text_mut(
    layer,
    color,
    position.0.round() as i32,
    position.1.round() as i32,
    PxScale::from(px),
    font,
    content,
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn panel_has_outline_and_fill() {
    let mut layer = Blend(RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255])));
    let rect = PanelRect {
      x: 5.0,
      y: 5.0,
      width: 30.0,
      height: 30.0,
    };
    let fill = Rgba([255, 255, 255, 255]);
    let outline = Rgba([255, 0, 0, 255]);
    rounded_panel(&mut layer, &rect, 6.0, fill, outline, 2.0);

    let image = layer.0;
    // 圆角外保持原样
    assert_eq!(image.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    assert_eq!(image.get_pixel(5, 20), &outline);
    assert_eq!(image.get_pixel(20, 20), &fill);
    assert_eq!(image.get_pixel(2, 20), &Rgba([0, 0, 0, 255]));
  }

  #[test]
  fn drawing_off_canvas_is_clipped() {
    let mut layer = Blend(RgbaImage::new(10, 10));
    let rect = PanelRect {
      x: 5.0,
      y: 5.0,
      width: 40.0,
      height: 40.0,
    };
    rounded_panel(
      &mut layer,
      &rect,
      4.0,
      Rgba([1, 2, 3, 255]),
      Rgba([4, 5, 6, 255]),
      1.0,
    );
    thick_line(&mut layer, (-5.0, -5.0), (50.0, 50.0), 2, Rgba([9, 9, 9, 255]));
    ring(&mut layer, (8.0, 8.0), 20.0, 2, Rgba([7, 7, 7, 255]));
    assert_eq!(layer.0.dimensions(), (10, 10));
  }
}
