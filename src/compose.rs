// 该文件是 PixelTag （像素标签） 项目的一部分。
// src/compose.rs - 作品合成
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

use std::path::Path;

use ab_glyph::FontArc;
use image::{DynamicImage, Rgba};
use imageproc::drawing::{Blend, Canvas};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  codec::{self, CodecError},
  layout::{self, TagLayout},
  model::{LabelPayload, NormalizedBounds, TimePayload},
  text::{format_date_label, format_time_label, wrap_text},
};

pub mod draw;

use self::draw::Layer;

/// 显示能量与生命值的类别
pub const FOOD_CATEGORIES: [&str; 2] = ["菜品", "食物"];

const DEFAULT_NAME: &str = "未命名物品";
const DEFAULT_CATEGORY: &str = "类别";
const DEFAULT_DESCRIPTION: &str = "在这里写下物品的故事。";
const COIN_NUMERAL: &str = "88888888";

// 标签配色
const TAG_FRAME: Rgba<u8> = Rgba([196, 119, 24, 255]);
const TAG_FILL: Rgba<u8> = Rgba([255, 230, 179, 240]);
const TAG_DIVIDER: Rgba<u8> = Rgba([180, 104, 16, 255]);
const TAG_CATEGORY: Rgba<u8> = Rgba([110, 58, 12, 255]);
const TAG_BODY: Rgba<u8> = Rgba([92, 50, 10, 255]);
const TAG_ENERGY: Rgba<u8> = Rgba([46, 102, 8, 255]);
const TAG_HEALTH: Rgba<u8> = Rgba([141, 26, 26, 255]);

// 时间牌配色
const CHIP_WOOD: Rgba<u8> = Rgba([206, 162, 112, 235]);
const CHIP_OUTLINE: Rgba<u8> = Rgba([120, 82, 44, 255]);
const CHIP_TEXT: Rgba<u8> = Rgba([64, 38, 12, 255]);
const CLOCK_FILL: Rgba<u8> = Rgba([239, 211, 170, 255]);

// 金币牌配色
const COIN_FILL: Rgba<u8> = Rgba([234, 188, 76, 240]);
const COIN_OUTLINE: Rgba<u8> = Rgba([162, 108, 28, 255]);
const COIN_TEXT: Rgba<u8> = Rgba([84, 52, 10, 255]);

const NAME_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 12.0;
const CHIP_FONT_SIZE: f32 = 13.0;
const BODY_CHAR_WIDTH: f32 = 7.0; // 每字符平均宽度（粗略估计）

#[derive(Error, Debug)]
pub enum FontLoadError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 在底图上叠加标签、时间牌与金币牌。
///
/// 默认使用内嵌字体，可通过 [`Compositor::from_font_file`] 替换（例如需要中文字形时）。
#[derive(Clone)]
pub struct Compositor {
  font: FontArc,
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
  if value.is_empty() { default } else { value }
}

impl Default for Compositor {
  fn default() -> Self {
    let font_data: &'static [u8] = include_bytes!("../assets/font.ttf"); // default font
    let font = FontArc::try_from_slice(font_data).expect("无法加载嵌入的字体文件");
    Self::with_font(font)
  }
}

impl Compositor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_font(font: FontArc) -> Self {
    Self { font }
  }

  pub fn from_font_file(path: &Path) -> Result<Self, FontLoadError> {
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    Ok(Self::with_font(FontArc::try_from_vec(data)?))
  }

  /// 合成作品并输出 PNG 字节。`box_bounds` 预留给检测框与标签对齐，目前不参与绘制。
  pub fn compose(
    &self,
    base_image: &[u8],
    label: &LabelPayload,
    box_bounds: Option<&NormalizedBounds>,
  ) -> Result<Vec<u8>, CodecError> {
    let _ = box_bounds;
    let base = codec::decode_image(base_image)?;
    debug!("合成底图: {}x{}", base.width(), base.height());

    // 绘制顺序即图层顺序
    let mut layer = Blend(base.to_rgba8());
    self.draw_tag(&mut layer, label);
    self.draw_time_chip(&mut layer, &label.time);
    self.draw_coin(&mut layer);

    codec::encode_png(&DynamicImage::ImageRgba8(layer.0))
  }

  fn text(&self, layer: &mut Layer, position: (f32, f32), px: f32, color: Rgba<u8>, content: &str) {
    draw::text(layer, &self.font, position, px, color, content);
  }

  fn draw_tag(&self, layer: &mut Layer, label: &LabelPayload) {
    let (width, height) = layer.dimensions();
    let TagLayout {
      rect,
      content_scale: s,
      ..
    } = layout::tag_panel(width, height, &label.tag_position, label.tag_scale);

    draw::rounded_panel(layer, &rect, 12.0 * s, TAG_FILL, TAG_FRAME, 3.0);

    let padding = 12.0 * s;
    let text_x = rect.x + padding;
    let text_right = rect.right() - padding;
    let mut y = rect.y + padding;

    self.text(
      layer,
      (text_x, y),
      NAME_FONT_SIZE * s,
      TAG_FRAME,
      or_default(&label.name, DEFAULT_NAME),
    );
    y += 18.0 * s;
    draw::rule(layer, text_x, text_right, y, 1, TAG_DIVIDER);

    y += 8.0 * s;
    self.text(
      layer,
      (text_x, y),
      BODY_FONT_SIZE * s,
      TAG_CATEGORY,
      or_default(&label.category, DEFAULT_CATEGORY),
    );
    y += 14.0 * s;
    draw::rule(layer, text_x, text_right, y, 3, TAG_DIVIDER);

    y += 10.0 * s;
    let body_width = text_right - text_x;
    let limit = (body_width / (BODY_CHAR_WIDTH * s)).floor().max(0.0) as usize;
    let description = or_default(&label.description, DEFAULT_DESCRIPTION);
    for line in wrap_text(description, limit) {
      self.text(layer, (text_x, y), BODY_FONT_SIZE * s, TAG_BODY, &line);
      y += 14.0 * s;
    }

    if FOOD_CATEGORIES.contains(&label.category.as_str()) {
      y += 6.0 * s;
      let energy = format!("+{} 能量", label.energy);
      let health = format!("+{} 生命值", label.health);
      self.text(layer, (text_x, y), BODY_FONT_SIZE * s, TAG_ENERGY, &energy);
      self.text(
        layer,
        (text_x + body_width * 0.5, y),
        BODY_FONT_SIZE * s,
        TAG_HEALTH,
        &health,
      );
    }
  }

  fn draw_time_chip(&self, layer: &mut Layer, time: &TimePayload) {
    let (width, height) = layer.dimensions();
    let chip = layout::time_chip(width, height);
    draw::rounded_panel(layer, &chip, 10.0, CHIP_WOOD, CHIP_OUTLINE, 2.0);

    let text_x = chip.x + 12.0;
    let top_y = chip.y + 10.0;
    self.text(
      layer,
      (text_x, top_y),
      CHIP_FONT_SIZE,
      CHIP_TEXT,
      &format_date_label(time.month, time.day),
    );
    self.text(
      layer,
      (text_x, top_y + 18.0),
      CHIP_FONT_SIZE,
      CHIP_TEXT,
      &format_time_label(time.hour, time.minute),
    );

    let face = layout::clock_face(&chip);
    draw::disc(layer, face.center, face.radius, CLOCK_FILL);
    draw::ring(layer, face.center, face.radius, 2, CHIP_OUTLINE);

    let hands = layout::clock_hands(&face, time);
    draw::thick_line(layer, face.center, hands.minute, 2, CHIP_OUTLINE);
    draw::thick_line(layer, face.center, hands.hour, 2, CHIP_OUTLINE);
    draw::disc(layer, face.center, 2.0, CHIP_OUTLINE);
  }

  fn draw_coin(&self, layer: &mut Layer) {
    let (width, height) = layer.dimensions();
    let coin = layout::coin_badge(width, height);
    draw::rounded_panel(layer, &coin, 8.0, COIN_FILL, COIN_OUTLINE, 2.0);
    self.text(
      layer,
      (coin.x + 12.0, coin.y + 8.0),
      CHIP_FONT_SIZE,
      COIN_TEXT,
      COIN_NUMERAL,
    );
  }
}
