//! Rasterization of a layout plan onto an RGBA canvas.

use ab_glyph::{Font, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut};

use super::layout::{Card, Color, LayoutPlan};

const GRADIENT_TOP: [u8; 3] = [34, 40, 55];
const GRADIENT_BOTTOM: [u8; 3] = [14, 18, 26];

const CARD_FILL: Color = [0, 0, 0, 200];
const CARD_OUTLINE: Color = [255, 255, 255, 80];
const CARD_OUTLINE_WIDTH: f32 = 2.0;

const SHADOW: Color = [0, 0, 0, 120];
const VIGNETTE_STRENGTH: f32 = 0.55;

/// Rasterize a plan with the given font
pub fn rasterize<F: Font>(plan: &LayoutPlan, font: &F) -> RgbaImage {
    let mut img = background(plan.width, plan.height);

    draw_card(&mut img, &plan.card);

    for dot in &plan.dots {
        draw_filled_circle_mut(&mut img, (dot.cx, dot.cy), dot.radius, Rgba(dot.color));
    }

    for run in &plan.texts {
        let scale = PxScale::from(run.size);
        draw_text_mut(
            &mut img,
            Rgba(SHADOW),
            run.x + run.shadow_offset,
            run.y + run.shadow_offset,
            scale,
            font,
            &run.text,
        );
        draw_text_mut(&mut img, Rgba(run.color), run.x, run.y, scale, font, &run.text);
    }

    img
}

/// Vertical gradient with an edge vignette
fn background(width: u32, height: u32) -> RgbaImage {
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_d = (cx * cx + cy * cy).sqrt();

    RgbaImage::from_fn(width, height, |x, y| {
        let t = y as f32 / height.max(1) as f32;
        let mut px = [0u8; 4];
        for c in 0..3 {
            px[c] = lerp(GRADIENT_TOP[c], GRADIENT_BOTTOM[c], t);
        }
        px[3] = 255;

        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let d = (dx * dx + dy * dy).sqrt() / max_d;
        let darken = 1.0 - VIGNETTE_STRENGTH * d * d;
        for c in px.iter_mut().take(3) {
            *c = (*c as f32 * darken) as u8;
        }

        Rgba(px)
    })
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t) as u8
}

/// Translucent rounded rectangle with a thin outline
fn draw_card(img: &mut RgbaImage, card: &Card) {
    let (img_w, img_h) = img.dimensions();

    let half_w = card.width as f32 / 2.0;
    let half_h = card.height as f32 / 2.0;
    let center_x = card.x as f32 + half_w;
    let center_y = card.y as f32 + half_h;
    let radius = card.radius as f32;

    let x0 = card.x.max(0) as u32;
    let y0 = card.y.max(0) as u32;
    let x1 = ((card.x + card.width as i32) as u32).min(img_w);
    let y1 = ((card.y + card.height as i32) as u32).min(img_h);

    for y in y0..y1 {
        for x in x0..x1 {
            // Signed distance to the rounded-rect boundary
            let dx = ((x as f32 + 0.5 - center_x).abs() - (half_w - radius)).max(0.0);
            let dy = ((y as f32 + 0.5 - center_y).abs() - (half_h - radius)).max(0.0);
            let dist = (dx * dx + dy * dy).sqrt() - radius;

            if dist > 0.0 {
                continue;
            }

            let color = if dist >= -CARD_OUTLINE_WIDTH {
                CARD_OUTLINE
            } else {
                CARD_FILL
            };
            blend(img.get_pixel_mut(x, y), color);
        }
    }
}

fn blend(px: &mut Rgba<u8>, color: Color) {
    let alpha = color[3] as f32 / 255.0;
    for c in 0..3 {
        px[c] = (color[c] as f32 * alpha + px[c] as f32 * (1.0 - alpha)) as u8;
    }
}
