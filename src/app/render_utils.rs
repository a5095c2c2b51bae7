use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke};

use crate::viewport::Viewport;

const CANVAS_FILL: Color32 = Color32::from_rgb(15, 23, 42);
const GRID_LINE: Color32 = Color32::from_rgba_premultiplied(30, 41, 59, 90);
const GRID_SPACING: f32 = 200.0;

/// Fills the canvas and draws a world-anchored grid that follows pan and zoom.
pub(super) fn draw_background(painter: &Painter, rect: Rect, viewport: &Viewport) {
    painter.rect_filled(rect, 0.0, CANVAS_FILL);

    let step = GRID_SPACING * viewport.zoom;
    if step < 12.0 {
        return;
    }

    let origin = viewport.world_to_screen(rect, eframe::egui::Vec2::ZERO);
    let stroke = Stroke::new(1.0, GRID_LINE);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, center: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(center)
}

/// Conservative culling: keeps any segment whose bounding box touches the canvas.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    Rect::from_two_pos(start, end).expand(padding).intersects(rect)
}
