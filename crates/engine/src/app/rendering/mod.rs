mod bubble;
mod pixel_surface;
mod renderer;
mod surface;
mod text;
mod transform;

pub use bubble::{draw_speech_bubble, layout_speech_bubble, BubbleLayout, BUBBLE_FONT_SIZE};
pub use pixel_surface::PixelSurface;
pub use renderer::Renderer;
pub use surface::{DrawError, DrawSurface, PixelRect, Rgba};
pub use text::{text_width, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
pub use transform::{screen_to_world, world_to_screen, ViewTransform, Viewport};

use tracing::warn;

use crate::app::{Camera2D, SimEntity, Vec2, WorldSize};

pub const BACKDROP_COLOR: Rgba = [0x33, 0x33, 0x33, 255];
pub const WORLD_FLOOR_COLOR: Rgba = [0x2a, 0x2a, 0x2a, 255];
pub const GRID_COLOR: Rgba = [255, 255, 255, 26];
pub const BOUNDARY_COLOR: Rgba = [255, 255, 255, 128];
pub const GRID_SPACING: f32 = 100.0;
pub const BOUNDARY_WIDTH: f32 = 4.0;

/// Draws one frame of the world onto `surface`: backdrop, floor, grid,
/// boundary, then every entity in ascending Y so lower entities overlap the
/// ones behind them. `draw_order` is scratch space reused across frames.
/// The surface transform is back to identity on return.
pub fn render_world(
    surface: &mut dyn DrawSurface,
    camera: &Camera2D,
    world: WorldSize,
    entities: &[SimEntity],
    draw_order: &mut Vec<usize>,
) {
    let viewport = surface.viewport();
    surface.reset_transform();
    surface.clear(BACKDROP_COLOR);
    if viewport.is_empty() {
        return;
    }

    surface.set_transform(ViewTransform::from_camera(camera, viewport));
    surface.fill_rect(world.bounds(), WORLD_FLOOR_COLOR);
    draw_grid(surface, world);
    surface.stroke_rect(world.bounds(), BOUNDARY_WIDTH, BOUNDARY_COLOR);

    collect_depth_order(entities, draw_order);
    for &index in draw_order.iter() {
        let entity = &entities[index];
        if let Err(error) = entity.draw(surface) {
            warn!(
                entity = entity.id().0,
                character = entity.character().id,
                error = %error,
                "entity_draw_failed"
            );
        }
    }

    surface.reset_transform();
}

/// Indices of `entities` sorted by ascending Y. Ties keep spawn order.
pub fn collect_depth_order(entities: &[SimEntity], draw_order: &mut Vec<usize>) {
    draw_order.clear();
    draw_order.extend(0..entities.len());
    draw_order.sort_by(|a, b| {
        entities[*a]
            .position()
            .y
            .total_cmp(&entities[*b].position().y)
    });
}

fn draw_grid(surface: &mut dyn DrawSurface, world: WorldSize) {
    let mut x = 0.0;
    while x <= world.width {
        surface.line(Vec2::new(x, 0.0), Vec2::new(x, world.height), GRID_COLOR);
        x += GRID_SPACING;
    }
    let mut y = 0.0;
    while y <= world.height {
        surface.line(Vec2::new(0.0, y), Vec2::new(world.width, y), GRID_COLOR);
        y += GRID_SPACING;
    }
}
