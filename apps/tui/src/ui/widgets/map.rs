use crate::app::App;
use aoi_mapper::domain::{Coord, Geometry};
use aoi_mapper::label::label_style;
use aoi_mapper::view::{CELL_HEIGHT_PX, CELL_WIDTH_PX};
use aoi_mapper::{Feature, GeometryKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line as TextLine, Span};
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

/// Screen pixels covered by a point marker
const POINT_RADIUS_PX: f64 = 6.0;
/// Half length of the crosshair arms
const CROSSHAIR_PX: f64 = 14.0;

const POINT_COLOR: Color = Color::Yellow;
const POLYGON_COLOR: Color = Color::Cyan;
const SELECTED_COLOR: Color = Color::Magenta;
const SKETCH_COLOR: Color = Color::LightGreen;

pub fn render_map(app: &App, f: &mut Frame<'_>, area: Rect) {
    let session = &app.session;
    let view = session.view();
    let (lon, lat) = view.center_lon_lat();

    let block = Block::default()
        .title(format!(" Map  {lat:.5}, {lon:.5}  z{:.0} ", view.zoom()))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);

    if inner.width < 2 || inner.height < 2 {
        f.render_widget(block, area);
        return;
    }

    let extent = view.extent(
        f64::from(inner.width) * CELL_WIDTH_PX,
        f64::from(inner.height) * CELL_HEIGHT_PX,
    );
    let resolution = view.resolution();
    let selected = session.selected();

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([extent.min.x, extent.max.x])
        .y_bounds([extent.min.y, extent.max.y])
        .paint(|ctx| {
            for feature in session.layer().iter() {
                let color = if Some(feature.id()) == selected {
                    SELECTED_COLOR
                } else {
                    kind_color(feature.kind())
                };
                draw_feature(ctx, feature, color, resolution);
            }

            let draw = &session.interactions().draw;
            if draw.active {
                draw_sketch(ctx, draw.sketch(), view.center());
            }

            if let Some(grab) = session.interactions().modify.grab() {
                if let Some(vertex) = session
                    .layer()
                    .get(grab.feature)
                    .and_then(|feature| feature.geometry().vertices().get(grab.vertex))
                {
                    ctx.draw(&Circle {
                        x: vertex.x,
                        y: vertex.y,
                        radius: POINT_RADIUS_PX * resolution,
                        color: Color::Red,
                    });
                }
            }

            ctx.layer();
            for feature in session.layer().iter() {
                draw_label(ctx, feature, resolution);
            }

            draw_crosshair(ctx, view.center(), resolution);
        });

    f.render_widget(canvas, area);
}

const fn kind_color(kind: GeometryKind) -> Color {
    match kind {
        GeometryKind::Point => POINT_COLOR,
        GeometryKind::Polygon => POLYGON_COLOR,
    }
}

fn draw_feature(ctx: &mut Context<'_>, feature: &Feature, color: Color, resolution: f64) {
    match feature.geometry() {
        Geometry::Point(at) => {
            ctx.draw(&Circle {
                x: at.x,
                y: at.y,
                radius: POINT_RADIUS_PX * resolution,
                color,
            });
            ctx.draw(&Points {
                coords: &[(at.x, at.y)],
                color,
            });
        }
        Geometry::Polygon(ring) => {
            draw_path(ctx, ring, color, true);
        }
    }
}

/// Vertices placed so far, with a rubber band to the crosshair
fn draw_sketch(ctx: &mut Context<'_>, sketch: &[Coord], cursor: Coord) {
    draw_path(ctx, sketch, SKETCH_COLOR, false);
    if let Some(last) = sketch.last() {
        ctx.draw(&CanvasLine {
            x1: last.x,
            y1: last.y,
            x2: cursor.x,
            y2: cursor.y,
            color: Color::DarkGray,
        });
    }
    let coords: Vec<(f64, f64)> = sketch.iter().map(|c| (c.x, c.y)).collect();
    ctx.draw(&Points {
        coords: &coords,
        color: SKETCH_COLOR,
    });
}

fn draw_path(ctx: &mut Context<'_>, vertices: &[Coord], color: Color, closed: bool) {
    for pair in vertices.windows(2) {
        ctx.draw(&CanvasLine {
            x1: pair[0].x,
            y1: pair[0].y,
            x2: pair[1].x,
            y2: pair[1].y,
            color,
        });
    }
    if closed && vertices.len() > 2 {
        if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
            ctx.draw(&CanvasLine {
                x1: last.x,
                y1: last.y,
                x2: first.x,
                y2: first.y,
                color,
            });
        }
    }
}

fn draw_label(ctx: &mut Context<'_>, feature: &Feature, resolution: f64) {
    let Some(style) = label_style(feature) else {
        return;
    };
    // Screen offsets grow downwards, map y grows north
    let y = style.anchor.y - style.offset_y_px * resolution;
    ctx.print(
        style.anchor.x,
        y,
        TextLine::from(Span::styled(
            style.text,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
    );
}

fn draw_crosshair(ctx: &mut Context<'_>, center: Coord, resolution: f64) {
    let arm = CROSSHAIR_PX * resolution;
    ctx.draw(&CanvasLine {
        x1: center.x - arm,
        y1: center.y,
        x2: center.x + arm,
        y2: center.y,
        color: Color::Red,
    });
    ctx.draw(&CanvasLine {
        x1: center.x,
        y1: center.y - arm,
        x2: center.x,
        y2: center.y + arm,
        color: Color::Red,
    });
}
