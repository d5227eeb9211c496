//! Wheel widget: concentric polygons, vertex notes colored by scale degree,
//! and the playhead as a line from the center.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line as TextLine, Span},
    widgets::{
        canvas::{Canvas, Line, Points},
        Block, Borders,
    },
    Frame,
};

use polyrhythm::{
    scale::{degree_color, Rgb},
    Session,
};

const EMPTY_VERTEX: Rgb = Rgb(0x50, 0x50, 0x50);

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Degrees clockwise from 12 o'clock to canvas coordinates.
fn point(radius: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees.to_radians();
    (radius * radians.sin(), radius * radians.cos())
}

pub fn render_polygons(frame: &mut Frame, area: Rect, session: &Session, selected: usize) {
    let extent = session
        .polygons()
        .iter()
        .map(|p| p.radius() as f64)
        .fold(1.0f64, f64::max)
        * 1.15;
    // terminal cells are roughly twice as tall as wide
    let aspect = if area.height > 0 {
        (area.width as f64 / (area.height as f64 * 2.0)).max(1.0)
    } else {
        1.0
    };

    let canvas = Canvas::default()
        .block(Block::default().title(" Wheel ").borders(Borders::ALL))
        .x_bounds([-extent * aspect, extent * aspect])
        .y_bounds([-extent, extent])
        .paint(|ctx| {
            for (index, polygon) in session.polygons().iter().enumerate() {
                let radius = polygon.radius() as f64;
                let edge = match (index == selected, polygon.is_active()) {
                    (true, _) => Color::White,
                    (false, true) => Color::Gray,
                    (false, false) => Color::DarkGray,
                };

                let sides = polygon.sides();
                for vertex in 0..sides {
                    let (x1, y1) = point(radius, polygon.vertex_angle(vertex));
                    let (x2, y2) = point(radius, polygon.vertex_angle((vertex + 1) % sides));
                    ctx.draw(&Line::new(x1, y1, x2, y2, edge));
                }
                ctx.layer();

                for vertex in 0..sides {
                    let note = polygon.note(vertex);
                    let rgb = degree_color(note, session.scale(), session.root(), EMPTY_VERTEX);
                    let (x, y) = point(radius, polygon.vertex_angle(vertex));
                    ctx.draw(&Points {
                        coords: &[(x, y)],
                        color: color(rgb),
                    });
                    if let Some(pitch) = note {
                        ctx.print(
                            x,
                            y,
                            TextLine::from(Span::styled(pitch.to_string(), Style::default().fg(color(rgb)))),
                        );
                    }
                }
            }

            let (x, y) = point(extent, session.playhead().angle());
            ctx.draw(&Line::new(0.0, 0.0, x, y, Color::Red));
        });

    frame.render_widget(canvas, area);
}
