//! Transport bar widget - play state, speed, angle, key and voice count

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use polyrhythm::{scheduler::transport::TransportState, synth::BackendState, PitchClass, ScaleKind};

/// Snapshot of what the bar shows.
pub struct TransportView {
    pub state: TransportState,
    pub rpm: f64,
    pub angle: f64,
    pub scale: ScaleKind,
    pub root: PitchClass,
    pub live_voices: usize,
    pub backend: BackendState,
}

pub fn render_transport(frame: &mut Frame, area: Rect, view: &TransportView) {
    let block = Block::default().title(" polyrhythm ").borders(Borders::ALL);

    let (symbol, label, color) = match view.state {
        TransportState::Playing => ("▶", "Playing", Color::Green),
        TransportState::Stopped => ("⏸", "Paused", Color::Yellow),
        TransportState::ManualJump { .. } => ("⇥", "Jump", Color::Magenta),
    };
    let backend = match view.backend {
        BackendState::Running => Span::styled("audio ok", Style::default().fg(Color::DarkGray)),
        BackendState::Suspended => Span::styled("audio starting", Style::default().fg(Color::Yellow)),
        BackendState::Closed => Span::styled("audio closed", Style::default().fg(Color::Red)),
    };

    let line = Line::from(vec![
        Span::styled(format!(" RPM: {:.0}  ", view.rpm), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{symbol} {label}  "), Style::default().fg(color)),
        Span::styled(format!("{:>5.1}°  ", view.angle), Style::default().fg(Color::White)),
        Span::styled(
            format!("{} {}  ", view.root, view.scale),
            Style::default().fg(Color::LightBlue),
        ),
        Span::styled(
            format!("voices: {}  ", view.live_voices),
            Style::default().fg(Color::Magenta),
        ),
        backend,
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
