//! TUI for polyrhythm
//!
//! One loop on the main thread: tick the scheduler against the wall clock,
//! collect finished voices, draw, then poll the keyboard for up to one frame.

mod polygons;
mod transport;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use tracing::warn;

use polyrhythm::{
    model::{MAX_SIDES, MIN_SIDES},
    synth::{AudioBackend, RingBackend},
    Pitch, PolyResult, PolygonId, RotationalScheduler, Session, VoiceEngine,
};

use polygons::render_polygons;
use transport::{render_transport, TransportView};

/// Degrees a single arrow key press moves the playhead.
const JUMP_DEGREES: f64 = 15.0;
const RPM_STEP: f64 = 5.0;
/// Octave new vertex notes start in.
const NOTE_OCTAVE: i8 = 4;

const HELP: &str = " [Space] Play/Pause  [R] Reset  [←/→] Jump  [+/-] RPM  [S] Stop voices  \
[A/D] Add/Remove  [Tab] Select  [ [ / ] ] Sides  [M] Scale  [K] Root  [N/X] Set/Clear note  [Q] Quit";

pub struct UiApp {
    session: Session,
    scheduler: RotationalScheduler,
    engine: VoiceEngine<RingBackend>,
    started: Instant,
    selected: usize,
    status: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(session: Session, scheduler: RotationalScheduler, engine: VoiceEngine<RingBackend>) -> Self {
        Self {
            session,
            scheduler,
            engine,
            started: Instant::now(),
            selected: 0,
            status: String::new(),
            should_quit: false,
        }
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Run the UI event loop (~60 fps)
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            let now = self.now();
            self.scheduler.tick(&mut self.session, now, &mut self.engine);
            self.engine.collect();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.engine.stop_all_voices();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        let now = self.now();
        let result = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Char(' ') => {
                self.scheduler.toggle_playing(&mut self.session, now);
                Ok(())
            }
            KeyCode::Char('r') => {
                self.scheduler.reset(&mut self.session, now);
                Ok(())
            }
            KeyCode::Left => self.jump(-JUMP_DEGREES, now),
            KeyCode::Right => self.jump(JUMP_DEGREES, now),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_rpm(RPM_STEP, now),
            KeyCode::Char('-') => self.nudge_rpm(-RPM_STEP, now),
            KeyCode::Char('s') => {
                let stopped = self.engine.stop_all_voices();
                self.status = format!("stopped {stopped} voices");
                Ok(())
            }
            KeyCode::Char('a') => self.add_polygon(),
            KeyCode::Char('d') => {
                if self.session.remove_last_polygon().is_some() {
                    self.clamp_selection();
                }
                Ok(())
            }
            KeyCode::Tab => {
                let count = self.session.polygons().len();
                if count > 0 {
                    self.selected = (self.selected + 1) % count;
                }
                Ok(())
            }
            KeyCode::Char('[') => self.change_sides(-1),
            KeyCode::Char(']') => self.change_sides(1),
            KeyCode::Char('m') => {
                let (scale, root) = (self.session.scale().next(), self.session.root());
                self.session.set_scale(scale, root);
                Ok(())
            }
            KeyCode::Char('k') => {
                let (scale, root) = (self.session.scale(), self.session.root().transpose(1));
                self.session.set_scale(scale, root);
                Ok(())
            }
            KeyCode::Char('n') => self.step_note(),
            KeyCode::Char('x') => self.clear_note(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            warn!(%err, "input rejected");
            self.status = err.to_string();
        }
    }

    fn jump(&mut self, degrees: f64, now: f64) -> PolyResult<()> {
        let angle = self.session.playhead().angle() + degrees;
        self.scheduler.set_angle(&mut self.session, angle, true, now)
    }

    fn nudge_rpm(&mut self, delta: f64, now: f64) -> PolyResult<()> {
        let rpm = self.session.playhead().rpm() + delta;
        self.scheduler.set_rpm(&mut self.session, rpm, now)
    }

    fn add_polygon(&mut self) -> PolyResult<()> {
        let sides = self
            .session
            .polygons()
            .last()
            .map_or(MIN_SIDES, |p| (p.sides() + 1).min(MAX_SIDES));
        self.session.add_polygon(sides)?;
        self.selected = self.session.polygons().len() - 1;
        Ok(())
    }

    fn clamp_selection(&mut self) {
        let count = self.session.polygons().len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    fn change_sides(&mut self, delta: isize) -> PolyResult<()> {
        let Some(polygon) = self.session.polygons().get(self.selected) else {
            return Ok(());
        };
        let (id, sides) = (polygon.id(), polygon.sides());
        let sides = sides.saturating_add_signed(delta);
        self.session.set_sides(id, sides)
    }

    /// Vertex of the selected polygon nearest the playhead.
    fn vertex_under_playhead(&self) -> Option<(PolygonId, usize, Option<Pitch>)> {
        let polygon = self.session.polygons().get(self.selected)?;
        let vertex = polygon.vertex_near(self.session.playhead().angle());
        Some((polygon.id(), vertex, polygon.note(vertex)))
    }

    /// Empty vertex gets the root; a filled one moves up one scale degree.
    fn step_note(&mut self) -> PolyResult<()> {
        let Some((id, vertex, current)) = self.vertex_under_playhead() else {
            return Ok(());
        };
        let notes = self.session.scale_notes();
        let next = match current {
            None => Pitch::new(self.session.root(), NOTE_OCTAVE)?,
            Some(pitch) => {
                let degree = notes.iter().position(|c| *c == pitch.class).unwrap_or(0);
                let class = notes[(degree + 1) % notes.len()];
                let octave = if degree + 1 >= notes.len() {
                    pitch.octave + 1
                } else {
                    pitch.octave
                };
                Pitch::new(class, octave).or_else(|_| Pitch::new(class, NOTE_OCTAVE))?
            }
        };
        self.session.set_note(id, vertex, Some(next))
    }

    fn clear_note(&mut self) -> PolyResult<()> {
        match self.vertex_under_playhead() {
            Some((id, vertex, _)) => self.session.clear_note(id, vertex),
            None => Ok(()),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Min(10),   // Wheel
                Constraint::Length(1), // Status
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let view = TransportView {
            state: self.scheduler.state(),
            rpm: self.session.playhead().rpm(),
            angle: self.session.playhead().angle(),
            scale: self.session.scale(),
            root: self.session.root(),
            live_voices: self.engine.live_count(),
            backend: self.engine.backend().state(),
        };
        render_transport(frame, chunks[0], &view);
        render_polygons(frame, chunks[1], &self.session, self.selected);

        let status = Paragraph::new(format!(" {}", self.status)).style(Style::default().fg(Color::Yellow));
        frame.render_widget(status, chunks[2]);

        let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
