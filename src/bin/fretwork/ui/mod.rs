//! Terminal front end for fretwork
//!
//! Turns key presses into [`InputEvent`]s and draws the fretboard, the scope
//! and a spectrum of what the bus is playing.

mod fretboard;
mod spectrum;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use log::warn;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer, RingBuffer};

use fretwork::{
    graph::analyser::ScopeReader, instrument::scale::ScaleMode, instrument::STRING_COUNT,
    FretEngine, InputEvent, VoiceId,
};

use fretboard::{render_fretboard, FretboardView};
use spectrum::{render_spectrum, Spectrum};
use waveform::render_waveform;

const INPUT_QUEUE: usize = 256;
const BEND_STEP: f32 = 0.25;
const MAX_BEND: f32 = 3.0;

/// A string the player is holding down
struct Held {
    id: VoiceId,
    start_fret: usize,
}

pub struct UiApp {
    engine: FretEngine,
    scope: ScopeReader,
    spectrum: Spectrum,
    /// Gestures go through the same event queue any other input layer would use
    input_tx: Producer<InputEvent>,
    input_rx: Consumer<InputEvent>,
    scale_mode: ScaleMode,
    held: [Option<Held>; STRING_COUNT],
    fret: usize,
    bend: f32,
    next_id: u64,
    sample_rate: f32,
    should_quit: bool,
}

impl UiApp {
    pub fn new(engine: FretEngine, scope: ScopeReader, sample_rate: f32) -> Self {
        let (input_tx, input_rx) = RingBuffer::new(INPUT_QUEUE);
        let spectrum = Spectrum::new(scope.samples().len(), sample_rate);
        let scale_mode = engine.scale_mode();

        Self {
            engine,
            scope,
            spectrum,
            input_tx,
            input_rx,
            scale_mode,
            held: Default::default(),
            fret: 0,
            bend: 0.0,
            next_id: 0,
            sample_rate,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            if self.scope.poll() > 0 {
                self.spectrum.update(self.scope.samples());
            }

            self.engine.drain_events(&mut self.input_rx);
            self.engine.reap();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        // Let the last note-offs reach the engine before the stream goes away
        self.engine.drain_events(&mut self.input_rx);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.release_all();
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='6') => {
                let string = c as usize - '1' as usize;
                self.toggle_string(string);
            }
            KeyCode::Left => self.move_fret(-1),
            KeyCode::Right => self.move_fret(1),
            KeyCode::Up => self.set_bend(self.bend + BEND_STEP),
            KeyCode::Down => self.set_bend(self.bend - BEND_STEP),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.scale_mode.toggle();
            }
            KeyCode::Char(' ') => self.release_all(),
            _ => {}
        }
    }

    fn toggle_string(&mut self, string: usize) {
        if let Some(held) = self.held[string].take() {
            self.send(InputEvent::NoteOff { id: held.id });
            return;
        }

        let id = VoiceId::from(self.next_id);
        self.next_id += 1;

        self.send(InputEvent::NoteOn {
            string,
            fret: self.fret,
            id: id.clone(),
        });
        if self.bend != 0.0 {
            self.send(InputEvent::PitchUpdate {
                id: id.clone(),
                fret_offset: 0.0,
                bend_semitones: self.bend,
            });
        }

        self.held[string] = Some(Held {
            id,
            start_fret: self.fret,
        });
    }

    fn move_fret(&mut self, step: isize) {
        let fret_count = self.engine.config().fret_count;
        self.fret = self.fret.saturating_add_signed(step).min(fret_count);
        self.send_pitch();
    }

    fn set_bend(&mut self, bend: f32) {
        self.bend = bend.clamp(0.0, MAX_BEND);
        self.send_pitch();
    }

    /// Every held note follows the cursor, measured from where it started
    fn send_pitch(&mut self) {
        let updates: Vec<InputEvent> = self
            .held
            .iter()
            .flatten()
            .map(|held| InputEvent::PitchUpdate {
                id: held.id.clone(),
                fret_offset: self.fret as f32 - held.start_fret as f32,
                bend_semitones: self.bend,
            })
            .collect();

        for event in updates {
            self.send(event);
        }
    }

    fn release_all(&mut self) {
        let ids: Vec<VoiceId> = self.held.iter_mut().filter_map(Option::take).map(|h| h.id).collect();
        for id in ids {
            self.send(InputEvent::NoteOff { id });
        }
    }

    fn send(&mut self, event: InputEvent) {
        if let Err(rtrb::PushError::Full(event)) = self.input_tx.push(event) {
            warn!(target: "fretwork::ui", "input queue full, dropping {:?}", event);
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                          // Status
                Constraint::Length(STRING_COUNT as u16 + 3),    // Fretboard
                Constraint::Min(8),                             // Scope + spectrum
                Constraint::Length(1),                          // Help
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);

        let mut held = [None; STRING_COUNT];
        for (slot, h) in held.iter_mut().zip(&self.held) {
            *slot = h.as_ref().map(|h| h.start_fret);
        }
        let view = FretboardView {
            quantizer: self.engine.quantizer(),
            scale_on: self.scale_mode.is_enabled(),
            fret_count: self.engine.config().fret_count,
            cursor: self.fret,
            held,
        };
        render_fretboard(frame, chunks[1], &view);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_waveform(frame, panels[0], self.scope.samples());
        render_spectrum(frame, panels[1], self.spectrum.data());

        let help = Paragraph::new(
            " [1-6] Pluck/Mute  [←/→] Slide  [↑/↓] Bend  [S] Scale  [Space] Release  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title(" fretwork ").borders(Borders::ALL);

        let (scale_label, scale_color) = if self.scale_mode.is_enabled() {
            ("Scale ON ", Color::Green)
        } else {
            ("Scale OFF", Color::DarkGray)
        };
        let clip = if self.engine.samples().is_loaded() { "ready" } else { "loading" };

        let mut spans = vec![
            Span::styled(format!(" {}  ", scale_label), Style::default().fg(scale_color)),
            Span::styled(format!("Fret {:>2}  ", self.fret), Style::default().fg(Color::Cyan)),
            Span::styled(format!("Bend {:+.2}  ", self.bend), Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                "Voices {} (+{})  ",
                self.engine.voice_count(),
                self.engine.releasing_count()
            )),
            Span::raw(format!("Peak {:.2}  ", self.scope.peak())),
            Span::styled(
                format!("{:.0}kHz clip {}  ", self.sample_rate / 1000.0, clip),
                Style::default().fg(Color::DarkGray),
            ),
        ];

        for voice in self.engine.snapshot() {
            spans.push(Span::styled(
                format!("{}:{:.1}Hz ", voice.id, voice.frequency),
                Style::default().fg(Color::Yellow),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}
