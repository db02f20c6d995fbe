//! Fretboard diagram: scale tones, held notes and the cursor

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use fretwork::instrument::{scale::ScaleQuantizer, tuning::FretPosition, STRING_COUNT};

const STRING_NAMES: [&str; STRING_COUNT] = ["E", "A", "D", "G", "B", "e"];

pub struct FretboardView<'a> {
    pub quantizer: &'a ScaleQuantizer,
    pub scale_on: bool,
    pub fret_count: usize,
    pub cursor: usize,
    /// Fret each string was plucked at, if held
    pub held: [Option<usize>; STRING_COUNT],
}

pub fn render_fretboard(frame: &mut Frame, area: Rect, view: &FretboardView) {
    let mut lines = Vec::with_capacity(STRING_COUNT + 1);

    // High e on top, the way a player looks down at the neck
    for string in (0..STRING_COUNT).rev() {
        let mut spans = vec![Span::styled(
            format!(" {} {} ", string + 1, STRING_NAMES[string]),
            Style::default().fg(Color::Cyan),
        )];

        for fret in 0..=view.fret_count {
            spans.push(cell(view, string, fret));
        }
        lines.push(Line::from(spans));
    }

    let mut numbers = vec![Span::raw("     ")];
    for fret in 0..=view.fret_count {
        let style = if fret == view.cursor {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        numbers.push(Span::styled(format!("{:^3}", fret), style));
    }
    lines.push(Line::from(numbers));

    let block = Block::default().title(" Fretboard ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn cell(view: &FretboardView, string: usize, fret: usize) -> Span<'static> {
    let held = view.held[string] == Some(fret);
    let in_scale = FretPosition::new(string, fret, view.fret_count)
        .map(|pos| view.quantizer.is_allowed(pos))
        .unwrap_or(false);

    let (symbol, mut style) = if held {
        ("●", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else if in_scale {
        let color = if view.scale_on { Color::Green } else { Color::Gray };
        ("◆", Style::default().fg(color))
    } else {
        ("─", Style::default().fg(Color::DarkGray))
    };

    if fret == view.cursor {
        style = style.bg(Color::Rgb(40, 40, 40));
    }
    Span::styled(format!("─{}─", symbol), style)
}
