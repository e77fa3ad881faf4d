//! Streaming reveal demo.
//!
//! ```sh
//! cargo run --example reveal
//! ```
//!
//! Keys: `q` quit, `r` replay, `1`/`2`/`3` reveal speed, `j`/`k` scroll,
//! `g`/`G` top/bottom, `f` toggle follow-tail. Move the mouse over a
//! highlighted phrase to see its popover.

use std::io::stdout;
use std::time::Duration;
use std::time::Instant;

use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEventKind;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::Terminal;
use streamdown_core::crossterm_input::input_event_from_crossterm;
use streamdown_core::theme::Theme;
use streamdown_markdown::reveal::RevealOptions;
use streamdown_markdown::streaming::RevealView;
use streamdown_markdown::view::MarkdownViewOptions;

const DOC: &str = r#"# Streaming markdown

This demo reveals a markdown document the way a chat transcript arrives:
a few characters at a time, with a blinking caret at the write head.

Some phrases are marked up as ??inline highlights?? with the double
question mark syntax; hover one with the mouse to see its ??popover
label??. The delimiters never reach the screen.

## What to try

- Press `1`, `2` or `3` to change the reveal speed (restarts the reveal).
- Press `r` to replay from the top.
- Scroll up with `k` while text is still arriving, then press `G` to
  snap back to the tail.

> Block quotes, **bold**, *italics*, ~~strikethrough~~ and `inline code`
> all render while streaming, even when a tick lands mid-word.

```text
fenced code blocks
are revealed verbatim
```

A [link](https://example.com/docs) and a final ??closing thought?? to
hover. That is the whole document.
"#;

const SPEEDS: [(usize, u64); 3] = [(2, 45), (5, 30), (12, 15)];

fn main() -> std::io::Result<()> {
    enable_raw_mode()?;
    execute!(
        stdout(),
        EnterAlternateScreen,
        event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        stdout(),
        event::DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> std::io::Result<()> {
    let theme = Theme::default();
    let mut rv = RevealView::with_options(
        RevealOptions::default(),
        MarkdownViewOptions {
            padding_left: 1,
            padding_right: 1,
            ..Default::default()
        },
    );
    let mut speed = 1usize;
    rv.set_source(DOC, Instant::now());

    let mut content_area = terminal.get_frame().area();
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            terminal.draw(|frame| {
                let [content, status] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(1)])
                        .areas(frame.area());
                content_area = content;
                rv.render_ref(content, frame.buffer_mut(), &theme);

                let state = if rv.is_revealing() {
                    format!("revealing… speed {}", speed + 1)
                } else {
                    "done".to_string()
                };
                let tail = if rv.follow_tail { " · following tail" } else { "" };
                frame.buffer_mut().set_line(
                    status.x,
                    status.y,
                    &Line::from(format!(
                        " q quit · r replay · 1-3 speed · j/k g/G scroll · {state}{tail}"
                    ))
                    .style(Style::new().dim()),
                    status.width,
                );
            })?;
            needs_redraw = false;
        }

        let now = Instant::now();
        let timeout = rv
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(Duration::from_millis(250))
            .min(Duration::from_millis(250));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('r') => {
                        rv.restart(Instant::now());
                        needs_redraw = true;
                    }
                    KeyCode::Char(c @ '1'..='3') => {
                        speed = (c as u8 - b'1') as usize;
                        let (chunk_size, millis) = SPEEDS[speed];
                        rv.set_reveal_options(
                            RevealOptions {
                                chunk_size,
                                tick_interval: Duration::from_millis(millis),
                            },
                            Instant::now(),
                        );
                        needs_redraw = true;
                    }
                    KeyCode::Char('f') => {
                        rv.follow_tail = !rv.follow_tail;
                        needs_redraw = true;
                    }
                    _ => {
                        if let Some(ev) = input_event_from_crossterm(Event::Key(key)) {
                            needs_redraw |= rv.handle_event(content_area, ev);
                        }
                    }
                },
                Event::Resize(..) => needs_redraw = true,
                other => {
                    if let Some(ev) = input_event_from_crossterm(other) {
                        needs_redraw |= rv.handle_event(content_area, ev);
                    }
                }
            }
        }

        needs_redraw |= rv.poll(Instant::now());
    }
}
