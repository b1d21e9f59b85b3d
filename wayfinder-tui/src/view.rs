use crate::canvas::MapCanvas;
use crate::styles;
use crate::transcript::{Tone, TranscriptLine};
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};
use std::io::Stdout;
use textwrap::wrap;
use wayfinder_config::Theme;

pub struct ViewSnap<'a> {
    pub input: String,
    pub input_cursor: usize,
    pub lines: &'a [TranscriptLine],
    pub scroll: usize,
    pub busy: bool,
    pub spinner: &'static str,
    pub status: String,
    pub reevaluate: bool,
    pub theme: Theme,
    pub map: &'a MapCanvas,
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, snap: &ViewSnap<'_>) -> Result<()> {
    let theme = snap.theme;
    term.draw(|frame| {
        let area = frame.area();
        frame.render_widget(Block::default().style(styles::background(theme)), area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new(Line::from(vec![
            Span::styled(" Wayfinder ", styles::title(theme)),
            Span::styled(
                format!(" {} /theme ", theme.glyph()),
                styles::line(Tone::Dim, theme),
            ),
        ]))
        .wrap(Wrap { trim: true });
        frame.render_widget(header, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(layout[1]);

        // Transcript window
        let visible_h = body[0].height.saturating_sub(2) as usize;
        let content_width = body[0].width.saturating_sub(2) as usize;
        let wrapped = wrap_transcript(snap.lines, content_width, theme);
        let total = wrapped.len();
        let start = total.saturating_sub(visible_h + snap.scroll);
        let end = total.saturating_sub(snap.scroll);

        let items: Vec<ListItem> = wrapped[start..end]
            .iter()
            .map(|(text, style)| ListItem::new(Line::from(Span::styled(text.clone(), *style))))
            .collect();
        let transcript = List::new(items)
            .style(styles::background(theme))
            .block(Block::default().borders(Borders::ALL).title(" Chat "));
        frame.render_widget(transcript, body[0]);

        draw_map(frame, body[1], snap.map, theme);

        // Input box
        let input_box = Paragraph::new(snap.input.clone())
            .style(styles::background(theme))
            .block(Block::default().borders(Borders::ALL).title(" Where to? "));
        frame.render_widget(Clear, layout[2]);
        frame.render_widget(input_box, layout[2]);

        let caret_x = layout[2].x + 1 + visual_caret_col(&snap.input, snap.input_cursor);
        let caret_y = layout[2].y + 1;
        frame.set_cursor_position(Position {
            x: caret_x,
            y: caret_y,
        });

        // Status bar
        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(snap.spinner, styles::busy(theme)),
            Span::raw(" "),
            if snap.busy {
                Span::styled(format!("{}…", snap.status), styles::busy(theme))
            } else {
                Span::styled(snap.status.clone(), styles::idle(theme))
            },
            Span::styled(
                if snap.reevaluate {
                    " • /reeval available"
                } else {
                    ""
                },
                styles::line(Tone::Dim, theme),
            ),
        ]);
        let status = Paragraph::new(status_line)
            .style(styles::background(theme))
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[3]);
    })?;

    Ok(())
}

fn draw_map(frame: &mut ratatui::Frame<'_>, area: ratatui::layout::Rect, map: &MapCanvas, theme: Theme) {
    let legend_h = (map.markers().len() as u16 + 3).min(area.height / 2);
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(legend_h)])
        .split(area);

    let view = map.viewport();
    let markers: Vec<(f64, f64)> = map
        .markers()
        .iter()
        .map(|m| (m.position.lng, m.position.lat))
        .collect();
    let user: Vec<(f64, f64)> = map.user().map(|u| (u.lng, u.lat)).into_iter().collect();

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(" Map "))
        .background_color(styles::background(theme).bg.unwrap_or_default())
        .marker(Marker::Braille)
        .x_bounds(view.x)
        .y_bounds(view.y)
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::High,
                color: styles::map_outline(theme),
            });
            ctx.layer();
            ctx.draw(&Points {
                coords: &markers,
                color: styles::map_marker(theme),
            });
            ctx.draw(&Points {
                coords: &user,
                color: styles::map_user(theme),
            });
            for (idx, (x, y)) in markers.iter().enumerate() {
                ctx.print(
                    *x,
                    *y,
                    Span::styled(format!("{}", idx + 1), styles::line(Tone::Error, theme)),
                );
            }
            if let Some((x, y)) = user.first() {
                ctx.print(*x, *y, Span::styled("@", styles::title(theme)));
            }
        });
    frame.render_widget(canvas, split[0]);

    let mut legend: Vec<Line> = map
        .markers()
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            Line::from(vec![
                Span::styled(format!("{:>2} ", idx + 1), styles::line(Tone::Label, theme)),
                Span::styled(m.popup.clone(), styles::line(Tone::Value, theme)),
            ])
        })
        .collect();
    if !map.is_initialized() {
        legend.push(Line::from(Span::styled(
            "map appears after your first request",
            styles::line(Tone::Dim, theme),
        )));
    }
    let legend = Paragraph::new(legend)
        .style(styles::background(theme))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", map.attribution())),
        );
    frame.render_widget(legend, split[1]);
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}

fn wrap_transcript(
    lines: &[TranscriptLine],
    width: usize,
    theme: Theme,
) -> Vec<(String, ratatui::style::Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for entry in lines {
        let style = styles::line(entry.tone, theme);
        if entry.text.is_empty() {
            out.push((String::new(), style));
            continue;
        }

        for raw_line in entry.text.split('\n') {
            if raw_line.is_empty() {
                out.push((String::new(), style));
                continue;
            }

            let segments = wrap(raw_line, effective_width);
            if segments.is_empty() {
                out.push((String::new(), style));
            } else {
                out.extend(segments.into_iter().map(|seg| (seg.into_owned(), style)));
            }
        }
    }

    out
}
