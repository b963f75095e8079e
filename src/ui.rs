pub mod keypad;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::app::{App, AppState, FormField};
use crate::clock::Clock;
use crate::grid::Pos;
use crate::leaderboard::ranking;
use crate::submission::Category;
use crate::util::format_time;

const HORIZONTAL_MARGIN: u16 = 2;
const CELL_WIDTH: usize = 4;
const KEYPAD_HEIGHT: u16 = keypad::BUTTON_HEIGHT * 4 + 2;
const LEADERBOARD_ROWS: usize = 10;

/// Screen regions. Pure, so mouse hit testing sees the same layout as
/// rendering does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub banner: Rect,
    pub board: Rect,
    pub keypad: Option<Rect>,
    pub footer: Rect,
}

pub fn areas(area: Rect, show_keypad: bool) -> Areas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let body = rows[2];
    let fits = body.width >= keypad::WIDTH * 2 && body.height >= KEYPAD_HEIGHT;
    let (board, keypad) = if show_keypad && fits {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(keypad::WIDTH)])
            .split(body);
        let pad = Rect::new(cols[1].x, cols[1].y, keypad::WIDTH, KEYPAD_HEIGHT);
        (cols[0], Some(pad))
    } else {
        (body, None)
    };

    Areas {
        header: rows[0],
        banner: rows[1],
        board,
        keypad,
        footer: rows[3],
    }
}

/// Right-align `s` in `width` terminal columns
fn pad_left(s: &str, width: usize) -> String {
    let w = s.width();
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", " ".repeat(width - w), s)
    }
}

fn centered(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl<C: Clock + Clone> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.state == AppState::Leaderboard {
            render_leaderboard(self, area, buf);
            return;
        }

        let areas = areas(area, self.show_keypad);
        render_header(self, areas.header, buf);
        render_banner(self, areas.banner, buf);
        render_board(self, areas.board, buf);
        if areas.keypad.is_some() {
            keypad::render(area, buf);
        }
        render_footer(self, areas.footer, buf);

        match &self.state {
            AppState::Rejected(verdict) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        "This run can't be counted.",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                ];
                lines.extend(
                    verdict
                        .reasons
                        .iter()
                        .map(|r| Line::from(format!("  • {r}"))),
                );
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Type your answers yourself. (enter) play again",
                    Style::default().add_modifier(Modifier::ITALIC),
                )));
                popup(" irregular run ", lines, 52, 9, area, buf);
            }
            AppState::Form => render_form(self, area, buf),
            AppState::Submitted => {
                let time = self.last_submission.clone().unwrap_or_default();
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!("Submitted {time} on {}", self.game.preset().label()),
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                ];
                if let Some(best) = self.personal_best {
                    lines.push(Line::from(format!("Personal best: {}", format_time(best))));
                }
                popup(" thanks! ", lines, 44, 6, area, buf);
            }
            _ => {}
        }

        if self.game.celebration.is_active {
            render_celebration_particles(&self.game.celebration, area, buf);
        }
    }
}

fn render_header<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(28)])
        .split(area);
    let title = Paragraph::new(Line::from(vec![
        Span::styled("COUNT ME IN", bold.fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(app.game.preset().label(), bold),
        Span::styled(
            format!(
                "  {}/{}",
                app.game.grid.correct_count(),
                app.game.preset().total_cells()
            ),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]));
    title.render(halves[0], buf);

    let mut right = vec![Span::styled(app.game.display_time(), bold)];
    if let Some(best) = app.personal_best {
        right.push(Span::styled(
            format!("  best {}", format_time(best)),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    Paragraph::new(Line::from(right))
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

fn render_banner<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let top = app.top_players();
    let spans = if top.is_empty() {
        vec![Span::styled(
            "no leaderboard loaded",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )]
    } else {
        Category::ALL
            .into_iter()
            .flat_map(|cat| {
                let holder = top
                    .get(&cat)
                    .map(|e| format!("{} {}", e.name, e.time))
                    .unwrap_or_else(|| "-".to_string());
                [
                    Span::styled(
                        format!("{}: ", cat.short_label()),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::raw(format!("{holder}   ")),
                ]
            })
            .collect()
    };

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" fastest this grid "),
        )
        .render(area, buf);
}

fn render_board<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let grid = &app.game.grid;
    let dim = Style::default().add_modifier(Modifier::DIM);
    let axis = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::with_capacity(grid.rows() + 1);
    let mut header = vec![Span::styled(pad_left("×", CELL_WIDTH), axis)];
    header.extend((1..=grid.cols()).map(|c| Span::styled(pad_left(&c.to_string(), CELL_WIDTH), axis)));
    lines.push(Line::from(header));

    for (r, row) in grid.rows_iter().enumerate() {
        let mut spans = vec![Span::styled(pad_left(&(r + 1).to_string(), CELL_WIDTH), axis)];
        for (c, cell) in row.iter().enumerate() {
            let mut style = match cell.correct {
                Some(true) => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                Some(false) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                None => dim,
            };
            let text = if cell.value.is_empty() { "·" } else { cell.value.as_str() };
            if grid.cursor == Pos::new(r, c) && !app.game.has_finished() {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::raw(" "));
            spans.push(Span::styled(pad_left(text, CELL_WIDTH - 1), style));
        }
        lines.push(Line::from(spans));
    }

    let width = ((grid.cols() + 1) * CELL_WIDTH) as u16;
    let height = (grid.rows() + 1) as u16;
    let target = centered(width, height, area);
    Paragraph::new(lines).render(target, buf);
}

fn render_footer<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let legend = match app.state {
        AppState::Playing if app.game.has_started() => {
            "(enter/tab) next / (arrows) move / (ctrl+r) restart / (esc) quit".to_string()
        }
        AppState::Playing => {
            "(F2) grid size / (F3) leaderboard / (esc) quit".to_string()
        }
        AppState::Form => "(tab) next field / (enter) submit / (esc) discard".to_string(),
        AppState::Submitted => {
            if app.config.leaderboard_url.is_some() && Browser::is_available() {
                "(n)ew / (b)oard / (l)eaderboard web / (esc)ape".to_string()
            } else {
                "(n)ew / (b)oard / (esc)ape".to_string()
            }
        }
        AppState::Rejected(_) => "(enter) play again / (esc)ape".to_string(),
        AppState::Leaderboard => "(b)ack".to_string(),
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(area, buf);
}

fn render_form<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let form = &app.form;
    let field = |label: &str, value: &str, which: FormField| {
        let focused = form.focus == which;
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{label:>10}: "), Style::default().fg(Color::Yellow)),
            Span::styled(format!("{value}{}", if focused { "▏" } else { "" }), style),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "{} in {}",
                app.game.preset().label(),
                app.game.display_time()
            ),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Name", &form.form.name, FormField::Name),
        field("School", &form.form.school, FormField::School),
        field("Email", &form.form.email, FormField::Email),
        field(
            "Category",
            &format!("‹ {} ›", form.form.category.form_label()),
            FormField::Category,
        ),
    ];
    if let Some(err) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    popup(" submit your time ", lines, 56, 11, area, buf);
}

fn render_leaderboard<C: Clock + Clone>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Length(2), Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    Paragraph::new(Span::styled(
        format!("Leaderboard {}", app.game.preset().label()),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(rows[0], buf);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[1]);

    for (cat, col) in Category::ALL.into_iter().zip(cols.iter()) {
        let entries = ranking(&app.leaderboard, app.game.preset(), cat);
        let lines: Vec<Line> = if entries.is_empty() {
            vec![Line::from(Span::styled(
                "no times yet",
                Style::default().add_modifier(Modifier::DIM),
            ))]
        } else {
            entries
                .iter()
                .take(LEADERBOARD_ROWS)
                .enumerate()
                .map(|(i, e)| Line::from(format!("{:>2}. {}  {}", i + 1, e.time, e.name)))
                .collect()
        };
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", cat.short_label())),
            )
            .render(*col, buf);
    }

    render_footer(app, rows[2], buf);
}

fn popup(title: &str, lines: Vec<Line>, width: u16, height: u16, area: Rect, buf: &mut Buffer) {
    let target = centered(width, height, area);
    Clear.render(target, buf);
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .render(target, buf);
}

/// Draw confetti on top of everything else
fn render_celebration_particles(
    celebration: &crate::celebration::Celebration,
    area: Rect,
    buf: &mut Buffer,
) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[particle.color_index % colors.len()];
        let alpha = 1.0 - (particle.age / particle.max_age);
        let style = if particle.is_letter || alpha > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if alpha > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anticheat::{IrregularReason, Verdict};
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::grid::GridPreset;
    use crate::leaderboard::Entry;
    use crate::submission::MemorySink;

    fn app(grid: GridPreset, leaderboard: Vec<Entry>) -> App<ManualClock> {
        App::with_clock(
            Config {
                grid,
                ..Config::default()
            },
            Box::new(MemorySink::default()),
            None,
            leaderboard,
            ManualClock::default(),
        )
    }

    fn rendered(app: &App<ManualClock>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn entry(name: &str, time: &str, cat: Category) -> Entry {
        Entry {
            name: name.into(),
            time: time.into(),
            ms: crate::util::parse_time(time).unwrap(),
            timestamp: None,
            grid: GridPreset::TwelveByTwelve,
            category: cat,
            row: 1,
        }
    }

    #[test]
    fn playing_screen_shows_title_and_grid_label() {
        let out = rendered(&app(GridPreset::TwelveByTwelve, vec![]), 100, 30);
        assert!(out.contains("COUNT ME IN"));
        assert!(out.contains("12×12"));
        assert!(out.contains("no leaderboard loaded"));
    }

    #[test]
    fn banner_shows_top_player() {
        let board = vec![
            entry("Ada", "01:12.40", Category::Primary),
            entry("Grace", "00:58.10", Category::Primary),
        ];
        let out = rendered(&app(GridPreset::TwelveByTwelve, board), 120, 30);
        assert!(out.contains("Grace 00:58.10"));
        assert!(!out.contains("Ada 01:12.40"));
    }

    #[test]
    fn rejection_popup_lists_reasons() {
        let mut app = app(GridPreset::FiveByFive, vec![]);
        app.state = AppState::Rejected(Verdict {
            suspicious: true,
            reasons: vec![IrregularReason::TooFast],
        });
        let out = rendered(&app, 100, 30);
        assert!(out.contains("irregular run"));
        assert!(out.contains("completed too fast"));
    }

    #[test]
    fn leaderboard_screen_lists_categories() {
        let board = vec![entry("Ada", "01:12.40", Category::Secondary)];
        let mut app = app(GridPreset::TwelveByTwelve, board);
        app.state = AppState::Leaderboard;
        let out = rendered(&app, 120, 30);
        assert!(out.contains("Ada"));
        assert!(out.contains("no times yet"));
    }

    #[test]
    fn renders_on_tiny_and_huge_areas() {
        let app = app(GridPreset::FifteenByFifteen, vec![]);
        rendered(&app, 10, 5);
        rendered(&app, 250, 80);
    }

    #[test]
    fn celebration_draws_particles() {
        let mut app = app(GridPreset::FiveByFive, vec![]);
        app.game.start_celebration(80, 24);
        assert!(!app.game.celebration.particles.is_empty());
        rendered(&app, 80, 24);
    }

    #[test]
    fn keypad_hidden_when_disabled() {
        let screen = Rect::new(0, 0, 100, 40);
        assert!(areas(screen, true).keypad.is_some());
        assert!(areas(screen, false).keypad.is_none());
    }

    #[test]
    fn pad_left_uses_display_width() {
        assert_eq!(pad_left("×", 4), "   ×");
        assert_eq!(pad_left("144", 3), "144");
    }
}
