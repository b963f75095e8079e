use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::game::VirtualKey;

pub const BUTTON_WIDTH: u16 = 6;
pub const BUTTON_HEIGHT: u16 = 3;
/// Room for three buttons plus the surrounding frame
pub const WIDTH: u16 = BUTTON_WIDTH * 3 + 2;

const LAYOUT: [[VirtualKey; 3]; 4] = [
    [VirtualKey::Digit('7'), VirtualKey::Digit('8'), VirtualKey::Digit('9')],
    [VirtualKey::Digit('4'), VirtualKey::Digit('5'), VirtualKey::Digit('6')],
    [VirtualKey::Digit('1'), VirtualKey::Digit('2'), VirtualKey::Digit('3')],
    [VirtualKey::Backspace, VirtualKey::Digit('0'), VirtualKey::Enter],
];

fn label(key: VirtualKey) -> String {
    match key {
        VirtualKey::Digit(d) => d.to_string(),
        VirtualKey::Backspace => "⌫".to_string(),
        VirtualKey::Enter => "⏎".to_string(),
    }
}

/// Button rectangles for a terminal of size `screen`. Buttons that do not
/// fit are left out.
pub fn buttons(screen: Rect) -> Vec<(Rect, VirtualKey)> {
    let Some(pad) = super::areas(screen, true).keypad else {
        return Vec::new();
    };
    let inner = Rect::new(
        pad.x + 1,
        pad.y + 1,
        pad.width.saturating_sub(2),
        pad.height.saturating_sub(2),
    );

    let mut out = Vec::new();
    for (r, row) in LAYOUT.iter().enumerate() {
        for (c, key) in row.iter().enumerate() {
            let rect = Rect::new(
                inner.x + c as u16 * BUTTON_WIDTH,
                inner.y + r as u16 * BUTTON_HEIGHT,
                BUTTON_WIDTH,
                BUTTON_HEIGHT,
            );
            if rect.right() <= inner.right() && rect.bottom() <= inner.bottom() {
                out.push((rect, *key));
            }
        }
    }
    out
}

/// Keypad key under a terminal cell, if any
pub fn hit(screen: Rect, column: u16, row: u16) -> Option<VirtualKey> {
    buttons(screen)
        .into_iter()
        .find(|(rect, _)| {
            column >= rect.x && column < rect.right() && row >= rect.y && row < rect.bottom()
        })
        .map(|(_, key)| key)
}

pub fn render(screen: Rect, buf: &mut Buffer) {
    let Some(pad) = super::areas(screen, true).keypad else {
        return;
    };
    Block::default()
        .borders(Borders::ALL)
        .title(" keypad ")
        .render(pad, buf);

    let style = Style::default().add_modifier(Modifier::BOLD);
    for (rect, key) in buttons(screen) {
        Paragraph::new(label(key))
            .style(style)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .render(rect, buf);
    }
}
