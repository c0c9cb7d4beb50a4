//! Widgets shared by every section: the editable grid and the dialogs.

use std::cmp;

use academy_core::grid::{CellPosition, CellStyle, GridCells, GridNavigator};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    editor::CellEditor,
    grids::GridSource,
    modal::{Modal, Prompt},
};

const MIN_CELL_WIDTH: u16 = 6;
const MAX_CELL_WIDTH: u16 = 24;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_fg: Color,
    pub accent: Color,
    pub accent_alt: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            on_accent: Color::Black,
        }
    }
}

/// First visible row and column of a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridScroll {
    pub row: usize,
    pub col: usize,
}

/// Everything needed to paint one grid.
pub struct GridFrame<'a> {
    pub title: String,
    pub source: &'a GridSource<'a>,
    pub navigator: &'a GridNavigator,
    pub editor: Option<&'a CellEditor>,
    pub active: bool,
}

fn display_width(text: &str) -> u16 {
    cmp::min(Span::raw(text).width(), u16::MAX as usize) as u16
}

fn column_widths(source: &GridSource<'_>, labels: &[String]) -> Vec<u16> {
    let (rows, cols) = source.dimensions();
    (0..cols)
        .map(|col| {
            let header = labels.get(col).map(|label| display_width(label)).unwrap_or(0);
            let body = (0..rows)
                .map(|row| display_width(source.text(row, col)))
                .max()
                .unwrap_or(0);
            (cmp::max(header, body) + 2).clamp(MIN_CELL_WIDTH, MAX_CELL_WIDTH)
        })
        .collect()
}

/// Adjust `scroll` so the focused cell is on screen.
fn follow_focus(
    scroll: &mut GridScroll,
    focus: Option<CellPosition>,
    widths: &[u16],
    body_height: usize,
    body_width: u16,
) {
    let Some(focus) = focus.filter(|focus| focus.col < widths.len()) else {
        return;
    };
    if focus.row < scroll.row {
        scroll.row = focus.row;
    } else if focus.row >= scroll.row + body_height {
        scroll.row = focus.row + 1 - body_height;
    }
    if focus.col < scroll.col {
        scroll.col = focus.col;
    }
    while scroll.col < focus.col {
        let span: u16 = widths[scroll.col..=focus.col].iter().sum();
        if span <= body_width {
            break;
        }
        scroll.col += 1;
    }
}

fn cell_style(state: CellStyle, merged: bool, name_row: bool, theme: &Theme) -> Style {
    let mut style = Style::default().fg(theme.primary_fg);
    if merged {
        style = style.fg(theme.accent_alt);
    }
    if name_row {
        style = style.fg(theme.accent).add_modifier(Modifier::BOLD);
    }
    if state.selected {
        style = style.bg(theme.selection_bg).fg(theme.selection_fg);
    }
    if state.focused {
        style = style
            .fg(theme.on_accent)
            .bg(theme.accent)
            .add_modifier(Modifier::BOLD);
    }
    if state.editing {
        style = style.fg(theme.on_accent).bg(theme.warning);
    }
    style
}

/// Paint a grid with its row and column headers. Returns the screen area of
/// every painted cell; a merge group is one area addressed by its primary
/// row.
pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    grid: GridFrame<'_>,
    scroll: &mut GridScroll,
    theme: &Theme,
) -> Vec<(Rect, CellPosition)> {
    let border = if grid.active { theme.accent } else { theme.muted };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(grid.title)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let source = grid.source;
    let (rows, cols) = source.dimensions();
    if rows == 0 || cols == 0 {
        let hint = if cols == 0 { "(no columns)" } else { "(no rows)" };
        let paragraph = Paragraph::new(hint).style(Style::default().fg(theme.muted));
        frame.render_widget(paragraph, inner);
        return Vec::new();
    }
    if inner.height < 2 || inner.width < MIN_CELL_WIDTH {
        return Vec::new();
    }

    let column_labels = source.column_labels();
    let row_labels = source.row_labels();
    let label_width = row_labels
        .iter()
        .map(|label| display_width(label))
        .max()
        .unwrap_or(0)
        .max(2)
        + 1;
    let widths = column_widths(source, &column_labels);
    let body_height = (inner.height - 1) as usize;
    let body_width = inner.width.saturating_sub(label_width);

    follow_focus(scroll, grid.navigator.focused(), &widths, body_height, body_width);
    scroll.row = scroll.row.min(rows - 1);
    scroll.col = scroll.col.min(cols - 1);

    // Columns that fit, with their x offsets.
    let mut columns = Vec::new();
    let mut x = inner.x + label_width;
    for (col, width) in widths.iter().enumerate().skip(scroll.col) {
        if x >= inner.right() {
            break;
        }
        let width = cmp::min(*width, inner.right() - x);
        columns.push((col, x, width));
        x += width;
    }

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    for (col, x, width) in &columns {
        let label = column_labels.get(*col).map(String::as_str).unwrap_or("");
        let rect = Rect::new(*x, inner.y, width.saturating_sub(1).max(1), 1);
        frame.render_widget(Paragraph::new(label).style(header_style), rect);
    }

    let last_row = cmp::min(rows, scroll.row + body_height) - 1;
    let mut hits = Vec::new();
    for row in scroll.row..=last_row {
        let y = inner.y + 1 + (row - scroll.row) as u16;
        let label = row_labels.get(row).map(String::as_str).unwrap_or("");
        frame.render_widget(
            Paragraph::new(label).style(Style::default().fg(theme.muted)),
            Rect::new(inner.x, y, label_width.saturating_sub(1).max(1), 1),
        );

        for (col, x, width) in &columns {
            let merge = source.merge_info(row, *col);
            let (top, span) = match merge {
                // Drawn together with the primary row, unless it scrolled off.
                Some(info) if !info.is_main && row != scroll.row => continue,
                Some(info) => (info.main_row, info.last_row() + 1 - row),
                None => (row, 1),
            };
            let height = cmp::min(span, last_row + 1 - row) as u16;
            let rect = Rect::new(*x, y, width.saturating_sub(1).max(1), height);
            let position = CellPosition::new(top, *col);
            let editor = grid.editor.filter(|editor| editor.position == position);
            let text = match editor {
                Some(editor) => editor.input.text(),
                None => source.text(top, *col),
            };
            let style = cell_style(
                grid.navigator.cell_style(top, *col),
                merge.is_some(),
                source.skip_row(top),
                theme,
            );
            frame.render_widget(
                Paragraph::new(text)
                    .style(style)
                    .wrap(Wrap { trim: false }),
                rect,
            );
            if let Some(editor) = editor {
                let offset = display_width(editor.input.before_cursor());
                let cursor_x = cmp::min(rect.x + offset, rect.right().saturating_sub(1));
                frame.set_cursor(cursor_x, rect.y);
            }
            hits.push((rect, position));
        }
    }
    hits
}

/// Centered box clamped to the frame.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = cmp::max(cmp::min(width, area.width.saturating_sub(4)), 24_u16.min(area.width));
    let height = cmp::min(height, area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn key_hint<'a>(key: &'a str, action: &'a str) -> Vec<Span<'a>> {
    vec![
        Span::styled(key, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(action),
    ]
}

pub fn render_modal(frame: &mut Frame, modal: &Modal, theme: &Theme) {
    match modal {
        Modal::Prompt(prompt) => render_prompt(frame, prompt, theme),
        Modal::Confirm { message, .. } => {
            let area = centered_rect(60, 6, frame.size());
            frame.render_widget(Clear, area);
            let mut helper = key_hint("y", " confirm  ");
            helper.extend(key_hint("n", " cancel"));
            let paragraph = Paragraph::new(vec![
                Line::from(message.as_str()),
                Line::from(""),
                Line::from(helper),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Confirm")
                    .border_style(Style::default().fg(theme.warning)),
            )
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        Modal::Alert { title, message } => {
            let lines = message.lines().count() as u16;
            let area = centered_rect(60, lines + 5, frame.size());
            frame.render_widget(Clear, area);
            let mut content: Vec<Line> = message.lines().map(Line::from).collect();
            content.push(Line::from(""));
            content.push(Line::from(key_hint("Enter", " dismiss")));
            let paragraph = Paragraph::new(content)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title.as_str())
                        .border_style(Style::default().fg(theme.danger)),
                )
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
    }
}

fn render_prompt(frame: &mut Frame, prompt: &Prompt, theme: &Theme) {
    let area = centered_rect(60, 7, frame.size());
    frame.render_widget(Clear, area);

    let input_line = Line::from(vec![
        Span::styled("> ", Style::default().fg(theme.accent)),
        Span::raw(prompt.input.text()),
    ]);
    let mut helper = key_hint("Enter", " ok  ");
    helper.extend(key_hint("Esc", " cancel"));
    let paragraph = Paragraph::new(vec![
        Line::from(prompt.label.as_str()),
        input_line,
        Line::from(""),
        Line::from(helper),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(prompt.title.as_str()),
    );
    frame.render_widget(paragraph, area);

    let cursor_x = (area.x + 3 + display_width(prompt.input.before_cursor()))
        .min(area.x + area.width.saturating_sub(2));
    frame.set_cursor(cursor_x, area.y + 2);
}
