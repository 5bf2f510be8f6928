use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::domain::{BREADCRUMB, CMDMode, TABS};
use crate::model::{Model, PopupView, UIData};
use crate::record::{Person, PriorityKind, Record, StatusKind};

pub const TOOLBAR_HEIGHT: usize = 1;
pub const TITLE_HEIGHT: usize = 1;
pub const TABS_HEIGHT: usize = 1;
pub const TABLE_BORDER_HEIGHT: usize = 2;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const TRAILING_ROW_HEIGHT: usize = 1;
pub const CMDLINE_HEIGH: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
const COLUMN_SPACING: u16 = 1;
const NEW_JOB_PLACEHOLDER: &str = "Add new job request...";
const SEARCH_PLACEHOLDER: &str = "Search jobs...";

pub fn draw(frame: &mut Frame, model: &Model) {
    let uidata = model.get_uidata();
    let [toolbar, title, tabs, table, cmdline] = Layout::vertical([
        Constraint::Length(TOOLBAR_HEIGHT as u16),
        Constraint::Length(TITLE_HEIGHT as u16),
        Constraint::Length(TABS_HEIGHT as u16),
        Constraint::Min(0),
        Constraint::Length(CMDLINE_HEIGH as u16),
    ])
    .areas(frame.area());

    render_toolbar(frame, toolbar);
    render_title(frame, title, uidata);
    render_tabs(frame, tabs, uidata);
    render_table(frame, table, uidata);
    render_cmdline(frame, cmdline, uidata);

    if let Some(popup) = &uidata.popup {
        render_popup(frame, popup);
    }
}

fn render_toolbar(frame: &mut Frame, area: Rect) {
    let breadcrumb = Line::from(BREADCRUMB).dark_gray();
    let actions = Line::from(vec![
        "[i]".yellow(),
        "mport ".into(),
        "[e]".yellow(),
        "xport ".into(),
        "[x]".yellow(),
        " share ".into(),
        "[n]".green().bold(),
        "ew action ".into(),
        "[?]".yellow(),
        "help".into(),
    ])
    .right_aligned();
    frame.render_widget(Paragraph::new(breadcrumb), area);
    frame.render_widget(Paragraph::new(actions), area);
}

fn render_title(frame: &mut Frame, area: Rect, uidata: &UIData) {
    let title = Line::from(format!(" {} ", uidata.name)).bold();
    let search = if uidata.query.is_empty() && uidata.cmd_mode != Some(CMDMode::Search) {
        Line::from(vec!["[/] ".yellow(), SEARCH_PLACEHOLDER.dark_gray()])
    } else {
        Line::from(vec![
            "[/] ".yellow(),
            Span::raw(uidata.query.clone()).underlined(),
            format!("  {} / {}", uidata.nrows, uidata.store_len).dark_gray(),
        ])
    }
    .right_aligned();
    frame.render_widget(Paragraph::new(title), area);
    frame.render_widget(Paragraph::new(search), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, uidata: &UIData) {
    let tabs = Tabs::new(TABS)
        .select(uidata.active_tab)
        .style(Style::new().dark_gray())
        .highlight_style(
            Style::new()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(" ");
    frame.render_widget(tabs, area);
}

fn status_style(status: &str) -> Style {
    match StatusKind::classify(status) {
        StatusKind::InProcess => Style::new().fg(Color::Black).bg(Color::Yellow),
        StatusKind::NeedToStart => Style::new().fg(Color::Black).bg(Color::Gray),
        StatusKind::Complete => Style::new().fg(Color::Black).bg(Color::Green),
        StatusKind::Blocked => Style::new().fg(Color::White).bg(Color::Red),
        StatusKind::Other => Style::new(),
    }
}

fn priority_style(priority: &str) -> Style {
    let style = Style::new().add_modifier(Modifier::BOLD);
    match PriorityKind::classify(priority) {
        PriorityKind::High => style.fg(Color::Red),
        PriorityKind::Medium => style.fg(Color::LightRed),
        PriorityKind::Other => style.fg(Color::Blue),
    }
}

fn person_cell(person: &Person, avatar_style: Style) -> Cell<'static> {
    if person.avatar.is_empty() {
        return Cell::from(person.name.clone());
    }
    Cell::from(Line::from(vec![
        Span::styled(person.avatar.clone(), avatar_style),
        Span::raw(" "),
        Span::raw(person.name.clone()),
    ]))
}

fn record_cells(number: usize, record: &Record) -> Vec<Cell<'static>> {
    vec![
        Cell::from(number.to_string()).dark_gray(),
        Cell::from(record.job.clone()),
        Cell::from(record.date.clone()),
        Cell::from(Span::styled(
            record.status.clone(),
            status_style(&record.status),
        )),
        person_cell(
            &record.submitter,
            Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Cell::from(record.url.clone()).blue().underlined(),
        person_cell(
            &record.assigned,
            Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Cell::from(Span::styled(
            record.priority.clone(),
            priority_style(&record.priority),
        )),
        Cell::from(record.due.clone()),
        Cell::from(record.value.clone()),
    ]
}

fn index_width(uidata: &UIData) -> u16 {
    ((uidata.store_len + 1).to_string().len() + COLUMN_WIDTH_MARGIN) as u16
}

fn render_table(frame: &mut Frame, area: Rect, uidata: &UIData) {
    let header = Row::new(
        std::iter::once(Cell::from("#"))
            .chain(uidata.headers.iter().map(|h| Cell::from(h.clone()))),
    )
    .style(Style::new().bold().bg(Color::DarkGray));

    let editing_new_job = uidata.cmd_mode == Some(CMDMode::NewJob);
    let trailing = Row::new(vec![
        Cell::from((uidata.store_len + 1).to_string()).dark_gray(),
    ]);

    let rows: Vec<Row> = uidata
        .rows
        .iter()
        .map(|r| Row::new(record_cells(r.number, &r.record)))
        .chain(std::iter::once(trailing))
        .collect();

    let widths: Vec<Constraint> = std::iter::once(index_width(uidata))
        .chain(uidata.column_widths.iter().map(|&w| w as u16))
        .map(Constraint::Length)
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .block(Block::new().borders(Borders::TOP | Borders::BOTTOM))
        .row_highlight_style(Style::new().bg(Color::Rgb(40, 40, 60)))
        .cell_highlight_style(Style::new().reversed());

    let mut state = TableState::default();
    if !uidata.rows.is_empty() && !editing_new_job {
        state.select(Some(uidata.selected_row));
        state.select_column(Some(uidata.selected_column + 1));
    }
    frame.render_stateful_widget(table, area, &mut state);
    render_trailing_input(frame, area, uidata, editing_new_job);
}

fn cursor_x(x: u16, offset: usize) -> u16 {
    x.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
}

/// The trailing row spans every data column, so its text is drawn over the table.
fn render_trailing_input(frame: &mut Frame, area: Rect, uidata: &UIData, editing: bool) {
    // Border, header and the rendered rows sit above the trailing row
    let y = cursor_x(area.y, 1 + TABLE_HEADER_HEIGHT + uidata.rows.len());
    let x = cursor_x(area.x, usize::from(index_width(uidata) + COLUMN_SPACING));
    if y >= area.bottom().saturating_sub(1) || x >= area.right() {
        return;
    }
    let width = area.right() - x;
    let line_area = Rect::new(x, y, width, 1);

    if !editing {
        let placeholder = Span::raw(NEW_JOB_PLACEHOLDER).dark_gray().italic();
        frame.render_widget(Paragraph::new(placeholder), line_area);
        return;
    }

    // Long input scrolls left so the cursor stays on screen
    let cursor = uidata.cmdinput.curser_pos;
    let skip = cursor.saturating_sub(usize::from(width) - 1);
    let shown: String = uidata.cmdinput.input.chars().skip(skip).collect();
    frame.render_widget(Paragraph::new(shown), line_area);
    frame.set_cursor_position((cursor_x(x, cursor - skip), y));
}

fn render_cmdline(frame: &mut Frame, area: Rect, uidata: &UIData) {
    if uidata.active_cmdinput {
        let (prompt, shown) = match uidata.cmd_mode {
            Some(CMDMode::Search) => ("/", uidata.cmdinput.input.as_str()),
            Some(CMDMode::ImportPath) => ("Import JSON file: ", uidata.cmdinput.input.as_str()),
            Some(CMDMode::NewJob) => ("New job request (Enter adds, Esc cancels)", ""),
            None => ("", ""),
        };
        let line = Line::from(vec![prompt.yellow(), Span::raw(shown.to_string())]);
        frame.render_widget(Paragraph::new(line), area);
        if uidata.cmd_mode != Some(CMDMode::NewJob) {
            let x = cursor_x(area.x, prompt.chars().count() + uidata.cmdinput.curser_pos);
            if x < area.right() {
                frame.set_cursor_position((x, area.y));
            }
        }
        return;
    }

    let status = Line::from(uidata.status_message.clone());
    let position = Line::from(format!(
        "{}/{} ",
        if uidata.nrows == 0 {
            0
        } else {
            uidata.abs_selected_row + 1
        },
        uidata.nrows
    ))
    .right_aligned()
    .dark_gray();
    frame.render_widget(Paragraph::new(status), area);
    frame.render_widget(Paragraph::new(position), area);
}

fn centered_popup(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_popup(frame: &mut Frame, popup: &PopupView) {
    let area = centered_popup(frame.area(), 60, 70);
    let block = Block::bordered()
        .title(Line::from(format!(" {} ", popup.title)).bold().centered())
        .title_bottom(Line::from(" Esc to close ").centered());

    let text: Vec<Line> = if popup.lines.is_empty() {
        popup.text.lines().map(|l| Line::from(l.to_string())).collect()
    } else {
        let label_width = popup
            .lines
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0);
        popup
            .lines
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    format!("{label:label_width$}  ").bold(),
                    Span::raw(value.clone()),
                ])
            })
            .collect()
    };

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, TVConfig};
    use crate::record::sample_data;
    use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};

    fn render(model: &Model, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, model)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn renders_the_sheet() {
        let model = Model::init(&TVConfig::default(), sample_data(), 200, 20);
        let screen = render(&model, 200, 20);
        assert!(screen.contains("Q3 Financial Overview"));
        assert!(screen.contains("All Orders"));
        assert!(screen.contains("Job Request"));
        assert!(screen.contains("Prepare financial report for Q4"));
        assert!(screen.contains("J Jessica Brown"));
        assert!(screen.contains(NEW_JOB_PLACEHOLDER));
        assert!(screen.contains("1/5"));
    }

    #[test]
    fn renders_popups_and_empty_sheets() {
        let mut model = Model::init(&TVConfig::default(), Vec::new(), 100, 30);
        let screen = render(&model, 100, 30);
        assert!(screen.contains(NEW_JOB_PLACEHOLDER));
        assert!(screen.contains("0/0"));

        model.update(Some(Message::Help)).unwrap();
        let screen = render(&model, 100, 30);
        assert!(screen.contains("Help"));
        assert!(screen.contains("sort by the selected column"));
    }

    fn type_new_job(model: &mut Model, job: &str) {
        model.update(Some(Message::NewJob)).unwrap();
        for c in job.chars() {
            let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
            model.update(Some(Message::RawKey(key))).unwrap();
        }
    }

    #[test]
    fn trailing_row_spans_the_data_columns() {
        let job = "Organise the quarterly offsite for the whole finance team";
        let mut model = Model::init(&TVConfig::default(), sample_data(), 120, 20);
        type_new_job(&mut model, job);
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &model)).unwrap();
        let screen = render(&model, 120, 20);
        assert!(screen.contains(&format!("6  {job}")), "{screen}");

        // Cursor sits right behind the typed text on the trailing row
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.x, 3 + job.chars().count() as u16);
        assert_eq!(cursor.y, 3 + 1 + 1 + 5);
    }

    #[test]
    fn long_new_jobs_scroll_with_the_cursor() {
        let job = "x".repeat(40) + "the end of a long request";
        let mut model = Model::init(&TVConfig::default(), sample_data(), 40, 20);
        type_new_job(&mut model, &job);
        let screen = render(&model, 40, 20);
        assert!(screen.contains("the end of a long request"), "{screen}");
    }

    #[test]
    fn cursor_offsets_saturate() {
        assert_eq!(cursor_x(10, 5), 15);
        assert_eq!(cursor_x(10, usize::MAX), u16::MAX);
        assert_eq!(cursor_x(u16::MAX - 1, 70_000), u16::MAX);
    }
}
