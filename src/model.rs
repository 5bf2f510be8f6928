use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::domain::{CMDMode, HELP_TEXT, Message, SHEET_TITLE, TABS, TVConfig, TVError};
use crate::exchange;
use crate::inputter::{InputResult, Inputter};
use crate::record::{Column, Record};
use crate::table::{Direction, RecordStore, RowId, SortState};
use crate::ui::{
    CMDLINE_HEIGH, COLUMN_WIDTH_MARGIN, TABLE_BORDER_HEIGHT, TABLE_HEADER_HEIGHT, TITLE_HEIGHT,
    TOOLBAR_HEIGHT, TABS_HEIGHT, TRAILING_ROW_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    RECORD,
    POPUP,
    CMDINPUT,
}

/// One rendered row: its number in the view and the record behind it.
#[derive(Debug, Clone)]
pub struct RowView {
    pub number: usize,
    pub record: Record,
}

#[derive(Debug, Clone, Default)]
pub struct PopupView {
    pub title: String,
    pub lines: Vec<(String, String)>,
    pub text: String,
}

pub struct UIData {
    pub name: String,
    pub active_tab: usize,
    pub headers: Vec<String>,
    pub column_widths: Vec<usize>,
    pub rows: Vec<RowView>,
    pub nrows: usize, // Rows in the current view
    pub store_len: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub query: String,
    pub popup: Option<PopupView>,
    pub layout: UILayout,
    pub last_update: Instant,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            active_tab: 0,
            headers: Vec::new(),
            column_widths: Vec::new(),
            rows: Vec::new(),
            nrows: 0,
            store_len: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            query: String::new(),
            popup: None,
            layout: UILayout::default(),
            last_update: Instant::now(),
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let chrome = TOOLBAR_HEIGHT
            + TITLE_HEIGHT
            + TABS_HEIGHT
            + TABLE_BORDER_HEIGHT
            + TABLE_HEADER_HEIGHT
            + TRAILING_ROW_HEIGHT
            + CMDLINE_HEIGH;
        let table_height = std::cmp::max(ui_height.saturating_sub(chrome), 1);

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
            statusline_width: ui_width,
            statusline_height: CMDLINE_HEIGH,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    store: RecordStore,
    sort_state: SortState,
    query: String,
    view: Vec<usize>, // Store indices of the rows passing the search
    selected_row: usize,
    offset_row: usize,
    selected_column: usize,
    record_idx: usize, // View index shown in the record popup
    active_tab: usize,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    last_import: Option<String>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &TVConfig, records: Vec<Record>, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            store: RecordStore::new(records),
            sort_state: SortState::new(config.sort_mode),
            query: String::new(),
            view: Vec::new(),
            selected_row: 0,
            offset_row: 0,
            selected_column: 0,
            record_idx: 0,
            active_tab: 0,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            last_import: None,
            status_message: "Started jobsheet! Press ? for help.".to_string(),
            last_status_message_update: Instant::now(),
        };
        model.refresh_view();
        model
    }

    /// Replaces the sheet with the records of a JSON file.
    /// On failure the current rows stay untouched.
    pub fn load_data_file(&mut self, raw_path: &str) -> Result<usize, TVError> {
        let path = exchange::expand_path(raw_path)?;
        let start_time = Instant::now();
        let records = exchange::import_file(&path)?;
        let count = records.len();

        self.store.replace(records);
        self.selected_row = 0;
        self.offset_row = 0;
        self.last_import = Some(raw_path.trim().to_string());
        self.refresh_view();

        let duration = start_time.elapsed().as_millis();
        info!("Loading {} took {duration}ms ...", path.display());
        self.set_status_message(format!(
            "Imported {count} records from {} in {duration}ms",
            path.display()
        ));
        Ok(count)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Records currently shown, in display order.
    #[cfg(test)]
    pub fn visible_records(&self) -> Vec<&Record> {
        self.view
            .iter()
            .filter_map(|&idx| self.store.get(idx).map(|r| &r.record))
            .collect()
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
        self.uidata.last_update = Instant::now();
    }

    fn report(&mut self, action: &str, err: TVError) {
        error!("{action} failed: {err:?}");
        self.set_status_message(format!("{action} failed: {err}"));
    }

    // -------------------- View derivation ---------------------- //

    fn selected_id(&self) -> Option<RowId> {
        self.view
            .get(self.selected_row)
            .and_then(|&idx| self.store.get(idx))
            .map(|r| r.id)
    }

    /// Recomputes the filtered view and keeps the cursor inside it.
    fn refresh_view(&mut self) {
        let start_time = Instant::now();
        self.view = self.store.filter(&self.query);
        trace!(
            "View: {} of {} rows match \"{}\" ({}us)",
            self.view.len(),
            self.store.len(),
            self.query,
            start_time.elapsed().as_micros()
        );
        let row = std::cmp::min(self.selected_row, self.view.len().saturating_sub(1));
        self.select_row(row);
    }

    fn select_row(&mut self, row: usize) {
        let height = self.uilayout.table_height;
        self.selected_row = std::cmp::min(row, self.view.len().saturating_sub(1));
        if self.selected_row < self.offset_row {
            self.offset_row = self.selected_row;
        } else if self.selected_row >= self.offset_row + height {
            self.offset_row = self.selected_row + 1 - height;
        }
        // Shrinking views must not leave blank space above the rows.
        let max_offset = self.view.len().saturating_sub(height);
        self.offset_row = std::cmp::min(self.offset_row, max_offset);
        self.update_uidata_for_table();
    }

    fn display_text(record: &Record, column: Column) -> String {
        match column {
            Column::Submitter if !record.submitter.avatar.is_empty() => {
                format!("{} {}", record.submitter.avatar, record.submitter.name)
            }
            Column::Assigned if !record.assigned.avatar.is_empty() => {
                format!("{} {}", record.assigned.avatar, record.assigned.name)
            }
            _ => record.cell(column).to_string(),
        }
    }

    fn calculate_column_width(&self, column: Column) -> usize {
        let header_width = column.header().chars().count() + 2; // Room for the sort arrow
        let data_width = self
            .store
            .rows()
            .iter()
            .map(|r| Self::display_text(&r.record, column).chars().count())
            .max()
            .unwrap_or(0);
        let width = std::cmp::max(header_width, data_width) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, self.config.max_column_width)
    }

    fn headers(&self) -> Vec<String> {
        let last = self.sort_state.last();
        Column::ALL
            .iter()
            .map(|&c| match last {
                Some((sorted, Direction::Ascending)) if sorted == c => {
                    format!("{} ▲", c.header())
                }
                Some((sorted, Direction::Descending)) if sorted == c => {
                    format!("{} ▼", c.header())
                }
                _ => c.header().to_string(),
            })
            .collect()
    }

    fn update_uidata_for_table(&mut self) {
        let rbegin = self.offset_row;
        let rend = std::cmp::min(rbegin + self.uilayout.table_height, self.view.len());
        let rows = self.view[rbegin..rend]
            .iter()
            .enumerate()
            .filter_map(|(i, &idx)| {
                self.store.get(idx).map(|r| RowView {
                    number: rbegin + i + 1,
                    record: r.record.clone(),
                })
            })
            .collect();

        let popup = match self.modus {
            Modus::RECORD => self.record_popup(),
            Modus::POPUP => self.uidata.popup.clone(),
            Modus::TABLE | Modus::CMDINPUT => None,
        };

        self.uidata = UIData {
            name: SHEET_TITLE.to_string(),
            active_tab: self.active_tab,
            headers: self.headers(),
            column_widths: Column::ALL
                .iter()
                .map(|&c| self.calculate_column_width(c))
                .collect(),
            rows,
            nrows: self.view.len(),
            store_len: self.store.len(),
            selected_row: self.selected_row.saturating_sub(self.offset_row),
            selected_column: self.selected_column,
            abs_selected_row: self.selected_row,
            query: self.query.clone(),
            popup,
            layout: self.uilayout.clone(),
            last_update: Instant::now(),
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        }
    }

    fn record_popup(&self) -> Option<PopupView> {
        let row = self.view.get(self.record_idx).and_then(|&i| self.store.get(i))?;
        let record = &row.record;
        let mut lines: Vec<(String, String)> = Vec::new();
        for column in Column::ALL {
            lines.push((column.header().to_string(), record.cell(column).to_string()));
            match column {
                Column::Submitter => {
                    lines.push(("Submitter avatar".into(), record.submitter.avatar.clone()))
                }
                Column::Assigned => {
                    lines.push(("Assigned avatar".into(), record.assigned.avatar.clone()))
                }
                _ => {}
            }
        }
        Some(PopupView {
            title: format!("Record {}/{}", self.record_idx + 1, self.view.len()),
            lines,
            text: String::new(),
        })
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.select_row(self.selected_row);
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveDown => self.select_row(self.selected_row + 1),
                    Message::MoveUp => self.select_row(self.selected_row.saturating_sub(1)),
                    Message::MoveLeft => self.move_column(-1),
                    Message::MoveRight => self.move_column(1),
                    Message::MovePageUp => self.select_row(
                        self.selected_row.saturating_sub(self.uilayout.table_height),
                    ),
                    Message::MovePageDown => {
                        self.select_row(self.selected_row + self.uilayout.table_height)
                    }
                    Message::MoveBeginning => self.select_row(0),
                    Message::MoveEnd => self.select_row(self.view.len().saturating_sub(1)),
                    Message::NextTab => self.switch_tab(1),
                    Message::PrevTab => self.switch_tab(TABS.len() - 1),
                    Message::Sort => self.sort(Column::ALL[self.selected_column]),
                    Message::SortColumn(pos) => {
                        if let Some(column) = Column::from_position(pos) {
                            self.sort(column)
                        }
                    }
                    Message::SortJobs => self.sort(Column::Job),
                    Message::Search => self.enter_cmd_mode(CMDMode::Search),
                    Message::NewJob => self.enter_cmd_mode(CMDMode::NewJob),
                    Message::Import => self.enter_cmd_mode(CMDMode::ImportPath),
                    Message::NewRecord => self.add_record(),
                    Message::Export => self.export(),
                    Message::Share => self.share(),
                    Message::CopyCell => self.copy_table_cell(),
                    Message::CopyRow => self.copy_table_row(),
                    Message::Help => self.show_help(),
                    Message::Enter => self.enter(),
                    Message::Exit => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::RawKey(_) => (),
                },
                Modus::RECORD => match msg {
                    Message::Quit => self.quit(),
                    Message::MoveLeft | Message::MoveUp => self.previous_record(),
                    Message::MoveRight | Message::MoveDown => self.next_record(),
                    Message::CopyRow => self.copy_table_row(),
                    Message::Help => self.show_help(),
                    Message::Enter | Message::Exit => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Enter | Message::Exit => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::CMDINPUT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn move_column(&mut self, step: i32) {
        let last = Column::ALL.len() - 1;
        self.selected_column = if step < 0 {
            self.selected_column.saturating_sub(1)
        } else {
            std::cmp::min(self.selected_column + 1, last)
        };
        self.update_uidata_for_table();
    }

    fn switch_tab(&mut self, step: usize) {
        self.active_tab = (self.active_tab + step) % TABS.len();
        trace!("Switched to tab {}", TABS[self.active_tab]);
        self.update_uidata_for_table();
    }

    fn sort(&mut self, column: Column) {
        let selected = self.selected_id();
        let direction = self.store.sort(column, &mut self.sort_state);
        self.view = self.store.filter(&self.query);
        // Keep the cursor on the same row.
        let row = selected
            .and_then(|id| self.store.position(id))
            .and_then(|pos| self.view.iter().position(|&idx| idx == pos))
            .unwrap_or(0);
        self.selected_column = column.index();
        let arrow = match direction {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        };
        self.set_status_message(format!("Sorted by {} {arrow}", column.header()));
        self.select_row(row);
    }

    fn add_record(&mut self) {
        self.store.add_empty();
        debug!("Added empty record, {} rows", self.store.len());
        self.refresh_view();
        self.set_status_message(format!("Added row {}", self.store.len()));
    }

    fn commit_new_job(&mut self, job: &str) {
        if job.trim().is_empty() {
            self.set_status_message("Nothing to add");
            return;
        }
        self.store.append(Record::with_job(job));
        debug!("Committed new job \"{job}\", {} rows", self.store.len());
        self.refresh_view();
        self.set_status_message(format!("Added job request \"{job}\""));
    }

    fn import(&mut self, raw_path: &str) {
        if let Err(e) = self.load_data_file(raw_path) {
            self.report("Import", e);
        }
    }

    fn export(&mut self) {
        if self.store.is_empty() {
            debug!("Exporting an empty sheet");
        }
        let records = self.store.records();
        match exchange::export_file(&records, &self.config.export_dir) {
            Ok(path) => self.set_status_message(format!(
                "Exported {} records to {}",
                records.len(),
                path.display()
            )),
            Err(e) => self.report("Export", e),
        }
    }

    fn share(&mut self) {
        let result = exchange::export_string(&self.store.records())
            .and_then(|text| self.copy_to_clipboard(text));
        match result {
            Ok(_) => self.set_status_message("Share link copied!"),
            Err(e) => self.report("Share", e),
        }
    }

    fn copy_to_clipboard(&mut self, text: String) -> Result<(), TVError> {
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new()?);
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.set_text(text)?;
            trace!("Copied content to clipboard.");
        }
        Ok(())
    }

    fn selected_record(&self) -> Option<&Record> {
        let idx = match self.modus {
            Modus::RECORD => self.record_idx,
            _ => self.selected_row,
        };
        self.view
            .get(idx)
            .and_then(|&i| self.store.get(i))
            .map(|r| &r.record)
    }

    fn copy_table_cell(&mut self) {
        let Some(cell) = self
            .selected_record()
            .map(|r| r.cell(Column::ALL[self.selected_column]).to_string())
        else {
            return;
        };
        trace!("Cell content: {}", cell);
        match self.copy_to_clipboard(cell) {
            Ok(_) => self.set_status_message("Copied cell"),
            Err(e) => self.report("Copy", e),
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn row_as_csv(record: &Record) -> String {
        Column::ALL
            .iter()
            .map(|&c| Model::wrap_cell_content(record.cell(c)))
            .collect::<Vec<String>>()
            .join(",")
    }

    fn copy_table_row(&mut self) {
        let Some(row_content) = self.selected_record().map(Model::row_as_csv) else {
            return;
        };
        match self.copy_to_clipboard(row_content) {
            Ok(_) => self.set_status_message("Copied row"),
            Err(e) => self.report("Copy", e),
        }
    }

    fn enter(&mut self) {
        if self.view.is_empty() {
            return;
        }
        self.record_idx = self.selected_row;
        self.previous_modus = Modus::TABLE;
        self.modus = Modus::RECORD;
        self.update_uidata_for_table();
    }

    fn previous_record(&mut self) {
        self.record_idx = self.record_idx.saturating_sub(1);
        self.update_uidata_for_table();
    }

    fn next_record(&mut self) {
        if self.record_idx + 1 < self.view.len() {
            self.record_idx += 1;
        }
        self.update_uidata_for_table();
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::TABLE => {
                // Esc on the table drops the search
                if !self.query.is_empty() {
                    self.query.clear();
                    self.refresh_view();
                    self.set_status_message("Search cleared");
                }
            }
            Modus::RECORD => {
                self.previous_modus = Modus::RECORD;
                self.modus = Modus::TABLE;
                self.select_row(self.record_idx);
            }
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = self.previous_modus;
                self.previous_modus = Modus::POPUP;
                self.uidata.popup = None;
                self.update_uidata_for_table();
            }
            Modus::CMDINPUT => {}
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = match self.modus {
            Modus::RECORD => Modus::TABLE,
            m => m,
        };
        self.modus = Modus::POPUP;
        self.uidata.popup = Some(PopupView {
            title: "Help".to_string(),
            lines: Vec::new(),
            text: HELP_TEXT.to_string(),
        });
        self.update_uidata_for_table();
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?} ...", mode);
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.active_cmdinput = true;

        self.input.clear();
        match mode {
            CMDMode::Search => self.input.set(&self.query),
            CMDMode::ImportPath => {
                if let Some(path) = &self.last_import {
                    self.input.set(path)
                }
            }
            CMDMode::NewJob => {}
        }
        self.last_input = self.input.get();
        self.update_uidata_for_table();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);
        if self.cmd_mode == Some(CMDMode::Search) && !self.last_input.finished {
            // The view follows every keystroke
            self.query = self.last_input.input.clone();
            self.refresh_view();
        }
        if self.last_input.finished {
            self.handle_cmd_input();
        }
        self.update_uidata_for_table();
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);

        self.active_cmdinput = false;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        let cmd_input = self.last_input.input.clone();
        let canceled = self.last_input.canceled;
        match self.cmd_mode.take() {
            Some(CMDMode::Search) => {
                // Esc leaves the inputter empty, so a canceled search shows everything again
                self.query = cmd_input;
                self.refresh_view();
                if !canceled {
                    self.set_status_message(format!("{} matching rows", self.view.len()));
                }
            }
            Some(CMDMode::NewJob) => {
                if !canceled {
                    self.commit_new_job(&cmd_input);
                }
            }
            Some(CMDMode::ImportPath) => {
                if !canceled {
                    self.import(&cmd_input);
                }
            }
            None => {
                info!("Cmd mode is none!")
            }
        }
        self.last_input = InputResult::default();
    }
}
