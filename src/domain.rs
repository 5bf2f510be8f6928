use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;

pub const EXPORT_FILE_NAME: &str = "spreadsheet_data.json";
pub const SHEET_TITLE: &str = "Q3 Financial Overview";
pub const BREADCRUMB: &str = "Workspace > Folder 2 > Spreadsheet 3";
pub const TABS: [&str; 6] = [
    "All Orders",
    "Pending",
    "Reviewed",
    "Arrived",
    "Sheet1",
    "Sheet2",
];

pub const HELP_TEXT: &str = "\
Navigation
  ←↓↑→ / hjkl   move the cursor
  PgUp / PgDn   move one page
  g / G         first / last row
  Tab / S-Tab   next / previous tab

Sheet
  s             sort by the selected column
  1 .. 9        sort by the n-th column
  S             sort by Job Request
  /             search jobs (Esc clears)
  n             new action (append an empty row)
  a             type a new job request
  Enter         show the selected record

Data
  i             import a JSON file
  e             export to spreadsheet_data.json
  x             share (copy JSON to clipboard)
  y / Y         copy cell / row

  ?             this help
  Esc           close popup
  q             quit";

#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    JsonError(serde_json::Error),
    FileNotFound(PathBuf),
    PermissionDenied(PathBuf),
    NotAFile(PathBuf),
    UnknownFileType(PathBuf),
    InvalidPath(String),
    ClipboardError(String),
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "I/O error: {e}"),
            TVError::JsonError(e) => write!(f, "Invalid sheet data: {e}"),
            TVError::FileNotFound(p) => write!(f, "File not found: {}", p.display()),
            TVError::PermissionDenied(p) => write!(f, "Permission denied: {}", p.display()),
            TVError::NotAFile(p) => write!(f, "Not a file: {}", p.display()),
            TVError::UnknownFileType(p) => {
                write!(f, "Not a JSON file: {}", p.display())
            }
            TVError::InvalidPath(s) => write!(f, "Invalid path: {s}"),
            TVError::ClipboardError(s) => write!(f, "Clipboard unavailable: {s}"),
        }
    }
}

impl std::error::Error for TVError {}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<serde_json::Error> for TVError {
    fn from(err: serde_json::Error) -> Self {
        TVError::JsonError(err)
    }
}

impl From<arboard::Error> for TVError {
    fn from(err: arboard::Error) -> Self {
        TVError::ClipboardError(err.to_string())
    }
}

/// How the direction of the next sort is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// One flag for all columns, flipped by every sort.
    #[default]
    Shared,
    /// Every column remembers its own next direction.
    PerColumn,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub export_dir: PathBuf,
    pub sort_mode: SortMode,
}

impl Default for TVConfig {
    fn default() -> Self {
        TVConfig {
            event_poll_time: 100,
            max_column_width: 40,
            export_dir: PathBuf::from("."),
            sort_mode: SortMode::Shared,
        }
    }
}

/// What the command line at the bottom is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    Search,
    NewJob,
    ImportPath,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextTab,
    PrevTab,
    Sort,
    SortColumn(usize),
    SortJobs,
    Search,
    NewRecord,
    NewJob,
    Import,
    Export,
    Share,
    CopyCell,
    CopyRow,
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
