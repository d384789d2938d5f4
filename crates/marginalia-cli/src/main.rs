use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use marginalia_config::Config;
use marginalia_engine::io;
use marginalia_engine::models::Highlight;
use marginalia_engine::service::HighlightService;
use marginalia_engine::store::JsonFileStore;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use relative_path::RelativePathBuf;
use std::{env, io::stdout, path::PathBuf, process};

struct App {
    docs_path: PathBuf,
    documents: Vec<RelativePathBuf>,
    list_state: ListState,
    service: HighlightService<JsonFileStore>,
    preview: Vec<Line<'static>>,
    stale_lines: Vec<Line<'static>>,
}

impl App {
    fn new(docs_path: PathBuf, data_dir: PathBuf) -> Result<Self> {
        let documents = io::scan_documents(&docs_path)?;
        let service = HighlightService::with_json_store(&docs_path, &data_dir)?;

        let mut app = Self {
            docs_path,
            documents,
            list_state: ListState::default(),
            service,
            preview: Vec::new(),
            stale_lines: Vec::new(),
        };

        if !app.documents.is_empty() {
            app.list_state.select(Some(0));
            app.update_preview();
        }

        Ok(app)
    }

    fn next_document(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.documents.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.update_preview();
    }

    fn previous_document(&mut self) {
        if self.documents.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.documents.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
        self.update_preview();
    }

    fn selected_resource(&self) -> Option<&RelativePathBuf> {
        self.list_state.selected().and_then(|i| self.documents.get(i))
    }

    fn update_preview(&mut self) {
        let Some(resource) = self.selected_resource().cloned() else {
            return;
        };

        let source = match io::read_source(&resource, &self.docs_path) {
            Ok(source) => source,
            Err(e) => {
                self.preview = vec![Line::from(format!("Error reading document: {e}"))];
                self.stale_lines = Vec::new();
                return;
            }
        };

        // Revalidation persists stale-flag flips; the store staying offline
        // only costs us highlight styling, never the document itself.
        let highlights = match self.service.revalidate(&resource) {
            Ok(highlights) => highlights,
            Err(e) => {
                tracing::warn!(%e, "showing document without highlights");
                Vec::new()
            }
        };

        self.preview = styled_source_lines(&source, &highlights);
        self.stale_lines = stale_summary(&highlights);
    }
}

/// Split source lines into styled segments, highlighting the byte ranges of
/// active highlights.
fn styled_source_lines(source: &str, highlights: &[Highlight]) -> Vec<Line<'static>> {
    let active: Vec<std::ops::Range<usize>> = highlights
        .iter()
        .filter(|h| !h.is_stale)
        .map(Highlight::range)
        .collect();

    segment_lines(source, &active)
        .into_iter()
        .map(|segments| {
            let spans: Vec<Span<'static>> = segments
                .into_iter()
                .map(|(text, highlighted)| {
                    if highlighted {
                        Span::styled(
                            text,
                            Style::default()
                                .bg(Color::Yellow)
                                .fg(Color::Black)
                                .add_modifier(Modifier::BOLD),
                        )
                    } else {
                        Span::raw(text)
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Per line, the (text, inside-highlight) segments produced by intersecting
/// highlight byte ranges with line byte ranges.
fn segment_lines(source: &str, ranges: &[std::ops::Range<usize>]) -> Vec<Vec<(String, bool)>> {
    let mut lines = Vec::new();
    let mut line_start = 0;

    for line in source.split('\n') {
        let line_end = line_start + line.len();
        let mut segments: Vec<(String, bool)> = Vec::new();
        let mut cursor = line_start;

        let mut intersecting: Vec<std::ops::Range<usize>> = ranges
            .iter()
            .filter(|r| r.start < line_end && r.end > cursor)
            .cloned()
            .collect();
        intersecting.sort_by_key(|r| r.start);

        for range in intersecting {
            let from = range.start.max(cursor);
            let to = range.end.min(line_end);
            if from > cursor {
                segments.push((source[cursor..from].to_string(), false));
            }
            segments.push((source[from..to].to_string(), true));
            cursor = to;
        }
        if cursor < line_end {
            segments.push((source[cursor..line_end].to_string(), false));
        }
        if segments.is_empty() {
            segments.push((String::new(), false));
        }

        lines.push(segments);
        line_start = line_end + 1;
    }

    lines
}

fn stale_summary(highlights: &[Highlight]) -> Vec<Line<'static>> {
    highlights
        .iter()
        .filter(|h| h.is_stale)
        .map(|h| {
            let mut text = format!("⚠ \"{}\" no longer matches the source", h.highlighted_text);
            if let Some(notes) = &h.notes {
                text.push_str(&format!(" (note: {notes})"));
            }
            Line::from(Span::styled(text, Style::default().fg(Color::Yellow)))
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Determine docs path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let (docs_path, data_dir, from_config) = if args.len() == 2 {
        let docs = PathBuf::from(&args[1]);
        let data = docs.join(".marginalia");
        (docs, data, false)
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                let data = config.data_dir();
                (config.docs_path, data, true)
            }
            Ok(None) => {
                eprintln!("Error: No docs path provided and no config file found");
                eprintln!("Usage: {} <docs-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <docs-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [docs-folder-path]", args[0]);
        process::exit(1);
    };

    if let Err(e) = io::validate_docs_dir(&docs_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Docs path '{}'{} is invalid: {e}",
            docs_path.display(),
            source
        );
        process::exit(1);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(docs_path, data_dir)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_document(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_document(),
                KeyCode::Char('r') => app.update_preview(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(f.area());

    // Document list panel
    let items: Vec<ListItem> = app
        .documents
        .iter()
        .map(|doc| ListItem::new(vec![Line::from(vec![Span::raw(doc.as_str().to_string())])]))
        .collect();

    let document_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Documents"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(document_list, chunks[0], &mut app.list_state);

    // Preview panel, with the stale warnings underneath when there are any
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(0),
                Constraint::Length(app.stale_lines.len().min(5) as u16 + 2),
            ]
            .as_ref(),
        )
        .split(chunks[1]);

    let preview_text = if app.preview.is_empty() {
        vec![Line::from("Select a document to view it")]
    } else {
        app.preview.clone()
    };

    let preview = Paragraph::new(preview_text)
        .block(Block::default().borders(Borders::ALL).title("Preview"))
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(preview, right[0]);

    if !app.stale_lines.is_empty() {
        let warnings = Paragraph::new(app.stale_lines.clone()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Stale highlights"),
        );
        f.render_widget(warnings, right[1]);
    }

    // Instructions
    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k: Previous | "),
        Span::raw("↓/j: Next | "),
        Span::raw("r: Refresh"),
    ]);
    let help = Paragraph::new(vec![help_text]).block(Block::default());

    let bottom_chunk = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());
    f.render_widget(help, bottom_chunk[1]);
}
