use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use medcode_extractor::{
    category_lines, write_export, BatchReport, Category, DescriptionTable, ExtractionResult,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Documents,
    Combined,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Documents => Page::Combined,
            Page::Combined => Page::Documents,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Documents => "Documents",
            Page::Combined => "Combined",
        }
    }
}

pub struct App {
    pub report: BatchReport,
    pub table: Arc<DescriptionTable>,
    pub state: TableState,
    pub current_page: Page,
    pub output_path: PathBuf,
    pub status: Option<String>,
}

impl App {
    pub fn new(report: BatchReport, table: Arc<DescriptionTable>, output_path: PathBuf) -> Self {
        let mut state = TableState::default();
        if !report.outcomes.is_empty() {
            state.select(Some(0));
        }

        Self {
            report,
            table,
            state,
            current_page: Page::Documents,
            output_path,
            status: None,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn next(&mut self) {
        let len = self.report.outcomes.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.report.outcomes.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Result shown in the three code columns for the current page
    pub fn visible_result(&self) -> Option<&ExtractionResult> {
        match self.current_page {
            Page::Combined => Some(&self.report.combined),
            Page::Documents => self
                .state
                .selected()
                .and_then(|i| self.report.outcomes.get(i))
                .and_then(|o| o.codes()),
        }
    }

    pub fn export(&mut self) {
        self.status = Some(match write_export(&self.output_path, &self.report.combined) {
            Ok(rows) => format!("Exported {} codes to {}", rows, self.output_path.display()),
            Err(e) => format!("Export failed: {:#}", e),
        });
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("UI error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::Char('e') => app.export(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    render_documents(f, content_chunks[0], app);
    render_codes(f, content_chunks[1], app);

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Documents, Page::Combined].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title(), style));
    }

    let summary = &app.report.summary;
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Files: {}", summary.documents_processed),
        Style::default().fg(Color::White),
    ));
    if summary.has_failures() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("Failed: {}", summary.documents_failed),
            Style::default().fg(Color::Red),
        ));
    }
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Unique codes: {}", summary.unique_codes),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_documents(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(["File", "Codes"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.report.outcomes.iter().map(|outcome| {
        let (count, color) = match &outcome.outcome {
            Ok(result) => (result.len().to_string(), Color::Green),
            Err(_) => ("error".to_string(), Color::Red),
        };
        Row::new(vec![
            Cell::from(truncate(&outcome.name, 28)),
            Cell::from(count).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(rows, [Constraint::Min(10), Constraint::Length(7)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Files "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_codes(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.current_page {
        Page::Combined => " All Files (deduplicated) ".to_string(),
        Page::Documents => app
            .state
            .selected()
            .and_then(|i| app.report.outcomes.get(i))
            .map(|o| format!(" Results from {} ", o.name))
            .unwrap_or_else(|| " No file selected ".to_string()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    // Failed document: show the reason instead of columns
    if app.current_page == Page::Documents {
        if let Some(err) = app
            .state
            .selected()
            .and_then(|i| app.report.outcomes.get(i))
            .and_then(|o| o.error())
        {
            let message = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Error processing file",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(err.to_string()),
            ]);
            f.render_widget(message, inner);
            return;
        }
    }

    let empty = ExtractionResult::new();
    let result = app.visible_result().unwrap_or(&empty);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(inner);

    for (column, category) in columns.iter().zip(Category::ALL) {
        let color = if result.count(category) == 0 {
            Color::DarkGray
        } else {
            Color::White
        };
        let lines: Vec<Line> = category_lines(result, category, &app.table)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(color))))
            .collect();

        let paragraph = Paragraph::new(lines)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .title(format!(" {} Codes ", category.label())),
            );
        f.render_widget(paragraph, *column);
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    if let Some(status) = &app.status {
        spans.push(Span::styled(format!(" {} ", status), Style::default().fg(Color::Green)));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Page | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" File | "));
    spans.push(Span::styled("e", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Export CSV | "));
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
