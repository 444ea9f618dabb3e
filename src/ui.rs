//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  Everything shown is read from the
//! stores' state and the derived views in [`crate::view`]; nothing here
//! mutates a store.
//!
//! ## Layout
//!
//! * One-line tab bar on top, one-line status bar at the bottom.
//! * **Schools**: search line, page info, per-page statistics, the
//!   province-grouped list (or a table in grid mode), the selected school's
//!   address and map link, and the pagination bar.
//! * **News**: source and category sidebar on the left; search line, channel
//!   header, post list and the selected post's link on the right.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use crate::api::School;
use crate::app::{school_rows, App, InputMode, Screen, SchoolRow};
use crate::store::news::{NewsScope, NewsState};
use crate::store::school::{SchoolState, ViewMode};
use crate::store::Phase;
use crate::view::{self, FormattedNewsItem};

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [tabs_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_tabs(app, frame, tabs_area);
    match app.screen {
        Screen::Schools => draw_schools(app, frame, main_area),
        Screen::News => draw_news(app, frame, main_area),
    }
    draw_status_bar(app, frame, status_area);
}

fn draw_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let selected = match app.screen {
        Screen::Schools => 0,
        Screen::News => 1,
    };
    let tabs = Tabs::new([" Schools ", " News "])
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("│");
    frame.render_widget(tabs, area);
}

fn search_line<'a>(query: &'a str, editing: bool) -> Line<'a> {
    let mut spans = vec![
        Span::styled(" Search: ", Style::default().fg(Color::DarkGray)),
        Span::styled(query, Style::default().fg(Color::White)),
    ];
    if editing {
        spans.push(Span::styled("▏", Style::default().fg(Color::Yellow)));
    } else if query.is_empty() {
        spans.push(Span::styled("(press / to search)", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

/// Placeholder body for a screen with nothing to list, if any applies.
/// Rows always win; an error next to rows goes to [`error_spans`].
fn placeholder(phase: Phase, error: Option<&str>, has_rows: bool, empty: &str) -> Option<Paragraph<'static>> {
    let lines = match phase {
        Phase::Errored if !has_rows => vec![
            Line::styled(
                format!("Error: {}", error.unwrap_or("request failed")),
                Style::default().fg(Color::Red),
            ),
            Line::styled("r: Try Again", Style::default().fg(Color::Yellow)),
        ],
        Phase::Loading | Phase::Idle if !has_rows => {
            vec![Line::styled("Loading…", Style::default().fg(Color::DarkGray))]
        }
        _ if !has_rows => vec![Line::styled(empty.to_string(), Style::default().fg(Color::DarkGray))],
        _ => return None,
    };
    Some(Paragraph::new(lines).wrap(Wrap { trim: true }))
}

/// Inline error for a header line, shown while rows are still listed.
fn error_spans(error: Option<&str>, has_rows: bool) -> Vec<Span<'static>> {
    match error {
        Some(e) if has_rows => vec![
            Span::styled(format!("  Error: {e}"), Style::default().fg(Color::Red)),
            Span::styled("  r: Try Again", Style::default().fg(Color::Yellow)),
        ],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Schools
// ---------------------------------------------------------------------------

fn draw_schools(app: &mut App, frame: &mut Frame, area: Rect) {
    let [search_area, info_area, stats_area, body_area, detail_area, pages_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let editing = app.mode == InputMode::Editing;
    let state = app.schools.state();

    frame.render_widget(Paragraph::new(search_line(&state.search_query, editing)), search_area);
    frame.render_widget(Paragraph::new(info_line(state)), info_area);
    frame.render_widget(Paragraph::new(stats_line(state)), stats_area);
    frame.render_widget(Paragraph::new(pagination_line(state)), pages_area);

    let block = Block::default().title(" Schools ").borders(Borders::ALL);
    let filtered = state.filtered_schools();
    if let Some(body) = placeholder(
        state.phase(),
        state.error.as_deref(),
        !filtered.is_empty(),
        "No schools found",
    ) {
        frame.render_widget(body.block(block), body_area);
        return;
    }

    let selected_school = match state.view_mode {
        ViewMode::List => {
            let rows = school_rows(state);
            let selected = app.school_list.selected().and_then(|i| match rows.get(i) {
                Some(SchoolRow::School(school)) => Some(*school),
                _ => None,
            });
            let items: Vec<ListItem> = rows.iter().map(school_list_item).collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(list, body_area, &mut app.school_list);
            selected
        }
        ViewMode::Grid => {
            let selected = app.school_list.selected().and_then(|i| filtered.get(i).copied());
            let mut table_state = TableState::default().with_selected(app.school_list.selected());
            frame.render_stateful_widget(school_table(&filtered).block(block), body_area, &mut table_state);
            selected
        }
    };

    frame.render_widget(Paragraph::new(detail_line(selected_school)), detail_area);
}

fn info_line(state: &SchoolState) -> Line<'static> {
    let mode = match state.view_mode {
        ViewMode::List => "list",
        ViewMode::Grid => "grid",
    };
    let range = match state.showing_range() {
        Some((first, last)) => format!("Showing {first}-{last} of {}", state.total_data),
        None => "Showing 0 of 0".to_string(),
    };
    let mut spans = vec![
        Span::styled(format!(" View: {mode}"), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(format!("Per page: {}", state.per_page), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(range, Style::default().fg(Color::Green)),
    ];
    if state.loading() {
        spans.push(Span::styled("  Loading…", Style::default().fg(Color::Yellow)));
    }
    spans.extend(error_spans(state.error.as_deref(), !state.filtered_schools().is_empty()));
    Line::from(spans)
}

fn stats_line(state: &SchoolState) -> Line<'static> {
    let stats = state.stats();
    let mut spans = vec![Span::styled(" ", Style::default())];
    for (form, count) in &stats.by_form {
        spans.push(Span::styled(format!("{form}: {count}  "), Style::default().fg(Color::Magenta)));
    }
    for (status, count) in &stats.by_status {
        spans.push(Span::styled(format!("{status}: {count}  "), Style::default().fg(Color::Blue)));
    }
    Line::from(spans)
}

fn school_list_item(row: &SchoolRow<'_>) -> ListItem<'static> {
    match row {
        SchoolRow::Province { name, count } => ListItem::new(Line::from(vec![
            Span::styled(
                name.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({count})"), Style::default().fg(Color::DarkGray)),
        ])),
        SchoolRow::School(school) => ListItem::new(Line::from(vec![
            Span::raw("  "),
            Span::styled(school.name.clone(), Style::default().fg(Color::White)),
            Span::raw("  "),
            Span::styled(
                format!("[{} {}]", school.form, school.status),
                Style::default().fg(Color::Magenta),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{}, {}", school.district, school.regency),
                Style::default().fg(Color::DarkGray),
            ),
        ])),
    }
}

fn school_table(schools: &[&School]) -> Table<'static> {
    let header = Row::new(["NPSN", "Name", "Form", "Status", "Regency", "Province"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let rows = schools.iter().map(|s| {
        Row::new([
            s.npsn.clone(),
            s.name.clone(),
            s.form.clone(),
            s.status.clone(),
            s.regency.clone(),
            view::province_key(&s.province).to_string(),
        ])
    });
    Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Fill(3),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Fill(2),
            Constraint::Fill(2),
        ],
    )
    .header(header)
    .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
    .highlight_symbol("▸ ")
}

fn detail_line(school: Option<&School>) -> Line<'static> {
    let Some(school) = school else {
        return Line::default();
    };
    let map = view::map_link(school).unwrap_or_else(|| "no coordinates".into());
    Line::from(vec![
        Span::styled(format!(" {}", school.street_address), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(map, Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED)),
    ])
}

/// `‹ 1 … 4 [5] 6 … 9 ›`, with the arrows dimmed at either end.
pub(crate) fn pagination_line(state: &SchoolState) -> Line<'static> {
    let total = state.total_pages();
    let current = state.current_page;
    let window = view::page_window(current, total);
    if window.is_empty() {
        return Line::default();
    }

    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);

    let mut spans = vec![Span::styled(" ‹ ", if current > 1 { enabled } else { disabled })];
    let mut previous = 0;
    for page in window {
        if previous != 0 && page > previous + 1 {
            spans.push(Span::styled("… ", disabled));
        }
        if page == current {
            spans.push(Span::styled(
                format!("[{page}] "),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(format!("{page} "), enabled));
        }
        previous = page;
    }
    spans.push(Span::styled("›", if current < total { enabled } else { disabled }));
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

fn draw_news(app: &mut App, frame: &mut Frame, area: Rect) {
    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(24), Constraint::Min(1)]).areas(area);
    let [sources_area, categories_area] =
        Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(sidebar_area);
    let [search_area, header_area, body_area, detail_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(main_area);

    let editing = app.mode == InputMode::Editing;
    let state = app.news.state();

    draw_sidebar(state, frame, sources_area, categories_area);
    frame.render_widget(Paragraph::new(search_line(&state.search_query, editing)), search_area);
    frame.render_widget(Paragraph::new(channel_header(state)), header_area);

    let news = state.formatted_news();
    let title = match state.scope {
        NewsScope::Category => format!(" {} ", state.current_category),
        NewsScope::AllCategories => " All categories ".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if let Some(body) = placeholder(state.phase(), state.error.as_deref(), !news.is_empty(), "No news found") {
        frame.render_widget(body.block(block), body_area);
        return;
    }

    let link = app
        .news_list
        .selected()
        .and_then(|i| news.get(i))
        .map(|item| item.link.clone())
        .unwrap_or_default();

    let list = List::new(news.iter().map(news_list_item).collect::<Vec<_>>())
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, body_area, &mut app.news_list);

    frame.render_widget(
        Paragraph::new(Line::styled(format!(" {link}"), Style::default().fg(Color::Blue))),
        detail_area,
    );
}

fn draw_sidebar(state: &NewsState, frame: &mut Frame, sources_area: Rect, categories_area: Rect) {
    let highlight = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let sources: Vec<ListItem> = state.sources.iter().map(|s| ListItem::new(s.name.clone())).collect();
    let mut source_state = ListState::default()
        .with_selected(state.sources.iter().position(|s| s.name == state.current_source));
    let list = List::new(sources)
        .block(Block::default().title(" Sources (s/S) ").borders(Borders::ALL))
        .highlight_style(highlight)
        .highlight_symbol("• ");
    frame.render_stateful_widget(list, sources_area, &mut source_state);

    let categories = state.available_categories();
    let mut category_state = ListState::default()
        .with_selected(categories.iter().position(|c| *c == state.current_category));
    let list = List::new(categories.iter().map(|c| ListItem::new(c.to_string())).collect::<Vec<_>>())
        .block(Block::default().title(" Categories (c/C) ").borders(Borders::ALL))
        .highlight_style(highlight)
        .highlight_symbol("• ");
    frame.render_stateful_widget(list, categories_area, &mut category_state);
}

fn channel_header(state: &NewsState) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {} / {}", state.current_source, state.current_category),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(title) = state
        .current_channel()
        .and_then(|c| c.title.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        spans.push(Span::styled(format!("  {title}"), Style::default().fg(Color::White)));
    }
    if state.loading() {
        spans.push(Span::styled("  Loading…", Style::default().fg(Color::Yellow)));
    }
    spans.extend(error_spans(state.error.as_deref(), !state.formatted_news().is_empty()));
    Line::from(spans)
}

fn news_list_item(item: &FormattedNewsItem) -> ListItem<'static> {
    let headline = Line::from(vec![
        Span::styled(item.formatted_date.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(item.title.clone(), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format!("[{}]", item.category), Style::default().fg(Color::Cyan)),
    ]);
    let summary = Line::styled(
        format!("  {}", item.description.trim()),
        Style::default().fg(Color::Gray),
    );
    ListItem::new(vec![headline, summary])
}

// ---------------------------------------------------------------------------
// Status bar
// ---------------------------------------------------------------------------

fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let help = match (app.mode, app.screen) {
        (InputMode::Editing, _) => "type to search  Enter/Esc: done",
        (InputMode::Normal, Screen::Schools) => {
            "q: quit  Tab: news  /: search  ←/→: page  p: per page  v: view  r: retry"
        }
        (InputMode::Normal, Screen::News) => {
            "q: quit  Tab: schools  /: search  s/S: source  c/C: category  a/A: all/refetch  r: retry"
        }
    };
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(help, Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(status, area);
}
