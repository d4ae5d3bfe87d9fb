use crate::app::{App, ArticleView, Focus, Tab};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};

const HIGHLIGHT: Style = Style::new().bg(Color::Yellow).fg(Color::Black);

pub fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(18),
                Constraint::Percentage(47),
                Constraint::Percentage(35),
            ]
            .as_ref(),
        )
        .split(rows[0]);

    render_books(f, app, columns[0]);
    render_chapter(f, app, columns[1]);
    match &app.article {
        Some(view) => render_article(f, view, columns[2]),
        None => render_helps(f, app, columns[2]),
    }

    let status = app.status.clone().unwrap_or_default();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(status, Style::default().fg(Color::Red)))),
        rows[1],
    );

    let help_text = if app.article.is_some() {
        "q: Quit | ↑/↓: Link | Enter: Follow | Backspace/Esc: Back"
    } else {
        "q: Quit | Tab: Focus | ↑/↓: Select | Enter: Open | ←/→: Chapter | t: Tab | [/]: Verse | a: All verses | b: Translation"
    };
    f.render_widget(Paragraph::new(Line::from(help_text)), rows[2]);
}

fn pane(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn render_books(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .books
        .iter()
        .map(|book| ListItem::new(Line::from(book.display_name().to_string())))
        .collect();

    let title = format!("Books ({})", app.translation().name);
    let list = List::new(items)
        .block(pane(title, app.focus == Focus::Books))
        .highlight_style(HIGHLIGHT);

    f.render_stateful_widget(list, area, &mut app.book_list_state);
}

fn render_chapter(f: &mut Frame, app: &App, area: Rect) {
    let mut title = match (&app.book, app.current_chapter()) {
        (Some(book), Some(chapter)) => format!("{} {}", book.title, chapter.chapter),
        (Some(book), None) => book.title.clone(),
        _ => "Scripture".to_string(),
    };
    if let Some(verse) = &app.verse_filter {
        title.push_str(&format!(" (verse {verse})"));
    }

    let lines: Vec<Line> = if let Some(error) = &app.book_error {
        vec![Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ))]
    } else if app.book.is_none() {
        vec![Line::from("Select a book to read")]
    } else {
        app.visible_verses()
            .into_iter()
            .map(|verse| {
                let marks = app.verse_marks(verse);
                let mut spans = vec![Span::styled(
                    format!("{} ", verse.verse),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                for (word, mark) in verse.words.iter().zip(marks) {
                    let style = if mark.matches_selected {
                        HIGHLIGHT
                    } else if mark.has_annotation {
                        Style::default().add_modifier(Modifier::UNDERLINED)
                    } else {
                        Style::default()
                    };
                    spans.push(Span::styled(word.text.clone(), style));
                }
                Line::from(spans)
            })
            .collect()
    };

    let text = Paragraph::new(lines)
        .block(pane(title, false))
        .wrap(Wrap { trim: true });
    f.render_widget(text, area);
}

fn render_helps(f: &mut Frame, app: &mut App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(selected)
        .highlight_style(HIGHLIGHT);
    f.render_widget(tabs, parts[0]);

    let items: Vec<ListItem> = app
        .help_items()
        .into_iter()
        .map(|item| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{} ", item.reference),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(item.phrase, Style::default().add_modifier(Modifier::ITALIC)),
            ])];
            lines.extend(
                item.body
                    .lines()
                    .map(|line| Line::from(format!("  {line}"))),
            );
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect();

    let block = pane(app.tab.title().to_string(), app.focus == Focus::Helps);
    if items.is_empty() {
        let empty = Paragraph::new(format!("No {} here", app.tab.title().to_lowercase())).block(block);
        f.render_widget(empty, parts[1]);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, parts[1], &mut app.help_state);
}

fn render_article(f: &mut Frame, view: &ArticleView, area: Rect) {
    let mut lines: Vec<Line> = view
        .page
        .lines
        .iter()
        .map(|line| Line::from(line.clone()))
        .collect();

    if !view.page.links.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Links",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, link) in view.page.links.iter().enumerate() {
            let style = if view.selected_link == Some(i) {
                HIGHLIGHT
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(format!("  {link}"), style)));
        }
    }

    let title = match view.depth() {
        0 => view.page.title.clone(),
        depth => format!("{} ({depth} back)", view.page.title),
    };
    let article = Paragraph::new(lines)
        .block(pane(title, true))
        .wrap(Wrap { trim: false });
    f.render_widget(article, area);
}
