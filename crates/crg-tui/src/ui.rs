use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use crg_core::market::format::{format_change, format_compact, format_price, Trend};
use crg_core::{Message, MessageBody, Role};
use crate::app::{App, InputMode, Tab};

const SPINNER: [&str; 3] = ["◐", "◓", "◑"];

/// A styled fragment of a word
struct Piece {
    text: String,
    bold: bool,
}

/// Pieces with no whitespace between them, wrapped as one unit
type Word = Vec<Piece>;

fn word_width(word: &Word) -> usize {
    word.iter().map(|p| p.text.chars().count()).sum()
}

/// Split a line into words, toggling bold on every `**` marker.
fn markdown_words(text: &str) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut glue = false;

    for (i, segment) in text.split("**").enumerate() {
        if segment.is_empty() {
            continue;
        }
        let bold = i % 2 == 1;
        let starts_ws = segment.starts_with(char::is_whitespace);

        for (j, w) in segment.split_whitespace().enumerate() {
            let piece = Piece {
                text: w.to_string(),
                bold,
            };
            if j == 0 && glue && !starts_ws {
                if let Some(last) = words.last_mut() {
                    last.push(piece);
                    continue;
                }
            }
            words.push(vec![piece]);
        }
        glue = !segment.ends_with(char::is_whitespace);
    }

    words
}

/// Wrap words to `width` on word boundaries (doesn't break mid-word)
fn wrap_words(words: Vec<Word>, width: usize, indent: &str, style: Style) -> Vec<Line<'static>> {
    let width = width.saturating_sub(indent.chars().count()).max(1);
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_len = 0;

    for word in words {
        let len = word_width(&word);
        if current_len > 0 && current_len + 1 + len > width {
            lines.push(Line::from(std::mem::take(&mut current)));
            current_len = 0;
        }
        if current_len == 0 {
            current.push(Span::raw(indent.to_string()));
        } else {
            current.push(Span::styled(" ", style));
            current_len += 1;
        }
        for piece in word {
            let piece_style = if piece.bold {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            };
            current.push(Span::styled(piece.text, piece_style));
        }
        current_len += len;
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    lines
}

/// Render markdown-ish text: `**bold**`, `#` headings and `-`/`*` bullets
fn markdown_lines(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() {
            lines.push(Line::default());
            continue;
        }

        if let Some(heading) = trimmed.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim();
            lines.extend(wrap_words(markdown_words(heading), width, "  ", style.add_modifier(Modifier::BOLD)));
        } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
            let mut wrapped = wrap_words(markdown_words(item), width, "    ", style);
            if let Some(first) = wrapped.first_mut() {
                if let Some(span) = first.spans.first_mut() {
                    *span = Span::styled("  • ", Style::default().fg(Color::Magenta));
                }
            }
            lines.extend(wrapped);
        } else {
            lines.extend(wrap_words(markdown_words(trimmed), width, "  ", style));
        }
    }
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(28),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area);

    if app.showing_selector() {
        render_selector(app, frame, main_area);
    } else {
        render_chat(app, frame, main_area);
    }

    render_footer(app, frame, footer_area);

    if app.market.is_open() {
        render_market(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut title = Line::from(vec![
        Span::styled(" Automind's CRG ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Crypto Regulatory Guide ", Style::default().fg(Color::White)),
        Span::styled(
            format!("{} ", app.model_name),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    if app.missing_api_key {
        title.push_span(Span::styled(
            "  no API key: set GEMINI_API_KEY",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Intelligence ");

    let items = vec![
        ListItem::new(Line::from(vec![
            Span::styled(" 1 ", Style::default().fg(Color::DarkGray)),
            Span::raw("Global Regulations"),
        ])),
        ListItem::new(Line::from(vec![
            Span::styled(" 2 ", Style::default().fg(Color::DarkGray)),
            Span::raw("Country Search"),
        ])),
        ListItem::new(Line::from(vec![
            Span::styled(" m ", Style::default().fg(Color::DarkGray)),
            Span::raw("Live Market Data"),
            Span::styled(" ●", Style::default().fg(Color::Green)),
        ])),
    ];

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Indexed(54))
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn message_lines(message: &Message, width: usize, animation_frame: u8) -> Vec<Line<'static>> {
    let (name, name_style) = match message.role {
        Role::User => ("You", Style::default().fg(Color::Cyan).bold()),
        Role::Model => ("CRG AI", Style::default().fg(Color::Magenta).bold()),
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(name, name_style),
        Span::styled(
            format!("  {}", message.timestamp.format("%H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    let text_style = match message.role {
        Role::User => Style::default().fg(Color::White),
        Role::Model => Style::default().fg(Color::Gray),
    };

    match &message.body {
        MessageBody::Typing => {
            let dots = ".".repeat(animation_frame as usize + 1);
            lines.push(Line::from(Span::styled(
                format!("  Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        MessageBody::Text { text, sources } => {
            lines.extend(markdown_lines(text, width, text_style));

            if !sources.is_empty() {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "  Sources",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                )));
                for (i, source) in sources.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  [{}] ", i + 1), Style::default().fg(Color::Magenta)),
                        Span::styled(source.title.clone(), Style::default().fg(Color::White)),
                    ]));
                    lines.push(Line::from(Span::styled(
                        format!("      {}", source.uri),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::UNDERLINED),
                    )));
                }
            }
        }
    }

    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let banner_height = if app.tab == Tab::Country { 1 } else { 0 };
    let [banner_area, notice_area, stream_area, input_area, disclaimer_area] = Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    // Country context banner
    if let Some(country) = app.selected_country.as_deref() {
        let banner = Line::from(vec![
            Span::styled(" ⌖ Jurisdiction Context: ", Style::default().fg(Color::LightBlue)),
            Span::styled(country.to_string(), Style::default().fg(Color::White).bold()),
            Span::styled("   [c] change", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(
            Paragraph::new(banner).style(Style::default().bg(Color::Indexed(17))),
            banner_area,
        );
    }

    let notice = Paragraph::new(Line::from(vec![
        Span::styled("✓ ", Style::default().fg(Color::Green)),
        Span::styled("Encrypted Session • Enterprise Grade Security", Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(notice, notice_area);

    // Message stream
    let width = stream_area.width.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .conversation
        .messages()
        .iter()
        .flat_map(|m| message_lines(m, width, app.animation_frame))
        .collect();

    let total_lines = saturating_u16(lines.len());
    let max_scroll = total_lines.saturating_sub(stream_area.height);
    if app.follow_chat || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_chat = true;
    }

    let stream = Paragraph::new(lines)
        .block(Block::default().borders(Borders::NONE))
        .scroll((app.chat_scroll, 0));
    frame.render_widget(stream, stream_area);

    // Input line
    let loading = app.conversation.is_loading();
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if loading {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Indexed(60)
    };
    let title = if loading { " Waiting for response... " } else { " Ask CRG " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor.min(app.chat_input.chars().count());
    let scroll_offset = input_scroll_offset(cursor_pos, inner_width);

    let input = if app.chat_input.is_empty() {
        Paragraph::new(Span::styled(
            app.conversation.context().placeholder(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .chat_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::White))
    };
    frame.render_widget(input.block(input_block), input_area);

    // Show cursor when editing
    if editing {
        let cursor_x = saturating_u16(cursor_pos - scroll_offset);
        frame.set_cursor_position((
            input_area.x.saturating_add(cursor_x).saturating_add(1),
            input_area.y + 1,
        ));
    }

    let disclaimer = Paragraph::new(Span::styled(
        "AI-generated content may be inaccurate. Verify important regulatory information.",
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(disclaimer, disclaimer_area);
}

fn status_color(status: &str) -> Color {
    match status {
        "Complex" => Color::Yellow,
        "Crypto-Friendly" | "Crypto Valley" | "Tax-Friendly" => Color::Green,
        "Regulated" | "Emerging Hub" | "Blockchain Island" => Color::LightBlue,
        "Legal Tender" => Color::Magenta,
        "Comprehensive" => Color::Blue,
        _ => Color::Gray,
    }
}

fn render_selector(app: &mut App, frame: &mut Frame, area: Rect) {
    let [title_area, search_area, list_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Select Jurisdiction", Style::default().fg(Color::White).bold())),
        Line::from(Span::styled(
            "Choose a country to access specific regulatory frameworks, licensing requirements, and compliance guidelines.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::NONE));
    frame.render_widget(title, title_area);

    let editing = app.input_mode == InputMode::Editing;
    let search_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(" Search country or region ");

    let search = if app.selector.search().is_empty() {
        Paragraph::new(Span::styled(
            "e.g. 'Brazil', 'Canada'...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(app.selector.search()).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(search.block(search_block), search_area);

    if editing {
        frame.set_cursor_position((
            search_area.x + app.selector.search().chars().count() as u16 + 1,
            search_area.y + 1,
        ));
    }

    let countries = app.selector.filtered();
    if countries.is_empty() {
        let mut lines = vec![Line::from(Span::styled(
            "Jurisdiction not listed in presets.",
            Style::default().fg(Color::DarkGray),
        ))];
        if let Some(custom) = app.selector.custom_candidate() {
            lines.push(Line::default());
            lines.push(Line::from(vec![
                Span::styled(" Enter ", Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::styled(
                    format!(" Start specific analysis for \"{}\"", custom),
                    Style::default().fg(Color::LightBlue),
                ),
            ]));
        }
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), list_area);
        return;
    }

    let items: Vec<ListItem> = countries
        .iter()
        .map(|c| {
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", c.code), Style::default().fg(Color::DarkGray).bold()),
                Span::styled(format!("{:<24}", c.name), Style::default().fg(Color::White)),
                Span::styled(format!("{:<16}", c.region), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("[{}]", c.status), Style::default().fg(status_color(c.status))),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Presets "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.selector.selected_index());
    frame.render_stateful_widget(list, list_area, &mut state);
}

fn saturating_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// First visible char of the input line for a given cursor position.
fn input_scroll_offset(cursor_pos: usize, inner_width: usize) -> usize {
    if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    }
}

fn percent_of(length: u16, percent: u16) -> u16 {
    u16::try_from(u32::from(length) * u32::from(percent) / 100).unwrap_or(length)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = percent_of(area.width, percent_x);
    let height = percent_of(area.height, percent_y);
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

fn right(text: String) -> Cell<'static> {
    Cell::from(Line::from(text).alignment(Alignment::Right))
}

fn render_market(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(90, 85, area);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let loading = app.market.is_loading();
    let spinner = if loading {
        format!(" {} ", SPINNER[app.animation_frame as usize % SPINNER.len()])
    } else {
        String::new()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(Line::from(vec![
            Span::styled(" ● ", Style::default().fg(Color::Green)),
            Span::styled("Live Market Data ", Style::default().fg(Color::White).bold()),
            Span::styled(spinner, Style::default().fg(Color::Cyan)),
        ]));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [subtitle_area, search_area, table_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    let subtitle = Paragraph::new(Span::styled(
        format!(
            " Top 100 Cryptocurrencies • Auto-refresh every {}s",
            app.refresh_interval.as_secs()
        ),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(subtitle, subtitle_area);

    let search_style = if app.market_search_editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let search_text = if app.market.search().is_empty() && !app.market_search_editing {
        "Search coins...".to_string()
    } else {
        app.market.search().to_string()
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(" / ", search_style),
            Span::styled(search_text, Style::default().fg(Color::Cyan)),
        ])),
        search_area,
    );
    if app.market_search_editing {
        frame.set_cursor_position((
            search_area.x + 3 + app.market.search().chars().count() as u16,
            search_area.y,
        ));
    }

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Asset"),
        right("Price".to_string()),
        right("24h Change".to_string()),
        right("Market Cap".to_string()),
    ])
    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = if app.market.show_skeleton() {
        // Placeholder rows only while the very first load runs
        (0..10)
            .map(|_| {
                Row::new(vec![
                    Cell::from("░░"),
                    Cell::from("░░░░░░░░░░░░"),
                    right("░░░░░░░░".to_string()),
                    right("░░░░░".to_string()),
                    right("░░░░░░".to_string()),
                ])
                .style(Style::default().fg(Color::DarkGray))
            })
            .collect()
    } else if app.market.visible_coins().is_empty() {
        vec![Row::new(vec![
            Cell::from(""),
            Cell::from(format!("No coins found matching \"{}\"", app.market.search())),
        ])
        .style(Style::default().fg(Color::DarkGray))]
    } else {
        app.market
            .visible_coins()
            .iter()
            .map(|coin| {
                let rank = coin.market_cap_rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
                let price = coin.current_price.map(format_price).unwrap_or_else(|| "-".to_string());
                let cap = coin.market_cap.map(format_compact).unwrap_or_else(|| "-".to_string());
                let change = match coin.price_change_percentage_24h.map(format_change) {
                    Some((text, Trend::Up)) => Span::styled(format!("▲ {}", text), Style::default().fg(Color::Green)),
                    Some((text, Trend::Down)) => Span::styled(format!("▼ {}", text), Style::default().fg(Color::Red)),
                    None => Span::styled("-", Style::default().fg(Color::DarkGray)),
                };

                Row::new(vec![
                    Cell::from(Span::styled(rank, Style::default().fg(Color::DarkGray))),
                    Cell::from(Line::from(vec![
                        Span::styled(coin.name.clone(), Style::default().fg(Color::White).bold()),
                        Span::styled(
                            format!(" {}", coin.symbol.to_uppercase()),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])),
                    right(price),
                    Cell::from(Line::from(change).alignment(Alignment::Right)),
                    Cell::from(Line::from(Span::styled(cap, Style::default().fg(Color::Gray))).alignment(Alignment::Right)),
                ])
            })
            .collect()
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .highlight_style(Style::default().bg(Color::Indexed(236)))
    .block(Block::default().borders(Borders::TOP).border_style(Style::default().fg(Color::DarkGray)));

    frame.render_stateful_widget(table, table_area, &mut app.market_table_state);

    // Error overlay: prior rows stay underneath
    if let Some(error) = app.market.error() {
        let overlay_area = centered_rect(60, 50, table_area);
        frame.render_widget(Clear, overlay_area);
        let overlay = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled("⚠ Unable to load market data", Style::default().fg(Color::Red).bold())),
            Line::default(),
            Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Gray))),
            Line::default(),
            Line::from(vec![
                Span::styled(" r ", Style::default().bg(Color::Blue).fg(Color::White)),
                Span::styled(" Try Again", Style::default().fg(Color::White)),
            ]),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(overlay, overlay_area);
    }

    let [source_area, updated_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(footer_area);

    frame.render_widget(
        Paragraph::new(Span::styled(" Data provided by CoinGecko API", Style::default().fg(Color::DarkGray))),
        source_area,
    );
    if let Some(updated) = app.market.last_updated() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("Last updated: {} ", updated.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Right),
            updated_area,
        );
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.market.is_open() {
        " MARKET "
    } else {
        match app.tab {
            Tab::Global => " GLOBAL ",
            Tab::Country => " COUNTRY ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: Vec<(&str, &str)> = if app.market.is_open() {
        if app.market_search_editing {
            vec![("Enter", "done"), ("Esc", "done")]
        } else {
            vec![("j/k", "nav"), ("/", "search"), ("r", "refresh"), ("Esc", "close")]
        }
    } else if app.showing_selector() {
        match app.input_mode {
            InputMode::Editing => vec![("↑/↓", "nav"), ("Enter", "select"), ("Esc", "stop typing")],
            InputMode::Normal => vec![
                ("j/k", "nav"),
                ("Enter", "select"),
                ("/", "search"),
                ("1", "global"),
                ("m", "market"),
                ("q", "quit"),
            ],
        }
    } else {
        match app.input_mode {
            InputMode::Editing => vec![("Enter", "send"), ("Esc", "stop typing")],
            InputMode::Normal => {
                let mut pairs = vec![("i", "ask"), ("j/k", "scroll")];
                if app.tab == Tab::Country {
                    pairs.push(("c", "change country"));
                }
                pairs.extend([("1", "global"), ("2", "country"), ("m", "market"), ("q", "quit")]);
                pairs
            }
        }
    };

    let hints = pairs.into_iter().flat_map(|(key, label)| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crg_core::{ChatGateway, ChatReply, ChatRequest, CoinRecord, GatewayError, MarketGateway};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_markers_are_stripped() {
        let lines = markdown_lines("I have switched context to **Malta**.", 80, Style::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(plain(&lines[0]), "  I have switched context to Malta.");
        let bold: Vec<&str> = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(bold, vec!["Malta"]);
    }

    #[test]
    fn test_bold_survives_wrapping() {
        let lines = markdown_lines("**Global Intelligence Mode Active.**", 20, Style::default());
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(!plain(line).contains("**"));
        }
    }

    #[test]
    fn test_bullets_and_blank_lines() {
        let lines = markdown_lines("Steps:\n\n- Register\n- Report", 40, Style::default());
        assert_eq!(lines.len(), 4);
        assert!(plain(&lines[1]).is_empty());
        assert_eq!(plain(&lines[2]), "  • Register");
    }

    struct NoChat;

    #[async_trait]
    impl ChatGateway for NoChat {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, GatewayError> {
            Err(GatewayError::Empty)
        }
    }

    struct NoMarket;

    #[async_trait]
    impl MarketGateway for NoMarket {
        async fn fetch_markets(&self) -> Result<Vec<CoinRecord>, GatewayError> {
            Ok(Vec::new())
        }
    }

    fn test_app() -> App {
        App::with_gateways(Arc::new(NoChat), Arc::new(NoMarket), Duration::from_secs(30))
    }

    fn buffer_rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_input_scroll_offset() {
        assert_eq!(input_scroll_offset(5, 10), 0);
        assert_eq!(input_scroll_offset(10, 10), 1);
        assert_eq!(input_scroll_offset(127, 70), 58);
        assert_eq!(input_scroll_offset(3, 0), 0);
    }

    #[test]
    fn test_line_count_saturates() {
        assert_eq!(saturating_u16(70_000), u16::MAX);
        assert_eq!(saturating_u16(120), 120);
    }

    #[test]
    fn test_long_input_scrolls_to_cursor() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;
        app.chat_input = format!("{}ENDMARK", "x".repeat(120));
        app.chat_cursor = app.chat_input.chars().count();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let rows = buffer_rows(&terminal);
        assert!(rows.iter().any(|row| row.contains("xxxENDMARK")));

        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 100);
        assert!(cursor.x > 28);
        assert!(rows[cursor.y as usize].contains("ENDMARK"));
    }

    #[test]
    fn test_short_input_cursor_follows_text() {
        let mut app = test_app();
        app.input_mode = InputMode::Editing;
        app.chat_input = "MiCA".to_string();
        app.chat_cursor = 4;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        let row = &buffer_rows(&terminal)[cursor.y as usize];
        let start = row.find("MiCA").unwrap();
        assert_eq!(cursor.x as usize, row[..start].chars().count() + 4);
    }

    #[test]
    fn test_header_flags_missing_api_key() {
        let mut app = test_app();
        app.missing_api_key = true;

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(buffer_rows(&terminal)[0].contains("no API key"));

        app.missing_api_key = false;
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(!buffer_rows(&terminal)[0].contains("no API key"));
    }

    #[test]
    fn test_centered_rect_on_wide_area() {
        let area = Rect::new(0, 0, 1000, 800);
        let popup = centered_rect(90, 85, area);
        assert_eq!(popup, Rect::new(50, 60, 900, 680));
    }
}
