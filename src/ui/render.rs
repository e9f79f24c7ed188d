use crate::models::{
    DownloadMetadata, DownloadProgress, FocusedPane, InputMode, Project, SearchHit,
    VerificationProgress, Version,
};
use crate::utils::{format_number, format_size};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use std::collections::HashMap;
use tui_input::Input;

/// Parameters for rendering the UI
pub struct RenderParams<'a> {
    pub input: &'a Input,
    pub input_mode: InputMode,
    pub hits: &'a [SearchHit],
    pub list_state: &'a mut ListState,
    pub loading: bool,
    pub project: &'a Option<Project>,
    pub versions: &'a [Version],
    pub version_list_state: &'a mut ListState,
    pub loading_versions: bool,
    pub focused_pane: FocusedPane,
    pub error: &'a Option<String>,
    pub status: &'a str,
    pub selection_info: &'a str,
    pub complete_downloads: &'a HashMap<String, DownloadMetadata>,
}

/// Shorten to `max` characters, ellipsized; safe on multibyte text
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}

pub fn render_ui(frame: &mut Frame, params: RenderParams) {
    let RenderParams {
        input,
        input_mode,
        hits,
        list_state,
        loading,
        project,
        versions,
        version_list_state,
        loading_versions,
        focused_pane,
        error,
        status,
        selection_info,
        complete_downloads,
    } = params;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),    // Main content (results list)
            Constraint::Length(12), // Bottom panels
            Constraint::Length(4),  // Status bar
        ])
        .split(frame.area());

    // Helper to determine border style based on focus
    let get_border_style = |pane: FocusedPane| -> Style {
        if input_mode == InputMode::Normal && focused_pane == pane {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    // Results list (chunks[0])
    let items: Vec<ListItem> = hits
        .iter()
        .enumerate()
        .map(|(idx, hit)| {
            let downloads = format_number(hit.downloads);
            let follows = format_number(hit.follows);

            let description = truncate_chars(&hit.description.replace('\n', " "), 70);

            let content = Line::from(vec![
                Span::styled(
                    format!("{:3}. ", idx + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    &hit.title,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" by "),
                Span::styled(&hit.author, Style::default().fg(Color::Green)),
                Span::raw(format!(" ↓{} ♥{} ", downloads, follows)),
                Span::styled(description, Style::default().fg(Color::DarkGray)),
            ]);

            ListItem::new(content)
        })
        .collect();

    let list_title = if loading {
        "Results [Loading...]"
    } else if hits.is_empty() && !input.value().is_empty() {
        "Results [No mods found]"
    } else if hits.is_empty() {
        "Results [Press '/' to search]"
    } else {
        "Results"
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(list_title)
                .border_style(get_border_style(FocusedPane::Projects)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Split bottom panel into left and right sections
    let bottom_panel_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_project_panel(frame, bottom_panel_chunks[0], project, loading_versions);
    render_versions_panel(
        frame,
        bottom_panel_chunks[1],
        versions,
        version_list_state,
        loading_versions,
        complete_downloads,
        get_border_style(FocusedPane::Versions),
    );

    // Status bar with 2 lines: selection_info and status message
    let line1 = if !selection_info.is_empty() {
        selection_info.to_string()
    } else if let Some(hit) = list_state.selected().and_then(|i| hits.get(i)) {
        format!(
            "Selected: {} | URL: https://modrinth.com/mod/{}",
            hit.title, hit.slug
        )
    } else {
        String::new()
    };

    let line2 = if let Some(err) = error {
        format!("Error: {}", err)
    } else {
        status.to_string()
    };

    let status_text = if !line1.is_empty() {
        format!("{}\n{}", line1, line2)
    } else {
        line2
    };

    let status_widget = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(if error.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        })
        .wrap(Wrap { trim: true });

    frame.render_widget(status_widget, chunks[2]);
}

/// Left bottom panel: selected project's detail record
fn render_project_panel(
    frame: &mut Frame,
    area: Rect,
    project: &Option<Project>,
    loading: bool,
) {
    let title = if loading {
        "Mod Information [Loading...]"
    } else if project.is_none() {
        "Mod Information [Select a mod to view]"
    } else {
        "Mod Information"
    };

    let content = if let Some(project) = project {
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Title: ", Style::default().fg(Color::Yellow)),
                Span::raw(&project.title),
            ]),
            Line::from(vec![
                Span::styled("Slug: ", Style::default().fg(Color::Yellow)),
                Span::raw(&project.slug),
            ]),
            Line::from(vec![
                Span::styled("Downloads: ", Style::default().fg(Color::Yellow)),
                Span::raw(format_number(project.downloads)),
            ]),
        ];

        if !project.categories.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Categories: ", Style::default().fg(Color::Yellow)),
                Span::raw(project.categories.join(", ")),
            ]));
        }

        match &project.icon_url {
            Some(url) => lines.push(Line::from(vec![
                Span::styled("Icon: ", Style::default().fg(Color::Yellow)),
                Span::styled(url.as_str(), Style::default().fg(Color::Blue)),
            ])),
            None => lines.push(Line::from(vec![
                Span::styled("Icon: ", Style::default().fg(Color::Yellow)),
                Span::raw("not available"),
            ])),
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::raw(project.description.clone())));

        lines
    } else {
        vec![Line::from("No mod selected")]
    };

    let widget = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    frame.render_widget(widget, area);
}

/// Right bottom panel: version list for the selected project
fn render_versions_panel(
    frame: &mut Frame,
    area: Rect,
    versions: &[Version],
    version_list_state: &mut ListState,
    loading: bool,
    complete_downloads: &HashMap<String, DownloadMetadata>,
    border_style: Style,
) {
    let title = if loading {
        "Versions [Loading...]"
    } else if versions.is_empty() {
        "Versions [Select a mod to view]"
    } else {
        "Versions ('d' to download)"
    };

    let items: Vec<ListItem> = versions
        .iter()
        .map(|version| {
            let file = crate::api::select_primary_file(version);

            let downloaded = file
                .map(|f| complete_downloads.contains_key(&f.filename))
                .unwrap_or(false);
            let marker = if downloaded { "✓ " } else { "  " };

            let size_str = file
                .map(|f| format_size(f.size))
                .unwrap_or_else(|| "no files".to_string());

            let game_versions = if version.game_versions.is_empty() {
                String::new()
            } else {
                format!(" [{}]", version.game_versions.join(", "))
            };

            let content = Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Green)),
                Span::styled(
                    &version.version_number,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" - {}", version.name)),
                Span::styled(game_versions, Style::default().fg(Color::Yellow)),
                Span::raw(format!(" ({})", size_str)),
            ]);

            ListItem::new(content)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    frame.render_stateful_widget(list, area, version_list_state);
}

pub fn render_progress_bars(
    frame: &mut Frame,
    download_progress: &Option<DownloadProgress>,
    download_queue_size: usize,
    verification_progress: &[VerificationProgress],
    verification_queue_size: usize,
) {
    // Render download progress (top-right) if active
    if let Some(progress) = download_progress {
        render_download_progress(frame, progress, download_queue_size);
    }

    // Render verification progress (bottom-right) if active
    if !verification_progress.is_empty() || verification_queue_size > 0 {
        render_verification_progress(frame, verification_progress, verification_queue_size);
    }
}

/// Render download progress bar in top-right corner
fn render_download_progress(frame: &mut Frame, progress: &DownloadProgress, queue_size: usize) {
    let progress_area = Rect {
        x: frame.area().width.saturating_sub(52),
        y: 0,
        width: 52.min(frame.area().width),
        height: 3.min(frame.area().height),
    };

    frame.render_widget(Clear, progress_area);

    let percentage = if progress.total > 0 {
        (progress.downloaded as f64 / progress.total as f64 * 100.0) as u16
    } else {
        0
    };

    let title = if queue_size > 0 {
        format!("Downloading ({} queued)", queue_size)
    } else {
        "Downloading".to_string()
    };

    let label = if progress.speed_mbps > 0.0 {
        format!("{}% - {:.2} MB/s", percentage, progress.speed_mbps)
    } else {
        format!("{}%", percentage)
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(percentage.min(100))
        .label(label);

    frame.render_widget(gauge, progress_area);
}

/// Render verification progress bar in bottom-right corner
fn render_verification_progress(
    frame: &mut Frame,
    verifications: &[VerificationProgress],
    queue_size: usize,
) {
    if verifications.is_empty() && queue_size == 0 {
        return;
    }

    // Each verification gets 3 lines inside the container
    let height = 3 + (verifications.len() as u16 * 3);

    let area = Rect {
        x: frame.area().width.saturating_sub(52),
        y: frame
            .area()
            .height
            .saturating_sub(height.min(frame.area().height)),
        width: 52.min(frame.area().width),
        height: height.min(frame.area().height),
    };

    frame.render_widget(Clear, area);

    let title = if queue_size > 0 {
        format!("Verifying ({} queued)", queue_size)
    } else {
        "Verifying".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    for (i, ver) in verifications.iter().enumerate() {
        let ver_area = Rect {
            x: inner.x,
            y: inner.y + (i as u16 * 3),
            width: inner.width,
            height: 3.min(inner.height.saturating_sub(i as u16 * 3)),
        };

        if ver_area.height == 0 {
            break; // No more room
        }

        let percentage = if ver.total_bytes > 0 {
            (ver.verified_bytes as f64 / ver.total_bytes as f64 * 100.0) as u16
        } else {
            0
        };

        // Truncate filename to fit the gauge title
        let display_name = truncate_chars(&ver.filename, 35);

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(display_name))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(percentage.min(100))
            .label(format!("{}%", percentage));

        frame.render_widget(gauge, ver_area);
    }
}

/// Render search popup dialog
pub fn render_search_popup(frame: &mut Frame, input: &Input) {
    let popup_width = 60.min(frame.area().width.saturating_sub(4));
    let popup_height = 8;
    let popup_x = (frame.area().width.saturating_sub(popup_width)) / 2;
    let popup_y = (frame.area().height.saturating_sub(popup_height)) / 2;
    let area = Rect {
        x: popup_x,
        y: popup_y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Search Modrinth Mods ")
        .style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input_area = Rect {
        x: inner.x + 2,
        y: inner.y + 1,
        width: inner.width - 4,
        height: 1,
    };

    let input_widget = Paragraph::new(input.value()).style(Style::default().fg(Color::Yellow));
    frame.render_widget(input_widget, input_area);

    // Show cursor
    frame.set_cursor_position((input_area.x + input.visual_cursor() as u16, input_area.y));

    // Help text
    let help = ["", "Enter mod name and press Enter to search", "ESC: Cancel"];

    for (i, line) in help.iter().enumerate() {
        let area = Rect {
            x: inner.x + 2,
            y: inner.y + 3 + i as u16,
            width: inner.width - 4,
            height: 1,
        };
        let widget = Paragraph::new(*line).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(widget, area);
    }
}

pub fn render_download_path_popup(frame: &mut Frame, download_path_input: &Input) {
    let popup_width = 60.min(frame.area().width.saturating_sub(4));
    let popup_height = 7;
    let popup_x = (frame.area().width.saturating_sub(popup_width)) / 2;
    let popup_y = (frame.area().height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: popup_x,
        y: popup_y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let popup_block = Block::default()
        .borders(Borders::ALL)
        .title("Download Mod")
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(popup_block, popup_area);

    let label_area = Rect {
        x: popup_area.x + 2,
        y: popup_area.y + 1,
        width: popup_area.width.saturating_sub(4),
        height: 1,
    };

    let label = Paragraph::new("Download path:").style(Style::default().fg(Color::White));
    frame.render_widget(label, label_area);

    let input_area = Rect {
        x: popup_area.x + 2,
        y: popup_area.y + 2,
        width: popup_area.width.saturating_sub(4),
        height: 1,
    };

    let width = input_area.width.max(3) as usize;
    let scroll = download_path_input.visual_scroll(width);

    let input_widget = Paragraph::new(download_path_input.value())
        .style(Style::default().fg(Color::Yellow))
        .scroll((0, scroll as u16));

    frame.render_widget(input_widget, input_area);

    frame.set_cursor_position((
        input_area.x + ((download_path_input.visual_cursor()).max(scroll) - scroll) as u16,
        input_area.y,
    ));

    let instructions_area = Rect {
        x: popup_area.x + 2,
        y: popup_area.y + 4,
        width: popup_area.width.saturating_sub(4),
        height: 1,
    };

    let instructions = Paragraph::new("Press Enter to confirm, ESC to cancel")
        .style(Style::default().fg(Color::DarkGray));

    frame.render_widget(instructions, instructions_area);
}

/// Render modal warning popup, the failure surface for all operations
pub fn render_error_popup(frame: &mut Frame, message: &str) {
    let popup_width = 60.min(frame.area().width.saturating_sub(4));
    let popup_height = 7;
    let popup_x = (frame.area().width.saturating_sub(popup_width)) / 2;
    let popup_y = (frame.area().height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: popup_x,
        y: popup_y,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let popup_block = Block::default()
        .borders(Borders::ALL)
        .title("Warning")
        .style(Style::default().fg(Color::Yellow).bg(Color::Black));

    let inner = popup_block.inner(popup_area);
    frame.render_widget(popup_block, popup_area);

    let message_area = Rect {
        x: inner.x + 1,
        y: inner.y + 1,
        width: inner.width.saturating_sub(2),
        height: inner.height.saturating_sub(2),
    };

    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press ESC or Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let widget = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(widget, message_area);
}
