use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::config::SizeUnit;
use crate::models::{FolderSize, WorkspaceFolderEntry, WorkspaceInfo, WorkspaceTarget};
use crate::operations::workspace_manager::broken_member_count;
use crate::tui::session::{Session, WorkspaceSize};
use crate::utils::format_size_with_unit;

/// 主屏幕组件 - 负责绘制缓存条目列表和详情页面
pub struct MainScreen {
    /// 表格状态
    table_state: TableState,

    /// 大小显示单位
    size_unit: SizeUnit,
}

impl MainScreen {
    /// 创建新的主屏幕
    pub fn new(size_unit: SizeUnit) -> Self {
        Self {
            table_state: TableState::default(),
            size_unit,
        }
    }

    /// 绘制缓存条目列表
    pub fn draw_workspace_list(
        &mut self,
        f: &mut Frame,
        area: Rect,
        session: &Session,
        cursor: usize,
    ) {
        if session.is_empty() {
            let empty_message = Paragraph::new("workspaceStorage 中没有缓存条目\n\n按 'r' 刷新")
                .block(Block::default().title("缓存条目").borders(Borders::ALL))
                .style(Style::default().fg(Color::Gray));

            f.render_widget(empty_message, area);
            return;
        }

        let header = Row::new(vec!["", "名称", "缓存大小", "工作区大小", "类型", "路径 / 说明"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = session
            .workspaces()
            .iter()
            .map(|info| {
                let checkbox = if session.is_selected(&info.name) { "[x]" } else { "[ ]" };

                let storage_size = if session.is_storage_pending(&info.name) {
                    "计算中...".to_string()
                } else {
                    session
                        .storage_size(&info.name)
                        .map(|size| format_size_with_unit(size, self.size_unit))
                        .unwrap_or_default()
                };

                let workspace_size = if session.is_workspace_pending(&info.name) {
                    "计算中...".to_string()
                } else {
                    session
                        .workspace_size(&info.name)
                        .map(|size| format_size_with_unit(size.total(), self.size_unit))
                        .unwrap_or_default()
                };

                Row::new(vec![
                    Cell::from(checkbox),
                    Cell::from(info.name.clone()),
                    Cell::from(storage_size),
                    Cell::from(workspace_size),
                    Cell::from(info.type_display_name()),
                    Cell::from(path_line(info)),
                ])
            })
            .collect();

        self.table_state.select(Some(cursor));

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(34),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(14),
                Constraint::Min(20),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(format!(
                    "缓存条目 ({} 个) - {}",
                    session.len(),
                    session.storage_root().display()
                ))
                .borders(Borders::ALL),
        )
        .row_highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    /// 绘制条目详情页面
    pub fn draw_workspace_detail(
        &self,
        f: &mut Frame,
        area: Rect,
        session: &Session,
        info: &WorkspaceInfo,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),     // 详情内容
                Constraint::Length(3),  // 操作提示
            ])
            .split(area);

        let mut lines = vec![
            field_line("名称", info.name.clone()),
            field_line("类型", info.type_display_name().to_string()),
            field_line(
                "缓存目录",
                session.storage_root().join(&info.name).display().to_string(),
            ),
        ];

        if let Some(size) = session.storage_size(&info.name) {
            lines.push(field_line("缓存大小", format_size_with_unit(size, self.size_unit)));
        }

        match &info.target {
            WorkspaceTarget::Folder { folder } => {
                lines.push(field_line("文件夹", folder.path.display().to_string()));
                lines.push(field_line("存在", yes_no(folder.exists)));
                if let Some(size) = session.workspace_size(&info.name) {
                    let size = format_size_with_unit(size.total(), self.size_unit);
                    lines.push(field_line("文件夹大小", size));
                }
            }
            WorkspaceTarget::Workspace { workspace } => {
                lines.push(field_line("工作区文件", workspace.path.display().to_string()));
                lines.push(field_line("存在", yes_no(workspace.exists)));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("成员文件夹 ({} 个):", workspace.folders.len()),
                    Style::default().add_modifier(Modifier::BOLD),
                )));

                let folder_sizes: &[FolderSize] = match session.workspace_size(&info.name) {
                    Some(WorkspaceSize::Folders(sizes)) => sizes.as_slice(),
                    _ => &[],
                };

                for entry in &workspace.folders {
                    lines.push(match entry {
                        WorkspaceFolderEntry::Folder(folder) => {
                            let size = folder_sizes
                                .iter()
                                .find(|s| s.path == folder.path)
                                .map(|s| {
                                    format!("  {}", format_size_with_unit(s.size, self.size_unit))
                                })
                                .unwrap_or_default();
                            let marker = if folder.exists { "" } else { " ❌" };
                            Line::from(format!("  {}{}{}", folder.path.display(), marker, size))
                        }
                        WorkspaceFolderEntry::Error { error } => Line::from(Span::styled(
                            format!("  {}", error),
                            Style::default().fg(Color::Red),
                        )),
                    });
                }
            }
            WorkspaceTarget::Remote { remote } => {
                lines.push(field_line("远程类型", remote.kind.as_str().to_string()));
                lines.push(field_line("Authority", remote.authority.clone()));
                lines.push(field_line("远程路径", remote.path.clone()));
            }
            WorkspaceTarget::Error { error } => {
                lines.push(Line::from(""));
                let style = Style::default().fg(Color::Red);
                lines.push(Line::from(Span::styled(error.clone(), style)));
            }
        }

        let detail = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(format!("条目详情: {}", info.name))
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            )
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false });

        f.render_widget(detail, chunks[0]);

        let help_text = vec![Line::from(vec![
            Span::raw("按 "),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" 或 "),
            Span::styled("Backspace", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" 返回列表，"),
            Span::styled("s / w", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" 计算大小"),
        ])];

        let help_paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .title("操作")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Green)),
            );

        f.render_widget(help_paragraph, chunks[1]);
    }
}

/// 列表中“路径 / 说明”一列的内容
fn path_line(info: &WorkspaceInfo) -> Line<'static> {
    let path = info.display_path().into_owned();

    match &info.target {
        WorkspaceTarget::Error { .. } => {
            Line::from(Span::styled(path, Style::default().fg(Color::Red)))
        }
        WorkspaceTarget::Remote { remote } => Line::from(vec![
            Span::styled(format!("{} ", remote.authority), Style::default().fg(Color::Magenta)),
            Span::raw(path),
        ]),
        _ => {
            let mut spans = vec![Span::raw(path)];
            if info.is_missing() {
                spans.push(Span::styled(" ❌", Style::default().fg(Color::Red)));
            }
            let broken = broken_member_count(info);
            if broken > 0 {
                spans.push(Span::styled(
                    format!(" [{} 个成员无法解析]", broken),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Line::from(spans)
        }
    }
}

fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn yes_no(value: bool) -> String {
    if value { "是" } else { "否" }.to_string()
}
