use std::io;
use std::path::PathBuf;
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    style::{Color, Style, Modifier},
    text::{Line, Span},
    Frame,
};
use crossterm::{
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    execute,
};
use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::models::{size_failure_summary, SizeResult, WorkspaceInfo};
use crate::operations::{CleanupOperation, DeleteMode};
use crate::scanner::{resolve_workspaces, SizeCalculator};
use crate::tui::events::{Event, EventHandler, keys};
use crate::tui::screens::MainScreen;
use crate::tui::session::{Session, WorkspaceSize};
use crate::utils::format_size_with_unit;

/// 应用程序状态
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    /// 正在读取 workspaceStorage
    Loading,

    /// 显示条目列表
    WorkspaceList,

    /// 显示条目详情
    WorkspaceDetail,

    /// 显示帮助信息
    Help,

    /// 删除确认对话框
    ConfirmDelete,

    /// 错误状态
    Error(String),

    /// 退出中
    Quitting,
}

/// 主应用程序
pub struct App {
    /// 应用配置
    config: Config,

    /// 当前状态
    state: AppState,

    /// 会话状态
    session: Session,

    /// 当前光标所在行
    cursor: usize,

    /// 状态消息
    status_message: String,

    /// 大小计算器
    calculator: SizeCalculator,

    /// 事件处理器
    event_handler: EventHandler,

    /// 主屏幕
    main_screen: MainScreen,
}

impl App {
    /// 创建新的应用程序
    pub fn new(config: Config, storage_root: PathBuf) -> Self {
        let calculator = SizeCalculator::with_concurrency(config.size.max_concurrent_stats);
        let main_screen = MainScreen::new(config.display.size_unit);

        Self {
            config,
            state: AppState::Loading,
            session: Session::new(storage_root),
            cursor: 0,
            status_message: "正在启动...".to_string(),
            calculator,
            event_handler: EventHandler::new(),
            main_screen,
        }
    }

    /// 运行应用程序
    pub async fn run(&mut self) -> Result<()> {
        // 设置终端
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // 启动事件处理
        self.event_handler.start();

        // 开始读取条目
        self.refresh();

        // 主事件循环
        let result = self.main_loop(&mut terminal).await;

        // 恢复终端
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// 主事件循环
    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            // 绘制界面
            terminal.draw(|f| self.draw(f))?;

            let event = self.event_handler.next().await?;
            self.handle_event(event);

            if self.state == AppState::Quitting {
                break;
            }
        }

        Ok(())
    }

    /// 处理单个事件
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if keys::is_quit_key(&key) && self.state != AppState::ConfirmDelete {
                    self.state = AppState::Quitting;
                    return;
                }

                self.handle_key_event(key);
            }
            Event::Resize(_, _) => {
                // 终端大小调整会自动处理
            }
            Event::WorkspacesLoaded(workspaces) => {
                self.session.replace_workspaces(workspaces);
                self.cursor = self.cursor.min(self.session.len().saturating_sub(1));
                if !matches!(self.state, AppState::Help | AppState::ConfirmDelete) {
                    self.state = AppState::WorkspaceList;
                }
                self.status_message = format!("共 {} 个缓存条目", self.session.len());
            }
            Event::LoadFailed(error) => {
                self.state = AppState::Error(error);
                self.status_message = "无法读取 workspaceStorage，按 r 重试".to_string();
            }
            Event::StorageSizeReady { name, size } => {
                self.session.set_storage_size(&name, size);
            }
            Event::WorkspaceSizeReady { name, size } => {
                self.session.set_workspace_size(&name, WorkspaceSize::Total(size));
            }
            Event::WorkspaceFolderSizesReady { name, sizes } => {
                self.session.set_workspace_size(&name, WorkspaceSize::Folders(sizes));
            }
            Event::DeleteFinished(report) => {
                self.status_message = match report.failure_summary() {
                    Some(summary) => format!(
                        "已删除 {} 个条目，{} 个失败: {}",
                        report.deleted.len(),
                        report.failures.len(),
                        summary.replace('\n', "; ")
                    ),
                    None => format!("已删除 {} 个条目", report.deleted.len()),
                };
                self.refresh();
            }
            Event::Status(message) => {
                self.status_message = message;
            }
            Event::Tick => {}
        }
    }

    /// 处理键盘事件
    fn handle_key_event(&mut self, key: crossterm::event::KeyEvent) {
        match self.state {
            AppState::WorkspaceList => self.handle_list_keys(key),
            AppState::WorkspaceDetail => {
                let back = matches!(key.code, crossterm::event::KeyCode::Backspace);
                if keys::is_enter_key(&key) || back {
                    self.state = AppState::WorkspaceList;
                } else {
                    self.handle_size_keys(key);
                }
            }
            AppState::Help => {
                if keys::is_enter_key(&key) || keys::is_help_key(&key) {
                    self.state = AppState::WorkspaceList;
                }
            }
            AppState::ConfirmDelete => self.handle_confirm_dialog_keys(key),
            AppState::Error(_) => {
                if keys::is_refresh_key(&key) {
                    self.refresh();
                }
            }
            _ => {}
        }
    }

    /// 处理列表键盘事件
    fn handle_list_keys(&mut self, key: crossterm::event::KeyEvent) {
        let current_name = self.session.get(self.cursor).map(|w| w.name.clone());

        if keys::is_up_key(&key) && self.cursor > 0 {
            self.cursor -= 1;
        } else if keys::is_down_key(&key) && self.cursor < self.session.len().saturating_sub(1) {
            self.cursor += 1;
        } else if keys::is_enter_key(&key) {
            if current_name.is_some() {
                self.state = AppState::WorkspaceDetail;
            }
        } else if keys::is_toggle_key(&key) {
            if let Some(name) = current_name {
                self.session.toggle(&name);
                if self.cursor < self.session.len().saturating_sub(1) {
                    self.cursor += 1;
                }
            }
        } else if keys::is_select_all_key(&key) {
            self.session.toggle_all();
        } else if keys::is_select_missing_key(&key) {
            let added = self.session.select_where(WorkspaceInfo::is_missing);
            self.status_message = format!("已选择 {} 个目标不存在的条目", added);
        } else if keys::is_select_remote_key(&key) {
            let added = self.session.select_where(WorkspaceInfo::is_remote);
            self.status_message = format!("已选择 {} 个远程条目", added);
        } else if keys::is_select_broken_key(&key) {
            let added = self.session.select_where(WorkspaceInfo::is_broken);
            self.status_message = format!("已选择 {} 个损坏的条目", added);
        } else if keys::is_invert_key(&key) {
            self.session.invert_selection();
        } else if keys::is_refresh_key(&key) {
            self.refresh();
        } else if keys::is_help_key(&key) {
            self.state = AppState::Help;
        } else if keys::is_delete_key(&key) {
            if self.session.selected_count() == 0 {
                if let Some(name) = current_name {
                    self.session.toggle(&name);
                }
            }
            if self.session.selected_count() > 0 {
                self.state = AppState::ConfirmDelete;
            }
        } else {
            self.handle_size_keys(key);
        }
    }

    /// 处理大小计算快捷键
    fn handle_size_keys(&mut self, key: crossterm::event::KeyEvent) {
        if keys::is_storage_size_key(&key) {
            if let Some(info) = self.session.get(self.cursor).cloned() {
                self.request_storage_sizes(vec![info]);
            }
        } else if keys::is_workspace_size_key(&key) {
            if let Some(info) = self.session.get(self.cursor).cloned() {
                self.request_workspace_sizes(vec![info]);
            }
        } else if keys::is_all_storage_sizes_key(&key) {
            self.request_storage_sizes(self.session.workspaces().to_vec());
        } else if keys::is_all_workspace_sizes_key(&key) {
            self.request_workspace_sizes(self.session.workspaces().to_vec());
        }
    }

    /// 处理确认对话框键盘事件
    fn handle_confirm_dialog_keys(&mut self, key: crossterm::event::KeyEvent) {
        match key.code {
            crossterm::event::KeyCode::Char('y') | crossterm::event::KeyCode::Char('Y') => {
                self.delete_selected();
                self.state = AppState::WorkspaceList;
            }
            _ => {
                self.state = AppState::WorkspaceList;
                self.status_message = "操作已取消".to_string();
            }
        }
    }

    /// 重新读取 workspaceStorage
    fn refresh(&mut self) {
        if self.session.is_empty() {
            self.state = AppState::Loading;
        }
        self.status_message = "正在读取 workspaceStorage...".to_string();

        let storage_root = self.session.storage_root().to_path_buf();
        let sender = self.event_handler.sender.clone();

        tokio::spawn(async move {
            let event = match resolve_workspaces(&storage_root).await {
                Ok(workspaces) => Event::WorkspacesLoaded(workspaces),
                Err(e) => Event::LoadFailed(format!("{:#}", e)),
            };
            let _ = sender.send(event);
        });
    }

    /// 在后台依次计算缓存目录大小
    fn request_storage_sizes(&mut self, workspaces: Vec<WorkspaceInfo>) {
        for info in &workspaces {
            self.session.mark_storage_pending(&info.name);
        }

        let storage_root = self.session.storage_root().to_path_buf();
        let calculator = self.calculator.clone();
        let sender = self.event_handler.sender.clone();

        tokio::spawn(async move {
            let mut failed = Vec::new();
            for info in workspaces {
                let result = calculator.storage_size(&storage_root, &info).await;
                if !result.failures().is_empty() {
                    failed.push(result.clone());
                }
                if send_size_result(&sender, result, false).is_err() {
                    return;
                }
            }
            send_size_failures(&sender, &failed);
        });
    }

    /// 在后台依次计算工作区大小，远程和损坏的条目被跳过
    fn request_workspace_sizes(&mut self, workspaces: Vec<WorkspaceInfo>) {
        let workspaces: Vec<WorkspaceInfo> = workspaces
            .into_iter()
            .filter(|info| info.local_path().is_some() && !info.is_missing())
            .collect();

        if workspaces.is_empty() {
            self.status_message = "没有可以计算大小的本地工作区".to_string();
            return;
        }

        for info in &workspaces {
            self.session.mark_workspace_pending(&info.name);
        }

        let calculator = self.calculator.clone();
        let sender = self.event_handler.sender.clone();

        tokio::spawn(async move {
            let mut failed = Vec::new();
            for info in workspaces {
                if let Some(result) = calculator.workspace_size(&info).await {
                    if !result.failures().is_empty() {
                        failed.push(result.clone());
                    }
                    if send_size_result(&sender, result, true).is_err() {
                        return;
                    }
                }
            }
            send_size_failures(&sender, &failed);
        });
    }

    /// 删除已勾选的条目
    fn delete_selected(&mut self) {
        let names = self.session.selected_names();
        if names.is_empty() {
            return;
        }

        let mode = if self.config.delete.use_trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Permanent
        };
        let operation = CleanupOperation::new(self.session.storage_root(), mode);
        let sender = self.event_handler.sender.clone();

        self.status_message = format!("正在删除 {} 个条目...", names.len());

        tokio::spawn(async move {
            let report = operation.delete_entries(&names).await;
            let _ = sender.send(Event::DeleteFinished(report));
        });
    }

    /// 绘制界面
    fn draw(&mut self, f: &mut Frame) {
        let size = f.area();
        let content_area = Rect {
            height: size.height.saturating_sub(1),
            ..size
        };

        match &self.state {
            AppState::Loading => {
                self.draw_loading_screen(f, content_area);
            }
            AppState::WorkspaceList => {
                self.main_screen.draw_workspace_list(f, content_area, &self.session, self.cursor);
            }
            AppState::WorkspaceDetail => {
                if let Some(info) = self.session.get(self.cursor) {
                    self.main_screen.draw_workspace_detail(f, content_area, &self.session, info);
                }
            }
            AppState::Help => {
                self.draw_help_screen(f, content_area);
            }
            AppState::ConfirmDelete => {
                self.main_screen.draw_workspace_list(f, content_area, &self.session, self.cursor);
                self.draw_confirm_dialog(f, content_area);
            }
            AppState::Error(error) => {
                self.draw_error_screen(f, content_area, error);
            }
            AppState::Quitting => {}
        }

        // 绘制状态栏
        self.draw_status_bar(f, size);
    }

    /// 绘制加载屏幕
    fn draw_loading_screen(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("workspaceStorage 清理")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan));

        let paragraph = Paragraph::new(format!(
            "正在读取 {} ...",
            self.session.storage_root().display()
        ))
        .block(block)
        .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }

    /// 绘制帮助屏幕
    fn draw_help_screen(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("帮助信息")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Green));

        let help_text = vec![
            Line::from(vec![
                Span::styled("快捷键:", Style::default().add_modifier(Modifier::BOLD))
            ]),
            Line::from(""),
            Line::from("  q, Esc, Ctrl+C  - 退出应用程序"),
            Line::from("  r, F5           - 重新读取条目列表"),
            Line::from("  h, ?, F1        - 显示帮助信息"),
            Line::from(""),
            Line::from("  ↑/↓, k/j        - 移动光标"),
            Line::from("  Space           - 勾选 / 取消勾选"),
            Line::from("  a               - 全选 / 全不选"),
            Line::from("  m               - 选择目标已不存在的条目"),
            Line::from("  o               - 选择远程条目"),
            Line::from("  b               - 选择损坏的条目"),
            Line::from("  v               - 反选"),
            Line::from("  d, Delete       - 删除已勾选的条目"),
            Line::from(""),
            Line::from("  Enter           - 查看条目详情"),
            Line::from("  s / S           - 计算当前 / 所有条目的缓存大小"),
            Line::from("  w / W           - 计算当前 / 所有条目的工作区大小"),
            Line::from(""),
            Line::from("按 Enter 或 h 返回列表"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(block)
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }

    /// 绘制确认对话框
    fn draw_confirm_dialog(&self, f: &mut Frame, area: Rect) {
        let popup_area = self.centered_rect(50, 20, area);

        f.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("确认操作")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red));

        let text = vec![
            Line::from(""),
            Line::from(format!("确认删除选中的 {} 个缓存条目？", self.session.selected_count())),
            Line::from(""),
            Line::from("按 'y' 确认，按任意键取消"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, popup_area);
    }

    /// 绘制错误屏幕
    fn draw_error_screen(&self, f: &mut Frame, area: Rect, error: &str) {
        let block = Block::default()
            .title("错误")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Red));

        let paragraph = Paragraph::new(error.to_string())
            .block(block)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false });

        f.render_widget(paragraph, area);
    }

    /// 绘制状态栏
    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };

        let status_text = match self.state {
            AppState::WorkspaceList | AppState::WorkspaceDetail => {
                format!("{} | 已选择: {}/{} | 已知缓存大小: {}",
                    self.status_message,
                    self.session.selected_count(),
                    self.session.len(),
                    format_size_with_unit(
                        self.session.known_storage_total(),
                        self.config.display.size_unit
                    )
                )
            }
            _ => self.status_message.clone(),
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White));

        f.render_widget(status, status_area);
    }

    /// 计算居中的矩形区域
    fn centered_rect(&self, percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

/// 把大小计算结果转换为界面事件
fn send_size_result(
    sender: &mpsc::UnboundedSender<Event>,
    result: SizeResult,
    workspace: bool,
) -> Result<(), mpsc::error::SendError<Event>> {
    let event = match result {
        SizeResult::Total { name, size, .. } if workspace => {
            Event::WorkspaceSizeReady { name, size }
        }
        SizeResult::Total { name, size, .. } => Event::StorageSizeReady { name, size },
        SizeResult::Breakdown { name, entries, .. } => {
            Event::WorkspaceFolderSizesReady { name, sizes: entries }
        }
    };
    sender.send(event)
}

/// 一批大小计算结束后，把所有错误合并成一条状态消息
fn send_size_failures(sender: &mpsc::UnboundedSender<Event>, failed: &[SizeResult]) {
    if let Some(summary) = size_failure_status(failed) {
        let _ = sender.send(Event::Status(summary));
    }
}

/// 状态栏只有一行，多条错误用分号连接
fn size_failure_status(failed: &[SizeResult]) -> Option<String> {
    let count: usize = failed.iter().map(|result| result.failures().len()).sum();
    size_failure_summary(failed)
        .map(|summary| format!("计算大小时出现 {} 个错误: {}", count, summary.replace('\n', "; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_failed_size_walk_becomes_status_message() {
        let storage = tempdir().unwrap();
        std::fs::create_dir(storage.path().join("kept")).unwrap();
        let calculator = SizeCalculator::new();

        let kept = calculator
            .storage_size(storage.path(), &WorkspaceInfo::error("kept", "x"))
            .await;
        let vanished = calculator
            .storage_size(storage.path(), &WorkspaceInfo::error("vanished", "x"))
            .await;

        assert_eq!(size_failure_status(&[kept.clone()]), None);

        let status = size_failure_status(&[kept, vanished]).unwrap();
        assert!(status.starts_with("计算大小时出现 1 个错误"));
        assert!(status.contains("vanished: "));
        assert!(!status.contains('\n'));
    }

    #[tokio::test]
    async fn test_status_event_reaches_the_channel() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let failed = vec![SizeResult::Total {
            name: "gone".to_string(),
            size: 0,
            failures: vec!["读取 '/s/gone' 时出错".to_string()],
        }];

        send_size_failures(&sender, &failed);
        send_size_failures(&sender, &[]);
        drop(sender);

        match receiver.recv().await {
            Some(Event::Status(message)) => assert!(message.contains("gone")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(receiver.recv().await.is_none());
    }
}
