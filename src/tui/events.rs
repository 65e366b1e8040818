use std::time::Duration;
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use anyhow::Result;
use tokio::sync::mpsc;

use crate::models::{FolderSize, WorkspaceInfo};
use crate::operations::CleanupReport;

/// 应用程序事件枚举
#[derive(Clone, Debug)]
pub enum Event {
    /// 键盘输入事件
    Key(KeyEvent),

    /// 终端大小调整事件
    Resize(u16, u16),

    /// 缓存条目列表整体替换
    WorkspacesLoaded(Vec<WorkspaceInfo>),

    /// workspaceStorage 目录无法读取
    LoadFailed(String),

    /// 单个条目的缓存大小
    StorageSizeReady { name: String, size: u64 },

    /// 单个条目的工作区文件夹大小
    WorkspaceSizeReady { name: String, size: u64 },

    /// 多根工作区逐个文件夹的大小
    WorkspaceFolderSizesReady {
        name: String,
        sizes: Vec<FolderSize>,
    },

    /// 批量删除完成
    DeleteFinished(CleanupReport),

    /// 状态消息
    Status(String),

    /// 定时刷新
    Tick,
}

/// 事件处理器 - 负责捕获和分发终端事件
pub struct EventHandler {
    /// 事件接收器
    receiver: mpsc::UnboundedReceiver<Event>,

    /// 事件发送器
    pub sender: mpsc::UnboundedSender<Event>,

    /// 事件处理任务句柄
    handler: Option<tokio::task::JoinHandle<()>>,
}

impl EventHandler {
    /// 创建新的事件处理器
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            handler: None,
        }
    }

    /// 启动事件监听
    pub fn start(&mut self) {
        let sender = self.sender.clone();

        self.handler = Some(tokio::spawn(async move {
            let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

            loop {
                tokio::select! {
                    // 处理定时器事件
                    _ = tick_interval.tick() => {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                    }

                    // 处理终端事件
                    result = tokio::task::spawn_blocking(|| {
                        event::poll(Duration::from_millis(16))
                    }) => {
                        if let Ok(Ok(true)) = result {
                            if let Ok(event) = event::read() {
                                let app_event = match event {
                                    event::Event::Key(key) if key.kind == KeyEventKind::Press => {
                                        Event::Key(key)
                                    }
                                    event::Event::Resize(w, h) => Event::Resize(w, h),
                                    _ => continue,
                                };

                                if sender.send(app_event).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }));
    }

    /// 接收下一个事件
    pub async fn next(&mut self) -> Result<Event> {
        self.receiver.recv().await
            .ok_or_else(|| anyhow::anyhow!("事件通道已关闭"))
    }

    /// 停止事件处理
    pub fn stop(&mut self) {
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 键盘快捷键辅助函数
pub mod keys {
    use super::*;

    /// 检查是否是退出键 (Ctrl+C, ESC, q)
    pub fn is_quit_key(key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => {
                key.modifiers.contains(KeyModifiers::CONTROL)
            }
            KeyCode::Esc => true,
            KeyCode::Char('q') | KeyCode::Char('Q') => true,
            _ => false,
        }
    }

    /// 检查是否是刷新键 (F5, r)
    pub fn is_refresh_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::F(5) | KeyCode::Char('r') | KeyCode::Char('R'))
    }

    /// 检查是否是向上导航键
    pub fn is_up_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    }

    /// 检查是否是向下导航键
    pub fn is_down_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    }

    /// 检查是否是确认键 (Enter)
    pub fn is_enter_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Enter)
    }

    /// 检查是否是勾选键 (Space)
    pub fn is_toggle_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char(' '))
    }

    /// 检查是否是删除键 (Delete, d)
    pub fn is_delete_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Delete | KeyCode::Char('d') | KeyCode::Char('D'))
    }

    /// 检查是否是帮助键 (h, ?, F1)
    pub fn is_help_key(key: &KeyEvent) -> bool {
        matches!(
            key.code,
            KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') | KeyCode::F(1)
        )
    }

    /// 全选 / 全不选 (a)
    pub fn is_select_all_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('a') | KeyCode::Char('A'))
    }

    /// 选择目标已不存在的条目 (m)
    pub fn is_select_missing_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('m') | KeyCode::Char('M'))
    }

    /// 选择远程条目 (o)
    pub fn is_select_remote_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('o') | KeyCode::Char('O'))
    }

    /// 选择损坏的条目 (b)
    pub fn is_select_broken_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('b') | KeyCode::Char('B'))
    }

    /// 反选 (v)
    pub fn is_invert_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('v') | KeyCode::Char('V'))
    }

    /// 计算当前条目的缓存大小 (s)
    pub fn is_storage_size_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('s'))
    }

    /// 计算所有条目的缓存大小 (S)
    pub fn is_all_storage_sizes_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('S'))
    }

    /// 计算当前条目的工作区大小 (w)
    pub fn is_workspace_size_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('w'))
    }

    /// 计算所有条目的工作区大小 (W)
    pub fn is_all_workspace_sizes_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('W'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_quit_keys() {
        assert!(keys::is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(keys::is_quit_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(keys::is_quit_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(!keys::is_quit_key(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_navigation_keys() {
        assert!(keys::is_up_key(&KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)));
        assert!(keys::is_up_key(&KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE)));
        assert!(keys::is_down_key(&KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));
        assert!(keys::is_down_key(&KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_size_keys_are_case_sensitive() {
        let lower = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        let upper = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);

        assert!(keys::is_storage_size_key(&lower));
        assert!(!keys::is_all_storage_sizes_key(&lower));
        assert!(keys::is_all_storage_sizes_key(&upper));
        assert!(!keys::is_storage_size_key(&upper));
    }
}
