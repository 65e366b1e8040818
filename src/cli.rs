use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "workspace-storage-cleanup")]
#[command(about = "查看并清理 VS Code workspaceStorage 中的缓存条目")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// workspaceStorage 目录 (覆盖配置)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 启动交互式 TUI 界面 (默认)
    Tui,

    /// 列出所有缓存条目
    List {
        /// 输出格式
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// 同时计算每个条目的缓存大小
        #[arg(short, long)]
        sizes: bool,
    },

    /// 计算缓存条目及其工作区的大小
    Size {
        /// 缓存条目名称
        names: Vec<String>,

        /// 计算所有条目
        #[arg(short, long, conflicts_with = "names")]
        all: bool,
    },

    /// 删除缓存条目
    Delete {
        /// 缓存条目名称
        names: Vec<String>,

        #[command(flatten)]
        select: DeleteSelection,

        /// 强制删除，不询问确认
        #[arg(short, long)]
        force: bool,
    },

    /// 管理配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// 按类别批量选择要删除的条目
#[derive(Args, Clone, Copy, Default)]
pub struct DeleteSelection {
    /// 选择目标文件夹或工作区文件已不存在的条目
    #[arg(long)]
    pub missing: bool,

    /// 选择远程工作区条目
    #[arg(long)]
    pub remote: bool,

    /// 选择无法解析的条目
    #[arg(long)]
    pub broken: bool,
}

impl DeleteSelection {
    pub fn is_empty(&self) -> bool {
        !(self.missing || self.remote || self.broken)
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// 显示当前配置
    Show,

    /// 显示配置文件路径
    Path,

    /// 重置为默认配置
    Reset,
}

#[derive(clap::ValueEnum, Clone, Copy)]
pub enum OutputFormat {
    /// 表格格式
    Table,
    /// JSON 格式
    Json,
}
