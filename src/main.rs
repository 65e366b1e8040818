mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::Level;

use cli::{Cli, Commands, ConfigAction, OutputFormat};
use workspace_storage_cleanup::config::Config;
use workspace_storage_cleanup::operations::{Selection, WorkspaceManager};
use workspace_storage_cleanup::tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // TUI 模式下日志会破坏界面，只在 --verbose 时输出
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    if cli.verbose || !matches!(command, Commands::Tui) {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
    }

    // 加载配置
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_file(config_path)?
    } else {
        Config::load_or_create_default()?
    };

    // 根据命令执行相应操作
    match command {
        Commands::Tui => {
            let manager = WorkspaceManager::from_config(&config, cli.root)?;
            let storage_root = manager.storage_root().to_path_buf();

            let mut app = App::new(config, storage_root);
            app.run().await?;
        }
        Commands::List { format, sizes } => {
            let manager = WorkspaceManager::from_config(&config, cli.root)?;
            manager.list(matches!(format, OutputFormat::Json), sizes).await?;
        }
        Commands::Size { names, all } => {
            if names.is_empty() && !all {
                bail!("请指定缓存条目名称或使用 --all");
            }
            let manager = WorkspaceManager::from_config(&config, cli.root)?;
            manager.sizes(&names, all).await?;
        }
        Commands::Delete { names, select, force } => {
            if names.is_empty() && select.is_empty() {
                bail!("请指定缓存条目名称或使用 --missing / --remote / --broken");
            }
            let manager = WorkspaceManager::from_config(&config, cli.root)?;
            let selection = Selection {
                missing: select.missing,
                remote: select.remote,
                broken: select.broken,
            };

            let report = manager.delete(&names, selection, force).await?;
            if let Some(summary) = report.failure_summary() {
                bail!("{} 个条目删除失败:\n{}", report.failures.len(), summary);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Path => {
                println!("{}", Config::default_config_path()?.display());
            }
            ConfigAction::Reset => {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::default_config_path()?,
                };
                Config::default().save_to_file(&path)?;
                println!("已重置配置: {}", path.display());
            }
        },
    }

    Ok(())
}
