use crate::models::RemoteWorkspaceType;

/// 根据 URI scheme 和 authority 判断远程工作区类型
///
/// authority 只取第一个 `+` 之前的部分参与判断，无法识别时返回 `None`。
pub fn classify_remote(scheme: &str, authority: &str) -> Option<RemoteWorkspaceType> {
    let prefix = authority.split('+').next().unwrap_or_default();

    match (scheme, prefix) {
        ("vscode-remote", "codespaces") => Some(RemoteWorkspaceType::GithubCodespaces),
        ("vscode-remote", "dev-container") => Some(RemoteWorkspaceType::DevContainer),
        ("vscode-remote", "ssh" | "ssh-remote") => Some(RemoteWorkspaceType::Ssh),
        ("vscode-remote", "wsl") => Some(RemoteWorkspaceType::Wsl),
        ("vscode-vfs", "github") => Some(RemoteWorkspaceType::Github),
        _ => None,
    }
}
