//! Git status query functions
//!
//! Cleanliness, untracked files, the structured change list and branch
//! divergence. Everything here is read-only.

use std::path::Path;

use super::utils::*;

/// Collapse a porcelain XY pair into a single change kind
fn classify(x: char, y: char, orig_path: Option<&str>) -> ChangeKind {
    match (x, y) {
        ('?', '?') => ChangeKind::Untracked,
        ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D') => ChangeKind::Conflicted,
        _ => {
            let code = if x != ' ' { x } else { y };
            match code {
                'A' => ChangeKind::Added,
                'D' => ChangeKind::Deleted,
                'T' => ChangeKind::TypeChanged,
                'R' => ChangeKind::Renamed {
                    from: orig_path.unwrap_or_default().to_string(),
                },
                'C' => ChangeKind::Copied {
                    from: orig_path.unwrap_or_default().to_string(),
                },
                _ => ChangeKind::Modified,
            }
        }
    }
}

/// Parse git status --porcelain=v1 -z output
///
/// Format: `XY PATH\0`, or `XY PATH\0ORIG_PATH\0` for renames and copies
/// (with -z the destination comes first). Ignored entries (`!!`) are dropped.
pub(super) fn parse_porcelain_status(output: &str) -> Vec<ChangeEntry> {
    let mut items = Vec::new();
    let parts: Vec<&str> = output.split('\0').collect();

    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if part.len() < 4 {
            i += 1;
            continue;
        }

        let mut chars = part.chars();
        let x = chars.next().unwrap_or(' ');
        let y = chars.next().unwrap_or(' ');
        let path = part[3..].to_string();

        let is_copy_or_rename = matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C');
        let (orig_path, advance) =
            if is_copy_or_rename && i + 1 < parts.len() && !parts[i + 1].is_empty() {
                (Some(parts[i + 1]), 2)
            } else {
                (None, 1)
            };

        if x == '!' && y == '!' {
            i += advance;
            continue;
        }

        items.push(ChangeEntry {
            path,
            kind: classify(x, y, orig_path),
            staged: x != ' ' && x != '?',
        });
        i += advance;
    }

    items
}

/// Structured list of uncommitted changes, untracked files included
pub fn diff_summary(workspace_root: &Path) -> Result<Vec<ChangeEntry>, GitError> {
    ensure_repo(workspace_root)?;
    let args = ["status", "--porcelain=v1", "-z", "--untracked-files=all"];
    let output = run_git(workspace_root, &args)?;
    if !output.status.success() {
        return Err(command_failed(&args, &output));
    }
    Ok(parse_porcelain_status(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parse `git diff --name-status -z` output
///
/// Format: `STATUS\0PATH\0`, or `R<score>\0FROM\0TO\0` for renames and copies.
pub(super) fn parse_name_status(output: &str, staged: bool) -> Vec<ChangeEntry> {
    let mut items = Vec::new();
    let mut parts = output.split('\0').filter(|p| !p.is_empty());

    while let Some(status) = parts.next() {
        let code = status.chars().next().unwrap_or('M');
        let kind = match code {
            'R' | 'C' => {
                let (Some(from), Some(to)) = (parts.next(), parts.next()) else {
                    break;
                };
                let from = from.to_string();
                items.push(ChangeEntry {
                    path: to.to_string(),
                    kind: if code == 'R' {
                        ChangeKind::Renamed { from }
                    } else {
                        ChangeKind::Copied { from }
                    },
                    staged,
                });
                continue;
            }
            'A' => ChangeKind::Added,
            'D' => ChangeKind::Deleted,
            'T' => ChangeKind::TypeChanged,
            'U' => ChangeKind::Conflicted,
            _ => ChangeKind::Modified,
        };
        let Some(path) = parts.next() else {
            break;
        };
        items.push(ChangeEntry {
            path: path.to_string(),
            kind,
            staged,
        });
    }

    items
}

/// Structured changes for any [`DiffScope`]
pub fn diff_scoped(workspace_root: &Path, scope: &DiffScope) -> Result<Vec<ChangeEntry>, GitError> {
    ensure_repo(workspace_root)?;
    let range;
    let mut args = vec!["diff", "--name-status", "-z", "-M"];
    let staged = match scope {
        DiffScope::Uncommitted => return diff_summary(workspace_root),
        DiffScope::Staged => {
            args.push("--cached");
            true
        }
        DiffScope::Against { branch, staged } => {
            if *staged {
                args.push("--cached");
            }
            args.push(branch);
            *staged
        }
        DiffScope::Between { base, head } => {
            range = format!("{}...{}", base, head);
            args.push(&range);
            false
        }
    };
    args.push("--");

    let out = git_stdout(workspace_root, &args)?;
    Ok(parse_name_status(&out, staged))
}

/// Whether tracked files have no staged or unstaged modifications
///
/// Untracked files do not make the tree dirty; see [`untracked_files`].
pub fn is_clean(workspace_root: &Path) -> Result<bool, GitError> {
    ensure_repo(workspace_root)?;
    let status = git_checked(
        workspace_root,
        &["status", "--porcelain", "--untracked-files=no"],
    )?;
    Ok(status.is_empty())
}

/// Untracked, non-ignored files relative to the repository root
pub fn untracked_files(workspace_root: &Path) -> Result<Vec<String>, GitError> {
    ensure_repo(workspace_root)?;
    let out = git_stdout(
        workspace_root,
        &["ls-files", "--others", "--exclude-standard", "-z"],
    )?;
    Ok(nul_separated(&out))
}

/// Files changed on `source` since its merge base with HEAD
pub fn changed_files_since_merge_base(
    workspace_root: &Path,
    source: &str,
) -> Result<Vec<String>, GitError> {
    let range = format!("HEAD...{}", source);
    let out = git_stdout(workspace_root, &["diff", "--name-only", "-z", &range])?;
    Ok(nul_separated(&out))
}

/// Number of commits reachable from `rev`
pub fn commit_count(workspace_root: &Path, rev: &str) -> Result<u32, GitError> {
    ensure_repo(workspace_root)?;
    if !has_commits(workspace_root) {
        return Ok(0);
    }
    let out = git_checked(workspace_root, &["rev-list", "--count", rev])?;
    out.trim()
        .parse::<u32>()
        .map_err(|e| GitError::CommandFailed(format!("Unexpected rev-list output '{}': {}", out, e)))
}

/// Count commits HEAD has that `base` lacks and vice versa (no network access)
pub fn divergence_from(workspace_root: &Path, base: &str) -> Result<Divergence, GitError> {
    let range = format!("{}...HEAD", base);
    let out = git_checked(
        workspace_root,
        &["rev-list", "--left-right", "--count", &range],
    )?;
    parse_left_right_count(&out)
        .ok_or_else(|| GitError::CommandFailed(format!("Unexpected rev-list output '{}'", out)))
}

/// Parse `<behind>\t<ahead>` from `rev-list --left-right --count base...HEAD`
fn parse_left_right_count(output: &str) -> Option<Divergence> {
    let mut parts = output.split_whitespace();
    let behind = parts.next()?.parse().ok()?;
    let ahead = parts.next()?.parse().ok()?;
    Some(Divergence { ahead, behind })
}
