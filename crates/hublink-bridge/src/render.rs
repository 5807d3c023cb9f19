//! Notification text rendering for command results and the help reference.

use chrono::DateTime;
use hublink_github::{GithubIssue, GithubRepo};

pub fn help_text() -> String {
    [
        "```",
        "1. Fetch user repositories - /github user USERNAME [PAGE]",
        "2. Fetch one issue         - /github issue OWNER REPO ISSUE_NO",
        "3. Fetch open issues       - /github issue OWNER REPO [PAGE]",
        "4. Connect a repository    - /github connect REPO_URL",
        "5. Disconnect a repository - /github disconnect REPO_URL",
        "6. Set access token        - /github set-token ACCESS_TOKEN",
        "7. Subscribe to events     - /github subscribe EVENT [EVENT...]",
        "8. Create an issue         - /github create OWNER REPO",
        "9. Next page of last fetch - /github / PAGE",
        "```",
    ]
    .join("\n")
}

pub fn render_repo_line(repo: &GithubRepo) -> String {
    format!("[{}]({})", repo.full_name, repo.html_url)
}

/// One listing line: number, title, state, author, link.
pub fn render_issue_summary(issue: &GithubIssue) -> String {
    format!(
        "#{} {} ({}) by {} — {}",
        issue.number, issue.title, issue.state, issue.user.login, issue.html_url
    )
}

/// Full single-issue rendering: number, author, state, timestamps, links.
pub fn render_issue_detail(issue: &GithubIssue) -> String {
    [
        format!("**#{} {}**", issue.number, issue.title),
        format!(
            "opened by [{}]({}) — {} — created {}",
            issue.user.login,
            issue.user.html_url,
            issue.state,
            format_created_at(&issue.created_at)
        ),
        issue.html_url.clone(),
        issue.body.clone().unwrap_or_default(),
    ]
    .join("\n")
    .trim_end()
    .to_string()
}

fn format_created_at(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => raw.to_string(),
    }
}
