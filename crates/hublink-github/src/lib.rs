//! GitHub REST surface consumed by the Hublink bridge.
//!
//! Provides the authenticated API client (repositories, issues, hook
//! registration), repository web-URL parsing, and issue-body image
//! extraction used for attachment rendering.

pub mod github_client;
pub mod github_types;
pub mod issue_images;
pub mod repo_url;

pub use github_client::{GithubApiClient, GITHUB_API_BASE, GITHUB_PAGE_SIZE};
pub use github_types::{GithubHook, GithubIssue, GithubIssueAuthor, GithubRepo};
pub use issue_images::extract_image_urls;
pub use repo_url::{parse_repo_slug, RepoSlug};
