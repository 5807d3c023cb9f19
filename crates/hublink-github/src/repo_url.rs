//! Repository web-URL parsing for the `connect` command.

const GITHUB_WEB_HOST: &str = "https://github.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Extracts exactly the `owner/repo` segment from a github.com web URL,
/// discarding anything after the second path separator. Any other host or a
/// path without both segments is rejected.
pub fn parse_repo_slug(repo_url: &str) -> Option<RepoSlug> {
    let path = repo_url.trim().strip_prefix(GITHUB_WEB_HOST)?;
    let mut segments = path.split('/');
    let owner = segments.next().filter(|segment| !segment.is_empty())?;
    let name = segments.next().filter(|segment| !segment.is_empty())?;
    Some(RepoSlug {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::parse_repo_slug;

    #[test]
    fn unit_parse_repo_slug_extracts_owner_and_repo() {
        let slug = parse_repo_slug("https://github.com/RocketChat/Rocket.Chat").expect("slug");
        assert_eq!(slug.owner, "RocketChat");
        assert_eq!(slug.name, "Rocket.Chat");
        assert_eq!(slug.slug(), "RocketChat/Rocket.Chat");
    }

    #[test]
    fn functional_parse_repo_slug_stops_at_second_path_separator() {
        let slug = parse_repo_slug("https://github.com/RocketChat/Rocket.Chat/extra/path")
            .expect("slug");
        assert_eq!(slug.slug(), "RocketChat/Rocket.Chat");
    }

    #[test]
    fn regression_parse_repo_slug_rejects_foreign_hosts_and_short_paths() {
        assert!(parse_repo_slug("https://gitlab.com/foo/bar").is_none());
        assert!(parse_repo_slug("https://github.com/onlyowner").is_none());
        assert!(parse_repo_slug("https://github.com/").is_none());
        assert!(parse_repo_slug("github.com/foo/bar").is_none());
    }

    #[test]
    fn unit_parse_repo_slug_tolerates_trailing_slash() {
        let slug = parse_repo_slug("https://github.com/foo/bar/").expect("slug");
        assert_eq!(slug.slug(), "foo/bar");
    }
}
