use cn_core::{CnError, CnResult};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Where remediation tickets are filed. `repo_full_name()` is what the
/// approval gate binds the plan hash to — it must never change between
/// dry-run and execute for the same plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    GitHub { owner: String, repo: String },
    Jira { project_key: String },
}

impl Target {
    pub fn repo_full_name(&self) -> String {
        match self {
            Target::GitHub { owner, repo } => format!("{owner}/{repo}"),
            Target::Jira { project_key } => project_key.clone(),
        }
    }
}

fn origin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            ^
            (?:https?://(?:[^@/]+@)?github\.com/|
               git@github\.com:|
               ssh://git@github\.com/|
               git://github\.com/)
            (?P<owner>[\w.-]+)/(?P<repo>[\w.-]+?)
            (?:\.git)?/?
            $
            "#,
        )
        .expect("origin regex must compile")
    })
}

/// Parses a GitHub `owner/repo` target out of an explicit `targetRepo`
/// string (already in `owner/repo` form) or a `.git/config` `origin` URL
/// in HTTPS, SSH (`git@`), `ssh://`, or `git://` form.
pub fn resolve_github_target(explicit: Option<&str>, repo_path: &Path) -> CnResult<Target> {
    if let Some(explicit) = explicit {
        return parse_owner_repo(explicit);
    }

    let origin = read_origin_url(repo_path)?;
    if let Some(captures) = origin_regex().captures(origin.trim()) {
        return Ok(Target::GitHub {
            owner: captures["owner"].to_string(),
            repo: captures["repo"].to_string(),
        });
    }

    Err(CnError::InvalidArgument {
        field: "targetRepo".to_string(),
        message: format!("could not parse a GitHub owner/repo from origin url '{origin}'"),
    })
}

fn parse_owner_repo(explicit: &str) -> CnResult<Target> {
    let mut parts = explicit.splitn(2, '/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok(Target::GitHub {
            owner: owner.to_string(),
            repo: repo.trim_end_matches(".git").to_string(),
        }),
        _ => Err(CnError::InvalidArgument {
            field: "targetRepo".to_string(),
            message: format!("'{explicit}' is not in owner/repo form"),
        }),
    }
}

fn read_origin_url(repo_path: &Path) -> CnResult<String> {
    let config_path = repo_path.join(".git").join("config");
    let contents = std::fs::read_to_string(&config_path).map_err(|e| CnError::InvalidArgument {
        field: "repoPath".to_string(),
        message: format!("could not read {}: {e}", config_path.display()),
    })?;

    let mut in_origin_section = false;
    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_origin_section = trimmed == "[remote \"origin\"]";
            continue;
        }
        if in_origin_section {
            if let Some(value) = trimmed.strip_prefix("url") {
                if let Some(url) = value.trim_start().strip_prefix('=') {
                    return Ok(url.trim().to_string());
                }
            }
        }
    }

    Err(CnError::InvalidArgument {
        field: "targetRepo".to_string(),
        message: "no [remote \"origin\"] url found in .git/config".to_string(),
    })
}

/// Resolves a Jira target: the project key is always explicit, there is no
/// analogue of `.git/config` origin discovery for it.
pub fn resolve_jira_target(project_key: &str) -> CnResult<Target> {
    if project_key.trim().is_empty() {
        return Err(CnError::InvalidArgument {
            field: "targetRepo".to_string(),
            message: "jira project key must not be empty".to_string(),
        });
    }
    Ok(Target::Jira {
        project_key: project_key.to_string(),
    })
}
