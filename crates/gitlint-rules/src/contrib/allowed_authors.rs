//! CC3: only authors listed in the repository's AUTHORS file may commit

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gitlint_core::{GitCommit, GitContextError, LintContext, Rule, RuleClass, RuleResult, RuleViolation};
use once_cell::sync::Lazy;
use regex::Regex;

const AUTHORS_FILE_NAMES: [&str; 3] = ["AUTHORS", "AUTHORS.txt", "AUTHORS.md"];

static PARSE_AUTHORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(.*) <(.*)>$").expect("static regex"));

pub fn allowed_authors() -> RuleClass {
    RuleClass::commit("CC3", "contrib-allowed-authors", validate_allowed_authors)
}

fn read_authors_file(
    repository_path: Option<&Path>,
) -> Result<(HashSet<(String, String)>, String), GitContextError> {
    let mut authors_file = None;
    for file_name in AUTHORS_FILE_NAMES {
        let path = match repository_path {
            Some(repo) => repo.join(file_name),
            None => PathBuf::from(file_name),
        };
        if path.exists() {
            authors_file = Some((path, file_name));
            break;
        }
    }
    let Some((path, file_name)) = authors_file else {
        return Err(GitContextError::io_error(
            "AUTHORS",
            std::io::Error::new(std::io::ErrorKind::NotFound, "No AUTHORS file found!"),
        ));
    };

    let content =
        std::fs::read_to_string(&path).map_err(|err| GitContextError::io_error(&path, err))?;
    let authors = PARSE_AUTHORS
        .captures_iter(&content)
        .map(|captures| (captures[1].to_string(), captures[2].to_string()))
        .collect();
    Ok((authors, file_name.to_string()))
}

fn validate_allowed_authors(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let (registered_authors, authors_file_name) = read_authors_file(commit.repository_path())?;

    let (Some(name), Some(email)) = (commit.author_name()?, commit.author_email()?) else {
        tracing::warn!(
            "{} - {}: skipping - commit author unknown. \
             Suggested fix: use staged mode (general.staged=true)",
            rule.name,
            rule.id
        );
        return Ok(Vec::new());
    };

    let author = (name.to_string(), email.to_lowercase());
    if !registered_authors.contains(&author) {
        return Ok(vec![RuleViolation::new(
            &rule.id,
            format!("Author not in '{authors_file_name}' file: \"{name} <{email}>\""),
            None,
        )]);
    }
    Ok(Vec::new())
}
