//! Contrib rules: built-in but opt-in, enabled through the general
//! `contrib` option

pub mod allowed_authors;
pub mod conventional_commit;
pub mod disallow_cleanup_commits;
pub mod signedoff_by;
