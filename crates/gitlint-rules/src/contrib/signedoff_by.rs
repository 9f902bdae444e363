//! CC1: require a Signed-off-by line in the commit body

use gitlint_core::{GitCommit, LintContext, Rule, RuleClass, RuleResult, RuleViolation};

pub fn signedoff_by() -> RuleClass {
    RuleClass::commit("CC1", "contrib-body-requires-signed-off-by", validate_signedoff_by)
}

fn validate_signedoff_by(rule: &Rule, commit: &GitCommit, _ctx: &LintContext) -> RuleResult {
    let body = &commit.message()?.body;
    if body.iter().any(|line| line.to_lowercase().starts_with("signed-off-by")) {
        return Ok(Vec::new());
    }
    Ok(vec![
        RuleViolation::new(&rule.id, "Body does not contain a 'Signed-off-by' line", None)
            .with_line_nr(1),
    ])
}
