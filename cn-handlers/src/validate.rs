use cn_core::{validate_id_format, CnError, CnResult, Framework};

pub fn validate_framework(raw: &str) -> CnResult<Framework> {
    Framework::parse(raw).ok_or_else(|| CnError::InvalidArgument {
        field: "framework".to_string(),
        message: format!("'{raw}' is not one of: soc2, hipaa"),
    })
}

pub fn validate_run_id(raw: &str) -> CnResult<()> {
    validate_id_format("runId", raw)
}

pub fn validate_plan_id(raw: &str) -> CnResult<()> {
    validate_id_format("planId", raw)
}

pub fn validate_tracker(raw: &str) -> CnResult<&'static str> {
    match raw {
        "github" => Ok("github"),
        "jira" => Ok("jira"),
        _ => Err(CnError::InvalidArgument {
            field: "tracker".to_string(),
            message: format!("'{raw}' is not one of: github, jira"),
        }),
    }
}
