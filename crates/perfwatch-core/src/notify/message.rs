use crate::model::UnreportedFailure;

/// One consolidated message covering every pending failure, oldest first.
pub fn render(title: &str, failures: &[UnreportedFailure]) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for f in failures {
        out.push_str(&format!(
            "- {} (run {}) at {}: runtime {}s, tool {}, target {}\n",
            f.test_name,
            f.run_id,
            f.run_timestamp,
            f.runtime,
            f.tool_version,
            f.target_version
        ));
    }
    out.push_str(&format!("{} failing run(s)", failures.len()));
    out
}
