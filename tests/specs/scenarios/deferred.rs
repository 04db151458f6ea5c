//! S5 -- deferred timeout.
//! S6 -- deferred cross-process (two daemon clients sharing one project).

use crate::prelude::Project;

#[test]
fn s5_deferred_times_out_when_never_resolved() {
    let project = Project::empty();

    let created = project
        .swarm("s5")
        .args(&["deferred", "create", "--ttl", "1", "-o", "json"])
        .passes()
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    let outcome = project
        .swarm("s5")
        .args(&["deferred", "await", &id, "--timeout", "0", "-o", "json"])
        .passes()
        .json();
    assert_eq!(outcome, serde_json::json!("TimedOut"));
}

#[test]
fn s6_deferred_resolves_across_separate_cli_invocations() {
    let project = Project::empty();

    // Process A: create.
    let created = project
        .swarm("s6")
        .args(&["deferred", "create", "--ttl", "60", "-o", "json"])
        .passes()
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    // Process B: resolve. A fresh CLI invocation against the same
    // project-scoped daemon, simulating a different process.
    project
        .swarm("s6")
        .args(&["deferred", "resolve", &id, "--value", r#"{"done":true}"#])
        .passes();

    // Process A: await, observed from yet another invocation.
    let outcome = project
        .swarm("s6")
        .args(&["deferred", "await", &id, "--timeout", "5", "-o", "json"])
        .passes()
        .json();
    assert_eq!(outcome, serde_json::json!({"Value": {"done": true}}));
}
