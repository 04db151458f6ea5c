//! Invariant 4 -- exactly one `thread_created` per novel `(project, thread_id)`.
//! Invariant 7 -- inbox is capped at min(limit, 5) and never carries bodies.

use crate::prelude::Project;

#[test]
fn thread_created_fires_once_per_novel_thread() {
    let project = Project::empty();

    project.swarm("msg").args(&["agent", "register", "alice"]).passes();
    project.swarm("msg").args(&["agent", "register", "bob"]).passes();

    project
        .swarm("msg")
        .args(&["message", "send", "--from", "alice", "--to", "bob", "--subject", "hi", "first"])
        .passes();
    project
        .swarm("msg")
        .args(&["message", "send", "--from", "alice", "--to", "bob", "--subject", "hi again", "second"])
        .passes();

    let log = project
        .swarm("msg")
        .args(&["log", "-n", "100", "-o", "json"])
        .passes()
        .json();
    let entries = log.as_array().unwrap();
    let thread_created_count = entries
        .iter()
        .filter(|e| e["event"]["type"] == "thread_created")
        .count();
    // Two sends with no shared thread_id each start a new thread.
    assert_eq!(thread_created_count, 2);
}

#[test]
fn inbox_limit_is_clamped_to_five_and_carries_no_body() {
    let project = Project::empty();

    project.swarm("inbox").args(&["agent", "register", "alice"]).passes();
    project.swarm("inbox").args(&["agent", "register", "bob"]).passes();

    for i in 0..8 {
        project
            .swarm("inbox")
            .args(&[
                "message",
                "send",
                "--from",
                "alice",
                "--to",
                "bob",
                "--subject",
                "update",
                &format!("message body {i}"),
            ])
            .passes();
    }

    let entries = project
        .swarm("inbox")
        .args(&["message", "inbox", "bob", "-o", "json"])
        .passes()
        .json();
    let entries = entries.as_array().unwrap();
    assert!(entries.len() <= 5, "inbox must clamp to at most 5 entries");
    for entry in entries {
        assert!(entry.get("body").is_none(), "inbox entries must not carry a body");
    }
}
