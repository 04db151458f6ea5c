//! S3 -- review retry cycle.
//! S4 -- review approval resets the attempt counter.

use crate::prelude::Project;

fn setup_worker(project: &Project, project_key: &str) -> (String, String) {
    project
        .swarm(project_key)
        .args(&["agent", "register", "reviewer"])
        .passes();
    project
        .swarm(project_key)
        .args(&[
            "cell", "create", "task-1", "--title", "do the thing",
        ])
        .passes();
    let spawn = project
        .swarm(project_key)
        .args(&["worker", "spawn", "task-1", "do the thing", "-o", "json"])
        .passes()
        .json();
    let worker_id = spawn["worker_id"].as_str().unwrap().to_string();

    project
        .swarm(project_key)
        .args(&["worker", "begin-work", &worker_id, "task-1", "--agent", "reviewer"])
        .passes();

    ("task-1".to_string(), worker_id)
}

#[test]
fn s3_review_retry_cycle_exhausts_after_three_attempts() {
    let project = Project::empty();
    let (cell_id, worker_id) = setup_worker(&project, "s3");

    let first = project
        .swarm("s3")
        .args(&[
            "worker",
            "review-feedback",
            &cell_id,
            &worker_id,
            "needs_changes",
            "--issue",
            "fix the bug",
            "-o",
            "json",
        ])
        .passes()
        .json();
    assert_eq!(first["attempt"], 1);
    assert_eq!(first["max_attempts"], 3);

    let second = project
        .swarm("s3")
        .args(&[
            "worker",
            "review-feedback",
            &cell_id,
            &worker_id,
            "needs_changes",
            "--issue",
            "still broken",
            "-o",
            "json",
        ])
        .passes()
        .json();
    assert_eq!(second["attempt"], 2);

    // Third needs_changes exhausts MAX_ATTEMPTS: no retry context is returned.
    let third = project
        .swarm("s3")
        .args(&[
            "worker",
            "review-feedback",
            &cell_id,
            &worker_id,
            "needs_changes",
            "--issue",
            "one more time",
            "-o",
            "json",
        ])
        .passes()
        .json();
    assert!(third.is_null());
}

#[test]
fn s4_approval_resets_attempt_count() {
    let project = Project::empty();
    let (cell_id, worker_id) = setup_worker(&project, "s4");

    project
        .swarm("s4")
        .args(&[
            "worker",
            "review-feedback",
            &cell_id,
            &worker_id,
            "needs_changes",
            "--issue",
            "nit",
        ])
        .passes();

    project
        .swarm("s4")
        .args(&["worker", "review-feedback", &cell_id, &worker_id, "approved"])
        .passes()
        .stdout_has("no retry needed");

    // The review gate is open: completion is now permitted.
    project
        .swarm("s4")
        .args(&[
            "worker",
            "complete",
            &worker_id,
            "--agent",
            "reviewer",
            "--duration-ms",
            "100",
        ])
        .passes()
        .stdout_has("success=true");
}
