//! Invariant 2 -- replaying the log into a fresh projection matches the
//! live projection (exercised here via a daemon crash-and-restart).
//! Invariant 8 -- release is idempotent.
//! Boundary behaviors: priority range, title length.

use crate::prelude::{wait_for, Project};

fn pid_is_alive(state_dir: &std::path::Path) -> bool {
    let Ok(content) = std::fs::read_to_string(state_dir.join("daemon.pid")) else {
        return false;
    };
    let Ok(pid) = content.trim().parse::<u32>() else {
        return false;
    };
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn daemon_restart_replays_to_the_same_cell_state() {
    let project = Project::empty();

    project.swarm("replay").args(&["agent", "register", "alice"]).passes();
    project
        .swarm("replay")
        .args(&["cell", "create", "t-1", "--title", "first", "--priority", "3"])
        .passes();
    project
        .swarm("replay")
        .args(&["cell", "create", "t-2", "--title", "second"])
        .passes();

    let before = project
        .swarm("replay")
        .args(&["cells", "-o", "json"])
        .passes()
        .json();

    assert!(project.daemon_kill());
    assert!(
        wait_for(2000, || !pid_is_alive(project.state_path())),
        "daemon did not shut down"
    );

    // The next command transparently restarts the daemon, which replays
    // the WAL (plus any snapshot) from scratch into a fresh projection.
    let after = project
        .swarm("replay")
        .args(&["cells", "-o", "json"])
        .passes()
        .json();

    assert_eq!(before, after);
}

#[test]
fn release_is_idempotent() {
    let project = Project::empty();

    project.swarm("idempotent").args(&["agent", "register", "alice"]).passes();
    project
        .swarm("idempotent")
        .args(&["reservation", "reserve", "--agent", "alice", "src/x.ts"])
        .passes();

    project
        .swarm("idempotent")
        .args(&["reservation", "release", "--agent", "alice", "src/x.ts"])
        .passes();
    // A second release of the same, already-released path must not error.
    project
        .swarm("idempotent")
        .args(&["reservation", "release", "--agent", "alice", "src/x.ts"])
        .passes();

    let active = project
        .swarm("idempotent")
        .args(&["reservation", "list", "-o", "json"])
        .passes()
        .json();
    assert!(active.as_array().unwrap().is_empty());
}

#[test]
fn priority_above_four_is_rejected() {
    let project = Project::empty();
    project
        .swarm("boundary")
        .args(&["cell", "create", "bad", "--title", "x", "--priority", "5"])
        .fails()
        .stderr_has("exceeds maximum");
}

#[test]
fn title_over_500_chars_is_rejected() {
    let project = Project::empty();
    let long_title = "x".repeat(501);
    project
        .swarm("boundary")
        .args(&["cell", "create", "bad", "--title", &long_title])
        .fails()
        .stderr_has("exceeds maximum");
}
