//! S1 -- parallel reservation without conflict.
//! S2 -- conflict reporting.

use crate::prelude::Project;

#[test]
fn s1_parallel_reservation_without_conflict() {
    let project = Project::empty();

    project
        .swarm("s1")
        .args(&["agent", "register", "W1"])
        .passes();
    project
        .swarm("s1")
        .args(&["agent", "register", "W2"])
        .passes();

    project
        .swarm("s1")
        .args(&["reservation", "reserve", "--agent", "W1", "src/a.ts"])
        .passes();
    project
        .swarm("s1")
        .args(&["reservation", "reserve", "--agent", "W2", "src/b.ts"])
        .passes();

    let list = project
        .swarm("s1")
        .args(&["reservation", "list", "-o", "json"])
        .passes()
        .json();
    let reservations = list.as_array().unwrap();
    assert_eq!(reservations.len(), 2);
}

#[test]
fn s2_conflict_reporting() {
    let project = Project::empty();

    project.swarm("s2").args(&["agent", "register", "W1"]).passes();
    project.swarm("s2").args(&["agent", "register", "W2"]).passes();

    project
        .swarm("s2")
        .args(&["reservation", "reserve", "--agent", "W1", "src/a.ts"])
        .passes();

    let result = project
        .swarm("s2")
        .args(&["reservation", "reserve", "--agent", "W2", "src/a.ts", "src/c.ts", "-o", "json"])
        .passes()
        .json();

    let granted = result["granted"].as_array().unwrap();
    assert_eq!(granted, &[serde_json::json!("src/c.ts")]);

    let conflicts = result["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["requested_path"], "src/a.ts");
    assert_eq!(conflicts[0]["holder_agent"], "W1");
}
