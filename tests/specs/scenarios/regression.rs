//! S7 -- regression detector.

use crate::prelude::Project;

#[test]
fn s7_score_drop_is_reported_improvement_is_not() {
    let project = Project::empty();

    project
        .swarm("s7")
        .args(&["eval", "record", "E", "--score", "0.872"])
        .passes();
    project
        .swarm("s7")
        .args(&["eval", "record", "E", "--score", "0.679"])
        .passes();

    let regressions = project
        .swarm("s7")
        .args(&["eval", "regressions", "-o", "json"])
        .passes()
        .json();
    let regressions = regressions.as_array().unwrap();
    assert_eq!(regressions.len(), 1);
    let r = &regressions[0];
    assert_eq!(r["eval_name"], "E");
    let delta = r["delta"].as_f64().unwrap();
    assert!((delta - 0.193).abs() < 1e-3, "delta was {delta}");
    let delta_percent = r["delta_percent"].as_f64().unwrap();
    assert!((delta_percent - (-22.1)).abs() < 0.1, "delta_percent was {delta_percent}");

    // A separate eval improving from 0.75 to 0.80 produces no regression.
    project
        .swarm("s7")
        .args(&["eval", "record", "F", "--score", "0.75"])
        .passes();
    project
        .swarm("s7")
        .args(&["eval", "record", "F", "--score", "0.80"])
        .passes();
    let regressions_after = project
        .swarm("s7")
        .args(&["eval", "regressions", "-o", "json"])
        .passes()
        .json();
    let names: Vec<&str> = regressions_after
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["eval_name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"F"));
}
