use crate::support::{CliError, print_json, require_config};
use rekey_graph::{GraphStore, TriplePattern};
use serde_json::json;

pub fn run(
    input: Option<String>,
    input_overrides: Vec<String>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = require_config("input", input.as_deref(), &input_overrides)?;
    let store = config.open("input")?;

    let statements = store.len()?;
    let subjects = store.distinct_subjects(&TriplePattern::any())?.len();
    let snapshot = store.snapshot_ref()?;

    if json_output {
        print_json(&json!({
            "action": "stats",
            "store": store.name(),
            "statements": statements,
            "subjects": subjects,
            "snapshotRef": snapshot,
        }))?;
    } else {
        println!("rekey stats {}", store.name());
        println!();
        println!("  statements: {statements}");
        println!("  subjects: {subjects}");
        println!("  snapshot: {snapshot}");
    }
    Ok(())
}
