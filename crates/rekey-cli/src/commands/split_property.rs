use crate::support::{CliError, print_json, require_config};
use rekey_graph::GraphStore;
use rekey_qualify::SplitProperty;
use serde_json::json;
use tracing::info;

pub struct Args {
    pub input: Option<String>,
    pub input_overrides: Vec<String>,
    pub regex: String,
    pub old_predicate: String,
    pub new_predicate: String,
    pub trim: bool,
    pub json: bool,
}

pub fn run(args: Args) -> Result<(), CliError> {
    info!("SplitProperty: Start");

    let split =
        SplitProperty::new(&args.old_predicate, &args.new_predicate, &args.regex)?.trim(args.trim);

    let config = require_config("input", args.input.as_deref(), &args.input_overrides)?;
    let store = config.open("input")?;
    let report = split.apply(&store)?;

    if args.json {
        print_json(&json!({
            "action": "split-property",
            "store": store.name(),
            "oldPredicate": args.old_predicate,
            "newPredicate": args.new_predicate,
            "report": report,
        }))?;
    } else {
        println!(
            "rekey split-property {} -> {}",
            args.old_predicate, args.new_predicate
        );
        println!();
        println!("  store: {}", store.name());
        println!("  statements examined: {}", report.examined);
        println!("  values derived: {}", report.derived);
        println!("  statements added: {}", report.added);
    }

    info!("SplitProperty: End");
    Ok(())
}
