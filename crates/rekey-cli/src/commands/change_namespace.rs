use crate::config::StoreConfig;
use crate::support::{CliError, print_json, require_config, yes_no};
use rekey_graph::{GraphStore, MemoryGraph};
use rekey_qualify::{
    IdentifierAllocator, MigrationEngine, MigrationError, NamespaceChange, TracingObserver,
};
use serde_json::json;
use tracing::{info, warn};

pub struct Args {
    pub input: Option<String>,
    pub input_overrides: Vec<String>,
    pub reference: Option<String>,
    pub reference_overrides: Vec<String>,
    pub old_namespace: String,
    pub new_namespace: String,
    pub error_logging: bool,
    pub same_as: bool,
    pub seed: Option<u64>,
    pub max_attempts: Option<u32>,
    pub json: bool,
}

pub fn run(args: Args) -> Result<(), CliError> {
    info!("ChangeNamespace: Start");

    let change = NamespaceChange::new(&args.old_namespace, &args.new_namespace)
        .record_equivalence(args.same_as)
        .verbose(args.error_logging);
    // Fail on blank namespaces before any store is opened (and locked).
    change.validate()?;

    let input_config = require_config("input", args.input.as_deref(), &args.input_overrides)?;
    let input = input_config.open("input")?;

    let reference_config =
        StoreConfig::resolve(args.reference.as_deref(), &args.reference_overrides)?;
    let reference: Option<MemoryGraph> = match &reference_config {
        Some(config) if !config.same_file_as(&input_config) => Some(config.open("reference")?),
        _ => None,
    };
    let reference_store: &dyn GraphStore = match &reference {
        Some(store) => store,
        None => &input,
    };

    let allocator = match args.seed {
        Some(seed) => IdentifierAllocator::seeded(seed),
        None => IdentifierAllocator::from_entropy(),
    };
    let allocator = match args.max_attempts {
        Some(max) => allocator.with_max_attempts(max),
        None => allocator,
    };
    let mut engine = MigrationEngine::new(allocator);
    let mut observer = TracingObserver::default().per_resource_info(args.error_logging);

    let before = input.snapshot_ref()?;
    let report = match engine.execute(&input, reference_store, &change, &mut observer) {
        Ok(report) => report,
        Err(err) => {
            if matches!(
                err,
                MigrationError::Store(_) | MigrationError::Allocation { .. }
            ) {
                keep_applied_renames(&input);
            }
            return Err(err.into());
        }
    };
    let after = input.snapshot_ref()?;

    if args.json {
        print_json(&json!({
            "action": "change-namespace",
            "store": input.name(),
            "reference": reference_store.name(),
            "sameAs": args.same_as,
            "snapshotBefore": before,
            "snapshotAfter": after,
            "report": report,
        }))?;
    } else {
        println!(
            "rekey change-namespace {} -> {}",
            report.old_namespace, report.new_namespace
        );
        println!();
        println!("  store: {}", input.name());
        println!("  reference: {}", reference_store.name());
        println!("  run id: {}", report.run_id);
        println!("  resources renamed: {}", report.renamed);
        println!("  statements rewritten: {}", report.statements_rewritten);
        println!("  sameAs added: {}", report.equivalences_added);
        println!("  changed: {}", yes_no(before != after));
        if let Some(pairs) = &report.pairs {
            for pair in pairs {
                println!("  <{}> -> <{}>", pair.old_id, pair.new_id);
            }
        }
    }

    info!("ChangeNamespace: End");
    Ok(())
}

/// Persist renames committed before a mid-batch failure so a rerun only
/// sees the remainder.
fn keep_applied_renames(input: &MemoryGraph) {
    match input.flush() {
        Ok(()) => warn!(
            store = input.name(),
            "migration stopped early; renames already applied were kept"
        ),
        Err(err) => warn!(
            store = input.name(),
            error = %err,
            "migration stopped early and applied renames could not be persisted"
        ),
    }
}
