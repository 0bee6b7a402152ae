use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rekey",
    about = "Rekey: namespace migration and literal splitting over graph stores",
    version
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all log output
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Move every resource under one namespace to fresh identifiers in another
    ChangeNamespace {
        /// Config file for the input graph store (the store that is rewritten)
        #[arg(short = 'i', long = "input", value_name = "CONFIG_FILE")]
        input: Option<String>,

        /// Override a key of the input store config (repeatable)
        #[arg(short = 'I', long = "input-override", value_name = "KEY=VALUE")]
        input_overrides: Vec<String>,

        /// Config file for the reference store searched for used identifiers
        /// (defaults to the input store)
        #[arg(short = 'v', long = "reference", value_name = "CONFIG_FILE")]
        reference: Option<String>,

        /// Override a key of the reference store config (repeatable)
        #[arg(short = 'V', long = "reference-override", value_name = "KEY=VALUE")]
        reference_overrides: Vec<String>,

        /// The old namespace
        #[arg(short = 'u', long = "old-namespace", value_name = "OLD_NAMESPACE")]
        old_namespace: String,

        /// The new namespace
        #[arg(short = 'n', long = "new-namespace", value_name = "NEW_NAMESPACE")]
        new_namespace: String,

        /// Log and report every renamed resource
        #[arg(short = 'e', long = "error-logging")]
        error_logging: bool,

        /// Add an owl:sameAs statement from each new identifier to its old one
        #[arg(short = 's', long = "same-as")]
        same_as: bool,

        /// Seed the identifier generator for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Give up after this many colliding candidates per resource
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split delimited literal values of one predicate into another predicate
    SplitProperty {
        /// Config file for the graph store
        #[arg(short = 'i', long = "input", value_name = "CONFIG_FILE")]
        input: Option<String>,

        /// Override a key of the store config (repeatable)
        #[arg(short = 'I', long = "input-override", value_name = "KEY=VALUE")]
        input_overrides: Vec<String>,

        /// Regex to split values on
        #[arg(short = 'r', long = "regex", value_name = "SPLIT_REGEX")]
        regex: String,

        /// Predicate whose values are split
        #[arg(short = 'u', long = "old-predicate", value_name = "OLD_PREDICATE")]
        old_predicate: String,

        /// Predicate the split values are asserted under
        #[arg(short = 'n', long = "new-predicate", value_name = "NEW_PREDICATE")]
        new_predicate: String,

        /// Trim whitespace around each split value
        #[arg(short = 't', long = "trim")]
        trim: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show statement count and content digest of a store
    Stats {
        /// Config file for the graph store
        #[arg(short = 'i', long = "input", value_name = "CONFIG_FILE")]
        input: Option<String>,

        /// Override a key of the store config (repeatable)
        #[arg(short = 'I', long = "input-override", value_name = "KEY=VALUE")]
        input_overrides: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
