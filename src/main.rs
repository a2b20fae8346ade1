use clap::{Arg, Command};
use log::LevelFilter;
use post_sift::config::BatchFile;
use post_sift::model::ProgressEvent;
use post_sift::session::HideResolver;
use post_sift::store::{MemoryRuleStore, ProgressNotifier};
use std::process;
use std::sync::Arc;

struct LogProgress;

impl ProgressNotifier for LogProgress {
    fn notify(&self, event: ProgressEvent) {
        log::debug!(
            "applying filters: {}/{} (matched filters: {}, hide records: {})",
            event.processed,
            event.total,
            event.matched_filters,
            event.hide_records
        );
    }
}

#[tokio::main]
async fn main() {
    let matches = Command::new("post-sift")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolves hide/remove dispositions for batches of threaded content")
        .arg(
            Arg::new("batch")
                .short('b')
                .long("batch")
                .value_name("FILE")
                .help("Batch description file (items, matched filters, hide records)"),
        )
        .arg(
            Arg::new("generate-batch")
                .long("generate-batch")
                .value_name("FILE")
                .help("Write a sample batch file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-batch")
                .long("test-batch")
                .help("Validate the batch file without resolving it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the resolution outcome as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-batch") {
        let batch = BatchFile::default();
        match batch.to_file(generate_path) {
            Ok(()) => println!("Sample batch written to {generate_path}"),
            Err(e) => {
                eprintln!("Error writing sample batch: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let batch_path = match matches.get_one::<String>("batch") {
        Some(path) => path,
        None => {
            eprintln!("No batch file given (use --batch FILE or --generate-batch FILE)");
            process::exit(1);
        }
    };

    let batch = match BatchFile::from_file(batch_path) {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("Error loading batch file: {e}");
            process::exit(1);
        }
    };

    let warnings = match batch.validate() {
        Ok(warnings) => warnings,
        Err(e) => {
            eprintln!("Invalid batch file: {e}");
            process::exit(1);
        }
    };
    for warning in &warnings {
        log::warn!("{warning}");
    }

    if matches.get_flag("test-batch") {
        println!(
            "Batch OK: {} items, {} filters, {} hide records, {} warnings",
            batch.items.len(),
            batch.filters.len(),
            batch.hide_records.len(),
            warnings.len()
        );
        return;
    }

    let store = Arc::new(MemoryRuleStore::new());
    batch.seed(&store);

    let resolver = HideResolver::new(store.clone(), store, Arc::new(LogProgress));

    let outcome = match resolver.resolve(batch.context, batch.items).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Resolution failed: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing outcome: {e}");
                process::exit(1);
            }
        }
        return;
    }

    println!("Dispositions:");
    for (id, disposition) in &outcome.dispositions {
        println!("  {id}: {disposition}");
    }

    println!(
        "Surviving items: {} of {}",
        outcome.items.len(),
        outcome.dispositions.len()
    );

    if !outcome.new_records.is_empty() {
        println!("Synthesized hide records:");
        for record in &outcome.new_records {
            let kind = if record.only_hide { "hide" } else { "remove" };
            println!(
                "  {}: {kind} (apply_to_replies: {})",
                record.item_id, record.apply_to_replies
            );
        }
    }

    if !outcome.needs_reparse.is_empty() {
        let mut ids: Vec<_> = outcome.needs_reparse.iter().collect();
        ids.sort();
        println!("Items needing reparse:");
        for id in ids {
            println!("  {id}");
        }
    }
}
