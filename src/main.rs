use clap::Parser;
use leakwarden::cli::{Cli, Command};
use leakwarden::config::Config;
use leakwarden::store::{DumpStore, StoreStatus};
use leakwarden::util::{format_age, format_bytes};
use std::io::Write;

fn print_status(status: &StoreStatus) {
    if status.entries.is_empty() {
        println!("No snapshots stored in {}.", status.root.display());
        return;
    }

    println!("Snapshots in {}:", status.root.display());
    println!("{:<52} {:>10} {:>10}", "Name", "Size", "Age");
    println!("{}", "-".repeat(74));

    for entry in &status.entries {
        println!(
            "{:<52} {:>10} {:>10}",
            entry.name,
            format_bytes(entry.size_bytes),
            format_age(entry.age_secs)
        );
    }

    println!(
        "\n{} snapshots, {} total",
        status.entries.len(),
        format_bytes(status.total_bytes)
    );
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            std::process::exit(1);
        }
    };
    if let Some(root) = cli.root {
        config.storage_root = root;
    }

    let store = DumpStore::new(&config);

    match cli.command {
        Command::Status(args) => {
            let status = store.status();
            if args.json {
                match serde_json::to_string_pretty(&status) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Error serializing status: {e}");
                        std::process::exit(1);
                    }
                }
            } else {
                print_status(&status);
            }
        }
        Command::Sweep => {
            let summary = store.evict_expired();

            if !summary.errors.is_empty() {
                eprintln!("errors encountered:");
                for error in &summary.errors {
                    eprintln!("  {error}");
                }
            }

            println!(
                "swept {} expired snapshots, {} freed",
                summary.deleted_files,
                format_bytes(summary.deleted_bytes)
            );
        }
        Command::Clear(args) => {
            let status = store.status();
            if status.entries.is_empty() {
                println!("Nothing to clear in {}.", status.root.display());
                return;
            }

            let proceed = args.yes
                || confirm(&format!(
                    "Delete {} snapshots ({}) from {}?",
                    status.entries.len(),
                    format_bytes(status.total_bytes),
                    status.root.display()
                ));
            if !proceed {
                println!("Aborted.");
                return;
            }

            match store.clear_all() {
                Ok(_) => println!("cleared {}", status.root.display()),
                Err(e) => {
                    eprintln!("Error clearing {}: {e}", status.root.display());
                    std::process::exit(1);
                }
            }
        }
    }
}
