//! Tapedeck CLI

use std::path::{Path, PathBuf};
use std::process;

use tapedeck::{Result, SerializerRegistry, TapedeckError};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    let result = match command.as_str() {
        "list" => {
            if args.len() < 3 {
                eprintln!("Usage: tapedeck list <library-dir>");
                process::exit(1);
            }
            list_cassettes(&PathBuf::from(&args[2]))
        }
        "show" => {
            if args.len() < 3 {
                eprintln!("Usage: tapedeck show <cassette-file>");
                process::exit(1);
            }
            show_cassette(&PathBuf::from(&args[2]))
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!("Run 'tapedeck' for usage information.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Tapedeck v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: tapedeck <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list <library-dir>     List cassettes with interaction counts");
    eprintln!("  show <cassette-file>   Show the interactions in a cassette");
    eprintln!();
    eprintln!("Set RUST_LOG=debug for diagnostic output.");
}

fn list_cassettes(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(TapedeckError::ConfigError(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let serializers = SerializerRegistry::default();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    println!("Cassette library: {}", dir.display());
    println!();

    let mut found = 0usize;
    for path in entries {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if serializers.for_extension(ext).is_none() {
            continue;
        }

        found += 1;
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        match read_cassette(&path, &serializers) {
            Ok(interactions) => println!("  {name:<40} {:>5} interactions", interactions.len()),
            Err(e) => println!("  {name:<40} unreadable: {e}"),
        }
    }

    if found == 0 {
        println!("  (no cassettes)");
    }

    Ok(())
}

fn show_cassette(path: &Path) -> Result<()> {
    let serializers = SerializerRegistry::default();
    let interactions = read_cassette(path, &serializers)?;

    println!("Cassette: {}", path.display());
    println!("Interactions: {}", interactions.len());
    println!();

    for (i, interaction) in interactions.iter().enumerate() {
        let request = interaction.request();
        let response = interaction.response();
        println!(
            "  {:>3}. {:<7} {} -> {} ({})",
            i + 1,
            request.method,
            request.uri,
            response.status_code(),
            interaction.recorded_at().to_rfc3339()
        );
    }

    Ok(())
}

fn read_cassette(
    path: &Path,
    serializers: &SerializerRegistry,
) -> Result<Vec<tapedeck::Interaction>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let serializer = serializers
        .for_extension(ext)
        .ok_or_else(|| TapedeckError::UnknownSerializer(ext.to_string()))?;

    let bytes = std::fs::read(path)?;
    serializer
        .deserialize(&bytes)
        .map_err(|e| TapedeckError::InvalidFormat {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}
