//! # edictidx CLI Entry Point
//!
//! Test harness for exercising the engine's entry points from the command
//! line. Not a production interface.
//!
//! ## Usage
//!
//! ```bash
//! # Build an index over a dictionary
//! edictidx build edict.txt edict.hdw --key headword
//!
//! # Verify an index against its dictionary
//! edictidx verify edict.txt edict.hdw --key headword
//!
//! # Look up a key
//! edictidx find edict.txt edict.hdw 犬 --key headword
//!
//! # Dump the keys the parser extracts
//! edictidx dump edict.txt --key reading
//!
//! # Time the hash functions over every entry
//! edictidx hashtime edict.txt
//! ```

use std::env;
use std::time::Instant;

use eyre::{bail, eyre, Result};

use edictidx::hash::{bucket_hash, slot_checksum};
use edictidx::parser::{Entries, KeyStream};
use edictidx::{Backing, Dictionary, Index, IndexParams, KeyStrategy, RegionKind};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

struct Options {
    strategy: KeyStrategy,
    kind: RegionKind,
    positional: Vec<String>,
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = args[1].as_str();
    match command {
        "--help" | "-h" => {
            print_usage();
            return Ok(());
        }
        "--version" | "-v" => {
            println!("edictidx {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let opts = parse_options(&args[2..])?;

    match command {
        "build" => cmd_build(&opts),
        "verify" => cmd_verify(&opts),
        "find" => cmd_find(&opts),
        "dump" => cmd_dump(&opts),
        "hashtime" => cmd_hashtime(&opts),
        other => bail!("unknown command '{}'; try --help", other),
    }
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut strategy = KeyStrategy::Headword;
    let mut kind = RegionKind::Mmap;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--key" | "-k" => {
                i += 1;
                let name = args
                    .get(i)
                    .ok_or_else(|| eyre!("--key needs a strategy name"))?;
                strategy = KeyStrategy::from_name(name)
                    .ok_or_else(|| eyre!("unknown key strategy '{}'", name))?;
            }
            "--heap" => {
                kind = RegionKind::Heap;
            }
            arg if arg.starts_with('-') => {
                bail!("unknown option: {}", arg);
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    Ok(Options {
        strategy,
        kind,
        positional,
    })
}

fn expect_args<'a>(opts: &'a Options, names: &[&str]) -> Result<&'a [String]> {
    if opts.positional.len() != names.len() {
        bail!("expected arguments: {}", names.join(" "));
    }
    Ok(&opts.positional)
}

fn cmd_build(opts: &Options) -> Result<()> {
    let args = expect_args(opts, &["<dict>", "<index>"])?;

    let dict = Dictionary::open_with(opts.kind, &args[0])?;
    let mut index = Index::create_with(
        opts.kind,
        dict,
        &Backing::file(&args[1]),
        IndexParams::default(),
    )?;

    let start = Instant::now();
    let stats = index.build(opts.strategy)?;
    let elapsed = start.elapsed();

    println!(
        "built {}: {} entries, table size {}, max chain {}, max list {} ({:.3}s)",
        args[1],
        stats.entries,
        stats.table_size,
        stats.max_chain,
        stats.max_list,
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_verify(opts: &Options) -> Result<()> {
    let args = expect_args(opts, &["<dict>", "<index>"])?;

    let dict = Dictionary::open_with(opts.kind, &args[0])?;
    let index = Index::open_with(opts.kind, dict, &args[1])?;

    let start = Instant::now();
    let stats = index.verify(opts.strategy)?;
    let elapsed = start.elapsed();

    println!(
        "verified {}: {} keys, {} results iterated, max list {} ({:.3}s)",
        args[1],
        stats.keys,
        stats.results,
        stats.max_list,
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn cmd_find(opts: &Options) -> Result<()> {
    let args = expect_args(opts, &["<dict>", "<index>", "<key>"])?;

    let dict = Dictionary::open_with(opts.kind, &args[0])?;
    let index = Index::open_with(opts.kind, dict, &args[1])?;

    match index.find(args[2].as_bytes()) {
        None => println!("no match"),
        Some(query) => {
            for entry in query {
                println!("{:>10}  {}", entry.offset, String::from_utf8_lossy(entry.bytes));
            }
        }
    }
    Ok(())
}

fn cmd_dump(opts: &Options) -> Result<()> {
    let args = expect_args(opts, &["<dict>"])?;

    let dict = Dictionary::open_with(opts.kind, &args[0])?;
    let mut stream = KeyStream::new(
        dict.bytes(),
        opts.strategy,
        IndexParams::default().max_entry_size(),
    );

    while let Some((key, offset)) = stream.next_key()? {
        println!("{:>10}  {}", offset, String::from_utf8_lossy(key));
    }
    Ok(())
}

fn cmd_hashtime(opts: &Options) -> Result<()> {
    let args = expect_args(opts, &["<dict>"])?;

    let dict = Dictionary::open_with(opts.kind, &args[0])?;

    let start = Instant::now();
    let mut acc = 0u64;
    let mut entries = 0u64;
    for (_, bytes) in Entries::new(dict.bytes()) {
        acc = acc
            .wrapping_add(bucket_hash(bytes) as u64)
            .wrapping_add(slot_checksum(bytes) as u64);
        entries += 1;
    }
    let elapsed = start.elapsed();

    println!(
        "hashed {} entries ({} bytes) in {:.3}s [{:08x}]",
        entries,
        dict.len(),
        elapsed.as_secs_f64(),
        acc & 0xFFFF_FFFF
    );
    Ok(())
}

fn print_usage() {
    println!("edictidx - mapped hash-table index over flat dictionaries");
    println!();
    println!("USAGE:");
    println!("    edictidx <COMMAND> [ARGS] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    build <dict> <index>        Build an index over a dictionary");
    println!("    verify <dict> <index>       Verify an index against its dictionary");
    println!("    find <dict> <index> <key>   Look up an exact key");
    println!("    dump <dict>                 Print every key the parser extracts");
    println!("    hashtime <dict>             Time the hash functions over all entries");
    println!();
    println!("OPTIONS:");
    println!("    -k, --key <name>   Key strategy: headword (default) or reading");
    println!("        --heap         Use the portable heap backend instead of mmap");
    println!("    -h, --help         Print help information");
    println!("    -v, --version      Print version information");
}
