use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use oxford_dict::error::Result;
use oxford_dict::index::SearchIndex;
use oxford_dict::output::{self, DictionaryDocument, JsonLinesSink};
use oxford_dict::parallel::{print_stats, run_strategy, ParallelConfig, ParseOptions, Strategy};
use oxford_dict::search::{self, Searcher};
use oxford_dict::source::open_input;
use oxford_dict::{DictionaryEntry, EntryParser, Schema};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "oxford-dict-rust")]
#[command(about = "Parse the plain-text Oxford dictionary into structured JSON and search it")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse dictionary text into JSON
    Parse(ParseArgs),
    /// Build a search index from parsed JSON
    Index {
        /// Parsed dictionary (document or JSON lines)
        dict: PathBuf,
        /// Output index file
        output: PathBuf,
    },
    /// Run one query against parsed JSON
    Search {
        /// Parsed dictionary (document or JSON lines)
        dict: PathBuf,
        /// Query text
        query: String,
        /// What to match the query against
        #[arg(short, long, value_enum, default_value_t = SearchBy::Word)]
        by: SearchBy,
        /// Maximum number of results
        #[arg(short, long, default_value_t = search::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Interactive search shell
    Shell {
        /// Parsed dictionary (document or JSON lines)
        dict: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One pretty-printed document with title and entry count
    Document,
    /// One entry per line
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SearchBy {
    Word,
    Prefix,
    Definition,
    Pos,
    Ety,
    Rel,
    Info,
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Input dictionary text (.txt or .txt.bz2)
    input: PathBuf,

    /// Output JSON file
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Document)]
    format: OutputFormat,

    /// Processing strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::ChannelPipeline)]
    strategy: Strategy,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Batch size for batch-parallel strategy
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Channel buffer size for channel-pipeline strategy
    #[arg(long, default_value_t = 10000)]
    channel_buffer: usize,

    /// Limit number of entries to write (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// Vocabulary schema YAML replacing the built-in one
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Also write a search index here
    #[arg(long)]
    index: Option<PathBuf>,

    /// Also write one document per initial letter into this directory
    #[arg(long)]
    split_dir: Option<PathBuf>,

    /// File name prefix for split documents
    #[arg(long, default_value = "OxfordDict")]
    split_prefix: String,

    /// Document title
    #[arg(long, default_value = output::DEFAULT_TITLE)]
    title: String,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let schema = Schema::load_or_builtin(args.schema.as_deref())?;
    let parser = Arc::new(EntryParser::new(&schema)?);

    let mut config = ParallelConfig::default();
    if args.threads > 0 {
        config.num_threads = args.threads;
        config.num_workers = args.threads.saturating_sub(1).max(1);
    }
    config.batch_size = args.batch_size;
    config.channel_buffer = args.channel_buffer;

    let options = ParseOptions {
        limit: args.limit,
        cancel: None,
        quiet: args.quiet,
    };

    if !args.quiet {
        println!("Parsing: {}", args.input.display());
        println!("Output: {}", args.output.display());
        println!("Strategy: {:?}", args.strategy);
        if args.strategy != Strategy::Sequential {
            println!("Threads: {}", config.num_threads);
        }
        if let Some(limit) = args.limit {
            println!("Limit: {} entries", limit);
        }
        println!();
    }

    let reader = open_input(&args.input)?;

    // Plain JSON lines stream straight to disk; everything else needs the entries
    let collect = args.format == OutputFormat::Document || args.index.is_some() || args.split_dir.is_some();
    let stats = if collect {
        let mut entries: Vec<DictionaryEntry> = Vec::new();
        let stats = run_strategy(args.strategy, reader, &parser, &mut entries, &config, &options)?;
        write_outputs(&args, entries)?;
        stats
    } else {
        let mut sink = JsonLinesSink::new(File::create(&args.output)?);
        run_strategy(args.strategy, reader, &parser, &mut sink, &config, &options)?
    };

    if !args.quiet {
        print_stats(&stats, &format!("{:?}", args.strategy));
    }
    Ok(())
}

fn write_outputs(args: &ParseArgs, entries: Vec<DictionaryEntry>) -> Result<()> {
    match args.format {
        OutputFormat::Document => {
            let document = DictionaryDocument::new(&args.title, entries);
            output::save_document(&args.output, &document)?;
            finish_outputs(args, document.entries)
        }
        OutputFormat::Jsonl => {
            output::write_lines(File::create(&args.output)?, &entries)?;
            info!("Wrote {} entries to {}", entries.len(), args.output.display());
            finish_outputs(args, entries)
        }
    }
}

fn finish_outputs(args: &ParseArgs, entries: Vec<DictionaryEntry>) -> Result<()> {
    if let Some(path) = &args.index {
        SearchIndex::build(&entries).save(path)?;
        if !args.quiet {
            println!("Search index saved to: {}", path.display());
        }
    }
    if let Some(dir) = &args.split_dir {
        let written = output::write_split(dir, &args.split_prefix, &args.title, entries)?;
        if !args.quiet {
            println!("Split into {} files in {}", written.len(), dir.display());
        }
    }
    Ok(())
}

fn run_index(dict: &Path, output_path: &Path) -> Result<()> {
    let entries = output::load_entries(dict)?;
    println!("Indexing {} entries...", entries.len());
    let index = SearchIndex::build(&entries);
    index.save(output_path)?;

    println!("Index statistics:");
    println!("  Total words: {}", index.by_word.len());
    println!("  Definition keywords: {}", index.by_definition.len());
    let tags: Vec<&str> = index.by_pos.keys().map(String::as_str).collect();
    println!("  Parts of speech: {}", tags.join(", "));
    Ok(())
}

fn print_list(entries: &[&DictionaryEntry]) {
    println!("Found {} entries:", entries.len());
    for entry in entries {
        println!("  - {}", entry.word);
    }
}

fn run_search(dict: &Path, query: &str, by: SearchBy, limit: usize) -> Result<()> {
    let searcher = Searcher::new(output::load_entries(dict)?);
    match by {
        SearchBy::Word => match searcher.by_word(query) {
            Some(entry) => println!("{}", search::format_entry(entry)),
            None => println!("Word '{}' not found", query),
        },
        SearchBy::Prefix => print_list(&searcher.by_prefix(query, limit)),
        SearchBy::Definition => print_list(&searcher.by_definition(query, limit)),
        SearchBy::Pos => print_list(&searcher.by_part_of_speech(query, limit)),
        SearchBy::Ety => print_list(&searcher.by_etymology_language(query, limit)),
        SearchBy::Rel => print_list(&searcher.by_related_word(query, limit)),
        SearchBy::Info => {
            if let Some(reply) = searcher.respond(&format!("info {}", query)) {
                println!("{}", reply);
            }
        }
    }
    Ok(())
}

fn run_shell(dict: &Path) -> Result<()> {
    let searcher = Searcher::new(output::load_entries(dict)?);
    println!("Loaded {} entries", searcher.len());
    println!();
    println!("============================================================");
    println!("Oxford Dictionary Search");
    println!("============================================================");
    println!("{}", search::SHELL_HELP);
    println!("============================================================");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("search> ");
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match searcher.respond(&line) {
            Some(reply) if reply.is_empty() => continue,
            Some(reply) => println!("\n{}\n", reply),
            None => {
                println!("Goodbye!");
                break;
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::Parse(args) = &cli.command {
        // --limit requires sequential mode for early termination
        if args.limit.is_some() && args.strategy != Strategy::Sequential {
            eprintln!(
                "Error: --limit requires --strategy sequential for efficient early termination.\n\
                 Parallel strategies process blocks out of order and reorder results,\n\
                 which means they cannot stop early when the limit is reached."
            );
            std::process::exit(1);
        }
    }

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Index { dict, output } => run_index(&dict, &output),
        Command::Search { dict, query, by, limit } => run_search(&dict, &query, by, limit),
        Command::Shell { dict } => run_shell(&dict),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
