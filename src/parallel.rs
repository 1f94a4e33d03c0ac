//! Processing strategies over segmented dictionary blocks.
//!
//! All strategies use only std threads and produce entries in source order:
//! - Sequential (baseline)
//! - Batch-parallel (std::thread on batches of blocks)
//! - Channel-pipeline (reader thread, worker threads, reorder buffer)
//! - Two-phase (read all blocks, then process in parallel)

use crate::assemble::EntryParser;
use crate::error::Result;
use crate::model::DictionaryEntry;
use crate::output::EntrySink;
use crate::segment::{EntrySegmenter, RawBlock};
use crate::source::DictLines;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Processing strategy for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Sequential processing (baseline, supports --limit)
    Sequential,
    /// Batch-parallel processing with a thread per chunk
    BatchParallel,
    /// Channel-based pipeline processing
    ChannelPipeline,
    /// Two-phase: load all blocks, then process in parallel
    TwoPhase,
}

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub num_threads: usize,
    /// Blocks per batch for batch-parallel processing
    pub batch_size: usize,
    /// Channel buffer size for pipeline processing
    pub channel_buffer: usize,
    /// Number of worker threads for pipeline
    pub num_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism().map(|p| p.get()).unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 1000,
            channel_buffer: 10000,
            num_workers: cpus.saturating_sub(1).max(1),
        }
    }
}

/// Per-run controls shared by every strategy
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Stop after this many entries have been written
    pub limit: Option<usize>,
    /// Set from outside to stop between entries
    pub cancel: Option<Arc<AtomicBool>>,
    /// Hide the progress spinner
    pub quiet: bool,
}

impl ParseOptions {
    fn cancelled(&self) -> bool {
        is_set(&self.cancel)
    }
}

fn is_set(flag: &Option<Arc<AtomicBool>>) -> bool {
    flag.as_ref().map_or(false, |f| f.load(Ordering::Relaxed))
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub blocks_segmented: usize,
    pub entries_written: usize,
    pub entries_dropped: usize,
    pub parts_written: usize,
    pub variants_written: usize,
    pub limit_reached: bool,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Outcome of parsing one block
#[derive(Debug)]
pub struct ProcessedBlock {
    pub id: usize,
    pub entry: Option<DictionaryEntry>,
}

fn process_block(parser: &EntryParser, block: RawBlock) -> ProcessedBlock {
    ProcessedBlock {
        id: block.id,
        entry: parser.parse_block(&block),
    }
}

/// Count a processed block and hand its entry to the sink.
/// Returns `false` once processing should stop.
fn record<S: EntrySink>(
    stats: &mut Stats,
    sink: &mut S,
    result: ProcessedBlock,
    options: &ParseOptions,
) -> Result<bool> {
    if options.cancelled() {
        stats.cancelled = true;
        return Ok(false);
    }

    stats.blocks_segmented += 1;
    match result.entry {
        Some(entry) => {
            stats.parts_written += entry.parts.len();
            stats.variants_written += entry.parts.iter().map(|p| p.variants.len()).sum::<usize>();
            sink.accept(entry)?;
            stats.entries_written += 1;
        }
        None => stats.entries_dropped += 1,
    }

    if let Some(limit) = options.limit {
        if stats.entries_written >= limit {
            stats.limit_reached = true;
            return Ok(false);
        }
    }
    Ok(true)
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb
}

/// Strategy 0: parse blocks one by one as they are segmented
pub fn run_sequential<R: BufRead, S: EntrySink>(
    reader: R,
    parser: &EntryParser,
    sink: &mut S,
    options: &ParseOptions,
) -> Result<Stats> {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let pb = spinner(options.quiet);

    let mut lines = DictLines::new(reader);
    for block in EntrySegmenter::new(&mut lines) {
        if options.cancelled() {
            stats.cancelled = true;
            break;
        }
        let result = process_block(parser, block);
        if !record(&mut stats, sink, result, options)? {
            break;
        }

        if stats.blocks_segmented % 1000 == 0 {
            let rate = stats.blocks_segmented as f64 / start_time.elapsed().as_secs_f64();
            pb.set_message(format!(
                "Blocks: {} | Entries: {} | Dropped: {} | Rate: {:.0} blk/s",
                stats.blocks_segmented, stats.entries_written, stats.entries_dropped, rate
            ));
        }
    }
    lines.finish()?;

    if stats.limit_reached {
        pb.finish_with_message(format!("Reached limit of {} entries", stats.entries_written));
    } else {
        pb.finish_and_clear();
    }

    sink.finish()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Strategy 1: Batch-Parallel Processing using std::thread.
/// Collects blocks into batches, then splits each batch across threads.
pub fn process_batch_parallel<R: BufRead, S: EntrySink>(
    reader: R,
    parser: &Arc<EntryParser>,
    sink: &mut S,
    config: &ParallelConfig,
    options: &ParseOptions,
) -> Result<Stats> {
    let start_time = Instant::now();
    let mut stats = Stats::default();
    let batch_size = config.batch_size.max(1);
    let mut batch: Vec<RawBlock> = Vec::with_capacity(batch_size);
    let mut stopped = false;

    let mut lines = DictLines::new(reader);
    let mut blocks = EntrySegmenter::new(&mut lines);

    while !stopped && !options.cancelled() {
        batch.extend(blocks.by_ref().take(batch_size));
        if batch.is_empty() {
            break;
        }

        let results = process_batch_threaded(std::mem::take(&mut batch), parser, config.num_threads, &options.cancel);
        for result in results {
            if !record(&mut stats, sink, result, options)? {
                stopped = true;
                break;
            }
        }
    }
    drop(blocks);
    lines.finish()?;
    stats.cancelled |= options.cancelled();

    sink.finish()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Split `blocks` into contiguous chunks and parse each chunk on its own
/// thread. Results come back in block order. Each thread stops parsing
/// once `cancel` is set, so a cancelled batch comes back short.
fn process_batch_threaded(
    blocks: Vec<RawBlock>,
    parser: &Arc<EntryParser>,
    num_threads: usize,
    cancel: &Option<Arc<AtomicBool>>,
) -> Vec<ProcessedBlock> {
    if blocks.is_empty() {
        return vec![];
    }

    let total = blocks.len();
    let num_threads = num_threads.min(total).max(1);
    let chunk_size = (total + num_threads - 1) / num_threads;

    let mut chunks: Vec<Vec<RawBlock>> = Vec::with_capacity(num_threads);
    let mut iter = blocks.into_iter().peekable();
    while iter.peek().is_some() {
        chunks.push(iter.by_ref().take(chunk_size).collect());
    }

    let handles: Vec<JoinHandle<Vec<ProcessedBlock>>> = chunks
        .into_iter()
        .map(|chunk| {
            let parser = Arc::clone(parser);
            let cancel = cancel.clone();
            thread::spawn(move || {
                chunk
                    .into_iter()
                    .take_while(|_| !is_set(&cancel))
                    .map(|block| process_block(&parser, block))
                    .collect()
            })
        })
        .collect();

    let mut results = Vec::with_capacity(total);
    for handle in handles {
        match handle.join() {
            Ok(chunk_results) => results.extend(chunk_results),
            Err(_) => warn!("Worker thread panicked; its blocks are skipped"),
        }
    }
    results
}

/// Strategy 2: Channel-Pipeline Processing using std::sync::mpsc.
/// A reader thread segments blocks, worker threads parse them, and the
/// calling thread restores block order before handing entries to the sink.
pub fn process_channel_pipeline<R, S>(
    reader: R,
    parser: &Arc<EntryParser>,
    sink: &mut S,
    config: &ParallelConfig,
    options: &ParseOptions,
) -> Result<Stats>
where
    R: BufRead + Send + 'static,
    S: EntrySink,
{
    let (block_tx, block_rx): (SyncSender<RawBlock>, Receiver<RawBlock>) = sync_channel(config.channel_buffer);
    let (result_tx, result_rx): (SyncSender<ProcessedBlock>, Receiver<ProcessedBlock>) =
        sync_channel(config.channel_buffer);

    let stop = Arc::new(AtomicBool::new(false));
    let start_time = Instant::now();

    let reader_stop = Arc::clone(&stop);
    let reader_cancel = options.cancel.clone();
    let reader_handle =
        thread::spawn(move || read_blocks_to_channel(reader, block_tx, &reader_stop, &reader_cancel));

    let block_rx = Arc::new(Mutex::new(block_rx));
    let worker_handles: Vec<JoinHandle<()>> = (0..config.num_workers.max(1))
        .map(|_| {
            let rx = Arc::clone(&block_rx);
            let tx = result_tx.clone();
            let parser = Arc::clone(parser);
            let worker_stop = Arc::clone(&stop);
            let cancel = options.cancel.clone();
            thread::spawn(move || process_blocks_worker(rx, tx, &parser, &worker_stop, &cancel))
        })
        .collect();

    // Drop extra handles so channels close when the threads finish
    drop(result_tx);
    drop(block_rx);

    let written = write_results_sorted(result_rx, sink, options, &stop);

    let read = match reader_handle.join() {
        Ok(read) => read,
        Err(_) => {
            warn!("Reader thread panicked");
            Ok(0)
        }
    };
    for handle in worker_handles {
        if handle.join().is_err() {
            warn!("Worker thread panicked");
        }
    }

    let mut stats = written?;
    let read = read?;
    stats.cancelled |= options.cancelled();
    if !stats.limit_reached && !stats.cancelled && read != stats.blocks_segmented {
        warn!("Read {} blocks but only {} were processed", read, stats.blocks_segmented);
    }

    sink.finish()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

fn read_blocks_to_channel<R: BufRead>(
    reader: R,
    tx: SyncSender<RawBlock>,
    stop: &AtomicBool,
    cancel: &Option<Arc<AtomicBool>>,
) -> Result<usize> {
    let mut count = 0;
    let mut lines = DictLines::new(reader);

    for block in EntrySegmenter::new(&mut lines) {
        if stop.load(Ordering::Relaxed) || is_set(cancel) || tx.send(block).is_err() {
            return Ok(count);
        }
        count += 1;
    }

    lines.finish()?;
    Ok(count)
}

fn process_blocks_worker(
    rx: Arc<Mutex<Receiver<RawBlock>>>,
    tx: SyncSender<ProcessedBlock>,
    parser: &EntryParser,
    stop: &AtomicBool,
    cancel: &Option<Arc<AtomicBool>>,
) {
    loop {
        if stop.load(Ordering::Relaxed) || is_set(cancel) {
            break;
        }

        // Next block from the shared receiver
        let block = {
            let lock = rx.lock().ok();
            lock.and_then(|guard| guard.recv().ok())
        };

        match block {
            Some(block) => {
                if tx.send(process_block(parser, block)).is_err() {
                    break;
                }
            }
            None => break,
        }
    }
}

/// Drain results, emitting them strictly by block id
fn write_results_sorted<S: EntrySink>(
    rx: Receiver<ProcessedBlock>,
    sink: &mut S,
    options: &ParseOptions,
    stop: &AtomicBool,
) -> Result<Stats> {
    let mut stats = Stats::default();
    let mut pending: BTreeMap<usize, ProcessedBlock> = BTreeMap::new();
    let mut next_id = 0;

    while let Ok(result) = rx.recv() {
        pending.insert(result.id, result);

        while let Some(result) = pending.remove(&next_id) {
            next_id += 1;
            if !record(&mut stats, sink, result, options)? {
                stop.store(true, Ordering::SeqCst);
                return Ok(stats);
            }
        }
    }

    // Ids missing after a worker panic leave gaps; flush what is left in order
    for (_, result) in pending {
        if !record(&mut stats, sink, result, options)? {
            stop.store(true, Ordering::SeqCst);
            break;
        }
    }
    Ok(stats)
}

/// Strategy 3: Two-Phase Processing
/// Phase 1: Read all blocks into memory
/// Phase 2: Process all blocks in parallel with multiple threads
pub fn process_two_phase<R: BufRead, S: EntrySink>(
    reader: R,
    parser: &Arc<EntryParser>,
    sink: &mut S,
    config: &ParallelConfig,
    options: &ParseOptions,
) -> Result<Stats> {
    let start_time = Instant::now();

    let mut lines = DictLines::new(reader);
    let blocks: Vec<RawBlock> = EntrySegmenter::new(&mut lines)
        .take_while(|_| !options.cancelled())
        .collect();
    lines.finish()?;
    info!("Phase 1: read {} blocks in {:?}", blocks.len(), start_time.elapsed());

    let process_start = Instant::now();
    let results = process_batch_threaded(blocks, parser, config.num_threads, &options.cancel);
    info!(
        "Phase 2: processed {} blocks with {} threads in {:?}",
        results.len(),
        config.num_threads,
        process_start.elapsed()
    );

    let mut stats = Stats::default();
    for result in results {
        if !record(&mut stats, sink, result, options)? {
            break;
        }
    }
    stats.cancelled |= options.cancelled();

    sink.finish()?;
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Run `strategy` over `reader`
pub fn run_strategy<R, S>(
    strategy: Strategy,
    reader: R,
    parser: &Arc<EntryParser>,
    sink: &mut S,
    config: &ParallelConfig,
    options: &ParseOptions,
) -> Result<Stats>
where
    R: BufRead + Send + 'static,
    S: EntrySink,
{
    match strategy {
        Strategy::Sequential => run_sequential(reader, parser, sink, options),
        Strategy::BatchParallel => process_batch_parallel(reader, parser, sink, config, options),
        Strategy::ChannelPipeline => process_channel_pipeline(reader, parser, sink, config, options),
        Strategy::TwoPhase => process_two_phase(reader, parser, sink, config, options),
    }
}

pub fn print_stats(stats: &Stats, strategy_name: &str) {
    println!();
    println!("============================================================");
    println!("Strategy: {}", strategy_name);
    println!("Blocks segmented: {}", stats.blocks_segmented);
    println!("Entries written: {}", stats.entries_written);
    println!("Entries dropped: {}", stats.entries_dropped);
    println!("Parts written: {}", stats.parts_written);
    println!("Variants written: {}", stats.variants_written);
    println!("Avg parts/entry: {:.2}", stats.parts_written as f64 / stats.entries_written.max(1) as f64);
    if stats.limit_reached {
        println!("Stopped at entry limit");
    }
    if stats.cancelled {
        println!("Cancelled");
    }
    println!("Time: {}m {}s", stats.elapsed.as_secs() / 60, stats.elapsed.as_secs() % 60);
    println!(
        "Rate: {:.0} blocks/sec",
        stats.blocks_segmented as f64 / stats.elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("============================================================");
}

#[cfg(test)]
mod parallel_tests {
    use super::*;
    use std::io::Cursor;

    const TEXT: &str = "\
front matter
Aardvark  n. Mammal with a tubular snout. [afrikaans]
Abacus  n. (pl. -cuses) 1 frame with wires. 2 archit. Flat slab on top of a capital. [latin]
Abc  ... ;;
Abaft  naut. —adv. In the stern half of a ship. —prep. Nearer the stern than.
Abandon  v. 1 give up. 2 forsake, desert. —n. Freedom from inhibitions.\u{7f} abandonment n.
Abase  v. (also refl.) Humiliate, degrade.
Abate  v. (-ting) Make or become less strong.
";

    fn parser() -> Arc<EntryParser> {
        Arc::new(EntryParser::with_builtin_schema().unwrap())
    }

    fn small_config() -> ParallelConfig {
        ParallelConfig {
            num_threads: 3,
            batch_size: 2,
            channel_buffer: 1,
            num_workers: 3,
        }
    }

    fn quiet() -> ParseOptions {
        ParseOptions {
            quiet: true,
            ..Default::default()
        }
    }

    fn run(strategy: Strategy, options: &ParseOptions) -> (Vec<DictionaryEntry>, Stats) {
        let mut entries: Vec<DictionaryEntry> = Vec::new();
        let stats = run_strategy(
            strategy,
            Cursor::new(TEXT.as_bytes().to_vec()),
            &parser(),
            &mut entries,
            &small_config(),
            options,
        )
        .unwrap();
        (entries, stats)
    }

    fn words(entries: &[DictionaryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.word.as_str()).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Ordering and equivalence
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn sequential_keeps_source_order() {
        let (entries, stats) = run(Strategy::Sequential, &quiet());
        assert_eq!(words(&entries), vec!["Aardvark", "Abacus", "Abaft", "Abandon", "Abase", "Abate"]);
        assert_eq!(stats.blocks_segmented, 7);
        assert_eq!(stats.entries_dropped, 1);
    }

    #[test]
    fn all_strategies_agree() {
        let (expected, _) = run(Strategy::Sequential, &quiet());
        for strategy in [Strategy::BatchParallel, Strategy::ChannelPipeline, Strategy::TwoPhase] {
            let (entries, stats) = run(strategy, &quiet());
            assert_eq!(entries, expected, "{:?} diverged", strategy);
            assert_eq!(stats.entries_written, expected.len());
        }
    }

    #[test]
    fn repeated_pipeline_runs_are_identical() {
        let (first, _) = run(Strategy::ChannelPipeline, &quiet());
        for _ in 0..5 {
            let (again, _) = run(Strategy::ChannelPipeline, &quiet());
            assert_eq!(again, first);
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Limits and cancellation
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn limit_stops_early() {
        let options = ParseOptions {
            limit: Some(2),
            quiet: true,
            ..Default::default()
        };
        let (entries, stats) = run(Strategy::Sequential, &options);
        assert_eq!(words(&entries), vec!["Aardvark", "Abacus"]);
        assert!(stats.limit_reached);
    }

    #[test]
    fn limit_in_pipeline_keeps_prefix() {
        let options = ParseOptions {
            limit: Some(3),
            quiet: true,
            ..Default::default()
        };
        let (entries, _) = run(Strategy::ChannelPipeline, &options);
        assert_eq!(words(&entries), vec!["Aardvark", "Abacus", "Abaft"]);
    }

    #[test]
    fn cancelled_run_writes_nothing() {
        let options = ParseOptions {
            cancel: Some(Arc::new(AtomicBool::new(true))),
            quiet: true,
            ..Default::default()
        };
        for strategy in [
            Strategy::Sequential,
            Strategy::BatchParallel,
            Strategy::ChannelPipeline,
            Strategy::TwoPhase,
        ] {
            let (entries, stats) = run(strategy, &options);
            assert!(entries.is_empty(), "{:?} wrote entries", strategy);
            assert!(stats.cancelled, "{:?} not marked cancelled", strategy);
            assert_eq!(stats.blocks_segmented, 0, "{:?} handled blocks", strategy);
        }
    }

    #[test]
    fn cancelled_threads_parse_nothing() {
        let blocks = crate::segment::segment_text(TEXT);
        assert_eq!(blocks.len(), 7);
        let cancel = Some(Arc::new(AtomicBool::new(true)));
        assert!(process_batch_threaded(blocks.clone(), &parser(), 3, &cancel).is_empty());
        assert_eq!(process_batch_threaded(blocks, &parser(), 3, &None).len(), 7);
    }

    /// Raises the cancel flag as soon as it receives its first entry
    struct CancellingSink {
        flag: Arc<AtomicBool>,
        entries: Vec<DictionaryEntry>,
    }

    impl EntrySink for CancellingSink {
        fn accept(&mut self, entry: DictionaryEntry) -> Result<()> {
            self.entries.push(entry);
            self.flag.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn cancel_mid_run_stops_after_current_entry() {
        for strategy in [Strategy::Sequential, Strategy::BatchParallel, Strategy::TwoPhase] {
            let flag = Arc::new(AtomicBool::new(false));
            let options = ParseOptions {
                cancel: Some(Arc::clone(&flag)),
                quiet: true,
                ..Default::default()
            };
            let mut sink = CancellingSink {
                flag,
                entries: Vec::new(),
            };
            let stats = run_strategy(
                strategy,
                Cursor::new(TEXT.as_bytes().to_vec()),
                &parser(),
                &mut sink,
                &small_config(),
                &options,
            )
            .unwrap();
            assert_eq!(words(&sink.entries), vec!["Aardvark"], "{:?}", strategy);
            assert_eq!(stats.blocks_segmented, 1, "{:?}", strategy);
            assert!(stats.cancelled);
        }
    }

    #[test]
    fn empty_input_is_fine() {
        let mut entries: Vec<DictionaryEntry> = Vec::new();
        let stats = process_channel_pipeline(
            Cursor::new(Vec::new()),
            &parser(),
            &mut entries,
            &small_config(),
            &quiet(),
        )
        .unwrap();
        assert!(entries.is_empty());
        assert_eq!(stats.blocks_segmented, 0);
    }
}
