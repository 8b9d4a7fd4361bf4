use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use corpus_segmenter::{
    sentence_windows, split, verify, SegmentedChunk, Segmenter, SegmenterConfig, SentencePolicy,
    Tokenizer, WhitespaceTokenizer, DEFAULT_ANCHORING_THRESHOLD, DEFAULT_WINDOW_SIZES,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

mod inputs;
mod output;
mod report;
mod tokenizer;

use inputs::InputFile;
use output::{OutputWriter, WrittenCounts, COMPACT_FILE, REPORT_FILE};
use report::{render_verification_report, ReportMeta};
use tokenizer::{PretrainedTokenizer, TokenizerChoice};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "corpus-segment")]
#[command(about = "Hierarchical chunk / sub-chunk / sentence segmentation of text corpora", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment text files into chunks, sub-chunks and sentences
    Segment(SegmentArgs),

    /// Re-verify a previously written output directory
    Verify(VerifyArgs),

    /// Write sentences_compact.jsonl ordered by chunk, sub-chunk and sentence
    Compact(CompactArgs),

    /// Print the sentences of one text (use `-` to read stdin)
    Split(SplitArgs),
}

#[derive(Args)]
struct SegmentArgs {
    /// Files or directories (directories expand to sorted *.txt files)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the JSONL records and verification report
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// TOML file with segmenter settings (flags override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chunk window in tokens
    #[arg(long)]
    chunk_window: Option<usize>,

    /// Sub-chunk window in tokens
    #[arg(long)]
    subchunk_window: Option<usize>,

    /// Sentence policy: simple|strict
    #[arg(long)]
    policy: Option<String>,

    /// Tokenizer: `whitespace` or a path to a tokenizer.json
    #[arg(long, default_value = "whitespace")]
    tokenizer: String,

    /// Minimum anchoring ratio before chunks are flagged
    #[arg(long)]
    threshold: Option<f64>,

    /// Segment chunks one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Also write rolling 2- and 3-sentence windows
    #[arg(long)]
    windows: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Exit with an error when verification is not healthy
    #[arg(long)]
    strict_verify: bool,
}

#[derive(Args)]
struct VerifyArgs {
    /// Output directory written by `segment`
    #[arg(default_value = "outputs")]
    out_dir: PathBuf,

    /// Minimum anchoring ratio before chunks are flagged
    #[arg(long, default_value_t = DEFAULT_ANCHORING_THRESHOLD)]
    threshold: f64,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Exit with an error when verification is not healthy
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct CompactArgs {
    /// Output directory written by `segment`
    #[arg(default_value = "outputs")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct SplitArgs {
    /// Text to split, or `-` to read stdin
    text: String,

    /// Sentence policy: simple|strict
    #[arg(long, default_value = "strict")]
    policy: String,

    /// Print sentences with spans as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct FileSummary {
    source: String,
    tokens: usize,
    chunks: usize,
    sub_chunks: usize,
    sentences: usize,
    anchored: usize,
    first_chunk: Option<String>,
}

#[derive(Debug, Serialize)]
struct SegmentSummary {
    tokenizer: String,
    policy: SentencePolicy,
    chunk_window: usize,
    subchunk_window: usize,
    out_dir: String,
    files: Vec<FileSummary>,
    written: WrittenCounts,
    anchoring_ratio: f64,
    healthy: bool,
    duration_ms: u64,
}

pub fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::Segment(args) => args.json,
        Commands::Verify(args) => args.json,
        Commands::Compact(_) => false,
        Commands::Split(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // Tokenizer internals are noisy below warn.
    if !cli.verbose {
        builder.filter_module("tokenizers", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Segment(args) => run_segment(args)?,
        Commands::Verify(args) => run_verify(args)?,
        Commands::Compact(args) => run_compact(args)?,
        Commands::Split(args) => run_split(args)?,
    }

    Ok(())
}

fn run_segment(args: SegmentArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let files = inputs::discover(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No input files found");
    }

    let summary = match TokenizerChoice::parse(&args.tokenizer) {
        TokenizerChoice::Whitespace => segment_files(&args, config, WhitespaceTokenizer, &files)?,
        TokenizerChoice::Pretrained(path) => {
            let tokenizer = PretrainedTokenizer::from_file(&path)?;
            segment_files(&args, config, tokenizer, &files)?
        }
    };

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&summary)?)?;
    } else {
        print_stdout(&format!(
            "Segmented {} files: {} chunks, {} sub-chunks, {} sentences ({} ms)",
            summary.files.len(),
            summary.written.chunks,
            summary.written.sub_chunks,
            summary.written.sentences,
            summary.duration_ms
        ))?;
        print_stdout(&format!(
            "Anchoring ratio {:.4} ({})",
            summary.anchoring_ratio,
            if summary.healthy { "healthy" } else { "attention" }
        ))?;
        print_stdout(&format!("Outputs written to {}", summary.out_dir))?;
    }

    if !summary.healthy {
        let report_path = args.out_dir.join(REPORT_FILE);
        if args.strict_verify {
            anyhow::bail!("Verification failed, see {}", report_path.display());
        }
        log::warn!("Verification needs attention, see {}", report_path.display());
    }

    Ok(())
}

fn resolve_config(args: &SegmentArgs) -> Result<SegmenterConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SegmenterConfig::default(),
    };

    if let Some(chunk_window) = args.chunk_window {
        config.chunk_window = chunk_window;
    }
    if let Some(subchunk_window) = args.subchunk_window {
        config.subchunk_window = subchunk_window;
    }
    if let Some(policy) = &args.policy {
        config.policy = policy.parse()?;
    }
    if let Some(threshold) = args.threshold {
        config.anchoring_threshold = threshold;
    }
    if args.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<SegmenterConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn segment_files<T: Tokenizer>(
    args: &SegmentArgs,
    config: SegmenterConfig,
    tokenizer: T,
    files: &[InputFile],
) -> Result<SegmentSummary> {
    let started = Instant::now();
    let segmenter = Segmenter::new(config, tokenizer)?;
    let config = segmenter.config();
    log::info!(
        "Segmenting {} files (tokenizer={}, policy={}, windows={}/{})",
        files.len(),
        segmenter.tokenizer().name(),
        config.policy,
        config.chunk_window,
        config.subchunk_window
    );

    let mut writer = OutputWriter::create(&args.out_dir, args.windows)?;
    let mut all_chunks: Vec<SegmentedChunk> = Vec::new();
    let mut summaries = Vec::with_capacity(files.len());
    let mut base = 0;

    for file in files {
        let text = inputs::read_text(&file.path)?;
        let document = segmenter
            .segment(&file.source, &text, base)
            .with_context(|| format!("failed to segment {}", file.path.display()))?;

        log::info!(
            "{}: {} tokens, {} chunks, {} sentences",
            file.source,
            document.total_tokens,
            document.chunks.len(),
            document.sentence_count()
        );

        writer.write_document(&document)?;
        if args.windows {
            for chunk in &document.chunks {
                writer.write_windows(&sentence_windows(chunk, &DEFAULT_WINDOW_SIZES))?;
            }
        }

        summaries.push(FileSummary {
            source: file.source.clone(),
            tokens: document.total_tokens,
            chunks: document.chunks.len(),
            sub_chunks: document.subchunk_count(),
            sentences: document.sentence_count(),
            anchored: document.anchored_count(),
            first_chunk: document.chunks.first().map(|c| c.chunk.id.clone()),
        });
        base = document.next_base;
        all_chunks.extend(document.chunks);
    }

    let written = writer.finish()?;
    let report = verify(&all_chunks, config.anchoring_threshold);
    let meta = ReportMeta {
        sources: summaries.iter().map(|s| s.source.clone()).collect(),
        tokenizer: Some(segmenter.tokenizer().name().to_string()),
        policy: Some(config.policy.to_string()),
        chunk_window: Some(config.chunk_window),
        subchunk_window: Some(config.subchunk_window),
    };
    let report_path = args.out_dir.join(REPORT_FILE);
    fs::write(&report_path, render_verification_report(&report, &meta))
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    Ok(SegmentSummary {
        tokenizer: segmenter.tokenizer().name().to_string(),
        policy: config.policy,
        chunk_window: config.chunk_window,
        subchunk_window: config.subchunk_window,
        out_dir: args.out_dir.display().to_string(),
        files: summaries,
        written,
        anchoring_ratio: report.anchoring_ratio,
        healthy: report.is_healthy(),
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.threshold) {
        anyhow::bail!("Threshold must be within [0, 1], got {}", args.threshold);
    }

    let chunks = output::load_segmented(&args.out_dir)
        .with_context(|| format!("failed to load records from {}", args.out_dir.display()))?;
    let report = verify(&chunks, args.threshold);

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        let sources: BTreeSet<&str> = chunks.iter().map(|c| c.chunk.source.as_str()).collect();
        let meta = ReportMeta {
            sources: sources.into_iter().map(str::to_string).collect(),
            ..ReportMeta::default()
        };
        print_stdout(&render_verification_report(&report, &meta))?;
    }

    if args.strict && !report.is_healthy() {
        anyhow::bail!("Verification failed for {}", args.out_dir.display());
    }
    Ok(())
}

fn run_compact(args: CompactArgs) -> Result<()> {
    let rows = output::write_compact(&args.out_dir)?;
    print_stdout(&format!(
        "Wrote {rows} sentences to {}",
        args.out_dir.join(COMPACT_FILE).display()
    ))
}

fn run_split(args: SplitArgs) -> Result<()> {
    let policy: SentencePolicy = args.policy.parse()?;
    let text = if args.text == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        args.text
    };

    let sentences = split(&inputs::normalize_newlines(&text), policy);
    if args.json {
        print_stdout(&serde_json::to_string_pretty(&sentences)?)?;
    } else {
        for sentence in &sentences {
            print_stdout(&format!(
                "{}\t{}\t{}",
                sentence.span.start, sentence.span.end, sentence.text
            ))?;
        }
    }
    Ok(())
}
