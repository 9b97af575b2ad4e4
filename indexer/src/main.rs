use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lexidx::{
    CodecKind, DocId, IndexConfig, InvertedIndex, Language, NaiveMatcher, NormalizingTokenizer, Tokenizer,
    TokenizerConfig, WhitespaceTokenizer,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    text: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load (id, text) records into an in-memory inverted index and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadOpts {
    /// Input path (JSON/JSONL file or directory of them)
    #[arg(long)]
    input: String,
    /// Code family used when compressing postings
    #[arg(long, default_value_t = CodecKind::Delta)]
    codec: CodecKind,
    /// Stemming language for the normalizing tokenizer
    #[arg(long, default_value_t = Language::English)]
    language: Language,
    /// Drop English stopwords before positions are assigned
    #[arg(long, default_value_t = false)]
    stopwords: bool,
    /// Tokenizer cache capacity per cache (0 disables caching)
    #[arg(long, default_value_t = lexidx::config::DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,
    /// Split on whitespace only, no normalization
    #[arg(long, default_value_t = false)]
    whitespace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents for a query
    Search {
        #[command(flatten)]
        load: LoadOpts,
        #[arg(long)]
        query: String,
        /// Compress postings before querying
        #[arg(long, default_value_t = false)]
        compress: bool,
        /// Require every query term (strict AND) instead of first-term ranking
        #[arg(long, default_value_t = false)]
        all: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run the naive scan and the index side by side
    Compare {
        #[command(flatten)]
        load: LoadOpts,
        #[arg(long)]
        query: String,
    },
    /// Print index statistics before and after compression
    Stats {
        #[command(flatten)]
        load: LoadOpts,
    },
}

#[derive(Serialize)]
struct CompareReport {
    query: String,
    naive_hits: usize,
    naive_s: f64,
    indexed_hits: usize,
    indexed_s: f64,
    ranked_hits: usize,
    ranked_s: f64,
    naive_subset_of_ranked: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { load, query, compress, all, limit } => search(&load, &query, compress, all, limit),
        Commands::Compare { load, query } => compare(&load, &query),
        Commands::Stats { load } => stats(&load),
    }
}

fn tokenizer(opts: &LoadOpts) -> Arc<dyn Tokenizer> {
    if opts.whitespace {
        return Arc::new(WhitespaceTokenizer);
    }
    Arc::new(NormalizingTokenizer::new(TokenizerConfig {
        language: opts.language,
        remove_stopwords: opts.stopwords,
        cache_capacity: opts.cache_capacity,
    }))
}

fn build_index(opts: &LoadOpts, tok: Arc<dyn Tokenizer>, records: &[InputDoc]) -> Result<InvertedIndex> {
    let start = Instant::now();
    let mut index = InvertedIndex::with_config(tok, IndexConfig { codec: opts.codec });
    index.extend_documents(records.iter().map(|r| (r.id, r.text.as_str())))?;
    tracing::info!(
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        took_s = start.elapsed().as_secs_f64(),
        "ingested documents"
    );
    Ok(index)
}

fn search(opts: &LoadOpts, query: &str, compress: bool, all: bool, limit: usize) -> Result<()> {
    let records = load_records(Path::new(&opts.input))?;
    let mut index = build_index(opts, tokenizer(opts), &records)?;
    if compress {
        index.compress()?;
    }
    let hits = if all { index.search_all(query)? } else { index.search(query)? };
    tracing::info!(query, total_hits = hits.len(), "search complete");
    for hit in hits.iter().take(limit) {
        println!("{}", serde_json::to_string(hit)?);
    }
    Ok(())
}

fn compare(opts: &LoadOpts, query: &str) -> Result<()> {
    let records = load_records(Path::new(&opts.input))?;
    let tok = tokenizer(opts);
    let index = build_index(opts, tok.clone(), &records)?;
    let mut naive = NaiveMatcher::new(tok);
    for r in &records {
        naive.insert_document(r.id, r.text.as_str());
    }

    let t = Instant::now();
    let naive_ids = naive.search(query);
    let naive_s = t.elapsed().as_secs_f64();

    let t = Instant::now();
    let indexed = index.search_all(query)?;
    let indexed_s = t.elapsed().as_secs_f64();

    let t = Instant::now();
    let ranked = index.search(query)?;
    let ranked_s = t.elapsed().as_secs_f64();

    let candidates: HashSet<DocId> = ranked.iter().map(|h| h.doc_id).collect();
    let report = CompareReport {
        query: query.to_string(),
        naive_hits: naive_ids.len(),
        naive_s,
        indexed_hits: indexed.len(),
        indexed_s,
        ranked_hits: ranked.len(),
        ranked_s,
        naive_subset_of_ranked: naive_ids.iter().all(|id| candidates.contains(id)),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn stats(opts: &LoadOpts) -> Result<()> {
    let records = load_records(Path::new(&opts.input))?;
    let mut index = build_index(opts, tokenizer(opts), &records)?;
    let raw = index.stats();
    index.compress()?;
    let compressed = index.stats();
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "raw": raw, "compressed": compressed }))?);
    Ok(())
}

fn load_records(input_path: &Path) -> Result<Vec<InputDoc>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input_path.display());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    Ok(records)
}

fn read_jsonl(file: &Path, out: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", file.display(), lineno + 1))?;
        out.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => out.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file without JSON records"),
    }
    Ok(())
}
