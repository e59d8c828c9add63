use std::error::Error;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use docsim::files::{
    load_dictionary, load_dictionary_for, load_facets, load_mappings, load_or_preprocess_corpus,
    load_vectors, write_mapping,
};
use docsim::{
    build_similarity_index, detect_duplicates, merge_detected, paginate, DocsimConfig,
    FeatureVocabulary, Pipeline, SimilarityIndex,
};
use tracing_subscriber::EnvFilter;

const VOCABULARY_FILE: &str = "vocabulary.json";

#[derive(Parser, Debug)]
#[command(name = "docsim")]
#[command(about = "Keyword canonicalization, near-duplicate detection and paper similarity")]
#[command(version)]
struct Cli {
    /// YAML pipeline configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect near-duplicate keywords and print `longer<TAB>shorter` pairs
    Dedup {
        #[arg(short, long)]
        dictionary: PathBuf,

        /// Write the mapping here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        max_hamming: Option<u32>,

        #[arg(long)]
        blocks: Option<usize>,

        #[arg(long)]
        max_edit: Option<usize>,
    },

    /// Rewrite keyword occurrences in a text file (or stdin)
    Canonicalize {
        #[command(flatten)]
        text: TextArgs,

        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },

    /// Build or load the tokenized corpus cache
    Preprocess {
        #[command(flatten)]
        text: TextArgs,

        /// Directory of raw `*.txt` documents
        #[arg(long)]
        raw_dir: PathBuf,

        /// Corpus cache file (`filename<TAB>tokens`)
        #[arg(long)]
        cache: PathBuf,

        /// Preprocess documents on the rayon pool
        #[arg(long)]
        parallel: bool,
    },

    /// Build and save a similarity index
    BuildIndex {
        /// Vector table (`doc_id<TAB>floats`)
        #[arg(long, conflicts_with = "facets", required_unless_present = "facets")]
        vectors: Option<PathBuf>,

        /// Facet JSON (`{doc_id: {keywords, authors, organizations}}`)
        #[arg(long)]
        facets: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the nearest neighbors of one document
    Neighbors {
        /// Index directory written by `build-index`
        #[arg(long)]
        index: PathBuf,

        #[arg(long, conflicts_with = "row", required_unless_present = "row")]
        id: Option<String>,

        #[arg(long)]
        row: Option<usize>,

        /// Neighbors to rank before paging
        #[arg(short, default_value = "100")]
        n: usize,

        #[arg(long, default_value = "1")]
        page: usize,

        #[arg(long, default_value = "10")]
        per_page: usize,

        #[arg(long)]
        exclude_self: bool,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct TextArgs {
    /// Keyword dictionary, one keyword per line
    #[arg(short, long)]
    dictionary: PathBuf,

    /// Mapping tables (`raw<TAB>canonical`); later files win
    #[arg(short, long)]
    mapping: Vec<PathBuf>,

    /// Also map near-duplicate keywords to their shorter variant
    #[arg(long)]
    dedup: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_pipeline(cfg: &DocsimConfig, args: &TextArgs) -> Result<Pipeline, Box<dyn Error>> {
    let keywords = load_dictionary_for(&args.dictionary, &cfg.matcher_config())?;
    let mut map = load_mappings(&args.mapping)?;
    if args.dedup {
        let detected = detect_duplicates(&keywords, &cfg.dedup_config())?;
        tracing::info!(pairs = detected.len(), "near-duplicate keywords merged");
        map = merge_detected(&detected, map);
    }
    Ok(Pipeline::new(&keywords, map, cfg)?)
}

fn read_input(input: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    let cfg = match &cli.config {
        Some(path) => DocsimConfig::from_file(path)?,
        None => DocsimConfig::default(),
    };

    match cli.command {
        Command::Dedup {
            dictionary,
            output,
            max_hamming,
            blocks,
            max_edit,
        } => {
            let mut dedup_cfg = cfg.dedup_config();
            if let Some(k) = max_hamming {
                dedup_cfg = dedup_cfg.with_max_hamming_distance(k);
            }
            if let Some(b) = blocks {
                dedup_cfg = dedup_cfg.with_num_blocks(b);
            }
            if let Some(e) = max_edit {
                dedup_cfg = dedup_cfg.with_max_edit_distance(e);
            }
            let keywords = load_dictionary(&dictionary)?;
            let mapping = detect_duplicates(&keywords, &dedup_cfg)?;
            match output {
                Some(path) => {
                    write_mapping(&path, &mapping.to_canonical_map())?;
                    tracing::info!(path = %path.display(), pairs = mapping.len(), "mapping written");
                }
                None => {
                    for (from, to) in mapping.iter() {
                        println!("{from}\t{to}");
                    }
                }
            }
        }

        Command::Canonicalize { text, input } => {
            let pipeline = build_pipeline(&cfg, &text)?;
            let raw = read_input(input.as_deref())?;
            println!("{}", pipeline.canonicalize(&raw)?);
        }

        Command::Preprocess {
            text,
            raw_dir,
            cache,
            parallel,
        } => {
            let pipeline = build_pipeline(&cfg, &text)?;
            let docs = load_or_preprocess_corpus(&cache, &raw_dir, &pipeline, parallel)?;
            let tokens: usize = docs.iter().map(|d| d.tokens.len()).sum();
            println!("{} documents, {} tokens", docs.len(), tokens);
        }

        Command::BuildIndex {
            vectors,
            facets,
            output,
        } => {
            let index_cfg = cfg.index_config();
            let index = if let Some(path) = vectors {
                let (ids, matrix) = load_vectors(&path)?;
                build_similarity_index(ids, matrix, &index_cfg)?
            } else if let Some(path) = facets {
                let facets = load_facets(&path)?;
                let vocab = FeatureVocabulary::build(facets.values());
                let rows = vocab.feature_rows(facets.values().map(Some));
                let matrix = vocab.feature_matrix(&rows)?;
                let index = build_similarity_index(facets.keys().cloned(), matrix, &index_cfg)?;
                std::fs::create_dir_all(&output)?;
                std::fs::write(output.join(VOCABULARY_FILE), serde_json::to_vec_pretty(&vocab)?)?;
                index
            } else {
                return Err("either --vectors or --facets is required".into());
            };
            index.save(&output, &index_cfg.compression)?;
            println!("{} documents indexed into {}", index.len(), output.display());
        }

        Command::Neighbors {
            index,
            id,
            row,
            n,
            page,
            per_page,
            exclude_self,
            json,
        } => {
            let index = SimilarityIndex::load(&index)?;
            let row = match (id, row) {
                (Some(id), _) => index
                    .row_of(&id)
                    .ok_or_else(|| format!("unknown document id {id:?}"))?,
                (None, Some(row)) => row,
                (None, None) => return Err("either --id or --row is required".into()),
            };
            let ranked = if exclude_self {
                index.top_n_excluding_self(row, n)?
            } else {
                index.top_n(row, n)?
            };
            let page = paginate(&ranked, page, per_page)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                let offset = (page.page - 1) * page.per_page;
                for (i, nb) in page.items.iter().enumerate() {
                    let id = index.id(nb.row).unwrap_or("?");
                    println!("{}\t{}\t{:.6}", offset + i + 1, id, nb.score);
                }
                println!("page {}/{} ({} results)", page.page, page.total_pages, page.total_items);
            }
        }
    }

    Ok(())
}
