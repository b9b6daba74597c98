use anyhow::{Context, Result};
use clap::Parser;
use embedrank::{Component, Config, Document, DocumentEmbedder, TextEmbedder};
use serde_json::json;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "embed")]
#[command(about = "Embed a query or a JSONL file of documents with the configured embedders")]
struct Args {
    /// Embed one query string and print {"embedding": [...]}
    #[arg(long, conflicts_with = "documents")]
    query: Option<String>,

    /// JSONL file with one document object per line
    #[arg(long, value_name = "FILE")]
    documents: Option<PathBuf>,

    /// Where to write embedded documents (default: stdout)
    #[arg(long, value_name = "FILE", requires = "documents")]
    output: Option<PathBuf>,

    /// Print the serialized descriptors of both embedders
    #[arg(long)]
    print_config: bool,
}

fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut documents = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: not a document", path.display(), i + 1))?;
        documents.push(document);
    }
    Ok(documents)
}

fn write_documents(documents: &[Document], output: Option<&Path>) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    for document in documents {
        serde_json::to_writer(&mut writer, document)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !args.print_config && args.query.is_none() && args.documents.is_none() {
        anyhow::bail!("Nothing to do: pass --query, --documents or --print-config");
    }

    // .env may set RUST_LOG
    let _ = dotenv::dotenv();
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Trace)
        .parse_env("RUST_LOG")
        .init();
    if !rust_log_set {
        log::set_max_level(log::LevelFilter::Info);
    }

    let config = Config::load()?;
    if !rust_log_set {
        log::set_max_level(config.logging.level_filter());
    }

    if args.print_config {
        let text = TextEmbedder::new(config.text_embedder.clone()).to_value()?;
        let documents = DocumentEmbedder::new(config.document_embedder.clone()).to_value()?;
        let descriptors = json!({ "text_embedder": text, "document_embedder": documents });
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    }

    if let Some(query) = &args.query {
        let mut embedder = TextEmbedder::new(config.text_embedder.clone());
        embedder.load().context("Failed to load text embedder")?;
        log::info!("Text embedder ready (dimension {:?})", embedder.dimension());

        let output = embedder.run(json!({ "text": query }))?;
        println!("{}", serde_json::to_string(&output)?);
    }

    if let Some(path) = &args.documents {
        let mut documents = read_documents(path)?;
        log::info!("Read {} documents from {}", documents.len(), path.display());

        let mut embedder = DocumentEmbedder::new(config.document_embedder.clone());
        embedder.load().context("Failed to load document embedder")?;
        embedder.embed(&mut documents)?;

        write_documents(&documents, args.output.as_deref())?;
        if let Some(output) = &args.output {
            log::info!("Wrote {} embedded documents to {}", documents.len(), output.display());
        }
    }

    Ok(())
}
