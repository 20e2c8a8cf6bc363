use clap::Parser;
use kb_export::config::AssetPreset;
use kb_export::{Config, Exporter, KnowledgeBaseApi};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Export team knowledge-base articles to Markdown and JSON.
///
/// Credentials come from the environment (or a `.env` file):
/// ACCESS_TOKEN and DOMAIN are required.
#[derive(Debug, Parser)]
#[command(name = "kb-export", version)]
struct Cli {
    /// Output directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// First page to request
    #[arg(long)]
    page: Option<u32>,

    /// Articles per page (1-100)
    #[arg(long)]
    per_page: Option<u32>,

    /// Free-text search filter, e.g. 'title:"release notes"'
    #[arg(long)]
    query: Option<String>,

    /// Regular expression matching asset URLs in article bodies
    #[arg(long)]
    asset_pattern: Option<String>,

    /// Match attachment uploads under /files/ instead of binary extensions
    #[arg(long)]
    attachment_files: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.dir {
            config.export.output_dir = dir;
        }
        if let Some(page) = self.page {
            config.export.start_page = page;
        }
        if let Some(per_page) = self.per_page {
            config.export.per_page = per_page;
        }
        if self.query.is_some() {
            config.export.query = self.query;
        }
        if self.asset_pattern.is_some() {
            config.assets.pattern = self.asset_pattern;
        }
        if self.attachment_files {
            config.assets.preset = AssetPreset::AttachmentFiles;
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let start = Instant::now();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, cause = %err.root_cause(), "export failed");
        eprintln!("Error execute: {err}");
        std::process::exit(1);
    }

    println!("elapsed: {:.2} min", start.elapsed().as_secs_f64() / 60.0);
}

async fn run(cli: Cli) -> kb_export::Result<()> {
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    let exporter = Exporter::from_config(&config)?;
    let result = exporter.run().await;
    tracing::info!(requests = exporter.api().request_count(), "request total");

    let summary = result?;
    println!(
        "exported {} articles ({} assets) from {} pages",
        summary.articles, summary.assets, summary.pages
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
