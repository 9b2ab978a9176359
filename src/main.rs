use chrono::Utc;
use clap::{Parser, Subcommand};
use portfolio_r2::config::{self, PortfolioConfig, StoreConfig};
use portfolio_r2::resolve::{self, ResolveError};
use portfolio_r2::store::R2Store;
use portfolio_r2::types::{MappingDocument, PortfolioIndex};
use portfolio_r2::{index, output, upload};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio-r2")]
#[command(about = "Upload, index, and catalog a photo portfolio stored in Cloudflare R2")]
#[command(long_about = "\
Upload, index, and catalog a photo portfolio stored in Cloudflare R2

The bucket is the data source. Every top-level folder holding images is a
shoot; portfolio-mapping.json gives shoots display names and categories.

Bucket layout:

  <bucket>/
  ├── index.html                   # Site files (uploaded from dist/)
  ├── portfolio-index.json         # Generated by `index`
  ├── portfolio-mapping.json       # Hand-written
  ├── ABI/                         # Shoot folder
  │   ├── a.jpg
  │   └── b.jpg
  └── STREET SOUK 23’/             # ' and ’ are interchangeable in the mapping
      └── ss1.JPG

Bucket access comes from the environment (or .env): R2_ACCOUNT_ID,
R2_ACCESS_KEY_ID, R2_SECRET_ACCESS_KEY, R2_BUCKET_NAME, and optionally
R2_ENDPOINT and R2_PUBLIC_BASE_URL.

Run 'portfolio-r2 gen-config' to generate a documented portfolio.toml.")]
#[command(version = env!("PORTFOLIO_R2_VERSION"))]
struct Cli {
    /// Directory containing portfolio.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the bucket and write portfolio-index.json
    Index,
    /// Upload a directory or file to the bucket
    Upload {
        /// File or directory to upload [default: paths.dist_dir]
        path: Option<PathBuf>,
        /// Key prefix to upload under
        #[arg(long)]
        prefix: Option<String>,
        /// Uploads in flight at once [default: upload.max_concurrent]
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..=16))]
        concurrency: Option<u16>,
    },
    /// Resolve the mapping against the index and print the categories
    Catalog {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the images behind a display name or folder name
    Gallery {
        /// Display name or folder, as passed in ?subcategory=
        subcategory: String,
    },
    /// Print the featured item for every mapped folder
    Featured,
    /// Report mapping entries and bucket folders that do not match up
    Check,
    /// Print a stock portfolio.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let load_config = || config::load_config(&cli.config_dir);

    match cli.command {
        Command::Index => {
            let config = load_config()?;
            let store_config = StoreConfig::from_env(&config.bucket)?;
            let store = R2Store::connect(&store_config).await;
            let built = index::build_index(
                &store,
                &store_config.bucket,
                &store_config.public_base_url,
                Utc::now(),
            )
            .await?;
            let path = config.index_path();
            index::write_index(&path, &built)?;
            output::print_index_output(&built, &path);
        }
        Command::Upload {
            path,
            prefix,
            concurrency,
        } => {
            let config = load_config()?;
            let source = path.unwrap_or_else(|| config.paths.dist_dir.clone());
            if !source.exists() {
                return Err(upload::UploadError::SourceNotFound(source).into());
            }
            let store_config = StoreConfig::from_env(&config.bucket)?;
            let store = R2Store::connect(&store_config).await;
            let concurrency = concurrency.map_or(config.upload.max_concurrent, usize::from);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_upload_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = upload::upload(
                &store,
                &source,
                prefix.as_deref(),
                &config.upload,
                concurrency,
                Some(tx),
            )
            .await?;
            printer
                .join()
                .map_err(|_| "upload progress printer panicked")?;
            output::print_upload_summary(&summary);

            if !summary.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Catalog { json } => {
            let config = load_config()?;
            let (mapping, built) = load_documents(&config)?;
            let catalog = resolve::resolve(&mapping, &built, &config.resolve)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                output::print_catalog(&catalog);
            }
        }
        Command::Gallery { subcategory } => {
            let config = load_config()?;
            let (mapping, built) = load_documents(&config)?;
            let catalog = resolve::resolve(&mapping, &built, &config.resolve)?;
            let base = resolve::public_base_url(&built, &config.bucket);
            match resolve::lookup_gallery(&subcategory, &catalog, &built, &base) {
                Ok(gallery) => output::print_gallery(&gallery),
                Err(e @ ResolveError::FolderNotFound(_)) => {
                    eprintln!("{e}");
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Featured => {
            let config = load_config()?;
            let (mapping, built) = load_documents(&config)?;
            let base = resolve::public_base_url(&built, &config.bucket);
            output::print_featured(&resolve::featured_items(&mapping, &built, &base));
        }
        Command::Check => {
            let config = load_config()?;
            let (mapping, built) = load_documents(&config)?;
            let report = resolve::check_mapping(&mapping, &built);
            output::print_check(&report);
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the mapping and the previously written index named in the config.
fn load_documents(
    config: &PortfolioConfig,
) -> Result<(MappingDocument, PortfolioIndex), Box<dyn std::error::Error>> {
    let mapping = resolve::load_mapping(&config.mapping_path())?;
    let built = index::load_index(&config.index_path())?;
    Ok((mapping, built))
}
