use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use pagegen_common::{normalize_path, SiteConfig};
use pagegen_web::server::WebServerConfig;
use pagegen_web::{ContentGenerator, LlmBackend, LlmGenerator, RuleBasedGenerator};

#[derive(Parser, Debug)]
#[command(name = "pagegen-web")]
#[command(about = "Serve per-path generated pages", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to listen on
    #[arg(long, env = "PAGEGEN_WEB_ADDR", default_value = "0.0.0.0:3006")]
    addr: SocketAddr,

    /// Directory for cached content snippets
    #[arg(long, env = "PAGEGEN_CACHE_DIR", default_value = "cache")]
    cache_dir: PathBuf,

    /// Site configuration file (JSON or TOML)
    #[arg(long, env = "PAGEGEN_SITE_CONFIG", default_value = "config.json")]
    site_config: PathBuf,

    /// Content generator backend
    #[arg(long, env = "PAGEGEN_LLM_BACKEND", value_enum, default_value = "rule")]
    backend: Backend,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    openai_api_key: String,

    #[arg(long, env = "PAGEGEN_OPENAI_URL", default_value = "https://api.openai.com")]
    openai_url: String,

    #[arg(long, env = "PAGEGEN_OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    #[arg(long, env = "PAGEGEN_VLLM_URL", default_value = "http://localhost:8000")]
    vllm_url: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Generate the content snippet for one path and print it to stdout
    Generate {
        #[arg(default_value = "/")]
        path: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    Rule,
    Openai,
    Ollama,
    Vllm,
}

impl Cli {
    fn generator(&self) -> Arc<dyn ContentGenerator> {
        let backend = match self.backend {
            Backend::Rule => return Arc::new(RuleBasedGenerator),
            Backend::Openai => LlmBackend::OpenAI {
                base_url: self.openai_url.clone(),
                api_key: self.openai_api_key.clone(),
            },
            Backend::Ollama => LlmBackend::Ollama {
                base_url: self.ollama_url.clone(),
            },
            Backend::Vllm => LlmBackend::VLLM {
                base_url: self.vllm_url.clone(),
            },
        };
        let site = SiteConfig::load(&self.site_config);
        Arc::new(LlmGenerator::new(backend, site))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let generator = cli.generator();

    match cli.command {
        Some(Command::Generate { ref path }) => {
            let path = normalize_path(path);
            info!("Generating content for '{}' with {}", path, generator.name());
            let content = generator.generate(&path).await?;
            info!("Generated content snippet (length: {})", content.len());
            println!("{}", content);
            Ok(())
        }
        Some(Command::Serve) | None => {
            let cfg = WebServerConfig {
                cache_dir: cli.cache_dir.clone(),
                generator,
            };
            pagegen_web::server::serve(cli.addr, cfg).await
        }
    }
}
