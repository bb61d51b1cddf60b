//! Terminal front end for the Reddit engagement assistant
//!
//! - `reddit`: interactive assistant with `/hot`, `/search` and link expansion
//! - `chat`: plain chat with a persona
//! - `extract`: run the row extractor over saved model output
//! - `jobs`: search for job openings
//! - `research`: company due diligence, optionally mailed

mod input;
mod offline;
mod persona;
mod repl;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{LlmProvider, ToolRegistry, tool::DateTimeTool};
use agent_runtime::{ProviderKind, RuntimeConfig};
use reddit_engage::{MockRedditClient, RedditClient, prompt, reddit::client_from_env, tools::register_all};
use research_agents::{DueDiligence, JobSearch, ReportMailer};

use crate::input::Input;
use crate::persona::Persona;
use crate::repl::{RedditRepl, Step};
use crate::session::ChatSession;

#[derive(Parser, Debug)]
#[command(name = "agent-cli", version, about = "Reddit engagement assistant")]
struct Cli {
    /// LLM backend: anthropic or ollama
    #[arg(long, global = true, env = "LLM_PROVIDER")]
    provider: Option<ProviderKind>,

    /// Model override (defaults to the provider's configured model)
    #[arg(long, global = true, env = "LLM_MODEL")]
    model: Option<String>,

    /// Serve posts from the built-in catalogue instead of Reddit
    #[arg(long, global = true, env = "REDDIT_MOCK", value_parser = clap::builder::BoolishValueParser::new())]
    mock_reddit: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive Reddit engagement assistant
    Reddit,

    /// Chat with a persona
    Chat {
        #[arg(long, value_enum, default_value_t = Persona::Support)]
        persona: Persona,
    },

    /// Match saved model output against posts, offline
    Extract {
        /// Model output to read
        #[arg(long)]
        file: PathBuf,

        /// JSON array of {title, url} objects
        #[arg(long)]
        posts: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for job openings
    Jobs {
        #[arg(long, default_value = "spain")]
        location: String,

        #[arg(long, default_value = "software engineer")]
        position: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Due diligence report on a company
    Research {
        #[arg(long)]
        company: String,

        #[arg(long)]
        website: String,

        /// Write the HTML report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Mail the report to this address
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract { ref file, ref posts, json } => extract(file, posts, json),
        Command::Reddit => run_reddit(Backend::from_cli(&cli).await?).await,
        Command::Chat { persona } => run_chat(Backend::from_cli(&cli).await?, persona).await,
        Command::Jobs {
            ref location,
            ref position,
            json,
        } => run_jobs(&Backend::from_cli(&cli).await?, location, position, json).await,
        Command::Research {
            ref company,
            ref website,
            ref out,
            ref email,
        } => {
            let backend = Backend::from_cli(&cli).await?;
            run_research(&backend, company, website, out.as_deref(), email.as_deref()).await
        }
    }
}

/// Provider, tools and Reddit client for the interactive commands
struct Backend {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    reddit: Arc<dyn RedditClient>,
    generation: agent_core::GenerationOptions,
}

impl Backend {
    /// Environment configuration with the command-line overrides applied
    async fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut runtime = RuntimeConfig::from_env()?;
        if let Some(kind) = cli.provider {
            runtime.provider = kind;
        }
        let provider = runtime.build_provider()?;

        let reddit: Arc<dyn RedditClient> = if cli.mock_reddit {
            Arc::new(MockRedditClient::new())
        } else {
            client_from_env()?
        };

        let mut tools = ToolRegistry::new();
        tools.register(DateTimeTool);
        register_all(&mut tools, &reddit);
        let remote = runtime.register_remote_tools(&mut tools).await;
        tracing::info!(tools = tools.len(), remote, provider = %runtime.provider, "Backend ready");

        let mut generation = runtime.generation();
        if let Some(model) = cli.model.as_deref().filter(|m| !m.trim().is_empty()) {
            generation.model = model.to_string();
        }

        Ok(Self {
            provider,
            tools: Arc::new(tools),
            reddit,
            generation,
        })
    }

    fn session(&self, system_prompt: &str) -> ChatSession {
        ChatSession::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            system_prompt,
            self.generation.clone(),
        )
    }
}

fn print_header() {
    println!("==================================================");
    println!("  Reddit Engagement Assistant");
    println!("  Craft responses that earn upvotes");
    println!("==================================================");
    println!("Type /help for command options or /exit to quit\n");
}

async fn run_reddit(backend: Backend) -> anyhow::Result<()> {
    let mut repl = RedditRepl::new(backend.session(prompt::ASSISTANT_PROMPT), Arc::clone(&backend.reddit));
    let mut input = Input::stdin();
    let mut first = true;

    print_header();
    loop {
        let question = if first {
            "How can I help boost your Reddit engagement today?"
        } else {
            "What other Reddit assistance do you need?"
        };
        let Some(line) = input.prompt(question).await? else {
            break;
        };
        first = false;

        if repl::Command::parse(&line).is_none_or(|c| c.is_remote()) && !line.trim().is_empty() {
            println!("Analyzing and crafting response...");
        }

        match repl.handle(&line).await {
            Step::Reply(reply) => println!("\nReddit Assistant:\n{reply}\n"),
            Step::Notice(notice) if notice.is_empty() => {}
            Step::Notice(notice) => println!("{notice}\n"),
            Step::Cleared => {
                print_header();
                first = true;
            }
            Step::Quit => break,
        }
    }

    println!("\nThanks for using Reddit Assistant! Happy karma hunting!");
    Ok(())
}

async fn run_chat(backend: Backend, persona: Persona) -> anyhow::Result<()> {
    let mut session = backend.session(&persona.system_prompt());
    let mut input = Input::stdin();
    let mut question = persona.greeting();

    while let Some(line) = input.prompt(question).await? {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                question = persona.greeting();
                continue;
            }
            _ => {}
        }

        match session.ask(line).await {
            Ok(reply) => println!("{}: {reply}", persona.label()),
            Err(e) => println!("An error occurred: {}", e.user_message()),
        }
        question = persona.follow_up();
    }

    Ok(())
}

async fn run_jobs(backend: &Backend, location: &str, position: &str, json: bool) -> anyhow::Result<()> {
    let search = JobSearch::new(
        Arc::clone(&backend.provider),
        Arc::clone(&backend.tools),
        backend.generation.clone(),
    );

    eprintln!("Searching for jobs in {location}...");
    let result = search.search(location, position).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.jobs.is_empty() {
        println!("No jobs found in {}. Try another location.", result.location);
    } else {
        println!("Found {} jobs in {}\n", result.jobs.len(), result.location);
        for job in &result.jobs {
            println!("{}\n  {}\n", job.title, job.link);
        }
    }
    Ok(())
}

async fn run_research(
    backend: &Backend,
    company: &str,
    website: &str,
    out: Option<&Path>,
    email: Option<&str>,
) -> anyhow::Result<()> {
    let diligence = DueDiligence::new(
        Arc::clone(&backend.provider),
        Arc::clone(&backend.tools),
        backend.generation.clone(),
    );

    eprintln!("Researching {company}...");
    let report = diligence.run(company, website).await?;
    if !report.complete {
        eprintln!("The report may be incomplete. You might want to try again.");
    }

    match out {
        Some(path) => {
            std::fs::write(path, &report.html).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", report.html),
    }

    if let Some(to) = email {
        let mailer = ReportMailer::new(
            Arc::clone(&backend.provider),
            Arc::clone(&backend.tools),
            backend.generation.clone(),
        );
        let delivery = mailer.send(to, &report).await?;
        if delivery.sent {
            eprintln!("Report sent to {to}");
        } else {
            eprintln!("The report was not sent: {}", delivery.reply);
        }
    }
    Ok(())
}

fn extract(file: &Path, posts: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let records_json =
        std::fs::read_to_string(posts).with_context(|| format!("reading {}", posts.display()))?;
    let records = offline::parse_records(&records_json)?;

    let report = offline::run(&text, &records);
    for line in &report.trace {
        tracing::debug!("{line}");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", offline::render(&records, &report));
    }
    Ok(())
}
