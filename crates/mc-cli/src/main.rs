mod cmd;
mod login;
mod output;
mod progress;
mod root;

use clap::{Parser, Subcommand};
use cmd::serve::{ScrubMode, ServeOptions};
use login::OrgArgs;
use mc_core::McError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "mobilecaddy",
    about = "Scaffold, serve and deploy MobileCaddy apps",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory with a package.json)
    #[arg(long, global = true, env = "MOBILECADDY_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new app from a template id or a zip URL
    New {
        /// Template id (see `mobilecaddy templates`) or archive URL
        template: String,
        /// App name; replaces the template's placeholder everywhere
        name: String,
        /// Directory to create (default: ./<name>)
        path: Option<PathBuf>,
        /// Run the dependency install through sudo
        #[arg(long)]
        sudo: bool,
    },

    /// List available templates
    Templates,

    /// Run the local dev server
    Serve {
        /// Serve with local mock data
        #[arg(long, env = "MC_LOCAL")]
        local: bool,
        /// Record platform calls for later use as mock data
        #[arg(long, env = "MC_REC")]
        rec: bool,
        /// Scrub recorded data
        #[arg(long, value_enum, env = "MC_SCRUB")]
        scrub: Option<ScrubMode>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Build, bundle and upload the app to an org
    Deploy {
        /// Production build
        #[arg(long)]
        prod: bool,
        #[command(flatten)]
        org: OrgArgs,
    },

    /// Report project versions to an org and show its platform details
    Monitor {
        #[command(flatten)]
        org: OrgArgs,
    },

    /// List registered apps
    List,

    /// Show one registered app
    Info {
        name: String,
    },

    /// List orgs with stored credentials
    Creds,

    /// Log in and store the session for later `--org` use
    StoreCreds {
        #[arg(long, short = 'u')]
        username: String,
        /// Login endpoint, e.g. test.salesforce.com for sandboxes
        #[arg(long)]
        endpoint: Option<String>,
    },
}

/// Exit code of the first typed error in the chain; 1 otherwise.
fn exit_code(e: &anyhow::Error) -> i32 {
    e.chain()
        .find_map(|c| c.downcast_ref::<McError>())
        .map(|m| m.kind().exit_code())
        .unwrap_or(1)
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let explicit = cli.root.as_deref();
    let root = root::resolve_root(explicit);
    let json = cli.json;

    let result = match cli.command {
        Commands::New {
            template,
            name,
            path,
            sudo,
        } => cmd::new::run(
            &root::base_dir(explicit),
            &template,
            &name,
            path.as_deref(),
            sudo,
            json,
        ),
        Commands::Templates => cmd::templates::run(&root, json),
        Commands::Serve {
            local,
            rec,
            scrub,
            no_open,
        } => cmd::serve::run(
            &root,
            ServeOptions {
                local,
                rec,
                scrub,
                no_open,
            },
        ),
        Commands::Deploy { prod, org } => cmd::deploy::run(&root, prod, &org, json),
        Commands::Monitor { org } => cmd::monitor::run(&root, &org, json),
        Commands::List => cmd::apps::list(json),
        Commands::Info { name } => cmd::apps::info(&name, json),
        Commands::Creds => cmd::creds::list(json),
        Commands::StoreCreds { username, endpoint } => {
            cmd::creds::store(&root, &username, endpoint.as_deref())
        }
    };

    if let Err(e) = result {
        let code = exit_code(&e);
        if json {
            output::print_json_error(&e, code);
        }
        eprintln!("error: {e:#}");
        std::process::exit(code);
    }
}
