use clap::ValueEnum;
use mc_core::config::Config;
use mc_core::shell::{ShellRunner, ShellTask, SystemShell};
use mc_core::McError;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const READY_POLL: Duration = Duration::from_millis(250);
const READY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScrubMode {
    /// Scrub recorded data, keeping record structure
    True,
    /// Scrub everything recorded
    Full,
}

impl ScrubMode {
    fn as_env(&self) -> &'static str {
        match self {
            ScrubMode::True => "true",
            ScrubMode::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOptions {
    pub local: bool,
    pub rec: bool,
    pub scrub: Option<ScrubMode>,
    pub no_open: bool,
}

/// The dev-server task for `opts`. Mock data (`local`) and recording
/// (`rec`) are mutually exclusive.
pub fn serve_task(root: &Path, config: &Config, opts: &ServeOptions) -> mc_core::Result<ShellTask> {
    if opts.local && opts.rec {
        return Err(McError::InvalidInput(
            "--local and --rec cannot be used together".into(),
        ));
    }
    let mut task = config.serve.command.task(root);
    if opts.local {
        task = task.env("MC_LOCAL", "1");
    }
    if opts.rec {
        task = task.env("MC_REC", "1");
    }
    if let Some(mode) = opts.scrub {
        task = task.env("MC_SCRUB", mode.as_env());
    }
    Ok(task)
}

pub fn run(root: &Path, opts: ServeOptions) -> anyhow::Result<()> {
    let config = Config::load(root)?;
    let task = serve_task(root, &config, &opts)?;

    println!("Serving {} at {}", root.display(), config.serve.url);
    if !opts.no_open {
        open_when_ready(config.serve.url.clone());
    }
    SystemShell::new().run(&task)?;
    Ok(())
}

/// `host:port` of an http(s) URL, with the scheme's default port.
fn server_addr(url: &str) -> Option<String> {
    let (default_port, rest) = if let Some(rest) = url.strip_prefix("http://") {
        (80, rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (443, rest)
    } else {
        return None;
    };
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    if authority.rsplit_once(':').is_some_and(|(_, p)| p.parse::<u16>().is_ok()) {
        Some(authority.to_string())
    } else {
        Some(format!("{authority}:{default_port}"))
    }
}

/// Poll `addr` until something accepts a connection or `timeout` passes.
fn wait_for_listener(addr: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let accepted = addr
            .to_socket_addrs()
            .map(|mut addrs| addrs.any(|a| TcpStream::connect_timeout(&a, READY_POLL).is_ok()))
            .unwrap_or(false);
        if accepted {
            return true;
        }
        thread::sleep(READY_POLL);
    }
    false
}

/// Open `url` in a browser once the dev server listens. The watcher thread
/// ends with the process when the server task exits first.
fn open_when_ready(url: String) {
    let Some(addr) = server_addr(&url) else {
        tracing::warn!(%url, "not an http url, not opening a browser");
        return;
    };
    thread::spawn(move || {
        if !wait_for_listener(&addr, READY_TIMEOUT) {
            tracing::warn!(%url, "dev server did not start listening, not opening a browser");
            return;
        }
        if let Err(e) = open::that(&url) {
            tracing::warn!(%url, error = %e, "could not open browser");
        }
    });
}
