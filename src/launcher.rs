//! Chrome process launcher.
//!
//! External collaborator for the CDP client: starts Chrome with remote
//! debugging enabled and an isolated profile directory, then waits a fixed
//! grace period so the discovery endpoint has time to come up. The client
//! only consumes the resulting endpoint; beyond the optional start it never
//! manages the browser's lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use chrome_cdp::{launch, LaunchOptions, Result};
//!
//! # async fn example() -> Result<()> {
//! let options = LaunchOptions::new().with_headless();
//! let browser = launch(&options).await?;
//! println!("Chrome running, pid {:?}", browser.pid());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::transport::DEFAULT_DEBUG_PORT;

// ============================================================================
// Constants
// ============================================================================

/// Grace period for Chrome to bring up the discovery endpoint.
const STARTUP_GRACE: Duration = Duration::from_secs(3);

/// Default Chrome binary per platform.
#[cfg(target_os = "macos")]
const DEFAULT_BINARY: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";
#[cfg(target_os = "linux")]
const DEFAULT_BINARY: &str = "google-chrome";
#[cfg(target_os = "windows")]
const DEFAULT_BINARY: &str = r"C:\Program Files\Google\Chrome\Application\chrome.exe";

// ============================================================================
// LaunchOptions
// ============================================================================

/// Chrome launch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Path to the Chrome binary.
    pub binary: PathBuf,

    /// Remote debugging port.
    pub port: u16,

    /// Profile directory; a per-user temp-dir profile when `None`.
    pub user_data_dir: Option<PathBuf>,

    /// Run without a visible window.
    pub headless: bool,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchOptions {
    /// Creates options with platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            port: DEFAULT_DEBUG_PORT,
            user_data_dir: None,
            headless: false,
            extra_args: Vec::new(),
        }
    }

    /// Sets the Chrome binary path.
    #[inline]
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the remote debugging port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the profile directory.
    #[inline]
    #[must_use]
    pub fn with_user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Appends a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Resolves the profile directory, defaulting to an isolated temp dir.
    fn resolve_user_data_dir(&self) -> PathBuf {
        self.user_data_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("chrome-cdp-profile"))
    }

    /// Builds the Chrome argument list.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.port),
            format!("--user-data-dir={}", self.resolve_user_data_dir().display()),
            "--remote-allow-origins=*".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push("about:blank".to_string());
        args
    }
}

// ============================================================================
// LaunchedBrowser
// ============================================================================

/// Handle to a spawned Chrome process.
///
/// Dropping the handle does not kill the browser; it keeps running so later
/// invocations can attach to it.
#[derive(Debug)]
pub struct LaunchedBrowser {
    child: Child,
    /// Port the discovery endpoint listens on.
    pub port: u16,
}

impl LaunchedBrowser {
    /// Returns the OS process id, if the process is still running.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kills the browser process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the kill signal cannot be delivered.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}

// ============================================================================
// Launch
// ============================================================================

/// Spawns Chrome with remote debugging enabled.
///
/// Blocks for the startup grace period before returning so the discovery
/// endpoint is reachable afterwards.
///
/// # Errors
///
/// Returns [`Error::Launch`] if the process fails to spawn.
pub async fn launch(options: &LaunchOptions) -> Result<LaunchedBrowser> {
    let user_data_dir = options.resolve_user_data_dir();
    std::fs::create_dir_all(&user_data_dir)?;

    let args = options.to_args();
    debug!(binary = %options.binary.display(), ?args, "Spawning Chrome");

    let child = Command::new(&options.binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(Error::launch)?;

    info!(pid = child.id(), port = options.port, "Chrome process spawned");

    // Give Chrome time to bring up the debug endpoint.
    tokio::time::sleep(STARTUP_GRACE).await;

    Ok(LaunchedBrowser {
        child,
        port: options.port,
    })
}

// ============================================================================
// Tests
// ============================================================================
