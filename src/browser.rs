use std::ffi::OsStr;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions};
use tracing::debug;

use crate::error::FetchError;

/// Where the browser runs. Only changes how it is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserProfile {
    Local,
    /// Constrained hosts: no GPU, no process sandbox.
    Sandboxed,
}

impl BrowserProfile {
    /// Extra Chrome flags on top of the headless defaults.
    pub fn launch_args(self) -> &'static [&'static str] {
        match self {
            BrowserProfile::Local => &[],
            BrowserProfile::Sandboxed => &["--no-sandbox", "--disable-gpu", "--disable-dev-shm-usage"],
        }
    }

    pub fn sandboxed_process(self) -> bool {
        self == BrowserProfile::Local
    }
}

impl fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserProfile::Local => f.write_str("local"),
            BrowserProfile::Sandboxed => f.write_str("sandboxed"),
        }
    }
}

impl FromStr for BrowserProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(BrowserProfile::Local),
            "sandboxed" | "heroku" | "hosted" => Ok(BrowserProfile::Sandboxed),
            other => Err(format!("unknown browser profile: {other}")),
        }
    }
}

/// Loads the rendered source of one page.
pub trait PageLoader: Send + Sync {
    fn load_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Launches headless Chrome for every page load and shuts it down afterwards,
/// so no cookies or processes leak between requests.
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    profile: BrowserProfile,
    timeout: Duration,
}

impl HeadlessBrowser {
    pub fn new(profile: BrowserProfile, timeout: Duration) -> Self {
        Self { profile, timeout }
    }

    pub fn profile(&self) -> BrowserProfile {
        self.profile
    }

    pub fn open(&self) -> Result<BrowserSession, FetchError> {
        let args = self
            .profile
            .launch_args()
            .iter()
            .map(OsStr::new)
            .collect::<Vec<_>>();
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.profile.sandboxed_process())
            .idle_browser_timeout(self.timeout * 2)
            .args(args)
            .build()
            .map_err(|err| FetchError::Loader(format!("invalid launch options: {err}")))?;
        let browser = Browser::new(options)
            .map_err(|err| FetchError::Loader(format!("failed to launch chrome: {err}")))?;
        debug!(profile = %self.profile, "browser launched");
        Ok(BrowserSession {
            browser,
            timeout: self.timeout,
        })
    }
}

impl PageLoader for HeadlessBrowser {
    fn load_page(&self, url: &str) -> Result<String, FetchError> {
        self.open()?.load(url)
    }
}

pub struct BrowserSession {
    browser: Browser,
    timeout: Duration,
}

impl BrowserSession {
    /// Consumes the session: one browser, one page. Dropping it kills Chrome.
    pub fn load(self, url: &str) -> Result<String, FetchError> {
        debug!(url, "loading page");
        let tab = self
            .browser
            .new_tab()
            .map_err(|err| FetchError::Loader(format!("failed to open tab: {err}")))?;
        tab.set_default_timeout(self.timeout);
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|err| classify(url, self.timeout, err))?;
        tab.get_content().map_err(|err| classify(url, self.timeout, err))
    }
}

/// Browser timeouts become `Timeout`; everything else means the page is unreachable.
pub fn classify(url: &str, timeout: Duration, err: anyhow::Error) -> FetchError {
    if err.downcast_ref::<Timeout>().is_some() {
        FetchError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }
    } else {
        FetchError::Unreachable {
            url: url.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses_hosted_aliases() {
        assert_eq!("heroku".parse::<BrowserProfile>(), Ok(BrowserProfile::Sandboxed));
        assert_eq!(" Local ".parse::<BrowserProfile>(), Ok(BrowserProfile::Local));
        assert!("chrome".parse::<BrowserProfile>().is_err());
    }

    #[test]
    fn sandboxed_profile_drops_gpu_and_process_sandbox() {
        let args = BrowserProfile::Sandboxed.launch_args();
        assert!(args.contains(&"--no-sandbox"));
        assert!(args.contains(&"--disable-gpu"));
        assert!(!BrowserProfile::Sandboxed.sandboxed_process());

        assert!(BrowserProfile::Local.launch_args().is_empty());
        assert!(BrowserProfile::Local.sandboxed_process());
    }

    #[test]
    fn browser_timeouts_map_to_timeout_errors() {
        let url = "https://understat.com/team/Lille/2019";
        let err = classify(url, Duration::from_secs(20), anyhow::Error::new(Timeout));
        assert!(matches!(err, FetchError::Timeout { secs: 20, .. }));

        let err = classify(url, Duration::from_secs(20), anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED"));
        match err {
            FetchError::Unreachable { reason, .. } => assert!(reason.contains("ERR_NAME_NOT_RESOLVED")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
