//! Browser session handle and launch configuration.
//!
//! A [`Session`] is an opaque handle to one live browser instance bound
//! to one base URL. It is exclusively owned by the scenario that acquired
//! it, never shared across scenarios or threads, and is always closed on
//! scenario exit regardless of outcome.
//!
//! With the `browser` feature enabled, [`Session::launch`] drives a real
//! Chromium via CDP (chromiumoxide). Without it, construct a session over
//! a [`MockDriver`](crate::driver::MockDriver) for unit testing.

use crate::driver::SessionDriver;
use crate::result::ViajarResult;

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to browser binary (None = auto-detect)
    pub browser_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            browser_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn with_window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set browser binary path
    #[must_use]
    pub fn with_browser_path(mut self, path: impl Into<String>) -> Self {
        self.browser_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Handle to one live browser session bound to a base URL.
pub struct Session {
    driver: Box<dyn SessionDriver>,
    base_url: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap an already-launched driver
    #[must_use]
    pub fn new(driver: Box<dyn SessionDriver>, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
        }
    }

    /// Launch a real browser and bind the session to a base URL
    #[cfg(feature = "browser")]
    pub async fn launch(config: BrowserConfig, base_url: impl Into<String>) -> ViajarResult<Self> {
        let driver = cdp::CdpDriver::launch(config).await?;
        Ok(Self::new(Box::new(driver), base_url))
    }

    /// Navigate to the session's base URL
    pub async fn open(&mut self) -> ViajarResult<()> {
        let url = self.base_url.clone();
        tracing::info!(url = %url, "opening session");
        self.driver.navigate(&url).await
    }

    /// The base URL this session is bound to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Borrow the underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn SessionDriver {
        self.driver.as_ref()
    }

    /// Current page URL
    pub async fn current_url(&self) -> ViajarResult<String> {
        self.driver.current_url().await
    }

    /// Terminate the session. Unconditional cleanup; called exactly once
    /// per scenario by the orchestrator.
    pub async fn close(&mut self) -> ViajarResult<()> {
        tracing::info!("closing session");
        self.driver.close().await
    }
}

// ============================================================================
// Real CDP driver (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use tokio::sync::Mutex;

    use super::BrowserConfig;
    use crate::driver::{ElementHandle, SessionDriver};
    use crate::locator::Selector;
    use crate::result::{ViajarError, ViajarResult};

    #[derive(Debug, Deserialize)]
    struct ElementSnapshot {
        tag: String,
        text: String,
        visible: bool,
        enabled: bool,
    }

    /// Session driver over a real Chromium instance via CDP.
    pub struct CdpDriver {
        browser: Arc<Mutex<CdpBrowser>>,
        page: Arc<Mutex<CdpPage>>,
        #[allow(dead_code)]
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpDriver {
        /// Launch a browser and open a blank page
        pub async fn launch(config: BrowserConfig) -> ViajarResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.window_width, config.window_height);

            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.browser_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|e| ViajarError::BrowserLaunch {
                message: e.to_string(),
            })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ViajarError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| ViajarError::SessionError {
                    message: e.to_string(),
                })?;

            Ok(Self {
                browser: Arc::new(Mutex::new(browser)),
                page: Arc::new(Mutex::new(page)),
                handle,
            })
        }

        async fn evaluate<T: serde::de::DeserializeOwned>(&self, js: &str) -> ViajarResult<T> {
            let page = self.page.lock().await;
            let result = page
                .evaluate(js)
                .await
                .map_err(|e| ViajarError::SessionError {
                    message: e.to_string(),
                })?;
            result.into_value().map_err(|e| ViajarError::SessionError {
                message: e.to_string(),
            })
        }
    }

    #[async_trait]
    impl SessionDriver for CdpDriver {
        async fn navigate(&mut self, url: &str) -> ViajarResult<()> {
            let page = self.page.lock().await;
            page.goto(url).await.map_err(|e| ViajarError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            Ok(())
        }

        async fn find_elements(&self, selector: &Selector) -> ViajarResult<Vec<ElementHandle>> {
            let raw: String = self.evaluate(&selector.to_js_snapshot_query()).await?;
            let snapshots: Vec<ElementSnapshot> = serde_json::from_str(&raw)?;
            Ok(snapshots
                .into_iter()
                .enumerate()
                .map(|(index, snap)| ElementHandle {
                    selector: selector.clone(),
                    index,
                    tag_name: snap.tag,
                    text: snap.text,
                    visible: snap.visible,
                    enabled: snap.enabled,
                })
                .collect())
        }

        async fn click(&self, element: &ElementHandle) -> ViajarResult<()> {
            self.evaluate::<serde_json::Value>(
                &element.selector.to_js_click(element.index),
            )
            .await?;
            Ok(())
        }

        async fn type_text(&self, element: &ElementHandle, text: &str) -> ViajarResult<()> {
            self.evaluate::<serde_json::Value>(
                &element.selector.to_js_type(element.index, text),
            )
            .await?;
            Ok(())
        }

        async fn current_url(&self) -> ViajarResult<String> {
            self.evaluate("window.location.href").await
        }

        async fn close(&mut self) -> ViajarResult<()> {
            let mut browser = self.browser.lock().await;
            browser.close().await.map_err(|e| ViajarError::SessionError {
                message: e.to_string(),
            })?;
            Ok(())
        }
    }
}
