//! Abstract browser session driver.
//!
//! The engine depends only on this seam: navigate, resolve a selector
//! against current DOM state, act on a match, report the URL, terminate.
//! Swapping implementations (real CDP vs scripted mock) never touches the
//! wait engine or the page objects.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Selector;
use crate::result::{ViajarError, ViajarResult};

/// Snapshot of one matched element at resolution time.
///
/// A handle is positional (selector + match index), not a live DOM node:
/// every action re-resolves the selector, so a handle can go stale between
/// polls without poisoning a retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector that produced this match
    pub selector: Selector,
    /// Index among the selector's matches at resolution time
    pub index: usize,
    /// Element tag name
    pub tag_name: String,
    /// Trimmed text content
    pub text: String,
    /// Whether the element was rendered visible
    pub visible: bool,
    /// Whether the element was enabled
    pub enabled: bool,
}

impl ElementHandle {
    /// Create a handle for the n-th match of a selector
    #[must_use]
    pub fn new(selector: Selector, index: usize) -> Self {
        Self {
            selector,
            index,
            tag_name: String::new(),
            text: String::new(),
            visible: true,
            enabled: true,
        }
    }

    /// Clickable means visible and enabled
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Abstract driver for one live browser session.
///
/// Implementations: `CdpDriver` (chromiumoxide, behind the `browser`
/// feature) and [`MockDriver`] for unit testing.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&mut self, url: &str) -> ViajarResult<()>;

    /// Resolve a selector against the current DOM state.
    ///
    /// Returns every match, in document order. An empty result is not an
    /// error; a malformed selector or dead session is.
    async fn find_elements(&self, selector: &Selector) -> ViajarResult<Vec<ElementHandle>>;

    /// Click a previously resolved element (re-resolved by position)
    async fn click(&self, element: &ElementHandle) -> ViajarResult<()>;

    /// Type text into a previously resolved element
    async fn type_text(&self, element: &ElementHandle, text: &str) -> ViajarResult<()>;

    /// Current page URL
    async fn current_url(&self) -> ViajarResult<String>;

    /// Terminate the session. Called unconditionally at scenario end.
    async fn close(&mut self) -> ViajarResult<()>;
}

/// One scripted element in a [`MockDriver`] page.
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Selector this element answers to
    pub selector: Selector,
    /// Element tag name
    pub tag_name: String,
    /// Text content
    pub text: String,
    /// Whether the element is visible
    pub visible: bool,
    /// Whether the element is enabled
    pub enabled: bool,
    /// Number of resolutions to skip before the element appears
    /// (models asynchronously rendered content)
    pub appears_after: u32,
    /// The element only exists once text containing this value has been
    /// typed (models autocomplete suggestions)
    pub requires_typed: Option<String>,
}

impl MockElement {
    /// Create a visible, enabled element for a selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            tag_name: "div".to_string(),
            text: String::new(),
            visible: true,
            enabled: true,
            appears_after: 0,
            requires_typed: None,
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the tag name
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_name = tag.into();
        self
    }

    /// Make the element present but not visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Make the element visible but disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Delay appearance by a number of resolutions
    #[must_use]
    pub const fn appears_after(mut self, polls: u32) -> Self {
        self.appears_after = polls;
        self
    }

    /// Gate appearance on previously typed text
    #[must_use]
    pub fn requires_typed(mut self, prefix: impl Into<String>) -> Self {
        self.requires_typed = Some(prefix.into());
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    elements: Vec<MockElement>,
    typed: Vec<String>,
    call_history: Vec<String>,
    closed: bool,
    fault: Option<String>,
}

/// Scripted in-memory driver for unit testing.
///
/// Clones share state, so a test can keep a handle for inspection after
/// the session (which owns the boxed driver) has been released.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create an empty mock page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Add a scripted element
    pub fn add_element(&self, element: MockElement) {
        self.lock().elements.push(element);
    }

    /// Make every subsequent driver call fail as a session error
    pub fn inject_fault(&self, message: impl Into<String>) {
        self.lock().fault = Some(message.into());
    }

    /// Everything typed so far, in order
    #[must_use]
    pub fn typed(&self) -> Vec<String> {
        self.lock().typed.clone()
    }

    /// Recorded call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().call_history.clone()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().call_history.iter().any(|c| c.starts_with(prefix))
    }

    /// Whether the session was closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of close calls recorded
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.lock()
            .call_history
            .iter()
            .filter(|c| c.as_str() == "close")
            .count()
    }

    fn check_fault(state: &MockState) -> ViajarResult<()> {
        if let Some(ref message) = state.fault {
            return Err(ViajarError::SessionError {
                message: message.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> ViajarResult<()> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        state.call_history.push(format!("navigate:{url}"));
        state.url = url.to_string();
        Ok(())
    }

    async fn find_elements(&self, selector: &Selector) -> ViajarResult<Vec<ElementHandle>> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        state.call_history.push(format!("find:{selector}"));

        let typed = state.typed.clone();
        let mut matches = Vec::new();
        for element in &mut state.elements {
            if element.selector != *selector {
                continue;
            }
            if let Some(ref required) = element.requires_typed {
                if !typed.iter().any(|t| t.contains(required.as_str())) {
                    continue;
                }
            }
            if element.appears_after > 0 {
                element.appears_after -= 1;
                continue;
            }
            matches.push(ElementHandle {
                selector: selector.clone(),
                index: matches.len(),
                tag_name: element.tag_name.clone(),
                text: element.text.clone(),
                visible: element.visible,
                enabled: element.enabled,
            });
        }
        Ok(matches)
    }

    async fn click(&self, element: &ElementHandle) -> ViajarResult<()> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        state
            .call_history
            .push(format!("click:{}[{}]", element.selector, element.index));
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> ViajarResult<()> {
        let mut state = self.lock();
        Self::check_fault(&state)?;
        state
            .call_history
            .push(format!("type:{}[{}]", element.selector, element.index));
        state.typed.push(text.to_string());
        Ok(())
    }

    async fn current_url(&self) -> ViajarResult<String> {
        let state = self.lock();
        Self::check_fault(&state)?;
        Ok(state.url.clone())
    }

    async fn close(&mut self) -> ViajarResult<()> {
        // Close succeeds even with an injected fault: teardown is
        // best-effort and must not mask the step error that preceded it.
        let mut state = self.lock();
        state.call_history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_handle_creation() {
            let handle = ElementHandle::new(Selector::css("button"), 0);
            assert_eq!(handle.index, 0);
            assert!(handle.is_clickable());
        }

        #[test]
        fn test_hidden_handle_not_clickable() {
            let mut handle = ElementHandle::new(Selector::css("button"), 0);
            handle.visible = false;
            assert!(!handle.is_clickable());
        }

        #[test]
        fn test_disabled_handle_not_clickable() {
            let mut handle = ElementHandle::new(Selector::css("button"), 0);
            handle.enabled = false;
            assert!(!handle.is_clickable());
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_records_url() {
            let mut driver = MockDriver::new();
            driver.navigate("https://example.com").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://example.com");
            assert!(driver.was_called("navigate"));
        }

        #[tokio::test]
        async fn test_find_matches_by_selector() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new(Selector::css("li")).with_text("first"));
            driver.add_element(MockElement::new(Selector::css("li")).with_text("second"));
            driver.add_element(MockElement::new(Selector::css("button")));

            let found = driver.find_elements(&Selector::css("li")).await.unwrap();
            assert_eq!(found.len(), 2);
            assert_eq!(found[0].text, "first");
            assert_eq!(found[1].index, 1);
        }

        #[tokio::test]
        async fn test_appears_after_delays_resolution() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new(Selector::css("div")).appears_after(2));

            let sel = Selector::css("div");
            assert!(driver.find_elements(&sel).await.unwrap().is_empty());
            assert!(driver.find_elements(&sel).await.unwrap().is_empty());
            assert_eq!(driver.find_elements(&sel).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_requires_typed_gates_on_input() {
            let driver = MockDriver::new();
            let input = Selector::css("input");
            let suggestion = Selector::css("li.suggestion");
            driver.add_element(MockElement::new(input.clone()).with_tag("input"));
            driver.add_element(
                MockElement::new(suggestion.clone()).requires_typed("5333 Casgrain"),
            );

            assert!(driver.find_elements(&suggestion).await.unwrap().is_empty());

            let field = ElementHandle::new(input, 0);
            driver
                .type_text(&field, "5333 Casgrain Avenue, Montréal")
                .await
                .unwrap();
            assert_eq!(driver.find_elements(&suggestion).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_injected_fault_surfaces_as_session_error() {
            let driver = MockDriver::new();
            driver.inject_fault("browser crashed");
            let err = driver.find_elements(&Selector::css("li")).await.unwrap_err();
            assert!(matches!(err, ViajarError::SessionError { .. }));
        }

        #[tokio::test]
        async fn test_close_succeeds_despite_fault() {
            let mut driver = MockDriver::new();
            driver.inject_fault("browser crashed");
            assert!(driver.close().await.is_ok());
            assert!(driver.is_closed());
            assert_eq!(driver.close_count(), 1);
        }

        #[tokio::test]
        async fn test_clone_shares_state() {
            let driver = MockDriver::new();
            let observer = driver.clone();
            driver.add_element(MockElement::new(Selector::css("p")));
            assert_eq!(
                observer.find_elements(&Selector::css("p")).await.unwrap().len(),
                1
            );
        }
    }
}
