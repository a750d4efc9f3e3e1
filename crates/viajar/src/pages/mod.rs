//! Page objects: named façades over one logical screen.
//!
//! A page object owns the selectors for its screen and composes wait
//! engine calls into domain-level actions, so scenario code never sees a
//! raw selector. Page objects borrow the scenario's session; they hold no
//! business data.

pub mod trip;

pub use trip::TripPage;

/// A named façade over one logical page or screen.
pub trait Page {
    /// Short page name for logging
    fn name(&self) -> &'static str;
}
