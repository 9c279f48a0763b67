//! Load-more gating driven by a scroll sentinel.
//!
//! The sentinel is an off-screen marker at the end of the rendered feed;
//! whatever renders the feed reports its visibility here on every layout
//! pass. The trigger decides when a visibility report should turn into a
//! load-more request.

/// Fires at most once per arming for a visible sentinel.
///
/// Debounced by state, not by timer: once fired, the trigger stays quiet
/// while the sentinel remains continuously visible, and re-arms only when
/// the sentinel goes hidden or when an in-flight fetch completes (`loading`
/// observed true then false). Disposal is just dropping the value; there is
/// no callback to dangle.
#[derive(Debug)]
pub struct ScrollTrigger {
    armed: bool,
    was_loading: bool,
}

impl ScrollTrigger {
    /// A fresh trigger is armed: a sentinel that is already visible on the
    /// first layout pass fires immediately.
    pub fn new() -> Self {
        Self {
            armed: true,
            was_loading: false,
        }
    }

    /// Report the sentinel's state; returns true when a load should start.
    ///
    /// Never fires while `loading` is true or `has_more` is false, no
    /// matter how often the sentinel re-enters the viewport.
    pub fn observe(&mut self, visible: bool, has_more: bool, loading: bool) -> bool {
        // Re-arm on fetch completion so a still-visible sentinel can keep
        // pulling pages until it scrolls out of view or pages run out.
        if self.was_loading && !loading {
            self.armed = true;
        }
        if !visible {
            self.armed = true;
        }

        let fire = self.armed && visible && has_more && !loading;
        if fire {
            self.armed = false;
        }
        self.was_loading = loading;
        fire
    }

    /// Note a completed fetch directly, for callers that drive fetches to
    /// completion between visibility reports and so never show the trigger
    /// a loading transition.
    pub fn fetch_completed(&mut self) {
        self.armed = true;
        self.was_loading = false;
    }
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new()
    }
}
