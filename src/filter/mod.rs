//! Filters applied to incoming text before matching
//!
//! A filter sees every decoded chunk before it is appended to an input's
//! buffer, and may look at (or rewrite) the whole buffer right after the
//! append. Filters run on the task that calls `expect`, never on the reader
//! task, so they may keep state such as a held-back partial escape sequence.
//!
//! Every filter can be switched on and off at any time through a [`Switch`];
//! a disabled filter passes text through unchanged but keeps its place in a
//! [`FilterChain`].

mod ansi;
mod replace;

pub use ansi::{strip_ansi, StripAnsi};
pub use replace::{
    lines, remove_non_printable, replace_in_buffer, replace_in_chunk, Lines, RemoveNonPrintable,
    ReplaceInBuffer, ReplaceInChunk,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A text transform applied around each append to an input buffer.
pub trait Filter: Send {
    /// Transform a freshly decoded chunk.
    ///
    /// `buffer` is the current buffer content. A filter holding data back
    /// until more arrives returns an empty string. `None` stops a
    /// [`FilterChain`] and appends the previous filter's output instead.
    fn before_append(&mut self, chunk: &str, buffer: &str) -> Option<String>;

    /// Inspect or rewrite the buffer after an append.
    ///
    /// Returning `true` stops propagation to later filters in a chain.
    fn after_append(&mut self, _buffer: &mut String) -> bool {
        false
    }

    /// A fresh instance for another input.
    ///
    /// The fork shares the enabled switch but none of the held-back state.
    fn fork(&self) -> Box<dyn Filter>;
}

impl Filter for Box<dyn Filter> {
    fn before_append(&mut self, chunk: &str, buffer: &str) -> Option<String> {
        (**self).before_append(chunk, buffer)
    }

    fn after_append(&mut self, buffer: &mut String) -> bool {
        (**self).after_append(buffer)
    }

    fn fork(&self) -> Box<dyn Filter> {
        (**self).fork()
    }
}

/// Shared enabled flag for a filter.
///
/// Cloning a switch gives another handle to the same flag, so a filter can
/// be toggled from outside after it has been handed to an `Expect`.
#[derive(Debug, Clone)]
pub struct Switch(Arc<AtomicBool>);

impl Switch {
    /// A new switch, initially enabled.
    pub fn new() -> Self {
        Switch(Arc::new(AtomicBool::new(true)))
    }

    /// Turn the filter on.
    pub fn enable(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Turn the filter into a pass-through.
    pub fn disable(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Set the flag.
    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }

    /// Whether the filter is active.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for Switch {
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps a filter with a [`Switch`].
pub struct Toggle<F> {
    filter: F,
    switch: Switch,
}

impl<F: Filter> Toggle<F> {
    /// Wrap `filter`, initially enabled.
    pub fn new(filter: F) -> Self {
        Self::with_switch(filter, Switch::new())
    }

    /// Wrap `filter` under an existing switch.
    pub fn with_switch(filter: F, switch: Switch) -> Self {
        Self { filter, switch }
    }

    /// Handle to the enabled flag.
    pub fn switch(&self) -> Switch {
        self.switch.clone()
    }
}

impl<F: Filter> Filter for Toggle<F> {
    fn before_append(&mut self, chunk: &str, buffer: &str) -> Option<String> {
        if self.switch.is_enabled() {
            self.filter.before_append(chunk, buffer)
        } else {
            Some(chunk.to_string())
        }
    }

    fn after_append(&mut self, buffer: &mut String) -> bool {
        self.switch.is_enabled() && self.filter.after_append(buffer)
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(Toggle {
            filter: self.filter.fork(),
            switch: self.switch.clone(),
        })
    }
}

/// An ordered chain of filters.
///
/// `before_append` feeds each enabled filter's output into the next one.
/// When a filter returns `None` propagation stops and the last output
/// produced by an earlier filter is appended; if the very first enabled
/// filter returns `None`, nothing is appended. `after_append` runs until a
/// filter asks to stop.
///
/// ```
/// use multiexpect::filter::{remove_non_printable, strip_ansi, Filter, FilterChain};
///
/// let mut chain = FilterChain::new();
/// let ansi = chain.push(strip_ansi());
/// chain.push(remove_non_printable());
///
/// assert_eq!(chain.before_append("\x1b[31mred\x07\x1b[0m", "").unwrap(), "red");
/// ansi.disable();
/// assert_eq!(chain.before_append("\x1b[1mb", "").unwrap(), "[1mb");
/// ```
pub struct FilterChain {
    filters: Vec<Toggle<Box<dyn Filter>>>,
    switch: Switch,
}

impl FilterChain {
    /// An empty, enabled chain.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            switch: Switch::new(),
        }
    }

    /// Append a filter; returns the switch controlling it.
    pub fn push(&mut self, filter: impl Filter + 'static) -> Switch {
        let toggle = Toggle::new(Box::new(filter) as Box<dyn Filter>);
        let switch = toggle.switch();
        self.filters.push(toggle);
        switch
    }

    /// Builder-style [`push`](FilterChain::push).
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.push(filter);
        self
    }

    /// Handle to the enabled flag of the whole chain.
    pub fn switch(&self) -> Switch {
        self.switch.clone()
    }

    /// Number of filters in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for FilterChain {
    fn before_append(&mut self, chunk: &str, buffer: &str) -> Option<String> {
        if !self.switch.is_enabled() {
            return Some(chunk.to_string());
        }

        let mut current: Option<String> = None;
        for filter in self.filters.iter_mut().filter(|f| f.switch.is_enabled()) {
            let input = current.as_deref().unwrap_or(chunk);
            match filter.before_append(input, buffer) {
                Some(output) => current = Some(output),
                None => return current,
            }
        }

        Some(current.unwrap_or_else(|| chunk.to_string()))
    }

    fn after_append(&mut self, buffer: &mut String) -> bool {
        if !self.switch.is_enabled() {
            return false;
        }
        self.filters.iter_mut().any(|f| f.after_append(buffer))
    }

    fn fork(&self) -> Box<dyn Filter> {
        Box::new(FilterChain {
            filters: self
                .filters
                .iter()
                .map(|f| Toggle::with_switch(f.filter.fork(), f.switch.clone()))
                .collect(),
            switch: self.switch.clone(),
        })
    }
}
