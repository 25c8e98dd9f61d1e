//! Logging and tracing collaborator injected into the core.
//!
//! Two channels: `info` for operational events (enable/disable, thrust set or
//! capped, fault signaled) and `trace` for component entry with the current
//! tick. Components are generic over the sink, so with [`SilentSink`] every
//! call site inlines to nothing.

use core::cell::RefCell;
use core::fmt;

pub trait DiagnosticSink {
    fn info(&self, args: fmt::Arguments<'_>);
    fn trace(&self, component: &'static str, tick: u64);
}

/// Forwards to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "thrustgate", "{}", args);
    }

    fn trace(&self, component: &'static str, tick: u64) {
        tracing::trace!(target: "thrustgate", component, tick, "enter");
    }
}

/// Logs stripped, as in flight builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    #[inline(always)]
    fn info(&self, _args: fmt::Arguments<'_>) {}

    #[inline(always)]
    fn trace(&self, _component: &'static str, _tick: u64) {}
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    #[inline]
    fn info(&self, args: fmt::Arguments<'_>) {
        (**self).info(args);
    }

    #[inline]
    fn trace(&self, component: &'static str, tick: u64) {
        (**self).trace(component, tick);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    Info(String),
    Trace { component: &'static str, tick: u64 },
}

/// Keeps every event in memory. Used to assert on log side effects.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<DiagnosticEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.borrow().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::Info(line) => Some(line.clone()),
                DiagnosticEvent::Trace { .. } => None,
            })
            .collect()
    }

    pub fn traced_components(&self) -> Vec<&'static str> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::Trace { component, .. } => Some(*component),
                DiagnosticEvent::Info(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn info(&self, args: fmt::Arguments<'_>) {
        self.events.borrow_mut().push(DiagnosticEvent::Info(args.to_string()));
    }

    fn trace(&self, component: &'static str, tick: u64) {
        self.events.borrow_mut().push(DiagnosticEvent::Trace { component, tick });
    }
}
