//! Diagnostic delivery.
//!
//! Validation routines hand every finding to a [`DiagnosticSink`], which
//! decides whether the finding aborts the call. The sink's verdict is folded
//! into the routine's skip flag.

use std::borrow::Cow;
use std::fmt;

use ash::vk::{self, Handle};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{error, warn};
use vkv_core::config::ValidationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A normative valid-usage rule was violated.
    Error,
    /// Suspicious but not invalid.
    Warning,
    /// Legal, but likely costly.
    PerformanceWarning,
}

/// A Vulkan object named by a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub ty: vk::ObjectType,
    pub handle: u64,
}

impl ObjectRef {
    pub fn new<H: Handle>(handle: H) -> Self {
        Self {
            ty: H::TYPE,
            handle: handle.as_raw(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} 0x{:x}", self.ty, self.handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub vuid: Cow<'static, str>,
    pub objects: Vec<ObjectRef>,
    pub message: String,
}

/// Receives diagnostics. Returning `true` tells the caller to treat the call
/// as failed validation.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic) -> bool;
}

/// Default sink: filters according to the layer settings and logs through
/// `tracing`.
pub struct TracingSink {
    settings: ValidationSettings,
    counts: DashMap<Cow<'static, str>, u32>,
}

impl TracingSink {
    pub fn new(settings: ValidationSettings) -> Self {
        Self {
            settings,
            counts: DashMap::new(),
        }
    }

    /// Count one more message for `vuid`, returning false once the duplicate
    /// limit has been reached.
    fn admit(&self, vuid: &Cow<'static, str>) -> bool {
        let limit = self.settings.duplicate_message_limit;
        let mut count = self.counts.entry(vuid.clone()).or_insert(0);
        *count += 1;
        limit == 0 || *count <= limit
    }
}

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) -> bool {
        if self.settings.is_muted(&diagnostic.vuid) {
            return false;
        }
        if diagnostic.severity == Severity::PerformanceWarning
            && !self.settings.report_performance_warnings
        {
            return false;
        }

        let verdict = match diagnostic.severity {
            Severity::Error => self.settings.abort_on_error,
            Severity::Warning | Severity::PerformanceWarning => false,
        };

        if self.admit(&diagnostic.vuid) {
            let objects = diagnostic
                .objects
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            match diagnostic.severity {
                Severity::Error => error!(
                    vuid = %diagnostic.vuid,
                    objects = %objects,
                    "{}",
                    diagnostic.message
                ),
                Severity::Warning | Severity::PerformanceWarning => warn!(
                    vuid = %diagnostic.vuid,
                    objects = %objects,
                    severity = ?diagnostic.severity,
                    "{}",
                    diagnostic.message
                ),
            }
        }

        verdict
    }
}

/// Sink that keeps every diagnostic. Warnings never abort; errors abort
/// unless the sink was built with [`CollectingSink::accumulating`].
pub struct CollectingSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    abort_on_error: bool,
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            abort_on_error: true,
        }
    }

    /// A sink whose verdict is always "continue", so every check runs.
    pub fn accumulating() -> Self {
        Self {
            abort_on_error: false,
            ..Self::new()
        }
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// VUIDs reported so far, in report order.
    pub fn vuids(&self) -> Vec<String> {
        self.diagnostics
            .lock()
            .iter()
            .map(|d| d.vuid.to_string())
            .collect()
    }

    pub fn contains(&self, vuid: &str) -> bool {
        self.diagnostics.lock().iter().any(|d| d.vuid == vuid)
    }

    pub fn count(&self, vuid: &str) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.vuid == vuid)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) -> bool {
        let verdict = self.abort_on_error && diagnostic.severity == Severity::Error;
        self.diagnostics.lock().push(diagnostic);
        verdict
    }
}
