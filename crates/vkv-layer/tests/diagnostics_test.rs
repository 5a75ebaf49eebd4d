//! Integration test: diagnostic delivery
//!
//! Settings-driven filtering and verdicts of the tracing sink.

use std::sync::Arc;

use ash::vk::{self, Handle};
use vkv_core::config::ValidationSettings;
use vkv_layer::{CollectingSink, Diagnostic, DiagnosticSink, ObjectRef, Severity, TracingSink};

const VUID: &str = "VUID-vkAcquireNextImageKHR-semaphore-01780";

fn diagnostic(severity: Severity) -> Diagnostic {
    Diagnostic {
        severity,
        vuid: VUID.into(),
        objects: vec![ObjectRef::new(vk::Device::null())],
        message: "semaphore and fence are both VK_NULL_HANDLE.".to_string(),
    }
}

#[test]
fn test_errors_abort_by_default() {
    let sink = TracingSink::new(ValidationSettings::default());
    assert!(sink.report(diagnostic(Severity::Error)));
    assert!(!sink.report(diagnostic(Severity::Warning)));
    assert!(!sink.report(diagnostic(Severity::PerformanceWarning)));
}

#[test]
fn test_abort_can_be_disabled() {
    let sink = TracingSink::new(ValidationSettings {
        abort_on_error: false,
        ..Default::default()
    });
    assert!(!sink.report(diagnostic(Severity::Error)));
}

#[test]
fn test_muted_vuid_never_aborts() {
    let sink = TracingSink::new(ValidationSettings {
        muted_vuids: vec![VUID.to_string()],
        ..Default::default()
    });
    assert!(!sink.report(diagnostic(Severity::Error)));

    let other = Diagnostic {
        vuid: "VUID-vkAcquireNextImageKHR-fence-01287".into(),
        ..diagnostic(Severity::Error)
    };
    assert!(sink.report(other));
}

#[test]
fn test_duplicate_limit_only_silences_logging() {
    let sink = TracingSink::new(ValidationSettings {
        duplicate_message_limit: 2,
        ..Default::default()
    });
    for _ in 0..5 {
        assert!(sink.report(diagnostic(Severity::Error)));
    }
}

#[test]
fn test_collecting_sink_verdicts() {
    let aborting = CollectingSink::new();
    assert!(aborting.report(diagnostic(Severity::Error)));
    assert!(!aborting.report(diagnostic(Severity::Warning)));
    assert_eq!(aborting.count(VUID), 2);

    let accumulating = CollectingSink::accumulating();
    assert!(!accumulating.report(diagnostic(Severity::Error)));
    assert_eq!(accumulating.vuids(), [VUID]);

    accumulating.clear();
    assert!(accumulating.is_empty());
}

#[test]
fn test_object_ref_names_type_and_handle() {
    let object = ObjectRef::new(vk::SwapchainKHR::from_raw(0xabc));
    assert_eq!(object.ty, vk::ObjectType::SWAPCHAIN_KHR);
    assert_eq!(object.to_string(), "SWAPCHAIN_KHR 0xabc");
}

#[test]
fn test_sink_is_shareable_across_threads() {
    let sink = Arc::new(CollectingSink::accumulating());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sink = Arc::clone(&sink);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    sink.report(diagnostic(Severity::Warning));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("reporter thread panicked");
    }
    assert_eq!(sink.count(VUID), 100);
}
