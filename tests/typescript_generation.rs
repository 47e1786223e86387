//! TypeScript Generation Tests
//!
//! Validates that the frontend-facing types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_frontend_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, every type is configured for TypeScript export.
    fn assert_type<T: Type>() {}

    // Query results
    assert_type::<pitlane::EventScheduleEntry>();
    assert_type::<pitlane::DriverRef>();
    assert_type::<pitlane::LapSummary>();
    assert_type::<pitlane::TelemetrySample>();
    assert_type::<pitlane::TelemetryTrace>();
    assert_type::<pitlane::TelemetryColumns>();

    // Session and cache state
    assert_type::<pitlane::SessionKey>();
    assert_type::<pitlane::SlotState>();
    assert_type::<pitlane::CacheStats>();
    assert_type::<pitlane::DistancePolicy>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    assert_eq!(pitlane::DistancePolicy::default(), pitlane::DistancePolicy::Strict);
}
