
/// Defaults suitable for tests, mirroring `Default` but pointing at local
/// resources (ephemeral ports, disabled telemetry, fast retries).
pub trait TestDefault {
    fn test_default() -> Self;
}
