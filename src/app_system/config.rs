use std::time::Duration;

/// Runtime settings for the donation system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Mailbox capacity of the repository service.
    pub buffer_size: usize,
    /// Attempts per table write before a write failure is reported.
    pub write_attempts: u32,
    /// Fall back to the demo collections when a table is absent or corrupt.
    pub seed_demo_data: bool,
    /// Upper bound on a single call to the text assistant.
    pub assistant_timeout: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            write_attempts: 3,
            seed_demo_data: true,
            assistant_timeout: Duration::from_secs(10),
        }
    }
}

impl SystemConfig {
    /// Config with empty default tables, for tests that need a clean slate.
    pub fn unseeded() -> Self {
        Self {
            seed_demo_data: false,
            ..Self::default()
        }
    }
}
