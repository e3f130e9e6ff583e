pub mod mocks;

pub use mocks::MockRecord;

/// Routes `log` output of the crate to the test harness.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
