use crate::{
    config::Config,
    error::{ErrorKind, FlowError},
    flow::RunDevice,
    report::{BatchReport, RunResult},
};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Runs devices one after another and collects one result per device.
pub struct Batch<'a, R: RunDevice> {
    cfg: &'a Config,
    runner: R,
}

impl<'a, R: RunDevice> Batch<'a, R> {
    pub fn new(cfg: &'a Config, runner: R) -> Self {
        Self { cfg, runner }
    }

    /// Results come back in `devices` order, one per entry. A failed or
    /// crashed device never stops the batch.
    pub fn run_all(&self, devices: &[String]) -> BatchReport {
        let started = Instant::now();
        let between = Duration::from_secs(self.cfg.timing.between_devices_seconds);
        let mut results = Vec::with_capacity(devices.len());

        info!("batch of {} devices", devices.len());
        for (i, device) in devices.iter().enumerate() {
            info!("[{}/{}] {device}", i + 1, devices.len());

            let result = match catch_unwind(AssertUnwindSafe(|| self.runner.run(device))) {
                Ok(r) => r,
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    error!("{device}: runner panicked: {msg}");
                    let err = FlowError::new(ErrorKind::Internal, format!("runner panicked: {msg}"));
                    RunResult::failed(device, 0.0, &err, None)
                }
            };
            results.push(result);

            if i + 1 < devices.len() && !between.is_zero() {
                info!("waiting {}s before next device", between.as_secs());
                std::thread::sleep(between);
            }
        }

        let report = BatchReport::new(results, started.elapsed().as_secs_f64());
        info!(
            "batch done: {} passed, {} failed, {}%",
            report.successes, report.failures, report.success_rate
        );
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
