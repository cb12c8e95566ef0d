use crate::device::Shared;
use crate::hardware::TrackerHardware;
use crate::tool::ToolHandle;
use crate::types::DeviceState;
use crate::{Result, TrackerError};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Counters of the current (or last) tracking session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Cycles whose frame was committed to the tools.
    pub cycles: u64,
    /// Cycles skipped because the frame size did not match the tool count.
    pub desyncs: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    cycles: AtomicU64,
    desyncs: AtomicU64,
}

impl Counters {
    pub(crate) fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.desyncs.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> AcquisitionStats {
        AcquisitionStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            desyncs: self.desyncs.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a running acquisition thread.
///
/// The thread polls the hardware and commits frames to the tools until the
/// stop flag is set, the device leaves `Tracking`, or polling fails.
pub(crate) struct Acquisition {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl Acquisition {
    /// Spawn the acquisition thread. The device must already be in `Tracking`.
    pub(crate) fn start<H: TrackerHardware>(
        shared: Arc<Shared<H>>,
        tools: Vec<ToolHandle>,
        faults: Sender<TrackerError>,
    ) -> Result<Acquisition> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let epoch = Instant::now();
        shared.counters.reset();

        let thread = std::thread::Builder::new()
            .name("magtrack-acquisition".into())
            .spawn(move || acquisition_loop(&shared, &tools, &stop_clone, epoch, &faults))
            .map_err(|e| TrackerError::ThreadSpawn(e.to_string()))?;

        Ok(Acquisition {
            stop_flag,
            thread: Some(thread),
        })
    }

    /// True once the thread has returned, e.g. after an acquisition fault.
    pub(crate) fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Signal the thread to stop and wait for it.
    ///
    /// Returns the thread's own result: `Err` if it ended on a fault.
    pub(crate) fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.stop_flag.store(true, Ordering::Release);
        match self.thread.take() {
            Some(thread) => thread.join().unwrap_or(Err(TrackerError::AcquisitionPanicked)),
            None => Ok(()),
        }
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn acquisition_loop<H: TrackerHardware>(
    shared: &Shared<H>,
    tools: &[ToolHandle],
    stop_flag: &AtomicBool,
    epoch: Instant,
    faults: &Sender<TrackerError>,
) -> Result<()> {
    log::info!("Acquisition started for {} tool(s)", tools.len());

    let mut desync_streak: u64 = 0;
    let mut stopped = stop_flag.load(Ordering::Acquire);

    while !stopped && shared.state() == DeviceState::Tracking {
        let polled = shared.hardware.lock().poll_latest_frame();
        let frame = match polled {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Error while polling tracking data, stopping acquisition: {}", e);
                let fault = TrackerError::Acquisition(e.to_string());
                shared.abort_tracking();
                let _ = faults.send(fault.clone());
                return Err(fault);
            }
        };

        if frame.len() != tools.len() {
            if frame.is_empty() {
                log::trace!("No frame available yet");
            } else {
                desync_streak += 1;
                shared.counters.desyncs.fetch_add(1, Ordering::Relaxed);
                if desync_streak <= 5 || desync_streak % 100 == 0 {
                    log::warn!(
                        "Frame has {} sample(s) but {} tool(s) are registered, skipping (streak {})",
                        frame.len(),
                        tools.len(),
                        desync_streak
                    );
                }
            }
        } else {
            if desync_streak > 0 {
                log::info!("Frame size recovered after {} skipped cycle(s)", desync_streak);
                desync_streak = 0;
            }

            let cycle = shared.counters.cycles.fetch_add(1, Ordering::Relaxed) + 1;
            let timestamp = epoch.elapsed();
            // Samples map to tools by position, not by port.
            for (tool, sample) in tools.iter().zip(frame.iter()) {
                tool.commit(sample, timestamp, cycle);
            }
        }

        stopped = stop_flag.load(Ordering::Acquire);
    }

    log::info!("Acquisition stopped");
    Ok(())
}
