//! Track two simulated sensors moving on a circle and print their poses.
//!
//! Usage: RUST_LOG=info cargo run --example stream

use magtrack::{Pose, SimulatedTracker, TrackerConfig, TrackingDevice};
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();

    let tracker = SimulatedTracker::new(vec![1, 2]);
    let sensors = tracker.handle();
    let mut device = TrackingDevice::new(tracker, TrackerConfig::from_env());

    device.add_tool("Pointer", 1);
    device.add_tool("Reference", 2);

    if let Err(e) = device.open_connection() {
        eprintln!("Failed to connect: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = device.start_tracking() {
        eprintln!("Failed to start tracking: {}", e);
        std::process::exit(1);
    }

    let faults = device.fault_receiver();
    let start = Instant::now();
    let mut frames: u64 = 0;

    while start.elapsed() < Duration::from_secs(3) {
        let t = start.elapsed().as_secs_f64();
        sensors.push_frame(vec![
            (1, Pose::from_azimuth_elevation_roll([100.0 * t.cos(), 100.0 * t.sin(), 0.0], t.to_degrees(), 0.0, 0.0)),
            (2, Pose::IDENTITY),
        ]);
        frames += 1;

        if frames % 20 == 1 {
            for tool in device.all_tools() {
                let s = tool.snapshot();
                println!(
                    "{:<10} valid={} t={:>8.3}s  pos=[{:+8.2}, {:+8.2}, {:+8.2}]  quat=[{:+.3}, {:+.3}, {:+.3}, {:+.3}]",
                    tool.name(),
                    s.valid,
                    s.timestamp.as_secs_f64(),
                    s.pose.position[0], s.pose.position[1], s.pose.position[2],
                    s.pose.orientation[0], s.pose.orientation[1], s.pose.orientation[2], s.pose.orientation[3],
                );
            }
        }

        if let Ok(fault) = faults.try_recv() {
            eprintln!("Tracking stopped: {}", fault);
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    let stats = device.stats();
    println!(
        "\nTotal: {} cycles committed, {} desyncs in {:.1}s",
        stats.cycles,
        stats.desyncs,
        start.elapsed().as_secs_f64()
    );

    if let Err(e) = device.close_connection() {
        eprintln!("Error while closing: {}", e);
    }
}
