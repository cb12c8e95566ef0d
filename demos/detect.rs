//! Auto-detect the sensors of a simulated tracker.

use magtrack::{SimulatedTracker, TrackerConfig, TrackingDevice};

fn main() {
    env_logger::init();

    let mut device = TrackingDevice::new(SimulatedTracker::new(vec![1, 3, 4]), TrackerConfig::from_env());

    match device.auto_detect_tools() {
        Ok(tools) => {
            println!("Found {} tool(s):", tools.tool_count());
            for (i, tool) in tools.iter().enumerate() {
                println!("  [{}] {}  port={}", i, tool.name(), tool.port());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
