//! Example demonstrating deadband change filtering.
//!
//! This example shows how to:
//! - Build a validated filter configuration
//! - Feed a noisy sensor signal through the store's change detection
//! - Pick up accepted points exactly once with fresh reads

use rtdb::error::Result;
use rtdb::{FilterConfig, FreshRead, IsoTimestamp, Point, PointStore, Priority};

const SENSOR: u64 = 1001;

fn main() -> Result<()> {
    println!("🚀 rtdb Deadband Filter Example");

    let filter = FilterConfig::new(Priority::Deadband, Some(0.5))?;
    let store = PointStore::new();

    // Slow ramp with jitter: most samples stay inside the 0.5 band
    let samples = [
        20.0, 20.1, 20.3, 19.9, 20.6, 20.7, 21.0, 21.2, 20.9, 21.8, 21.9, 22.5,
    ];
    let start = IsoTimestamp::parse("2024-03-01T12:00:00+0000")?;

    println!("\n📊 Filtering {} samples (aperture 0.5)...", samples.len());

    let mut accepted = 0;
    for (secs, value) in (0i64..).zip(samples) {
        let millis = start.as_datetime().timestamp_millis() + secs * 1_000;
        let ts = IsoTimestamp::from_unix_millis(millis, 0).unwrap_or(start);

        if store.is_point_changed_with(SENSOR, Point::new(value, 0, ts), &filter) {
            accepted += 1;
            println!("  ✅ {ts}  {value:>5.1}  stored");

            match store.get_fresh(SENSOR) {
                FreshRead::Fresh(p) => println!("     fresh read -> {:.1}", p.value),
                FreshRead::Stale(_) | FreshRead::Missing => println!("     no fresh data"),
            }
        } else {
            println!("  ·  {ts}  {value:>5.1}  within deadband");
        }
    }

    println!("\n📈 Summary:");
    println!("  Samples: {}", samples.len());
    println!("  Accepted: {accepted}");
    println!("  Suppressed: {}", samples.len() - accepted);

    if let Some(last) = store.get(SENSOR) {
        println!("  Last stored: {:.1} at {}", last.value, last.timestamp.to_wire());
    }

    // A second fresh read after the loop finds nothing new
    assert!(!store.get_fresh(SENSOR).is_fresh());

    println!("\n🎉 Deadband filter example completed successfully!");
    Ok(())
}
