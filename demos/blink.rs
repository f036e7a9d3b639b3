//! Minimal host-side board example
//!
//! Run with: cargo run --example blink
//!
//! Wires a looping timer to a value element and ticks the board from a
//! real clock for a few seconds, printing the led state on every change.

use std::time::{Duration, Instant};

use tickboard::{Board, ElementRegistry};

fn main() {
    let registry = ElementRegistry::with_defaults();
    let config = serde_json::json!({
        "timer": {
            "blink": {
                "waittime": 1, "pulsetime": 1, "cycletime": 2, "type": "loop",
                "onon": "value/led:value=1",
                "onoff": "value/led:value=0"
            }
        },
        "value": { "led": { "min": 0, "max": 1 } }
    });

    let mut board = Board::new();
    board.add_elements(&registry, &config).expect("valid configuration");

    let t0 = Instant::now();
    board.start_all(0);

    let mut last = String::new();
    while t0.elapsed() < Duration::from_secs(6) {
        board.tick(t0.elapsed().as_millis() as u64);

        let led = board.get_state(Some("value/led"))["value/led"]["value"].to_string();
        if led != last {
            println!("[{:>5} ms] led = {}", t0.elapsed().as_millis(), led);
            last = led;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
