use embassy_stm32::exti::ExtiInput;
use embassy_time::Instant;

use crate::capture::EdgeTracker;
use crate::status;
use crate::telemetry;

#[embassy_executor::task]
pub async fn run(mut receiver: ExtiInput<'static>) -> ! {
    let mut tracker = EdgeTracker::new();
    tracker.edge(receiver.is_high(), Instant::now());

    loop {
        receiver.wait_for_any_edge().await;
        let at = Instant::now();
        if let Some(pulse) = tracker.edge(receiver.is_high(), at) {
            if status::PULSES.post(pulse) {
                telemetry::log_overrun(status::PULSES.overruns());
            }
        }
    }
}
