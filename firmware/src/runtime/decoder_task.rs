use embassy_futures::join::join;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_time::{Duration, Instant, Ticker};

use dcf77_core::decoder::Dcf77Decoder;

use crate::rtc::BackupRtc;
use crate::screen::{SharedScreen, new_screen};
use crate::status;
use crate::telemetry;

/// How often the mailbox is drained; well below the shortest DCF77 pulse.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[embassy_executor::task]
pub async fn run(rtc: BackupRtc<I2c<'static, Blocking>>) -> ! {
    let screen = new_screen();
    let mut decoder = Dcf77Decoder::new(rtc, SharedScreen::new(&screen));

    let poll = async {
        let mut ticker = Ticker::every(POLL_INTERVAL);
        loop {
            ticker.next().await;
            let Some(report) = decoder.poll(&status::PULSES, &status::CLOCK) else {
                continue;
            };
            telemetry::report_step(&report);
            if report.commit.is_some() {
                let uptime = u32::try_from(Instant::now().as_secs()).unwrap_or(u32::MAX);
                status::record_commit(uptime);
            }
            status::record_stats(decoder.stats());
        }
    };

    let report = async {
        let mut ticker = Ticker::every(REPORT_INTERVAL);
        loop {
            ticker.next().await;
            let now = status::CLOCK.tick_second();
            let lines = SharedScreen::new(&screen).tick(now.time);
            telemetry::log_screen(&lines);
            if now.time.second == 0 {
                telemetry::log_status(&status::snapshot());
            }
        }
    };

    join(poll, report).await;
    loop {
        core::future::pending::<()>().await;
    }
}
