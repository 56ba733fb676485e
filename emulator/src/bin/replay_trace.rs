//! Replays a captured receiver trace through the decoder.
//!
//! Each line holds `H <ms>` or `L <ms>`; anything after `#` is a comment.

use std::env;
use std::fs;
use std::io;
use std::process;

use dcf77_core::clock::SharedClock;
use dcf77_core::commit::DateSource;
use dcf77_core::decoder::{Dcf77Decoder, PulseOutcome};
use dcf77_core::diagnostics::NoopDiagnostics;
use dcf77_core::frame::MarkerOutcome;
use dcf77_core::mailbox::PulseMailbox;

#[allow(dead_code)]
#[path = "../commands.rs"]
mod commands;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::RecordingRtc;

fn main() -> io::Result<()> {
    let mut args = env::args().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("Usage: replay-trace <file>");
        process::exit(2);
    };

    let trace = fs::read_to_string(&path)?;
    let mut decoder = Dcf77Decoder::new(RecordingRtc::default(), NoopDiagnostics);
    let mailbox = PulseMailbox::new();
    let clock = SharedClock::new();
    let mut malformed = 0_u32;

    for (index, raw) in trace.lines().enumerate() {
        let number = index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let event = match commands::parse_trace_line(content) {
            Ok(event) => event,
            Err(err) => {
                malformed += 1;
                eprintln!("line {number}: skipped: {err}");
                continue;
            }
        };

        mailbox.post(event);
        let Some(report) = decoder.poll(&mailbox, &clock) else {
            continue;
        };

        match report.outcome {
            PulseOutcome::Failed(err) => println!("line {number}: read failed: {err}"),
            PulseOutcome::Marker(MarkerOutcome::Restarted) => {
                println!("line {number}: marker restarted an unfinished frame");
            }
            _ => {}
        }
        match report.commit {
            Some(Ok(plan)) if plan.date == DateSource::Unknown => {
                println!("line {number}: clock only, no date decoded yet");
            }
            Some(Ok(plan)) => {
                println!("line {number}: RTC <- {} (date {})", plan.timestamp, plan.date);
            }
            _ => {}
        }
    }

    let stats = decoder.stats();
    println!(
        "pulses {} frames {} restarts {} failures {} commits {} rtc-writes {} overruns {} malformed {}",
        stats.pulses,
        stats.frames_started,
        stats.frames_restarted,
        stats.failures,
        stats.commits,
        decoder.rtc().writes().len(),
        mailbox.overruns(),
        malformed
    );
    Ok(())
}
