#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Logging for the decoder pipeline.
//!
//! Messages go to defmt on the target and to the console on the host. Every
//! line carries a `dcf77:<area>` prefix.

use core::fmt::{self, Write as _};

use dcf77_core::clock::ClockSnapshot;
use dcf77_core::commit::{CommitError, CommitPlan, DateSource};
use dcf77_core::decoder::{PulseOutcome, StepReport};
use dcf77_core::diagnostics::info_screen::ScreenLine;
use dcf77_core::frame::MarkerOutcome;

use crate::status::StatusSnapshot;

const LOG_LINE_CAPACITY: usize = 64;

type LogLine = heapless::String<LOG_LINE_CAPACITY>;

/// Logs the notable parts of one decoder step: failures, restarts and commits.
pub fn report_step<E>(report: &StepReport<E>)
where
    E: fmt::Debug,
{
    match report.outcome {
        PulseOutcome::Marker(MarkerOutcome::Restarted) => {
            emit_warn("dcf77:frame", "marker cut an unfinished frame short");
        }
        PulseOutcome::Failed(error) => {
            emit_info("dcf77:frame", &format_line(format_args!("read failed: {error}")));
        }
        _ => {}
    }

    match &report.commit {
        Some(Ok(plan)) => emit_info("dcf77:commit", &commit_message(plan)),
        Some(Err(CommitError::RtcWrite(error))) => {
            emit_warn(
                "dcf77:rtc",
                &format_line(format_args!("write failed ({error:?}); clock updated anyway")),
            );
        }
        None => {}
    }
}

pub fn log_overrun(total: u32) {
    emit_warn(
        "dcf77:capture",
        &format_line(format_args!("pulse overwritten before decoding (total {total})")),
    );
}

pub fn log_screen(lines: &[ScreenLine]) {
    for line in lines {
        emit_info("dcf77:screen", line);
    }
}

/// Logs what the RTC held at boot.
pub fn log_restore<E>(result: &Result<ClockSnapshot, E>)
where
    E: fmt::Debug,
{
    match result {
        Ok(snapshot) => emit_info("dcf77:rtc", &restore_message(snapshot)),
        Err(error) => emit_warn(
            "dcf77:rtc",
            &format_line(format_args!("read failed ({error:?}); waiting for signal")),
        ),
    }
}

pub fn log_start_failure<E: fmt::Debug>(error: &E) {
    emit_warn(
        "dcf77:rtc",
        &format_line(format_args!("oscillator start failed ({error:?})")),
    );
}

pub fn log_status(status: &StatusSnapshot) {
    emit_info(
        "dcf77:status",
        &format_line(format_args!(
            "frames {} failures {} commits {} rtc errors {}",
            status.frames_started, status.failures, status.commits, status.rtc_errors
        )),
    );
    emit_info("dcf77:status", &last_commit_message(status));
}

fn commit_message(plan: &CommitPlan) -> LogLine {
    let stamp = &plan.timestamp;
    match plan.date {
        DateSource::Unknown => format_line(format_args!(
            "{:02}:{:02}:{:02} (date unknown, RTC not written)",
            stamp.hour, stamp.minute, stamp.second
        )),
        source => format_line(format_args!("{stamp} (date {source})")),
    }
}

fn restore_message(snapshot: &ClockSnapshot) -> LogLine {
    let time = snapshot.time;
    if snapshot.date.is_known() {
        let date = snapshot.date;
        format_line(format_args!(
            "restored {:02}:{:02}:{:02} {:02}.{:02}.{:02}",
            time.hour, time.minute, time.second, date.day, date.month, date.year
        ))
    } else {
        format_line(format_args!(
            "restored {:02}:{:02}:{:02}, no valid date",
            time.hour, time.minute, time.second
        ))
    }
}

fn last_commit_message(status: &StatusSnapshot) -> LogLine {
    match status.last_commit_secs {
        Some(secs) => format_line(format_args!(
            "overruns {} last commit at {secs}s uptime",
            status.overruns
        )),
        None => format_line(format_args!("overruns {} no commit yet", status.overruns)),
    }
}

fn format_line(args: fmt::Arguments<'_>) -> LogLine {
    let mut line = LogLine::new();
    // fragments past capacity are dropped
    let _ = line.write_fmt(args);
    line
}

#[cfg(target_os = "none")]
fn emit_info(area: &'static str, message: &str) {
    defmt::info!("{} {}", area, message);
}

#[cfg(target_os = "none")]
fn emit_warn(area: &'static str, message: &str) {
    defmt::warn!("{} {}", area, message);
}

#[cfg(not(target_os = "none"))]
fn emit_info(area: &'static str, message: &str) {
    println!("{area} {message}");
}

#[cfg(not(target_os = "none"))]
fn emit_warn(area: &'static str, message: &str) {
    eprintln!("{area} {message}");
}
