use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use dcf77_core::clock::SharedClock;
use dcf77_core::commit::{CommitError, DateSource, RtcTimestamp, RtcWriter};
use dcf77_core::decoder::{Dcf77Decoder, PulseOutcome, StepReport};
use dcf77_core::diagnostics::{DiagnosticsRecorder, InfoScreen};
use dcf77_core::frame::layout::FRAME_BITS;
use dcf77_core::frame::{BitOutcome, MarkerOutcome};
use dcf77_core::mailbox::PulseMailbox;
use dcf77_core::pulse::{PulseEvent, PulseLevel};
use dcf77_core::synth::{self, FrameTime};

use crate::commands::{self, Command, DateArg, TimeArg};

/// Upper bound for a single `send`; one day of frames.
pub const MAX_SEND_MINUTES: u16 = 1_440;
/// Diagnostics shown by `status`.
const STATUS_HISTORY: usize = 8;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "send",
        "send <YYYY-MM-DD> <HH:MM> [minutes]  - transmit consecutive frames",
    ),
    (
        "flip",
        "flip <bit>                           - corrupt one bit (0..=58) of the next frame",
    ),
    (
        "pulse",
        "pulse <high|low> <ms>                - inject one raw pulse",
    ),
    (
        "screen",
        "screen                               - render the info screen",
    ),
    (
        "status",
        "status                               - show decoder, clock and RTC state",
    ),
    (
        "help",
        "help [topic]                         - show help for a command",
    ),
];

/// RTC stand-in that keeps every timestamp written to it.
#[derive(Debug, Default)]
pub struct RecordingRtc {
    writes: Vec<RtcTimestamp>,
}

impl RecordingRtc {
    pub fn writes(&self) -> &[RtcTimestamp] {
        &self.writes
    }
}

impl RtcWriter for RecordingRtc {
    type Error = Infallible;

    fn write_time(&mut self, timestamp: &RtcTimestamp) -> Result<(), Self::Error> {
        self.writes.push(*timestamp);
        Ok(())
    }
}

type Diagnostics = (InfoScreen, DiagnosticsRecorder);

pub struct Session {
    decoder: Dcf77Decoder<RecordingRtc, Diagnostics>,
    clock: SharedClock,
    mailbox: PulseMailbox,
    pending_flip: Option<usize>,
    transcript: Option<Transcript>,
}

impl Session {
    pub fn new(transcript: Option<&Path>) -> io::Result<Self> {
        let transcript = transcript.map(Transcript::create).transpose()?;
        Ok(Self {
            decoder: Dcf77Decoder::new(
                RecordingRtc::default(),
                (InfoScreen::new(), DiagnosticsRecorder::new()),
            ),
            clock: SharedClock::new(),
            mailbox: PulseMailbox::new(),
            pending_flip: None,
            transcript,
        })
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let lines = match commands::parse(trimmed) {
            Ok(command) => self.execute(command),
            Err(err) => vec![format!("ERR syntax {err}")],
        };
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.record(trimmed, &lines)?;
        }
        Ok(lines)
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        match command {
            Command::Send {
                date,
                time,
                minutes,
            } => self.handle_send(date, time, minutes),
            Command::Flip { bit } => self.handle_flip(bit),
            Command::Pulse { level, duration_ms } => {
                let event = PulseEvent::new(level, duration_ms);
                let mut lines = vec![format!("pulse {} {duration_ms}ms", level_tag(level))];
                self.feed(event, &mut lines);
                lines
            }
            Command::Screen => self.screen_lines(),
            Command::Status => self.status_lines(),
            Command::Help(topic) => help_lines(topic),
        }
    }

    fn handle_send(&mut self, date: DateArg, time: TimeArg, minutes: u16) -> Vec<String> {
        if minutes == 0 || minutes > MAX_SEND_MINUTES {
            return vec![format!(
                "ERR minutes must be within 1..={MAX_SEND_MINUTES}"
            )];
        }
        let mut frame_time =
            match FrameTime::from_calendar(date.year, date.month, date.day, time.hour, time.minute)
            {
                Ok(frame_time) => frame_time,
                Err(err) => return vec![format!("ERR {err}")],
            };

        let mut lines = Vec::new();
        let mut sent = 0_u16;
        while sent < minutes {
            let mut bits = synth::encode_frame(&frame_time);
            let mut header = format!("TX {frame_time}");
            if let Some(bit) = self.pending_flip.take() {
                bits.flip(bit);
                header.push_str(&format!(" (bit {bit} flipped)"));
            }
            lines.push(header);

            for pulse in synth::minute_pulses(&bits) {
                if pulse.level == PulseLevel::High {
                    self.tick_second();
                }
                self.feed(pulse, &mut lines);
            }
            sent += 1;
            match frame_time.next_minute() {
                Some(next) => frame_time = next,
                None if sent < minutes => {
                    lines.push(format!("WARN no frames after {frame_time}"));
                    break;
                }
                None => {}
            }
        }
        lines.push(format!("OK sent {sent} frame(s)"));
        lines
    }

    fn handle_flip(&mut self, bit: u16) -> Vec<String> {
        let bit = usize::from(bit);
        if bit >= FRAME_BITS {
            return vec![format!("ERR bit must be within 0..={}", FRAME_BITS - 1)];
        }
        self.pending_flip = Some(bit);
        vec![format!("OK bit {bit} of the next frame will be flipped")]
    }

    /// Hands one pulse to the decoder through the mailbox, as the capture
    /// task would.
    fn feed(&mut self, event: PulseEvent, lines: &mut Vec<String>) {
        if self.mailbox.post(event) {
            lines.push(format!(
                "WARN pulse overwritten (total {})",
                self.mailbox.overruns()
            ));
        }
        if let Some(report) = self.decoder.poll(&self.mailbox, &self.clock) {
            describe_step(&report, lines);
        }
    }

    fn tick_second(&mut self) {
        self.clock.tick_second();
        self.decoder.diagnostics_mut().0.tick_second();
    }

    fn screen_lines(&self) -> Vec<String> {
        let now = self.clock.load().time;
        self.decoder
            .diagnostics()
            .0
            .render(now)
            .iter()
            .map(|line| line.as_str().to_string())
            .collect()
    }

    fn status_lines(&self) -> Vec<String> {
        let stats = self.decoder.stats();
        let snapshot = self.clock.load();
        let state = self.decoder.frame().state();
        let mut lines = vec![
            format!(
                "clock {:02}:{:02}:{:02} date {:02}.{:02}.{:02}",
                snapshot.time.hour,
                snapshot.time.minute,
                snapshot.time.second,
                snapshot.date.day,
                snapshot.date.month,
                snapshot.date.year
            ),
            format!(
                "frame position {} ({})",
                state.position(),
                if state.is_waiting() {
                    "waiting for marker"
                } else {
                    "reading"
                }
            ),
            format!(
                "pulses {} frames {} restarts {} failures {} commits {}",
                stats.pulses,
                stats.frames_started,
                stats.frames_restarted,
                stats.failures,
                stats.commits
            ),
            format!(
                "rtc writes {} overruns {}",
                self.decoder.rtc().writes().len(),
                self.mailbox.overruns()
            ),
        ];
        if let Some(last) = self.decoder.rtc().writes().last() {
            lines.push(format!("last rtc write {last}"));
        }

        let recorder = &self.decoder.diagnostics().1;
        let skip = recorder.len().saturating_sub(STATUS_HISTORY);
        for record in recorder.oldest_first().skip(skip) {
            lines.push(format!("  #{:<5} {}", record.id, record.event));
        }
        lines
    }
}

fn describe_step(report: &StepReport<Infallible>, lines: &mut Vec<String>) {
    match report.outcome {
        PulseOutcome::Marker(MarkerOutcome::Started) => lines.push("  frame started".to_string()),
        PulseOutcome::Marker(MarkerOutcome::Restarted) => {
            lines.push("  WARN marker restarted an unfinished frame".to_string());
        }
        PulseOutcome::Bit(BitOutcome::TimeDecoded) => lines.push("  time decoded".to_string()),
        PulseOutcome::Bit(BitOutcome::FrameComplete) => {
            lines.push("  frame complete".to_string());
        }
        PulseOutcome::Failed(err) => lines.push(format!("  ERR read failed: {err}")),
        PulseOutcome::Bit(BitOutcome::Waiting | BitOutcome::Advanced) | PulseOutcome::Gap => {}
    }

    match &report.commit {
        Some(Ok(plan)) if plan.date == DateSource::Unknown => {
            let time = plan.timestamp.time();
            lines.push(format!(
                "  clock <- {:02}:{:02}:{:02} (date unknown, RTC not written)",
                time.hour, time.minute, time.second
            ));
        }
        Some(Ok(plan)) => {
            lines.push(format!("  RTC <- {} (date {})", plan.timestamp, plan.date));
        }
        Some(Err(CommitError::RtcWrite(never))) => match *never {},
        None => {}
    }
}

fn level_tag(level: PulseLevel) -> &'static str {
    match level {
        PulseLevel::High => "high",
        PulseLevel::Low => "low",
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => {
            let mut lines = vec!["Available commands:".to_string()];
            lines.extend(HELP_TOPICS.iter().map(|(_, detail)| format!("  {detail}")));
            lines.push("  exit | quit                          - end the session".to_string());
            lines
        }
        Some(target) => match HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(target))
        {
            Some((_, detail)) => vec![format!("  {detail}")],
            None => vec![
                format!("No help available for `{target}`."),
                format!("Available topics: {}", help_topic_list()),
            ],
        },
    }
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plain-text copy of the session; commands are prefixed with `> `.
struct Transcript(BufWriter<File>);

impl Transcript {
    fn create(path: &Path) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "# dcf77-emulator transcript")?;
        Ok(Self(writer))
    }

    fn record(&mut self, command: &str, lines: &[String]) -> io::Result<()> {
        writeln!(self.0, "> {command}")?;
        for line in lines {
            writeln!(self.0, "{line}")?;
        }
        self.0.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(None).expect("session without transcript")
    }

    fn run(session: &mut Session, line: &str) -> Vec<String> {
        session.handle_command(line).expect("command output")
    }

    #[test]
    fn two_frames_commit_time_then_date() {
        let mut session = session();
        let lines = run(&mut session, "send 2026-10-19 14:05 2");

        let commits: Vec<&String> = lines.iter().filter(|l| l.contains(" <- ")).collect();
        assert_eq!(commits.len(), 2);
        assert_eq!(
            commits[0].trim(),
            "clock <- 14:04:36 (date unknown, RTC not written)"
        );
        assert_eq!(commits[1].trim(), "RTC <- 14:05:36 19.10.26 (date decoded)");
        assert_eq!(lines.last().map(String::as_str), Some("OK sent 2 frame(s)"));
        assert_eq!(session.decoder.rtc().writes().len(), 1);
        assert!(session.decoder.rtc().writes().iter().all(|w| w.day != 0));
    }

    #[test]
    fn flipped_parity_bit_fails_that_frame_only() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "flip 28"),
            vec!["OK bit 28 of the next frame will be flipped".to_string()]
        );
        let lines = run(&mut session, "send 2026-10-19 14:05 2");

        assert!(lines[0].ends_with("(bit 28 flipped)"));
        assert!(lines.iter().any(|l| l.contains("ERR read failed")));
        let commits = lines.iter().filter(|l| l.contains(" <- ")).count();
        assert_eq!(commits, 1);
        // the only commit came before any date was decoded
        assert!(session.decoder.rtc().writes().is_empty());
    }

    #[test]
    fn send_stops_at_the_end_of_the_century() {
        let mut session = session();
        let lines = run(&mut session, "send 2099-12-31 23:59 3");
        assert!(lines.iter().any(|l| l == "WARN no frames after 2099-12-31 23:59"));
        assert_eq!(lines.last().map(String::as_str), Some("OK sent 1 frame(s)"));
    }

    #[test]
    fn transcript_echoes_commands_and_replies() {
        let path = std::env::temp_dir().join(format!(
            "dcf77-emulator-transcript-{}.txt",
            std::process::id()
        ));
        let mut session = Session::new(Some(path.as_path())).expect("transcript file");
        run(&mut session, "flip 28");
        drop(session);

        let text = std::fs::read_to_string(&path).expect("transcript contents");
        std::fs::remove_file(&path).ok();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "# dcf77-emulator transcript",
                "> flip 28",
                "OK bit 28 of the next frame will be flipped",
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_arguments() {
        let mut session = session();
        assert!(run(&mut session, "flip 59")[0].starts_with("ERR bit"));
        assert!(run(&mut session, "send 2026-02-30 10:00")[0].starts_with("ERR invalid date"));
        assert!(run(&mut session, "send 2026-02-03 10:00 0")[0].starts_with("ERR minutes"));
        assert!(run(&mut session, "bogus")[0].starts_with("ERR syntax"));
    }

    #[test]
    fn raw_pulses_reach_the_decoder() {
        let mut session = session();
        let lines = run(&mut session, "pulse low 1850");
        assert_eq!(lines, vec!["pulse low 1850ms", "  frame started"]);

        let lines = run(&mut session, "pulse high 500");
        assert!(lines[1].contains("ERR read failed"));

        let status = run(&mut session, "status");
        assert!(status.iter().any(|l| l.starts_with("pulses 2 frames 1")));
    }

    #[test]
    fn screen_reflects_committed_signal() {
        let mut session = session();
        run(&mut session, "send 2026-10-19 14:05");
        let screen = run(&mut session, "screen");
        assert_eq!(screen.len(), 8);
        assert_eq!(screen[0], "     DCF77 Info");
        assert!(screen[4].starts_with(" Last:   ") && screen[4].ends_with("s ago"));
    }

    #[test]
    fn help_lists_topics() {
        let lines = help_lines(Some("teleport"));
        assert_eq!(lines[0], "No help available for `teleport`.");
        assert!(lines[1].contains("send, flip, pulse"));
        assert_eq!(help_lines(Some("FLIP")).len(), 1);
    }
}
