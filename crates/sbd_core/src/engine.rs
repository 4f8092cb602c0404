/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    engine.rs

    Command Engine (component E). Owns all mutable emulator state behind a
    single mutex, parses and dispatches the AT command matrix, drives the
    binary-upload mode transitions, and writes replies. Holds the state
    lock only across the brief mutation inside a single command handler,
    never across a sleep, so the signal ticker on another thread can still
    interleave writes during an echo or long session wait.
*/

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use sbd_common::SignalQualityRating;

use crate::buffers::SbdBuffers;
use crate::framing::{FramingDemux, FramingMode};
use crate::signal_model::SignalModel;
use crate::signer::Signer;
use crate::EventBus;

const MODEL: &str = "9602";
const SERIAL_NUMBER: &str = "300234010123450";
const HARDWARE_SPEC: &str = "9602-1";
const SOFTWARE_REVISION: &str = "TA13004";

const GMR_LINES: [&str; 8] = [
    "Call Processor Version: TA13004",
    "DSP Version: TA13004",
    "DBB/RF Version: TA13004",
    "Board Version: 9602-1",
    "Boot Version: 1.0",
    "RTC Version: 1.0",
    "Product Type: ROCKBLOCK",
    "FCC ID: Q639602",
];

const AMPV_LINES: [&str; 10] = [
    "E1 Q0 V1 &K3 &Y0", "&W0", "S0:000 S2:043", "&Y0", "STORE PROFILE 0",
    "ACTIVE PROFILE", "E1 Q0 V1 &K3 &Y0", "&W0", "S0:000 S2:043", "OK",
];

/// Timing windows for jitter and long waits. Production code uses
/// [`Timing::default`]; tests use [`Timing::accelerated`] so the suite
/// doesn't actually block for up to 30 seconds per SBDIX.
#[derive(Debug, Clone)]
pub struct Timing {
    pub t_short_min: Duration,
    pub t_short_max: Duration,
    pub t_long_min: Duration,
    pub t_long_max: Duration,
    pub csq_wait: Duration,
    pub sbdwb_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            t_short_min: Duration::from_millis(10),
            t_short_max: Duration::from_millis(50),
            t_long_min: Duration::from_secs(15),
            t_long_max: Duration::from_secs(30),
            csq_wait: Duration::from_secs(2),
            sbdwb_timeout: Duration::from_secs(60),
        }
    }
}

impl Timing {
    /// Same shape, scaled down to microseconds, for fast tests.
    pub fn accelerated() -> Self {
        Timing {
            t_short_min: Duration::from_micros(1),
            t_short_max: Duration::from_micros(5),
            t_long_min: Duration::from_micros(1),
            t_long_max: Duration::from_micros(5),
            csq_wait: Duration::from_micros(1),
            sbdwb_timeout: Duration::from_millis(50),
        }
    }

    fn sample_short(&self, rng: &mut impl Rng) -> Duration {
        rng.gen_range(self.t_short_min..=self.t_short_max)
    }

    pub(crate) fn sample_long(&self, rng: &mut impl Rng) -> Duration {
        rng.gen_range(self.t_long_min..=self.t_long_max)
    }
}

#[derive(Debug)]
pub(crate) struct BinaryUpload {
    pub declared_len: usize,
    pub expected_total: usize,
    pub accum: Vec<u8>,
    pub deadline: Instant,
}

#[derive(Debug)]
pub struct CoreState {
    pub echo_enabled: bool,
    pub ring_alerts_enabled: bool,
    pub quiet_mode: bool,
    pub radio_activity_enabled: bool,
    pub ready_for_shutdown: bool,
    pub ring_alert_active: bool,
    pub signal_quality_indicator: bool,
    pub service_availability_indicator: bool,
    pub signal_rating: SignalQualityRating,
    pub signal: SignalModel,
    pub buffers: SbdBuffers,
    pub(crate) binary: Option<BinaryUpload>,
}

impl CoreState {
    fn new(rating: SignalQualityRating) -> Self {
        CoreState {
            echo_enabled: true,
            ring_alerts_enabled: false,
            quiet_mode: false,
            radio_activity_enabled: true,
            ready_for_shutdown: false,
            ring_alert_active: false,
            signal_quality_indicator: false,
            service_availability_indicator: false,
            signal_rating: rating,
            signal: SignalModel::new(rating),
            buffers: SbdBuffers::default(),
            binary: None,
        }
    }
}

/// What dispatching a parsed command produced. Most commands resolve to a
/// small set of immediate reply lines; a few require a mode switch or a
/// long-running session the caller must run outside the state lock.
pub(crate) enum CommandOutcome {
    Lines(Vec<String>),
    EnterBinaryMode { declared_len: usize },
    BeginSession,
    Shutdown,
    NoReply,
}

pub struct CommandEngine {
    state: Mutex<CoreState>,
    signer: Signer,
    events: Arc<EventBus>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    demux: Arc<Mutex<FramingDemux>>,
    timing: Timing,
}

impl CommandEngine {
    pub fn new(
        rating: SignalQualityRating,
        signer: Signer,
        events: Arc<EventBus>,
        writer: Arc<Mutex<Box<dyn Write + Send>>>,
        demux: Arc<Mutex<FramingDemux>>,
        timing: Timing,
    ) -> Self {
        CommandEngine {
            state: Mutex::new(CoreState::new(rating)),
            signer,
            events,
            writer,
            demux,
            timing,
        }
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn signer(&self) -> &Signer {
        &self.signer
    }

    pub(crate) fn timing(&self) -> &Timing {
        &self.timing
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut CoreState) -> R) -> R {
        let mut guard = self.state.lock().unwrap();
        f(&mut guard)
    }

    /// A snapshot of the 340-byte MO buffer, mainly for embedders and
    /// tests that want to assert on state without going through the AT
    /// command surface.
    pub fn mo_buffer_snapshot(&self) -> [u8; crate::buffers::MO_BUFFER_LEN] {
        self.with_state(|s| *s.buffers.mo.as_slice())
    }

    /// The current `(signalQualityIndicator, serviceAvailabilityIndicator)`
    /// subscription flags set by the last accepted `AT+CIER=`.
    pub fn indicator_flags(&self) -> (bool, bool) {
        self.with_state(|s| (s.signal_quality_indicator, s.service_availability_indicator))
    }

    /// Writes one line terminated by CRLF, suppressed entirely under
    /// quiet mode. Never called while the state lock is held.
    pub(crate) fn emit_line(&self, text: &str) {
        let quiet = self.with_state(|s| s.quiet_mode);
        if quiet {
            return;
        }
        let mut out = self.writer.lock().unwrap();
        let _ = out.write_all(text.as_bytes());
        let _ = out.write_all(b"\r\n");
    }

    fn emit_lines(&self, lines: &[String]) {
        for line in lines {
            self.emit_line(line);
        }
    }

    /// Entry point for a decoded text line arriving in command mode.
    pub fn handle_line(&self, raw: &str) {
        if self.with_state(|s| s.ready_for_shutdown) {
            return;
        }

        let echo_enabled = self.with_state(|s| s.echo_enabled);
        if echo_enabled {
            std::thread::sleep(self.timing.sample_short(&mut rand::thread_rng()));
            self.emit_line(raw);
            std::thread::sleep(self.timing.sample_short(&mut rand::thread_rng()));
        }

        let (key, detail) = split_command(raw);
        let outcome = self.dispatch(&key, &detail);
        match outcome {
            CommandOutcome::Lines(lines) => self.emit_lines(&lines),
            CommandOutcome::EnterBinaryMode { declared_len } => {
                self.emit_line("READY");
                let deadline = Instant::now() + self.timing.sbdwb_timeout;
                self.with_state(|s| {
                    s.binary = Some(BinaryUpload {
                        declared_len,
                        expected_total: declared_len + 2,
                        accum: Vec::with_capacity(declared_len + 2),
                        deadline,
                    });
                });
                self.demux.lock().unwrap().set_mode(FramingMode::Binary);
            }
            CommandOutcome::BeginSession => crate::session::run_sbdix(self),
            CommandOutcome::Shutdown => {}
            CommandOutcome::NoReply => {}
        }
    }

    /// Entry point for a raw chunk arriving from the framing demultiplexer.
    /// Only meaningful while a binary upload is in flight; anything else
    /// is a framing error.
    pub fn handle_chunk(&self, chunk: Vec<u8>) {
        let result = self.with_state(|s| {
            let upload = match s.binary.as_mut() {
                Some(u) => u,
                None => return BinaryOutcome::NotExpected,
            };
            upload.accum.extend_from_slice(&chunk);
            if upload.accum.len() > upload.expected_total {
                return BinaryOutcome::TooLong;
            }
            if upload.accum.len() < upload.expected_total {
                return BinaryOutcome::Pending;
            }
            let declared_len = upload.declared_len;
            let payload = upload.accum[..declared_len].to_vec();
            let checksum = [upload.accum[declared_len], upload.accum[declared_len + 1]];
            BinaryOutcome::Complete { payload, checksum }
        });

        match result {
            BinaryOutcome::NotExpected => {
                self.events.log_event(sbd_common::LogLevel::Error, "unexpected binary data in command mode");
                self.emit_line("ERROR");
            }
            BinaryOutcome::Pending => {}
            BinaryOutcome::TooLong => {
                self.finish_binary_upload();
                self.emit_line("2");
            }
            BinaryOutcome::Complete { payload, checksum } => {
                let sum: u32 = payload.iter().map(|&b| b as u32).sum();
                let calculated = [((sum >> 8) & 0xff) as u8, (sum & 0xff) as u8];
                self.finish_binary_upload();
                if checksum == calculated {
                    self.with_state(|s| s.buffers.mo.overwrite(&payload));
                    self.emit_line("0");
                }
                else {
                    self.events.log_event(sbd_common::LogLevel::Warn, "SBDWB checksum mismatch");
                    self.emit_line("2");
                }
            }
        }
    }

    /// Called by the run loop when a binary upload's deadline has passed
    /// without completing.
    pub fn handle_binary_timeout(&self) {
        let had_upload = self.with_state(|s| s.binary.take().is_some());
        if had_upload {
            self.demux.lock().unwrap().set_mode(FramingMode::Text);
            self.events.log_event(sbd_common::LogLevel::Warn, "SBDWB timed out waiting for payload");
            self.emit_line("1");
        }
    }

    /// Remaining time until the current binary upload's deadline, for the
    /// run loop to size its wait.
    pub fn binary_timeout_remaining(&self) -> Option<Duration> {
        self.with_state(|s| s.binary.as_ref().map(|u| u.deadline.saturating_duration_since(Instant::now())))
    }

    fn finish_binary_upload(&self) {
        self.with_state(|s| s.binary = None);
        self.demux.lock().unwrap().set_mode(FramingMode::Text);
    }

    fn dispatch(&self, key: &str, detail: &str) -> CommandOutcome {
        let upper = key.to_ascii_uppercase();
        match upper.as_str() {
            "ATE0" => { self.with_state(|s| s.echo_enabled = false); ok() }
            "ATE1" => { self.with_state(|s| s.echo_enabled = true); ok() }
            "AT&K0" | "AT&K3" => ok(),
            "ATI0" => lines(&[MODEL, "OK"]),
            "ATI1" => lines(&["", "OK"]),
            "ATI2" => lines(&["", "OK"]),
            "ATI3" => lines(&[SERIAL_NUMBER, "OK"]),
            "ATI4" => lines(&[HARDWARE_SPEC, "OK"]),
            "ATI5" => lines(&["", "OK"]),
            "ATI6" => lines(&["", "OK"]),
            "ATI7" => lines(&[SOFTWARE_REVISION, "OK"]),
            "ATQ0" => { self.with_state(|s| s.quiet_mode = false); ok() }
            "ATQ1" => { self.with_state(|s| s.quiet_mode = true); ok() }
            "ATV0" => err(),
            "ATV1" | "ATZ0" | "ATZ1" | "AT&F0" | "AT&W0" | "AT&W1" | "AT&Y0" | "AT&Y1" => ok(),
            "AT&V" => {
                let mut out: Vec<String> = AMPV_LINES.iter().map(|s| s.to_string()).collect();
                out.push("OK".to_string());
                CommandOutcome::Lines(out)
            }
            "AT%R" => {
                self.emit_line("REGISTER DUMP");
                for n in 0..64u32 {
                    std::thread::sleep(self.timing.sample_short(&mut rand::thread_rng()));
                    self.emit_line(&format!("R{n:02}: 0000 0000"));
                }
                ok()
            }
            "AT*F" => {
                self.with_state(|s| {
                    s.ready_for_shutdown = true;
                    s.quiet_mode = true;
                });
                CommandOutcome::Shutdown
            }
            "AT*R0" => {
                self.with_state(|s| {
                    s.radio_activity_enabled = false;
                    s.signal.force_zero();
                });
                ok()
            }
            "AT*R1" => { self.with_state(|s| s.radio_activity_enabled = true); ok() }
            "AT+CCLK" => err(),
            "AT+GMI" | "AT+CGMI" => lines(&["Iridium", "OK"]),
            "AT+GMM" | "AT+CGMM" => lines(&[MODEL, "OK"]),
            "AT+GMR" | "AT+CGMR" => {
                let mut out: Vec<String> = GMR_LINES.iter().map(|s| s.to_string()).collect();
                out.push("OK".to_string());
                CommandOutcome::Lines(out)
            }
            "AT+GSN" | "AT+CGSN" => lines(&[SERIAL_NUMBER, "OK"]),
            "AT+CIER=" => self.dispatch_cier(detail),
            "AT+CRIS" => {
                let active = self.with_state(|s| s.ring_alert_active);
                lines(&[&format!("+CRIS:{}", active as u8), "OK"])
            }
            "AT+CSQ" => {
                std::thread::sleep(self.timing.csq_wait);
                let rating = self.with_state(|s| s.signal_rating);
                lines(&[&format!("+CSQ:{}", rating_numeric(rating)), "OK"])
            }
            "AT+CSQF" => {
                let rating = self.with_state(|s| s.signal_rating);
                lines(&[&format!("+CSQF:{}", rating_numeric(rating)), "OK"])
            }
            "AT+CULK" => ok(),
            "AT+CULK?" => lines(&["0", "OK"]),
            "AT+IPR" => ok(),
            "AT+SBDWT=" => CommandOutcome::NoReply,
            "AT+SBDRT" => {
                let text = self.with_state(|s| s.buffers.mt.as_str().to_string());
                lines(&[&format!("+SBDRT:{text}"), "OK"])
            }
            "AT+SBDWB=" => self.dispatch_sbdwb(detail),
            "AT+SBDIX" | "AT+SBDIXA" => self.dispatch_sbdix(),
            "AT+SBDDET" => lines(&["+SBDDET:0,0", "OK"]),
            "AT+SBDMTA=" => match detail.trim() {
                "0" => { self.with_state(|s| s.ring_alerts_enabled = false); ok() }
                "1" => { self.with_state(|s| s.ring_alerts_enabled = true); ok() }
                _ => err(),
            },
            "AT+SBDAREG=" => match detail.trim() {
                "0" | "1" | "2" => ok(),
                _ => err(),
            },
            "AT+SBDD0" => { self.with_state(|s| s.buffers.clear_mo()); ok() }
            "AT+SBDD1" => { self.with_state(|s| s.buffers.clear_mt()); ok() }
            "AT+SBDD2" => { self.with_state(|s| s.buffers.clear_both()); ok() }
            _ => {
                self.events.log_event(sbd_common::LogLevel::Error, format!("unknown command: {key}"));
                err()
            }
        }
    }

    fn dispatch_cier(&self, detail: &str) -> CommandOutcome {
        let parts: Vec<&str> = detail.split(',').map(|p| p.trim()).collect();
        if parts.len() != 4 {
            return err();
        }
        let flags: (bool, bool) = match (parts[0], parts[1], parts[2], parts[3]) {
            ("0", "0", "0", "0") | ("0", "1", "0", "0") | ("0", "0", "1", "0") | ("1", "0", "0", "0") => (false, false),
            ("1", "1", "0", "0") => (true, false),
            ("1", "0", "1", "0") => (false, true),
            ("1", "1", "1", "0") => (true, true),
            _ => return err(),
        };

        let (current, sig_ind, svc_ind) = self.with_state(|s| {
            s.signal_quality_indicator = flags.0;
            s.service_availability_indicator = flags.1;
            (s.signal.current(), flags.0, flags.1)
        });

        let mut out = vec!["OK".to_string()];
        if sig_ind {
            out.push(format!("+CIEV:0,{current}"));
        }
        if svc_ind {
            out.push(format!("+CIEV:1,{}", (current >= 1) as u8));
        }
        CommandOutcome::Lines(out)
    }

    fn dispatch_sbdwb(&self, detail: &str) -> CommandOutcome {
        let len: usize = match detail.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                self.events.log_event(sbd_common::LogLevel::Warn, "SBDWB with unparsable length");
                return lines(&["3"]);
            }
        };
        if len == 0 || len > crate::buffers::MO_BUFFER_LEN {
            self.events.log_event(sbd_common::LogLevel::Warn, format!("SBDWB length {len} out of range"));
            return lines(&["3"]);
        }
        CommandOutcome::EnterBinaryMode { declared_len: len }
    }

    fn dispatch_sbdix(&self) -> CommandOutcome {
        let radio_enabled = self.with_state(|s| s.radio_activity_enabled);
        if !radio_enabled {
            let (mo_seq, mt_seq) = self.with_state(|s| (s.buffers.mo_seq, s.buffers.mt_seq));
            return lines(&[&format!("+SBDIX: 34, {mo_seq}, 2, {mt_seq}, 0, 0"), "OK"]);
        }
        CommandOutcome::BeginSession
    }
}

enum BinaryOutcome {
    NotExpected,
    Pending,
    TooLong,
    Complete { payload: Vec<u8>, checksum: [u8; 2] },
}

fn ok() -> CommandOutcome {
    CommandOutcome::Lines(vec!["OK".to_string()])
}

fn err() -> CommandOutcome {
    CommandOutcome::Lines(vec!["ERROR".to_string()])
}

fn lines(items: &[&str]) -> CommandOutcome {
    CommandOutcome::Lines(items.iter().map(|s| s.to_string()).collect())
}

fn rating_numeric(rating: SignalQualityRating) -> u8 {
    match rating {
        SignalQualityRating::None => 0,
        SignalQualityRating::Poor => 1,
        SignalQualityRating::Ok => 2,
        SignalQualityRating::Good => 4,
        SignalQualityRating::Excellent => 5,
        SignalQualityRating::Random => 3,
    }
}

/// Splits a line at the first `=`. The key includes the `=` when present.
fn split_command(line: &str) -> (String, String) {
    match line.find('=') {
        Some(idx) => (line[..=idx].to_string(), line[idx + 1..].to_string()),
        None => (line.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ByteTransport, LoopbackTransport};
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    fn test_engine() -> (CommandEngine, LoopbackTransport) {
        let (_tx, rx) = unbounded();
        let transport = LoopbackTransport::new(rx);
        let writer: Arc<Mutex<Box<dyn Write + Send>>> = Arc::new(Mutex::new(transport.writer()));
        let events = Arc::new(EventBus::new());
        let mut rng = rand::thread_rng();
        let (signer, _details) = Signer::generate(&mut rng).unwrap();
        let demux = Arc::new(Mutex::new(FramingDemux::new()));
        let engine = CommandEngine::new(
            SignalQualityRating::Excellent,
            signer,
            events,
            writer,
            demux,
            Timing::accelerated(),
        );
        (engine, transport)
    }

    #[test]
    fn split_command_includes_equals_in_key() {
        assert_eq!(split_command("AT+SBDWB=5"), ("AT+SBDWB=".to_string(), "5".to_string()));
        assert_eq!(split_command("ATE0"), ("ATE0".to_string(), "".to_string()));
    }

    #[test]
    fn echo_then_ok_on_first_command_echo_disabled_after() {
        let (engine, transport) = test_engine();
        engine.handle_line("ATE0");
        engine.handle_line("AT&K0");
        let written = String::from_utf8(transport.written()).unwrap();
        assert_eq!(written, "ATE0\r\nOK\r\nOK\r\n");
    }

    #[test]
    fn unknown_command_is_error() {
        let (engine, transport) = test_engine();
        engine.handle_line("ATE0");
        transport.clear();
        engine.handle_line("AT+BOGUS");
        assert_eq!(String::from_utf8(transport.written()).unwrap(), "ERROR\r\n");
    }

    #[test]
    fn sbdwb_good_checksum_writes_payload() {
        let (engine, transport) = test_engine();
        engine.handle_line("ATE0");
        transport.clear();
        engine.handle_line("AT+SBDWB=5");
        let sum: u32 = b"Hello".iter().map(|&b| b as u32).sum();
        let mut chunk = b"Hello".to_vec();
        chunk.push(((sum >> 8) & 0xff) as u8);
        chunk.push((sum & 0xff) as u8);
        engine.handle_chunk(chunk);
        assert_eq!(String::from_utf8(transport.written()).unwrap(), "READY\r\n0\r\n");
        engine.with_state(|s| assert_eq!(&s.buffers.mo.as_slice()[..5], b"Hello"));
    }

    #[test]
    fn sbdwb_bad_checksum_writes_2_and_leaves_buffer_untouched() {
        let (engine, transport) = test_engine();
        engine.handle_line("ATE0");
        transport.clear();
        engine.handle_line("AT+SBDWB=5");
        let mut chunk = b"Hello".to_vec();
        chunk.extend_from_slice(&[0, 0]);
        engine.handle_chunk(chunk);
        assert_eq!(String::from_utf8(transport.written()).unwrap(), "READY\r\n2\r\n");
        engine.with_state(|s| assert!(s.buffers.mo.as_slice().iter().all(|&b| b == 0)));
    }

    #[test]
    fn cier_rejects_invalid_tuple() {
        let (engine, transport) = test_engine();
        engine.handle_line("ATE0");
        transport.clear();
        engine.handle_line("AT+CIER=1,1,1,1");
        assert_eq!(String::from_utf8(transport.written()).unwrap(), "ERROR\r\n");
    }
}
