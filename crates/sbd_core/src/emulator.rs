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

    emulator.rs

    Top-level wiring. `Emulator::new` opens the transport, constructs or
    loads the signer, starts the frame-reader loop and the signal ticker as
    named threads, and hands back a handle whose `Drop` tears both down.
    Everything downstream runs on real OS threads coordinating through the
    engine's single state mutex and the shared writer, per the concurrency
    model's allowance for "a single mutex held for the duration of each
    command handler" on multi-threaded runtimes.
*/

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver};
use rand::Rng;

use sbd_common::{LogLevel, SignalQualityRating};

use crate::engine::{CommandEngine, Timing};
use crate::error::EmulatorError;
use crate::framing::{Frame, FramingDemux, BINARY_IDLE};
use crate::signal_model::{next_tick_delay, TICK_MAX};
use crate::signer::Signer;
use crate::transport::ByteTransport;
use crate::EventBus;

/// Construction-time options; mirrors the external interface's constructor
/// options (`portPath` is supplied indirectly via the transport the caller
/// already opened).
pub struct EmulatorOptions {
    pub signal_quality_rating: SignalQualityRating,
    pub jwt_signer_key: Option<PathBuf>,
    pub jwt_signer_key_passphrase: Option<String>,
    pub timing: Timing,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        EmulatorOptions {
            signal_quality_rating: SignalQualityRating::default(),
            jwt_signer_key: None,
            jwt_signer_key_passphrase: None,
            timing: Timing::default(),
        }
    }
}

/// A running emulator instance. Owns the engine, the reader/ticker
/// threads, and the event bus observers are subscribed to. Dropping it
/// signals both threads to stop and joins them.
pub struct Emulator {
    engine: Arc<CommandEngine>,
    events: Arc<EventBus>,
    shutdown: Arc<AtomicBool>,
    reader_handle: Option<std::thread::JoinHandle<()>>,
    ticker_handle: Option<std::thread::JoinHandle<()>>,
}

impl Emulator {
    pub fn new(mut transport: Box<dyn ByteTransport>, options: EmulatorOptions) -> Result<Self, EmulatorError> {
        let events = Arc::new(EventBus::new());

        let signer = match &options.jwt_signer_key {
            Some(path) => Signer::from_path(path, options.jwt_signer_key_passphrase.as_deref())?,
            None => {
                let mut rng = rand::thread_rng();
                let (signer, details) = Signer::generate(&mut rng)?;
                events.emit_signer_key_generated(details);
                signer
            }
        };

        let writer: Arc<Mutex<Box<dyn std::io::Write + Send>>> = Arc::new(Mutex::new(transport.writer()));
        let demux = Arc::new(Mutex::new(FramingDemux::new()));

        let (inbound_tx, inbound_rx) = bounded(64);
        transport.attach_inbound(inbound_tx)?;

        let engine = Arc::new(CommandEngine::new(
            options.signal_quality_rating,
            signer,
            Arc::clone(&events),
            writer,
            Arc::clone(&demux),
            options.timing,
        ));

        events.log_event(LogLevel::Info, "emulator constructed");

        let shutdown = Arc::new(AtomicBool::new(false));

        let reader_handle = spawn_reader(Arc::clone(&engine), Arc::clone(&demux), inbound_rx, Arc::clone(&shutdown));

        // Spec requires the signal ticker's "initial call" to run at construction,
        // not after the first 15-60s sleep, so `currentSignal` reflects the
        // configured rating immediately instead of sitting on its placeholder
        // initial value.
        run_signal_tick(&engine, &events, &mut rand::thread_rng());

        let ticker_handle = spawn_ticker(Arc::clone(&engine), Arc::clone(&events), Arc::clone(&shutdown));

        Ok(Emulator {
            engine,
            events,
            shutdown,
            reader_handle: Some(reader_handle),
            ticker_handle: Some(ticker_handle),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Direct access to engine state, mainly useful for embedders and
    /// tests that need to assert on or seed buffer/flag state without
    /// going through the AT command surface.
    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.ticker_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Drains inbound byte chunks, demultiplexes them into lines or binary
/// chunks, and dispatches each to the engine. Also polls the binary-upload
/// deadline so a stalled SBDWB times out even with no further input.
fn spawn_reader(
    engine: Arc<CommandEngine>,
    demux: Arc<Mutex<FramingDemux>>,
    inbound_rx: Receiver<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("sbd-engine-reader".into())
        .spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                let wait = demux
                    .lock()
                    .unwrap()
                    .idle_deadline(BINARY_IDLE)
                    .unwrap_or(Duration::from_millis(50));
                select! {
                    recv(inbound_rx) -> msg => {
                        match msg {
                            Ok(bytes) => {
                                let frames = demux.lock().unwrap().feed(&bytes);
                                for frame in frames {
                                    match frame {
                                        Frame::Line(line) => engine.handle_line(&line),
                                        Frame::Chunk(chunk) => engine.handle_chunk(chunk),
                                    }
                                }
                            }
                            Err(_) => break,
                        }
                    }
                    default(wait) => {}
                }

                if let Some(chunk) = demux.lock().unwrap().take_if_idle(BINARY_IDLE) {
                    if let Frame::Chunk(bytes) = chunk {
                        engine.handle_chunk(bytes);
                    }
                }
                if let Some(remaining) = engine.binary_timeout_remaining() {
                    if remaining == Duration::ZERO {
                        engine.handle_binary_timeout();
                    }
                }
            }
        })
        .expect("failed to spawn reader thread")
}

/// Self-rescheduling signal-quality ticker (component C's driving loop).
/// Sleeps a random interval, samples a new bar value, and if subscribed,
/// writes the corresponding `+CIEV` lines directly to the shared output —
/// interleaved with whatever the engine is doing, by design.
fn spawn_ticker(engine: Arc<CommandEngine>, events: Arc<EventBus>, shutdown: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name("sbd-signal-ticker".into())
        .spawn(move || {
            let mut rng = rand::thread_rng();
            while !shutdown.load(Ordering::SeqCst) {
                let delay = next_tick_delay(&mut rng);
                sleep_in_slices(delay.min(TICK_MAX), &shutdown);
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }

                run_signal_tick(&engine, &events, &mut rng);
            }
        })
        .expect("failed to spawn ticker thread")
}

/// Samples one new signal bar value and, if it changed, emits the
/// corresponding `+CIEV` lines. Shared by the construction-time initial
/// call and every subsequent tick of the ticker thread's loop.
fn run_signal_tick(engine: &CommandEngine, events: &EventBus, rng: &mut impl Rng) {
    let radio_enabled = engine.with_state(|s| s.radio_activity_enabled);
    let updated = engine.with_state(|s| s.signal.tick(rng, radio_enabled));
    if let Some(next) = updated {
        let (sig_ind, svc_ind) = engine.with_state(|s| (s.signal_quality_indicator, s.service_availability_indicator));
        events.log_event(LogLevel::Debug, format!("signal tick -> {next}"));
        if sig_ind {
            engine.emit_line(&format!("+CIEV:0,{next}"));
        }
        if svc_ind {
            engine.emit_line(&format!("+CIEV:1,{}", (next >= 1) as u8));
        }
    }
}

/// Sleeps `total`, but in short slices so shutdown is noticed promptly
/// instead of after up to a minute.
fn sleep_in_slices(total: Duration, shutdown: &AtomicBool) {
    const SLICE: Duration = Duration::from_millis(100);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
}
