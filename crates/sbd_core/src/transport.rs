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

    transport.rs

    Byte Transport (component A). Opens an unordered pair of operations:
    attach an inbound consumer, write outbound bytes. The concrete serial
    port driver is an injected collaborator; this module defines the seam
    and two implementations: a real one backed by `serialport`, and an
    in-memory pair used by tests and embedders that already own a duplex
    byte stream (a pty, a TCP socket standing in for a null-modem cable).
*/

use std::{
    io::{self, Read, Write},
    sync::{Arc, Mutex},
    thread,
};

use crossbeam_channel::Sender;

use crate::error::EmulatorError;

/// Delivers inbound bytes and accepts outbound bytes on a serial-like duplex
/// channel. No retries, no reconnect: transport errors are surfaced to
/// observers as ERROR logs by the caller, not recovered here.
pub trait ByteTransport: Send {
    /// Spawn whatever background reader is required and begin delivering
    /// raw inbound chunks to `sink`. Called once, at emulator construction.
    fn attach_inbound(&mut self, sink: Sender<Vec<u8>>) -> Result<(), EmulatorError>;

    /// A handle for writing outbound bytes. May be called from multiple
    /// threads; implementations must serialize writes internally.
    fn writer(&self) -> Box<dyn Write + Send>;
}

/// Real transport backed by an OS serial port (or any device `serialport`
/// can open: USB-serial adapters, a socat-created pty pair standing in for
/// the physical module's UART).
#[cfg(feature = "serial")]
pub struct SerialTransport {
    port: Arc<Mutex<Box<dyn serialport::SerialPort>>>,
}

#[cfg(feature = "serial")]
impl SerialTransport {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, EmulatorError> {
        let port = serialport::new(path, baud_rate)
            .timeout(std::time::Duration::from_millis(50))
            .open()
            .map_err(|e| EmulatorError::TransportOpen(e.to_string()))?;
        log::info!("opened serial transport on {path} at {baud_rate} baud");
        Ok(SerialTransport {
            port: Arc::new(Mutex::new(port)),
        })
    }
}

#[cfg(feature = "serial")]
impl ByteTransport for SerialTransport {
    fn attach_inbound(&mut self, sink: Sender<Vec<u8>>) -> Result<(), EmulatorError> {
        let port = Arc::clone(&self.port);
        thread::Builder::new()
            .name("sbd-transport-reader".into())
            .spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    let read = {
                        let mut guard = port.lock().unwrap();
                        guard.read(&mut buf)
                    };
                    match read {
                        Ok(0) => continue,
                        Ok(n) => {
                            if sink.send(buf[..n].to_vec()).is_err() {
                                break;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                            continue;
                        }
                        Err(e) => {
                            log::error!("serial transport read error: {e}");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| EmulatorError::TransportOpen(e.to_string()))?;
        Ok(())
    }

    fn writer(&self) -> Box<dyn Write + Send> {
        Box::new(SerialWriter { port: Arc::clone(&self.port) })
    }
}

#[cfg(feature = "serial")]
struct SerialWriter {
    port: Arc<Mutex<Box<dyn serialport::SerialPort>>>,
}

#[cfg(feature = "serial")]
impl Write for SerialWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.lock().unwrap().flush()
    }
}

/// An in-memory duplex pair. `inbound` is drained and forwarded to whatever
/// sink the engine attaches; `outbound` collects everything the engine
/// writes, in order, for a test harness (or embedder) to inspect.
pub struct LoopbackTransport {
    inbound: Option<crossbeam_channel::Receiver<Vec<u8>>>,
    outbound: Arc<Mutex<Vec<u8>>>,
}

impl LoopbackTransport {
    pub fn new(inbound: crossbeam_channel::Receiver<Vec<u8>>) -> Self {
        LoopbackTransport {
            inbound: Some(inbound),
            outbound: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every byte written by the engine so far.
    pub fn written(&self) -> Vec<u8> {
        self.outbound.lock().unwrap().clone()
    }

    /// Discards everything written so far, so a test can assert on just
    /// the output of the next command.
    pub fn clear(&self) {
        self.outbound.lock().unwrap().clear();
    }

    /// A cloned handle onto the outbound buffer, so a caller can keep
    /// inspecting output after handing the transport itself by value to
    /// an `Emulator`.
    pub fn outbound_handle(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.outbound)
    }
}

impl ByteTransport for LoopbackTransport {
    fn attach_inbound(&mut self, sink: Sender<Vec<u8>>) -> Result<(), EmulatorError> {
        let source = self
            .inbound
            .take()
            .expect("attach_inbound called more than once on LoopbackTransport");
        thread::Builder::new()
            .name("sbd-loopback-reader".into())
            .spawn(move || {
                for chunk in source.iter() {
                    if sink.send(chunk).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| EmulatorError::TransportOpen(e.to_string()))?;
        log::info!("opened in-memory loopback transport");
        Ok(())
    }

    fn writer(&self) -> Box<dyn Write + Send> {
        Box::new(LoopbackWriter { buf: Arc::clone(&self.outbound) })
    }
}

struct LoopbackWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for LoopbackWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
