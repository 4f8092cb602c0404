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

    End-to-end scenarios run through a full `Emulator` over a loopback
    transport: bytes go in one end, CRLF lines and SBDWB result codes come
    out the other, exactly as a DTE would see them. Uses `Timing::accelerated`
    throughout so the suite finishes in well under a second even though it
    exercises the SBDIX long-wait path.
*/

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;

use sbd_common::SignalQualityRating;
use sbd_core::emulator::{Emulator, EmulatorOptions};
use sbd_core::engine::Timing;
use sbd_core::transport::LoopbackTransport;

fn spawn(rating: SignalQualityRating) -> (crossbeam_channel::Sender<Vec<u8>>, Arc<Mutex<Vec<u8>>>, Emulator) {
    let (tx, rx) = unbounded();
    let transport = LoopbackTransport::new(rx);
    let outbound = transport.outbound_handle();
    let options = EmulatorOptions {
        signal_quality_rating: rating,
        jwt_signer_key: None,
        jwt_signer_key_passphrase: None,
        timing: Timing::accelerated(),
    };
    let emulator = Emulator::new(Box::new(transport), options).unwrap();
    (tx, outbound, emulator)
}

fn wait_for(outbound: &Arc<Mutex<Vec<u8>>>, needle: &str, timeout: Duration) -> String {
    let deadline = Instant::now() + timeout;
    loop {
        let text = String::from_utf8_lossy(&outbound.lock().unwrap()).into_owned();
        if text.contains(needle) || Instant::now() >= deadline {
            return text;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn echo_is_disabled_after_first_command() {
    let (tx, outbound, _emulator) = spawn(SignalQualityRating::Good);
    tx.send(b"ATE0\r\nAT&K0\r\n".to_vec()).unwrap();
    let text = wait_for(&outbound, "OK\r\nOK", Duration::from_secs(2));
    assert_eq!(text, "ATE0\r\nOK\r\nOK\r\n");
}

#[test]
fn sbdwb_good_checksum_reports_zero_and_fills_buffer() {
    let (tx, outbound, emulator) = spawn(SignalQualityRating::Good);
    tx.send(b"ATE0\r\n".to_vec()).unwrap();
    wait_for(&outbound, "OK", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+SBDWB=5\r\n".to_vec()).unwrap();
    wait_for(&outbound, "READY", Duration::from_secs(2));
    let payload = b"Hello";
    let sum: u32 = payload.iter().map(|&b| b as u32).sum();
    let mut chunk = payload.to_vec();
    chunk.push(((sum >> 8) & 0xff) as u8);
    chunk.push((sum & 0xff) as u8);
    tx.send(chunk).unwrap();

    let text = wait_for(&outbound, "0\r\n", Duration::from_secs(2));
    assert_eq!(text, "AT+SBDWB=5\r\nREADY\r\n0\r\n");
    assert_eq!(&emulator.engine().mo_buffer_snapshot()[..5], b"Hello");
}

#[test]
fn sbdwb_bad_checksum_reports_two_and_leaves_buffer_untouched() {
    let (tx, outbound, _emulator) = spawn(SignalQualityRating::Good);
    tx.send(b"ATE0\r\n".to_vec()).unwrap();
    wait_for(&outbound, "OK", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+SBDWB=5\r\n".to_vec()).unwrap();
    wait_for(&outbound, "READY", Duration::from_secs(2));
    let mut chunk = b"Hello".to_vec();
    chunk.extend_from_slice(&[0x00, 0x00]);
    tx.send(chunk).unwrap();

    let text = wait_for(&outbound, "2\r\n", Duration::from_secs(2));
    assert_eq!(text, "AT+SBDWB=5\r\nREADY\r\n2\r\n");
}

#[test]
fn excellent_signal_session_emits_signed_message() {
    let (tx, outbound, emulator) = spawn(SignalQualityRating::Excellent);

    let received = Arc::new(Mutex::new(None));
    let received_clone = Arc::clone(&received);
    emulator.events().subscribe_sbd_message(move |msg| {
        *received_clone.lock().unwrap() = Some(msg.clone());
    });

    tx.send(b"ATE0\r\n".to_vec()).unwrap();
    wait_for(&outbound, "OK", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+SBDWB=3\r\n".to_vec()).unwrap();
    wait_for(&outbound, "READY", Duration::from_secs(2));
    let payload = [0x01u8, 0x02, 0x03];
    let sum: u32 = payload.iter().map(|&b| b as u32).sum();
    let mut chunk = payload.to_vec();
    chunk.push(((sum >> 8) & 0xff) as u8);
    chunk.push((sum & 0xff) as u8);
    tx.send(chunk).unwrap();
    wait_for(&outbound, "0\r\n", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+SBDIX\r\n".to_vec()).unwrap();
    wait_for(&outbound, "+SBDIX: 0,", Duration::from_secs(5));

    let message = received.lock().unwrap().clone().expect("sbd-message event was not emitted");
    assert_eq!(message.data, "010203");
    assert_eq!(message.momsn, 1);
}

#[test]
fn no_signal_session_fails_without_emitting_a_message() {
    let (tx, outbound, emulator) = spawn(SignalQualityRating::None);

    let received = Arc::new(Mutex::new(false));
    let received_clone = Arc::clone(&received);
    emulator.events().subscribe_sbd_message(move |_| {
        *received_clone.lock().unwrap() = true;
    });

    tx.send(b"ATE0\r\n".to_vec()).unwrap();
    wait_for(&outbound, "OK", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+SBDIX\r\n".to_vec()).unwrap();
    let text = wait_for(&outbound, "+SBDIX: 32,", Duration::from_secs(5));
    assert_eq!(text, "+SBDIX: 32, 0, 2, 0, 0, 0\r\nOK\r\n");
    assert!(!*received.lock().unwrap());
}

#[test]
fn cier_subscription_reports_unsolicited_signal_indicator() {
    let (tx, outbound, emulator) = spawn(SignalQualityRating::Good);
    tx.send(b"ATE0\r\n".to_vec()).unwrap();
    wait_for(&outbound, "OK", Duration::from_secs(2));
    outbound.lock().unwrap().clear();

    tx.send(b"AT+CIER=1,1,0,0\r\n".to_vec()).unwrap();
    let text = wait_for(&outbound, "OK", Duration::from_secs(2));
    assert!(text.contains("OK"));

    let (sig_ind, svc_ind) = emulator.engine().indicator_flags();
    assert!(sig_ind);
    assert!(!svc_ind);
}
