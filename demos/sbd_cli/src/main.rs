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

    Thin example consumer: reads `sbd.toml` (or whatever `--config_file`
    points at), opens a real serial port, and runs the emulator until
    killed. Logs every signer-key-generated and sbd-message event so a
    developer can see what a connected RockBLOCK gateway would have
    received.
*/

use sbd_core::emulator::{Emulator, EmulatorOptions};
use sbd_core::engine::Timing;
use sbd_core::transport::SerialTransport;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let params = sbd_config::read_config_file("sbd.toml")?;

    let transport = SerialTransport::open(&params.transport.port_path, params.transport.baud_rate)?;

    let options = EmulatorOptions {
        signal_quality_rating: params.signal.quality_rating,
        jwt_signer_key: params.signer.key_path,
        jwt_signer_key_passphrase: params.signer.key_passphrase,
        timing: Timing::default(),
    };

    let emulator = Emulator::new(Box::new(transport), options)?;

    emulator.events().subscribe_signer_key_generated(|details| {
        log::info!(
            "generated signer key; passphrase for the encrypted private key is: {}",
            details.passphrase
        );
    });

    emulator.events().subscribe_sbd_message(|message| {
        log::info!("MO message momsn={} bytes={}", message.momsn, message.data.len() / 2);
    });

    log::info!("emulator running on {}, ctrl-c to stop", params.transport.port_path);
    loop {
        std::thread::park();
    }
}
