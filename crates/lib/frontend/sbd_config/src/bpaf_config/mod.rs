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
*/

use std::path::PathBuf;

use bpaf::{Bpaf, Parser};
use sbd_common::SignalQualityRating;

fn signal_quality_rating() -> impl bpaf::Parser<Option<SignalQualityRating>> {
    bpaf::long("signal-quality")
        .help("Signal quality rating: none, poor, ok, good, excellent, or random")
        .argument::<String>("RATING")
        .parse(|s| s.parse::<SignalQualityRating>())
        .optional()
}

#[cfg_attr(feature = "use_bpaf", derive(Bpaf))]
#[cfg_attr(feature = "use_bpaf", bpaf(options, version, generate(cli_args)))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    /// Path to the TOML configuration file. Overrides whatever default path
    /// the caller of `read_config_file` passed in.
    #[bpaf(long("config_file"), long("configfile"), argument("PATH"))]
    pub config_file: Option<PathBuf>,

    /// Serial device path to open, e.g. /dev/ttyUSB0 or COM3.
    #[bpaf(long)]
    pub port_path: Option<String>,

    /// Serial baud rate. Defaults to 19200 when unset anywhere.
    #[bpaf(long)]
    pub baud_rate: Option<u32>,

    #[bpaf(external(signal_quality_rating))]
    pub signal_quality_rating: Option<SignalQualityRating>,

    /// Path to a PEM-encoded RSA private key used to sign SBD messages. When
    /// unset, a key is generated at startup and logged once.
    #[bpaf(long)]
    pub jwt_signer_key: Option<PathBuf>,

    /// Passphrase for an encrypted signer key.
    #[bpaf(long)]
    pub jwt_signer_key_passphrase: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_all_none() {
        let args = CmdLineArgs::default();
        assert!(args.config_file.is_none());
        assert!(args.port_path.is_none());
        assert!(args.baud_rate.is_none());
        assert!(args.signal_quality_rating.is_none());
        assert!(args.jwt_signer_key.is_none());
        assert!(args.jwt_signer_key_passphrase.is_none());
    }
}
