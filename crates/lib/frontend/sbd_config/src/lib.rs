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

//! Reads the emulator's TOML configuration file and overlays command-line
//! arguments on top of it. Command-line arguments always win over the
//! file.
//!
//! Features:
//! - `use_bpaf`: parse the overlay from `std::env::args`. Disabled for
//!   embedders that construct [`CmdLineArgs`] themselves.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;

use std::path::{Path, PathBuf};

#[cfg(feature = "use_bpaf")]
use bpaf_config::{cli_args, CmdLineArgs};

use cfg_if::cfg_if;
use sbd_common::SignalQualityRating;
use serde_derive::Deserialize;

#[cfg(not(feature = "use_bpaf"))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    pub config_file: Option<PathBuf>,
    pub port_path: Option<String>,
    pub baud_rate: Option<u32>,
    pub signal_quality_rating: Option<SignalQualityRating>,
    pub jwt_signer_key: Option<PathBuf>,
    pub jwt_signer_key_passphrase: Option<String>,
}

fn _default_baud_rate() -> u32 {
    19200
}

#[derive(Debug, Deserialize)]
pub struct Transport {
    pub port_path: String,
    #[serde(default = "_default_baud_rate")]
    pub baud_rate: u32,
}

#[derive(Debug, Deserialize)]
pub struct Signal {
    #[serde(default)]
    pub quality_rating: SignalQualityRating,
}

#[derive(Debug, Deserialize, Default)]
pub struct Signer {
    pub key_path: Option<PathBuf>,
    pub key_passphrase: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigFileParams {
    pub transport: Transport,
    #[serde(default)]
    pub signal: Signal,
    #[serde(default)]
    pub signer: Signer,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(port_path) = shell_args.port_path {
            self.transport.port_path = port_path;
        }
        if let Some(baud_rate) = shell_args.baud_rate {
            self.transport.baud_rate = baud_rate;
        }
        if let Some(rating) = shell_args.signal_quality_rating {
            self.signal.quality_rating = rating;
        }
        if let Some(key_path) = shell_args.jwt_signer_key {
            self.signer.key_path = Some(key_path);
        }
        if let Some(passphrase) = shell_args.jwt_signer_key_passphrase {
            self.signer.key_passphrase = Some(passphrase);
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Signal { quality_rating: SignalQualityRating::default() }
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut params: ConfigFileParams = toml::from_str(toml_string.as_ref())?;
    params.overlay(shell_args);
    Ok(params)
}

/// Reads the TOML configuration from `default_path`, parses the command
/// line, and overlays it. `--config_file` on the command line overrides
/// `default_path`.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("reading command line arguments");
            shell_args = cli_args().run();
        } else {
            log::debug!("argument reading disabled");
            shell_args = CmdLineArgs::default();
        }
    }

    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

/// Reads the TOML configuration from a string already in memory, still
/// overlaying command-line arguments.
pub fn read_config_string(toml_string: impl AsRef<str>) -> Result<ConfigFileParams, anyhow::Error> {
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("reading command line arguments");
            shell_args = cli_args().run();
        } else {
            log::debug!("argument reading disabled");
            shell_args = CmdLineArgs::default();
        }
    }

    read_config(toml_string, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overlay_wins_over_file_values() {
        let toml = r#"
            [transport]
            port_path = "/dev/ttyUSB0"
            baud_rate = 19200

            [signal]
            quality_rating = "GOOD"
        "#;
        let args = CmdLineArgs {
            config_file: None,
            port_path: Some("/dev/ttyUSB1".to_string()),
            baud_rate: None,
            signal_quality_rating: Some(SignalQualityRating::Excellent),
            jwt_signer_key: None,
            jwt_signer_key_passphrase: None,
        };
        let params = read_config(toml, args).unwrap();
        assert_eq!(params.transport.port_path, "/dev/ttyUSB1");
        assert_eq!(params.transport.baud_rate, 19200);
        assert_eq!(params.signal.quality_rating, SignalQualityRating::Excellent);
    }

    #[test]
    fn missing_signal_section_defaults_to_random() {
        let toml = r#"
            [transport]
            port_path = "/dev/ttyUSB0"
        "#;
        let args = CmdLineArgs::default();
        let params = read_config(toml, args).unwrap();
        assert_eq!(params.signal.quality_rating, SignalQualityRating::Random);
        assert_eq!(params.transport.baud_rate, 19200);
    }
}
