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

    error.rs

    Defines the emulator's construction-time error type. Only constructor
    failures (transport open, signer key load/generation) are fatal; every
    other error in the system is reported in-band per the command matrix.
*/

use std::fmt::{self, Display};

#[derive(Debug)]
pub enum EmulatorError {
    TransportOpen(String),
    SignerKeyLoad(String),
    SignerKeyGenerate(String),
}

impl std::error::Error for EmulatorError {}

impl Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::TransportOpen(msg) => write!(f, "failed to open byte transport: {msg}"),
            EmulatorError::SignerKeyLoad(msg) => write!(f, "failed to load JWT signer key: {msg}"),
            EmulatorError::SignerKeyGenerate(msg) => write!(f, "failed to generate JWT signer key: {msg}"),
        }
    }
}
