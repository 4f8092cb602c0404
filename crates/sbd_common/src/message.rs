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

    common::message.rs

    The claims carried by a single MO session and the signed message built
    from them. Field names are fixed on the wire for the event consumer, so
    `SbdClaims` derives `Serialize` with explicit `rename_all`/`rename`
    rather than relying on Rust-side naming.
*/

use serde_derive::Serialize;

pub const ROCKBLOCK_SERIAL: u32 = 206899;
pub const ROCKBLOCK_LATITUDE: f64 = 50.2563;
pub const ROCKBLOCK_LONGITUDE: f64 = 82.2532;
pub const ROCKBLOCK_CEP: u32 = 122;
pub const ROCKBLOCK_IMEI: &str = "300534062390910";
pub const ROCKBLOCK_DEVICE_TYPE: &str = "ROCKBLOCK";
pub const JWT_ISSUER: &str = "Rock7";

/// The unsigned claims for one uplinked message. This is exactly what gets
/// serialized into the JWT payload, and (with `jwt` appended) what is
/// published on the `sbd-message` event channel.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SbdClaims {
    pub momsn: u16,
    pub data: String,
    pub serial: u32,
    pub iridium_latitude: f64,
    pub iridium_longitude: f64,
    pub iridium_cep: u32,
    pub imei: String,
    pub device_type: String,
    pub transmit_time: String,
    pub iss: String,
}

impl SbdClaims {
    pub fn new(momsn: u16, data: String, transmit_time: String) -> Self {
        SbdClaims {
            momsn,
            data,
            serial: ROCKBLOCK_SERIAL,
            iridium_latitude: ROCKBLOCK_LATITUDE,
            iridium_longitude: ROCKBLOCK_LONGITUDE,
            iridium_cep: ROCKBLOCK_CEP,
            imei: ROCKBLOCK_IMEI.to_string(),
            device_type: ROCKBLOCK_DEVICE_TYPE.to_string(),
            transmit_time,
            iss: JWT_ISSUER.to_string(),
        }
    }
}

/// A signed, emitted SBD message: the claims plus the compact JWS produced
/// from them.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SbdMessage {
    pub momsn: u16,
    pub data: String,
    pub serial: u32,
    pub iridium_latitude: f64,
    pub iridium_longitude: f64,
    pub iridium_cep: u32,
    pub imei: String,
    pub device_type: String,
    pub transmit_time: String,
    #[serde(rename = "JWT")]
    pub jwt: String,
}

impl SbdMessage {
    pub fn from_claims(claims: SbdClaims, jwt: String) -> Self {
        SbdMessage {
            momsn: claims.momsn,
            data: claims.data,
            serial: claims.serial,
            iridium_latitude: claims.iridium_latitude,
            iridium_longitude: claims.iridium_longitude,
            iridium_cep: claims.iridium_cep,
            imei: claims.imei,
            device_type: claims.device_type,
            transmit_time: claims.transmit_time,
            jwt,
        }
    }
}
