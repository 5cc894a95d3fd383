// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Conversions between geodetic [Positions](Position) and
//! [Earth-centered, Earth-fixed](https://en.wikipedia.org/wiki/Earth-centered,_Earth-fixed_coordinate_system)
//! cartesian coordinates on the WGS-84 ellipsoid.

use crate::Position;

/// WGS-84 semi-major axis, in meters.
const A: f64 = 6378137.0;

/// WGS-84 first eccentricity squared.
const E2: f64 = 6.6943799901377997e-3;

// Derived constants of the inverse transform.
const A1: f64 = 4.2697672707157535e+4; // A * E2
const A2: f64 = 1.8230912546075455e+9; // A1 * A1
const A3: f64 = 1.4291722289812413e+2; // A1 * E2 / 2
const A4: f64 = 4.5577281365188637e+9; // 2.5 * A2
const A5: f64 = 4.2840589930055659e+4; // A1 + A3
const A6: f64 = 9.9330562000986220e-1; // 1 - E2

/// Point in the ECEF frame, in meters.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    /// Distance from the center of the Earth.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Straight-line (chord) distance to another point, in meters.
    pub fn distance(&self, other: &Ecef) -> f64 {
        Ecef {
            x: other.x - self.x,
            y: other.y - self.y,
            z: other.z - self.z,
        }
        .length()
    }
}

impl From<Position> for Ecef {
    fn from(p: Position) -> Self {
        geodetic_to_ecef(p)
    }
}

impl From<Ecef> for Position {
    fn from(p: Ecef) -> Self {
        ecef_to_geodetic(p)
    }
}

/// Converts a geodetic position into ECEF coordinates.
pub fn geodetic_to_ecef(p: Position) -> Ecef {
    let lat = p.lat.to_radians();
    let lon = p.lon.to_radians();
    let sin_lat = lat.sin();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();

    Ecef {
        x: (n + p.ele) * lat.cos() * lon.cos(),
        y: (n + p.ele) * lat.cos() * lon.sin(),
        z: (n * (1.0 - E2) + p.ele) * sin_lat,
    }
}

/// Converts ECEF coordinates back into a geodetic position.
///
/// Uses Olson's closed-form approximation, switching between the sine and cosine
/// formulations depending on the squared cosine of the geocentric latitude.
/// The result is undefined for the center of the Earth.
pub fn ecef_to_geodetic(p: Ecef) -> Position {
    let zp = p.z.abs();
    let w2 = p.x * p.x + p.y * p.y;
    let w = w2.sqrt();
    let r2 = w2 + p.z * p.z;
    let r = r2.sqrt();

    let lon = p.y.atan2(p.x);

    let s2 = p.z * p.z / r2;
    let c2 = w2 / r2;
    let u = A2 / r;
    let v = A3 - A4 / r;

    let (mut lat, s, c, ss) = if c2 > 0.3 {
        let s = (zp / r) * (1.0 + c2 * (A1 + u + s2 * v) / r);
        let ss = s * s;
        (s.asin(), s, (1.0 - ss).sqrt(), ss)
    } else {
        let c = (w / r) * (1.0 - s2 * (A5 - u - c2 * v) / r);
        let ss = 1.0 - c * c;
        (c.acos(), ss.sqrt(), c, ss)
    };

    let g = 1.0 - E2 * ss;
    let rg = A / g.sqrt();
    let rf = A6 * rg;
    let u = w - rg * c;
    let v = zp - rf * s;
    let f = c * u + s * v;
    let m = c * v - s * u;
    let p_corr = m / (rf / g + f);

    lat += p_corr;
    let ele = f + m * p_corr / 2.0;

    if p.z < 0.0 {
        lat = -lat;
    }

    Position {
        lat: lat.to_degrees(),
        lon: lon.to_degrees(),
        ele,
    }
}

/// Straight-line distance between two geodetic positions, in meters,
/// measured between their ECEF representations.
///
/// This underestimates the great-circle distance, but the error is negligible
/// at the scale of a single street.
pub fn distance(a: Position, b: Position) -> f64 {
    geodetic_to_ecef(a).distance(&geodetic_to_ecef(b))
}
