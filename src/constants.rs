//! # Constants and type definitions for targeter
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **unit
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Body radii
//! - Unit conversions (arcseconds → radians, days ↔ seconds)
//! - Reference epoch of the ephemeris time scale
//! - Type aliases documenting the unit carried by a plain `f64`

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Mean lunar radius in meters (IAU)
pub const LUNAR_RADIUS: Meter = 1_737_400.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Default tolerance, in seconds, on the time span covered by a single broadcast rotation
pub const DEFAULT_BROADCAST_TOLERANCE_S: f64 = 60.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Ephemeris time: TDB seconds elapsed since J2000
pub type EphemerisSeconds = f64;
