use serde::Serialize;

use super::keys;
use super::value::PropertyTree;

/// Signed decimal coordinates (north and east positive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    /// Derive coordinates from a raw GPS group.
    ///
    /// Needs numeric `Latitude`/`Longitude` magnitudes and text
    /// `LatitudeRef`/`LongitudeRef`. `S` and `W` negate; any other reference
    /// leaves the magnitude positive. Missing or mistyped fields yield `None`.
    pub fn from_gps_group(gps: &PropertyTree) -> Option<Self> {
        let latitude = gps.get(keys::GPS_LATITUDE)?.as_f64()?;
        let latitude_ref = gps.get(keys::GPS_LATITUDE_REF)?.as_str()?;
        let longitude = gps.get(keys::GPS_LONGITUDE)?.as_f64()?;
        let longitude_ref = gps.get(keys::GPS_LONGITUDE_REF)?.as_str()?;

        let latitude = if latitude_ref == "S" { -latitude } else { latitude };
        let longitude = if longitude_ref == "W" { -longitude } else { longitude };

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            log::debug!("GPS coordinates out of range: {latitude}, {longitude}");
            return None;
        }
        Some(Self { latitude, longitude })
    }

    pub fn apple_maps_url(&self) -> String {
        let (lat, lon) = (self.latitude, self.longitude);
        format!("https://maps.apple.com/?ll={lat},{lon}&q={lat},{lon}")
    }

    pub fn google_maps_url(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.latitude, self.longitude)
    }

    /// `37.774900, -122.419400`
    pub fn decimal_string(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }

    /// Degrees, minutes, seconds: `37°46′29.64″N, 122°25′9.84″W`
    pub fn dms_string(&self) -> String {
        format!(
            "{}, {}",
            dms(self.latitude, if self.latitude < 0.0 { 'S' } else { 'N' }),
            dms(self.longitude, if self.longitude < 0.0 { 'W' } else { 'E' }),
        )
    }

    /// Degrees and decimal minutes: `37°46.4940′N, 122°25.1640′W`
    pub fn ddm_string(&self) -> String {
        format!(
            "{}, {}",
            ddm(self.latitude, if self.latitude < 0.0 { 'S' } else { 'N' }),
            ddm(self.longitude, if self.longitude < 0.0 { 'W' } else { 'E' }),
        )
    }
}

fn dms(value: f64, hemisphere: char) -> String {
    // hundredths of an arc-second, so rounding carries into minutes and degrees
    let total = (value.abs() * 360_000.0).round() as u64;
    let degrees = total / 360_000;
    let minutes = (total % 360_000) / 6_000;
    let seconds = (total % 6_000) as f64 / 100.0;
    format!("{degrees}°{minutes}′{seconds:.2}″{hemisphere}")
}

fn ddm(value: f64, hemisphere: char) -> String {
    // ten-thousandths of an arc-minute
    let total = (value.abs() * 600_000.0).round() as u64;
    let degrees = total / 600_000;
    let minutes = (total % 600_000) as f64 / 10_000.0;
    format!("{degrees}°{minutes:.4}′{hemisphere}")
}
