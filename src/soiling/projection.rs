//! Inverse transverse Mercator (UTM) projection on the WGS84 ellipsoid
//!
//! Krüger series to third order in the third flattening `n`, which is accurate
//! to well below a millimetre inside a UTM zone.

use crate::domain::GeoPoint;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// UTM zone on the WGS84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub northern: bool,
}

impl UtmZone {
    /// EPSG:32633, the zone used by Norwegian national mapping
    pub const N33: UtmZone = UtmZone {
        number: 33,
        northern: true,
    };

    /// Longitude of the zone's central meridian in degrees
    pub fn central_meridian(&self) -> f64 {
        -183.0 + 6.0 * self.number as f64
    }

    /// Convert easting/northing (metres) to WGS84 longitude/latitude
    pub fn to_geographic(&self, easting: f64, northing: f64) -> GeoPoint {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;

        // Rectifying radius
        let a = WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);

        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
            n2 / 48.0 + n3 / 15.0,
            17.0 * n3 / 480.0,
        ];
        let delta = [
            2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
            7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
            56.0 * n3 / 15.0,
        ];

        let northing = if self.northern {
            northing
        } else {
            northing - UTM_FALSE_NORTHING_SOUTH
        };
        let xi = northing / (UTM_K0 * a);
        let eta = (easting - UTM_FALSE_EASTING) / (UTM_K0 * a);

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, b) in beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
        let latitude = delta.iter().enumerate().fold(chi, |phi, (j, d)| {
            phi + d * (2.0 * (j + 1) as f64 * chi).sin()
        });
        let longitude =
            self.central_meridian().to_radians() + eta_prime.sinh().atan2(xi_prime.cos());

        GeoPoint::new(longitude.to_degrees(), latitude.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_false_origin_maps_to_central_meridian_on_equator() {
        let p = UtmZone::N33.to_geographic(500_000.0, 0.0);
        assert!((p.longitude - 15.0).abs() < 1e-12);
        assert!(p.latitude.abs() < 1e-12);
    }

    #[test]
    fn test_central_meridian() {
        assert_eq!(UtmZone::N33.central_meridian(), 15.0);
        let zone32 = UtmZone {
            number: 32,
            northern: true,
        };
        assert_eq!(zone32.central_meridian(), 9.0);
    }

    #[test]
    fn test_oslo_municipality_centre() {
        let p = UtmZone::N33.to_geographic(262_335.42, 6_656_953.39);
        assert!((p.longitude - 10.739_551).abs() < 1e-5, "{p:?}");
        assert!((p.latitude - 59.981_017).abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn test_west_of_false_easting() {
        // Bergen lies west of the zone and has a negative easting
        let p = UtmZone::N33.to_geographic(-28_836.01, 6_730_622.71);
        assert!((p.longitude - 5.390_220).abs() < 1e-5, "{p:?}");
        assert!((p.latitude - 60.363_911).abs() < 1e-5, "{p:?}");
    }

    #[test]
    fn test_southern_hemisphere() {
        let zone = UtmZone {
            number: 33,
            northern: false,
        };
        let p = zone.to_geographic(500_000.0, 10_000_000.0);
        assert!(p.latitude.abs() < 1e-9);
        let south = zone.to_geographic(500_000.0, 9_000_000.0);
        assert!(south.latitude < -8.0 && south.latitude > -10.0);
    }
}
