//! Static gazetteer, great-circle distances and sub-point geography.

use crate::ephemeris::{Body, EphemerisOracle, GeoPoint};
use crate::error::EphemerisError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Mean Earth radius in km.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Only cities this close to the sub-point count for influence.
pub const INFLUENCE_RADIUS_KM: f64 = 5000.0;

/// A gazetteer entry.
#[derive(Debug)]
pub struct City {
    /// Canonical name first, then aliases. All lowercase.
    pub names: &'static [&'static str],
    pub country_code: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub tz: &'static str,
    pub population: u64,
}

impl City {
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.lat,
            longitude: self.lon,
        }
    }

    pub fn zone(&self) -> Option<Tz> {
        self.tz.parse().ok()
    }
}

macro_rules! city {
    ([$($name:literal),+], $cc:literal, $country:literal, $lat:expr, $lon:expr, $tz:literal, $pop:expr) => {
        City {
            names: &[$($name),+],
            country_code: $cc,
            country: $country,
            lat: $lat,
            lon: $lon,
            tz: $tz,
            population: $pop,
        }
    };
}

const BUILTIN_CITIES: &[City] = &[
    city!(["mecca", "makkah", "mekka"], "SA", "Saudi Arabia", 21.4225, 39.8262, "Asia/Riyadh", 2_385_000),
    city!(["medina", "madinah", "al-madinah"], "SA", "Saudi Arabia", 24.4686, 39.6142, "Asia/Riyadh", 1_488_000),
    city!(["riyadh"], "SA", "Saudi Arabia", 24.7136, 46.6753, "Asia/Riyadh", 7_676_000),
    city!(["stockholm", "stokholm"], "SE", "Sweden", 59.3293, 18.0686, "Europe/Stockholm", 1_679_000),
    city!(["tromso", "tromsø", "tromsoe"], "NO", "Norway", 69.6492, 18.9553, "Europe/Oslo", 77_000),
    city!(["longyearbyen", "svalbard"], "NO", "Norway", 78.2232, 15.6267, "Arctic/Longyearbyen", 2_400),
    city!(["oslo"], "NO", "Norway", 59.9139, 10.7522, "Europe/Oslo", 1_064_000),
    city!(["reykjavik", "reykjavík"], "IS", "Iceland", 64.1466, -21.9426, "Atlantic/Reykjavik", 240_000),
    city!(["new york", "newyork", "nyc"], "US", "United States", 40.7128, -74.0060, "America/New_York", 18_937_000),
    city!(["los angeles", "la"], "US", "United States", 34.0522, -118.2437, "America/Los_Angeles", 12_534_000),
    city!(["chicago"], "US", "United States", 41.8781, -87.6298, "America/Chicago", 8_937_000),
    city!(["anchorage"], "US", "United States", 61.2181, -149.9003, "America/Anchorage", 292_000),
    city!(["honolulu"], "US", "United States", 21.3069, -157.8583, "Pacific/Honolulu", 1_016_000),
    city!(["toronto"], "CA", "Canada", 43.6532, -79.3832, "America/Toronto", 6_313_000),
    city!(["mexico city", "ciudad de mexico", "cdmx"], "MX", "Mexico", 19.4326, -99.1332, "America/Mexico_City", 22_085_000),
    city!(["bogota", "bogotá"], "CO", "Colombia", 4.7110, -74.0721, "America/Bogota", 11_344_000),
    city!(["lima"], "PE", "Peru", -12.0464, -77.0428, "America/Lima", 11_045_000),
    city!(["santiago"], "CL", "Chile", -33.4489, -70.6693, "America/Santiago", 6_857_000),
    city!(["sao paulo", "são paulo"], "BR", "Brazil", -23.5505, -46.6333, "America/Sao_Paulo", 22_430_000),
    city!(["rio de janeiro", "rio"], "BR", "Brazil", -22.9068, -43.1729, "America/Sao_Paulo", 13_634_000),
    city!(["buenos aires"], "AR", "Argentina", -34.6037, -58.3816, "America/Argentina/Buenos_Aires", 15_369_000),
    city!(["london"], "GB", "United Kingdom", 51.5074, -0.1278, "Europe/London", 9_541_000),
    city!(["paris"], "FR", "France", 48.8566, 2.3522, "Europe/Paris", 11_142_000),
    city!(["madrid"], "ES", "Spain", 40.4168, -3.7038, "Europe/Madrid", 6_713_000),
    city!(["rome", "roma"], "IT", "Italy", 41.9028, 12.4964, "Europe/Rome", 4_316_000),
    city!(["berlin"], "DE", "Germany", 52.5200, 13.4050, "Europe/Berlin", 3_574_000),
    city!(["moscow", "moskva"], "RU", "Russia", 55.7558, 37.6173, "Europe/Moscow", 12_680_000),
    city!(["istanbul"], "TR", "Turkey", 41.0082, 28.9784, "Europe/Istanbul", 15_847_000),
    city!(["cairo", "al-qahirah"], "EG", "Egypt", 30.0444, 31.2357, "Africa/Cairo", 22_183_000),
    city!(["casablanca", "dar el beida"], "MA", "Morocco", 33.5731, -7.5898, "Africa/Casablanca", 3_840_000),
    city!(["algiers", "alger"], "DZ", "Algeria", 36.7538, 3.0588, "Africa/Algiers", 2_902_000),
    city!(["dakar"], "SN", "Senegal", 14.7167, -17.4677, "Africa/Dakar", 3_326_000),
    city!(["lagos"], "NG", "Nigeria", 6.5244, 3.3792, "Africa/Lagos", 15_946_000),
    city!(["kinshasa"], "CD", "DR Congo", -4.4419, 15.2663, "Africa/Kinshasa", 16_316_000),
    city!(["khartoum"], "SD", "Sudan", 15.5007, 32.5599, "Africa/Khartoum", 6_160_000),
    city!(["addis ababa"], "ET", "Ethiopia", 9.0054, 38.7636, "Africa/Addis_Ababa", 5_461_000),
    city!(["nairobi"], "KE", "Kenya", -1.2921, 36.8219, "Africa/Nairobi", 5_325_000),
    city!(["johannesburg", "joburg"], "ZA", "South Africa", -26.2041, 28.0473, "Africa/Johannesburg", 6_198_000),
    city!(["cape town"], "ZA", "South Africa", -33.9249, 18.4241, "Africa/Johannesburg", 4_890_000),
    city!(["jerusalem", "al-quds"], "IL", "Israel", 31.7683, 35.2137, "Asia/Jerusalem", 981_000),
    city!(["baghdad"], "IQ", "Iraq", 33.3152, 44.3661, "Asia/Baghdad", 7_711_000),
    city!(["tehran"], "IR", "Iran", 35.6892, 51.3890, "Asia/Tehran", 9_500_000),
    city!(["dubai"], "AE", "United Arab Emirates", 25.2048, 55.2708, "Asia/Dubai", 3_604_000),
    city!(["kabul"], "AF", "Afghanistan", 34.5553, 69.2075, "Asia/Kabul", 4_601_000),
    city!(["tashkent"], "UZ", "Uzbekistan", 41.2995, 69.2401, "Asia/Tashkent", 2_956_000),
    city!(["karachi"], "PK", "Pakistan", 24.8607, 67.0011, "Asia/Karachi", 17_236_000),
    city!(["lahore"], "PK", "Pakistan", 31.5204, 74.3587, "Asia/Karachi", 13_979_000),
    city!(["delhi", "new delhi"], "IN", "India", 28.6139, 77.2090, "Asia/Kolkata", 32_941_000),
    city!(["mumbai", "bombay"], "IN", "India", 19.0760, 72.8777, "Asia/Kolkata", 21_297_000),
    city!(["dhaka", "dacca"], "BD", "Bangladesh", 23.8103, 90.4125, "Asia/Dhaka", 23_210_000),
    city!(["bangkok"], "TH", "Thailand", 13.7563, 100.5018, "Asia/Bangkok", 11_070_000),
    city!(["kuala lumpur", "kl"], "MY", "Malaysia", 3.1390, 101.6869, "Asia/Kuala_Lumpur", 8_420_000),
    city!(["singapore"], "SG", "Singapore", 1.3521, 103.8198, "Asia/Singapore", 5_917_000),
    city!(["jakarta"], "ID", "Indonesia", -6.2088, 106.8456, "Asia/Jakarta", 11_074_000),
    city!(["manila"], "PH", "Philippines", 14.5995, 120.9842, "Asia/Manila", 14_667_000),
    city!(["beijing", "peking"], "CN", "China", 39.9042, 116.4074, "Asia/Shanghai", 21_766_000),
    city!(["shanghai"], "CN", "China", 31.2304, 121.4737, "Asia/Shanghai", 29_211_000),
    city!(["seoul"], "KR", "South Korea", 37.5665, 126.9780, "Asia/Seoul", 9_976_000),
    city!(["tokyo"], "JP", "Japan", 35.6762, 139.6503, "Asia/Tokyo", 37_194_000),
    city!(["perth"], "AU", "Australia", -31.9505, 115.8605, "Australia/Perth", 2_141_000),
    city!(["sydney"], "AU", "Australia", -33.8688, 151.2093, "Australia/Sydney", 5_367_000),
    city!(["auckland"], "NZ", "New Zealand", -36.8485, 174.7633, "Pacific/Auckland", 1_711_000),
];

/// Great-circle distance in km.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Levenshtein distance.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// A city with its distance (and influence) relative to a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityDistance {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: u64,
    pub tz: String,
    pub distance_km: f64,
    /// population / distance², people per km².
    pub influence: f64,
}

impl CityDistance {
    fn new(city: &City, from: GeoPoint) -> Self {
        let distance_km = haversine_km(from, city.point());
        Self {
            name: city.name().to_string(),
            country: city.country.to_string(),
            latitude: city.lat,
            longitude: city.lon,
            population: city.population,
            tz: city.tz.to_string(),
            distance_km,
            influence: city.population as f64 / distance_km.max(1.0).powi(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbourhood {
    pub nearest: CityDistance,
    /// Highest influence among northern-hemisphere cities within range.
    pub influential_north: Option<CityDistance>,
    pub influential_south: Option<CityDistance>,
}

/// Read-only city table.
#[derive(Debug, Clone, Copy)]
pub struct Gazetteer {
    cities: &'static [City],
}

impl Gazetteer {
    pub fn builtin() -> Self {
        Self {
            cities: BUILTIN_CITIES,
        }
    }

    pub fn cities(&self) -> &'static [City] {
        self.cities
    }

    fn filtered<'a>(&'a self, country: Option<&'a str>) -> impl Iterator<Item = &'static City> + 'a {
        self.cities
            .iter()
            .filter(move |c| country.map_or(true, |cc| c.country_code.eq_ignore_ascii_case(cc)))
    }

    /// Case-insensitive match on a name or alias.
    pub fn exact(&self, query: &str, country: Option<&str>) -> Option<&'static City> {
        let q = query.trim().to_lowercase();
        self.filtered(country).find(|c| c.names.iter().any(|n| *n == q))
    }

    /// Substring match, then the closest name within edit distance 2.
    pub fn fuzzy(&self, query: &str, country: Option<&str>) -> Option<&'static City> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        if let Some(city) = self
            .filtered(country)
            .find(|c| c.names.iter().any(|n| n.len() > 2 && (n.contains(&q) || q.contains(n))))
        {
            return Some(city);
        }
        self.filtered(country)
            .filter_map(|c| {
                let best = c.names.iter().map(|n| edit_distance(&q, n)).min()?;
                (best <= 2).then_some((c, best))
            })
            .min_by_key(|(_, d)| *d)
            .map(|(c, _)| c)
    }

    pub fn nearest(&self, point: GeoPoint) -> Option<(&'static City, f64)> {
        self.cities
            .iter()
            .map(|c| (c, haversine_km(point, c.point())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// The nearest city, plus the most influential city per hemisphere
    /// within [`INFLUENCE_RADIUS_KM`], never repeating the nearest one.
    pub fn nearest_and_influential(&self, point: GeoPoint) -> Option<Neighbourhood> {
        let (nearest, _) = self.nearest(point)?;
        let candidates: Vec<CityDistance> = self
            .cities
            .iter()
            .filter(|c| !std::ptr::eq(*c, nearest))
            .map(|c| CityDistance::new(c, point))
            .filter(|c| c.distance_km <= INFLUENCE_RADIUS_KM)
            .collect();

        let most_influential = |north: bool| {
            candidates
                .iter()
                .filter(|c| (c.latitude >= 0.0) == north)
                .max_by(|a, b| a.influence.total_cmp(&b.influence))
                .cloned()
        };

        Some(Neighbourhood {
            nearest: CityDistance::new(nearest, point),
            influential_north: most_influential(true),
            influential_south: most_influential(false),
        })
    }
}

/// Where a body is overhead right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubPointSummary {
    pub body: Body,
    pub point: GeoPoint,
    pub neighbourhood: Option<Neighbourhood>,
    /// Local time at the sub-point, in the nearest city's zone.
    pub local_time: Option<DateTime<Tz>>,
}

pub fn sub_point_summary(
    oracle: &dyn EphemerisOracle,
    gazetteer: &Gazetteer,
    body: Body,
    instant: DateTime<Utc>,
) -> Result<SubPointSummary, EphemerisError> {
    let point = oracle.subpoint(body, instant)?;
    let neighbourhood = gazetteer.nearest_and_influential(point);
    let local_time = gazetteer
        .nearest(point)
        .and_then(|(city, _)| city.zone())
        .map(|tz| instant.with_timezone(&tz));
    Ok(SubPointSummary {
        body,
        point,
        neighbourhood,
        local_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::AnalyticalEphemeris;
    use approx::assert_abs_diff_eq;
    use chrono::Timelike;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn test_haversine_known_distances() {
        let london = point(51.5074, -0.1278);
        let paris = point(48.8566, 2.3522);
        assert_abs_diff_eq!(haversine_km(london, paris), 343.5, epsilon = 2.0);
        assert_abs_diff_eq!(haversine_km(london, london), 0.0);
        // Antipodes: half the circumference.
        assert_abs_diff_eq!(haversine_km(point(0.0, 0.0), point(0.0, 180.0)), 20015.1, epsilon = 1.0);
    }

    #[test]
    fn test_all_zones_parse() {
        for city in Gazetteer::builtin().cities() {
            assert!(city.zone().is_some(), "bad zone for {}", city.name());
            assert!(city.population > 0);
            assert!(city.names.iter().all(|n| *n == n.to_lowercase()));
        }
    }

    #[test]
    fn test_exact_and_fuzzy_lookup() {
        let g = Gazetteer::builtin();
        assert_eq!(g.exact("Makkah", None).unwrap().name(), "mecca");
        assert_eq!(g.exact("  New Delhi ", None).unwrap().name(), "delhi");
        assert!(g.exact("stockholmm", None).is_none());
        assert_eq!(g.fuzzy("stockholmm", None).unwrap().name(), "stockholm");
        assert_eq!(g.fuzzy("Tokio", None).unwrap().name(), "tokyo");
        assert!(g.fuzzy("xyznonexistent", None).is_none());
        assert!(g.exact("london", Some("FR")).is_none());
        assert_eq!(g.exact("london", Some("gb")).unwrap().country, "United Kingdom");
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("mecca", "mecca"), 0);
    }

    #[test]
    fn test_nearest_and_influential() {
        let g = Gazetteer::builtin();
        let n = g.nearest_and_influential(point(28.6, 77.2)).unwrap();
        assert_eq!(n.nearest.name, "delhi");
        let north = n.influential_north.unwrap();
        assert_ne!(north.name, "delhi");
        assert!(north.distance_km <= INFLUENCE_RADIUS_KM);
        if let Some(south) = n.influential_south {
            assert!(south.latitude < 0.0);
            assert!(south.distance_km <= INFLUENCE_RADIUS_KM);
        }
    }

    #[test]
    fn test_remote_point_has_no_influential_cities() {
        // South Pacific, far from everything.
        let n = Gazetteer::builtin().nearest_and_influential(point(-48.0, -123.0)).unwrap();
        assert!(n.influential_north.is_none());
        assert!(n.influential_south.is_none());
        // The nearest city is in range but is never counted twice.
        assert_eq!(n.nearest.name, "santiago");
    }

    #[test]
    fn test_subsolar_point_at_noon_utc() {
        let eph = AnalyticalEphemeris::new();
        let g = Gazetteer::builtin();
        let t: DateTime<Utc> = "2024-03-20T12:00:00Z".parse().unwrap();
        let summary = sub_point_summary(&eph, &g, Body::Sun, t).unwrap();
        assert!(summary.point.latitude.abs() < 0.5);
        let near = summary.neighbourhood.unwrap().nearest;
        assert_eq!(near.name, "lagos");
        assert_eq!(summary.local_time.unwrap().hour(), 13);
    }
}
