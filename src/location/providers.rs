//! Network location providers: Nominatim, ipapi.co and timeapi.io.
//!
//! Every call is blocking with a short timeout. The resolver decides when
//! these may be used at all (offline mode skips them).

use super::types::{LocationSource, ResolvedLocation, ZoneSource};
use crate::error::LocationError;
use crate::geo::edit_distance;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("QiblaNuma/", env!("CARGO_PKG_VERSION"), " (prayer-and-moon-times)");
const TIMEOUT: Duration = Duration::from_secs(5);
const ZONE_TIMEOUT: Duration = Duration::from_secs(3);

fn get(url: &str, timeout: Duration) -> Result<ureq::Response, LocationError> {
    log::debug!("GET {}", url);
    ureq::get(url)
        .set("User-Agent", USER_AGENT)
        .timeout(timeout)
        .call()
        .map_err(|e| LocationError::Network(e.to_string()))
}

// ─── Nominatim provider ─────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default)]
    pub importance: Option<f64>,
    #[serde(default, rename = "type")]
    pub place_type: Option<String>,
    #[serde(default, rename = "class")]
    pub place_class: Option<String>,
}

/// A scored Nominatim candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct NominatimCandidate {
    pub name: String,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    pub country_code: String,
    pub score: f64,
}

// ─── Scoring weights ─────────────────────────────────────────────

const W_IMPORTANCE: f64 = 0.40;
const W_TYPE: f64 = 0.25;
const W_NAME: f64 = 0.20;
const W_COUNTRY: f64 = 0.15;

fn type_rank(place_type: &str, place_class: &str) -> f64 {
    match (place_class, place_type) {
        ("place", "city") | ("boundary", "administrative") => 1.0,
        ("place", "town") => 0.8,
        ("place", "village") => 0.4,
        ("place", "hamlet") => 0.2,
        _ => 0.5,
    }
}

fn name_similarity(query: &str, display_name: &str) -> f64 {
    let q = query.trim().to_lowercase();
    let first = display_name.split(',').next().unwrap_or("").trim().to_lowercase();
    if first == q {
        1.0
    } else if first.contains(&q) || q.contains(&first) {
        0.8
    } else if edit_distance(&q, &first) <= 2 {
        0.6
    } else {
        0.3
    }
}

/// Map a country name (English or a few native spellings) or alias to its
/// ISO 3166-1 alpha-2 code.
pub fn country_name_to_code(name: &str) -> Option<&'static str> {
    let code = match name.trim().to_lowercase().as_str() {
        "saudi arabia" | "saudi" | "ksa" => "SA",
        "united states" | "united states of america" | "usa" | "america" => "US",
        "united kingdom" | "uk" | "great britain" | "britain" | "england" => "GB",
        "france" => "FR",
        "germany" | "deutschland" => "DE",
        "italy" | "italia" => "IT",
        "spain" | "españa" => "ES",
        "russia" | "russian federation" => "RU",
        "china" | "people's republic of china" => "CN",
        "japan" => "JP",
        "india" => "IN",
        "pakistan" => "PK",
        "bangladesh" => "BD",
        "iran" => "IR",
        "iraq" => "IQ",
        "turkey" | "türkiye" => "TR",
        "egypt" => "EG",
        "israel" => "IL",
        "palestine" | "palestinian territory" => "PS",
        "jordan" => "JO",
        "united arab emirates" | "uae" | "emirates" => "AE",
        "qatar" => "QA",
        "kuwait" => "KW",
        "afghanistan" => "AF",
        "uzbekistan" => "UZ",
        "nigeria" => "NG",
        "kenya" => "KE",
        "ethiopia" => "ET",
        "sudan" => "SD",
        "senegal" => "SN",
        "algeria" | "algérie" => "DZ",
        "south africa" => "ZA",
        "morocco" | "maroc" => "MA",
        "australia" => "AU",
        "new zealand" | "aotearoa" => "NZ",
        "indonesia" => "ID",
        "malaysia" => "MY",
        "thailand" => "TH",
        "philippines" => "PH",
        "singapore" => "SG",
        "south korea" | "korea, republic of" => "KR",
        "canada" => "CA",
        "mexico" | "méxico" => "MX",
        "brazil" | "brasil" => "BR",
        "argentina" => "AR",
        "colombia" => "CO",
        "peru" | "perú" => "PE",
        "chile" => "CL",
        "sweden" | "sverige" => "SE",
        "norway" | "norge" => "NO",
        "iceland" | "ísland" => "IS",
        _ => return None,
    };
    Some(code)
}

fn score_candidate(query: &str, candidate: &NominatimResult, country_hint: Option<&str>) -> Option<NominatimCandidate> {
    let lat: f64 = candidate.lat.parse().ok()?;
    let lon: f64 = candidate.lon.parse().ok()?;
    let importance = candidate.importance.unwrap_or(0.3);
    let ptype = candidate.place_type.as_deref().unwrap_or("unknown");
    let pclass = candidate.place_class.as_deref().unwrap_or("unknown");

    // display_name ends with the country
    let last = candidate.display_name.rsplit(',').next().unwrap_or("");
    let country = country_name_to_code(last).unwrap_or_default().to_string();

    let country_score = match country_hint {
        Some(hint) if country.eq_ignore_ascii_case(hint) => 1.0,
        Some(_) => 0.0,
        None => 0.5,
    };

    let score = W_IMPORTANCE * importance
        + W_TYPE * type_rank(ptype, pclass)
        + W_NAME * name_similarity(query, &candidate.display_name)
        + W_COUNTRY * country_score;

    let name = candidate
        .display_name
        .split(',')
        .next()
        .unwrap_or(query)
        .trim()
        .to_string();

    Some(NominatimCandidate {
        name,
        display_name: candidate.display_name.clone(),
        lat,
        lon,
        country_code: country,
        score,
    })
}

/// Score raw Nominatim results, best first. Unparseable rows are dropped.
pub fn rank_candidates(
    query: &str,
    results: &[NominatimResult],
    country_hint: Option<&str>,
) -> Vec<NominatimCandidate> {
    let mut candidates: Vec<NominatimCandidate> = results
        .iter()
        .filter_map(|r| score_candidate(query, r, country_hint))
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Geocode a free-text address via OpenStreetMap Nominatim and return the
/// best-scoring candidate.
pub fn nominatim_geocode(query: &str, country_hint: Option<&str>) -> Result<NominatimCandidate, LocationError> {
    let country_param = country_hint
        .map(|cc| format!("&countrycodes={}", urlencod(cc)))
        .unwrap_or_default();
    let url = format!(
        "https://nominatim.openstreetmap.org/search?q={}&format=json&limit=5&addressdetails=0{}",
        urlencod(query),
        country_param,
    );

    let results: Vec<NominatimResult> = get(&url, TIMEOUT)?
        .into_json()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

    rank_candidates(query, &results, country_hint)
        .into_iter()
        .next()
        .ok_or_else(|| LocationError::NotFound(query.to_string()))
}

// ─── IP-based geolocation ───────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    city: Option<String>,
    country_name: Option<String>,
    country_code: Option<String>,
}

/// Auto-detect location via IP geolocation. The zone is whatever the
/// provider reports; `None` when it reports none.
pub fn ip_geolocate() -> Result<(ResolvedLocation, Option<String>), LocationError> {
    let r: IpApiResult = get("https://ipapi.co/json/", TIMEOUT)?
        .into_json()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

    let lat = r.latitude.ok_or_else(|| LocationError::InvalidResponse("no latitude".into()))?;
    let lon = r.longitude.ok_or_else(|| LocationError::InvalidResponse("no longitude".into()))?;
    let city = r.city.unwrap_or_else(|| "Unknown".into());
    let name = match r.country_name {
        Some(country) if !country.is_empty() => format!("{}, {}", city, country),
        _ => city,
    };

    let location = ResolvedLocation {
        name,
        lat,
        lon,
        tz: String::new(),
        source: LocationSource::IpApi,
        zone_source: ZoneSource::Provider,
        display_name: None,
        country_code: r.country_code,
    };
    Ok((location, r.timezone))
}

// ─── Timezone from coordinates ──────────────────────────────────

pub fn zone_from_api(lat: f64, lon: f64) -> Result<String, LocationError> {
    let url = format!(
        "https://www.timeapi.io/api/timezone/coordinate?latitude={}&longitude={}",
        lat, lon
    );
    let val: serde_json::Value = get(&url, ZONE_TIMEOUT)?
        .into_json()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

    val.get("timeZone")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| LocationError::InvalidResponse("no timeZone field".into()))
}

// ─── URL encoding (minimal, no extra dep) ───────────────────────

fn urlencod(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
