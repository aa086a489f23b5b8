use _model::{RawAddressRecord, State};
use geo::{point, Point};

use super::AddressSource;

pub const MAX_HOUSE_NUMBER: u32 = 400;

const STREETS: [&str; 12] = [
    "George Street",
    "Church Street",
    "High Street",
    "Main Road",
    "Victoria Street",
    "Station Street",
    "Park Road",
    "Railway Parade",
    "King Street",
    "Queen Street",
    "William Street",
    "Elizabeth Street",
];

/// Deterministic stand-in for a national address file. No I/O, no state.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockRegistry;

impl AddressSource for MockRegistry {
    fn find(&self, postcode: &str, house_number: &str) -> Vec<RawAddressRecord> {
        let (Ok(code), Ok(number)) = (postcode.parse::<u32>(), house_number.parse::<u32>()) else {
            return Vec::new();
        };
        let Some(state) = state_for_postcode(code) else {
            return Vec::new();
        };
        if !(1..=MAX_HOUSE_NUMBER).contains(&number) {
            return Vec::new();
        }

        let seed = mix(u64::from(code) * 100_000 + u64::from(number));
        let localities = localities(state);
        let city = localities[(code as usize) % localities.len()];
        let origin = reference_point(state);

        // 5 is coprime with STREETS.len(), so the picks never repeat
        let count = 1 + (seed % 3) as usize;
        (0..count)
            .map(|i| {
                let street = STREETS[(seed as usize / 3 + i * 5) % STREETS.len()];
                let jitter = mix(seed ^ i as u64);
                let point = Point::new(
                    origin.x() + offset(jitter),
                    origin.y() + offset(jitter >> 32),
                );

                RawAddressRecord {
                    postcode: postcode.to_string(),
                    house_number: house_number.to_string(),
                    street: street.to_string(),
                    city: city.to_string(),
                    lon: format!("{:.6}", point.x()),
                    lat: format!("{:.6}", point.y()),
                }
            })
            .collect()
    }
}

/// Street-delivery ranges only; PO box and large volume receiver ranges have no streets.
fn postcode_ranges(state: State) -> &'static [(u32, u32)] {
    match state {
        State::NSW => &[(2000, 2599), (2619, 2899), (2921, 2999)],
        State::ACT => &[(2600, 2618), (2900, 2920)],
        State::VIC => &[(3000, 3999)],
        State::QLD => &[(4000, 4999)],
        State::SA => &[(5000, 5799)],
        State::WA => &[(6000, 6797)],
        State::TAS => &[(7000, 7799)],
        State::NT => &[(800, 899)],
    }
}

pub fn state_for_postcode(code: u32) -> Option<State> {
    State::all()
        .into_iter()
        .find(|state| {
            postcode_ranges(*state)
                .iter()
                .any(|(lo, hi)| (*lo..=*hi).contains(&code))
        })
}

fn localities(state: State) -> &'static [&'static str] {
    match state {
        State::NSW => &["Sydney", "Parramatta", "Newcastle", "Wollongong"],
        State::VIC => &["Melbourne", "Geelong", "Ballarat", "Bendigo"],
        State::QLD => &["Brisbane", "Gold Coast", "Townsville", "Cairns"],
        State::SA => &["Adelaide", "Mount Gambier", "Whyalla"],
        State::WA => &["Perth", "Fremantle", "Bunbury"],
        State::TAS => &["Hobart", "Launceston", "Devonport"],
        State::NT => &["Darwin", "Palmerston"],
        State::ACT => &["Canberra", "Belconnen"],
    }
}

fn reference_point(state: State) -> Point {
    match state {
        State::NSW => point!(x: 151.2093, y: -33.8688),
        State::VIC => point!(x: 144.9631, y: -37.8136),
        State::QLD => point!(x: 153.0251, y: -27.4698),
        State::SA => point!(x: 138.6007, y: -34.9285),
        State::WA => point!(x: 115.8605, y: -31.9505),
        State::TAS => point!(x: 147.3272, y: -42.8821),
        State::NT => point!(x: 130.8456, y: -12.4634),
        State::ACT => point!(x: 149.1300, y: -35.2809),
    }
}

// within +-0.05 degrees
fn offset(bits: u64) -> f64 {
    (bits % 10_000) as f64 / 100_000.0 - 0.05
}

// splitmix64 finaliser
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_postcode_yields_matching_records() {
        let records = MockRegistry.find("2000", "12");
        assert!(!records.is_empty() && records.len() <= 3);
        for record in &records {
            assert_eq!(record.postcode, "2000");
            assert_eq!(record.house_number, "12");
            assert_eq!(record.city, "Sydney");
        }

        let mut streets: Vec<_> = records.iter().map(|x| &x.street).collect();
        streets.sort();
        streets.dedup();
        assert_eq!(streets.len(), records.len());
    }

    #[test]
    fn same_query_same_records() {
        assert_eq!(MockRegistry.find("3000", "350"), MockRegistry.find("3000", "350"));
    }

    #[test]
    fn unknown_inputs_have_no_records() {
        assert!(MockRegistry.find("9999", "999").is_empty());
        assert!(MockRegistry.find("9999", "1").is_empty());
        assert!(MockRegistry.find("8001", "1").is_empty());
        assert!(MockRegistry.find("2000", "0").is_empty());
        assert!(MockRegistry.find("2000", "401").is_empty());
    }

    #[test]
    fn leading_zero_territory_postcode() {
        assert_eq!(state_for_postcode(800), Some(State::NT));
        let records = MockRegistry.find("0800", "1");
        assert!(!records.is_empty());
        assert_eq!(records[0].postcode, "0800");
    }

    #[test]
    fn coordinates_stay_near_the_state() {
        for record in MockRegistry.find("6000", "42") {
            let lon: f64 = record.lon.parse().unwrap();
            let lat: f64 = record.lat.parse().unwrap();
            assert!((lon - 115.8605).abs() <= 0.051);
            assert!((lat + 31.9505).abs() <= 0.051);
        }
    }

    #[test]
    fn every_state_is_reachable() {
        for state in State::all() {
            let (first, _) = postcode_ranges(state)[0];
            assert_eq!(state_for_postcode(first), Some(state));
        }
    }
}
