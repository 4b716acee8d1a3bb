//! Sample trips for a first run with empty storage.

use crate::clock::Clock;
use crate::record::{NewTrip, Record, RecordFactory};

#[derive(Debug, Clone, Copy)]
pub struct SampleTrip {
    pub origin: &'static str,
    pub destination: &'static str,
    pub toll_fee: u64,
    pub fuel_cost: u64,
}

impl SampleTrip {
    const fn new(
        origin: &'static str,
        destination: &'static str,
        toll_fee: u64,
        fuel_cost: u64,
    ) -> Self {
        Self {
            origin,
            destination,
            toll_fee,
            fuel_cost,
        }
    }
}

pub const SAMPLE_TRIPS: [SampleTrip; 8] = [
    SampleTrip::new("서울", "부산", 23_400, 68_000),
    SampleTrip::new("서울", "대전", 8_600, 27_000),
    SampleTrip::new("대전", "광주", 9_100, 31_500),
    SampleTrip::new("서울", "강릉", 12_200, 39_000),
    SampleTrip::new("인천", "수원", 2_800, 11_000),
    SampleTrip::new("대구", "울산", 4_300, 16_500),
    SampleTrip::new("부산", "창원", 1_900, 9_000),
    SampleTrip::new("서울", "전주", 10_700, 34_000),
];

/// Build the sample trips, newest first like manually added records.
pub fn sample_records<C: Clock>(factory: &mut RecordFactory<C>) -> Vec<Record> {
    let mut records: Vec<Record> = SAMPLE_TRIPS
        .iter()
        .filter_map(|trip| {
            factory
                .create(NewTrip::new(
                    trip.origin,
                    trip.destination,
                    trip.toll_fee,
                    trip.fuel_cost,
                ))
                .ok()
        })
        .collect();
    records.reverse();
    records
}
