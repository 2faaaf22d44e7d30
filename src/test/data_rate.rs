use crate::net::DataRate;
use crate::sim::SimTime;

#[test]
fn data_rate_parses_and_displays_decimal_units() {
    assert_eq!("2Mbps".parse::<DataRate>().expect("rate").bps(), 2_000_000);
    assert_eq!("54Mbps".parse::<DataRate>().expect("rate").bps(), 54_000_000);
    assert_eq!("500kbps".parse::<DataRate>().expect("rate").bps(), 500_000);
    assert_eq!("1.5Mbps".parse::<DataRate>().expect("rate").bps(), 1_500_000);
    assert!("fast".parse::<DataRate>().is_err());
    assert_eq!(DataRate::from_mbps(8).to_string(), "8Mbps");
}

#[test]
fn tx_time_rounds_up_to_whole_nanoseconds() {
    let r = DataRate::from_mbps(8);
    // 1000 bytes at 8 Mbps = 1 ms
    assert_eq!(r.tx_time(1000), SimTime::from_millis(1));
    let r = DataRate::from_bps(3);
    assert_eq!(r.tx_time(1), SimTime(2_666_666_667));
}

#[test]
fn data_rate_round_trips_through_json_strings() {
    let r: DataRate = serde_json::from_str("\"10Mbps\"").expect("parse");
    assert_eq!(r, DataRate::from_mbps(10));
    assert!(serde_json::from_str::<DataRate>("\"10 parsecs\"").is_err());
}
