// Rolling window tests: capacity bound, FIFO eviction, announcement handling

use livetraffic::models::InterfaceRates;
use livetraffic::series::{DEFAULT_WINDOW_SIZE, InterfaceSeries, SeriesSet};

fn rates(rx: f64, tx: f64) -> InterfaceRates {
    InterfaceRates {
        rx_bps: rx,
        tx_bps: tx,
    }
}

#[test]
fn test_default_window_is_thirty() {
    assert_eq!(DEFAULT_WINDOW_SIZE, 30);
}

#[test]
fn test_series_never_exceeds_capacity() {
    for capacity in [1, 2, 5, 30] {
        let mut s = InterfaceSeries::new(capacity);
        for i in 0..(capacity * 3 + 1) {
            s.push(format!("t{i}"), i as f64, 0.0);
            assert!(s.len() <= capacity);
            assert_eq!(s.labels().len(), s.rx_bps().len());
            assert_eq!(s.rx_bps().len(), s.tx_bps().len());
        }
        assert_eq!(s.len(), capacity);
    }
}

#[test]
fn test_full_series_evicts_exactly_the_oldest() {
    let mut s = InterfaceSeries::new(3);
    assert!(s.push("a", 1.0, 10.0).is_none());
    assert!(s.push("b", 2.0, 20.0).is_none());
    assert!(s.push("c", 3.0, 30.0).is_none());

    let evicted = s.push("d", 4.0, 40.0).unwrap();
    assert_eq!(evicted.label, "a");
    assert_eq!(evicted.rx_bps, 1.0);
    assert_eq!(evicted.tx_bps, 10.0);

    let labels: Vec<String> = s.samples().map(|x| x.label).collect();
    assert_eq!(labels, vec!["b", "c", "d"]);
    assert_eq!(s.rx_bps().iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_zero_capacity_holds_nothing() {
    let mut s = InterfaceSeries::new(0);
    assert!(s.push("a", 1.0, 1.0).is_none());
    assert!(s.is_empty());
}

#[test]
fn test_reset_creates_one_empty_series_per_name() {
    let mut set = SeriesSet::new(30);
    set.reset(["ether1", "ether2"]);
    set.apply_rates("t0", [("ether1", &rates(1.0, 1.0))]);
    assert_eq!(set.get("ether1").unwrap().len(), 1);

    set.reset(["ether3"]);
    assert_eq!(set.len(), 1);
    assert!(set.get("ether1").is_none());
    assert!(set.get("ether3").unwrap().is_empty());
}

#[test]
fn test_apply_rates_ignores_unknown_names() {
    let mut set = SeriesSet::new(30);
    set.reset(["ether1"]);
    let r = rates(5.0, 6.0);
    let applied = set.apply_rates("t0", [("ether1", &r), ("ether9", &r)]);
    assert_eq!(applied, 1);
    assert!(!set.contains("ether9"));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_thirty_one_updates_scenario() {
    let mut set = SeriesSet::new(DEFAULT_WINDOW_SIZE);
    set.reset(["ether1", "ether2"]);
    let r = rates(1_000_000.0, 500_000.0);
    for i in 0..31 {
        set.apply_rates(&format!("t{i}"), [("ether1", &r)]);
    }
    let ether1 = set.get("ether1").unwrap();
    assert_eq!(ether1.len(), 30);
    assert_eq!(ether1.labels().front().map(String::as_str), Some("t1"));
    assert_eq!(set.get("ether2").unwrap().len(), 0);
}

#[test]
fn test_iteration_follows_announcement_order() {
    let mut set = SeriesSet::new(4);
    set.reset(["wlan1", "ether1", "bridge"]);
    let names: Vec<&str> = set.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["wlan1", "ether1", "bridge"]);
}

#[test]
fn test_clear_empties_the_set() {
    let mut set = SeriesSet::new(4);
    set.reset(["ether1"]);
    set.clear();
    assert!(set.is_empty());
    assert_eq!(set.iter().count(), 0);
}
