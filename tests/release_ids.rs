// tests/release_ids.rs

use chrono::{TimeZone, Utc};
use rollout::release::{Layout, Release, ReleaseId};
use rollout::types::ReleaseState;

#[test]
fn id_is_the_utc_timestamp_without_separators() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
    assert_eq!(ReleaseId::generate(now, None).as_str(), "20261018090507");
}

#[test]
fn id_is_bumped_past_the_newest_existing_release() {
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 7).unwrap();
    let same = ReleaseId::from_time(now);
    let later: ReleaseId = "20261018100000".parse().unwrap();

    assert_eq!(ReleaseId::generate(now, Some(&same)).as_str(), "20261018090508");
    // A clock that went backwards still yields an increasing id.
    assert_eq!(ReleaseId::generate(now, Some(&later)).as_str(), "20261018100001");

    let older: ReleaseId = "20261017000000".parse().unwrap();
    assert_eq!(ReleaseId::generate(now, Some(&older)).as_str(), "20261018090507");
}

#[test]
fn only_fourteen_digit_timestamps_parse() {
    assert!(ReleaseId::parse("20261018090507").is_some());
    for bad in [
        "current",
        "storage",
        ".env",
        ".env-20261018090507.bak",
        "2026101809050",
        "202610180905070",
        "20261318090507",
        "2026101809050a",
    ] {
        assert!(ReleaseId::parse(bad).is_none(), "{bad} is not a release");
    }
}

#[test]
fn order_of_ids_is_creation_order() {
    let mut ids: Vec<ReleaseId> = ["20261018090507", "20251231235959", "20261018090506"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    ids.sort();
    let sorted: Vec<&str> = ids.iter().map(ReleaseId::as_str).collect();
    assert_eq!(sorted, ["20251231235959", "20261018090506", "20261018090507"]);
}

#[test]
fn layout_paths_hang_off_the_target_root() {
    let layout = Layout::new("apps/shop");
    let id: ReleaseId = "20261018090507".parse().unwrap();

    assert_eq!(layout.release(&id).to_str(), Some("apps/shop/20261018090507"));
    assert_eq!(layout.current().to_str(), Some("apps/shop/current"));
    assert_eq!(
        layout.env_backup(&id).to_str(),
        Some("apps/shop/.env-20261018090507.bak")
    );
    assert_eq!(
        layout.release_cache(&id).to_str(),
        Some("apps/shop/20261018090507/bootstrap/cache")
    );
    assert_eq!(
        Layout::release_from_link("/home/deploy/apps/shop/20261018090507".as_ref()),
        Some(id.clone())
    );
    assert_eq!(Layout::release_from_link("20261018090507".as_ref()), Some(id));
    assert_eq!(Layout::release_from_link("elsewhere".as_ref()), None);
}

#[test]
fn new_releases_start_staged() {
    let id: ReleaseId = "20261018090507".parse().unwrap();

    assert_eq!(ReleaseState::default(), ReleaseState::Staged);
    assert_eq!(Release::staged(id.clone()).state, ReleaseState::default());
    assert_eq!("retired".parse::<ReleaseState>().unwrap(), ReleaseState::Retired);
}
