mod common;

use common::{code, date, ScriptedSource};
use ratewatch_core::data::RateStore;
use ratewatch_core::domain::TrackedCurrencies;
use ratewatch_core::reconcile_all;
use tempfile::TempDir;

#[test]
fn committed_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rates.db");
    let usd = code("USD");

    {
        let mut store = RateStore::open(&path).unwrap();
        assert!(store.insert(&usd, "dolar", Some(3.9), Some(4.0), date(2024, 6, 3)).unwrap());
        store.commit().unwrap();
    }

    let store = RateStore::open(&path).unwrap();
    assert_eq!(store.count(Some(&usd)).unwrap(), 1);
    assert!(store.exists(&usd, date(2024, 6, 3)).unwrap());
}

#[test]
fn uncommitted_rows_are_discarded_on_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rates.db");
    let usd = code("USD");

    {
        let mut store = RateStore::open(&path).unwrap();
        store.insert(&usd, "dolar", Some(3.9), Some(4.0), date(2024, 6, 3)).unwrap();
        store.commit().unwrap();
        store.insert(&usd, "dolar", Some(3.9), Some(4.0), date(2024, 6, 4)).unwrap();
        assert!(store.has_pending_writes());
    }

    let store = RateStore::open(&path).unwrap();
    assert_eq!(store.count(None).unwrap(), 1);
    assert_eq!(store.latest_date(&usd).unwrap(), Some(date(2024, 6, 3)));
}

#[test]
fn reconcile_results_are_durable_and_reopen_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested.db");
    let source = ScriptedSource::new(&["USD", "EUR"]).published_from(date(2024, 6, 3));
    let tracked = TrackedCurrencies::new(vec![code("USD"), code("EUR")]);
    let today = date(2024, 6, 14);

    let first = {
        let mut store = RateStore::open(&path).unwrap();
        reconcile_all(&mut store, &source, &tracked, today).unwrap()
    };
    assert_eq!(first.stored_count, 20);

    let mut store = RateStore::open(&path).unwrap();
    assert_eq!(store.count(None).unwrap(), 20);
    assert_eq!(
        store.distinct_currencies().unwrap(),
        vec!["EUR".to_string(), "USD".to_string()]
    );

    let second = reconcile_all(&mut store, &source, &tracked, today).unwrap();
    assert_eq!(second.stored_count, 0);
    assert_eq!(store.count(None).unwrap(), 20);
}
