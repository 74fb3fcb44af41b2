//! Property tests: constructed records survive a dump/load cycle.

use std::collections::BTreeMap;

use chrono::DateTime;
use json_model::{RecordDecl, Registry, TypeBuilder, Value};
use proptest::prelude::*;

fn registry() -> Registry {
    let t = TypeBuilder::new();
    let mut reg = Registry::new();
    reg.register(
        RecordDecl::new("Sample")
            .field("label", t.str())
            .field("count", t.int().with_default(0))
            .field("ratio", t.float())
            .field("history", "list[int]")
            .field("flags", "dict[str, bool]")
            .field("ids", "set[int]")
            .field("limit", t.optional(t.int()).with_default(Value::Null))
            .field("note", "Optional[str]")
            .field("stamp", "datetime")
            .field("blob", "bytes")
            .field("pair", "tuple[str, float]"),
    )
    .unwrap();
    reg
}

#[derive(Debug, Clone)]
struct Sample {
    label: String,
    count: i64,
    ratio: f64,
    history: Vec<i64>,
    flags: BTreeMap<String, bool>,
    ids: Vec<i64>,
    limit: Option<i32>,
    note: Option<String>,
    stamp_millis: i64,
    blob: Vec<u8>,
    pair: (String, f64),
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    (
        (any::<String>(), any::<i64>(), -1.0e6f64..1.0e6),
        (
            prop::collection::vec(any::<i64>(), 0..6),
            prop::collection::btree_map("[a-z]{1,6}", any::<bool>(), 0..4),
            prop::collection::vec(-5i64..5, 0..8),
        ),
        (
            proptest::option::of(any::<i32>()),
            proptest::option::of("[a-z]{0,8}"),
            0i64..4_000_000_000_000,
            prop::collection::vec(any::<u8>(), 0..16),
            ("[a-z ]{0,8}", -100.0f64..100.0),
        ),
    )
        .prop_map(
            |((label, count, ratio), (history, flags, ids), (limit, note, stamp_millis, blob, pair))| Sample {
                label,
                count,
                ratio,
                history,
                flags,
                ids,
                limit,
                note,
                stamp_millis,
                blob,
                pair,
            },
        )
}

fn values(s: Sample) -> Vec<(&'static str, Value)> {
    let stamp = DateTime::from_timestamp_millis(s.stamp_millis).expect("in range");
    vec![
        ("label", Value::Str(s.label)),
        ("count", Value::Int(s.count)),
        ("ratio", Value::Float(s.ratio)),
        ("history", Value::List(s.history.into_iter().map(Value::Int).collect())),
        (
            "flags",
            Value::Map(
                s.flags
                    .into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::Bool(v)))
                    .collect(),
            ),
        ),
        ("ids", Value::List(s.ids.into_iter().map(Value::Int).collect())),
        ("limit", s.limit.map_or(Value::Null, Value::from)),
        ("note", s.note.map_or(Value::Null, Value::Str)),
        ("stamp", Value::DateTime(stamp)),
        ("blob", Value::Bytes(s.blob)),
        ("pair", Value::Tuple(vec![Value::Str(s.pair.0), Value::Float(s.pair.1)])),
    ]
}

proptest! {
    #[test]
    fn dump_then_load_is_identity(sample in arb_sample()) {
        let reg = registry();
        let original = reg.construct("Sample", values(sample), false).unwrap();
        let dumped = reg.to_json(&original).unwrap();
        let loaded = reg.from_json("Sample", &dumped).unwrap();
        prop_assert_eq!(&loaded, &original);
        prop_assert_eq!(reg.to_json(&loaded).unwrap(), dumped);
    }

    #[test]
    fn construct_is_idempotent(sample in arb_sample()) {
        let reg = registry();
        let first = reg.construct("Sample", values(sample), false).unwrap();
        let again = reg
            .construct("Sample", first.clone().into_fields(), false)
            .unwrap();
        prop_assert_eq!(again, first);
    }

    #[test]
    fn sets_never_hold_duplicates(ids in prop::collection::vec(-3i64..3, 0..12)) {
        let reg = registry();
        let sample = Sample {
            label: String::new(),
            count: 0,
            ratio: 0.0,
            history: vec![],
            flags: BTreeMap::new(),
            ids,
            limit: None,
            note: None,
            stamp_millis: 0,
            blob: vec![],
            pair: (String::new(), 0.0),
        };
        let record = reg.construct("Sample", values(sample), false).unwrap();
        let held = record.get("ids").and_then(Value::as_items).unwrap();
        for (i, v) in held.iter().enumerate() {
            prop_assert!(!held[..i].contains(v));
        }
    }
}
