//! Enum members, temporal values, bytes and patterns on the wire.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use json_model::{
    EnumDef, IsoCodec, RecordDecl, Registry, SchemaDefinitionError, TemporalCodec, TypeBuilder,
    Value,
};
use json_model_temporal::{TemporalError, TemporalInput};
use serde_json::json;

fn t() -> TypeBuilder {
    TypeBuilder::new()
}

fn registry() -> Registry {
    let mut reg = Registry::new();
    reg.register_enum(
        EnumDef::general("Color")
            .member("RED", "red")
            .member("GREEN", "green")
            .member("BLUE", "blue"),
    )
    .unwrap();
    reg.register_enum(EnumDef::int("Status").member("ACTIVE", 1).member("INACTIVE", 0))
        .unwrap();
    let permissions = reg
        .register_enum(
            EnumDef::flag("Permissions")
                .member("READ", 1)
                .member("WRITE", 2)
                .member("EXECUTE", 4),
        )
        .unwrap();
    reg.register(
        RecordDecl::new("ModelWithEnums")
            .field("color", "Color")
            .field("status", "Status")
            .field("permissions", t().enum_(Arc::clone(&permissions))),
    )
    .unwrap();
    reg.register(
        RecordDecl::new("ModelWithComplexTypes")
            .field("dt", "datetime")
            .field("d", "date")
            .field("t", "time")
            .field("td", "timedelta")
            .field("b", "bytes")
            .field("p", "Pattern"),
    )
    .unwrap();
    reg
}

fn enums_payload() -> serde_json::Value {
    json!({"__name": "ModelWithEnums", "color": "RED", "status": 1, "permissions": 3})
}

fn complex_payload() -> serde_json::Value {
    json!({
        "__name": "ModelWithComplexTypes",
        "dt": "2023-10-27T10:30:00.000Z",
        "d": "2023-10-27",
        "t": "10:30:00.000",
        "td": 93_784_000,
        "b": "dGVzdF9ieXRlcw==",
        "p": "^\\d+$"
    })
}

#[test]
fn enums_round_trip() {
    let reg = registry();
    let model = reg.from_json("ModelWithEnums", &enums_payload()).unwrap();
    let color = model.get("color").and_then(Value::as_enum).unwrap();
    assert_eq!((color.enum_name.as_str(), color.name.as_str()), ("Color", "RED"));
    let status = model.get("status").and_then(Value::as_enum).unwrap();
    assert_eq!(status.name, "ACTIVE");
    let perms = model.get("permissions").and_then(Value::as_enum).unwrap();
    assert_eq!(perms.bits(), Some(3));
    assert_eq!(reg.to_json(&model).unwrap(), enums_payload());
}

#[test]
fn general_enum_accepts_member_values() {
    let reg = registry();
    let mut payload = enums_payload();
    payload["color"] = json!("blue");
    let model = reg.from_json("ModelWithEnums", &payload).unwrap();
    assert_eq!(reg.to_json(&model).unwrap()["color"], json!("BLUE"));
}

#[test]
fn unknown_enum_values_are_rejected() {
    let reg = registry();
    for (field, bad) in [
        ("color", json!("PURPLE")),
        ("status", json!(99)),
        ("status", json!("PENDING")),
        ("permissions", json!(8)),
    ] {
        let mut payload = enums_payload();
        payload[field] = bad.clone();
        let err = reg.from_json("ModelWithEnums", &payload).unwrap_err();
        assert!(err.to_string().contains(field), "{bad}: {err}");
    }
}

#[test]
fn invalid_enum_declarations() {
    let mut reg = registry();
    assert!(matches!(
        reg.register_enum(EnumDef::int("Broken").member("A", "a")),
        Err(SchemaDefinitionError::InvalidEnum { .. })
    ));
    assert!(reg.register_enum(EnumDef::general("Empty")).is_err());
    assert!(reg
        .register_enum(EnumDef::general("Twice").member("A", 1).member("A", 2))
        .is_err());
    assert_eq!(
        reg.register_enum(EnumDef::general("Color").member("X", 1)).unwrap_err(),
        SchemaDefinitionError::DuplicateType("Color".into())
    );
}

#[test]
fn complex_types_round_trip() {
    let reg = registry();
    let model = reg
        .from_json("ModelWithComplexTypes", &complex_payload())
        .unwrap();

    assert_eq!(
        model.get("dt").and_then(Value::as_datetime),
        Some(Utc.with_ymd_and_hms(2023, 10, 27, 10, 30, 0).unwrap())
    );
    assert_eq!(
        model.get("d").and_then(Value::as_date),
        NaiveDate::from_ymd_opt(2023, 10, 27)
    );
    let expected_td = TimeDelta::days(1)
        + TimeDelta::hours(2)
        + TimeDelta::minutes(3)
        + TimeDelta::seconds(4);
    assert_eq!(model.get("td").and_then(Value::as_duration), Some(expected_td));
    assert_eq!(model.get("b").and_then(Value::as_bytes), Some(&b"test_bytes"[..]));
    let pattern = model.get("p").and_then(Value::as_pattern).unwrap();
    assert!(pattern.is_match("12345"));
    assert!(!pattern.is_match("12a45"));

    assert_eq!(reg.to_json(&model).unwrap(), complex_payload());
}

#[test]
fn temporal_inputs_are_lenient() {
    let reg = registry();
    let mut payload = complex_payload();
    payload["dt"] = json!(1_698_402_600);
    payload["td"] = json!("days=1,hours=2,minutes=3,seconds=4");
    payload["t"] = json!("10:30:00");
    let model = reg.from_json("ModelWithComplexTypes", &payload).unwrap();
    assert_eq!(reg.to_json(&model).unwrap(), complex_payload());

    payload["dt"] = json!("2023-10-27T12:30:00+02:00");
    let model = reg.from_json("ModelWithComplexTypes", &payload).unwrap();
    assert_eq!(reg.to_json(&model).unwrap()["dt"], json!("2023-10-27T10:30:00.000Z"));
}

#[test]
fn invalid_complex_values() {
    let reg = registry();
    for (field, bad) in [
        ("dt", json!("not-a-date")),
        ("d", json!("2023-13-45")),
        ("td", json!("1 day")),
        ("b", json!("not base64!")),
        ("p", json!("[")),
    ] {
        let mut payload = complex_payload();
        payload[field] = bad.clone();
        let err = reg.from_json("ModelWithComplexTypes", &payload).unwrap_err();
        assert!(err.to_string().contains(field), "{bad}: {err}");
    }
}

#[test]
fn typed_values_pass_through_construct() {
    let reg = registry();
    let red = reg.enum_def("Color").and_then(|c| c.value_of("RED")).unwrap();
    let model = reg
        .construct(
            "ModelWithComplexTypes",
            [
                ("dt", Value::from(Utc.with_ymd_and_hms(2023, 10, 27, 10, 30, 0).unwrap())),
                ("d", Value::from(NaiveDate::from_ymd_opt(2023, 10, 27).unwrap())),
                ("t", Value::from("10:30:00.000")),
                ("td", Value::from(TimeDelta::milliseconds(93_784_000))),
                ("b", Value::from(b"test_bytes".to_vec())),
                ("p", Value::from("^\\d+$")),
            ],
            false,
        )
        .unwrap();
    assert_eq!(reg.to_json(&model).unwrap(), complex_payload());

    let err = reg
        .construct(
            "ModelWithComplexTypes",
            [
                ("dt", Value::from(red)),
                ("d", Value::from("2023-10-27")),
                ("t", Value::from("10:30:00")),
                ("td", Value::Int(0)),
                ("b", Value::from("")),
                ("p", Value::from(".*")),
            ],
            false,
        )
        .unwrap_err();
    assert!(err.to_string().contains("'dt'"), "{err}");
}

/// Day-first dates, everything else as ISO.
struct DayFirstCodec(IsoCodec);

impl TemporalCodec for DayFirstCodec {
    fn parse_datetime(&self, input: TemporalInput<'_>) -> Result<DateTime<Utc>, TemporalError> {
        self.0.parse_datetime(input)
    }

    fn parse_date(&self, input: TemporalInput<'_>) -> Result<NaiveDate, TemporalError> {
        match input {
            TemporalInput::Str(s) => NaiveDate::parse_from_str(s, "%d/%m/%Y").map_err(|_| {
                TemporalError::Unparseable {
                    target: "date",
                    input: s.to_string(),
                }
            }),
            other => self.0.parse_date(other),
        }
    }

    fn parse_time(&self, input: TemporalInput<'_>) -> Result<NaiveTime, TemporalError> {
        self.0.parse_time(input)
    }

    fn parse_duration(&self, input: TemporalInput<'_>) -> Result<TimeDelta, TemporalError> {
        self.0.parse_duration(input)
    }

    fn stringify_datetime(&self, value: &DateTime<Utc>) -> String {
        self.0.stringify_datetime(value)
    }

    fn stringify_date(&self, value: &NaiveDate) -> String {
        value.format("%d/%m/%Y").to_string()
    }

    fn stringify_time(&self, value: &NaiveTime) -> String {
        self.0.stringify_time(value)
    }

    fn duration_to_millis(&self, value: &TimeDelta) -> i64 {
        self.0.duration_to_millis(value)
    }
}

#[test]
fn injected_codec_controls_wire_forms() {
    let mut reg = Registry::with_codec(Arc::new(DayFirstCodec(IsoCodec::new())));
    reg.register(RecordDecl::new("Event").field("on", "date")).unwrap();
    let event = reg
        .from_json("Event", &json!({"__name": "Event", "on": "27/10/2023"}))
        .unwrap();
    assert_eq!(
        event.get("on").and_then(Value::as_date),
        NaiveDate::from_ymd_opt(2023, 10, 27)
    );
    assert_eq!(reg.to_json(&event).unwrap()["on"], json!("27/10/2023"));
    assert!(reg
        .from_json("Event", &json!({"__name": "Event", "on": "2023-10-27"}))
        .is_err());
}
