use native_bridge_core::{FromHost, HostValue, IntoHost};

#[test]
fn host_values_use_tagged_wire_shape() {
    let value = HostValue::List(vec![HostValue::Int(5), HostValue::from("x"), HostValue::None]);
    let json = serde_json::to_value(&value).expect("serialize host value");
    assert_eq!(
        json,
        serde_json::json!({
            "type": "list",
            "value": [
                {"type": "int", "value": 5},
                {"type": "str", "value": "x"},
                {"type": "none"}
            ]
        })
    );

    let decoded: HostValue = serde_json::from_value(json).expect("deserialize host value");
    assert_eq!(decoded, value);
}

#[test]
fn string_and_bool_conversions_are_strict() {
    assert_eq!(
        String::from_host(&HostValue::from("hello")),
        Ok("hello".to_string())
    );
    assert!(String::from_host(&HostValue::Int(1)).is_err());
    assert!(bool::from_host(&HostValue::Int(0)).is_err());
    assert_eq!(true.into_host(), Ok(HostValue::Bool(true)));
    assert_eq!(().into_host(), Ok(HostValue::None));
}

#[test]
fn nested_lists_round_trip() {
    let host = HostValue::List(vec![
        HostValue::List(vec![HostValue::Int(1), HostValue::Int(2)]),
        HostValue::List(vec![]),
    ]);
    let native = Vec::<Vec<u16>>::from_host(&host).expect("nested list converts");
    assert_eq!(native, vec![vec![1, 2], vec![]]);
    assert_eq!(native.into_host(), Ok(host));
}
