use qnap_exporter::qnap::types::*;
use serde_json::json;

const LOGIN_OK: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<QDocRoot version="1.0">
<doQuick><![CDATA[]]></doQuick>
<is_booting><![CDATA[0]]></is_booting>
<authPassed><![CDATA[1]]></authPassed>
<authSid><![CDATA[xk4kqdr3]]></authSid>
<username><![CDATA[monitor]]></username>
</QDocRoot>"#;

const LOGIN_REJECTED: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<QDocRoot version="1.0">
<authPassed><![CDATA[0]]></authPassed>
<errorValue><![CDATA[-1]]></errorValue>
</QDocRoot>"#;

#[test]
fn test_deserialize_login_response() {
    let auth: AuthResponse = quick_xml::de::from_str(LOGIN_OK).expect("Failed to parse login");
    assert!(auth.passed());
    assert_eq!(auth.auth_sid, "xk4kqdr3");
}

#[test]
fn test_deserialize_rejected_login() {
    let auth: AuthResponse =
        quick_xml::de::from_str(LOGIN_REJECTED).expect("Failed to parse login");
    assert!(!auth.passed());
    assert!(auth.auth_sid.is_empty());
}

#[test]
fn test_unparseable_auth_flag_does_not_block_login() {
    // Given: A login document with a session id but an empty or odd authPassed
    for flag in ["<![CDATA[]]>", "<![CDATA[yes]]>"] {
        let xml = format!(
            "<QDocRoot><authPassed>{}</authPassed><authSid><![CDATA[abc]]></authSid></QDocRoot>",
            flag
        );

        // When: Parsing it
        let auth: AuthResponse = quick_xml::de::from_str(&xml).expect("Failed to parse login");

        // Then: The session id is still available
        assert_eq!(auth.auth_sid, "abc");
        assert!(!auth.passed());
    }
}

#[test]
fn test_deserialize_volume_tree() {
    let json = json!([
        {
            "volume_name": "DataVol1",
            "volume_id": 1,
            "free_size": "1.52",
            "used_size": "420.75",
            "capacity": "3.58",
            "volume_unit": "TB",
            "volume_free_unit": "TB",
            "unit": "GB",
            "cls": "w"
        },
        {
            "volume_name": "Backup",
            "free_size": 900,
            "used_size": 100,
            "capacity": 1000,
            "volume_unit": "GB",
            "volume_free_unit": "GB",
            "unit": "GB"
        }
    ]);

    let volumes: Vec<Volume> = serde_json::from_value(json).expect("Failed to parse volumes");
    assert_eq!(volumes.len(), 2);
    assert_eq!(volumes[0].volume_name, "DataVol1");
    assert_eq!(volumes[0].free_size, 1.52);
    assert_eq!(volumes[0].used_size, 420.75);
    assert_eq!(volumes[0].unit, "GB");
    assert_eq!(volumes[1].capacity, 1000.0);
    assert!(volumes[1].volume_id.is_none());
}

#[test]
fn test_non_numeric_size_rejects_the_fetch() {
    let json = json!([{
        "volume_name": "DataVol1",
        "free_size": "n/a",
        "used_size": "1",
        "capacity": "2"
    }]);

    assert!(serde_json::from_value::<Vec<Volume>>(json).is_err());
}

#[test]
fn test_deserialize_session_status() {
    let alive: SessionStatus = serde_json::from_value(json!({"status": 1})).unwrap();
    let dead: SessionStatus = serde_json::from_value(json!({"status": 0})).unwrap();
    let missing: SessionStatus = serde_json::from_value(json!({"success": "true"})).unwrap();

    assert!(alive.is_alive());
    assert!(!dead.is_alive());
    assert!(!missing.is_alive());
}

#[test]
fn test_non_numeric_session_status_parses_as_not_live() {
    for body in [r#"{"status":"0"}"#, r#"{"status":"1"}"#, r#"{"status":true}"#] {
        let status: SessionStatus = serde_json::from_str(body).expect("Failed to parse status");
        assert!(status.status.is_some());
        assert!(!status.is_alive(), "{} should not be live", body);
    }
}

#[test]
fn test_float_session_status_is_live() {
    let status: SessionStatus = serde_json::from_str(r#"{"status":1.0}"#).unwrap();
    assert!(status.is_alive());
}
