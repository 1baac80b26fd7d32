#![cfg(feature = "serde")]

//! A settings file saved as pretty JSON and loaded back through records.

use na_json::{Fields, Record, bind, bind_record, pretty_print, to_value};
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
struct Pipe {
    #[serde(rename = "In")]
    input: Vec<String>,
    #[serde(rename = "Out")]
    output: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsBase {
    info: String,
    #[serde(rename = "JSONFormatting")]
    json_formatting: bool,
    timestamp: String,
    #[serde(rename = "LastWebsocketURL")]
    last_websocket_url: String,
    last_actions: Vec<String>,
    ping_seconds: i64,
    pipe: Pipe,
}

/// Runtime state around the persisted part.
#[derive(Debug, Default)]
struct Settings {
    base: SettingsBase,
    dirty: bool,
}

impl Record for Pipe {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("input", |p| &mut p.input).rename("In");
        fields.field("output", |p| &mut p.output).rename("Out");
    }
}

impl Record for SettingsBase {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("info", |s| &mut s.info).rename("Info");
        fields
            .field("json_formatting", |s| &mut s.json_formatting)
            .rename("JSONFormatting");
        fields.field("timestamp", |s| &mut s.timestamp).rename("Timestamp");
        fields
            .field("last_websocket_url", |s| &mut s.last_websocket_url)
            .rename("LastWebsocketURL");
        fields
            .field("last_actions", |s| &mut s.last_actions)
            .rename("LastActions");
        fields
            .field("ping_seconds", |s| &mut s.ping_seconds)
            .rename("PingSeconds");
        fields.field("pipe", |s| &mut s.pipe).rename("Pipe");
    }
}

impl Record for Settings {
    fn describe(fields: &mut Fields<Self>) {
        fields.embed(|s| &mut s.base);
        fields.field("dirty", |s| &mut s.dirty).skip();
    }
}

bind_record!(Pipe, SettingsBase, Settings);

fn save(base: &SettingsBase) -> Vec<u8> {
    to_value(base).unwrap().to_pretty_vec("\t").unwrap()
}

fn load(data: &[u8]) -> Settings {
    let mut settings = Settings::default();
    bind(data, &mut settings).unwrap();
    settings
}

// Pretty prints a message, falling back to the raw text
fn format_message(msg: &str) -> String {
    pretty_print(msg.as_bytes(), "\t").unwrap_or_else(|_| msg.to_owned())
}

fn sample() -> SettingsBase {
    SettingsBase {
        info: "configuration file".into(),
        json_formatting: true,
        timestamp: "15:04:05".into(),
        last_websocket_url: "wss://echo.example/ws".into(),
        last_actions: vec!["c".into(), "j".into()],
        ping_seconds: 30,
        pipe: Pipe {
            input: vec!["jq .".into()],
            output: vec![],
        },
    }
}

#[test]
fn test_saved_layout() {
    let saved = String::from_utf8(save(&sample())).unwrap();
    assert_eq!(
        saved,
        r#"{
	"Info": "configuration file",
	"JSONFormatting": true,
	"Timestamp": "15:04:05",
	"LastWebsocketURL": "wss://echo.example/ws",
	"LastActions": [
		"c",
		"j"
	],
	"PingSeconds": 30,
	"Pipe": {
		"In": ["jq ."],
		"Out": []
	}
}"#
    );
}

#[test]
fn test_round_trip() {
    let base = sample();
    let settings = load(&save(&base));
    assert_eq!(settings.base, base);
    assert!(!settings.dirty);
}

#[test]
fn test_load_partial_file() {
    let settings = load(br#"{"PingSeconds":5,"Pipe":{"Out":["tee log"]},"Unknown":[1,2]}"#);
    assert_eq!(settings.base.ping_seconds, 5);
    assert_eq!(settings.base.pipe.output, ["tee log"]);
    assert!(settings.base.pipe.input.is_empty());
    assert!(settings.base.info.is_empty());
}

#[test]
fn test_update_single_field() {
    let mut settings = load(&save(&sample()));
    settings.base.last_actions.insert(0, "q".into());
    settings.dirty = true;

    let reloaded = load(&save(&settings.base));
    assert_eq!(reloaded.base.last_actions, ["q", "c", "j"]);
    assert_eq!(reloaded.base.ping_seconds, 30);
}

#[test]
fn test_message_formatting() {
    assert_eq!(
        format_message(r#"{"op":"hello","d":[1,2]}"#),
        "{\n\t\"op\": \"hello\",\n\t\"d\": [\n\t\t1,\n\t\t2\n\t]\n}"
    );
    assert_eq!(format_message("plain text"), "plain text");
    assert_eq!(format_message(""), "");
}
