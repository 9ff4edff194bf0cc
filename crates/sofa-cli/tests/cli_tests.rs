use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn sofa_cli() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("sofa-cli").unwrap()
}

#[test]
fn decode_prints_canonical_form() {
    sofa_cli()
        .arg("decode")
        .arg(r#"SOFA::PaymentRequest:{"value":"0x00DE0B6B3A7640000","destinationAddress":"0xabc"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"PaymentRequest""#))
        .stdout(predicate::str::contains("0xde0b6b3a7640000"));
}

#[test]
fn decode_reads_stdin() {
    sofa_cli()
        .arg("decode")
        .write_stdin("SOFA::InitRequest:{\"values\":[\"language\"]}\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""handshake":true"#));
}

#[test]
fn decode_rejects_unknown_type() {
    sofa_cli()
        .arg("decode")
        .arg("SOFA::Sticker:{}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown SOFA type `Sticker`"));
}

#[test]
fn encode_validates_body() {
    sofa_cli()
        .args(["encode", "--type", "Command", "--json", r#"{"value":"yes"}"#])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SOFA::Command:"));

    sofa_cli()
        .args(["encode", "--type", "Payment", "--json", r#"{"value":"12"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`value`"));
}

#[test]
fn project_prints_items() {
    let dir = tempdir().unwrap();
    let transcript = dir.path().join("chat.txt");
    fs::write(
        &transcript,
        concat!(
            "> SOFA::Message:{\"body\":\"hi\"}\n",
            "> SOFA::Message:{\"body\":\"you there?\"}\n",
            "< SOFA::InitRequest:{\"values\":[\"language\"]}\n",
            "< SOFA::PaymentRequest:{\"value\":\"0x1\",\"destinationAddress\":\"0xabc\"}\n",
            "< not even close\n",
        ),
    )
    .unwrap();

    let output = sofa_cli()
        .arg("project")
        .arg("--transcript")
        .arg(&transcript)
        .output()
        .unwrap();
    assert!(output.status.success());
    let items: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["groupPosition"], "top");
    assert_eq!(items[1]["groupPosition"], "bottom");
    assert_eq!(items[2]["kind"], "paymentRequest");
    assert_eq!(items[2]["isActionable"], true);
    assert_eq!(items[2]["paymentState"], "none");
}

fn project_with_store(transcript: &std::path::Path, store: &std::path::Path) -> Vec<serde_json::Value> {
    let output = sofa_cli()
        .arg("project")
        .arg("--transcript")
        .arg(transcript)
        .arg("--store")
        .arg(store)
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn project_sees_states_set_by_transition() {
    let dir = tempdir().unwrap();
    let transcript = dir.path().join("chat.txt");
    let store = dir.path().join("payments.json");
    fs::write(
        &transcript,
        concat!(
            "< SOFA::Message:{\"body\":\"lunch?\"}\n",
            "< SOFA::PaymentRequest:{\"value\":\"0x1\",\"destinationAddress\":\"0xabc\"}\n",
        ),
    )
    .unwrap();

    let items = project_with_store(&transcript, &store);
    assert_eq!(items[1]["id"], "line-2");
    assert_eq!(items[1]["paymentState"], "none");

    sofa_cli()
        .args(["transition", "--message", "line-2", "--event", "decline"])
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout("rejected\n");

    for _ in 0..2 {
        let items = project_with_store(&transcript, &store);
        assert_eq!(items[1]["paymentState"], "rejected");
        assert_eq!(items[1]["isActionable"], false);
    }
    let saved: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(saved.len(), 1);
}

#[test]
fn transition_on_bare_state() {
    sofa_cli()
        .args(["transition", "--state", "none", "--event", "approve"])
        .assert()
        .success()
        .stdout("pendingConfirmation\n");

    sofa_cli()
        .args(["transition", "--state", "approved", "--event", "decline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already approved"));
}

#[test]
fn transition_persists_to_store() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("payments.json");
    for (event, expected) in [
        ("approve", "pendingConfirmation\n"),
        ("broadcastSucceeded", "approved\n"),
    ] {
        sofa_cli()
            .arg("transition")
            .args(["--message", "req-1", "--event", event])
            .arg("--store")
            .arg(&store)
            .assert()
            .success()
            .stdout(expected);
    }
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(saved["req-1"], "approved");
}

#[test]
fn bad_config_is_reported() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("settings.json");
    fs::write(&config, "{").unwrap();
    sofa_cli()
        .arg("--config")
        .arg(&config)
        .args(["transition", "--state", "none", "--event", "approve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading settings"));
}
