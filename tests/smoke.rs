//! Smoke tests -- verify the binary runs, rejects bad batches, and writes results.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn json_outputs(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect()
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("nettest")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("latency, throughput and jitter"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("nettest")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("nettest"));
}

#[test]
fn test_missing_input_argument_fails() {
    Command::cargo_bin("nettest").unwrap().assert().failure();
}

#[test]
fn test_unregistered_source_fails_before_running() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("lab.csv");
    let hosts = dir.path().join("hosts.toml");
    std::fs::write(
        &input,
        "#id_number,test_type,source,destination\n1,jitter,probe-z,10.0.0.1\n",
    )
    .unwrap();
    std::fs::write(&hosts, "[[hosts]]\nhostname = \"localhost\"\nusername = \"me\"\n").unwrap();

    Command::cargo_bin("nettest")
        .unwrap()
        .arg(&input)
        .arg(dir.path())
        .arg("--hostconfig")
        .arg(&hosts)
        .assert()
        .failure()
        .stderr(predicates::str::contains("probe-z"));

    assert!(json_outputs(dir.path()).is_empty());
}

#[test]
fn test_invalid_rows_fail_before_running() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("lab.csv");
    let hosts = dir.path().join("hosts.toml");
    std::fs::write(
        &input,
        "#id_number,test_type,source,destination,size\n1,throughput,localhost,10.0.0.1,\n2,bogus,localhost,10.0.0.2,\n",
    )
    .unwrap();
    std::fs::write(&hosts, "[[hosts]]\nhostname = \"localhost\"\nusername = \"me\"\n").unwrap();

    Command::cargo_bin("nettest")
        .unwrap()
        .arg(&input)
        .arg(dir.path())
        .arg("-c")
        .arg(&hosts)
        .assert()
        .failure()
        .stderr(
            predicates::str::contains("line 2: size is required")
                .and(predicates::str::contains("line 3: unknown test_type 'bogus'")),
        );

    assert!(json_outputs(dir.path()).is_empty());
}

#[test]
fn test_unloadable_config_env_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("lab.csv");
    std::fs::write(
        &input,
        "#id_number,test_type,source,destination\n1,jitter,localhost,10.0.0.1\n",
    )
    .unwrap();

    Command::cargo_bin("nettest")
        .unwrap()
        .arg(&input)
        .arg(dir.path())
        .env("NETTEST_CONFIG", dir.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("NETTEST_CONFIG"));

    assert!(json_outputs(dir.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn test_local_latency_run_with_stub_ping() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::TempDir::new().unwrap();
    let stub = dir.path().join("fake-ping");
    std::fs::write(
        &stub,
        "#!/bin/sh\n\
         echo \"--- $7 ping statistics ---\"\n\
         echo '4 packets transmitted, 3 received, 25% packet loss, time 600ms' >&2\n\
         echo 'rtt min/avg/max/mdev = 1.000/2.000/3.000/0.500 ms'\n",
    )
    .unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = dir.path().join("nettest.toml");
    std::fs::write(&config, format!("[probes]\nping_path = \"{}\"\n", stub.display())).unwrap();
    let input = dir.path().join("lab.csv");
    std::fs::write(
        &input,
        "#id_number,test_type,source,destination,count\n1,latency,localhost,10.9.9.9,4\n",
    )
    .unwrap();
    let hosts = dir.path().join("hosts.toml");
    std::fs::write(&hosts, "[[hosts]]\nhostname = \"localhost\"\nusername = \"me\"\n").unwrap();

    Command::cargo_bin("nettest")
        .unwrap()
        .arg(&input)
        .arg(dir.path())
        .arg("-c")
        .arg(&hosts)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicates::str::contains("Test ID 1 (src: 'localhost', dst: '10.9.9.9'): Success"));

    let outputs = json_outputs(dir.path());
    assert_eq!(outputs.len(), 1);
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&outputs[0]).unwrap()).unwrap();
    let lat = &doc["latency_tests"][0];
    assert_eq!(lat["avg_rtt"], "2.000");
    assert_eq!(lat["packets_sent"], 4);
    assert_eq!(lat["packets_received"], 3);
    assert_eq!(lat["packet_loss_percent"], 25.0);
    assert!(dir.path().join("lab.log").exists());
}
