#![cfg(feature = "cli")]

use std::io::Read;
use std::process::{Command, Output};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};
use tiny_http::{Response, Server};

struct Recorded {
    method: String,
    url: String,
    body: String,
}

/// A stand-in gateway answering each request with the next scripted reply.
fn scripted_gateway(replies: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<Recorded>>) {
    let server = Server::http("127.0.0.1:0").expect("test gateway should bind");
    let port = server
        .server_addr()
        .to_ip()
        .expect("test gateway should have an ip address")
        .port();
    let handle = thread::spawn(move || {
        let mut recorded = Vec::new();
        for (status, reply) in replies {
            let Some(mut request) = server
                .recv_timeout(Duration::from_secs(10))
                .expect("test gateway should receive")
            else {
                break;
            };
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("request body should be readable");
            recorded.push(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body,
            });
            request
                .respond(Response::from_string(reply).with_status_code(status))
                .expect("test gateway should respond");
        }
        recorded
    });
    (format!("http://127.0.0.1:{port}"), handle)
}

fn io_reply(batches: Value) -> (u16, String) {
    let batch_responses: Vec<Value> = batches
        .as_array()
        .expect("batches should be an array")
        .iter()
        .map(|commands| json!({ "command_responses": commands }))
        .collect();
    (200, json!({ "data": { "batch_responses": batch_responses } }).to_string())
}

fn bundle_ok() -> (u16, String) {
    io_reply(json!([[{ "Ok": [] }, { "Ok": [0] }]]))
}

fn gattbus(url: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gattbus"))
        .arg("--gateway-url")
        .arg(url)
        .arg("--log-level")
        .arg("error")
        .arg("--format")
        .arg("json")
        .args(args)
        .output()
        .expect("gattbus should run")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

/// Control frames written to the data bundle characteristic, in request order.
fn bundle_frames(recorded: &[Recorded]) -> Vec<Vec<u8>> {
    recorded
        .iter()
        .filter_map(|r| serde_json::from_str::<Value>(&r.body).ok())
        .filter_map(|body| {
            body["batches"][0]["commands"][0]["Write"]["value"]
                .as_array()
                .map(|bytes| bytes.iter().map(|b| b.as_u64().unwrap() as u8).collect())
        })
        .collect()
}

#[test]
fn adapters_lists_gateway_adapters() {
    let (url, gateway) = scripted_gateway(vec![(
        200,
        json!({ "data": [{ "id": "hci0", "modalias": "usb:v1D6Bp0246" }] }).to_string(),
    )]);

    let output = gattbus(&url, &["adapters"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)[0]["id"], "hci0");

    let recorded = gateway.join().unwrap();
    assert_eq!(recorded[0].method, "GET");
    assert_eq!(recorded[0].url, "/ble/adapters");
}

#[test]
fn describe_filters_by_peripheral_address() {
    let peripheral = |address: &str| {
        json!({
            "id": format!("hci0/dev_{}", address.replace(':', "_")),
            "address": address,
            "props": null,
            "services": []
        })
    };
    let (url, gateway) = scripted_gateway(vec![(
        200,
        json!({
            "data": [{
                "adapter_info": { "id": "hci0", "modalias": "usb:v1D6B" },
                "peripherals": [peripheral("FA:6F:EC:EE:4B:36"), peripheral("C4:7C:8D:6A:11:02")]
            }]
        })
        .to_string(),
    )]);

    let output = gattbus(&url, &["describe", "--peripheral", "c4:7c:8d:6a:11:02"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let peripherals = &stdout_json(&output)[0]["peripherals"];
    assert_eq!(peripherals.as_array().map(Vec::len), Some(1));
    assert_eq!(peripherals[0]["address"], "C4:7C:8D:6A:11:02");

    let recorded = gateway.join().unwrap();
    assert_eq!(recorded[0].url, "/ble/adapters/describe");
}

#[test]
fn scan_reports_devices_and_releases_lock() {
    let (url, gateway) = scripted_gateway(vec![
        bundle_ok(),
        io_reply(json!([[{ "Ok": [0, 68, 0, 118] }]])),
        bundle_ok(),
    ]);

    let output = gattbus(&url, &["--adapter", "hci1", "scan", "FA:6F:EC:EE:4B:36"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let out = stdout_json(&output);
    assert_eq!(out["peripheral"], "FA:6F:EC:EE:4B:36");
    assert_eq!(out["addresses"], json!([68, 118]));

    let recorded = gateway.join().unwrap();
    assert!(recorded
        .iter()
        .all(|r| r.method == "POST" && r.url == "/ble/adapters/hci1/io"));
    let frames = bundle_frames(&recorded);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0][0], 0xDF);
    assert_eq!(frames[0][7], 3);
    // lock-only frame, released
    assert_eq!(frames[1][0], 0x86);
    assert_eq!(frames[1][2], 0);
}

#[test]
fn write_read_prints_hex_data() {
    let (url, gateway) = scripted_gateway(vec![
        bundle_ok(),
        io_reply(json!([[{ "Ok": [128, 0, 162, 0, 0, 0] }]])),
        bundle_ok(),
    ]);

    let output = gattbus(
        &url,
        &["write-read", "AA:BB", "--address", "0x62", "--data", "ec05", "--size", "3"],
    );
    assert!(output.status.success());
    let out = stdout_json(&output);
    assert_eq!(out["address"], 0x62);
    assert_eq!(out["data"], "8000a2");
    assert_eq!(out["len"], 3);

    let frames = bundle_frames(&gateway.join().unwrap());
    assert_eq!(frames[0][7], 2);
    assert_eq!(&frames[0][16..], &[0xEC, 0x05]);
}

#[test]
fn device_failure_exits_1_and_still_releases_lock() {
    let (url, gateway) = scripted_gateway(vec![
        io_reply(json!([[{ "Ok": [] }, { "Ok": [248] }]])),
        bundle_ok(),
    ]);

    let output = gattbus(&url, &["write", "AA:BB", "--address", "0x10", "--data", "01"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("command ADDRESS failed (id 8)"), "stderr: {stderr}");

    let frames = bundle_frames(&gateway.join().unwrap());
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1][0], 0x86);
}

#[test]
fn gateway_status_error_exits_3() {
    let (url, gateway) = scripted_gateway(vec![
        (503, "adapter busy".to_string()),
        (503, "adapter busy".to_string()),
    ]);

    let output = gattbus(&url, &["read", "AA:BB", "--address", "0x44", "--size", "2"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("503"));
    gateway.join().unwrap();
}

#[test]
fn unreachable_gateway_exits_3() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let output = gattbus(&format!("http://127.0.0.1:{port}"), &["adapters"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn timeouts_reports_partial_failure() {
    let mut commands = vec![json!({ "Ok": [] }); 5];
    commands[2] = json!({ "Error": "no such characteristic" });
    let (url, gateway) = scripted_gateway(vec![io_reply(json!([commands]))]);

    let output = gattbus(&url, &["timeouts", "AA:BB", "--notification-timeout-ms", "1000"]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout_json(&output);
    assert_eq!(out.as_array().unwrap().len(), 5);
    assert_eq!(out[2]["service"], "lis2dh12");
    assert_eq!(out[2]["error"], "no such characteristic");

    let body: Value = serde_json::from_str(&gateway.join().unwrap()[0].body).unwrap();
    assert_eq!(body["batches"][0]["commands"][0]["Write"]["value"], json!([232, 3, 0, 0]));
}

#[test]
fn sample_prints_prometheus_text() {
    let (url, gateway) = scripted_gateway(vec![io_reply(json!([
        [{ "Ok": [175, 17] }],
        [{ "Ok": [102, 8] }],
        [{ "Ok": [16, 160, 15, 0] }]
    ]))]);

    let output = gattbus(&url, &["sample", "AA:BB", "--prometheus"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains(
        r#"sensor_hub_temperature_degrees_celsius{peripheral="AA:BB",scope="bme280"} 21.5"#
    ));
    assert!(text.contains("sensor_hub_humidity_percent"));
    gateway.join().unwrap();
}

#[test]
fn switchbot_sends_press() {
    let (url, gateway) = scripted_gateway(vec![io_reply(json!([[{ "Ok": [] }]]))]);

    let output = gattbus(&url, &["switchbot", "C1:22:33:44:55:66"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["command"], "press");

    let body: Value = serde_json::from_str(&gateway.join().unwrap()[0].body).unwrap();
    let write = &body["batches"][0]["commands"][0]["Write"];
    assert_eq!(write["value"], json!([0x57, 0x01, 0x00]));
    assert_eq!(write["wait_response"], json!(false));
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_gattbus"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("gattbus {}", env!("CARGO_PKG_VERSION"))
    );
}
