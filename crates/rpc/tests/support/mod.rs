#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub(crate) struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    storage_dir: PathBuf,
    next_id: u64,
}

impl Server {
    /// Starts `sb_rpc` on a fresh store as user `veeti` of organization `funect`.
    pub(crate) fn start(test_name: &str) -> Self {
        Self::start_with_args(test_name, &[])
    }

    pub(crate) fn start_with_args(test_name: &str, extra_args: &[&str]) -> Self {
        let storage_dir = temp_dir(test_name);
        let mut child = Command::new(env!("CARGO_BIN_EXE_sb_rpc"))
            .arg("--storage-dir")
            .arg(&storage_dir)
            .args(["--org", "funect", "--user", "veeti"])
            .args(extra_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn sb_rpc");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            storage_dir,
            next_id: 0,
        }
    }

    pub(crate) fn send_raw(&mut self, line: &str) {
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    pub(crate) fn send(&mut self, req: Value) {
        self.send_raw(&req.to_string());
    }

    pub(crate) fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    pub(crate) fn request(&mut self, req: Value) -> Value {
        self.send(req);
        self.recv()
    }

    /// Calls `method` and returns the envelope under `result`.
    pub(crate) fn call(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let resp = self.request(json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params
        }));
        assert_eq!(resp["id"], json!(self.next_id), "response id mismatch");
        resp.get("result")
            .cloned()
            .unwrap_or_else(|| panic!("{method} returned a protocol error: {resp}"))
    }

    /// Like `call`, but asserts success and unwraps the envelope's `result`.
    pub(crate) fn call_ok(&mut self, method: &str, params: Value) -> Value {
        let envelope = self.call(method, params);
        assert_eq!(
            envelope["success"],
            json!(true),
            "{method} failed: {envelope}"
        );
        envelope["result"].clone()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("sb_rpc_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub(crate) fn assert_json_rpc_error(resp: &Value, expected_code: i64) {
    let code = resp
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_i64())
        .expect("error.code");
    assert_eq!(code, expected_code);
}

/// Ids of one board column, top to bottom.
pub(crate) fn column_ids(columns: &Value, stage: &str) -> Vec<String> {
    columns
        .as_array()
        .expect("columns array")
        .iter()
        .find(|column| column["stage"] == stage)
        .unwrap_or_else(|| panic!("no column {stage}"))["prospects"]
        .as_array()
        .expect("prospects array")
        .iter()
        .map(|p| p["id"].as_str().expect("id").to_string())
        .collect()
}
